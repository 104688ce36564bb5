//! API shape types → OpenAPI operations.

use indexmap::IndexMap;
use serde_json::{Map, Value};

use super::document::{
    HttpMethod, MediaType, OpenApiDocument, Operation, Parameter, ParameterLocation, RequestBody,
    Response, SecurityRequirement, SpecData,
};
use crate::annotations::Annotations;
use crate::definition::Definition;
use crate::error::{Error, Result};
use crate::generator::{COMPONENTS_REF_PATH, Context, SchemaGenerator, TypeNamePattern};
use crate::graph::{Property, TypeGraphProvider, TypeId, TypeKind};
use crate::literal::extract_literal;

/// Shape members with a fixed meaning; anything else is operation metadata.
const SHAPE_MEMBERS: &[&str] =
    &["path", "method", "params", "query", "body", "responses", "security"];

impl<G: TypeGraphProvider> SchemaGenerator<G> {
    /// Assembles one operation per matched API shape type.
    pub fn get_openapi_spec(
        &self,
        patterns: &[TypeNamePattern],
        spec_data: SpecData,
    ) -> Result<OpenApiDocument> {
        let mut document = OpenApiDocument::new(self.options.openapi_version, spec_data);
        if patterns.is_empty() {
            return Ok(document);
        }
        let mut cx = Context::new(COMPONENTS_REF_PATH, &self.schema_overrides);

        for name in self.symbols(patterns) {
            let shape = self.symbols[name];
            let Some((path, method, operation)) = self.operation(&mut cx, name, shape)? else {
                tracing::debug!(shape = name, "ignored");
                continue;
            };
            let item = document.paths.entry(path).or_default();
            if item.insert(method.path_key().to_owned(), operation).is_some() {
                tracing::warn!(
                    shape = name,
                    method = %method,
                    "replaces an operation declared earlier"
                );
            }
        }
        tracing::debug!(
            paths = document.paths.len(),
            reffed = cx.reffed.len(),
            "openapi document assembled"
        );

        for (key, definition) in cx.reffed {
            document.components.schemas.entry(key).or_insert(definition);
        }
        Ok(document)
    }

    /// `None` when the shape carries `@ignore`.
    fn operation(
        &self,
        cx: &mut Context,
        name: &str,
        shape: TypeId,
    ) -> Result<Option<(String, HttpMethod, Operation)>> {
        let g = &self.graph;
        let node = g.ty(shape);
        let annotations = match node.alias_symbol.or(node.symbol) {
            Some(symbol) => self.parse_annotations(symbol)?,
            None => Annotations::default(),
        };
        if annotations.is_ignored() {
            return Ok(None);
        }

        let member = |key: &str| node.properties().iter().find(|p| g.symbol(p.symbol).name == key);
        let required = |key: &str| {
            member(key).ok_or_else(|| Error::shape(name, format!("missing `{key}`")))
        };
        let path_prop = required("path")?;
        let method_prop = required("method")?;
        let responses_prop = required("responses")?;

        let path = match &g.ty(path_prop.ty).kind {
            TypeKind::StringLiteral { value } => value.clone(),
            _ => return Err(Error::shape(name, "`path` must be a string literal")),
        };
        let method = match &g.ty(method_prop.ty).kind {
            TypeKind::StringLiteral { value } => {
                HttpMethod::try_from(value.as_str()).map_err(|reason| Error::shape(name, reason))?
            }
            _ => return Err(Error::shape(name, "`method` must be a string literal")),
        };

        let operation_id = node.alias_symbol.or(node.symbol).map(|s| g.symbol(s).name.clone());
        let mut operation = Operation { operation_id, ..Operation::default() };

        let mut shape_keywords = annotations.definition.into_map();
        if let Some(tags) = shape_keywords.shift_remove("tags") {
            operation.tags = Some(split_tags(&tags));
        }
        let body_keywords = match shape_keywords.shift_remove("body") {
            Some(Value::Object(map)) => map,
            _ => Map::new(),
        };
        if let Some(Value::String(id)) = shape_keywords.shift_remove("operationId") {
            operation.operation_id = Some(id);
        }
        operation.annotations = shape_keywords;

        if let Some(params) = member("params") {
            let parameters =
                self.parameters(cx, name, "params", params.ty, ParameterLocation::Path)?;
            operation.parameters.extend(parameters);
        }
        if let Some(query) = member("query") {
            let parameters =
                self.parameters(cx, name, "query", query.ty, ParameterLocation::Query)?;
            operation.parameters.extend(parameters);
        }
        if let Some(body) = member("body") {
            operation.request_body = self.request_body(cx, name, body.ty, body_keywords)?;
        }
        operation.responses = self.responses(cx, name, responses_prop.ty)?;
        if let Some(security) = member("security") {
            operation.security = Some(self.security(cx, name, security.ty)?);
        }

        if self.options.custom_operation_properties {
            let extra = |p: &&Property| !SHAPE_MEMBERS.contains(&g.symbol(p.symbol).name.as_str());
            for prop in node.properties().iter().filter(extra) {
                self.custom_property(prop, &mut operation);
            }
        }

        Ok(Some((path, method, operation)))
    }

    fn parameters(
        &self,
        cx: &mut Context,
        shape: &str,
        member: &str,
        ty: TypeId,
        location: ParameterLocation,
    ) -> Result<Vec<Parameter>> {
        if self.is_empty_object(ty) {
            return Ok(Vec::new());
        }
        if !self.is_plain_object(ty) {
            return Err(Error::shape(shape, format!("`{member}` must be an object type")));
        }
        let schema = self.member_schema(cx, ty)?;

        // an intersection arrives as allOf branches
        let branches: Vec<Definition> = match schema.get("allOf").and_then(Value::as_array) {
            Some(all_of) => all_of
                .iter()
                .filter_map(|branch| Definition::from_value(branch.clone()))
                .map(|branch| resolve(cx, branch))
                .collect(),
            None => vec![schema],
        };

        let mut parameters = Vec::new();
        for branch in &branches {
            let Some(properties) = branch.properties() else { continue };
            for (name, schema) in properties {
                let Some(schema) = Definition::from_value(schema.clone()) else { continue };
                parameters.push(Parameter {
                    name: name.clone(),
                    location,
                    required: branch.required_contains(name),
                    description: schema.get("description").cloned(),
                    schema,
                });
            }
        }
        Ok(parameters)
    }

    fn request_body(
        &self,
        cx: &mut Context,
        shape: &str,
        ty: TypeId,
        mut keywords: Map<String, Value>,
    ) -> Result<Option<RequestBody>> {
        if self.is_empty_object(ty) {
            return Ok(None);
        }
        if !self.is_plain_object(ty) {
            return Err(Error::shape(shape, "`body` must be an object type"));
        }
        let schema = self.build_member(cx, ty, self.graph.ty(ty).symbol)?;
        let content_type = self.content_type(keywords.shift_remove("contentType"));
        Ok(Some(RequestBody {
            annotations: keywords,
            content: IndexMap::from([(content_type, MediaType { schema })]),
        }))
    }

    fn responses(
        &self,
        cx: &mut Context,
        shape: &str,
        ty: TypeId,
    ) -> Result<IndexMap<String, Response>> {
        let g = &self.graph;
        let statuses = g.ty(ty).properties();
        if !self.is_plain_object(ty) || statuses.is_empty() {
            return Err(Error::shape(
                shape,
                "`responses` must be an object with at least one status code",
            ));
        }

        let mut responses = IndexMap::new();
        for prop in statuses {
            let status = g.symbol(prop.symbol).name.clone();
            if !is_status_code(&status) {
                return Err(Error::InvalidStatusCode { shape: shape.to_owned(), status });
            }
            let node = g.ty(prop.ty);
            let no_body = matches!(node.kind, TypeKind::Never);
            if !no_body && !self.is_plain_object(prop.ty) {
                let reason = format!("response `{status}` must be an object type");
                return Err(Error::shape(shape, reason));
            }

            let mut keywords = self.parse_annotations(prop.symbol)?.definition.into_map();
            let content_type = self.content_type(keywords.shift_remove("contentType"));
            let description = keywords
                .shift_remove("description")
                .unwrap_or_else(|| Value::String(String::new()));
            let content = if no_body {
                None
            } else {
                let schema = self.build_member(cx, prop.ty, node.alias_symbol)?;
                Some(IndexMap::from([(content_type, MediaType { schema })]))
            };
            responses.insert(status, Response { description, annotations: keywords, content });
        }
        Ok(responses)
    }

    /// `security: { scheme: Scope[] }[]`: each object (or union branch) is one requirement.
    fn security(
        &self,
        cx: &mut Context,
        shape: &str,
        ty: TypeId,
    ) -> Result<Vec<SecurityRequirement>> {
        let schema = self.member_schema(cx, ty)?;
        let items = schema.get("items").cloned().and_then(Definition::from_value);
        let items = match (schema.type_name(), items) {
            (Some("array"), Some(items)) => resolve(cx, items),
            _ => return Err(Error::shape(shape, "`security` must be an array of objects")),
        };

        let alternatives: Vec<Definition> = ["anyOf", "oneOf"]
            .iter()
            .find_map(|key| items.get(*key).and_then(Value::as_array).cloned())
            .map(|branches| branches.into_iter().filter_map(Definition::from_value).collect())
            .unwrap_or_else(|| vec![items]);

        let mut requirements = Vec::new();
        for alternative in alternatives {
            let alternative = resolve(cx, alternative);
            let Some(properties) = alternative.properties() else {
                return Err(Error::shape(shape, "`security` must be an array of objects"));
            };
            let requirement = properties
                .iter()
                .map(|(scheme, schema)| (scheme.clone(), scopes(cx, schema)))
                .collect::<SecurityRequirement>();
            requirements.push(requirement);
        }
        Ok(requirements)
    }

    /// Literal-typed extra members become operation fields.
    fn custom_property(&self, prop: &Property, operation: &mut Operation) {
        let g = &self.graph;
        let name = &g.symbol(prop.symbol).name;
        let Some(value) = extract_literal(&g.ty(prop.ty).kind) else {
            tracing::debug!(property = %name, "custom operation property is not a literal");
            return;
        };
        let key = if name.starts_with("x-") {
            name.clone()
        } else {
            format!("{}{name}", self.options.custom_keyword_prefix)
        };
        operation.annotations.insert(key, value.to_value());
    }

    /// Schema of a `params`/`query`/`security` member, looked up when it came back as a `$ref`.
    fn member_schema(&self, cx: &mut Context, ty: TypeId) -> Result<Definition> {
        let schema = self.build_member(cx, ty, self.graph.ty(ty).symbol)?;
        Ok(resolve(cx, schema))
    }

    fn content_type(&self, annotated: Option<Value>) -> String {
        match annotated {
            Some(Value::String(ct)) => ct,
            _ => self.options.default_content_type.clone(),
        }
    }

    /// `undefined`, `unknown`, `null` or `{}`.
    fn is_empty_object(&self, ty: TypeId) -> bool {
        let node = self.graph.ty(ty);
        match node.kind {
            TypeKind::Undefined | TypeKind::Unknown | TypeKind::Null => true,
            TypeKind::Object { ref properties, index, .. } => {
                properties.is_empty() && index.is_none() && node.number_index.is_none()
            }
            _ => false,
        }
    }

    /// An object, or an intersection made only of objects.
    fn is_plain_object(&self, ty: TypeId) -> bool {
        let is_object = |ty: TypeId| matches!(self.graph.ty(ty).kind, TypeKind::Object { .. });
        match &self.graph.ty(ty).kind {
            TypeKind::Object { .. } => true,
            TypeKind::Intersection { types } => types.iter().all(|t| is_object(*t)),
            _ => false,
        }
    }
}

/// Follows a `$ref` into the reffed table.
fn resolve(cx: &Context, schema: Definition) -> Definition {
    let target = schema
        .ref_target()
        .and_then(|r| r.rsplit('/').next())
        .and_then(|name| cx.reffed.get(name));
    match target {
        Some(definition) => definition.clone(),
        None => schema,
    }
}

/// Enum strings on an array property's items, refs followed on both levels.
fn scopes(cx: &Context, schema: &Value) -> Vec<String> {
    let Some(schema) = Definition::from_value(schema.clone()) else {
        return Vec::new();
    };
    let items = resolve(cx, schema).get("items").cloned();
    let Some(items) = items.and_then(Definition::from_value) else {
        return Vec::new();
    };
    resolve(cx, items)
        .get("enum")
        .and_then(Value::as_array)
        .map(|values| values.iter().filter_map(Value::as_str).map(str::to_owned).collect())
        .unwrap_or_default()
}

fn split_tags(tags: &Value) -> Vec<String> {
    match tags {
        Value::String(text) => {
            text.split(',').map(str::trim).filter(|t| !t.is_empty()).map(str::to_owned).collect()
        }
        Value::Array(items) => items.iter().filter_map(Value::as_str).map(str::to_owned).collect(),
        other => vec![other.to_string()],
    }
}

/// Three digits, 100 through 599.
fn is_status_code(text: &str) -> bool {
    text.len() == 3
        && text.bytes().all(|b| b.is_ascii_digit())
        && matches!(text.as_bytes()[0], b'1'..=b'5')
}
