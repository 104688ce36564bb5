use serde_json::Value;

use super::{Context, PropertyContext, SchemaGenerator};
use crate::config::UnionModifier;
use crate::definition::Definition;
use crate::error::Result;
use crate::graph::{TypeGraphProvider, TypeId};
use crate::literal::{Literal, extract_literal, sort_literals};

impl<G: TypeGraphProvider> SchemaGenerator<G> {
    /// Literal members fold into one `enum`; the rest are built one by one. A single
    /// resulting schema is merged into `def`, several go under the union keyword.
    pub(super) fn union_definition(
        &self,
        cx: &mut Context,
        members: &[TypeId],
        prop: Option<&PropertyContext>,
        modifier: UnionModifier,
        def: &mut Definition,
    ) -> Result<()> {
        let nullable_keyword = self.options.uses_nullable_keyword();
        let mut values: Vec<Literal> = Vec::new();
        let mut schemas: Vec<Definition> = Vec::new();

        for &member in members {
            let node = self.graph.ty(member);
            if let Some(value) = extract_literal(&node.kind) {
                if !values.contains(&value) {
                    values.push(value);
                }
                continue;
            }

            // an aliased member carries its alias docs onto its own schema
            let alias = match node.alias_symbol {
                Some(symbol) => {
                    Some(PropertyContext { symbol, annotations: self.parse_annotations(symbol)? })
                }
                None => None,
            };
            let mut schema = self.build(
                cx,
                member,
                self.options.reference,
                self.union_modifier(),
                alias.as_ref(),
                node.alias_symbol,
            )?;

            match schema.type_name() {
                Some("undefined") => {
                    if let Some(prop) = prop {
                        cx.maybe_absent.insert(prop.symbol);
                    }
                    continue;
                }
                Some("null") if nullable_keyword => {
                    schema.insert("type".into(), Value::from("object"));
                    schema.insert("nullable".into(), Value::Bool(true));
                }
                _ => {}
            }
            schemas.push(schema);
        }

        if !values.is_empty() {
            sort_literals(&mut values);
            let mut enum_schema = Definition::new();
            let only_booleans =
                values.len() == 2 && values.iter().all(|v| matches!(v, Literal::Boolean(_)));
            if !only_booleans {
                let values = values.iter().map(Literal::to_value).collect();
                enum_schema.insert("enum".into(), Value::Array(values));
            }
            let first_kind = values[0].kind_name();
            if first_kind != "null" && values.iter().all(|v| v.kind_name() == first_kind) {
                enum_schema.insert("type".into(), Value::from(first_kind));
            }
            schemas.push(enum_schema);
        }

        if schemas.len() == 1 {
            if let Some(only) = schemas.pop() {
                def.merge(only);
            }
        } else if nullable_keyword && is_primitive_or_null(&schemas) {
            // primitive | null: the null branch lands last
            schemas.sort_by_key(is_nullable_null);
            for schema in schemas {
                def.merge(schema);
            }
        } else {
            def.insert(
                modifier.keyword().into(),
                Value::Array(schemas.into_iter().map(Value::from).collect()),
            );
        }
        Ok(())
    }

    /// Bare `{type}` members fold into one `type`; richer members stay under `allOf`.
    pub(super) fn intersection_definition(
        &self,
        cx: &mut Context,
        members: &[TypeId],
        def: &mut Definition,
    ) -> Result<()> {
        let mut simple_types: Vec<String> = Vec::new();
        let mut schemas: Vec<Definition> = Vec::new();

        for &member in members {
            let schema = self.build_member(cx, member, None)?;
            if schema.type_name() == Some("undefined") {
                tracing::error!(
                    member = %self.graph.type_to_string(member),
                    "undefined in an intersection makes no sense"
                );
                continue;
            }
            if schema.is_bare_type() {
                match schema.type_name() {
                    Some(ty) => {
                        if !simple_types.iter().any(|t| t == ty) {
                            simple_types.push(ty.to_owned());
                        }
                    }
                    None => {
                        tracing::error!(
                            member = %self.graph.type_to_string(member),
                            "expected only a simple type"
                        );
                    }
                }
            } else {
                schemas.push(schema);
            }
        }

        if !simple_types.is_empty() {
            let ty = match simple_types.as_slice() {
                [one] => Value::from(one.as_str()),
                many => Value::from(many.to_vec()),
            };
            let mut simple = Definition::new();
            simple.insert("type".into(), ty);
            schemas.push(simple);
        }

        if schemas.len() == 1 {
            if let Some(only) = schemas.pop() {
                def.merge(only);
            }
        } else {
            let branches = schemas.into_iter().map(Value::from).collect();
            def.insert("allOf".into(), Value::Array(branches));
        }
        Ok(())
    }
}

/// One bare `{type}` branch next to one normalized null branch.
fn is_primitive_or_null(schemas: &[Definition]) -> bool {
    match schemas {
        [a, b] => {
            (is_nullable_null(a) && b.is_bare_type()) || (is_nullable_null(b) && a.is_bare_type())
        }
        _ => false,
    }
}

/// `{ type: "object", nullable: true }` exactly.
fn is_nullable_null(schema: &Definition) -> bool {
    schema.len() == 2
        && schema.type_name() == Some("object")
        && schema.get("nullable") == Some(&Value::Bool(true))
}
