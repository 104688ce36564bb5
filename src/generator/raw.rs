use serde_json::{Map, Value};

use super::{Context, SchemaGenerator};
use crate::config::NumberType;
use crate::definition::Definition;
use crate::error::{Error, Result};
use crate::graph::{SymbolId, TypeGraphProvider, TypeId, TypeKind, TypeNode};
use crate::literal::extract_literal;

impl<G: TypeGraphProvider> SchemaGenerator<G> {
    /// Primitives, Date, `object`, literals, tuples and arrays.
    pub(super) fn raw_definition(
        &self,
        cx: &mut Context,
        ty: TypeId,
        node: &TypeNode,
        reffed: Option<SymbolId>,
        def: &mut Definition,
    ) -> Result<()> {
        let g = &self.graph;

        if let TypeKind::Tuple { elements, min_length, has_rest } = &node.kind {
            let mut items = Vec::with_capacity(elements.len());
            for &element in elements {
                items.push(Value::from(self.build_member(cx, element, None)?));
            }
            def.insert("type".into(), Value::from("array"));
            if !items.is_empty() {
                def.insert("items".into(), Value::Array(items));
            }
            def.insert("minItems".into(), Value::from(*min_length));
            if !has_rest {
                def.insert("maxItems".into(), Value::from(elements.len()));
            }
            return Ok(());
        }

        let names_integer = |s: Option<SymbolId>| s.is_some_and(|s| g.symbol(s).name == "integer");
        let set_type = |def: &mut Definition, ty: &str| {
            def.insert("type".into(), Value::from(ty));
        };

        match &node.kind {
            TypeKind::String => set_type(def, "string"),
            TypeKind::Number => {
                let integer = def.type_name() == Some("integer")
                    || names_integer(reffed)
                    || names_integer(node.symbol)
                    || names_integer(node.alias_symbol)
                    || self.options.default_number_type == NumberType::Integer;
                set_type(def, if integer { "integer" } else { "number" });
            }
            TypeKind::Boolean => set_type(def, "boolean"),
            TypeKind::Null => {
                if self.options.uses_nullable_keyword() {
                    set_type(def, "object");
                    def.insert("nullable".into(), Value::Bool(true));
                } else {
                    set_type(def, "null");
                }
            }
            TypeKind::Undefined | TypeKind::Void => set_type(def, "undefined"),
            // no restriction: anything matches
            TypeKind::Any | TypeKind::Unknown => {}
            TypeKind::Object { .. }
                if node.symbol.is_some_and(|s| g.symbol(s).fully_qualified_name() == "Date") =>
            {
                set_type(def, "string");
                def.entry("format").or_insert_with(|| Value::from("date-time"));
            }
            TypeKind::NonPrimitive => {
                set_type(def, "object");
                def.insert("properties".into(), Value::Object(Map::new()));
                def.insert("additionalProperties".into(), Value::Bool(true));
            }
            kind => {
                if let Some(value) = extract_literal(kind) {
                    set_type(def, value.kind_name());
                    def.insert("enum".into(), Value::Array(vec![value.to_value()]));
                } else if let Some(element) = node.number_index {
                    set_type(def, "array");
                    if !def.contains_key("items") {
                        let items = self.build_member(cx, element, None)?;
                        def.insert("items".into(), items.into());
                    }
                } else {
                    return Err(Error::UnsupportedType {
                        type_name: g.type_to_string(ty),
                        type_id: ty,
                    });
                }
            }
        }
        Ok(())
    }
}
