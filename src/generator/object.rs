use serde_json::{Map, Value};

use super::{Context, PropertyContext, SchemaGenerator};
use crate::annotations::Annotations;
use crate::definition::Definition;
use crate::error::Result;
use crate::graph::{Property, TypeGraphProvider, TypeId, TypeKind, TypeNode};
use crate::literal::expr::{InitializerShape, parse_initializer};

impl<G: TypeGraphProvider> SchemaGenerator<G> {
    /// Named object shapes: interfaces, classes and non-empty type literals.
    pub(super) fn class_definition(
        &self,
        cx: &mut Context,
        ty: TypeId,
        node: &TypeNode,
        def: &mut Definition,
    ) -> Result<()> {
        let g = &self.graph;
        let props: Vec<&Property> = node
            .properties()
            .iter()
            .filter(|p| !p.private && !matches!(g.ty(p.ty).kind, TypeKind::Never))
            .collect();

        let is_abstract = node.symbol.is_some_and(|s| g.symbol(s).is_abstract());
        if is_abstract
            && let Some(subtypes) = self.inheriting.get(&g.type_to_string(ty))
            && !subtypes.is_empty()
        {
            let mut one_of = Vec::with_capacity(subtypes.len());
            for name in subtypes {
                let Some(&subtype) = self.symbols.get(name) else { continue };
                let schema = self.build_member(cx, subtype, None)?;
                one_of.push(Value::from(schema));
            }
            def.insert("oneOf".into(), Value::Array(one_of));
            return Ok(());
        }

        let mut properties = Map::new();
        let mut kept: Vec<(&Property, Annotations)> = Vec::with_capacity(props.len());
        for prop in props {
            if prop.method {
                continue;
            }
            let annotations = self.parse_annotations(prop.symbol)?;
            if annotations.is_ignored() {
                continue;
            }
            let cx_prop = PropertyContext { symbol: prop.symbol, annotations };
            if let Some(schema) = self.property_definition(cx, prop, &cx_prop)? {
                properties.insert(g.symbol(prop.symbol).name.clone(), schema.into());
                kept.push((prop, cx_prop.annotations));
            }
        }

        def.entry("type").or_insert_with(|| Value::from("object"));
        if def.type_name() == Some("object") && !properties.is_empty() {
            def.insert("properties".into(), Value::Object(properties));
        }

        if !self.options.ignore_required {
            let mut required: Vec<String> = kept
                .iter()
                .filter(|(p, a)| !p.optional && !p.method && !a.is_ignored())
                .filter(|(p, _)| !cx.maybe_absent.contains(&p.symbol))
                .map(|(p, _)| g.symbol(p.symbol).name.clone())
                .collect();
            required.sort();
            required.dedup();
            if !required.is_empty() {
                def.insert("required".into(), Value::from(required));
            }
        }
        Ok(())
    }

    /// `None` when the property contributes nothing (its type resolved to `undefined`).
    fn property_definition(
        &self,
        cx: &mut Context,
        prop: &Property,
        cx_prop: &PropertyContext,
    ) -> Result<Option<Definition>> {
        let name = &self.graph.symbol(prop.symbol).name;
        let mut def = self.build(
            cx,
            prop.ty,
            self.options.reference,
            self.union_modifier(),
            Some(cx_prop),
            prop.referenced_symbol,
        )?;
        if def.type_name() == Some("undefined") {
            return Ok(None);
        }
        if self.options.titles {
            def.insert("title".into(), Value::String(name.clone()));
        }

        if let Some(initializer) = &prop.initializer {
            match parse_initializer(initializer) {
                Ok(InitializerShape::Plain(value)) => {
                    def.insert("default".into(), value);
                }
                Ok(InitializerShape::Asserted(value)) => {
                    tracing::warn!(
                        property = %name,
                        %initializer,
                        "default read through a type assertion"
                    );
                    def.insert("default".into(), value);
                }
                Err(e) => {
                    tracing::warn!(property = %name, %initializer, "skipping default: {e}");
                }
            }
        }
        Ok(Some(def))
    }
}
