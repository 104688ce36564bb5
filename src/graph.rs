// src/graph.rs
//! Resolved type graph consumed by the generator.
//!
//! A provider hands out `TypeNode`s and `Symbol`s by id. `TypeGraph` is the
//! in-memory provider; it doubles as the JSON interchange format read by the CLI.

mod builder;
mod model;

use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

pub use builder::{GraphBuilder, ObjectBuilder, Prop, TYPE_LITERAL_SYMBOL};
pub use model::{
    Declaration, DeclarationKind, Diagnostic, DocPart, DocPartKind, DocTag, EnumMember, Property,
    Symbol, SymbolId, TypeId, TypeKind, TypeNode,
};

use crate::error::{Error, Result};

/// Printing stops descending past this depth.
const MAX_PRINT_DEPTH: usize = 8;

pub trait TypeGraphProvider {
    /// Panics if `id` does not belong to this graph.
    fn ty(&self, id: TypeId) -> &TypeNode;

    /// Panics if `id` does not belong to this graph.
    fn symbol(&self, id: SymbolId) -> &Symbol;

    /// Root symbol-name table, in declaration order.
    fn declarations(&self) -> &IndexMap<String, TypeId>;

    fn diagnostics(&self) -> &[Diagnostic];

    /// Fully-qualified display name of a type.
    fn type_to_string(&self, id: TypeId) -> String {
        let mut out = String::new();
        print_type(self, id, 0, &mut out);
        out
    }
}

// ---- Printing ----

fn print_type<G: TypeGraphProvider + ?Sized>(
    graph: &G,
    id: TypeId,
    depth: usize,
    out: &mut String,
) {
    if depth > MAX_PRINT_DEPTH {
        out.push_str("...");
        return;
    }
    let node = graph.ty(id);

    if let Some(alias) = node.alias_symbol {
        out.push_str(graph.symbol(alias).fully_qualified_name());
        if !node.alias_arguments.is_empty() {
            out.push('<');
            print_list(graph, &node.alias_arguments, ", ", depth, out);
            out.push('>');
        }
        return;
    }
    if let Some(symbol) = node.symbol
        && !node.is_anonymous_object()
    {
        out.push_str(graph.symbol(symbol).fully_qualified_name());
        return;
    }

    match &node.kind {
        TypeKind::String => out.push_str("string"),
        TypeKind::Number => out.push_str("number"),
        TypeKind::Boolean => out.push_str("boolean"),
        TypeKind::Null => out.push_str("null"),
        TypeKind::Undefined => out.push_str("undefined"),
        TypeKind::Void => out.push_str("void"),
        TypeKind::Any => out.push_str("any"),
        TypeKind::Unknown => out.push_str("unknown"),
        TypeKind::Never => out.push_str("never"),
        TypeKind::NonPrimitive => out.push_str("object"),
        TypeKind::StringLiteral { value } => {
            out.push('"');
            out.push_str(value);
            out.push('"');
        }
        TypeKind::NumberLiteral { value } => out.push_str(&format_number(*value)),
        TypeKind::BooleanLiteral { value } => out.push_str(if *value { "true" } else { "false" }),
        TypeKind::EnumLiteral { value } => out.push_str(value),
        TypeKind::Union { types } => print_list(graph, types, " | ", depth, out),
        TypeKind::Intersection { types } => print_list(graph, types, " & ", depth, out),
        TypeKind::Tuple { elements, .. } => {
            out.push('[');
            print_list(graph, elements, ", ", depth, out);
            out.push(']');
        }
        TypeKind::Object { properties, index, .. } => {
            if let Some(elem) = node.number_index {
                let composite = matches!(
                    graph.ty(elem).kind,
                    TypeKind::Union { .. } | TypeKind::Intersection { .. }
                ) && graph.ty(elem).alias_symbol.is_none();
                if composite {
                    out.push('(');
                }
                print_type(graph, elem, depth + 1, out);
                if composite {
                    out.push(')');
                }
                out.push_str("[]");
                return;
            }
            if properties.is_empty() && index.is_none() {
                out.push_str("{}");
                return;
            }
            out.push('{');
            if let Some(value) = index {
                out.push_str(" [x: string]: ");
                print_type(graph, *value, depth + 1, out);
                out.push(';');
            }
            for prop in properties {
                out.push(' ');
                out.push_str(&graph.symbol(prop.symbol).name);
                if prop.optional {
                    out.push('?');
                }
                out.push_str(": ");
                print_type(graph, prop.ty, depth + 1, out);
                out.push(';');
            }
            out.push_str(" }");
        }
        TypeKind::Enum { .. } => out.push_str("enum"),
        TypeKind::TypeParameter => out.push('T'),
    }
}

fn print_list<G: TypeGraphProvider + ?Sized>(
    graph: &G,
    ids: &[TypeId],
    sep: &str,
    depth: usize,
    out: &mut String,
) {
    for (i, id) in ids.iter().enumerate() {
        if i > 0 {
            out.push_str(sep);
        }
        print_type(graph, *id, depth + 1, out);
    }
}

/// Integral values print without a fractional part (`3`, not `3.0`).
pub(crate) fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

// ---- In-memory graph ----

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeGraph {
    #[serde(default)]
    pub types: Vec<TypeNode>,
    #[serde(default)]
    pub symbols: Vec<Symbol>,
    #[serde(default)]
    pub declarations: IndexMap<String, TypeId>,
    #[serde(default)]
    pub diagnostics: Vec<Diagnostic>,
}

impl TypeGraphProvider for TypeGraph {
    fn ty(&self, id: TypeId) -> &TypeNode {
        &self.types[id.0 as usize]
    }

    fn symbol(&self, id: SymbolId) -> &Symbol {
        &self.symbols[id.0 as usize]
    }

    fn declarations(&self) -> &IndexMap<String, TypeId> {
        &self.declarations
    }

    fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }
}

impl TypeGraph {
    /// Reads and validates a graph from a JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let graph: TypeGraph = crate::path_de::read_json_file(path)?;
        graph.validate()?;
        Ok(graph)
    }

    /// Checks that every id refers into this graph.
    pub fn validate(&self) -> Result<()> {
        let type_count = self.types.len();
        let symbol_count = self.symbols.len();
        let check_type = |owner: &str, id: TypeId| {
            if (id.0 as usize) < type_count {
                Ok(())
            } else {
                Err(Error::Graph(format!("{owner} refers to missing type {id}")))
            }
        };
        let check_symbol = |owner: &str, id: SymbolId| {
            if (id.0 as usize) < symbol_count {
                Ok(())
            } else {
                Err(Error::Graph(format!("{owner} refers to missing symbol @{}", id.0)))
            }
        };

        for (index, node) in self.types.iter().enumerate() {
            let owner = format!("type #{index}");
            let (types, symbols) = node_references(node);
            for id in types {
                check_type(&owner, id)?;
            }
            for id in symbols {
                check_symbol(&owner, id)?;
            }
        }
        for (name, id) in &self.declarations {
            check_type(&format!("declaration `{name}`"), *id)?;
        }
        Ok(())
    }

    /// Appends `other`, re-basing its ids. Declarations from `other` replace same-named ones.
    pub fn merge(&mut self, other: TypeGraph) {
        let type_base = self.types.len() as u32;
        let symbol_base = self.symbols.len() as u32;
        let ty = |id: TypeId| TypeId(id.0 + type_base);
        let sym = |id: SymbolId| SymbolId(id.0 + symbol_base);

        for mut node in other.types {
            node.symbol = node.symbol.map(sym);
            node.alias_symbol = node.alias_symbol.map(sym);
            node.alias_arguments.iter_mut().for_each(|id| *id = ty(*id));
            node.number_index = node.number_index.map(ty);
            node.base_types.iter_mut().for_each(|id| *id = ty(*id));
            match &mut node.kind {
                TypeKind::Union { types } | TypeKind::Intersection { types } => {
                    types.iter_mut().for_each(|id| *id = ty(*id));
                }
                TypeKind::Tuple { elements, .. } => {
                    elements.iter_mut().for_each(|id| *id = ty(*id));
                }
                TypeKind::Object { properties, index, .. } => {
                    for prop in properties.iter_mut() {
                        prop.symbol = sym(prop.symbol);
                        prop.ty = ty(prop.ty);
                        prop.referenced_symbol = prop.referenced_symbol.map(sym);
                    }
                    *index = index.map(ty);
                }
                _ => {}
            }
            self.types.push(node);
        }
        self.symbols.extend(other.symbols);
        for (name, id) in other.declarations {
            self.declarations.insert(name, ty(id));
        }
        self.diagnostics.extend(other.diagnostics);
    }
}

fn node_references(node: &TypeNode) -> (Vec<TypeId>, Vec<SymbolId>) {
    let mut types = Vec::new();
    let mut symbols = Vec::new();
    symbols.extend(node.symbol);
    symbols.extend(node.alias_symbol);
    types.extend(node.alias_arguments.iter().copied());
    types.extend(node.number_index);
    types.extend(node.base_types.iter().copied());
    match &node.kind {
        TypeKind::Union { types: members } | TypeKind::Intersection { types: members } => {
            types.extend(members.iter().copied());
        }
        TypeKind::Tuple { elements, .. } => types.extend(elements.iter().copied()),
        TypeKind::Object { properties, index, .. } => {
            for prop in properties {
                types.push(prop.ty);
                symbols.push(prop.symbol);
                symbols.extend(prop.referenced_symbol);
            }
            types.extend(*index);
        }
        _ => {}
    }
    (types, symbols)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prints_structural_types() {
        let mut b = GraphBuilder::new();
        let s = b.string();
        let n = b.number();
        let null = b.null();
        let list = b.array(s);
        let maybe = b.union([s, null]);
        let maybe_list = b.array(maybe);
        let pair = b.tuple([s, n], 2, false);
        let lit = b.type_literal()
            .prop(Prop::new("a", s))
            .prop(Prop::new("b", n).optional())
            .build();
        let g = b.finish();

        assert_eq!(g.type_to_string(list), "string[]");
        assert_eq!(g.type_to_string(maybe_list), "(string | null)[]");
        assert_eq!(g.type_to_string(pair), "[string, number]");
        assert_eq!(g.type_to_string(lit), "{ a: string; b?: number; }");
    }

    #[test]
    fn alias_name_wins_and_recursion_is_bounded() {
        let mut b = GraphBuilder::new();
        let node = b.reserve();
        b.type_literal()
            .prop(Prop::new("next", node).optional())
            .build_into(node);
        let named = b.reserve();
        b.type_literal()
            .alias("Node")
            .prop(Prop::new("next", named).optional())
            .build_into(named);
        let g = b.finish();

        assert_eq!(g.type_to_string(named), "Node");
        assert!(g.type_to_string(node).contains("..."));
    }

    #[test]
    fn validate_rejects_dangling_ids() {
        let mut g = TypeGraph::default();
        g.types.push(TypeNode::new(TypeKind::Union { types: vec![TypeId(7)] }));
        let err = g.validate().unwrap_err();
        assert!(err.to_string().contains("missing type #7"), "{err}");

        let mut g = TypeGraph::default();
        g.declarations.insert("Ghost".into(), TypeId(0));
        assert!(g.validate().is_err());
    }

    #[test]
    fn merge_rebases_ids_and_later_declarations_win() {
        let mut a = GraphBuilder::new();
        let s = a.string();
        a.interface("Shared").prop(Prop::new("x", s)).build();
        let mut a = a.finish();

        let mut b = GraphBuilder::new();
        let n = b.number();
        b.interface("Shared").prop(Prop::new("y", n)).build();
        let b = b.finish();
        let b_types = b.types.len();

        let before = a.types.len();
        a.merge(b);
        a.validate().unwrap();
        assert_eq!(a.types.len(), before + b_types);

        let shared = a.declarations["Shared"];
        let props = a.ty(shared).properties();
        assert_eq!(a.symbol(props[0].symbol).name, "y");
        assert_eq!(a.ty(props[0].ty).kind, TypeKind::Number);
    }

    #[test]
    fn graph_json_round_trips_through_serde() {
        let json = serde_json::json!({
            "types": [
                { "kind": "string" },
                { "kind": "object", "symbol": 0, "properties": [
                    { "symbol": 1, "type": 0, "optional": true }
                ]}
            ],
            "symbols": [
                { "name": "Pet", "documentation": [{ "text": "A pet." }] },
                { "name": "name" }
            ],
            "declarations": { "Pet": 1 }
        });
        let g: TypeGraph = serde_json::from_value(json).unwrap();
        g.validate().unwrap();
        assert_eq!(g.type_to_string(TypeId(1)), "Pet");
        assert!(g.ty(TypeId(1)).properties()[0].optional);
    }
}
