// src/generator.rs
//! Definition Builder: resolved types → JSON-Schema definitions.
//!
//! One `SchemaGenerator` is bound to one graph. Every public call builds against a fresh
//! [`Context`], so calls are independent and repeatable; only schema overrides outlive a call.

mod combinator;
mod context;
mod names;
mod object;
mod raw;

use std::collections::BTreeSet;

use indexmap::IndexMap;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;

pub use context::{COMPONENTS_REF_PATH, Context, DEFINITIONS_REF_PATH, PropertyContext};
pub use names::{NameRegistry, canonical_name, declaration_hash};

use crate::annotations::{
    AnnotationParser, Annotations, JsonModuleResolver, KeywordTable, ModuleResolver,
};
use crate::config::{Options, UnionModifier};
use crate::definition::Definition;
use crate::error::{Error, Result};
use crate::graph::{
    Symbol, SymbolId, TYPE_LITERAL_SYMBOL, TypeGraphProvider, TypeId, TypeKind, TypeNode,
};
use crate::literal::{enum_definition, extract_literal};
use names::REGEX_REF_NAME;

/// Aliases that only toggle `readonly` and are looked through.
const MUTABILITY_WRAPPERS: &[&str] = &["Readonly", "Mutable"];

/// Selects declarations by exact name or by regular expression.
#[derive(Debug, Clone)]
pub enum TypeNamePattern {
    Exact(String),
    Regex(Regex),
}

impl TypeNamePattern {
    /// `/expr/` is a regular expression; anything else is an exact name.
    pub fn parse(text: &str) -> Result<Self> {
        match text.strip_prefix('/').and_then(|t| t.strip_suffix('/')) {
            Some(expr) if !expr.is_empty() => Ok(Self::Regex(Regex::new(expr)?)),
            _ => Ok(Self::Exact(text.to_owned())),
        }
    }

    pub fn matches(&self, name: &str) -> bool {
        match self {
            Self::Exact(exact) => exact == name,
            Self::Regex(re) => re.is_match(name),
        }
    }
}

impl From<&str> for TypeNamePattern {
    fn from(name: &str) -> Self {
        Self::Exact(name.to_owned())
    }
}

/// `{ "definitions": { name: schema } }`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SchemaDocument {
    pub definitions: IndexMap<String, Definition>,
}

pub struct SchemaGenerator<G> {
    pub(crate) graph: G,
    pub(crate) options: Options,
    keywords: KeywordTable,
    modules: Box<dyn ModuleResolver>,
    /// Declaration name (hash-suffixed under `uniqueNames`) → type.
    pub(crate) symbols: IndexMap<String, TypeId>,
    /// Printed base type → names of the declarations extending it.
    inheriting: IndexMap<String, Vec<String>>,
    pub(crate) schema_overrides: IndexMap<String, Definition>,
}

impl<G: TypeGraphProvider> SchemaGenerator<G> {
    /// Fails with the graph's diagnostics unless `ignoreErrors` is set.
    pub fn new(graph: G, options: Options) -> Result<Self> {
        if !options.ignore_errors && !graph.diagnostics().is_empty() {
            for diagnostic in graph.diagnostics() {
                tracing::error!("{diagnostic}");
            }
            return Err(Error::Diagnostics(graph.diagnostics().to_vec()));
        }

        let mut symbols = IndexMap::new();
        let mut inheriting: IndexMap<String, Vec<String>> = IndexMap::new();
        for (name, &ty) in graph.declarations() {
            let node = graph.ty(ty);
            let name = match declaring_symbol(&graph, node).and_then(|s| s.declaration.as_ref()) {
                Some(declaration) if options.unique_names => {
                    format!("{name}.{}", declaration_hash(declaration))
                }
                _ => name.clone(),
            };
            for &base in &node.base_types {
                inheriting.entry(graph.type_to_string(base)).or_default().push(name.clone());
            }
            symbols.insert(name, ty);
        }
        tracing::debug!(
            declarations = symbols.len(),
            bases = inheriting.len(),
            "indexed type graph"
        );

        let keywords = KeywordTable::new(&options.custom_keywords, &options.custom_keyword_prefix);
        Ok(Self {
            graph,
            options,
            keywords,
            modules: Box::new(JsonModuleResolver::default()),
            symbols,
            inheriting,
            schema_overrides: IndexMap::new(),
        })
    }

    pub fn with_module_resolver(mut self, modules: impl ModuleResolver + 'static) -> Self {
        self.modules = Box::new(modules);
        self
    }

    pub fn graph(&self) -> &G {
        &self.graph
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Registers a definition that every call starts with in its reffed table.
    pub fn set_schema_override(&mut self, name: impl Into<String>, definition: Definition) {
        self.schema_overrides.insert(name.into(), definition);
    }

    /// Declaration names matched by `patterns`, pattern by pattern, in declaration order.
    pub fn symbols(&self, patterns: &[TypeNamePattern]) -> Vec<&str> {
        if patterns.is_empty() {
            return self.symbols.keys().map(String::as_str).collect();
        }
        patterns
            .iter()
            .flat_map(|pattern| self.symbols.keys().filter(move |name| pattern.matches(name)))
            .map(String::as_str)
            .collect()
    }

    /// Builds one definition per matched declaration, followed by every reffed definition.
    pub fn get_schemas(&self, patterns: &[TypeNamePattern]) -> Result<SchemaDocument> {
        let mut document = SchemaDocument::default();
        if patterns.is_empty() {
            return Ok(document);
        }
        let mut cx = Context::new(DEFINITIONS_REF_PATH, &self.schema_overrides);
        for name in self.symbols(patterns) {
            let ty = self.symbols[name];
            let definition = self.build_member(&mut cx, ty, None)?;
            document.definitions.insert(name.to_owned(), definition);
        }
        tracing::debug!(
            roots = document.definitions.len(),
            reffed = cx.reffed.len(),
            "schemas built"
        );
        document.definitions.extend(cx.reffed);
        Ok(document)
    }

    /// [`build`](Self::build) with the configured ref mode and union keyword, no owning property.
    pub(crate) fn build_member(
        &self,
        cx: &mut Context,
        ty: TypeId,
        reffed: Option<SymbolId>,
    ) -> Result<Definition> {
        self.build(cx, ty, self.options.reference, self.union_modifier(), None, reffed)
    }

    pub(crate) fn union_modifier(&self) -> UnionModifier {
        self.options.default_union_modifier
    }

    pub(crate) fn annotation_parser(&self) -> AnnotationParser<'_> {
        AnnotationParser::new(&self.keywords, self.modules.as_ref())
    }

    pub(crate) fn parse_annotations(&self, symbol: SymbolId) -> Result<Annotations> {
        self.annotation_parser().parse(self.graph.symbol(symbol))
    }

    fn is_branded(&self, symbol: SymbolId) -> bool {
        let symbol = self.graph.symbol(symbol);
        symbol.fully_qualified_name() == "Date" || symbol.name == "integer"
    }

    /// Date, branded integers and numerically indexed types never become references.
    fn is_raw(&self, node: &TypeNode) -> bool {
        match node.kind {
            TypeKind::Enum { .. } => false,
            TypeKind::Object { .. } => {
                node.number_index.is_some() || node.symbol.is_some_and(|s| self.is_branded(s))
            }
            _ => node.symbol.is_none_or(|s| self.is_branded(s)),
        }
    }

    /// The recursive core.
    ///
    /// `prop` is the property owning `ty`, `reffed` the symbol its type annotation names.
    pub(crate) fn build(
        &self,
        cx: &mut Context,
        mut ty: TypeId,
        mut as_ref: bool,
        union: UnionModifier,
        prop: Option<&PropertyContext>,
        mut reffed: Option<SymbolId>,
    ) -> Result<Definition> {
        let g = &self.graph;

        // 1) look through Readonly<T> / Mutable<T>
        loop {
            let node = g.ty(ty);
            match (node.alias_symbol, node.alias_arguments.first()) {
                (Some(alias), Some(&inner))
                    if MUTABILITY_WRAPPERS.contains(&g.symbol(alias).name.as_str()) =>
                {
                    ty = inner;
                    reffed = None;
                }
                _ => break,
            }
        }
        let node = g.ty(ty);

        let enum_reference = reffed.is_some() && matches!(node.kind, TypeKind::Enum { .. });
        if enum_reference {
            as_ref = false;
        }

        // 2) property overrides short-circuit
        if let Some(prop) = prop
            && (prop.annotations.is_ignored() || prop.annotations.definition.contains_key("type"))
        {
            return Ok(prop.annotations.definition.clone());
        }

        // 3) classify
        let raw = self.is_raw(node);
        let string_enum = match &node.kind {
            TypeKind::Union { types } => {
                types.iter().all(|t| matches!(g.ty(*t).kind, TypeKind::StringLiteral { .. }))
            }
            _ => false,
        };
        let alias_ref = as_ref && string_enum && reffed.is_some();
        if !alias_ref && (raw || node.is_anonymous_object()) {
            as_ref = false;
        }
        if !node.alias_arguments.is_empty() {
            as_ref = false;
        }

        // 4) name
        let full_name = self.type_name(cx, ty, node, reffed, alias_ref);

        // 5) recursion guard
        let mut token = None;
        if !raw || node.alias_symbol.is_some() {
            if cx.is_building(&full_name) {
                as_ref = true;
            } else {
                token = Some(cx.enter(&full_name));
                let literal_owner = reffed.is_some_and(|r| g.symbol(r).name == TYPE_LITERAL_SYMBOL);
                if self.options.reference
                    && !literal_owner
                    && node.alias_arguments.is_empty()
                    && !enum_reference
                    && REGEX_REF_NAME.is_match(&full_name)
                {
                    as_ref = true;
                }
            }
        }

        // 6) what the caller gets back
        let mut definition = Definition::new();
        let mut returned = as_ref.then(|| cx.ref_to(&full_name));

        // 7) annotations
        let parser = self.annotation_parser();
        let mut other = BTreeSet::new();
        for symbol in [reffed, node.symbol, node.alias_symbol].into_iter().flatten() {
            parser.parse_into(g.symbol(symbol), &mut definition, &mut other)?;
        }
        if let Some(prop) = prop {
            returned.as_mut().unwrap_or(&mut definition).merge(prop.annotations.definition.clone());
        }

        // 8) structure
        if !as_ref || !cx.reffed.contains_key(&full_name) {
            if as_ref {
                // placeholder: re-entry must see the name as taken
                cx.reffed.insert(full_name.clone(), Definition::new());
                if self.options.titles {
                    definition.insert("title".into(), Value::String(full_name.clone()));
                }
            }
            if !definition.contains_key("type") {
                self.dispatch(cx, ty, node, raw, union, prop, reffed, &mut definition)?;
            }
            if as_ref {
                cx.reffed.insert(full_name.clone(), definition.clone());
            }
        }

        // 11) a finished cycle or promoted type is handed back as a $ref
        if let Some(token) = token
            && cx.leave(&full_name, token)
            && cx.reffed.contains_key(&full_name)
        {
            let annotations = returned.as_ref().unwrap_or(&definition).ref_annotations();
            let mut reference = cx.ref_to(&full_name);
            reference.extend(annotations);
            returned = Some(reference);
        }

        // 12) post-processing hook
        let out = returned.unwrap_or(definition);
        Ok(match &self.options.schema_processor {
            Some(processor) => processor.apply(out),
            None => out,
        })
    }

    fn type_name(
        &self,
        cx: &mut Context,
        ty: TypeId,
        node: &TypeNode,
        reffed: Option<SymbolId>,
        alias_ref: bool,
    ) -> String {
        let g = &self.graph;
        let unique = self.options.unique_names;
        if let (true, Some(alias)) = (alias_ref, reffed) {
            let symbol = g.symbol(alias);
            let base = canonical_name(symbol.fully_qualified_name());
            return match (&symbol.declaration, unique) {
                (Some(declaration), true) => format!("{base}.{}", declaration_hash(declaration)),
                _ => cx.names.make_unique(ty, &base),
            };
        }
        if unique
            && let Some(declaration) =
                declaring_symbol(g, node).and_then(|s| s.declaration.as_ref())
        {
            let base = cx.names.name_of(ty, || canonical_name(&g.type_to_string(ty)));
            return format!("{base}.{}", declaration_hash(declaration));
        }
        if let Some(r) = reffed
            && self.schema_overrides.contains_key(&g.symbol(r).name)
        {
            return g.symbol(r).name.clone();
        }
        cx.names.name_of(ty, || canonical_name(&g.type_to_string(ty)))
    }

    #[allow(clippy::too_many_arguments)]
    fn dispatch(
        &self,
        cx: &mut Context,
        ty: TypeId,
        node: &TypeNode,
        raw: bool,
        union: UnionModifier,
        prop: Option<&PropertyContext>,
        reffed: Option<SymbolId>,
        definition: &mut Definition,
    ) -> Result<()> {
        match &node.kind {
            TypeKind::Union { types } => self.union_definition(cx, types, prop, union, definition),
            TypeKind::Intersection { types } => self.intersection_definition(cx, types, definition),
            _ if raw => self.raw_definition(cx, ty, node, reffed, definition),
            TypeKind::Enum { members } => {
                enum_definition(&self.graph.type_to_string(ty), members, definition);
                Ok(())
            }
            TypeKind::EnumLiteral { .. } => {
                if let Some(value) = extract_literal(&node.kind) {
                    definition.insert("type".into(), Value::from(value.kind_name()));
                    definition.insert("enum".into(), Value::Array(vec![value.to_value()]));
                }
                Ok(())
            }
            TypeKind::Object { properties, anonymous: true, index } if properties.is_empty() => {
                definition.insert("type".into(), Value::from("object"));
                definition.insert("properties".into(), Value::Object(Default::default()));
                if let Some(value) = *index {
                    let additional =
                        self.build(cx, value, self.options.reference, union, prop, reffed)?;
                    definition.insert("additionalProperties".into(), additional.into());
                }
                Ok(())
            }
            TypeKind::Object { .. } => self.class_definition(cx, ty, node, definition),
            _ => self.raw_definition(cx, ty, node, reffed, definition),
        }
    }
}

/// Symbol whose declaration names a type: the alias when there is one.
fn declaring_symbol<'g, G: TypeGraphProvider + ?Sized>(
    graph: &'g G,
    node: &TypeNode,
) -> Option<&'g Symbol> {
    node.alias_symbol.or(node.symbol).map(|s| graph.symbol(s))
}
