use std::collections::HashMap;
use std::path::PathBuf;

use super::model::{
    DeclarationKind, Diagnostic, EnumMember, Property, Symbol, SymbolId, TypeId, TypeKind, TypeNode,
};
use super::{TypeGraph, TypeGraphProvider};

/// Name the type checker gives the symbol of an anonymous type literal.
pub const TYPE_LITERAL_SYMBOL: &str = "__type";

/// Incremental constructor for [`TypeGraph`]s.
///
/// Intrinsic and literal types are interned, so `string()` always returns the same id.
#[derive(Debug)]
pub struct GraphBuilder {
    graph: TypeGraph,
    interned: HashMap<String, TypeId>,
    file: PathBuf,
    next_position: u32,
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self {
            graph: TypeGraph::default(),
            interned: HashMap::new(),
            file: PathBuf::from("types.ts"),
            next_position: 0,
        }
    }

    /// Declarations made from now on are attributed to `file`.
    pub fn in_file(&mut self, file: impl Into<PathBuf>) -> &mut Self {
        self.file = file.into();
        self
    }

    pub fn finish(self) -> TypeGraph {
        self.graph
    }

    pub fn graph(&self) -> &TypeGraph {
        &self.graph
    }

    // ---- Raw insertion ----

    pub fn add_type(&mut self, node: TypeNode) -> TypeId {
        let id = TypeId(self.graph.types.len() as u32);
        self.graph.types.push(node);
        id
    }

    pub fn add_symbol(&mut self, symbol: Symbol) -> SymbolId {
        let id = SymbolId(self.graph.symbols.len() as u32);
        self.graph.symbols.push(symbol);
        id
    }

    /// Placeholder for a type defined later (recursive shapes).
    pub fn reserve(&mut self) -> TypeId {
        self.add_type(TypeNode::new(TypeKind::Never))
    }

    pub fn define(&mut self, id: TypeId, node: TypeNode) {
        self.graph.types[id.0 as usize] = node;
    }

    pub fn declare(&mut self, name: impl Into<String>, id: TypeId) {
        self.graph.declarations.insert(name.into(), id);
    }

    pub fn diagnostic(&mut self, diagnostic: Diagnostic) {
        self.graph.diagnostics.push(diagnostic);
    }

    /// A symbol declared in the current file at the next source position.
    pub fn declared_symbol(&mut self, name: &str, kind: DeclarationKind) -> SymbolId {
        let position = self.next_position;
        self.next_position += 100;
        let file = self.file.clone();
        self.add_symbol(Symbol::new(name).declared_at(file, position, kind))
    }

    pub fn symbol_mut(&mut self, id: SymbolId) -> &mut Symbol {
        &mut self.graph.symbols[id.0 as usize]
    }

    // ---- Intrinsics and literals ----

    fn intern(&mut self, key: String, kind: TypeKind) -> TypeId {
        if let Some(id) = self.interned.get(&key) {
            return *id;
        }
        let id = self.add_type(TypeNode::new(kind));
        self.interned.insert(key, id);
        id
    }

    pub fn string(&mut self) -> TypeId {
        self.intern("string".into(), TypeKind::String)
    }

    pub fn number(&mut self) -> TypeId {
        self.intern("number".into(), TypeKind::Number)
    }

    pub fn boolean(&mut self) -> TypeId {
        self.intern("boolean".into(), TypeKind::Boolean)
    }

    pub fn null(&mut self) -> TypeId {
        self.intern("null".into(), TypeKind::Null)
    }

    pub fn undefined(&mut self) -> TypeId {
        self.intern("undefined".into(), TypeKind::Undefined)
    }

    pub fn void(&mut self) -> TypeId {
        self.intern("void".into(), TypeKind::Void)
    }

    pub fn any(&mut self) -> TypeId {
        self.intern("any".into(), TypeKind::Any)
    }

    pub fn unknown(&mut self) -> TypeId {
        self.intern("unknown".into(), TypeKind::Unknown)
    }

    pub fn never(&mut self) -> TypeId {
        self.intern("never".into(), TypeKind::Never)
    }

    /// The bare `object` keyword.
    pub fn object_keyword(&mut self) -> TypeId {
        self.intern("object".into(), TypeKind::NonPrimitive)
    }

    pub fn string_literal(&mut self, value: &str) -> TypeId {
        self.intern(format!("{value:?}"), TypeKind::StringLiteral { value: value.to_owned() })
    }

    pub fn number_literal(&mut self, value: f64) -> TypeId {
        self.intern(format!("#{value}"), TypeKind::NumberLiteral { value })
    }

    pub fn boolean_literal(&mut self, value: bool) -> TypeId {
        self.intern(value.to_string(), TypeKind::BooleanLiteral { value })
    }

    /// The built-in `Date` class.
    pub fn date(&mut self) -> TypeId {
        if let Some(id) = self.interned.get("Date") {
            return *id;
        }
        let mut symbol = Symbol::new("Date");
        symbol.from_default_lib = true;
        let symbol = self.add_symbol(symbol);
        let node = TypeNode::new(empty_object()).with_symbol(symbol);
        let id = self.add_type(node);
        self.interned.insert("Date".into(), id);
        id
    }

    /// Branded `integer` number type.
    pub fn integer(&mut self) -> TypeId {
        if let Some(id) = self.interned.get("integer") {
            return *id;
        }
        let symbol = self.declared_symbol("integer", DeclarationKind::TypeAlias);
        let id = self.add_type(TypeNode::new(TypeKind::Number).with_symbol(symbol));
        self.interned.insert("integer".into(), id);
        id
    }

    // ---- Composites ----

    pub fn union(&mut self, types: impl IntoIterator<Item = TypeId>) -> TypeId {
        let types = types.into_iter().collect();
        self.add_type(TypeNode::new(TypeKind::Union { types }))
    }

    pub fn intersection(&mut self, types: impl IntoIterator<Item = TypeId>) -> TypeId {
        let types = types.into_iter().collect();
        self.add_type(TypeNode::new(TypeKind::Intersection { types }))
    }

    /// `T[]`
    pub fn array(&mut self, element: TypeId) -> TypeId {
        let mut node = TypeNode::new(empty_object());
        node.number_index = Some(element);
        self.add_type(node)
    }

    pub fn tuple(
        &mut self,
        elements: impl IntoIterator<Item = TypeId>,
        min_length: usize,
        has_rest: bool,
    ) -> TypeId {
        let elements = elements.into_iter().collect();
        self.add_type(TypeNode::new(TypeKind::Tuple { elements, min_length, has_rest }))
    }

    /// `enum Name { ... }`, declared under `name`.
    pub fn enumeration(
        &mut self,
        name: &str,
        members: impl IntoIterator<Item = EnumMember>,
    ) -> TypeId {
        let symbol = self.declared_symbol(name, DeclarationKind::Enum);
        let members = members.into_iter().collect();
        let id = self.add_type(TypeNode::new(TypeKind::Enum { members }).with_symbol(symbol));
        self.declare(name, id);
        id
    }

    /// `type Name = target`: a copy of `target` carrying the alias symbol, declared under `name`.
    pub fn alias(&mut self, name: &str, target: TypeId) -> TypeId {
        self.alias_with_args(name, target, Vec::new())
    }

    pub fn alias_with_args(
        &mut self,
        name: &str,
        target: TypeId,
        arguments: Vec<TypeId>,
    ) -> TypeId {
        let alias = self.declared_symbol(name, DeclarationKind::TypeAlias);
        let node = self.graph.ty(target).clone().with_alias(alias, arguments);
        let id = self.add_type(node);
        self.declare(name, id);
        id
    }

    // ---- Object shapes ----

    /// `interface Name { ... }`
    pub fn interface(&mut self, name: &str) -> ObjectBuilder<'_> {
        let symbol = self.declared_symbol(name, DeclarationKind::Interface);
        ObjectBuilder::new(self, symbol, false, Some(name.to_owned()))
    }

    /// `class Name { ... }`
    pub fn class(&mut self, name: &str) -> ObjectBuilder<'_> {
        let symbol = self.declared_symbol(name, DeclarationKind::Class);
        ObjectBuilder::new(self, symbol, false, Some(name.to_owned()))
    }

    /// An anonymous `{ ... }` literal. Give it a name with [`ObjectBuilder::alias`].
    pub fn type_literal(&mut self) -> ObjectBuilder<'_> {
        let symbol = self.declared_symbol(TYPE_LITERAL_SYMBOL, DeclarationKind::TypeLiteral);
        ObjectBuilder::new(self, symbol, true, None)
    }
}

/// Property description accepted by [`ObjectBuilder::prop`].
#[derive(Debug, Clone)]
pub struct Prop {
    name: String,
    ty: TypeId,
    optional: bool,
    method: bool,
    private: bool,
    docs: Vec<String>,
    tags: Vec<(String, Option<String>)>,
    initializer: Option<String>,
    references: Option<SymbolId>,
}

impl Prop {
    pub fn new(name: &str, ty: TypeId) -> Self {
        Self {
            name: name.to_owned(),
            ty,
            optional: false,
            method: false,
            private: false,
            docs: Vec::new(),
            tags: Vec::new(),
            initializer: None,
            references: None,
        }
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn method(mut self) -> Self {
        self.method = true;
        self
    }

    pub fn private(mut self) -> Self {
        self.private = true;
        self
    }

    pub fn doc(mut self, text: &str) -> Self {
        self.docs.push(text.to_owned());
        self
    }

    pub fn tag(mut self, name: &str, text: Option<&str>) -> Self {
        self.tags.push((name.to_owned(), text.map(str::to_owned)));
        self
    }

    pub fn initializer(mut self, source: &str) -> Self {
        self.initializer = Some(source.to_owned());
        self
    }

    /// Symbol named by the property's type annotation. Defaults to the target's alias or symbol.
    pub fn references(mut self, symbol: SymbolId) -> Self {
        self.references = Some(symbol);
        self
    }
}

pub struct ObjectBuilder<'a> {
    builder: &'a mut GraphBuilder,
    symbol: SymbolId,
    anonymous: bool,
    declared_as: Option<String>,
    alias: Option<SymbolId>,
    properties: Vec<Property>,
    index: Option<TypeId>,
    base_types: Vec<TypeId>,
}

impl<'a> ObjectBuilder<'a> {
    fn new(
        builder: &'a mut GraphBuilder,
        symbol: SymbolId,
        anonymous: bool,
        declared_as: Option<String>,
    ) -> Self {
        Self {
            builder,
            symbol,
            anonymous,
            declared_as,
            alias: None,
            properties: Vec::new(),
            index: None,
            base_types: Vec::new(),
        }
    }

    /// `type Name = { ... }`
    pub fn alias(mut self, name: &str) -> Self {
        self.alias = Some(self.builder.declared_symbol(name, DeclarationKind::TypeAlias));
        self.declared_as = Some(name.to_owned());
        self
    }

    /// Symbol that carries documentation: the alias when there is one.
    fn doc_symbol(&self) -> SymbolId {
        self.alias.unwrap_or(self.symbol)
    }

    pub fn doc(self, text: &str) -> Self {
        let id = self.doc_symbol();
        let symbol = std::mem::take(self.builder.symbol_mut(id)).with_doc(text);
        *self.builder.symbol_mut(id) = symbol;
        self
    }

    pub fn tag(self, name: &str, text: Option<&str>) -> Self {
        let id = self.doc_symbol();
        let symbol = std::mem::take(self.builder.symbol_mut(id)).with_tag(name, text);
        *self.builder.symbol_mut(id) = symbol;
        self
    }

    pub fn abstract_(self) -> Self {
        if let Some(declaration) = self.builder.symbol_mut(self.symbol).declaration.as_mut() {
            declaration.is_abstract = true;
        }
        self
    }

    pub fn extends(mut self, base: TypeId) -> Self {
        self.base_types.push(base);
        self
    }

    /// String index signature; marks a type literal as a mapped type.
    pub fn index(mut self, value: TypeId) -> Self {
        self.index = Some(value);
        if self.anonymous
            && let Some(declaration) = self.builder.symbol_mut(self.symbol).declaration.as_mut()
        {
            declaration.kind = DeclarationKind::MappedType;
        }
        self
    }

    pub fn prop(mut self, prop: Prop) -> Self {
        let mut symbol = Symbol::new(&prop.name);
        for text in &prop.docs {
            symbol = symbol.with_doc(text.as_str());
        }
        for (name, text) in &prop.tags {
            symbol = symbol.with_tag(name.as_str(), text.as_deref());
        }
        let symbol = self.builder.add_symbol(symbol);

        let referenced_symbol = prop.references.or_else(|| {
            let target = self.builder.graph.types.get(prop.ty.0 as usize)?;
            target.alias_symbol.or(if target.is_anonymous_object() { None } else { target.symbol })
        });

        self.properties.push(Property {
            symbol,
            ty: prop.ty,
            optional: prop.optional,
            method: prop.method,
            private: prop.private,
            referenced_symbol,
            initializer: prop.initializer,
        });
        self
    }

    pub fn build(self) -> TypeId {
        let id = self.builder.reserve();
        self.build_into(id)
    }

    /// Fills a slot obtained from [`GraphBuilder::reserve`].
    pub fn build_into(self, id: TypeId) -> TypeId {
        let mut node = TypeNode::new(TypeKind::Object {
            properties: self.properties,
            anonymous: self.anonymous,
            index: self.index,
        })
        .with_symbol(self.symbol);
        node.alias_symbol = self.alias;
        node.base_types = self.base_types;
        self.builder.define(id, node);
        if let Some(name) = self.declared_as {
            self.builder.declare(name, id);
        }
        id
    }
}

/// Non-anonymous object with no members; arrays and `Date` start from it.
fn empty_object() -> TypeKind {
    TypeKind::Object { properties: Vec::new(), anonymous: false, index: None }
}
