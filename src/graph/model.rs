use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::literal::Literal;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SymbolId(pub u32);

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One resolved type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeNode {
    #[serde(flatten)]
    pub kind: TypeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<SymbolId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias_symbol: Option<SymbolId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alias_arguments: Vec<TypeId>,
    /// Element type of a numeric index signature (`T[]`, `Array<T>`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_index: Option<TypeId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub base_types: Vec<TypeId>,
}

impl TypeNode {
    pub fn new(kind: TypeKind) -> Self {
        Self {
            kind,
            symbol: None,
            alias_symbol: None,
            alias_arguments: Vec::new(),
            number_index: None,
            base_types: Vec::new(),
        }
    }

    pub fn with_symbol(mut self, symbol: SymbolId) -> Self {
        self.symbol = Some(symbol);
        self
    }

    pub fn with_alias(mut self, alias: SymbolId, arguments: Vec<TypeId>) -> Self {
        self.alias_symbol = Some(alias);
        self.alias_arguments = arguments;
        self
    }

    pub fn is_anonymous_object(&self) -> bool {
        matches!(self.kind, TypeKind::Object { anonymous: true, .. })
    }

    pub fn properties(&self) -> &[Property] {
        match &self.kind {
            TypeKind::Object { properties, .. } => properties,
            _ => &[],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum TypeKind {
    String,
    Number,
    Boolean,
    Null,
    Undefined,
    Void,
    Any,
    Unknown,
    Never,
    /// The bare `object` keyword.
    NonPrimitive,
    StringLiteral { value: String },
    NumberLiteral { value: f64 },
    BooleanLiteral { value: bool },
    /// A single enum member used as a type; `value` is the member's label or constant text.
    EnumLiteral { value: String },
    Union { types: Vec<TypeId> },
    Intersection { types: Vec<TypeId> },
    Tuple {
        elements: Vec<TypeId>,
        #[serde(default)]
        min_length: usize,
        #[serde(default)]
        has_rest: bool,
    },
    Object {
        #[serde(default)]
        properties: Vec<Property>,
        #[serde(default)]
        anonymous: bool,
        /// Value type of a string index signature (`Record<string, T>`, `{ [k: string]: T }`).
        #[serde(default, skip_serializing_if = "Option::is_none")]
        index: Option<TypeId>,
    },
    Enum { members: Vec<EnumMember> },
    TypeParameter,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    pub symbol: SymbolId,
    #[serde(rename = "type")]
    pub ty: TypeId,
    #[serde(default)]
    pub optional: bool,
    #[serde(default)]
    pub method: bool,
    #[serde(default)]
    pub private: bool,
    /// Symbol named by the property's type annotation, when it is a type reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referenced_symbol: Option<SymbolId>,
    /// Source text of the property initializer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initializer: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnumMember {
    pub name: String,
    /// Compiler-resolved constant value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Literal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initializer: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Symbol {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fully_qualified_name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub documentation: Vec<DocPart>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<DocTag>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub declaration: Option<Declaration>,
    /// Declared by the language's default library; its documentation is not copied.
    #[serde(default)]
    pub from_default_lib: bool,
}

impl Symbol {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), ..Self::default() }
    }

    pub fn fully_qualified_name(&self) -> &str {
        self.fully_qualified_name.as_deref().unwrap_or(&self.name)
    }

    pub fn with_doc(mut self, text: impl Into<String>) -> Self {
        self.documentation.push(DocPart { kind: DocPartKind::Text, text: text.into() });
        self
    }

    pub fn with_tag(mut self, name: impl Into<String>, text: Option<&str>) -> Self {
        self.tags.push(DocTag { name: name.into(), text: text.map(str::to_owned) });
        self
    }

    pub fn declared_at(
        mut self,
        file: impl Into<PathBuf>,
        position: u32,
        kind: DeclarationKind,
    ) -> Self {
        let file = file.into();
        self.declaration = Some(Declaration { file, position, kind, is_abstract: false });
        self
    }

    pub fn is_abstract(&self) -> bool {
        self.declaration.as_ref().is_some_and(|d| d.is_abstract)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocPart {
    #[serde(default)]
    pub kind: DocPartKind,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DocPartKind {
    #[default]
    Text,
    Link,
    /// Text of an inline `{@link ...}` tag.
    LinkText,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocTag {
    pub name: String,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Declaration {
    /// Declaring file, relative to the project root.
    pub file: PathBuf,
    /// Source offset of the declaration within `file`.
    pub position: u32,
    pub kind: DeclarationKind,
    #[serde(default, rename = "abstract")]
    pub is_abstract: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DeclarationKind {
    Class,
    Interface,
    TypeAlias,
    Enum,
    EnumMember,
    TypeLiteral,
    MappedType,
    Property,
    Other,
}

/// A pre-emit error reported by whatever produced the graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub message: String,
    #[serde(default)]
    pub file: Option<PathBuf>,
    #[serde(default)]
    pub line: Option<u32>,
    #[serde(default)]
    pub column: Option<u32>,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.file, self.line, self.column) {
            (Some(file), Some(line), Some(column)) => {
                write!(f, "{}:{line}:{column} - {}", file.display(), self.message)
            }
            (Some(file), _, _) => write!(f, "{} - {}", file.display(), self.message),
            _ => f.write_str(&self.message),
        }
    }
}
