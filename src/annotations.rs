// src/annotations.rs
//! Doc comments and doc tags → schema keywords.
//!
//! A tag whose name is a known keyword lands on the definition (custom keywords get the
//! configured prefix); `parent.sub` tags nest under `parent`; anything else is recorded as
//! an "other" annotation, e.g. `@ignore`.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

use crate::definition::Definition;
use crate::error::{Error, Result};
use crate::graph::{DocPartKind, Symbol};

pub const VALIDATION_KEYWORDS: &[&str] = &[
    "format",
    "enum",
    "type",
    "items",
    "maximum",
    "exclusiveMaximum",
    "minimum",
    "exclusiveMinimum",
    "maxLength",
    "minLength",
    "pattern",
    "examples",
    "maxItems",
    "minItems",
    "uniqueItems",
    "multipleOf",
    "maxProperties",
    "minProperties",
    "additionalProperties",
    "example",
    "description",
    "default",
    "ref",
    "$ref",
    "title",
];

pub const OPENAPI_KEYWORDS: &[&str] =
    &["summary", "operationId", "tags", "contentType", "deprecated"];

/// Suppresses the annotated property or operation.
pub const IGNORE: &str = "ignore";

static REGEX_REQUIRE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r#"^(\s+)?require\(('@?[a-zA-Z0-9./_-]+'|"@?[a-zA-Z0-9./_-]+")\)"#,
        r#"(\.([a-zA-Z0-9_$]+))?(\s+|$)"#,
    ))
    .expect("require pattern is valid")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeywordKind {
    Validation,
    OpenApi,
    Custom,
}

/// Static keyword table plus the configured custom keywords.
#[derive(Debug, Clone)]
pub struct KeywordTable {
    custom: Vec<String>,
    prefix: String,
}

impl KeywordTable {
    pub fn new(custom: &[String], prefix: &str) -> Self {
        Self { custom: custom.to_vec(), prefix: prefix.to_owned() }
    }

    pub fn classify(&self, name: &str) -> Option<KeywordKind> {
        if VALIDATION_KEYWORDS.contains(&name) {
            Some(KeywordKind::Validation)
        } else if OPENAPI_KEYWORDS.contains(&name) {
            Some(KeywordKind::OpenApi)
        } else if self.custom.iter().any(|k| k == name) {
            Some(KeywordKind::Custom)
        } else {
            None
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    fn emitted_name(&self, name: &str, kind: KeywordKind) -> String {
        match kind {
            KeywordKind::Custom => format!("{}{name}", self.prefix),
            _ => name.to_owned(),
        }
    }
}

/// Keywords recognized on one symbol.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Annotations {
    pub definition: Definition,
    pub other: BTreeSet<String>,
}

impl Annotations {
    pub fn is_ignored(&self) -> bool {
        self.other.contains(IGNORE)
    }
}

// ---- require(...) ----

/// Loads values named by `require('<specifier>')[.<export>]` annotations.
pub trait ModuleResolver {
    /// `declaring_file` is the file of the annotated symbol, when known.
    fn resolve(
        &self,
        declaring_file: Option<&Path>,
        specifier: &str,
        export: Option<&str>,
    ) -> Result<Value>;
}

/// Resolves specifiers to JSON documents on disk.
///
/// Relative specifiers start from the declaring file's directory; package-style specifiers
/// start from `base_dir`. A path without an extension also tries `.json`.
#[derive(Debug, Clone)]
pub struct JsonModuleResolver {
    base_dir: PathBuf,
}

impl JsonModuleResolver {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self { base_dir: base_dir.into() }
    }

    fn locate(&self, declaring_file: Option<&Path>, specifier: &str) -> PathBuf {
        let relative = specifier.starts_with('.') || specifier.starts_with('/');
        let root = match declaring_file.and_then(Path::parent) {
            Some(dir) if relative => self.base_dir.join(dir),
            _ => self.base_dir.clone(),
        };
        let path = root.join(specifier.trim_start_matches('/'));
        if path.extension().is_none() && !path.is_file() {
            path.with_extension("json")
        } else {
            path
        }
    }
}

impl Default for JsonModuleResolver {
    fn default() -> Self {
        Self::new(".")
    }
}

impl ModuleResolver for JsonModuleResolver {
    fn resolve(
        &self,
        declaring_file: Option<&Path>,
        specifier: &str,
        export: Option<&str>,
    ) -> Result<Value> {
        let path = self.locate(declaring_file, specifier);
        let document: Value = crate::path_de::read_json_file(&path).map_err(|err| Error::Require {
            specifier: specifier.to_owned(),
            reason: format!("module couldn't be loaded: {err}"),
        })?;
        let value = match export {
            Some(name) => document.get(name).cloned(),
            None => Some(document.get("default").cloned().unwrap_or(document)),
        };
        value.ok_or_else(|| Error::Require {
            specifier: specifier.to_owned(),
            reason: format!("`{}` is undefined", export.unwrap_or("default")),
        })
    }
}

// ---- Parsing ----

pub struct AnnotationParser<'a> {
    keywords: &'a KeywordTable,
    modules: &'a dyn ModuleResolver,
}

impl<'a> AnnotationParser<'a> {
    pub fn new(keywords: &'a KeywordTable, modules: &'a dyn ModuleResolver) -> Self {
        Self { keywords, modules }
    }

    pub fn parse(&self, symbol: &Symbol) -> Result<Annotations> {
        let mut out = Annotations::default();
        self.parse_into(symbol, &mut out.definition, &mut out.other)?;
        Ok(out)
    }

    /// Merges `symbol`'s description and keyword tags into `def`; later keys overwrite.
    pub fn parse_into(
        &self,
        symbol: &Symbol,
        def: &mut Definition,
        other: &mut BTreeSet<String>,
    ) -> Result<()> {
        if !symbol.from_default_lib && !symbol.documentation.is_empty() {
            let description: String = symbol
                .documentation
                .iter()
                .map(|part| {
                    let text = part.text.replace("\r\n", "\n");
                    // unresolved {@link X} leaves dangling whitespace
                    if part.kind == DocPartKind::LinkText { text.trim().to_owned() } else { text }
                })
                .collect();
            def.insert("description".into(), Value::String(description.trim().to_owned()));
        }

        for tag in &symbol.tags {
            let name = tag.name.as_str();
            let text = tag.text.as_deref().unwrap_or("");

            // `@body .contentType x`: the sub-keyword arrives in the text
            if let Some(rest) = text.strip_prefix('.') {
                let mut parts = rest.split(' ');
                let sub = parts.next().unwrap_or("");
                if let Some(kind) = self.keywords.classify(sub) {
                    let value_text = parts.collect::<Vec<_>>().join(" ");
                    let value = if value_text.is_empty() {
                        Value::Bool(true)
                    } else {
                        self.parse_value(symbol, sub, &value_text)?
                    };
                    nest(def, name, self.keywords.emitted_name(sub, kind), value);
                    continue;
                }
            }

            // `@body.contentType x`
            if let Some((parent, sub)) = name.split_once('.')
                && !sub.contains('.')
                && let Some(kind) = self.keywords.classify(sub)
            {
                let value = match text.is_empty() {
                    true => Value::Bool(true),
                    false => self.parse_value(symbol, name, text)?,
                };
                nest(def, parent, self.keywords.emitted_name(sub, kind), value);
                continue;
            }

            match self.keywords.classify(name) {
                Some(kind) => {
                    let value = match text.is_empty() {
                        true => Value::Bool(true),
                        false => self.parse_value(symbol, name, text)?,
                    };
                    def.insert(self.keywords.emitted_name(name, kind), value);
                }
                None => {
                    other.insert(name.to_owned());
                }
            }
        }
        Ok(())
    }

    /// `require(...)` reference, else JSON, else the raw text.
    fn parse_value(&self, symbol: &Symbol, key: &str, text: &str) -> Result<Value> {
        if let Some(caps) = REGEX_REQUIRE.captures(text) {
            let quoted = &caps[2];
            let specifier = quoted[1..quoted.len() - 1].trim();
            let export = caps.get(4).map(|m| m.as_str());
            let declaring_file = symbol.declaration.as_ref().map(|d| d.file.as_path());
            let value = self.modules.resolve(declaring_file, specifier, export)?;
            if key == "examples" && !value.is_array() {
                return Err(Error::Require {
                    specifier: specifier.to_owned(),
                    reason: "value for `examples` isn't an array".into(),
                });
            }
            return Ok(value);
        }
        Ok(serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_owned())))
    }
}

fn nest(def: &mut Definition, parent: &str, key: String, value: Value) {
    let slot = def.entry(parent.to_owned()).or_insert_with(|| Value::Object(Map::new()));
    if !slot.is_object() {
        *slot = Value::Object(Map::new());
    }
    if let Value::Object(map) = slot {
        map.insert(key, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::DocPart;
    use serde_json::json;
    use std::collections::HashMap;

    /// In-memory modules keyed by specifier.
    struct FakeModules(HashMap<&'static str, Value>);

    impl ModuleResolver for FakeModules {
        fn resolve(
            &self,
            _file: Option<&Path>,
            specifier: &str,
            export: Option<&str>,
        ) -> Result<Value> {
            let doc = self.0.get(specifier).ok_or_else(|| Error::Require {
                specifier: specifier.into(),
                reason: "module couldn't be loaded".into(),
            })?;
            let value = match export {
                Some(name) => doc.get(name).cloned(),
                None => doc.get("default").cloned(),
            };
            value.ok_or_else(|| Error::Require {
                specifier: specifier.into(),
                reason: "undefined".into(),
            })
        }
    }

    fn parse_with(
        symbol: &Symbol,
        custom: &[&str],
        modules: &dyn ModuleResolver,
    ) -> Result<Annotations> {
        let custom: Vec<String> = custom.iter().map(|s| s.to_string()).collect();
        let table = KeywordTable::new(&custom, "x-");
        AnnotationParser::new(&table, modules).parse(symbol)
    }

    fn parse(symbol: &Symbol) -> Annotations {
        parse_with(symbol, &["internalId"], &FakeModules(HashMap::new())).unwrap()
    }

    #[test]
    fn description_joins_parts_and_trims_link_text() {
        let mut symbol = Symbol::new("Book");
        symbol.documentation = vec![
            DocPart { kind: DocPartKind::Text, text: "A book, see\r\n".into() },
            DocPart { kind: DocPartKind::LinkText, text: " Library ".into() },
            DocPart { kind: DocPartKind::Text, text: ".  ".into() },
        ];
        let description = parse(&symbol).definition.get("description").cloned();
        assert_eq!(description, Some(json!("A book, see\nLibrary.")));
    }

    #[test]
    fn default_lib_documentation_is_skipped() {
        let mut symbol = Symbol::new("Date").with_doc("Enables basic storage of dates.");
        symbol.from_default_lib = true;
        assert!(parse(&symbol).definition.is_empty());
    }

    #[test]
    fn tags_are_classified() {
        let symbol = Symbol::new("p")
            .with_tag("minimum", Some("0"))
            .with_tag("pattern", Some("^[a-z]+$"))
            .with_tag("deprecated", None)
            .with_tag("internalId", Some("{\"a\": 1}"))
            .with_tag("ignore", None)
            .with_tag("see", Some("elsewhere"));
        let ann = parse(&symbol);
        assert_eq!(
            Value::from(ann.definition),
            json!({
                "minimum": 0,
                "pattern": "^[a-z]+$",
                "deprecated": true,
                "x-internalId": { "a": 1 }
            })
        );
        assert!(ann.other.contains("ignore"));
        assert!(ann.other.contains("see"));
    }

    #[test]
    fn dotted_tags_nest_under_parent() {
        let symbol = Symbol::new("Op")
            .with_tag("body.contentType", Some("application/json"))
            .with_tag("body", Some(".description The payload"))
            .with_tag("body.unknownThing", Some("x"));
        let ann = parse(&symbol);
        assert_eq!(
            ann.definition.get("body"),
            Some(&json!({ "contentType": "application/json", "description": "The payload" }))
        );
        assert!(ann.other.contains("body.unknownThing"));
    }

    #[test]
    fn require_values_resolve_through_modules() {
        let modules = FakeModules(HashMap::from([(
            "./fixtures",
            json!({ "default": ["a", "b"], "single": "x" }),
        )]));
        let symbol = Symbol::new("p")
            .with_tag("examples", Some("require('./fixtures')"))
            .with_tag("default", Some("require(\"./fixtures\").single"));
        let ann = parse_with(&symbol, &[], &modules).unwrap();
        assert_eq!(ann.definition.get("examples"), Some(&json!(["a", "b"])));
        assert_eq!(ann.definition.get("default"), Some(&json!("x")));

        let bad = Symbol::new("p").with_tag("examples", Some("require('./fixtures').single"));
        let err = parse_with(&bad, &[], &modules).unwrap_err();
        assert!(err.to_string().contains("isn't an array"), "{err}");

        let missing = Symbol::new("p").with_tag("default", Some("require('./nowhere')"));
        assert!(matches!(parse_with(&missing, &[], &modules), Err(Error::Require { .. })));
    }
}
