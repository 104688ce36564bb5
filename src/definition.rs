// src/definition.rs
//! JSON-Schema-shaped output node.

use std::ops::{Deref, DerefMut};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Descriptive keywords allowed to sit next to `$ref`.
pub const REF_KEYWORDS: &[&str] = &["description", "default", "examples", "$ref"];

/// Open keyword map. Key order is insertion order, which is also the emitted order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Definition(Map<String, Value>);

impl Deref for Definition {
    type Target = Map<String, Value>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for Definition {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl From<Definition> for Value {
    fn from(def: Definition) -> Self {
        Value::Object(def.0)
    }
}

impl From<Map<String, Value>> for Definition {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl Definition {
    pub fn new() -> Self {
        Self::default()
    }

    /// `{ "$ref": path }`
    pub fn reference(path: impl Into<String>) -> Self {
        let mut def = Self::new();
        def.insert("$ref".into(), Value::String(path.into()));
        def
    }

    /// `{ "type": ty }`
    pub fn of_type(ty: &str) -> Self {
        let mut def = Self::new();
        def.insert("type".into(), Value::String(ty.to_owned()));
        def
    }

    /// Objects become definitions; anything else is rejected.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    /// `type` when it is a single keyword.
    pub fn type_name(&self) -> Option<&str> {
        self.get("type").and_then(Value::as_str)
    }

    pub fn ref_target(&self) -> Option<&str> {
        self.get("$ref").and_then(Value::as_str)
    }

    /// Exactly `{ "type": ... }` and nothing else.
    pub fn is_bare_type(&self) -> bool {
        self.len() == 1 && self.contains_key("type")
    }

    /// The ref keywords carried by this node, `$ref` itself excluded.
    pub fn ref_annotations(&self) -> Map<String, Value> {
        self.iter()
            .filter(|(key, _)| *key != "$ref" && REF_KEYWORDS.contains(&key.as_str()))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }

    /// Copies every key of `other` over this node.
    pub fn merge(&mut self, other: Definition) {
        for (key, value) in other.0 {
            self.insert(key, value);
        }
    }

    /// Property schemas under `properties`, if present.
    pub fn properties(&self) -> Option<&Map<String, Value>> {
        self.get("properties").and_then(Value::as_object)
    }

    pub fn required_contains(&self, name: &str) -> bool {
        self.get("required")
            .and_then(Value::as_array)
            .is_some_and(|names| names.iter().any(|n| n.as_str() == Some(name)))
    }
}
