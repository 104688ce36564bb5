// src/config.rs
//! Generator options, loadable from the `--options-file` JSON.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::definition::Definition;
use crate::error::Result;

/// Keyword collecting the branches of a multi-member union.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UnionModifier {
    #[default]
    AnyOf,
    OneOf,
}

impl UnionModifier {
    pub fn keyword(self) -> &'static str {
        match self {
            UnionModifier::AnyOf => "anyOf",
            UnionModifier::OneOf => "oneOf",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NumberType {
    #[default]
    Number,
    Integer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OpenApiVersion {
    #[serde(rename = "3.0.3")]
    #[default]
    V3_0_3,
    #[serde(rename = "3.1.0")]
    V3_1_0,
}

/// Post-processing hook applied to every definition the builder returns.
#[derive(Clone)]
pub struct SchemaProcessor(Arc<dyn Fn(Definition) -> Definition + Send + Sync>);

impl SchemaProcessor {
    pub fn new(f: impl Fn(Definition) -> Definition + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    pub fn apply(&self, def: Definition) -> Definition {
        (self.0)(def)
    }
}

impl fmt::Debug for SchemaProcessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SchemaProcessor(..)")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Options {
    /// Promote named types to `$ref`s instead of inlining them.
    #[serde(rename = "ref")]
    pub reference: bool,
    pub titles: bool,
    pub ignore_required: bool,
    /// Do not escalate graph diagnostics to an error.
    pub ignore_errors: bool,
    /// Suffix names with a hash of the declaring file and position.
    pub unique_names: bool,
    pub default_union_modifier: UnionModifier,
    pub default_number_type: NumberType,
    /// `None` follows the OpenAPI version: on for 3.0.3, off for 3.1.0.
    pub nullable_keyword: Option<bool>,
    pub default_content_type: String,
    pub custom_keywords: Vec<String>,
    pub custom_keyword_prefix: String,
    pub custom_operation_properties: bool,
    pub openapi_version: OpenApiVersion,
    #[serde(skip)]
    pub schema_processor: Option<SchemaProcessor>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            reference: false,
            titles: false,
            ignore_required: false,
            ignore_errors: false,
            unique_names: false,
            default_union_modifier: UnionModifier::AnyOf,
            default_number_type: NumberType::Number,
            nullable_keyword: None,
            default_content_type: "*/*".into(),
            custom_keywords: Vec::new(),
            custom_keyword_prefix: "x-".into(),
            custom_operation_properties: false,
            openapi_version: OpenApiVersion::V3_0_3,
            schema_processor: None,
        }
    }
}

impl Options {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        crate::path_de::read_json_file(path)
    }

    /// Whether `null` is written as `nullable: true` rather than `type: "null"`.
    pub fn uses_nullable_keyword(&self) -> bool {
        self.nullable_keyword.unwrap_or(self.openapi_version == OpenApiVersion::V3_0_3)
    }

    pub fn with_schema_processor(
        mut self,
        f: impl Fn(Definition) -> Definition + Send + Sync + 'static,
    ) -> Self {
        self.schema_processor = Some(SchemaProcessor::new(f));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn partial_json_keeps_defaults() {
        let opts: Options =
            serde_json::from_str(r#"{ "ref": true, "defaultUnionModifier": "oneOf" }"#).unwrap();
        assert!(opts.reference);
        assert_eq!(opts.default_union_modifier, UnionModifier::OneOf);
        assert_eq!(opts.default_content_type, "*/*");
        assert_eq!(opts.custom_keyword_prefix, "x-");
        assert!(opts.schema_processor.is_none());
    }

    #[rstest]
    #[case(OpenApiVersion::V3_0_3, None, true)]
    #[case(OpenApiVersion::V3_1_0, None, false)]
    #[case(OpenApiVersion::V3_1_0, Some(true), true)]
    #[case(OpenApiVersion::V3_0_3, Some(false), false)]
    fn nullable_keyword_follows_version(
        #[case] version: OpenApiVersion,
        #[case] explicit: Option<bool>,
        #[case] expected: bool,
    ) {
        let opts =
            Options { openapi_version: version, nullable_keyword: explicit, ..Options::default() };
        assert_eq!(opts.uses_nullable_keyword(), expected);
    }
}
