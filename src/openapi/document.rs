//! OpenAPI document structure.

use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::OpenApiVersion;
use crate::definition::Definition;
use crate::error::Result;

/// HTTP methods an API shape may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
    Trace,
}

impl HttpMethod {
    /// Key under a path item.
    pub fn path_key(self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::Post => "post",
            Self::Put => "put",
            Self::Patch => "patch",
            Self::Delete => "delete",
            Self::Head => "head",
            Self::Options => "options",
            Self::Trace => "trace",
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.path_key().to_uppercase())
    }
}

impl TryFrom<&str> for HttpMethod {
    type Error = String;

    /// Only the upper-case spelling is accepted.
    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "PATCH" => Ok(Self::Patch),
            "DELETE" => Ok(Self::Delete),
            "HEAD" => Ok(Self::Head),
            "OPTIONS" => Ok(Self::Options),
            "TRACE" => Ok(Self::Trace),
            other => Err(format!("unknown HTTP method: {other}")),
        }
    }
}

/// API information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Info {
    pub title: String,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// `termsOfService`, `contact`, `license`, ...
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for Info {
    fn default() -> Self {
        Self {
            title: "OpenAPI specification".into(),
            version: "1.0.0".into(),
            description: None,
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalDocumentation {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_docs: Option<ExternalDocumentation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Server {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variables: Option<IndexMap<String, Value>>,
}

/// Scheme name → required scopes.
pub type SecurityRequirement = IndexMap<String, Vec<String>>;

/// Reusable components. Only `schemas` is generated; other sections pass through.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Components {
    #[serde(default)]
    pub schemas: IndexMap<String, Definition>,
    /// `securitySchemes`, `responses`, `parameters`, ...
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

/// Document-level metadata supplied by the caller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SpecData {
    pub info: Option<Info>,
    pub tags: Vec<Tag>,
    pub servers: Vec<Server>,
    pub security: Vec<SecurityRequirement>,
    pub external_docs: Option<ExternalDocumentation>,
    pub components: Option<Components>,
}

impl SpecData {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        crate::path_de::read_json_file(path)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterLocation {
    Path,
    Query,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "in")]
    pub location: ParameterLocation,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<Value>,
    pub schema: Definition,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaType {
    pub schema: Definition,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestBody {
    /// `body.*` annotations other than `contentType`
    #[serde(flatten)]
    pub annotations: Map<String, Value>,
    pub content: IndexMap<String, MediaType>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub description: Value,
    #[serde(flatten)]
    pub annotations: Map<String, Value>,
    /// Absent when the response type is `never`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<IndexMap<String, MediaType>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    /// Shape annotations: `summary`, `description`, `deprecated`, custom keywords.
    #[serde(flatten)]
    pub annotations: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Parameter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_body: Option<RequestBody>,
    pub responses: IndexMap<String, Response>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security: Option<Vec<SecurityRequirement>>,
}

/// Lower-cased method → operation.
pub type PathItem = IndexMap<String, Operation>;

/// OpenAPI document (root structure)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenApiDocument {
    pub openapi: OpenApiVersion,
    pub info: Info,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub servers: Vec<Server>,
    pub paths: IndexMap<String, PathItem>,
    pub components: Components,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub security: Vec<SecurityRequirement>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_docs: Option<ExternalDocumentation>,
}

impl OpenApiDocument {
    /// An empty document carrying the caller's metadata.
    pub fn new(version: OpenApiVersion, spec_data: SpecData) -> Self {
        Self {
            openapi: version,
            info: spec_data.info.unwrap_or_default(),
            servers: spec_data.servers,
            paths: IndexMap::new(),
            components: spec_data.components.unwrap_or_default(),
            security: spec_data.security,
            tags: spec_data.tags,
            external_docs: spec_data.external_docs,
        }
    }
}
