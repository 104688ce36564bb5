use std::path::PathBuf;

use crate::graph::{Diagnostic, TypeId};

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Upstream type-graph diagnostics, escalated unless `ignoreErrors` is set.
    #[error(
        "the type graph reports {} error(s); fix them or run with `ignoreErrors`:\n{}",
        .0.len(),
        render_diagnostics(.0)
    )]
    Diagnostics(Vec<Diagnostic>),

    /// A structural shape the builder cannot classify.
    #[error("unsupported type: {type_name}")]
    UnsupportedType { type_name: String, type_id: TypeId },

    /// An API shape that breaks the `{path, method, responses}` contract.
    #[error("api shape `{shape}`: {reason}")]
    Shape { shape: String, reason: String },

    #[error("api shape `{shape}`: `{status}` is not a valid HTTP status code")]
    InvalidStatusCode { shape: String, status: String },

    /// Failure resolving a `require(...)` annotation value.
    #[error("require({specifier}): {reason}")]
    Require { specifier: String, reason: String },

    /// Dangling ids or missing declarations in a type graph.
    #[error("malformed type graph: {0}")]
    Graph(String),

    #[error("failed to parse JSON ({}) at {path}: {source}", file.display())]
    Json {
        file: PathBuf,
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid type name pattern: {0}")]
    Pattern(#[from] regex::Error),
}

impl Error {
    pub(crate) fn shape(shape: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Shape { shape: shape.into(), reason: reason.into() }
    }
}

fn render_diagnostics(diagnostics: &[Diagnostic]) -> String {
    diagnostics
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}
