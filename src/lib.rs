//! JSON Schema definitions and OpenAPI documents from a resolved type graph.
//!
//! A [`TypeGraph`](graph::TypeGraph) (or any [`TypeGraphProvider`](graph::TypeGraphProvider))
//! is handed to a [`SchemaGenerator`], which builds schemas for the selected declarations with
//! [`SchemaGenerator::get_schemas`], or assembles API shape types into an OpenAPI document with
//! [`SchemaGenerator::get_openapi_spec`].

pub mod annotations;
pub mod cli;
pub mod config;
pub mod definition;
pub mod error;
pub mod generator;
pub mod graph;
pub mod literal;
pub mod openapi;
pub mod path_de;

pub use config::Options;
pub use definition::Definition;
pub use error::{Error, Result};
pub use generator::{SchemaDocument, SchemaGenerator, TypeNamePattern};
pub use openapi::{OpenApiDocument, SpecData};
