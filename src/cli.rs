//! Command line: type graph files + type names → JSON Schema definitions or an OpenAPI document.
use std::path::{Path, PathBuf};

use anyhow::{Context as _, bail};
use clap::Parser;

use crate::config::Options;
use crate::generator::{SchemaGenerator, TypeNamePattern};
use crate::graph::TypeGraph;
use crate::openapi::SpecData;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// generate OpenAPI operations or JSON Schema definitions from a resolved type graph
#[derive(Parser, Debug)]
#[command(name = "typegraph-oas", version)]
pub struct CommandLineInterface {
    /// type graph JSON files; comma-separated, literal paths or quoted glob patterns
    graph_files: String,

    /// type names to emit; comma-separated, `/regex/` selects by pattern
    type_names: String,

    /// generator options JSON file
    #[arg(short = 'p', long)]
    options_file: Option<PathBuf>,

    /// OpenAPI metadata JSON file (info, tags, servers, security, externalDocs, components)
    #[arg(short = 's', long)]
    spec_file: Option<PathBuf>,

    /// emit `{ "definitions": ... }` instead of an OpenAPI document
    #[arg(short = 'e', long, default_value_t = false)]
    schema_only: bool,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// debug logging on stderr
    #[arg(short, long, default_value_t = false)]
    verbose: bool,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn verbose(&self) -> bool {
        self.verbose
    }

    pub fn run(&self) -> anyhow::Result<()> {
        let graph = self.load_graph()?;
        let options = match &self.options_file {
            Some(path) => Options::from_json_file(path)?,
            None => Options::default(),
        };
        let patterns = split_list(&self.type_names)
            .map(TypeNamePattern::parse)
            .collect::<Result<Vec<_>, _>>()?;
        if patterns.is_empty() {
            bail!("no type names given");
        }

        let generator = SchemaGenerator::new(graph, options)?;
        tracing::debug!(matched = generator.symbols(&patterns).len(), "type names resolved");

        let output = if self.schema_only {
            serde_json::to_string_pretty(&generator.get_schemas(&patterns)?)?
        } else {
            let spec_data = match &self.spec_file {
                Some(path) => SpecData::from_json_file(path)?,
                None => SpecData::default(),
            };
            serde_json::to_string_pretty(&generator.get_openapi_spec(&patterns, spec_data)?)?
        };

        match self.output.as_ref() {
            Some(out) => write_output(out, &output),
            None => {
                println!("{output}");
                Ok(())
            }
        }
    }

    /// Reads every graph file and merges them in order.
    fn load_graph(&self) -> anyhow::Result<TypeGraph> {
        let paths = resolve_file_path_patterns(split_list(&self.graph_files))?;
        let mut paths = paths.into_iter();
        let Some(first) = paths.next() else {
            bail!("no type graph files given");
        };
        let mut graph = TypeGraph::from_json_file(&first)?;
        for path in paths {
            graph.merge(TypeGraph::from_json_file(&path)?);
        }
        graph.validate()?;
        Ok(graph)
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn split_list(list: &str) -> impl Iterator<Item = &str> {
    list.split(',').map(str::trim).filter(|item| !item.is_empty())
}

fn write_output(out: &Path, contents: &str) -> anyhow::Result<()> {
    if let Some(parent) = out.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(out, contents).with_context(|| format!("failed to write {}", out.display()))
}

fn resolve_file_path_patterns<I>(patterns: I) -> anyhow::Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{'))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            let mut matched_any = false;
            for entry in glob::glob(pattern)? {
                out.push(entry?);
                matched_any = true;
            }
            if !matched_any {
                bail!("glob pattern matched no files: {pattern}");
            }
        } else {
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}
