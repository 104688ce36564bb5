use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;

use super::names::NameRegistry;
use crate::annotations::Annotations;
use crate::definition::Definition;
use crate::graph::SymbolId;

pub const DEFINITIONS_REF_PATH: &str = "#/definitions/";
pub const COMPONENTS_REF_PATH: &str = "#/components/schemas/";

/// State of one `get_schemas` / `get_openapi_spec` call.
#[derive(Debug)]
pub struct Context {
    pub names: NameRegistry,
    /// Definitions promoted to named references, schema overrides first.
    pub reffed: IndexMap<String, Definition>,
    /// Names whose definition is under construction, with the owning frame's token.
    guard: HashMap<String, u64>,
    next_token: u64,
    /// Properties whose union type includes `undefined`.
    pub maybe_absent: HashSet<SymbolId>,
    pub ref_path: &'static str,
}

impl Context {
    pub fn new(ref_path: &'static str, overrides: &IndexMap<String, Definition>) -> Self {
        Self {
            names: NameRegistry::default(),
            reffed: overrides.clone(),
            guard: HashMap::new(),
            next_token: 0,
            maybe_absent: HashSet::new(),
            ref_path,
        }
    }

    pub fn ref_to(&self, name: &str) -> Definition {
        Definition::reference(format!("{}{name}", self.ref_path))
    }

    pub fn is_building(&self, name: &str) -> bool {
        self.guard.contains_key(name)
    }

    /// Marks `name` as under construction by a new frame.
    pub fn enter(&mut self, name: &str) -> u64 {
        self.next_token += 1;
        self.guard.insert(name.to_owned(), self.next_token);
        self.next_token
    }

    /// Clears the guard if `token` still owns it.
    pub fn leave(&mut self, name: &str, token: u64) -> bool {
        if self.guard.get(name) == Some(&token) {
            self.guard.remove(name);
            true
        } else {
            false
        }
    }
}

/// The property whose type is being built, with its annotations parsed once.
#[derive(Debug, Clone)]
pub struct PropertyContext {
    pub symbol: SymbolId,
    pub annotations: Annotations,
}
