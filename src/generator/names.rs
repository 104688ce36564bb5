use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;
use sha2::{Digest, Sha256};

use crate::graph::{Declaration, TypeId};

/// Module-path quoting and spaces dropped from printed type names.
static REGEX_FILE_NAME_OR_SPACE: Lazy<Regex> =
    Lazy::new(|| {
        Regex::new(r#"(\bimport\(".*?"\)|".*?")\.| "#).expect("file-name pattern is valid")
    });

/// Names that may become `$ref` targets.
pub(crate) static REGEX_REF_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9A-Za-z._]+$").expect("ref-name pattern is valid"));

/// `"./models".Book` → `Book`, `string | null` → `string|null`.
pub fn canonical_name(printed: &str) -> String {
    REGEX_FILE_NAME_OR_SPACE.replace_all(printed, "").into_owned()
}

/// First 8 hex digits of a hash over the declaring file and source position.
pub fn declaration_hash(declaration: &Declaration) -> String {
    let mut hasher = Sha256::new();
    hasher.update(declaration.file.to_string_lossy().as_bytes());
    hasher.update(b"\0");
    hasher.update(declaration.position.to_string().as_bytes());
    hasher.finalize().iter().take(4).map(|b| format!("{b:02x}")).collect()
}

/// Type id ↔ name for one generation call.
///
/// A name already held by another type gets `_1`, `_2`, ... appended.
#[derive(Debug, Default)]
pub struct NameRegistry {
    names_by_id: HashMap<TypeId, String>,
    ids_by_name: HashMap<String, TypeId>,
}

impl NameRegistry {
    /// The name assigned to `ty`, assigning one derived from `base` on first use.
    pub fn name_of(&mut self, ty: TypeId, base: impl FnOnce() -> String) -> String {
        match self.names_by_id.get(&ty) {
            Some(name) => name.clone(),
            None => self.make_unique(ty, &base()),
        }
    }

    pub fn make_unique(&mut self, ty: TypeId, base: &str) -> String {
        let mut name = base.to_owned();
        let mut suffix = 1;
        loop {
            match self.ids_by_name.get(&name) {
                Some(owner) if *owner != ty => {
                    name = format!("{base}_{suffix}");
                    suffix += 1;
                }
                _ => break,
            }
        }
        self.names_by_id.insert(ty, name.clone());
        self.ids_by_name.insert(name.clone(), ty);
        name
    }
}
