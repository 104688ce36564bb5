use std::path::Path;

use serde::de::DeserializeOwned;

use crate::error::{Error, Result};

/// Deserialize with JSON-path context in error messages.
pub fn from_str_with_path<T: DeserializeOwned>(src: &str, file: &Path) -> Result<T> {
    let de = &mut serde_json::Deserializer::from_str(src);
    serde_path_to_error::deserialize::<_, T>(de).map_err(|err| {
        let path = err.path().to_string();
        Error::Json { file: file.to_path_buf(), path, source: err.into_inner() }
    })
}

pub fn read_json_file<T: DeserializeOwned>(file: &Path) -> Result<T> {
    let src = std::fs::read_to_string(file)
        .map_err(|source| Error::Io { path: file.to_path_buf(), source })?;
    from_str_with_path(&src, file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::TypeGraph;

    #[test]
    fn errors_carry_the_json_path() {
        let src = r#"{ "types": [ { "kind": "string" }, { "kind": "union", "types": ["x"] } ] }"#;
        let err = from_str_with_path::<TypeGraph>(src, Path::new("graph.json")).unwrap_err();
        let text = err.to_string();
        assert!(text.contains("graph.json"), "{text}");
        assert!(text.contains("types[1]"), "{text}");
    }

    #[test]
    fn missing_files_are_io_errors() {
        let err = read_json_file::<TypeGraph>(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }
}
