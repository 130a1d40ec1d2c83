//! CLI command implementations
//!
//! This module contains all CLI command implementations.

pub mod import;
pub mod init;
pub mod query;
pub mod validate;

use anyhow::Context;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;

/// Reads and deserializes a JSON file
pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Serializes a value as pretty JSON into a file
pub(crate) fn write_json<T: Serialize>(path: &Path, value: &T) -> anyhow::Result<()> {
    let contents = serde_json::to_string_pretty(value)?;
    std::fs::write(path, contents).with_context(|| format!("Failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_json_file_helpers() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("values.json");

        write_json(&path, &vec![1, 2, 3]).unwrap();
        let values: Vec<i32> = read_json(&path).unwrap();
        assert_eq!(values, vec![1, 2, 3]);
    }

    #[test]
    fn test_read_json_names_file() {
        let err = read_json::<Vec<i32>>(Path::new("missing.json")).unwrap_err();
        assert!(err.to_string().contains("missing.json"));
    }
}
