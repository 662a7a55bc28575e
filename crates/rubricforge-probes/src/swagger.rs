//! Swagger/OpenAPI operation counting.
//!
//! The number of documented operations becomes the expected total of the
//! API completion ratio. Operations are the HTTP-method keys of each path
//! item under the top-level `paths` mapping, in JSON or YAML documents.

use std::path::Path;

use anyhow::{Context, Result};

use crate::error::ProbeError;

const METHODS: [&str; 8] = ["get", "post", "put", "delete", "patch", "head", "options", "trace"];

/// Count `path × method` operations in a Swagger/OpenAPI file.
pub fn count_operations(path: &Path) -> Result<u64> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read Swagger document: {}", path.display()))?;
    let is_json = path
        .extension()
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));

    let count = if is_json {
        count_operations_json(&content)
    } else {
        count_operations_yaml(&content)
    }
    .map_err(|reason| ProbeError::InvalidSwagger {
        path: path.to_path_buf(),
        reason,
    })?;
    tracing::info!("{} documents {count} API operations", path.display());
    Ok(count)
}

/// Count operations in a JSON document.
pub fn count_operations_json(content: &str) -> Result<u64, String> {
    let doc: serde_json::Value = serde_json::from_str(content).map_err(|e| e.to_string())?;
    let paths = doc
        .get("paths")
        .and_then(|p| p.as_object())
        .ok_or_else(|| "missing `paths` object".to_string())?;

    Ok(paths
        .values()
        .filter_map(|item| item.as_object())
        .map(|item| count_methods(item.keys().map(String::as_str)))
        .sum())
}

/// Count operations in a YAML document, block or flow style.
pub fn count_operations_yaml(content: &str) -> Result<u64, String> {
    let doc: serde_yaml::Value = serde_yaml::from_str(content).map_err(|e| e.to_string())?;
    let paths = doc
        .get("paths")
        .and_then(|p| p.as_mapping())
        .ok_or_else(|| "missing `paths` mapping".to_string())?;

    Ok(paths
        .values()
        .filter_map(|item| item.as_mapping())
        .map(|item| count_methods(item.keys().filter_map(|k| k.as_str())))
        .sum())
}

fn count_methods<'a>(keys: impl Iterator<Item = &'a str>) -> u64 {
    keys.filter(|k| METHODS.contains(&k.to_lowercase().as_str()))
        .count() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_counts_methods_only() {
        let doc = r#"{
            "openapi": "3.0.0",
            "paths": {
                "/books": {"get": {}, "post": {}, "parameters": []},
                "/books/{id}": {"get": {}, "PUT": {}, "delete": {}},
                "/health": {"summary": "no operations"}
            }
        }"#;
        assert_eq!(count_operations_json(doc).unwrap(), 5);
        assert!(count_operations_json(r#"{"info": {}}"#).is_err());
        assert!(count_operations_json("not json").is_err());
    }

    #[test]
    fn yaml_counts_methods_under_paths() {
        let doc = "\
openapi: 3.0.0
info:
  title: books
  get: not-an-operation
paths:
  /books:
    get:
      summary: list
    post:
      summary: create
  /books/{id}:
    parameters: []
    'delete':
      summary: remove
components:
  schemas:
    get:
      type: object
";
        assert_eq!(count_operations_yaml(doc).unwrap(), 3);
    }

    #[test]
    fn yaml_flow_style_paths() {
        let flow = "openapi: 3.0.0\npaths: {/books: {get: {}, post: {}}, '/books/{id}': {delete: {}}}\n";
        assert_eq!(count_operations_yaml(flow).unwrap(), 3);

        let inline = "paths:\n  /books: {get: {summary: list}, post: {summary: create}}\n  /health:\n    get:\n      summary: ok\n";
        assert_eq!(count_operations_yaml(inline).unwrap(), 3);
    }

    #[test]
    fn yaml_without_paths_is_rejected() {
        assert!(count_operations_yaml("openapi: 3.0.0\ninfo: {}\n").is_err());
        assert!(count_operations_yaml("paths: [unclosed").is_err());
        assert_eq!(count_operations_yaml("paths: {}\n").unwrap(), 0);
    }

    #[test]
    fn count_from_file_uses_extension() {
        let dir = tempfile::tempdir().unwrap();
        let json = dir.path().join("swagger.json");
        std::fs::write(&json, r#"{"paths": {"/a": {"get": {}}}}"#).unwrap();
        assert_eq!(count_operations(&json).unwrap(), 1);

        let yaml = dir.path().join("swagger.yaml");
        std::fs::write(&yaml, "paths:\n  /a:\n    get:\n      summary: x\n").unwrap();
        assert_eq!(count_operations(&yaml).unwrap(), 1);

        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, "{}").unwrap();
        let err = count_operations(&bad).unwrap_err();
        assert!(err.to_string().contains("invalid Swagger document"));
    }
}
