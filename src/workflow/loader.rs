//! Workflow definition loader
//!
//! Load editor-exported JSON definitions from files or a synced directory.

use std::path::Path;

use super::WorkflowDefinition;

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error in {file}: {error}")]
    Json {
        file: String,
        error: serde_json::Error,
    },
}

pub struct WorkflowLoader;

impl WorkflowLoader {
    /// Load every `*.json` definition in a directory (kiosks sync a folder
    /// of editor exports)
    pub fn load_directory(dir: &Path) -> Result<Vec<WorkflowDefinition>, LoadError> {
        let mut definitions = Vec::new();

        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();

            if path.is_file() && path.extension().and_then(|e| e.to_str()) == Some("json") {
                definitions.push(Self::load_file(&path)?);
            }
        }

        Ok(definitions)
    }

    /// Load a single definition file
    pub fn load_file(path: &Path) -> Result<WorkflowDefinition, LoadError> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| LoadError::Json {
            file: path.display().to_string(),
            error: e,
        })
    }

    /// Parse a definition from a JSON string
    pub fn from_json(json: &str) -> Result<WorkflowDefinition, LoadError> {
        serde_json::from_str(json).map_err(|e| LoadError::Json {
            file: "<inline>".to_string(),
            error: e,
        })
    }

    /// Build a definition from an already-parsed JSON value (e.g. an
    /// editor API payload)
    pub fn from_value(value: serde_json::Value) -> Result<WorkflowDefinition, LoadError> {
        serde_json::from_value(value).map_err(|e| LoadError::Json {
            file: "<value>".to_string(),
            error: e,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const MINIMAL: &str = r#"{
        "id": "wf-1",
        "name": "minimal",
        "steps": {
            "nodes": [{"id": "a", "type": "trigger"}],
            "edges": []
        }
    }"#;

    #[test]
    fn test_load_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("minimal.json");
        fs::write(&path, MINIMAL).unwrap();

        let def = WorkflowLoader::load_file(&path).unwrap();
        assert_eq!(def.name, "minimal");
        assert_eq!(def.steps.nodes.len(), 1);
    }

    #[test]
    fn test_load_directory_skips_non_json() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("one.json"), MINIMAL).unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let defs = WorkflowLoader::load_directory(dir.path()).unwrap();
        assert_eq!(defs.len(), 1);
    }

    #[test]
    fn test_parse_error_names_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{ not json").unwrap();

        let err = WorkflowLoader::load_file(&path).unwrap_err();
        assert!(matches!(err, LoadError::Json { .. }));
        assert!(err.to_string().contains("broken.json"));
    }

    #[test]
    fn test_from_json() {
        let def = WorkflowLoader::from_json(MINIMAL).unwrap();
        assert_eq!(def.id, "wf-1");
        assert!(WorkflowLoader::from_json("[]").is_err());
    }

    #[test]
    fn test_from_value() {
        let value: serde_json::Value = serde_json::from_str(MINIMAL).unwrap();
        let def = WorkflowLoader::from_value(value).unwrap();
        assert_eq!(def.id, "wf-1");
        assert_eq!(def.steps.nodes[0].id, "a");

        let err = WorkflowLoader::from_value(serde_json::json!({"name": "incomplete"}));
        assert!(matches!(err, Err(LoadError::Json { .. })));
    }
}
