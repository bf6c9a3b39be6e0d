use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// How `edge-add-ready` descriptors with unknown endpoints are treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgePolicy {
    /// Insert verbatim and log a warning
    #[default]
    Permissive,
    /// Report and skip the insert
    Strict,
}

/// Editor behaviour switches
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub edge_policy: EdgePolicy,

    /// Write the draft color back to the node when an edit is confirmed.
    /// Off by default: only the label is persisted.
    pub commit_color_on_confirm: bool,
}

impl EditorConfig {
    /// Strict edge validation, everything else default
    pub fn strict() -> Self {
        Self {
            edge_policy: EdgePolicy::Strict,
            ..Self::default()
        }
    }

    /// Load config from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open config file: {}", path.display()))?;
        let reader = BufReader::new(file);
        serde_json::from_reader(reader)
            .with_context(|| format!("Failed to parse config from: {}", path.display()))
    }

    /// Save config to a JSON file
    pub fn save(&self, path: &Path) -> Result<()> {
        let file = File::create(path)
            .with_context(|| format!("Failed to create config file: {}", path.display()))?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)
            .with_context(|| format!("Failed to write config to: {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = EditorConfig::default();
        assert_eq!(config.edge_policy, EdgePolicy::Permissive);
        assert!(!config.commit_color_on_confirm);
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("editor.json");

        let config = EditorConfig {
            edge_policy: EdgePolicy::Strict,
            commit_color_on_confirm: true,
        };
        config.save(&path).unwrap();

        assert_eq!(EditorConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("editor.json");
        fs::write(&path, r#"{ "edge_policy": "strict" }"#).unwrap();

        assert_eq!(EditorConfig::load(&path).unwrap(), EditorConfig::strict());
    }

    #[test]
    fn test_missing_file_reports_path() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("absent.json");

        let err = EditorConfig::load(&path).unwrap_err();
        assert!(err.to_string().contains("absent.json"));
    }
}
