//! Model settings - knobs for how strictly documents are read and edited

use crate::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Behaviour switches for reading and editing a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    /// Fail with `MalformedTable` when a row's discovered cells disagree with
    /// its column count, instead of warning and trusting the cells
    pub strict_table_cells: bool,
    /// Run the coverage checks after every structural edit
    pub sanity_check_edits: bool,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            strict_table_cells: false,
            sanity_check_edits: cfg!(debug_assertions),
        }
    }
}

impl ModelSettings {
    /// Load settings from a JSON file. A missing file gives the defaults; so
    /// does a file that fails to parse, after a warning.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        match serde_json::from_str::<ModelSettings>(&content) {
            Ok(settings) => Ok(settings),
            Err(e) => {
                tracing::warn!(
                    "Failed to parse settings file {}, using defaults: {}",
                    path.display(),
                    e
                );
                Ok(Self::default())
            }
        }
    }

    /// Save settings as pretty JSON, creating parent directories
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let settings = ModelSettings::load(dir.path().join("absent.json")).unwrap();
        assert_eq!(settings, ModelSettings::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("model.json");
        let settings = ModelSettings {
            strict_table_cells: true,
            sanity_check_edits: false,
        };
        settings.save(&path).unwrap();
        assert_eq!(ModelSettings::load(&path).unwrap(), settings);
    }

    #[test]
    fn test_unparsable_file_falls_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("model.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert_eq!(ModelSettings::load(&path).unwrap(), ModelSettings::default());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let settings = ModelSettings::from_json(r#"{"strict_table_cells": true}"#).unwrap();
        assert!(settings.strict_table_cells);
        assert_eq!(
            settings.sanity_check_edits,
            ModelSettings::default().sanity_check_edits
        );
        assert!(ModelSettings::from_json("42").is_err());
        assert!(ModelSettings::from_json(r#"{"strict_table_cells": "yes"}"#).is_err());
    }
}
