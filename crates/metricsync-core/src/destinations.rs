//! Group → destination-document mapping loaded from YAML.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DestinationEntry {
    pub group_id: String,
    pub document_id: String,
    /// Desired document title. When set, documents with a different title are renamed.
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DestinationsFile {
    #[serde(default)]
    pub destinations: Vec<DestinationEntry>,
}

impl DestinationsFile {
    #[must_use]
    pub fn find(&self, group_id: &str) -> Option<&DestinationEntry> {
        self.destinations.iter().find(|d| d.group_id == group_id)
    }
}

/// Load and validate the destinations file.
///
/// A missing file is not an error: every group then falls back to persisted
/// state or document creation.
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read, parsed, or
/// fails validation.
pub fn load_destinations(path: &Path) -> Result<DestinationsFile, ConfigError> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "destinations file not found; using empty mapping");
        return Ok(DestinationsFile::default());
    }

    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;

    let file: DestinationsFile =
        serde_yaml::from_str(&content).map_err(|e| ConfigError::Yaml {
            path: path.to_path_buf(),
            source: e,
        })?;

    validate_destinations(&file)?;
    Ok(file)
}

fn validate_destinations(file: &DestinationsFile) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();
    for entry in &file.destinations {
        if entry.group_id.trim().is_empty() || entry.document_id.trim().is_empty() {
            return Err(ConfigError::Validation(
                "destination entries need a non-empty group_id and document_id".to_string(),
            ));
        }
        if !seen.insert(entry.group_id.as_str()) {
            return Err(ConfigError::Validation(format!(
                "duplicate destination for group '{}'",
                entry.group_id
            )));
        }
    }
    Ok(())
}
