//! Persisted per-group sync state.
//!
//! Stored as pretty-printed JSON and replaced atomically (write to a sibling
//! temp file, then rename). A missing file is an empty state.

use std::collections::BTreeMap;
use std::path::Path;

use metricsync_core::MonthKey;
use serde::{Deserialize, Serialize};

use crate::error::SyncError;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_id: Option<String>,
    /// Title last applied to the document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Latest closed month known to be present in the destination.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_synced: Option<MonthKey>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncState {
    #[serde(default)]
    pub groups: BTreeMap<String, GroupState>,
}

impl SyncState {
    /// # Errors
    ///
    /// Returns [`SyncError::StateIo`] if the file exists but cannot be read,
    /// or [`SyncError::StateFormat`] if it is not valid state JSON.
    pub fn load(path: &Path) -> Result<Self, SyncError> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no sync state yet; starting empty");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(SyncError::StateIo {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        serde_json::from_str(&raw).map_err(|source| SyncError::StateFormat {
            path: path.to_path_buf(),
            source,
        })
    }

    /// # Errors
    ///
    /// Returns [`SyncError::StateIo`] if the directory, temp file, or rename fails.
    pub fn save(&self, path: &Path) -> Result<(), SyncError> {
        let io_err = |source| SyncError::StateIo {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let body = serde_json::to_string_pretty(self).map_err(|source| SyncError::StateFormat {
            path: path.to_path_buf(),
            source,
        })?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, body).map_err(io_err)?;
        std::fs::rename(&tmp, path).map_err(io_err)?;
        Ok(())
    }

    #[must_use]
    pub fn group(&self, group_id: &str) -> Option<&GroupState> {
        self.groups.get(group_id)
    }

    /// Last synced month per group, for incremental runs.
    #[must_use]
    pub fn last_synced(&self) -> BTreeMap<String, MonthKey> {
        self.groups
            .iter()
            .filter_map(|(id, g)| g.last_synced.map(|m| (id.clone(), m)))
            .collect()
    }

    pub fn record_document(&mut self, group_id: &str, document_id: &str, title: Option<&str>) {
        let entry = self.groups.entry(group_id.to_string()).or_default();
        entry.document_id = Some(document_id.to_string());
        if let Some(title) = title {
            entry.title = Some(title.to_string());
        }
    }

    /// Advances the group's last synced month; never moves it backwards.
    pub fn record_synced(&mut self, group_id: &str, month: MonthKey) {
        let entry = self.groups.entry(group_id.to_string()).or_default();
        if entry.last_synced.is_none_or(|current| month > current) {
            entry.last_synced = Some(month);
        }
    }
}
