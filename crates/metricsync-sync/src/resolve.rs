//! Destination document resolution for a group.
//!
//! Lookup order: the destinations file, then persisted state, then a new
//! document created in the configured folder. A document whose recorded title
//! differs from the desired one is renamed.

use metricsync_core::{DestinationsFile, Group};
use metricsync_sheets::{Destination, SheetsError};

use crate::state::SyncState;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Document(String),
    /// Dry run: a document would be created in the folder.
    WouldCreate,
    /// No mapping, no state, and no folder to create one in.
    Missing,
}

/// Title given to documents this system creates or manages.
#[must_use]
pub fn default_title(group: &Group) -> String {
    format!("{} Social Metrics", group.name.trim())
}

/// Resolves (and if needed creates or renames) the document for `group`.
///
/// Document ids and applied titles are recorded in `state`. A dry run never
/// creates or renames anything.
///
/// # Errors
///
/// Returns the destination's error if creating or renaming the document fails.
pub async fn resolve_destination<D: Destination + ?Sized>(
    destination: &D,
    group: &Group,
    destinations: &DestinationsFile,
    state: &mut SyncState,
    folder_id: Option<&str>,
    dry_run: bool,
) -> Result<Resolution, SheetsError> {
    let recorded = state.group(&group.group_id).cloned().unwrap_or_default();

    // A configured mapping only forces a title when the file names one.
    let (document_id, desired_title) = if let Some(entry) = destinations.find(&group.group_id) {
        (entry.document_id.clone(), entry.title.clone())
    } else if let Some(document_id) = recorded.document_id.clone() {
        (document_id, Some(default_title(group)))
    } else if let Some(folder) = folder_id.filter(|f| !f.trim().is_empty()) {
        if dry_run {
            return Ok(Resolution::WouldCreate);
        }
        let title = default_title(group);
        let document_id = destination.create_document(&title, folder).await?;
        state.record_document(&group.group_id, &document_id, Some(&title));
        return Ok(Resolution::Document(document_id));
    } else {
        return Ok(Resolution::Missing);
    };

    let needs_rename = desired_title
        .as_deref()
        .is_some_and(|desired| recorded.title.as_deref() != Some(desired));

    if needs_rename && !dry_run {
        if let Some(title) = desired_title.as_deref() {
            destination.rename_document(&document_id, title).await?;
            tracing::info!(group = %group.group_id, document_id = %document_id, title, "renamed destination document");
            state.record_document(&group.group_id, &document_id, Some(title));
        }
    } else if recorded.document_id.as_deref() != Some(document_id.as_str()) && !dry_run {
        state.record_document(&group.group_id, &document_id, None);
    }

    Ok(Resolution::Document(document_id))
}

#[cfg(test)]
mod tests {
    use metricsync_core::DestinationEntry;
    use metricsync_sheets::MemoryDestination;

    use super::*;

    fn group() -> Group {
        Group {
            group_id: "10".into(),
            name: "Acme".into(),
            profiles: Vec::new(),
        }
    }

    fn mapping(title: Option<&str>) -> DestinationsFile {
        DestinationsFile {
            destinations: vec![DestinationEntry {
                group_id: "10".into(),
                document_id: "doc-file".into(),
                title: title.map(str::to_string),
            }],
        }
    }

    #[tokio::test]
    async fn destinations_file_wins_and_renames_once() {
        let dest = MemoryDestination::new().with_document("doc-file", "Old");
        let mut state = SyncState::default();

        let first = resolve_destination(&dest, &group(), &mapping(Some("New")), &mut state, None, false)
            .await
            .unwrap();
        assert_eq!(first, Resolution::Document("doc-file".into()));
        assert_eq!(dest.document_title("doc-file").as_deref(), Some("New"));
        assert_eq!(state.group("10").unwrap().title.as_deref(), Some("New"));

        dest.rename_document("doc-file", "Manual").await.unwrap();
        resolve_destination(&dest, &group(), &mapping(Some("New")), &mut state, None, false)
            .await
            .unwrap();
        assert_eq!(dest.document_title("doc-file").as_deref(), Some("Manual"));
    }

    #[tokio::test]
    async fn untitled_mapping_is_never_renamed() {
        let dest = MemoryDestination::new().with_document("doc-file", "Theirs");
        let mut state = SyncState::default();
        resolve_destination(&dest, &group(), &mapping(None), &mut state, None, false)
            .await
            .unwrap();
        assert_eq!(dest.document_title("doc-file").as_deref(), Some("Theirs"));
        assert_eq!(state.group("10").unwrap().document_id.as_deref(), Some("doc-file"));
    }

    #[tokio::test]
    async fn state_document_is_renamed_to_default_title() {
        let dest = MemoryDestination::new().with_document("doc-state", "Acme Old Name");
        let mut state = SyncState::default();
        state.record_document("10", "doc-state", Some("Acme Old Name"));

        let resolved = resolve_destination(&dest, &group(), &DestinationsFile::default(), &mut state, None, false)
            .await
            .unwrap();
        assert_eq!(resolved, Resolution::Document("doc-state".into()));
        assert_eq!(dest.document_title("doc-state").as_deref(), Some("Acme Social Metrics"));
    }

    #[tokio::test]
    async fn missing_mapping_creates_document_in_folder() {
        let dest = MemoryDestination::new();
        let mut state = SyncState::default();

        let resolved = resolve_destination(
            &dest,
            &group(),
            &DestinationsFile::default(),
            &mut state,
            Some("folder-1"),
            false,
        )
        .await
        .unwrap();

        let Resolution::Document(id) = resolved else {
            panic!("expected a created document");
        };
        assert_eq!(dest.document_folder(&id).as_deref(), Some("folder-1"));
        assert_eq!(state.group("10").unwrap().document_id.as_deref(), Some(id.as_str()));
    }

    #[tokio::test]
    async fn without_folder_resolution_is_missing() {
        let dest = MemoryDestination::new();
        let mut state = SyncState::default();
        let resolved = resolve_destination(&dest, &group(), &DestinationsFile::default(), &mut state, None, false)
            .await
            .unwrap();
        assert_eq!(resolved, Resolution::Missing);
    }

    #[tokio::test]
    async fn dry_run_creates_nothing() {
        let dest = MemoryDestination::new();
        let mut state = SyncState::default();
        let resolved = resolve_destination(
            &dest,
            &group(),
            &DestinationsFile::default(),
            &mut state,
            Some("folder-1"),
            true,
        )
        .await
        .unwrap();
        assert_eq!(resolved, Resolution::WouldCreate);
        assert!(dest.document_ids().is_empty());
        assert!(state.groups.is_empty());
    }
}
