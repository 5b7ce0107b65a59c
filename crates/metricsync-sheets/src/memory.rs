//! In-memory [`Destination`] for tests and dry runs. Thread-safe.

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use metricsync_core::CellValue;

use crate::destination::{Destination, SheetInfo};
use crate::error::SheetsError;

#[derive(Debug)]
struct MemorySheet {
    info: SheetInfo,
    rows: Vec<Vec<CellValue>>,
}

#[derive(Debug, Default)]
struct MemoryDocument {
    title: String,
    folder_id: Option<String>,
    sheets: Vec<MemorySheet>,
}

#[derive(Debug, Default)]
struct MemoryState {
    documents: BTreeMap<String, MemoryDocument>,
    next_document: u64,
    next_sheet: i64,
    append_calls: usize,
    fail_status: Option<u16>,
}

/// Documents, sheets and rows kept in a mutex-guarded map.
#[derive(Debug, Default)]
pub struct MemoryDestination {
    state: Mutex<MemoryState>,
}

/// Zero-based index of an A1 column letter (`A` → 0, `AA` → 26).
fn column_index(column: &str) -> Option<usize> {
    let mut index = 0usize;
    for c in column.trim().chars() {
        if !c.is_ascii_alphabetic() {
            return None;
        }
        index = index * 26 + (c.to_ascii_uppercase() as usize - 'A' as usize + 1);
    }
    index.checked_sub(1)
}

impl MemoryDestination {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an existing, empty document.
    #[must_use]
    pub fn with_document(self, document_id: &str, title: &str) -> Self {
        self.lock().documents.insert(
            document_id.to_string(),
            MemoryDocument {
                title: title.to_string(),
                ..MemoryDocument::default()
            },
        );
        self
    }

    /// Makes every subsequent call fail as if the API had answered `status`;
    /// `None` restores normal behavior.
    pub fn fail_with_status(&self, status: Option<u16>) {
        self.lock().fail_status = status;
    }

    /// Rows of `sheet`, header included.
    #[must_use]
    pub fn rows(&self, document_id: &str, sheet: &str) -> Vec<Vec<CellValue>> {
        self.lock()
            .documents
            .get(document_id)
            .and_then(|d| d.sheets.iter().find(|s| s.info.title == sheet))
            .map(|s| s.rows.clone())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn sheet_titles(&self, document_id: &str) -> Vec<String> {
        self.lock()
            .documents
            .get(document_id)
            .map(|d| d.sheets.iter().map(|s| s.info.title.clone()).collect())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn document_title(&self, document_id: &str) -> Option<String> {
        self.lock().documents.get(document_id).map(|d| d.title.clone())
    }

    #[must_use]
    pub fn document_folder(&self, document_id: &str) -> Option<String> {
        self.lock()
            .documents
            .get(document_id)
            .and_then(|d| d.folder_id.clone())
    }

    #[must_use]
    pub fn document_ids(&self) -> Vec<String> {
        self.lock().documents.keys().cloned().collect()
    }

    /// Number of non-empty append calls served.
    #[must_use]
    pub fn append_calls(&self) -> usize {
        self.lock().append_calls
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        // A poisoned lock only means a test thread panicked mid-call; the map
        // itself is still consistent.
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn check_failure(state: &MemoryState) -> Result<(), SheetsError> {
        match state.fail_status {
            None => Ok(()),
            Some(status @ (401 | 403)) => Err(SheetsError::Unauthorized { status }),
            Some(status) => Err(SheetsError::UnexpectedStatus {
                status,
                url: "memory://".to_string(),
            }),
        }
    }
}

fn missing_document(document_id: &str) -> SheetsError {
    SheetsError::NotFound {
        resource: format!("document {document_id}"),
    }
}

#[async_trait]
impl Destination for MemoryDestination {
    async fn create_document(&self, title: &str, folder_id: &str) -> Result<String, SheetsError> {
        let mut state = self.lock();
        Self::check_failure(&state)?;
        state.next_document += 1;
        let id = format!("memory-doc-{}", state.next_document);
        state.documents.insert(
            id.clone(),
            MemoryDocument {
                title: title.to_string(),
                folder_id: Some(folder_id.to_string()),
                sheets: Vec::new(),
            },
        );
        Ok(id)
    }

    async fn list_sheets(&self, document_id: &str) -> Result<Vec<SheetInfo>, SheetsError> {
        let state = self.lock();
        Self::check_failure(&state)?;
        let document = state
            .documents
            .get(document_id)
            .ok_or_else(|| missing_document(document_id))?;
        Ok(document.sheets.iter().map(|s| s.info.clone()).collect())
    }

    async fn create_sheet(&self, document_id: &str, title: &str) -> Result<SheetInfo, SheetsError> {
        let mut state = self.lock();
        Self::check_failure(&state)?;
        state.next_sheet += 1;
        let info = SheetInfo {
            sheet_id: state.next_sheet,
            title: title.to_string(),
        };
        let document = state
            .documents
            .get_mut(document_id)
            .ok_or_else(|| missing_document(document_id))?;
        if document.sheets.iter().any(|s| s.info.title == title) {
            return Err(SheetsError::UnexpectedStatus {
                status: 400,
                url: format!("memory://{document_id}/{title}"),
            });
        }
        document.sheets.push(MemorySheet {
            info: info.clone(),
            rows: Vec::new(),
        });
        Ok(info)
    }

    async fn read_column(
        &self,
        document_id: &str,
        sheet: &str,
        column: &str,
    ) -> Result<Vec<String>, SheetsError> {
        let state = self.lock();
        Self::check_failure(&state)?;
        let index = column_index(column).ok_or_else(|| SheetsError::NotFound {
            resource: format!("column {column}"),
        })?;
        let document = state
            .documents
            .get(document_id)
            .ok_or_else(|| missing_document(document_id))?;
        let sheet = document
            .sheets
            .iter()
            .find(|s| s.info.title == sheet)
            .ok_or_else(|| SheetsError::NotFound {
                resource: format!("sheet {sheet}"),
            })?;
        Ok(sheet
            .rows
            .iter()
            .map(|row| row.get(index).map(ToString::to_string).unwrap_or_default())
            .collect())
    }

    async fn append_rows(
        &self,
        document_id: &str,
        sheet: &str,
        rows: &[Vec<CellValue>],
    ) -> Result<(), SheetsError> {
        let mut state = self.lock();
        Self::check_failure(&state)?;
        if rows.is_empty() {
            return Ok(());
        }
        let document = state
            .documents
            .get_mut(document_id)
            .ok_or_else(|| missing_document(document_id))?;
        let target = document
            .sheets
            .iter_mut()
            .find(|s| s.info.title == sheet)
            .ok_or_else(|| SheetsError::NotFound {
                resource: format!("sheet {sheet}"),
            })?;
        target.rows.extend(rows.iter().cloned());
        state.append_calls += 1;
        Ok(())
    }

    async fn rename_document(&self, document_id: &str, title: &str) -> Result<(), SheetsError> {
        let mut state = self.lock();
        Self::check_failure(&state)?;
        let document = state
            .documents
            .get_mut(document_id)
            .ok_or_else(|| missing_document(document_id))?;
        document.title = title.to_string();
        Ok(())
    }

    async fn format_sheet(&self, document_id: &str, sheet: &SheetInfo) -> Result<(), SheetsError> {
        let state = self.lock();
        Self::check_failure(&state)?;
        let document = state
            .documents
            .get(document_id)
            .ok_or_else(|| missing_document(document_id))?;
        if document.sheets.iter().any(|s| s.info == *sheet) {
            Ok(())
        } else {
            Err(SheetsError::NotFound {
                resource: format!("sheet {}", sheet.title),
            })
        }
    }
}
