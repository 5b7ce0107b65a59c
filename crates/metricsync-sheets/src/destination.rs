//! The destination seam.

use std::sync::Arc;

use async_trait::async_trait;
use metricsync_core::CellValue;

use crate::error::SheetsError;

/// Column holding the row date; scanned by the dedup gate.
pub const DATE_COLUMN: &str = "A";

/// A sheet (tab) inside a destination document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetInfo {
    pub sheet_id: i64,
    pub title: String,
}

/// A spreadsheet-like store: documents containing named sheets of rows.
///
/// Dedup is enforced by the caller; implementations only need to be
/// idempotent enough at the call level.
#[async_trait]
pub trait Destination: Send + Sync {
    /// Creates a document titled `title` inside `folder_id`; returns its id.
    async fn create_document(&self, title: &str, folder_id: &str) -> Result<String, SheetsError>;

    async fn list_sheets(&self, document_id: &str) -> Result<Vec<SheetInfo>, SheetsError>;

    async fn create_sheet(&self, document_id: &str, title: &str) -> Result<SheetInfo, SheetsError>;

    /// Reads one column as raw strings, top to bottom (header included).
    async fn read_column(
        &self,
        document_id: &str,
        sheet: &str,
        column: &str,
    ) -> Result<Vec<String>, SheetsError>;

    /// Appends rows after the last non-empty row of `sheet`.
    async fn append_rows(
        &self,
        document_id: &str,
        sheet: &str,
        rows: &[Vec<CellValue>],
    ) -> Result<(), SheetsError>;

    async fn rename_document(&self, document_id: &str, title: &str) -> Result<(), SheetsError>;

    /// Cosmetic formatting (frozen, bold header row). Callers treat failure
    /// as non-fatal.
    async fn format_sheet(&self, document_id: &str, sheet: &SheetInfo) -> Result<(), SheetsError>;
}

#[async_trait]
impl<D: Destination + ?Sized> Destination for Arc<D> {
    async fn create_document(&self, title: &str, folder_id: &str) -> Result<String, SheetsError> {
        (**self).create_document(title, folder_id).await
    }

    async fn list_sheets(&self, document_id: &str) -> Result<Vec<SheetInfo>, SheetsError> {
        (**self).list_sheets(document_id).await
    }

    async fn create_sheet(&self, document_id: &str, title: &str) -> Result<SheetInfo, SheetsError> {
        (**self).create_sheet(document_id, title).await
    }

    async fn read_column(
        &self,
        document_id: &str,
        sheet: &str,
        column: &str,
    ) -> Result<Vec<String>, SheetsError> {
        (**self).read_column(document_id, sheet, column).await
    }

    async fn append_rows(
        &self,
        document_id: &str,
        sheet: &str,
        rows: &[Vec<CellValue>],
    ) -> Result<(), SheetsError> {
        (**self).append_rows(document_id, sheet, rows).await
    }

    async fn rename_document(&self, document_id: &str, title: &str) -> Result<(), SheetsError> {
        (**self).rename_document(document_id, title).await
    }

    async fn format_sheet(&self, document_id: &str, sheet: &SheetInfo) -> Result<(), SheetsError> {
        (**self).format_sheet(document_id, sheet).await
    }
}
