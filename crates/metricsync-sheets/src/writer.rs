//! Sheet provisioning shared by every write path.

use metricsync_core::CellValue;

use crate::destination::{Destination, SheetInfo};
use crate::error::SheetsError;

#[must_use]
pub fn header_row(header: &[&str]) -> Vec<CellValue> {
    header.iter().map(|h| CellValue::from(*h)).collect()
}

/// Returns the sheet titled `title`, creating it when absent.
///
/// A new sheet gets `header` as its first row and a best-effort format pass;
/// a formatting failure is logged and otherwise ignored.
///
/// # Errors
///
/// Returns the destination's error if the sheet cannot be created or the
/// header row cannot be written.
pub async fn ensure_sheet<D: Destination + ?Sized>(
    destination: &D,
    document_id: &str,
    existing: &[SheetInfo],
    title: &str,
    header: &[&str],
) -> Result<SheetInfo, SheetsError> {
    if let Some(found) = existing.iter().find(|s| s.title == title) {
        return Ok(found.clone());
    }

    let info = destination.create_sheet(document_id, title).await?;
    destination
        .append_rows(document_id, title, &[header_row(header)])
        .await?;
    tracing::info!(document_id, sheet = title, columns = header.len(), "created sheet");

    if let Err(e) = destination.format_sheet(document_id, &info).await {
        tracing::warn!(document_id, sheet = title, error = %e, "sheet formatting failed");
    }
    Ok(info)
}
