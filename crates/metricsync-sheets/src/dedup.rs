//! Month-level dedup check.
//!
//! Scans the date column of every existing platform sheet in a document. If
//! any sheet already holds a date inside the month, the whole month counts as
//! synced for that document, even when other platforms have no rows yet.
//! Summary sheets are not scanned.

use metricsync_core::MonthKey;

use crate::destination::{Destination, DATE_COLUMN};
use crate::error::SheetsError;

/// True when any of `platform_sheets` in `document_id` already contains a
/// row dated within `month`. Sheets that do not exist yet are skipped.
///
/// # Errors
///
/// Returns the destination's error if the sheet list or a date column cannot
/// be read.
pub async fn already_synced<D: Destination + ?Sized>(
    destination: &D,
    document_id: &str,
    platform_sheets: &[&str],
    month: MonthKey,
) -> Result<bool, SheetsError> {
    let existing = destination.list_sheets(document_id).await?;
    for sheet in existing
        .iter()
        .filter(|s| platform_sheets.contains(&s.title.as_str()))
    {
        let dates = destination
            .read_column(document_id, &sheet.title, DATE_COLUMN)
            .await?;
        if let Some(hit) = dates.iter().find(|d| month.matches_prefix(d)) {
            tracing::info!(
                document_id,
                sheet = %sheet.title,
                month = %month,
                found = %hit,
                "month already present in destination"
            );
            return Ok(true);
        }
    }
    Ok(false)
}
