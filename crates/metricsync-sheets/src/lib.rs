//! Spreadsheet destination for normalized rows.
//!
//! [`Destination`] is the seam the sync pipeline writes through.
//! [`SheetsClient`] implements it over the spreadsheet and drive REST APIs;
//! [`MemoryDestination`] implements it in memory for tests and dry runs.
//! [`already_synced`] is the month-level dedup check run before any fetch.

pub mod client;
pub mod dedup;
pub mod destination;
pub mod error;
pub mod memory;
pub mod retry;
pub mod writer;

pub use client::SheetsClient;
pub use dedup::already_synced;
pub use destination::{Destination, SheetInfo, DATE_COLUMN};
pub use error::SheetsError;
pub use memory::MemoryDestination;
pub use retry::sheets_retry_policy;
pub use writer::{ensure_sheet, header_row};
