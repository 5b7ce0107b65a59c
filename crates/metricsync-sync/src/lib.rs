//! Month-by-month, group-by-group synchronization of analytics data into
//! spreadsheet destinations.
//!
//! [`SyncOrchestrator::run`] walks the pending windows of a [`RunContext`],
//! checks each (group, month) unit against the destination before fetching,
//! and records a [`UnitStatus`] per unit in the returned [`RunSummary`].
//! Only fatal errors (rejected credentials) abort a run.
//!
//! [`RunContext`]: metricsync_core::RunContext

pub mod error;
pub mod orchestrator;
pub mod resolve;
pub mod state;
pub mod status;
pub mod throttle;
pub mod watchdog;

pub use error::SyncError;
pub use orchestrator::{SyncOrchestrator, SyncSettings};
pub use resolve::{default_title, resolve_destination, Resolution};
pub use state::{GroupState, SyncState};
pub use status::{RunSummary, UnitPhase, UnitReport, UnitStatus};
pub use throttle::Throttle;
pub use watchdog::Watchdog;
