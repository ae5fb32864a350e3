//! Pipeline entry points for list exports.
//!
//! - `backoff`: classify provider responses and compute rate-limit waits
//! - `state`: immutable loop state and its transitions
//! - `paginate`: the resumable pagination driver
//! - `export`: metadata lookup, output naming, then pagination

pub mod backoff;
pub mod export;
pub mod paginate;
pub mod state;

pub use backoff::{Backoff, Verdict};
pub use export::{ExportSummary, fetch_list_info, run_export};
pub use paginate::{PaginationSettings, Paginator, RunReport, StopReason};
pub use state::{LoopState, StartPoint};
