//! Storage abstractions for checkpoints and exported records.
//!
//! ## Layout
//!
//! ```text
//! {output_dir}/
//! ├── checkpoint_{id}.json   # Resume record, replaced atomically
//! ├── {name}_{id}.jsonl      # Record sink: one JSON object per member
//! └── {name}_{id}.csv        # Tabular sink: header once, then rows
//! ```
//!
//! Both sinks are append-only. The checkpoint is the only file that is ever
//! rewritten.

pub mod local;
pub mod sinks;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{Checkpoint, Record};

// Re-export for convenience
pub use local::LocalCheckpointStore;
pub use sinks::{CsvSink, JsonlSink};

/// Persists and loads the resume record.
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    /// Load the stored checkpoint, if any.
    ///
    /// Only structural parsing happens here; the caller decides whether the
    /// checkpoint belongs to the list being exported.
    async fn load(&self, collection_id: &str) -> Result<Option<Checkpoint>>;

    /// Replace the stored checkpoint. Either the old or the new value
    /// survives a crash, never a mixture.
    async fn commit(&self, checkpoint: &Checkpoint) -> Result<()>;
}

/// Append-only destination for one page of records.
#[async_trait]
pub trait RecordSink: Send + Sync {
    /// Short name used in log lines.
    fn name(&self) -> &str;

    /// Append `records` in order.
    async fn write(&self, records: &[Record]) -> Result<()>;
}
