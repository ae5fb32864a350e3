// src/models/mod.rs

//! Domain models for the list exporter.

mod checkpoint;
mod config;
mod record;

pub use checkpoint::{Checkpoint, CheckpointEvent};
pub use config::{ApiConfig, BackoffConfig, Config, OutputConfig, PacingConfig};
pub use record::{ListInfo, Page, Record, TABLE_HEADER, error_detail};
