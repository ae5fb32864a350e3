//! Durable pagination progress for one list.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What the last fetch attempt did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckpointEvent {
    PageWritten,
    RateLimited,
    RateLimitedNoHeader,
}

impl std::fmt::Display for CheckpointEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::PageWritten => "page_written",
            Self::RateLimited => "rate_limited",
            Self::RateLimitedNoHeader => "rate_limited_no_header",
        })
    }
}

/// The resume record persisted after every non-fatal fetch attempt.
///
/// `page` is the number of the next page to fetch. A `resume_token` of
/// `None` means "start of list" while `page == 1`, and "list exhausted"
/// afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Checkpoint {
    pub collection_id: String,
    pub page: u64,
    pub total_written: u64,
    #[serde(default)]
    pub resume_token: Option<String>,
    pub last_event: CheckpointEvent,
    #[serde(default)]
    pub last_reset_epoch: i64,
    #[serde(default)]
    pub last_wait_seconds: u64,
    pub updated_at: DateTime<Utc>,
}

impl Checkpoint {
    /// Whether this checkpoint belongs to `collection_id`.
    pub fn belongs_to(&self, collection_id: &str) -> bool {
        self.collection_id == collection_id
    }
}
