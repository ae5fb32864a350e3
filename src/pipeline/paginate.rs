// src/pipeline/paginate.rs

//! Resumable pagination driver.
//!
//! ```text
//! RESUMING ─▶ FETCHING ─┬─▶ RATE_LIMITED ─(checkpoint, sleep)─▶ FETCHING
//!                       ├─▶ WRITING ─▶ CHECKPOINTING ─┬─▶ FETCHING
//!                       │                             └─▶ DONE
//!                       └─▶ FAILED
//! ```
//!
//! Sinks are written before the checkpoint moves, so a checkpoint never
//! claims a page the outputs did not receive. A fatal response leaves the
//! stored checkpoint exactly as the last successful or rate-limited step
//! committed it.

use std::time::Duration;

use chrono::Utc;

use crate::error::{AppError, Result};
use crate::models::{CheckpointEvent, Config, Page, error_detail};
use crate::pipeline::backoff::{Backoff, Verdict};
use crate::pipeline::state::{LoopState, StartPoint};
use crate::services::CollectionClient;
use crate::storage::{CheckpointStore, RecordSink};

/// Knobs for one run of the driver.
#[derive(Debug, Clone)]
pub struct PaginationSettings {
    pub backoff: Backoff,
    /// Politeness pause after each written page
    pub page_delay: Duration,
    /// Stop cleanly after this many pages in this run
    pub max_pages: Option<u64>,
}

impl PaginationSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            backoff: Backoff::new(config.backoff),
            page_delay: config.pacing.page_delay(),
            max_pages: None,
        }
    }
}

impl Default for PaginationSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Why a run ended without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The provider returned the last page
    Exhausted,
    /// The stored checkpoint had already reached the last page
    AlreadyComplete,
    /// `max_pages` pages were written in this run
    PageLimit,
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Exhausted => "list exhausted",
            Self::AlreadyComplete => "already complete",
            Self::PageLimit => "page limit reached",
        })
    }
}

/// Outcome of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub collection_id: String,
    pub state: LoopState,
    pub pages_written: u64,
    pub records_written: u64,
    pub rate_limit_waits: u64,
    pub stop: StopReason,
}

/// Drives fetch, classify, write and checkpoint until the list is done.
pub struct Paginator<'a> {
    client: &'a dyn CollectionClient,
    store: &'a dyn CheckpointStore,
    sinks: Vec<&'a dyn RecordSink>,
    settings: PaginationSettings,
}

impl<'a> Paginator<'a> {
    pub fn new(
        client: &'a dyn CollectionClient,
        store: &'a dyn CheckpointStore,
        sinks: Vec<&'a dyn RecordSink>,
        settings: PaginationSettings,
    ) -> Self {
        Self {
            client,
            store,
            sinks,
            settings,
        }
    }

    /// Export every member of `collection_id`, resuming if possible.
    pub async fn run(&self, collection_id: &str) -> Result<RunReport> {
        let stored = self.store.load(collection_id).await?;
        let mut state = match LoopState::start(stored.as_ref(), collection_id) {
            StartPoint::Fresh(state) => {
                log::info!("List {collection_id}: no checkpoint, starting at page 1");
                state
            }
            StartPoint::Foreign { found, state } => {
                log::warn!(
                    "Checkpoint belongs to list {found}, not {collection_id}; \
                     ignoring it and starting at page 1"
                );
                state
            }
            StartPoint::Resume(state) => {
                log::info!(
                    "List {collection_id}: resuming at page {} ({} records already written)",
                    state.page,
                    state.total_written
                );
                state
            }
            StartPoint::Exhausted(state) => {
                log::info!(
                    "List {collection_id}: already complete ({} records over {} pages)",
                    state.total_written,
                    state.page - 1
                );
                return Ok(RunReport {
                    collection_id: collection_id.to_string(),
                    state,
                    pages_written: 0,
                    records_written: 0,
                    rate_limit_waits: 0,
                    stop: StopReason::AlreadyComplete,
                });
            }
        };

        let mut pages_written = 0u64;
        let mut records_written = 0u64;
        let mut rate_limit_waits = 0u64;
        let mut last_reset_epoch = 0i64;
        let mut last_wait_secs = 0u64;

        let stop = loop {
            // FETCHING
            let response = self
                .client
                .fetch_page(collection_id, state.resume_token.as_deref())
                .await?;
            let now = Utc::now().timestamp();
            let verdict = self.settings.backoff.classify(
                response.status,
                response.rate_limit_reset.as_deref(),
                now,
            );

            let page = match verdict {
                Verdict::Success => Page::parse(&response.body).inspect_err(|e| {
                    log::error!("Page {} of list {collection_id}: {e}", state.page);
                })?,
                Verdict::RateLimited {
                    reset_epoch,
                    wait_secs,
                } => {
                    // RATE_LIMITED: same page, same token, after the wait
                    let event = verdict
                        .rate_limit_event()
                        .unwrap_or(CheckpointEvent::RateLimitedNoHeader);
                    last_reset_epoch = reset_epoch.unwrap_or(0);
                    last_wait_secs = wait_secs;
                    self.store
                        .commit(&state.checkpoint(
                            collection_id,
                            event,
                            last_reset_epoch,
                            last_wait_secs,
                        ))
                        .await?;
                    rate_limit_waits += 1;
                    match reset_epoch {
                        Some(reset) => log::warn!(
                            "Rate limited on page {} (reset at {reset}), waiting {wait_secs}s",
                            state.page
                        ),
                        None => log::warn!(
                            "Rate limited on page {} without reset header, waiting {wait_secs}s",
                            state.page
                        ),
                    }
                    tokio::time::sleep(Duration::from_secs(wait_secs)).await;
                    continue;
                }
                Verdict::Fatal { status } => {
                    let err = AppError::api(status, error_detail(&response.body));
                    log::error!("Page {} of list {collection_id}: {err}", state.page);
                    return Err(err);
                }
            };

            // WRITING
            for sink in &self.sinks {
                sink.write(&page.records).await.inspect_err(|e| {
                    log::error!("{} sink failed on page {}: {e}", sink.name(), state.page);
                })?;
            }

            // CHECKPOINTING
            let next = state.advance(&page);
            self.store
                .commit(&next.checkpoint(
                    collection_id,
                    CheckpointEvent::PageWritten,
                    last_reset_epoch,
                    last_wait_secs,
                ))
                .await?;
            log::info!(
                "Page {} written: {} records (total {})",
                state.page,
                page.len(),
                next.total_written
            );

            pages_written += 1;
            records_written += page.len() as u64;
            state = next;

            if page.is_last() {
                break StopReason::Exhausted;
            }
            if self
                .settings
                .max_pages
                .is_some_and(|max| pages_written >= max)
            {
                log::info!("Stopping after {pages_written} pages; rerun to continue");
                break StopReason::PageLimit;
            }
            if !self.settings.page_delay.is_zero() {
                tokio::time::sleep(self.settings.page_delay).await;
            }
        };

        if stop == StopReason::Exhausted {
            log::info!(
                "List {collection_id} complete: {} records in total",
                state.total_written
            );
        }

        Ok(RunReport {
            collection_id: collection_id.to_string(),
            state,
            pages_written,
            records_written,
            rate_limit_waits,
            stop,
        })
    }
}
