//! Loop state threaded through the pagination driver.
//!
//! Every transition returns a new [`LoopState`]; nothing is mutated in
//! place, so each step is a plain function that can be tested alone.

use chrono::Utc;

use crate::models::{Checkpoint, CheckpointEvent, Page};

/// Position of the driver within a list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopState {
    /// Next page number to fetch (1-based)
    pub page: u64,
    /// Records handed to the sinks so far, across runs
    pub total_written: u64,
    /// Cursor for the next page, `None` on the first page
    pub resume_token: Option<String>,
}

/// Where a run starts, decided from the stored checkpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartPoint {
    /// No checkpoint stored
    Fresh(LoopState),
    /// Checkpoint for a different list, ignored
    Foreign { found: String, state: LoopState },
    /// Matching checkpoint with work left
    Resume(LoopState),
    /// Matching checkpoint that already reached the last page
    Exhausted(LoopState),
}

impl From<&Checkpoint> for LoopState {
    fn from(cp: &Checkpoint) -> Self {
        Self {
            page: cp.page.max(1),
            total_written: cp.total_written,
            resume_token: cp.resume_token.clone(),
        }
    }
}

impl LoopState {
    /// State at the start of a list.
    pub fn fresh() -> Self {
        Self {
            page: 1,
            total_written: 0,
            resume_token: None,
        }
    }

    /// Decide the starting point for `collection_id`.
    pub fn start(stored: Option<&Checkpoint>, collection_id: &str) -> StartPoint {
        let Some(cp) = stored else {
            return StartPoint::Fresh(Self::fresh());
        };
        if !cp.belongs_to(collection_id) {
            return StartPoint::Foreign {
                found: cp.collection_id.clone(),
                state: Self::fresh(),
            };
        }
        let state = Self::from(cp);
        if state.is_exhausted() {
            StartPoint::Exhausted(state)
        } else {
            StartPoint::Resume(state)
        }
    }

    /// State after `page` was written to every sink.
    pub fn advance(&self, page: &Page) -> Self {
        Self {
            page: self.page + 1,
            total_written: self.total_written + page.len() as u64,
            resume_token: page.next_token.clone(),
        }
    }

    /// Whether the previous page was the last one. A missing token on page 1
    /// only means nothing has been fetched yet.
    pub fn is_exhausted(&self) -> bool {
        self.page > 1 && self.resume_token.is_none()
    }

    /// Snapshot this state as a checkpoint.
    pub fn checkpoint(
        &self,
        collection_id: &str,
        event: CheckpointEvent,
        reset_epoch: i64,
        wait_secs: u64,
    ) -> Checkpoint {
        Checkpoint {
            collection_id: collection_id.to_string(),
            page: self.page,
            total_written: self.total_written,
            resume_token: self.resume_token.clone(),
            last_event: event,
            last_reset_epoch: reset_epoch,
            last_wait_seconds: wait_secs,
            updated_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Record;

    fn page(n: usize, token: Option<&str>) -> Page {
        Page {
            records: (0..n)
                .map(|i| Record {
                    handle: format!("user{i}"),
                    display_name: String::new(),
                    id: i.to_string(),
                    verified: false,
                    followers_count: 0,
                    following_count: 0,
                })
                .collect(),
            next_token: token.map(str::to_string),
        }
    }

    fn stored(id: &str, page: u64, total: u64, token: Option<&str>) -> Checkpoint {
        LoopState {
            page,
            total_written: total,
            resume_token: token.map(str::to_string),
        }
        .checkpoint(id, CheckpointEvent::PageWritten, 0, 0)
    }

    #[test]
    fn no_checkpoint_starts_fresh() {
        assert_eq!(
            LoopState::start(None, "42"),
            StartPoint::Fresh(LoopState::fresh())
        );
    }

    #[test]
    fn matching_checkpoint_resumes() {
        let cp = stored("111", 3, 200, Some("xyz"));
        let start = LoopState::start(Some(&cp), "111");
        assert_eq!(
            start,
            StartPoint::Resume(LoopState {
                page: 3,
                total_written: 200,
                resume_token: Some("xyz".to_string()),
            })
        );
    }

    #[test]
    fn foreign_checkpoint_is_ignored() {
        let cp = stored("222", 9, 900, Some("zzz"));
        match LoopState::start(Some(&cp), "333") {
            StartPoint::Foreign { found, state } => {
                assert_eq!(found, "222");
                assert_eq!(state, LoopState::fresh());
            }
            other => panic!("expected foreign, got {other:?}"),
        }
    }

    #[test]
    fn rate_limited_first_page_is_not_exhausted() {
        let mut cp = stored("42", 1, 0, None);
        cp.last_event = CheckpointEvent::RateLimited;
        assert!(matches!(
            LoopState::start(Some(&cp), "42"),
            StartPoint::Resume(_)
        ));
    }

    #[test]
    fn finished_checkpoint_is_exhausted() {
        let cp = stored("42", 4, 250, None);
        match LoopState::start(Some(&cp), "42") {
            StartPoint::Exhausted(state) => assert_eq!(state.total_written, 250),
            other => panic!("expected exhausted, got {other:?}"),
        }
    }

    #[test]
    fn exhaustion_requires_progress() {
        assert!(!LoopState::fresh().is_exhausted());
        assert!(LoopState::from(&stored("42", 4, 250, None)).is_exhausted());
        assert!(!LoopState::from(&stored("42", 4, 250, Some("more"))).is_exhausted());
    }

    #[test]
    fn advance_accumulates_and_adopts_token() {
        let s1 = LoopState::fresh().advance(&page(100, Some("abc")));
        assert_eq!(s1.page, 2);
        assert_eq!(s1.total_written, 100);
        assert_eq!(s1.resume_token.as_deref(), Some("abc"));
        assert!(!s1.is_exhausted());

        let s2 = s1.advance(&page(50, None));
        assert_eq!(s2.page, 3);
        assert_eq!(s2.total_written, 150);
        assert!(s2.is_exhausted());
    }

    #[test]
    fn empty_page_still_advances() {
        let s = LoopState::fresh().advance(&page(0, Some("next")));
        assert_eq!(s.page, 2);
        assert_eq!(s.total_written, 0);
        assert_eq!(s.resume_token.as_deref(), Some("next"));
    }

    #[test]
    fn checkpoint_mirrors_state() {
        let state = LoopState {
            page: 2,
            total_written: 100,
            resume_token: Some("abc".to_string()),
        };
        let cp = state.checkpoint("42", CheckpointEvent::RateLimited, 1_700_000_030, 32);
        assert_eq!(cp.collection_id, "42");
        assert_eq!(cp.page, 2);
        assert_eq!(cp.total_written, 100);
        assert_eq!(cp.resume_token.as_deref(), Some("abc"));
        assert_eq!(cp.last_reset_epoch, 1_700_000_030);
        assert_eq!(cp.last_wait_seconds, 32);
    }
}
