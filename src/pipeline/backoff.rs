//! Response classification and rate-limit backoff.
//!
//! Pure functions only: the caller owns the clock and the sleeping.
//!
//! | status | reset header       | verdict                                   |
//! |--------|--------------------|-------------------------------------------|
//! | 200    | ignored            | `Success`                                 |
//! | 429    | numeric epoch `R`  | wait `max(min_wait, R - now + skew)`      |
//! | 429    | missing/garbage    | wait `fallback_wait`                      |
//! | other  | ignored            | `Fatal(status)`, never retried            |

use crate::models::{BackoffConfig, CheckpointEvent};

/// Classification of one provider response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Success,
    RateLimited {
        reset_epoch: Option<i64>,
        wait_secs: u64,
    },
    Fatal {
        status: u16,
    },
}

impl Verdict {
    /// Checkpoint event recorded for a rate-limited attempt.
    pub fn rate_limit_event(&self) -> Option<CheckpointEvent> {
        match self {
            Self::RateLimited {
                reset_epoch: Some(_),
                ..
            } => Some(CheckpointEvent::RateLimited),
            Self::RateLimited {
                reset_epoch: None, ..
            } => Some(CheckpointEvent::RateLimitedNoHeader),
            _ => None,
        }
    }
}

/// Backoff controller built from the configured policy.
#[derive(Debug, Clone, Copy, Default)]
pub struct Backoff {
    policy: BackoffConfig,
}

impl Backoff {
    pub fn new(policy: BackoffConfig) -> Self {
        Self { policy }
    }

    /// Classify a response given its status and raw reset header value.
    pub fn classify(&self, status: u16, reset_header: Option<&str>, now: i64) -> Verdict {
        match status {
            200 => Verdict::Success,
            429 => {
                let reset_epoch = parse_reset(reset_header);
                Verdict::RateLimited {
                    reset_epoch,
                    wait_secs: self.wait_secs(reset_epoch, now),
                }
            }
            status => Verdict::Fatal { status },
        }
    }

    /// Seconds to wait before retrying a rate-limited request.
    pub fn wait_secs(&self, reset_epoch: Option<i64>, now: i64) -> u64 {
        match reset_epoch {
            Some(reset) => {
                let until_reset = reset
                    .saturating_sub(now)
                    .saturating_add(self.policy.clock_skew_secs as i64);
                until_reset.max(self.policy.min_wait_secs as i64) as u64
            }
            None => self.policy.fallback_wait_secs,
        }
    }
}

/// Parse a reset header as epoch seconds.
pub fn parse_reset(raw: Option<&str>) -> Option<i64> {
    raw.and_then(|s| s.trim().parse::<i64>().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000;

    fn backoff() -> Backoff {
        Backoff::default()
    }

    #[test]
    fn success_and_fatal() {
        assert_eq!(backoff().classify(200, None, NOW), Verdict::Success);
        assert_eq!(
            backoff().classify(500, Some("123"), NOW),
            Verdict::Fatal { status: 500 }
        );
        assert_eq!(
            backoff().classify(401, None, NOW),
            Verdict::Fatal { status: 401 }
        );
    }

    #[test]
    fn rate_limited_with_reset_waits_until_reset_plus_skew() {
        let reset = (NOW + 30).to_string();
        let verdict = backoff().classify(429, Some(&reset), NOW);
        assert_eq!(
            verdict,
            Verdict::RateLimited {
                reset_epoch: Some(NOW + 30),
                wait_secs: 32,
            }
        );
        assert_eq!(verdict.rate_limit_event(), Some(CheckpointEvent::RateLimited));
    }

    #[test]
    fn imminent_or_past_reset_is_floored() {
        assert_eq!(backoff().wait_secs(Some(NOW + 1), NOW), 5);
        assert_eq!(backoff().wait_secs(Some(NOW + 3), NOW), 5);
        assert_eq!(backoff().wait_secs(Some(NOW + 4), NOW), 6);
        assert_eq!(backoff().wait_secs(Some(NOW - 600), NOW), 5);
    }

    #[test]
    fn missing_or_garbage_reset_uses_fallback() {
        for header in [None, Some(""), Some("soon"), Some("12.5")] {
            let verdict = backoff().classify(429, header, NOW);
            assert_eq!(
                verdict,
                Verdict::RateLimited {
                    reset_epoch: None,
                    wait_secs: 60,
                },
                "header {header:?}"
            );
            assert_eq!(
                verdict.rate_limit_event(),
                Some(CheckpointEvent::RateLimitedNoHeader)
            );
        }
    }

    #[test]
    fn wait_formula_holds_across_offsets() {
        for offset in -100..=400 {
            let expected = (offset + 2).max(5) as u64;
            assert_eq!(backoff().wait_secs(Some(NOW + offset), NOW), expected);
        }
    }

    #[test]
    fn custom_policy() {
        let b = Backoff::new(BackoffConfig {
            min_wait_secs: 1,
            clock_skew_secs: 0,
            fallback_wait_secs: 15,
        });
        assert_eq!(b.wait_secs(Some(NOW + 10), NOW), 10);
        assert_eq!(b.wait_secs(None, NOW), 15);
    }

    #[test]
    fn header_whitespace_is_tolerated() {
        assert_eq!(parse_reset(Some(" 1700000030 ")), Some(1_700_000_030));
    }
}
