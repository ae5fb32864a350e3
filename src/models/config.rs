//! Application configuration structures.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Remote API settings
    #[serde(default)]
    pub api: ApiConfig,

    /// Rate-limit backoff policy
    #[serde(default)]
    pub backoff: BackoffConfig,

    /// Delays between successful pages
    #[serde(default)]
    pub pacing: PacingConfig,

    /// Output and checkpoint locations
    #[serde(default)]
    pub output: OutputConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.api.base_url.trim().is_empty() {
            return Err(AppError::validation("api.base_url is empty"));
        }
        url::Url::parse(&self.api.base_url)?;
        if self.api.user_agent.trim().is_empty() {
            return Err(AppError::validation("api.user_agent is empty"));
        }
        if self.api.timeout_secs == 0 {
            return Err(AppError::validation("api.timeout_secs must be > 0"));
        }
        if !(1..=100).contains(&self.api.page_size) {
            return Err(AppError::validation("api.page_size must be in 1..=100"));
        }
        if self.api.token_env.trim().is_empty() {
            return Err(AppError::validation("api.token_env is empty"));
        }
        if self.backoff.fallback_wait_secs == 0 {
            return Err(AppError::validation(
                "backoff.fallback_wait_secs must be > 0",
            ));
        }
        Ok(())
    }
}

/// Remote API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the v2 API, without trailing slash
    #[serde(default = "defaults::base_url")]
    pub base_url: String,

    /// Requested members per page (`max_results`)
    #[serde(default = "defaults::page_size")]
    pub page_size: u32,

    /// Comma-separated `user.fields` value
    #[serde(default = "defaults::user_fields")]
    pub user_fields: String,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Transport timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Environment variable holding the bearer token
    #[serde(default = "defaults::token_env")]
    pub token_env: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::base_url(),
            page_size: defaults::page_size(),
            user_fields: defaults::user_fields(),
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            token_env: defaults::token_env(),
        }
    }
}

/// Rate-limit backoff policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackoffConfig {
    /// Lower bound for any computed wait
    #[serde(default = "defaults::min_wait")]
    pub min_wait_secs: u64,

    /// Added to the reset time to absorb clock differences
    #[serde(default = "defaults::clock_skew")]
    pub clock_skew_secs: u64,

    /// Wait used when the reset header is missing or unreadable
    #[serde(default = "defaults::fallback_wait")]
    pub fallback_wait_secs: u64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            min_wait_secs: defaults::min_wait(),
            clock_skew_secs: defaults::clock_skew(),
            fallback_wait_secs: defaults::fallback_wait(),
        }
    }
}

/// Delays between successful pages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PacingConfig {
    /// Pause after each written page, in milliseconds
    #[serde(default = "defaults::page_delay")]
    pub page_delay_ms: u64,
}

impl PacingConfig {
    pub fn page_delay(&self) -> Duration {
        Duration::from_millis(self.page_delay_ms)
    }
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            page_delay_ms: defaults::page_delay(),
        }
    }
}

/// Output and checkpoint locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory receiving the JSONL/CSV exports
    #[serde(default = "defaults::output_dir")]
    pub dir: PathBuf,

    /// Fixed checkpoint file; relative paths are resolved against `dir`.
    /// Unset means one `checkpoint_{id}.json` per list inside `dir`.
    #[serde(default)]
    pub checkpoint_file: Option<PathBuf>,
}

impl OutputConfig {
    /// Resolved checkpoint path for `list_id`.
    pub fn checkpoint_path(&self, list_id: &str) -> PathBuf {
        match &self.checkpoint_file {
            Some(file) if file.is_absolute() => file.clone(),
            Some(file) => self.dir.join(file),
            None => self.dir.join(format!("checkpoint_{list_id}.json")),
        }
    }

    /// Pin the checkpoint to `path`, relative to the working directory.
    pub fn override_checkpoint(&mut self, path: &Path) -> Result<()> {
        self.checkpoint_file = Some(std::path::absolute(path)?);
        Ok(())
    }

    /// JSON Lines export path for a list.
    pub fn records_path(&self, stem: &str) -> PathBuf {
        self.dir.join(format!("{stem}.jsonl"))
    }

    /// CSV export path for a list.
    pub fn table_path(&self, stem: &str) -> PathBuf {
        self.dir.join(format!("{stem}.csv"))
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: defaults::output_dir(),
            checkpoint_file: None,
        }
    }
}

mod defaults {
    use std::path::PathBuf;

    // API defaults
    pub fn base_url() -> String {
        "https://api.twitter.com/2".into()
    }
    pub fn page_size() -> u32 {
        100
    }
    pub fn user_fields() -> String {
        "name,username,verified,public_metrics".into()
    }
    pub fn user_agent() -> String {
        "listpager/0.1".into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn token_env() -> String {
        "X_BEARER_TOKEN".into()
    }

    // Backoff defaults
    pub fn min_wait() -> u64 {
        5
    }
    pub fn clock_skew() -> u64 {
        2
    }
    pub fn fallback_wait() -> u64 {
        60
    }

    // Pacing defaults
    pub fn page_delay() -> u64 {
        1000
    }

    // Output defaults
    pub fn output_dir() -> PathBuf {
        PathBuf::from("output")
    }
}
