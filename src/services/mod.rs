//! Remote collection access.
//!
//! The pagination driver only sees [`CollectionClient`]; the reqwest-backed
//! [`XApiClient`] is the production implementation.

mod x_api;

use async_trait::async_trait;

use crate::error::Result;

pub use x_api::{RATE_LIMIT_RESET_HEADER, XApiClient};

/// Raw provider response.
///
/// Only the reset header is kept; no other header is consulted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub rate_limit_reset: Option<String>,
    pub body: String,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            rate_limit_reset: None,
            body: body.into(),
        }
    }

    pub fn with_reset(mut self, reset: impl Into<String>) -> Self {
        self.rate_limit_reset = Some(reset.into());
        self
    }
}

/// Issues list requests against the provider.
#[async_trait]
pub trait CollectionClient: Send + Sync {
    /// Fetch list metadata (name, id).
    async fn fetch_metadata(&self, collection_id: &str) -> Result<ApiResponse>;

    /// Fetch one page of members. `resume_token` is passed through verbatim.
    async fn fetch_page(
        &self,
        collection_id: &str,
        resume_token: Option<&str>,
    ) -> Result<ApiResponse>;
}
