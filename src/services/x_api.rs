// src/services/x_api.rs

//! X API v2 list client.

use async_trait::async_trait;
use reqwest::Client;

use crate::error::Result;
use crate::models::ApiConfig;
use crate::services::{ApiResponse, CollectionClient};
use crate::utils::http;

/// Header carrying the rate-limit window reset, in epoch seconds.
pub const RATE_LIMIT_RESET_HEADER: &str = "x-rate-limit-reset";

/// Bearer-authenticated client for `/lists/{id}` and `/lists/{id}/members`.
pub struct XApiClient {
    client: Client,
    base_url: String,
    token: String,
    page_size: u32,
    user_fields: String,
}

impl XApiClient {
    /// Create a client from API settings and a bearer token.
    pub fn new(config: &ApiConfig, token: impl Into<String>) -> Result<Self> {
        Ok(Self {
            client: http::create_async_client(config)?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: token.into(),
            page_size: config.page_size,
            user_fields: config.user_fields.clone(),
        })
    }

    fn members_query(&self, resume_token: Option<&str>) -> Vec<(&'static str, String)> {
        let mut query = vec![
            ("max_results", self.page_size.to_string()),
            ("user.fields", self.user_fields.clone()),
        ];
        if let Some(token) = resume_token {
            query.push(("pagination_token", token.to_string()));
        }
        query
    }

    async fn into_response(response: reqwest::Response) -> Result<ApiResponse> {
        let status = response.status().as_u16();
        let rate_limit_reset = response
            .headers()
            .get(RATE_LIMIT_RESET_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.text().await?;
        Ok(ApiResponse {
            status,
            rate_limit_reset,
            body,
        })
    }
}

#[async_trait]
impl CollectionClient for XApiClient {
    async fn fetch_metadata(&self, collection_id: &str) -> Result<ApiResponse> {
        let url = format!("{}/lists/{}", self.base_url, collection_id);
        log::debug!("GET {url}");
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await?;
        Self::into_response(response).await
    }

    async fn fetch_page(
        &self,
        collection_id: &str,
        resume_token: Option<&str>,
    ) -> Result<ApiResponse> {
        let url = format!("{}/lists/{}/members", self.base_url, collection_id);
        log::debug!(
            "GET {url} ({})",
            if resume_token.is_some() {
                "continuation"
            } else {
                "first page"
            }
        );
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .query(&self.members_query(resume_token))
            .send()
            .await?;
        Self::into_response(response).await
    }
}
