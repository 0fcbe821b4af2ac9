use crate::models::Listing;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

/// Message surfaced when a failed deletion carries no message of its own
pub const DELETE_FALLBACK_MESSAGE: &str = "Failed to delete listing";

/// Message surfaced when a failed fetch carries no message of its own
pub const FETCH_FALLBACK_MESSAGE: &str = "Failed to load listings";

/// Errors that can occur when talking to the listings API
#[derive(Debug, Error)]
pub enum ListingsError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("{0}")]
    ApiError(String),

    #[error("Sign in to manage listings")]
    Unauthenticated,

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

/// Source of listings and the operations performed on them
#[async_trait]
pub trait ListingSource: Send + Sync {
    /// Fetch every listing, in the order the API returns them
    async fn fetch_listings(&self) -> Result<Vec<Listing>, ListingsError>;

    /// Delete a listing on behalf of `user_id`
    async fn delete_listing(&self, listing_id: &str, user_id: &str) -> Result<(), ListingsError>;
}

/// REST client for the listings API
///
/// Responses are JSON envelopes carrying a `success` flag, a `data`
/// collection and an optional `message`.
pub struct ListingsClient {
    base_url: String,
    client: Client,
}

impl ListingsClient {
    /// Create a new listings client
    pub fn new(base_url: String, timeout_secs: u64) -> Result<Self, ListingsError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self { base_url, client })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn properties_url(&self) -> String {
        format!("{}/properties", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl ListingSource for ListingsClient {
    async fn fetch_listings(&self) -> Result<Vec<Listing>, ListingsError> {
        let url = self.properties_url();

        tracing::debug!("Fetching listings from: {}", url);

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        let body = response.text().await?;

        let json: Value = serde_json::from_str(&body).map_err(|e| {
            ListingsError::InvalidResponse(format!("Failed to parse listings ({}): {}", status, e))
        })?;

        if !status.is_success() || !success_flag(&json) {
            tracing::error!("Listings API returned {}: {}", status, body);
            return Err(ListingsError::ApiError(
                message_of(&json).unwrap_or_else(|| FETCH_FALLBACK_MESSAGE.to_string()),
            ));
        }

        let documents = json
            .get("data")
            .or_else(|| json.get("properties"))
            .and_then(|d| d.as_array())
            .ok_or_else(|| ListingsError::InvalidResponse("Missing data array".into()))?;

        let listings: Vec<Listing> = documents
            .iter()
            .filter_map(|doc| match serde_json::from_value::<Listing>(doc.clone()) {
                Ok(listing) => Some(listing),
                Err(e) => {
                    tracing::debug!("Skipping malformed listing: {}", e);
                    None
                }
            })
            .collect();

        tracing::debug!("Fetched {} listings (of {} documents)", listings.len(), documents.len());

        Ok(listings)
    }

    async fn delete_listing(&self, listing_id: &str, user_id: &str) -> Result<(), ListingsError> {
        if user_id.trim().is_empty() {
            return Err(ListingsError::Unauthenticated);
        }

        let url = format!("{}/{}", self.properties_url(), urlencoding::encode(listing_id));

        let response = self
            .client
            .delete(&url)
            .header("X-User-Id", user_id)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let json: Option<Value> = serde_json::from_str(&body).ok();

        let accepted = status.is_success()
            && json.as_ref().map(success_flag).unwrap_or(true);

        if !accepted {
            tracing::warn!("Failed to delete listing {} for {}: {}", listing_id, user_id, status);
            if status == StatusCode::UNAUTHORIZED {
                return Err(ListingsError::Unauthenticated);
            }
            return Err(ListingsError::ApiError(
                json.as_ref()
                    .and_then(message_of)
                    .unwrap_or_else(|| DELETE_FALLBACK_MESSAGE.to_string()),
            ));
        }

        tracing::debug!("Deleted listing {} for {}", listing_id, user_id);

        Ok(())
    }
}

fn success_flag(json: &Value) -> bool {
    json.get("success").and_then(|s| s.as_bool()).unwrap_or(false)
}

fn message_of(json: &Value) -> Option<String> {
    json.get("message")
        .and_then(|m| m.as_str())
        .filter(|m| !m.trim().is_empty())
        .map(str::to_string)
}
