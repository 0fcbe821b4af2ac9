use serde::{Deserialize, Serialize};
use crate::models::domain::ScoredListing;

/// Which path produced a set of search results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    Scored,
    Filtered,
}

/// Response for the listing search endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub mode: SearchMode,
    pub listings: Vec<ScoredListing>,
    pub total_results: usize,
    pub error: Option<String>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

/// Favorite listing ids for a user
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoritesResponse {
    pub user_id: String,
    pub favorites: Vec<String>,
    pub count: usize,
}

/// Persisted UI collapse flags for a user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiStateResponse {
    pub filters_collapsed: bool,
    pub ai_match_collapsed: bool,
}

/// Acknowledgement for an accepted analytics event
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordEventResponse {
    pub accepted: bool,
    pub session_id: String,
}
