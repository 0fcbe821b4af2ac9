use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::domain::{non_blank, SearchCriteria};

/// Request to search listings
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    #[serde(default, deserialize_with = "non_blank")]
    pub user_id: Option<String>,
    #[serde(default, deserialize_with = "non_blank")]
    pub session_id: Option<String>,
    #[validate(range(min = 0.0))]
    #[serde(default)]
    pub min_price: Option<f64>,
    #[validate(range(min = 0.0))]
    #[serde(default)]
    pub max_price: Option<f64>,
    #[validate(length(max = 200))]
    #[serde(default, deserialize_with = "non_blank")]
    pub location: Option<String>,
    #[serde(flatten)]
    pub criteria: SearchCriteria,
}

impl SearchRequest {
    /// Fold the validated top-level fields into the search criteria
    pub fn into_criteria(self) -> SearchCriteria {
        SearchCriteria {
            min_price: self.min_price,
            max_price: self.max_price,
            location: self.location,
            ..self.criteria
        }
    }
}

/// Request to record an analytics event
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RecordEventRequest {
    #[validate(length(min = 1, max = 64))]
    pub event_type: String,
    #[serde(default)]
    pub attributes: serde_json::Map<String, serde_json::Value>,
    #[serde(default, deserialize_with = "non_blank")]
    pub user_id: Option<String>,
    #[serde(default, deserialize_with = "non_blank")]
    pub session_id: Option<String>,
}

/// Persisted UI collapse flags
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiStateRequest {
    pub filters_collapsed: Option<bool>,
    pub ai_match_collapsed: Option<bool>,
}
