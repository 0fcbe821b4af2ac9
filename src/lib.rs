//! Nest Match - listing search and compatibility matching for a student-housing rental app
//!
//! This library provides the compatibility scorer and filter predicate used to
//! rank and narrow property listings, plus the clients and stores the service
//! talks to: the listings API, the analytics sink and the user preference store.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use crate::core::{calculate_compatibility, matches_criteria, score, Matcher, SearchOutcome};
pub use models::{Listing, MatchResult, ScoredListing, SearchCriteria, SessionContext};
