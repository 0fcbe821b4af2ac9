// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    AnalyticsEvent, BudgetDefaults, Furnishing, GenderPreference, Listing, MatchResult, PropertyType,
    ReligiousPreference, ScoreBreakdown, ScoredListing, SearchCriteria, SessionContext,
    SmokingPreference, UnknownVariant,
};
pub use requests::{RecordEventRequest, SearchRequest, UiStateRequest};
pub use responses::{
    ErrorResponse, FavoritesResponse, HealthResponse, RecordEventResponse, SearchMode,
    SearchResponse, UiStateResponse,
};
