use actix_web::{web, HttpRequest, HttpResponse, Responder};
use serde_json::{json, Map};
use std::sync::Arc;
use validator::Validate;

use crate::core::Matcher;
use crate::models::{
    ErrorResponse, FavoritesResponse, HealthResponse, RecordEventRequest, RecordEventResponse,
    SearchMode, SearchRequest, SearchResponse, SessionContext, UiStateRequest, UiStateResponse,
};
use crate::services::{
    AnalyticsClient, ListingSource, ListingsError, PreferenceStore, StoreError, UiFlags,
};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub listings: Arc<dyn ListingSource>,
    pub analytics: AnalyticsClient,
    pub preferences: PreferenceStore,
    pub matcher: Matcher,
}

/// Configure all listing-related routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/listings/search", web::post().to(search_listings))
        .route("/listings/{listing_id}", web::delete().to(delete_listing))
        .route("/users/{user_id}/favorites", web::get().to(get_favorites))
        .route("/users/{user_id}/favorites/{listing_id}", web::put().to(add_favorite))
        .route("/users/{user_id}/favorites/{listing_id}", web::delete().to(remove_favorite))
        .route("/users/{user_id}/ui-state", web::get().to(get_ui_state))
        .route("/users/{user_id}/ui-state", web::put().to(update_ui_state))
        .route("/events", web::post().to(record_event));
}

/// Health check endpoint
async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Search listings endpoint
///
/// POST /api/v1/listings/search
///
/// Request body:
/// ```json
/// {
///   "userId": "string",
///   "propertyType": "Studio",
///   "minPrice": 500,
///   "maxPrice": 1000,
///   "location": "Seksyen 7",
///   "genderPreference": "Female Only",
///   "religiousPreference": "Any Religion",
///   "smokingPreference": "Non-Smoker Only",
///   "furnishing": "Fully Furnished"
/// }
/// ```
///
/// A failed listing fetch is reported in `error` with an empty result set.
async fn search_listings(
    state: web::Data<AppState>,
    req: web::Json<SearchRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        tracing::info!("Validation failed for search request: field_errors={:?}", errors);
        return bad_request("Validation failed", errors.to_string());
    }

    let req = req.into_inner();
    let context = SessionContext::resume(req.session_id.clone(), req.user_id.clone());
    let criteria = req.into_criteria();

    let listings = match state.listings.fetch_listings().await {
        Ok(listings) => listings,
        Err(e) => {
            tracing::error!("Failed to fetch listings: {}", e);
            let mode = if criteria.has_soft_criteria() {
                SearchMode::Scored
            } else {
                SearchMode::Filtered
            };
            return HttpResponse::Ok().json(SearchResponse {
                mode,
                listings: vec![],
                total_results: 0,
                error: Some(e.to_string()),
            });
        }
    };

    let outcome = state.matcher.search(&criteria, &listings);

    tracing::info!(
        "Returning {} listings ({:?}) from {} candidates",
        outcome.listings.len(),
        outcome.mode,
        outcome.total_candidates
    );

    let mut attributes = Map::new();
    attributes.insert("mode".to_string(), json!(outcome.mode));
    attributes.insert("resultCount".to_string(), json!(outcome.listings.len()));
    state.analytics.track(&context, "search", attributes);

    HttpResponse::Ok().json(SearchResponse {
        mode: outcome.mode,
        total_results: outcome.listings.len(),
        listings: outcome.listings,
        error: None,
    })
}

/// Delete listing endpoint
///
/// DELETE /api/v1/listings/{listing_id}
///
/// The caller is identified by the `X-User-Id` header.
async fn delete_listing(
    state: web::Data<AppState>,
    path: web::Path<String>,
    http_req: HttpRequest,
) -> impl Responder {
    let listing_id = path.into_inner();
    let user_id = http_req
        .headers()
        .get("X-User-Id")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string);

    let Some(user_id) = user_id else {
        return unauthorized(ListingsError::Unauthenticated.to_string());
    };

    match state.listings.delete_listing(&listing_id, &user_id).await {
        Ok(()) => {
            let context = SessionContext::new(Some(user_id));
            let mut attributes = Map::new();
            attributes.insert("listingId".to_string(), json!(listing_id));
            state.analytics.track(&context, "listing_deleted", attributes);

            HttpResponse::Ok().json(json!({ "success": true, "listingId": listing_id }))
        }
        Err(ListingsError::Unauthenticated) => {
            unauthorized(ListingsError::Unauthenticated.to_string())
        }
        Err(e) => {
            tracing::warn!("Failed to delete listing {}: {}", listing_id, e);
            HttpResponse::BadGateway().json(ErrorResponse {
                error: "Failed to delete listing".to_string(),
                message: e.to_string(),
                status_code: 502,
            })
        }
    }
}

/// Get favorites for a user
///
/// GET /api/v1/users/{user_id}/favorites
async fn get_favorites(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> impl Responder {
    let user_id = path.into_inner();
    match state.preferences.favorites(&user_id).await {
        Ok(favorites) => favorites_response(user_id, favorites),
        Err(e) => store_failure(&user_id, e),
    }
}

/// PUT /api/v1/users/{user_id}/favorites/{listing_id}
async fn add_favorite(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
) -> impl Responder {
    let (user_id, listing_id) = path.into_inner();
    match state.preferences.add_favorite(&user_id, &listing_id).await {
        Ok(favorites) => {
            track_favorite(&state, &user_id, &listing_id, "favorite_added");
            favorites_response(user_id, favorites)
        }
        Err(e) => store_failure(&user_id, e),
    }
}

/// DELETE /api/v1/users/{user_id}/favorites/{listing_id}
async fn remove_favorite(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
) -> impl Responder {
    let (user_id, listing_id) = path.into_inner();
    match state.preferences.remove_favorite(&user_id, &listing_id).await {
        Ok(favorites) => {
            track_favorite(&state, &user_id, &listing_id, "favorite_removed");
            favorites_response(user_id, favorites)
        }
        Err(e) => store_failure(&user_id, e),
    }
}

/// GET /api/v1/users/{user_id}/ui-state
async fn get_ui_state(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> impl Responder {
    let user_id = path.into_inner();
    match state.preferences.ui_flags(&user_id).await {
        Ok(flags) => HttpResponse::Ok().json(ui_state_response(flags)),
        Err(e) => store_failure(&user_id, e),
    }
}

/// PUT /api/v1/users/{user_id}/ui-state
///
/// Only the flags present in the body are changed.
async fn update_ui_state(
    state: web::Data<AppState>,
    path: web::Path<String>,
    req: web::Json<UiStateRequest>,
) -> impl Responder {
    let user_id = path.into_inner();
    match state
        .preferences
        .update_ui_flags(&user_id, req.filters_collapsed, req.ai_match_collapsed)
        .await
    {
        Ok(flags) => HttpResponse::Ok().json(ui_state_response(flags)),
        Err(e) => store_failure(&user_id, e),
    }
}

/// Record analytics event endpoint
///
/// POST /api/v1/events
///
/// The event is accepted immediately; delivery to the sink is best-effort.
async fn record_event(
    state: web::Data<AppState>,
    req: web::Json<RecordEventRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return bad_request("Validation failed", errors.to_string());
    }

    let req = req.into_inner();
    let context = SessionContext::resume(req.session_id, req.user_id);
    state.analytics.track(&context, &req.event_type, req.attributes);

    HttpResponse::Accepted().json(RecordEventResponse {
        accepted: true,
        session_id: context.session_id,
    })
}

fn track_favorite(state: &AppState, user_id: &str, listing_id: &str, event: &str) {
    let context = SessionContext::new(Some(user_id.to_string()));
    let mut attributes = Map::new();
    attributes.insert("listingId".to_string(), json!(listing_id));
    state.analytics.track(&context, event, attributes);
}

fn favorites_response(user_id: String, favorites: Vec<String>) -> HttpResponse {
    HttpResponse::Ok().json(FavoritesResponse {
        user_id,
        count: favorites.len(),
        favorites,
    })
}

fn ui_state_response(flags: UiFlags) -> UiStateResponse {
    UiStateResponse {
        filters_collapsed: flags.filters_collapsed,
        ai_match_collapsed: flags.ai_match_collapsed,
    }
}

fn store_failure(user_id: &str, e: StoreError) -> HttpResponse {
    match e {
        StoreError::NotSignedIn => unauthorized(e.to_string()),
        e => {
            tracing::error!("Preference store failure for {}: {}", user_id, e);
            HttpResponse::InternalServerError().json(ErrorResponse {
                error: "Failed to access preferences".to_string(),
                message: e.to_string(),
                status_code: 500,
            })
        }
    }
}

fn bad_request(error: &str, message: String) -> HttpResponse {
    HttpResponse::BadRequest().json(ErrorResponse {
        error: error.to_string(),
        message,
        status_code: 400,
    })
}

fn unauthorized(message: String) -> HttpResponse {
    HttpResponse::Unauthorized().json(ErrorResponse {
        error: "Unauthorized".to_string(),
        message,
        status_code: 401,
    })
}
