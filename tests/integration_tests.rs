// Integration tests for the Nest Match HTTP API

use actix_web::{test, web, App};
use nest_match::core::Matcher;
use nest_match::routes::{self, AppState};
use nest_match::services::{
    AnalyticsClient, KeyValueStore, ListingsClient, MemoryStore, PreferenceKey, PreferenceStore,
};
use serde_json::{json, Value};
use std::sync::Arc;

const LISTINGS_BODY: &str = r#"{
    "success": true,
    "data": [
        {"id": "house", "title": "Family house", "price": 2200, "location": "Bangi",
         "propertyType": "House", "preferredGender": "Male Only"},
        {"id": "studio", "title": "Studio", "price": 800, "location": "Seksyen 7",
         "propertyType": "Studio", "preferredGender": "Any Gender",
         "smokingPreference": "Non-Smoker Only"},
        {"id": "room", "title": "Single room", "price": 450, "location": "Seksyen 13, Shah Alam",
         "propertyType": "Single Room", "furnishing": "Fully Furnished"}
    ]
}"#;

fn app_state(listings_url: String, analytics: AnalyticsClient, store: Arc<MemoryStore>) -> AppState {
    AppState {
        listings: Arc::new(ListingsClient::new(listings_url, 5).unwrap()),
        analytics,
        preferences: PreferenceStore::new(store),
        matcher: Matcher::default(),
    }
}

#[actix_web::test]
async fn test_health() {
    let state = app_state("http://127.0.0.1:9".to_string(), AnalyticsClient::disabled(), Arc::new(MemoryStore::new()));
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .configure(routes::configure_routes),
    )
    .await;

    let req = test::TestRequest::get().uri("/api/v1/health").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["status"], "healthy");
}

#[actix_web::test]
async fn test_search_scored_path_ranks_all_listings() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/properties")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(LISTINGS_BODY)
        .create_async()
        .await;

    let state = app_state(server.url(), AnalyticsClient::disabled(), Arc::new(MemoryStore::new()));
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .configure(routes::configure_routes),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/v1/listings/search")
        .set_json(json!({
            "propertyType": "Studio",
            "minPrice": 500,
            "maxPrice": 1000,
            "genderPreference": "Female Only",
            "smokingPreference": "Non-Smoker Only",
            "location": "Seksyen 7"
        }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["mode"], "scored");
    assert_eq!(body["totalResults"], 3);
    assert_eq!(body["listings"][0]["id"], "studio");
    assert_eq!(body["listings"][0]["match"]["score"], 90);
    assert!(body["error"].is_null());

    let scores: Vec<u64> = body["listings"]
        .as_array()
        .unwrap()
        .iter()
        .map(|l| l["match"]["score"].as_u64().unwrap())
        .collect();
    assert!(scores.windows(2).all(|w| w[0] >= w[1]));
}

#[actix_web::test]
async fn test_search_filter_path() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/properties")
        .with_status(200)
        .with_body(LISTINGS_BODY)
        .create_async()
        .await;

    let state = app_state(server.url(), AnalyticsClient::disabled(), Arc::new(MemoryStore::new()));
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .configure(routes::configure_routes),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/v1/listings/search")
        .set_json(json!({ "location": "shah alam", "maxPrice": 1000, "propertyType": "" }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["mode"], "filtered");
    assert_eq!(body["totalResults"], 1);
    assert_eq!(body["listings"][0]["id"], "room");
    assert!(body["listings"][0].get("match").is_none());
}

#[actix_web::test]
async fn test_search_fetch_failure_returns_empty_set() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/properties")
        .with_status(503)
        .with_body(r#"{"success":false,"message":"Database offline"}"#)
        .create_async()
        .await;

    let state = app_state(server.url(), AnalyticsClient::disabled(), Arc::new(MemoryStore::new()));
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .configure(routes::configure_routes),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/v1/listings/search")
        .set_json(json!({}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["totalResults"], 0);
    assert_eq!(body["error"], "Database offline");
}

#[actix_web::test]
async fn test_search_rejects_negative_price() {
    let state = app_state("http://127.0.0.1:9".to_string(), AnalyticsClient::disabled(), Arc::new(MemoryStore::new()));
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .configure(routes::configure_routes),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/v1/listings/search")
        .set_json(json!({ "minPrice": -5 }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status().as_u16(), 400);
}

#[actix_web::test]
async fn test_analytics_failure_does_not_fail_search() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/properties")
        .with_status(200)
        .with_body(LISTINGS_BODY)
        .create_async()
        .await;
    server
        .mock("POST", "/events")
        .with_status(500)
        .create_async()
        .await;

    let analytics = AnalyticsClient::new(format!("{}/events", server.url()), 5).unwrap();
    let state = app_state(server.url(), analytics, Arc::new(MemoryStore::new()));
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .configure(routes::configure_routes),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/v1/listings/search")
        .set_json(json!({ "genderPreference": "Male Only" }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert!(resp.status().is_success());
}

#[actix_web::test]
async fn test_delete_requires_caller_identity() {
    let mut server = mockito::Server::new_async().await;
    let delete = server
        .mock("DELETE", "/properties/studio")
        .match_header("x-user-id", "owner_1")
        .with_status(200)
        .with_body(r#"{"success":true}"#)
        .expect(1)
        .create_async()
        .await;

    let state = app_state(server.url(), AnalyticsClient::disabled(), Arc::new(MemoryStore::new()));
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .configure(routes::configure_routes),
    )
    .await;

    let anonymous = test::TestRequest::delete()
        .uri("/api/v1/listings/studio")
        .to_request();
    assert_eq!(test::call_service(&app, anonymous).await.status().as_u16(), 401);

    let owner = test::TestRequest::delete()
        .uri("/api/v1/listings/studio")
        .insert_header(("X-User-Id", "owner_1"))
        .to_request();
    assert!(test::call_service(&app, owner).await.status().is_success());

    delete.assert_async().await;
}

#[actix_web::test]
async fn test_delete_failure_surfaces_message() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("DELETE", "/properties/studio")
        .with_status(403)
        .with_body(r#"{"success":false,"message":"Not your listing"}"#)
        .create_async()
        .await;

    let state = app_state(server.url(), AnalyticsClient::disabled(), Arc::new(MemoryStore::new()));
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .configure(routes::configure_routes),
    )
    .await;

    let req = test::TestRequest::delete()
        .uri("/api/v1/listings/studio")
        .insert_header(("X-User-Id", "student_1"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 502);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Not your listing");
}

#[actix_web::test]
async fn test_favorites_migrate_and_update() {
    let store = Arc::new(MemoryStore::with_entries([(
        PreferenceKey::LEGACY_FAVORITES,
        r#"["studio"]"#,
    )]));
    let state = app_state("http://127.0.0.1:9".to_string(), AnalyticsClient::disabled(), store.clone());
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .configure(routes::configure_routes),
    )
    .await;

    let req = test::TestRequest::get()
        .uri("/api/v1/users/student_1/favorites")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["favorites"], json!(["studio"]));
    assert_eq!(store.get(PreferenceKey::LEGACY_FAVORITES).await.unwrap(), None);

    let req = test::TestRequest::put()
        .uri("/api/v1/users/student_1/favorites/room")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["favorites"], json!(["studio", "room"]));
    assert_eq!(body["count"], 2);

    let req = test::TestRequest::delete()
        .uri("/api/v1/users/student_1/favorites/studio")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["favorites"], json!(["room"]));
}

#[actix_web::test]
async fn test_ui_state_roundtrip() {
    let state = app_state("http://127.0.0.1:9".to_string(), AnalyticsClient::disabled(), Arc::new(MemoryStore::new()));
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .configure(routes::configure_routes),
    )
    .await;

    let req = test::TestRequest::put()
        .uri("/api/v1/users/student_1/ui-state")
        .set_json(json!({ "aiMatchCollapsed": true }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body, json!({ "filtersCollapsed": false, "aiMatchCollapsed": true }));

    let req = test::TestRequest::get()
        .uri("/api/v1/users/student_1/ui-state")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["aiMatchCollapsed"], true);
}

#[actix_web::test]
async fn test_record_event_is_accepted() {
    let state = app_state("http://127.0.0.1:9".to_string(), AnalyticsClient::disabled(), Arc::new(MemoryStore::new()));
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .configure(routes::configure_routes),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/v1/events")
        .set_json(json!({
            "eventType": "listing_viewed",
            "sessionId": "session_1",
            "attributes": { "listingId": "studio" }
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 202);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["sessionId"], "session_1");
}
