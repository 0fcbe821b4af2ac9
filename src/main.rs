use actix_cors::Cors;
use actix_web::{error, http::StatusCode, middleware, web, App, HttpResponse, HttpServer};
use nest_match::config::{LoggingSettings, Settings, StorageBackend};
use nest_match::core::Matcher;
use nest_match::routes::{self, AppState};
use nest_match::services::{
    AnalyticsClient, KeyValueStore, ListingSource, ListingsClient, MemoryStore, PreferenceStore, RedisStore,
};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// JSON error response for JSON payload errors
#[derive(Debug, serde::Serialize)]
pub struct JsonError {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

impl std::fmt::Display for JsonError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

impl std::error::Error for JsonError {}

impl error::ResponseError for JsonError {
    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::BAD_REQUEST))
            .json(self)
    }
}

/// Handle JSON payload errors
pub fn handle_json_payload_error(err: error::JsonPayloadError, req: &actix_web::HttpRequest) -> actix_web::Error {
    tracing::info!("JSON payload error on {}: {}", req.path(), err);
    JsonError {
        error: "invalid_json".to_string(),
        message: format!("Invalid JSON: {}", err),
        status_code: 400,
    }
    .into()
}

fn init_logging(logging: &LoggingSettings) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    if logging.is_pretty() {
        subscriber.pretty().init();
    } else {
        subscriber.json().init();
    }
}

fn startup_error(context: &str, e: impl std::fmt::Display) -> std::io::Error {
    error!("{}: {}", context, e);
    std::io::Error::new(std::io::ErrorKind::Other, format!("{}: {}", context, e))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    let settings = Settings::load();

    let logging = settings
        .as_ref()
        .map(|s| s.logging.clone())
        .unwrap_or_default()
        .with_overrides(std::env::var("LOG_LEVEL").ok(), std::env::var("LOG_FORMAT").ok());
    init_logging(&logging);

    info!("Starting Nest Match listing service...");

    let settings = settings.map_err(|e| startup_error("Failed to load configuration", e))?;

    info!("Configuration loaded successfully");

    let listings: Arc<dyn ListingSource> = Arc::new(
        ListingsClient::new(settings.listings.base_url.clone(), settings.listings.timeout_secs)
            .map_err(|e| startup_error("Failed to create listings client", e))?,
    );

    info!("Listings client initialized ({})", settings.listings.base_url);

    let analytics = match &settings.analytics.endpoint {
        Some(endpoint) => AnalyticsClient::new(endpoint.clone(), settings.analytics.timeout_secs)
            .map_err(|e| startup_error("Failed to create analytics client", e))?,
        None => {
            warn!("No analytics endpoint configured, events will be dropped");
            AnalyticsClient::disabled()
        }
    };

    let store: Arc<dyn KeyValueStore> = match settings.storage.backend {
        StorageBackend::Redis => {
            let redis_url = settings
                .storage
                .redis_url
                .as_deref()
                .ok_or_else(|| startup_error("Redis storage selected", "storage.redis_url is not set"))?;
            let store = RedisStore::new(redis_url, settings.storage.key_prefix.clone())
                .await
                .map_err(|e| startup_error("Failed to connect to Redis", e))?;
            info!("Preference store backed by Redis");
            Arc::new(store)
        }
        StorageBackend::Memory => {
            warn!("Preference store is in-memory, preferences are lost on restart");
            Arc::new(MemoryStore::new())
        }
    };

    let budget = settings.scoring.budget_defaults();
    let matcher = Matcher::new(budget);

    info!("Matcher initialized with budget defaults: {:?}", budget);

    let app_state = AppState {
        listings,
        analytics,
        preferences: PreferenceStore::new(store),
        matcher,
    };

    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::JsonConfig::default().error_handler(handle_json_payload_error))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
