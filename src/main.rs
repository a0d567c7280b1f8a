use actix_cors::Cors;
use actix_web::{error, http::StatusCode, middleware, web, App, HttpResponse, HttpServer};
use placerank::config::{LoggingSettings, Settings};
use placerank::core::MatchResolver;
use placerank::models::ErrorResponse;
use placerank::routes::{self, rankings::AppState};
use placerank::services::{LogNotifier, PostgresStore, RankingsCache, ReviewChangedHook, WebhookNotifier};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// JSON error response for malformed payloads
#[derive(Debug)]
pub struct JsonError(ErrorResponse);

impl std::fmt::Display for JsonError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.0.error, self.0.message)
    }
}

impl std::error::Error for JsonError {}

impl error::ResponseError for JsonError {
    fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.0.status_code).unwrap_or(StatusCode::BAD_REQUEST)
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(&self.0)
    }
}

/// Handle JSON payload errors
pub fn handle_json_payload_error(err: error::JsonPayloadError, req: &actix_web::HttpRequest) -> actix_web::Error {
    tracing::info!("JSON payload error on {}: {}", req.path(), err);
    JsonError(ErrorResponse {
        error: "invalid_json".to_string(),
        message: format!("Invalid JSON: {}", err),
        status_code: 400,
    })
    .into()
}

/// Handle query payload errors
pub fn handle_query_payload_error(err: error::QueryPayloadError, _req: &actix_web::HttpRequest) -> actix_web::Error {
    JsonError(ErrorResponse {
        error: "invalid_query".to_string(),
        message: format!("Invalid query: {}", err),
        status_code: 400,
    })
    .into()
}

/// Handle path segment errors
pub fn handle_path_error(err: error::PathError, _req: &actix_web::HttpRequest) -> actix_web::Error {
    JsonError(ErrorResponse {
        error: "invalid_path".to_string(),
        message: format!("Invalid path: {}", err),
        status_code: 400,
    })
    .into()
}

/// LOG_LEVEL and LOG_FORMAT override the `[logging]` section
fn init_logging(logging: &LoggingSettings) {
    let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| logging.level.clone());
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| logging.format.clone());

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(log_level))
        .with_target(false)
        .with_level(true);

    match log_format.as_str() {
        "pretty" => subscriber.pretty().init(),
        "json" => subscriber.json().init(),
        _ => subscriber.init(),
    }
}

fn io_error(context: &str, err: impl std::fmt::Display) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::Other, format!("{}: {}", context, err))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    let settings = Settings::load().map_err(|e| io_error("configuration error", e))?;

    init_logging(&settings.logging);

    info!("Starting placerank service...");

    let store = Arc::new(PostgresStore::from_settings(&settings.database).await.map_err(|e| {
        error!("Failed to connect to PostgreSQL: {}", e);
        io_error("PostgreSQL connection error", e)
    })?);

    info!("PostgreSQL store initialized");

    // The cache is optional - rankings are always readable from PostgreSQL
    let cache = if settings.cache.enabled {
        match RankingsCache::connect(
            &settings.cache.redis_url,
            settings.cache.l1_cache_size,
            settings.cache.ttl_secs,
        )
        .await
        {
            Ok(c) => {
                info!(
                    "Rankings cache initialized (L1: {} entries, TTL: {}s)",
                    settings.cache.l1_cache_size, settings.cache.ttl_secs
                );
                Some(Arc::new(c))
            }
            Err(e) => {
                warn!("Failed to connect to Redis ({}), running without cache", e);
                None
            }
        }
    } else {
        info!("Rankings cache disabled by configuration");
        None
    };

    let hook: Arc<dyn ReviewChangedHook> = match &settings.notifier.webhook_url {
        Some(url) => {
            let notifier = WebhookNotifier::new(url.clone(), Duration::from_secs(settings.notifier.timeout_secs))
                .map_err(|e| io_error("webhook client error", e))?;
            info!("Aggregate notifications posted to {}", url);
            Arc::new(notifier)
        }
        None => Arc::new(LogNotifier),
    };

    let resolver = Arc::new(MatchResolver::new(
        store.clone(),
        store.clone(),
        hook,
        settings.ranking.resolver_settings(),
    ));

    info!("Match resolver initialized with {:?}", settings.ranking);

    let app_state = AppState {
        store,
        resolver,
        cache,
        max_comparisons: settings.ranking.max_comparisons,
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
            .app_data(web::QueryConfig::default().error_handler(handle_query_payload_error))
            .app_data(web::PathConfig::default().error_handler(handle_path_error))
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
