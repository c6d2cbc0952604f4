//! HTTP surface of Warta Bursa: articles, comments, bookmarks, user-owned
//! investment records, newsletter and market data.

use axum::{
    extract::{rejection::JsonRejection, FromRequest, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use bursa_core::CoreError;
use bursa_store::{BursaDb, StoreError, UserStore};
use market_gateway::MarketGateway;
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub mod alert_routes;
pub mod article_routes;
pub mod auth;
pub mod bookmark_routes;
pub mod comment_routes;
pub mod config;
pub mod market_routes;
pub mod newsletter_routes;
pub mod portfolio_routes;
pub mod request_id;
pub mod response_cache;
pub mod security_headers;
pub mod watchlist_routes;


pub use config::ServerConfig;
use response_cache::{CacheInvalidator, ResponseCache};

#[derive(Clone)]
pub struct AppState {
    pub db: BursaDb,
    pub market: MarketGateway,
    pub cache: Arc<ResponseCache>,
    /// Receives publish signals; the response cache itself unless replaced.
    pub invalidator: Arc<dyn CacheInvalidator>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(db: BursaDb, market: MarketGateway, config: ServerConfig) -> Self {
        let cache = Arc::new(ResponseCache::with_capacity(
            config.market_cache_ttl,
            config.response_cache_max_entries,
        ));
        Self {
            db,
            market,
            invalidator: cache.clone(),
            cache,
            config: Arc::new(config),
        }
    }

    pub fn with_invalidator(mut self, invalidator: Arc<dyn CacheInvalidator>) -> Self {
        self.invalidator = invalidator;
        self
    }
}

/// Errors returned by handlers. Messages are shown to end users, so they are
/// Indonesian; only validation messages carry request-specific detail.
#[derive(Debug)]
pub enum AppError {
    Unauthorized,
    Forbidden,
    NotFound(String),
    Validation(String),
    Internal(anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "Silakan masuk terlebih dahulu".to_string(),
            ),
            AppError::Forbidden => (
                StatusCode::FORBIDDEN,
                "Anda tidak memiliki akses ke data ini".to_string(),
            ),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Internal(err) => {
                tracing::error!("Request failed: {:#}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Terjadi kesalahan pada server".to_string(),
                )
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(label) => AppError::NotFound(format!("{} tidak ditemukan", label)),
            StoreError::Forbidden => AppError::Forbidden,
            StoreError::Conflict(msg) | StoreError::Validation(msg) => AppError::Validation(msg),
            other => AppError::Internal(other.into()),
        }
    }
}

impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation(msg) => AppError::Validation(msg),
            other => AppError::Internal(other.into()),
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err)
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!("Rejected JSON body: {}", rejection.body_text());
        match rejection {
            JsonRejection::JsonDataError(e) => {
                AppError::Validation(format!("Data tidak valid: {}", e.body_text()))
            }
            _ => AppError::Validation("Body harus berupa JSON yang valid".to_string()),
        }
    }
}

/// `axum::Json` whose rejections become [`AppError`] responses.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// Parse a numeric path id; anything else cannot name a record.
pub(crate) fn parse_id(raw: &str, label: &str) -> Result<i64, AppError> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| AppError::NotFound(format!("{} tidak ditemukan", label)))
}

async fn health_check(State(state): State<AppState>) -> Result<Json<serde_json::Value>, AppError> {
    state.db.ping().await?;
    Ok(Json(json!({
        "status": "ok",
        "timestamp": chrono::Utc::now(),
    })))
}

async fn not_found() -> AppError {
    AppError::NotFound("Halaman tidak ditemukan".to_string())
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .merge(article_routes::article_routes(state.cache.clone()))
        .merge(comment_routes::comment_routes())
        .merge(bookmark_routes::bookmark_routes())
        .merge(alert_routes::alert_routes())
        .merge(portfolio_routes::portfolio_routes())
        .merge(watchlist_routes::watchlist_routes())
        .merge(newsletter_routes::newsletter_routes())
        .merge(market_routes::market_routes(state.cache.clone()))
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::protected_pages_middleware,
        ))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            security_headers::security_headers_middleware,
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http().make_span_with(request_id::make_request_span))
        .layer(middleware::from_fn(request_id::request_id_middleware))
        .with_state(state)
}

/// `RUST_LOG` filter (default `info,api_server=debug`), JSON lines when
/// `LOG_FORMAT=json`.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,api_server=debug,tower_http=info"));

    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    if json_logs {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    tracing::info!("Shutdown signal received");
}

pub async fn run_server() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ServerConfig::from_env();

    if !BursaDb::exists(&config.database_url) {
        tracing::info!("Creating new database at {}", config.database_url);
    }
    let db = BursaDb::new(&config.database_url).await?;

    let purged = UserStore::new(db.clone()).purge_expired_sessions().await?;
    if purged > 0 {
        tracing::info!("Purged {} expired sessions", purged);
    }

    let market = MarketGateway::from_config(&config.gateway);
    let bind_addr = config.bind_addr.clone();
    let app = build_router(AppState::new(db, market, config));

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("Warta Bursa API listening on {}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
