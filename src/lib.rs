//! Media tracker - a REST backend for tracking movies, books, games, anime and TV
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      API Layer (Axum)                        │
//! │  - Auth, media, entries, sync                               │
//! │  - Collections, share links, guest endpoints                │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Service Layer                            │
//! │  - Ownership checks                                         │
//! │  - Sync reconciler, share tokens                            │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Data Layer                              │
//! │  - SQLite (sqlx)                                            │
//! │  - Token cache liveness check                               │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - `api`: HTTP handlers
//! - `service`: Business logic layer
//! - `data`: Database and cache layer
//! - `auth`: Session tokens and the current-user extractor
//! - `config`: Configuration management
//! - `error`: Error types
//! - `metrics`: Prometheus instruments

pub mod api;
pub mod auth;
pub mod config;
pub mod data;
pub mod error;
pub mod metrics;
pub mod service;

use std::sync::Arc;

use service::{
    AccountService, CatalogResolver, CollectionService, EntryService, GuestService, MediaCatalog,
    ShareService, SyncReconciler,
};

/// Application state shared across all handlers
///
/// This struct is cloned for each request and contains
/// shared resources like the database pool and cache handle.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<config::AppConfig>,

    /// Database connection pool
    pub db: Arc<data::Database>,

    /// Token cache, present when `cache.url` is configured
    pub token_cache: Option<Arc<data::TokenCache>>,
}

impl AppState {
    /// Initialize application state
    ///
    /// # Steps
    /// 1. Connect to SQLite database (runs migrations)
    /// 2. Check the token cache, if configured
    ///
    /// # Errors
    /// Returns error if any initialization step fails
    pub async fn new(config: config::AppConfig) -> Result<Self, error::AppError> {
        tracing::info!("Initializing application state...");

        // 1. Connect to SQLite database
        let db = data::Database::connect(&config.database.path).await?;
        tracing::info!("Database connected");

        // 2. Check token cache
        let token_cache = match &config.cache.url {
            Some(url) => Some(Arc::new(data::TokenCache::connect(url).await?)),
            None => {
                tracing::info!("No token cache configured");
                None
            }
        };

        tracing::info!("Application state initialized successfully");

        Ok(Self {
            config: Arc::new(config),
            db: Arc::new(db),
            token_cache,
        })
    }

    pub fn accounts(&self) -> AccountService {
        AccountService::new(self.db.clone())
    }

    pub fn catalog(&self) -> MediaCatalog {
        MediaCatalog::new(self.db.clone())
    }

    pub fn entries(&self) -> EntryService {
        EntryService::new(self.db.clone())
    }

    pub fn collections(&self) -> CollectionService {
        CollectionService::new(self.db.clone())
    }

    pub fn shares(&self) -> ShareService {
        ShareService::new(self.db.clone(), self.config.share.enforce_expiry)
    }

    pub fn guests(&self) -> GuestService {
        GuestService::new(self.entries(), self.shares())
    }

    /// Reconciler using the configured media match policy
    pub fn reconciler(&self) -> SyncReconciler<CatalogResolver, EntryService> {
        SyncReconciler::new(
            CatalogResolver::new(self.catalog(), self.config.sync.media_match),
            self.entries(),
        )
    }
}

/// Build the Axum router with all routes.
///
/// This is shared by the binary and integration tests to keep route
/// composition consistent across environments.
pub fn build_router(state: AppState) -> axum::Router {
    use axum::Router;
    use tower_http::{compression::CompressionLayer, trace::TraceLayer};

    let cors_layer = build_cors_layer(&state.config.server);

    Router::new()
        .route("/health", axum::routing::get(health_check))
        .nest("/api", api::api_router())
        .merge(api::share_link_router())
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .with_state(state)
        .merge(api::metrics_router())
}

fn build_cors_layer(server: &config::ServerConfig) -> tower_http::cors::CorsLayer {
    use axum::http::HeaderValue;
    use tower_http::cors::{Any, CorsLayer};

    if !server.protocol.eq_ignore_ascii_case("https") {
        return CorsLayer::permissive();
    }

    let allowed_origin = server.base_url();
    match HeaderValue::from_str(&allowed_origin) {
        Ok(origin) => CorsLayer::new()
            .allow_origin([origin])
            .allow_methods(Any)
            .allow_headers(Any),
        Err(error) => {
            tracing::error!(
                %error,
                origin = %allowed_origin,
                "Failed to parse CORS origin from server base URL; denying cross-origin requests"
            );
            CorsLayer::new().allow_methods(Any).allow_headers(Any)
        }
    }
}

async fn health_check() -> &'static str {
    "OK"
}
