//! ForgeLink - a single-session code-forge OAuth demo
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Router (Axum)                           │
//! │  - OAuth pages: /authorize /redirect /error /success        │
//! │  - Pages: / /index /clone                                   │
//! │  - /health /metrics                                         │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Service Layer                            │
//! │  - Login (token exchange + user fetch + session publish)    │
//! │  - Clone (validated git invocation)                         │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  Forge client / Session                      │
//! │  - reqwest client for token and REST endpoints              │
//! │  - Single process-wide session, swapped atomically          │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - `api`: Page and metrics handlers
//! - `auth`: OAuth flow handlers and the session holder
//! - `forge`: HTTP client for the code forge
//! - `service`: Login and clone logic
//! - `templates`: Page templates
//! - `config`: Configuration management
//! - `error`: Error types

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod forge;
pub mod metrics;
pub mod service;
pub mod templates;

use std::sync::Arc;

/// Application state shared across all handlers
///
/// Cloned for each request; everything inside is shared.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<config::AppConfig>,

    /// The single demo session
    pub sessions: Arc<auth::SessionHolder>,

    /// HTTP client for the code forge
    pub forge: forge::ForgeClient,

    /// Login orchestration
    pub login: Arc<service::LoginService>,

    /// Clone collaborator
    pub cloner: Arc<dyn service::RepositoryCloner>,

    /// Compiled page templates
    pub templates: templates::Templates,
}

impl AppState {
    /// Initialize application state
    ///
    /// # Steps
    /// 1. Load and compile templates
    /// 2. Build the forge HTTP client
    /// 3. Create the empty session holder
    ///
    /// # Errors
    /// Returns error if any initialization step fails
    pub fn new(config: config::AppConfig) -> Result<Self, error::AppError> {
        tracing::info!("Initializing application state...");

        let templates = templates::Templates::load(&config.templates.dir)?;

        let forge = forge::ForgeClient::new(config.forge.clone(), &config.http)?;
        tracing::info!(api = %config.forge.api_base_url, "Forge client initialized");

        let sessions = Arc::new(auth::SessionHolder::new());
        let login = Arc::new(service::LoginService::new(
            forge.clone(),
            config.oauth.clone(),
            Arc::clone(&sessions),
        ));
        let cloner: Arc<dyn service::RepositoryCloner> =
            Arc::new(service::GitCloner::new(config.clone.clone()));

        tracing::info!("Application state initialized successfully");

        Ok(Self {
            config: Arc::new(config),
            sessions,
            forge,
            login,
            cloner,
            templates,
        })
    }

    /// Replace the clone collaborator
    pub fn with_cloner(mut self, cloner: Arc<dyn service::RepositoryCloner>) -> Self {
        self.cloner = cloner;
        self
    }
}

/// Build the Axum router with all routes.
///
/// This is shared by the binary and integration tests to keep route
/// composition consistent across environments.
pub fn build_router(state: AppState) -> axum::Router {
    use axum::Router;
    use tower_http::{compression::CompressionLayer, trace::TraceLayer};

    Router::new()
        .route("/health", axum::routing::get(health_check))
        .merge(auth::auth_router())
        .merge(api::pages_router())
        .fallback(api::page_not_found)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
        .merge(api::metrics_router())
}

async fn health_check() -> &'static str {
    "OK"
}
