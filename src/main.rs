//! ForgeLink binary entry point

use forgelink::{AppState, config};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Application entry point
///
/// # Setup
/// 1. Initialize tracing/logging
/// 2. Load configuration from file and environment
/// 3. Initialize AppState (templates, forge client, session)
/// 4. Build Axum router
/// 5. Start HTTP server
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Initialize tracing/logging
    let log_format =
        std::env::var("FORGELINK__LOGGING__FORMAT").unwrap_or_else(|_| "pretty".to_string());
    let log_level =
        std::env::var("FORGELINK__LOGGING__LEVEL").unwrap_or_else(|_| "info".to_string());
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("forgelink={},tower_http=debug", log_level).into());

    if log_format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    }

    tracing::info!("Starting ForgeLink...");

    // 2. Initialize metrics
    forgelink::metrics::init_metrics();

    // 3. Load configuration
    let config = config::AppConfig::load()?;
    tracing::info!(
        listen_addr = %config.server.listen_addr,
        redirect_uri = %config.oauth.redirect_uri,
        "Configuration loaded"
    );

    // 4. Initialize application state
    let addr = config.server.socket_addr()?;
    let state = AppState::new(config)?;

    // 5. Build Axum router
    let app = forgelink::build_router(state);

    // 6. Start HTTP server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
