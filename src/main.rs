use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;

use lawloom_backend::core::config::{AppPaths, ConfigService};
use lawloom_backend::core::logging;
use lawloom_backend::server;
use lawloom_backend::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    let paths = Arc::new(AppPaths::new());
    logging::init(&paths, "server.log");

    let config = ConfigService::new(paths.clone());
    let effective = config.load_config().context("Failed to load configuration")?;
    tracing::info!(
        "Effective configuration: {}",
        config.redact_sensitive_values(&effective)
    );
    let settings = config
        .load_settings()
        .context("Invalid configuration")?;

    let bind_addr = settings.bind_addr();
    let state = AppState::initialize(settings)
        .await
        .context("Failed to initialize answer chain")?;

    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", bind_addr))?;
    let addr = listener.local_addr()?;
    tracing::info!("Listening on {}", addr);

    let app: Router = server::router::router(state);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", err);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
