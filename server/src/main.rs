//! HTTP entry point for the collaborative comic engine.

mod config;
mod routes;

use anyhow::Context;
use config::Config;
use routes::AppState;
use std::sync::Arc;
use story_core::SessionRegistry;
use tower_http::cors::CorsLayer;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("failed to load configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_level.to_string().into()),
        )
        .init();

    let state = AppState {
        registry: Arc::new(SessionRegistry::new()),
        config: config.clone(),
    };

    let app = routes::router(state).layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind(config.bind_address)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_address))?;
    info!(address = %config.bind_address, "story server listening");

    axum::serve(listener, app)
        .await
        .context("server terminated")?;

    Ok(())
}
