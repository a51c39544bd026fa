mod client;
mod config;
mod controller;
mod error;
mod history;
mod models;
mod notify;
mod preferences;
mod progress;
mod request;
mod routes;
mod session;
mod staging;
#[cfg(test)]
mod testing;

use anyhow::Context;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{fmt, EnvFilter};
use tower_http::cors::{CorsLayer, Any};

use crate::client::TryOnClient;
use crate::config::Config;
use crate::preferences::PreferenceStore;
use crate::progress::SyntheticProgress;
use crate::routes::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // Init tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    let config = Config::from_env();
    let api = TryOnClient::new(&config.api_base, config.http_timeout).context("building HTTP client")?;
    tracing::info!("Using try-on API at {}", api.base_url());

    let state = AppState::new(
        Arc::new(api),
        Arc::new(SyntheticProgress::new(config.progress_tick)),
        PreferenceStore::load(&config.prefs_path),
    );

    let app = routes::router(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        );

    let addr = SocketAddr::from(([0,0,0,0], config.port));
    tracing::info!(%addr, "Starting server");
    let listener = tokio::net::TcpListener::bind(addr).await.with_context(|| format!("binding {addr}"))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving")?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Could not listen for ctrl-c: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
