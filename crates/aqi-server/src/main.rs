use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use aqi_config::AppConfig;
use aqi_upstream::DataGovSource;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<()> {
    // Observability
    aqi_obs::init("aqi-server", env!("CARGO_PKG_VERSION"));

    // Config
    let cfg = AppConfig::load().context("failed to load configuration")?;
    let upstream = cfg.upstream().context("invalid upstream configuration")?;
    tracing::info!(
        dataset = %upstream.dataset_url,
        timeout_secs = upstream.timeout.as_secs(),
        limit = upstream.limit,
        "upstream configured"
    );

    // Build app and state
    let source = DataGovSource::new(upstream).context("failed to build upstream client")?;
    let (app, state) = aqi_server::build_app(Arc::new(source), &cfg.cors_allow())?;

    // Start HTTP server
    let addr: SocketAddr = cfg
        .http_bind()
        .parse()
        .context("invalid HTTP bind address")?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    // Mark ready just before serving
    aqi_server::set_ready(&state, true);

    tracing::info!(%addr, "HTTP server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("HTTP server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = ?e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
