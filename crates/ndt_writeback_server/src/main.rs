//! ndt-writeback: REST server for asserting building states, assessments and
//! flags into the NDT knowledge store. Configuration is read from the
//! environment (and `.env`); see [`ndt_writeback_server::config`].

use std::net::SocketAddr;

use anyhow::Context;
use tokio::net::TcpListener;

use ndt_writeback_server::config::ServerConfig;
use ndt_writeback_server::router::build_router;
use ndt_writeback_server::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,ndt_writeback_server=debug".into()),
        )
        .init();

    let cfg = ServerConfig::from_env()?;
    tracing::info!(
        store = %cfg.store_url,
        access = %cfg.access_url,
        mode = ?cfg.update_mode,
        dev = cfg.dev,
        "configuration loaded"
    );

    let (state, forwarder) = AppState::from_config(&cfg)?;
    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], cfg.port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {addr}"))?;
    tracing::info!("ndt-writeback listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    // The router held the last sink sender; the forwarder now drains and exits.
    if let Some(forwarder) = forwarder {
        tracing::info!("draining event sink");
        if let Err(e) = forwarder.await {
            tracing::error!(error = %e, "event sink forwarder failed");
        }
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
