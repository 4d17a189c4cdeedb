// Web front end - HTTP server exposing the session over a small JSON API
//
// This module implements the polling web surface using Axum. The embedded
// control page polls /api/status every 100ms; status reads are cheap,
// non-blocking snapshots, so high-frequency polling never stalls on a
// transition in progress.

pub mod api;
mod page;

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{routing::get, Router};
use tokio::net::TcpListener;

use crate::config::Config;
use crate::core::SessionController;

/// Shared state for the HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// The one session controller this process owns
    pub controller: Arc<SessionController>,
}

/// Start the web server. Runs until the shutdown signal fires.
pub async fn start_server(
    config: Config,
    controller: Arc<SessionController>,
    shutdown_rx: tokio::sync::oneshot::Receiver<()>,
) -> Result<()> {
    let bind_addr = config.bind_addr;
    let state = AppState { controller };

    // All session endpoints are GET: the operator drives them from page
    // buttons and they are trivially retried
    let app = Router::new()
        .route("/", get(page::index))
        .route("/api/status", get(api::get_status))
        .route("/api/start_calibration", get(api::start_calibration))
        .route("/api/finish_calibration", get(api::finish_calibration))
        .route("/api/start_measure", get(api::start_measure))
        .route("/api/stop_measure", get(api::stop_measure))
        .route("/api/reset", get(api::reset))
        .with_state(state);

    let listener = TcpListener::bind(bind_addr)
        .await
        .context("Failed to bind to address")?;

    tracing::info!("Listening on http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_rx.await.ok();
        })
        .await
        .context("Server error")?;

    tracing::info!("Server shut down gracefully");
    Ok(())
}
