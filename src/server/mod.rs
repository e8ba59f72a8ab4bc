//! HTTP API served by `veda serve`
//!
//! The same router backs the browser UI (asynchronous job API) and remote
//! bridging (`GET /` probe plus synchronous `POST /api/run`).

pub mod handlers;
pub mod jobs;
pub mod state;

pub use jobs::{Job, JobStatus, JobStore};
pub use state::AppState;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tracing::info;

use crate::config::ServerConfig;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/api/styles", get(handlers::list_styles))
        .route("/api/enhance", post(handlers::enhance_prompt))
        .route("/api/idea", get(handlers::idea))
        .route("/api/run", post(handlers::run))
        .route("/api/generate", post(handlers::generate))
        .route("/api/status/{job_id}", get(handlers::job_status))
        .route("/api/download/{job_id}", get(handlers::download))
        .route(
            "/api/connect",
            get(handlers::connection_status)
                .post(handlers::connect)
                .delete(handlers::disconnect),
        )
        .with_state(state)
}

/// Bind and serve until Ctrl-C
pub async fn serve(config: &ServerConfig, state: Arc<AppState>) -> anyhow::Result<()> {
    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("VEDA API listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutting down");
        })
        .await?;
    Ok(())
}
