#![allow(dead_code)]

use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use veda_rs::config::PathConfig;
use veda_rs::hardware::HardwareProfile;
use veda_rs::orchestrator::Orchestrator;
use veda_rs::pipeline::DryRunPipeline;
use veda_rs::remote::RemoteBridge;
use veda_rs::server::{self, AppState};

/// Serve `app` on an ephemeral local port and return its base URL
pub async fn spawn(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

/// A local port with nothing listening on it
pub fn dead_port_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{}", port)
}

pub fn bridge(probe_ms: u64, submit_ms: u64) -> RemoteBridge {
    RemoteBridge::with_timeouts(Duration::from_millis(probe_ms), Duration::from_millis(submit_ms))
}

/// Dry-run orchestrator on a fake GPU with `vram_mb` of memory
pub fn dry_run_orchestrator(vram_mb: u64) -> Orchestrator {
    Orchestrator::new(
        HardwareProfile::with_vram(vram_mb),
        Arc::new(DryRunPipeline),
        bridge(2_000, 10_000),
    )
}

/// A full `veda serve` instance writing into `output_dir`
pub async fn spawn_veda(vram_mb: u64, output_dir: &std::path::Path) -> (String, Arc<AppState>) {
    let paths = PathConfig {
        output_dir: output_dir.to_string_lossy().into_owned(),
        ..Default::default()
    };
    let state = AppState::new(Arc::new(dry_run_orchestrator(vram_mb)), paths);
    let url = spawn(server::router(Arc::clone(&state))).await;
    (url, state)
}
