mod common;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::{json, Value};
use std::time::Duration;
use tempfile::TempDir;

async fn wait_for_job(client: &reqwest::Client, url: &str, job_id: &str) -> Value {
    for _ in 0..100 {
        let job: Value = client
            .get(format!("{}/api/status/{}", url, job_id))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        if job["status"] == "completed" || job["status"] == "failed" {
            return job;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("job {} never finished", job_id);
}

#[tokio::test]
async fn test_probe_reports_service_info() {
    let dir = TempDir::new().unwrap();
    let (url, _state) = common::spawn_veda(8192, dir.path()).await;

    let info: Value = reqwest::get(&url).await.unwrap().json().await.unwrap();
    assert_eq!(info["name"], "VEDA");
    assert_eq!(info["gpu_present"], true);
    assert_eq!(info["tier"], "balanced");
    assert!(info["endpoints"].as_array().unwrap().len() >= 5);
}

#[tokio::test]
async fn test_styles_enhance_and_idea() {
    let dir = TempDir::new().unwrap();
    let (url, _state) = common::spawn_veda(4096, dir.path()).await;
    let client = reqwest::Client::new();

    let styles: Vec<Value> = client
        .get(format!("{}/api/styles", url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(styles.len(), 6);
    assert_eq!(styles[0]["name"], "cinematic");

    let enhanced: Value = client
        .post(format!("{}/api/enhance", url))
        .json(&json!({ "prompt": "city at night", "style": "reels" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let prompt = enhanced["prompt"].as_str().unwrap();
    assert!(prompt.starts_with("city at night, "));
    assert!(!enhanced["negative_prompt"].as_str().unwrap().is_empty());

    let idea: Value = client
        .get(format!("{}/api/idea?category=product", url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(!idea["idea"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn test_job_lifecycle() {
    let dir = TempDir::new().unwrap();
    let (url, _state) = common::spawn_veda(4096, dir.path()).await;
    let client = reqwest::Client::new();

    let submitted: Value = client
        .post(format!("{}/api/generate", url))
        .json(&json!({
            "prompt": "coffee cup with rising steam",
            "style": "product",
            "overrides": { "frame_count": 400 }
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(submitted["status"], "queued");
    let job_id = submitted["job_id"].as_str().unwrap().to_string();
    assert_eq!(job_id.len(), 8);

    let job = wait_for_job(&client, &url, &job_id).await;
    assert_eq!(job["status"], "completed", "job: {}", job);
    assert_eq!(job["target"], "local");
    assert_eq!(job["notices"].as_array().unwrap().len(), 1);
    assert!(job["duration_seconds"].is_number());

    let download = client
        .get(format!("{}/api/download/{}", url, job_id))
        .send()
        .await
        .unwrap();
    assert_eq!(download.status(), 200);
    assert_eq!(download.headers()["content-type"], "video/mp4");
    assert!(!download.bytes().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_unknown_job_is_404() {
    let dir = TempDir::new().unwrap();
    let (url, _state) = common::spawn_veda(4096, dir.path()).await;

    let response = reqwest::get(format!("{}/api/status/nope1234", url)).await.unwrap();
    assert_eq!(response.status(), 404);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["kind"], "not_found");
}

#[tokio::test]
async fn test_failed_job_records_error() {
    let dir = TempDir::new().unwrap();
    let (url, _state) = common::spawn_veda(4096, dir.path()).await;
    let client = reqwest::Client::new();

    let submitted: Value = client
        .post(format!("{}/api/generate", url))
        .json(&json!({ "prompt": "", "mode": "img2video" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let job_id = submitted["job_id"].as_str().unwrap();

    let job = wait_for_job(&client, &url, job_id).await;
    assert_eq!(job["status"], "failed");
    assert!(job["error"].as_str().unwrap().contains("source image"));

    let download = client
        .get(format!("{}/api/download/{}", url, job_id))
        .send()
        .await
        .unwrap();
    assert_eq!(download.status(), 400);
}

#[tokio::test]
async fn test_run_returns_video_bytes_and_busy_conflict() {
    let dir = TempDir::new().unwrap();
    let (url, state) = common::spawn_veda(4096, dir.path()).await;
    let client = reqwest::Client::new();
    let body = json!({
        "prompt": "sunflower field",
        "style": "nature",
        "mode": "img2video",
        "source_image_b64": STANDARD.encode([1u8, 2, 3, 4]),
    });

    let response = client
        .post(format!("{}/api/run", url))
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let manifest: Value = serde_json::from_slice(&response.bytes().await.unwrap()).unwrap();
    assert_eq!(manifest["source_image_bytes"], 4);
    assert_eq!(manifest["job"]["mode"], "img2video");

    let guard = state.orchestrator.try_acquire().unwrap();
    let busy = client
        .post(format!("{}/api/run", url))
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(busy.status(), 409);
    let error: Value = busy.json().await.unwrap();
    assert_eq!(error["kind"], "busy");
    drop(guard);
}

#[tokio::test]
async fn test_connect_and_remote_generate() {
    let host_dir = TempDir::new().unwrap();
    let (host_url, _host) = common::spawn_veda(12_288, host_dir.path()).await;
    let ui_dir = TempDir::new().unwrap();
    let (url, _state) = common::spawn_veda(0, ui_dir.path()).await;
    let client = reqwest::Client::new();

    let remote_without_session = client
        .post(format!("{}/api/generate", url))
        .json(&json!({ "prompt": "neon city", "target": "remote" }))
        .send()
        .await
        .unwrap();
    assert_eq!(remote_without_session.status(), 400);

    let connected: Value = client
        .post(format!("{}/api/connect", url))
        .json(&json!({ "url": &host_url }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(connected["connected"], true);
    assert_eq!(connected["endpoint"]["url"], host_url.as_str());

    let submitted: Value = client
        .post(format!("{}/api/generate", url))
        .json(&json!({ "prompt": "neon city", "target": "remote" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let job_id = submitted["job_id"].as_str().unwrap();
    let job = wait_for_job(&client, &url, job_id).await;
    assert_eq!(job["status"], "completed", "job: {}", job);
    assert!(job["target"].as_str().unwrap().starts_with("remote"));

    let disconnected = client
        .delete(format!("{}/api/connect", url))
        .send()
        .await
        .unwrap();
    assert_eq!(disconnected.status(), 204);
    let status: Value = client
        .get(format!("{}/api/connect", url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(status["connected"], false);
}

#[tokio::test]
async fn test_failed_connect_is_reported() {
    let dir = TempDir::new().unwrap();
    let (url, _state) = common::spawn_veda(4096, dir.path()).await;

    let response = reqwest::Client::new()
        .post(format!("{}/api/connect", url))
        .json(&json!({ "url": common::dead_port_url() }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 502);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["kind"], "unreachable");
}
