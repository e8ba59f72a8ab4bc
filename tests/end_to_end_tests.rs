mod common;

use axum::{extract::State, routing::{get, post}, Json, Router};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tempfile::TempDir;
use veda_rs::config::{GenerationOverrides, Notice};
use veda_rs::hardware::Tier;
use veda_rs::orchestrator::{GenerationError, GenerationMode, GenerationRequest, GenerationStatus, Target};
use veda_rs::remote::RunRequest;
use veda_rs::styles::StylePreset;

const PROMPT: &str = "woman smiling at sunset beach";

fn portrait_request(output: std::path::PathBuf) -> GenerationRequest {
    GenerationRequest::new(PROMPT, StylePreset::Portrait, GenerationMode::Text2Video, output)
}

#[tokio::test]
async fn test_local_generation_on_small_gpu() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("videos").join("beach.mp4");
    let orchestrator = common::dry_run_orchestrator(4096);

    let result = orchestrator
        .generate(portrait_request(output.clone()), &Target::Local)
        .await
        .unwrap();

    assert_eq!(result.status, GenerationStatus::Ok);
    assert_eq!(result.tier, Some(Tier::Conservative));
    let config = result.config.unwrap();
    assert_eq!((config.width, config.height), (512, 768));
    assert!(config.frame_count <= 49);
    assert_eq!(config.inference_steps, 25);
    assert_eq!(result.video_path.as_deref(), Some(output.as_path()));
    assert!(output.exists());
    assert!(result.notices.is_empty());

    let manifest: serde_json::Value =
        serde_json::from_slice(&std::fs::read(&output).unwrap()).unwrap();
    let rendered = manifest["job"]["prompt"].as_str().unwrap();
    assert!(rendered.starts_with(PROMPT));
    assert_eq!(manifest["job"]["seed"], 42);
}

#[tokio::test]
async fn test_unreachable_remote_produces_no_video() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("beach.mp4");
    let orchestrator = common::dry_run_orchestrator(4096);

    let started = Instant::now();
    let connected = orchestrator.bridge().connect(&common::dead_port_url()).await;
    assert!(connected.is_err());
    assert!(started.elapsed() < Duration::from_secs(5));

    // Nothing to generate against; the output must not appear
    assert!(!output.exists());
    assert!(!orchestrator.is_busy());
}

#[tokio::test]
async fn test_oversized_frame_request_is_clamped() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("long.mp4");
    let orchestrator = common::dry_run_orchestrator(4096);

    let request = portrait_request(output.clone()).with_overrides(GenerationOverrides {
        frame_count: Some(400),
        ..Default::default()
    });
    let result = orchestrator.generate(request, &Target::Local).await.unwrap();

    assert!(result.is_ok());
    let config = result.config.unwrap();
    assert!(config.frame_count <= 49);
    assert_eq!((config.frame_count - 1) % 8, 0);
    match result.notices.as_slice() {
        [Notice::FramesClamped { requested, allowed, tier }] => {
            assert_eq!(*requested, 400);
            assert_eq!(*allowed, config.frame_count);
            assert_eq!(*tier, Tier::Conservative);
        }
        other => panic!("expected one clamp notice, got {:?}", other),
    }
    assert!(output.exists());
}

#[tokio::test]
async fn test_fast_drops_one_tier() {
    let dir = TempDir::new().unwrap();
    let orchestrator = common::dry_run_orchestrator(12_288);

    let full = orchestrator
        .generate(portrait_request(dir.path().join("a.mp4")), &Target::Local)
        .await
        .unwrap();
    let fast = orchestrator
        .generate(portrait_request(dir.path().join("b.mp4")).fast(true), &Target::Local)
        .await
        .unwrap();

    assert_eq!(full.tier, Some(Tier::High));
    assert_eq!(fast.tier, Some(Tier::Balanced));
}

#[tokio::test]
async fn test_img2video_without_image_is_rejected() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("still.mp4");
    let orchestrator = common::dry_run_orchestrator(8192);

    let request = GenerationRequest::new("", StylePreset::Product, GenerationMode::Img2Video, output.clone());
    let err = orchestrator.generate(request, &Target::Local).await.unwrap_err();

    assert!(matches!(err, GenerationError::InvalidRequest(_)));
    assert!(!output.exists());
    assert!(!orchestrator.is_busy());
}

#[tokio::test]
async fn test_remote_generation_through_veda_host() {
    let host_dir = TempDir::new().unwrap();
    let (url, host) = common::spawn_veda(12_288, host_dir.path()).await;

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("remote.mp4");
    let client = common::dry_run_orchestrator(0);
    let session = client.bridge().connect(&url).await.unwrap();

    let request = portrait_request(output.clone()).with_image(vec![9, 9, 9]);
    let result = client
        .generate(request, &Target::Remote(session))
        .await
        .unwrap();

    assert!(result.is_ok());
    assert!(result.target.starts_with("remote"));
    assert!(!host.orchestrator.is_busy());

    // The host renders what the client enhanced, without enhancing again
    let manifest: serde_json::Value =
        serde_json::from_slice(&std::fs::read(&output).unwrap()).unwrap();
    let rendered = manifest["job"]["prompt"].as_str().unwrap();
    let modifier = StylePreset::Portrait.spec().modifiers[0];
    assert_eq!(rendered.matches(modifier).count(), 1);
    assert_eq!(manifest["job"]["config"]["width"], 704);
}

#[tokio::test]
async fn test_second_generation_while_busy_is_refused() {
    let orchestrator = Arc::new(common::dry_run_orchestrator(4096));
    let guard = orchestrator.try_acquire().unwrap();
    let dir = TempDir::new().unwrap();

    let err = orchestrator
        .generate(portrait_request(dir.path().join("x.mp4")), &Target::Local)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "busy");

    drop(guard);
    assert!(orchestrator
        .generate(portrait_request(dir.path().join("y.mp4")), &Target::Local)
        .await
        .is_ok());
}

type Received = Arc<Mutex<Vec<RunRequest>>>;

async fn record_run(State(received): State<Received>, Json(body): Json<RunRequest>) -> Vec<u8> {
    received.lock().unwrap().push(body);
    b"mp4".to_vec()
}

#[tokio::test]
async fn test_remote_forwarding_only_uploads_images_when_needed() {
    let received: Received = Arc::new(Mutex::new(Vec::new()));
    let app = Router::new()
        .route("/", get(|| async { "ok" }))
        .route("/api/run", post(record_run))
        .with_state(Arc::clone(&received));
    let url = common::spawn(app).await;

    let dir = TempDir::new().unwrap();
    let client = common::dry_run_orchestrator(0);
    let session = client.bridge().connect(&url).await.unwrap();
    let target = Target::Remote(session);

    let text = portrait_request(dir.path().join("t.mp4"))
        .with_image(vec![1, 2, 3])
        .upscale(true);
    client.generate(text, &target).await.unwrap();

    let animate = GenerationRequest::new("", StylePreset::Product, GenerationMode::Img2Video, dir.path().join("i.mp4"))
        .with_image(vec![4, 5, 6]);
    client.generate(animate, &target).await.unwrap();

    let received = received.lock().unwrap();
    assert_eq!(received.len(), 2);
    assert!(received[0].source_image_b64.is_none());
    assert!(received[0].upscale);
    assert!(received[1].source_image_b64.is_some());
    assert!(!received[1].upscale);
}

#[tokio::test]
async fn test_user_negative_prompt_keeps_style_terms() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("neg.mp4");
    let orchestrator = common::dry_run_orchestrator(4096);

    let mut request = portrait_request(output.clone());
    request.negative_prompt = Some("cats".to_string());
    orchestrator.generate(request, &Target::Local).await.unwrap();

    let manifest: serde_json::Value =
        serde_json::from_slice(&std::fs::read(&output).unwrap()).unwrap();
    let negative = manifest["job"]["negative_prompt"].as_str().unwrap();
    assert!(negative.contains("worst quality"));
    assert!(negative.ends_with(", cats"));
}
