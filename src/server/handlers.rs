use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

use crate::hardware::Tier;
use crate::orchestrator::{CancelToken, GenerationError, Target};
use crate::prompt::{enhance_full, random_idea, EnhancedPrompt};
use crate::remote::protocol::{RunRequest, ServiceInfo, VIDEO_CONTENT_TYPE};
use crate::remote::{ConnectError, ErrorBody, RemoteEndpoint};
use crate::server::jobs::{Job, JobStatus};
use crate::server::AppState;
use crate::styles::StylePreset;

pub const ENDPOINTS: &[&str] = &[
    "GET /",
    "GET /api/styles",
    "POST /api/enhance",
    "GET /api/idea",
    "POST /api/run",
    "POST /api/generate",
    "GET /api/status/{job_id}",
    "GET /api/download/{job_id}",
    "GET|POST|DELETE /api/connect",
];

/// Error response carrying a stable `kind` label
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    kind: String,
    detail: String,
}

impl ApiError {
    pub fn new(status: StatusCode, kind: &str, detail: impl Into<String>) -> Self {
        Self {
            status,
            kind: kind.to_string(),
            detail: detail.into(),
        }
    }

    fn not_found(job_id: &str) -> Self {
        Self::new(StatusCode::NOT_FOUND, "not_found", format!("Job {} not found", job_id))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            kind: self.kind,
            detail: self.detail,
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<GenerationError> for ApiError {
    fn from(e: GenerationError) -> Self {
        let status = match &e {
            GenerationError::Busy => StatusCode::CONFLICT,
            GenerationError::InvalidRequest(_) | GenerationError::Config(_) => StatusCode::BAD_REQUEST,
            GenerationError::ResourceExhausted(_) => StatusCode::SERVICE_UNAVAILABLE,
            GenerationError::RemoteFailure(_) => StatusCode::BAD_GATEWAY,
            GenerationError::PipelineFailure(_) | GenerationError::Cancelled => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        Self::new(status, e.kind(), e.to_string())
    }
}

impl From<ConnectError> for ApiError {
    fn from(e: ConnectError) -> Self {
        let status = match e {
            ConnectError::InvalidUrl(_) => StatusCode::BAD_REQUEST,
            ConnectError::Unreachable { .. } => StatusCode::BAD_GATEWAY,
            ConnectError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        };
        Self::new(status, e.kind(), e.to_string())
    }
}

type ApiResult<T> = Result<T, ApiError>;

pub async fn root(State(state): State<Arc<AppState>>) -> Json<ServiceInfo> {
    let profile = state.orchestrator.profile();
    Json(ServiceInfo {
        name: "VEDA".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        device: profile.device_name.clone(),
        gpu_present: profile.gpu_present,
        tier: Tier::for_profile(profile),
        endpoints: ENDPOINTS.iter().map(|s| s.to_string()).collect(),
    })
}

#[derive(Debug, Serialize)]
pub struct StyleEntry {
    pub name: &'static str,
    pub label: &'static str,
    pub description: &'static str,
    pub modifiers: &'static [&'static str],
    pub guidance_scale: f32,
}

pub async fn list_styles() -> Json<Vec<StyleEntry>> {
    Json(
        StylePreset::ALL
            .iter()
            .map(|style| {
                let spec = style.spec();
                StyleEntry {
                    name: style.name(),
                    label: spec.label,
                    description: spec.description,
                    modifiers: spec.modifiers,
                    guidance_scale: spec.guidance_scale,
                }
            })
            .collect(),
    )
}

#[derive(Debug, Deserialize)]
pub struct EnhanceBody {
    pub prompt: String,
    #[serde(default)]
    pub style: StylePreset,
}

pub async fn enhance_prompt(Json(body): Json<EnhanceBody>) -> Json<EnhancedPrompt> {
    Json(enhance_full(&body.prompt, body.style))
}

#[derive(Debug, Deserialize)]
pub struct IdeaQuery {
    #[serde(default)]
    pub category: Option<String>,
}

pub async fn idea(Query(query): Query<IdeaQuery>) -> Json<serde_json::Value> {
    let category = query.category.as_deref().unwrap_or("trending");
    Json(json!({ "idea": random_idea(category) }))
}

/// Synchronous local generation: the endpoint remote bridges talk to
pub async fn run(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RunRequest>,
) -> ApiResult<Response> {
    let guard = state.orchestrator.try_acquire()?;

    let scratch_id = uuid::Uuid::new_v4().simple().to_string();
    let output_path = state.paths.job_file(&format!("run-{}", scratch_id));
    let request = body.into_request(output_path.clone()).map_err(|e| {
        ApiError::new(StatusCode::BAD_REQUEST, "invalid_request", format!("bad source image: {}", e))
    })?;

    info!(mode = %request.mode, style = %request.style, "remote run requested");
    let result = state
        .orchestrator
        .generate_guarded(&guard, request, &Target::Local, &CancelToken::new())
        .await?;
    drop(guard);

    let path = result.video_path.unwrap_or(output_path);
    let bytes = tokio::fs::read(&path).await.map_err(|e| {
        ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "output",
            format!("could not read {}: {}", path.display(), e),
        )
    })?;
    if let Err(e) = tokio::fs::remove_file(&path).await {
        warn!(path = %path.display(), "could not remove scratch video: {}", e);
    }

    Ok(([(header::CONTENT_TYPE, VIDEO_CONTENT_TYPE)], bytes).into_response())
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    #[default]
    Local,
    Remote,
}

#[derive(Debug, Deserialize)]
pub struct GenerateBody {
    #[serde(flatten)]
    pub run: RunRequest,
    #[serde(default)]
    pub target: TargetKind,
}

#[derive(Debug, Serialize)]
pub struct JobResponse {
    pub job_id: String,
    pub status: JobStatus,
    pub message: String,
}

/// Queue a generation and return immediately with a job id
pub async fn generate(
    State(state): State<Arc<AppState>>,
    Json(body): Json<GenerateBody>,
) -> ApiResult<Json<JobResponse>> {
    let target = match body.target {
        TargetKind::Local => Target::Local,
        TargetKind::Remote => match state.session.read().await.clone() {
            Some(session) => Target::Remote(session),
            None => {
                return Err(ApiError::new(
                    StatusCode::BAD_REQUEST,
                    "not_connected",
                    "Connect to a remote endpoint first (POST /api/connect)",
                ))
            }
        },
    };

    let guard = state.orchestrator.try_acquire()?;

    let job = Job::new(body.run.prompt.clone(), body.run.style, body.run.mode, target.label());
    let job_id = job.job_id.clone();
    let request = body
        .run
        .into_request(state.paths.job_file(&job_id))
        .map_err(|e| {
            ApiError::new(StatusCode::BAD_REQUEST, "invalid_request", format!("bad source image: {}", e))
        })?;
    state.jobs.insert(job);

    let task_state = Arc::clone(&state);
    let task_id = job_id.clone();
    tokio::spawn(async move {
        task_state.jobs.update(&task_id, |job| job.status = JobStatus::Running);
        let started = Instant::now();

        let outcome = task_state
            .orchestrator
            .generate_guarded(&guard, request, &target, &CancelToken::new())
            .await;
        drop(guard);

        let duration = (started.elapsed().as_secs_f64() * 10.0).round() / 10.0;
        match outcome {
            Ok(result) => {
                info!(job_id = %task_id, duration, "job completed");
                task_state.jobs.update(&task_id, |job| {
                    job.status = JobStatus::Completed;
                    job.result_path = result.video_path;
                    job.notices = result.notices.iter().map(|n| n.to_string()).collect();
                    job.duration_seconds = Some(duration);
                });
            }
            Err(e) => {
                error!(job_id = %task_id, kind = e.kind(), "job failed: {}", e);
                task_state.jobs.update(&task_id, |job| {
                    job.status = JobStatus::Failed;
                    job.error = Some(e.to_string());
                    job.duration_seconds = Some(duration);
                });
            }
        }
    });

    Ok(Json(JobResponse {
        message: format!("Job submitted. Poll GET /api/status/{} for progress.", job_id),
        job_id,
        status: JobStatus::Queued,
    }))
}

pub async fn job_status(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<String>,
) -> ApiResult<Json<Job>> {
    state
        .jobs
        .get(&job_id)
        .map(Json)
        .ok_or_else(|| ApiError::not_found(&job_id))
}

pub async fn download(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<String>,
) -> ApiResult<Response> {
    let job = state.jobs.get(&job_id).ok_or_else(|| ApiError::not_found(&job_id))?;

    if job.status != JobStatus::Completed {
        return Err(ApiError::new(
            StatusCode::BAD_REQUEST,
            "not_completed",
            format!("Job {} is not completed (status: {:?})", job_id, job.status),
        ));
    }

    let path = job
        .result_path
        .filter(|p| p.exists())
        .ok_or_else(|| ApiError::new(StatusCode::NOT_FOUND, "not_found", "Video file not found"))?;
    let bytes = tokio::fs::read(&path).await.map_err(|e| {
        ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "output", e.to_string())
    })?;

    Ok((
        [
            (header::CONTENT_TYPE, VIDEO_CONTENT_TYPE.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"veda_{}.mp4\"", job_id),
            ),
        ],
        bytes,
    )
        .into_response())
}

#[derive(Debug, Deserialize)]
pub struct ConnectBody {
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct ConnectionStatus {
    pub connected: bool,
    pub endpoint: Option<RemoteEndpoint>,
    pub probably_expired: bool,
}

pub async fn connect(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ConnectBody>,
) -> ApiResult<Json<ConnectionStatus>> {
    let session = match state.orchestrator.bridge().connect(&body.url).await {
        Ok(session) => session,
        Err(e) => {
            // A failed connect discards any previous session
            state.session.write().await.take();
            return Err(e.into());
        }
    };

    let status = ConnectionStatus {
        connected: true,
        endpoint: Some(session.endpoint().clone()),
        probably_expired: false,
    };
    *state.session.write().await = Some(session);
    Ok(Json(status))
}

pub async fn connection_status(State(state): State<Arc<AppState>>) -> Json<ConnectionStatus> {
    let session = state.session.read().await;
    Json(ConnectionStatus {
        connected: session.is_some(),
        endpoint: session.as_ref().map(|s| s.endpoint().clone()),
        probably_expired: session.as_ref().map(|s| s.probably_expired()).unwrap_or(false),
    })
}

pub async fn disconnect(State(state): State<Arc<AppState>>) -> StatusCode {
    if let Some(session) = state.session.write().await.take() {
        info!(url = %session.url(), "disconnected from remote endpoint");
    }
    StatusCode::NO_CONTENT
}
