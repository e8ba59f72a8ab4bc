//! Generation orchestration
//!
//! Enhances the prompt, resolves settings and dispatches to either the local
//! pipeline or a remote session. There is never an implicit fallback between
//! targets: switching from remote to local (or back) is the caller's call.

pub mod cancel;
pub mod guard;
pub mod request;

use crate::config::{resolve_with_quality, ConfigError, GenerationOverrides, Resolution};
use crate::hardware::HardwareProfile;
use crate::pipeline::{PipelineError, PipelineJob, VideoPipeline};
use crate::prompt::{enhance_full, EnhancedPrompt};
use crate::remote::{RemoteBridge, Session, SubmitError};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{info, warn};

pub use cancel::CancelToken;
pub use guard::{FlightGuard, SingleFlight};
pub use request::{GenerationMode, GenerationRequest, GenerationResult, GenerationStatus};

/// Where a generation runs
#[derive(Debug, Clone)]
pub enum Target {
    Local,
    Remote(Session),
}

impl Target {
    pub fn label(&self) -> String {
        match self {
            Target::Local => "local".to_string(),
            Target::Remote(session) => format!("remote ({})", session.url()),
        }
    }
}

#[derive(Error, Debug)]
pub enum GenerationError {
    /// The accelerator ran out of memory. Retrying the same request fails the
    /// same way; re-resolve at a lower tier (`fast`) or ask for fewer frames.
    #[error("out of accelerator memory: {0}")]
    ResourceExhausted(String),

    #[error(transparent)]
    RemoteFailure(SubmitError),

    #[error("video pipeline failed: {0}")]
    PipelineFailure(String),

    #[error("a generation is already in progress")]
    Busy,

    #[error("generation cancelled")]
    Cancelled,

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl GenerationError {
    pub fn kind(&self) -> &'static str {
        match self {
            GenerationError::ResourceExhausted(_) => "resource_exhausted",
            GenerationError::RemoteFailure(_) => "remote_failure",
            GenerationError::PipelineFailure(_) => "pipeline_failure",
            GenerationError::Busy => "busy",
            GenerationError::Cancelled => "cancelled",
            GenerationError::InvalidRequest(_) => "invalid_request",
            GenerationError::Config(_) => "config",
        }
    }
}

impl From<SubmitError> for GenerationError {
    fn from(e: SubmitError) -> Self {
        match e {
            SubmitError::Cancelled => GenerationError::Cancelled,
            other => GenerationError::RemoteFailure(other),
        }
    }
}

impl From<PipelineError> for GenerationError {
    fn from(e: PipelineError) -> Self {
        match e {
            PipelineError::OutOfMemory(detail) => GenerationError::ResourceExhausted(format!(
                "{} (retry with --fast or fewer frames)",
                detail
            )),
            PipelineError::Cancelled => GenerationError::Cancelled,
            other => GenerationError::PipelineFailure(other.to_string()),
        }
    }
}

/// Enhanced prompt and resolved settings for a local run
#[derive(Debug, Clone)]
pub struct Plan {
    pub prompt: EnhancedPrompt,
    pub resolution: Resolution,
}

pub struct Orchestrator {
    profile: HardwareProfile,
    pipeline: Arc<dyn VideoPipeline>,
    bridge: RemoteBridge,
    flight: SingleFlight,
    default_seed: u64,
}

impl Orchestrator {
    pub fn new(profile: HardwareProfile, pipeline: Arc<dyn VideoPipeline>, bridge: RemoteBridge) -> Self {
        Self {
            profile,
            pipeline,
            bridge,
            flight: SingleFlight::new(),
            default_seed: 42,
        }
    }

    pub fn with_default_seed(mut self, seed: u64) -> Self {
        self.default_seed = seed;
        self
    }

    pub fn profile(&self) -> &HardwareProfile {
        &self.profile
    }

    pub fn bridge(&self) -> &RemoteBridge {
        &self.bridge
    }

    pub fn pipeline_name(&self) -> &'static str {
        self.pipeline.name()
    }

    pub fn is_busy(&self) -> bool {
        self.flight.is_busy()
    }

    /// Claim the single generation slot ahead of a [`generate_guarded`](Self::generate_guarded) call
    pub fn try_acquire(&self) -> Result<FlightGuard, GenerationError> {
        self.flight.try_acquire().ok_or(GenerationError::Busy)
    }

    /// Enhance and resolve without running anything
    pub fn plan(&self, request: &GenerationRequest) -> Result<Plan, GenerationError> {
        let prompt = final_prompt(request);
        let style_defaults = GenerationOverrides {
            guidance_scale: Some(prompt.guidance_scale),
            ..Default::default()
        };
        let overrides = request.config.clone().or(&style_defaults);
        let resolution = resolve_with_quality(&self.profile, &overrides, request.fast)?;
        Ok(Plan { prompt, resolution })
    }

    pub async fn generate(
        &self,
        request: GenerationRequest,
        target: &Target,
    ) -> Result<GenerationResult, GenerationError> {
        self.generate_with_cancel(request, target, &CancelToken::new())
            .await
    }

    pub async fn generate_with_cancel(
        &self,
        request: GenerationRequest,
        target: &Target,
        cancel: &CancelToken,
    ) -> Result<GenerationResult, GenerationError> {
        let guard = self.try_acquire()?;
        self.generate_guarded(&guard, request, target, cancel).await
    }

    /// Run a generation while holding the slot claimed by `_guard`
    pub async fn generate_guarded(
        &self,
        _guard: &FlightGuard,
        request: GenerationRequest,
        target: &Target,
        cancel: &CancelToken,
    ) -> Result<GenerationResult, GenerationError> {
        validate(&request)?;

        match target {
            Target::Local => self.run_local(request, cancel).await,
            Target::Remote(session) => self.run_remote(session, request, cancel).await,
        }
    }

    async fn run_local(
        &self,
        request: GenerationRequest,
        cancel: &CancelToken,
    ) -> Result<GenerationResult, GenerationError> {
        let started = Instant::now();
        let Plan { prompt, resolution } = self.plan(&request)?;

        let job = PipelineJob {
            mode: request.mode,
            prompt: prompt.prompt.clone(),
            negative_prompt: prompt.negative_prompt,
            source_image: if request.mode.requires_image() {
                request.source_image
            } else {
                None
            },
            config: resolution.config.clone(),
            seed: request.seed.unwrap_or(self.default_seed),
            upscale: request.upscale,
            output_path: request.output_path.clone(),
        };

        info!(
            dest = "local",
            pipeline = self.pipeline.name(),
            mode = %job.mode,
            tier = %resolution.tier,
            width = job.config.width,
            height = job.config.height,
            frames = job.config.frame_count,
            steps = job.config.inference_steps,
            "starting generation"
        );

        self.pipeline.render(&job, cancel).await.map_err(|e| {
            warn!(error = %e, "local generation failed");
            GenerationError::from(e)
        })?;

        let elapsed = started.elapsed().as_secs_f64();
        info!(path = %job.output_path.display(), elapsed_secs = elapsed, "generation finished");

        Ok(GenerationResult {
            status: GenerationStatus::Ok,
            video_path: Some(job.output_path),
            error_detail: None,
            prompt: job.prompt,
            config: Some(resolution.config),
            tier: Some(resolution.tier),
            notices: resolution.notices,
            target: Target::Local.label(),
            elapsed_secs: elapsed,
        })
    }

    async fn run_remote(
        &self,
        session: &Session,
        request: GenerationRequest,
        cancel: &CancelToken,
    ) -> Result<GenerationResult, GenerationError> {
        if session.probably_expired() {
            warn!(url = %session.url(), "remote session is past its expected lifetime");
        }

        let prompt = final_prompt(&request);
        let source_image = if request.mode.requires_image() {
            request.source_image
        } else {
            None
        };
        let forwarded = GenerationRequest {
            prompt: prompt.prompt,
            negative_prompt: Some(prompt.negative_prompt),
            enhance: false,
            source_image,
            ..request
        };

        info!(dest = "remote", url = %session.url(), mode = %forwarded.mode, "forwarding generation");
        self.bridge
            .submit(session, &forwarded, cancel)
            .await
            .map_err(|e| {
                warn!(error = %e, "remote generation failed");
                GenerationError::from(e)
            })
    }
}

/// Prompt as the renderer should see it, enhancing exactly once
fn final_prompt(request: &GenerationRequest) -> EnhancedPrompt {
    if request.enhance {
        let mut enhanced = enhance_full(&request.prompt, request.style);
        if let Some(extra) = request.negative_prompt.as_deref().map(str::trim) {
            if !extra.is_empty() {
                enhanced.negative_prompt = format!("{}, {}", enhanced.negative_prompt, extra);
            }
        }
        enhanced
    } else {
        EnhancedPrompt {
            prompt: request.prompt.clone(),
            negative_prompt: request
                .negative_prompt
                .clone()
                .unwrap_or_else(|| request.style.negative_prompt()),
            guidance_scale: request.style.spec().guidance_scale,
        }
    }
}

fn validate(request: &GenerationRequest) -> Result<(), GenerationError> {
    if request.mode.requires_image() && request.source_image.is_none() {
        return Err(GenerationError::InvalidRequest(format!(
            "{} needs a source image",
            request.mode
        )));
    }
    if !request.mode.requires_image() && request.prompt.trim().is_empty() {
        return Err(GenerationError::InvalidRequest("prompt is empty".to_string()));
    }
    if request.mode == GenerationMode::Text2Video && request.source_image.is_some() {
        warn!("text2video ignores the supplied source image");
    }
    Ok(())
}
