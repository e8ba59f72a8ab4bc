//! Local video pipeline seam
//!
//! The diffusion model itself lives outside this crate. A [`VideoPipeline`]
//! takes a fully resolved job and leaves an encoded video at the job's output
//! path, or reports why it could not.

pub mod dry_run;
pub mod subprocess;

use crate::config::{GenerationConfig, PipelineConfig, PipelineKind};
use crate::orchestrator::{CancelToken, GenerationMode};
use async_trait::async_trait;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

pub use dry_run::DryRunPipeline;
pub use subprocess::SubprocessPipeline;

/// Everything a renderer needs for one video
#[derive(Debug, Clone, Serialize)]
pub struct PipelineJob {
    pub mode: GenerationMode,
    pub prompt: String,
    pub negative_prompt: String,
    #[serde(skip)]
    pub source_image: Option<Vec<u8>>,
    pub config: GenerationConfig,
    pub seed: u64,
    pub upscale: bool,
    pub output_path: PathBuf,
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("accelerator ran out of memory: {0}")]
    OutOfMemory(String),

    #[error("renderer failed: {0}")]
    Failed(String),

    #[error("renderer finished without writing {0}")]
    MissingOutput(PathBuf),

    #[error("render cancelled")]
    Cancelled,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[async_trait]
pub trait VideoPipeline: Send + Sync {
    fn name(&self) -> &'static str;

    /// Render `job` to `job.output_path`. Implementations should stop early
    /// when `cancel` fires; if they cannot, the result is discarded.
    async fn render(&self, job: &PipelineJob, cancel: &CancelToken) -> Result<(), PipelineError>;
}

/// Build the renderer selected in settings
pub fn from_config(config: &PipelineConfig) -> Arc<dyn VideoPipeline> {
    match config.kind {
        PipelineKind::Subprocess => Arc::new(SubprocessPipeline::new(config.clone())),
        PipelineKind::DryRun => Arc::new(DryRunPipeline),
    }
}
