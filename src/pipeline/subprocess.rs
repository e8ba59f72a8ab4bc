//! Renderer backed by the external LTX-Video process
//!
//! The process receives the job as command-line flags and must write an
//! H.264 MP4 to `--output`. A non-zero exit whose stderr mentions running out
//! of memory is reported as [`PipelineError::OutOfMemory`].

use crate::config::PipelineConfig;
use crate::orchestrator::CancelToken;
use crate::pipeline::{PipelineError, PipelineJob, VideoPipeline};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use std::io::Write;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info, warn};

static OOM_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(out of memory|OutOfMemoryError|CUBLAS_STATUS_ALLOC_FAILED)").unwrap()
});

/// Bytes of stderr kept in error details
const STDERR_TAIL: usize = 2000;

pub struct SubprocessPipeline {
    config: PipelineConfig,
}

impl SubprocessPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Full argument list for `job`, after the configured leading args
    pub fn build_args(&self, job: &PipelineJob, image_path: Option<&str>) -> Vec<String> {
        let c = &job.config;
        let mut args = self.config.args.clone();
        args.extend([
            "--model".to_string(),
            self.config.model_id.clone(),
            "--mode".to_string(),
            job.mode.name().to_string(),
            "--prompt".to_string(),
            job.prompt.clone(),
            "--negative-prompt".to_string(),
            job.negative_prompt.clone(),
            "--width".to_string(),
            c.width.to_string(),
            "--height".to_string(),
            c.height.to_string(),
            "--num-frames".to_string(),
            c.frame_count.to_string(),
            "--steps".to_string(),
            c.inference_steps.to_string(),
            "--guidance-scale".to_string(),
            c.guidance_scale.to_string(),
            "--fps".to_string(),
            c.frame_rate.to_string(),
            "--seed".to_string(),
            job.seed.to_string(),
            "--output".to_string(),
            job.output_path.display().to_string(),
        ]);
        if c.cpu_offload {
            args.push("--cpu-offload".to_string());
        }
        if c.vae_slicing {
            args.push("--vae-slicing".to_string());
        }
        if job.upscale {
            args.push("--upscale".to_string());
        }
        if let Some(path) = image_path {
            args.push("--image".to_string());
            args.push(path.to_string());
        }
        args
    }
}

#[async_trait]
impl VideoPipeline for SubprocessPipeline {
    fn name(&self) -> &'static str {
        "subprocess"
    }

    async fn render(&self, job: &PipelineJob, cancel: &CancelToken) -> Result<(), PipelineError> {
        if let Some(parent) = job.output_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        // Held until the process exits so the path stays valid
        let image_file = match &job.source_image {
            Some(bytes) => {
                let mut file = tempfile::Builder::new().prefix("veda-src-").tempfile()?;
                file.write_all(bytes)?;
                file.flush()?;
                Some(file)
            }
            None => None,
        };
        let image_path = image_file
            .as_ref()
            .map(|f| f.path().display().to_string());

        let args = self.build_args(job, image_path.as_deref());
        debug!(command = %self.config.command, ?args, "spawning renderer");

        let child = Command::new(&self.config.command)
            .args(&args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                PipelineError::Failed(format!(
                    "Failed to start renderer `{}`: {}",
                    self.config.command, e
                ))
            })?;

        info!(pid = child.id(), "renderer started");

        // Dropping the wait future drops the child, which kills it
        let output = tokio::select! {
            output = child.wait_with_output() => output?,
            _ = cancel.cancelled() => {
                warn!("render cancelled, renderer process killed");
                return Err(PipelineError::Cancelled);
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let tail = tail(&stderr, STDERR_TAIL);
            if OOM_PATTERN.is_match(&stderr) {
                return Err(PipelineError::OutOfMemory(tail));
            }
            return Err(PipelineError::Failed(format!(
                "renderer exited with {}: {}",
                output.status, tail
            )));
        }

        if !job.output_path.exists() {
            return Err(PipelineError::MissingOutput(job.output_path.clone()));
        }

        Ok(())
    }
}

fn tail(text: &str, max: usize) -> String {
    let text = text.trim();
    if text.len() <= max {
        return text.to_string();
    }
    let mut start = text.len() - max;
    while !text.is_char_boundary(start) {
        start += 1;
    }
    format!("...{}", &text[start..])
}
