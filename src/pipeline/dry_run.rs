//! Renderer that records the job instead of running the model
//!
//! Writes a JSON manifest to the output path. Lets the whole stack (resolver,
//! server, remote bridge) be exercised on machines without an accelerator.

use crate::orchestrator::CancelToken;
use crate::pipeline::{PipelineError, PipelineJob, VideoPipeline};
use async_trait::async_trait;
use serde_json::json;
use tracing::info;

#[derive(Debug, Clone, Copy, Default)]
pub struct DryRunPipeline;

#[async_trait]
impl VideoPipeline for DryRunPipeline {
    fn name(&self) -> &'static str {
        "dry-run"
    }

    async fn render(&self, job: &PipelineJob, cancel: &CancelToken) -> Result<(), PipelineError> {
        if cancel.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }

        if let Some(parent) = job.output_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let manifest = json!({
            "renderer": self.name(),
            "created_at": chrono::Utc::now().to_rfc3339(),
            "job": job,
            "source_image_bytes": job.source_image.as_ref().map(|b| b.len()),
        });
        let body = serde_json::to_vec_pretty(&manifest)
            .map_err(|e| PipelineError::Failed(e.to_string()))?;
        tokio::fs::write(&job.output_path, body).await?;

        info!(path = %job.output_path.display(), "dry-run manifest written");
        Ok(())
    }
}
