use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Which local renderer backs `Target::Local`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PipelineKind {
    /// Spawn the external LTX-Video renderer
    Subprocess,
    /// Write a JSON manifest of the job instead of a video
    DryRun,
}

impl FromStr for PipelineKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "subprocess" | "ltx" => Ok(PipelineKind::Subprocess),
            "dry-run" | "dry_run" | "dryrun" => Ok(PipelineKind::DryRun),
            other => anyhow::bail!("Unknown pipeline kind: {} (expected subprocess or dry-run)", other),
        }
    }
}

/// External renderer invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub kind: PipelineKind,
    pub command: String,
    /// Leading arguments; job arguments are appended after these
    pub args: Vec<String>,
    pub model_id: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            kind: PipelineKind::Subprocess,
            command: "python3".to_string(),
            args: vec!["-m".to_string(), "veda_engine.render".to_string()],
            model_id: "Lightricks/LTX-Video".to_string(),
        }
    }
}
