use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where generated videos land
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathConfig {
    pub output_dir: String,
    /// Subdirectory used by the HTTP job API
    pub jobs_subdir: String,
}

impl Default for PathConfig {
    fn default() -> Self {
        Self {
            output_dir: "outputs".to_string(),
            jobs_subdir: "api".to_string(),
        }
    }
}

impl PathConfig {
    pub fn output_file(&self, stem: &str) -> PathBuf {
        PathBuf::from(&self.output_dir).join(format!("{}.mp4", stem))
    }

    pub fn job_file(&self, job_id: &str) -> PathBuf {
        PathBuf::from(&self.output_dir)
            .join(&self.jobs_subdir)
            .join(format!("{}.mp4", job_id))
    }
}
