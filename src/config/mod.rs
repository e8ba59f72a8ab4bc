pub mod generation;
pub mod paths;
pub mod pipeline;
pub mod remote;
pub mod resolver;
pub mod server;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

pub use generation::{GenerationConfig, GenerationOverrides};
pub use paths::PathConfig;
pub use pipeline::{PipelineConfig, PipelineKind};
pub use remote::RemoteConfig;
pub use resolver::{resolve, resolve_for_tier, resolve_with_quality, ConfigError, Notice, Resolution};
pub use server::ServerConfig;

/// File picked up from the working directory when `--config` is not given
pub const DEFAULT_CONFIG_FILE: &str = "veda.json";

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub paths: PathConfig,
    pub remote: RemoteConfig,
    pub pipeline: PipelineConfig,
    pub server: ServerConfig,
    pub seed: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            paths: PathConfig::default(),
            remote: RemoteConfig::default(),
            pipeline: PipelineConfig::default(),
            server: ServerConfig::default(),
            seed: 42,
        }
    }
}

impl Config {
    /// Defaults, then the JSON file (explicit path or `veda.json`), then `VEDA_*` env vars
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };
        config.apply_env_overrides()?;
        config.remote.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Self = serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        debug!(path = %path.display(), "loaded config file");
        Ok(config)
    }

    pub fn apply_env_overrides(&mut self) -> anyhow::Result<()> {
        self.apply_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup (the environment in production)
    pub fn apply_overrides_from<F>(&mut self, lookup: F) -> anyhow::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("VEDA_OUTPUT_DIR") {
            self.paths.output_dir = v;
        }
        if let Some(v) = lookup("VEDA_PIPELINE") {
            self.pipeline.kind = v.parse()?;
        }
        if let Some(v) = lookup("VEDA_PIPELINE_CMD") {
            self.pipeline.command = v;
        }
        if let Some(v) = lookup("VEDA_PROBE_TIMEOUT_SECS") {
            self.remote.probe_timeout_secs = parse_env("VEDA_PROBE_TIMEOUT_SECS", &v)?;
        }
        if let Some(v) = lookup("VEDA_SUBMIT_TIMEOUT_SECS") {
            self.remote.submit_timeout_secs = parse_env("VEDA_SUBMIT_TIMEOUT_SECS", &v)?;
        }
        if let Some(v) = lookup("VEDA_HOST") {
            self.server.host = v;
        }
        if let Some(v) = lookup("VEDA_PORT") {
            self.server.port = parse_env("VEDA_PORT", &v)?;
        }
        if let Some(v) = lookup("VEDA_SEED") {
            self.seed = parse_env("VEDA_SEED", &v)?;
        }
        Ok(())
    }
}

fn parse_env<T>(key: &str, value: &str) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value
        .trim()
        .parse()
        .with_context(|| format!("{} has an invalid value: {:?}", key, value))
}
