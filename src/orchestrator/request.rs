use crate::config::{GenerationConfig, GenerationOverrides, Notice};
use crate::hardware::Tier;
use crate::styles::StylePreset;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationMode {
    #[default]
    Text2Video,
    Img2Video,
    /// Animate a still portrait photo
    Portrait,
}

impl GenerationMode {
    pub fn name(self) -> &'static str {
        match self {
            GenerationMode::Text2Video => "text2video",
            GenerationMode::Img2Video => "img2video",
            GenerationMode::Portrait => "portrait",
        }
    }

    pub fn requires_image(self) -> bool {
        matches!(self, GenerationMode::Img2Video | GenerationMode::Portrait)
    }
}

impl fmt::Display for GenerationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for GenerationMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "text2video" | "t2v" => Ok(GenerationMode::Text2Video),
            "img2video" | "i2v" => Ok(GenerationMode::Img2Video),
            "portrait" => Ok(GenerationMode::Portrait),
            other => anyhow::bail!("Unknown mode: {}", other),
        }
    }
}

/// One user action; consumed by a single `generate` call
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub prompt: String,
    pub source_image: Option<Vec<u8>>,
    pub style: StylePreset,
    pub config: GenerationOverrides,
    pub mode: GenerationMode,
    pub seed: Option<u64>,
    /// Resolve one tier below what the hardware supports
    pub fast: bool,
    /// Ask the renderer to upscale the finished video
    pub upscale: bool,
    /// False when `prompt` was already enhanced upstream
    pub enhance: bool,
    pub negative_prompt: Option<String>,
    pub output_path: PathBuf,
}

impl GenerationRequest {
    pub fn new(
        prompt: impl Into<String>,
        style: StylePreset,
        mode: GenerationMode,
        output_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            prompt: prompt.into(),
            source_image: None,
            style,
            config: GenerationOverrides::default(),
            mode,
            seed: None,
            fast: false,
            upscale: false,
            enhance: true,
            negative_prompt: None,
            output_path: output_path.into(),
        }
    }

    pub fn with_image(mut self, image: Vec<u8>) -> Self {
        self.source_image = Some(image);
        self
    }

    pub fn with_overrides(mut self, overrides: GenerationOverrides) -> Self {
        self.config = overrides;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn fast(mut self, fast: bool) -> Self {
        self.fast = fast;
        self
    }

    pub fn upscale(mut self, upscale: bool) -> Self {
        self.upscale = upscale;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationStatus {
    Ok,
    Failed,
}

/// What a caller gets back from a generation
#[derive(Debug, Clone, Serialize)]
pub struct GenerationResult {
    pub status: GenerationStatus,
    pub video_path: Option<PathBuf>,
    pub error_detail: Option<String>,
    /// Prompt actually sent to the renderer
    pub prompt: String,
    /// Resolved settings (local runs only; remote hosts resolve for themselves)
    pub config: Option<GenerationConfig>,
    pub tier: Option<Tier>,
    pub notices: Vec<Notice>,
    pub target: String,
    pub elapsed_secs: f64,
}

impl GenerationResult {
    pub fn failed(detail: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            status: GenerationStatus::Failed,
            video_path: None,
            error_detail: Some(detail.into()),
            prompt: String::new(),
            config: None,
            tier: None,
            notices: Vec::new(),
            target: target.into(),
            elapsed_secs: 0.0,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == GenerationStatus::Ok
    }
}
