//! Wire format spoken between the bridge client and a `veda serve` host

use crate::config::GenerationOverrides;
use crate::hardware::Tier;
use crate::orchestrator::{GenerationMode, GenerationRequest};
use crate::styles::StylePreset;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};

/// Reachability probe
pub const PROBE_PATH: &str = "/";
/// Synchronous generation; answers with the encoded video
pub const RUN_PATH: &str = "/api/run";

pub const VIDEO_CONTENT_TYPE: &str = "video/mp4";

/// Body of `POST /api/run`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRequest {
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub negative_prompt: Option<String>,
    #[serde(default)]
    pub style: StylePreset,
    #[serde(default)]
    pub mode: GenerationMode,
    #[serde(default)]
    pub overrides: GenerationOverrides,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub fast: bool,
    #[serde(default)]
    pub upscale: bool,
    /// Set by the bridge: the host must not enhance again
    #[serde(default)]
    pub prompt_enhanced: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_image_b64: Option<String>,
}

impl RunRequest {
    pub fn from_request(request: &GenerationRequest) -> Self {
        Self {
            prompt: request.prompt.clone(),
            negative_prompt: request.negative_prompt.clone(),
            style: request.style,
            mode: request.mode,
            overrides: request.config.clone(),
            seed: request.seed,
            fast: request.fast,
            upscale: request.upscale,
            prompt_enhanced: !request.enhance,
            source_image_b64: request.source_image.as_ref().map(|b| STANDARD.encode(b)),
        }
    }

    /// Decode into a request writing to `output_path`
    pub fn into_request(
        self,
        output_path: std::path::PathBuf,
    ) -> Result<GenerationRequest, base64::DecodeError> {
        let source_image = self
            .source_image_b64
            .map(|b64| STANDARD.decode(b64.as_bytes()))
            .transpose()?;

        Ok(GenerationRequest {
            prompt: self.prompt,
            source_image,
            style: self.style,
            config: self.overrides,
            mode: self.mode,
            seed: self.seed,
            fast: self.fast,
            upscale: self.upscale,
            enhance: !self.prompt_enhanced,
            negative_prompt: self.negative_prompt,
            output_path,
        })
    }
}

/// Answer to the reachability probe
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceInfo {
    pub name: String,
    pub version: String,
    pub device: String,
    pub gpu_present: bool,
    pub tier: Tier,
    pub endpoints: Vec<String>,
}

/// JSON body of every non-2xx response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub kind: String,
    pub detail: String,
}
