use serde::{Deserialize, Serialize};

/// Fully specified settings handed to the video pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    pub width: u32,
    pub height: u32,
    pub frame_count: u32,
    pub inference_steps: u32,
    /// Move idle model weights to host memory between stages
    pub cpu_offload: bool,
    /// Decode latents one slice at a time
    pub vae_slicing: bool,
    pub guidance_scale: f32,
    pub frame_rate: u32,
}

impl GenerationConfig {
    /// `width * height * frame_count`, the quantity bounded by a tier ceiling
    pub fn pixel_frames(&self) -> u64 {
        self.width as u64 * self.height as u64 * self.frame_count as u64
    }

    pub fn duration_secs(&self) -> f32 {
        if self.frame_rate == 0 {
            return 0.0;
        }
        self.frame_count as f32 / self.frame_rate as f32
    }
}

/// Caller-supplied partial config; every set field wins over the tier default
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inference_steps: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpu_offload: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vae_slicing: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guidance_scale: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame_rate: Option<u32>,
}

impl GenerationOverrides {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Overlay `self` onto `base`, field by field
    pub fn apply_to(&self, base: &GenerationConfig) -> GenerationConfig {
        GenerationConfig {
            width: self.width.unwrap_or(base.width),
            height: self.height.unwrap_or(base.height),
            frame_count: self.frame_count.unwrap_or(base.frame_count),
            inference_steps: self.inference_steps.unwrap_or(base.inference_steps),
            cpu_offload: self.cpu_offload.unwrap_or(base.cpu_offload),
            vae_slicing: self.vae_slicing.unwrap_or(base.vae_slicing),
            guidance_scale: self.guidance_scale.unwrap_or(base.guidance_scale),
            frame_rate: self.frame_rate.unwrap_or(base.frame_rate),
        }
    }

    /// Fill unset fields from `lower`; fields already set here are kept
    pub fn or(self, lower: &GenerationOverrides) -> GenerationOverrides {
        GenerationOverrides {
            width: self.width.or(lower.width),
            height: self.height.or(lower.height),
            frame_count: self.frame_count.or(lower.frame_count),
            inference_steps: self.inference_steps.or(lower.inference_steps),
            cpu_offload: self.cpu_offload.or(lower.cpu_offload),
            vae_slicing: self.vae_slicing.or(lower.vae_slicing),
            guidance_scale: self.guidance_scale.or(lower.guidance_scale),
            frame_rate: self.frame_rate.or(lower.frame_rate),
        }
    }
}

impl From<&GenerationConfig> for GenerationOverrides {
    fn from(config: &GenerationConfig) -> Self {
        Self {
            width: Some(config.width),
            height: Some(config.height),
            frame_count: Some(config.frame_count),
            inference_steps: Some(config.inference_steps),
            cpu_offload: Some(config.cpu_offload),
            vae_slicing: Some(config.vae_slicing),
            guidance_scale: Some(config.guidance_scale),
            frame_rate: Some(config.frame_rate),
        }
    }
}
