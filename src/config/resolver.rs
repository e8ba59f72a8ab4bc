//! Configuration resolution
//!
//! Picks the tier for a hardware profile, overlays explicit overrides and
//! enforces the tier's pixel-frame ceiling. An oversized frame count is clamped
//! (with a warning notice) rather than rejected; only malformed overrides fail.

use crate::config::{GenerationConfig, GenerationOverrides};
use crate::hardware::{HardwareProfile, Tier};
use serde::Serialize;
use std::fmt;
use thiserror::Error;
use tracing::warn;

/// Spatial dimensions must be multiples of this (VAE downsampling factor)
pub const DIMENSION_MULTIPLE: u32 = 32;
/// Latent frames are grouped in eights plus the conditioning frame
pub const FRAME_GRID: u32 = 8;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("invalid override for `{field}`: {reason}")]
    InvalidOverride { field: &'static str, reason: String },

    #[error("{width}x{height} exceeds the {tier} tier ceiling even for a single frame")]
    ResolutionTooLarge { width: u32, height: u32, tier: Tier },
}

impl ConfigError {
    pub fn kind(&self) -> &'static str {
        match self {
            ConfigError::InvalidOverride { .. } => "invalid_override",
            ConfigError::ResolutionTooLarge { .. } => "resolution_too_large",
        }
    }
}

/// Non-fatal adjustment the resolver made to the caller's request
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notice {
    FramesClamped {
        requested: u32,
        allowed: u32,
        tier: Tier,
    },
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::FramesClamped {
                requested,
                allowed,
                tier,
            } => write!(
                f,
                "frame count reduced from {} to {} to fit the {} tier memory ceiling",
                requested, allowed, tier
            ),
        }
    }
}

/// Output of a successful resolution
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resolution {
    pub config: GenerationConfig,
    pub tier: Tier,
    pub notices: Vec<Notice>,
}

/// Resolve against the tier selected for `profile`
pub fn resolve(
    profile: &HardwareProfile,
    overrides: &GenerationOverrides,
) -> Result<Resolution, ConfigError> {
    resolve_for_tier(Tier::for_profile(profile), overrides)
}

/// Like [`resolve`], stepping one tier down when `fast` is set
pub fn resolve_with_quality(
    profile: &HardwareProfile,
    overrides: &GenerationOverrides,
    fast: bool,
) -> Result<Resolution, ConfigError> {
    let tier = Tier::for_profile(profile);
    resolve_for_tier(if fast { tier.lower() } else { tier }, overrides)
}

pub fn resolve_for_tier(
    tier: Tier,
    overrides: &GenerationOverrides,
) -> Result<Resolution, ConfigError> {
    validate_overrides(overrides)?;

    let spec = tier.spec();
    let mut config = overrides.apply_to(&spec.base);
    let mut notices = Vec::new();

    let ceiling = spec.pixel_frame_ceiling();
    let frame_pixels = config.width as u64 * config.height as u64;
    if frame_pixels > ceiling {
        return Err(ConfigError::ResolutionTooLarge {
            width: config.width,
            height: config.height,
            tier,
        });
    }

    if config.pixel_frames() > ceiling {
        let allowed = snap_frames((ceiling / frame_pixels) as u32);
        warn!(
            requested = config.frame_count,
            allowed,
            tier = %tier,
            "frame count exceeds tier ceiling, clamping"
        );
        notices.push(Notice::FramesClamped {
            requested: config.frame_count,
            allowed,
            tier,
        });
        config.frame_count = allowed;
    }

    Ok(Resolution {
        config,
        tier,
        notices,
    })
}

/// Round a frame budget down onto the `8k + 1` grid (never below one frame)
fn snap_frames(max_frames: u32) -> u32 {
    if max_frames == 0 {
        return 1;
    }
    (max_frames - 1) / FRAME_GRID * FRAME_GRID + 1
}

fn validate_overrides(overrides: &GenerationOverrides) -> Result<(), ConfigError> {
    for (field, value) in [("width", overrides.width), ("height", overrides.height)] {
        if let Some(v) = value {
            if v == 0 || v % DIMENSION_MULTIPLE != 0 {
                return Err(ConfigError::InvalidOverride {
                    field,
                    reason: format!(
                        "must be a positive multiple of {}, got {}",
                        DIMENSION_MULTIPLE, v
                    ),
                });
            }
        }
    }

    for (field, value) in [
        ("frame_count", overrides.frame_count),
        ("inference_steps", overrides.inference_steps),
        ("frame_rate", overrides.frame_rate),
    ] {
        if value == Some(0) {
            return Err(ConfigError::InvalidOverride {
                field,
                reason: "must be at least 1".to_string(),
            });
        }
    }

    if let Some(g) = overrides.guidance_scale {
        if !g.is_finite() || g <= 0.0 {
            return Err(ConfigError::InvalidOverride {
                field: "guidance_scale",
                reason: format!("must be a positive number, got {}", g),
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_overrides_returns_tier_base() {
        for tier in Tier::ALL {
            let res = resolve_for_tier(tier, &GenerationOverrides::default()).unwrap();
            assert_eq!(res.config, tier.spec().base);
            assert!(res.notices.is_empty());
        }
    }

    #[test]
    fn test_conservative_profile() {
        let res = resolve(&HardwareProfile::with_vram(4096), &GenerationOverrides::default()).unwrap();
        assert_eq!(res.tier, Tier::Conservative);
        assert_eq!(res.config.width, 512);
        assert_eq!(res.config.height, 768);
        assert!(res.config.frame_count <= 49);
        assert_eq!(res.config.inference_steps, 25);
    }

    #[test]
    fn test_override_wins_and_unset_falls_back() {
        let overrides = GenerationOverrides {
            inference_steps: Some(12),
            cpu_offload: Some(false),
            frame_count: Some(33),
            ..Default::default()
        };
        let res = resolve_for_tier(Tier::Balanced, &overrides).unwrap();
        let base = Tier::Balanced.spec().base;
        assert_eq!(res.config.inference_steps, 12);
        assert!(!res.config.cpu_offload);
        assert_eq!(res.config.frame_count, 33);
        assert_eq!(res.config.width, base.width);
        assert_eq!(res.config.vae_slicing, base.vae_slicing);
        assert!(res.notices.is_empty());
    }

    #[test]
    fn test_frame_overflow_is_clamped() {
        let overrides = GenerationOverrides {
            frame_count: Some(400),
            ..Default::default()
        };
        let res = resolve(&HardwareProfile::with_vram(4096), &overrides).unwrap();
        assert_eq!(res.config.frame_count, 49);
        assert_eq!(
            res.notices,
            vec![Notice::FramesClamped {
                requested: 400,
                allowed: 49,
                tier: Tier::Conservative
            }]
        );
    }

    #[test]
    fn test_smaller_resolution_allows_more_frames() {
        // Half the pixels of the conservative base, so roughly twice the frames fit
        let overrides = GenerationOverrides {
            width: Some(256),
            height: Some(768),
            frame_count: Some(200),
            ..Default::default()
        };
        let res = resolve_for_tier(Tier::Conservative, &overrides).unwrap();
        assert_eq!(res.config.frame_count, 97);
        assert!(res.config.pixel_frames() <= Tier::Conservative.spec().pixel_frame_ceiling());
    }

    #[test]
    fn test_malformed_overrides_rejected() {
        let bad_width = GenerationOverrides {
            width: Some(500),
            ..Default::default()
        };
        assert!(matches!(
            resolve_for_tier(Tier::High, &bad_width),
            Err(ConfigError::InvalidOverride { field: "width", .. })
        ));

        let zero_steps = GenerationOverrides {
            inference_steps: Some(0),
            ..Default::default()
        };
        assert!(matches!(
            resolve_for_tier(Tier::High, &zero_steps),
            Err(ConfigError::InvalidOverride {
                field: "inference_steps",
                ..
            })
        ));

        let nan_guidance = GenerationOverrides {
            guidance_scale: Some(f32::NAN),
            ..Default::default()
        };
        assert!(resolve_for_tier(Tier::High, &nan_guidance).is_err());
    }

    #[test]
    fn test_single_frame_over_ceiling() {
        let overrides = GenerationOverrides {
            width: Some(8192),
            height: Some(8192),
            ..Default::default()
        };
        let err = resolve_for_tier(Tier::Draft, &overrides).unwrap_err();
        assert_eq!(err.kind(), "resolution_too_large");
    }

    #[test]
    fn test_fast_steps_down_one_tier() {
        let profile = HardwareProfile::with_vram(16384);
        let res = resolve_with_quality(&profile, &GenerationOverrides::default(), true).unwrap();
        assert_eq!(res.tier, Tier::Balanced);
    }

    #[test]
    fn test_snap_frames() {
        assert_eq!(snap_frames(0), 1);
        assert_eq!(snap_frames(1), 1);
        assert_eq!(snap_frames(49), 49);
        assert_eq!(snap_frames(56), 49);
        assert_eq!(snap_frames(57), 57);
    }
}
