//! VRAM tiers and their safe default generation settings

use crate::config::GenerationConfig;
use crate::hardware::HardwareProfile;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Below this much VRAM only the conservative tier is safe
pub const CONSERVATIVE_MAX_VRAM_MB: u64 = 6 * 1024;
/// At or above this much VRAM the high-quality tier is selected
pub const HIGH_MIN_VRAM_MB: u64 = 10 * 1024;

/// Hardware capability bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// No accelerator, or `--fast` on a conservative card
    Draft,
    Conservative,
    Balanced,
    High,
}

/// Base settings and resource ceiling for a tier
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TierSpec {
    pub tier: Tier,
    pub base: GenerationConfig,
    /// Frames allowed at the base resolution; the pixel-frame ceiling is
    /// `base.width * base.height * ceiling_frames`.
    pub ceiling_frames: u32,
}

impl TierSpec {
    /// Maximum `width * height * frame_count` this tier tolerates
    pub fn pixel_frame_ceiling(&self) -> u64 {
        self.base.width as u64 * self.base.height as u64 * self.ceiling_frames as u64
    }
}

impl Tier {
    pub const ALL: [Tier; 4] = [Tier::Draft, Tier::Conservative, Tier::Balanced, Tier::High];

    /// Pick the tier matching a hardware profile
    pub fn for_profile(profile: &HardwareProfile) -> Self {
        if !profile.gpu_present {
            Tier::Draft
        } else if profile.vram_mb < CONSERVATIVE_MAX_VRAM_MB {
            Tier::Conservative
        } else if profile.vram_mb < HIGH_MIN_VRAM_MB {
            Tier::Balanced
        } else {
            Tier::High
        }
    }

    /// Next lower quality tier (Draft is the floor)
    pub fn lower(self) -> Self {
        match self {
            Tier::Draft | Tier::Conservative => Tier::Draft,
            Tier::Balanced => Tier::Conservative,
            Tier::High => Tier::Balanced,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Tier::Draft => "draft",
            Tier::Conservative => "conservative",
            Tier::Balanced => "balanced",
            Tier::High => "high",
        }
    }

    pub fn spec(self) -> TierSpec {
        match self {
            Tier::Draft => TierSpec {
                tier: self,
                base: GenerationConfig {
                    width: 288,
                    height: 512,
                    frame_count: 25,
                    inference_steps: 15,
                    cpu_offload: true,
                    vae_slicing: true,
                    guidance_scale: 3.0,
                    frame_rate: 24,
                },
                ceiling_frames: 49,
            },
            Tier::Conservative => TierSpec {
                tier: self,
                base: GenerationConfig {
                    width: 512,
                    height: 768,
                    frame_count: 49,
                    inference_steps: 25,
                    cpu_offload: true,
                    vae_slicing: true,
                    guidance_scale: 3.0,
                    frame_rate: 24,
                },
                ceiling_frames: 49,
            },
            Tier::Balanced => TierSpec {
                tier: self,
                base: GenerationConfig {
                    width: 576,
                    height: 1024,
                    frame_count: 65,
                    inference_steps: 30,
                    cpu_offload: true,
                    vae_slicing: true,
                    guidance_scale: 3.0,
                    frame_rate: 24,
                },
                ceiling_frames: 97,
            },
            Tier::High => TierSpec {
                tier: self,
                base: GenerationConfig {
                    width: 704,
                    height: 1248,
                    frame_count: 97,
                    inference_steps: 40,
                    cpu_offload: false,
                    vae_slicing: false,
                    guidance_scale: 3.0,
                    frame_rate: 24,
                },
                ceiling_frames: 121,
            },
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_selection() {
        assert_eq!(Tier::for_profile(&HardwareProfile::cpu_only()), Tier::Draft);
        assert_eq!(Tier::for_profile(&HardwareProfile::with_vram(4096)), Tier::Conservative);
        assert_eq!(Tier::for_profile(&HardwareProfile::with_vram(6144)), Tier::Balanced);
        assert_eq!(Tier::for_profile(&HardwareProfile::with_vram(8192)), Tier::Balanced);
        assert_eq!(Tier::for_profile(&HardwareProfile::with_vram(10240)), Tier::High);
        assert_eq!(Tier::for_profile(&HardwareProfile::with_vram(40960)), Tier::High);
    }

    #[test]
    fn test_lower_is_monotonic() {
        for tier in Tier::ALL {
            assert!(tier.lower() <= tier);
        }
        assert_eq!(Tier::Draft.lower(), Tier::Draft);
    }

    #[test]
    fn test_base_configs_fit_their_ceiling() {
        for tier in Tier::ALL {
            let spec = tier.spec();
            assert!(
                spec.base.pixel_frames() <= spec.pixel_frame_ceiling(),
                "{} base config exceeds its own ceiling",
                tier
            );
            assert_eq!(spec.base.width % 32, 0);
            assert_eq!(spec.base.height % 32, 0);
            assert_eq!((spec.base.frame_count - 1) % 8, 0);
        }
    }
}
