//! Style presets
//!
//! Each preset is a closed table entry: the prompt modifiers appended by the
//! enhancer, a negative prompt, and the guidance scale it suggests.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const BASE_NEGATIVE: &str = "worst quality, inconsistent motion, blurry, jittery, distorted";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown style `{0}` (expected one of: cinematic, portrait, product, nature, aesthetic, reels)")]
pub struct StyleParseError(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StylePreset {
    #[default]
    Cinematic,
    Portrait,
    Product,
    Nature,
    Aesthetic,
    Reels,
}

/// Static description of a preset
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StyleSpec {
    pub label: &'static str,
    pub description: &'static str,
    pub modifiers: &'static [&'static str],
    /// Appended to the shared negative prompt
    pub negative_extra: &'static str,
    pub guidance_scale: f32,
}

impl StylePreset {
    pub const ALL: [StylePreset; 6] = [
        StylePreset::Cinematic,
        StylePreset::Portrait,
        StylePreset::Product,
        StylePreset::Nature,
        StylePreset::Aesthetic,
        StylePreset::Reels,
    ];

    pub fn name(self) -> &'static str {
        match self {
            StylePreset::Cinematic => "cinematic",
            StylePreset::Portrait => "portrait",
            StylePreset::Product => "product",
            StylePreset::Nature => "nature",
            StylePreset::Aesthetic => "aesthetic",
            StylePreset::Reels => "reels",
        }
    }

    pub fn spec(self) -> StyleSpec {
        match self {
            StylePreset::Cinematic => StyleSpec {
                label: "Cinematic",
                description: "Film look with shallow depth of field and smooth camera work",
                modifiers: &[
                    "cinematic lighting",
                    "shallow depth of field",
                    "anamorphic lens",
                    "film grain",
                    "smooth camera movement",
                ],
                negative_extra: "flat lighting, amateur footage",
                guidance_scale: 3.5,
            },
            StylePreset::Portrait => StyleSpec {
                label: "Portrait",
                description: "Close framing on a person with soft light and subtle motion",
                modifiers: &[
                    "portrait framing",
                    "soft natural light",
                    "detailed skin texture",
                    "subtle facial expression",
                    "bokeh background",
                ],
                negative_extra: "deformed face, extra limbs, unnatural skin",
                guidance_scale: 3.0,
            },
            StylePreset::Product => StyleSpec {
                label: "Product",
                description: "Studio showcase on a clean background",
                modifiers: &[
                    "studio lighting",
                    "clean background",
                    "sharp focus",
                    "slow rotating showcase",
                    "commercial quality",
                ],
                negative_extra: "cluttered background, text, watermark",
                guidance_scale: 3.5,
            },
            StylePreset::Nature => StyleSpec {
                label: "Nature",
                description: "Landscapes and wildlife with natural colour",
                modifiers: &[
                    "golden hour",
                    "natural colors",
                    "wide landscape",
                    "gentle wind movement",
                    "documentary style",
                ],
                negative_extra: "oversaturated, artificial colors",
                guidance_scale: 3.0,
            },
            StylePreset::Aesthetic => StyleSpec {
                label: "Aesthetic",
                description: "Dreamy pastel mood pieces",
                modifiers: &[
                    "pastel color palette",
                    "dreamy atmosphere",
                    "soft glow",
                    "minimalist composition",
                ],
                negative_extra: "harsh shadows, gritty",
                guidance_scale: 3.0,
            },
            StylePreset::Reels => StyleSpec {
                label: "Reels",
                description: "Punchy vertical clips for social feeds",
                modifiers: &[
                    "vertical 9:16 framing",
                    "vibrant colors",
                    "dynamic motion",
                    "trending social media style",
                    "high energy",
                ],
                negative_extra: "static shot, dull colors",
                guidance_scale: 3.5,
            },
        }
    }

    /// Full negative prompt for this style
    pub fn negative_prompt(self) -> String {
        format!("{}, {}", BASE_NEGATIVE, self.spec().negative_extra)
    }
}

impl fmt::Display for StylePreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StylePreset {
    type Err = StyleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        StylePreset::ALL
            .into_iter()
            .find(|style| style.name() == wanted)
            .ok_or_else(|| StyleParseError(s.to_string()))
    }
}
