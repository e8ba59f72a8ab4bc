//! Prompt enhancement and idea suggestions
//!
//! Enhancement is a pure string transform. It is not idempotent: enhancing an
//! already enhanced prompt appends the modifiers a second time, so callers
//! must enhance exactly once per request.

use crate::styles::StylePreset;
use rand::seq::SliceRandom;
use serde::Serialize;

/// Enhanced prompt plus the style-derived settings that travel with it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnhancedPrompt {
    pub prompt: String,
    pub negative_prompt: String,
    pub guidance_scale: f32,
}

/// Append the style's modifier phrases to `prompt`.
pub fn enhance(prompt: &str, style: StylePreset) -> String {
    let modifiers = style.spec().modifiers.join(", ");
    let prompt = prompt.trim().trim_end_matches(',').trim_end();
    if prompt.is_empty() {
        modifiers
    } else {
        format!("{}, {}", prompt, modifiers)
    }
}

/// [`enhance`] plus the negative prompt and guidance scale for `style`
pub fn enhance_full(prompt: &str, style: StylePreset) -> EnhancedPrompt {
    EnhancedPrompt {
        prompt: enhance(prompt, style),
        negative_prompt: style.negative_prompt(),
        guidance_scale: style.spec().guidance_scale,
    }
}

const TRENDING_IDEAS: &[&str] = &[
    "woman smiling at sunset beach, hair blowing in the wind",
    "steam rising from a coffee cup on a rainy window sill",
    "city street at night with neon reflections in puddles",
    "slow motion dancer spinning in a field of tall grass",
    "skateboarder gliding through an empty parking lot at dawn",
];

const PRODUCT_IDEAS: &[&str] = &[
    "luxury watch rotating on a marble pedestal",
    "perfume bottle with light refracting through glass",
    "sneaker floating above a pastel backdrop",
];

const NATURE_IDEAS: &[&str] = &[
    "beautiful sunset over ocean, golden light, waves",
    "waterfall in a misty forest, morning light",
    "hummingbird hovering near a red flower",
];

/// Canned prompt ideas for a category (`trending`, `product`, `nature`)
pub fn suggest_ideas(category: &str) -> &'static [&'static str] {
    match category.trim().to_lowercase().as_str() {
        "product" => PRODUCT_IDEAS,
        "nature" => NATURE_IDEAS,
        _ => TRENDING_IDEAS,
    }
}

/// Random idea from `category`
pub fn random_idea(category: &str) -> &'static str {
    let ideas = suggest_ideas(category);
    ideas
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(TRENDING_IDEAS[0])
}
