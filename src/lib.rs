//! VEDA: hardware-aware video generation around LTX-Video
//!
//! The diffusion model runs outside this crate. What lives here is the glue
//! that decides how to run it:
//!
//! - `hardware`: accelerator detection and VRAM tiers
//! - `config`: application settings and the tier-aware config resolver
//! - `styles` / `prompt`: style presets and prompt enhancement
//! - `pipeline`: the local renderer seam (external process or dry run)
//! - `remote`: bridge to a remote `veda serve` host (e.g. a notebook GPU)
//! - `orchestrator`: single-flight dispatch to a local or remote target
//! - `server`: HTTP API for the web UI and for remote bridging

pub mod config;
pub mod hardware;
pub mod orchestrator;
pub mod pipeline;
pub mod prompt;
pub mod remote;
pub mod server;
pub mod styles;

pub use config::{Config, GenerationConfig, GenerationOverrides};
pub use hardware::{detect, HardwareProfile, Tier};
pub use orchestrator::{
    GenerationError, GenerationMode, GenerationRequest, GenerationResult, Orchestrator, Target,
};
pub use prompt::enhance;
pub use styles::StylePreset;

/// Library errors
pub use anyhow::{Error, Result};
