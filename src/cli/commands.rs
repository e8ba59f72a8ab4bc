//! CLI command implementations

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use veda_rs::config::{resolve_with_quality, Config, GenerationOverrides, PipelineKind};
use veda_rs::hardware::{detect, Tier};
use veda_rs::orchestrator::{CancelToken, GenerationMode, GenerationRequest, Orchestrator, Target};
use veda_rs::pipeline;
use veda_rs::prompt::{enhance_full, random_idea};
use veda_rs::remote::RemoteBridge;
use veda_rs::server::{self, AppState};
use veda_rs::styles::StylePreset;

use super::GenerateArgs;

const PORTRAIT_PROMPT: &str = "the person smiles gently, blinks and turns their head slightly";

fn build_orchestrator(config: &Config, dry_run: bool) -> Orchestrator {
    let mut pipeline_config = config.pipeline.clone();
    if dry_run {
        pipeline_config.kind = PipelineKind::DryRun;
    }
    Orchestrator::new(
        detect().clone(),
        pipeline::from_config(&pipeline_config),
        RemoteBridge::new(&config.remote),
    )
    .with_default_seed(config.seed)
}

fn default_output(config: &Config) -> PathBuf {
    let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    config.paths.output_file(&format!("veda_{}", stamp))
}

/// `--style` when given, otherwise the preset that suits `mode`
pub(crate) fn style_for(mode: GenerationMode, requested: Option<StylePreset>) -> StylePreset {
    requested.unwrap_or(match mode {
        GenerationMode::Portrait => StylePreset::Portrait,
        GenerationMode::Text2Video | GenerationMode::Img2Video => StylePreset::default(),
    })
}

fn read_image(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("could not read image {}", path.display()))
}

pub async fn text2video(config: &Config, args: GenerateArgs) -> Result<()> {
    let prompt = args
        .prompt
        .clone()
        .ok_or_else(|| anyhow::anyhow!("text2video needs --prompt"))?;
    let style = style_for(GenerationMode::Text2Video, args.style);
    generate(config, GenerationMode::Text2Video, style, prompt, None, args).await
}

pub async fn img2video(config: &Config, image: PathBuf, args: GenerateArgs) -> Result<()> {
    let bytes = read_image(&image)?;
    let style = style_for(GenerationMode::Img2Video, args.style);
    let prompt = args.prompt.clone().unwrap_or_default();
    generate(config, GenerationMode::Img2Video, style, prompt, Some(bytes), args).await
}

pub async fn portrait(config: &Config, image: PathBuf, args: GenerateArgs) -> Result<()> {
    let bytes = read_image(&image)?;
    let style = style_for(GenerationMode::Portrait, args.style);
    let prompt = args
        .prompt
        .clone()
        .unwrap_or_else(|| PORTRAIT_PROMPT.to_string());
    generate(config, GenerationMode::Portrait, style, prompt, Some(bytes), args).await
}

async fn generate(
    config: &Config,
    mode: GenerationMode,
    style: StylePreset,
    prompt: String,
    image: Option<Vec<u8>>,
    args: GenerateArgs,
) -> Result<()> {
    let orchestrator = build_orchestrator(config, args.dry_run);
    let output = args.output.clone().unwrap_or_else(|| default_output(config));

    let mut request = GenerationRequest::new(prompt, style, mode, output)
        .with_overrides(args.overrides())
        .fast(args.fast)
        .upscale(args.upscale);
    request.seed = args.seed;
    request.enhance = !args.no_enhance;
    request.negative_prompt = args.negative_prompt.clone();
    if let Some(bytes) = image {
        request = request.with_image(bytes);
    }

    let target = match &args.remote {
        Some(url) => {
            println!("Connecting to {} ...", url);
            let session = orchestrator.bridge().connect(url).await?;
            println!(
                "Connected: {} (usually available until ~{})",
                session.url(),
                session.endpoint().expiry_estimate.format("%Y-%m-%d %H:%M UTC")
            );
            Target::Remote(session)
        }
        None => {
            let plan = orchestrator.plan(&request)?;
            let c = &plan.resolution.config;
            println!(
                "Tier: {} | {}x{} | {} frames (~{:.1}s) | {} steps | renderer: {}",
                plan.resolution.tier,
                c.width,
                c.height,
                c.frame_count,
                c.duration_secs(),
                c.inference_steps,
                orchestrator.pipeline_name()
            );
            Target::Local
        }
    };

    let cancel = CancelToken::new();
    let watcher = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        })
    };

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(format!("Generating on {} (Ctrl-C to stop)", target.label()));
    spinner.enable_steady_tick(Duration::from_millis(120));

    let outcome = orchestrator
        .generate_with_cancel(request, &target, &cancel)
        .await;
    watcher.abort();

    let result = match outcome {
        Ok(result) => {
            spinner.finish_with_message("Generation complete");
            result
        }
        Err(e) => {
            spinner.abandon_with_message("Generation failed");
            return Err(e.into());
        }
    };

    for notice in &result.notices {
        println!("note: {}", notice);
    }
    if let Some(path) = &result.video_path {
        println!("Saved: {}", path.display());
    }
    println!("Took {:.1}s on {}", result.elapsed_secs, result.target);
    Ok(())
}

pub fn info(as_json: bool, fast: bool) -> Result<()> {
    let profile = detect();
    let tier = if fast {
        Tier::for_profile(profile).lower()
    } else {
        Tier::for_profile(profile)
    };

    let mut rows = Vec::new();
    for style in StylePreset::ALL {
        let overrides = GenerationOverrides {
            guidance_scale: Some(style.spec().guidance_scale),
            ..Default::default()
        };
        let resolution = resolve_with_quality(profile, &overrides, fast)?;
        rows.push((style, resolution.config));
    }

    if as_json {
        let mut styles = serde_json::Map::new();
        for (style, config) in &rows {
            styles.insert(style.name().to_string(), serde_json::to_value(config)?);
        }
        let out = json!({
            "hardware": profile,
            "tier": tier,
            "styles": styles,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("╔═══════════════════════════════════════════════════════════════╗");
    println!("║                  VEDA - Hardware Summary                      ║");
    println!("╚═══════════════════════════════════════════════════════════════╝");
    println!();
    if profile.gpu_present {
        println!("GPU:  {} ({:.1} GB VRAM)", profile.device_name, profile.vram_gb());
    } else {
        println!("GPU:  none detected, draft quality on {}", profile.device_name);
    }
    println!("Tier: {}{}", tier, if fast { " (--fast)" } else { "" });
    println!();
    println!(
        "  {:<10} {:>10} {:>7} {:>6} {:>9} {:>8} {:>8}",
        "style", "size", "frames", "steps", "guidance", "offload", "slicing"
    );
    for (style, c) in &rows {
        println!(
            "  {:<10} {:>10} {:>7} {:>6} {:>9.1} {:>8} {:>8}",
            style.name(),
            format!("{}x{}", c.width, c.height),
            c.frame_count,
            c.inference_steps,
            c.guidance_scale,
            c.cpu_offload,
            c.vae_slicing
        );
    }
    println!();
    Ok(())
}

pub async fn serve(mut config: Config, host: Option<String>, port: Option<u16>) -> Result<()> {
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    let orchestrator = Arc::new(build_orchestrator(&config, false));
    info!(
        device = %orchestrator.profile().device_name,
        tier = %Tier::for_profile(orchestrator.profile()),
        pipeline = orchestrator.pipeline_name(),
        "starting server"
    );
    let state = AppState::new(orchestrator, config.paths.clone());
    server::serve(&config.server, state).await
}

pub fn styles() -> Result<()> {
    println!();
    for style in StylePreset::ALL {
        let spec = style.spec();
        println!("  {:<10} {}", style.name(), spec.description);
        println!("  {:<10} + {}", "", spec.modifiers.join(", "));
    }
    println!();
    Ok(())
}

pub fn enhance(prompt: &str, style: StylePreset) -> Result<()> {
    let enhanced = enhance_full(prompt, style);
    println!("Prompt:   {}", enhanced.prompt);
    println!("Negative: {}", enhanced.negative_prompt);
    println!("Guidance: {:.1}", enhanced.guidance_scale);
    Ok(())
}

pub fn idea(category: &str) -> Result<()> {
    println!("{}", random_idea(category));
    Ok(())
}
