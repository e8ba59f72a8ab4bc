pub mod commands;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use veda_rs::config::GenerationOverrides;
use veda_rs::styles::StylePreset;

#[derive(Parser)]
#[command(name = "veda")]
#[command(about = "Hardware-aware LTX-Video generation", long_about = None)]
struct Cli {
    /// Settings file (defaults to ./veda.json when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Options shared by every generation command
#[derive(Args, Debug, Clone)]
pub struct GenerateArgs {
    /// What the video should show
    #[arg(long, short)]
    pub prompt: Option<String>,
    /// Style preset (cinematic, portrait, product, nature, aesthetic, reels).
    /// Defaults to portrait for `portrait`, cinematic otherwise
    #[arg(long)]
    pub style: Option<StylePreset>,
    /// Output file (defaults to <output_dir>/veda_<timestamp>.mp4)
    #[arg(long, short)]
    pub output: Option<PathBuf>,
    /// Resolve one quality tier lower than the hardware allows
    #[arg(long)]
    pub fast: bool,
    /// Upscale the finished video
    #[arg(long)]
    pub upscale: bool,
    #[arg(long)]
    pub frames: Option<u32>,
    #[arg(long)]
    pub steps: Option<u32>,
    #[arg(long)]
    pub width: Option<u32>,
    #[arg(long)]
    pub height: Option<u32>,
    #[arg(long)]
    pub guidance: Option<f32>,
    #[arg(long)]
    pub seed: Option<u64>,
    /// Extra things to avoid, appended to the style's negative prompt
    #[arg(long)]
    pub negative_prompt: Option<String>,
    /// Send the prompt as written
    #[arg(long)]
    pub no_enhance: bool,
    /// Run on a remote `veda serve` host instead of this machine
    #[arg(long)]
    pub remote: Option<String>,
    /// Write a JSON manifest instead of rendering
    #[arg(long)]
    pub dry_run: bool,
}

impl GenerateArgs {
    pub fn overrides(&self) -> GenerationOverrides {
        GenerationOverrides {
            width: self.width,
            height: self.height,
            frame_count: self.frames,
            inference_steps: self.steps,
            guidance_scale: self.guidance,
            ..Default::default()
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a video from a text prompt
    Text2video {
        #[command(flatten)]
        args: GenerateArgs,
    },
    /// Animate a still image
    Img2video {
        /// Source image
        #[arg(long, short)]
        image: PathBuf,
        #[command(flatten)]
        args: GenerateArgs,
    },
    /// Bring a portrait photo to life
    Portrait {
        /// Portrait photo
        #[arg(long, short)]
        image: PathBuf,
        #[command(flatten)]
        args: GenerateArgs,
    },
    /// Show detected hardware and the settings each style would use
    Info {
        /// Print machine-readable JSON
        #[arg(long)]
        json: bool,
        /// Show the tier used with --fast
        #[arg(long)]
        fast: bool,
    },
    /// Serve the HTTP API (web UI backend and remote bridge target)
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
    },
    /// List style presets
    Styles,
    /// Preview the enhanced prompt for a style
    Enhance {
        prompt: String,
        #[arg(long, default_value = "cinematic")]
        style: StylePreset,
    },
    /// Suggest a prompt idea
    Idea {
        /// trending, product or nature
        #[arg(long, default_value = "trending")]
        category: String,
    },
}

pub async fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = veda_rs::Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Text2video { args } => commands::text2video(&config, args).await,
        Commands::Img2video { image, args } => commands::img2video(&config, image, args).await,
        Commands::Portrait { image, args } => commands::portrait(&config, image, args).await,
        Commands::Info { json, fast } => commands::info(json, fast),
        Commands::Serve { host, port } => commands::serve(config, host, port).await,
        Commands::Styles => commands::styles(),
        Commands::Enhance { prompt, style } => commands::enhance(&prompt, style),
        Commands::Idea { category } => commands::idea(&category),
    }
}
