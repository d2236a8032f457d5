//! autocut binary.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use autocut_pipeline::{discover_videos, Capabilities, Orchestrator, PipelineConfig};

/// Denoise, transcribe, clean, cut and build a timeline for MP4 videos
#[derive(Parser, Debug)]
#[command(name = "autocut")]
#[command(version)]
struct Args {
    /// Input MP4 file or directory of MP4 files
    input: PathBuf,

    /// Root of the per-stage output folders
    #[arg(long, env = "DEFAULT_OUTPUT_DIR")]
    output_dir: Option<PathBuf>,

    /// Decision log directory
    #[arg(long, env = "DEFAULT_LOG_DIR")]
    log_dir: Option<PathBuf>,

    /// RNNoise model used for denoising
    #[arg(long, env = "DEFAULT_MODEL_PATH")]
    model_path: Option<PathBuf>,

    /// Remove artifacts and decision logs from earlier runs first
    #[arg(long)]
    clean: bool,
}

fn init_tracing() -> anyhow::Result<()> {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env()
        .add_directive("autocut=info".parse()?)
        .add_directive("autocut_pipeline=info".parse()?)
        .add_directive("autocut_media=info".parse()?);

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(false)
                    .with_thread_ids(false),
            )
            .with(env_filter)
            .init();
    }
    Ok(())
}

async fn run(args: Args) -> anyhow::Result<bool> {
    let mut config = PipelineConfig::from_env();
    if let Some(dir) = args.output_dir {
        config.output_dir = dir;
    }
    if let Some(dir) = args.log_dir {
        config.log_dir = dir;
    }
    if let Some(model) = args.model_path {
        config.denoise_model = std::path::absolute(&model).unwrap_or(model);
    }
    info!("Pipeline config: {:?}", config);

    let capabilities = Capabilities::from_config(&config).context("failed to set up capabilities")?;
    let orchestrator = Orchestrator::from_config(&config, capabilities);
    orchestrator
        .prepare(args.clean)
        .await
        .context("failed to prepare output directories")?;

    let videos = discover_videos(&args.input).await?;
    info!(count = videos.len(), "Processing videos");

    let batch = orchestrator.run_all(&videos).await;
    for rejected in &batch.rejected {
        error!("{}: not processed ({})", rejected.source.display(), rejected.error);
    }
    for video in &batch.videos {
        if let Some((stage, e)) = video.failed_stage() {
            error!("{}: failed at {} ({})", video.source.display(), stage, e);
        }
    }
    Ok(batch.all_succeeded())
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    if let Err(e) = init_tracing() {
        eprintln!("Failed to initialize logging: {e}");
        return ExitCode::FAILURE;
    }

    let args = Args::parse();
    match run(args).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("Pipeline failed: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
