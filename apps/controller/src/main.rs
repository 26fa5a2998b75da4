use std::{path::PathBuf, sync::Arc};

use anyhow::Context;
use clap::Parser;
use dispatch::{CommandDispatcher, DryRunDispatcher, HttpDispatcher};
use gesture_core::GesturePipeline;
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod config;
mod frames;
mod processing;

use config::{load_settings, SETTINGS_FILE};
use frames::FrameSource;
use processing::Processor;

/// Turns a stream of hand landmarks into light toggle commands.
#[derive(Parser, Debug)]
#[command(name = "gesture-controller")]
struct Args {
    /// JSON-lines landmark file; `-` or omitted reads stdin.
    #[arg(long)]
    source: Option<PathBuf>,
    /// Shell command whose stdout produces landmark lines.
    #[arg(long, conflicts_with = "source")]
    landmarker_cmd: Option<String>,
    #[arg(long, default_value = SETTINGS_FILE)]
    config: PathBuf,
    #[arg(long)]
    api_url: Option<String>,
    /// Log commands instead of sending them.
    #[arg(long)]
    dry_run: bool,
    #[arg(long)]
    fps: Option<f64>,
    #[arg(long)]
    fist_threshold: Option<u32>,
    #[arg(long)]
    confirm_window: Option<usize>,
    /// Print one JSON report per processed frame on stdout.
    #[arg(long)]
    report_json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let mut settings = load_settings(&args.config)?;
    if let Some(url) = args.api_url {
        settings.api_url = url;
    }
    if args.dry_run {
        settings.dry_run = true;
    }
    if let Some(fps) = args.fps {
        settings.target_fps = fps;
    }
    if let Some(frames) = args.fist_threshold {
        settings.fist_threshold = frames;
    }
    if let Some(frames) = args.confirm_window {
        settings.confirm_window = frames;
    }

    let pipeline = GesturePipeline::new(settings.classifier_config(), settings.automaton_config()?)
        .context("invalid gesture settings")?;
    let min_interval = settings.frame_interval()?;

    let dispatcher: Arc<dyn CommandDispatcher> = if settings.dry_run {
        Arc::new(DryRunDispatcher::default())
    } else {
        Arc::new(HttpDispatcher::new(settings.api_url.clone())?)
    };
    info!(
        api_url = %settings.api_url,
        dry_run = settings.dry_run,
        fps = settings.target_fps,
        "starting gesture controller"
    );

    let source = FrameSource::open(args.source.as_deref(), args.landmarker_cmd.as_deref())?;
    let (tx, rx) = watch::channel(None);
    let reader = source.spawn(tx);

    let mut processor = Processor::new(pipeline, dispatcher);
    let report_json = args.report_json;
    let stats = processing::run(
        rx,
        &mut processor,
        min_interval,
        async {
            let _ = tokio::signal::ctrl_c().await;
        },
        |report| {
            if report_json {
                match serde_json::to_string(report) {
                    Ok(line) => println!("{line}"),
                    Err(err) => warn!(error = %err, "failed to encode frame report"),
                }
            }
        },
    )
    .await;

    if let Some(read) = reader.shutdown() {
        info!(
            frames = read.frames,
            rejected = read.rejected,
            "frame source drained"
        );
    }
    info!(
        processed = stats.processed,
        commands = stats.commands,
        "gesture controller stopped"
    );
    Ok(())
}
