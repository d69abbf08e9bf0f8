// Command-line front end: replay recorded landmark streams, list cameras and
// manage the settings file

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use phone_watch_lib::core::config::MonitorConfig;
use phone_watch_lib::core::orchestrator::FrameOrchestrator;
use phone_watch_lib::models::capture::RawFrame;
use phone_watch_lib::models::monitor::{FrameOutcome, FrameReport};
use phone_watch_lib::platform::camera::scan_cameras;
use phone_watch_lib::platform::pose::{
    default_provider_factory, load_recording, LandmarkProvider, ProviderHandle, ReplayProvider,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "phone-watch", about = "Detects a phone held in hand from body and hand landmarks")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a recorded landmark stream (JSON Lines) through the monitor
    Replay {
        /// Recording to replay
        file: PathBuf,
        /// Print one JSON report per frame instead of text
        #[arg(long)]
        json: bool,
        /// Settings file to take provider thresholds from
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Open the landmark backend built into this binary and report its status
    Provider {
        /// Settings file to take provider thresholds from
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// List camera devices
    Cameras {
        /// Device directory to scan
        #[arg(long, default_value = "/dev")]
        dir: PathBuf,
    },
    /// Show or reset the settings file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Print the current settings
    Show,
    /// Restore default settings
    Reset,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Replay { file, json, config } => replay(file, json, config),
        Command::Provider { config } => {
            let options = load_config(config)?.provider_options()?;
            let mut provider = ProviderHandle::open(&options, default_provider_factory())
                .context("opening landmark provider")?;
            println!("{}", provider.describe());
            println!("{}", serde_json::to_string_pretty(provider.options())?);
            provider.close();
            Ok(())
        }
        Command::Cameras { dir } => {
            for camera in scan_cameras(&dir) {
                println!("{}\t{}", camera.index, camera.name);
            }
            Ok(())
        }
        Command::Config { action } => match action {
            ConfigAction::Show => {
                let path = MonitorConfig::get_config_path()?;
                let config = MonitorConfig::load_from(&path)
                    .with_context(|| format!("loading {}", path.display()))?;
                println!("# {}", path.display());
                println!("{}", serde_json::to_string_pretty(&config)?);
                Ok(())
            }
            ConfigAction::Reset => {
                let config = MonitorConfig::reset().context("resetting settings")?;
                println!("{}", serde_json::to_string_pretty(&config)?);
                Ok(())
            }
        },
    }
}

fn replay(file: PathBuf, json: bool, config_path: Option<PathBuf>) -> Result<()> {
    let options = load_config(config_path)?.provider_options()?;

    let frames = load_recording(&file)
        .with_context(|| format!("reading recording {}", file.display()))?;
    let timestamps: Vec<u64> = frames.iter().map(|frame| frame.timestamp_ms).collect();

    let mut provider = ProviderHandle::open(&options, ReplayProvider::factory(Arc::new(frames)))?;
    info!("Replaying {} frames with {}", timestamps.len(), provider.describe());

    let mut orchestrator = FrameOrchestrator::new(file.display().to_string());
    for timestamp_ms in timestamps {
        match orchestrator.process_frame(&mut provider, &RawFrame::empty(timestamp_ms)) {
            FrameOutcome::Evaluated(report) if json => {
                println!("{}", serde_json::to_string(&report)?);
            }
            FrameOutcome::Evaluated(report) => println!("{}", format_report(&report)),
            FrameOutcome::Skipped(reason) if !json => {
                println!("{:>8} ms  skipped ({})", timestamp_ms, reason);
            }
            FrameOutcome::Skipped(_) => {}
        }
    }
    provider.close();

    let statistics = orchestrator.statistics();
    if json {
        eprintln!("{}", serde_json::to_string(statistics)?);
    } else {
        println!(
            "\n{} frames evaluated, {} skipped, {} with a body, {} with a raised arm",
            statistics.frames_evaluated,
            statistics.frames_skipped,
            statistics.frames_with_body,
            statistics.frames_with_posture
        );
        println!(
            "{} confirmations, longest grip {} ms",
            statistics.confirmations, statistics.longest_grip_ms
        );
    }

    Ok(())
}

/// Settings from `path`, or the defaults when no file is given
fn load_config(path: Option<PathBuf>) -> Result<MonitorConfig> {
    match path {
        Some(path) => MonitorConfig::load_from(&path)
            .with_context(|| format!("loading {}", path.display())),
        None => Ok(MonitorConfig::default()),
    }
}

fn format_report(report: &FrameReport) -> String {
    let mut line = format!(
        "{:>8} ms  {:<10} posture={:<9} hands={} elapsed={} ms",
        report.timestamp_ms,
        report.verdict.to_string(),
        report.posture.to_string(),
        report.gripping_hands.len(),
        report.elapsed_ms
    );
    if let Some(banner) = report.banner() {
        line.push_str("  | ");
        line.push_str(&banner.message);
    }
    line
}
