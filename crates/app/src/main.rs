//! Logging behavior:
//! - Writes logs to both stderr and a daily-rotated file at logs/autopilot.log.
//! - Default level is INFO; override with RUST_LOG (e.g. `RUST_LOG=autopilot_nav=debug`).
//! - The logs/ directory is created on startup if missing; file output uses a
//!   non-blocking writer so logging never blocks the pipeline threads.

mod config;
mod runtime;

use std::fs;
use std::path::Path;
use std::time::{Duration, SystemTime};

use clap::Parser;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use autopilot_audio::DeviceManager;
use autopilot_foundation::{AppState, ShutdownHandler, StateManager};
use config::Settings;

fn init_logging() -> Result<tracing_appender::non_blocking::WorkerGuard, Box<dyn std::error::Error>>
{
    std::fs::create_dir_all("logs")?;
    let file_appender = RollingFileAppender::new(Rotation::DAILY, "logs", "autopilot.log");
    let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);

    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    let env_filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    let stderr_layer = fmt::layer().with_writer(std::io::stderr);
    let file_layer = fmt::layer().with_writer(non_blocking_file).with_ansi(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();
    Ok(guard)
}

/// Prunes rotated log files in `logs/` older than `retention_days` days.
/// `Some(0)` disables pruning; `None` defaults to 7 days.
fn prune_old_logs(retention_days: Option<u64>) {
    let retention = retention_days.unwrap_or(7);
    if retention == 0 {
        tracing::debug!("Log retention disabled (retention_days=0)");
        return;
    }

    let cutoff = match SystemTime::now().checked_sub(Duration::from_secs(retention * 24 * 60 * 60))
    {
        Some(t) => t,
        None => return,
    };

    let logs_dir = Path::new("logs");
    if !logs_dir.exists() {
        return;
    }

    match fs::read_dir(logs_dir) {
        Ok(entries) => {
            for entry in entries.flatten() {
                let path = entry.path();
                if let Some(name) = path.file_name().and_then(|s| s.to_str()) {
                    if name.starts_with("autopilot.log.") {
                        if let Ok(meta) = entry.metadata() {
                            if let Ok(modified) = meta.modified() {
                                if modified < cutoff {
                                    if let Err(e) = fs::remove_file(&path) {
                                        tracing::warn!(
                                            "Failed to remove old log {}: {}",
                                            path.display(),
                                            e
                                        );
                                    } else {
                                        tracing::info!("Removed old log file: {}", path.display());
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
        Err(e) => tracing::warn!("Failed to read logs directory for pruning: {}", e),
    }
}

#[derive(Parser, Debug)]
#[command(name = "autopilot", author, version, about = "Presentation auto-pilot")]
struct Cli {
    /// List available input devices and exit
    #[arg(long = "list-devices")]
    list_devices: bool,

    /// Path to the transcript JSON file (overrides settings/env)
    #[arg(long)]
    transcript: Option<String>,

    /// Path to the chunks JSON file (overrides settings/env)
    #[arg(long)]
    chunks: Option<String>,

    /// Run with a no-op actuator that logs advances instead of sending keys
    #[arg(long = "dry-run")]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _log_guard = init_logging()?;
    let retention_days = std::env::var("AUTOPILOT_LOG_RETENTION_DAYS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok());
    prune_old_logs(retention_days);
    tracing::info!("Starting presentation auto-pilot");

    let cli = Cli::parse();

    if cli.list_devices {
        let dm = DeviceManager::new()?;
        tracing::info!("CPAL host: {:?}", dm.host_id());
        let devices = dm.enumerate_devices();
        println!("Input devices (host: {:?}):", dm.host_id());
        for d in devices {
            let def = if d.is_default { " (default)" } else { "" };
            println!("- {}{}", d.name, def);
        }
        return Ok(());
    }

    let mut settings = Settings::new().unwrap_or_else(|e| {
        tracing::error!("Failed to load settings: {}", e);
        Settings::default()
    });

    if let Some(transcript) = cli.transcript {
        settings.transcript_path = transcript;
    }
    if let Some(chunks) = cli.chunks {
        settings.chunks_path = chunks;
    }
    if cli.dry_run {
        settings.actuator = "noop".to_string();
    }

    let state_manager = StateManager::new();
    let shutdown = ShutdownHandler::new().install().await;

    state_manager.transition(AppState::Running)?;
    tracing::info!("Application state: Running");

    let app = runtime::start(&settings, shutdown.signal())
        .map_err(|e| Box::new(e) as Box<dyn std::error::Error>)?;

    let mut stats_interval = tokio::time::interval(Duration::from_secs(30));
    let metrics = app.metrics.clone();
    tokio::select! {
        _ = shutdown.wait() => {
            tracing::debug!("Shutdown signal received");
        }
        _ = async {
            loop {
                stats_interval.tick().await;
                tracing::info!(
                    capture_frames = metrics.capture_frames.load(std::sync::atomic::Ordering::Relaxed),
                    capture_frames_dropped = metrics.capture_frames_dropped.load(std::sync::atomic::Ordering::Relaxed),
                    hypotheses_emitted = metrics.hypotheses_emitted.load(std::sync::atomic::Ordering::Relaxed),
                    decisions_forward = metrics.decisions_forward.load(std::sync::atomic::Ordering::Relaxed),
                    decisions_stay = metrics.decisions_stay.load(std::sync::atomic::Ordering::Relaxed),
                    "Pipeline running..."
                );
            }
        } => {}
    }

    tracing::debug!("Beginning graceful shutdown");
    state_manager.transition(AppState::Stopping)?;
    app.shutdown(shutdown.signal());
    state_manager.transition(AppState::Stopped)?;
    tracing::debug!("Shutdown complete");

    Ok(())
}
