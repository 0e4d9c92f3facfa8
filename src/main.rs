//! Wildfire watcher binary.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use emberwatch::{Config, Monitor};

#[derive(Parser, Debug)]
#[command(name = "emberwatch", version, about = "Watch a video stream for wildfire smoke and fire")]
struct Cli {
    /// YAML config file
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,

    /// Log level: trace, debug, info, warn, error
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn init_tracing(level: &str) {
    // LOG_FORMAT=json for machine-readable logs
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("emberwatch={level},ort=warn")));

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer().with_target(false))
            .with(env_filter)
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    let config = Config::load(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    info!(config = %cli.config.display(), "Configuration loaded");

    let mut monitor = Monitor::from_config(&config).context("startup failed")?;

    let shutdown = Arc::new(AtomicBool::new(false));
    let loop_shutdown = Arc::clone(&shutdown);
    // the frame loop blocks; the monitor and its video source drop when the closure returns
    let mut handle = tokio::task::spawn_blocking(move || monitor.run(&loop_shutdown));

    tokio::select! {
        result = &mut handle => {
            let stats = result.context("frame loop panicked")?;
            info!(?stats, "Frame loop exited");
        }
        signal = tokio::signal::ctrl_c() => {
            if let Err(e) = signal {
                error!(error = %e, "Failed to listen for shutdown signal");
            }
            info!("Received shutdown signal");
            shutdown.store(true, Ordering::Relaxed);
            let stats = handle.await.context("frame loop panicked")?;
            info!(?stats, "Frame loop exited");
        }
    }

    Ok(())
}
