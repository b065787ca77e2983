//! rustop - exactly-once shutdown coordination for long-running services
//!
//! Usage:
//!     rustop [--config <path>] [--mode signals|takeover]
//!
//! See --help for more options.

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::BufReader;
use tokio::time::{interval, timeout, MissedTickBehavior};
use tracing::{debug, info, warn};

use rustop::admin::run_admin;
use rustop::config::{load_config, validate_config, Config, ShutdownMode};
use rustop::stopper::{Coordinator, Stopped};
use rustop::util::init_logging;

/// How often the demo worker reports that it is alive.
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(10);

/// Host a service that waits for a single shutdown reason.
#[derive(Parser, Debug)]
#[command(name = "rustop")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override log level (trace, debug, info, warn, error)
    #[arg(short, long, value_name = "LEVEL")]
    log_level: Option<String>,

    /// Override where the shutdown reason comes from
    #[arg(short, long, value_enum)]
    mode: Option<ModeArg>,

    /// Give up waiting for a shutdown reason after this long (e.g. "30s")
    #[arg(short, long, value_name = "DURATION", value_parser = humantime::parse_duration)]
    timeout: Option<Duration>,

    /// Validate configuration and exit
    #[arg(long)]
    validate: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ModeArg {
    /// Watch SIGINT and SIGTERM
    Signals,
    /// Read `stop [message]` commands from stdin instead of watching signals
    Takeover,
}

impl From<ModeArg> for ShutdownMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Signals => ShutdownMode::Signals,
            ModeArg::Takeover => ShutdownMode::Takeover,
        }
    }
}

fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse();

    // Load configuration
    let mut config = match &cli.config {
        Some(path) => load_config(path).with_context(|| {
            format!("failed to load configuration from '{}'", path.display())
        })?,
        None => Config::default(),
    };

    // CLI overrides config
    if let Some(mode) = cli.mode {
        config.shutdown.mode = mode.into();
    }
    if let Some(wait_timeout) = cli.timeout {
        config.shutdown.wait_timeout = Some(wait_timeout);
    }
    if let Some(level) = cli.log_level {
        config.global.log_level = level;
    }
    validate_config(&config)
        .map_err(anyhow::Error::msg)
        .context("invalid command line overrides")?;

    // If --validate flag, just validate and exit
    if cli.validate {
        println!("Configuration is valid.");
        println!("  Mode: {:?}", config.shutdown.mode);
        match config.shutdown.wait_timeout {
            Some(t) => println!("  Wait timeout: {}", humantime::format_duration(t)),
            None => println!("  Wait timeout: none"),
        }
        println!(
            "  Grace period: {}",
            humantime::format_duration(config.shutdown.grace_period)
        );
        return Ok(());
    }

    // Initialize logging
    init_logging(&config.global.log_level, &config.global.log_format)
        .context("failed to initialize logging")?;

    info!(
        mode = ?config.shutdown.mode,
        wait_timeout = ?config.shutdown.wait_timeout,
        grace_period = ?config.shutdown.grace_period,
        "rustop starting"
    );

    run(config)
}

/// Run the service with the given configuration.
fn run(config: Config) -> Result<()> {
    // Create tokio runtime
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to create tokio runtime")?;

    runtime.block_on(async { run_async(config).await })
}

/// Async entry point.
async fn run_async(config: Config) -> Result<()> {
    let coordinator = Coordinator::new();

    match config.shutdown.mode {
        ShutdownMode::Signals => {
            coordinator
                .start()
                .context("failed to start shutdown coordinator")?;
            info!("press Ctrl+C to stop");
        }
        ShutdownMode::Takeover => {
            let trigger = coordinator
                .take_over()
                .context("failed to take over shutdown trigger")?;
            tokio::spawn(run_admin(BufReader::new(tokio::io::stdin()), trigger));
            info!("type 'stop [message]' to stop");
        }
    }

    let stopped = coordinator.stopped();
    let worker = tokio::spawn(heartbeat(stopped.clone()));

    info!("rustop is running");

    // Wait for the shutdown reason
    let reason = match config.shutdown.wait_timeout {
        Some(wait_timeout) => stopped.wait_timeout(wait_timeout).await,
        None => stopped.wait().await,
    };

    let Some(reason) = reason else {
        coordinator.stop()?;
        worker.abort();
        bail!("no shutdown reason received");
    };

    info!(reason = %reason, "shutdown requested");

    // Give the worker its grace period to notice and finish
    match timeout(config.shutdown.grace_period, worker).await {
        Ok(_) => debug!("worker finished"),
        Err(_) => warn!(
            grace_period = ?config.shutdown.grace_period,
            "worker did not finish within grace period"
        ),
    }

    coordinator.stop()?;

    info!("rustop shut down complete");
    Ok(())
}

/// Stand-in for real service work: ticks until shutdown is requested.
async fn heartbeat(stopped: Stopped) {
    let mut ticks = interval(HEARTBEAT_INTERVAL);
    ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticks.tick() => debug!("heartbeat"),
            reason = stopped.wait() => {
                info!(reason = ?reason, "worker draining");
                break;
            }
        }
    }
}
