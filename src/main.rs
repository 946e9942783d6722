//! IVOR Health Monitor Binary

use clap::Parser;
use ivor_monitor::{
    Config, Monitor, NullLocator, OverallStatus, ProcessLocator, ReqwestTransport, Result,
    SystemLocator,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "ivor_monitor", version, about = "Health monitor for the IVOR backend and website frontend")]
struct Cli {
    /// Run a single sweep and exit with the overall status
    #[arg(long)]
    once: bool,

    /// Seconds between sweeps while healthy
    #[arg(long)]
    interval: Option<u64>,

    /// File the event log is appended to
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Disable the OS process/resource probe
    #[arg(long)]
    no_resource_probe: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    initialize_tracing();

    info!("Starting IVOR health monitor v{}", env!("CARGO_PKG_VERSION"));

    let cli = Cli::parse();
    let mut config = Config::from_env();

    if let Some(seconds) = cli.interval {
        config.check_interval = Duration::from_secs(seconds);
    }
    if let Some(log_file) = cli.log_file {
        config.log_file = Some(log_file);
    }
    if cli.no_resource_probe {
        config.process_pattern = None;
    }

    if let Err(e) = config.validate() {
        error!("Configuration validation failed: {}", e);
        std::process::exit(1);
    }

    info!(
        "Monitor configuration - backend: {}, frontend: {}, interval: {}s",
        config.backend_url,
        config.frontend_url,
        config.check_interval.as_secs()
    );

    let transport = Arc::new(ReqwestTransport::new()?);
    let locator: Box<dyn ProcessLocator> = if config.process_pattern.is_some() {
        Box::new(SystemLocator::new())
    } else {
        Box::new(NullLocator)
    };

    let monitor = Monitor::new(config, transport, locator)?;

    // Initial sweep; its status gates continuous monitoring and is the
    // exit signal in one-shot mode.
    let initial = monitor.run_once().await;
    println!("{}", initial.overall);

    if cli.once {
        std::process::exit(initial.overall.exit_code());
    }

    if initial.overall == OverallStatus::Critical {
        error!("Initial health check is CRITICAL, refusing to start continuous monitoring");
        std::process::exit(initial.overall.exit_code());
    }

    let last = monitor.run().await?;
    println!("{}", last);
    std::process::exit(last.exit_code());
}

/// Initialize structured logging
fn initialize_tracing() {
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_file(false)
        .with_line_number(false)
        .json();

    let filter_layer = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(&log_level))
        .unwrap();

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();
}
