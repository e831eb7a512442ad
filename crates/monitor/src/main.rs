//! sysmon - host resource monitor
//!
//! Periodically samples host CPU, memory, swap, disk, and network
//! utilization, flags metrics exceeding their configured thresholds,
//! and accumulates the analysis into a timestamped JSON report.

use anyhow::Result;
use clap::Parser;
use monitor_lib::external::{Optimizer, ReportCommitter};
use monitor_lib::{
    persist_with_commit, sampler, MonitorLogger, ReportAggregator, ScheduleConfig, Scheduler,
    SystemIdentity, ThresholdConfig,
};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod config;

const MONITOR_VERSION: &str = env!("CARGO_PKG_VERSION");

/// System resource monitor
#[derive(Parser)]
#[command(name = "sysmon")]
#[command(author, version, about = "Host resource monitor with bottleneck analysis")]
struct Cli {
    /// Monitoring interval in seconds
    #[arg(long, default_value_t = 5)]
    interval: u64,

    /// Total monitoring duration in seconds
    #[arg(long, default_value_t = 300)]
    duration: u64,

    /// JSON object overriding default thresholds, e.g. '{"cpu": 90, "disk": 70}'
    #[arg(long)]
    thresholds: Option<String>,

    /// Write the JSON report to this path at run end
    #[arg(long)]
    report: Option<PathBuf>,

    /// Run the system optimization script after the run
    #[arg(long)]
    optimize: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    let cli = Cli::parse();
    let monitor_config = config::MonitorConfig::load()?;

    let thresholds = match &cli.thresholds {
        Some(json) => ThresholdConfig::with_overrides(json)?,
        None => ThresholdConfig::default(),
    };

    // Host identification is read once and stays constant for the run
    let identity = SystemIdentity::detect();
    let logger = MonitorLogger::new(&identity.hostname);
    logger.log_startup(MONITOR_VERSION, cli.interval, cli.duration);

    let samplers = sampler::default_samplers(monitor_config.network_ceiling_bytes_per_sec());
    let aggregator = ReportAggregator::new();

    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    {
        let shutdown_tx = shutdown_tx.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("SIGINT received");
                let _ = shutdown_tx.send(());
            }
        });
    }

    let mut scheduler = Scheduler::new(
        samplers,
        ScheduleConfig {
            interval: Duration::from_secs(cli.interval),
            duration: Duration::from_secs(cli.duration),
            sampler_timeout: Duration::from_secs(monitor_config.sampler_timeout_secs),
        },
    );
    scheduler.run(&thresholds, &aggregator, shutdown_rx).await;

    let data_points = aggregator.data_points();
    let skipped_ticks = aggregator.skipped_ticks();
    let duration_label = format!("{} seconds", data_points as u64 * cli.interval);
    let report = aggregator.finalize(&identity, duration_label)?;

    if let Some(path) = &cli.report {
        let committer = monitor_config
            .commit_reports
            .then(|| ReportCommitter::new(report_repo_dir(path)));
        // A persist failure is the only error that affects exit status
        persist_with_commit(&report, path, committer.as_ref()).await?;
        logger.log_report(&path.display().to_string(), data_points, skipped_ticks);
    }

    if cli.optimize {
        match Optimizer::new(&monitor_config.optimize_command).run().await {
            Ok(()) => logger.log_optimization(true, ""),
            Err(error) => logger.log_optimization(false, &error.to_string()),
        }
    }

    logger.log_shutdown("run complete");
    Ok(())
}

/// Directory whose git repository receives the report commit.
fn report_repo_dir(report_path: &Path) -> PathBuf {
    match report_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
