//! Monitor runtime configuration

use anyhow::Result;
use serde::Deserialize;

/// Ambient settings loaded from SYSMON_* environment variables.
/// The CLI surface (interval, duration, thresholds, report, optimize)
/// is parsed separately in main.
#[derive(Debug, Clone, Deserialize)]
pub struct MonitorConfig {
    /// Per-sampler timeout within a tick, in seconds
    #[serde(default = "default_sampler_timeout_secs")]
    pub sampler_timeout_secs: u64,

    /// Network capacity in megabits per second, used to normalize
    /// throughput rates into a percentage
    #[serde(default = "default_network_ceiling_mbps")]
    pub network_ceiling_mbps: f64,

    /// Path to the privileged optimization script
    #[serde(default = "default_optimize_command")]
    pub optimize_command: String,

    /// Whether generated reports are committed to git
    #[serde(default = "default_commit_reports")]
    pub commit_reports: bool,
}

fn default_sampler_timeout_secs() -> u64 {
    2
}

fn default_network_ceiling_mbps() -> f64 {
    1000.0
}

fn default_optimize_command() -> String {
    "/usr/local/sbin/sysmon-optimize".to_string()
}

fn default_commit_reports() -> bool {
    true
}

impl MonitorConfig {
    /// Load configuration from the environment.
    pub fn load() -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::Environment::with_prefix("SYSMON"))
            .build()?;

        Ok(config.try_deserialize().unwrap_or_else(|_| MonitorConfig {
            sampler_timeout_secs: default_sampler_timeout_secs(),
            network_ceiling_mbps: default_network_ceiling_mbps(),
            optimize_command: default_optimize_command(),
            commit_reports: default_commit_reports(),
        }))
    }

    /// Network ceiling converted to bytes per second.
    pub fn network_ceiling_bytes_per_sec(&self) -> f64 {
        self.network_ceiling_mbps * 125_000.0
    }
}
