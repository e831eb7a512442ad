//! Observability helpers
//!
//! Structured logging for significant monitor events, keeping field names
//! consistent across the run lifecycle.

use crate::models::Issue;
use tracing::{info, warn};

/// Structured logger for monitor lifecycle events.
#[derive(Clone)]
pub struct MonitorLogger {
    hostname: String,
}

impl MonitorLogger {
    pub fn new(hostname: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
        }
    }

    pub fn log_startup(&self, version: &str, interval_secs: u64, duration_secs: u64) {
        info!(
            event = "monitor_started",
            host = %self.hostname,
            version = %version,
            interval_secs,
            duration_secs,
            "System monitoring started"
        );
    }

    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "monitor_shutdown",
            host = %self.hostname,
            reason = %reason,
            "System monitoring stopped"
        );
    }

    /// Log one detected issue at a level matching its severity.
    pub fn log_issue(&self, issue: &Issue) {
        warn!(
            event = "bottleneck_detected",
            host = %self.hostname,
            resource = %issue.kind,
            severity = %issue.severity,
            message = %issue.message,
            "Bottleneck detected"
        );
    }

    pub fn log_report(&self, path: &str, data_points: usize, skipped_ticks: u64) {
        info!(
            event = "report_generated",
            host = %self.hostname,
            path = %path,
            data_points,
            skipped_ticks,
            "Monitoring report generated"
        );
    }

    pub fn log_optimization(&self, success: bool, detail: &str) {
        if success {
            info!(
                event = "optimization_completed",
                host = %self.hostname,
                "System optimization completed"
            );
        } else {
            warn!(
                event = "optimization_failed",
                host = %self.hostname,
                detail = %detail,
                "System optimization failed"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ResourceKind, Severity};

    #[test]
    fn test_logger_creation() {
        let logger = MonitorLogger::new("node-1");
        assert_eq!(logger.hostname, "node-1");
    }

    #[test]
    fn test_log_calls_do_not_panic() {
        let logger = MonitorLogger::new("node-1");
        logger.log_startup("0.1.0", 5, 300);
        logger.log_issue(&Issue {
            kind: ResourceKind::Swap,
            severity: Severity::Warning,
            message: "High swap usage: 55.0%".to_string(),
            details: "Swap used: 2.20 GB of 4.00 GB".to_string(),
            suggestion: "Reduce memory pressure".to_string(),
        });
        logger.log_report("/tmp/report.json", 10, 0);
        logger.log_optimization(false, "exit status 1");
        logger.log_shutdown("duration elapsed");
    }
}
