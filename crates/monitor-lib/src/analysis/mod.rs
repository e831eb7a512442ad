//! Bottleneck analysis
//!
//! Evaluates metric records against the threshold configuration and
//! classifies breaches into severity tiers. Severity is measured in
//! percentage points above the configured limit, not absolute value,
//! so the tiers stay meaningful across resources with different
//! default thresholds.

pub mod suggestions;

use crate::config::ThresholdConfig;
use crate::models::{Issue, MetricRecord, ResourceKind, Severity};

/// Percentage points above the limit at which severity escalates.
const HIGH_MARGIN: f64 = 10.0;
const CRITICAL_MARGIN: f64 = 20.0;

/// Classify a metric value against its limit.
///
/// Below the limit there is no issue; at or above it, severity escalates
/// every [`HIGH_MARGIN`] percentage points.
pub fn classify(value: f64, limit: f64) -> Option<Severity> {
    if value < limit {
        None
    } else if value < limit + HIGH_MARGIN {
        Some(Severity::Warning)
    } else if value < limit + CRITICAL_MARGIN {
        Some(Severity::High)
    } else {
        Some(Severity::Critical)
    }
}

/// Evaluate one tick's records, emitting one issue per breaching metric.
///
/// Issues are ordered by the fixed resource-family priority regardless of
/// sampler completion order, keeping report output deterministic.
pub fn evaluate(records: &[MetricRecord], config: &ThresholdConfig) -> Vec<Issue> {
    let mut issues: Vec<Issue> = records
        .iter()
        .filter_map(|record| {
            let limit = config.limit_for(record.kind)?;
            let severity = classify(record.value, limit)?;
            Some(Issue {
                kind: record.kind,
                severity,
                message: message_for(record),
                details: record.details.clone(),
                suggestion: suggestions::suggestion_for(record.kind, severity).to_string(),
            })
        })
        .collect();

    issues.sort_by_key(|issue| issue.kind);
    issues
}

/// Deterministic issue message from resource family and value.
fn message_for(record: &MetricRecord) -> String {
    match record.kind {
        ResourceKind::Cpu => format!("High CPU usage: {:.1}%", record.value),
        ResourceKind::Memory => format!("High RAM usage: {:.1}%", record.value),
        ResourceKind::Swap => format!("High swap usage: {:.1}%", record.value),
        ResourceKind::Disk => format!(
            "Disk space low: {} ({:.1}%)",
            record.scope.as_deref().unwrap_or("/"),
            record.value
        ),
        ResourceKind::Network => {
            format!("High network throughput: {:.1}% of capacity", record.value)
        }
    }
}
