//! Core data models for the system monitor

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Resource families sampled each tick.
///
/// The declaration order fixes the priority used when ordering issues
/// within an analysis entry, regardless of sampler completion order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum ResourceKind {
    #[serde(rename = "CPU")]
    Cpu,
    Memory,
    Swap,
    Disk,
    Network,
}

impl ResourceKind {
    /// All resource families in priority order.
    pub const ALL: [ResourceKind; 5] = [
        ResourceKind::Cpu,
        ResourceKind::Memory,
        ResourceKind::Swap,
        ResourceKind::Disk,
        ResourceKind::Network,
    ];

    /// Key used for this resource in the threshold configuration map.
    pub fn config_key(&self) -> &'static str {
        match self {
            ResourceKind::Cpu => "cpu",
            ResourceKind::Memory => "memory",
            ResourceKind::Swap => "swap",
            ResourceKind::Disk => "disk",
            ResourceKind::Network => "network",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::Cpu => write!(f, "CPU"),
            ResourceKind::Memory => write!(f, "Memory"),
            ResourceKind::Swap => write!(f, "Swap"),
            ResourceKind::Disk => write!(f, "Disk"),
            ResourceKind::Network => write!(f, "Network"),
        }
    }
}

/// Severity tiers for detected bottlenecks, ordered by how far a metric
/// exceeds its configured limit.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Severity {
    Warning,
    High,
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => write!(f, "Warning"),
            Severity::High => write!(f, "High"),
            Severity::Critical => write!(f, "Critical"),
        }
    }
}

/// One normalized utilization reading for a resource family.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricRecord {
    pub kind: ResourceKind,
    /// Utilization percentage (0-100). Network is a rate normalized
    /// against the configured ceiling and may exceed 100.
    pub value: f64,
    /// Free-form detail text (per-core loads, used/total bytes).
    pub details: String,
    /// Instance label for resources with multiple instances; the mount
    /// point for disk records.
    pub scope: Option<String>,
    pub sampled_at: DateTime<Utc>,
}

impl MetricRecord {
    pub fn new(kind: ResourceKind, value: f64, details: impl Into<String>) -> Self {
        Self {
            kind,
            value,
            details: details.into(),
            scope: None,
            sampled_at: Utc::now(),
        }
    }

    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }
}

/// A detected bottleneck: a metric exceeding its configured threshold.
///
/// Field names and order follow the report file contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    #[serde(rename = "type")]
    pub kind: ResourceKind,
    pub severity: Severity,
    pub message: String,
    pub details: String,
    pub suggestion: String,
}

/// Analysis result for a single tick. A clean tick still produces an
/// entry with zero issues so `data_points` reflects ticks observed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisEntry {
    pub timestamp: DateTime<Utc>,
    pub issues: Vec<Issue>,
}

/// Report metadata, constant for the duration of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportMetadata {
    pub system: String,
    pub hostname: String,
    pub duration: String,
}

/// The finalized monitoring report handed to the persistence adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub metadata: ReportMetadata,
    pub analysis: Vec<AnalysisEntry>,
    pub data_points: usize,
}

/// Host identification, read once at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct SystemIdentity {
    pub system: String,
    pub hostname: String,
}

impl SystemIdentity {
    /// Read the kernel name and hostname from procfs. Falls back to
    /// generic values when the files are unavailable.
    pub fn detect() -> Self {
        Self {
            system: read_kernel_value("/proc/sys/kernel/ostype")
                .unwrap_or_else(|| "Linux".to_string()),
            hostname: read_kernel_value("/proc/sys/kernel/hostname")
                .unwrap_or_else(|| "unknown".to_string()),
        }
    }

    pub fn new(system: impl Into<String>, hostname: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            hostname: hostname.into(),
        }
    }
}

fn read_kernel_value(path: &str) -> Option<String> {
    let content = std::fs::read_to_string(path).ok()?;
    let value = content.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}
