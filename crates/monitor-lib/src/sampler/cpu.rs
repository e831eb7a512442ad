//! CPU utilization sampling
//!
//! Reads /proc/stat twice, spaced by a short measurement window, and
//! computes busy/total jiffy deltas for the aggregate and for each core.
//! Idle and iowait time count as idle.

use super::{parse_error, read_proc_file, SampleError, Sampler};
use crate::models::{MetricRecord, ResourceKind};
use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;

/// Default spacing between the two /proc/stat readings.
const DEFAULT_MEASURE_WINDOW: Duration = Duration::from_millis(100);

/// Cumulative jiffy counters for one CPU line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CpuTimes {
    pub busy: u64,
    pub total: u64,
}

impl CpuTimes {
    /// Busy percentage over the delta between two readings.
    pub fn usage_since(&self, prev: &CpuTimes) -> f64 {
        let total = self.total.saturating_sub(prev.total);
        if total == 0 {
            return 0.0;
        }
        let busy = self.busy.saturating_sub(prev.busy);
        (busy as f64 / total as f64) * 100.0
    }
}

/// Parsed /proc/stat snapshot: aggregate plus ordered per-core counters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CpuSnapshot {
    pub total: CpuTimes,
    pub per_core: Vec<CpuTimes>,
}

/// Samples aggregate and per-core CPU utilization.
pub struct CpuSampler {
    proc_root: PathBuf,
    measure_window: Duration,
}

impl Default for CpuSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl CpuSampler {
    pub fn new() -> Self {
        Self {
            proc_root: PathBuf::from("/proc"),
            measure_window: DEFAULT_MEASURE_WINDOW,
        }
    }

    /// Create a sampler with a custom proc path (for testing).
    pub fn with_proc_root(proc_root: impl Into<PathBuf>) -> Self {
        Self {
            proc_root: proc_root.into(),
            measure_window: DEFAULT_MEASURE_WINDOW,
        }
    }

    pub fn with_measure_window(mut self, window: Duration) -> Self {
        self.measure_window = window;
        self
    }

    /// Parse /proc/stat contents into aggregate and per-core counters.
    pub fn parse_proc_stat(content: &str, path: &std::path::Path) -> Result<CpuSnapshot, SampleError> {
        let mut total = None;
        let mut per_core = Vec::new();

        for line in content.lines() {
            let mut fields = line.split_whitespace();
            let Some(label) = fields.next() else { continue };
            if !label.starts_with("cpu") {
                continue;
            }

            let values: Vec<u64> = fields.map(|v| v.parse().unwrap_or(0)).collect();
            if values.len() < 5 {
                return Err(parse_error(path, format!("short cpu line: {line}")));
            }

            // user nice system idle iowait irq softirq steal
            let sum: u64 = values.iter().take(8).sum();
            let idle = values[3] + values[4];
            let times = CpuTimes {
                busy: sum.saturating_sub(idle),
                total: sum,
            };

            if label == "cpu" {
                total = Some(times);
            } else {
                per_core.push(times);
            }
        }

        match total {
            Some(total) => Ok(CpuSnapshot { total, per_core }),
            None => Err(parse_error(path, "no aggregate cpu line")),
        }
    }

    async fn snapshot(&self) -> Result<CpuSnapshot, SampleError> {
        let path = self.proc_root.join("stat");
        let content = read_proc_file(&path).await?;
        Self::parse_proc_stat(&content, &path)
    }
}

#[async_trait]
impl Sampler for CpuSampler {
    fn name(&self) -> &'static str {
        "cpu"
    }

    async fn sample(&self) -> Result<Vec<MetricRecord>, SampleError> {
        let before = self.snapshot().await?;
        tokio::time::sleep(self.measure_window).await;
        let after = self.snapshot().await?;

        let usage = after.total.usage_since(&before.total);
        let core_loads: Vec<String> = after
            .per_core
            .iter()
            .zip(before.per_core.iter())
            .map(|(now, prev)| format!("{:.1}%", now.usage_since(prev)))
            .collect();

        let details = format!("Core loads: {}", core_loads.join(", "));
        Ok(vec![MetricRecord::new(ResourceKind::Cpu, usage, details)])
    }
}
