//! Network throughput sampling
//!
//! Reads cumulative rx+tx byte counters from /proc/net/dev (loopback
//! excluded) and derives a bytes/sec rate from two successive readings.
//! The rate is normalized against a configured ceiling so the evaluator
//! can treat it like the other percentage metrics. The first reading
//! after process start has no prior counter and yields no record.

use super::{parse_error, read_proc_file, SampleError, Sampler};
use crate::models::{MetricRecord, ResourceKind};
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Instant;

// SI megabytes, matching the SI Mbit-to-bytes ceiling conversion so a
// 1000 Mbit ceiling prints as 125 MB/s.
const BYTES_PER_MB: f64 = 1_000_000.0;

/// Samples total network throughput across non-loopback interfaces.
pub struct NetworkSampler {
    proc_root: PathBuf,
    ceiling_bytes_per_sec: f64,
    previous: Mutex<Option<(Instant, u64)>>,
}

impl NetworkSampler {
    pub fn new(ceiling_bytes_per_sec: f64) -> Self {
        Self {
            proc_root: PathBuf::from("/proc"),
            ceiling_bytes_per_sec,
            previous: Mutex::new(None),
        }
    }

    /// Create a sampler with a custom proc path (for testing).
    pub fn with_proc_root(ceiling_bytes_per_sec: f64, proc_root: impl Into<PathBuf>) -> Self {
        Self {
            proc_root: proc_root.into(),
            ceiling_bytes_per_sec,
            previous: Mutex::new(None),
        }
    }

    /// Parse /proc/net/dev contents into total rx+tx bytes, excluding
    /// the loopback interface.
    pub fn parse_net_dev(content: &str, path: &std::path::Path) -> Result<u64, SampleError> {
        let mut total = 0u64;
        let mut interfaces = 0usize;

        for line in content.lines().skip(2) {
            let Some((name, counters)) = line.split_once(':') else {
                continue;
            };
            if name.trim() == "lo" {
                continue;
            }

            let values: Vec<u64> = counters
                .split_whitespace()
                .map(|v| v.parse().unwrap_or(0))
                .collect();
            if values.len() < 16 {
                return Err(parse_error(path, format!("short interface line: {line}")));
            }

            // Column 0 is rx bytes, column 8 is tx bytes.
            total = total.saturating_add(values[0]).saturating_add(values[8]);
            interfaces += 1;
        }

        if interfaces == 0 {
            return Err(parse_error(path, "no non-loopback interfaces"));
        }
        Ok(total)
    }

    /// Rate as a percentage of the ceiling, from a byte delta over the
    /// measurement window.
    pub fn rate_percent(
        prev_bytes: u64,
        next_bytes: u64,
        elapsed_secs: f64,
        ceiling_bytes_per_sec: f64,
    ) -> f64 {
        if elapsed_secs <= 0.0 || ceiling_bytes_per_sec <= 0.0 {
            return 0.0;
        }
        let rate = next_bytes.saturating_sub(prev_bytes) as f64 / elapsed_secs;
        (rate / ceiling_bytes_per_sec) * 100.0
    }
}

#[async_trait]
impl Sampler for NetworkSampler {
    fn name(&self) -> &'static str {
        "network"
    }

    async fn sample(&self) -> Result<Vec<MetricRecord>, SampleError> {
        let path = self.proc_root.join("net/dev");
        let content = read_proc_file(&path).await?;
        let bytes = Self::parse_net_dev(&content, &path)?;
        let now = Instant::now();

        let mut previous = self.previous.lock().unwrap();
        let Some((prev_at, prev_bytes)) = previous.replace((now, bytes)) else {
            // First reading: no prior counter to diff against.
            return Ok(vec![]);
        };

        let elapsed = now.duration_since(prev_at).as_secs_f64();
        let value = Self::rate_percent(prev_bytes, bytes, elapsed, self.ceiling_bytes_per_sec);
        let rate_mb = if elapsed > 0.0 {
            bytes.saturating_sub(prev_bytes) as f64 / elapsed / BYTES_PER_MB
        } else {
            0.0
        };
        let details = format!(
            "rx+tx {:.2} MB/s (ceiling {:.0} MB/s)",
            rate_mb,
            self.ceiling_bytes_per_sec / BYTES_PER_MB
        );

        Ok(vec![MetricRecord::new(ResourceKind::Network, value, details)])
    }
}
