//! Memory and swap sampling
//!
//! Reads /proc/meminfo and emits one record for RAM utilization
//! ((total - available) / total) and one for swap (used / total).
//! Hosts without swap configured produce no swap record.

use super::{parse_error, read_proc_file, SampleError, Sampler};
use crate::models::{MetricRecord, ResourceKind};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;

const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Samples RAM and swap utilization from /proc/meminfo.
pub struct MemorySampler {
    proc_root: PathBuf,
}

impl Default for MemorySampler {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySampler {
    pub fn new() -> Self {
        Self {
            proc_root: PathBuf::from("/proc"),
        }
    }

    /// Create a sampler with a custom proc path (for testing).
    pub fn with_proc_root(proc_root: impl Into<PathBuf>) -> Self {
        Self {
            proc_root: proc_root.into(),
        }
    }

    /// Parse /proc/meminfo contents into a map of field name to bytes.
    /// Values in the file are in kB.
    pub fn parse_meminfo(content: &str) -> HashMap<String, u64> {
        let mut fields = HashMap::new();

        for line in content.lines() {
            let Some((name, rest)) = line.split_once(':') else {
                continue;
            };
            if let Some(kb) = rest.split_whitespace().next() {
                if let Ok(value) = kb.parse::<u64>() {
                    fields.insert(name.to_string(), value * 1024);
                }
            }
        }

        fields
    }

    /// Reclaimable memory estimate. Kernels before 3.14 have no
    /// MemAvailable field; approximate it as free plus page cache so an
    /// old host is not reported at 100% utilization.
    pub fn available_bytes(fields: &HashMap<String, u64>) -> u64 {
        if let Some(available) = fields.get("MemAvailable") {
            return *available;
        }
        let free = fields.get("MemFree").copied().unwrap_or(0);
        let buffers = fields.get("Buffers").copied().unwrap_or(0);
        let cached = fields.get("Cached").copied().unwrap_or(0);
        free + buffers + cached
    }
}

#[async_trait]
impl Sampler for MemorySampler {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn sample(&self) -> Result<Vec<MetricRecord>, SampleError> {
        let path = self.proc_root.join("meminfo");
        let content = read_proc_file(&path).await?;
        let fields = Self::parse_meminfo(&content);

        let total = fields
            .get("MemTotal")
            .copied()
            .filter(|t| *t > 0)
            .ok_or_else(|| parse_error(&path, "missing MemTotal"))?;
        let available = Self::available_bytes(&fields);

        let used = total.saturating_sub(available);
        let ram_percent = (used as f64 / total as f64) * 100.0;
        let ram_details = format!(
            "Available: {:.2} GB of {:.2} GB",
            available as f64 / BYTES_PER_GB,
            total as f64 / BYTES_PER_GB
        );

        let mut records = vec![MetricRecord::new(
            ResourceKind::Memory,
            ram_percent,
            ram_details,
        )];

        let swap_total = fields.get("SwapTotal").copied().unwrap_or(0);
        if swap_total > 0 {
            let swap_free = fields.get("SwapFree").copied().unwrap_or(0);
            let swap_used = swap_total.saturating_sub(swap_free);
            let swap_percent = (swap_used as f64 / swap_total as f64) * 100.0;
            let swap_details = format!(
                "Swap used: {:.2} GB of {:.2} GB",
                swap_used as f64 / BYTES_PER_GB,
                swap_total as f64 / BYTES_PER_GB
            );
            records.push(MetricRecord::new(
                ResourceKind::Swap,
                swap_percent,
                swap_details,
            ));
        }

        Ok(records)
    }
}
