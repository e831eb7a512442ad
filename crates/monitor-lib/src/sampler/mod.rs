//! Host resource sampling
//!
//! One sampler per resource family (CPU, memory/swap, disk, network),
//! each producing normalized metric records for "now" by parsing procfs.
//! Samplers are stateless functions of the current kernel counters, with
//! the single exception of the network sampler's previous-counter cache.

mod cpu;
mod disk;
mod memory;
mod network;

pub use cpu::CpuSampler;
pub use disk::DiskSampler;
pub use memory::MemorySampler;
pub use network::NetworkSampler;

use crate::models::MetricRecord;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

pub use async_trait::async_trait;

/// Error raised when a resource cannot be sampled this tick.
///
/// Sampler failures are always recoverable: the tick proceeds with the
/// resource's data absent, and no issue can be raised for it.
#[derive(Debug, Error)]
pub enum SampleError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("unexpected format in {path}: {reason}")]
    Parse { path: String, reason: String },
}

/// Trait for per-family resource samplers.
#[async_trait]
pub trait Sampler: Send + Sync {
    /// Sampler name used in log fields.
    fn name(&self) -> &'static str;

    /// Take one reading, returning one record per resource in the family.
    /// An empty vector is a valid result (e.g. the network sampler's
    /// first reading, which has no prior counter).
    async fn sample(&self) -> Result<Vec<MetricRecord>, SampleError>;
}

/// The default sampler set covering all resource families.
pub fn default_samplers(network_ceiling_bytes_per_sec: f64) -> Vec<Arc<dyn Sampler>> {
    vec![
        Arc::new(CpuSampler::new()),
        Arc::new(MemorySampler::new()),
        Arc::new(DiskSampler::new()),
        Arc::new(NetworkSampler::new(network_ceiling_bytes_per_sec)),
    ]
}

/// Read a procfs file, mapping failures to a sampler error.
pub(crate) async fn read_proc_file(path: &Path) -> Result<String, SampleError> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|source| SampleError::Io {
            path: path.display().to_string(),
            source,
        })
}

pub(crate) fn parse_error(path: &Path, reason: impl Into<String>) -> SampleError {
    SampleError::Parse {
        path: path.display().to_string(),
        reason: reason.into(),
    }
}
