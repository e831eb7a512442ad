//! Report accumulation and persistence
//!
//! The aggregator owns the single mutable collection of analysis entries
//! for a run. The scheduler is the only writer; one mutex guards the
//! append/finalize boundary. Finalization freezes the report exactly once.

use crate::external::ReportCommitter;
use crate::models::{AnalysisEntry, Report, ReportMetadata, SystemIdentity};
use std::path::Path;
use std::sync::Mutex;
use thiserror::Error;
use tracing::{info, warn};

/// Aggregator misuse errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReportError {
    #[error("report already finalized")]
    AlreadyFinalized,
}

/// Failure to write the report file. The in-memory report remains valid
/// and the write may be retried or redirected.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to write {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Default)]
struct AggregatorInner {
    entries: Vec<AnalysisEntry>,
    skipped_ticks: u64,
    finalized: bool,
}

/// Accumulates per-tick analysis entries into the final report.
#[derive(Debug, Default)]
pub struct ReportAggregator {
    inner: Mutex<AggregatorInner>,
}

impl ReportAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one tick's analysis entry. Rejected after finalization.
    pub fn append(&self, entry: AnalysisEntry) -> Result<(), ReportError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.finalized {
            return Err(ReportError::AlreadyFinalized);
        }
        inner.entries.push(entry);
        Ok(())
    }

    /// Record ticks dropped by the scheduler's backpressure policy.
    /// Skipped ticks are counted but never entered into the analysis.
    pub fn record_skipped_ticks(&self, count: u64) {
        let mut inner = self.inner.lock().unwrap();
        inner.skipped_ticks += count;
    }

    /// Number of ticks successfully sampled so far.
    pub fn data_points(&self) -> usize {
        self.inner.lock().unwrap().entries.len()
    }

    pub fn skipped_ticks(&self) -> u64 {
        self.inner.lock().unwrap().skipped_ticks
    }

    /// Freeze the report. May be called exactly once per run; subsequent
    /// calls (and appends) are rejected.
    pub fn finalize(
        &self,
        identity: &SystemIdentity,
        duration_label: impl Into<String>,
    ) -> Result<Report, ReportError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.finalized {
            return Err(ReportError::AlreadyFinalized);
        }
        inner.finalized = true;

        let analysis = std::mem::take(&mut inner.entries);
        Ok(Report {
            metadata: ReportMetadata {
                system: identity.system.clone(),
                hostname: identity.hostname.clone(),
                duration: duration_label.into(),
            },
            data_points: analysis.len(),
            analysis,
        })
    }
}

/// Write the report as pretty-printed JSON. The write is atomic: the
/// report lands at a temporary sibling path and is renamed into place,
/// so a crash mid-write never leaves a truncated file.
pub async fn persist(report: &Report, path: &Path) -> Result<(), PersistError> {
    let json = serde_json::to_vec_pretty(report)?;

    let tmp_path = path.with_extension("tmp");
    tokio::fs::write(&tmp_path, &json)
        .await
        .map_err(|source| PersistError::Io {
            path: tmp_path.display().to_string(),
            source,
        })?;
    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|source| PersistError::Io {
            path: path.display().to_string(),
            source,
        })?;

    info!(path = %path.display(), data_points = report.data_points, "Report written");
    Ok(())
}

/// Persist the report, then hand it to the version-control collaborator
/// as a best-effort post-step. A commit failure is logged, never
/// escalated to a persist failure.
pub async fn persist_with_commit(
    report: &Report,
    path: &Path,
    committer: Option<&ReportCommitter>,
) -> Result<(), PersistError> {
    persist(report, path).await?;

    if let Some(committer) = committer {
        if let Err(error) = committer.commit(path).await {
            warn!(error = %error, "Report commit failed");
        }
    }

    Ok(())
}
