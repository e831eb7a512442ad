//! Core library for the host resource monitor
//!
//! This crate provides:
//! - Per-family resource samplers backed by procfs
//! - Threshold evaluation and severity classification
//! - Remediation suggestion lookup
//! - A fixed-interval sampling scheduler
//! - Report aggregation and atomic JSON persistence
//! - External optimize/commit collaborators

pub mod analysis;
pub mod config;
pub mod external;
pub mod models;
pub mod observability;
pub mod report;
pub mod sampler;
pub mod scheduler;

pub use config::{ConfigError, ThresholdConfig};
pub use models::*;
pub use observability::MonitorLogger;
pub use report::{persist, persist_with_commit, PersistError, ReportAggregator, ReportError};
pub use scheduler::{ScheduleConfig, Scheduler, SchedulerState};
