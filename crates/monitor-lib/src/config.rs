//! Threshold configuration
//!
//! Thresholds are percentage limits per resource family. They are built
//! once at startup, optionally merged with JSON overrides, and stay
//! immutable for the duration of a run.

use crate::models::ResourceKind;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Compiled-in default limits per resource family.
const DEFAULT_LIMITS: [(ResourceKind, f64); 5] = [
    (ResourceKind::Cpu, 80.0),
    (ResourceKind::Memory, 75.0),
    (ResourceKind::Disk, 85.0),
    (ResourceKind::Swap, 50.0),
    (ResourceKind::Network, 90.0),
];

/// Error building a threshold configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid threshold JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("threshold for '{name}' out of range: {value} (expected 0-100)")]
    OutOfRange { name: String, value: f64 },
}

/// Percentage limits keyed by resource name.
///
/// Unknown resource names are retained in the map but never consulted by
/// the evaluator, so stale or misspelled override keys are never fatal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdConfig {
    limits: HashMap<String, f64>,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        let limits = DEFAULT_LIMITS
            .iter()
            .map(|(kind, limit)| (kind.config_key().to_string(), *limit))
            .collect();
        Self { limits }
    }
}

impl ThresholdConfig {
    /// Build a configuration from a JSON object merged over the defaults,
    /// e.g. `{"cpu": 90, "disk": 70}`.
    pub fn with_overrides(json: &str) -> Result<Self, ConfigError> {
        let overrides: HashMap<String, f64> = serde_json::from_str(json)?;

        for (name, value) in &overrides {
            if !(0.0..=100.0).contains(value) {
                return Err(ConfigError::OutOfRange {
                    name: name.clone(),
                    value: *value,
                });
            }
        }

        let mut config = Self::default();
        config.limits.extend(overrides);
        Ok(config)
    }

    /// Percentage limit for a resource family, if one is configured.
    /// Every known family has a compiled-in default.
    pub fn limit_for(&self, kind: ResourceKind) -> Option<f64> {
        self.limits.get(kind.config_key()).copied()
    }
}
