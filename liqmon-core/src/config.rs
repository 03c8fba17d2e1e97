//! Top-level monitor configuration.
//!
//! Combines the quality and anomaly settings into one document that can be
//! loaded from JSON. Missing sections and fields fall back to their defaults.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::anomaly::AnomalyConfig;
use crate::error::{LiqmonError, Result};
use crate::quality::QualityConfig;

/// Validation errors for monitor configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigValidationError {
    #[error("freshness_budget_hours must be a positive number, got {0}")]
    InvalidFreshnessBudget(f64),
    #[error("weight for {metric} must be a non-negative number, got {value}")]
    InvalidWeight { metric: String, value: f64 },
    #[error("score weights must sum to 1.0, got {0}")]
    WeightSum(f64),
    #[error("{0} must not be empty")]
    EmptyColumnName(&'static str),
    #[error("z_score_threshold must be a positive number, got {0}")]
    InvalidZScoreThreshold(f64),
    #[error("gap_factor must be a positive number, got {0}")]
    InvalidGapFactor(f64),
    #[error("change_percentile must be in (0.0, 1.0], got {0}")]
    InvalidChangePercentile(f64),
}

/// Complete configuration for a monitoring run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Quality scoring settings
    pub quality: QualityConfig,
    /// Anomaly detection settings
    pub anomaly: AnomalyConfig,
}

impl MonitorConfig {
    /// Creates a new monitor config with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set the quality config.
    pub fn with_quality(mut self, quality: QualityConfig) -> Self {
        self.quality = quality;
        self
    }

    /// Builder method to set the anomaly config.
    pub fn with_anomaly(mut self, anomaly: AnomalyConfig) -> Self {
        self.anomaly = anomaly;
        self
    }

    /// Parses and validates a JSON configuration document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| LiqmonError::serialization("Failed to parse monitor config", e))?;
        config
            .validate()
            .map_err(|e| LiqmonError::configuration(e.to_string()))?;
        Ok(config)
    }

    /// Validates both sections.
    ///
    /// Rule definitions are not checked here: a malformed rule surfaces as an
    /// error marker in the anomaly report without blocking the other rules.
    pub fn validate(&self) -> std::result::Result<(), ConfigValidationError> {
        self.quality.validate()?;
        self.anomaly.validate()
    }
}
