//! Anomaly detection configuration.
//!
//! This module provides the Z-score threshold, the temporal detector
//! settings and the business rule definitions.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::ConfigValidationError;

use super::rules::{RuleDefinition, default_rule_definitions};

/// Anomaly detection sensitivity level.
///
/// Controls how many standard deviations from the mean a value
/// must be to be considered an outlier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AnomalySensitivity {
    /// 3.0 standard deviations - fewer false positives
    #[default]
    Low,
    /// 2.5 standard deviations - balanced detection
    Medium,
    /// 2.0 standard deviations - more aggressive detection
    High,
}

impl AnomalySensitivity {
    /// Returns the z-score threshold for this sensitivity level.
    pub fn z_score_threshold(&self) -> f64 {
        match self {
            AnomalySensitivity::Low => 3.0,
            AnomalySensitivity::Medium => 2.5,
            AnomalySensitivity::High => 2.0,
        }
    }
}

/// Configuration for anomaly detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnomalyConfig {
    /// Absolute Z-score above which a value is an outlier
    pub z_score_threshold: f64,
    /// Multiple of the median interval above which an interval is a gap
    pub gap_factor: f64,
    /// Percentile of period-over-period changes used as the sudden-change cutoff
    pub change_percentile: f64,
    /// Column holding the observation date
    pub date_column: String,
    /// Column holding the observed value
    pub value_column: String,
    /// Business rules keyed by rule name
    pub rules: BTreeMap<String, RuleDefinition>,
}

impl Default for AnomalyConfig {
    fn default() -> Self {
        Self {
            z_score_threshold: AnomalySensitivity::default().z_score_threshold(),
            gap_factor: 3.0,
            change_percentile: 0.95,
            date_column: "date".to_string(),
            value_column: "value".to_string(),
            rules: default_rule_definitions(),
        }
    }
}

impl AnomalyConfig {
    /// Creates a new anomaly config with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set the Z-score threshold from a sensitivity level.
    pub fn with_sensitivity(mut self, sensitivity: AnomalySensitivity) -> Self {
        self.z_score_threshold = sensitivity.z_score_threshold();
        self
    }

    /// Builder method to set the Z-score threshold.
    ///
    /// Non-positive thresholds keep the current value.
    pub fn with_z_score_threshold(mut self, threshold: f64) -> Self {
        if threshold.is_finite() && threshold > 0.0 {
            self.z_score_threshold = threshold;
        } else {
            tracing::warn!(
                "z-score threshold {} is not a positive number, keeping {}",
                threshold,
                self.z_score_threshold
            );
        }
        self
    }

    /// Builder method to set the gap factor.
    ///
    /// Non-positive factors keep the current value.
    pub fn with_gap_factor(mut self, factor: f64) -> Self {
        if factor.is_finite() && factor > 0.0 {
            self.gap_factor = factor;
        } else {
            tracing::warn!(
                "gap factor {} is not a positive number, keeping {}",
                factor,
                self.gap_factor
            );
        }
        self
    }

    /// Builder method to set the sudden-change percentile (clamped to (0.0, 1.0]).
    pub fn with_change_percentile(mut self, percentile: f64) -> Self {
        if percentile.is_nan() || percentile <= 0.0 {
            tracing::warn!(
                "change percentile {} is not in (0.0, 1.0], keeping {}",
                percentile,
                self.change_percentile
            );
        } else {
            self.change_percentile = percentile.min(1.0);
        }
        self
    }

    /// Builder method to set the date and value columns.
    pub fn with_columns(
        mut self,
        date_column: impl Into<String>,
        value_column: impl Into<String>,
    ) -> Self {
        self.date_column = date_column.into();
        self.value_column = value_column.into();
        self
    }

    /// Builder method to add or replace a rule.
    pub fn with_rule(mut self, name: impl Into<String>, rule: RuleDefinition) -> Self {
        self.rules.insert(name.into(), rule);
        self
    }

    /// Builder method to replace the whole rule set.
    pub fn with_rules(mut self, rules: BTreeMap<String, RuleDefinition>) -> Self {
        self.rules = rules;
        self
    }

    /// Validates the detector settings.
    ///
    /// Rule definitions are compiled separately; a bad rule becomes an error
    /// marker in the report instead of failing validation.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if !self.z_score_threshold.is_finite() || self.z_score_threshold <= 0.0 {
            return Err(ConfigValidationError::InvalidZScoreThreshold(
                self.z_score_threshold,
            ));
        }
        if !self.gap_factor.is_finite() || self.gap_factor <= 0.0 {
            return Err(ConfigValidationError::InvalidGapFactor(self.gap_factor));
        }
        if !(self.change_percentile > 0.0 && self.change_percentile <= 1.0) {
            return Err(ConfigValidationError::InvalidChangePercentile(
                self.change_percentile,
            ));
        }
        if self.date_column.trim().is_empty() {
            return Err(ConfigValidationError::EmptyColumnName("date_column"));
        }
        if self.value_column.trim().is_empty() {
            return Err(ConfigValidationError::EmptyColumnName("value_column"));
        }
        Ok(())
    }
}
