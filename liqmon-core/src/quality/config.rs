//! Quality scoring configuration.
//!
//! This module provides the staleness budget, score weights and the
//! required-column schema used by the quality scorer.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::ConfigValidationError;
use crate::table::TableView;

/// Tolerance used when checking that score weights sum to one.
const WEIGHT_SUM_TOLERANCE: f64 = 1e-9;

/// Weights of the three quality metrics in the per-source score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreWeights {
    pub completeness: f64,
    pub freshness: f64,
    pub duplicates: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            completeness: 0.4,
            freshness: 0.4,
            duplicates: 0.2,
        }
    }
}

impl ScoreWeights {
    /// Creates score weights. Call [`ScoreWeights::validate`] before use.
    pub fn new(completeness: f64, freshness: f64, duplicates: f64) -> Self {
        Self {
            completeness,
            freshness,
            duplicates,
        }
    }

    /// Validates that every weight is non-negative and the weights sum to one.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        for (metric, value) in [
            ("completeness", self.completeness),
            ("freshness", self.freshness),
            ("duplicates", self.duplicates),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigValidationError::InvalidWeight {
                    metric: metric.to_string(),
                    value,
                });
            }
        }

        let sum = self.completeness + self.freshness + self.duplicates;
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(ConfigValidationError::WeightSum(sum));
        }
        Ok(())
    }
}

/// Required-column schema per source.
///
/// An explicit entry for a source always wins. Sources without one fall back
/// to a name-based schema when `infer_from_name` is set: names containing
/// "ecb" require `date`, `rate_type` and `value`; names containing "market"
/// require `date`, `instrument` and `close`. Anything else requires every
/// column the table already has, which makes the missing-column list empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequiredColumns {
    /// Explicit schemas keyed by source name
    pub explicit: BTreeMap<String, Vec<String>>,
    /// Fall back to the name-based schema for unlisted sources
    pub infer_from_name: bool,
}

impl Default for RequiredColumns {
    fn default() -> Self {
        Self {
            explicit: BTreeMap::new(),
            infer_from_name: true,
        }
    }
}

impl RequiredColumns {
    /// Creates the default schema policy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to register an explicit schema for a source.
    pub fn with_source<S: Into<String>>(
        mut self,
        source_name: impl Into<String>,
        columns: impl IntoIterator<Item = S>,
    ) -> Self {
        self.explicit.insert(
            source_name.into(),
            columns.into_iter().map(Into::into).collect(),
        );
        self
    }

    /// Builder method to enable/disable name-based inference.
    pub fn with_infer_from_name(mut self, infer: bool) -> Self {
        self.infer_from_name = infer;
        self
    }

    /// Resolves the required columns for a source.
    pub fn resolve(&self, source_name: &str, table: &TableView) -> Vec<String> {
        if let Some(columns) = self.explicit.get(source_name) {
            return columns.clone();
        }

        if self.infer_from_name {
            let lowered = source_name.to_lowercase();
            if lowered.contains("ecb") {
                return to_owned(&["date", "rate_type", "value"]);
            }
            if lowered.contains("market") {
                return to_owned(&["date", "instrument", "close"]);
            }
        }

        table
            .column_names()
            .into_iter()
            .map(str::to_string)
            .collect()
    }
}

fn to_owned(columns: &[&str]) -> Vec<String> {
    columns.iter().map(|c| (*c).to_string()).collect()
}

/// Quality scoring configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityConfig {
    /// Maximum age in hours of the latest observation for a source to be fresh
    pub freshness_budget_hours: f64,
    /// Column holding the observation timestamp
    pub timestamp_column: String,
    /// Weights of the quality metrics
    pub weights: ScoreWeights,
    /// Required-column schema per source
    pub required_columns: RequiredColumns,
    /// Columns defining a duplicate; `None` compares whole rows
    pub duplicate_key: Option<Vec<String>>,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            freshness_budget_hours: 24.0,
            timestamp_column: "date".to_string(),
            weights: ScoreWeights::default(),
            required_columns: RequiredColumns::default(),
            duplicate_key: None,
        }
    }
}

impl QualityConfig {
    /// Creates a new quality config with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set the staleness budget.
    ///
    /// Non-positive budgets are replaced with the default of 24 hours.
    pub fn with_freshness_budget_hours(mut self, hours: f64) -> Self {
        if hours.is_finite() && hours > 0.0 {
            self.freshness_budget_hours = hours;
        } else {
            tracing::warn!(
                "freshness budget {} is not a positive number of hours, keeping {}",
                hours,
                self.freshness_budget_hours
            );
        }
        self
    }

    /// Builder method to set the timestamp column.
    pub fn with_timestamp_column(mut self, column: impl Into<String>) -> Self {
        self.timestamp_column = column.into();
        self
    }

    /// Builder method to set the score weights.
    pub fn with_weights(mut self, weights: ScoreWeights) -> Self {
        self.weights = weights;
        self
    }

    /// Builder method to set the required-column schema.
    pub fn with_required_columns(mut self, required: RequiredColumns) -> Self {
        self.required_columns = required;
        self
    }

    /// Builder method to restrict duplicate detection to a key.
    pub fn with_duplicate_key<S: Into<String>>(mut self, key: impl IntoIterator<Item = S>) -> Self {
        self.duplicate_key = Some(key.into_iter().map(Into::into).collect());
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if !self.freshness_budget_hours.is_finite() || self.freshness_budget_hours <= 0.0 {
            return Err(ConfigValidationError::InvalidFreshnessBudget(
                self.freshness_budget_hours,
            ));
        }
        if self.timestamp_column.trim().is_empty() {
            return Err(ConfigValidationError::EmptyColumnName("timestamp_column"));
        }
        self.weights.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Column;

    fn table_with(columns: &[&str]) -> TableView {
        TableView::new(
            columns
                .iter()
                .map(|name| Column::float(*name, [Some(1.0)]))
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_quality_config_default() {
        let config = QualityConfig::default();
        assert_eq!(config.freshness_budget_hours, 24.0);
        assert_eq!(config.timestamp_column, "date");
        assert_eq!(config.weights, ScoreWeights::new(0.4, 0.4, 0.2));
        assert!(config.required_columns.infer_from_name);
        assert!(config.duplicate_key.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_quality_config_builder() {
        let config = QualityConfig::new()
            .with_freshness_budget_hours(48.0)
            .with_timestamp_column("as_of")
            .with_weights(ScoreWeights::new(0.5, 0.3, 0.2))
            .with_duplicate_key(["date", "instrument"]);

        assert_eq!(config.freshness_budget_hours, 48.0);
        assert_eq!(config.timestamp_column, "as_of");
        assert_eq!(config.weights.completeness, 0.5);
        assert_eq!(
            config.duplicate_key,
            Some(vec!["date".to_string(), "instrument".to_string()])
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_freshness_budget_rejects_non_positive() {
        let config = QualityConfig::new().with_freshness_budget_hours(-3.0);
        assert_eq!(config.freshness_budget_hours, 24.0);

        let config = QualityConfig {
            freshness_budget_hours: 0.0,
            ..QualityConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigValidationError::InvalidFreshnessBudget(_))
        ));
    }

    #[test]
    fn test_weights_must_sum_to_one() {
        let weights = ScoreWeights::new(0.5, 0.5, 0.5);
        assert!(matches!(
            weights.validate(),
            Err(ConfigValidationError::WeightSum(_))
        ));
    }

    #[test]
    fn test_weights_reject_negative() {
        let weights = ScoreWeights::new(1.2, -0.2, 0.0);
        assert!(matches!(
            weights.validate(),
            Err(ConfigValidationError::InvalidWeight { .. })
        ));
    }

    #[test]
    fn test_empty_timestamp_column_rejected() {
        let config = QualityConfig::new().with_timestamp_column("  ");
        assert!(matches!(
            config.validate(),
            Err(ConfigValidationError::EmptyColumnName("timestamp_column"))
        ));
    }

    #[test]
    fn test_required_columns_name_inference() {
        let required = RequiredColumns::default();
        let table = table_with(&["a", "b"]);

        assert_eq!(
            required.resolve("ECB_data", &table),
            vec!["date", "rate_type", "value"]
        );
        assert_eq!(
            required.resolve("market_data", &table),
            vec!["date", "instrument", "close"]
        );
        assert_eq!(required.resolve("fred", &table), vec!["a", "b"]);
    }

    #[test]
    fn test_required_columns_explicit_wins() {
        let required = RequiredColumns::new().with_source("ecb_data", ["date", "value"]);
        let table = table_with(&["date"]);

        assert_eq!(required.resolve("ecb_data", &table), vec!["date", "value"]);
    }

    #[test]
    fn test_required_columns_without_inference() {
        let required = RequiredColumns::new().with_infer_from_name(false);
        let table = table_with(&["date", "close"]);

        assert_eq!(required.resolve("market_data", &table), vec!["date", "close"]);
    }

    #[test]
    fn test_quality_config_serde_partial() {
        let config: QualityConfig =
            serde_json::from_str(r#"{"freshness_budget_hours": 12.0}"#).unwrap();

        assert_eq!(config.freshness_budget_hours, 12.0);
        assert_eq!(config.timestamp_column, "date");
        assert_eq!(config.weights, ScoreWeights::default());
    }
}
