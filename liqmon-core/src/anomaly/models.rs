//! Anomaly report models.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One flagged value of a column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outlier {
    pub column: String,
    /// Row index in the source table
    pub index: usize,
    pub value: f64,
    /// Absolute Z-score of the value
    pub z_score: f64,
}

/// Z-score scan result for one column.
///
/// `outlier_values`, `z_scores` and `indices` are aligned: entry `i` of each
/// describes the same value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ColumnOutliers {
    /// Number of outliers found
    pub count: u64,
    /// Outliers as a percentage of the non-null values
    pub percentage: f64,
    pub outlier_values: Vec<f64>,
    pub z_scores: Vec<f64>,
    /// Row indices of the outliers in the source table
    pub indices: Vec<usize>,
    /// Mean of the non-null values, when computable
    pub mean: Option<f64>,
    /// Sample standard deviation of the non-null values, when computable
    pub std_dev: Option<f64>,
}

impl ColumnOutliers {
    /// Result carrying no outliers and no statistics.
    pub fn none() -> Self {
        Self::default()
    }

    /// The outliers as individual records of `column`.
    pub fn outliers(&self, column: &str) -> Vec<Outlier> {
        self.indices
            .iter()
            .zip(&self.outlier_values)
            .zip(&self.z_scores)
            .map(|((&index, &value), &z_score)| Outlier {
                column: column.to_string(),
                index,
                value,
                z_score,
            })
            .collect()
    }
}

/// An interval between consecutive observations that is unusually long.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemporalGap {
    /// Position of the later observation in date order
    pub index: usize,
    /// Interval rendered as `"<days> days HH:MM:SS"`
    pub gap_duration: String,
    /// Interval length in seconds
    pub gap_seconds: f64,
    pub date_before: DateTime<Utc>,
    pub date_after: DateTime<Utc>,
}

/// A period-over-period change above the configured percentile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuddenChange {
    /// Position in the date-ordered, null-free value series
    pub index: usize,
    /// Row index of the later value in the source table
    pub row: usize,
    /// Absolute relative change, in percent
    pub percentage_change: f64,
    pub value_before: Option<f64>,
    pub value_after: f64,
}

/// Temporal findings for one source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TemporalAnomalies {
    pub gaps: Vec<TemporalGap>,
    pub sudden_changes: Vec<SuddenChange>,
}

impl TemporalAnomalies {
    /// No gaps and no sudden changes.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.gaps.is_empty() && self.sudden_changes.is_empty()
    }
}

/// Result of evaluating one business rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuleOutcome {
    /// Values outside the configured range
    RangeViolation { count: u64, percentage: f64 },
    /// Null values
    NullViolation { count: u64, percentage: f64 },
    /// The rule could not be evaluated
    Error { error: String },
}

impl RuleOutcome {
    /// Error marker carrying a description.
    pub fn error(error: impl std::fmt::Display) -> Self {
        RuleOutcome::Error {
            error: error.to_string(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, RuleOutcome::Error { .. })
    }

    /// Number of violating rows, or `None` for an error marker.
    pub fn violation_count(&self) -> Option<u64> {
        match self {
            RuleOutcome::RangeViolation { count, .. } | RuleOutcome::NullViolation { count, .. } => {
                Some(*count)
            }
            RuleOutcome::Error { .. } => None,
        }
    }
}

/// Anomaly findings for one source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceAnomalies {
    /// Z-score results keyed by column
    pub statistical_outliers: BTreeMap<String, ColumnOutliers>,
    pub temporal_anomalies: TemporalAnomalies,
    /// Rule results keyed by rule name
    pub business_rule_violations: BTreeMap<String, RuleOutcome>,
}

impl SourceAnomalies {
    /// Outliers across all scanned columns.
    pub fn total_outliers(&self) -> u64 {
        self.statistical_outliers.values().map(|c| c.count).sum()
    }

    /// Every outlier of the source, ordered by column name then row.
    pub fn outliers(&self) -> Vec<Outlier> {
        self.statistical_outliers
            .iter()
            .flat_map(|(column, outliers)| outliers.outliers(column))
            .collect()
    }

    pub fn gap_count(&self) -> usize {
        self.temporal_anomalies.gaps.len()
    }

    pub fn sudden_change_count(&self) -> usize {
        self.temporal_anomalies.sudden_changes.len()
    }

    /// Rules that produced an error marker.
    pub fn rule_error_count(&self) -> usize {
        self.business_rule_violations
            .values()
            .filter(|outcome| outcome.is_error())
            .count()
    }
}

/// Anomaly report across the non-empty sources of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyReport {
    /// When the report was generated
    pub timestamp: DateTime<Utc>,
    /// Findings keyed by source name
    pub sources: BTreeMap<String, SourceAnomalies>,
}

impl AnomalyReport {
    /// Findings of the named source.
    pub fn source(&self, name: &str) -> Option<&SourceAnomalies> {
        self.sources.get(name)
    }

    /// Outliers across all sources.
    pub fn total_outliers(&self) -> u64 {
        self.sources.values().map(SourceAnomalies::total_outliers).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn column_with(count: u64) -> ColumnOutliers {
        let n = count as usize;
        ColumnOutliers {
            count,
            outlier_values: vec![100.0; n],
            z_scores: vec![4.0; n],
            indices: (0..n).collect(),
            ..ColumnOutliers::none()
        }
    }

    #[test]
    fn test_column_outliers_records_are_aligned() {
        let outliers = ColumnOutliers {
            count: 2,
            percentage: 20.0,
            outlier_values: vec![120.0, -40.0],
            z_scores: vec![3.4, 3.1],
            indices: vec![4, 9],
            mean: Some(10.0),
            std_dev: Some(32.0),
        };

        let records = outliers.outliers("value");
        assert_eq!(records.len(), 2);
        assert_eq!(
            records[1],
            Outlier {
                column: "value".to_string(),
                index: 9,
                value: -40.0,
                z_score: 3.1
            }
        );
    }

    #[test]
    fn test_rule_outcome_serialization() {
        let outcome = RuleOutcome::RangeViolation {
            count: 3,
            percentage: 7.5,
        };
        assert_eq!(
            serde_json::to_value(&outcome).unwrap(),
            json!({"type": "range_violation", "count": 3, "percentage": 7.5})
        );

        let outcome = RuleOutcome::error("bad rule");
        assert_eq!(
            serde_json::to_value(&outcome).unwrap(),
            json!({"type": "error", "error": "bad rule"})
        );
        assert!(outcome.is_error());
        assert_eq!(outcome.violation_count(), None);
    }

    #[test]
    fn test_source_anomalies_summary() {
        let mut source = SourceAnomalies::default();
        source.statistical_outliers.insert("value".to_string(), column_with(2));
        source.statistical_outliers.insert("close".to_string(), column_with(1));
        source
            .business_rule_violations
            .insert("broken".to_string(), RuleOutcome::error("no column"));
        source.business_rule_violations.insert(
            "price_not_null".to_string(),
            RuleOutcome::NullViolation {
                count: 0,
                percentage: 0.0,
            },
        );

        assert_eq!(source.total_outliers(), 3);
        let columns: Vec<String> = source.outliers().into_iter().map(|o| o.column).collect();
        assert_eq!(columns, vec!["close", "value", "value"]);
        assert_eq!(source.gap_count(), 0);
        assert_eq!(source.sudden_change_count(), 0);
        assert_eq!(source.rule_error_count(), 1);
    }

    #[test]
    fn test_anomaly_report_totals() {
        let mut a = SourceAnomalies::default();
        a.statistical_outliers.insert("value".to_string(), column_with(2));
        let mut b = SourceAnomalies::default();
        b.statistical_outliers.insert("close".to_string(), column_with(5));

        let report = AnomalyReport {
            timestamp: Utc::now(),
            sources: BTreeMap::from([("a".to_string(), a), ("b".to_string(), b)]),
        };

        assert_eq!(report.total_outliers(), 7);
        assert!(report.source("a").is_some());
        assert!(report.source("missing").is_none());
    }

    #[test]
    fn test_temporal_anomalies_empty() {
        let temporal = TemporalAnomalies::empty();
        assert!(temporal.is_empty());
        assert_eq!(
            serde_json::to_value(&temporal).unwrap(),
            json!({"gaps": [], "sudden_changes": []})
        );
    }
}
