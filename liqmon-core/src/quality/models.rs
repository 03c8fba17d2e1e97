//! Data quality report models.
//!
//! These are immutable snapshots produced by the quality checks. Field names
//! are part of the serialized report format consumed by presentation layers.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Scores above this value grade as good.
const GOOD_SCORE: f64 = 0.8;
/// Scores above this value (and not good) grade as warning.
const WARNING_SCORE: f64 = 0.6;

/// Health grade derived from a quality score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityGrade {
    /// Score above 0.8
    Good,
    /// Score above 0.6, up to 0.8
    Warning,
    /// Score of 0.6 or below
    Critical,
}

impl QualityGrade {
    /// Classifies a quality score.
    pub fn from_score(score: f64) -> Self {
        if score > GOOD_SCORE {
            QualityGrade::Good
        } else if score > WARNING_SCORE {
            QualityGrade::Warning
        } else {
            QualityGrade::Critical
        }
    }
}

impl std::fmt::Display for QualityGrade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QualityGrade::Good => write!(f, "good"),
            QualityGrade::Warning => write!(f, "warning"),
            QualityGrade::Critical => write!(f, "critical"),
        }
    }
}

/// Null statistics for one column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColumnMissing {
    /// Count of null values
    pub count: u64,
    /// Null values as a percentage of rows
    pub percentage: f64,
}

impl ColumnMissing {
    /// Creates column null statistics.
    pub fn new(count: u64, total: u64) -> Self {
        let percentage = if total == 0 {
            0.0
        } else {
            count as f64 / total as f64 * 100.0
        };
        Self { count, percentage }
    }
}

/// Completeness of a table against its required schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletenessReport {
    /// 1 - (null cells / total cells), in [0.0, 1.0]
    pub completeness_score: f64,
    /// Required columns absent from the table
    pub missing_columns: Vec<String>,
    /// Null statistics for every present column
    pub missing_values_by_column: BTreeMap<String, ColumnMissing>,
    /// Null cells as a percentage of all cells
    pub total_missing_percentage: f64,
}

impl CompletenessReport {
    /// Report for a table with no rows: every required column is missing.
    pub fn empty(required_columns: &[String]) -> Self {
        Self {
            completeness_score: 0.0,
            missing_columns: required_columns.to_vec(),
            missing_values_by_column: BTreeMap::new(),
            total_missing_percentage: 100.0,
        }
    }
}

/// Recency of the latest observation in a table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FreshnessReport {
    /// Whether the latest observation is within the staleness budget
    pub is_fresh: bool,
    /// Latest observation timestamp
    pub latest_date: Option<DateTime<Utc>>,
    /// Age of the latest observation in hours
    pub age_hours: Option<f64>,
    /// Linear decay score reaching 0.0 at twice the budget
    pub freshness_score: f64,
}

impl FreshnessReport {
    /// Report used when no latest observation can be determined.
    pub fn unknown() -> Self {
        Self {
            is_fresh: false,
            latest_date: None,
            age_hours: None,
            freshness_score: 0.0,
        }
    }
}

/// Duplicate rows under a key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DuplicateReport {
    /// Rows repeating an earlier row (first occurrences excluded)
    pub duplicate_count: u64,
    /// Duplicate rows as a percentage of all rows
    pub duplicate_percentage: f64,
    /// Whether any duplicate was found
    pub has_duplicates: bool,
}

impl DuplicateReport {
    /// Creates duplicate metrics from a count and the table row count.
    pub fn new(duplicate_count: u64, total: u64) -> Self {
        if duplicate_count > total {
            tracing::warn!(
                "Quality metrics anomaly: duplicate_count ({}) exceeds total ({})",
                duplicate_count,
                total
            );
        }

        let duplicate_percentage = if total == 0 {
            0.0
        } else {
            (duplicate_count as f64 / total as f64 * 100.0).clamp(0.0, 100.0)
        };

        Self {
            duplicate_count,
            duplicate_percentage,
            has_duplicates: duplicate_count > 0,
        }
    }
}

/// Quality assessment of one source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceQuality {
    /// Number of rows in the source table
    pub record_count: u64,
    pub completeness: CompletenessReport,
    pub freshness: FreshnessReport,
    pub duplicates: DuplicateReport,
    /// Weighted quality score (0.0-1.0)
    pub quality_score: f64,
    /// Health grade of the quality score
    pub grade: QualityGrade,
}

/// Quality report across all sources of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityReport {
    /// When the report was generated
    pub timestamp: DateTime<Utc>,
    /// Per-source quality, keyed by source name
    pub sources: BTreeMap<String, SourceQuality>,
    /// Mean of per-source quality scores (0.0 with no sources)
    pub overall_score: f64,
    /// Health grade of the overall score
    pub overall_grade: QualityGrade,
}

impl QualityReport {
    /// Builds a report, computing the overall score from the sources.
    pub fn new(timestamp: DateTime<Utc>, sources: BTreeMap<String, SourceQuality>) -> Self {
        let overall_score = if sources.is_empty() {
            0.0
        } else {
            sources.values().map(|s| s.quality_score).sum::<f64>() / sources.len() as f64
        };

        Self {
            timestamp,
            sources,
            overall_score,
            overall_grade: QualityGrade::from_score(overall_score),
        }
    }

    /// Quality of the named source.
    pub fn source(&self, name: &str) -> Option<&SourceQuality> {
        self.sources.get(name)
    }
}
