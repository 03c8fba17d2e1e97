//! Quality scorer facade.
//!
//! This module provides the `QualityScorer` that runs the completeness,
//! freshness and duplicate checks for every source and combines them into a
//! weighted score.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::sources::Sources;
use crate::table::TableView;

use super::completeness::check_completeness;
use super::config::QualityConfig;
use super::duplicates::check_duplicates;
use super::freshness::check_freshness_at;
use super::models::{QualityGrade, QualityReport, SourceQuality};

/// Quality scorer for a set of data sources.
///
/// # Example
///
/// ```rust,ignore
/// use liqmon_core::quality::{QualityConfig, QualityScorer};
///
/// let scorer = QualityScorer::new(QualityConfig::default());
/// let report = scorer.generate_report(&sources);
/// println!("Overall quality: {:.2}%", report.overall_score * 100.0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct QualityScorer {
    config: QualityConfig,
}

impl QualityScorer {
    /// Creates a new quality scorer with the given configuration.
    pub fn new(config: QualityConfig) -> Self {
        Self { config }
    }

    /// Creates a new quality scorer with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(QualityConfig::default())
    }

    /// Returns a reference to the scorer configuration.
    pub fn config(&self) -> &QualityConfig {
        &self.config
    }

    /// Scores a single source against the current time.
    pub fn score_source(&self, source_name: &str, table: &TableView) -> SourceQuality {
        self.score_source_at(source_name, table, Utc::now())
    }

    /// Scores a single source relative to `now`.
    ///
    /// An empty table scores 0.0 while its sub-reports carry their empty
    /// defaults. No schema is resolved for it, so it lists no missing
    /// columns.
    pub fn score_source_at(
        &self,
        source_name: &str,
        table: &TableView,
        now: DateTime<Utc>,
    ) -> SourceQuality {
        let required = if table.is_empty() {
            Vec::new()
        } else {
            self.config.required_columns.resolve(source_name, table)
        };

        let completeness = check_completeness(table, &required);
        let freshness = check_freshness_at(
            table,
            &self.config.timestamp_column,
            self.config.freshness_budget_hours,
            now,
        );
        let duplicates = check_duplicates(table, self.config.duplicate_key.as_deref());

        let quality_score = if table.is_empty() {
            0.0
        } else {
            self.calculate_quality_score(
                completeness.completeness_score,
                freshness.freshness_score,
                duplicates.duplicate_percentage,
            )
        };

        tracing::debug!(
            "Source '{}' scored {:.3} (completeness {:.3}, freshness {:.3}, duplicates {:.1}%)",
            source_name,
            quality_score,
            completeness.completeness_score,
            freshness.freshness_score,
            duplicates.duplicate_percentage
        );

        SourceQuality {
            record_count: table.row_count() as u64,
            completeness,
            freshness,
            duplicates,
            quality_score,
            grade: QualityGrade::from_score(quality_score),
        }
    }

    /// Generates a quality report for every source against the current time.
    pub fn generate_report(&self, sources: &Sources) -> QualityReport {
        self.generate_report_at(sources, Utc::now())
    }

    /// Generates a quality report for every source relative to `now`.
    ///
    /// Empty sources are included with a score of 0.0 and pull the overall
    /// score down.
    pub fn generate_report_at(&self, sources: &Sources, now: DateTime<Utc>) -> QualityReport {
        let scored: BTreeMap<String, SourceQuality> = sources
            .iter()
            .map(|(name, table)| (name.clone(), self.score_source_at(name, table, now)))
            .collect();

        let report = QualityReport::new(now, scored);
        tracing::info!(
            "Quality report generated for {} source(s), overall score {:.3} ({})",
            report.sources.len(),
            report.overall_score,
            report.overall_grade
        );
        report
    }

    /// Weighted combination of the three metrics.
    ///
    /// The duplicate metric enters as its complement so every term rewards
    /// cleaner data.
    fn calculate_quality_score(
        &self,
        completeness: f64,
        freshness: f64,
        duplicate_percentage: f64,
    ) -> f64 {
        let weights = &self.config.weights;
        let uniqueness = 1.0 - duplicate_percentage / 100.0;

        let score = weights.completeness * completeness
            + weights.freshness * freshness
            + weights.duplicates * uniqueness;
        score.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quality::config::{RequiredColumns, ScoreWeights};
    use crate::table::Column;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 10, 12, 0, 0).unwrap()
    }

    fn ecb_table() -> TableView {
        TableView::new(vec![
            Column::text("date", [Some("2024-06-09T06:00:00"), Some("2024-06-10T06:00:00")]),
            Column::text("rate_type", [Some("MRO"), Some("MRO")]),
            Column::float("value", [Some(4.50), Some(4.25)]),
        ])
        .unwrap()
    }

    fn market_table() -> TableView {
        TableView::new(vec![
            Column::text(
                "date",
                [
                    Some("2024-06-06"),
                    Some("2024-06-07"),
                    Some("2024-06-08"),
                    Some("2024-06-09"),
                ],
            ),
            Column::text(
                "instrument",
                [Some("EURUSD"), Some("EURUSD"), Some("EURUSD"), Some("EURUSD")],
            ),
            Column::float("close", [Some(1.08), None, Some(1.09), Some(1.07)]),
        ])
        .unwrap()
    }

    fn fred_table() -> TableView {
        TableView::new(vec![
            Column::text(
                "date",
                [
                    Some("2024-06-09"),
                    Some("2024-06-09"),
                    Some("2024-06-09T12:00:00"),
                    Some("2024-06-10"),
                ],
            ),
            Column::float("value", [Some(5.33), Some(5.33), Some(5.31), Some(5.32)]),
        ])
        .unwrap()
    }

    #[test]
    fn test_scorer_creation() {
        let config = QualityConfig::new().with_freshness_budget_hours(12.0);
        let scorer = QualityScorer::new(config.clone());
        assert_eq!(scorer.config(), &config);

        let scorer = QualityScorer::with_defaults();
        assert_eq!(scorer.config().freshness_budget_hours, 24.0);
    }

    #[test]
    fn test_score_source_clean_recent_data() {
        let quality = QualityScorer::with_defaults().score_source_at("ecb_data", &ecb_table(), now());

        // 0.4 * 1.0 + 0.4 * 0.875 + 0.2 * 1.0
        assert_eq!(quality.record_count, 2);
        assert!((quality.quality_score - 0.95).abs() < 1e-9);
        assert_eq!(quality.grade, QualityGrade::Good);
        assert!(quality.completeness.missing_columns.is_empty());
    }

    #[test]
    fn test_score_source_reports_inferred_missing_columns() {
        let table = TableView::new(vec![
            Column::text("date", [Some("2024-06-10")]),
            Column::float("value", [Some(4.5)]),
        ])
        .unwrap();

        let quality = QualityScorer::with_defaults().score_source_at("ecb_data", &table, now());
        assert_eq!(quality.completeness.missing_columns, vec!["rate_type"]);
        assert_eq!(quality.completeness.completeness_score, 1.0);
    }

    #[test]
    fn test_score_source_empty_table() {
        let quality =
            QualityScorer::with_defaults().score_source_at("ecb_data", &TableView::empty(), now());

        assert_eq!(quality.record_count, 0);
        assert_eq!(quality.quality_score, 0.0);
        assert_eq!(quality.grade, QualityGrade::Critical);
        assert_eq!(quality.completeness.completeness_score, 0.0);
        assert!(quality.completeness.missing_columns.is_empty());
        assert_eq!(quality.completeness.total_missing_percentage, 100.0);
        assert!(!quality.freshness.is_fresh);
        assert!(!quality.duplicates.has_duplicates);
    }

    #[test]
    fn test_generate_report_overall_is_mean_of_sources() {
        let mut sources = Sources::new();
        sources.insert("ecb_data".to_string(), ecb_table());
        sources.insert("market_data".to_string(), market_table());
        sources.insert("fred".to_string(), fred_table());

        let report = QualityScorer::with_defaults().generate_report_at(&sources, now());

        // ecb: 0.4 * 1.0 + 0.4 * 0.875 + 0.2 * 1.0
        let ecb = 0.95;
        // market: one null in 12 cells, latest 36h old
        let market = 0.4 * (11.0 / 12.0) + 0.4 * 0.25 + 0.2 * 1.0;
        // fred: one repeated row in 4, latest 12h old
        let fred = 0.4 * 1.0 + 0.4 * 0.75 + 0.2 * 0.75;

        assert!((report.sources["ecb_data"].quality_score - ecb).abs() < 1e-9);
        assert!((report.sources["market_data"].quality_score - market).abs() < 1e-9);
        assert!((report.sources["fred"].quality_score - fred).abs() < 1e-9);
        assert!((report.overall_score - (ecb + market + fred) / 3.0).abs() < 1e-9);
        assert_eq!(report.timestamp, now());
    }

    #[test]
    fn test_generate_report_includes_empty_source() {
        let mut sources = Sources::new();
        sources.insert("ecb_data".to_string(), ecb_table());
        sources.insert("empty".to_string(), TableView::empty());

        let report = QualityScorer::with_defaults().generate_report_at(&sources, now());

        assert_eq!(report.sources.len(), 2);
        assert_eq!(report.sources["empty"].quality_score, 0.0);
        assert!((report.overall_score - 0.475).abs() < 1e-9);
    }

    #[test]
    fn test_generate_report_no_sources() {
        let report = QualityScorer::with_defaults().generate_report_at(&Sources::new(), now());
        assert!(report.sources.is_empty());
        assert_eq!(report.overall_score, 0.0);
    }

    #[test]
    fn test_custom_weights_and_duplicate_key() {
        let config = QualityConfig::new()
            .with_weights(ScoreWeights::new(0.0, 0.0, 1.0))
            .with_duplicate_key(["date"])
            .with_required_columns(RequiredColumns::new().with_infer_from_name(false));
        let scorer = QualityScorer::new(config);

        let quality = scorer.score_source_at("fred", &fred_table(), now());

        // Only the repeated 2024-06-09 date counts under the date key
        assert_eq!(quality.duplicates.duplicate_count, 1);
        assert!((quality.quality_score - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_quality_score_calculation() {
        let scorer = QualityScorer::with_defaults();

        let score = scorer.calculate_quality_score(1.0, 1.0, 0.0);
        assert!((score - 1.0).abs() < 1e-9);

        let score = scorer.calculate_quality_score(0.5, 0.5, 50.0);
        assert!((score - 0.5).abs() < 1e-9);

        let score = scorer.calculate_quality_score(0.0, 0.0, 100.0);
        assert_eq!(score, 0.0);
    }
}
