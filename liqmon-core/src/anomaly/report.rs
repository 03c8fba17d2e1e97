//! Anomaly report assembly.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::sources::Sources;
use crate::table::TableView;

use super::config::AnomalyConfig;
use super::models::{AnomalyReport, SourceAnomalies};
use super::outliers::detect_statistical_outliers;
use super::rules::RuleSet;
use super::temporal::detect_temporal_anomalies;

/// Builds anomaly reports from a set of sources.
///
/// Business rules are compiled once when the builder is created; a malformed
/// definition shows up as an error marker in every analyzed source that has
/// the column it names.
///
/// # Example
///
/// ```rust,ignore
/// use liqmon_core::anomaly::{AnomalyConfig, AnomalyReportBuilder};
///
/// let builder = AnomalyReportBuilder::new(AnomalyConfig::default());
/// let report = builder.build(&sources);
/// println!("{} outliers", report.total_outliers());
/// ```
#[derive(Debug, Clone)]
pub struct AnomalyReportBuilder {
    config: AnomalyConfig,
    rules: RuleSet,
}

impl Default for AnomalyReportBuilder {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl AnomalyReportBuilder {
    /// Creates a builder with the given configuration.
    pub fn new(config: AnomalyConfig) -> Self {
        let rules = RuleSet::compile(&config.rules);
        Self { config, rules }
    }

    /// Creates a builder with default configuration and the default rules.
    pub fn with_defaults() -> Self {
        Self::new(AnomalyConfig::default())
    }

    /// Returns a reference to the builder configuration.
    pub fn config(&self) -> &AnomalyConfig {
        &self.config
    }

    /// Returns the compiled rule set.
    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Runs every detector over one table.
    pub fn analyze_source(&self, table: &TableView) -> SourceAnomalies {
        let numeric_columns = table.numeric_columns();

        SourceAnomalies {
            statistical_outliers: detect_statistical_outliers(
                table,
                &numeric_columns,
                self.config.z_score_threshold,
            ),
            temporal_anomalies: detect_temporal_anomalies(table, &self.config),
            business_rule_violations: self.rules.evaluate(table),
        }
    }

    /// Builds a report stamped with the current time.
    pub fn build(&self, sources: &Sources) -> AnomalyReport {
        self.build_at(sources, Utc::now())
    }

    /// Builds a report stamped with `timestamp`.
    ///
    /// Sources with no rows are left out of the report.
    pub fn build_at(&self, sources: &Sources, timestamp: DateTime<Utc>) -> AnomalyReport {
        let mut analyzed = BTreeMap::new();

        for (name, table) in sources {
            if table.is_empty() {
                tracing::debug!("Anomaly scan skipped: source '{}' is empty", name);
                continue;
            }

            let findings = self.analyze_source(table);
            tracing::debug!(
                "Source '{}': {} outlier(s), {} gap(s), {} sudden change(s)",
                name,
                findings.total_outliers(),
                findings.gap_count(),
                findings.sudden_change_count()
            );
            analyzed.insert(name.clone(), findings);
        }

        let report = AnomalyReport {
            timestamp,
            sources: analyzed,
        };
        tracing::info!(
            "Anomaly report generated for {} source(s), {} outlier(s) in total",
            report.sources.len(),
            report.total_outliers()
        );
        report
    }
}
