//! Command implementations: load inputs, build reports, write JSON.

use std::path::Path;

use anyhow::{Context, Result};
use liqmon_core::{
    AnomalyReport, AnomalyReportBuilder, LiqmonError, MonitorConfig, QualityReport, QualityScorer,
    Sources, parse_sources,
};
use serde::Serialize;
use tracing::{info, warn};

/// Both reports of a run, written by the `report` command.
#[derive(Debug, Serialize)]
pub struct CombinedReport<'a> {
    pub quality: &'a QualityReport,
    pub anomalies: &'a AnomalyReport,
}

/// Loads the monitor configuration, or the defaults when no path is given.
pub fn load_config(path: Option<&Path>) -> Result<MonitorConfig> {
    let Some(path) = path else {
        return Ok(MonitorConfig::default());
    };

    let raw = std::fs::read_to_string(path)
        .map_err(|e| LiqmonError::io(format!("Failed to read {}", path.display()), e))?;
    let config = MonitorConfig::from_json_str(&raw)
        .with_context(|| format!("Invalid configuration in {}", path.display()))?;

    info!("Loaded configuration from {}", path.display());
    Ok(config)
}

/// Loads the sources document.
pub fn load_sources(path: &Path) -> Result<Sources> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| LiqmonError::io(format!("Failed to read {}", path.display()), e))?;
    let sources =
        parse_sources(&raw).with_context(|| format!("Invalid sources in {}", path.display()))?;

    info!("Loaded {} source(s) from {}", sources.len(), path.display());
    Ok(sources)
}

/// Serializes a report as pretty JSON to a file, or to stdout.
pub fn write_output<T: Serialize>(report: &T, output: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(report)
        .map_err(|e| LiqmonError::serialization("Failed to serialize report", e))?;

    match output {
        Some(path) => {
            std::fs::write(path, json)
                .map_err(|e| LiqmonError::io(format!("Failed to write to {}", path.display()), e))?;
            info!("Report written to {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

/// Builds the quality report.
pub fn quality(config: &MonitorConfig, input: &Path, output: Option<&Path>) -> Result<()> {
    let sources = load_sources(input)?;
    let report = QualityScorer::new(config.quality.clone()).generate_report(&sources);

    log_quality_summary(&report);
    write_output(&report, output)
}

/// Builds the anomaly report.
pub fn anomalies(config: &MonitorConfig, input: &Path, output: Option<&Path>) -> Result<()> {
    let sources = load_sources(input)?;
    let report = AnomalyReportBuilder::new(config.anomaly.clone()).build(&sources);

    log_anomaly_summary(&report);
    write_output(&report, output)
}

/// Builds both reports into one document.
pub fn report(config: &MonitorConfig, input: &Path, output: Option<&Path>) -> Result<()> {
    let sources = load_sources(input)?;
    let quality = QualityScorer::new(config.quality.clone()).generate_report(&sources);
    let anomalies = AnomalyReportBuilder::new(config.anomaly.clone()).build(&sources);

    log_quality_summary(&quality);
    log_anomaly_summary(&anomalies);
    write_output(
        &CombinedReport {
            quality: &quality,
            anomalies: &anomalies,
        },
        output,
    )
}

fn log_quality_summary(report: &QualityReport) {
    for (name, source) in &report.sources {
        info!(
            "{}: {} record(s), quality {:.1}% ({})",
            name,
            source.record_count,
            source.quality_score * 100.0,
            source.grade
        );
        if !source.completeness.missing_columns.is_empty() {
            warn!(
                "{}: missing required column(s): {}",
                name,
                source.completeness.missing_columns.join(", ")
            );
        }
    }
    info!(
        "Overall quality {:.1}% ({})",
        report.overall_score * 100.0,
        report.overall_grade
    );
}

fn log_anomaly_summary(report: &AnomalyReport) {
    for (name, source) in &report.sources {
        info!(
            "{}: {} outlier(s), {} gap(s), {} sudden change(s)",
            name,
            source.total_outliers(),
            source.gap_count(),
            source.sudden_change_count()
        );
        let rule_errors = source.rule_error_count();
        if rule_errors > 0 {
            warn!("{}: {} business rule(s) could not be evaluated", name, rule_errors);
        }
    }
}
