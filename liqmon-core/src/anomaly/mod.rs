//! Anomaly detection module.
//!
//! Three independent detectors run over every non-empty source:
//! - **Statistical outliers**: per-column Z-score scan of numeric columns
//! - **Temporal anomalies**: gaps in the observation dates and sudden
//!   period-over-period changes in the value series
//! - **Business rules**: declarative range and not-null checks
//!
//! The `AnomalyReportBuilder` merges their findings per source. Each detector
//! has its own failure contract: the outlier scan isolates failures per
//! column, the temporal scan discards its whole result, and rules fail one
//! at a time.
//!
//! # Example
//! ```rust,ignore
//! use liqmon_core::anomaly::{AnomalyConfig, AnomalyReportBuilder, AnomalySensitivity};
//!
//! let config = AnomalyConfig::new().with_sensitivity(AnomalySensitivity::Medium);
//! let report = AnomalyReportBuilder::new(config).build(&sources);
//! for (name, findings) in &report.sources {
//!     println!("{name}: {} gaps", findings.gap_count());
//! }
//! ```

mod config;
mod models;
mod outliers;
mod report;
mod rules;
mod temporal;

// Re-export public API
pub use config::{AnomalyConfig, AnomalySensitivity};
pub use models::{
    AnomalyReport, ColumnOutliers, Outlier, RuleOutcome, SourceAnomalies, SuddenChange,
    TemporalAnomalies, TemporalGap,
};
pub use outliers::detect_statistical_outliers;
pub use report::AnomalyReportBuilder;
pub use rules::{BusinessRule, RuleDefinition, RuleError, RuleSet, default_rule_definitions};
pub use temporal::detect_temporal_anomalies;
