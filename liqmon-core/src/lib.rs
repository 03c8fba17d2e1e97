//! Core data structures and engines for liqmon.
//!
//! This crate turns named tables of liquidity observations (interest rates,
//! market quotes) into two reports:
//! - a [`QualityReport`] scoring each source on completeness, freshness and
//!   duplicates
//! - an [`AnomalyReport`] listing statistical outliers, temporal gaps, sudden
//!   changes and business rule violations
//!
//! # Guarantees
//! - Report generation is synchronous and performs no I/O
//! - Empty tables, unparseable values and malformed rules degrade to
//!   documented defaults instead of errors
//! - Output ordering is deterministic: sources, columns and rules are keyed
//!   by name
//!
//! # Example
//! ```rust,ignore
//! use liqmon_core::{AnomalyReportBuilder, MonitorConfig, QualityScorer, parse_sources};
//!
//! let sources = parse_sources(&std::fs::read_to_string("sources.json")?)?;
//! let config = MonitorConfig::default();
//!
//! let quality = QualityScorer::new(config.quality).generate_report(&sources);
//! let anomalies = AnomalyReportBuilder::new(config.anomaly).build(&sources);
//! ```

pub mod anomaly;
pub mod config;
pub mod error;
pub mod logging;
pub mod quality;
pub mod sources;
pub mod table;

// Re-export commonly used types
pub use anomaly::{AnomalyConfig, AnomalyReport, AnomalyReportBuilder, AnomalySensitivity};
pub use config::{ConfigValidationError, MonitorConfig};
pub use error::{LiqmonError, Result};
pub use quality::{QualityConfig, QualityGrade, QualityReport, QualityScorer};
pub use sources::{Sources, parse_sources};
pub use table::{Column, ColumnType, TableError, TableView};
