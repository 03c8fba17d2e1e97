//! Data quality assessment module.
//!
//! This module scores every source of a run on three metrics:
//! - **Completeness**: null cells and required columns absent from the table
//! - **Freshness**: age of the latest observation against a staleness budget
//! - **Duplicates**: rows repeating an earlier row under a key
//!
//! The `QualityScorer` combines them into a weighted per-source score and a
//! mean across sources. Empty tables never raise: each check returns its
//! documented empty defaults.
//!
//! # Example
//! ```rust,ignore
//! use liqmon_core::quality::{QualityConfig, QualityScorer};
//!
//! let scorer = QualityScorer::new(QualityConfig::default());
//! let report = scorer.generate_report(&sources);
//! for (name, quality) in &report.sources {
//!     println!("{name}: {:.2} ({})", quality.quality_score, quality.grade);
//! }
//! ```

mod completeness;
mod config;
mod duplicates;
mod freshness;
mod models;
mod scorer;

// Re-export public API
pub use completeness::check_completeness;
pub use config::{QualityConfig, RequiredColumns, ScoreWeights};
pub use duplicates::check_duplicates;
pub use freshness::{check_freshness, check_freshness_at};
pub use models::{
    ColumnMissing, CompletenessReport, DuplicateReport, FreshnessReport, QualityGrade,
    QualityReport, SourceQuality,
};
pub use scorer::QualityScorer;
