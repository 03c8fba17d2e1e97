//! Completeness analysis for data quality assessment.
//!
//! This module measures null cells across a table and reports required
//! columns that are absent from it.

use std::collections::BTreeMap;

use crate::table::TableView;

use super::models::{ColumnMissing, CompletenessReport};

/// Analyzes completeness of a table against a required-column schema.
///
/// The score counts null cells across every present column:
/// `1 - total_nulls / (rows * columns)`. Required columns that are absent are
/// listed in `missing_columns` but do not lower the score.
///
/// An empty table scores 0.0 with every required column reported missing.
pub fn check_completeness(table: &TableView, required_columns: &[String]) -> CompletenessReport {
    if table.is_empty() {
        return CompletenessReport::empty(required_columns);
    }

    let missing_columns: Vec<String> = required_columns
        .iter()
        .filter(|name| !table.has_column(name))
        .cloned()
        .collect();

    let total_rows = table.row_count() as u64;
    let total_values = total_rows.saturating_mul(table.column_count() as u64);
    let mut total_missing: u64 = 0;
    let mut missing_values_by_column = BTreeMap::new();

    for column in table.columns() {
        let null_count = column.null_count() as u64;
        total_missing = total_missing.saturating_add(null_count);
        missing_values_by_column.insert(
            column.name().to_string(),
            ColumnMissing::new(null_count, total_rows),
        );
    }

    let missing_ratio = if total_values == 0 {
        0.0
    } else {
        total_missing as f64 / total_values as f64
    };

    CompletenessReport {
        completeness_score: (1.0 - missing_ratio).clamp(0.0, 1.0),
        missing_columns,
        missing_values_by_column,
        total_missing_percentage: missing_ratio * 100.0,
    }
}
