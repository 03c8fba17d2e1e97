//! Statistical outlier detection.
//!
//! This module flags values whose absolute Z-score exceeds a threshold,
//! column by column. A column that cannot be scanned reports zero outliers
//! without affecting the other columns.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::table::{Column, TableView};

use super::models::ColumnOutliers;

/// Relative spread below which a column is treated as constant.
const ZERO_SPREAD_TOLERANCE: f64 = 1e-10;

/// Errors local to the scan of one column.
#[derive(Debug, Clone, PartialEq, Error)]
enum ScanError {
    #[error("non-finite value {value} at row {row}")]
    NonFinite { row: usize, value: f64 },
}

/// Scans the requested numeric columns for Z-score outliers.
///
/// Columns that are absent or not numeric produce no entry. For the others
/// nulls are dropped, then the sample mean and sample standard deviation
/// (n - 1) are computed; a value is an outlier when
/// `|value - mean| / std_dev > threshold`. Columns with fewer than two values
/// or zero spread report zero outliers.
pub fn detect_statistical_outliers(
    table: &TableView,
    columns: &[&str],
    z_score_threshold: f64,
) -> BTreeMap<String, ColumnOutliers> {
    let mut results = BTreeMap::new();

    for name in columns {
        let Some(column) = table.column(name) else {
            tracing::debug!("Outlier scan skipped: column '{}' not present", name);
            continue;
        };
        if !column.column_type().is_numeric() {
            tracing::debug!(
                "Outlier scan skipped: column '{}' is {}",
                name,
                column.column_type()
            );
            continue;
        }

        let outliers = scan_column(column, z_score_threshold).unwrap_or_else(|e| {
            tracing::warn!("Outlier scan of column '{}' failed: {}", name, e);
            ColumnOutliers::none()
        });
        results.insert((*name).to_string(), outliers);
    }

    results
}

fn scan_column(column: &Column, threshold: f64) -> Result<ColumnOutliers, ScanError> {
    // Caller guarantees a numeric column
    let values: Vec<(usize, f64)> = column
        .numeric_values()
        .unwrap_or_default()
        .into_iter()
        .enumerate()
        .filter_map(|(row, value)| value.map(|v| (row, v)))
        .collect();

    if let Some(&(row, value)) = values.iter().find(|(_, v)| !v.is_finite()) {
        return Err(ScanError::NonFinite { row, value });
    }

    let Some((mean, std_dev)) = calculate_statistics(&values) else {
        return Ok(ColumnOutliers::none());
    };

    let mut outliers = ColumnOutliers {
        mean: Some(mean),
        std_dev: Some(std_dev),
        ..ColumnOutliers::none()
    };

    // Identical values can leave rounding noise in the spread
    if std_dev <= ZERO_SPREAD_TOLERANCE * mean.abs().max(1.0) {
        return Ok(outliers);
    }

    for &(row, value) in &values {
        let z_score = (value - mean).abs() / std_dev;
        if z_score > threshold {
            outliers.outlier_values.push(value);
            outliers.z_scores.push(z_score);
            outliers.indices.push(row);
        }
    }

    outliers.count = outliers.indices.len() as u64;
    outliers.percentage = outliers.count as f64 / values.len() as f64 * 100.0;
    Ok(outliers)
}

/// Calculates mean and sample standard deviation (divides by n - 1).
///
/// Returns `None` with fewer than two values, where the sample standard
/// deviation is undefined.
fn calculate_statistics(values: &[(usize, f64)]) -> Option<(f64, f64)> {
    if values.len() < 2 {
        return None;
    }

    let n = values.len() as f64;
    let mean = values.iter().map(|(_, v)| v).sum::<f64>() / n;
    let variance = values.iter().map(|(_, v)| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);

    Some((mean, variance.sqrt()))
}
