//! Temporal anomaly detection.
//!
//! Two scans over a date-ordered series:
//! - **Gaps**: intervals between consecutive observations longer than
//!   `gap_factor` times the median interval
//! - **Sudden changes**: period-over-period relative changes above a
//!   percentile of all such changes in the series
//!
//! Unlike the outlier scan, any failure (unparseable dates, a non-numeric
//! value column, non-finite values) discards the whole result.

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

use crate::table::{ColumnType, TableError, TableView};

use super::config::AnomalyConfig;
use super::models::{SuddenChange, TemporalAnomalies, TemporalGap};

const SECONDS_PER_DAY: i64 = 86_400;

#[derive(Debug, Error)]
enum TemporalError {
    #[error(transparent)]
    Table(#[from] TableError),
    #[error("value column '{column}' has type {column_type}, expected a numeric column")]
    NonNumericValues {
        column: String,
        column_type: ColumnType,
    },
    #[error("non-finite value {value} at row {row}")]
    NonFinite { row: usize, value: f64 },
}

/// Detects gaps and sudden changes using the configured columns.
///
/// An empty table or an absent date column yields no anomalies. Sudden
/// changes are only computed when the value column exists.
pub fn detect_temporal_anomalies(table: &TableView, config: &AnomalyConfig) -> TemporalAnomalies {
    if table.is_empty() || !table.has_column(&config.date_column) {
        return TemporalAnomalies::empty();
    }

    match scan(table, config) {
        Ok(anomalies) => anomalies,
        Err(e) => {
            tracing::warn!("Temporal anomaly detection failed: {}", e);
            TemporalAnomalies::empty()
        }
    }
}

fn scan(table: &TableView, config: &AnomalyConfig) -> Result<TemporalAnomalies, TemporalError> {
    let dates = match table.column(&config.date_column) {
        Some(column) => column.timestamps()?,
        None => return Ok(TemporalAnomalies::empty()),
    };

    // Stable sort by date, undated rows last in their original order
    let mut order: Vec<usize> = (0..table.row_count()).collect();
    order.sort_by(|&a, &b| match (dates[a], dates[b]) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });

    let sorted_dates: Vec<DateTime<Utc>> = order.iter().filter_map(|&row| dates[row]).collect();
    let gaps = detect_gaps(&sorted_dates, config.gap_factor);

    let sudden_changes = match table.column(&config.value_column) {
        Some(column) => {
            let Some(values) = column.numeric_values() else {
                return Err(TemporalError::NonNumericValues {
                    column: config.value_column.clone(),
                    column_type: column.column_type(),
                });
            };

            let series: Vec<(usize, f64)> = order
                .iter()
                .filter_map(|&row| values[row].map(|v| (row, v)))
                .collect();
            if let Some(&(row, value)) = series.iter().find(|(_, v)| !v.is_finite()) {
                return Err(TemporalError::NonFinite { row, value });
            }

            detect_sudden_changes(&series, config.change_percentile)
        }
        None => Vec::new(),
    };

    Ok(TemporalAnomalies {
        gaps,
        sudden_changes,
    })
}

/// Flags intervals longer than `gap_factor` times the median interval.
///
/// `dates` must be sorted ascending.
fn detect_gaps(dates: &[DateTime<Utc>], gap_factor: f64) -> Vec<TemporalGap> {
    if dates.len() < 2 {
        return Vec::new();
    }

    let deltas: Vec<Duration> = dates.windows(2).map(|pair| pair[1] - pair[0]).collect();
    let seconds: Vec<f64> = deltas.iter().map(duration_seconds).collect();
    let cutoff = gap_factor * median(&seconds);

    seconds
        .iter()
        .enumerate()
        .filter(|(_, delta)| **delta > cutoff)
        .map(|(i, delta)| TemporalGap {
            index: i + 1,
            gap_duration: format_duration(deltas[i]),
            gap_seconds: *delta,
            date_before: dates[i],
            date_after: dates[i + 1],
        })
        .collect()
}

/// Flags relative changes strictly above the `percentile` of all changes.
///
/// Pairs whose earlier value is zero have no relative change and are left
/// out of both the distribution and the result.
fn detect_sudden_changes(series: &[(usize, f64)], percentile: f64) -> Vec<SuddenChange> {
    if series.len() < 2 {
        return Vec::new();
    }

    let changes: Vec<(usize, f64)> = series
        .windows(2)
        .enumerate()
        .filter(|(_, pair)| pair[0].1 != 0.0)
        .map(|(i, pair)| (i + 1, (pair[1].1 / pair[0].1 - 1.0).abs()))
        .collect();
    if changes.is_empty() {
        return Vec::new();
    }

    let mut distribution: Vec<f64> = changes.iter().map(|(_, change)| *change).collect();
    distribution.sort_by(f64::total_cmp);
    let threshold = quantile(&distribution, percentile);

    changes
        .into_iter()
        .filter(|(_, change)| *change > threshold)
        .map(|(position, change)| SuddenChange {
            index: position,
            row: series[position].0,
            percentage_change: change * 100.0,
            value_before: position.checked_sub(1).map(|p| series[p].1),
            value_after: series[position].1,
        })
        .collect()
}

fn duration_seconds(delta: &Duration) -> f64 {
    delta.num_milliseconds() as f64 / 1000.0
}

fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    quantile(&sorted, 0.5)
}

/// Linear-interpolation quantile of an ascending, non-empty slice.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let position = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let weight = position - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * weight
}

/// Renders a non-negative interval as `"<days> days HH:MM:SS[.ffffff]"`.
fn format_duration(delta: Duration) -> String {
    let total = delta.num_seconds();
    let days = total.div_euclid(SECONDS_PER_DAY);
    let rest = total.rem_euclid(SECONDS_PER_DAY);
    let micros = (delta - Duration::seconds(total))
        .num_microseconds()
        .unwrap_or(0);

    let mut rendered = format!(
        "{} days {:02}:{:02}:{:02}",
        days,
        rest / 3600,
        (rest % 3600) / 60,
        rest % 60
    );
    if micros > 0 {
        rendered.push_str(&format!(".{:06}", micros));
    }
    rendered
}
