//! Freshness analysis for data quality assessment.
//!
//! Freshness scores how recent the latest observation of a table is relative
//! to a staleness budget.

use chrono::{DateTime, Utc};

use crate::table::TableView;

use super::models::FreshnessReport;

const MILLIS_PER_HOUR: f64 = 3_600_000.0;

/// Analyzes freshness of a table against the current time.
///
/// See [`check_freshness_at`].
pub fn check_freshness(
    table: &TableView,
    timestamp_column: &str,
    max_age_hours: f64,
) -> FreshnessReport {
    check_freshness_at(table, timestamp_column, max_age_hours, Utc::now())
}

/// Analyzes freshness of a table relative to `now`.
///
/// The score decays linearly from 1.0 for an observation taken at `now` to
/// 0.0 at twice the budget, so a source can be fresh while scoring below 1.0.
/// Observations dated after `now` score 1.0.
///
/// An empty table, an absent column, an all-null column, or any timestamp
/// that fails to parse yields [`FreshnessReport::unknown`].
pub fn check_freshness_at(
    table: &TableView,
    timestamp_column: &str,
    max_age_hours: f64,
    now: DateTime<Utc>,
) -> FreshnessReport {
    if table.is_empty() {
        return FreshnessReport::unknown();
    }

    let Some(column) = table.column(timestamp_column) else {
        tracing::debug!("Freshness skipped: column '{}' not present", timestamp_column);
        return FreshnessReport::unknown();
    };

    let timestamps = match column.timestamps() {
        Ok(timestamps) => timestamps,
        Err(e) => {
            tracing::warn!("Freshness check could not read timestamps: {}", e);
            return FreshnessReport::unknown();
        }
    };

    let Some(latest_date) = timestamps.into_iter().flatten().max() else {
        return FreshnessReport::unknown();
    };

    let age_hours = (now - latest_date).num_milliseconds() as f64 / MILLIS_PER_HOUR;
    let horizon = max_age_hours * 2.0;
    let freshness_score = if horizon > 0.0 {
        (1.0 - age_hours / horizon).clamp(0.0, 1.0)
    } else {
        0.0
    };

    FreshnessReport {
        is_fresh: age_hours <= max_age_hours,
        latest_date: Some(latest_date),
        age_hours: Some(age_hours),
        freshness_score,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Column;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 10, 12, 0, 0).unwrap()
    }

    fn table_with_dates(dates: &[Option<&str>]) -> TableView {
        TableView::new(vec![Column::text("date", dates.iter().copied())]).unwrap()
    }

    #[test]
    fn test_freshness_recent_data() {
        // Latest observation 6 hours old against a 24h budget
        let table = table_with_dates(&[Some("2024-06-09T00:00:00"), Some("2024-06-10T06:00:00")]);

        let report = check_freshness_at(&table, "date", 24.0, now());

        assert!(report.is_fresh);
        assert_eq!(
            report.latest_date,
            Some(Utc.with_ymd_and_hms(2024, 6, 10, 6, 0, 0).unwrap())
        );
        assert!((report.age_hours.unwrap() - 6.0).abs() < 1e-9);
        assert!((report.freshness_score - 0.875).abs() < 1e-9);
    }

    #[test]
    fn test_freshness_fresh_but_below_one() {
        // Exactly at the budget: still fresh, half score
        let table = table_with_dates(&[Some("2024-06-09T12:00:00")]);

        let report = check_freshness_at(&table, "date", 24.0, now());

        assert!(report.is_fresh);
        assert!((report.freshness_score - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_freshness_stale_data() {
        // 36 hours old: stale, score 0.25
        let table = table_with_dates(&[Some("2024-06-09T00:00:00")]);

        let report = check_freshness_at(&table, "date", 24.0, now());

        assert!(!report.is_fresh);
        assert!((report.age_hours.unwrap() - 36.0).abs() < 1e-9);
        assert!((report.freshness_score - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_freshness_score_floors_at_zero() {
        let table = table_with_dates(&[Some("2024-01-01")]);
        let report = check_freshness_at(&table, "date", 24.0, now());

        assert!(!report.is_fresh);
        assert_eq!(report.freshness_score, 0.0);
        assert!(report.latest_date.is_some());
    }

    #[test]
    fn test_freshness_future_dates_cap_at_one() {
        let table = table_with_dates(&[Some("2024-06-11T12:00:00")]);
        let report = check_freshness_at(&table, "date", 24.0, now());

        assert!(report.is_fresh);
        assert_eq!(report.freshness_score, 1.0);
    }

    #[test]
    fn test_freshness_native_timestamps() {
        let latest = now() - Duration::hours(12);
        let table = TableView::new(vec![Column::timestamp(
            "as_of",
            [Some(latest - Duration::days(1)), None, Some(latest)],
        )])
        .unwrap();

        let report = check_freshness_at(&table, "as_of", 24.0, now());

        assert_eq!(report.latest_date, Some(latest));
        assert!((report.freshness_score - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_freshness_empty_table() {
        let report = check_freshness_at(&TableView::empty(), "date", 24.0, now());
        assert_eq!(report, FreshnessReport::unknown());
    }

    #[test]
    fn test_freshness_missing_column() {
        let table = table_with_dates(&[Some("2024-06-10")]);
        let report = check_freshness_at(&table, "timestamp", 24.0, now());
        assert_eq!(report, FreshnessReport::unknown());
    }

    #[test]
    fn test_freshness_unparseable_dates() {
        let table = table_with_dates(&[Some("2024-06-10"), Some("last tuesday")]);
        let report = check_freshness_at(&table, "date", 24.0, now());
        assert_eq!(report, FreshnessReport::unknown());
    }

    #[test]
    fn test_freshness_all_null_dates() {
        let table = table_with_dates(&[None, None]);
        let report = check_freshness_at(&table, "date", 24.0, now());
        assert_eq!(report, FreshnessReport::unknown());
    }
}
