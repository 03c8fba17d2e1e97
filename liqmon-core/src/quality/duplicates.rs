//! Duplicate analysis for data quality assessment.
//!
//! This module counts rows that repeat an earlier row, either on the whole
//! row or on a key made of selected columns.

use std::collections::HashSet;

use crate::table::{Cell, CellKey, Column, TableView};

use super::models::DuplicateReport;

/// Analyzes duplicate rows of a table.
///
/// A row is a duplicate when its key equals the key of an earlier row; the
/// first occurrence is never counted. With `key_columns` set to `None` the
/// key is the whole row. Key columns absent from the table are ignored, and
/// a key with no column present falls back to the whole row.
///
/// An empty table reports no duplicates.
pub fn check_duplicates(table: &TableView, key_columns: Option<&[String]>) -> DuplicateReport {
    if table.is_empty() {
        return DuplicateReport::default();
    }

    let whole_row = || table.columns().iter().collect::<Vec<_>>();
    let key: Vec<&Column> = match key_columns {
        None => whole_row(),
        Some(names) => {
            let present: Vec<&Column> = names
                .iter()
                .filter_map(|name| {
                    let column = table.column(name);
                    if column.is_none() {
                        tracing::debug!("Duplicate key column '{}' not present, ignoring", name);
                    }
                    column
                })
                .collect();
            if present.is_empty() {
                tracing::warn!("No duplicate key column present, comparing whole rows");
                whole_row()
            } else {
                present
            }
        }
    };

    let total_rows = table.row_count() as u64;
    let duplicate_count = count_duplicate_rows(&key, table.row_count());

    DuplicateReport::new(duplicate_count, total_rows)
}

/// Counts rows whose key cells match an earlier row.
fn count_duplicate_rows(key: &[&Column], row_count: usize) -> u64 {
    let mut seen_rows: HashSet<Vec<CellKey<'_>>> = HashSet::with_capacity(row_count);
    let mut duplicate_count: u64 = 0;

    for index in 0..row_count {
        let row_key: Vec<CellKey<'_>> = key
            .iter()
            .map(|column| CellKey::new(column.cell(index).unwrap_or(Cell::Null)))
            .collect();

        if !seen_rows.insert(row_key) {
            duplicate_count += 1;
        }
    }

    duplicate_count
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quotes() -> TableView {
        TableView::new(vec![
            Column::text(
                "date",
                [
                    Some("2024-01-01"),
                    Some("2024-01-01"),
                    Some("2024-01-02"),
                    Some("2024-01-01"),
                ],
            ),
            Column::text(
                "instrument",
                [Some("EURUSD"), Some("EURUSD"), Some("EURUSD"), Some("EURUSD")],
            ),
            Column::float("close", [Some(1.10), Some(1.10), Some(1.11), Some(1.12)]),
        ])
        .unwrap()
    }

    #[test]
    fn test_duplicates_whole_row() {
        let report = check_duplicates(&quotes(), None);

        assert_eq!(report.duplicate_count, 1);
        assert!((report.duplicate_percentage - 25.0).abs() < 1e-9);
        assert!(report.has_duplicates);
    }

    #[test]
    fn test_duplicates_partial_key() {
        let key = vec!["date".to_string(), "instrument".to_string()];
        let report = check_duplicates(&quotes(), Some(key.as_slice()));

        // Rows 1 and 3 repeat row 0 on (date, instrument)
        assert_eq!(report.duplicate_count, 2);
        assert!((report.duplicate_percentage - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_duplicates_none() {
        let table = TableView::new(vec![Column::integer("id", [Some(1), Some(2), Some(3)])]).unwrap();
        let report = check_duplicates(&table, None);

        assert_eq!(report.duplicate_count, 0);
        assert_eq!(report.duplicate_percentage, 0.0);
        assert!(!report.has_duplicates);
    }

    #[test]
    fn test_duplicates_nulls_compare_equal() {
        let table = TableView::new(vec![
            Column::float("value", [None, None, Some(1.0)]),
            Column::text("date", [None::<&str>, None, None]),
        ])
        .unwrap();

        let report = check_duplicates(&table, None);
        assert_eq!(report.duplicate_count, 1);
    }

    #[test]
    fn test_duplicates_every_repeat_counts() {
        let table = TableView::new(vec![Column::float("value", [Some(4.5); 5])]).unwrap();
        let report = check_duplicates(&table, None);

        assert_eq!(report.duplicate_count, 4);
        assert!((report.duplicate_percentage - 80.0).abs() < 1e-9);
    }

    #[test]
    fn test_duplicates_unknown_key_columns_ignored() {
        let key = vec!["instrument".to_string(), "venue".to_string()];
        let report = check_duplicates(&quotes(), Some(key.as_slice()));

        assert_eq!(report.duplicate_count, 3);
    }

    #[test]
    fn test_duplicates_absent_key_falls_back_to_whole_row() {
        let key = vec!["venue".to_string()];
        let report = check_duplicates(&quotes(), Some(key.as_slice()));

        assert_eq!(report, check_duplicates(&quotes(), None));
        assert_eq!(report.duplicate_count, 1);
    }

    #[test]
    fn test_duplicates_empty_table() {
        let report = check_duplicates(&TableView::empty(), None);
        assert_eq!(report, DuplicateReport::default());
    }
}
