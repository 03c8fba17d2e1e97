//! Column-typed tabular data shared by every quality and anomaly check.
//!
//! A [`TableView`] stores one typed array per column. The type of each column
//! is fixed when the table is built, so checks never have to guess whether a
//! cell is a number, a string, or a timestamp. Tables are immutable once
//! constructed and an empty table (zero rows) is always valid.

use std::collections::HashSet;
use std::hash::{Hash, Hasher};

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Errors raised while building or reading a table.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TableError {
    #[error("column '{column}' has {actual} values, expected {expected}")]
    LengthMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },

    #[error("column '{column}' is defined more than once")]
    DuplicateColumn { column: String },

    #[error("row {row} is not a JSON object")]
    NotAnObject { row: usize },

    #[error("column '{column}' holds a nested value at row {row}")]
    UnsupportedValue { column: String, row: usize },

    #[error("column '{column}' has type {column_type} and cannot hold timestamps")]
    NotTemporal {
        column: String,
        column_type: ColumnType,
    },

    #[error("column '{column}' has an unparseable timestamp '{value}' at row {row}")]
    TimestampParse {
        column: String,
        row: usize,
        value: String,
    },
}

/// Declared type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Integer,
    Float,
    Text,
    Timestamp,
    Boolean,
}

impl ColumnType {
    /// Returns true for integer and float columns.
    pub fn is_numeric(&self) -> bool {
        matches!(self, ColumnType::Integer | ColumnType::Float)
    }
}

impl std::fmt::Display for ColumnType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ColumnType::Integer => write!(f, "integer"),
            ColumnType::Float => write!(f, "float"),
            ColumnType::Text => write!(f, "text"),
            ColumnType::Timestamp => write!(f, "timestamp"),
            ColumnType::Boolean => write!(f, "boolean"),
        }
    }
}

/// Typed storage for one column. `None` is a null cell.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Integer(Vec<Option<i64>>),
    Float(Vec<Option<f64>>),
    Text(Vec<Option<String>>),
    Timestamp(Vec<Option<DateTime<Utc>>>),
    Boolean(Vec<Option<bool>>),
}

impl ColumnData {
    /// Number of cells, nulls included.
    pub fn len(&self) -> usize {
        match self {
            ColumnData::Integer(v) => v.len(),
            ColumnData::Float(v) => v.len(),
            ColumnData::Text(v) => v.len(),
            ColumnData::Timestamp(v) => v.len(),
            ColumnData::Boolean(v) => v.len(),
        }
    }

    /// Returns true when the column has no cells.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Declared type of the stored values.
    pub fn column_type(&self) -> ColumnType {
        match self {
            ColumnData::Integer(_) => ColumnType::Integer,
            ColumnData::Float(_) => ColumnType::Float,
            ColumnData::Text(_) => ColumnType::Text,
            ColumnData::Timestamp(_) => ColumnType::Timestamp,
            ColumnData::Boolean(_) => ColumnType::Boolean,
        }
    }

    fn cell(&self, index: usize) -> Option<Cell<'_>> {
        let cell = match self {
            ColumnData::Integer(v) => v.get(index)?.map_or(Cell::Null, Cell::Integer),
            ColumnData::Float(v) => v.get(index)?.map_or(Cell::Null, Cell::Float),
            ColumnData::Text(v) => v
                .get(index)?
                .as_deref()
                .map_or(Cell::Null, Cell::Text),
            ColumnData::Timestamp(v) => v.get(index)?.map_or(Cell::Null, Cell::Timestamp),
            ColumnData::Boolean(v) => v.get(index)?.map_or(Cell::Null, Cell::Boolean),
        };
        Some(cell)
    }

    fn null_count(&self) -> usize {
        match self {
            ColumnData::Integer(v) => v.iter().filter(|c| c.is_none()).count(),
            ColumnData::Float(v) => v.iter().filter(|c| c.is_none()).count(),
            ColumnData::Text(v) => v.iter().filter(|c| c.is_none()).count(),
            ColumnData::Timestamp(v) => v.iter().filter(|c| c.is_none()).count(),
            ColumnData::Boolean(v) => v.iter().filter(|c| c.is_none()).count(),
        }
    }
}

/// A borrowed view of a single cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Cell<'a> {
    Null,
    Integer(i64),
    Float(f64),
    Text(&'a str),
    Timestamp(DateTime<Utc>),
    Boolean(bool),
}

impl Cell<'_> {
    /// Returns true for null cells.
    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }

    /// Numeric value of integer and float cells.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Integer(i) => Some(*i as f64),
            Cell::Float(f) => Some(*f),
            _ => None,
        }
    }
}

/// Hashable identity of a cell, used for duplicate detection.
///
/// Floats compare by bit pattern after folding `-0.0` into `0.0` and all NaN
/// payloads into one, so that repeated rows with identical printed values
/// always collide.
#[derive(Debug, Clone, Copy)]
pub(crate) struct CellKey<'a>(Cell<'a>);

impl<'a> CellKey<'a> {
    pub(crate) fn new(cell: Cell<'a>) -> Self {
        Self(cell)
    }

    fn float_bits(value: f64) -> u64 {
        if value.is_nan() {
            f64::NAN.to_bits()
        } else if value == 0.0 {
            0.0f64.to_bits()
        } else {
            value.to_bits()
        }
    }
}

impl PartialEq for CellKey<'_> {
    fn eq(&self, other: &Self) -> bool {
        match (self.0, other.0) {
            (Cell::Float(a), Cell::Float(b)) => Self::float_bits(a) == Self::float_bits(b),
            (a, b) => a == b,
        }
    }
}

impl Eq for CellKey<'_> {}

impl Hash for CellKey<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(&self.0).hash(state);
        match self.0 {
            Cell::Null => {}
            Cell::Integer(i) => i.hash(state),
            Cell::Float(f) => Self::float_bits(f).hash(state),
            Cell::Text(s) => s.hash(state),
            Cell::Timestamp(t) => t.hash(state),
            Cell::Boolean(b) => b.hash(state),
        }
    }
}

/// A named, typed column.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    data: ColumnData,
}

impl Column {
    /// Creates a column from typed data.
    pub fn new(name: impl Into<String>, data: ColumnData) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }

    /// Creates an integer column.
    pub fn integer(name: impl Into<String>, values: impl IntoIterator<Item = Option<i64>>) -> Self {
        Self::new(name, ColumnData::Integer(values.into_iter().collect()))
    }

    /// Creates a float column.
    pub fn float(name: impl Into<String>, values: impl IntoIterator<Item = Option<f64>>) -> Self {
        Self::new(name, ColumnData::Float(values.into_iter().collect()))
    }

    /// Creates a text column.
    pub fn text<S: Into<String>>(
        name: impl Into<String>,
        values: impl IntoIterator<Item = Option<S>>,
    ) -> Self {
        Self::new(
            name,
            ColumnData::Text(values.into_iter().map(|v| v.map(Into::into)).collect()),
        )
    }

    /// Creates a timestamp column.
    pub fn timestamp(
        name: impl Into<String>,
        values: impl IntoIterator<Item = Option<DateTime<Utc>>>,
    ) -> Self {
        Self::new(name, ColumnData::Timestamp(values.into_iter().collect()))
    }

    /// Creates a boolean column.
    pub fn boolean(name: impl Into<String>, values: impl IntoIterator<Item = Option<bool>>) -> Self {
        Self::new(name, ColumnData::Boolean(values.into_iter().collect()))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data(&self) -> &ColumnData {
        &self.data
    }

    pub fn column_type(&self) -> ColumnType {
        self.data.column_type()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Number of null cells in the column.
    pub fn null_count(&self) -> usize {
        self.data.null_count()
    }

    /// Returns the cell at `index`, or `None` past the end of the column.
    pub fn cell(&self, index: usize) -> Option<Cell<'_>> {
        self.data.cell(index)
    }

    /// Numeric values in row order, or `None` if the column is not numeric.
    pub fn numeric_values(&self) -> Option<Vec<Option<f64>>> {
        match &self.data {
            ColumnData::Integer(v) => Some(v.iter().map(|c| c.map(|i| i as f64)).collect()),
            ColumnData::Float(v) => Some(v.clone()),
            _ => None,
        }
    }

    /// Timestamps in row order.
    ///
    /// Timestamp columns are returned as stored. Text columns are parsed with
    /// [`parse_timestamp`]; the first cell that does not parse fails the whole
    /// column. Any other column type is rejected.
    pub fn timestamps(&self) -> Result<Vec<Option<DateTime<Utc>>>, TableError> {
        match &self.data {
            ColumnData::Timestamp(v) => Ok(v.clone()),
            ColumnData::Text(v) => v
                .iter()
                .enumerate()
                .map(|(row, cell)| match cell {
                    None => Ok(None),
                    Some(raw) => {
                        parse_timestamp(raw)
                            .map(Some)
                            .ok_or_else(|| TableError::TimestampParse {
                                column: self.name.clone(),
                                row,
                                value: raw.clone(),
                            })
                    }
                })
                .collect(),
            other => Err(TableError::NotTemporal {
                column: self.name.clone(),
                column_type: other.column_type(),
            }),
        }
    }
}

/// Parses an ISO-8601 timestamp.
///
/// Accepts RFC 3339 with an offset, naive date-times separated by `T` or a
/// space (with optional fractional seconds), and plain dates. Naive values
/// are interpreted as UTC; plain dates as midnight UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// An immutable, column-typed table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableView {
    columns: Vec<Column>,
    row_count: usize,
}

impl TableView {
    /// Builds a table from columns of equal length with unique names.
    pub fn new(columns: Vec<Column>) -> Result<Self, TableError> {
        let row_count = columns.first().map_or(0, Column::len);
        let mut seen = HashSet::new();

        for column in &columns {
            if !seen.insert(column.name()) {
                return Err(TableError::DuplicateColumn {
                    column: column.name().to_string(),
                });
            }
            if column.len() != row_count {
                return Err(TableError::LengthMismatch {
                    column: column.name().to_string(),
                    expected: row_count,
                    actual: column.len(),
                });
            }
        }

        Ok(Self { columns, row_count })
    }

    /// A table with no rows and no columns.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds a table from JSON objects, one per row.
    ///
    /// The column set is the union of keys across all rows in first-seen
    /// order, and a key missing from a row is a null cell. Each column's type
    /// is inferred from its non-null values: all integers give an integer
    /// column, any mix of integers and floats a float column, all booleans a
    /// boolean column, and everything else (strings, mixed kinds, all-null)
    /// a text column. Timestamps arrive as text and are parsed on demand.
    pub fn from_json_rows(rows: &[Value]) -> Result<Self, TableError> {
        let mut names: Vec<String> = Vec::new();
        let mut seen: HashSet<&str> = HashSet::new();

        for (row, value) in rows.iter().enumerate() {
            let object = value.as_object().ok_or(TableError::NotAnObject { row })?;
            for key in object.keys() {
                if seen.insert(key.as_str()) {
                    names.push(key.clone());
                }
            }
        }

        let columns = names
            .into_iter()
            .map(|name| {
                let cells: Vec<&Value> = rows
                    .iter()
                    .map(|row| row.get(&name).unwrap_or(&Value::Null))
                    .collect();
                infer_column(name, &cells)
            })
            .collect::<Result<Vec<_>, _>>()?;

        Self::new(columns)
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Returns true when the table has zero rows.
    pub fn is_empty(&self) -> bool {
        self.row_count == 0
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(Column::name).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name() == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// Names of columns declared as integer or float, in column order.
    pub fn numeric_columns(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|c| c.column_type().is_numeric())
            .map(Column::name)
            .collect()
    }

    /// Null count of the named column, or `None` if the column is absent.
    pub fn null_count(&self, name: &str) -> Option<usize> {
        self.column(name).map(Column::null_count)
    }

    /// Returns the row at `index`.
    pub fn row(&self, index: usize) -> Option<Row<'_>> {
        (index < self.row_count).then_some(Row { table: self, index })
    }

    /// Iterates rows in stored order.
    pub fn rows(&self) -> impl Iterator<Item = Row<'_>> + '_ {
        (0..self.row_count).map(move |index| Row { table: self, index })
    }
}

/// A borrowed row of a [`TableView`].
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    table: &'a TableView,
    index: usize,
}

impl<'a> Row<'a> {
    /// Position of the row in the table.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Cell of the named column, or `None` if the column is absent.
    pub fn get(&self, column: &str) -> Option<Cell<'a>> {
        self.table.column(column).and_then(|c| c.cell(self.index))
    }

    /// All cells of the row paired with their column names.
    pub fn cells(&self) -> impl Iterator<Item = (&'a str, Cell<'a>)> + 'a {
        let index = self.index;
        self.table
            .columns
            .iter()
            .map(move |c| (c.name(), c.cell(index).unwrap_or(Cell::Null)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Inferred {
    Unknown,
    Integer,
    Float,
    Boolean,
    Text,
    Mixed,
}

impl Inferred {
    fn merge(self, next: Inferred) -> Inferred {
        use Inferred::*;
        match (self, next) {
            (Unknown, n) => n,
            (a, b) if a == b => a,
            (Integer, Float) | (Float, Integer) => Float,
            _ => Mixed,
        }
    }
}

fn infer_column(name: String, cells: &[&Value]) -> Result<Column, TableError> {
    let mut inferred = Inferred::Unknown;

    for (row, cell) in cells.iter().enumerate() {
        let kind = match cell {
            Value::Null => continue,
            Value::Number(n) if n.is_i64() => Inferred::Integer,
            Value::Number(_) => Inferred::Float,
            Value::Bool(_) => Inferred::Boolean,
            Value::String(_) => Inferred::Text,
            Value::Array(_) | Value::Object(_) => {
                return Err(TableError::UnsupportedValue { column: name, row });
            }
        };
        inferred = inferred.merge(kind);
    }

    let column = match inferred {
        Inferred::Integer => Column::integer(name, cells.iter().map(|c| c.as_i64())),
        Inferred::Float => Column::float(name, cells.iter().map(|c| c.as_f64())),
        Inferred::Boolean => Column::boolean(name, cells.iter().map(|c| c.as_bool())),
        Inferred::Unknown | Inferred::Text | Inferred::Mixed => {
            Column::text(name, cells.iter().map(|c| json_scalar_to_string(c)))
        }
    };
    Ok(column)
}

fn json_scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        // Nested values are rejected before conversion.
        Value::Array(_) | Value::Object(_) => None,
    }
}
