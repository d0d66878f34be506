//! In-memory tabular data with named columns.
//!
//! A [`Table`] is the input side of triple extraction: a header of column
//! names plus rows of typed [`Value`] cells. Cell types are inferred per
//! column when loading text (CSV), so a column holding `5`, `4.9`, `4.7`
//! is a float column and every cell renders as a float.

use crate::{Error, Result};
use std::fmt;
use std::path::Path;

/// A single table cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Missing value.
    Null,
    /// Boolean.
    Bool(bool),
    /// Integer.
    Int(i64),
    /// Floating point number.
    Float(f64),
    /// Free text.
    Str(String),
}

impl Value {
    /// Whether this cell is missing.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl fmt::Display for Value {
    /// Natural string form of the cell.
    ///
    /// Floats with no fractional part keep a trailing `.0` so a float column
    /// never renders like an integer column. Very large or very small floats
    /// use exponent form (`1e-05`, `1e+16`). Missing cells render as `nan`
    /// and booleans as `True` / `False`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("nan"),
            Value::Bool(b) => f.write_str(if *b { "True" } else { "False" }),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => fmt_float(*x, f),
            Value::Str(s) => f.write_str(s),
        }
    }
}

fn fmt_float(x: f64, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if x.is_nan() {
        f.write_str("nan")
    } else if x.is_infinite() {
        f.write_str(if x > 0.0 { "inf" } else { "-inf" })
    } else if let Some((mantissa, exp)) = scientific(x).filter(|&(_, e)| !(-4..16).contains(&e)) {
        let sign = if exp < 0 { '-' } else { '+' };
        write!(f, "{mantissa}e{sign}{:02}", exp.abs())
    } else if x.fract() == 0.0 {
        write!(f, "{x:.1}")
    } else {
        write!(f, "{x}")
    }
}

/// Shortest mantissa and decimal exponent of a finite float.
fn scientific(x: f64) -> Option<(String, i32)> {
    let sci = format!("{x:e}");
    let (mantissa, exp) = sci.split_once('e')?;
    Some((mantissa.to_string(), exp.parse().ok()?))
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

/// Inferred type of a text column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    /// Every non-empty cell parses as `i64`.
    Int,
    /// Every non-empty cell parses as `f64`.
    Float,
    /// Every non-empty cell is `true` or `false` (any case).
    Bool,
    /// Anything else.
    Str,
}

impl ColumnType {
    /// Infer the narrowest type that accepts every non-empty cell.
    ///
    /// A column with no non-empty cells is `Str`. Integers with missing cells
    /// widen to `Float`, since an integer column has no missing value.
    pub fn infer<'a>(cells: impl IntoIterator<Item = &'a str> + Clone) -> Self {
        let non_empty = || cells.clone().into_iter().filter(|c| !c.is_empty());
        if non_empty().next().is_none() {
            return ColumnType::Str;
        }
        let has_missing = cells.clone().into_iter().any(str::is_empty);

        if non_empty().all(|c| c.trim().parse::<i64>().is_ok()) {
            if has_missing {
                ColumnType::Float
            } else {
                ColumnType::Int
            }
        } else if non_empty().all(|c| c.trim().parse::<f64>().is_ok()) {
            ColumnType::Float
        } else if non_empty().all(|c| parse_bool(c).is_some()) {
            ColumnType::Bool
        } else {
            ColumnType::Str
        }
    }

    /// Parse a raw cell under this column type. Empty cells become [`Value::Null`].
    pub fn parse(self, raw: &str) -> Value {
        if raw.is_empty() {
            return Value::Null;
        }
        match self {
            ColumnType::Int => raw.trim().parse().map_or(Value::Null, Value::Int),
            ColumnType::Float => raw.trim().parse().map_or(Value::Null, Value::Float),
            ColumnType::Bool => parse_bool(raw).map_or(Value::Null, Value::Bool),
            ColumnType::Str => Value::Str(raw.to_string()),
        }
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    let raw = raw.trim();
    if raw.eq_ignore_ascii_case("true") {
        Some(true)
    } else if raw.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

/// A table of rows with named columns.
///
/// # Example
///
/// ```rust
/// use lattix_core::{Table, Value};
///
/// let mut table = Table::new(["species", "sepal_length"]);
/// table.push_row(vec![Value::from("setosa"), Value::from(5.1)]).unwrap();
///
/// assert_eq!(table.num_rows(), 1);
/// assert_eq!(table.get(0, "sepal_length"), Some(&Value::Float(5.1)));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    /// Create an empty table with the given column names.
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Create a table from column names and rows, checking row widths.
    pub fn from_rows<I, S>(columns: I, rows: Vec<Vec<Value>>) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut table = Self::new(columns);
        table.rows.reserve(rows.len());
        for row in rows {
            table.push_row(row)?;
        }
        Ok(table)
    }

    /// Load a table from a headered CSV file.
    pub fn from_csv_path(path: impl AsRef<Path>) -> Result<Self> {
        crate::formats::Csv::read_table_path(path)
    }

    /// Load a table from a headered CSV reader.
    pub fn from_csv_reader<R: std::io::Read>(reader: R) -> Result<Self> {
        crate::formats::Csv::read_table(reader)
    }

    /// Append a row. The row must have one cell per column.
    pub fn push_row(&mut self, row: Vec<Value>) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(Error::RowLength {
                row: self.rows.len(),
                expected: self.columns.len(),
                found: row.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    /// Column names, in order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Number of rows.
    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns.
    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column, if present.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Position of a column, or [`Error::MissingColumn`].
    pub fn require_column(&self, name: &str) -> Result<usize> {
        self.column_index(name)
            .ok_or_else(|| Error::MissingColumn(name.to_string()))
    }

    /// All cells of one column, in row order.
    pub fn column(&self, name: &str) -> Result<Vec<&Value>> {
        let idx = self.require_column(name)?;
        Ok(self.rows.iter().map(|row| &row[idx]).collect())
    }

    /// One row by index.
    pub fn row(&self, index: usize) -> Option<&[Value]> {
        self.rows.get(index).map(Vec::as_slice)
    }

    /// Iterate over rows in order.
    pub fn rows(&self) -> impl Iterator<Item = &[Value]> {
        self.rows.iter().map(Vec::as_slice)
    }

    /// One cell by row index and column name.
    pub fn get(&self, row: usize, column: &str) -> Option<&Value> {
        let idx = self.column_index(column)?;
        self.rows.get(row).map(|r| &r[idx])
    }
}
