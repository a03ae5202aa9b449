use std::cmp::Ordering;
use std::collections::{BTreeSet, HashSet};
use std::fmt;

use thiserror::Error;

// ---------------------------------------------------------------------------
// CellValue – a single spreadsheet cell
// ---------------------------------------------------------------------------

/// Text that common spreadsheet exports use for an empty cell.
const MISSING_MARKERS: &[&str] = &[
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// A typed cell. `Missing` is a first-class value: absent cells and cells
/// that could not be read as anything meaningful end up here, never as zero.
#[derive(Debug, Clone)]
pub enum CellValue {
    Text(String),
    /// Always finite.
    Number(f64),
    Missing,
}

// -- Manual Eq/Ord so cells can live in BTreeSet --

impl PartialEq for CellValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for CellValue {}

impl PartialOrd for CellValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CellValue {
    fn cmp(&self, other: &Self) -> Ordering {
        use CellValue::*;
        fn rank(v: &CellValue) -> u8 {
            match v {
                Missing => 0,
                Number(_) => 1,
                Text(_) => 2,
            }
        }
        match (self, other) {
            (Missing, Missing) => Ordering::Equal,
            (Number(a), Number(b)) => a.total_cmp(b),
            (Text(a), Text(b)) => a.cmp(b),
            _ => rank(self).cmp(&rank(other)),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Missing => write!(f, "-"),
            other => write!(f, "{}", other.as_text()),
        }
    }
}

impl CellValue {
    /// Interpret raw spreadsheet text.
    ///
    /// Blank text and the usual NA markers become `Missing`, finite numbers
    /// become `Number`, anything else is kept as trimmed `Text`.
    pub fn from_raw(raw: &str) -> Self {
        let s = raw.trim();
        if s.is_empty() || MISSING_MARKERS.contains(&s) {
            return CellValue::Missing;
        }
        match s.parse::<f64>() {
            Ok(v) if v.is_finite() => CellValue::Number(v),
            Ok(_) => CellValue::Missing,
            Err(_) => CellValue::Text(s.to_string()),
        }
    }

    pub fn from_f64(v: f64) -> Self {
        if v.is_finite() {
            CellValue::Number(v)
        } else {
            CellValue::Missing
        }
    }

    /// Numeric reading of the cell; `None` for text and missing cells.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Number(v) => Some(*v),
            _ => None,
        }
    }

    /// The cell as plain text, the way filters compare it.
    ///
    /// Integral numbers print without a fractional part (`123`), and
    /// `Missing` is the empty string.
    pub fn as_text(&self) -> String {
        match self {
            CellValue::Text(s) => s.clone(),
            CellValue::Number(v) => format_number(*v),
            CellValue::Missing => String::new(),
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, CellValue::Missing)
    }
}

fn format_number(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        format!("{v}")
    }
}

/// Canonical form of a column name: inner whitespace collapsed, trimmed,
/// upper-cased. `"Grid "` and `"GRID"` name the same column.
pub fn normalize_column_name(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase()
}

// ---------------------------------------------------------------------------
// Table – the complete loaded sheet
// ---------------------------------------------------------------------------

#[derive(Debug, Error, PartialEq)]
pub enum TableError {
    #[error("duplicate column '{0}' after normalizing header names")]
    DuplicateColumn(String),
    #[error("row {row} has {found} cells but the header has {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("{headers} header names for {columns} columns")]
    ColumnCount { headers: usize, columns: usize },
    #[error("column '{column}' has {found} cells but the first column has {expected}")]
    ColumnLength {
        column: String,
        expected: usize,
        found: usize,
    },
}

/// An immutable, column-major grid with normalized, unique column names.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    column_names: Vec<String>,
    columns: Vec<Vec<CellValue>>,
    n_rows: usize,
}

impl Table {
    /// Build a table from a header and row-major cells.
    ///
    /// Short rows are padded with `Missing` (spreadsheet exports drop
    /// trailing empty cells); rows longer than the header are rejected.
    pub fn from_rows<S: AsRef<str>>(
        headers: &[S],
        rows: Vec<Vec<CellValue>>,
    ) -> Result<Self, TableError> {
        let column_names = normalized_headers(headers)?;
        let width = column_names.len();
        let n_rows = rows.len();

        let mut columns: Vec<Vec<CellValue>> =
            (0..width).map(|_| Vec::with_capacity(n_rows)).collect();
        for (row_no, row) in rows.into_iter().enumerate() {
            if row.len() > width {
                return Err(TableError::RaggedRow {
                    row: row_no,
                    expected: width,
                    found: row.len(),
                });
            }
            let found = row.len();
            for (col, cell) in columns.iter_mut().zip(row) {
                col.push(cell);
            }
            for col in columns.iter_mut().skip(found) {
                col.push(CellValue::Missing);
            }
        }

        Ok(Table {
            column_names,
            columns,
            n_rows,
        })
    }

    /// Build a table from column-major data. All columns must share a length.
    pub fn from_columns<S: AsRef<str>>(
        headers: &[S],
        columns: Vec<Vec<CellValue>>,
    ) -> Result<Self, TableError> {
        let column_names = normalized_headers(headers)?;
        if columns.len() != column_names.len() {
            return Err(TableError::ColumnCount {
                headers: column_names.len(),
                columns: columns.len(),
            });
        }
        let n_rows = columns.first().map_or(0, Vec::len);
        if let Some((idx, col)) = columns.iter().enumerate().find(|(_, c)| c.len() != n_rows) {
            return Err(TableError::ColumnLength {
                column: column_names[idx].clone(),
                expected: n_rows,
                found: col.len(),
            });
        }
        Ok(Table {
            column_names,
            columns,
            n_rows,
        })
    }

    /// Ordered, normalized column names.
    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.n_rows
    }

    pub fn is_empty(&self) -> bool {
        self.n_rows == 0
    }

    /// Position of a column; `name` is normalized before lookup.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        let wanted = normalize_column_name(name);
        self.column_names.iter().position(|c| *c == wanted)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// All cells of one column, top to bottom.
    pub fn column(&self, name: &str) -> Option<&[CellValue]> {
        self.column_index(name).map(|i| self.columns[i].as_slice())
    }

    pub fn cell(&self, row: usize, name: &str) -> Option<&CellValue> {
        self.column(name).and_then(|c| c.get(row))
    }

    /// A new table holding the given rows in the given order.
    pub fn select_rows(&self, indices: &[usize]) -> Table {
        let columns = self
            .columns
            .iter()
            .map(|col| indices.iter().map(|&i| col[i].clone()).collect())
            .collect();
        Table {
            column_names: self.column_names.clone(),
            columns,
            n_rows: indices.len(),
        }
    }

    /// Sorted distinct non-missing values of a column.
    pub fn distinct_values(&self, name: &str) -> BTreeSet<CellValue> {
        self.column(name)
            .map(|col| col.iter().filter(|v| !v.is_missing()).cloned().collect())
            .unwrap_or_default()
    }

    /// Row-major view of one row.
    pub fn row(&self, row: usize) -> impl Iterator<Item = &CellValue> + '_ {
        self.columns.iter().map(move |col| &col[row])
    }
}

fn normalized_headers<S: AsRef<str>>(headers: &[S]) -> Result<Vec<String>, TableError> {
    let mut seen = HashSet::new();
    headers
        .iter()
        .map(|h| {
            let name = normalize_column_name(h.as_ref());
            if seen.insert(name.clone()) {
                Ok(name)
            } else {
                Err(TableError::DuplicateColumn(name))
            }
        })
        .collect()
}
