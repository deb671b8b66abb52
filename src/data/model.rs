use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDateTime;

use super::normalize::normalize_column_name;

// ---------------------------------------------------------------------------
// CellValue – a single cell of the uploaded table
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value mirroring the dtypes a CSV column can take.
/// Group-bys key on `CellValue`, so it must be `Ord`.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    DateTime(NaiveDateTime),
    Null,
}

// -- Manual Eq/Ord so we can put CellValue in BTreeMap keys --

impl Eq for CellValue {}

impl PartialOrd for CellValue {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CellValue {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use CellValue::*;
        fn discriminant(v: &CellValue) -> u8 {
            match v {
                Null => 0,
                Bool(_) => 1,
                Integer(_) => 2,
                Float(_) => 3,
                Text(_) => 4,
                DateTime(_) => 5,
            }
        }
        let da = discriminant(self);
        let db = discriminant(other);
        if da != db {
            return da.cmp(&db);
        }
        match (self, other) {
            (Null, Null) => std::cmp::Ordering::Equal,
            (Bool(a), Bool(b)) => a.cmp(b),
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            (Text(a), Text(b)) => a.cmp(b),
            (DateTime(a), DateTime(b)) => a.cmp(b),
            _ => std::cmp::Ordering::Equal,
        }
    }
}

impl std::hash::Hash for CellValue {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            CellValue::Text(s) => s.hash(state),
            CellValue::Integer(i) => i.hash(state),
            CellValue::Float(f) => f.to_bits().hash(state),
            CellValue::Bool(b) => b.hash(state),
            CellValue::DateTime(d) => d.hash(state),
            CellValue::Null => {}
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Text(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::DateTime(d) => {
                if d.time() == chrono::NaiveTime::MIN {
                    write!(f, "{}", d.date())
                } else {
                    write!(f, "{d}")
                }
            }
            CellValue::Null => write!(f, "<null>"),
        }
    }
}

impl CellValue {
    /// Interpret the value as an `f64` for plotting; dates become unix seconds.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Float(v) if !v.is_nan() => Some(*v),
            CellValue::Integer(i) => Some(*i as f64),
            CellValue::DateTime(d) => Some(d.and_utc().timestamp() as f64),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        match self {
            CellValue::Null => true,
            CellValue::Float(v) => v.is_nan(),
            _ => false,
        }
    }
}

// ---------------------------------------------------------------------------
// Column
// ---------------------------------------------------------------------------

/// Inferred type of a whole column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Integer,
    Float,
    Bool,
    Text,
    DateTime,
}

impl ColumnKind {
    pub fn is_numeric(self) -> bool {
        matches!(self, ColumnKind::Integer | ColumnKind::Float)
    }
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColumnKind::Integer => "int64",
            ColumnKind::Float => "float64",
            ColumnKind::Bool => "bool",
            ColumnKind::Text => "text",
            ColumnKind::DateTime => "datetime",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone)]
pub struct Column {
    /// Normalized column name.
    pub name: String,
    pub kind: ColumnKind,
    pub values: Vec<CellValue>,
}

// ---------------------------------------------------------------------------
// Dataset – the complete uploaded table
// ---------------------------------------------------------------------------

/// Lookup failures raised by [`Dataset`] accessors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ColumnError {
    #[error("column '{0}' not found")]
    Missing(String),
    #[error("column '{name}' is {kind}, not numeric")]
    NotNumeric { name: String, kind: ColumnKind },
}

/// The parsed upload: equally long columns in file order.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub columns: Vec<Column>,
    rows: usize,
    index: BTreeMap<String, usize>,
}

impl Dataset {
    /// Build a dataset from columns whose names are already normalized.
    /// Every column must have the same length.
    pub fn from_columns(columns: Vec<Column>) -> Self {
        let rows = columns.first().map(|c| c.values.len()).unwrap_or(0);
        debug_assert!(columns.iter().all(|c| c.values.len() == rows));
        let index = columns
            .iter()
            .enumerate()
            .map(|(i, c)| (c.name.clone(), i))
            .collect();
        Dataset {
            columns,
            rows,
            index,
        }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows
    }

    /// Whether the dataset has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Look up a column; `name` is normalized first, so lookups are
    /// case- and whitespace-insensitive.
    pub fn column(&self, name: &str) -> Option<&Column> {
        let key = normalize_column_name(name);
        self.index.get(&key).map(|&i| &self.columns[i])
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    pub fn has_columns(&self, names: &[&str]) -> bool {
        names.iter().all(|n| self.has_column(n))
    }

    /// Names of numeric (integer or float) columns, in file order.
    pub fn numeric_column_names(&self) -> Vec<String> {
        self.columns
            .iter()
            .filter(|c| c.kind.is_numeric())
            .map(|c| c.name.clone())
            .collect()
    }

    /// Values of a numeric column, `None` for nulls.
    pub fn numeric_values(&self, name: &str) -> Result<Vec<Option<f64>>, ColumnError> {
        let col = self
            .column(name)
            .ok_or_else(|| ColumnError::Missing(name.to_string()))?;
        if !col.kind.is_numeric() {
            return Err(ColumnError::NotNumeric {
                name: col.name.clone(),
                kind: col.kind,
            });
        }
        Ok(col.values.iter().map(CellValue::as_f64).collect())
    }

    /// Values usable as a plot axis: numeric columns and datetimes.
    pub fn axis_values(&self, name: &str) -> Result<Vec<Option<f64>>, ColumnError> {
        let col = self
            .column(name)
            .ok_or_else(|| ColumnError::Missing(name.to_string()))?;
        match col.kind {
            ColumnKind::Integer | ColumnKind::Float | ColumnKind::DateTime => {
                Ok(col.values.iter().map(CellValue::as_f64).collect())
            }
            kind => Err(ColumnError::NotNumeric {
                name: col.name.clone(),
                kind,
            }),
        }
    }

    /// Display labels of a column, `None` for nulls.
    pub fn labels(&self, name: &str) -> Result<Vec<Option<String>>, ColumnError> {
        let col = self
            .column(name)
            .ok_or_else(|| ColumnError::Missing(name.to_string()))?;
        Ok(col
            .values
            .iter()
            .map(|v| (!v.is_null()).then(|| v.to_string()))
            .collect())
    }

    /// Cells of a column as grouping keys, `None` for nulls. Keys keep
    /// their type, so integers sort numerically.
    pub fn keys(&self, name: &str) -> Result<Vec<Option<CellValue>>, ColumnError> {
        let col = self
            .column(name)
            .ok_or_else(|| ColumnError::Missing(name.to_string()))?;
        Ok(col
            .values
            .iter()
            .map(|v| (!v.is_null()).then(|| v.clone()))
            .collect())
    }

    /// Raw cell at (`row`, column index).
    pub fn cell(&self, row: usize, column: usize) -> &CellValue {
        &self.columns[column].values[row]
    }

    /// Number of rows shown in a preview of at most `n` rows.
    pub fn head(&self, n: usize) -> usize {
        self.rows.min(n)
    }
}
