use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result, bail};

use super::model::{CellValue, Column, ColumnKind, Dataset};
use super::normalize::{coerce_dates, is_date_like, normalize_headers};

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load a sales dataset from a file.
///
/// Only comma-separated files are accepted; the first row is the header.
pub fn load_file(path: &Path) -> Result<Dataset> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "csv" | "txt" | "" => {
            let file = std::fs::File::open(path)
                .with_context(|| format!("opening {}", path.display()))?;
            load_csv(file)
        }
        other => bail!("Unsupported file extension: .{other}"),
    }
}

/// Parse CSV text from any reader.
///
/// Headers are normalized, column types inferred and date-like text columns
/// coerced to datetimes.
pub fn load_csv<R: Read>(input: R) -> Result<Dataset> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(input);

    let raw_headers = reader.headers().context("reading CSV headers")?.clone();
    if raw_headers.is_empty() || raw_headers.iter().all(|h| h.trim().is_empty()) {
        bail!("CSV has no header row");
    }
    let names = normalize_headers(raw_headers.iter());
    let width = names.len();

    let mut cells: Vec<Vec<String>> = vec![Vec::new(); width];
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {}", row_no + 1))?;
        if record.len() > width {
            bail!(
                "CSV row {}: expected {width} fields, saw {}",
                row_no + 1,
                record.len()
            );
        }
        for (col_idx, column) in cells.iter_mut().enumerate() {
            column.push(record.get(col_idx).unwrap_or("").to_string());
        }
    }

    let columns: Vec<Column> = names
        .into_iter()
        .zip(cells)
        .map(|(name, raw)| {
            let column = infer_column(name, &raw);
            if is_date_like(&column.name) && column.kind == ColumnKind::Text {
                log::debug!("coercing '{}' to datetime", column.name);
                coerce_dates(column)
            } else {
                column
            }
        })
        .collect();

    Ok(Dataset::from_columns(columns))
}

// ---------------------------------------------------------------------------
// Type inference
// ---------------------------------------------------------------------------

/// Pick the narrowest kind every non-empty cell fits, then convert.
fn infer_column(name: String, raw: &[String]) -> Column {
    let present: Vec<&str> = raw
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect();

    let kind = if present.is_empty() {
        ColumnKind::Float
    } else if present.iter().all(|s| s.parse::<i64>().is_ok()) {
        ColumnKind::Integer
    } else if present.iter().all(|s| parse_float(s).is_some()) {
        ColumnKind::Float
    } else if present.iter().all(|s| parse_bool(s).is_some()) {
        ColumnKind::Bool
    } else {
        ColumnKind::Text
    };

    let values = raw
        .iter()
        .map(|s| convert_cell(s, kind))
        .collect();

    Column { name, kind, values }
}

fn convert_cell(raw: &str, kind: ColumnKind) -> CellValue {
    let s = raw.trim();
    if s.is_empty() {
        return CellValue::Null;
    }
    match kind {
        ColumnKind::Integer => s
            .parse::<i64>()
            .map(CellValue::Integer)
            .unwrap_or(CellValue::Null),
        ColumnKind::Float => parse_float(s)
            .map(CellValue::Float)
            .unwrap_or(CellValue::Null),
        ColumnKind::Bool => parse_bool(s)
            .map(CellValue::Bool)
            .unwrap_or(CellValue::Null),
        // Text keeps the cell exactly as written.
        ColumnKind::Text | ColumnKind::DateTime => CellValue::Text(raw.to_string()),
    }
}

fn parse_float(s: &str) -> Option<f64> {
    match s.to_ascii_lowercase().as_str() {
        "nan" | "na" | "n/a" | "null" | "none" => Some(f64::NAN),
        other => other.parse::<f64>().ok(),
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    if s.eq_ignore_ascii_case("true") {
        Some(true)
    } else if s.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}
