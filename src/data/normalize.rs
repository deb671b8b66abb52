use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use super::model::{CellValue, Column, ColumnKind};

// ---------------------------------------------------------------------------
// Column names
// ---------------------------------------------------------------------------

/// Trim, lowercase and replace spaces with underscores.
///
/// Applying it twice gives the same result as applying it once.
pub fn normalize_column_name(name: &str) -> String {
    name.trim().to_lowercase().replace(' ', "_")
}

/// Normalize a header row, suffixing `.1`, `.2`, … onto repeated names so
/// every column stays addressable.
pub fn normalize_headers<'a>(headers: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut seen: BTreeSet<String> = BTreeSet::new();
    headers
        .into_iter()
        .map(|raw| {
            let base = normalize_column_name(raw);
            let mut name = base.clone();
            let mut n = 1;
            while seen.contains(&name) {
                name = format!("{base}.{n}");
                n += 1;
            }
            seen.insert(name.clone());
            name
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Date-like columns
// ---------------------------------------------------------------------------

/// Whether a normalized column name looks like it holds dates.
pub fn is_date_like(name: &str) -> bool {
    name.contains("date") || name.contains("day") || name.contains("month")
}

/// First column whose name ends with `date`, used as the time axis.
pub fn time_column<'a>(names: impl IntoIterator<Item = &'a str>) -> Option<&'a str> {
    names.into_iter().find(|n| n.ends_with("date"))
}

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%Y/%m/%d %H:%M:%S",
];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%m/%d/%y",
    "%d-%m-%Y",
    "%d.%m.%Y",
    "%d %b %Y",
    "%d %B %Y",
    "%b %d %Y",
    "%b %d, %Y",
    "%B %d, %Y",
    "%Y%m%d",
];

/// Parse a single cell into a datetime, trying the common layouts.
pub fn parse_datetime(raw: &str) -> Option<NaiveDateTime> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.naive_utc());
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Some(dt);
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(trimmed, fmt) {
            return d.and_hms_opt(0, 0, 0);
        }
    }
    None
}

/// Coerce a text column to datetimes; unparsable cells become `Null`.
///
/// Numeric and boolean columns are returned untouched so that columns such
/// as `sale_date_num` stay usable as numeric axes.
pub fn coerce_dates(column: Column) -> Column {
    if column.kind != ColumnKind::Text {
        return column;
    }
    let values = column
        .values
        .iter()
        .map(|v| match v {
            CellValue::Text(s) => parse_datetime(s)
                .map(CellValue::DateTime)
                .unwrap_or(CellValue::Null),
            _ => CellValue::Null,
        })
        .collect();
    Column {
        name: column.name,
        kind: ColumnKind::DateTime,
        values,
    }
}
