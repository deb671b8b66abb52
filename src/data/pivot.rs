use std::collections::{BTreeMap, BTreeSet};

use anyhow::{Context, Result};

use super::model::{CellValue, ColumnError, Dataset};

/// Sum of a numeric measure by two categorical dimensions, with absent
/// combinations filled with zero.
#[derive(Debug, Clone, PartialEq)]
pub struct PivotTable {
    pub index_name: String,
    pub row_labels: Vec<String>,
    pub column_labels: Vec<String>,
    /// `cells[row][column]`.
    pub cells: Vec<Vec<f64>>,
}

impl PivotTable {
    /// Pivot `values` by `index` (rows) and `columns`. Labels are sorted by
    /// cell value, so integer keys run 1, 2, 10; rows with a missing label
    /// or value are ignored.
    pub fn build(
        dataset: &Dataset,
        index: &str,
        columns: &str,
        values: &str,
    ) -> Result<Self, ColumnError> {
        let row_keys = dataset.keys(index)?;
        let col_keys = dataset.keys(columns)?;
        let measures = dataset.numeric_values(values)?;

        let mut sums: BTreeMap<(&CellValue, &CellValue), f64> = BTreeMap::new();
        let mut row_set = BTreeSet::new();
        let mut col_set = BTreeSet::new();
        for ((r, c), v) in row_keys.iter().zip(&col_keys).zip(&measures) {
            let (Some(r), Some(c), Some(v)) = (r, c, v) else {
                continue;
            };
            if !v.is_finite() {
                continue;
            }
            row_set.insert(r);
            col_set.insert(c);
            *sums.entry((r, c)).or_insert(0.0) += v;
        }

        let cells = row_set
            .iter()
            .map(|&r| {
                col_set
                    .iter()
                    .map(|&c| sums.get(&(r, c)).copied().unwrap_or(0.0))
                    .collect()
            })
            .collect();

        Ok(PivotTable {
            index_name: dataset
                .column(index)
                .map(|c| c.name.clone())
                .unwrap_or_else(|| index.to_string()),
            row_labels: row_set.iter().map(|k| k.to_string()).collect(),
            column_labels: col_set.iter().map(|k| k.to_string()).collect(),
            cells,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.row_labels.is_empty()
    }

    /// Sum of each row across all columns.
    pub fn row_totals(&self) -> Vec<f64> {
        self.cells.iter().map(|row| row.iter().sum()).collect()
    }

    /// Sum of each column across all rows.
    pub fn column_totals(&self) -> Vec<f64> {
        (0..self.column_labels.len())
            .map(|c| self.cells.iter().map(|row| row[c]).sum())
            .collect()
    }

    /// Serialize as CSV: header `index_name,<column labels>`, then one line
    /// per row label.
    pub fn to_csv_bytes(&self) -> Result<Vec<u8>> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        let mut header = vec![self.index_name.clone()];
        header.extend(self.column_labels.iter().cloned());
        writer.write_record(&header).context("writing pivot header")?;
        for (label, row) in self.row_labels.iter().zip(&self.cells) {
            let mut record = vec![label.clone()];
            record.extend(row.iter().map(|v| v.to_string()));
            writer
                .write_record(&record)
                .with_context(|| format!("writing pivot row '{label}'"))?;
        }
        writer.into_inner().context("flushing pivot CSV")
    }
}
