use eframe::egui::{Align, Layout, RichText, Ui};
use egui_extras::{Column, TableBuilder};

use crate::charts::artifact::Correlation;
use crate::color;
use crate::data::model::Dataset;
use crate::data::pivot::PivotTable;

const ROW_HEIGHT: f32 = 18.0;

// ---------------------------------------------------------------------------
// Generic table
// ---------------------------------------------------------------------------

/// Striped, scrollable table; `cell(ui, row, column)` draws one body cell.
fn grid(
    ui: &mut Ui,
    id_salt: &str,
    header: &[String],
    n_rows: usize,
    max_height: f32,
    mut cell: impl FnMut(&mut Ui, usize, usize),
) {
    ui.push_id(id_salt, |ui: &mut Ui| {
        TableBuilder::new(ui)
            .striped(true)
            .resizable(true)
            .cell_layout(Layout::left_to_right(Align::Center))
            .columns(Column::auto().at_least(60.0), header.len())
            .max_scroll_height(max_height)
            .header(20.0, |mut row| {
                for title in header {
                    row.col(|ui| {
                        ui.strong(title);
                    });
                }
            })
            .body(|body| {
                body.rows(ROW_HEIGHT, n_rows, |mut row| {
                    let r = row.index();
                    for c in 0..header.len() {
                        row.col(|ui| cell(ui, r, c));
                    }
                });
            });
    });
}

// ---------------------------------------------------------------------------
// Data preview & summary
// ---------------------------------------------------------------------------

/// First `rows` rows of the dataset.
pub fn data_preview(ui: &mut Ui, dataset: &Dataset, rows: usize) {
    let header: Vec<String> = dataset.columns.iter().map(|c| c.name.clone()).collect();
    grid(ui, "data_preview", &header, dataset.head(rows), 300.0, |ui, r, c| {
        let value = dataset.cell(r, c);
        if value.is_null() {
            ui.weak("–");
        } else {
            ui.label(value.to_string());
        }
    });
}

/// Column names with their inferred kinds and null counts.
pub fn column_summary(ui: &mut Ui, dataset: &Dataset) {
    let header = ["column", "dtype", "non-null"].map(String::from);
    grid(ui, "column_summary", &header, dataset.columns.len(), 240.0, |ui, r, c| {
        let column = &dataset.columns[r];
        match c {
            0 => ui.label(&column.name),
            1 => ui.monospace(column.kind.to_string()),
            _ => ui.label(
                column
                    .values
                    .iter()
                    .filter(|v| !v.is_null())
                    .count()
                    .to_string(),
            ),
        };
    });
}

// ---------------------------------------------------------------------------
// Derived tables
// ---------------------------------------------------------------------------

/// Correlation matrix with diverging cell colours.
pub fn correlation_table(ui: &mut Ui, correlation: &Correlation) {
    let mut header = vec![String::new()];
    header.extend(correlation.labels.iter().cloned());
    grid(
        ui,
        "correlation_table",
        &header,
        correlation.labels.len(),
        240.0,
        |ui, r, c| {
            if c == 0 {
                ui.strong(&correlation.labels[r]);
                return;
            }
            let v = correlation.matrix[r][c - 1];
            let text = if v.is_nan() {
                "NaN".to_string()
            } else {
                format!("{v:.2}")
            };
            ui.label(RichText::new(text).color(color::diverging(v)));
        },
    );
}

/// Units sold per product (rows) and category (columns), with totals.
pub fn pivot_table(ui: &mut Ui, pivot: &PivotTable) {
    let mut header = vec![pivot.index_name.clone()];
    header.extend(pivot.column_labels.iter().cloned());
    header.push("Total".to_string());
    let row_totals = pivot.row_totals();
    let column_totals = pivot.column_totals();
    let n_rows = pivot.row_labels.len();
    let n_cols = pivot.column_labels.len();
    grid(ui, "pivot_table", &header, n_rows + 1, 240.0, |ui, r, c| {
        let total_row = r == n_rows;
        match (c, total_row) {
            (0, false) => ui.label(&pivot.row_labels[r]),
            (0, true) => ui.strong("Total"),
            (c, false) if c <= n_cols => ui.label(pivot.cells[r][c - 1].to_string()),
            (_, false) => ui.strong(row_totals[r].to_string()),
            (c, true) if c <= n_cols => ui.strong(column_totals[c - 1].to_string()),
            (_, true) => ui.strong(column_totals.iter().sum::<f64>().to_string()),
        };
    });
}
