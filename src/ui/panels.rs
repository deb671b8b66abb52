use eframe::egui::{self, Color32, RichText, Ui};

use crate::charts::Tab;
use crate::data::pivot::PivotTable;
use crate::state::AppState;
use crate::ui::table;

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(ds) = &state.dataset {
            let name = state
                .source
                .as_ref()
                .and_then(|p| p.file_name())
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            ui.label(format!(
                "{name}: {} rows, {} columns",
                ds.len(),
                ds.columns.len()
            ));
        } else {
            ui.label("Upload CSV (File → Open…)");
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// Data preview & summary
// ---------------------------------------------------------------------------

/// Collapsible preview of the first rows plus the column list with kinds.
pub fn data_panel(ui: &mut Ui, state: &AppState) {
    let Some(ds) = &state.dataset else {
        return;
    };
    egui::CollapsingHeader::new(RichText::new("Data preview & summary").strong())
        .id_salt("data_preview")
        .default_open(false)
        .show(ui, |ui: &mut Ui| {
            ui.label(format!(
                "Showing {} of {} rows",
                ds.head(state.config.preview_rows),
                ds.len()
            ));
            table::data_preview(ui, ds, state.config.preview_rows);
            ui.add_space(8.0);
            ui.strong("Columns");
            table::column_summary(ui, ds);
        });
}

// ---------------------------------------------------------------------------
// Tabs
// ---------------------------------------------------------------------------

pub fn tab_bar(ui: &mut Ui, state: &mut AppState) {
    ui.horizontal(|ui: &mut Ui| {
        for tab in Tab::ALL {
            ui.selectable_value(&mut state.active_tab, tab, tab.title());
        }
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Upload sales CSV")
        .add_filter("CSV", &["csv", "txt"])
        .pick_file();

    if let Some(path) = file {
        state.load_path(&path);
    }
}

pub fn save_pivot_dialog(state: &mut AppState, pivot: &PivotTable) {
    let file = rfd::FileDialog::new()
        .set_title("Download pivot CSV")
        .add_filter("CSV", &["csv"])
        .set_file_name(&state.config.pivot_file_name)
        .save_file();

    let Some(path) = file else {
        return;
    };
    match AppState::export_pivot(pivot, &path) {
        Ok(()) => state.status_message = None,
        Err(e) => {
            log::error!("Failed to export pivot: {e:#}");
            state.status_message = Some(format!("Error: {e:#}"));
        }
    }
}
