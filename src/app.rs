use eframe::egui::{self, ScrollArea, Ui};

use crate::state::AppState;
use crate::ui::{panels, plot};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct SalesDashboardApp {
    pub state: AppState,
}

impl SalesDashboardApp {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

impl eframe::App for SalesDashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Central panel: preview, tabs, charts ----
        egui::CentralPanel::default().show(ctx, |ui| {
            if self.state.dataset.is_none() {
                ui.centered_and_justified(|ui: &mut Ui| {
                    ui.heading("Upload a sales CSV to start  (File → Open…)");
                });
                return;
            }

            panels::data_panel(ui, &self.state);
            ui.separator();
            panels::tab_bar(ui, &mut self.state);
            ui.separator();

            let mut download = None;
            ScrollArea::vertical()
                .auto_shrink([false, false])
                .show(ui, |ui: &mut Ui| {
                    ui.heading(self.state.active_tab.heading());
                    ui.add_space(8.0);
                    for outcome in self.state.active_outcomes() {
                        if let Some(pivot) = plot::chart_block(ui, outcome) {
                            download = Some(pivot);
                        }
                    }
                });
            if let Some(pivot) = download {
                panels::save_pivot_dialog(&mut self.state, &pivot);
            }
        });
    }
}
