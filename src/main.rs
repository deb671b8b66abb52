mod app;
mod charts;
mod color;
mod config;
mod data;
mod state;
mod ui;

use std::path::PathBuf;

use app::SalesDashboardApp;
use config::DashboardConfig;
use eframe::egui;
use state::AppState;

fn main() -> eframe::Result {
    env_logger::init();

    let config = match DashboardConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("Ignoring config: {e:#}");
            DashboardConfig::default()
        }
    };
    log::info!("Using config {config:?}");

    let mut state = AppState::new(config);
    if let Some(path) = std::env::args_os().nth(1).map(PathBuf::from) {
        state.load_path(&path);
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 900.0])
            .with_min_inner_size([640.0, 480.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Sales Data Dashboard",
        options,
        Box::new(|_cc| Ok(Box::new(SalesDashboardApp::new(state)))),
    )
}
