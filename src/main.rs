mod app;
mod color;
mod config;
mod data;
mod error;
mod state;
mod ui;

use app::CellDashboardApp;
use config::DashboardConfig;
use eframe::egui;

fn main() -> eframe::Result {
    env_logger::init();

    let config = DashboardConfig::load().unwrap_or_else(|e| {
        log::error!("{e}; falling back to the default configuration");
        DashboardConfig::default()
    });
    log::info!("Reading published sheet from {}", config.data_path.display());

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 900.0])
            .with_min_inner_size([800.0, 500.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Cell Availability Dashboard",
        options,
        Box::new(|_cc| Ok(Box::new(CellDashboardApp::new(config)))),
    )
}
