use eframe::egui::{self, RichText, ScrollArea};

use crate::config::DashboardConfig;
use crate::state::AppState;
use crate::ui::plot::{self, ValueFormat};
use crate::ui::{cards, panels};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct CellDashboardApp {
    pub state: AppState,
}

impl CellDashboardApp {
    pub fn new(config: DashboardConfig) -> Self {
        Self {
            state: AppState::new(config),
        }
    }

    fn dashboard(&self, ui: &mut egui::Ui) {
        let state = &self.state;
        let Some(view) = &state.view else {
            ui.centered_and_justified(|ui| {
                if state.waiting_for_data {
                    ui.label(
                        RichText::new(format!(
                            "Waiting for data. Upload a sheet or publish one to {}.",
                            state.store.source_description()
                        ))
                        .size(18.0),
                    );
                } else {
                    ui.label("No sheet could be read. See the status bar for details.");
                }
            });
            return;
        };

        ui.heading(RichText::new("Network Intelligence Portal").size(26.0));
        if !view.unavailable.is_empty() {
            ui.label(
                RichText::new(format!(
                    "Ignoring filters on columns this sheet lacks: {}",
                    view.unavailable.join(", ")
                ))
                .weak(),
            );
        }
        ui.add_space(8.0);

        cards::metric_cards(ui, view);
        ui.add_space(12.0);

        let columns = &view.snapshot.columns;
        let palette = &state.palette;

        // A single day is not a trend.
        if columns.time_series.len() > 1 {
            plot::trend_chart(
                ui,
                "daily_trend",
                "Daily Availability Trend",
                "Availability (%)",
                &view.daily,
                palette.daily,
                ValueFormat::Percent,
            );
            ui.add_space(12.0);
        }

        if !columns.periodic.is_empty() || !columns.auxiliary.is_empty() {
            ui.columns(2, |cols| {
                if !columns.periodic.is_empty() {
                    plot::trend_chart(
                        &mut cols[0],
                        "periodic_trend",
                        "Monthly TCH% Trend",
                        "TCH (%)",
                        &view.periodic,
                        palette.periodic,
                        ValueFormat::Percent,
                    );
                }
                if !columns.auxiliary.is_empty() {
                    plot::trend_chart(
                        &mut cols[1],
                        "auxiliary_trend",
                        "Monthly Fuel Consumption",
                        "Avg Liters",
                        &view.auxiliary,
                        palette.auxiliary,
                        ValueFormat::Plain,
                    );
                }
            });
            ui.add_space(12.0);
        }

        if let Some(row) = view.single_site() {
            cards::site_details(
                ui,
                &view.filtered,
                row,
                columns.identifier.as_deref(),
                &state.config,
            );
            ui.add_space(12.0);
        }

        ui.separator();
        cards::inventory_table(ui, view, &state.config);
    }
}

impl eframe::App for CellDashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: filters ----
        egui::SidePanel::left("filter_panel")
            .default_width(240.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Central panel: cards, charts, inventory ----
        egui::CentralPanel::default().show(ctx, |ui| {
            ScrollArea::vertical()
                .auto_shrink([false, false])
                .show(ui, |ui| self.dashboard(ui));
        });
    }
}
