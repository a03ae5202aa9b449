use eframe::egui::{self, RichText, Ui};
use egui_extras::{Column, TableBuilder};

use crate::config::DashboardConfig;
use crate::data::aggregate::MetricCard;
use crate::data::model::Table;
use crate::state::DashboardView;

// ---------------------------------------------------------------------------
// Metric cards
// ---------------------------------------------------------------------------

fn card_frame(ui: &mut Ui, fill_width: bool, add_contents: impl FnOnce(&mut Ui)) {
    egui::Frame::group(ui.style())
        .inner_margin(egui::Margin::same(16))
        .corner_radius(egui::CornerRadius::same(12))
        .show(ui, |ui: &mut Ui| {
            if fill_width {
                ui.set_min_width(ui.available_width());
            }
            add_contents(ui);
        });
}

fn metric_body(ui: &mut Ui, title: &str, card: &MetricCard) {
    ui.label(RichText::new(title).strong());
    let value = match card.aggregate.mean {
        Some(mean) => format!("{mean:.2}%"),
        None => "No data".to_string(),
    };
    ui.label(RichText::new(value).size(28.0).strong());
    ui.label(
        RichText::new(format!(
            "{} of {} sites reporting",
            card.aggregate.valid_count, card.aggregate.total_rows
        ))
        .weak(),
    );
}

/// The three headline cards: latest daily availability, latest TCH%, and
/// the number of sites in the current selection.
pub fn metric_cards(ui: &mut Ui, view: &DashboardView) {
    let summary = &view.summary;
    ui.columns(3, |cols: &mut [Ui]| {
        if let Some(card) = &summary.latest_day {
            card_frame(&mut cols[0], true, |ui: &mut Ui| {
                metric_body(ui, &format!("Average Cell Availability {}", card.caption), card);
            });
        }
        if let Some(card) = &summary.latest_period {
            card_frame(&mut cols[1], true, |ui: &mut Ui| {
                metric_body(ui, &format!("Average TCH% {}", card.caption), card);
            });
        }
        card_frame(&mut cols[2], true, |ui: &mut Ui| {
            ui.label(RichText::new("Total Active Sites").strong());
            ui.label(RichText::new(summary.active_sites.to_string()).size(28.0).strong());
        });
    });
}

// ---------------------------------------------------------------------------
// Single-site details
// ---------------------------------------------------------------------------

const DETAIL_COLUMNS_PER_ROW: usize = 5;

/// Detail cards for one site. Columns the sheet lacks show `N/A`.
pub fn site_details(ui: &mut Ui, table: &Table, row: usize, identifier: Option<&str>, config: &DashboardConfig) {
    let site = identifier
        .and_then(|id| table.cell(row, id))
        .map(|v| v.to_string())
        .unwrap_or_else(|| "-".to_string());
    ui.heading(format!("SITE: {site}"));

    egui::Grid::new("site_details")
        .num_columns(DETAIL_COLUMNS_PER_ROW)
        .spacing([12.0, 12.0])
        .show(ui, |ui: &mut Ui| {
            for (i, name) in config.detail_columns.iter().enumerate() {
                let value = table
                    .cell(row, name)
                    .map(|v| v.to_string())
                    .unwrap_or_else(|| "N/A".to_string());
                card_frame(ui, false, |ui: &mut Ui| {
                    ui.label(RichText::new(name).small().weak());
                    ui.label(RichText::new(value).strong());
                });
                if (i + 1) % DETAIL_COLUMNS_PER_ROW == 0 {
                    ui.end_row();
                }
            }
        });
}

// ---------------------------------------------------------------------------
// Site inventory table
// ---------------------------------------------------------------------------

/// Columns of the inventory table: configured columns present in the sheet,
/// then the latest periodic and daily columns.
pub fn inventory_columns(view: &DashboardView, config: &DashboardConfig) -> Vec<String> {
    let table = &view.filtered;
    let mut cols: Vec<String> = config
        .inventory_columns
        .iter()
        .filter_map(|c| table.column_index(c).map(|i| table.column_names()[i].clone()))
        .collect();
    let columns = &view.snapshot.columns;
    for latest in [columns.latest_period(), columns.latest_day()].into_iter().flatten() {
        if !cols.contains(&latest.name) {
            cols.push(latest.name.clone());
        }
    }
    cols
}

pub fn inventory_table(ui: &mut Ui, view: &DashboardView, config: &DashboardConfig) {
    let table = &view.filtered;
    ui.heading(format!("Site Inventory ({} Results)", table.len()));

    if table.is_empty() {
        ui.label(RichText::new("No sites match the current filters.").weak());
        return;
    }

    let cols = inventory_columns(view, config);
    if cols.is_empty() {
        ui.label(RichText::new("None of the inventory columns are in this sheet.").weak());
        return;
    }

    TableBuilder::new(ui)
        .id_salt("site_inventory")
        .striped(true)
        .max_scroll_height(420.0)
        .columns(Column::auto().resizable(true), cols.len())
        .header(22.0, |mut header| {
            for c in &cols {
                header.col(|ui: &mut Ui| {
                    ui.strong(c.as_str());
                });
            }
        })
        .body(|body| {
            body.rows(20.0, table.len(), |mut row| {
                let idx = row.index();
                for c in &cols {
                    let text = table
                        .cell(idx, c)
                        .map(|v| v.to_string())
                        .unwrap_or_default();
                    row.col(|ui: &mut Ui| {
                        ui.label(text);
                    });
                }
            });
        });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::AppState;

    #[test]
    fn inventory_adds_latest_metric_columns() {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("current.csv");
        std::fs::write(
            &data,
            "SID,Region,Technology,2024-01-01,2024-01-02,TCH% Jan,TCH% Feb\nA,N,4G,1,2,3,4\n",
        )
        .unwrap();
        let config = DashboardConfig {
            data_path: data,
            ..Default::default()
        };
        let state = AppState::new(config);
        let view = state.view.as_ref().unwrap();
        assert_eq!(
            inventory_columns(view, &state.config),
            vec!["SID", "REGION", "TECHNOLOGY", "TCH% FEB", "2024-01-02"]
        );
    }

}
