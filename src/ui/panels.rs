use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::data::loader::SUPPORTED_EXTENSIONS;
use crate::state::AppState;

/// A user interaction collected while drawing, applied once the widgets
/// no longer borrow the current snapshot.
enum PanelAction {
    SelectStation(Option<String>),
    Search(String),
    Toggle { column: String, value: String },
    ClearDimension(String),
}

impl PanelAction {
    fn apply(self, state: &mut AppState) {
        match self {
            PanelAction::SelectStation(value) => state.select_station(value),
            PanelAction::Search(query) => state.set_search(query),
            PanelAction::Toggle { column, value } => state.toggle_filter_value(&column, &value),
            PanelAction::ClearDimension(column) => state.clear_dimension(&column),
        }
    }
}

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filters");
    ui.separator();

    let Some(snapshot) = state.store.current() else {
        ui.label("No sheet loaded.");
        return;
    };

    let mut actions = Vec::new();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            // ---- Station selector ----
            if snapshot.columns.identifier.is_some() {
                ui.strong("Select Station");
                let current = state.selected_station().map(str::to_owned);
                egui::ComboBox::from_id_salt("station")
                    .selected_text(current.as_deref().unwrap_or("All Sites"))
                    .width(ui.available_width())
                    .show_ui(ui, |ui: &mut Ui| {
                        if ui.selectable_label(current.is_none(), "All Sites").clicked() {
                            actions.push(PanelAction::SelectStation(None));
                        }
                        for id in &snapshot.identifier_options {
                            let chosen = current.as_deref() == Some(id.as_str());
                            if ui.selectable_label(chosen, id.as_str()).clicked() {
                                actions.push(PanelAction::SelectStation(Some(id.clone())));
                            }
                        }
                    });
                ui.separator();
            }

            // ---- Free-text search ----
            ui.strong("Search");
            let mut query = state.search_query().to_owned();
            let edit = ui.add(
                egui::TextEdit::singleline(&mut query)
                    .hint_text(state.config.search_columns.join(" / ")),
            );
            if edit.changed() {
                actions.push(PanelAction::Search(query));
            }
            ui.separator();

            // ---- Per-dimension filters (collapsible) ----
            for (col, values) in &snapshot.filter_options {
                let n_selected = state.selection.dimensions.get(col).map_or(0, |s| s.len());
                let header_text = if n_selected == 0 {
                    format!("{col}  (all)")
                } else {
                    format!("{col}  ({n_selected}/{})", values.len())
                };

                egui::CollapsingHeader::new(RichText::new(header_text).strong())
                    .id_salt(col)
                    .default_open(false)
                    .show(ui, |ui: &mut Ui| {
                        if ui.small_button("Clear").clicked() {
                            actions.push(PanelAction::ClearDimension(col.clone()));
                        }
                        for val in values {
                            let mut checked = state.selection.accepts(col, val);
                            if ui.checkbox(&mut checked, val.as_str()).changed() {
                                actions.push(PanelAction::Toggle {
                                    column: col.clone(),
                                    value: val.clone(),
                                });
                            }
                        }
                    });
            }

            if !snapshot.missing_filters.is_empty() {
                ui.label(
                    RichText::new(format!(
                        "Not in this sheet: {}",
                        snapshot.missing_filters.join(", ")
                    ))
                    .weak(),
                );
            }

            ui.separator();

            // ---- How each column was read ----
            egui::CollapsingHeader::new("Sheet layout")
                .id_salt("sheet_layout")
                .default_open(false)
                .show(ui, |ui: &mut Ui| {
                    egui::Grid::new("sheet_layout_grid")
                        .num_columns(2)
                        .striped(true)
                        .show(ui, |ui: &mut Ui| {
                            for name in snapshot.table.column_names() {
                                ui.label(name.as_str());
                                let role = snapshot
                                    .columns
                                    .role_of(name)
                                    .map_or("-", |r| r.label());
                                ui.label(RichText::new(role).weak());
                                ui.end_row();
                            }
                        });
                });
        });

    for action in actions {
        action.apply(state);
    }
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Upload sheet…").clicked() {
                upload_file_dialog(state);
                ui.close_menu();
            }
            if ui.button("Refresh").clicked() {
                state.refresh();
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(view) = &state.view {
            ui.label(format!(
                "{} sites loaded, {} shown",
                view.snapshot.table.len(),
                view.filtered.len()
            ));
        }

        ui.separator();

        if state.selection.is_active() {
            ui.label(RichText::new("Filters active").color(Color32::from_rgb(0xd9, 0x77, 0x06)));
        }
        if ui.button("Clear Filters").clicked() {
            state.clear_filters();
        }

        if let Some(msg) = &state.status_message {
            let color = if msg.starts_with("Published") {
                Color32::from_rgb(0x16, 0xa3, 0x4a)
            } else {
                Color32::RED
            };
            ui.label(RichText::new(msg).color(color));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn upload_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Upload availability sheet")
        .add_filter("Supported files", SUPPORTED_EXTENSIONS)
        .add_filter("Excel", &["xlsx", "xls"])
        .add_filter("CSV", &["csv"])
        .pick_file();

    if let Some(path) = file {
        state.upload(&path);
    }
}
