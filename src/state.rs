use std::path::Path;
use std::sync::Arc;

use crate::color::ChartPalette;
use crate::config::DashboardConfig;
use crate::data::aggregate::{summarize, Summary};
use crate::data::filter::{self, FilterSelection, IdentifierMatch, TextSearch};
use crate::data::model::Table;
use crate::data::series::{build_series, TrendPoint};
use crate::data::store::{FileSource, Snapshot, TableStore};

// ---------------------------------------------------------------------------
// Derived view of the current snapshot under the current selection
// ---------------------------------------------------------------------------

/// Everything the panels render, recomputed after each interaction.
pub struct DashboardView {
    pub snapshot: Arc<Snapshot>,
    pub filtered: Table,
    pub summary: Summary,
    pub daily: Vec<TrendPoint>,
    pub periodic: Vec<TrendPoint>,
    pub auxiliary: Vec<TrendPoint>,
    /// Columns named by the selection that this sheet lacks.
    pub unavailable: Vec<String>,
}

impl DashboardView {
    /// Row index of the only remaining site, if exactly one is left.
    pub fn single_site(&self) -> Option<usize> {
        (self.filtered.len() == 1).then_some(0)
    }
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    pub config: DashboardConfig,
    pub store: TableStore,
    pub palette: ChartPalette,

    /// Current filter constraints.
    pub selection: FilterSelection,

    /// Cached result of the last recompute (None until data is loaded).
    pub view: Option<DashboardView>,

    /// No table has been published yet.
    pub waiting_for_data: bool,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(config: DashboardConfig) -> Self {
        let store = TableStore::new(
            Box::new(FileSource::new(config.data_path.clone())),
            config.identifier_rule(),
            config.filter_dimensions.clone(),
        );
        let mut state = AppState {
            palette: ChartPalette::from_config(&config.colors),
            config,
            store,
            selection: FilterSelection::default(),
            view: None,
            waiting_for_data: true,
            status_message: None,
        };
        state.refresh();
        state
    }

    /// Reload the published table from storage.
    pub fn refresh(&mut self) {
        match self.store.refresh() {
            Ok(_) => {
                self.waiting_for_data = false;
                self.status_message = None;
            }
            Err(e) if e.is_data_unavailable() => {
                log::info!("{e}");
                self.waiting_for_data = self.store.current().is_none();
            }
            Err(e) => {
                log::error!("Failed to refresh data: {e}");
                self.status_message = Some(format!("Error: {e}"));
            }
        }
        self.recompute();
    }

    /// Publish an uploaded sheet as the new canonical table.
    pub fn upload(&mut self, path: &Path) {
        match self.store.publish_upload(path) {
            Ok(snapshot) => {
                self.waiting_for_data = false;
                self.status_message = Some(format!(
                    "Published {} ({} sites)",
                    path.display(),
                    snapshot.table.len()
                ));
            }
            Err(e) => {
                log::error!("Upload failed: {e}");
                self.status_message = Some(format!("Upload failed: {e}"));
            }
        }
        self.recompute();
    }

    /// Re-run filter, aggregates and series on the current snapshot.
    pub fn recompute(&mut self) {
        let Some(snapshot) = self.store.current() else {
            self.view = None;
            return;
        };

        let filtered = filter::apply(&snapshot.table, &self.selection);
        let unavailable = filter::unavailable_columns(&snapshot.table, &self.selection);
        let columns = &snapshot.columns;
        let summary = summarize(&filtered, columns);
        let daily = build_series(&filtered, &columns.time_series, self.config.daily_trend());
        let periodic = build_series(&filtered, &columns.periodic, self.config.periodic_trend());
        let auxiliary = build_series(&filtered, &columns.auxiliary, self.config.auxiliary_trend());

        self.view = Some(DashboardView {
            snapshot,
            filtered,
            summary,
            daily,
            periodic,
            auxiliary,
            unavailable,
        });
    }

    /// Pick one station, or `None` for all sites.
    pub fn select_station(&mut self, value: Option<String>) {
        let column = self
            .store
            .current()
            .and_then(|s| s.columns.identifier.clone());
        self.selection.identifier = match (column, value) {
            (Some(column), Some(value)) => Some(IdentifierMatch { column, value }),
            _ => None,
        };
        self.recompute();
    }

    pub fn selected_station(&self) -> Option<&str> {
        self.selection.identifier.as_ref().map(|m| m.value.as_str())
    }

    /// Toggle a single value in a dimension filter.
    pub fn toggle_filter_value(&mut self, column: &str, value: &str) {
        self.selection.toggle(column, value);
        self.recompute();
    }

    /// Remove every constraint on one dimension.
    pub fn clear_dimension(&mut self, column: &str) {
        self.selection.clear_dimension(column);
        self.recompute();
    }

    pub fn set_search(&mut self, query: String) {
        self.selection.search = Some(TextSearch {
            query,
            columns: self.config.search_columns.clone(),
        });
        self.recompute();
    }

    pub fn search_query(&self) -> &str {
        self.selection
            .search
            .as_ref()
            .map_or("", |s| s.query.as_str())
    }

    /// Drop every constraint and reload the sheet.
    pub fn clear_filters(&mut self) {
        self.selection.clear();
        self.refresh();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHEET: &str = "\
SID,REGION,TGL,GRID,2024-01-01,2024-01-02,TCH% Jan,Jan (Fuel)
A,North,T1,G-10,90,95,80,120
B,South,T2,G-20,70,NaN,60,80
C,North,T2,G-30,80,85,70,
";

    fn state_with_sheet() -> (tempfile::TempDir, AppState) {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("current.csv");
        std::fs::write(&data, SHEET).unwrap();
        let config = DashboardConfig {
            data_path: data,
            ..Default::default()
        };
        (dir, AppState::new(config))
    }

    #[test]
    fn waits_when_nothing_is_published() {
        let dir = tempfile::tempdir().unwrap();
        let config = DashboardConfig {
            data_path: dir.path().join("none.csv"),
            ..Default::default()
        };
        let state = AppState::new(config);
        assert!(state.waiting_for_data);
        assert!(state.view.is_none());
        assert!(state.status_message.is_none());
    }

    #[test]
    fn loads_and_summarizes_everything_initially() {
        let (_dir, state) = state_with_sheet();
        let view = state.view.as_ref().unwrap();
        assert_eq!(view.summary.active_sites, 3);
        assert_eq!(view.summary.latest_day.as_ref().unwrap().aggregate.mean, Some(90.0));
        assert_eq!(view.daily.len(), 2);
        assert_eq!(view.periodic.len(), 1);
        assert_eq!(view.auxiliary[0].value, Some(100.0));
        assert!(view.single_site().is_none());
    }

    #[test]
    fn filters_drive_metrics_and_series() {
        let (_dir, mut state) = state_with_sheet();
        state.toggle_filter_value("REGION", "South");
        let view = state.view.as_ref().unwrap();
        assert_eq!(view.summary.active_sites, 1);
        assert_eq!(view.summary.latest_day.as_ref().unwrap().aggregate.mean, None);
        assert_eq!(view.single_site(), Some(0));

        state.clear_dimension("REGION");
        assert_eq!(state.view.as_ref().unwrap().summary.active_sites, 3);
    }

    #[test]
    fn station_and_search() {
        let (_dir, mut state) = state_with_sheet();
        state.select_station(Some("C".into()));
        assert_eq!(state.selected_station(), Some("C"));
        assert_eq!(state.view.as_ref().unwrap().filtered.len(), 1);

        state.select_station(None);
        state.set_search("g-2".into());
        let view = state.view.as_ref().unwrap();
        assert_eq!(view.filtered.cell(0, "SID").unwrap().as_text(), "B");

        state.clear_filters();
        assert_eq!(state.search_query(), "");
        assert_eq!(state.view.as_ref().unwrap().filtered.len(), 3);
    }

    #[test]
    fn failed_upload_reports_and_keeps_data() {
        let (dir, mut state) = state_with_sheet();
        let bad = dir.path().join("bad.txt");
        std::fs::write(&bad, "whatever").unwrap();
        state.upload(&bad);
        assert!(state.status_message.as_deref().unwrap().starts_with("Upload failed"));
        assert_eq!(state.view.as_ref().unwrap().summary.active_sites, 3);
    }
}
