use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::data::classify::IdentifierRule;
use crate::data::series::TrendWindow;
use crate::error::{DashboardError, DashboardResult};

/// Environment variable naming an alternative config file.
pub const CONFIG_ENV: &str = "CELL_DASHBOARD_CONFIG";
/// Config file picked up from the working directory when present.
pub const DEFAULT_CONFIG_FILE: &str = "dashboard.json";

// ---------------------------------------------------------------------------
// Dashboard configuration
// ---------------------------------------------------------------------------

/// Everything site-specific about the dashboard. Every field has a default,
/// so a config file only needs the keys it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Canonical published sheet.
    pub data_path: PathBuf,
    /// Station identifier column; `null` picks the first non-metric column.
    pub identifier_column: Option<String>,
    /// Dimensions offered as multi-select filters, in display order.
    pub filter_dimensions: Vec<String>,
    /// Columns matched by the free-text search box.
    pub search_columns: Vec<String>,
    /// Columns shown on the single-site detail cards.
    pub detail_columns: Vec<String>,
    /// Leading columns of the site inventory table.
    pub inventory_columns: Vec<String>,
    pub daily_window: usize,
    /// Chart daily history up to the day before the latest column.
    pub exclude_latest_day: bool,
    pub periodic_window: usize,
    pub auxiliary_window: usize,
    pub colors: ChartColors,
}

/// Chart line colours as `#rrggbb`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartColors {
    pub daily: String,
    pub periodic: String,
    pub auxiliary: String,
}

impl Default for ChartColors {
    fn default() -> Self {
        ChartColors {
            daily: "#3b82f6".into(),
            periodic: "#10b981".into(),
            auxiliary: "#f59e0b".into(),
        }
    }
}

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

impl Default for DashboardConfig {
    fn default() -> Self {
        DashboardConfig {
            data_path: PathBuf::from("data/current_availability.csv"),
            identifier_column: Some("SID".into()),
            filter_dimensions: names(&["REGION", "TGL", "NEW USF SITES", "REVENUE CAT"]),
            search_columns: names(&["SID", "GRID"]),
            detail_columns: names(&[
                "REGION",
                "TGL",
                "GRID",
                "TECHNOLOGY",
                "SITE CATEGORY",
                "CO",
                "SUB CITIES",
                "DEPENDANCY",
                "NPS SITES",
                "SITE IMPORTANCE",
                "REVENUE CAT",
                "ONAIRDATE",
                "NEW USF SITES",
                "SHARING STATUS",
                "SHARED WITH",
                "OMO SITE ID",
                "SOLAR SITES",
                "LI-ION SITES",
            ]),
            inventory_columns: names(&[
                "SID",
                "REGION",
                "TGL",
                "GRID",
                "TECHNOLOGY",
                "SITE CATEGORY",
            ]),
            daily_window: 7,
            exclude_latest_day: false,
            periodic_window: 6,
            auxiliary_window: 6,
            colors: ChartColors::default(),
        }
    }
}

impl DashboardConfig {
    /// Read a config file. Missing keys fall back to defaults.
    pub fn from_file(path: &Path) -> DashboardResult<Self> {
        let text = std::fs::read_to_string(path)?;
        serde_json::from_str(&text).map_err(|e| DashboardError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Config from `$CELL_DASHBOARD_CONFIG`, else `./dashboard.json`, else
    /// built-in defaults.
    pub fn load() -> DashboardResult<Self> {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            log::info!("Using config from {CONFIG_ENV}={path}");
            return Self::from_file(Path::new(&path));
        }
        let local = Path::new(DEFAULT_CONFIG_FILE);
        if local.exists() {
            log::info!("Using config {}", local.display());
            return Self::from_file(local);
        }
        log::info!("No config file, using defaults");
        Ok(Self::default())
    }

    pub fn identifier_rule(&self) -> IdentifierRule {
        match &self.identifier_column {
            Some(name) => IdentifierRule::Named(name.clone()),
            None => IdentifierRule::FirstColumn,
        }
    }

    pub fn daily_trend(&self) -> TrendWindow {
        TrendWindow {
            size: self.daily_window,
            skip_latest: self.exclude_latest_day,
        }
    }

    pub fn periodic_trend(&self) -> TrendWindow {
        TrendWindow::last(self.periodic_window)
    }

    pub fn auxiliary_trend(&self) -> TrendWindow {
        TrendWindow::last(self.auxiliary_window)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dashboard.json");
        std::fs::write(
            &path,
            r##"{ "data_path": "/srv/sheet.csv", "daily_window": 14, "colors": { "daily": "#ff0000" } }"##,
        )
        .unwrap();

        let cfg = DashboardConfig::from_file(&path).unwrap();
        assert_eq!(cfg.data_path, PathBuf::from("/srv/sheet.csv"));
        assert_eq!(cfg.daily_window, 14);
        assert_eq!(cfg.colors.daily, "#ff0000");
        assert_eq!(cfg.colors.periodic, ChartColors::default().periodic);
        assert_eq!(cfg.periodic_window, 6);
        assert_eq!(cfg.identifier_rule(), IdentifierRule::Named("SID".into()));
    }

    #[test]
    fn null_identifier_means_first_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dashboard.json");
        std::fs::write(&path, r#"{ "identifier_column": null }"#).unwrap();
        let cfg = DashboardConfig::from_file(&path).unwrap();
        assert_eq!(cfg.identifier_rule(), IdentifierRule::FirstColumn);
    }

    #[test]
    fn malformed_file_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dashboard.json");
        std::fs::write(&path, "{ daily_window: }").unwrap();
        let err = DashboardConfig::from_file(&path).unwrap_err();
        assert!(matches!(err, DashboardError::Config { .. }));
    }

    #[test]
    fn trend_windows_follow_config() {
        let cfg = DashboardConfig {
            exclude_latest_day: true,
            ..Default::default()
        };
        assert_eq!(
            cfg.daily_trend(),
            TrendWindow {
                size: 7,
                skip_latest: true
            }
        );
        assert_eq!(cfg.auxiliary_trend(), TrendWindow::last(6));
    }
}
