use std::path::PathBuf;

use thiserror::Error;

// ---------------------------------------------------------------------------
// Dashboard error taxonomy
// ---------------------------------------------------------------------------

/// Errors surfaced by the data layer to the UI.
///
/// Per-cell coercion problems are never errors: cells that cannot be read as
/// numbers are stored as [`crate::data::model::CellValue::Missing`].
#[derive(Debug, Error)]
pub enum DashboardError {
    /// No table has been published yet. Shown as a "waiting for data" state.
    #[error("no data published yet at {}", path.display())]
    DataUnavailable { path: PathBuf },

    /// A column the dashboard expects is not in the current table.
    #[error("column '{column}' is not present in the current table")]
    SchemaMismatch { column: String },

    /// An uploaded or stored file could not be parsed into a table.
    #[error("could not read '{file}': {reason}")]
    UploadParseFailure { file: String, reason: String },

    #[error("invalid config {}: {reason}", path.display())]
    Config { path: PathBuf, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl DashboardError {
    pub fn schema_mismatch(column: &str) -> Self {
        DashboardError::SchemaMismatch {
            column: column.to_string(),
        }
    }

    /// Wrap a loader failure, keeping the full context chain as the reason.
    pub fn upload(file: &std::path::Path, err: anyhow::Error) -> Self {
        DashboardError::UploadParseFailure {
            file: file.display().to_string(),
            reason: format!("{err:#}"),
        }
    }

    /// `true` for the informational "nothing loaded yet" state.
    pub fn is_data_unavailable(&self) -> bool {
        matches!(self, DashboardError::DataUnavailable { .. })
    }
}

pub type DashboardResult<T> = std::result::Result<T, DashboardError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_failure_keeps_context_chain() {
        let inner = anyhow::anyhow!("bad header").context("reading CSV headers");
        let err = DashboardError::upload(std::path::Path::new("sites.csv"), inner);
        let msg = err.to_string();
        assert!(msg.contains("sites.csv"));
        assert!(msg.contains("reading CSV headers"));
        assert!(msg.contains("bad header"));
    }

    #[test]
    fn only_missing_data_is_informational() {
        let missing = DashboardError::DataUnavailable {
            path: PathBuf::from("data/current_availability.csv"),
        };
        assert!(missing.is_data_unavailable());
        assert!(!DashboardError::schema_mismatch("REGION").is_data_unavailable());
    }
}
