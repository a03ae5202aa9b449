use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{DashboardError, DashboardResult};

use super::classify::{classify, ClassifiedColumns, IdentifierRule};
use super::loader::{load_file, read_csv, write_csv};
use super::model::{normalize_column_name, Table};

// ---------------------------------------------------------------------------
// Data source: where the published sheet lives
// ---------------------------------------------------------------------------

/// Storage behind the dashboard. Loading and publishing are blocking calls.
pub trait DataSource {
    /// The currently published table, or `DataUnavailable` if there is none.
    fn load_table(&self) -> DashboardResult<Table>;

    /// Make `table` the published table. Must not leave a partial result.
    fn publish(&self, table: &Table) -> DashboardResult<()>;

    /// Short human description for the status bar.
    fn describe(&self) -> String;
}

/// The canonical CSV file on disk.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileSource { path: path.into() }
    }
}

impl DataSource for FileSource {
    fn load_table(&self) -> DashboardResult<Table> {
        if !self.path.exists() {
            return Err(DashboardError::DataUnavailable {
                path: self.path.clone(),
            });
        }
        // The canonical file is always CSV, whatever its extension says.
        std::fs::File::open(&self.path)
            .map_err(anyhow::Error::from)
            .and_then(read_csv)
            .map_err(|e| DashboardError::upload(&self.path, e))
    }

    /// Write to a temp file in the same directory, then rename over the
    /// canonical file.
    fn publish(&self, table: &Table) -> DashboardResult<()> {
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir)?;

        let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
        write_csv(table, &mut tmp).map_err(|e| std::io::Error::other(format!("{e:#}")))?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

// ---------------------------------------------------------------------------
// Snapshot: one published table plus everything derived from its header
// ---------------------------------------------------------------------------

/// An immutable loaded table with its column classification and filter
/// choices, computed once per load.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub table: Table,
    pub columns: ClassifiedColumns,
    /// Sorted identifier values for the station picker.
    pub identifier_options: Vec<String>,
    /// Configured filter dimension → sorted distinct values.
    pub filter_options: BTreeMap<String, Vec<String>>,
    /// Configured filter dimensions the table does not have.
    pub missing_filters: Vec<String>,
}

impl Snapshot {
    pub fn new(table: Table, identifier: &IdentifierRule, filter_dimensions: &[String]) -> Self {
        let columns = classify(table.column_names(), identifier);

        let identifier_options = columns
            .identifier
            .as_deref()
            .map(|id| distinct_text(&table, id))
            .unwrap_or_default();

        let mut filter_options = BTreeMap::new();
        let mut missing_filters = Vec::new();
        for dim in filter_dimensions {
            let dim = normalize_column_name(dim);
            if columns.dimensions.contains(&dim) {
                let values = distinct_text(&table, &dim);
                filter_options.insert(dim, values);
            } else {
                log::warn!("filter '{dim}' omitted: not a dimension column of this sheet");
                missing_filters.push(dim);
            }
        }

        Snapshot {
            table,
            columns,
            identifier_options,
            filter_options,
            missing_filters,
        }
    }
}

fn distinct_text(table: &Table, column: &str) -> Vec<String> {
    let mut values: Vec<String> = table
        .distinct_values(column)
        .iter()
        .map(|v| v.as_text())
        .collect();
    // Numbers and text sort apart in CellValue order; the picker wants one
    // alphabetical list.
    values.sort();
    values.dedup();
    values
}

// ---------------------------------------------------------------------------
// TableStore
// ---------------------------------------------------------------------------

/// Holds the published snapshot behind a single reference.
///
/// A refresh or upload builds a complete new [`Snapshot`] first and only then
/// replaces the reference, so readers see either the old or the new table.
pub struct TableStore {
    source: Box<dyn DataSource>,
    current: Option<Arc<Snapshot>>,
    identifier: IdentifierRule,
    filter_dimensions: Vec<String>,
}

impl TableStore {
    pub fn new(
        source: Box<dyn DataSource>,
        identifier: IdentifierRule,
        filter_dimensions: Vec<String>,
    ) -> Self {
        TableStore {
            source,
            current: None,
            identifier,
            filter_dimensions,
        }
    }

    /// The published snapshot, if any table has been loaded.
    pub fn current(&self) -> Option<Arc<Snapshot>> {
        self.current.clone()
    }

    pub fn source_description(&self) -> String {
        self.source.describe()
    }

    /// Re-read the published table. On failure the previous snapshot stays.
    pub fn refresh(&mut self) -> DashboardResult<Arc<Snapshot>> {
        let table = self.source.load_table()?;
        log::info!(
            "Refreshed {} rows from {}",
            table.len(),
            self.source.describe()
        );
        Ok(self.swap(table))
    }

    /// Parse an uploaded file and publish it as the new canonical table.
    ///
    /// Nothing changes, on disk or in memory, unless parsing and publishing
    /// both succeed.
    pub fn publish_upload(&mut self, upload: &Path) -> DashboardResult<Arc<Snapshot>> {
        let table = load_file(upload).map_err(|e| DashboardError::upload(upload, e))?;
        self.source.publish(&table)?;
        log::info!(
            "Published {} ({} rows) to {}",
            upload.display(),
            table.len(),
            self.source.describe()
        );
        Ok(self.swap(table))
    }

    fn swap(&mut self, table: Table) -> Arc<Snapshot> {
        let snapshot = Arc::new(Snapshot::new(
            table,
            &self.identifier,
            &self.filter_dimensions,
        ));
        self.current = Some(Arc::clone(&snapshot));
        snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHEET: &str = "\
SID,REGION,TGL,2024-01-01,2024-01-02,TCH% Jan
A,North,T1,90,95,80
B,South,T2,70,NaN,60
C,North,T1,85,88,75
";

    fn store_at(path: &Path) -> TableStore {
        TableStore::new(
            Box::new(FileSource::new(path)),
            IdentifierRule::default(),
            vec!["Region".into(), "TGL".into(), "REVENUE CAT".into()],
        )
    }

    #[test]
    fn missing_file_is_data_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_at(&dir.path().join("current.csv"));
        let err = store.refresh().unwrap_err();
        assert!(err.is_data_unavailable());
        assert!(store.current().is_none());
    }

    #[test]
    fn upload_publishes_file_and_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let upload = dir.path().join("upload.csv");
        std::fs::write(&upload, SHEET).unwrap();
        let data = dir.path().join("data").join("current.csv");

        let mut store = store_at(&data);
        let snap = store.publish_upload(&upload).unwrap();
        assert!(data.exists());
        assert_eq!(snap.table.len(), 3);
        assert_eq!(snap.columns.identifier.as_deref(), Some("SID"));
        assert_eq!(snap.identifier_options, vec!["A", "B", "C"]);
        assert_eq!(snap.filter_options["REGION"], vec!["North", "South"]);
        assert_eq!(snap.missing_filters, vec!["REVENUE CAT"]);

        // A fresh store over the same file sees the published table.
        let mut reader = store_at(&data);
        let reloaded = reader.refresh().unwrap();
        assert_eq!(reloaded.table, snap.table);
    }

    #[test]
    fn failed_upload_keeps_previous_table_and_file() {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("current.csv");
        std::fs::write(&data, SHEET).unwrap();

        let mut store = store_at(&data);
        let before = store.refresh().unwrap();

        let bad = dir.path().join("bad.csv");
        std::fs::write(&bad, "SID,Region,REGION\nA,x,y\n").unwrap();
        let err = store.publish_upload(&bad).unwrap_err();
        assert!(matches!(err, DashboardError::UploadParseFailure { .. }));

        let after = store.current().unwrap();
        assert!(Arc::ptr_eq(&before, &after));
        assert_eq!(std::fs::read_to_string(&data).unwrap(), SHEET);
    }

    #[test]
    fn failed_refresh_keeps_previous_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("current.csv");
        std::fs::write(&data, SHEET).unwrap();

        let mut store = store_at(&data);
        let before = store.refresh().unwrap();
        std::fs::remove_file(&data).unwrap();

        assert!(store.refresh().is_err());
        assert!(Arc::ptr_eq(&before, &store.current().unwrap()));
    }

    #[test]
    fn published_file_reloads_whatever_its_extension() {
        let dir = tempfile::tempdir().unwrap();
        let upload = dir.path().join("upload.csv");
        std::fs::write(&upload, SHEET).unwrap();

        for name in ["current.xlsx", "current.json", "current.parquet"] {
            let data = dir.path().join(name);
            let mut store = store_at(&data);
            let published = store.publish_upload(&upload).unwrap();
            let reloaded = store.refresh().unwrap();
            assert_eq!(reloaded.table, published.table, "{name}");
        }
    }

    #[test]
    fn numeric_identifiers_sort_as_text() {
        let table = read_csv("SID,REGION\n20,North\n100,South\nX1,North\n".as_bytes()).unwrap();
        let snap = Snapshot::new(table, &IdentifierRule::default(), &[]);
        assert_eq!(snap.identifier_options, vec!["100", "20", "X1"]);
    }
}
