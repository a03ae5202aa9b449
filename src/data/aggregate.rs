use crate::error::{DashboardError, DashboardResult};

use super::classify::{date_caption, ClassifiedColumns, MetricColumn};
use super::model::{CellValue, Table};

// ---------------------------------------------------------------------------
// Column aggregate
// ---------------------------------------------------------------------------

/// Mean of the numeric cells of one column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aggregate {
    /// `None` when no cell is numeric. Callers show that as "no data".
    pub mean: Option<f64>,
    pub valid_count: usize,
    pub total_rows: usize,
}

/// Mean over the cells that hold a number. Missing and text cells count
/// towards `total_rows` only.
pub fn aggregate(table: &Table, column: &str) -> DashboardResult<Aggregate> {
    let cells = table
        .column(column)
        .ok_or_else(|| DashboardError::schema_mismatch(column))?;
    Ok(aggregate_cells(cells))
}

pub(crate) fn aggregate_cells(cells: &[CellValue]) -> Aggregate {
    let (sum, valid_count) = cells
        .iter()
        .filter_map(CellValue::as_f64)
        .fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
    Aggregate {
        mean: (valid_count > 0).then(|| sum / valid_count as f64),
        valid_count,
        total_rows: cells.len(),
    }
}

// ---------------------------------------------------------------------------
// Dashboard summary (the three metric cards)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct MetricCard {
    pub column: String,
    /// Human caption: `05 January 2024` for daily columns, the stripped
    /// label for periodic ones.
    pub caption: String,
    pub aggregate: Aggregate,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    /// Average availability on the most recent day column.
    pub latest_day: Option<MetricCard>,
    /// Average TCH% on the most recent period column.
    pub latest_period: Option<MetricCard>,
    pub active_sites: usize,
}

fn card(table: &Table, metric: Option<&MetricColumn>, caption: impl Fn(&MetricColumn) -> String) -> Option<MetricCard> {
    let metric = metric?;
    match aggregate(table, &metric.name) {
        Ok(aggregate) => Some(MetricCard {
            column: metric.name.clone(),
            caption: caption(metric),
            aggregate,
        }),
        Err(e) => {
            log::warn!("metric card omitted: {e}");
            None
        }
    }
}

/// Compute the summary cards for a (usually filtered) table.
pub fn summarize(table: &Table, columns: &ClassifiedColumns) -> Summary {
    Summary {
        latest_day: card(table, columns.latest_day(), |m| date_caption(&m.name)),
        latest_period: card(table, columns.latest_period(), |m| m.label.clone()),
        active_sites: table.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::classify::{classify, IdentifierRule};

    fn raw_table(headers: &[&str], rows: &[&[&str]]) -> Table {
        Table::from_rows(
            headers,
            rows.iter()
                .map(|r| r.iter().map(|s| CellValue::from_raw(s)).collect())
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn non_numeric_cells_are_left_out_of_the_mean() {
        let t = raw_table(&["V"], &[&["10"], &["x"], &[""], &["20"]]);
        let agg = aggregate(&t, "V").unwrap();
        assert_eq!(agg.mean, Some(15.0));
        assert_eq!(agg.valid_count, 2);
        assert_eq!(agg.total_rows, 4);
    }

    #[test]
    fn no_valid_cells_means_no_mean() {
        let t = raw_table(&["V"], &[&["n/a"], &[""]]);
        let agg = aggregate(&t, "V").unwrap();
        assert_eq!(agg.mean, None);
        assert_eq!(agg.valid_count, 0);
        assert_eq!(agg.total_rows, 2);
    }

    #[test]
    fn absent_column_is_a_schema_mismatch() {
        let t = raw_table(&["V"], &[&["1"]]);
        let err = aggregate(&t, "2024-01-01").unwrap_err();
        assert!(matches!(err, DashboardError::SchemaMismatch { column } if column == "2024-01-01"));
    }

    #[test]
    fn scenario_summary() {
        let t = raw_table(
            &["SID", "REGION", "2024-01-01", "2024-01-02", "TCH% Jan"],
            &[
                &["A", "North", "90", "95", "80"],
                &["B", "South", "70", "NaN", "60"],
            ],
        );
        let cols = classify(t.column_names(), &IdentifierRule::default());

        let day = aggregate(&t, "2024-01-02").unwrap();
        assert_eq!(day.mean, Some(95.0));
        assert_eq!(day.valid_count, 1);
        assert_eq!(day.total_rows, 2);

        let s = summarize(&t, &cols);
        assert_eq!(s.active_sites, 2);
        let latest = s.latest_day.unwrap();
        assert_eq!(latest.column, "2024-01-02");
        assert_eq!(latest.caption, "02 January 2024");
        let period = s.latest_period.unwrap();
        assert_eq!(period.caption, "JAN");
        assert_eq!(period.aggregate.mean, Some(70.0));

        let mut south = crate::data::filter::FilterSelection::default();
        south.toggle("REGION", "South");
        let only_b = crate::data::filter::apply(&t, &south);
        assert_eq!(only_b.len(), 1);
        assert_eq!(only_b.cell(0, "SID").unwrap().as_text(), "B");
    }

    #[test]
    fn summary_without_metrics_still_counts_rows() {
        let t = raw_table(&["SID", "REGION"], &[&["A", "North"]]);
        let cols = classify(t.column_names(), &IdentifierRule::default());
        let s = summarize(&t, &cols);
        assert!(s.latest_day.is_none());
        assert!(s.latest_period.is_none());
        assert_eq!(s.active_sites, 1);
    }
}
