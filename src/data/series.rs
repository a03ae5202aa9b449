use super::aggregate::aggregate_cells;
use super::classify::MetricColumn;
use super::model::Table;

// ---------------------------------------------------------------------------
// Trend series for the charts
// ---------------------------------------------------------------------------

/// One x-axis position of a trend chart.
#[derive(Debug, Clone, PartialEq)]
pub struct TrendPoint {
    pub column: String,
    pub label: String,
    /// `None` when the column has no numeric cell (or is absent). The point
    /// is kept so the x-axis spacing does not shift between refreshes.
    pub value: Option<f64>,
}

/// Which suffix of a metric group a chart shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrendWindow {
    pub size: usize,
    /// Leave out the most recent column (history up to yesterday).
    pub skip_latest: bool,
}

impl TrendWindow {
    pub fn last(size: usize) -> Self {
        TrendWindow {
            size,
            skip_latest: false,
        }
    }

    /// The columns this window covers, oldest first.
    pub fn select<'a>(&self, columns: &'a [MetricColumn]) -> &'a [MetricColumn] {
        let end = if self.skip_latest {
            columns.len().saturating_sub(1)
        } else {
            columns.len()
        };
        &columns[end.saturating_sub(self.size)..end]
    }
}

/// Column means for the last `window.size` columns, in column order.
///
/// No sorting happens here: the output is the x-axis as-is.
pub fn build_series(table: &Table, columns: &[MetricColumn], window: TrendWindow) -> Vec<TrendPoint> {
    window
        .select(columns)
        .iter()
        .map(|metric| TrendPoint {
            column: metric.name.clone(),
            label: metric.label.clone(),
            value: table
                .column(&metric.name)
                .and_then(|cells| aggregate_cells(cells).mean),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::classify::{classify, IdentifierRule};
    use crate::data::model::CellValue;

    fn table(headers: &[&str], rows: &[&[&str]]) -> Table {
        Table::from_rows(
            headers,
            rows.iter()
                .map(|r| r.iter().map(|s| CellValue::from_raw(s)).collect())
                .collect(),
        )
        .unwrap()
    }

    fn pairs(points: &[TrendPoint]) -> Vec<(&str, Option<f64>)> {
        points.iter().map(|p| (p.label.as_str(), p.value)).collect()
    }

    #[test]
    fn column_order_is_kept_regardless_of_values() {
        let t = table(&["SID", "2024-01-01", "2024-01-02"], &[&["A", "5", "1"]]);
        let cols = classify(t.column_names(), &IdentifierRule::default());
        let series = build_series(&t, &cols.time_series, TrendWindow::last(2));
        assert_eq!(pairs(&series), vec![("01-Jan", Some(5.0)), ("02-Jan", Some(1.0))]);
    }

    #[test]
    fn window_takes_the_most_recent_suffix() {
        let t = table(
            &["2024-01-01", "2024-01-02", "2024-01-03", "2024-01-04"],
            &[&["1", "2", "3", "4"]],
        );
        let cols = classify(t.column_names(), &IdentifierRule::default());

        let last_two = build_series(&t, &cols.time_series, TrendWindow::last(2));
        assert_eq!(pairs(&last_two), vec![("03-Jan", Some(3.0)), ("04-Jan", Some(4.0))]);

        let all = build_series(&t, &cols.time_series, TrendWindow::last(10));
        assert_eq!(all.len(), 4);

        let history = build_series(
            &t,
            &cols.time_series,
            TrendWindow {
                size: 2,
                skip_latest: true,
            },
        );
        assert_eq!(pairs(&history), vec![("02-Jan", Some(2.0)), ("03-Jan", Some(3.0))]);
    }

    #[test]
    fn empty_columns_keep_their_slot() {
        let t = table(
            &["TCH% JAN", "TCH% FEB", "TCH% MAR"],
            &[&["80", "", "90"], &["60", "x", "70"]],
        );
        let cols = classify(t.column_names(), &IdentifierRule::default());
        let series = build_series(&t, &cols.periodic, TrendWindow::last(6));
        assert_eq!(
            pairs(&series),
            vec![("JAN", Some(70.0)), ("FEB", None), ("MAR", Some(80.0))]
        );
    }

    #[test]
    fn no_columns_no_points() {
        let t = table(&["SID"], &[&["A"]]);
        let cols = classify(t.column_names(), &IdentifierRule::default());
        assert!(build_series(&t, &cols.auxiliary, TrendWindow::last(6)).is_empty());
        let skip = TrendWindow {
            size: 6,
            skip_latest: true,
        };
        assert!(skip.select(&cols.time_series).is_empty());
    }

    #[test]
    fn auxiliary_labels_drop_the_marker() {
        let t = table(&["JAN (FUEL)", "FEB (FUEL)"], &[&["100", "300"], &["200", "100"]]);
        let cols = classify(t.column_names(), &IdentifierRule::default());
        let series = build_series(&t, &cols.auxiliary, TrendWindow::last(6));
        assert_eq!(pairs(&series), vec![("JAN", Some(150.0)), ("FEB", Some(200.0))]);
    }
}
