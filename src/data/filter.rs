use std::collections::{BTreeMap, BTreeSet};

use super::model::{normalize_column_name, CellValue, Table};

// ---------------------------------------------------------------------------
// Filter selection: what the viewer picked in the side panel
// ---------------------------------------------------------------------------

/// Exact match on the identifier column ("Select Station ID").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentifierMatch {
    pub column: String,
    pub value: String,
}

/// Case-insensitive substring search across a few text columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextSearch {
    pub query: String,
    pub columns: Vec<String>,
}

/// All active constraints. Rows must satisfy every one of them.
///
/// A dimension that is absent from `dimensions`, or maps to an empty set,
/// is unconstrained. An empty set never means "match nothing".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSelection {
    /// `None` stands for "All Sites".
    pub identifier: Option<IdentifierMatch>,
    /// Dimension column → accepted cell texts.
    pub dimensions: BTreeMap<String, BTreeSet<String>>,
    pub search: Option<TextSearch>,
}

impl FilterSelection {
    /// `true` when at least one constraint narrows the table.
    pub fn is_active(&self) -> bool {
        self.identifier.is_some()
            || self.dimensions.values().any(|s| !s.is_empty())
            || self.search.as_ref().is_some_and(|s| !s.query.trim().is_empty())
    }

    /// Add or remove one accepted value for a dimension.
    pub fn toggle(&mut self, column: &str, value: &str) {
        let accepted = self
            .dimensions
            .entry(normalize_column_name(column))
            .or_default();
        if !accepted.remove(value) {
            accepted.insert(value.to_string());
        }
    }

    pub fn accepts(&self, column: &str, value: &str) -> bool {
        self.dimensions
            .get(&normalize_column_name(column))
            .is_some_and(|s| s.contains(value))
    }

    /// Drop every accepted value of one dimension, leaving it unconstrained.
    pub fn clear_dimension(&mut self, column: &str) {
        self.dimensions.remove(&normalize_column_name(column));
    }

    pub fn clear(&mut self) {
        *self = FilterSelection::default();
    }

    /// Columns the selection refers to, in a stable order.
    fn referenced_columns(&self) -> Vec<&str> {
        let mut cols: Vec<&str> = Vec::new();
        if let Some(id) = &self.identifier {
            cols.push(&id.column);
        }
        cols.extend(
            self.dimensions
                .iter()
                .filter(|(_, s)| !s.is_empty())
                .map(|(c, _)| c.as_str()),
        );
        if let Some(search) = self.search.as_ref().filter(|s| !s.query.trim().is_empty()) {
            cols.extend(search.columns.iter().map(String::as_str));
        }
        cols
    }
}

// ---------------------------------------------------------------------------
// Filter engine
// ---------------------------------------------------------------------------

/// Constraints of a selection resolved against one table's columns.
enum Constraint<'a> {
    Equals(&'a [CellValue], &'a str),
    OneOf(&'a [CellValue], &'a BTreeSet<String>),
    Search(Vec<&'a [CellValue]>, String),
}

impl Constraint<'_> {
    fn holds(&self, row: usize) -> bool {
        match self {
            Constraint::Equals(col, value) => {
                !col[row].is_missing() && col[row].as_text() == *value
            }
            Constraint::OneOf(col, accepted) => {
                !col[row].is_missing() && accepted.contains(&col[row].as_text())
            }
            Constraint::Search(cols, needle) => cols.iter().any(|col| {
                !col[row].is_missing() && col[row].as_text().to_lowercase().contains(needle)
            }),
        }
    }
}

/// Columns named by an active constraint that the table does not have.
/// Those constraints are skipped by [`filtered_indices`].
pub fn unavailable_columns(table: &Table, selection: &FilterSelection) -> Vec<String> {
    let mut missing: Vec<String> = Vec::new();
    for name in selection.referenced_columns() {
        let name = normalize_column_name(name);
        if !table.has_column(&name) && !missing.contains(&name) {
            missing.push(name);
        }
    }
    missing
}

fn resolve<'a>(table: &'a Table, selection: &'a FilterSelection) -> Vec<Constraint<'a>> {
    let mut constraints = Vec::new();

    if let Some(id) = &selection.identifier {
        match table.column(&id.column) {
            Some(col) => constraints.push(Constraint::Equals(col, &id.value)),
            None => log::warn!("identifier filter skipped: no column '{}'", id.column),
        }
    }

    for (name, accepted) in &selection.dimensions {
        if accepted.is_empty() {
            continue;
        }
        match table.column(name) {
            Some(col) => constraints.push(Constraint::OneOf(col, accepted)),
            None => log::warn!("dimension filter skipped: no column '{name}'"),
        }
    }

    if let Some(search) = &selection.search {
        let needle = search.query.trim().to_lowercase();
        if !needle.is_empty() {
            let cols: Vec<&[CellValue]> = search
                .columns
                .iter()
                .filter_map(|c| {
                    let col = table.column(c);
                    if col.is_none() {
                        log::warn!("search skips missing column '{c}'");
                    }
                    col
                })
                .collect();
            if !cols.is_empty() {
                constraints.push(Constraint::Search(cols, needle));
            }
        }
    }

    constraints
}

/// Indices of rows that pass every active constraint, in table order.
pub fn filtered_indices(table: &Table, selection: &FilterSelection) -> Vec<usize> {
    let constraints = resolve(table, selection);
    (0..table.len())
        .filter(|&row| constraints.iter().all(|c| c.holds(row)))
        .collect()
}

/// The filtered row subset as a new table. The source is left untouched.
pub fn apply(table: &Table, selection: &FilterSelection) -> Table {
    table.select_rows(&filtered_indices(table, selection))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sites() -> Table {
        let rows = [
            ("A", "North", "4G", "GR-01"),
            ("B", "South", "3G", "GR-02"),
            ("C", "North", "3G", "gr-03"),
            ("D", "", "4G", "GR-04"),
        ];
        Table::from_rows(
            &["SID", "REGION", "TECHNOLOGY", "GRID"],
            rows.iter()
                .map(|(a, b, c, d)| {
                    [a, b, c, d].iter().map(|s| CellValue::from_raw(s)).collect()
                })
                .collect(),
        )
        .unwrap()
    }

    fn dims(pairs: &[(&str, &[&str])]) -> FilterSelection {
        FilterSelection {
            dimensions: pairs
                .iter()
                .map(|(c, vs)| (c.to_string(), vs.iter().map(|v| v.to_string()).collect()))
                .collect(),
            ..Default::default()
        }
    }

    fn ids(table: &Table) -> Vec<String> {
        table.column("SID").unwrap().iter().map(CellValue::as_text).collect()
    }

    #[test]
    fn empty_selection_returns_whole_table() {
        let t = sites();
        let sel = dims(&[("REGION", &[]), ("TECHNOLOGY", &[])]);
        assert!(!sel.is_active());
        assert_eq!(apply(&t, &sel), t);
        assert_eq!(apply(&t, &FilterSelection::default()), t);
    }

    #[test]
    fn dimensions_are_anded() {
        let t = sites();
        let sel = dims(&[("REGION", &["North"]), ("TECHNOLOGY", &["3G"])]);
        assert_eq!(ids(&apply(&t, &sel)), vec!["C"]);

        let sel = dims(&[("REGION", &["North", "South"])]);
        assert_eq!(ids(&apply(&t, &sel)), vec!["A", "B", "C"]);
    }

    #[test]
    fn missing_cells_never_match_a_set() {
        let t = sites();
        let sel = dims(&[("REGION", &["North", "South", ""])]);
        assert!(!ids(&apply(&t, &sel)).contains(&"D".to_string()));
    }

    #[test]
    fn filtering_is_idempotent_and_non_mutating() {
        let t = sites();
        let before = t.clone();
        let sel = dims(&[("TECHNOLOGY", &["4G"])]);
        let once = apply(&t, &sel);
        let twice = apply(&once, &sel);
        assert_eq!(once, twice);
        assert_eq!(t, before);
    }

    #[test]
    fn identifier_match_is_exact_and_case_sensitive() {
        let t = Table::from_rows(
            &["SID", "REGION"],
            vec![
                vec![CellValue::from_raw("s123"), CellValue::from_raw("North")],
                vec![CellValue::from_raw("S123"), CellValue::from_raw("South")],
                vec![CellValue::from_raw("S124"), CellValue::from_raw("East")],
            ],
        )
        .unwrap();

        let upper = FilterSelection {
            identifier: Some(IdentifierMatch {
                column: "SID".into(),
                value: "S123".into(),
            }),
            ..Default::default()
        };
        assert_eq!(ids(&apply(&t, &upper)), vec!["S123"]);

        let lower = FilterSelection {
            identifier: Some(IdentifierMatch {
                column: "SID".into(),
                value: "s123".into(),
            }),
            ..Default::default()
        };
        assert_eq!(ids(&apply(&t, &lower)), vec!["s123"]);
    }

    #[test]
    fn numeric_identifiers_compare_as_text() {
        let t = Table::from_columns(
            &["SID"],
            vec![vec![CellValue::from_raw("1001"), CellValue::from_raw("1002")]],
        )
        .unwrap();
        let sel = FilterSelection {
            identifier: Some(IdentifierMatch {
                column: "SID".into(),
                value: "1002".into(),
            }),
            ..Default::default()
        };
        assert_eq!(filtered_indices(&t, &sel), vec![1]);
    }

    #[test]
    fn search_is_case_insensitive_or_across_columns() {
        let t = sites();
        let mut sel = FilterSelection {
            search: Some(TextSearch {
                query: "GR-03".into(),
                columns: vec!["SID".into(), "GRID".into()],
            }),
            ..Default::default()
        };
        assert_eq!(ids(&apply(&t, &sel)), vec!["C"]);

        sel.search.as_mut().unwrap().query = "b".into();
        assert_eq!(ids(&apply(&t, &sel)), vec!["B"]);

        // Combined with a dimension constraint by AND.
        sel.search.as_mut().unwrap().query = "gr-0".into();
        sel.toggle("region", "North");
        assert_eq!(ids(&apply(&t, &sel)), vec!["A", "C"]);

        sel.search.as_mut().unwrap().query = "   ".into();
        sel.clear();
        assert_eq!(apply(&t, &sel).len(), 4);
    }

    #[test]
    fn constraints_on_absent_columns_are_skipped_and_reported() {
        let t = sites();
        let sel = dims(&[("REVENUE CAT", &["Gold"]), ("REGION", &["South"])]);
        assert_eq!(ids(&apply(&t, &sel)), vec!["B"]);
        assert_eq!(unavailable_columns(&t, &sel), vec!["REVENUE CAT"]);
    }

    #[test]
    fn each_unavailable_column_is_reported_once() {
        let t = Table::from_columns(&["REGION"], vec![vec![CellValue::from_raw("North")]]).unwrap();
        let mut sel = dims(&[("TGL", &["T1"])]);
        sel.identifier = Some(IdentifierMatch {
            column: "SID".into(),
            value: "A".into(),
        });
        sel.search = Some(TextSearch {
            query: "a".into(),
            columns: vec!["sid".into(), "GRID".into()],
        });
        assert_eq!(unavailable_columns(&t, &sel), vec!["SID", "TGL", "GRID"]);
        assert_eq!(apply(&t, &sel), t);
    }

    #[test]
    fn toggle_adds_then_removes() {
        let mut sel = FilterSelection::default();
        sel.toggle("Region", "North");
        assert!(sel.accepts("REGION", "North"));
        assert!(sel.is_active());
        sel.toggle("REGION", "North");
        assert!(!sel.accepts("REGION", "North"));
        assert!(!sel.is_active());

        sel.toggle("TGL", "T1");
        sel.toggle("TGL", "T2");
        sel.clear_dimension("tgl");
        assert!(!sel.is_active());
    }
}
