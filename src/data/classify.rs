use chrono::NaiveDate;

use super::model::normalize_column_name;

// ---------------------------------------------------------------------------
// Column roles
// ---------------------------------------------------------------------------

/// Marker in the name of monthly TCH% (traffic channel) columns.
pub const PERIODIC_MARKER: &str = "TCH%";
/// Marker in the name of fuel consumption columns.
pub const AUXILIARY_MARKER: &str = "(FUEL)";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnRole {
    Identifier,
    Dimension,
    /// Daily measurement, the column name is a calendar date.
    TimeSeriesMetric,
    /// Monthly indicator flagged by [`PERIODIC_MARKER`].
    PeriodicMetric,
    /// Resource metric flagged by [`AUXILIARY_MARKER`].
    AuxiliaryMetric,
}

impl ColumnRole {
    pub fn label(self) -> &'static str {
        match self {
            ColumnRole::Identifier => "identifier",
            ColumnRole::Dimension => "dimension",
            ColumnRole::TimeSeriesMetric => "daily",
            ColumnRole::PeriodicMetric => "periodic",
            ColumnRole::AuxiliaryMetric => "auxiliary",
        }
    }
}

/// How the identifier column is picked among the non-metric columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentifierRule {
    /// The column with this (normalized) name, if present.
    Named(String),
    /// The left-most non-metric column.
    FirstColumn,
}

impl Default for IdentifierRule {
    fn default() -> Self {
        IdentifierRule::Named("SID".to_string())
    }
}

// ---------------------------------------------------------------------------
// Declarative rule set
// ---------------------------------------------------------------------------

struct RoleRule {
    role: ColumnRole,
    matches: fn(&str) -> bool,
}

/// Metric rules in precedence order. A column takes the first role whose
/// predicate holds; anything unmatched is a dimension candidate.
const METRIC_RULES: &[RoleRule] = &[
    RoleRule {
        role: ColumnRole::TimeSeriesMetric,
        matches: is_date_named,
    },
    RoleRule {
        role: ColumnRole::PeriodicMetric,
        matches: is_periodic_named,
    },
    RoleRule {
        role: ColumnRole::AuxiliaryMetric,
        matches: is_auxiliary_named,
    },
];

fn is_date_named(name: &str) -> bool {
    name.contains('-') && name.chars().next().is_some_and(|c| c.is_ascii_digit())
}

fn is_periodic_named(name: &str) -> bool {
    contains_ignore_case(name, PERIODIC_MARKER)
}

fn is_auxiliary_named(name: &str) -> bool {
    contains_ignore_case(name, AUXILIARY_MARKER)
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_uppercase().contains(&needle.to_uppercase())
}

/// Role of a metric-looking column name, `None` for everything else.
pub fn metric_role(name: &str) -> Option<ColumnRole> {
    METRIC_RULES
        .iter()
        .find(|rule| (rule.matches)(name))
        .map(|rule| rule.role)
}

// ---------------------------------------------------------------------------
// Classification output
// ---------------------------------------------------------------------------

/// A metric column with its chart label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricColumn {
    pub name: String,
    pub label: String,
}

/// Every column of a table bucketed by role.
///
/// Metric groups keep source order; the last entry of a group is treated as
/// the most recent one. That trusts column order, not the parsed dates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassifiedColumns {
    pub identifier: Option<String>,
    pub dimensions: Vec<String>,
    pub time_series: Vec<MetricColumn>,
    pub periodic: Vec<MetricColumn>,
    pub auxiliary: Vec<MetricColumn>,
}

impl ClassifiedColumns {
    pub fn latest_day(&self) -> Option<&MetricColumn> {
        self.time_series.last()
    }

    pub fn latest_period(&self) -> Option<&MetricColumn> {
        self.periodic.last()
    }

    pub fn role_of(&self, name: &str) -> Option<ColumnRole> {
        let name = normalize_column_name(name);
        let same = |other: &str| normalize_column_name(other) == name;
        let in_group = |group: &[MetricColumn]| group.iter().any(|m| same(&m.name));
        if self.identifier.as_deref().is_some_and(|id| same(id)) {
            Some(ColumnRole::Identifier)
        } else if self.dimensions.iter().any(|d| same(d)) {
            Some(ColumnRole::Dimension)
        } else if in_group(&self.time_series) {
            Some(ColumnRole::TimeSeriesMetric)
        } else if in_group(&self.periodic) {
            Some(ColumnRole::PeriodicMetric)
        } else if in_group(&self.auxiliary) {
            Some(ColumnRole::AuxiliaryMetric)
        } else {
            None
        }
    }
}

/// Bucket column names into roles. Pure function of the names.
pub fn classify<S: AsRef<str>>(column_names: &[S], identifier: &IdentifierRule) -> ClassifiedColumns {
    let mut out = ClassifiedColumns::default();
    let wanted_id = match identifier {
        IdentifierRule::Named(name) => Some(normalize_column_name(name)),
        IdentifierRule::FirstColumn => None,
    };

    for name in column_names {
        let name = name.as_ref();
        match metric_role(name) {
            Some(ColumnRole::TimeSeriesMetric) => out.time_series.push(MetricColumn {
                name: name.to_string(),
                label: date_label(name),
            }),
            Some(ColumnRole::PeriodicMetric) => out.periodic.push(MetricColumn {
                name: name.to_string(),
                label: strip_marker(name, PERIODIC_MARKER),
            }),
            Some(ColumnRole::AuxiliaryMetric) => out.auxiliary.push(MetricColumn {
                name: name.to_string(),
                label: strip_marker(name, AUXILIARY_MARKER),
            }),
            _ => {
                let is_identifier = out.identifier.is_none()
                    && match &wanted_id {
                        Some(wanted) => normalize_column_name(name) == *wanted,
                        None => true,
                    };
                if is_identifier {
                    out.identifier = Some(name.to_string());
                } else {
                    out.dimensions.push(name.to_string());
                }
            }
        }
    }

    log::debug!(
        "classified columns: identifier={:?}, {} dimensions, {} daily, {} periodic, {} auxiliary",
        out.identifier,
        out.dimensions.len(),
        out.time_series.len(),
        out.periodic.len(),
        out.auxiliary.len()
    );
    out
}

// ---------------------------------------------------------------------------
// Labels
// ---------------------------------------------------------------------------

fn parse_date(name: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(name.trim(), "%Y-%m-%d").ok()
}

/// Axis label for a daily column: `2024-01-05` → `05-Jan`.
/// Names that are not ISO dates are kept verbatim.
pub fn date_label(name: &str) -> String {
    parse_date(name)
        .map(|d| d.format("%d-%b").to_string())
        .unwrap_or_else(|| name.to_string())
}

/// Caption for a daily column: `2024-01-05` → `05 January 2024`.
pub fn date_caption(name: &str) -> String {
    parse_date(name)
        .map(|d| d.format("%d %B %Y").to_string())
        .unwrap_or_else(|| name.to_string())
}

fn strip_marker(name: &str, marker: &str) -> String {
    let upper = name.to_uppercase();
    let marker = marker.to_uppercase();
    let stripped = match upper.find(&marker) {
        // Upper-casing can change byte lengths for non-ASCII text, so only
        // slice the original when the offsets still line up.
        Some(pos)
            if upper.len() == name.len()
                && name.is_char_boundary(pos)
                && name.is_char_boundary(pos + marker.len()) =>
        {
            format!("{}{}", &name[..pos], &name[pos + marker.len()..])
        }
        Some(_) => upper.replacen(&marker, "", 1),
        None => name.to_string(),
    };
    let label = stripped.split_whitespace().collect::<Vec<_>>().join(" ");
    if label.is_empty() {
        name.to_string()
    } else {
        label
    }
}
