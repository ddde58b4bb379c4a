use crate::data::Dataset;
use crate::error::{ChartError, Result};
use crate::ChartKind;
use log::debug;

/// Which columns play the category and value roles for one chart
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRoles {
    /// Labels / x-axis. `None` only for histograms.
    pub category: Option<String>,
    /// Plotted magnitudes, never empty
    pub values: Vec<String>,
}

impl ColumnRoles {
    /// First value column, the one captions and single-series charts use
    pub fn primary_value(&self) -> &str {
        &self.values[0]
    }
}

/// Column names tried, in order, before falling back to position
struct Candidates {
    category: &'static [&'static str],
    value: &'static [&'static str],
}

const DEFAULT_CANDIDATES: Candidates = Candidates {
    category: &["name", "label", "x"],
    value: &["value", "count", "y"],
};

const SCATTER_CANDIDATES: Candidates = Candidates {
    category: &["x", "name", "label"],
    value: &["y", "value", "count"],
};

fn candidates(kind: ChartKind) -> &'static Candidates {
    match kind {
        ChartKind::Scatter => &SCATTER_CANDIDATES,
        _ => &DEFAULT_CANDIDATES,
    }
}

/// Resolve the category and value columns for `kind`.
///
/// Explicit names win; missing roles are auto-detected from the first row's
/// keys. Every resolved name is checked against those keys.
pub fn resolve_columns(
    dataset: &Dataset,
    kind: ChartKind,
    category: Option<&str>,
    values: &[String],
) -> Result<ColumnRoles> {
    if dataset.is_empty() {
        return Err(ChartError::EmptyDataset);
    }

    let columns = dataset.columns();
    let table = candidates(kind);

    let category = match category {
        Some(name) => Some(name.to_string()),
        None if kind == ChartKind::Histogram => None,
        None => Some(
            first_match(&columns, table.category)
                .unwrap_or_else(|| columns[0].clone()),
        ),
    };

    let values = if values.is_empty() {
        let detected = match first_match(&columns, table.value) {
            Some(name) => name,
            None => match (columns.get(1), kind) {
                (Some(second), _) => second.clone(),
                (None, ChartKind::Histogram) => columns[0].clone(),
                (None, _) => {
                    return Err(ChartError::TooFewColumns {
                        chart: kind.label(),
                        available: columns,
                    })
                }
            },
        };
        vec![detected]
    } else {
        values.to_vec()
    };

    for name in category.iter().chain(values.iter()) {
        if !columns.contains(name) {
            return Err(ChartError::ColumnNotFound {
                column: name.clone(),
                available: columns,
            });
        }
    }

    debug!(
        "{} columns: category={:?} values={:?}",
        kind, category, values
    );
    Ok(ColumnRoles { category, values })
}

fn first_match(columns: &[String], candidates: &[&str]) -> Option<String> {
    candidates
        .iter()
        .find(|candidate| columns.iter().any(|c| c == *candidate))
        .map(|candidate| candidate.to_string())
}
