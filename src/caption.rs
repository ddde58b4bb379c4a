//! Natural-language chart descriptions
//!
//! Builds the alt text for a chart from the rows it plots. Values that do not
//! coerce to numbers are left out of the description rather than reported.

use crate::data::{numeric_values, Dataset};
use crate::resolve::ColumnRoles;
use crate::ChartKind;

/// Datasets up to this many rows are described value by value
const LIST_ALL_MAX: usize = 6;

/// Number of largest slices named for big pie charts
const PIE_TOP: usize = 3;

/// Render a number without a trailing ".0" when it is integral
pub fn fmt_num(value: f64) -> String {
    if value == 0.0 {
        // also folds -0.0
        return "0".to_string();
    }
    format!("{}", value)
}

/// Alt text for a chart.
///
/// An explicit override is returned verbatim. Otherwise the generated
/// description is used, prefixed with the title when there is one.
pub fn alt_text(
    kind: ChartKind,
    dataset: &Dataset,
    roles: &ColumnRoles,
    title: Option<&str>,
    alt_override: Option<&str>,
) -> String {
    if let Some(alt) = alt_override {
        return alt.to_string();
    }

    let description = describe(kind, dataset, roles.category.as_deref(), &roles.values);
    match title {
        Some(title) if !title.is_empty() => format!("{}. {}", title, description),
        _ => description,
    }
}

/// Describe the data a chart shows
pub fn describe(
    kind: ChartKind,
    dataset: &Dataset,
    category: Option<&str>,
    values: &[String],
) -> String {
    let described = match kind {
        ChartKind::Histogram => describe_histogram(dataset, values),
        ChartKind::Pie => describe_pie(dataset, category, values),
        _ => describe_series(kind, dataset, category, values),
    };
    described.unwrap_or_else(|| match kind {
        ChartKind::Histogram => format!(
            "{} of {}",
            kind.label(),
            values.first().map(String::as_str).unwrap_or("values")
        ),
        ChartKind::Pie => format!("{} of {}", kind.label(), category.unwrap_or("categories")),
        _ => kind.label().to_string(),
    })
}

fn describe_histogram(dataset: &Dataset, values: &[String]) -> Option<String> {
    let label = ChartKind::Histogram.label();
    let column = values.first()?;
    let nums = numeric_values(dataset.column_values(column));
    let (lo, hi) = min_max(&nums)?;

    if dataset.len() <= LIST_ALL_MAX {
        let listed: Vec<String> = nums.iter().map(|v| fmt_num(*v)).collect();
        return Some(format!("{} of {} values: {}", label, column, listed.join(", ")));
    }

    Some(format!(
        "{} of {} {} values ranging from {} to {}",
        label,
        nums.len(),
        column,
        fmt_num(lo),
        fmt_num(hi)
    ))
}

fn describe_pie(dataset: &Dataset, category: Option<&str>, values: &[String]) -> Option<String> {
    let label = ChartKind::Pie.label();
    let pairs = labelled_values(dataset, category?, values.first()?, false);
    let total: f64 = pairs.iter().map(|(_, v)| v).sum();
    if pairs.is_empty() || !(total > 0.0) {
        return None;
    }

    let share = |(name, value): &(String, f64)| format!("{} ({:.0}%)", name, value / total * 100.0);

    if dataset.len() <= LIST_ALL_MAX {
        let parts: Vec<String> = pairs.iter().map(share).collect();
        return Some(format!("{} showing {}", label, parts.join(", ")));
    }

    let mut ranked = pairs;
    // stable, so equal slices keep their input order
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    let parts: Vec<String> = ranked.iter().take(PIE_TOP).map(share).collect();
    Some(format!(
        "{} of {} categories. Largest: {}",
        label,
        dataset.len(),
        parts.join(", ")
    ))
}

/// Bar, line, scatter and radar charts: describe the first value column only
fn describe_series(
    kind: ChartKind,
    dataset: &Dataset,
    category: Option<&str>,
    values: &[String],
) -> Option<String> {
    let label = kind.label();
    let category = category?;
    let column = values.first()?;
    let pairs = labelled_values(dataset, category, column, true);
    let nums: Vec<f64> = pairs.iter().map(|(_, v)| *v).collect();
    let (lo, hi) = min_max(&nums)?;

    if dataset.len() <= LIST_ALL_MAX {
        let parts: Vec<String> = pairs
            .iter()
            .map(|(name, v)| format!("{}: {}", name, fmt_num(*v)))
            .collect();
        let series_note = if values.len() > 1 {
            format!(" and {} more series", values.len() - 1)
        } else {
            String::new()
        };
        return Some(format!(
            "{} of {} by {} \u{2014} {}{}",
            label,
            column,
            category,
            parts.join(", "),
            series_note
        ));
    }

    // first occurrence wins for both extremes
    let min_pair = pairs.iter().reduce(|best, p| if p.1 < best.1 { p } else { best })?;
    let max_pair = pairs.iter().reduce(|best, p| if p.1 > best.1 { p } else { best })?;
    let series_note = if values.len() > 1 {
        format!(" ({} series)", values.len())
    } else {
        String::new()
    };

    Some(format!(
        "{} of {} by {}{}. {} points, ranging from {} ({}) to {} ({})",
        label,
        column,
        category,
        series_note,
        dataset.len(),
        fmt_num(lo),
        min_pair.0,
        fmt_num(hi),
        max_pair.0
    ))
}

/// (label, number) for every row whose value coerces.
///
/// With `blank_missing_label`, rows lacking the category column keep an empty
/// label; otherwise they are skipped.
fn labelled_values(
    dataset: &Dataset,
    category: &str,
    column: &str,
    blank_missing_label: bool,
) -> Vec<(String, f64)> {
    dataset
        .rows()
        .iter()
        .filter_map(|row| {
            let value = row.get(column)?.as_f64()?;
            let name = match row.get(category) {
                Some(v) => v.to_string(),
                None if blank_missing_label => String::new(),
                None => return None,
            };
            Some((name, value))
        })
        .collect()
}

fn min_max(values: &[f64]) -> Option<(f64, f64)> {
    let first = *values.first()?;
    Some(
        values
            .iter()
            .fold((first, first), |(lo, hi), &v| (lo.min(v), hi.max(v))),
    )
}
