//! Per-row aggregates for the records table.
//!
//! The first visible column is always the row label and never takes part
//! in a sum or an average. The two aggregates treat bad values differently:
//! a sum counts them as zero, an average leaves them out entirely.

use std::fmt;

use crate::data::datatable::{format_fixed, parse_float, CellValue, Column, Row};

/// Sum of the value columns; anything non-numeric counts as 0
pub fn row_sum(row: &Row, visible_columns: &[&Column]) -> f64 {
    visible_columns
        .iter()
        .skip(1)
        .map(|c| row.number(&c.id).unwrap_or(0.0))
        .sum()
}

fn valid_values(row: &Row, visible_columns: &[&Column]) -> Vec<f64> {
    visible_columns
        .iter()
        .skip(1)
        .filter_map(|c| row.number(&c.id))
        .collect()
}

/// Mean over the numeric value columns only; 0 when there are none
pub fn row_average(row: &Row, visible_columns: &[&Column]) -> f64 {
    let values = valid_values(row, visible_columns);
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Mean of the per-row averages of `rows`.
///
/// Rows without numeric values are skipped, and so is any row whose own
/// average is not strictly positive. A row that genuinely averages 0 is
/// therefore indistinguishable from one with no data.
pub fn average_of_averages<'a, I>(rows: I, visible_columns: &[&Column]) -> f64
where
    I: IntoIterator<Item = &'a Row>,
{
    let averages: Vec<f64> = rows
        .into_iter()
        .filter(|r| !valid_values(r, visible_columns).is_empty())
        .map(|r| row_average(r, visible_columns))
        .filter(|avg| *avg > 0.0)
        .collect();

    if averages.is_empty() {
        0.0
    } else {
        averages.iter().sum::<f64>() / averages.len() as f64
    }
}

/// Average cell of a row: a plain mean, or for the summary row the
/// mean paired with the average of the other rows' averages
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RowAverage {
    Plain(f64),
    Summary { own: f64, of_averages: f64 },
}

impl RowAverage {
    pub fn value(&self) -> f64 {
        match self {
            RowAverage::Plain(v) => *v,
            RowAverage::Summary { own, .. } => *own,
        }
    }
}

impl fmt::Display for RowAverage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowAverage::Plain(v) => write!(f, "{}", format_fixed(*v, 2)),
            RowAverage::Summary { own, of_averages } => {
                write!(f, "{}/{}", format_fixed(*own, 2), format_fixed(*of_averages, 2))
            }
        }
    }
}

/// Average for the summary row. With no other rows to compare against
/// this degrades to a plain average.
pub fn summary_average(row: &Row, visible_columns: &[&Column], other_rows: &[&Row]) -> RowAverage {
    let own = row_average(row, visible_columns);
    if other_rows.is_empty() {
        return RowAverage::Plain(own);
    }
    RowAverage::Summary {
        own,
        of_averages: average_of_averages(other_rows.iter().copied(), visible_columns),
    }
}

/// True when any visible column (label included) holds a number, zero
/// counted, or non-blank text that reads as one
pub fn has_numeric_value(row: &Row, visible_columns: &[&Column]) -> bool {
    visible_columns.iter().any(|c| match row.get(&c.id) {
        Some(CellValue::Number(_)) => true,
        Some(CellValue::Text(s)) => !s.trim().is_empty() && parse_float(s).is_some(),
        _ => false,
    })
}
