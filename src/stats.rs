//! Descriptive statistics and histograms over a table's numeric columns.

use crate::column::{Column, ColumnType, ColumnValue};
use crate::error::{Error, Result};
use crate::table::Table;
use serde::Serialize;

/// Summary of one numeric column. Fields are None when undefined
/// (no values at all, or a single value for `std`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnSummary {
    pub attribute: String,
    pub count: usize,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub mean: Option<f64>,
    pub median: Option<f64>,
    pub std: Option<f64>,
}

impl ColumnSummary {
    /// Summarize the non-null, non-NaN values of a column.
    pub fn of(column: &Column) -> Self {
        let mut values: Vec<f64> = column.numeric_values().filter(|v| !v.is_nan()).collect();
        values.sort_by(f64::total_cmp);

        let count = values.len();
        let mean = (count > 0).then(|| values.iter().sum::<f64>() / count as f64);

        let median = match count {
            0 => None,
            n if n % 2 == 1 => Some(values[n / 2]),
            n => Some((values[n / 2 - 1] + values[n / 2]) / 2.0),
        };

        let std = match mean {
            Some(m) if count > 1 => {
                let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
                Some((ss / (count - 1) as f64).sqrt())
            }
            _ => None,
        };

        ColumnSummary {
            attribute: column.name().to_string(),
            count,
            min: values.first().copied(),
            max: values.last().copied(),
            mean,
            median,
            std,
        }
    }
}

/// Summaries for every numeric column, in table column order.
pub fn summarize(table: &Table) -> Vec<ColumnSummary> {
    table
        .columns()
        .iter()
        .filter(|c| c.column_type().is_numeric())
        .map(ColumnSummary::of)
        .collect()
}

/// Statistics table with columns `attributes, min, max, mean, median, std`,
/// one row per numeric input column.
pub fn describe(table: &Table) -> Result<Table> {
    let summaries = summarize(table);

    let attributes = summaries
        .iter()
        .map(|s| ColumnValue::String(s.attribute.clone()))
        .collect();

    Table::from_columns(
        "statistics".to_string(),
        vec![
            Column::from_values("attributes".to_string(), ColumnType::String, false, attributes)?,
            stat_column(&summaries, "min", |s| s.min)?,
            stat_column(&summaries, "max", |s| s.max)?,
            stat_column(&summaries, "mean", |s| s.mean)?,
            stat_column(&summaries, "median", |s| s.median)?,
            stat_column(&summaries, "std", |s| s.std)?,
        ],
    )
}

fn stat_column(
    summaries: &[ColumnSummary],
    name: &str,
    pick: impl Fn(&ColumnSummary) -> Option<f64>,
) -> Result<Column> {
    let values = summaries
        .iter()
        .map(|s| pick(s).map(ColumnValue::Float64).unwrap_or(ColumnValue::Null))
        .collect();
    Column::from_values(name.to_string(), ColumnType::Float64, true, values)
}

/// One histogram bin covering `[start, end)`; the last bin also includes `end`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Histogram {
    pub column: String,
    pub bins: Vec<Bin>,
}

impl Histogram {
    pub fn total(&self) -> usize {
        self.bins.iter().map(|b| b.count).sum()
    }
}

/// Equal-width histogram of a numeric column's finite values.
pub fn histogram(table: &Table, column: &str, nbins: usize) -> Result<Histogram> {
    let col = table.column(column)?;
    if !col.column_type().is_numeric() {
        return Err(Error::TypeMismatch {
            column: column.to_string(),
            expected: "numeric".to_string(),
            found: col.column_type().name().to_string(),
        });
    }

    let values: Vec<f64> = col.numeric_values().filter(|v| v.is_finite()).collect();
    let bins = match (
        values.iter().copied().reduce(f64::min),
        values.iter().copied().reduce(f64::max),
    ) {
        (Some(lo), Some(hi)) if nbins > 0 => bin_values(&values, lo, hi, nbins),
        _ => Vec::new(),
    };

    Ok(Histogram {
        column: column.to_string(),
        bins,
    })
}

fn bin_values(values: &[f64], lo: f64, hi: f64, nbins: usize) -> Vec<Bin> {
    if lo == hi {
        return vec![Bin {
            start: lo,
            end: hi,
            count: values.len(),
        }];
    }

    let width = (hi - lo) / nbins as f64;
    let mut bins: Vec<Bin> = (0..nbins)
        .map(|i| Bin {
            start: lo + width * i as f64,
            end: if i + 1 == nbins { hi } else { lo + width * (i + 1) as f64 },
            count: 0,
        })
        .collect();

    for &v in values {
        let idx = (((v - lo) / width) as usize).min(nbins - 1);
        bins[idx].count += 1;
    }
    bins
}
