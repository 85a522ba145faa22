//! Derived price-per-area columns.
//!
//! The dataset measures areas in square feet; the dashboard reports them in
//! square meters. `derive_features` appends:
//!
//! - `price_m2`: sale price per square meter of lot, two decimals
//! - `living_m2`: living area in square meters, two decimals
//!
//! A lot area of zero produces an infinite (or NaN) `price_m2` for that row
//! only; the rest of the table is unaffected.

use crate::column::{Column, ColumnType, ColumnValue};
use crate::error::Result;
use crate::table::Table;
use log::debug;

/// Square feet in one square meter.
pub const SQFT_PER_M2: f64 = 10.764;

pub const PRICE_M2: &str = "price_m2";
pub const LIVING_M2: &str = "living_m2";

/// Round to two decimals, ties to even. Non-finite values pass through.
pub fn round2(value: f64) -> f64 {
    if value.is_finite() {
        (value * 100.0).round_ties_even() / 100.0
    } else {
        value
    }
}

pub fn price_per_m2(price: f64, sqft_lot: f64) -> f64 {
    round2(price / (sqft_lot / SQFT_PER_M2))
}

pub fn sqft_to_m2(sqft: f64) -> f64 {
    round2(sqft / SQFT_PER_M2)
}

/// Return a new table with `price_m2` and `living_m2` computed from `price`,
/// `sqft_lot` and `sqft_living`. Existing derived columns are recomputed.
pub fn derive_features(table: &Table) -> Result<Table> {
    let price = table.column("price")?;
    let sqft_lot = table.column("sqft_lot")?;
    let sqft_living = table.column("sqft_living")?;

    let mut non_finite = 0usize;
    let price_m2: Vec<ColumnValue> = (0..table.len())
        .map(|row| match (price.get_f64(row), sqft_lot.get_f64(row)) {
            (Some(p), Some(lot)) => {
                let value = price_per_m2(p, lot);
                if !value.is_finite() {
                    non_finite += 1;
                }
                ColumnValue::Float64(value)
            }
            _ => ColumnValue::Null,
        })
        .collect();

    let living_m2: Vec<ColumnValue> = (0..table.len())
        .map(|row| {
            sqft_living
                .get_f64(row)
                .map(|sqft| ColumnValue::Float64(sqft_to_m2(sqft)))
                .unwrap_or(ColumnValue::Null)
        })
        .collect();

    if non_finite > 0 {
        debug!("{} rows have a zero lot area; {} is not finite for them", non_finite, PRICE_M2);
    }

    table
        .with_column(Column::from_values(PRICE_M2.to_string(), ColumnType::Float64, true, price_m2)?)?
        .with_column(Column::from_values(LIVING_M2.to_string(), ColumnType::Float64, true, living_m2)?)
}
