//! Group-by aggregation and the relational join that combines aggregates.
//!
//! Each [`Aggregate`] maps a grouping key to one value (a count or a mean).
//! Several aggregates over the same key are combined by [`join_aggregates`],
//! which behaves like a SQL join on the key column:
//!
//! - [`JoinType::Inner`] keeps a key only if every aggregate produced it.
//! - [`JoinType::Left`] keeps every key of the first aggregate and fills the
//!   values missing from the others with NULL.
//!
//! Aggregates built from the same table always share a key set, so both
//! join types agree there; they differ once aggregates are computed over
//! independently filtered tables.

use crate::column::{Column, ColumnType, ColumnValue};
use crate::error::{Error, Result};
use crate::table::Table;
use chrono::NaiveDate;
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// A grouping key. Integer columns of any width share `Int`; floats are
/// totally ordered so they can key a map.
#[derive(Debug, Clone)]
pub enum GroupKey {
    Int(i64),
    Float(f64),
    Text(String),
    Bool(bool),
    Date(NaiveDate),
}

impl GroupKey {
    /// Key for a cell value. NULL and NaN cells have no key and are not grouped.
    pub fn from_value(value: &ColumnValue) -> Option<GroupKey> {
        match value {
            ColumnValue::Int32(n) => Some(GroupKey::Int(*n as i64)),
            ColumnValue::Int64(n) => Some(GroupKey::Int(*n)),
            ColumnValue::Float64(f) if f.is_nan() => None,
            ColumnValue::Float64(f) => Some(GroupKey::Float(*f)),
            ColumnValue::String(s) => Some(GroupKey::Text(s.clone())),
            ColumnValue::Bool(b) => Some(GroupKey::Bool(*b)),
            ColumnValue::Date(d) => Some(GroupKey::Date(*d)),
            ColumnValue::Null => None,
        }
    }

    /// Cell value for this key in a column of type `column_type`.
    pub fn to_value(&self, column_type: ColumnType) -> ColumnValue {
        match self {
            GroupKey::Int(n) if column_type == ColumnType::Int32 => ColumnValue::Int32(*n as i32),
            GroupKey::Int(n) => ColumnValue::Int64(*n),
            GroupKey::Float(f) => ColumnValue::Float64(*f),
            GroupKey::Text(s) => ColumnValue::String(s.clone()),
            GroupKey::Bool(b) => ColumnValue::Bool(*b),
            GroupKey::Date(d) => ColumnValue::Date(*d),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            GroupKey::Int(_) => 0,
            GroupKey::Float(_) => 1,
            GroupKey::Text(_) => 2,
            GroupKey::Bool(_) => 3,
            GroupKey::Date(_) => 4,
        }
    }
}

impl Ord for GroupKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (GroupKey::Int(a), GroupKey::Int(b)) => a.cmp(b),
            (GroupKey::Float(a), GroupKey::Float(b)) => a.total_cmp(b),
            (GroupKey::Text(a), GroupKey::Text(b)) => a.cmp(b),
            (GroupKey::Bool(a), GroupKey::Bool(b)) => a.cmp(b),
            (GroupKey::Date(a), GroupKey::Date(b)) => a.cmp(b),
            (a, b) => a.rank().cmp(&b.rank()),
        }
    }
}

impl PartialOrd for GroupKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for GroupKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for GroupKey {}

/// Per-group reduction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateFunction {
    /// Number of non-NULL values of the value column.
    Count,
    /// Mean of the non-NULL, non-NaN values; NULL when a group has none.
    Mean,
}

/// One value per distinct key, in ascending key order.
#[derive(Debug, Clone)]
pub struct Aggregate {
    key_column: String,
    key_type: ColumnType,
    label: String,
    function: AggregateFunction,
    groups: BTreeMap<GroupKey, ColumnValue>,
}

impl Aggregate {
    pub fn key_column(&self) -> &str {
        &self.key_column
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn function(&self) -> AggregateFunction {
        self.function
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &GroupKey> {
        self.groups.keys()
    }

    pub fn get(&self, key: &GroupKey) -> Option<&ColumnValue> {
        self.groups.get(key)
    }

    /// Rename the key and value columns for display.
    pub fn relabel(mut self, key_column: impl Into<String>, label: impl Into<String>) -> Self {
        self.key_column = key_column.into();
        self.label = label.into();
        self
    }

    fn value_type(&self) -> ColumnType {
        match self.function {
            AggregateFunction::Count => ColumnType::Int64,
            AggregateFunction::Mean => ColumnType::Float64,
        }
    }

    /// Two-column table: key, value.
    pub fn to_table(&self) -> Result<Table> {
        join_aggregates(std::slice::from_ref(self), JoinType::Inner)
    }
}

#[derive(Default)]
struct Accumulator {
    count: usize,
    sum: f64,
    numeric: usize,
}

/// Group `table` by `key` and reduce `value_column` within each group.
/// Rows with a NULL key are dropped.
pub fn group_by(
    table: &Table,
    key: &str,
    function: AggregateFunction,
    value_column: &str,
) -> Result<Aggregate> {
    let keys = table.column(key)?;
    let values = table.column(value_column)?;

    if function == AggregateFunction::Mean && !values.column_type().is_numeric() {
        return Err(Error::TypeMismatch {
            column: value_column.to_string(),
            expected: "numeric".to_string(),
            found: values.column_type().name().to_string(),
        });
    }

    let mut acc: BTreeMap<GroupKey, Accumulator> = BTreeMap::new();
    for (key_value, value) in keys.iter().zip(values.iter()) {
        let Some(group) = GroupKey::from_value(key_value) else {
            continue;
        };
        let entry = acc.entry(group).or_default();
        if !value.is_null() {
            entry.count += 1;
        }
        if let Some(v) = value.to_f64().filter(|v| !v.is_nan()) {
            entry.sum += v;
            entry.numeric += 1;
        }
    }

    let groups = acc
        .into_iter()
        .map(|(group, a)| {
            let value = match function {
                AggregateFunction::Count => ColumnValue::Int64(a.count as i64),
                AggregateFunction::Mean if a.numeric > 0 => {
                    ColumnValue::Float64(a.sum / a.numeric as f64)
                }
                AggregateFunction::Mean => ColumnValue::Null,
            };
            (group, value)
        })
        .collect();

    Ok(Aggregate {
        key_column: key.to_string(),
        key_type: keys.column_type(),
        label: value_column.to_string(),
        function,
        groups,
    })
}

/// Join type specification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    /// Left join: every key of the first aggregate, NULL where others lack it
    Left,
    /// Inner join: only keys present in every aggregate
    Inner,
}

/// Combine aggregates on their key into one table: the first aggregate's
/// key column, then one column per aggregate named by its label. Rows are in
/// ascending key order.
pub fn join_aggregates(aggregates: &[Aggregate], join_type: JoinType) -> Result<Table> {
    let Some(first) = aggregates.first() else {
        return Table::from_columns("aggregates".to_string(), Vec::new());
    };

    let keys: Vec<&GroupKey> = first
        .keys()
        .filter(|k| match join_type {
            JoinType::Left => true,
            JoinType::Inner => aggregates.iter().all(|a| a.get(k).is_some()),
        })
        .collect();

    let mut columns = Vec::with_capacity(aggregates.len() + 1);
    columns.push(Column::from_values(
        first.key_column.clone(),
        first.key_type,
        false,
        keys.iter().map(|k| k.to_value(first.key_type)).collect(),
    )?);

    for agg in aggregates {
        let values = keys
            .iter()
            .map(|k| agg.get(k).cloned().unwrap_or(ColumnValue::Null))
            .collect();
        columns.push(Column::from_values(agg.label.clone(), agg.value_type(), true, values)?);
    }

    Table::from_columns(first.key_column.clone(), columns)
}

// ============================================================================
// Dashboard aggregates
// ============================================================================

pub const OVERVIEW_COLUMNS: [&str; 5] =
    ["ZIPCODE", "TOTAL HOUSES", "PRICE", "LIVING ROOM M2", "PRICE/LOT M2"];

/// Houses count and mean price, living area and price per lot m2 by zipcode.
pub fn zipcode_overview(table: &Table) -> Result<Table> {
    let [key, total, price, living, price_lot] = OVERVIEW_COLUMNS;
    let aggregates = [
        group_by(table, "zipcode", AggregateFunction::Count, "id")?.relabel(key, total),
        group_by(table, "zipcode", AggregateFunction::Mean, "price")?.relabel(key, price),
        group_by(table, "zipcode", AggregateFunction::Mean, "living_m2")?.relabel(key, living),
        group_by(table, "zipcode", AggregateFunction::Mean, "price_m2")?.relabel(key, price_lot),
    ];
    Ok(join_aggregates(&aggregates, JoinType::Inner)?.renamed("zipcode_overview"))
}

/// Mean `price` per value of `key` (`yr_built` or `date` on the dashboard).
pub fn mean_price_by(table: &Table, key: &str) -> Result<Table> {
    group_by(table, key, AggregateFunction::Mean, "price")?.to_table()
}

/// Mean price per zipcode, labelled for the choropleth: `ZIP`, `PRICE`.
pub fn mean_price_by_zip(table: &Table) -> Result<Aggregate> {
    Ok(group_by(table, "zipcode", AggregateFunction::Mean, "price")?.relabel("ZIP", "PRICE"))
}
