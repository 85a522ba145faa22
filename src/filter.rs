//! Row predicates and column projection driven by dashboard selections.
//!
//! A [`Filter`] keeps the rows that satisfy every active predicate and then,
//! if any columns were selected, projects to those columns. A predicate with
//! nothing selected is inactive, so an empty zipcode selection shows every
//! zipcode rather than none.

use crate::column::ColumnValue;
use crate::error::Result;
use crate::table::Table;
use std::cmp::Ordering;

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Value must be one of `values`. Inactive when `values` is empty.
    InSet { column: String, values: Vec<ColumnValue> },
    /// Value must be `<= threshold`. NULL and incomparable values fail.
    AtMost { column: String, threshold: ColumnValue },
    /// Value must equal `value`, only while `enabled`.
    FlagEquals { column: String, value: ColumnValue, enabled: bool },
}

impl Predicate {
    pub fn in_set(column: impl Into<String>, values: Vec<ColumnValue>) -> Self {
        Predicate::InSet { column: column.into(), values }
    }

    pub fn at_most(column: impl Into<String>, threshold: ColumnValue) -> Self {
        Predicate::AtMost { column: column.into(), threshold }
    }

    pub fn flag_equals(column: impl Into<String>, value: ColumnValue, enabled: bool) -> Self {
        Predicate::FlagEquals { column: column.into(), value, enabled }
    }

    pub fn column(&self) -> &str {
        match self {
            Predicate::InSet { column, .. }
            | Predicate::AtMost { column, .. }
            | Predicate::FlagEquals { column, .. } => column,
        }
    }

    /// False when the predicate imposes no restriction.
    pub fn is_active(&self) -> bool {
        match self {
            Predicate::InSet { values, .. } => !values.is_empty(),
            Predicate::AtMost { .. } => true,
            Predicate::FlagEquals { enabled, .. } => *enabled,
        }
    }

    pub fn matches(&self, value: &ColumnValue) -> bool {
        match self {
            Predicate::InSet { values, .. } => {
                values.is_empty() || values.iter().any(|v| v.matches(value))
            }
            Predicate::AtMost { threshold, .. } => matches!(
                value.compare(threshold),
                Some(Ordering::Less | Ordering::Equal)
            ),
            Predicate::FlagEquals { value: expected, enabled, .. } => {
                !enabled || value.matches(expected)
            }
        }
    }
}

/// Conjunction of predicates plus an optional column selection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    predicates: Vec<Predicate>,
    columns: Vec<String>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    /// Restrict output to `columns`, in that order. Empty keeps every column.
    pub fn select(mut self, columns: Vec<String>) -> Self {
        self.columns = columns;
        self
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    /// Row indices of `table` passing every active predicate, in row order.
    pub fn matching_rows(&self, table: &Table) -> Result<Vec<usize>> {
        let mut checks = Vec::new();
        for predicate in &self.predicates {
            // Resolve the column even for inactive predicates so a typo in a
            // column name surfaces regardless of the current selection.
            let column = table.column(predicate.column())?;
            if predicate.is_active() {
                checks.push((predicate, column));
            }
        }

        let mut matching = Vec::new();
        for row in 0..table.len() {
            let mut keep = true;
            for (predicate, column) in &checks {
                if !predicate.matches(column.get(row)?) {
                    keep = false;
                    break;
                }
            }
            if keep {
                matching.push(row);
            }
        }
        Ok(matching)
    }

    /// Apply the filter, returning a new table.
    pub fn apply(&self, table: &Table) -> Result<Table> {
        let rows = if self.predicates.iter().any(Predicate::is_active) {
            let indices = self.matching_rows(table)?;
            table.select_rows(&indices)?
        } else {
            // Still validates column names.
            self.matching_rows(table)?;
            table.clone()
        };

        if self.columns.is_empty() {
            Ok(rows)
        } else {
            rows.project(&self.columns)
        }
    }
}
