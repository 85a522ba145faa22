/// House Rocket Column Implementation
///
/// A Column is an array-like random-access data container indexed by integer.
/// Each Column has a type specifying the type of every value stored, and is
/// immutable once built: filtering and projection produce new columns.

use crate::error::{Error, Result};
use chrono::NaiveDate;
use std::cmp::Ordering;
use std::fmt::{self, Debug, Display};

/// Column data types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Int32,
    Int64,
    Float64,
    String,
    Bool,
    Date,
}

impl ColumnType {
    /// Types that the statistics summarizer treats as numeric.
    pub fn is_numeric(&self) -> bool {
        matches!(self, ColumnType::Int32 | ColumnType::Int64 | ColumnType::Float64)
    }

    pub fn name(&self) -> &'static str {
        match self {
            ColumnType::Int32 => "INT32",
            ColumnType::Int64 => "INT64",
            ColumnType::Float64 => "FLOAT64",
            ColumnType::String => "STRING",
            ColumnType::Bool => "BOOL",
            ColumnType::Date => "DATE",
        }
    }
}

/// Column value enum to support multiple types
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValue {
    Int32(i32),
    Int64(i64),
    Float64(f64),
    String(String),
    Bool(bool),
    Date(NaiveDate),
    Null,
}

impl ColumnValue {
    pub fn is_null(&self) -> bool {
        matches!(self, ColumnValue::Null)
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            ColumnValue::Int32(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ColumnValue::Int64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ColumnValue::Float64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<&str> {
        match self {
            ColumnValue::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ColumnValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            ColumnValue::Date(v) => Some(*v),
            _ => None,
        }
    }

    /// Numeric view of the value; integers widen to f64.
    #[inline]
    pub fn to_f64(&self) -> Option<f64> {
        match self {
            ColumnValue::Int32(n) => Some(*n as f64),
            ColumnValue::Int64(n) => Some(*n as f64),
            ColumnValue::Float64(f) => Some(*f),
            _ => None,
        }
    }

    /// The type this value would occupy in a column, or None for Null.
    pub fn column_type(&self) -> Option<ColumnType> {
        match self {
            ColumnValue::Int32(_) => Some(ColumnType::Int32),
            ColumnValue::Int64(_) => Some(ColumnType::Int64),
            ColumnValue::Float64(_) => Some(ColumnType::Float64),
            ColumnValue::String(_) => Some(ColumnType::String),
            ColumnValue::Bool(_) => Some(ColumnType::Bool),
            ColumnValue::Date(_) => Some(ColumnType::Date),
            ColumnValue::Null => None,
        }
    }

    /// Compare two values.
    ///
    /// Integers and floats compare numerically across types. NULL compares
    /// with nothing, and neither do mismatched non-numeric types or NaN.
    pub fn compare(&self, other: &ColumnValue) -> Option<Ordering> {
        match (self, other) {
            (ColumnValue::Null, _) | (_, ColumnValue::Null) => None,
            (ColumnValue::Int32(a), ColumnValue::Int32(b)) => Some(a.cmp(b)),
            (ColumnValue::Int64(a), ColumnValue::Int64(b)) => Some(a.cmp(b)),
            (ColumnValue::Int32(a), ColumnValue::Int64(b)) => Some((*a as i64).cmp(b)),
            (ColumnValue::Int64(a), ColumnValue::Int32(b)) => Some(a.cmp(&(*b as i64))),
            (ColumnValue::String(a), ColumnValue::String(b)) => Some(a.cmp(b)),
            (ColumnValue::Bool(a), ColumnValue::Bool(b)) => Some(a.cmp(b)),
            (ColumnValue::Date(a), ColumnValue::Date(b)) => Some(a.cmp(b)),
            (a, b) => match (a.to_f64(), b.to_f64()) {
                (Some(x), Some(y)) => x.partial_cmp(&y),
                _ => None,
            },
        }
    }

    /// Equality used by filters: numeric values match across int/float types.
    pub fn matches(&self, other: &ColumnValue) -> bool {
        self.compare(other) == Some(Ordering::Equal)
    }

    /// JSON representation. Dates become `YYYY-MM-DD`, non-finite floats null.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            ColumnValue::Int32(n) => serde_json::Value::Number((*n).into()),
            ColumnValue::Int64(n) => serde_json::Value::Number((*n).into()),
            ColumnValue::Float64(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            ColumnValue::String(s) => serde_json::Value::String(s.clone()),
            ColumnValue::Bool(b) => serde_json::Value::Bool(*b),
            ColumnValue::Date(d) => serde_json::Value::String(d.format("%Y-%m-%d").to_string()),
            ColumnValue::Null => serde_json::Value::Null,
        }
    }
}

impl Display for ColumnValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnValue::Int32(n) => write!(f, "{}", n),
            ColumnValue::Int64(n) => write!(f, "{}", n),
            ColumnValue::Float64(x) => write!(f, "{}", x),
            ColumnValue::String(s) => write!(f, "{}", s),
            ColumnValue::Bool(b) => write!(f, "{}", b),
            ColumnValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            ColumnValue::Null => Ok(()),
        }
    }
}

/// A named, typed, read-only sequence of values.
#[derive(Clone)]
pub struct Column {
    name: String,
    column_type: ColumnType,
    nullable: bool,
    values: Vec<ColumnValue>,
}

impl Column {
    pub fn new(name: String, column_type: ColumnType, nullable: bool) -> Self {
        Column {
            name,
            column_type,
            nullable,
            values: Vec::new(),
        }
    }

    /// Build a column from a full set of values, validating each one.
    pub fn from_values(
        name: String,
        column_type: ColumnType,
        nullable: bool,
        values: Vec<ColumnValue>,
    ) -> Result<Self> {
        let mut column = Column::new(name, column_type, nullable);
        column.values.reserve(values.len());
        for value in values {
            column.append(value)?;
        }
        Ok(column)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn column_type(&self) -> ColumnType {
        self.column_type
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Validate value against the column type and nullability
    fn validate_value(&self, value: &ColumnValue) -> Result<()> {
        if value.is_null() {
            if !self.nullable {
                return Err(Error::TypeMismatch {
                    column: self.name.clone(),
                    expected: self.column_type.name().to_string(),
                    found: "NULL".to_string(),
                });
            }
            return Ok(());
        }

        match value.column_type() {
            Some(ty) if ty == self.column_type => Ok(()),
            _ => Err(Error::TypeMismatch {
                column: self.name.clone(),
                expected: self.column_type.name().to_string(),
                found: format!("{:?}", value),
            }),
        }
    }

    pub fn get(&self, index: usize) -> Result<&ColumnValue> {
        self.values.get(index).ok_or(Error::RowOutOfRange {
            row: index,
            len: self.values.len(),
        })
    }

    /// Fast numeric access.
    /// Returns None if the value is null, not numeric, or index out of bounds.
    #[inline]
    pub fn get_f64(&self, index: usize) -> Option<f64> {
        self.values.get(index).and_then(ColumnValue::to_f64)
    }

    #[inline]
    pub fn is_null_at(&self, index: usize) -> bool {
        self.values.get(index).map(ColumnValue::is_null).unwrap_or(false)
    }

    pub fn append(&mut self, value: ColumnValue) -> Result<()> {
        self.validate_value(&value)?;
        self.values.push(value);
        Ok(())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ColumnValue> {
        self.values.iter()
    }

    /// Non-null numeric values, in row order.
    pub fn numeric_values(&self) -> impl Iterator<Item = f64> + '_ {
        self.values.iter().filter_map(ColumnValue::to_f64)
    }

    /// New column holding the rows at `indices`, in that order.
    pub fn take(&self, indices: &[usize]) -> Result<Column> {
        let mut values = Vec::with_capacity(indices.len());
        for &i in indices {
            values.push(self.get(i)?.clone());
        }
        Ok(Column {
            name: self.name.clone(),
            column_type: self.column_type,
            nullable: self.nullable,
            values,
        })
    }
}

impl Debug for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Column {{ name: '{}', type: {:?}, nullable: {}, len: {} }}",
            self.name,
            self.column_type,
            self.nullable,
            self.len()
        )
    }
}
