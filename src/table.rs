/// House Rocket Table Implementation
///
/// A Table is a collection of columns with a schema. Tables are read-only
/// once built: row selection, projection and derived columns all return a
/// new table and leave the source untouched.
///
/// # Examples
///
/// ```
/// use house_rocket::{Table, Schema, ColumnType, ColumnValue};
/// use std::collections::HashMap;
///
/// let schema = Schema::new(vec![
///     ("id".to_string(), ColumnType::Int64, false),
///     ("zipcode".to_string(), ColumnType::Int32, false),
///     ("price".to_string(), ColumnType::Float64, true),
/// ]);
///
/// let mut table = Table::new("houses".to_string(), schema);
///
/// let mut row = HashMap::new();
/// row.insert("id".to_string(), ColumnValue::Int64(7129300520));
/// row.insert("zipcode".to_string(), ColumnValue::Int32(98178));
/// row.insert("price".to_string(), ColumnValue::Float64(221900.0));
/// table.append_row(row).unwrap();
///
/// assert_eq!(table.len(), 1);
/// assert_eq!(table.get_value(0, "zipcode").unwrap().as_i32(), Some(98178));
/// ```

use crate::column::{Column, ColumnType, ColumnValue};
use crate::error::{Error, Result};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashMap;

/// Schema definition with column names and types.
///
/// # Examples
///
/// ```
/// use house_rocket::{Schema, ColumnType};
///
/// let schema = Schema::new(vec![
///     ("id".to_string(), ColumnType::Int64, false),
///     ("date".to_string(), ColumnType::Date, false),
///     ("price".to_string(), ColumnType::Float64, true),
/// ]);
///
/// assert_eq!(schema.len(), 3);
/// assert_eq!(schema.get_column_index("date"), Some(1));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    columns: Vec<(String, ColumnType, bool)>, // (name, type, nullable)
}

impl Schema {
    /// Creates a new schema from (column_name, column_type, is_nullable) tuples.
    pub fn new(columns: Vec<(String, ColumnType, bool)>) -> Self {
        Schema { columns }
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn get_column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|(name, _, _)| name.as_str()).collect()
    }

    pub fn get_column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|(n, _, _)| n == name)
    }

    /// Returns (name, type, nullable) for the column at `index`.
    pub fn get_column_info(&self, index: usize) -> Option<(&str, ColumnType, bool)> {
        self.columns.get(index).map(|(name, ty, nullable)| (name.as_str(), *ty, *nullable))
    }

    pub fn get_column_type(&self, name: &str) -> Option<ColumnType> {
        self.columns.iter()
            .find(|(n, _, _)| n == name)
            .map(|(_, ty, _)| *ty)
    }
}

/// JSON shape of a table: ordered column names plus one object per row.
#[derive(Debug, Clone, Serialize)]
pub struct TableJson {
    pub name: String,
    pub columns: Vec<String>,
    pub rows: Vec<serde_json::Map<String, serde_json::Value>>,
}

/// Root table owning its data.
#[derive(Clone)]
pub struct Table {
    name: String,
    schema: Schema,
    columns: Vec<Column>,
    row_count: usize,
}

impl Table {
    /// Create an empty table with the given schema.
    pub fn new(name: String, schema: Schema) -> Self {
        let columns = schema
            .columns
            .iter()
            .map(|(col_name, col_type, nullable)| Column::new(col_name.clone(), *col_type, *nullable))
            .collect();

        Table {
            name,
            schema,
            columns,
            row_count: 0,
        }
    }

    /// Assemble a table from already-built columns of equal length.
    pub fn from_columns(name: String, columns: Vec<Column>) -> Result<Self> {
        let row_count = columns.first().map(Column::len).unwrap_or(0);
        for col in &columns {
            if col.len() != row_count {
                return Err(Error::ColumnLengthMismatch {
                    column: col.name().to_string(),
                    expected: row_count,
                    found: col.len(),
                });
            }
        }

        let schema = Schema::new(
            columns
                .iter()
                .map(|c| (c.name().to_string(), c.column_type(), c.is_nullable()))
                .collect(),
        );

        Ok(Table {
            name,
            schema,
            columns,
            row_count,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn len(&self) -> usize {
        self.row_count
    }

    pub fn is_empty(&self) -> bool {
        self.row_count == 0
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Result<&Column> {
        let col_idx = self.schema
            .get_column_index(name)
            .ok_or_else(|| Error::MissingColumn(name.to_string()))?;
        Ok(&self.columns[col_idx])
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.schema.get_column_index(name).is_some()
    }

    pub fn get_value(&self, row: usize, column: &str) -> Result<&ColumnValue> {
        self.column(column)?.get(row)
    }

    pub fn get_row(&self, row: usize) -> Result<HashMap<String, ColumnValue>> {
        if row >= self.row_count {
            return Err(Error::RowOutOfRange { row, len: self.row_count });
        }

        let mut result = HashMap::new();
        for col in &self.columns {
            result.insert(col.name().to_string(), col.get(row)?.clone());
        }
        Ok(result)
    }

    /// Append a row while building a table. Every schema column must be present.
    pub fn append_row(&mut self, row: HashMap<String, ColumnValue>) -> Result<()> {
        for col_name in self.schema.get_column_names() {
            if !row.contains_key(col_name) {
                return Err(Error::MissingColumn(col_name.to_string()));
            }
        }

        // Validate every value before touching any column so a bad row leaves
        // the table unchanged.
        let mut staged = Vec::with_capacity(self.columns.len());
        for col in &self.columns {
            let mut check = Column::new(col.name().to_string(), col.column_type(), col.is_nullable());
            let value = row[col.name()].clone();
            check.append(value.clone())?;
            staged.push(value);
        }

        for (col, value) in self.columns.iter_mut().zip(staged) {
            col.append(value)?;
        }
        self.row_count += 1;
        Ok(())
    }

    pub fn iter_rows(&self) -> TableRowIterator<'_> {
        TableRowIterator {
            table: self,
            index: 0,
        }
    }

    // ========================================================================
    // Derived tables
    // ========================================================================

    /// New table holding the rows at `indices`, in that order.
    pub fn select_rows(&self, indices: &[usize]) -> Result<Table> {
        let columns = self.columns
            .iter()
            .map(|c| c.take(indices))
            .collect::<Result<Vec<_>>>()?;
        Table::from_columns(self.name.clone(), columns)
    }

    /// First `n` rows (fewer if the table is shorter).
    pub fn head(&self, n: usize) -> Result<Table> {
        let indices: Vec<usize> = (0..n.min(self.row_count)).collect();
        self.select_rows(&indices)
    }

    /// New table restricted to `names`, in the order given.
    pub fn project(&self, names: &[String]) -> Result<Table> {
        let columns = names
            .iter()
            .map(|n| self.column(n).cloned())
            .collect::<Result<Vec<_>>>()?;
        Ok(Table {
            name: self.name.clone(),
            schema: Schema::new(
                columns
                    .iter()
                    .map(|c| (c.name().to_string(), c.column_type(), c.is_nullable()))
                    .collect(),
            ),
            columns,
            row_count: self.row_count,
        })
    }

    /// New table with `column` appended, or replacing a column of the same name.
    pub fn with_column(&self, column: Column) -> Result<Table> {
        if column.len() != self.row_count {
            return Err(Error::ColumnLengthMismatch {
                column: column.name().to_string(),
                expected: self.row_count,
                found: column.len(),
            });
        }

        let mut columns = self.columns.clone();
        match self.schema.get_column_index(column.name()) {
            Some(idx) => columns[idx] = column,
            None => columns.push(column),
        }
        Table::from_columns(self.name.clone(), columns)
    }

    pub fn renamed(mut self, name: impl Into<String>) -> Table {
        self.name = name.into();
        self
    }

    // ========================================================================
    // Aggregation Methods
    // ========================================================================

    /// Count the number of non-NULL values in a column.
    pub fn count_non_null(&self, column: &str) -> Result<usize> {
        let col = self.column(column)?;
        Ok(col.iter().filter(|v| !v.is_null()).count())
    }

    /// Average of the non-NULL, non-NaN numeric values in a column.
    /// Returns None if there are none.
    pub fn avg(&self, column: &str) -> Result<Option<f64>> {
        let col = self.column(column)?;
        let mut sum = 0.0;
        let mut count = 0;
        for num in col.numeric_values().filter(|v| !v.is_nan()) {
            sum += num;
            count += 1;
        }

        if count > 0 {
            Ok(Some(sum / count as f64))
        } else {
            Ok(None)
        }
    }

    /// Smallest comparable value in a column (numbers, dates, strings).
    pub fn min_value(&self, column: &str) -> Result<Option<ColumnValue>> {
        self.extreme_value(column, Ordering::Less)
    }

    /// Largest comparable value in a column (numbers, dates, strings).
    pub fn max_value(&self, column: &str) -> Result<Option<ColumnValue>> {
        self.extreme_value(column, Ordering::Greater)
    }

    fn extreme_value(&self, column: &str, wanted: Ordering) -> Result<Option<ColumnValue>> {
        let col = self.column(column)?;
        let mut best: Option<&ColumnValue> = None;
        for value in col.iter() {
            // NaN and NULL never compare, so they never win.
            if value.compare(value) != Some(Ordering::Equal) {
                continue;
            }
            best = match best {
                Some(current) if value.compare(current) != Some(wanted) => Some(current),
                _ => Some(value),
            };
        }
        Ok(best.cloned())
    }

    /// Distinct non-NULL values of a column in ascending order.
    pub fn distinct_sorted(&self, column: &str) -> Result<Vec<ColumnValue>> {
        let col = self.column(column)?;
        let mut values: Vec<ColumnValue> = Vec::new();
        for value in col.iter() {
            if value.compare(value) != Some(Ordering::Equal) {
                continue;
            }
            if !values.iter().any(|v| v.matches(value)) {
                values.push(value.clone());
            }
        }
        values.sort_by(|a, b| a.compare(b).unwrap_or(Ordering::Equal));
        Ok(values)
    }

    // ========================================================================
    // Serialization
    // ========================================================================

    pub fn to_json_value(&self) -> TableJson {
        let columns: Vec<String> = self.schema
            .get_column_names()
            .into_iter()
            .map(str::to_string)
            .collect();

        let rows = (0..self.row_count)
            .map(|row| {
                self.columns
                    .iter()
                    .map(|col| {
                        let value = col.get(row).map(ColumnValue::to_json).unwrap_or(serde_json::Value::Null);
                        (col.name().to_string(), value)
                    })
                    .collect()
            })
            .collect();

        TableJson {
            name: self.name.clone(),
            columns,
            rows,
        }
    }

    /// Export the table as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.to_json_value())?)
    }
}

pub struct TableRowIterator<'a> {
    table: &'a Table,
    index: usize,
}

impl<'a> Iterator for TableRowIterator<'a> {
    type Item = HashMap<String, ColumnValue>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.index >= self.table.row_count {
            None
        } else {
            let result = self.table.get_row(self.index).ok();
            self.index += 1;
            result
        }
    }
}

impl std::fmt::Debug for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Table {{ name: '{}', columns: {}, rows: {} }}",
            self.name,
            self.schema.len(),
            self.row_count
        )
    }
}
