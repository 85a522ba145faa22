//! CSV loading for the house sales dataset.
//!
//! Columns the dashboard knows about get a fixed type; any other column gets
//! a type inferred from each of its non-empty values:
//! - "true"/"false" (case-insensitive) → BOOL
//! - dates (`20141013T000000`, `2014-10-13`, ...) → DATE
//! - integers that fit in i32 → INT32, larger integers → INT64
//! - other numbers → FLOAT64
//! - everything else → STRING
//!
//! and widened to a type that holds them all: integers widen to INT64 and
//! then FLOAT64, any other mix becomes STRING.
//!
//! Every column is nullable; an empty cell loads as NULL. A value that does
//! not parse as its column type is a fatal error naming the data row
//! (0-based, header excluded) and column.

use crate::column::{Column, ColumnType, ColumnValue};
use crate::error::{Error, Result};
use crate::table::Table;
use chrono::{NaiveDate, NaiveDateTime};
use log::{info, warn};
use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Columns of `kc_house_data.csv` and their types.
pub const KNOWN_COLUMNS: &[(&str, ColumnType)] = &[
    ("id", ColumnType::Int64),
    ("date", ColumnType::Date),
    ("price", ColumnType::Float64),
    ("bedrooms", ColumnType::Int32),
    ("bathrooms", ColumnType::Float64),
    ("sqft_living", ColumnType::Int64),
    ("sqft_lot", ColumnType::Int64),
    ("floors", ColumnType::Float64),
    ("waterfront", ColumnType::Int32),
    ("view", ColumnType::Int32),
    ("condition", ColumnType::Int32),
    ("grade", ColumnType::Int32),
    ("sqft_above", ColumnType::Int64),
    ("sqft_basement", ColumnType::Int64),
    ("yr_built", ColumnType::Int32),
    ("yr_renovated", ColumnType::Int32),
    ("zipcode", ColumnType::Int32),
    ("lat", ColumnType::Float64),
    ("long", ColumnType::Float64),
    ("sqft_living15", ColumnType::Int64),
    ("sqft_lot15", ColumnType::Int64),
];

/// Columns every derived view depends on; loading fails without them.
pub const REQUIRED_COLUMNS: &[&str] = &[
    "id",
    "date",
    "price",
    "bedrooms",
    "bathrooms",
    "sqft_living",
    "sqft_lot",
    "floors",
    "waterfront",
    "yr_built",
    "zipcode",
    "lat",
    "long",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];
const DATETIME_FORMATS: &[&str] = &["%Y%m%dT%H%M%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"];

/// Parse a sale date. The time part, when present, is dropped.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok().map(|dt| dt.date()))
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        })
}

fn known_type(name: &str) -> Option<ColumnType> {
    KNOWN_COLUMNS
        .iter()
        .find(|(known, _)| *known == name)
        .map(|(_, ty)| *ty)
}

/// Infer the type of a single CSV value
fn infer_type_from_csv_value(value: &str) -> ColumnType {
    if value.eq_ignore_ascii_case("true") || value.eq_ignore_ascii_case("false") {
        return ColumnType::Bool;
    }

    if parse_date(value).is_some() {
        return ColumnType::Date;
    }

    if let Ok(n) = value.parse::<i64>() {
        if n >= i32::MIN as i64 && n <= i32::MAX as i64 {
            return ColumnType::Int32;
        }
        return ColumnType::Int64;
    }

    if value.parse::<f64>().is_ok() {
        return ColumnType::Float64;
    }

    ColumnType::String
}

/// Narrowest type holding values of both `a` and `b`.
fn widen(a: ColumnType, b: ColumnType) -> ColumnType {
    use ColumnType::*;
    match (a, b) {
        (a, b) if a == b => a,
        (Int32, Int64) | (Int64, Int32) => Int64,
        (Int32 | Int64 | Float64, Int32 | Int64 | Float64) => Float64,
        _ => String,
    }
}

/// Type for a column the dashboard does not know about.
fn infer_column_type<'a>(values: impl Iterator<Item = &'a str>) -> ColumnType {
    values
        .filter(|v| !v.is_empty())
        .map(infer_type_from_csv_value)
        .reduce(widen)
        .unwrap_or(ColumnType::String)
}

/// Integers written with a zero fraction (`3.0`) are accepted.
fn parse_integer(value: &str) -> Option<i64> {
    value.parse::<i64>().ok().or_else(|| {
        value
            .parse::<f64>()
            .ok()
            .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
            .map(|f| f as i64)
    })
}

/// Parse a CSV value into a ColumnValue based on expected type
fn parse_csv_value(value: &str, col_type: ColumnType) -> Option<ColumnValue> {
    if value.is_empty() {
        return Some(ColumnValue::Null);
    }

    match col_type {
        ColumnType::Int32 => parse_integer(value)
            .and_then(|n| i32::try_from(n).ok())
            .map(ColumnValue::Int32),
        ColumnType::Int64 => parse_integer(value).map(ColumnValue::Int64),
        ColumnType::Float64 => value.parse::<f64>().ok().map(ColumnValue::Float64),
        ColumnType::Bool => {
            if value.eq_ignore_ascii_case("true") {
                Some(ColumnValue::Bool(true))
            } else if value.eq_ignore_ascii_case("false") {
                Some(ColumnValue::Bool(false))
            } else {
                None
            }
        }
        ColumnType::String => Some(ColumnValue::String(value.to_string())),
        ColumnType::Date => parse_date(value).map(ColumnValue::Date),
    }
}

/// Read the sales dataset from any reader.
pub fn read_houses<R: Read>(name: &str, reader: R) -> Result<Table> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers: Vec<String> = csv_reader.headers()?.iter().map(str::to_string).collect();
    for required in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == required) {
            return Err(Error::MissingColumn(required.to_string()));
        }
    }

    let records = csv_reader.records().collect::<std::result::Result<Vec<_>, _>>()?;

    let mut columns = Vec::with_capacity(headers.len());
    for (col_idx, header) in headers.iter().enumerate() {
        let col_type = known_type(header)
            .unwrap_or_else(|| infer_column_type(records.iter().filter_map(|r| r.get(col_idx))));

        let mut values = Vec::with_capacity(records.len());
        for (row, record) in records.iter().enumerate() {
            let raw = record.get(col_idx).unwrap_or("");
            let value = parse_csv_value(raw, col_type).ok_or_else(|| Error::Parse {
                row,
                column: header.clone(),
                value: raw.to_string(),
                expected: col_type.name().to_string(),
            })?;
            values.push(value);
        }

        columns.push(Column::from_values(header.clone(), col_type, true, values)?);
    }

    Table::from_columns(name.to_string(), columns)
}

/// Load the sales dataset from a CSV file.
pub fn load_houses(path: impl AsRef<Path>) -> Result<Table> {
    let path = path.as_ref();
    let table = read_houses("houses", File::open(path)?)?;
    info!("Loaded {} house sales from {}", table.len(), path.display());

    let duplicates = duplicate_ids(&table)?;
    if duplicates > 0 {
        warn!("{} rows repeat an id already seen (houses sold more than once)", duplicates);
    }
    Ok(table)
}

/// Number of rows whose `id` repeats an earlier row's.
pub fn duplicate_ids(table: &Table) -> Result<usize> {
    let ids = table.column("id")?;
    let mut seen = HashSet::new();
    Ok(ids
        .iter()
        .filter_map(ColumnValue::as_i64)
        .filter(|id| !seen.insert(*id))
        .count())
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "id,date,price,bedrooms,bathrooms,sqft_living,sqft_lot,floors,waterfront,view,condition,grade,sqft_above,sqft_basement,yr_built,yr_renovated,zipcode,lat,long,sqft_living15,sqft_lot15";

    fn csv(rows: &[&str]) -> String {
        let mut s = HEADER.to_string();
        for row in rows {
            s.push('\n');
            s.push_str(row);
        }
        s
    }

    #[test]
    fn test_read_houses() {
        let data = csv(&[
            "7129300520,20141013T000000,221900,3,1,1180,5650,1,0,0,3,7,1180,0,1955,0,98178,47.5112,-122.257,1340,5650",
            "6414100192,20141209T000000,538000,3,2.25,2570,7242,2,0,0,3,7,2170,400,1951,1991,98125,47.721,-122.319,1690,7639",
        ]);
        let table = read_houses("houses", data.as_bytes()).unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.schema().len(), 21);
        assert_eq!(table.get_value(0, "id").unwrap().as_i64(), Some(7129300520));
        assert_eq!(
            table.get_value(0, "date").unwrap().as_date(),
            NaiveDate::from_ymd_opt(2014, 10, 13)
        );
        assert_eq!(table.get_value(1, "price").unwrap().as_f64(), Some(538000.0));
        assert_eq!(table.get_value(1, "bathrooms").unwrap().as_f64(), Some(2.25));
        assert_eq!(table.get_value(1, "zipcode").unwrap().as_i32(), Some(98125));
        assert_eq!(table.get_value(0, "long").unwrap().as_f64(), Some(-122.257));
    }

    #[test]
    fn test_missing_required_column() {
        let data = "id,date,price\n1,20141013T000000,100";
        let err = read_houses("houses", data.as_bytes()).unwrap_err();
        assert!(matches!(err, Error::MissingColumn(c) if c == "bedrooms"));
    }

    #[test]
    fn test_malformed_value_names_row_and_column() {
        let data = csv(&[
            "1,20141013T000000,100,3,1,1180,5650,1,0,0,3,7,1180,0,1955,0,98178,47.5,-122.2,1340,5650",
            "2,20141013T000000,100,three,1,1180,5650,1,0,0,3,7,1180,0,1955,0,98178,47.5,-122.2,1340,5650",
        ]);
        match read_houses("houses", data.as_bytes()).unwrap_err() {
            Error::Parse { row, column, value, .. } => {
                assert_eq!(row, 1);
                assert_eq!(column, "bedrooms");
                assert_eq!(value, "three");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_empty_cells_are_null_and_extra_columns_inferred() {
        let data = format!(
            "{},note,renovated\n{}\n{}",
            HEADER,
            "1,2014-05-02,,3,1,1180,5650,1,0,0,3,7,1180,0,1955,0,98178,47.5,-122.2,1340,5650,,true",
            "2,2014-05-03,5,3,1,1180,5650,1,0,0,3,7,1180,0,1955,0,98178,47.5,-122.2,1340,5650,corner lot,false",
        );
        let table = read_houses("houses", data.as_bytes()).unwrap();
        assert!(table.get_value(0, "price").unwrap().is_null());
        assert_eq!(table.schema().get_column_type("note"), Some(ColumnType::String));
        assert_eq!(table.schema().get_column_type("renovated"), Some(ColumnType::Bool));
        assert_eq!(table.get_value(1, "note").unwrap().as_string(), Some("corner lot"));
    }

    #[test]
    fn test_extra_columns_widen_across_rows() {
        let data = format!(
            "{},score,tag,big\n{}\n{}\n{}",
            HEADER,
            "1,2014-05-02,5,3,1,1180,5650,1,0,0,3,7,1180,0,1955,0,98178,47.5,-122.2,1340,5650,3,7,1",
            "2,2014-05-03,5,3,1,1180,5650,1,0,0,3,7,1180,0,1955,0,98178,47.5,-122.2,1340,5650,3.5,x,7129300520",
            "3,2014-05-04,5,3,1,1180,5650,1,0,0,3,7,1180,0,1955,0,98178,47.5,-122.2,1340,5650,,true,",
        );
        let table = read_houses("houses", data.as_bytes()).unwrap();
        assert_eq!(table.schema().get_column_type("score"), Some(ColumnType::Float64));
        assert_eq!(table.get_value(0, "score").unwrap().as_f64(), Some(3.0));
        assert_eq!(table.get_value(1, "score").unwrap().as_f64(), Some(3.5));
        assert!(table.get_value(2, "score").unwrap().is_null());

        assert_eq!(table.schema().get_column_type("tag"), Some(ColumnType::String));
        assert_eq!(table.get_value(0, "tag").unwrap().as_string(), Some("7"));

        assert_eq!(table.schema().get_column_type("big"), Some(ColumnType::Int64));
        assert_eq!(table.get_value(0, "big").unwrap().as_i64(), Some(1));
    }

    #[test]
    fn test_parse_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2015, 2, 25);
        assert_eq!(parse_date("20150225T000000"), expected);
        assert_eq!(parse_date("2015-02-25"), expected);
        assert_eq!(parse_date("2015-02-25T13:45:00"), expected);
        assert_eq!(parse_date("25/02/2015"), None);
    }

    #[test]
    fn test_integer_columns_accept_zero_fraction() {
        assert_eq!(parse_csv_value("3.0", ColumnType::Int32), Some(ColumnValue::Int32(3)));
        assert_eq!(parse_csv_value("3.5", ColumnType::Int32), None);
        assert_eq!(infer_type_from_csv_value("7129300520"), ColumnType::Int64);
        assert_eq!(infer_type_from_csv_value("47.5112"), ColumnType::Float64);
    }

    #[test]
    fn test_duplicate_ids() {
        let data = csv(&[
            "1,20141013T000000,100,3,1,1180,5650,1,0,0,3,7,1180,0,1955,0,98178,47.5,-122.2,1340,5650",
            "1,20150113T000000,120,3,1,1180,5650,1,0,0,3,7,1180,0,1955,0,98178,47.5,-122.2,1340,5650",
            "2,20150113T000000,120,3,1,1180,5650,1,0,0,3,7,1180,0,1955,0,98178,47.5,-122.2,1340,5650",
        ]);
        let table = read_houses("houses", data.as_bytes()).unwrap();
        assert_eq!(duplicate_ids(&table).unwrap(), 1);
    }
}
