//! The dashboard sections, each computed from the augmented sales table.
//!
//! Every chart filters the full table independently: the bedroom limit only
//! shapes the bedroom histogram, the maximum year only the year series, and
//! so on. An unset limit imposes no restriction.

use crate::aggregate::{mean_price_by, mean_price_by_zip, zipcode_overview};
use crate::column::ColumnValue;
use crate::error::Result;
use crate::features::LIVING_M2;
use crate::filter::{Filter, Predicate};
use crate::geo::{choropleth, GeoRegion};
use crate::stats::{describe, histogram, Histogram};
use crate::table::Table;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Rows shown in the overview data preview.
pub const PREVIEW_ROWS: usize = 5;
pub const PRICE_BINS: usize = 50;
pub const BEDROOM_BINS: usize = 19;
pub const BATHROOM_BINS: usize = 19;
pub const FLOOR_BINS: usize = 10;
pub const WATERFRONT_BINS: usize = 2;

fn as_int(value: &ColumnValue) -> Option<i64> {
    match value {
        ColumnValue::Int32(n) => Some(*n as i64),
        ColumnValue::Int64(n) => Some(*n),
        _ => None,
    }
}

fn upper_bound(filter: Filter, column: &str, limit: Option<ColumnValue>) -> Filter {
    match limit {
        Some(threshold) => filter.with(Predicate::at_most(column, threshold)),
        None => filter,
    }
}

// ============================================================================
// Overview
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct OverviewFilter {
    /// Columns to show; empty shows all.
    #[serde(default)]
    pub columns: Vec<String>,
    /// Zipcodes to keep; empty keeps all.
    #[serde(default)]
    pub zipcodes: Vec<i64>,
}

#[derive(Debug, Clone)]
pub struct OverviewSection {
    /// First rows of the filtered, projected table.
    pub data: Table,
    pub matching_rows: usize,
    /// Statistics of the selected numeric columns.
    pub statistics: Table,
    /// Averages by zipcode over the selected zipcodes.
    pub by_zipcode: Table,
}

impl OverviewSection {
    pub fn to_json(&self) -> Value {
        json!({
            "data": self.data.to_json_value(),
            "matching_rows": self.matching_rows,
            "statistics": self.statistics.to_json_value(),
            "by_zipcode": self.by_zipcode.to_json_value(),
        })
    }
}

pub fn overview(houses: &Table, selection: &OverviewFilter) -> Result<OverviewSection> {
    let zipcodes = selection.zipcodes.iter().map(|z| ColumnValue::Int64(*z)).collect();
    let rows = Filter::new()
        .with(Predicate::in_set("zipcode", zipcodes))
        .apply(houses)?;
    let projected = Filter::new().select(selection.columns.clone()).apply(&rows)?;

    Ok(OverviewSection {
        data: projected.head(PREVIEW_ROWS)?,
        matching_rows: projected.len(),
        statistics: describe(&projected)?,
        // Grouping needs id, price and the derived columns whatever the
        // column selection.
        by_zipcode: zipcode_overview(&rows)?,
    })
}

// ============================================================================
// Maps
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MapCenter {
    pub lat: f64,
    pub long: f64,
}

/// Mean position of the houses, or None for an empty table.
pub fn map_center(houses: &Table) -> Result<Option<MapCenter>> {
    Ok(match (houses.avg("lat")?, houses.avg("long")?) {
        (Some(lat), Some(long)) => Some(MapCenter { lat, long }),
        _ => None,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub id: Option<i64>,
    pub lat: f64,
    pub long: f64,
    pub popup: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DensityMap {
    pub center: Option<MapCenter>,
    pub markers: Vec<Marker>,
}

fn popup(houses: &Table, row: usize) -> Result<String> {
    Ok(format!(
        "Sold ${} on: {}. Features: {} m2, {} bedrooms, {} bathrooms, year built: {}.",
        houses.get_value(row, "price")?,
        houses.get_value(row, "date")?,
        houses.get_value(row, LIVING_M2)?,
        houses.get_value(row, "bedrooms")?,
        houses.get_value(row, "bathrooms")?,
        houses.get_value(row, "yr_built")?,
    ))
}

/// One marker per house with a known position.
pub fn density_map(houses: &Table) -> Result<DensityMap> {
    let ids = houses.column("id")?;
    let lats = houses.column("lat")?;
    let longs = houses.column("long")?;

    let mut markers = Vec::with_capacity(houses.len());
    for row in 0..houses.len() {
        let (Some(lat), Some(long)) = (lats.get_f64(row), longs.get_f64(row)) else {
            continue;
        };
        markers.push(Marker {
            id: as_int(ids.get(row)?),
            lat,
            long,
            popup: popup(houses, row)?,
        });
    }

    Ok(DensityMap {
        center: map_center(houses)?,
        markers,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceMap {
    pub center: Option<MapCenter>,
    /// FeatureCollection with a `PRICE` property per zipcode.
    pub regions: Value,
}

/// Choropleth of mean price per zipcode.
pub fn price_map(houses: &Table, regions: &[GeoRegion]) -> Result<PriceMap> {
    let prices = mean_price_by_zip(houses)?;
    Ok(PriceMap {
        center: map_center(houses)?,
        regions: choropleth(regions, &prices),
    })
}

// ============================================================================
// Commercial attributes
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CommercialFilter {
    pub max_year: Option<i32>,
    pub max_date: Option<NaiveDate>,
    pub max_price: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct CommercialSection {
    pub price_by_year: Table,
    pub price_by_day: Table,
    pub price_distribution: Histogram,
}

impl CommercialSection {
    pub fn to_json(&self) -> Value {
        json!({
            "price_by_year": self.price_by_year.to_json_value(),
            "price_by_day": self.price_by_day.to_json_value(),
            "price_distribution": self.price_distribution,
        })
    }
}

pub fn commercial(houses: &Table, limits: &CommercialFilter) -> Result<CommercialSection> {
    let by_year = upper_bound(Filter::new(), "yr_built", limits.max_year.map(ColumnValue::Int32))
        .apply(houses)?;
    let by_day = upper_bound(Filter::new(), "date", limits.max_date.map(ColumnValue::Date))
        .apply(houses)?;
    let by_price = upper_bound(Filter::new(), "price", limits.max_price.map(ColumnValue::Float64))
        .apply(houses)?;

    Ok(CommercialSection {
        price_by_year: mean_price_by(&by_year, "yr_built")?,
        price_by_day: mean_price_by(&by_day, "date")?,
        price_distribution: histogram(&by_price, "price", PRICE_BINS)?,
    })
}

// ============================================================================
// House attributes
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AttributeFilter {
    pub max_bedrooms: Option<i32>,
    pub max_bathrooms: Option<f64>,
    pub max_floors: Option<f64>,
    #[serde(default)]
    pub waterfront_only: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttributeSection {
    pub bedrooms: Histogram,
    pub bathrooms: Histogram,
    pub floors: Histogram,
    pub waterfront: Histogram,
}

pub fn attributes(houses: &Table, limits: &AttributeFilter) -> Result<AttributeSection> {
    let bedrooms = upper_bound(Filter::new(), "bedrooms", limits.max_bedrooms.map(ColumnValue::Int32))
        .apply(houses)?;
    let bathrooms = upper_bound(Filter::new(), "bathrooms", limits.max_bathrooms.map(ColumnValue::Float64))
        .apply(houses)?;
    let floors = upper_bound(Filter::new(), "floors", limits.max_floors.map(ColumnValue::Float64))
        .apply(houses)?;
    let waterfront = Filter::new()
        .with(Predicate::flag_equals("waterfront", ColumnValue::Int32(1), limits.waterfront_only))
        .apply(houses)?;

    Ok(AttributeSection {
        bedrooms: histogram(&bedrooms, "bedrooms", BEDROOM_BINS)?,
        bathrooms: histogram(&bathrooms, "bathrooms", BATHROOM_BINS)?,
        floors: histogram(&floors, "floors", FLOOR_BINS)?,
        waterfront: histogram(&waterfront, "waterfront", WATERFRONT_BINS)?,
    })
}

// ============================================================================
// Filter bounds
// ============================================================================

/// Range and initial position of a slider.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Slider<T> {
    pub min: T,
    pub max: T,
    pub default: T,
}

/// Everything a front-end needs to populate its filter widgets.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterBounds {
    pub columns: Vec<String>,
    pub zipcodes: Vec<i64>,
    pub year_built: Option<Slider<i64>>,
    pub date: Option<Slider<NaiveDate>>,
    /// Whole dollars; the default is the mean price.
    pub price: Option<Slider<i64>>,
    pub bedrooms: Vec<i64>,
    pub bathrooms: Vec<f64>,
    pub floors: Vec<f64>,
}

pub fn filter_bounds(houses: &Table) -> Result<FilterBounds> {
    let year_built = match (houses.min_value("yr_built")?, houses.max_value("yr_built")?) {
        (Some(lo), Some(hi)) => as_int(&lo)
            .zip(as_int(&hi))
            .map(|(min, max)| Slider { min, max, default: max }),
        _ => None,
    };

    let date = match (houses.min_value("date")?, houses.max_value("date")?) {
        (Some(lo), Some(hi)) => lo
            .as_date()
            .zip(hi.as_date())
            .map(|(min, max)| Slider { min, max, default: max }),
        _ => None,
    };

    let price = match (
        houses.min_value("price")?.and_then(|v| v.to_f64()),
        houses.max_value("price")?.and_then(|v| v.to_f64()),
        houses.avg("price")?,
    ) {
        (Some(min), Some(max), Some(mean)) => Some(Slider {
            min: min as i64,
            max: max as i64,
            default: mean as i64,
        }),
        _ => None,
    };

    let ints = |column: &str| -> Result<Vec<i64>> {
        Ok(houses.distinct_sorted(column)?.iter().filter_map(as_int).collect())
    };
    let floats = |column: &str| -> Result<Vec<f64>> {
        Ok(houses.distinct_sorted(column)?.iter().filter_map(ColumnValue::to_f64).collect())
    };

    Ok(FilterBounds {
        columns: houses
            .schema()
            .get_column_names()
            .into_iter()
            .map(str::to_string)
            .collect(),
        zipcodes: ints("zipcode")?,
        year_built,
        date,
        price,
        bedrooms: ints("bedrooms")?,
        bathrooms: floats("bathrooms")?,
        floors: floats("floors")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Dataset;
    use crate::geo::parse_regions;
    use crate::loader::read_houses;

    const HOUSES: &str = "id,date,price,bedrooms,bathrooms,sqft_living,sqft_lot,floors,waterfront,yr_built,zipcode,lat,long\n\
        1,20141013T000000,200000,2,1,1000,5000,1,0,1950,98001,47.0,-122.0\n\
        2,20141209T000000,400000,3,2.5,2000,10000,2,1,1990,98002,48.0,-123.0\n\
        3,20150105T000000,600000,4,2,1500,6000,1.5,0,1990,98001,47.5,-122.5\n\
        4,20150301T000000,800000,5,3.25,3000,8000,3,1,2010,98003,,";

    const REGIONS: &str = r#"{"type": "FeatureCollection", "features": [
        {"type": "Feature", "properties": {"ZIP": 98001},
         "geometry": {"type": "Polygon", "coordinates": [[[-122.3, 47.3], [-122.2, 47.3], [-122.3, 47.3]]]}},
        {"type": "Feature", "properties": {"ZIP": 98155},
         "geometry": {"type": "Polygon", "coordinates": [[[-122.3, 47.7], [-122.2, 47.7], [-122.3, 47.7]]]}}
    ]}"#;

    fn dataset() -> Dataset {
        let houses = read_houses("houses", HOUSES.as_bytes()).unwrap();
        Dataset::from_parts(houses, parse_regions(REGIONS).unwrap()).unwrap()
    }

    #[test]
    fn test_overview_unfiltered() {
        let data = dataset();
        let section = overview(data.houses(), &OverviewFilter::default()).unwrap();
        assert_eq!(section.data.len(), 4);
        assert_eq!(section.matching_rows, 4);
        assert_eq!(section.by_zipcode.len(), 3);
        assert_eq!(section.by_zipcode.get_value(0, "TOTAL HOUSES").unwrap().as_i64(), Some(2));
        assert_eq!(section.by_zipcode.get_value(0, "PRICE").unwrap().as_f64(), Some(400000.0));
    }

    #[test]
    fn test_overview_selection() {
        let data = dataset();
        let selection = OverviewFilter {
            columns: vec!["price".to_string(), "date".to_string()],
            zipcodes: vec![98001],
        };
        let section = overview(data.houses(), &selection).unwrap();

        assert_eq!(section.data.schema().get_column_names(), vec!["price", "date"]);
        assert_eq!(section.matching_rows, 2);
        // date is not numeric
        assert_eq!(section.statistics.len(), 1);
        assert_eq!(section.by_zipcode.len(), 1);
        assert_eq!(section.by_zipcode.get_value(0, "ZIPCODE").unwrap().as_i32(), Some(98001));

        let json = section.to_json();
        assert_eq!(json["data"]["rows"][0]["date"], "2014-10-13");
    }

    #[test]
    fn test_density_map_skips_unknown_positions() {
        let data = dataset();
        let map = density_map(data.houses()).unwrap();
        assert_eq!(map.markers.len(), 3);
        assert_eq!(map.markers[0].id, Some(1));
        assert_eq!(
            map.markers[0].popup,
            "Sold $200000 on: 2014-10-13. Features: 92.9 m2, 2 bedrooms, 1 bathrooms, year built: 1950."
        );
        let center = map.center.unwrap();
        assert!((center.lat - 47.5).abs() < 1e-9);
        assert!((center.long + 122.5).abs() < 1e-9);
    }

    #[test]
    fn test_price_map_only_priced_regions() {
        let data = dataset();
        let map = price_map(data.houses(), data.regions()).unwrap();
        let features = map.regions["features"].as_array().unwrap();
        assert_eq!(features.len(), 1);
        assert_eq!(features[0]["properties"]["ZIP"], 98001);
        assert_eq!(features[0]["properties"]["PRICE"], 400000.0);
    }

    #[test]
    fn test_commercial_limits_each_chart() {
        let data = dataset();
        let limits = CommercialFilter {
            max_year: Some(1990),
            max_date: NaiveDate::from_ymd_opt(2014, 12, 31),
            max_price: Some(400000.0),
        };
        let section = commercial(data.houses(), &limits).unwrap();

        assert_eq!(section.price_by_year.len(), 2);
        assert_eq!(section.price_by_year.get_value(1, "price").unwrap().as_f64(), Some(500000.0));
        assert_eq!(section.price_by_day.len(), 2);
        assert_eq!(section.price_distribution.total(), 2);
        assert_eq!(section.price_distribution.bins.len(), PRICE_BINS);

        let unlimited = commercial(data.houses(), &CommercialFilter::default()).unwrap();
        assert_eq!(unlimited.price_by_year.len(), 3);
        assert_eq!(unlimited.price_distribution.total(), 4);
    }

    #[test]
    fn test_attributes() {
        let data = dataset();
        let limits = AttributeFilter {
            max_bedrooms: Some(3),
            max_bathrooms: Some(2.0),
            max_floors: None,
            waterfront_only: true,
        };
        let section = attributes(data.houses(), &limits).unwrap();
        assert_eq!(section.bedrooms.total(), 2);
        assert_eq!(section.bathrooms.total(), 2);
        assert_eq!(section.floors.total(), 4);
        assert_eq!(section.waterfront.total(), 2);
        assert_eq!(section.waterfront.bins.len(), 1);
    }

    #[test]
    fn test_filter_bounds() {
        let data = dataset();
        let bounds = filter_bounds(data.houses()).unwrap();
        assert_eq!(bounds.zipcodes, vec![98001, 98002, 98003]);
        assert_eq!(bounds.year_built, Some(Slider { min: 1950, max: 2010, default: 2010 }));
        assert_eq!(bounds.price, Some(Slider { min: 200000, max: 800000, default: 500000 }));
        assert_eq!(bounds.bedrooms, vec![2, 3, 4, 5]);
        assert_eq!(bounds.bathrooms, vec![1.0, 2.0, 2.5, 3.25]);
        assert_eq!(bounds.floors, vec![1.0, 1.5, 2.0, 3.0]);
        assert!(bounds.columns.contains(&"price_m2".to_string()));
        let date = bounds.date.unwrap();
        assert_eq!(date.min, NaiveDate::from_ymd_opt(2014, 10, 13).unwrap());
        assert_eq!(date.max, NaiveDate::from_ymd_opt(2015, 3, 1).unwrap());
    }

    #[test]
    fn test_sections_accept_empty_selection() {
        let data = dataset();
        let selection = OverviewFilter {
            columns: Vec::new(),
            zipcodes: vec![10001],
        };
        let section = overview(data.houses(), &selection).unwrap();
        assert!(section.data.is_empty());
        assert!(section.by_zipcode.is_empty());
        assert!(section.statistics.get_value(0, "mean").unwrap().is_null());

        let empty = data.houses().head(0).unwrap();
        assert!(density_map(&empty).unwrap().center.is_none());
        assert!(filter_bounds(&empty).unwrap().price.is_none());
    }
}
