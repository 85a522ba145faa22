/// House Rocket - analytics backend for a real-estate sales dashboard
///
/// Loads the King County house sales table and zipcode boundaries, derives
/// price-per-area columns, and computes every table the dashboard shows:
/// filtered previews, descriptive statistics, averages by zipcode, price
/// series, histograms and map layers.

pub mod error;
pub mod column;
pub mod table;
pub mod features;
pub mod stats;
pub mod aggregate;
pub mod filter;
pub mod loader;
pub mod geo;
pub mod config;
pub mod dataset;
pub mod dashboard;

pub use error::{Error, Result};
pub use column::{Column, ColumnType, ColumnValue};
pub use table::{Schema, Table, TableJson};
pub use features::{derive_features, LIVING_M2, PRICE_M2};
pub use stats::{describe, histogram, summarize, Bin, ColumnSummary, Histogram};
pub use aggregate::{
    group_by, join_aggregates, mean_price_by, mean_price_by_zip, zipcode_overview, Aggregate,
    AggregateFunction, GroupKey, JoinType,
};
pub use filter::{Filter, Predicate};
pub use loader::{load_houses, read_houses};
pub use geo::{choropleth, load_regions, parse_regions, GeoRegion, Geometry};
pub use config::DashboardConfig;
pub use dataset::{DataHandle, Dataset};

// HTTP server - only when server feature is enabled
#[cfg(feature = "server")]
pub mod server;

#[cfg(test)]
mod integration_tests {
    use super::*;
    use std::collections::HashMap;

    fn sales() -> Table {
        let schema = Schema::new(vec![
            ("id".to_string(), ColumnType::Int64, false),
            ("zipcode".to_string(), ColumnType::Int32, false),
            ("price".to_string(), ColumnType::Float64, false),
            ("sqft_lot".to_string(), ColumnType::Int64, false),
            ("sqft_living".to_string(), ColumnType::Int64, false),
        ]);
        let mut table = Table::new("houses".to_string(), schema);

        for (id, price, lot, living) in [(1, 200000.0, 5000, 1000), (2, 300000.0, 10000, 2000)] {
            let mut row = HashMap::new();
            row.insert("id".to_string(), ColumnValue::Int64(id));
            row.insert("zipcode".to_string(), ColumnValue::Int32(98001));
            row.insert("price".to_string(), ColumnValue::Float64(price));
            row.insert("sqft_lot".to_string(), ColumnValue::Int64(lot));
            row.insert("sqft_living".to_string(), ColumnValue::Int64(living));
            table.append_row(row).unwrap();
        }
        table
    }

    #[test]
    fn test_complete_workflow() {
        // Derive, filter by zipcode, then aggregate
        let houses = derive_features(&sales()).unwrap();

        let living = houses.column(LIVING_M2).unwrap();
        assert!((living.get_f64(0).unwrap() - 92.90).abs() < 1e-9);
        assert!((living.get_f64(1).unwrap() - 185.80).abs() < 1e-9);

        let selected = Filter::new()
            .with(Predicate::in_set("zipcode", vec![ColumnValue::Int32(98001)]))
            .apply(&houses)
            .unwrap();
        assert_eq!(selected.len(), 2);

        let overview = zipcode_overview(&selected).unwrap();
        assert_eq!(overview.len(), 1);
        assert_eq!(overview.get_value(0, "ZIPCODE").unwrap().as_i32(), Some(98001));
        assert_eq!(overview.get_value(0, "TOTAL HOUSES").unwrap().as_i64(), Some(2));
        assert_eq!(overview.get_value(0, "PRICE").unwrap().as_f64(), Some(250000.0));

        let mean_living = overview.get_value(0, "LIVING ROOM M2").unwrap().as_f64().unwrap();
        assert!((mean_living - 139.35).abs() < 1e-9);

        let mean_price_m2 = overview.get_value(0, "PRICE/LOT M2").unwrap().as_f64().unwrap();
        assert!((mean_price_m2 - (430.56 + 322.92) / 2.0).abs() < 1e-9);

        // Statistics over the same selection
        let stats = describe(&selected).unwrap();
        assert_eq!(stats.len(), 7);
        assert_eq!(stats.get_value(2, "attributes").unwrap().as_string(), Some("price"));
        assert_eq!(stats.get_value(2, "median").unwrap().as_f64(), Some(250000.0));
    }

    #[test]
    fn test_filters_compose_with_aggregates() {
        let houses = derive_features(&sales()).unwrap();

        let none = Filter::new()
            .with(Predicate::at_most("price", ColumnValue::Float64(100000.0)))
            .apply(&houses)
            .unwrap();
        assert!(none.is_empty());
        assert!(zipcode_overview(&none).unwrap().is_empty());
        assert!(describe(&none).unwrap().get_value(0, "mean").unwrap().is_null());

        let cheapest = Filter::new()
            .with(Predicate::at_most("price", houses.min_value("price").unwrap().unwrap()))
            .apply(&houses)
            .unwrap();
        let counts = group_by(&cheapest, "zipcode", AggregateFunction::Count, "id").unwrap();
        assert_eq!(counts.get(&GroupKey::Int(98001)), Some(&ColumnValue::Int64(1)));
    }
}
