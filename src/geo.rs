//! Zipcode boundaries for the price choropleth.

use crate::aggregate::{Aggregate, GroupKey};
use crate::error::{Error, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// `[longitude, latitude]`, optionally followed by an altitude.
pub type Position = Vec<f64>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "coordinates")]
pub enum Geometry {
    Polygon(Vec<Vec<Position>>),
    MultiPolygon(Vec<Vec<Vec<Position>>>),
}

/// One zipcode boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoRegion {
    pub zip: i64,
    pub geometry: Geometry,
    pub properties: Map<String, Value>,
}

impl GeoRegion {
    pub fn key(&self) -> GroupKey {
        GroupKey::Int(self.zip)
    }

    /// Render as a GeoJSON feature with `extra` merged into its properties.
    pub fn to_feature(&self, extra: Map<String, Value>) -> Value {
        let mut properties = self.properties.clone();
        properties.extend(extra);
        json!({
            "type": "Feature",
            "properties": properties,
            "geometry": self.geometry,
        })
    }
}

#[derive(Deserialize)]
struct RawCollection {
    #[serde(rename = "type")]
    kind: String,
    features: Vec<RawFeature>,
}

#[derive(Deserialize)]
struct RawFeature {
    #[serde(default)]
    properties: Option<Map<String, Value>>,
    #[serde(default)]
    geometry: Value,
}

fn zip_of(properties: &Map<String, Value>) -> Option<i64> {
    match properties.get("ZIP")? {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Parse zipcode regions from a GeoJSON FeatureCollection. Features without a
/// usable `ZIP` property or a polygonal geometry are skipped.
pub fn parse_regions(geojson: &str) -> Result<Vec<GeoRegion>> {
    let value: Value = serde_json::from_str(geojson)?;
    regions_from_value(value)
}

pub fn read_regions<R: Read>(reader: R) -> Result<Vec<GeoRegion>> {
    let value: Value = serde_json::from_reader(reader)?;
    regions_from_value(value)
}

/// Load zipcode regions from a GeoJSON file.
pub fn load_regions(path: impl AsRef<Path>) -> Result<Vec<GeoRegion>> {
    let path = path.as_ref();
    let regions = read_regions(BufReader::new(File::open(path)?))?;
    info!("Loaded {} zipcode regions from {}", regions.len(), path.display());
    Ok(regions)
}

fn regions_from_value(value: Value) -> Result<Vec<GeoRegion>> {
    let collection: RawCollection = serde_json::from_value(value)
        .map_err(|e| Error::InvalidGeoJson(e.to_string()))?;
    if collection.kind != "FeatureCollection" {
        return Err(Error::InvalidGeoJson(format!(
            "expected a FeatureCollection, got {}",
            collection.kind
        )));
    }

    let mut regions = Vec::with_capacity(collection.features.len());
    for (idx, feature) in collection.features.into_iter().enumerate() {
        let properties = feature.properties.unwrap_or_default();
        let Some(zip) = zip_of(&properties) else {
            debug!("Skipping feature {}: no ZIP property", idx);
            continue;
        };
        let geometry = match serde_json::from_value::<Geometry>(feature.geometry) {
            Ok(g) => g,
            Err(e) => {
                debug!("Skipping feature {} (ZIP {}): {}", idx, zip, e);
                continue;
            }
        };
        regions.push(GeoRegion { zip, geometry, properties });
    }
    Ok(regions)
}

/// FeatureCollection of the regions that have a value in `aggregate`, each
/// carrying that value under the aggregate's label (`PRICE` for the price map).
pub fn choropleth(regions: &[GeoRegion], aggregate: &Aggregate) -> Value {
    let features: Vec<Value> = regions
        .iter()
        .filter_map(|region| {
            let value = aggregate.get(&region.key())?;
            let mut extra = Map::new();
            extra.insert(aggregate.label().to_string(), value.to_json());
            Some(region.to_feature(extra))
        })
        .collect();

    json!({
        "type": "FeatureCollection",
        "features": features,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::mean_price_by_zip;
    use crate::column::{ColumnType, ColumnValue};
    use crate::table::{Schema, Table};
    use std::collections::HashMap;

    const GEOJSON: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {"type": "Feature", "properties": {"ZIP": 98001, "NAME": "Auburn"},
             "geometry": {"type": "Polygon", "coordinates": [[[-122.3, 47.3], [-122.2, 47.3], [-122.2, 47.4], [-122.3, 47.3]]]}},
            {"type": "Feature", "properties": {"ZIP": "98002"},
             "geometry": {"type": "MultiPolygon", "coordinates": [[[[-122.2, 47.3, 0.0], [-122.1, 47.3, 0.0], [-122.1, 47.4, 0.0], [-122.2, 47.3, 0.0]]]]}},
            {"type": "Feature", "properties": {"NAME": "no zip"},
             "geometry": {"type": "Polygon", "coordinates": []}},
            {"type": "Feature", "properties": {"ZIP": 98003},
             "geometry": {"type": "Point", "coordinates": [-122.0, 47.0]}},
            {"type": "Feature", "properties": {"ZIP": 98004.0},
             "geometry": {"type": "Polygon", "coordinates": [[[-122.2, 47.6], [-122.1, 47.6], [-122.2, 47.6]]]}},
            {"type": "Feature", "properties": {"ZIP": 98005.5},
             "geometry": {"type": "Polygon", "coordinates": []}}
        ]
    }"#;

    #[test]
    fn test_parse_regions() {
        let regions = parse_regions(GEOJSON).unwrap();
        assert_eq!(regions.len(), 3);
        assert_eq!(regions[0].zip, 98001);
        assert!(matches!(regions[0].geometry, Geometry::Polygon(_)));
        assert_eq!(regions[0].properties["NAME"], "Auburn");
        assert_eq!(regions[1].zip, 98002);
        assert!(matches!(regions[1].geometry, Geometry::MultiPolygon(_)));
        // exported as a float
        assert_eq!(regions[2].zip, 98004);
    }

    #[test]
    fn test_not_a_feature_collection() {
        let err = parse_regions(r#"{"type": "Feature", "features": []}"#).unwrap_err();
        assert!(matches!(err, Error::InvalidGeoJson(_)));
        assert!(matches!(parse_regions("[1, 2"), Err(Error::Json(_))));
    }

    #[test]
    fn test_choropleth_keeps_priced_regions() {
        let schema = Schema::new(vec![
            ("zipcode".to_string(), ColumnType::Int32, false),
            ("price".to_string(), ColumnType::Float64, false),
        ]);
        let mut houses = Table::new("houses".to_string(), schema);
        for (zip, price) in [(98002, 300000.0), (98002, 500000.0), (98999, 1.0)] {
            let mut row = HashMap::new();
            row.insert("zipcode".to_string(), ColumnValue::Int32(zip));
            row.insert("price".to_string(), ColumnValue::Float64(price));
            houses.append_row(row).unwrap();
        }

        let regions = parse_regions(GEOJSON).unwrap();
        let map = choropleth(&regions, &mean_price_by_zip(&houses).unwrap());

        assert_eq!(map["type"], "FeatureCollection");
        let features = map["features"].as_array().unwrap();
        assert_eq!(features.len(), 1);
        assert_eq!(features[0]["properties"]["ZIP"], "98002");
        assert_eq!(features[0]["properties"]["PRICE"], 400000.0);
        assert_eq!(features[0]["geometry"]["type"], "MultiPolygon");
    }
}
