/// Dashboard Overview Example
///
/// This example demonstrates:
/// - Loading a sales CSV and deriving the m2 columns
/// - Filtering by zipcode and selecting columns
/// - Descriptive statistics and averages by zipcode
///
/// Usage: cargo run --example overview -- [path/to/kc_house_data.csv]

use house_rocket::dashboard::{overview, OverviewFilter};
use house_rocket::{load_houses, read_houses, Dataset};

const SAMPLE: &str = "id,date,price,bedrooms,bathrooms,sqft_living,sqft_lot,floors,waterfront,yr_built,zipcode,lat,long
7129300520,20141013T000000,221900,3,1,1180,5650,1,0,1955,98178,47.5112,-122.257
6414100192,20141209T000000,538000,3,2.25,2570,7242,2,0,1951,98125,47.721,-122.319
5631500400,20150225T000000,180000,2,1,770,10000,1,0,1933,98028,47.7379,-122.233
2487200875,20141209T000000,604000,4,3,1960,5000,1,0,1965,98136,47.5208,-122.393
1954400510,20150218T000000,510000,3,2,1680,8080,1,0,1987,98074,47.6168,-122.045
7237550310,20140512T000000,1225000,4,4.5,5420,101930,1,0,2001,98053,47.6561,-122.005
1321400060,20140627T000000,257500,3,2.25,1715,6819,2,0,1995,98003,47.3097,-122.327
2008000270,20150115T000000,291850,3,1.5,1060,9711,1,0,1963,98198,47.4095,-122.315
2414600126,20150415T000000,229500,3,1,1780,7470,1,0,1960,98146,47.5123,-122.337
3793500160,20150312T000000,323000,3,2.5,1890,6560,2,0,2003,98038,47.3684,-122.031
1736800520,20150403T000000,662500,3,2.5,3560,9796,1,0,1965,98007,47.6007,-122.145
9212900260,20140527T000000,468000,2,1,1160,6000,1,0,1942,98115,47.69,-122.292
";

fn main() -> house_rocket::Result<()> {
    println!("=== House Rocket Overview Example ===\n");

    // 1. Load data
    println!("1. Loading sales...");
    let houses = match std::env::args().nth(1) {
        Some(path) => load_houses(path)?,
        None => read_houses("houses", SAMPLE.as_bytes())?,
    };
    let data = Dataset::from_parts(houses, Vec::new())?;
    println!("   {} sales, {} columns\n", data.houses().len(), data.houses().schema().len());

    // 2. Unfiltered overview
    println!("2. Averages by zipcode...");
    let all = overview(data.houses(), &OverviewFilter::default())?;
    println!("{}\n", all.by_zipcode.to_json()?);

    // 3. A narrower selection
    println!("3. Price and living area in 98125 and 98136...");
    let selection = OverviewFilter {
        columns: vec!["id".to_string(), "price".to_string(), "living_m2".to_string()],
        zipcodes: vec![98125, 98136],
    };
    let section = overview(data.houses(), &selection)?;
    println!("   {} matching sales", section.matching_rows);
    println!("{}\n", section.statistics.to_json()?);

    println!("=== Example completed successfully! ===");
    Ok(())
}
