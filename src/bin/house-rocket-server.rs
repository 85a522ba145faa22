/// House Rocket dashboard server
///
/// Loads the sales dataset and the zipcode boundaries once, then serves the
/// dashboard sections as JSON to a browser front-end.

use house_rocket::config::DashboardConfig;
use house_rocket::dataset::DataHandle;
use house_rocket::server::run_server;
use log::error;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = DashboardConfig::from_env().map_err(|e| {
        error!("{}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e)
    })?;

    let data = DataHandle::open(config).map_err(|e| {
        error!("Failed to load dashboard data: {}", e);
        std::io::Error::new(std::io::ErrorKind::Other, e)
    })?;

    run_server(data).await
}
