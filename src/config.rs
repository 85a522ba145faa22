/// Runtime configuration read from environment variables.
use crate::error::{Error, Result};
use std::path::PathBuf;

pub const DEFAULT_DATA_PATH: &str = "kc_house_data.csv";
pub const DEFAULT_GEOFILE_PATH: &str = "zip_codes.geojson";
pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardConfig {
    pub data_path: PathBuf,
    pub geofile_path: PathBuf,
    pub host: String,
    pub port: u16,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        DashboardConfig {
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
            geofile_path: PathBuf::from(DEFAULT_GEOFILE_PATH),
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl DashboardConfig {
    /// Read `HOUSE_DATA_PATH`, `GEOFILE_PATH`, `HOST` and `PORT`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with a custom variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();

        let port = match lookup("PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|e| Error::Config(format!("PORT must be a number in 0..=65535, got '{}': {}", raw, e)))?,
            None => defaults.port,
        };

        Ok(DashboardConfig {
            data_path: lookup("HOUSE_DATA_PATH").map(PathBuf::from).unwrap_or(defaults.data_path),
            geofile_path: lookup("GEOFILE_PATH").map(PathBuf::from).unwrap_or(defaults.geofile_path),
            host: lookup("HOST").unwrap_or(defaults.host),
            port,
        })
    }
}
