//! The loaded dashboard data and a shared, reloadable handle to it.
//!
//! A [`Dataset`] is immutable once built. [`DataHandle`] hands out `Arc`
//! snapshots; a reload swaps in a new snapshot while readers holding the old
//! one keep using it.

use crate::config::DashboardConfig;
use crate::error::Result;
use crate::features::derive_features;
use crate::geo::{load_regions, GeoRegion};
use crate::loader::load_houses;
use crate::table::Table;
use log::info;
use std::sync::{Arc, RwLock};

#[derive(Debug, Clone)]
pub struct Dataset {
    houses: Table,
    regions: Vec<GeoRegion>,
}

impl Dataset {
    /// Load both input files and derive the area features.
    pub fn load(config: &DashboardConfig) -> Result<Self> {
        let houses = load_houses(&config.data_path)?;
        let regions = load_regions(&config.geofile_path)?;
        Self::from_parts(houses, regions)
    }

    /// Build from an already loaded sales table (without derived columns).
    pub fn from_parts(houses: Table, regions: Vec<GeoRegion>) -> Result<Self> {
        Ok(Dataset {
            houses: derive_features(&houses)?,
            regions,
        })
    }

    /// The sales table including `price_m2` and `living_m2`.
    pub fn houses(&self) -> &Table {
        &self.houses
    }

    pub fn regions(&self) -> &[GeoRegion] {
        &self.regions
    }
}

pub struct DataHandle {
    current: RwLock<Arc<Dataset>>,
    config: DashboardConfig,
}

impl DataHandle {
    pub fn new(dataset: Dataset, config: DashboardConfig) -> Self {
        DataHandle {
            current: RwLock::new(Arc::new(dataset)),
            config,
        }
    }

    /// Load the dataset described by `config`.
    pub fn open(config: DashboardConfig) -> Result<Self> {
        let dataset = Dataset::load(&config)?;
        Ok(Self::new(dataset, config))
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    /// The current dataset.
    pub fn snapshot(&self) -> Arc<Dataset> {
        // A poisoned lock still holds a complete Arc; the swap cannot tear.
        match self.current.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    /// Re-read the input files and publish the result. On error the current
    /// dataset stays in place.
    pub fn reload(&self) -> Result<Arc<Dataset>> {
        let fresh = Arc::new(Dataset::load(&self.config)?);
        self.replace(Arc::clone(&fresh));
        info!("Reloaded dataset: {} houses, {} regions", fresh.houses.len(), fresh.regions.len());
        Ok(fresh)
    }

    /// Publish an already built dataset.
    pub fn replace(&self, dataset: Arc<Dataset>) {
        match self.current.write() {
            Ok(mut guard) => *guard = dataset,
            Err(poisoned) => *poisoned.into_inner() = dataset,
        }
    }
}
