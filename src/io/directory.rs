//! A data directory on disk, with each table cached for the configured TTL.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tracing::{info, warn};

use super::cache::TableCache;
use super::load;
use crate::config::DataConfig;
use crate::error::LoadError;
use crate::pipeline::InventoryTables;
use crate::records::{
    AssessorPropertyRecord, ElectricityUsageRecord, EnergyBillingRecord,
    HeatPumpInstallationRecord, SolarCapacityRecord, VehicleRegistration, VehicleTypeFactor,
};

/// Source tables under one root directory.
///
/// File names come from [`DataConfig`]. A file that does not exist loads as
/// `None`; a file that exists but cannot be parsed is an error.
pub struct DataDirectory {
    root: PathBuf,
    files: DataConfig,
    vehicle_factors: TableCache<Vec<VehicleTypeFactor>>,
    vehicles: TableCache<Vec<VehicleRegistration>>,
    municipal_energy: TableCache<Vec<EnergyBillingRecord>>,
    assessors: TableCache<Vec<AssessorPropertyRecord>>,
    electricity: TableCache<Vec<ElectricityUsageRecord>>,
    heat_pumps: TableCache<Vec<HeatPumpInstallationRecord>>,
    solar: TableCache<Vec<SolarCapacityRecord>>,
}

fn cached<T: Clone>(
    cache: &mut TableCache<Vec<T>>,
    path: PathBuf,
    now: Instant,
    load: fn(&Path) -> Result<Vec<T>, LoadError>,
) -> Result<Option<Vec<T>>, LoadError> {
    if !path.exists() {
        warn!(path = %path.display(), "table not found");
        return Ok(None);
    }
    let key = path.to_string_lossy().into_owned();
    let table = cache.get_or_load(&key, now, || load(&path))?;
    Ok(Some(table.as_ref().clone()))
}

impl DataDirectory {
    /// # Arguments
    ///
    /// * `root` - Directory the configured file names are relative to
    /// * `files` - File names for each table
    /// * `ttl` - How long a loaded table is reused before re-reading
    pub fn new(root: impl Into<PathBuf>, files: DataConfig, ttl: Duration) -> Self {
        Self {
            root: root.into(),
            files,
            vehicle_factors: TableCache::new(ttl),
            vehicles: TableCache::new(ttl),
            municipal_energy: TableCache::new(ttl),
            assessors: TableCache::new(ttl),
            electricity: TableCache::new(ttl),
            heat_pumps: TableCache::new(ttl),
            solar: TableCache::new(ttl),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Loads every table, reusing cached copies still fresh at `now`.
    ///
    /// # Errors
    ///
    /// Returns the first [`LoadError`] from a file that exists but is
    /// malformed.
    pub fn load_tables(&mut self, now: Instant) -> Result<InventoryTables, LoadError> {
        let root = &self.root;
        let files = &self.files;
        let vehicle_factors = match &files.vehicle_factors {
            Some(name) => cached(
                &mut self.vehicle_factors,
                root.join(name),
                now,
                load::load_vehicle_factors,
            )?,
            None => None,
        };
        let tables = InventoryTables {
            vehicle_factors,
            vehicles: cached(
                &mut self.vehicles,
                root.join(&files.vehicles),
                now,
                load::load_vehicle_registrations,
            )?,
            municipal_energy: cached(
                &mut self.municipal_energy,
                root.join(&files.municipal_energy),
                now,
                load::load_municipal_energy,
            )?,
            assessors: cached(
                &mut self.assessors,
                root.join(&files.assessors),
                now,
                load::load_assessors,
            )?,
            electricity: cached(
                &mut self.electricity,
                root.join(&files.electricity_dir),
                now,
                load::load_electricity_dir,
            )?,
            heat_pumps: cached(
                &mut self.heat_pumps,
                root.join(&files.heat_pumps),
                now,
                load::load_heat_pumps,
            )?,
            solar: cached(&mut self.solar, root.join(&files.solar), now, load::load_solar)?,
        };
        info!(root = %root.display(), "data directory loaded");
        Ok(tables)
    }

    /// Forgets every cached table so the next load re-reads the files.
    pub fn invalidate_all(&mut self) {
        self.vehicle_factors.invalidate_all();
        self.vehicles.invalidate_all();
        self.municipal_energy.invalidate_all();
        self.assessors.invalidate_all();
        self.electricity.invalidate_all();
        self.heat_pumps.invalidate_all();
        self.solar.invalidate_all();
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("ghg-inventory-{name}-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn missing_files_load_as_none() {
        let dir = scratch_dir("missing");
        fs::write(
            dir.join("heat_pumps.csv"),
            "Year,Cumulative Installs,Cumulative Locations\n2021,200,165\n",
        )
        .unwrap();
        let mut data = DataDirectory::new(&dir, DataConfig::default(), Duration::from_secs(600));
        let tables = data.load_tables(Instant::now()).unwrap();
        assert!(tables.vehicles.is_none());
        assert!(tables.electricity.is_none());
        assert_eq!(tables.heat_pumps.map(|t| t.len()), Some(1));
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn cached_tables_survive_file_changes_until_invalidated() {
        let dir = scratch_dir("cache");
        let path = dir.join("heat_pumps.csv");
        fs::write(&path, "Year,Cumulative Installs,Cumulative Locations\n2021,200,165\n").unwrap();
        let mut data = DataDirectory::new(&dir, DataConfig::default(), Duration::from_secs(600));
        let now = Instant::now();
        data.load_tables(now).unwrap();

        fs::write(
            &path,
            "Year,Cumulative Installs,Cumulative Locations\n2021,200,165\n2022,260,210\n",
        )
        .unwrap();
        let cached = data.load_tables(now).unwrap();
        assert_eq!(cached.heat_pumps.map(|t| t.len()), Some(1));

        data.invalidate_all();
        let fresh = data.load_tables(now).unwrap();
        assert_eq!(fresh.heat_pumps.map(|t| t.len()), Some(2));
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = scratch_dir("malformed");
        fs::write(dir.join("solar.csv"), "Year,City\nnext year,Truro\n").unwrap();
        let mut data = DataDirectory::new(&dir, DataConfig::default(), Duration::from_secs(600));
        assert!(data.load_tables(Instant::now()).is_err());
        fs::remove_dir_all(&dir).ok();
    }
}
