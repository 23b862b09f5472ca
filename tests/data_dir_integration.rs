//! Loading a data directory from disk and estimating from it.

mod common;

use std::fs;
use std::time::{Duration, Instant};

use approx::assert_relative_eq;

use ghg_inventory::config::{DataConfig, InventoryConfig};
use ghg_inventory::error::{EstimationError, LoadError};
use ghg_inventory::estimate::rollup::Sector;
use ghg_inventory::io::DataDirectory;
use ghg_inventory::pipeline::estimate_inventory;

fn config() -> InventoryConfig {
    let mut config = InventoryConfig::baseline();
    config.analysis.incomplete_year = 2022;
    config
}

#[test]
fn small_town_estimates_end_to_end() {
    let dir = common::scratch_dir("town");
    common::write_town(&dir);
    let mut data = DataDirectory::new(&dir, DataConfig::default(), Duration::from_secs(600));
    let tables = data.load_tables(Instant::now()).expect("fixtures should load");
    let report = estimate_inventory(&tables, &config()).expect("fixtures should estimate");

    // Heat pumps: the condo and the exempt town property.
    assert_eq!(report.propane_baseline.heat_pump_count, 2);
    // Propane homes: three single families; the motel and vacant land are out.
    assert_eq!(report.propane_baseline.properties, 3);
    assert_eq!(report.propane_baseline.median_sqft, 2000.0);
    assert_relative_eq!(report.propane_baseline.per_property.gallons, 780.0, epsilon = 1e-9);

    let years: Vec<i32> = report.displacement.iter().map(|r| r.year).collect();
    assert_eq!(years, vec![2019, 2020, 2021, 2022]);
    assert_eq!(report.displacement[1].heat_pump_locations, 3);
    assert_eq!(report.displacement[2].conversions, 2);

    // 2019..2021 inside the window; 2021 electricity is carried forward.
    let rollup_years: Vec<i32> = report.rollup.iter().map(|r| r.year).collect();
    assert_eq!(rollup_years, vec![2019, 2020, 2021]);
    let last = &report.rollup[2];
    assert!(last.is_estimated(Sector::ResidentialElectricity));
    assert_relative_eq!(last.value(Sector::ResidentialElectricity), 1100.0 * 0.239, epsilon = 1e-9);
    assert_eq!(last.value(Sector::MunicipalElectric), 0.0);

    let solar = report.solar.as_ref().expect("Truro has solar");
    assert_eq!(solar.latest_year, 2020);
    fs::remove_dir_all(&dir).ok();
}

#[test]
fn missing_required_file_is_reported_by_name() {
    let dir = common::scratch_dir("partial");
    common::write_town(&dir);
    fs::remove_file(dir.join("solar.csv")).expect("fixture exists");
    let mut data = DataDirectory::new(&dir, DataConfig::default(), Duration::from_secs(600));
    let tables = data.load_tables(Instant::now()).expect("other files still load");
    assert!(tables.solar.is_none());
    let err = estimate_inventory(&tables, &config()).unwrap_err();
    assert_eq!(err, EstimationError::MissingTable("solar"));
    fs::remove_dir_all(&dir).ok();
}

#[test]
fn electricity_file_without_year_is_an_error() {
    let dir = common::scratch_dir("noyear");
    common::write_town(&dir);
    fs::write(dir.join("electricity/latest.csv"), "Sector,Electric_MWh\n").expect("write");
    let mut data = DataDirectory::new(&dir, DataConfig::default(), Duration::from_secs(600));
    assert!(matches!(
        data.load_tables(Instant::now()),
        Err(LoadError::MissingFileYear { .. })
    ));
    fs::remove_dir_all(&dir).ok();
}
