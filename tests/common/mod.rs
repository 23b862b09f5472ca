//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use ghg_inventory::config::InventoryConfig;
use ghg_inventory::demo::demo_tables;
use ghg_inventory::pipeline::{InventoryReport, InventoryTables, estimate_inventory};

/// Seed used across integration tests.
pub const SEED: u64 = 42;

pub fn default_config() -> InventoryConfig {
    InventoryConfig::baseline()
}

pub fn default_tables() -> InventoryTables {
    demo_tables(SEED)
}

/// Baseline report over the default demo tables.
pub fn default_report() -> InventoryReport {
    estimate_inventory(&default_tables(), &default_config()).expect("demo tables should estimate")
}

/// Fresh, empty directory under the system temp dir.
pub fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("ghg-inventory-it-{name}-{}", std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).expect("temp dir should be writable");
    dir
}

/// Writes a small but complete set of source files into `dir`.
pub fn write_town(dir: &Path) {
    let write = |name: &str, body: &str| {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent");
        }
        fs::write(path, body).expect("write fixture");
    };
    write(
        "vehicles.csv",
        "Quarter,Type,Number\n\
         2020-01-01,Passenger Gasoline,100\n\
         2020-01-01,Battery Electric,4\n\
         2021-01-01,Passenger Gasoline,98\n\
         2021-01-01,Battery Electric,7\n\
         2021-04-01,Passenger Gasoline,97\n",
    );
    write(
        "municipal_energy.csv",
        "fiscal_year,account_fuel,facility_category,mtco2e,mmbtu,cost\n\
         2019,Electric,Town Hall,10.0,120,3000\n\
         2019,Heating Oil,Town Hall,6.0,80,2000\n\
         2020,Electric,Town Hall,9.5,115,2900\n\
         2025,Electric,Town Hall,1.0,10,300\n",
    );
    write(
        "assessors_2019.csv",
        "Property Type,NetSF,FUEL,HVAC,State Class Description\n\
         R,1000,GAS,FORCED AIR,SINGLE FAM\n\
         R,2000,GAS,FORCED AIR,SINGLE FAM\n\
         R,3000,GAS,HOT WATER,SINGLE FAM\n\
         R,1500,OIL,HOT WATER,SINGLE FAM\n\
         R,1200,ELECTRIC,HEAT PUMP,CONDO\n\
         E,5000,ELECTRIC,HEAT PUMP,TOWN-PROP\n\
         R,8000,GAS,FORCED AIR,MOTELS\n\
         R,,GAS,,VACANT LAND\n",
    );
    write(
        "electricity/usage_2019.csv",
        "Sector,Electric_MWh\nResidential & Low-Income,1000\nCommercial & Industrial,500\nStreet Lighting,5\n",
    );
    write(
        "electricity/usage_2020.csv",
        "Sector,Electric_MWh\nResidential & Low-Income,1100\nCommercial & Industrial,480\n",
    );
    write(
        "heat_pumps.csv",
        "Year,Cumulative Installs,Cumulative Locations\n2021,5,4\n2022,6,5\n",
    );
    write(
        "solar.csv",
        "Year,City,Capacity (kW DC) All Cumulative,Project Count All Cumulative,\
         Capacity (kW DC) All,Project Count All\n\
         2019,Truro,100,10,20,2\n\
         2020,Truro,400,20,300,10\n\
         2020,Wellfleet,50,3,50,3\n",
    );
}
