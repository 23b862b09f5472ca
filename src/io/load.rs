//! CSV loaders for every source table.
//!
//! Each loader deserialises raw rows with the source's own column names,
//! then validates them once into the typed records of [`crate::records`].
//! Blank numeric cells read as `None`. The `read_*` functions take any
//! reader and a path used only in error messages; the `load_*` functions
//! open the file.

use std::fs::{self, File};
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use csv::{ReaderBuilder, Trim};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::error::LoadError;
use crate::factors::HeatingFuel;
use crate::records::{
    AssessorPropertyRecord, ElectricSector, ElectricityUsageRecord, EnergyBillingRecord,
    HeatPumpInstallationRecord, PropertyType, SolarCapacityRecord, VehicleRegistration,
    VehicleTypeFactor,
};

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%Y-%m-%d %H:%M:%S"];

fn open(path: &Path) -> Result<BufReader<File>, LoadError> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })
}

/// Deserialises every row, pairing it with its 1-based line number.
fn rows<T: DeserializeOwned>(input: impl Read, path: &Path) -> Result<Vec<(usize, T)>, LoadError> {
    let mut reader = ReaderBuilder::new().trim(Trim::All).from_reader(input);
    reader
        .deserialize()
        .enumerate()
        .map(|(i, row)| {
            row.map(|r| (i + 2, r)).map_err(|source| LoadError::Csv {
                path: path.to_path_buf(),
                source,
            })
        })
        .collect()
}

fn invalid(path: &Path, row: usize, column: &'static str, message: impl Into<String>) -> LoadError {
    LoadError::InvalidField {
        path: path.to_path_buf(),
        row,
        column,
        message: message.into(),
    }
}

fn required<T>(value: Option<T>, path: &Path, row: usize, column: &'static str) -> Result<T, LoadError> {
    value.ok_or_else(|| invalid(path, row, column, "is required"))
}

/// Whole, non-negative count. Spreadsheets often export counts as `12.0`.
fn count(value: f64, path: &Path, row: usize, column: &'static str) -> Result<u32, LoadError> {
    if value.is_finite() && value >= 0.0 && value.fract() == 0.0 && value <= f64::from(u32::MAX) {
        Ok(value as u32)
    } else {
        Err(invalid(path, row, column, format!("must be a whole non-negative count, got {value}")))
    }
}

fn year(value: f64, path: &Path, row: usize, column: &'static str) -> Result<i32, LoadError> {
    if value.is_finite() && value.fract() == 0.0 && (1900.0..=2200.0).contains(&value) {
        Ok(value as i32)
    } else {
        Err(invalid(path, row, column, format!("is not a year: {value}")))
    }
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
}

#[derive(Debug, Deserialize)]
struct RawRegistration {
    #[serde(rename = "Quarter")]
    quarter: Option<String>,
    #[serde(rename = "Type")]
    vehicle_type: Option<String>,
    #[serde(rename = "Number")]
    number: Option<f64>,
}

pub fn read_vehicle_registrations(input: impl Read, path: &Path) -> Result<Vec<VehicleRegistration>, LoadError> {
    rows::<RawRegistration>(input, path)?
        .into_iter()
        .map(|(row, raw)| {
            let quarter = required(raw.quarter, path, row, "Quarter")?;
            let quarter = parse_date(&quarter)
                .ok_or_else(|| invalid(path, row, "Quarter", format!("is not a date: \"{quarter}\"")))?;
            Ok(VehicleRegistration {
                vehicle_type: required(raw.vehicle_type, path, row, "Type")?,
                quarter,
                count: count(required(raw.number, path, row, "Number")?, path, row, "Number")?,
            })
        })
        .collect()
}

pub fn load_vehicle_registrations(path: &Path) -> Result<Vec<VehicleRegistration>, LoadError> {
    let records = read_vehicle_registrations(open(path)?, path)?;
    info!(path = %path.display(), rows = records.len(), "loaded vehicle registrations");
    Ok(records)
}

#[derive(Debug, Deserialize)]
struct RawVehicleFactor {
    #[serde(rename = "Type")]
    vehicle_type: Option<String>,
    #[serde(rename = "Miles_per_Year")]
    miles_per_year: Option<f64>,
    #[serde(rename = "MPG")]
    mpg: Option<f64>,
    #[serde(rename = "MPkWh")]
    miles_per_kwh: Option<f64>,
}

/// Reads a vehicle class table. A class without any efficiency is kept and
/// emits nothing.
pub fn read_vehicle_factors(input: impl Read, path: &Path) -> Result<Vec<VehicleTypeFactor>, LoadError> {
    rows::<RawVehicleFactor>(input, path)?
        .into_iter()
        .map(|(row, raw)| {
            let vehicle_type = required(raw.vehicle_type, path, row, "Type")?;
            if raw.mpg.is_none() && raw.miles_per_kwh.is_none() {
                debug!(%vehicle_type, "vehicle class has no efficiency");
            }
            Ok(VehicleTypeFactor {
                vehicle_type,
                miles_per_year: required(raw.miles_per_year, path, row, "Miles_per_Year")?,
                mpg: raw.mpg,
                miles_per_kwh: raw.miles_per_kwh,
            })
        })
        .collect()
}

pub fn load_vehicle_factors(path: &Path) -> Result<Vec<VehicleTypeFactor>, LoadError> {
    read_vehicle_factors(open(path)?, path)
}

#[derive(Debug, Deserialize)]
struct RawBilling {
    fiscal_year: Option<f64>,
    account_fuel: Option<String>,
    #[serde(alias = "category")]
    facility_category: Option<String>,
    mtco2e: Option<f64>,
    mmbtu: Option<f64>,
    cost: Option<f64>,
}

/// Reads municipal billing rows. Blank measures count as zero.
pub fn read_municipal_energy(input: impl Read, path: &Path) -> Result<Vec<EnergyBillingRecord>, LoadError> {
    rows::<RawBilling>(input, path)?
        .into_iter()
        .map(|(row, raw)| {
            Ok(EnergyBillingRecord {
                fiscal_year: year(required(raw.fiscal_year, path, row, "fiscal_year")?, path, row, "fiscal_year")?,
                account_fuel: required(raw.account_fuel, path, row, "account_fuel")?,
                facility_category: raw.facility_category.unwrap_or_default(),
                mtco2e: raw.mtco2e.unwrap_or(0.0),
                mmbtu: raw.mmbtu.unwrap_or(0.0),
                cost: raw.cost.unwrap_or(0.0),
            })
        })
        .collect()
}

pub fn load_municipal_energy(path: &Path) -> Result<Vec<EnergyBillingRecord>, LoadError> {
    let records = read_municipal_energy(open(path)?, path)?;
    info!(path = %path.display(), rows = records.len(), "loaded municipal energy");
    Ok(records)
}

#[derive(Debug, Deserialize)]
struct RawProperty {
    #[serde(rename = "Property Type")]
    property_type: Option<String>,
    #[serde(rename = "NetSF")]
    net_sqft: Option<f64>,
    #[serde(rename = "FUEL")]
    fuel: Option<String>,
    #[serde(rename = "HVAC")]
    hvac: Option<String>,
    #[serde(rename = "State Class Description")]
    state_class: Option<String>,
}

/// Reads the assessor snapshot. Blank text cells read as empty strings.
pub fn read_assessors(input: impl Read, path: &Path) -> Result<Vec<AssessorPropertyRecord>, LoadError> {
    Ok(rows::<RawProperty>(input, path)?
        .into_iter()
        .map(|(_, raw)| AssessorPropertyRecord {
            property_type: PropertyType::from_code(raw.property_type.as_deref().unwrap_or_default()),
            net_sqft: raw.net_sqft,
            fuel: HeatingFuel::from_code(raw.fuel.as_deref().unwrap_or_default()),
            hvac: raw.hvac.unwrap_or_default(),
            state_class: raw.state_class.unwrap_or_default(),
        })
        .collect())
}

pub fn load_assessors(path: &Path) -> Result<Vec<AssessorPropertyRecord>, LoadError> {
    let records = read_assessors(open(path)?, path)?;
    let with_sqft = records.iter().filter(|r| r.heated_sqft().is_some()).count();
    info!(path = %path.display(), rows = records.len(), with_sqft, "loaded assessor snapshot");
    Ok(records)
}

#[derive(Debug, Deserialize)]
struct RawElectricity {
    #[serde(rename = "Sector")]
    sector: Option<String>,
    #[serde(rename = "Electric_MWh")]
    electric_mwh: Option<f64>,
}

/// First run of exactly four ASCII digits in a file name.
pub fn file_year(name: &str) -> Option<i32> {
    let bytes = name.as_bytes();
    let mut start = 0;
    while start < bytes.len() {
        if !bytes[start].is_ascii_digit() {
            start += 1;
            continue;
        }
        let end = bytes[start..]
            .iter()
            .position(|b| !b.is_ascii_digit())
            .map_or(bytes.len(), |n| start + n);
        if end - start == 4 {
            return name[start..end].parse().ok();
        }
        start = end;
    }
    None
}

/// Reads one year's electricity file. Rows for sectors other than the two
/// tracked ones are skipped.
pub fn read_electricity_usage(
    input: impl Read,
    path: &Path,
    year: i32,
) -> Result<Vec<ElectricityUsageRecord>, LoadError> {
    let mut out = Vec::new();
    for (row, raw) in rows::<RawElectricity>(input, path)? {
        let label = required(raw.sector, path, row, "Sector")?;
        let Some(sector) = ElectricSector::from_label(&label) else {
            debug!(%label, "skipping untracked electricity sector");
            continue;
        };
        out.push(ElectricityUsageRecord {
            year,
            sector,
            electric_mwh: required(raw.electric_mwh, path, row, "Electric_MWh")?,
        });
    }
    Ok(out)
}

/// Reads every `.csv` file in `dir`, taking each file's year from its name.
pub fn load_electricity_dir(dir: &Path) -> Result<Vec<ElectricityUsageRecord>, LoadError> {
    let io_err = |source: io::Error| LoadError::Io {
        path: dir.to_path_buf(),
        source,
    };
    let mut files: Vec<PathBuf> = fs::read_dir(dir)
        .map_err(io_err)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<_, _>>()
        .map_err(io_err)?;
    files.retain(|p| p.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("csv")));
    files.sort();

    let mut records = Vec::new();
    for path in files {
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        let year = file_year(name).ok_or_else(|| LoadError::MissingFileYear { path: path.clone() })?;
        records.extend(read_electricity_usage(open(&path)?, &path, year)?);
    }
    records.sort_by_key(|r| (r.year, r.sector));
    info!(dir = %dir.display(), rows = records.len(), "loaded electricity usage");
    Ok(records)
}

#[derive(Debug, Deserialize)]
struct RawHeatPumps {
    #[serde(rename = "Year")]
    year: Option<f64>,
    #[serde(rename = "Cumulative Installs")]
    cumulative_installs: Option<f64>,
    #[serde(rename = "Cumulative Locations")]
    cumulative_locations: Option<f64>,
}

/// Reads the program tracker. Years must strictly increase.
pub fn read_heat_pumps(input: impl Read, path: &Path) -> Result<Vec<HeatPumpInstallationRecord>, LoadError> {
    let mut out: Vec<HeatPumpInstallationRecord> = Vec::new();
    for (row, raw) in rows::<RawHeatPumps>(input, path)? {
        let record = HeatPumpInstallationRecord {
            year: year(required(raw.year, path, row, "Year")?, path, row, "Year")?,
            cumulative_installs: count(
                required(raw.cumulative_installs, path, row, "Cumulative Installs")?,
                path,
                row,
                "Cumulative Installs",
            )?,
            cumulative_locations: count(
                required(raw.cumulative_locations, path, row, "Cumulative Locations")?,
                path,
                row,
                "Cumulative Locations",
            )?,
        };
        if let Some(previous) = out.last().filter(|p| p.year >= record.year) {
            return Err(LoadError::NonIncreasingYears {
                path: path.to_path_buf(),
                previous: previous.year,
                current: record.year,
            });
        }
        out.push(record);
    }
    Ok(out)
}

pub fn load_heat_pumps(path: &Path) -> Result<Vec<HeatPumpInstallationRecord>, LoadError> {
    let records = read_heat_pumps(open(path)?, path)?;
    info!(path = %path.display(), rows = records.len(), "loaded heat-pump tracker");
    Ok(records)
}

#[derive(Debug, Deserialize)]
struct RawSolar {
    #[serde(rename = "Year")]
    year: Option<f64>,
    #[serde(rename = "City")]
    city: Option<String>,
    #[serde(rename = "Capacity (kW DC) All Cumulative")]
    cumulative_capacity: Option<f64>,
    #[serde(rename = "Project Count All Cumulative")]
    cumulative_projects: Option<f64>,
    #[serde(rename = "Capacity (kW DC) All")]
    annual_capacity: Option<f64>,
    #[serde(rename = "Project Count All")]
    annual_projects: Option<f64>,
    #[serde(rename = "Capacity (kW DC) Residential Cumulative")]
    residential_capacity: Option<f64>,
    #[serde(rename = "Project Count Residential Cumulative")]
    residential_projects: Option<f64>,
    #[serde(rename = "Capacity (kW DC) Commercial Cumulative")]
    commercial_capacity: Option<f64>,
    #[serde(rename = "Capacity (kW DC) Municipal Cumulative")]
    municipal_capacity: Option<f64>,
    #[serde(rename = "Capacity (kW DC) Other Cumulative")]
    other_capacity: Option<f64>,
}

/// Reads the regional solar table. Blank capacity and count cells read as
/// zero.
pub fn read_solar(input: impl Read, path: &Path) -> Result<Vec<SolarCapacityRecord>, LoadError> {
    rows::<RawSolar>(input, path)?
        .into_iter()
        .map(|(row, raw)| {
            Ok(SolarCapacityRecord {
                year: year(required(raw.year, path, row, "Year")?, path, row, "Year")?,
                city: raw.city.unwrap_or_default(),
                cumulative_capacity_kw_dc: raw.cumulative_capacity.unwrap_or(0.0),
                cumulative_project_count: count(
                    raw.cumulative_projects.unwrap_or(0.0),
                    path,
                    row,
                    "Project Count All Cumulative",
                )?,
                annual_capacity_kw_dc: raw.annual_capacity.unwrap_or(0.0),
                annual_project_count: count(raw.annual_projects.unwrap_or(0.0), path, row, "Project Count All")?,
                residential_cumulative_kw_dc: raw.residential_capacity.unwrap_or(0.0),
                residential_cumulative_projects: count(
                    raw.residential_projects.unwrap_or(0.0),
                    path,
                    row,
                    "Project Count Residential Cumulative",
                )?,
                commercial_cumulative_kw_dc: raw.commercial_capacity.unwrap_or(0.0),
                municipal_cumulative_kw_dc: raw.municipal_capacity.unwrap_or(0.0),
                other_cumulative_kw_dc: raw.other_capacity.unwrap_or(0.0),
            })
        })
        .collect()
}

pub fn load_solar(path: &Path) -> Result<Vec<SolarCapacityRecord>, LoadError> {
    let records = read_solar(open(path)?, path)?;
    info!(path = %path.display(), rows = records.len(), "loaded solar capacity");
    Ok(records)
}
