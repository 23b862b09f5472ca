//! Typed input records.
//!
//! Every table handed to the estimators is a vector of one of these structs.
//! Required and optional fields are fixed here; the loaders in
//! [`crate::io::load`] validate raw rows once and produce these values.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::factors::HeatingFuel;

/// Reference mileage and efficiency for one vehicle class.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VehicleTypeFactor {
    /// Registration type name, matched exactly against registrations.
    pub vehicle_type: String,
    /// Typical annual mileage.
    pub miles_per_year: f64,
    /// Miles per gallon, if the class burns liquid fuel.
    pub mpg: Option<f64>,
    /// Miles per kWh, if the class draws grid electricity.
    pub miles_per_kwh: Option<f64>,
}

impl VehicleTypeFactor {
    /// Creates a liquid-fuel vehicle class.
    pub fn fuel(vehicle_type: &str, miles_per_year: f64, mpg: f64) -> Self {
        Self {
            vehicle_type: vehicle_type.to_string(),
            miles_per_year,
            mpg: Some(mpg),
            miles_per_kwh: None,
        }
    }

    /// Creates a grid-charged vehicle class.
    pub fn electric(vehicle_type: &str, miles_per_year: f64, miles_per_kwh: f64) -> Self {
        Self {
            vehicle_type: vehicle_type.to_string(),
            miles_per_year,
            mpg: None,
            miles_per_kwh: Some(miles_per_kwh),
        }
    }

    /// Annual gallons per vehicle; zero when MPG is absent or not positive.
    pub fn gallons_per_year(&self) -> f64 {
        match self.mpg {
            Some(mpg) if mpg > 0.0 => self.miles_per_year / mpg,
            _ => 0.0,
        }
    }

    /// Annual kWh per vehicle; zero when MPkWh is absent or not positive.
    pub fn kwh_per_year(&self) -> f64 {
        match self.miles_per_kwh {
            Some(mpkwh) if mpkwh > 0.0 => self.miles_per_year / mpkwh,
            _ => 0.0,
        }
    }
}

/// Built-in vehicle class table used when no override file is supplied.
pub fn default_vehicle_factors() -> Vec<VehicleTypeFactor> {
    vec![
        VehicleTypeFactor::fuel("Passenger Gasoline", 12_000.0, 25.3),
        VehicleTypeFactor::fuel("Light Commercial", 15_000.0, 18.0),
        VehicleTypeFactor::fuel("Hybrid", 12_000.0, 45.0),
        VehicleTypeFactor::fuel("Plug-in Hybrid", 12_000.0, 50.0),
        VehicleTypeFactor::fuel("Diesel", 12_000.0, 22.0),
        VehicleTypeFactor::fuel("Motorcycle Gasoline", 3_000.0, 45.0),
        VehicleTypeFactor::electric("Battery Electric", 12_000.0, 3.88),
    ]
}

/// Registered vehicle count for one type in one quarter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VehicleRegistration {
    /// Registration type name.
    pub vehicle_type: String,
    /// First day of the reporting quarter.
    pub quarter: NaiveDate,
    /// Registered vehicles.
    pub count: u32,
}

impl VehicleRegistration {
    /// Calendar year this snapshot closes out.
    ///
    /// Only January snapshots count: they report the prior year's final
    /// registrations. Other quarters return `None` and stay out of yearly
    /// series.
    pub fn effective_year(&self) -> Option<i32> {
        effective_year(self.quarter)
    }
}

/// Calendar year reported by a quarterly snapshot date; see
/// [`VehicleRegistration::effective_year`].
pub fn effective_year(quarter: NaiveDate) -> Option<i32> {
    (quarter.month() == 1).then(|| quarter.year() - 1)
}

/// One metered municipal account-period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnergyBillingRecord {
    /// Fiscal year the period was billed in.
    pub fiscal_year: i32,
    /// Fuel metered on the account, e.g. `Electric` or `Heating Oil`.
    pub account_fuel: String,
    /// Facility group the account belongs to.
    pub facility_category: String,
    /// Emissions, metric tons CO2e.
    pub mtco2e: f64,
    /// Energy delivered, MMBtu.
    pub mmbtu: f64,
    /// Billed cost, dollars.
    pub cost: f64,
}

impl EnergyBillingRecord {
    /// Account fuel label for grid electricity.
    pub const ELECTRIC: &'static str = "Electric";

    /// Whether this account is metered electricity.
    pub fn is_electric(&self) -> bool {
        self.account_fuel == Self::ELECTRIC
    }
}

/// Assessor property type code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum PropertyType {
    /// `R`: taxable residential or commercial.
    Taxable,
    /// `E`: municipal or otherwise exempt.
    Exempt,
    /// Any other code.
    Other(String),
}

impl PropertyType {
    /// Parses an assessor code, ignoring surrounding whitespace.
    pub fn from_code(code: &str) -> Self {
        match code.trim() {
            "R" => Self::Taxable,
            "E" => Self::Exempt,
            other => Self::Other(other.to_string()),
        }
    }
}

/// One property card from the 2019 assessor snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssessorPropertyRecord {
    pub property_type: PropertyType,
    /// Net square footage; absent on vacant land and some exempt parcels.
    pub net_sqft: Option<f64>,
    pub fuel: HeatingFuel,
    pub hvac: String,
    pub state_class: String,
}

impl AssessorPropertyRecord {
    /// Case-insensitive substring match on the HVAC description.
    pub fn has_heat_pump(&self) -> bool {
        self.hvac.to_ascii_uppercase().contains("HEAT PUMP")
    }

    /// Square footage usable for area benchmarks, if positive.
    pub fn heated_sqft(&self) -> Option<f64> {
        self.net_sqft.filter(|sqft| *sqft > 0.0)
    }
}

/// Utility sector in the regional electricity-sales report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum ElectricSector {
    Residential,
    Commercial,
}

impl ElectricSector {
    /// Sector label as printed in the source report.
    pub fn label(self) -> &'static str {
        match self {
            Self::Residential => "Residential & Low-Income",
            Self::Commercial => "Commercial & Industrial",
        }
    }

    /// Parses a source label. Unknown labels return `None`.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim() {
            "Residential & Low-Income" => Some(Self::Residential),
            "Commercial & Industrial" => Some(Self::Commercial),
            _ => None,
        }
    }
}

/// Annual electricity sales for one sector.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ElectricityUsageRecord {
    /// Taken from the source file name.
    pub year: i32,
    pub sector: ElectricSector,
    pub electric_mwh: f64,
}

/// Cumulative program-tracked heat-pump installations as of one year.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeatPumpInstallationRecord {
    pub year: i32,
    pub cumulative_installs: u32,
    pub cumulative_locations: u32,
}

/// Solar capacity for one municipality and year.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SolarCapacityRecord {
    pub year: i32,
    pub city: String,
    pub cumulative_capacity_kw_dc: f64,
    pub cumulative_project_count: u32,
    /// Capacity added during the year, all installation types.
    pub annual_capacity_kw_dc: f64,
    /// Projects added during the year, all installation types.
    pub annual_project_count: u32,
    pub residential_cumulative_kw_dc: f64,
    pub residential_cumulative_projects: u32,
    pub commercial_cumulative_kw_dc: f64,
    pub municipal_cumulative_kw_dc: f64,
    pub other_cumulative_kw_dc: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registration(month: u32) -> VehicleRegistration {
        VehicleRegistration {
            vehicle_type: "Diesel".to_string(),
            quarter: NaiveDate::from_ymd_opt(2022, month, 1).unwrap(),
            count: 1,
        }
    }

    #[test]
    fn only_january_quarters_have_effective_year() {
        assert_eq!(registration(1).effective_year(), Some(2021));
        assert_eq!(registration(4).effective_year(), None);
        assert_eq!(registration(7).effective_year(), None);
        assert_eq!(registration(10).effective_year(), None);
    }

    #[test]
    fn zero_mpg_means_no_fuel_use() {
        let factor = VehicleTypeFactor {
            vehicle_type: "Odd".to_string(),
            miles_per_year: 10_000.0,
            mpg: Some(0.0),
            miles_per_kwh: None,
        };
        assert_eq!(factor.gallons_per_year(), 0.0);
        assert_eq!(factor.kwh_per_year(), 0.0);
    }

    #[test]
    fn default_table_has_one_efficiency_per_class() {
        for f in default_vehicle_factors() {
            assert!(
                f.mpg.is_some() ^ f.miles_per_kwh.is_some(),
                "{} should carry exactly one efficiency",
                f.vehicle_type
            );
        }
    }

    #[test]
    fn heat_pump_match_is_case_insensitive() {
        let rec = AssessorPropertyRecord {
            property_type: PropertyType::Exempt,
            net_sqft: None,
            fuel: HeatingFuel::Electric,
            hvac: "Heat Pump/Mini Split".to_string(),
            state_class: "TOWN-PROP".to_string(),
        };
        assert!(rec.has_heat_pump());
        assert_eq!(rec.heated_sqft(), None);
    }

    #[test]
    fn sector_labels_round_trip() {
        for s in [ElectricSector::Residential, ElectricSector::Commercial] {
            assert_eq!(ElectricSector::from_label(s.label()), Some(s));
        }
        assert_eq!(ElectricSector::from_label("Street Lighting"), None);
    }
}
