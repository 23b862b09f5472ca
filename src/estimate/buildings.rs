//! Residential and commercial heating estimates from the assessor snapshot.
//!
//! Each taxable property with a positive square footage is classified by its
//! state class, given a seasonal heating factor, and run through an
//! area-based consumption benchmark for its recorded fuel.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::factors::{
    ELECTRICITY_TCO2E_PER_KWH, HEATING_OIL_TCO2E_PER_GALLON, HeatingFuel, OIL_GALLONS_PER_SQFT,
    PROPANE_GALLONS_PER_SQFT, PROPANE_TCO2E_PER_GALLON, unvalidated,
};
use crate::records::{AssessorPropertyRecord, PropertyType};

/// State classes treated as seasonal lodging.
pub const MOTEL_RESORT_CLASSES: &[&str] = &[
    "MOTELS",
    "HOTELS",
    "INNS",
    "RESORT CONDO",
    "COTTAGE COLONY",
];

/// State classes treated as year-round commercial.
pub const COMMERCIAL_CLASSES: &[&str] = &[
    "RESTAURANTS",
    "RETAIL",
    "STORE/SHOP",
    "OFFICE BLDG",
    "PROF OFFICE",
    "BANK BLDG",
    "WAREHOUSE",
    "GAS STATION",
    "AUTO REPAIR",
    "MARINA",
    "NURSERY",
    "MIXED USE",
];

/// Share of housing units vacant for seasonal use (census).
pub const SEASONAL_VACANCY_FRACTION: f64 = 0.671;
/// Share of housing units occupied year-round (census).
pub const YEAR_ROUND_FRACTION: f64 = 0.329;
/// Heating used by a seasonal home relative to a year-round one.
pub const SEASONAL_USAGE: f64 = 0.30;
/// Heating used by a year-round home.
pub const YEAR_ROUND_USAGE: f64 = 1.00;
/// Commercial heating factor. A fixed estimate, not derived from data.
pub const COMMERCIAL_FACTOR: f64 = 0.65;
/// Motels and resorts close for the winter.
pub const MOTEL_RESORT_FACTOR: f64 = 0.30;

/// Use category derived from the assessor state class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum PropertyCategory {
    Residential,
    Commercial,
    MotelResort,
}

impl PropertyCategory {
    /// Classifies a state class description. Residential is the default.
    pub fn classify(state_class: &str) -> Self {
        let class = state_class.trim().to_ascii_uppercase();
        if MOTEL_RESORT_CLASSES.contains(&class.as_str()) {
            Self::MotelResort
        } else if COMMERCIAL_CLASSES.contains(&class.as_str()) {
            Self::Commercial
        } else {
            Self::Residential
        }
    }

    pub const ALL: [Self; 3] = [Self::Residential, Self::Commercial, Self::MotelResort];
}

impl fmt::Display for PropertyCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Residential => "Residential",
            Self::Commercial => "Commercial",
            Self::MotelResort => "Motels/Resorts",
        })
    }
}

/// Fraction of a full year-round heating load used by each category.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HeatingFactors {
    pub residential: f64,
    pub commercial: f64,
    pub motel_resort: f64,
}

impl Default for HeatingFactors {
    fn default() -> Self {
        Self {
            residential: blended_residential_factor(
                SEASONAL_VACANCY_FRACTION,
                SEASONAL_USAGE,
                YEAR_ROUND_FRACTION,
                YEAR_ROUND_USAGE,
            ),
            commercial: COMMERCIAL_FACTOR,
            motel_resort: MOTEL_RESORT_FACTOR,
        }
    }
}

impl HeatingFactors {
    pub fn for_category(&self, category: PropertyCategory) -> f64 {
        match category {
            PropertyCategory::Residential => self.residential,
            PropertyCategory::Commercial => self.commercial,
            PropertyCategory::MotelResort => self.motel_resort,
        }
    }
}

/// Occupancy-weighted residential factor.
///
/// We cannot tell which homes are seasonal, so every residential property
/// gets the town-wide blend (0.671 * 0.30 + 0.329 * 1.00 = 0.530 by default).
pub fn blended_residential_factor(
    seasonal_fraction: f64,
    seasonal_usage: f64,
    year_round_fraction: f64,
    year_round_usage: f64,
) -> f64 {
    seasonal_fraction * seasonal_usage + year_round_fraction * year_round_usage
}

/// Annual consumption and emissions of one heated building.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct FuelUse {
    pub gallons: f64,
    pub kwh: f64,
    pub mtco2e: f64,
}

/// Applies the area benchmark for `fuel`.
///
/// Fuels other than oil, propane and electric use nothing.
pub fn heating_fuel_use(fuel: &HeatingFuel, sqft: f64, heat_pump: bool, factor: f64) -> FuelUse {
    match fuel {
        HeatingFuel::Oil => {
            let gallons = sqft * OIL_GALLONS_PER_SQFT * factor;
            FuelUse {
                gallons,
                kwh: 0.0,
                mtco2e: gallons * HEATING_OIL_TCO2E_PER_GALLON,
            }
        }
        HeatingFuel::Propane => {
            let gallons = sqft * PROPANE_GALLONS_PER_SQFT * factor;
            FuelUse {
                gallons,
                kwh: 0.0,
                mtco2e: gallons * PROPANE_TCO2E_PER_GALLON,
            }
        }
        HeatingFuel::Electric => {
            let per_sqft = if heat_pump {
                unvalidated::HEAT_PUMP_KWH_PER_SQFT
            } else {
                unvalidated::RESISTANCE_KWH_PER_SQFT
            };
            let kwh = sqft * per_sqft * factor;
            FuelUse {
                gallons: 0.0,
                kwh,
                mtco2e: kwh * ELECTRICITY_TCO2E_PER_KWH,
            }
        }
        HeatingFuel::Other(_) => FuelUse::default(),
    }
}

/// Estimate for one assessor property.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertyEstimate {
    /// Position of the property in the assessor snapshot.
    pub index: usize,
    pub category: PropertyCategory,
    pub fuel: HeatingFuel,
    pub heat_pump: bool,
    pub sqft: f64,
    pub heating_factor: f64,
    pub usage: FuelUse,
}

/// Aggregate over a group of property estimates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupTotals<K> {
    pub key: K,
    pub properties: usize,
    pub sqft: f64,
    pub mtco2e: f64,
}

/// Per-property and aggregate heating estimates.
#[derive(Debug, Clone, Serialize)]
pub struct BuildingEstimate {
    pub factors: HeatingFactors,
    pub properties: Vec<PropertyEstimate>,
    pub by_category: Vec<GroupTotals<PropertyCategory>>,
    pub by_fuel: Vec<GroupTotals<HeatingFuel>>,
    pub total_mtco2e: f64,
}

impl BuildingEstimate {
    /// Emissions for one category and fuel.
    pub fn mtco2e_for(&self, category: PropertyCategory, fuel: &HeatingFuel) -> f64 {
        self.properties
            .iter()
            .filter(|p| p.category == category && &p.fuel == fuel)
            .map(|p| p.usage.mtco2e)
            .sum()
    }

    pub fn category(&self, category: PropertyCategory) -> Option<&GroupTotals<PropertyCategory>> {
        self.by_category.iter().find(|t| t.key == category)
    }
}

fn group<K: Ord + Clone>(
    properties: &[PropertyEstimate],
    key: impl Fn(&PropertyEstimate) -> K,
) -> Vec<GroupTotals<K>> {
    let mut groups: BTreeMap<K, GroupTotals<K>> = BTreeMap::new();
    for p in properties {
        let k = key(p);
        let entry = groups.entry(k.clone()).or_insert(GroupTotals {
            key: k,
            properties: 0,
            sqft: 0.0,
            mtco2e: 0.0,
        });
        entry.properties += 1;
        entry.sqft += p.sqft;
        entry.mtco2e += p.usage.mtco2e;
    }
    groups.into_values().collect()
}

/// Estimates heating emissions for taxable properties with square footage.
///
/// Exempt (`E`) parcels and properties without a positive square footage
/// are skipped.
pub fn estimate_buildings(
    records: &[AssessorPropertyRecord],
    factors: HeatingFactors,
) -> BuildingEstimate {
    let properties: Vec<PropertyEstimate> = records
        .iter()
        .enumerate()
        .filter(|(_, r)| r.property_type == PropertyType::Taxable)
        .filter_map(|(index, r)| {
            let sqft = r.heated_sqft()?;
            let category = PropertyCategory::classify(&r.state_class);
            let heating_factor = factors.for_category(category);
            let heat_pump = r.has_heat_pump();
            Some(PropertyEstimate {
                index,
                category,
                fuel: r.fuel.clone(),
                heat_pump,
                sqft,
                heating_factor,
                usage: heating_fuel_use(&r.fuel, sqft, heat_pump, heating_factor),
            })
        })
        .collect();

    BuildingEstimate {
        factors,
        by_category: group(&properties, |p| p.category),
        by_fuel: group(&properties, |p| p.fuel.clone()),
        total_mtco2e: properties.iter().map(|p| p.usage.mtco2e).sum(),
        properties,
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    fn property(kind: &str, sqft: Option<f64>, fuel: &str, hvac: &str, class: &str) -> AssessorPropertyRecord {
        AssessorPropertyRecord {
            property_type: PropertyType::from_code(kind),
            net_sqft: sqft,
            fuel: HeatingFuel::from_code(fuel),
            hvac: hvac.to_string(),
            state_class: class.to_string(),
        }
    }

    #[test]
    fn classification_uses_fixed_lists() {
        assert_eq!(PropertyCategory::classify("MOTELS"), PropertyCategory::MotelResort);
        assert_eq!(PropertyCategory::classify("resort condo"), PropertyCategory::MotelResort);
        assert_eq!(PropertyCategory::classify("RESTAURANTS"), PropertyCategory::Commercial);
        assert_eq!(PropertyCategory::classify("SINGLE FAM"), PropertyCategory::Residential);
        assert_eq!(PropertyCategory::classify(""), PropertyCategory::Residential);
    }

    #[test]
    fn default_residential_factor_is_blend() {
        let f = HeatingFactors::default();
        assert_relative_eq!(f.residential, 0.5303, epsilon = 1e-12);
        assert_eq!(f.commercial, 0.65);
        assert_eq!(f.motel_resort, 0.30);
    }

    #[test]
    fn benchmarks_per_fuel() {
        let oil = heating_fuel_use(&HeatingFuel::Oil, 1000.0, false, 1.0);
        assert_relative_eq!(oil.gallons, 400.0);
        assert_relative_eq!(oil.mtco2e, 4.12, epsilon = 1e-12);

        let propane = heating_fuel_use(&HeatingFuel::Propane, 1000.0, false, 0.5);
        assert_relative_eq!(propane.gallons, 195.0);
        assert_relative_eq!(propane.mtco2e, 195.0 * 0.00574, epsilon = 1e-12);

        let resistance = heating_fuel_use(&HeatingFuel::Electric, 1000.0, false, 1.0);
        assert_relative_eq!(resistance.kwh, 12_000.0);
        let heat_pump = heating_fuel_use(&HeatingFuel::Electric, 1000.0, true, 1.0);
        assert_relative_eq!(heat_pump.kwh, 4_000.0);
        assert_relative_eq!(heat_pump.mtco2e, 0.956, epsilon = 1e-12);

        let wood = heating_fuel_use(&HeatingFuel::Other("WOOD".into()), 1000.0, false, 1.0);
        assert_eq!(wood, FuelUse::default());
    }

    #[test]
    fn skips_exempt_and_unsized_properties() {
        let records = vec![
            property("R", Some(2000.0), "OIL", "FORCED AIR", "SINGLE FAM"),
            property("E", Some(5000.0), "OIL", "FORCED AIR", "TOWN-PROP"),
            property("R", None, "GAS", "FORCED AIR", "SINGLE FAM"),
            property("R", Some(0.0), "GAS", "FORCED AIR", "SINGLE FAM"),
            property("R", Some(-10.0), "GAS", "FORCED AIR", "SINGLE FAM"),
        ];
        let estimate = estimate_buildings(&records, HeatingFactors::default());
        assert_eq!(estimate.properties.len(), 1);
        assert_eq!(estimate.properties[0].index, 0);
        let total: usize = estimate.by_category.iter().map(|c| c.properties).sum();
        assert_eq!(total, 1);
    }

    #[test]
    fn category_factors_flow_into_estimates() {
        let records = vec![
            property("R", Some(1000.0), "OIL", "HOT WATER", "SINGLE FAM"),
            property("R", Some(1000.0), "OIL", "HOT WATER", "RETAIL"),
            property("R", Some(1000.0), "OIL", "HOT WATER", "MOTELS"),
        ];
        let factors = HeatingFactors::default();
        let estimate = estimate_buildings(&records, factors);
        let residential = estimate.category(PropertyCategory::Residential).unwrap();
        assert_relative_eq!(residential.mtco2e, 1000.0 * 0.40 * factors.residential * 0.01030, epsilon = 1e-12);
        let commercial = estimate.category(PropertyCategory::Commercial).unwrap();
        assert_relative_eq!(commercial.mtco2e, 1000.0 * 0.40 * 0.65 * 0.01030, epsilon = 1e-12);
        let motel = estimate.category(PropertyCategory::MotelResort).unwrap();
        assert_relative_eq!(motel.mtco2e, 1000.0 * 0.40 * 0.30 * 0.01030, epsilon = 1e-12);
        assert_relative_eq!(
            estimate.total_mtco2e,
            residential.mtco2e + commercial.mtco2e + motel.mtco2e,
            epsilon = 1e-12
        );
    }

    #[test]
    fn totals_by_fuel_and_category_filter() {
        let records = vec![
            property("R", Some(1000.0), "GAS", "FORCED AIR", "SINGLE FAM"),
            property("R", Some(1500.0), "GAS", "FORCED AIR", "RESTAURANTS"),
            property("R", Some(800.0), "ELECTRIC", "HEAT PUMP", "SINGLE FAM"),
        ];
        let estimate = estimate_buildings(&records, HeatingFactors::default());
        assert_eq!(estimate.by_fuel.len(), 2);
        let propane_res = estimate.mtco2e_for(PropertyCategory::Residential, &HeatingFuel::Propane);
        assert_relative_eq!(
            propane_res,
            1000.0 * 0.39 * estimate.factors.residential * 0.00574,
            epsilon = 1e-12
        );
        assert!(estimate.properties[2].heat_pump);
    }
}
