//! Emission factor table and consumption benchmarks.
//!
//! All factors are process-wide constants. Emission factors are expressed in
//! tCO2e per unit of fuel or energy delivered.

use std::fmt;

use serde::Serialize;

/// Gasoline, tCO2e per gallon.
pub const GASOLINE_TCO2E_PER_GALLON: f64 = 0.00882;
/// Diesel and No. 2 heating oil, tCO2e per gallon.
pub const DIESEL_TCO2E_PER_GALLON: f64 = 0.01030;
/// Heating oil shares the diesel factor.
pub const HEATING_OIL_TCO2E_PER_GALLON: f64 = DIESEL_TCO2E_PER_GALLON;
/// Propane, tCO2e per gallon.
pub const PROPANE_TCO2E_PER_GALLON: f64 = 0.00574;
/// Regional grid electricity, tCO2e per kWh.
pub const ELECTRICITY_TCO2E_PER_KWH: f64 = 0.000239;
/// Regional grid electricity, tCO2e per MWh.
pub const ELECTRICITY_TCO2E_PER_MWH: f64 = ELECTRICITY_TCO2E_PER_KWH * 1000.0;

/// Heating oil consumption, gallons per square foot per year (Mass.gov household
/// heating cost reference).
pub const OIL_GALLONS_PER_SQFT: f64 = 0.40;
/// Propane consumption, gallons per square foot per year (Mass.gov household
/// heating cost reference).
pub const PROPANE_GALLONS_PER_SQFT: f64 = 0.39;

/// Electric benchmarks, kWh per square foot per year.
///
/// These are unvalidated estimates with no published source, unlike the
/// oil and propane benchmarks above. Treat results derived from them as
/// indicative only.
pub mod unvalidated {
    /// Electric resistance heating.
    pub const RESISTANCE_KWH_PER_SQFT: f64 = 12.0;
    /// Air-source heat pump, assuming a seasonal COP near 3.
    pub const HEAT_PUMP_KWH_PER_SQFT: f64 = 4.0;
}

/// Vehicle type names that take the diesel per-gallon factor.
///
/// Matched literally. "Motorcycle Gasoline" is on this list in the source
/// methodology and is kept there.
pub const DIESEL_FACTOR_VEHICLE_TYPES: &[&str] = &["Diesel", "Motorcycle Gasoline"];

/// Per-gallon factor for a vehicle type name.
pub fn vehicle_gallon_factor(vehicle_type: &str) -> f64 {
    if DIESEL_FACTOR_VEHICLE_TYPES.contains(&vehicle_type) {
        DIESEL_TCO2E_PER_GALLON
    } else {
        GASOLINE_TCO2E_PER_GALLON
    }
}

/// Heating fuel recorded on an assessor card.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum HeatingFuel {
    /// Fuel oil.
    Oil,
    /// `GAS` on the assessor card; the town has no natural gas service, so
    /// this is bottled propane.
    Propane,
    /// Electric resistance or heat pump.
    Electric,
    /// Anything else (wood, solar, none, blank). Emits nothing in the model.
    Other(String),
}

impl HeatingFuel {
    /// Maps an assessor fuel code. Total: unknown codes become `Other`.
    pub fn from_code(code: &str) -> Self {
        match code.trim().to_ascii_uppercase().as_str() {
            "OIL" => Self::Oil,
            "GAS" => Self::Propane,
            "ELECTRIC" => Self::Electric,
            other => Self::Other(other.to_string()),
        }
    }

    /// Assessor code for this fuel.
    pub fn code(&self) -> &str {
        match self {
            Self::Oil => "OIL",
            Self::Propane => "GAS",
            Self::Electric => "ELECTRIC",
            Self::Other(code) => code,
        }
    }
}

impl fmt::Display for HeatingFuel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Rounds to two decimal places, half away from zero.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
