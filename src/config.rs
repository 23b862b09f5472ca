//! TOML-based inventory configuration and preset definitions.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::estimate::buildings::{self, HeatingFactors};
use crate::estimate::municipal::FiscalWindow;
use crate::estimate::rollup::RollupWindow;
use crate::estimate::savings::{self, SavingsRates};

/// Top-level inventory configuration parsed from TOML.
///
/// All fields have defaults matching the baseline run. Load from TOML with
/// [`InventoryConfig::from_toml_file`] or use [`InventoryConfig::baseline`]
/// for the built-in default.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InventoryConfig {
    /// Analysis years and municipality.
    #[serde(default)]
    pub analysis: AnalysisConfig,
    /// Seasonal heating assumptions.
    #[serde(default)]
    pub heating: HeatingConfig,
    /// Per-unit savings constants.
    #[serde(default)]
    pub savings: SavingsConfig,
    /// Input file locations.
    #[serde(default)]
    pub data: DataConfig,
    /// Loaded-table cache.
    #[serde(default)]
    pub cache: CacheConfig,
}

/// Analysis years and municipality.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    /// Municipality used to filter regional solar data.
    pub municipality: String,
    /// Year of the assessor snapshot; displacement and savings are measured
    /// from it.
    pub baseline_year: i32,
    /// First year kept in the sector rollup.
    pub first_rollup_year: i32,
    /// First incomplete year; it and later years are dropped.
    pub incomplete_year: i32,
    /// Oldest fiscal year in the municipal energy view.
    pub municipal_floor_year: i32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            municipality: "Truro".to_string(),
            baseline_year: 2019,
            first_rollup_year: 2019,
            incomplete_year: 2025,
            municipal_floor_year: 2009,
        }
    }
}

/// Seasonal heating assumptions.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HeatingConfig {
    /// Share of homes vacant for seasonal use (0.0–1.0).
    pub seasonal_vacancy_fraction: f64,
    /// Share of homes occupied year-round (0.0–1.0).
    pub year_round_fraction: f64,
    /// Heating used by a seasonal home relative to a year-round one.
    pub seasonal_usage: f64,
    /// Heating used by a year-round home.
    pub year_round_usage: f64,
    /// Factor for commercial properties.
    pub commercial_factor: f64,
    /// Factor for motels and resorts.
    pub motel_resort_factor: f64,
    /// Factor for homes tracked by the displacement model.
    pub tracked_propane_factor: f64,
}

impl Default for HeatingConfig {
    fn default() -> Self {
        Self {
            seasonal_vacancy_fraction: buildings::SEASONAL_VACANCY_FRACTION,
            year_round_fraction: buildings::YEAR_ROUND_FRACTION,
            seasonal_usage: buildings::SEASONAL_USAGE,
            year_round_usage: buildings::YEAR_ROUND_USAGE,
            commercial_factor: buildings::COMMERCIAL_FACTOR,
            motel_resort_factor: buildings::MOTEL_RESORT_FACTOR,
            tracked_propane_factor: 1.00,
        }
    }
}

impl HeatingConfig {
    /// Per-category factors used by the building estimator.
    pub fn factors(&self) -> HeatingFactors {
        HeatingFactors {
            residential: buildings::blended_residential_factor(
                self.seasonal_vacancy_fraction,
                self.seasonal_usage,
                self.year_round_fraction,
                self.year_round_usage,
            ),
            commercial: self.commercial_factor,
            motel_resort: self.motel_resort_factor,
        }
    }
}

/// Per-unit savings constants.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SavingsConfig {
    /// tCO2e saved per battery-electric vehicle per year.
    pub bev_tco2e_per_vehicle: f64,
    /// tCO2e saved per plug-in hybrid per year.
    pub phev_tco2e_per_vehicle: f64,
    /// MWh generated per kW DC per year.
    pub solar_mwh_per_kw: f64,
}

impl Default for SavingsConfig {
    fn default() -> Self {
        Self {
            bev_tco2e_per_vehicle: savings::BEV_TCO2E_PER_VEHICLE,
            phev_tco2e_per_vehicle: savings::PHEV_TCO2E_PER_VEHICLE,
            solar_mwh_per_kw: savings::SOLAR_MWH_PER_KW,
        }
    }
}

impl SavingsConfig {
    pub fn rates(&self) -> SavingsRates {
        SavingsRates {
            bev_tco2e_per_vehicle: self.bev_tco2e_per_vehicle,
            phev_tco2e_per_vehicle: self.phev_tco2e_per_vehicle,
            solar_mwh_per_kw: self.solar_mwh_per_kw,
        }
    }
}

/// Input file locations, relative to the data directory.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DataConfig {
    /// Data directory; overridden by `--data`.
    pub dir: PathBuf,
    pub vehicles: String,
    /// Optional vehicle class table; the built-in table is used if absent.
    pub vehicle_factors: Option<String>,
    pub municipal_energy: String,
    pub assessors: String,
    /// Directory of per-year electricity usage files.
    pub electricity_dir: String,
    pub heat_pumps: String,
    pub solar: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("data"),
            vehicles: "vehicles.csv".to_string(),
            vehicle_factors: None,
            municipal_energy: "municipal_energy.csv".to_string(),
            assessors: "assessors_2019.csv".to_string(),
            electricity_dir: "electricity".to_string(),
            heat_pumps: "heat_pumps.csv".to_string(),
            solar: "solar.csv".to_string(),
        }
    }
}

/// Loaded-table cache.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
    /// Seconds a loaded table stays fresh (must be > 0).
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { ttl_secs: 600 }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl InventoryConfig {
    /// Returns the baseline configuration.
    pub fn baseline() -> Self {
        Self {
            analysis: AnalysisConfig::default(),
            heating: HeatingConfig::default(),
            savings: SavingsConfig::default(),
            data: DataConfig::default(),
            cache: CacheConfig::default(),
        }
    }

    /// Returns the all-year-round sensitivity preset: every residential
    /// property is heated as if occupied all year.
    pub fn all_year_round() -> Self {
        Self {
            heating: HeatingConfig {
                seasonal_vacancy_fraction: 0.0,
                year_round_fraction: 1.0,
                ..HeatingConfig::default()
            },
            ..Self::baseline()
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["baseline", "all_year_round"];

    /// Loads a configuration from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "baseline" => Ok(Self::baseline()),
            "all_year_round" => Ok(Self::all_year_round()),
            _ => Err(ConfigError::new(
                "preset",
                format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            )),
        }
    }

    /// Parses a configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::new("config", format!("cannot read \"{}\": {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::new("toml", e.to_string()))
    }

    pub fn fiscal_window(&self) -> FiscalWindow {
        FiscalWindow {
            floor_year: Some(self.analysis.municipal_floor_year),
            incomplete_year: self.analysis.incomplete_year,
        }
    }

    pub fn rollup_window(&self) -> RollupWindow {
        RollupWindow {
            first_year: self.analysis.first_rollup_year,
            incomplete_year: self.analysis.incomplete_year,
        }
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        let a = &self.analysis;
        if a.municipality.trim().is_empty() {
            errors.push(ConfigError::new("analysis.municipality", "must not be empty"));
        }
        if a.baseline_year >= a.incomplete_year {
            errors.push(ConfigError::new(
                "analysis.baseline_year",
                "must be < analysis.incomplete_year",
            ));
        }
        if a.first_rollup_year >= a.incomplete_year {
            errors.push(ConfigError::new(
                "analysis.first_rollup_year",
                "must be < analysis.incomplete_year",
            ));
        }
        if a.municipal_floor_year > a.first_rollup_year {
            errors.push(ConfigError::new(
                "analysis.municipal_floor_year",
                "must be <= analysis.first_rollup_year",
            ));
        }

        let h = &self.heating;
        for (field, value) in [
            ("heating.seasonal_vacancy_fraction", h.seasonal_vacancy_fraction),
            ("heating.year_round_fraction", h.year_round_fraction),
            ("heating.seasonal_usage", h.seasonal_usage),
            ("heating.year_round_usage", h.year_round_usage),
            ("heating.commercial_factor", h.commercial_factor),
            ("heating.motel_resort_factor", h.motel_resort_factor),
            ("heating.tracked_propane_factor", h.tracked_propane_factor),
        ] {
            if !(0.0..=1.0).contains(&value) {
                errors.push(ConfigError::new(field, "must be in [0.0, 1.0]"));
            }
        }
        if (h.seasonal_vacancy_fraction + h.year_round_fraction - 1.0).abs() > 1e-6 {
            errors.push(ConfigError::new(
                "heating.year_round_fraction",
                "must sum to 1.0 with heating.seasonal_vacancy_fraction",
            ));
        }

        let s = &self.savings;
        for (field, value) in [
            ("savings.bev_tco2e_per_vehicle", s.bev_tco2e_per_vehicle),
            ("savings.phev_tco2e_per_vehicle", s.phev_tco2e_per_vehicle),
            ("savings.solar_mwh_per_kw", s.solar_mwh_per_kw),
        ] {
            if value <= 0.0 {
                errors.push(ConfigError::new(field, "must be > 0"));
            }
        }

        if self.cache.ttl_secs == 0 {
            errors.push(ConfigError::new("cache.ttl_secs", "must be > 0"));
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn baseline_preset_valid() {
        let cfg = InventoryConfig::baseline();
        let errors = cfg.validate();
        assert!(errors.is_empty(), "baseline should be valid: {errors:?}");
    }

    #[test]
    fn from_preset_unknown() {
        let err = InventoryConfig::from_preset("nonexistent").unwrap_err();
        assert!(err.message.contains("unknown preset"));
        assert_eq!(err.field, "preset");
    }

    #[test]
    fn all_presets_are_valid() {
        for name in InventoryConfig::PRESETS {
            let cfg = InventoryConfig::from_preset(name);
            assert!(cfg.is_ok(), "preset \"{name}\" should load");
            let errors = cfg.as_ref().map(|c| c.validate()).unwrap_or_default();
            assert!(
                errors.is_empty(),
                "preset \"{name}\" should be valid: {errors:?}"
            );
        }
    }

    #[test]
    fn baseline_factors_match_blend() {
        let f = InventoryConfig::baseline().heating.factors();
        assert_relative_eq!(f.residential, 0.5303, epsilon = 1e-12);
        assert_eq!(f, HeatingFactors::default());
    }

    #[test]
    fn all_year_round_heats_residential_fully() {
        let f = InventoryConfig::all_year_round().heating.factors();
        assert_relative_eq!(f.residential, 1.0);
        assert_eq!(f.commercial, 0.65);
    }

    #[test]
    fn valid_toml_parses() {
        let toml = r#"
[analysis]
municipality = "Wellfleet"
baseline_year = 2019
first_rollup_year = 2020
incomplete_year = 2024
municipal_floor_year = 2010

[heating]
commercial_factor = 0.7

[savings]
solar_mwh_per_kw = 1.1

[data]
dir = "/srv/inventory"
vehicle_factors = "vehicle_types.csv"

[cache]
ttl_secs = 60
"#;
        let cfg = InventoryConfig::from_toml_str(toml);
        assert!(cfg.is_ok(), "valid TOML should parse: {:?}", cfg.err());
        let cfg = cfg.ok();
        assert_eq!(cfg.as_ref().map(|c| c.analysis.municipality.as_str()), Some("Wellfleet"));
        assert_eq!(cfg.as_ref().map(|c| c.heating.commercial_factor), Some(0.7));
        assert_eq!(cfg.as_ref().map(|c| c.heating.year_round_fraction), Some(0.329));
        assert_eq!(cfg.as_ref().and_then(|c| c.data.vehicle_factors.clone()).as_deref(), Some("vehicle_types.csv"));
        assert_eq!(cfg.as_ref().map(|c| c.cache.ttl()), Some(Duration::from_secs(60)));
    }

    #[test]
    fn invalid_toml_unknown_field() {
        let toml = r#"
[heating]
commercial_factor = 0.5
bogus_field = true
"#;
        assert!(InventoryConfig::from_toml_str(toml).is_err());
    }

    #[test]
    fn validation_catches_fractions_not_summing_to_one() {
        let mut cfg = InventoryConfig::baseline();
        cfg.heating.year_round_fraction = 0.5;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "heating.year_round_fraction"));
    }

    #[test]
    fn validation_reports_every_error() {
        let mut cfg = InventoryConfig::baseline();
        cfg.heating.commercial_factor = 1.5;
        cfg.savings.bev_tco2e_per_vehicle = 0.0;
        cfg.analysis.baseline_year = 2030;
        cfg.cache.ttl_secs = 0;
        let fields: Vec<String> = cfg.validate().into_iter().map(|e| e.field).collect();
        for expected in [
            "heating.commercial_factor",
            "savings.bev_tco2e_per_vehicle",
            "analysis.baseline_year",
            "cache.ttl_secs",
        ] {
            assert!(fields.iter().any(|f| f == expected), "missing {expected} in {fields:?}");
        }
    }

    #[test]
    fn windows_follow_analysis_years() {
        let cfg = InventoryConfig::baseline();
        assert!(cfg.fiscal_window().contains(2009));
        assert!(!cfg.fiscal_window().contains(2025));
        assert!(cfg.rollup_window().contains(2024));
        assert!(!cfg.rollup_window().contains(2018));
    }
}
