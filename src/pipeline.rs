//! End-to-end estimation over a full set of loaded tables.

use std::fmt;

use serde::Serialize;
use tracing::info;

use crate::config::InventoryConfig;
use crate::error::EstimationError;
use crate::estimate::assessor::{AssessorProfile, assessor_profile};
use crate::estimate::buildings::{BuildingEstimate, PropertyCategory, estimate_buildings};
use crate::estimate::displacement::{
    DisplacementRow, FossilHeatingRow, PropaneBaseline, displacement_table, fossil_heating_series,
    propane_baseline,
};
use crate::estimate::municipal::{MunicipalReport, municipal_report};
use crate::estimate::rollup::{RollupInputs, RollupRow, Sector, sector_rollup};
use crate::estimate::savings::{SavingsSummary, SavingsYear, ev_savings, savings_summary, savings_table};
use crate::estimate::solar::{SolarSummary, municipality_series, solar_savings, solar_summary};
use crate::estimate::vehicles::{VehicleFactorTable, VehicleReport, vehicle_report};
use crate::factors::HeatingFuel;
use crate::records::{
    AssessorPropertyRecord, ElectricityUsageRecord, EnergyBillingRecord, HeatPumpInstallationRecord,
    SolarCapacityRecord, VehicleRegistration, VehicleTypeFactor,
};

/// Every input table. A `None` table was not supplied.
#[derive(Debug, Clone, Default)]
pub struct InventoryTables {
    /// Overrides the built-in vehicle class table.
    pub vehicle_factors: Option<Vec<VehicleTypeFactor>>,
    pub vehicles: Option<Vec<VehicleRegistration>>,
    pub municipal_energy: Option<Vec<EnergyBillingRecord>>,
    pub assessors: Option<Vec<AssessorPropertyRecord>>,
    pub electricity: Option<Vec<ElectricityUsageRecord>>,
    pub heat_pumps: Option<Vec<HeatPumpInstallationRecord>>,
    pub solar: Option<Vec<SolarCapacityRecord>>,
}

fn require<'a, T>(table: &'a Option<Vec<T>>, name: &'static str) -> Result<&'a [T], EstimationError> {
    table.as_deref().ok_or(EstimationError::MissingTable(name))
}

/// Everything derived from one set of tables.
#[derive(Debug, Clone, Serialize)]
pub struct InventoryReport {
    pub municipality: String,
    pub baseline_year: i32,
    pub vehicles: VehicleReport,
    pub municipal: MunicipalReport,
    pub assessor: AssessorProfile,
    pub buildings: BuildingEstimate,
    pub propane_baseline: PropaneBaseline,
    pub displacement: Vec<DisplacementRow>,
    /// Constant residential oil plus remaining propane.
    pub fossil_heating: Vec<FossilHeatingRow>,
    pub solar: Option<SolarSummary>,
    pub savings: Vec<SavingsYear>,
    pub savings_summary: Option<SavingsSummary>,
    pub rollup: Vec<RollupRow>,
}

impl InventoryReport {
    /// Latest rollup row, if any.
    pub fn latest_rollup(&self) -> Option<&RollupRow> {
        self.rollup.last()
    }

    /// Rollup rows with `from <= year <= to`.
    pub fn rollup_between(&self, from: Option<i32>, to: Option<i32>) -> &[RollupRow] {
        let start = from.map_or(0, |f| self.rollup.partition_point(|r| r.year < f));
        let end = to.map_or(self.rollup.len(), |t| self.rollup.partition_point(|r| r.year <= t));
        &self.rollup[start..end.max(start)]
    }
}

/// Runs every estimator.
///
/// # Errors
///
/// Returns [`EstimationError::MissingTable`] if any table other than the
/// vehicle class override is absent, before anything is computed, and
/// [`EstimationError::UnsupportedGap`] or
/// [`EstimationError::UnorderedTracker`] if the heat-pump tracker cannot be
/// joined to the baseline snapshot.
pub fn estimate_inventory(
    tables: &InventoryTables,
    config: &InventoryConfig,
) -> Result<InventoryReport, EstimationError> {
    let registrations = require(&tables.vehicles, "vehicles")?;
    let billing = require(&tables.municipal_energy, "municipal_energy")?;
    let assessors = require(&tables.assessors, "assessors")?;
    let electricity = require(&tables.electricity, "electricity")?;
    let heat_pumps = require(&tables.heat_pumps, "heat_pumps")?;
    let solar = require(&tables.solar, "solar")?;

    let analysis = &config.analysis;
    let rates = config.savings.rates();

    let factor_table = tables
        .vehicle_factors
        .clone()
        .map(VehicleFactorTable::new)
        .unwrap_or_default();
    let vehicles = vehicle_report(registrations, &factor_table);
    let municipal = municipal_report(billing, config.fiscal_window());
    let assessor = assessor_profile(assessors);
    let buildings = estimate_buildings(assessors, config.heating.factors());

    let baseline = propane_baseline(
        assessors,
        analysis.baseline_year,
        config.heating.tracked_propane_factor,
    );
    info!(
        properties = baseline.properties,
        median_sqft = baseline.median_sqft,
        heat_pumps = baseline.heat_pump_count,
        "propane baseline"
    );
    let displacement = displacement_table(&baseline, heat_pumps)?;
    let oil = buildings.mtco2e_for(PropertyCategory::Residential, &HeatingFuel::Oil);
    let fossil_heating = fossil_heating_series(&displacement, oil);

    let solar_series = municipality_series(solar, &analysis.municipality);
    let solar_years = solar_savings(&solar_series, analysis.baseline_year, rates.solar_mwh_per_kw);
    let ev = ev_savings(&vehicles.yearly, analysis.baseline_year, &rates);
    let savings = savings_table(&displacement, &ev, &solar_years);
    let savings_summary = savings_summary(&savings, analysis.incomplete_year);

    let rollup = sector_rollup(
        &RollupInputs {
            vehicles: &vehicles.yearly,
            municipal: &municipal.split,
            fossil_heating: &fossil_heating,
            electricity,
        },
        config.rollup_window(),
    );
    let estimated = rollup.iter().filter(|r| !r.estimated.is_empty()).count();
    info!(years = rollup.len(), estimated, "sector rollup complete");

    Ok(InventoryReport {
        municipality: analysis.municipality.clone(),
        baseline_year: analysis.baseline_year,
        vehicles,
        municipal,
        assessor,
        buildings,
        propane_baseline: baseline,
        displacement,
        fossil_heating,
        solar: solar_summary(&solar_series),
        savings,
        savings_summary,
        rollup,
    })
}

impl fmt::Display for InventoryReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- {} GHG Inventory ---", self.municipality)?;
        writeln!(f)?;
        write!(f, "{:<6}", "Year")?;
        for sector in Sector::ALL {
            write!(f, " {:>24}", sector.label())?;
        }
        writeln!(f, " {:>12}", "total")?;
        for row in &self.rollup {
            write!(f, "{:<6}", row.year)?;
            for sector in Sector::ALL {
                let mark = if row.is_estimated(sector) { "*" } else { " " };
                write!(f, " {:>23.1}{mark}", row.value(sector))?;
            }
            writeln!(f, " {:>12.1}", row.total)?;
        }
        if self.rollup.iter().any(|r| !r.estimated.is_empty()) {
            writeln!(f, "* carried forward from the last published year")?;
        }

        let b = &self.propane_baseline;
        writeln!(f)?;
        writeln!(f, "--- Heat Pump Displacement ---")?;
        writeln!(
            f,
            "Baseline {}: {} heat pumps, {} propane homes (median {:.0} sq ft), {:.1} mtCO2e",
            b.year, b.heat_pump_count, b.properties, b.median_sqft, b.total_mtco2e
        )?;
        for d in &self.displacement {
            writeln!(
                f,
                "{:<6} {:<12} locations {:>5}  conversions {:>5}  saved {:>8.1} mtCO2e  ({:.1}%)",
                d.year, d.source.to_string(), d.heat_pump_locations, d.conversions, d.saved_mtco2e, d.percent_reduction
            )?;
        }

        writeln!(f)?;
        writeln!(f, "--- Buildings ---")?;
        for c in &self.buildings.by_category {
            writeln!(
                f,
                "{:<16} {:>6} properties  {:>12.0} sq ft  {:>10.1} mtCO2e",
                c.key.to_string(),
                c.properties,
                c.sqft,
                c.mtco2e
            )?;
        }
        writeln!(f, "Electric heating benchmarks are unvalidated estimates.")?;

        if let Some(s) = &self.savings_summary {
            writeln!(f)?;
            writeln!(f, "--- Savings {} ---", s.year)?;
            writeln!(f, "Total avoided:         {:.1} mtCO2e/year", s.total_mtco2e)?;
            writeln!(f, "Heat pumps:            {:.1}%", s.heat_pump_share_percent)?;
            writeln!(f, "Electric vehicles:     {:.1}% ({} vehicles)", s.ev_share_percent, s.electric_vehicles)?;
            writeln!(
                f,
                "Solar:                 {:.1}% ({:.1} kW DC added)",
                s.solar_share_percent, s.solar_capacity_added_kw_dc
            )?;
        }

        match self.latest_rollup() {
            Some(r) => write!(f, "\nLatest inventory year {}: {:.1} mtCO2e", r.year, r.total),
            None => write!(f, "\nNo inventory years in range"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demo::demo_tables;

    #[test]
    fn missing_table_refuses_to_run() {
        let mut tables = demo_tables(1);
        tables.heat_pumps = None;
        let err = estimate_inventory(&tables, &InventoryConfig::baseline()).unwrap_err();
        assert_eq!(err, EstimationError::MissingTable("heat_pumps"));
    }

    #[test]
    fn empty_tables_fail_on_first_requirement() {
        let err = estimate_inventory(&InventoryTables::default(), &InventoryConfig::baseline()).unwrap_err();
        assert_eq!(err, EstimationError::MissingTable("vehicles"));
    }

    #[test]
    fn display_marks_carried_forward_cells() {
        let report = estimate_inventory(&demo_tables(42), &InventoryConfig::baseline()).unwrap();
        let text = report.to_string();
        let row_2024 = report.rollup.iter().find(|r| r.year == 2024).unwrap();
        assert!(!row_2024.estimated.is_empty());

        let line = text.lines().find(|l| l.starts_with("2024 ")).unwrap();
        assert_eq!(line.matches('*').count(), row_2024.estimated.len());
        assert!(text.contains("* carried forward from the last published year"));
        for row in report.rollup.iter().filter(|r| r.estimated.is_empty()) {
            let line = text.lines().find(|l| l.starts_with(&format!("{} ", row.year))).unwrap();
            assert!(!line.contains('*'), "{line}");
        }
    }

    #[test]
    fn rollup_between_slices_inclusive_range() {
        let report = estimate_inventory(&demo_tables(3), &InventoryConfig::baseline()).unwrap();
        let years: Vec<i32> = report
            .rollup_between(Some(2020), Some(2022))
            .iter()
            .map(|r| r.year)
            .collect();
        assert_eq!(years, vec![2020, 2021, 2022]);
        assert!(report.rollup_between(Some(2023), Some(2020)).is_empty());
        assert_eq!(report.rollup_between(None, None).len(), report.rollup.len());
    }

    #[test]
    fn report_renders_every_rollup_year() {
        let report = estimate_inventory(&demo_tables(5), &InventoryConfig::baseline()).unwrap();
        let text = report.to_string();
        for row in &report.rollup {
            assert!(text.contains(&row.year.to_string()));
        }
        assert!(text.contains("unvalidated"));
    }
}
