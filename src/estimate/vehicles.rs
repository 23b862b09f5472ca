//! Vehicle emissions from registration counts.
//!
//! Each vehicle class has a reference mileage and efficiency. A vehicle's
//! annual emissions are its gallons times the per-gallon factor plus its kWh
//! times the grid factor, rounded to cents of a ton, then multiplied by the
//! registered count.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

use crate::factors::{ELECTRICITY_TCO2E_PER_KWH, round2, vehicle_gallon_factor};
use crate::records::{
    VehicleRegistration, VehicleTypeFactor, default_vehicle_factors, effective_year,
};

/// Battery-electric registration type.
pub const BATTERY_ELECTRIC: &str = "Battery Electric";
/// Plug-in hybrid registration type.
pub const PLUG_IN_HYBRID: &str = "Plug-in Hybrid";

/// Lookup from registration type to reference factors.
///
/// Lookups are total: a type with no entry emits zero. Totals therefore
/// under-count when the registration data introduces a new class, which is
/// the accepted behaviour.
#[derive(Debug, Clone)]
pub struct VehicleFactorTable {
    factors: BTreeMap<String, VehicleTypeFactor>,
}

impl Default for VehicleFactorTable {
    fn default() -> Self {
        Self::new(default_vehicle_factors())
    }
}

impl VehicleFactorTable {
    /// Builds a table. Later entries replace earlier ones with the same name.
    pub fn new(factors: Vec<VehicleTypeFactor>) -> Self {
        Self {
            factors: factors
                .into_iter()
                .map(|f| (f.vehicle_type.clone(), f))
                .collect(),
        }
    }

    /// Factor row for an exact type name.
    pub fn lookup(&self, vehicle_type: &str) -> Option<&VehicleTypeFactor> {
        self.factors.get(vehicle_type)
    }

    /// Annual tCO2e for one vehicle of this type, rounded to 2 decimals.
    ///
    /// Unknown types return `0.0`.
    pub fn per_vehicle_tco2e(&self, vehicle_type: &str) -> f64 {
        let Some(factor) = self.lookup(vehicle_type) else {
            debug!(vehicle_type, "no factor for vehicle type, counting as zero");
            return 0.0;
        };
        let gallons = factor.gallons_per_year();
        let kwh = factor.kwh_per_year();
        round2(gallons * vehicle_gallon_factor(vehicle_type) + kwh * ELECTRICITY_TCO2E_PER_KWH)
    }

    pub fn len(&self) -> usize {
        self.factors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factors.is_empty()
    }
}

/// Emissions for one vehicle type in one quarter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VehicleEmissionRow {
    pub quarter: NaiveDate,
    pub vehicle_type: String,
    pub count: u32,
    pub per_vehicle_tco2e: f64,
    pub tco2e: f64,
}

impl VehicleEmissionRow {
    /// Emissions after removing electricity already booked as residential use.
    pub fn adjusted_tco2e(&self) -> f64 {
        self.tco2e * retained_share(&self.vehicle_type)
    }
}

/// Share of a vehicle type's emissions kept in multi-sector totals.
///
/// Battery-electric charging is counted in residential electricity, so those
/// rows are dropped. Plug-in hybrids are assumed to drive half their miles on
/// electricity. Charging outside town is not tracked separately.
pub fn retained_share(vehicle_type: &str) -> f64 {
    match vehicle_type {
        BATTERY_ELECTRIC => 0.0,
        PLUG_IN_HYBRID => 0.5,
        _ => 1.0,
    }
}

/// Computes one emission row per registration, ordered by quarter then type.
pub fn estimate_registrations(
    registrations: &[VehicleRegistration],
    table: &VehicleFactorTable,
) -> Vec<VehicleEmissionRow> {
    let mut rows: Vec<VehicleEmissionRow> = registrations
        .iter()
        .map(|r| {
            let per_vehicle = table.per_vehicle_tco2e(&r.vehicle_type);
            VehicleEmissionRow {
                quarter: r.quarter,
                vehicle_type: r.vehicle_type.clone(),
                count: r.count,
                per_vehicle_tco2e: per_vehicle,
                tco2e: per_vehicle * f64::from(r.count),
            }
        })
        .collect();
    rows.sort_by(|a, b| {
        a.quarter
            .cmp(&b.quarter)
            .then_with(|| a.vehicle_type.cmp(&b.vehicle_type))
    });
    rows
}

/// Fleet totals for one calendar year, from the following January snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VehicleYear {
    pub year: i32,
    pub vehicle_count: u32,
    /// Standalone vehicle total.
    pub tco2e: f64,
    /// Total with the EV double-counting adjustment applied.
    pub adjusted_tco2e: f64,
    pub bev_count: u32,
    pub phev_count: u32,
}

/// Rolls January rows up into calendar years.
pub fn yearly_vehicle_emissions(rows: &[VehicleEmissionRow]) -> Vec<VehicleYear> {
    let mut by_year: BTreeMap<i32, VehicleYear> = BTreeMap::new();
    for row in rows {
        let Some(year) = effective_year(row.quarter) else {
            continue;
        };
        let entry = by_year.entry(year).or_insert_with(|| VehicleYear {
            year,
            vehicle_count: 0,
            tco2e: 0.0,
            adjusted_tco2e: 0.0,
            bev_count: 0,
            phev_count: 0,
        });
        entry.vehicle_count += row.count;
        entry.tco2e += row.tco2e;
        entry.adjusted_tco2e += row.adjusted_tco2e();
        match row.vehicle_type.as_str() {
            BATTERY_ELECTRIC => entry.bev_count += row.count,
            PLUG_IN_HYBRID => entry.phev_count += row.count,
            _ => {}
        }
    }
    by_year.into_values().collect()
}

/// Fleet totals for one quarter, every month kept.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuarterTotal {
    pub quarter: NaiveDate,
    pub vehicle_count: u32,
    pub tco2e: f64,
}

/// Sums emission rows per quarter, ascending.
pub fn quarterly_totals(rows: &[VehicleEmissionRow]) -> Vec<QuarterTotal> {
    let mut by_quarter: BTreeMap<NaiveDate, QuarterTotal> = BTreeMap::new();
    for row in rows {
        let entry = by_quarter.entry(row.quarter).or_insert(QuarterTotal {
            quarter: row.quarter,
            vehicle_count: 0,
            tco2e: 0.0,
        });
        entry.vehicle_count += row.count;
        entry.tco2e += row.tco2e;
    }
    by_quarter.into_values().collect()
}

/// Count of one type in the latest quarter with its change from the prior one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeCount {
    pub vehicle_type: String,
    pub count: u32,
    /// Zero when the type was absent from the previous quarter.
    pub delta: i64,
}

/// Registrations in the most recent quarter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FleetSnapshot {
    pub quarter: NaiveDate,
    pub previous_quarter: Option<NaiveDate>,
    pub types: Vec<TypeCount>,
}

/// Latest-quarter counts with quarter-over-quarter deltas.
pub fn latest_fleet_snapshot(registrations: &[VehicleRegistration]) -> Option<FleetSnapshot> {
    let latest = registrations.iter().map(|r| r.quarter).max()?;
    let previous = registrations
        .iter()
        .map(|r| r.quarter)
        .filter(|q| *q < latest)
        .max();

    let counts_at = |quarter: NaiveDate| -> BTreeMap<&str, u32> {
        let mut counts = BTreeMap::new();
        for r in registrations.iter().filter(|r| r.quarter == quarter) {
            *counts.entry(r.vehicle_type.as_str()).or_insert(0) += r.count;
        }
        counts
    };

    let current = counts_at(latest);
    let prior = previous.map(counts_at).unwrap_or_default();
    let types = current
        .iter()
        .map(|(vehicle_type, count)| TypeCount {
            vehicle_type: (*vehicle_type).to_string(),
            count: *count,
            delta: prior
                .get(vehicle_type)
                .map_or(0, |p| i64::from(*count) - i64::from(*p)),
        })
        .collect();

    Some(FleetSnapshot {
        quarter: latest,
        previous_quarter: previous,
        types,
    })
}

/// Standalone vehicle report: per-quarter detail plus yearly rollup.
#[derive(Debug, Clone, Serialize)]
pub struct VehicleReport {
    pub rows: Vec<VehicleEmissionRow>,
    pub quarterly: Vec<QuarterTotal>,
    pub yearly: Vec<VehicleYear>,
    pub latest: Option<FleetSnapshot>,
}

/// Estimates every registration and builds the quarterly, yearly and latest views.
pub fn vehicle_report(
    registrations: &[VehicleRegistration],
    table: &VehicleFactorTable,
) -> VehicleReport {
    let rows = estimate_registrations(registrations, table);
    VehicleReport {
        quarterly: quarterly_totals(&rows),
        yearly: yearly_vehicle_emissions(&rows),
        latest: latest_fleet_snapshot(registrations),
        rows,
    }
}
