//! Town-wide inventory by sector and year.
//!
//! Per-source yearly series are outer-joined on year. A year missing from a
//! source reads as zero, except that trailing years after a forward-fillable
//! source's last published year repeat that year's value and are flagged as
//! estimates.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::Serialize;
use tracing::debug;

use crate::estimate::displacement::FossilHeatingRow;
use crate::estimate::municipal::FuelSplitYear;
use crate::estimate::vehicles::VehicleYear;
use crate::factors::ELECTRICITY_TCO2E_PER_MWH;
use crate::records::{ElectricSector, ElectricityUsageRecord};

/// One column of the rollup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Sector {
    Vehicles,
    MunicipalElectric,
    MunicipalFuel,
    ResidentialHeating,
    ResidentialElectricity,
    CommercialElectricity,
}

impl Sector {
    pub const ALL: [Self; 6] = [
        Self::Vehicles,
        Self::MunicipalElectric,
        Self::MunicipalFuel,
        Self::ResidentialHeating,
        Self::ResidentialElectricity,
        Self::CommercialElectricity,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Vehicles => "vehicles",
            Self::MunicipalElectric => "municipal_electric",
            Self::MunicipalFuel => "municipal_fuel",
            Self::ResidentialHeating => "residential_heating",
            Self::ResidentialElectricity => "residential_electricity",
            Self::CommercialElectricity => "commercial_electricity",
        }
    }

    /// Sources published with a lag; their latest value stands in for
    /// unpublished years.
    pub fn forward_fillable(self) -> bool {
        matches!(
            self,
            Self::ResidentialHeating | Self::ResidentialElectricity | Self::CommercialElectricity
        )
    }
}

impl fmt::Display for Sector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Years kept in the rollup: `first_year <= year < incomplete_year`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RollupWindow {
    pub first_year: i32,
    pub incomplete_year: i32,
}

impl RollupWindow {
    pub fn contains(&self, year: i32) -> bool {
        year >= self.first_year && year < self.incomplete_year
    }
}

/// Yearly series feeding the rollup.
#[derive(Debug, Clone, Copy, Default)]
pub struct RollupInputs<'a> {
    /// Double-count-adjusted totals are used.
    pub vehicles: &'a [VehicleYear],
    pub municipal: &'a [FuelSplitYear],
    pub fossil_heating: &'a [FossilHeatingRow],
    pub electricity: &'a [ElectricityUsageRecord],
}

impl RollupInputs<'_> {
    fn series(&self) -> BTreeMap<Sector, BTreeMap<i32, f64>> {
        let mut series: BTreeMap<Sector, BTreeMap<i32, f64>> = BTreeMap::new();
        let mut add = |sector: Sector, year: i32, value: f64| {
            *series.entry(sector).or_default().entry(year).or_default() += value;
        };
        for v in self.vehicles {
            add(Sector::Vehicles, v.year, v.adjusted_tco2e);
        }
        for m in self.municipal {
            add(Sector::MunicipalElectric, m.year, m.electric_mtco2e);
            add(Sector::MunicipalFuel, m.year, m.other_fuel_mtco2e);
        }
        for h in self.fossil_heating {
            add(Sector::ResidentialHeating, h.year, h.total_mtco2e);
        }
        for e in self.electricity {
            let sector = match e.sector {
                ElectricSector::Residential => Sector::ResidentialElectricity,
                ElectricSector::Commercial => Sector::CommercialElectricity,
            };
            add(sector, e.year, e.electric_mwh * ELECTRICITY_TCO2E_PER_MWH);
        }
        series
    }
}

/// One year of the rollup.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RollupRow {
    pub year: i32,
    /// mtCO2e per sector; every sector in [`Sector::ALL`] is present.
    pub values: BTreeMap<Sector, f64>,
    /// Sectors whose value was carried forward from an earlier year.
    pub estimated: Vec<Sector>,
    pub total: f64,
}

impl RollupRow {
    pub fn value(&self, sector: Sector) -> f64 {
        self.values.get(&sector).copied().unwrap_or(0.0)
    }

    pub fn is_estimated(&self, sector: Sector) -> bool {
        self.estimated.contains(&sector)
    }
}

/// Joins every source into one table, ascending by year.
pub fn sector_rollup(inputs: &RollupInputs<'_>, window: RollupWindow) -> Vec<RollupRow> {
    let series = inputs.series();
    let years: BTreeSet<i32> = series
        .values()
        .flat_map(|s| s.keys().copied())
        .filter(|y| window.contains(*y))
        .collect();

    years
        .into_iter()
        .map(|year| {
            let mut values = BTreeMap::new();
            let mut estimated = Vec::new();
            for sector in Sector::ALL {
                let source = series.get(&sector);
                let observed = source.and_then(|s| s.get(&year)).copied();
                let value = match observed {
                    Some(v) => v,
                    None => match source.and_then(|s| s.last_key_value()) {
                        Some((&last_year, &last)) if sector.forward_fillable() && last_year < year => {
                            debug!(year, %sector, from = last_year, "carrying value forward");
                            estimated.push(sector);
                            last
                        }
                        _ => 0.0,
                    },
                };
                values.insert(sector, value);
            }
            RollupRow {
                year,
                total: values.values().sum(),
                values,
                estimated,
            }
        })
        .collect()
}
