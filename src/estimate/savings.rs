//! Annual savings from heat pumps, electric vehicles and solar.
//!
//! Every unit installed up to and including a year keeps contributing in
//! that year. The three tracks are outer-joined by year; a track with no
//! row for a year contributes zero.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::estimate::displacement::DisplacementRow;
use crate::estimate::solar::SolarSavingsYear;
use crate::estimate::vehicles::VehicleYear;

/// Battery-electric savings against an average gasoline vehicle, tCO2e/year.
pub const BEV_TCO2E_PER_VEHICLE: f64 = 3.44;
/// Plug-in hybrids are assumed half electric.
pub const PHEV_TCO2E_PER_VEHICLE: f64 = 1.72;
/// Solar generation, MWh per kW DC per year.
pub const SOLAR_MWH_PER_KW: f64 = 1.2;

/// Per-unit savings constants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SavingsRates {
    pub bev_tco2e_per_vehicle: f64,
    pub phev_tco2e_per_vehicle: f64,
    pub solar_mwh_per_kw: f64,
}

impl Default for SavingsRates {
    fn default() -> Self {
        Self {
            bev_tco2e_per_vehicle: BEV_TCO2E_PER_VEHICLE,
            phev_tco2e_per_vehicle: PHEV_TCO2E_PER_VEHICLE,
            solar_mwh_per_kw: SOLAR_MWH_PER_KW,
        }
    }
}

/// Electric vehicle savings for one year.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvSavingsYear {
    pub year: i32,
    pub bev_count: u32,
    pub phev_count: u32,
    pub bev_mtco2e: f64,
    pub phev_mtco2e: f64,
    pub total_mtco2e: f64,
}

/// EV savings from yearly fleet counts, for years from `from_year` on.
pub fn ev_savings(yearly: &[VehicleYear], from_year: i32, rates: &SavingsRates) -> Vec<EvSavingsYear> {
    yearly
        .iter()
        .filter(|y| y.year >= from_year)
        .map(|y| {
            let bev_mtco2e = f64::from(y.bev_count) * rates.bev_tco2e_per_vehicle;
            let phev_mtco2e = f64::from(y.phev_count) * rates.phev_tco2e_per_vehicle;
            EvSavingsYear {
                year: y.year,
                bev_count: y.bev_count,
                phev_count: y.phev_count,
                bev_mtco2e,
                phev_mtco2e,
                total_mtco2e: bev_mtco2e + phev_mtco2e,
            }
        })
        .collect()
}

/// Combined savings for one year.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct SavingsYear {
    pub year: i32,
    pub conversions: i64,
    pub heat_pump_mtco2e: f64,
    /// First difference of the heat-pump series; the first year keeps its
    /// own value.
    pub heat_pump_incremental_mtco2e: f64,
    pub bev_count: u32,
    pub phev_count: u32,
    pub ev_mtco2e: f64,
    pub solar_capacity_added_kw_dc: f64,
    pub solar_mwh: f64,
    pub solar_mtco2e: f64,
    pub total_mtco2e: f64,
}

fn year_row(years: &mut BTreeMap<i32, SavingsYear>, year: i32) -> &mut SavingsYear {
    years.entry(year).or_insert_with(|| SavingsYear {
        year,
        ..SavingsYear::default()
    })
}

/// Outer-joins the three tracks by year, ascending.
pub fn savings_table(
    displacement: &[DisplacementRow],
    ev: &[EvSavingsYear],
    solar: &[SolarSavingsYear],
) -> Vec<SavingsYear> {
    let mut years: BTreeMap<i32, SavingsYear> = BTreeMap::new();

    let mut previous: Option<f64> = None;
    for d in displacement {
        let row = year_row(&mut years, d.year);
        row.conversions = d.conversions;
        row.heat_pump_mtco2e = d.saved_mtco2e;
        row.heat_pump_incremental_mtco2e = d.saved_mtco2e - previous.unwrap_or(0.0);
        previous = Some(d.saved_mtco2e);
    }
    for e in ev {
        let row = year_row(&mut years, e.year);
        row.bev_count = e.bev_count;
        row.phev_count = e.phev_count;
        row.ev_mtco2e = e.total_mtco2e;
    }
    for s in solar {
        let row = year_row(&mut years, s.year);
        row.solar_capacity_added_kw_dc = s.capacity_added_kw_dc;
        row.solar_mwh = s.annual_mwh;
        row.solar_mtco2e = s.mtco2e;
    }

    years
        .into_values()
        .map(|mut row| {
            row.total_mtco2e = row.heat_pump_mtco2e + row.ev_mtco2e + row.solar_mtco2e;
            row
        })
        .collect()
}

/// Headline figures for one year of the savings table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SavingsSummary {
    pub year: i32,
    pub total_mtco2e: f64,
    /// Shares of the total; all zero when the total is not positive.
    pub heat_pump_share_percent: f64,
    pub ev_share_percent: f64,
    pub solar_share_percent: f64,
    pub baseline_year: Option<i32>,
    /// Growth of the total since the first year of the table.
    pub growth_mtco2e: f64,
    pub conversions: i64,
    pub electric_vehicles: u32,
    pub solar_capacity_added_kw_dc: f64,
    pub mtco2e_per_conversion: Option<f64>,
}

/// Summarises the last row of `table` whose year is before `before_year`.
pub fn savings_summary(table: &[SavingsYear], before_year: i32) -> Option<SavingsSummary> {
    let row = table.iter().rev().find(|r| r.year < before_year)?;
    let first = table.first()?;
    let share = |part: f64| {
        if row.total_mtco2e > 0.0 {
            part / row.total_mtco2e * 100.0
        } else {
            0.0
        }
    };
    Some(SavingsSummary {
        year: row.year,
        total_mtco2e: row.total_mtco2e,
        heat_pump_share_percent: share(row.heat_pump_mtco2e),
        ev_share_percent: share(row.ev_mtco2e),
        solar_share_percent: share(row.solar_mtco2e),
        baseline_year: (first.year != row.year).then_some(first.year),
        growth_mtco2e: row.total_mtco2e - first.total_mtco2e,
        conversions: row.conversions,
        electric_vehicles: row.bev_count + row.phev_count,
        solar_capacity_added_kw_dc: row.solar_capacity_added_kw_dc,
        mtco2e_per_conversion: (row.conversions > 0).then(|| row.heat_pump_mtco2e / row.conversions as f64),
    })
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::estimate::displacement::CountSource;

    fn hp(year: i32, conversions: i64, saved: f64) -> DisplacementRow {
        DisplacementRow {
            year,
            source: CountSource::ProgramTracker,
            heat_pump_locations: 0,
            conversions,
            remaining_properties: 0,
            remaining_gallons: 0.0,
            remaining_mtco2e: 0.0,
            saved_gallons: 0.0,
            saved_mtco2e: saved,
            percent_reduction: 0.0,
        }
    }

    fn fleet(year: i32, bev: u32, phev: u32) -> VehicleYear {
        VehicleYear {
            year,
            vehicle_count: bev + phev,
            tco2e: 0.0,
            adjusted_tco2e: 0.0,
            bev_count: bev,
            phev_count: phev,
        }
    }

    #[test]
    fn ev_savings_apply_per_vehicle_rates() {
        let ev = ev_savings(&[fleet(2018, 1, 1), fleet(2021, 10, 4)], 2019, &SavingsRates::default());
        assert_eq!(ev.len(), 1);
        assert_relative_eq!(ev[0].total_mtco2e, 10.0 * 3.44 + 4.0 * 1.72, epsilon = 1e-12);
    }

    #[test]
    fn tracks_are_outer_joined_with_zero_fill() {
        let displacement = vec![hp(2019, 0, 0.0), hp(2020, 5, 10.0), hp(2021, 9, 18.0)];
        let ev = ev_savings(&[fleet(2021, 2, 0), fleet(2022, 3, 0)], 2019, &SavingsRates::default());
        let solar = vec![SolarSavingsYear {
            year: 2020,
            capacity_added_kw_dc: 10.0,
            annual_mwh: 12.0,
            mtco2e: 12.0 * 0.239,
        }];
        let table = savings_table(&displacement, &ev, &solar);
        let years: Vec<i32> = table.iter().map(|r| r.year).collect();
        assert_eq!(years, vec![2019, 2020, 2021, 2022]);

        assert_eq!(table[1].heat_pump_incremental_mtco2e, 10.0);
        assert_eq!(table[2].heat_pump_incremental_mtco2e, 8.0);
        assert_eq!(table[3].heat_pump_mtco2e, 0.0);
        assert_relative_eq!(table[3].total_mtco2e, 3.0 * 3.44, epsilon = 1e-12);
        for row in &table {
            assert_relative_eq!(
                row.total_mtco2e,
                row.heat_pump_mtco2e + row.ev_mtco2e + row.solar_mtco2e,
                epsilon = 1e-12
            );
        }
    }

    #[test]
    fn first_incremental_value_is_itself() {
        let table = savings_table(&[hp(2020, 3, 7.5)], &[], &[]);
        assert_eq!(table[0].heat_pump_incremental_mtco2e, 7.5);
    }

    #[test]
    fn summary_shares_and_growth() {
        let displacement = vec![hp(2019, 0, 0.0), hp(2023, 10, 30.0)];
        let ev = ev_savings(&[fleet(2023, 5, 0)], 2019, &SavingsRates::default());
        let table = savings_table(&displacement, &ev, &[]);
        let summary = savings_summary(&table, 2025).unwrap();
        assert_eq!(summary.year, 2023);
        assert_eq!(summary.baseline_year, Some(2019));
        assert_relative_eq!(summary.total_mtco2e, 47.2, epsilon = 1e-9);
        assert_relative_eq!(
            summary.heat_pump_share_percent + summary.ev_share_percent + summary.solar_share_percent,
            100.0,
            epsilon = 1e-9
        );
        assert_eq!(summary.mtco2e_per_conversion, Some(3.0));
        assert_eq!(summary.electric_vehicles, 5);
    }

    #[test]
    fn summary_of_empty_table_is_none() {
        assert!(savings_summary(&[], 2025).is_none());
    }
}
