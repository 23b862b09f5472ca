//! Propane displacement by heat-pump conversions.
//!
//! The baseline year comes from the assessor snapshot, the year after it is
//! interpolated, and every later year comes from the efficiency program's
//! cumulative installation tracker. Conversions are counted cumulatively
//! against the baseline heat-pump count, and each conversion removes one
//! median-sized year-round propane home.

use std::fmt;

use serde::Serialize;
use tracing::{debug, warn};

use crate::error::EstimationError;
use crate::estimate::buildings::{FuelUse, PropertyCategory, heating_fuel_use};
use crate::factors::HeatingFuel;
use crate::records::{AssessorPropertyRecord, HeatPumpInstallationRecord, PropertyType};

/// Where a year's heat-pump location count came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CountSource {
    AssessorSnapshot,
    Interpolated,
    ProgramTracker,
}

impl fmt::Display for CountSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::AssessorSnapshot => "assessor",
            Self::Interpolated => "interpolated",
            Self::ProgramTracker => "tracker",
        })
    }
}

/// Fixed scalars computed once from the baseline snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropaneBaseline {
    pub year: i32,
    /// Properties of any type whose HVAC mentions a heat pump.
    pub heat_pump_count: u32,
    /// Residential propane homes with a positive square footage.
    pub properties: usize,
    pub median_sqft: f64,
    /// Heating factor applied to every tracked home.
    pub heating_factor: f64,
    pub per_property: FuelUse,
    pub total_gallons: f64,
    pub total_mtco2e: f64,
}

/// Median of `values`; the mean of the two middle values for an even count.
pub fn median(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    Some(if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    })
}

/// Measures the tracked propane population in the baseline snapshot.
///
/// # Arguments
///
/// * `records` - Assessor snapshot for `year`.
/// * `heating_factor` - Share of a full heating load used by a tracked home.
///
/// An empty population yields zero totals rather than an error.
pub fn propane_baseline(
    records: &[AssessorPropertyRecord],
    year: i32,
    heating_factor: f64,
) -> PropaneBaseline {
    let heat_pump_count = records.iter().filter(|r| r.has_heat_pump()).count() as u32;

    let mut sqft: Vec<f64> = records
        .iter()
        .filter(|r| r.property_type == PropertyType::Taxable)
        .filter(|r| r.fuel == HeatingFuel::Propane)
        .filter(|r| PropertyCategory::classify(&r.state_class) == PropertyCategory::Residential)
        .filter_map(AssessorPropertyRecord::heated_sqft)
        .collect();
    let properties = sqft.len();
    let median_sqft = median(&mut sqft).unwrap_or(0.0);
    let per_property = heating_fuel_use(&HeatingFuel::Propane, median_sqft, false, heating_factor);

    PropaneBaseline {
        year,
        heat_pump_count,
        properties,
        median_sqft,
        heating_factor,
        total_gallons: per_property.gallons * properties as f64,
        total_mtco2e: per_property.mtco2e * properties as f64,
        per_property,
    }
}

/// Heat-pump locations for the single unobserved year between the baseline
/// and the first tracked year. Integer average, truncated.
pub fn interpolate_gap_year(baseline_count: u32, first_tracked: u32) -> u32 {
    ((u64::from(baseline_count) + u64::from(first_tracked)) / 2) as u32
}

/// Propane state for one year.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplacementRow {
    pub year: i32,
    pub source: CountSource,
    pub heat_pump_locations: u32,
    /// Cumulative since the baseline; negative if the count fell below it.
    pub conversions: i64,
    pub remaining_properties: i64,
    pub remaining_gallons: f64,
    pub remaining_mtco2e: f64,
    pub saved_gallons: f64,
    pub saved_mtco2e: f64,
    pub percent_reduction: f64,
}

fn displacement_row(baseline: &PropaneBaseline, year: i32, source: CountSource, locations: u32) -> DisplacementRow {
    let conversions = i64::from(locations) - i64::from(baseline.heat_pump_count);
    let saved_gallons = conversions as f64 * baseline.per_property.gallons;
    let saved_mtco2e = conversions as f64 * baseline.per_property.mtco2e;
    let percent_reduction = if conversions > 0 && baseline.properties > 0 {
        conversions as f64 / baseline.properties as f64 * 100.0
    } else {
        0.0
    };
    DisplacementRow {
        year,
        source,
        heat_pump_locations: locations,
        conversions,
        remaining_properties: baseline.properties as i64 - conversions,
        remaining_gallons: baseline.total_gallons - saved_gallons,
        remaining_mtco2e: baseline.total_mtco2e - saved_mtco2e,
        saved_gallons,
        saved_mtco2e,
        percent_reduction,
    }
}

/// Builds the year-by-year displacement table.
///
/// # Errors
///
/// Returns [`EstimationError::UnsupportedGap`] when the tracker starts more
/// than two years after the baseline, and
/// [`EstimationError::UnorderedTracker`] when tracker years do not strictly
/// increase. Tracker rows at or before the baseline year are ignored.
pub fn displacement_table(
    baseline: &PropaneBaseline,
    tracker: &[HeatPumpInstallationRecord],
) -> Result<Vec<DisplacementRow>, EstimationError> {
    if let Some(w) = tracker.windows(2).find(|w| w[1].year <= w[0].year) {
        return Err(EstimationError::UnorderedTracker {
            previous: w[0].year,
            current: w[1].year,
        });
    }

    let mut rows = vec![displacement_row(
        baseline,
        baseline.year,
        CountSource::AssessorSnapshot,
        baseline.heat_pump_count,
    )];

    let tracked: Vec<&HeatPumpInstallationRecord> = tracker
        .iter()
        .filter(|r| {
            let keep = r.year > baseline.year;
            if !keep {
                warn!(year = r.year, "ignoring tracker row at or before the baseline year");
            }
            keep
        })
        .collect();

    let Some(first) = tracked.first() else {
        return Ok(rows);
    };
    match first.year - baseline.year {
        1 => {}
        2 => {
            let interpolated = interpolate_gap_year(baseline.heat_pump_count, first.cumulative_locations);
            debug!(
                year = baseline.year + 1,
                locations = interpolated,
                "interpolated heat-pump locations"
            );
            rows.push(displacement_row(
                baseline,
                baseline.year + 1,
                CountSource::Interpolated,
                interpolated,
            ));
        }
        _ => {
            return Err(EstimationError::UnsupportedGap {
                baseline_year: baseline.year,
                first_tracked_year: first.year,
            });
        }
    }

    rows.extend(
        tracked
            .iter()
            .map(|r| displacement_row(baseline, r.year, CountSource::ProgramTracker, r.cumulative_locations)),
    );
    Ok(rows)
}

/// Oil and propane heating for one year.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FossilHeatingRow {
    pub year: i32,
    pub oil_mtco2e: f64,
    pub propane_mtco2e: f64,
    pub total_mtco2e: f64,
}

/// Adds a constant oil component to the remaining propane of each year.
///
/// Oil is not tracked for displacement, so its emissions stay flat.
pub fn fossil_heating_series(rows: &[DisplacementRow], oil_mtco2e: f64) -> Vec<FossilHeatingRow> {
    rows.iter()
        .map(|r| FossilHeatingRow {
            year: r.year,
            oil_mtco2e,
            propane_mtco2e: r.remaining_mtco2e,
            total_mtco2e: oil_mtco2e + r.remaining_mtco2e,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use rand::{Rng, SeedableRng, rngs::StdRng};

    use super::*;

    fn card(fuel: &str, sqft: Option<f64>, hvac: &str, class: &str) -> AssessorPropertyRecord {
        AssessorPropertyRecord {
            property_type: PropertyType::Taxable,
            net_sqft: sqft,
            fuel: HeatingFuel::from_code(fuel),
            hvac: hvac.to_string(),
            state_class: class.to_string(),
        }
    }

    fn tracked(year: i32, locations: u32) -> HeatPumpInstallationRecord {
        HeatPumpInstallationRecord {
            year,
            cumulative_installs: locations + 10,
            cumulative_locations: locations,
        }
    }

    fn baseline(heat_pump_count: u32, properties: usize) -> PropaneBaseline {
        let per_property = heating_fuel_use(&HeatingFuel::Propane, 1500.0, false, 1.0);
        PropaneBaseline {
            year: 2019,
            heat_pump_count,
            properties,
            median_sqft: 1500.0,
            heating_factor: 1.0,
            total_gallons: per_property.gallons * properties as f64,
            total_mtco2e: per_property.mtco2e * properties as f64,
            per_property,
        }
    }

    #[test]
    fn median_handles_odd_and_even() {
        assert_eq!(median(&mut [3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(&mut [4.0, 1.0, 2.0, 3.0]), Some(2.5));
        let mut empty: [f64; 0] = [];
        assert_eq!(median(&mut empty), None);
    }

    #[test]
    fn baseline_population_is_residential_propane_with_area() {
        let records = vec![
            card("GAS", Some(1000.0), "FORCED AIR", "SINGLE FAM"),
            card("GAS", Some(2000.0), "FORCED AIR", "SINGLE FAM"),
            card("GAS", Some(3000.0), "FORCED AIR", "SINGLE FAM"),
            card("GAS", Some(9000.0), "FORCED AIR", "MOTELS"),
            card("GAS", Some(9000.0), "FORCED AIR", "RETAIL"),
            card("GAS", None, "FORCED AIR", "SINGLE FAM"),
            card("OIL", Some(1000.0), "HEAT PUMP", "SINGLE FAM"),
            AssessorPropertyRecord {
                property_type: PropertyType::Exempt,
                ..card("ELECTRIC", None, "Heat Pump", "TOWN-PROP")
            },
        ];
        let b = propane_baseline(&records, 2019, 1.0);
        assert_eq!(b.heat_pump_count, 2);
        assert_eq!(b.properties, 3);
        assert_eq!(b.median_sqft, 2000.0);
        assert_relative_eq!(b.per_property.gallons, 780.0, epsilon = 1e-9);
        assert_relative_eq!(b.total_mtco2e, 3.0 * 780.0 * 0.00574, epsilon = 1e-9);
    }

    #[test]
    fn empty_population_yields_zeros() {
        let b = propane_baseline(&[], 2019, 1.0);
        assert_eq!(b.properties, 0);
        assert_eq!(b.total_mtco2e, 0.0);
        let rows = displacement_table(&b, &[tracked(2021, 5)]).unwrap();
        assert!(rows.iter().all(|r| r.percent_reduction == 0.0));
    }

    #[test]
    fn gap_year_is_truncated_integer_average() {
        assert_eq!(interpolate_gap_year(92, 165), 128);
        assert_eq!(interpolate_gap_year(92, 166), 129);
        assert_eq!(interpolate_gap_year(u32::MAX, u32::MAX), u32::MAX);
    }

    #[test]
    fn table_walks_snapshot_interpolation_then_tracker() {
        let b = baseline(92, 400);
        let rows = displacement_table(&b, &[tracked(2021, 165), tracked(2022, 210), tracked(2023, 260)]).unwrap();
        let years: Vec<i32> = rows.iter().map(|r| r.year).collect();
        assert_eq!(years, vec![2019, 2020, 2021, 2022, 2023]);
        assert_eq!(rows[0].source, CountSource::AssessorSnapshot);
        assert_eq!(rows[0].conversions, 0);
        assert_eq!(rows[1].source, CountSource::Interpolated);
        assert_eq!(rows[1].heat_pump_locations, 128);
        assert_eq!(rows[1].conversions, 36);
        assert_eq!(rows[4].conversions, 168);
        assert_eq!(rows[4].remaining_properties, 232);
        assert_relative_eq!(rows[4].percent_reduction, 42.0, epsilon = 1e-9);
    }

    #[test]
    fn tracker_starting_next_year_needs_no_interpolation() {
        let b = baseline(10, 100);
        let rows = displacement_table(&b, &[tracked(2020, 20)]).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].source, CountSource::ProgramTracker);
    }

    #[test]
    fn wider_gap_is_rejected() {
        let b = baseline(10, 100);
        let err = displacement_table(&b, &[tracked(2022, 20)]).unwrap_err();
        assert_eq!(
            err,
            EstimationError::UnsupportedGap {
                baseline_year: 2019,
                first_tracked_year: 2022
            }
        );
    }

    #[test]
    fn unordered_tracker_is_rejected() {
        let b = baseline(10, 100);
        let err = displacement_table(&b, &[tracked(2021, 30), tracked(2020, 20)]).unwrap_err();
        assert_eq!(
            err,
            EstimationError::UnorderedTracker {
                previous: 2021,
                current: 2020
            }
        );
        let dup = displacement_table(&b, &[tracked(2020, 20), tracked(2020, 25)]);
        assert!(dup.is_err());
    }

    #[test]
    fn count_below_baseline_clamps_percent() {
        let b = baseline(100, 50);
        let rows = displacement_table(&b, &[tracked(2021, 60)]).unwrap();
        let last = rows.last().unwrap();
        assert_eq!(last.conversions, -40);
        assert_eq!(last.percent_reduction, 0.0);
        assert_eq!(last.remaining_properties, 90);
        assert!(last.saved_mtco2e < 0.0);
    }

    #[test]
    fn conservation_and_monotonicity_hold_for_random_inputs() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let base_count: u32 = rng.random_range(0..500);
            let properties: usize = rng.random_range(0..2000);
            let b = baseline(base_count, properties);
            let start = 2019 + rng.random_range(1..=2);
            let mut locations = base_count;
            let tracker: Vec<HeatPumpInstallationRecord> = (0..rng.random_range(0..6))
                .map(|i| {
                    locations += rng.random_range(0..80);
                    tracked(start + i, locations)
                })
                .collect();

            let rows = displacement_table(&b, &tracker).unwrap();
            for r in &rows {
                assert_relative_eq!(
                    r.remaining_mtco2e + r.saved_mtco2e,
                    b.total_mtco2e,
                    epsilon = 1e-9,
                    max_relative = 1e-12
                );
                assert_eq!(r.conversions, i64::from(r.heat_pump_locations) - i64::from(base_count));
            }
            assert!(rows.windows(2).all(|w| w[0].conversions <= w[1].conversions));
        }
    }

    #[test]
    fn fossil_series_holds_oil_constant() {
        let b = baseline(10, 100);
        let rows = displacement_table(&b, &[tracked(2020, 30), tracked(2021, 50)]).unwrap();
        let series = fossil_heating_series(&rows, 250.0);
        assert!(series.iter().all(|r| r.oil_mtco2e == 250.0));
        assert!(series[2].total_mtco2e < series[0].total_mtco2e);
        assert_relative_eq!(series[0].total_mtco2e, 250.0 + b.total_mtco2e);
    }
}
