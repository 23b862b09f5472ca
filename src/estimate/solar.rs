//! Installed solar capacity for one municipality.

use serde::Serialize;
use tracing::warn;

use crate::factors::ELECTRICITY_TCO2E_PER_MWH;
use crate::records::SolarCapacityRecord;

/// Rows for `city` with positive cumulative capacity, ascending by year.
///
/// The city match ignores surrounding whitespace and case.
pub fn municipality_series(records: &[SolarCapacityRecord], city: &str) -> Vec<SolarCapacityRecord> {
    let city = city.trim();
    let mut series: Vec<SolarCapacityRecord> = records
        .iter()
        .filter(|r| r.city.trim().eq_ignore_ascii_case(city))
        .filter(|r| r.cumulative_capacity_kw_dc > 0.0)
        .cloned()
        .collect();
    series.sort_by_key(|r| r.year);
    series
}

/// Capacity and projects added in one year.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SolarAddition {
    pub year: i32,
    pub capacity_kw_dc: f64,
    pub projects: u32,
}

/// Cumulative capacity split by installation type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CapacityByType {
    pub residential_kw_dc: f64,
    pub commercial_kw_dc: f64,
    pub municipal_kw_dc: f64,
    pub other_kw_dc: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SolarSummary {
    pub latest_year: i32,
    pub cumulative_kw_dc: f64,
    pub cumulative_projects: u32,
    pub average_project_kw_dc: Option<f64>,
    pub residential_share_percent: f64,
    pub by_type: CapacityByType,
    /// Years with a positive addition only.
    pub additions: Vec<SolarAddition>,
}

/// Summarises a series produced by [`municipality_series`].
pub fn solar_summary(series: &[SolarCapacityRecord]) -> Option<SolarSummary> {
    let latest = series.last()?;
    Some(SolarSummary {
        latest_year: latest.year,
        cumulative_kw_dc: latest.cumulative_capacity_kw_dc,
        cumulative_projects: latest.cumulative_project_count,
        average_project_kw_dc: (latest.cumulative_project_count > 0)
            .then(|| latest.cumulative_capacity_kw_dc / f64::from(latest.cumulative_project_count)),
        residential_share_percent: latest.residential_cumulative_kw_dc / latest.cumulative_capacity_kw_dc
            * 100.0,
        by_type: CapacityByType {
            residential_kw_dc: latest.residential_cumulative_kw_dc,
            commercial_kw_dc: latest.commercial_cumulative_kw_dc,
            municipal_kw_dc: latest.municipal_cumulative_kw_dc,
            other_kw_dc: latest.other_cumulative_kw_dc,
        },
        additions: series
            .iter()
            .filter(|r| r.annual_capacity_kw_dc > 0.0)
            .map(|r| SolarAddition {
                year: r.year,
                capacity_kw_dc: r.annual_capacity_kw_dc,
                projects: r.annual_project_count,
            })
            .collect(),
    })
}

/// Grid electricity displaced by capacity added since the baseline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SolarSavingsYear {
    pub year: i32,
    pub capacity_added_kw_dc: f64,
    pub annual_mwh: f64,
    pub mtco2e: f64,
}

/// Savings for every year from `baseline_year` on.
///
/// Capacity installed up to the baseline year is excluded. The series is
/// cumulative, so the baseline is the latest row at or before
/// `baseline_year`; with no such row it is zero.
pub fn solar_savings(
    series: &[SolarCapacityRecord],
    baseline_year: i32,
    mwh_per_kw: f64,
) -> Vec<SolarSavingsYear> {
    let baseline_kw = match series.iter().filter(|r| r.year <= baseline_year).max_by_key(|r| r.year) {
        Some(r) => r.cumulative_capacity_kw_dc,
        None => {
            if !series.is_empty() {
                warn!(baseline_year, "no solar capacity at or before baseline year, using zero");
            }
            0.0
        }
    };
    series
        .iter()
        .filter(|r| r.year >= baseline_year)
        .map(|r| {
            let capacity_added_kw_dc = r.cumulative_capacity_kw_dc - baseline_kw;
            let annual_mwh = capacity_added_kw_dc * mwh_per_kw;
            SolarSavingsYear {
                year: r.year,
                capacity_added_kw_dc,
                annual_mwh,
                mtco2e: annual_mwh * ELECTRICITY_TCO2E_PER_MWH,
            }
        })
        .collect()
}
