//! Municipal building energy from metered utility bills.
//!
//! Billing rows already carry converted emissions, so this module only
//! filters and sums.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use crate::records::EnergyBillingRecord;

/// Fiscal years kept in a municipal view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FiscalWindow {
    /// Oldest fiscal year kept, if any.
    pub floor_year: Option<i32>,
    /// First incomplete fiscal year; it and later years are dropped.
    pub incomplete_year: i32,
}

impl FiscalWindow {
    pub fn contains(&self, fiscal_year: i32) -> bool {
        fiscal_year < self.incomplete_year && self.floor_year.is_none_or(|floor| fiscal_year >= floor)
    }
}

/// Summed billing totals for one fiscal year.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MunicipalTotals {
    pub year: i32,
    pub mtco2e: f64,
    pub mmbtu: f64,
    pub cost: f64,
}

impl MunicipalTotals {
    fn empty(year: i32) -> Self {
        Self {
            year,
            mtco2e: 0.0,
            mmbtu: 0.0,
            cost: 0.0,
        }
    }

    fn add(&mut self, record: &EnergyBillingRecord) {
        self.mtco2e += record.mtco2e;
        self.mmbtu += record.mmbtu;
        self.cost += record.cost;
    }
}

fn in_window<'a>(
    records: &'a [EnergyBillingRecord],
    window: FiscalWindow,
) -> impl Iterator<Item = &'a EnergyBillingRecord> {
    records.iter().filter(move |r| window.contains(r.fiscal_year))
}

/// Totals per fiscal year, ascending.
pub fn yearly_totals(records: &[EnergyBillingRecord], window: FiscalWindow) -> Vec<MunicipalTotals> {
    let mut by_year: BTreeMap<i32, MunicipalTotals> = BTreeMap::new();
    for r in in_window(records, window) {
        by_year
            .entry(r.fiscal_year)
            .or_insert_with(|| MunicipalTotals::empty(r.fiscal_year))
            .add(r);
    }
    by_year.into_values().collect()
}

/// Yearly totals for one fuel or facility category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupSeries {
    pub group: String,
    pub years: Vec<MunicipalTotals>,
}

impl GroupSeries {
    pub fn total_mtco2e(&self) -> f64 {
        self.years.iter().map(|y| y.mtco2e).sum()
    }
}

fn grouped_totals<F>(records: &[EnergyBillingRecord], window: FiscalWindow, key: F) -> Vec<GroupSeries>
where
    F: Fn(&EnergyBillingRecord) -> &str,
{
    let mut groups: BTreeMap<String, BTreeMap<i32, MunicipalTotals>> = BTreeMap::new();
    for r in in_window(records, window) {
        groups
            .entry(key(r).to_string())
            .or_default()
            .entry(r.fiscal_year)
            .or_insert_with(|| MunicipalTotals::empty(r.fiscal_year))
            .add(r);
    }
    groups
        .into_iter()
        .map(|(group, years)| GroupSeries {
            group,
            years: years.into_values().collect(),
        })
        .collect()
}

/// Per-fuel series. Fuels whose emissions sum to zero over the window are
/// left out.
pub fn totals_by_fuel(records: &[EnergyBillingRecord], window: FiscalWindow) -> Vec<GroupSeries> {
    grouped_totals(records, window, |r| r.account_fuel.as_str())
        .into_iter()
        .filter(|s| s.total_mtco2e() > 0.0)
        .collect()
}

/// Per-facility series, zero-total facilities included.
pub fn totals_by_facility(records: &[EnergyBillingRecord], window: FiscalWindow) -> Vec<GroupSeries> {
    grouped_totals(records, window, |r| r.facility_category.as_str())
}

/// Building electricity separated from combustion fuels for one year.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FuelSplitYear {
    pub year: i32,
    pub electric_mtco2e: f64,
    pub other_fuel_mtco2e: f64,
    pub electric_mmbtu: f64,
    pub other_fuel_mmbtu: f64,
}

/// Partitions `account_fuel == "Electric"` from every other fuel, per year.
pub fn electric_split(records: &[EnergyBillingRecord], window: FiscalWindow) -> Vec<FuelSplitYear> {
    let mut by_year: BTreeMap<i32, FuelSplitYear> = BTreeMap::new();
    for r in in_window(records, window) {
        let entry = by_year.entry(r.fiscal_year).or_insert(FuelSplitYear {
            year: r.fiscal_year,
            electric_mtco2e: 0.0,
            other_fuel_mtco2e: 0.0,
            electric_mmbtu: 0.0,
            other_fuel_mmbtu: 0.0,
        });
        if r.is_electric() {
            entry.electric_mtco2e += r.mtco2e;
            entry.electric_mmbtu += r.mmbtu;
        } else {
            entry.other_fuel_mtco2e += r.mtco2e;
            entry.other_fuel_mmbtu += r.mmbtu;
        }
    }
    by_year.into_values().collect()
}

/// Most recent fiscal year compared with the one before it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LatestFiscalYear {
    pub year: i32,
    pub mtco2e: f64,
    pub mmbtu: f64,
    pub previous_year: Option<i32>,
    pub delta_mtco2e: f64,
    pub delta_mmbtu: f64,
}

/// Compares the last two entries of an ascending yearly series.
pub fn latest_fiscal_year(totals: &[MunicipalTotals]) -> Option<LatestFiscalYear> {
    let (latest, rest) = totals.split_last()?;
    let previous = rest.last();
    Some(LatestFiscalYear {
        year: latest.year,
        mtco2e: latest.mtco2e,
        mmbtu: latest.mmbtu,
        previous_year: previous.map(|p| p.year),
        delta_mtco2e: previous.map_or(0.0, |p| latest.mtco2e - p.mtco2e),
        delta_mmbtu: previous.map_or(0.0, |p| latest.mmbtu - p.mmbtu),
    })
}

/// Everything the municipal energy view shows.
#[derive(Debug, Clone, Serialize)]
pub struct MunicipalReport {
    pub window: FiscalWindow,
    pub yearly: Vec<MunicipalTotals>,
    pub by_fuel: Vec<GroupSeries>,
    pub by_facility: Vec<GroupSeries>,
    pub split: Vec<FuelSplitYear>,
    pub latest: Option<LatestFiscalYear>,
}

/// Builds every municipal view for rows inside `window`.
pub fn municipal_report(records: &[EnergyBillingRecord], window: FiscalWindow) -> MunicipalReport {
    let dropped = records.iter().filter(|r| !window.contains(r.fiscal_year)).count();
    if dropped > 0 {
        debug!(dropped, "billing rows outside the fiscal window");
    }
    let yearly = yearly_totals(records, window);
    MunicipalReport {
        window,
        by_fuel: totals_by_fuel(records, window),
        by_facility: totals_by_facility(records, window),
        split: electric_split(records, window),
        latest: latest_fiscal_year(&yearly),
        yearly,
    }
}
