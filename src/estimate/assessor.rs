//! Descriptive profile of the assessor snapshot.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::records::AssessorPropertyRecord;

/// Square footage and property count for one label.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelTotals {
    pub label: String,
    pub properties: usize,
    pub sqft: f64,
}

/// One non-empty cell of the HVAC by fuel matrix.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatrixCell {
    pub hvac: String,
    pub fuel: String,
    pub sqft: f64,
}

/// Square footage breakdowns over every property with a positive area,
/// regardless of property type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssessorProfile {
    pub total_properties: usize,
    pub properties_with_sqft: usize,
    pub total_sqft: f64,
    pub average_sqft: f64,
    /// Sorted by square footage, largest first.
    pub by_hvac: Vec<LabelTotals>,
    /// Sorted by square footage, largest first.
    pub by_fuel: Vec<LabelTotals>,
    pub hvac_fuel_matrix: Vec<MatrixCell>,
    pub most_common_hvac: Option<String>,
    pub most_common_fuel: Option<String>,
    pub heat_pump_properties: usize,
}

fn totals(map: BTreeMap<String, (usize, f64)>) -> Vec<LabelTotals> {
    let mut out: Vec<LabelTotals> = map
        .into_iter()
        .map(|(label, (properties, sqft))| LabelTotals {
            label,
            properties,
            sqft,
        })
        .collect();
    out.sort_by(|a, b| b.sqft.total_cmp(&a.sqft).then_with(|| a.label.cmp(&b.label)));
    out
}

/// Highest count wins; ties go to the alphabetically first label.
fn most_common(totals: &[LabelTotals]) -> Option<String> {
    totals
        .iter()
        .min_by(|a, b| b.properties.cmp(&a.properties).then_with(|| a.label.cmp(&b.label)))
        .map(|t| t.label.clone())
}

/// Counts and floor area by HVAC type and by fuel over cards with heated
/// area, plus their cross-tab.
pub fn assessor_profile(records: &[AssessorPropertyRecord]) -> AssessorProfile {
    let mut hvac: BTreeMap<String, (usize, f64)> = BTreeMap::new();
    let mut fuel: BTreeMap<String, (usize, f64)> = BTreeMap::new();
    let mut matrix: BTreeMap<(String, String), f64> = BTreeMap::new();
    let mut with_sqft = 0;
    let mut total_sqft = 0.0;
    let mut heat_pumps = 0;

    for r in records {
        let Some(sqft) = r.heated_sqft() else {
            continue;
        };
        with_sqft += 1;
        total_sqft += sqft;
        if r.has_heat_pump() {
            heat_pumps += 1;
        }
        let h = hvac.entry(r.hvac.clone()).or_default();
        h.0 += 1;
        h.1 += sqft;
        let f = fuel.entry(r.fuel.code().to_string()).or_default();
        f.0 += 1;
        f.1 += sqft;
        *matrix
            .entry((r.hvac.clone(), r.fuel.code().to_string()))
            .or_default() += sqft;
    }

    let by_hvac = totals(hvac);
    let by_fuel = totals(fuel);
    AssessorProfile {
        total_properties: records.len(),
        properties_with_sqft: with_sqft,
        total_sqft,
        average_sqft: if with_sqft > 0 {
            total_sqft / with_sqft as f64
        } else {
            0.0
        },
        most_common_hvac: most_common(&by_hvac),
        most_common_fuel: most_common(&by_fuel),
        by_hvac,
        by_fuel,
        hvac_fuel_matrix: matrix
            .into_iter()
            .map(|((hvac, fuel), sqft)| MatrixCell { hvac, fuel, sqft })
            .collect(),
        heat_pump_properties: heat_pumps,
    }
}
