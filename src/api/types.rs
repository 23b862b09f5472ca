//! API response and query types.

use serde::{Deserialize, Serialize};

use crate::estimate::rollup::RollupRow;
use crate::estimate::savings::SavingsSummary;
use crate::estimate::solar::SolarSummary;
use crate::pipeline::InventoryReport;

/// Headline figures for the report.
#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub municipality: String,
    pub baseline_year: i32,
    /// Latest year in the rollup.
    pub latest_year: Option<i32>,
    /// Rollup total for `latest_year` (mtCO2e).
    pub latest_total_mtco2e: Option<f64>,
    /// Sectors carried forward in `latest_year`.
    pub estimated_sectors: Vec<String>,
    pub savings: Option<SavingsSummary>,
    pub solar: Option<SolarSummary>,
}

impl From<&InventoryReport> for SummaryResponse {
    fn from(report: &InventoryReport) -> Self {
        let latest: Option<&RollupRow> = report.latest_rollup();
        Self {
            municipality: report.municipality.clone(),
            baseline_year: report.baseline_year,
            latest_year: latest.map(|r| r.year),
            latest_total_mtco2e: latest.map(|r| r.total),
            estimated_sectors: latest
                .map(|r| r.estimated.iter().map(|s| s.label().to_string()).collect())
                .unwrap_or_default(),
            savings: report.savings_summary.clone(),
            solar: report.solar.clone(),
        }
    }
}

/// Optional inclusive year range for `/rollup`.
#[derive(Debug, Deserialize)]
pub struct RollupQuery {
    pub from: Option<i32>,
    pub to: Option<i32>,
}

/// Error response body for 400-class errors.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
