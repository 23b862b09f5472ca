//! CSV export for derived tables.
//!
//! Every table writes one header row followed by one row per record with
//! fixed decimal places, so identical inputs give byte-identical files.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::estimate::displacement::DisplacementRow;
use crate::estimate::municipal::FuelSplitYear;
use crate::estimate::rollup::{RollupRow, Sector};
use crate::estimate::savings::SavingsYear;
use crate::estimate::vehicles::VehicleYear;
use crate::pipeline::InventoryReport;

const SAVINGS_HEADER: &str = "year,conversions,heat_pump_mtco2e,heat_pump_incremental_mtco2e,\
                              bev_count,phev_count,ev_mtco2e,solar_capacity_added_kw_dc,\
                              solar_mwh,solar_mtco2e,total_mtco2e";

const DISPLACEMENT_HEADER: &str = "year,source,heat_pump_locations,conversions,remaining_properties,\
                                   remaining_gallons,remaining_mtco2e,saved_gallons,saved_mtco2e,\
                                   percent_reduction";

const VEHICLES_HEADER: &str = "year,vehicle_count,tco2e,adjusted_tco2e,bev_count,phev_count";

const MUNICIPAL_HEADER: &str = "fiscal_year,electric_mtco2e,other_fuel_mtco2e,electric_mmbtu,other_fuel_mmbtu";

fn writer(writer: impl Write) -> csv::Writer<impl Write> {
    csv::WriterBuilder::new().from_writer(writer)
}

fn header(header: &str) -> impl Iterator<Item = &str> {
    header.split(',').map(str::trim)
}

/// Writes the sector rollup. Each sector has a value column and an
/// `_estimated` flag column.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_rollup_csv(rows: &[RollupRow], out: impl Write) -> io::Result<()> {
    let mut wtr = writer(out);
    let mut columns = vec!["year".to_string()];
    for sector in Sector::ALL {
        columns.push(sector.label().to_string());
        columns.push(format!("{}_estimated", sector.label()));
    }
    columns.push("total".to_string());
    wtr.write_record(&columns)?;

    for r in rows {
        let mut record = vec![r.year.to_string()];
        for sector in Sector::ALL {
            record.push(format!("{:.3}", r.value(sector)));
            record.push(r.is_estimated(sector).to_string());
        }
        record.push(format!("{:.3}", r.total));
        wtr.write_record(&record)?;
    }
    wtr.flush()
}

/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_savings_csv(rows: &[SavingsYear], out: impl Write) -> io::Result<()> {
    let mut wtr = writer(out);
    wtr.write_record(header(SAVINGS_HEADER))?;
    for r in rows {
        wtr.write_record(&[
            r.year.to_string(),
            r.conversions.to_string(),
            format!("{:.3}", r.heat_pump_mtco2e),
            format!("{:.3}", r.heat_pump_incremental_mtco2e),
            r.bev_count.to_string(),
            r.phev_count.to_string(),
            format!("{:.3}", r.ev_mtco2e),
            format!("{:.1}", r.solar_capacity_added_kw_dc),
            format!("{:.1}", r.solar_mwh),
            format!("{:.3}", r.solar_mtco2e),
            format!("{:.3}", r.total_mtco2e),
        ])?;
    }
    wtr.flush()
}

/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_displacement_csv(rows: &[DisplacementRow], out: impl Write) -> io::Result<()> {
    let mut wtr = writer(out);
    wtr.write_record(header(DISPLACEMENT_HEADER))?;
    for r in rows {
        wtr.write_record(&[
            r.year.to_string(),
            r.source.to_string(),
            r.heat_pump_locations.to_string(),
            r.conversions.to_string(),
            r.remaining_properties.to_string(),
            format!("{:.1}", r.remaining_gallons),
            format!("{:.3}", r.remaining_mtco2e),
            format!("{:.1}", r.saved_gallons),
            format!("{:.3}", r.saved_mtco2e),
            format!("{:.2}", r.percent_reduction),
        ])?;
    }
    wtr.flush()
}

/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_vehicles_csv(rows: &[VehicleYear], out: impl Write) -> io::Result<()> {
    let mut wtr = writer(out);
    wtr.write_record(header(VEHICLES_HEADER))?;
    for r in rows {
        wtr.write_record(&[
            r.year.to_string(),
            r.vehicle_count.to_string(),
            format!("{:.2}", r.tco2e),
            format!("{:.2}", r.adjusted_tco2e),
            r.bev_count.to_string(),
            r.phev_count.to_string(),
        ])?;
    }
    wtr.flush()
}

/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_municipal_csv(rows: &[FuelSplitYear], out: impl Write) -> io::Result<()> {
    let mut wtr = writer(out);
    wtr.write_record(header(MUNICIPAL_HEADER))?;
    for r in rows {
        wtr.write_record(&[
            r.year.to_string(),
            format!("{:.3}", r.electric_mtco2e),
            format!("{:.3}", r.other_fuel_mtco2e),
            format!("{:.1}", r.electric_mmbtu),
            format!("{:.1}", r.other_fuel_mmbtu),
        ])?;
    }
    wtr.flush()
}

fn export_file(
    dir: &Path,
    name: &str,
    write: impl FnOnce(io::BufWriter<File>) -> io::Result<()>,
) -> io::Result<PathBuf> {
    let path = dir.join(name);
    write(io::BufWriter::new(File::create(&path)?))?;
    Ok(path)
}

/// Writes every derived table into `dir`, creating it if needed.
///
/// # Arguments
///
/// * `report` - Finished inventory report
/// * `dir` - Output directory
///
/// # Returns
///
/// Paths of the files written.
///
/// # Errors
///
/// Returns an `io::Error` if the directory or any file cannot be written.
pub fn export_report(report: &InventoryReport, dir: &Path) -> io::Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)?;
    Ok(vec![
        export_file(dir, "rollup.csv", |w| write_rollup_csv(&report.rollup, w))?,
        export_file(dir, "savings.csv", |w| write_savings_csv(&report.savings, w))?,
        export_file(dir, "displacement.csv", |w| {
            write_displacement_csv(&report.displacement, w)
        })?,
        export_file(dir, "vehicles.csv", |w| {
            write_vehicles_csv(&report.vehicles.yearly, w)
        })?,
        export_file(dir, "municipal.csv", |w| {
            write_municipal_csv(&report.municipal.split, w)
        })?,
    ])
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::estimate::displacement::CountSource;

    fn rollup_row(year: i32, estimated: bool) -> RollupRow {
        let values: BTreeMap<Sector, f64> = Sector::ALL.iter().map(|s| (*s, 1.25)).collect();
        RollupRow {
            year,
            total: 7.5,
            values,
            estimated: if estimated {
                vec![Sector::ResidentialHeating]
            } else {
                Vec::new()
            },
        }
    }

    fn lines(buf: Vec<u8>) -> Vec<String> {
        String::from_utf8(buf)
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn rollup_header_lists_every_sector() {
        let mut buf = Vec::new();
        write_rollup_csv(&[rollup_row(2023, false), rollup_row(2024, true)], &mut buf).ok();
        let lines = lines(buf);
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("year,vehicles,vehicles_estimated,municipal_electric"));
        assert!(lines[0].ends_with("commercial_electricity_estimated,total"));
        assert!(lines[2].contains("1.250,true"));
        assert!(lines[1].ends_with(",7.500"));
    }

    #[test]
    fn displacement_rows_carry_source() {
        let row = DisplacementRow {
            year: 2020,
            source: CountSource::Interpolated,
            heat_pump_locations: 128,
            conversions: 36,
            remaining_properties: 364,
            remaining_gallons: 1.0,
            remaining_mtco2e: 1.0,
            saved_gallons: 1.0,
            saved_mtco2e: 1.0,
            percent_reduction: 9.0,
        };
        let mut buf = Vec::new();
        write_displacement_csv(&[row], &mut buf).ok();
        let lines = lines(buf);
        assert_eq!(lines[1], "2020,interpolated,128,36,364,1.0,1.000,1.0,1.000,9.00");
    }

    #[test]
    fn header_constants_have_no_padding() {
        let mut buf = Vec::new();
        write_savings_csv(&[], &mut buf).ok();
        let lines = lines(buf);
        assert_eq!(lines.len(), 1);
        assert!(!lines[0].contains(' '));
        assert_eq!(lines[0].split(',').count(), 11);
    }

    #[test]
    fn deterministic_output() {
        let rows = vec![rollup_row(2021, false), rollup_row(2022, true)];
        let mut buf1 = Vec::new();
        let mut buf2 = Vec::new();
        write_rollup_csv(&rows, &mut buf1).ok();
        write_rollup_csv(&rows, &mut buf2).ok();
        assert_eq!(buf1, buf2);
    }
}
