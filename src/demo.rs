//! Seeded synthetic town used by `--demo` and by tests.
//!
//! Shapes follow a small seasonal coastal town: mostly oil and propane
//! heat, a growing electric fleet, and steady solar additions. Identical
//! seeds give identical tables.

use chrono::NaiveDate;
use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::factors::HeatingFuel;
use crate::pipeline::InventoryTables;
use crate::records::{
    AssessorPropertyRecord, ElectricSector, ElectricityUsageRecord, EnergyBillingRecord,
    HeatPumpInstallationRecord, PropertyType, SolarCapacityRecord, VehicleRegistration,
};

/// Municipality name used by the demo tables.
pub const DEMO_MUNICIPALITY: &str = "Truro";

const FIRST_VEHICLE_YEAR: i32 = 2019;
const LAST_VEHICLE_YEAR: i32 = 2025;
const PROPERTIES: usize = 800;

const STATE_CLASSES: &[(&str, f64)] = &[
    ("SINGLE FAM", 0.78),
    ("CONDO", 0.08),
    ("MOTELS", 0.03),
    ("RESORT CONDO", 0.02),
    ("RESTAURANTS", 0.02),
    ("RETAIL", 0.02),
    ("VACANT LAND", 0.05),
];

const FUELS: &[(&str, f64)] = &[("OIL", 0.40), ("GAS", 0.38), ("ELECTRIC", 0.17), ("WOOD", 0.05)];

fn pick<'a>(rng: &mut StdRng, weighted: &[(&'a str, f64)]) -> &'a str {
    let total: f64 = weighted.iter().map(|(_, w)| w).sum();
    let mut x = rng.random::<f64>() * total;
    for &(label, w) in weighted {
        if x < w {
            return label;
        }
        x -= w;
    }
    weighted.last().map_or("", |&(label, _)| label)
}

fn quarter(year: i32, month: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(NaiveDate::MIN)
}

fn vehicles(rng: &mut StdRng) -> Vec<VehicleRegistration> {
    let base: &[(&str, f64, f64)] = &[
        ("Passenger Gasoline", 1900.0, -12.0),
        ("Light Commercial", 320.0, 2.0),
        ("Hybrid", 90.0, 14.0),
        ("Plug-in Hybrid", 12.0, 6.0),
        ("Diesel", 60.0, -1.0),
        ("Motorcycle Gasoline", 70.0, 0.5),
        ("Battery Electric", 8.0, 11.0),
    ];
    let mut out = Vec::new();
    for year in FIRST_VEHICLE_YEAR..=LAST_VEHICLE_YEAR {
        for month in [1, 4, 7, 10] {
            if year == LAST_VEHICLE_YEAR && month > 1 {
                break;
            }
            let t = f64::from(year - FIRST_VEHICLE_YEAR) + f64::from(month - 1) / 12.0;
            for &(vehicle_type, start, slope) in base {
                let noise = rng.random_range(-0.02..0.02_f64) * start;
                let count = (start + slope * t * 4.0 + noise).max(0.0).round() as u32;
                out.push(VehicleRegistration {
                    vehicle_type: vehicle_type.to_string(),
                    quarter: quarter(year, month),
                    count,
                });
            }
        }
    }
    out
}

fn municipal_energy(rng: &mut StdRng) -> Vec<EnergyBillingRecord> {
    let accounts: &[(&str, &str, f64)] = &[
        ("Electric", "Town Hall", 55.0),
        ("Electric", "Public Safety", 80.0),
        ("Electric", "Elementary School", 120.0),
        ("Heating Oil", "Town Hall", 30.0),
        ("Heating Oil", "Elementary School", 90.0),
        ("Propane", "Public Safety", 25.0),
        ("Diesel", "Public Works", 60.0),
        ("Solar Credit", "Town Hall", 0.0),
    ];
    let mut out = Vec::new();
    for fiscal_year in 2008..=2025 {
        let trend = 1.0 - 0.015 * f64::from(fiscal_year - 2008);
        for &(fuel, facility, base) in accounts {
            let mtco2e = base * trend * (1.0 + rng.random_range(-0.08..0.08_f64));
            out.push(EnergyBillingRecord {
                fiscal_year,
                account_fuel: fuel.to_string(),
                facility_category: facility.to_string(),
                mtco2e,
                mmbtu: mtco2e * 14.5,
                cost: mtco2e * 410.0,
            });
        }
    }
    out
}

fn assessors(rng: &mut StdRng) -> Vec<AssessorPropertyRecord> {
    (0..PROPERTIES)
        .map(|_| {
            let state_class = pick(rng, STATE_CLASSES);
            let exempt = rng.random::<f64>() < 0.04;
            let fuel = pick(rng, FUELS);
            let heat_pump = fuel == "ELECTRIC" && rng.random::<f64>() < 0.55;
            let net_sqft = match state_class {
                "VACANT LAND" => None,
                "MOTELS" => Some(rng.random_range(4_000.0..15_000.0_f64).round()),
                _ if rng.random::<f64>() < 0.03 => Some(0.0),
                _ => Some(rng.random_range(700.0..3_600.0_f64).round()),
            };
            AssessorPropertyRecord {
                property_type: if exempt {
                    PropertyType::Exempt
                } else {
                    PropertyType::Taxable
                },
                net_sqft,
                fuel: HeatingFuel::from_code(fuel),
                hvac: if heat_pump {
                    "HEAT PUMP".to_string()
                } else {
                    pick(rng, &[("FORCED AIR", 0.5), ("HOT WATER", 0.4), ("NONE", 0.1)]).to_string()
                },
                state_class: state_class.to_string(),
            }
        })
        .collect()
}

fn electricity(rng: &mut StdRng) -> Vec<ElectricityUsageRecord> {
    let mut out = Vec::new();
    for year in 2019..=2023 {
        let t = f64::from(year - 2019);
        out.push(ElectricityUsageRecord {
            year,
            sector: ElectricSector::Residential,
            electric_mwh: 21_000.0 + 450.0 * t + rng.random_range(-300.0..300.0_f64),
        });
        out.push(ElectricityUsageRecord {
            year,
            sector: ElectricSector::Commercial,
            electric_mwh: 9_500.0 + 120.0 * t + rng.random_range(-200.0..200.0_f64),
        });
    }
    out
}

fn heat_pumps(rng: &mut StdRng, baseline: u32) -> Vec<HeatPumpInstallationRecord> {
    let mut locations = baseline + rng.random_range(40..80);
    let mut installs = locations + rng.random_range(10..30);
    (2021..=2024)
        .map(|year| {
            let record = HeatPumpInstallationRecord {
                year,
                cumulative_installs: installs,
                cumulative_locations: locations,
            };
            let added = rng.random_range(25..60);
            locations += added;
            installs += added + rng.random_range(0..10);
            record
        })
        .collect()
}

fn solar(rng: &mut StdRng) -> Vec<SolarCapacityRecord> {
    let mut out = Vec::new();
    for city in [DEMO_MUNICIPALITY, "Wellfleet"] {
        let mut cumulative = 0.0;
        let mut projects = 0;
        let mut residential = 0.0;
        let mut residential_projects = 0;
        for year in 2012..=2024 {
            let added_projects: u32 = rng.random_range(1..12);
            let added = f64::from(added_projects) * rng.random_range(6.0..9.0_f64);
            let added_residential = added * 0.8;
            cumulative += added;
            projects += added_projects;
            residential += added_residential;
            residential_projects += added_projects.saturating_sub(1);
            out.push(SolarCapacityRecord {
                year,
                city: city.to_string(),
                cumulative_capacity_kw_dc: cumulative,
                cumulative_project_count: projects,
                annual_capacity_kw_dc: added,
                annual_project_count: added_projects,
                residential_cumulative_kw_dc: residential,
                residential_cumulative_projects: residential_projects,
                commercial_cumulative_kw_dc: cumulative - residential,
                municipal_cumulative_kw_dc: 0.0,
                other_cumulative_kw_dc: 0.0,
            });
        }
    }
    out
}

/// Builds a complete table set from `seed`.
pub fn demo_tables(seed: u64) -> InventoryTables {
    let mut rng = StdRng::seed_from_u64(seed);
    let assessors = assessors(&mut rng);
    let baseline_heat_pumps = assessors.iter().filter(|r| r.has_heat_pump()).count() as u32;
    InventoryTables {
        vehicle_factors: None,
        vehicles: Some(vehicles(&mut rng)),
        municipal_energy: Some(municipal_energy(&mut rng)),
        heat_pumps: Some(heat_pumps(&mut rng, baseline_heat_pumps)),
        assessors: Some(assessors),
        electricity: Some(electricity(&mut rng)),
        solar: Some(solar(&mut rng)),
    }
}
