//! Municipal greenhouse-gas inventory estimator.
//!
//! Loads public source tables, estimates emissions per sector, and rolls
//! them into one inventory with savings attributed to heat pumps, electric
//! vehicles and solar.

#[cfg(feature = "api")]
pub mod api;
pub mod cli;
pub mod config;
pub mod demo;
pub mod error;
/// Per-sector estimators and the cross-sector rollup.
pub mod estimate;
pub mod factors;
pub mod io;
pub mod logging;
pub mod pipeline;
pub mod records;
