//! Estimators. Every function here is pure over already-loaded tables.

pub mod assessor;
pub mod buildings;
pub mod displacement;
pub mod municipal;
pub mod rollup;
pub mod savings;
pub mod solar;
pub mod vehicles;
