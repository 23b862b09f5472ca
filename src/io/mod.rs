//! Reading source tables and writing derived ones.

pub mod cache;
pub mod directory;
pub mod export;
pub mod load;

pub use directory::DataDirectory;
