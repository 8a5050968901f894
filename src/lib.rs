//! windsite - Select wind-turbine sites from terrain rasters and a boundary

pub mod config;
pub mod domain;
pub mod geometry;
pub mod output;
pub mod provider;
pub mod siting;
