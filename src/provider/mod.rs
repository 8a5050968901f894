//! Geospatial backend contract used by the siting core
//!
//! The core never touches raster storage or buffer geometry directly: it asks
//! a [`GeospatialProvider`] to mask, sample, aggregate, buffer and select.
//! [`GridProvider`] is the in-memory implementation used by the CLI.

pub mod ascii;
pub mod boundary;
pub mod error;
pub mod geotiff;
pub mod grid;
pub mod raster;
pub mod retry;

pub use ascii::read_ascii_grid;
pub use boundary::read_boundary;
pub use error::{ProviderError, ProviderResult};
pub use geotiff::read_geotiff;
pub use grid::{BufferZone, Grid, GridProvider, ZoneMetric};
pub use raster::read_raster;
pub use retry::RetryingProvider;

use geo::{LineString, MultiPolygon, Point};

use crate::domain::{CandidateId, CandidatePoint};
use crate::geometry::{Distance, SpatialReference};

/// A raster cell converted to a point, carrying the cell value
#[derive(Debug, Clone, PartialEq)]
pub struct RasterPoint {
    pub id: u64,
    pub position: Point<f64>,
    pub value: f64,
}

pub trait GeospatialProvider {
    /// Raster layer handle
    type Raster;
    /// Buffered area returned by the buffer operations
    type Zone;

    /// Fails with [`ProviderError::Unavailable`] when the backend cannot serve requests
    fn check_available(&self) -> ProviderResult<()>;

    fn spatial_reference(&self, raster: &Self::Raster) -> ProviderResult<SpatialReference>;

    /// Boundary polygons whose area is at least `min_area_m2`
    fn select_regions(
        &self,
        boundary: &MultiPolygon<f64>,
        min_area_m2: f64,
    ) -> ProviderResult<MultiPolygon<f64>>;

    /// Keep only cells inside `mask`
    fn extract_by_mask(
        &self,
        raster: &Self::Raster,
        mask: &MultiPolygon<f64>,
    ) -> ProviderResult<Self::Raster>;

    /// Keep only cells where `mask` has data
    fn extract_by_raster_mask(
        &self,
        raster: &Self::Raster,
        mask: &Self::Raster,
    ) -> ProviderResult<Self::Raster>;

    /// Keep only cells whose value satisfies `predicate`
    fn extract_by_attribute(
        &self,
        raster: &Self::Raster,
        predicate: &dyn Fn(f64) -> bool,
    ) -> ProviderResult<Self::Raster>;

    fn raster_to_points(&self, raster: &Self::Raster) -> ProviderResult<Vec<RasterPoint>>;

    /// `None` means NoData at `point`
    fn sample_value(&self, raster: &Self::Raster, point: Point<f64>) -> ProviderResult<Option<f64>>;

    fn zonal_min(&self, raster: &Self::Raster, zone: &Self::Zone) -> ProviderResult<f64>;

    fn zonal_max(&self, raster: &Self::Raster, zone: &Self::Zone) -> ProviderResult<f64>;

    fn buffer_point(&self, point: Point<f64>, distance: Distance) -> ProviderResult<Self::Zone>;

    fn buffer_line(&self, line: &LineString<f64>, distance: Distance) -> ProviderResult<Self::Zone>;

    /// Ids of `points` intersecting any of `zones`
    fn select_intersecting(
        &self,
        points: &[CandidatePoint],
        zones: &[Self::Zone],
    ) -> ProviderResult<Vec<CandidateId>>;
}
