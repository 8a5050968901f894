//! Call-counting provider for exercising the siting core without rasters

use geo::{LineString, MultiPolygon, Point};
use std::cell::Cell;

use super::{SiteValidator, WakeCorridorAnalyzer};
use crate::config::{ProviderConfig, SitingConfig};
use crate::domain::{CandidateId, CandidatePoint};
use crate::geometry::{Distance, Frame, LinearUnit, SpatialReference};
use crate::provider::{
    BufferZone, GeospatialProvider, ProviderError, ProviderResult, RasterPoint, RetryingProvider,
    ZoneMetric,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockLayer {
    Dem,
    Slope,
}

type Surface = Box<dyn Fn(Point<f64>) -> Option<f64>>;

/// Terrain defined by closures in a projected-feet frame.
///
/// Zonal statistics ignore the rasters and return the configured
/// `(min, max)` for the zone centre.
pub struct MockProvider {
    dem: Surface,
    slope: Surface,
    zone: Box<dyn Fn(Point<f64>) -> (f64, f64)>,
    available: bool,
    fail_zonal_after: Option<usize>,
    select_all_after: Option<usize>,
    sample_calls: Cell<usize>,
    zonal_calls: Cell<usize>,
    select_calls: Cell<usize>,
}

impl MockProvider {
    /// Level ground at `elevation` with 1% slope everywhere
    pub fn flat(elevation: f64) -> Self {
        Self {
            dem: Box::new(move |_| Some(elevation)),
            slope: Box::new(|_| Some(1.0)),
            zone: Box::new(move |_| (elevation, elevation)),
            available: true,
            fail_zonal_after: None,
            select_all_after: None,
            sample_calls: Cell::new(0),
            zonal_calls: Cell::new(0),
            select_calls: Cell::new(0),
        }
    }

    pub fn with_dem(mut self, dem: impl Fn(Point<f64>) -> Option<f64> + 'static) -> Self {
        self.dem = Box::new(dem);
        self
    }

    pub fn with_slope(mut self, slope: impl Fn(Point<f64>) -> Option<f64> + 'static) -> Self {
        self.slope = Box::new(slope);
        self
    }

    pub fn with_zone(mut self, min: f64, max: f64) -> Self {
        self.zone = Box::new(move |_| (min, max));
        self
    }

    pub fn with_zone_fn(mut self, zone: impl Fn(Point<f64>) -> (f64, f64) + 'static) -> Self {
        self.zone = Box::new(zone);
        self
    }

    pub fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }

    /// Fail every zonal call after the first `calls`
    pub fn failing_zonal_after(mut self, calls: usize) -> Self {
        self.fail_zonal_after = Some(calls);
        self
    }

    /// Report every point as intersecting after the first `calls` selections
    pub fn selecting_all_after(mut self, calls: usize) -> Self {
        self.select_all_after = Some(calls);
        self
    }

    pub fn sample_calls(&self) -> usize {
        self.sample_calls.get()
    }

    pub fn zonal_calls(&self) -> usize {
        self.zonal_calls.get()
    }

    pub fn select_calls(&self) -> usize {
        self.select_calls.get()
    }

    /// A candidate at (x, y) with the mock DEM elevation and 1% slope
    pub fn candidate(&self, id: u64, x: f64, y: f64) -> CandidatePoint {
        let position = Point::new(x, y);
        CandidatePoint::new(id, position, (self.dem)(position).unwrap_or(0.0), 1.0)
    }

    pub fn analyzer<'a>(
        &'a self,
        retry: &'a ProviderConfig,
        config: &'a SitingConfig,
    ) -> WakeCorridorAnalyzer<'a, MockProvider> {
        WakeCorridorAnalyzer::new(
            RetryingProvider::new(self, retry),
            &MockLayer::Dem,
            &MockLayer::Slope,
            config,
            Frame::Projected(LinearUnit::Feet),
        )
    }

    pub fn validator<'a>(
        &'a self,
        retry: &'a ProviderConfig,
        config: &'a SitingConfig,
    ) -> SiteValidator<'a, MockProvider> {
        SiteValidator::new(
            RetryingProvider::new(self, retry),
            &MockLayer::Dem,
            &MockLayer::Slope,
            config,
            Frame::Projected(LinearUnit::Feet),
        )
    }

    fn zonal(&self, zone: &BufferZone) -> ProviderResult<(f64, f64)> {
        let calls = self.zonal_calls.get() + 1;
        self.zonal_calls.set(calls);
        if let Some(limit) = self.fail_zonal_after
            && calls > limit
        {
            return Err(ProviderError::call("zonal_statistics", "raster backend crashed"));
        }
        match zone {
            BufferZone::Disk { center, .. } => Ok((self.zone)(*center)),
            BufferZone::Corridor { .. } => {
                Err(ProviderError::call("zonal_statistics", "corridor zones unsupported"))
            }
        }
    }
}

fn unsupported<T>(operation: &'static str) -> ProviderResult<T> {
    Err(ProviderError::call(operation, "not supported by the mock provider"))
}

impl GeospatialProvider for MockProvider {
    type Raster = MockLayer;
    type Zone = BufferZone;

    fn check_available(&self) -> ProviderResult<()> {
        if self.available {
            Ok(())
        } else {
            Err(ProviderError::Unavailable("spatial analyst license not available".into()))
        }
    }

    fn spatial_reference(&self, _raster: &MockLayer) -> ProviderResult<SpatialReference> {
        Ok(SpatialReference::projected(LinearUnit::Feet))
    }

    fn select_regions(&self, _: &MultiPolygon<f64>, _: f64) -> ProviderResult<MultiPolygon<f64>> {
        unsupported("select_regions")
    }

    fn extract_by_mask(&self, _: &MockLayer, _: &MultiPolygon<f64>) -> ProviderResult<MockLayer> {
        unsupported("extract_by_mask")
    }

    fn extract_by_raster_mask(&self, _: &MockLayer, _: &MockLayer) -> ProviderResult<MockLayer> {
        unsupported("extract_by_raster_mask")
    }

    fn extract_by_attribute(
        &self,
        _: &MockLayer,
        _: &dyn Fn(f64) -> bool,
    ) -> ProviderResult<MockLayer> {
        unsupported("extract_by_attribute")
    }

    fn raster_to_points(&self, _: &MockLayer) -> ProviderResult<Vec<RasterPoint>> {
        unsupported("raster_to_points")
    }

    fn sample_value(&self, raster: &MockLayer, point: Point<f64>) -> ProviderResult<Option<f64>> {
        self.sample_calls.set(self.sample_calls.get() + 1);
        Ok(match raster {
            MockLayer::Dem => (self.dem)(point),
            MockLayer::Slope => (self.slope)(point),
        })
    }

    fn zonal_min(&self, _raster: &MockLayer, zone: &BufferZone) -> ProviderResult<f64> {
        self.zonal(zone).map(|(min, _)| min)
    }

    fn zonal_max(&self, _raster: &MockLayer, zone: &BufferZone) -> ProviderResult<f64> {
        self.zonal(zone).map(|(_, max)| max)
    }

    fn buffer_point(&self, point: Point<f64>, distance: Distance) -> ProviderResult<BufferZone> {
        Ok(BufferZone::Disk {
            center: point,
            radius: LinearUnit::Feet.from_meters(distance.in_meters()),
            metric: ZoneMetric::Planar,
        })
    }

    fn buffer_line(
        &self,
        line: &LineString<f64>,
        distance: Distance,
    ) -> ProviderResult<BufferZone> {
        Ok(BufferZone::Corridor {
            path: line.clone(),
            radius: LinearUnit::Feet.from_meters(distance.in_meters()),
            metric: ZoneMetric::Planar,
        })
    }

    fn select_intersecting(
        &self,
        points: &[CandidatePoint],
        zones: &[BufferZone],
    ) -> ProviderResult<Vec<CandidateId>> {
        let calls = self.select_calls.get() + 1;
        self.select_calls.set(calls);
        if let Some(limit) = self.select_all_after
            && calls > limit
        {
            return Ok(points.iter().map(|p| p.id).collect());
        }
        Ok(points
            .iter()
            .filter(|p| zones.iter().any(|zone| zone.contains(p.position)))
            .map(|p| p.id)
            .collect())
    }
}
