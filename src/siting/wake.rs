use geo::Point;

use crate::config::SitingConfig;
use crate::domain::{CandidatePoint, WindGeometry};
use crate::geometry::{Distance, Frame, destination_point};
use crate::provider::{GeospatialProvider, ProviderResult, RetryingProvider};

/// Required hub clearance over the zone minimum, as a multiple of the
/// upwind elevation span
pub const TERRAIN_CLEARANCE_FACTOR: f64 = 3.0;

/// Terrain values at one step along a ray. `None` is NoData.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WakeSample {
    pub distance_ft: f64,
    pub elevation: Option<f64>,
    pub slope: Option<f64>,
}

/// Samples taken along one bearing from a candidate
#[derive(Debug, Clone, PartialEq)]
pub struct WakeRay {
    pub bearing_deg: f64,
    /// Projected sample positions, nearest first
    pub points: Vec<Point<f64>>,
    pub samples: Vec<WakeSample>,
}

impl WakeRay {
    pub fn elevations(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().filter_map(|s| s.elevation)
    }

    pub fn slopes(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().filter_map(|s| s.slope)
    }
}

/// Elevation range of the DEM within the zone buffer around a candidate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoneElevation {
    pub min: f64,
    pub max: f64,
}

impl ZoneElevation {
    pub fn range(&self) -> f64 {
        self.max - self.min
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WakeFailure {
    /// Zone max - min exceeds the elevation buffer limit
    ZoneElevationRange { range: f64, limit: f64 },
    /// Hub clearance over the zone minimum is below three upwind spans
    TerrainClearance { clearance: f64, required: f64 },
    UpwindSlope(f64),
    DownwindSlope(f64),
}

#[derive(Debug, Clone, PartialEq)]
pub enum WakeVerdict {
    Pass { upwind: WakeRay, downwind: WakeRay },
    Fail(WakeFailure),
}

/// Ray sampling distances: `interval`, `2·interval`, ... while below `limit`
pub fn ray_distances(interval_ft: f64, limit_ft: f64) -> impl Iterator<Item = f64> {
    (1u32..)
        .map(move |step| step as f64 * interval_ft)
        .take_while(move |d| *d < limit_ft)
}

/// Max - min of the upwind elevations, 0 with no samples
pub fn elevation_span(elevations: impl Iterator<Item = f64>) -> f64 {
    let (min, max) = elevations.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), e| {
        (lo.min(e), hi.max(e))
    });
    if min.is_finite() && max.is_finite() { max - min } else { 0.0 }
}

/// Hub clearance rule: fails when `hub - zone_min < 3 × span`,
/// with `hub = elevation + hub_height - blade_length`
pub fn check_clearance(
    candidate_elevation: f64,
    zone_min: f64,
    upwind_span: f64,
    config: &SitingConfig,
) -> Option<WakeFailure> {
    let hub_elevation = candidate_elevation + config.hub_height - config.blade_length;
    let clearance = hub_elevation - zone_min;
    let required = TERRAIN_CLEARANCE_FACTOR * upwind_span;
    (clearance < required).then_some(WakeFailure::TerrainClearance {
        clearance,
        required,
    })
}

/// First slope above `threshold`
pub fn first_unsafe_slope(mut slopes: impl Iterator<Item = f64>, threshold: f64) -> Option<f64> {
    slopes.find(|s| *s > threshold)
}

/// Evaluates the terrain around and along the wind axis of a candidate
pub struct WakeCorridorAnalyzer<'a, P: GeospatialProvider> {
    backend: RetryingProvider<'a, P>,
    dem: &'a P::Raster,
    slope: &'a P::Raster,
    config: &'a SitingConfig,
    wind: WindGeometry,
    frame: Frame,
}

impl<'a, P: GeospatialProvider> WakeCorridorAnalyzer<'a, P> {
    pub fn new(
        backend: RetryingProvider<'a, P>,
        dem: &'a P::Raster,
        slope: &'a P::Raster,
        config: &'a SitingConfig,
        frame: Frame,
    ) -> Self {
        Self {
            backend,
            dem,
            slope,
            config,
            wind: WindGeometry::from_wind_bearing(config.wind_bearing_deg),
            frame,
        }
    }

    /// DEM min/max within the zone buffer around `candidate`
    pub fn zone_elevation(&self, candidate: &CandidatePoint) -> ProviderResult<ZoneElevation> {
        let distance = Distance::feet(self.config.zone_buffer_ft);
        let zone = self
            .backend
            .call("buffer", |p| p.buffer_point(candidate.position, distance))?;
        let min = self.backend.call("zonal_min", |p| p.zonal_min(self.dem, &zone))?;
        let max = self.backend.call("zonal_max", |p| p.zonal_max(self.dem, &zone))?;
        Ok(ZoneElevation { min, max })
    }

    /// Sample elevation and slope at each step along `bearing_deg`
    pub fn sample_ray(
        &self,
        candidate: &CandidatePoint,
        bearing_deg: f64,
    ) -> ProviderResult<WakeRay> {
        let bearing_rad = bearing_deg.to_radians();
        let mut ray = WakeRay {
            bearing_deg,
            points: Vec::new(),
            samples: Vec::new(),
        };

        for distance_ft in ray_distances(self.config.ray_interval_ft, self.config.ray_limit_ft) {
            let point = destination_point(candidate.position, bearing_rad, distance_ft, self.frame);
            let elevation = self
                .backend
                .call("sample_value", |p| p.sample_value(self.dem, point))?;
            let slope = self
                .backend
                .call("sample_value", |p| p.sample_value(self.slope, point))?;

            ray.points.push(point);
            ray.samples.push(WakeSample {
                distance_ft,
                elevation,
                slope,
            });
        }

        Ok(ray)
    }

    /// Run the zone gate, then sample both rays and apply the clearance and
    /// slope rules. Rays are only sampled when the gate passes.
    pub fn evaluate(&self, candidate: &CandidatePoint) -> ProviderResult<WakeVerdict> {
        let zone = self.zone_elevation(candidate)?;
        tracing::debug!(id = %candidate.id, "Elev diff: {:.2}", zone.range());

        let limit = self.config.elevation_buffer_limit;
        if zone.range() > limit {
            return Ok(WakeVerdict::Fail(WakeFailure::ZoneElevationRange {
                range: zone.range(),
                limit,
            }));
        }

        let upwind = self.sample_ray(candidate, self.wind.upwind_deg())?;
        let downwind = self.sample_ray(candidate, self.wind.downwind_deg())?;

        let span = elevation_span(upwind.elevations());
        if let Some(failure) = check_clearance(candidate.elevation, zone.min, span, self.config) {
            return Ok(WakeVerdict::Fail(failure));
        }

        let threshold = self.config.slope_threshold;
        if let Some(slope) = first_unsafe_slope(upwind.slopes(), threshold) {
            return Ok(WakeVerdict::Fail(WakeFailure::UpwindSlope(slope)));
        }
        if let Some(slope) = first_unsafe_slope(downwind.slopes(), threshold) {
            return Ok(WakeVerdict::Fail(WakeFailure::DownwindSlope(slope)));
        }

        Ok(WakeVerdict::Pass { upwind, downwind })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProviderConfig;
    use crate::siting::mock::MockProvider;

    #[test]
    fn test_ray_distances() {
        let distances: Vec<f64> = ray_distances(328.0, 2297.0).collect();
        assert_eq!(distances, vec![328.0, 656.0, 984.0, 1312.0, 1640.0, 1968.0, 2296.0]);
        assert_eq!(ray_distances(100.0, 300.0).count(), 2);
    }

    #[test]
    fn test_elevation_span() {
        assert_eq!(elevation_span([510.0, 495.0, 530.0].into_iter()), 35.0);
        assert_eq!(elevation_span(std::iter::empty()), 0.0);
    }

    #[test]
    fn test_clearance_rule() {
        let config = SitingConfig::default();
        // hub = 500 + 80 - 44 = 536, clearance over 450 = 86
        assert_eq!(check_clearance(500.0, 450.0, 28.0, &config), None);
        assert_eq!(
            check_clearance(500.0, 450.0, 29.0, &config),
            Some(WakeFailure::TerrainClearance {
                clearance: 86.0,
                required: 87.0
            })
        );
        // Exactly three spans of clearance passes
        assert_eq!(check_clearance(500.0, 450.0, 86.0 / 3.0, &config), None);
    }

    #[test]
    fn test_first_unsafe_slope() {
        assert_eq!(first_unsafe_slope([1.0, 2.0, 2.5, 3.0].into_iter(), 2.0), Some(2.5));
        assert_eq!(first_unsafe_slope([1.0, 2.0].into_iter(), 2.0), None);
    }

    #[test]
    fn test_gate_failure_skips_ray_sampling() {
        let provider = MockProvider::flat(500.0).with_zone(0.0, 1200.0);
        let retry = ProviderConfig::default();
        let config = SitingConfig::default();
        let analyzer = provider.analyzer(&retry, &config);

        let verdict = analyzer.evaluate(&provider.candidate(1, 0.0, 0.0)).unwrap();

        assert_eq!(
            verdict,
            WakeVerdict::Fail(WakeFailure::ZoneElevationRange {
                range: 1200.0,
                limit: 1000.0
            })
        );
        assert_eq!(provider.sample_calls(), 0);
    }

    #[test]
    fn test_pass_returns_both_rays() {
        let provider = MockProvider::flat(500.0).with_zone(450.0, 520.0);
        let retry = ProviderConfig::default();
        let config = SitingConfig::default();
        let analyzer = provider.analyzer(&retry, &config);

        let WakeVerdict::Pass { upwind, downwind } =
            analyzer.evaluate(&provider.candidate(1, 0.0, 0.0)).unwrap()
        else {
            panic!("expected a pass");
        };

        // Wind from 270 puts the upwind ray due north in a projected frame
        assert_eq!(upwind.bearing_deg, 0.0);
        assert_eq!(downwind.bearing_deg, 180.0);
        assert_eq!(upwind.points.len(), 7);
        assert!((upwind.points[0].y() - 328.0).abs() < 1e-9);
        assert!((downwind.points[6].y() + 2296.0).abs() < 1e-9);
        // Two rasters sampled at seven steps on two rays
        assert_eq!(provider.sample_calls(), 28);
    }

    #[test]
    fn test_nodata_samples_are_excluded() {
        // A deep hole north of the candidate would break the clearance rule
        // if NoData were read as zero
        let provider = MockProvider::flat(500.0)
            .with_zone(450.0, 520.0)
            .with_dem(|p| if p.y() > 1000.0 { None } else { Some(500.0) });
        let retry = ProviderConfig::default();
        let config = SitingConfig::default();
        let analyzer = provider.analyzer(&retry, &config);

        let verdict = analyzer.evaluate(&provider.candidate(1, 0.0, 0.0)).unwrap();
        assert!(matches!(
            verdict,
            WakeVerdict::Pass { ref upwind, .. } if upwind.elevations().count() == 3
        ));
    }

    #[test]
    fn test_rough_upwind_terrain_fails_clearance() {
        let provider = MockProvider::flat(500.0)
            .with_zone(450.0, 520.0)
            .with_dem(|p| Some(if p.y() > 1500.0 { 540.0 } else { 500.0 }));
        let retry = ProviderConfig::default();
        let config = SitingConfig::default();
        let analyzer = provider.analyzer(&retry, &config);

        let verdict = analyzer.evaluate(&provider.candidate(1, 0.0, 0.0)).unwrap();
        assert_eq!(
            verdict,
            WakeVerdict::Fail(WakeFailure::TerrainClearance {
                clearance: 86.0,
                required: 120.0
            })
        );
    }

    #[test]
    fn test_steep_downwind_slope_fails() {
        let provider = MockProvider::flat(500.0)
            .with_zone(450.0, 520.0)
            .with_slope(|p| Some(if p.y() < -1000.0 { 4.5 } else { 1.0 }));
        let retry = ProviderConfig::default();
        let config = SitingConfig::default();
        let analyzer = provider.analyzer(&retry, &config);

        let verdict = analyzer.evaluate(&provider.candidate(1, 0.0, 0.0)).unwrap();
        assert_eq!(verdict, WakeVerdict::Fail(WakeFailure::DownwindSlope(4.5)));
    }

    #[test]
    fn test_steep_upwind_slope_fails() {
        let provider = MockProvider::flat(500.0)
            .with_zone(450.0, 520.0)
            .with_slope(|p| Some(if p.y() > 600.0 { 2.1 } else { 1.0 }));
        let retry = ProviderConfig::default();
        let config = SitingConfig::default();
        let analyzer = provider.analyzer(&retry, &config);

        let verdict = analyzer.evaluate(&provider.candidate(1, 0.0, 0.0)).unwrap();
        assert_eq!(verdict, WakeVerdict::Fail(WakeFailure::UpwindSlope(2.1)));
    }
}
