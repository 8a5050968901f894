use geo::MultiPolygon;
use std::time::{Duration, Instant};

use super::{CancelFlag, RunProgress, SiteValidator, SitingError, build_candidate_pool};
use crate::config::{ProviderConfig, SitingConfig};
use crate::output::TurbineSink;
use crate::provider::{GeospatialProvider, RetryingProvider};

/// Summary of a completed run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SitingReport {
    pub progress: RunProgress,
    pub elapsed: Duration,
}

/// One site-selection run over a DEM, a slope raster and a boundary
pub struct SitingJob<'a, P: GeospatialProvider> {
    pub provider: &'a P,
    pub dem: &'a P::Raster,
    pub slope: &'a P::Raster,
    pub boundary: &'a MultiPolygon<f64>,
    pub config: &'a SitingConfig,
    pub retry: &'a ProviderConfig,
}

impl<'a, P: GeospatialProvider> SitingJob<'a, P> {
    /// Build the candidate pool and site turbines into `sink`.
    ///
    /// `sink` is owned by the caller so turbines sited before a failure
    /// can still be written out.
    pub fn run(
        &self,
        sink: &mut TurbineSink,
        cancel: &CancelFlag,
        on_progress: impl FnMut(&RunProgress),
    ) -> Result<SitingReport, SitingError> {
        let start = Instant::now();
        let backend = RetryingProvider::new(self.provider, self.retry);
        let fail = |source| SitingError::Provider {
            source,
            progress: RunProgress::default(),
        };

        self.provider
            .check_available()
            .map_err(|source| SitingError::ProviderUnavailable {
                source,
                progress: RunProgress::default(),
            })?;

        let reference = backend
            .call("spatial_reference", |p| p.spatial_reference(self.dem))
            .map_err(fail)?;
        tracing::info!("DEM spatial reference: {:?}", reference.frame);

        let pool = build_candidate_pool(backend, self.dem, self.slope, self.boundary, self.config)
            .map_err(fail)?;
        tracing::info!("Number of candidate points: {}", pool.len());

        let validator =
            SiteValidator::new(backend, self.dem, self.slope, self.config, reference.frame);
        let outcome = validator.run(&pool, sink, cancel, on_progress)?;

        Ok(SitingReport {
            progress: outcome.progress,
            elapsed: start.elapsed(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{LinearUnit, SpatialReference};
    use crate::provider::{Grid, GridProvider, ProviderError};
    use crate::siting::mock::{MockLayer, MockProvider};
    use geo::polygon;

    #[test]
    fn test_unavailable_provider_fails_before_any_work() {
        let provider = MockProvider::flat(500.0).unavailable();
        let config = SitingConfig::default();
        let retry = ProviderConfig::default();
        let boundary = MultiPolygon::new(vec![]);
        let job = SitingJob {
            provider: &provider,
            dem: &MockLayer::Dem,
            slope: &MockLayer::Slope,
            boundary: &boundary,
            config: &config,
            retry: &retry,
        };
        let mut sink = TurbineSink::new(SpatialReference::default());

        let err = job.run(&mut sink, &CancelFlag::new(), |_| {}).unwrap_err();

        assert!(matches!(
            err,
            SitingError::ProviderUnavailable {
                source: ProviderError::Unavailable(_),
                ..
            }
        ));
        assert_eq!(err.progress(), RunProgress::default());
        assert_eq!(provider.zonal_calls(), 0);
        assert!(sink.is_empty());
    }

    #[test]
    fn test_boundary_below_minimum_area_sites_nothing() {
        let reference = SpatialReference::projected(LinearUnit::Meters);
        let dem = Grid::from_fn(10, 10, (0.0, 0.0), 30.0, reference.clone(), |_| Some(500.0));
        let slope = Grid::from_fn(10, 10, (0.0, 0.0), 30.0, reference.clone(), |_| Some(1.0));
        let provider = GridProvider::new(reference.clone(), Duration::from_secs(5));
        let config = SitingConfig::default();
        let retry = ProviderConfig::default();
        let boundary = MultiPolygon::new(vec![polygon![
            (x: 0.0, y: 0.0),
            (x: 300.0, y: 0.0),
            (x: 300.0, y: 300.0),
            (x: 0.0, y: 300.0),
            (x: 0.0, y: 0.0),
        ]]);
        let job = SitingJob {
            provider: &provider,
            dem: &dem,
            slope: &slope,
            boundary: &boundary,
            config: &config,
            retry: &retry,
        };
        let mut sink = TurbineSink::new(reference);

        let report = job.run(&mut sink, &CancelFlag::new(), |_| {}).unwrap();

        assert_eq!(report.progress, RunProgress::default());
        assert!(sink.is_empty());
    }
}
