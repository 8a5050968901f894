use geo::LineString;
use std::collections::HashSet;

use super::{
    CancelFlag, CandidatePool, DisqualificationSet, RunProgress, SitingError, WakeCorridorAnalyzer,
    WakeRay, WakeVerdict,
};
use crate::config::SitingConfig;
use crate::domain::{CandidateId, CandidatePoint, SitedTurbine};
use crate::geometry::{Distance, Frame};
use crate::output::TurbineSink;
use crate::provider::{GeospatialProvider, ProviderResult, RetryingProvider};

const PROGRESS_LOG_INTERVAL: usize = 100;

/// State left behind by a completed run
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub progress: RunProgress,
    pub accepted: Vec<CandidateId>,
    pub disqualified: DisqualificationSet,
}

/// Wake path through an accepted site: the upwind ray walked back towards
/// the site, then the downwind ray walked away from it
pub fn exclusion_path(upwind: &WakeRay, downwind: &WakeRay) -> LineString<f64> {
    upwind
        .points
        .iter()
        .rev()
        .chain(downwind.points.iter())
        .map(|p| p.0)
        .collect()
}

/// Greedy site selection over an elevation-ordered candidate pool
pub struct SiteValidator<'a, P: GeospatialProvider> {
    analyzer: WakeCorridorAnalyzer<'a, P>,
    backend: RetryingProvider<'a, P>,
    config: &'a SitingConfig,
}

impl<'a, P: GeospatialProvider> SiteValidator<'a, P> {
    pub fn new(
        backend: RetryingProvider<'a, P>,
        dem: &'a P::Raster,
        slope: &'a P::Raster,
        config: &'a SitingConfig,
        frame: Frame,
    ) -> Self {
        Self {
            analyzer: WakeCorridorAnalyzer::new(backend, dem, slope, config, frame),
            backend,
            config,
        }
    }

    /// Visit every candidate once, highest first.
    ///
    /// Disqualified candidates are skipped. Candidates failing a wake rule
    /// are disqualified; passing ones are appended to `sink` and everything
    /// inside their exclusion region is disqualified. A provider failure or
    /// cancellation ends the run with the turbines sited so far left in `sink`.
    pub fn run(
        &self,
        pool: &CandidatePool,
        sink: &mut TurbineSink,
        cancel: &CancelFlag,
        mut on_progress: impl FnMut(&RunProgress),
    ) -> Result<RunOutcome, SitingError> {
        let mut disqualified = DisqualificationSet::new();
        let mut accepted: HashSet<CandidateId> = HashSet::new();
        let mut accepted_order = Vec::new();
        let mut progress = RunProgress {
            total: pool.len(),
            ..Default::default()
        };

        for candidate in pool.iter() {
            if cancel.is_cancelled() {
                return Err(SitingError::Cancelled { progress });
            }

            if progress.processed % PROGRESS_LOG_INTERVAL == 0 && progress.processed != 0 {
                tracing::info!("{} records processed", progress.processed);
            }

            if !disqualified.contains(candidate.id) {
                tracing::debug!(
                    "Turbines sited: {}, disqualified: {}, {} left",
                    progress.sited,
                    disqualified.len(),
                    progress.remaining()
                );

                let verdict = self
                    .analyzer
                    .evaluate(candidate)
                    .map_err(|source| SitingError::Provider { source, progress })?;

                match verdict {
                    WakeVerdict::Fail(reason) => {
                        tracing::debug!(id = %candidate.id, ?reason, "Bad candidate");
                        disqualified.insert(candidate.id);
                    }
                    WakeVerdict::Pass { upwind, downwind } => {
                        tracing::debug!(id = %candidate.id, "Good candidate");
                        sink.append(SitedTurbine::new(candidate.clone()));
                        accepted.insert(candidate.id);
                        accepted_order.push(candidate.id);
                        progress.sited += 1;

                        let shadowed = self
                            .shadowed_candidates(candidate, &upwind, &downwind, pool)
                            .map_err(|source| SitingError::Provider { source, progress })?;

                        let mut count = 0;
                        for id in shadowed {
                            if !accepted.contains(&id) && disqualified.insert(id) {
                                count += 1;
                            }
                        }
                        tracing::debug!("Disqualified by buffer: {}", count);
                    }
                }
                progress.disqualified = disqualified.len();
            }

            progress.processed += 1;
            on_progress(&progress);
        }

        tracing::info!("Siting finished: {}", progress);

        Ok(RunOutcome {
            progress,
            accepted: accepted_order,
            disqualified,
        })
    }

    /// Pool members inside the exclusion region of an accepted site,
    /// excluding the site itself
    fn shadowed_candidates(
        &self,
        site: &CandidatePoint,
        upwind: &WakeRay,
        downwind: &WakeRay,
        pool: &CandidatePool,
    ) -> ProviderResult<Vec<CandidateId>> {
        let site_distance = Distance::feet(self.config.site_buffer_ft());
        let corridor_distance = Distance::feet(self.config.corridor_buffer_ft());
        let path = exclusion_path(upwind, downwind);

        let mut zones = vec![
            self.backend
                .call("buffer", |p| p.buffer_point(site.position, site_distance))?,
        ];
        if !path.0.is_empty() {
            zones.push(
                self.backend
                    .call("buffer", |p| p.buffer_line(&path, corridor_distance))?,
            );
        }

        let hits = self.backend.call("select_intersecting", |p| {
            p.select_intersecting(pool.as_slice(), &zones)
        })?;

        Ok(hits.into_iter().filter(|id| *id != site.id).collect())
    }
}
