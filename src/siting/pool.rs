use geo::MultiPolygon;

use crate::config::SitingConfig;
use crate::domain::{CandidateId, CandidatePoint};
use crate::provider::{GeospatialProvider, ProviderResult, RetryingProvider};

/// Candidates ordered by elevation, highest first, all below the slope threshold
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandidatePool {
    points: Vec<CandidatePoint>,
}

impl CandidatePool {
    /// Drop candidates at or above `slope_threshold` and sort the rest by
    /// descending elevation. Equal elevations keep their input order.
    pub fn from_points(points: Vec<CandidatePoint>, slope_threshold: f64) -> Self {
        let mut points: Vec<CandidatePoint> = points
            .into_iter()
            .filter(|p| p.slope < slope_threshold)
            .collect();
        points.sort_by(|a, b| b.elevation.total_cmp(&a.elevation));
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CandidatePoint> {
        self.points.iter()
    }

    pub fn as_slice(&self) -> &[CandidatePoint] {
        &self.points
    }

    pub fn ids(&self) -> impl Iterator<Item = CandidateId> + '_ {
        self.points.iter().map(|p| p.id)
    }
}

/// Derive the candidate pool from the terrain layers.
///
/// # Algorithm
/// 1. Keep boundary regions of at least the minimum study area
/// 2. Mask the slope raster to those regions, then to cells below the slope threshold
/// 3. Mask the DEM to the surviving slope cells and convert them to points
/// 4. Attach each point's slope and order by descending elevation
///
/// No qualifying region yields an empty pool, not an error.
pub fn build_candidate_pool<P: GeospatialProvider>(
    backend: RetryingProvider<'_, P>,
    dem: &P::Raster,
    slope: &P::Raster,
    boundary: &MultiPolygon<f64>,
    config: &SitingConfig,
) -> ProviderResult<CandidatePool> {
    let min_area = config.min_study_area();
    tracing::info!("Min study area: {:.1}", min_area);

    let regions = backend.call("select_regions", |p| p.select_regions(boundary, min_area))?;
    if regions.0.is_empty() {
        tracing::info!("No boundary region meets the minimum study area");
        return Ok(CandidatePool::default());
    }
    tracing::info!(
        "{} of {} boundary regions qualify",
        regions.0.len(),
        boundary.0.len()
    );

    tracing::info!("Extract slope");
    let region_slope = backend.call("extract_by_mask", |p| p.extract_by_mask(slope, &regions))?;

    tracing::info!("Extract slope below {}", config.slope_threshold);
    let threshold = config.slope_threshold;
    let safe_slope = backend.call("extract_by_attribute", |p| {
        p.extract_by_attribute(&region_slope, &|v: f64| v < threshold)
    })?;

    tracing::info!("Extract elevation");
    let elevation =
        backend.call("extract_by_mask", |p| p.extract_by_raster_mask(dem, &safe_slope))?;

    tracing::info!("Converting to points");
    let cells = backend.call("raster_to_points", |p| p.raster_to_points(&elevation))?;

    let mut candidates = Vec::with_capacity(cells.len());
    for cell in cells {
        let sampled = backend.call("sample_value", |p| p.sample_value(&safe_slope, cell.position))?;
        if let Some(slope) = sampled {
            candidates.push(CandidatePoint::new(cell.id, cell.position, cell.value, slope));
        }
    }

    Ok(CandidatePool::from_points(candidates, threshold))
}
