use geo::{
    BoundingRect, Closest, ClosestPoint, Contains, Distance as _, GeodesicArea, Haversine,
    HaversineClosestPoint, LineString, MultiPolygon, Point, Rect, coord,
};
use std::time::{Duration, Instant};

use super::{GeospatialProvider, ProviderError, ProviderResult, RasterPoint};
use crate::domain::{CandidateId, CandidatePoint};
use crate::geometry::{Distance, EARTH_RADIUS_M, Frame, LinearUnit, SpatialReference};

/// A north-up raster held in memory.
///
/// Rows run top to bottom, `None` cells are NoData.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    ncols: usize,
    nrows: usize,
    /// Lower-left corner of the lower-left cell
    xll: f64,
    yll: f64,
    cell_size: f64,
    values: Vec<Option<f64>>,
    reference: SpatialReference,
}

impl Grid {
    pub fn new(
        ncols: usize,
        nrows: usize,
        lower_left: (f64, f64),
        cell_size: f64,
        values: Vec<Option<f64>>,
        reference: SpatialReference,
    ) -> ProviderResult<Self> {
        let expected = ncols.checked_mul(nrows).ok_or_else(|| {
            ProviderError::call(
                "create_raster",
                format!("{ncols} x {nrows} cells overflows the grid size"),
            )
        })?;
        if values.len() != expected {
            return Err(ProviderError::call(
                "create_raster",
                format!("expected {} cells, got {}", expected, values.len()),
            ));
        }
        if !(cell_size > 0.0) {
            return Err(ProviderError::call(
                "create_raster",
                format!("cell size must be positive, got {cell_size}"),
            ));
        }

        Ok(Self {
            ncols,
            nrows,
            xll: lower_left.0,
            yll: lower_left.1,
            cell_size,
            values,
            reference,
        })
    }

    /// Build a grid by evaluating `value` at every cell centre
    pub fn from_fn(
        ncols: usize,
        nrows: usize,
        lower_left: (f64, f64),
        cell_size: f64,
        reference: SpatialReference,
        value: impl Fn(Point<f64>) -> Option<f64>,
    ) -> Self {
        let mut grid = Self {
            ncols,
            nrows,
            xll: lower_left.0,
            yll: lower_left.1,
            cell_size,
            values: vec![None; ncols * nrows],
            reference,
        };
        for row in 0..nrows {
            for col in 0..ncols {
                grid.values[row * ncols + col] = value(grid.cell_center(row, col));
            }
        }
        grid
    }

    pub fn ncols(&self) -> usize {
        self.ncols
    }

    pub fn nrows(&self) -> usize {
        self.nrows
    }

    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    pub fn reference(&self) -> &SpatialReference {
        &self.reference
    }

    /// Reinterpret the grid coordinates in another reference
    pub fn with_reference(mut self, reference: SpatialReference) -> Self {
        self.reference = reference;
        self
    }

    pub fn data_cells(&self) -> usize {
        self.values.iter().filter(|v| v.is_some()).count()
    }

    pub fn cell_center(&self, row: usize, col: usize) -> Point<f64> {
        let x = self.xll + (col as f64 + 0.5) * self.cell_size;
        let y = self.yll + ((self.nrows - 1 - row) as f64 + 0.5) * self.cell_size;
        Point::new(x, y)
    }

    /// Row and column of the cell containing `point`
    pub fn cell_at(&self, point: Point<f64>) -> Option<(usize, usize)> {
        let col = ((point.x() - self.xll) / self.cell_size).floor();
        let row_from_bottom = ((point.y() - self.yll) / self.cell_size).floor();
        if !col.is_finite() || !row_from_bottom.is_finite() {
            return None;
        }
        if col < 0.0 || row_from_bottom < 0.0 {
            return None;
        }
        let (col, row_from_bottom) = (col as usize, row_from_bottom as usize);
        if col >= self.ncols || row_from_bottom >= self.nrows {
            return None;
        }
        Some((self.nrows - 1 - row_from_bottom, col))
    }

    pub fn value(&self, row: usize, col: usize) -> Option<f64> {
        self.values[row * self.ncols + col]
    }

    pub fn value_at(&self, point: Point<f64>) -> Option<f64> {
        self.cell_at(point).and_then(|(row, col)| self.value(row, col))
    }

    fn filtered(&self, keep: impl Fn(Point<f64>, f64) -> bool) -> Self {
        let mut out = self.clone();
        for row in 0..self.nrows {
            for col in 0..self.ncols {
                let idx = row * self.ncols + col;
                if let Some(v) = self.values[idx]
                    && !keep(self.cell_center(row, col), v)
                {
                    out.values[idx] = None;
                }
            }
        }
        out
    }

    /// Inclusive row/col window covering `rect`, clamped to the grid
    fn window(&self, rect: Rect<f64>) -> Option<(usize, usize, usize, usize)> {
        if self.ncols == 0 || self.nrows == 0 {
            return None;
        }
        let to_col = |x: f64| ((x - self.xll) / self.cell_size).floor();
        let to_row = |y: f64| self.nrows as f64 - 1.0 - ((y - self.yll) / self.cell_size).floor();

        let col_min = to_col(rect.min().x).max(0.0);
        let col_max = to_col(rect.max().x).min(self.ncols as f64 - 1.0);
        let row_min = to_row(rect.max().y).max(0.0);
        let row_max = to_row(rect.min().y).min(self.nrows as f64 - 1.0);
        if col_min > col_max || row_min > row_max {
            return None;
        }
        Some((row_min as usize, row_max as usize, col_min as usize, col_max as usize))
    }
}

/// How distances inside a [`BufferZone`] are measured
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoneMetric {
    /// Euclidean distance in the frame's linear unit
    Planar,
    /// Great-circle distance in meters between lon/lat points
    Haversine,
}

impl ZoneMetric {
    pub fn for_frame(frame: Frame) -> Self {
        match frame {
            Frame::Geographic => ZoneMetric::Haversine,
            Frame::Projected(_) => ZoneMetric::Planar,
        }
    }

    pub fn distance(self, a: Point<f64>, b: Point<f64>) -> f64 {
        match self {
            ZoneMetric::Planar => (a.x() - b.x()).hypot(a.y() - b.y()),
            ZoneMetric::Haversine => Haversine::distance(a, b),
        }
    }

    fn closest_on(self, path: &LineString<f64>, point: Point<f64>) -> Closest<f64> {
        match self {
            ZoneMetric::Planar => path.closest_point(&point),
            ZoneMetric::Haversine => path.haversine_closest_point(&point),
        }
    }
}

/// An analytic buffer: a disk around a point or a corridor around a line.
///
/// `radius` is in frame units for [`ZoneMetric::Planar`] and in meters for
/// [`ZoneMetric::Haversine`].
#[derive(Debug, Clone, PartialEq)]
pub enum BufferZone {
    Disk {
        center: Point<f64>,
        radius: f64,
        metric: ZoneMetric,
    },
    Corridor {
        path: LineString<f64>,
        radius: f64,
        metric: ZoneMetric,
    },
}

impl BufferZone {
    pub fn contains(&self, point: Point<f64>) -> bool {
        match self {
            BufferZone::Disk {
                center,
                radius,
                metric,
            } => metric.distance(*center, point) <= *radius,
            BufferZone::Corridor {
                path,
                radius,
                metric,
            } => {
                if path.0.len() == 1 {
                    return metric.distance(Point::from(path.0[0]), point) <= *radius;
                }
                match metric.closest_on(path, point) {
                    Closest::Intersection(_) => true,
                    Closest::SinglePoint(p) => metric.distance(p, point) <= *radius,
                    Closest::Indeterminate => false,
                }
            }
        }
    }

    /// Frame-unit rectangle enclosing every point the zone contains
    pub fn bounding_rect(&self) -> Option<Rect<f64>> {
        let (rect, radius, metric) = match self {
            BufferZone::Disk {
                center,
                radius,
                metric,
            } => (center.bounding_rect(), *radius, *metric),
            BufferZone::Corridor {
                path,
                radius,
                metric,
            } => (path.bounding_rect()?, *radius, *metric),
        };

        let (dx, dy) = match metric {
            ZoneMetric::Planar => (radius, radius),
            ZoneMetric::Haversine => {
                // Widest longitude offset sits at the latitude nearest a pole
                let delta = radius / EARTH_RADIUS_M;
                let lat = rect.min().y.abs().max(rect.max().y.abs()).min(90.0);
                let ratio = delta.sin() / lat.to_radians().cos();
                let dx = if ratio.is_finite() && ratio < 1.0 {
                    ratio.asin().to_degrees()
                } else {
                    180.0
                };
                (dx, delta.to_degrees())
            }
        };
        Some(Rect::new(
            coord! { x: rect.min().x - dx, y: rect.min().y - dy },
            coord! { x: rect.max().x + dx, y: rect.max().y + dy },
        ))
    }
}

/// In-memory backend over [`Grid`] rasters and [`BufferZone`] buffers.
///
/// In a geographic frame buffers measure haversine meters, so a radius
/// covers the same ground along both axes at any latitude.
#[derive(Debug, Clone)]
pub struct GridProvider {
    reference: SpatialReference,
    timeout: Duration,
}

impl GridProvider {
    pub fn new(reference: SpatialReference, timeout: Duration) -> Self {
        Self { reference, timeout }
    }

    fn zonal_fold(
        &self,
        operation: &'static str,
        raster: &Grid,
        zone: &BufferZone,
        fold: fn(f64, f64) -> f64,
    ) -> ProviderResult<f64> {
        let start = Instant::now();
        let mut acc: Option<f64> = None;

        if let Some(rect) = zone.bounding_rect()
            && let Some((row_min, row_max, col_min, col_max)) = raster.window(rect)
        {
            for row in row_min..=row_max {
                let elapsed = start.elapsed();
                if elapsed >= self.timeout {
                    return Err(ProviderError::Timeout { operation, elapsed });
                }
                for col in col_min..=col_max {
                    let Some(v) = raster.value(row, col) else {
                        continue;
                    };
                    if zone.contains(raster.cell_center(row, col)) {
                        acc = Some(acc.map_or(v, |a| fold(a, v)));
                    }
                }
            }
        }

        acc.ok_or_else(|| ProviderError::call(operation, "zone contains no data cells"))
    }

    fn zone_radius(&self, distance: Distance) -> ProviderResult<f64> {
        if !(distance.value >= 0.0) {
            return Err(ProviderError::call(
                "buffer",
                format!("buffer distance must not be negative, got {}", distance.value),
            ));
        }
        let meters = distance.in_meters();
        Ok(match self.reference.frame {
            Frame::Geographic => meters,
            Frame::Projected(unit) => unit.from_meters(meters),
        })
    }

    fn region_area_m2(&self, polygon: &geo::Polygon<f64>) -> f64 {
        use geo::Area;
        match self.reference.frame {
            Frame::Geographic => polygon.geodesic_area_unsigned(),
            Frame::Projected(LinearUnit::Meters) => polygon.unsigned_area(),
            Frame::Projected(unit) => {
                let one = unit.to_meters(1.0);
                polygon.unsigned_area() * one * one
            }
        }
    }
}

impl GeospatialProvider for GridProvider {
    type Raster = Grid;
    type Zone = BufferZone;

    fn check_available(&self) -> ProviderResult<()> {
        Ok(())
    }

    fn spatial_reference(&self, raster: &Grid) -> ProviderResult<SpatialReference> {
        Ok(raster.reference.clone())
    }

    fn select_regions(
        &self,
        boundary: &MultiPolygon<f64>,
        min_area_m2: f64,
    ) -> ProviderResult<MultiPolygon<f64>> {
        Ok(MultiPolygon::new(
            boundary
                .0
                .iter()
                .filter(|polygon| self.region_area_m2(polygon) >= min_area_m2)
                .cloned()
                .collect(),
        ))
    }

    fn extract_by_mask(&self, raster: &Grid, mask: &MultiPolygon<f64>) -> ProviderResult<Grid> {
        Ok(raster.filtered(|center, _| mask.contains(&center)))
    }

    fn extract_by_raster_mask(&self, raster: &Grid, mask: &Grid) -> ProviderResult<Grid> {
        Ok(raster.filtered(|center, _| mask.value_at(center).is_some()))
    }

    fn extract_by_attribute(
        &self,
        raster: &Grid,
        predicate: &dyn Fn(f64) -> bool,
    ) -> ProviderResult<Grid> {
        Ok(raster.filtered(|_, v| predicate(v)))
    }

    fn raster_to_points(&self, raster: &Grid) -> ProviderResult<Vec<RasterPoint>> {
        let mut points = Vec::with_capacity(raster.data_cells());
        for row in 0..raster.nrows {
            for col in 0..raster.ncols {
                if let Some(value) = raster.value(row, col) {
                    points.push(RasterPoint {
                        id: (row * raster.ncols + col) as u64 + 1,
                        position: raster.cell_center(row, col),
                        value,
                    });
                }
            }
        }
        Ok(points)
    }

    fn sample_value(&self, raster: &Grid, point: Point<f64>) -> ProviderResult<Option<f64>> {
        Ok(raster.value_at(point))
    }

    fn zonal_min(&self, raster: &Grid, zone: &BufferZone) -> ProviderResult<f64> {
        self.zonal_fold("zonal_min", raster, zone, f64::min)
    }

    fn zonal_max(&self, raster: &Grid, zone: &BufferZone) -> ProviderResult<f64> {
        self.zonal_fold("zonal_max", raster, zone, f64::max)
    }

    fn buffer_point(&self, point: Point<f64>, distance: Distance) -> ProviderResult<BufferZone> {
        Ok(BufferZone::Disk {
            center: point,
            radius: self.zone_radius(distance)?,
            metric: ZoneMetric::for_frame(self.reference.frame),
        })
    }

    fn buffer_line(
        &self,
        line: &LineString<f64>,
        distance: Distance,
    ) -> ProviderResult<BufferZone> {
        if line.0.is_empty() {
            return Err(ProviderError::call("buffer", "cannot buffer an empty line"));
        }
        Ok(BufferZone::Corridor {
            path: line.clone(),
            radius: self.zone_radius(distance)?,
            metric: ZoneMetric::for_frame(self.reference.frame),
        })
    }

    fn select_intersecting(
        &self,
        points: &[CandidatePoint],
        zones: &[BufferZone],
    ) -> ProviderResult<Vec<CandidateId>> {
        Ok(points
            .iter()
            .filter(|p| zones.iter().any(|zone| zone.contains(p.position)))
            .map(|p| p.id)
            .collect())
    }
}
