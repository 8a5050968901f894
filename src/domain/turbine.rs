use geo::Point;

use super::CandidatePoint;

/// A candidate accepted as a turbine location
#[derive(Debug, Clone, PartialEq)]
pub struct SitedTurbine {
    pub site: CandidatePoint,
}

impl SitedTurbine {
    pub fn new(site: CandidatePoint) -> Self {
        Self { site }
    }

    pub fn position(&self) -> Point<f64> {
        self.site.position
    }
}
