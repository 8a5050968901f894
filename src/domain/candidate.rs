use geo::Point;
use std::fmt;

/// Identity of a candidate site, unique within one candidate pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CandidateId(pub u64);

impl fmt::Display for CandidateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A terrain cell eligible for turbine placement
#[derive(Debug, Clone, PartialEq)]
pub struct CandidatePoint {
    pub id: CandidateId,
    /// Cell centre in the terrain's spatial reference
    pub position: Point<f64>,
    /// Ground elevation in DEM units
    pub elevation: f64,
    /// Terrain slope in percent
    pub slope: f64,
}

impl CandidatePoint {
    pub fn new(id: u64, position: Point<f64>, elevation: f64, slope: f64) -> Self {
        Self {
            id: CandidateId(id),
            position,
            elevation,
            slope,
        }
    }
}
