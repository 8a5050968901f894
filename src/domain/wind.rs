use crate::geometry::normalize_bearing;

/// Ray bearings derived once per run from the nominal wind bearing.
///
/// The wind bearing is given on a rotation 90 degrees off the ray bearings,
/// so the upwind ray is `wind + 90` and the downwind ray its opposite.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindGeometry {
    upwind_deg: f64,
    downwind_deg: f64,
}

impl WindGeometry {
    pub fn from_wind_bearing(wind_bearing_deg: f64) -> Self {
        let upwind_deg = normalize_bearing(wind_bearing_deg + 90.0);
        let downwind_deg = normalize_bearing(upwind_deg + 180.0);
        Self {
            upwind_deg,
            downwind_deg,
        }
    }

    pub fn upwind_deg(&self) -> f64 {
        self.upwind_deg
    }

    pub fn downwind_deg(&self) -> f64 {
        self.downwind_deg
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_westerly_wind() {
        let wind = WindGeometry::from_wind_bearing(270.0);
        assert_eq!(wind.upwind_deg(), 0.0);
        assert_eq!(wind.downwind_deg(), 180.0);
    }

    #[test]
    fn test_bearings_are_opposite_and_normalized() {
        for bearing in [0.0, 45.0, 135.0, 269.5, 359.0, 720.0, -30.0] {
            let wind = WindGeometry::from_wind_bearing(bearing);
            assert!((0.0..360.0).contains(&wind.upwind_deg()));
            assert!((0.0..360.0).contains(&wind.downwind_deg()));
            let diff = (wind.upwind_deg() - wind.downwind_deg()).abs();
            assert!((diff - 180.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_northeasterly_wind() {
        let wind = WindGeometry::from_wind_bearing(45.0);
        assert_eq!(wind.upwind_deg(), 135.0);
        assert_eq!(wind.downwind_deg(), 315.0);
    }
}
