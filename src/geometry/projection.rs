use geo::Point;

use super::reference::{Frame, LinearUnit, METERS_TO_FEET};

/// Mean Earth radius in meters
pub const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// Normalize a bearing in degrees to [0, 360)
pub fn normalize_bearing(degrees: f64) -> f64 {
    let bearing = degrees.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if bearing >= 360.0 { 0.0 } else { bearing }
}

fn normalize_longitude(degrees: f64) -> f64 {
    (degrees + 540.0).rem_euclid(360.0) - 180.0
}

/// Project a point `distance_ft` feet along `bearing_rad` (clockwise from north).
///
/// Geographic frames use the spherical destination-point formula:
///   φ2 = asin(sin φ1 · cos δ + cos φ1 · sin δ · cos θ)
///   λ2 = λ1 + atan2(sin θ · sin δ · cos φ1, cos δ − sin φ1 · sin φ2)
/// where δ is the angular distance d / R. Projected frames offset planarly.
pub fn destination_point(
    origin: Point<f64>,
    bearing_rad: f64,
    distance_ft: f64,
    frame: Frame,
) -> Point<f64> {
    match frame {
        Frame::Geographic => {
            let delta = distance_ft / METERS_TO_FEET / EARTH_RADIUS_M;
            let lat1 = origin.y().to_radians();
            let lon1 = origin.x().to_radians();

            let lat2 = (lat1.sin() * delta.cos()
                + lat1.cos() * delta.sin() * bearing_rad.cos())
            .asin();
            let lon2 = lon1
                + (bearing_rad.sin() * delta.sin() * lat1.cos())
                    .atan2(delta.cos() - lat1.sin() * lat2.sin());

            Point::new(normalize_longitude(lon2.to_degrees()), lat2.to_degrees())
        }
        Frame::Projected(unit) => {
            let distance = unit.from_meters(LinearUnit::Feet.to_meters(distance_ft));
            Point::new(
                origin.x() + distance * bearing_rad.sin(),
                origin.y() + distance * bearing_rad.cos(),
            )
        }
    }
}
