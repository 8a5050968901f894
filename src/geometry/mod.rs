pub mod projection;
pub mod reference;

pub use projection::{EARTH_RADIUS_M, destination_point, normalize_bearing};
pub use reference::{Distance, Frame, LinearUnit, METERS_TO_FEET, SpatialReference};
