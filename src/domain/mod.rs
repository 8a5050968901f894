pub mod candidate;
pub mod turbine;
pub mod wind;

pub use candidate::{CandidateId, CandidatePoint};
pub use turbine::SitedTurbine;
pub use wind::WindGeometry;
