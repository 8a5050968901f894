//! Site selection: candidate pool, wake-corridor checks and greedy
//! disqualification.

pub mod disqualify;
pub mod error;
pub mod job;
pub mod pool;
pub mod progress;
pub mod validator;
pub mod wake;

#[cfg(test)]
pub(crate) mod mock;

pub use disqualify::DisqualificationSet;
pub use error::SitingError;
pub use job::{SitingJob, SitingReport};
pub use pool::{CandidatePool, build_candidate_pool};
pub use progress::{CancelFlag, RunProgress};
pub use validator::{RunOutcome, SiteValidator};
pub use wake::{
    WakeCorridorAnalyzer, WakeFailure, WakeRay, WakeSample, WakeVerdict, ZoneElevation,
};
