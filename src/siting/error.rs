use thiserror::Error;

use super::RunProgress;
use crate::provider::ProviderError;

/// Fatal run errors. Turbines sited before the failure stay in the sink.
#[derive(Debug, Error)]
pub enum SitingError {
    #[error("geospatial provider unavailable ({progress}): {source}")]
    ProviderUnavailable {
        #[source]
        source: ProviderError,
        progress: RunProgress,
    },
    #[error("provider call failed after {progress}: {source}")]
    Provider {
        #[source]
        source: ProviderError,
        progress: RunProgress,
    },
    #[error("run cancelled after {progress}")]
    Cancelled { progress: RunProgress },
}

impl SitingError {
    pub fn progress(&self) -> RunProgress {
        match self {
            SitingError::ProviderUnavailable { progress, .. }
            | SitingError::Provider { progress, .. }
            | SitingError::Cancelled { progress } => *progress,
        }
    }
}
