use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("geospatial backend unavailable: {0}")]
    Unavailable(String),
    #[error("{operation} timed out after {elapsed:?}")]
    Timeout {
        operation: &'static str,
        elapsed: Duration,
    },
    #[error("{operation} failed: {detail}")]
    Call {
        operation: &'static str,
        detail: String,
    },
    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed {what} in {path:?}: {detail}")]
    Format {
        path: PathBuf,
        what: &'static str,
        detail: String,
    },
}

impl ProviderError {
    /// Whether repeating the same call may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, ProviderError::Timeout { .. })
    }

    pub fn call(operation: &'static str, detail: impl Into<String>) -> Self {
        ProviderError::Call {
            operation,
            detail: detail.into(),
        }
    }
}

pub type ProviderResult<T> = Result<T, ProviderError>;
