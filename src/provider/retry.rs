use std::thread;
use std::time::Duration;

use super::{GeospatialProvider, ProviderResult};
use crate::config::ProviderConfig;

/// Provider handle that repeats calls failing with a retryable error
pub struct RetryingProvider<'a, P> {
    provider: &'a P,
    config: &'a ProviderConfig,
}

impl<'a, P> Clone for RetryingProvider<'a, P> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, P> Copy for RetryingProvider<'a, P> {}

impl<'a, P: GeospatialProvider> RetryingProvider<'a, P> {
    pub fn new(provider: &'a P, config: &'a ProviderConfig) -> Self {
        Self { provider, config }
    }

    /// Run `call` against the provider, retrying timeouts with a linear backoff.
    ///
    /// Makes at most `max_retries` attempts (at least one) and returns the
    /// last error once they are used up.
    pub fn call<T>(
        &self,
        operation: &str,
        mut call: impl FnMut(&'a P) -> ProviderResult<T>,
    ) -> ProviderResult<T> {
        let max_attempts = self.config.max_retries.max(1);
        let mut attempt = 1;

        loop {
            match call(self.provider) {
                Err(err) if err.is_retryable() && attempt < max_attempts => {
                    let wait = Duration::from_millis(self.config.retry_backoff_ms * attempt as u64);
                    tracing::warn!(
                        "{} failed ({}), retrying in {:?} (attempt {}/{})",
                        operation,
                        err,
                        wait,
                        attempt + 1,
                        max_attempts
                    );
                    thread::sleep(wait);
                    attempt += 1;
                }
                result => return result,
            }
        }
    }
}
