use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Counters reported with every progress update and every fatal error
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunProgress {
    /// Candidates in the pool
    pub total: usize,
    /// Candidates visited so far, skipped ones included
    pub processed: usize,
    pub sited: usize,
    pub disqualified: usize,
}

impl RunProgress {
    /// Candidates neither sited nor disqualified yet
    pub fn remaining(&self) -> usize {
        self.total.saturating_sub(self.sited + self.disqualified)
    }
}

impl fmt::Display for RunProgress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} candidates processed, {} turbines sited, {} disqualified",
            self.processed, self.total, self.sited, self.disqualified
        )
    }
}

/// Cooperative cancellation, checked once per candidate
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
