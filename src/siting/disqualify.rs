use std::collections::HashSet;

use crate::domain::CandidateId;

/// Candidates ruled out during a run. Only ever grows.
#[derive(Debug, Default, Clone)]
pub struct DisqualificationSet {
    ids: HashSet<CandidateId>,
}

impl DisqualificationSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if `id` was not already disqualified
    pub fn insert(&mut self, id: CandidateId) -> bool {
        self.ids.insert(id)
    }

    pub fn contains(&self, id: CandidateId) -> bool {
        self.ids.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
