use std::collections::VecDeque;

use parking_lot::RwLock;

use crate::models::TryOnResult;

/// Session results, newest first. Append only; gone when the process exits.
#[derive(Default)]
pub struct History {
    entries: RwLock<VecDeque<TryOnResult>>,
}

impl History {
    /// Prepends `result`, which also makes it the current result.
    pub fn record_result(&self, result: TryOnResult) {
        self.entries.write().push_front(result);
    }

    pub fn current_result(&self) -> Option<TryOnResult> {
        self.entries.read().front().cloned()
    }

    pub fn entries(&self) -> Vec<TryOnResult> {
        self.entries.read().iter().cloned().collect()
    }

    pub fn len(&self) -> usize { self.entries.read().len() }

    pub fn is_empty(&self) -> bool { self.entries.read().is_empty() }
}
