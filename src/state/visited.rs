use crate::url::Fingerprint;
use std::collections::{HashSet, VecDeque};
use tracing::debug;

/// Default number of fingerprints tracked before eviction kicks in
pub const DEFAULT_MAX_TRACKED: usize = 100_000;

/// Bounded set of visited URL fingerprints
///
/// Remembers insertion order. Once `max_size` fingerprints are held, the
/// oldest 20% (at least one) are forgotten before the next insert, so a
/// long crawl may revisit an early URL instead of growing without bound.
#[derive(Debug, Clone)]
pub struct VisitedSet {
    seen: HashSet<Fingerprint>,
    order: VecDeque<Fingerprint>,
    max_size: usize,
}

impl VisitedSet {
    pub fn new(max_size: usize) -> Self {
        Self {
            seen: HashSet::new(),
            order: VecDeque::new(),
            max_size: max_size.max(1),
        }
    }

    pub fn seen(&self, fingerprint: &Fingerprint) -> bool {
        self.seen.contains(fingerprint)
    }

    /// Inserts a fingerprint, evicting the oldest entries when full
    pub fn mark(&mut self, fingerprint: Fingerprint) {
        self.check_and_mark(fingerprint);
    }

    /// Inserts a fingerprint and returns true if it was not already present
    pub fn check_and_mark(&mut self, fingerprint: Fingerprint) -> bool {
        if self.seen.contains(&fingerprint) {
            return false;
        }

        if self.seen.len() >= self.max_size {
            self.evict_oldest();
        }

        self.seen.insert(fingerprint);
        self.order.push_back(fingerprint);
        true
    }

    /// Removes `fingerprints` so they count as unseen again
    pub fn forget_all(&mut self, fingerprints: &HashSet<Fingerprint>) {
        if fingerprints.is_empty() {
            return;
        }
        self.seen.retain(|f| !fingerprints.contains(f));
        self.order.retain(|f| !fingerprints.contains(f));
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    fn evict_oldest(&mut self) {
        let count = (self.max_size / 5).max(1);
        for _ in 0..count {
            match self.order.pop_front() {
                Some(old) => {
                    self.seen.remove(&old);
                }
                None => break,
            }
        }
        debug!(evicted = count, remaining = self.seen.len(), "Visited set at capacity");
    }
}

impl Default for VisitedSet {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_TRACKED)
    }
}
