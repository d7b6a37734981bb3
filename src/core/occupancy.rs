//! # Counter occupancy, recorded by the counters themselves.
//!
//! Each [`CounterWorker`](crate::CounterWorker) marks its counter busy right
//! after taking a token and clears it right after the service, in the same
//! poll as the surrounding hand-off and slot operations. Nothing in between can
//! be cancelled, so the tracker is exact at every await point:
//!
//! ```text
//! take() ─► occupy slot ─► begin(counter, token) ─► sleep(service) ─► complete(counter) ─► release
//!                               │                        ▲ abort lands here
//!                               └─ busy ─────────────────┘ → reported as interrupted
//! ```
//!
//! After a hard stop, [`OccupancyTracker::snapshot`] lists exactly the services
//! that were cut off, and [`OccupancyTracker::delivered`] counts exactly the
//! services that finished.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::queue::Token;

/// Which counter serves which token, plus the number of finished services.
#[derive(Default)]
pub struct OccupancyTracker {
    serving: Mutex<BTreeMap<usize, Token>>,
    delivered: AtomicU64,
}

impl OccupancyTracker {
    /// Creates an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `counter` busy with `token`.
    pub fn begin(&self, counter: usize, token: Token) {
        if let Some(prev) = self.lock().insert(counter, token) {
            tracing::warn!(counter, %prev, %token, "counter began a service while busy");
        }
    }

    /// Marks `counter` idle and counts one delivery. Returns the token it served.
    pub fn complete(&self, counter: usize) -> Option<Token> {
        let token = self.lock().remove(&counter);
        if token.is_some() {
            self.delivered.fetch_add(1, Ordering::AcqRel);
        }
        token
    }

    /// `(counter, token)` for every busy counter, sorted by counter.
    pub fn snapshot(&self) -> Vec<(usize, Token)> {
        self.lock().iter().map(|(c, t)| (*c, *t)).collect()
    }

    /// Services completed so far.
    pub fn delivered(&self) -> u64 {
        self.delivered.load(Ordering::Acquire)
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<usize, Token>> {
        self.serving.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
