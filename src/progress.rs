//! Progress counters a renderer can poll while a run is in flight.
//!
//! Written only by the coordinator, between factor levels. Readers never
//! touch the bit field.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Debug, Default)]
struct Counters {
    factor: AtomicU64,
    limit: AtomicU64,
    levels: AtomicU64,
    writes: AtomicU64,
}

#[derive(Clone, Debug, Default)]
pub struct SieveProgress {
    inner: Arc<Counters>,
}

/// Point-in-time copy of [`SieveProgress`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ProgressSnapshot {
    /// Last factor whose multiples were crossed.
    pub factor: u64,
    /// `isqrt(size)`, the largest factor that can matter.
    pub limit: u64,
    /// Factor levels fully crossed so far.
    pub levels: u64,
    /// Slots cleared so far, counting repeats.
    pub writes: u64,
}

impl ProgressSnapshot {
    /// Rough completion ratio in `[0, 1]`, by factor against the limit.
    pub fn fraction(&self) -> f64 {
        if self.limit == 0 { return 0.0; }
        (self.factor as f64 / self.limit as f64).clamp(0.0, 1.0)
    }
}

impl SieveProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn start(&self, limit: u64) {
        self.inner.factor.store(0, Ordering::Relaxed);
        self.inner.limit.store(limit, Ordering::Relaxed);
        self.inner.levels.store(0, Ordering::Relaxed);
        self.inner.writes.store(0, Ordering::Relaxed);
    }

    pub(crate) fn level_done(&self, factor: u64, writes: u64) {
        self.inner.factor.store(factor, Ordering::Relaxed);
        self.inner.levels.fetch_add(1, Ordering::Relaxed);
        self.inner.writes.fetch_add(writes, Ordering::Relaxed);
    }

    pub(crate) fn finish(&self) {
        let limit = self.inner.limit.load(Ordering::Relaxed);
        self.inner.factor.store(limit, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            factor: self.inner.factor.load(Ordering::Relaxed),
            limit: self.inner.limit.load(Ordering::Relaxed),
            levels: self.inner.levels.load(Ordering::Relaxed),
            writes: self.inner.writes.load(Ordering::Relaxed),
        }
    }
}
