//! Sieve driver for one run.
//!
//! The coordinator owns the bit field and walks a small state machine:
//!
//! ```text
//! Idle ─► FindingFactor ─► Crossing ─► Advancing ─┐
//!   │          ▲                                  │
//!   │          └──────────────────────────────────┤
//!   └────────────────────────────► Counting ◄─────┘ ─► Done
//!            (any check point) ─► Cancelled
//! ```
//!
//! Factor levels run strictly one after another. Inside a level the crossing
//! domain is split into disjoint segments that run concurrently on a rayon
//! pool; the parallel iterator returning is the barrier. Cancellation is only
//! looked at between levels.

use std::fmt;
use std::time::{Duration, Instant};

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::{debug, info, trace};

use crate::bitfield::BitField;
use crate::cancel::CancellationToken;
use crate::crosser::cross_segment;
use crate::error::{Result, SieveError};
use crate::partition::{isqrt, plan, Segment};
use crate::progress::SieveProgress;
use crate::request::{SieveMode, SieveRequest};

// ─── Result types ──────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SieveOutcome {
    Completed { prime_count: u64 },
    Cancelled,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SieveResult {
    pub size: u64,
    pub outcome: SieveOutcome,
    pub elapsed: Option<Duration>,
}

impl SieveResult {
    pub fn completed(&self) -> bool {
        matches!(self.outcome, SieveOutcome::Completed { .. })
    }

    pub fn prime_count(&self) -> Option<u64> {
        match self.outcome {
            SieveOutcome::Completed { prime_count } => Some(prime_count),
            SieveOutcome::Cancelled => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CoordinatorState {
    Idle,
    FindingFactor,
    Crossing,
    Advancing,
    Counting,
    Done,
    Cancelled,
}

impl CoordinatorState {
    pub fn is_terminal(self) -> bool {
        matches!(self, CoordinatorState::Done | CoordinatorState::Cancelled)
    }
}

// ─── Coordinator ───────────────────────────────────────────────────────────

pub struct SieveCoordinator {
    request: SieveRequest,
    cancel: CancellationToken,
    progress: SieveProgress,
    pool: Option<ThreadPool>,
    bits: Option<BitField>,
    state: CoordinatorState,
    factor: u64,
    limit: u64,
    prime_count: Option<u64>,
    started: Option<Instant>,
    elapsed: Option<Duration>,
}

impl SieveCoordinator {
    /// Allocate the bit field and worker pool for `request`.
    ///
    /// The domain is still cut into `worker_count` segments, but the pool
    /// never has more threads than the host has logical cores.
    pub fn new(request: SieveRequest, cancel: CancellationToken) -> Result<Self> {
        let workers = request.worker_count();
        let pool = if workers > 1 {
            Some(
                ThreadPoolBuilder::new()
                    .num_threads(workers.min(num_cpus::get()).max(1))
                    .thread_name(|i| format!("primer-sieve-{i}"))
                    .build()?,
            )
        } else {
            None
        };

        let size = request.size();
        let bits = BitField::try_new(size).map_err(|source| SieveError::OutOfMemory {
            size,
            bytes: (size + 1) / 2,
            source,
        })?;

        Ok(Self {
            request,
            cancel,
            progress: SieveProgress::new(),
            pool,
            bits: Some(bits),
            state: CoordinatorState::Idle,
            factor: 3,
            limit: isqrt(request.size()),
            prime_count: None,
            started: None,
            elapsed: None,
        })
    }

    /// Share an externally owned progress handle instead of the private one.
    pub fn with_progress(mut self, progress: SieveProgress) -> Self {
        self.progress = progress;
        self
    }

    pub fn progress(&self) -> &SieveProgress {
        &self.progress
    }

    pub fn state(&self) -> CoordinatorState {
        self.state
    }

    /// Threads crossing segments concurrently; 1 when everything runs inline.
    pub fn pool_threads(&self) -> usize {
        self.pool.as_ref().map_or(1, ThreadPool::current_num_threads)
    }

    /// The live bit field. `None` once the run is cancelled.
    pub fn bits(&self) -> Option<&BitField> {
        self.bits.as_ref()
    }

    /// Drive the state machine to a terminal state.
    pub fn run(&mut self) -> SieveResult {
        while !self.state.is_terminal() {
            self.step();
        }
        self.result()
    }

    /// The run's result, once a terminal state is reached.
    pub fn try_result(&self) -> Option<SieveResult> {
        self.state.is_terminal().then(|| self.result())
    }

    fn result(&self) -> SieveResult {
        let outcome = match (self.state, self.prime_count) {
            (CoordinatorState::Done, Some(prime_count)) => SieveOutcome::Completed { prime_count },
            _ => SieveOutcome::Cancelled,
        };
        SieveResult {
            size: self.request.size(),
            outcome,
            elapsed: self.elapsed,
        }
    }

    /// Perform one transition and return the new state.
    pub fn step(&mut self) -> CoordinatorState {
        self.state = match self.state {
            CoordinatorState::Idle => self.start(),
            CoordinatorState::FindingFactor => self.find_factor(),
            CoordinatorState::Crossing => self.cross(),
            CoordinatorState::Advancing => {
                self.factor += 2;
                self.check_loop()
            }
            CoordinatorState::Counting => self.count(),
            terminal => terminal,
        };
        if self.state == CoordinatorState::Cancelled && self.bits.is_some() {
            self.bits = None;
            self.stop_clock();
            info!(size = self.request.size(), factor = self.factor, "sieve cancelled");
        }
        self.state
    }

    fn start(&mut self) -> CoordinatorState {
        if self.request.measures_time() {
            self.started = Some(Instant::now());
        }
        info!(
            size = self.request.size(),
            workers = self.request.worker_count(),
            threads = self.pool_threads(),
            mode = %self.request.sieve_mode(),
            "sieve started"
        );
        self.progress.start(self.limit);
        self.check_loop()
    }

    fn check_loop(&self) -> CoordinatorState {
        if self.cancel.is_cancelled() {
            return CoordinatorState::Cancelled;
        }
        let more = match self.request.sieve_mode() {
            SieveMode::Compatible => self.factor < self.limit,
            SieveMode::Corrected => self.factor <= self.limit,
        };
        if more { CoordinatorState::FindingFactor } else { CoordinatorState::Counting }
    }

    fn find_factor(&mut self) -> CoordinatorState {
        if self.cancel.is_cancelled() {
            return CoordinatorState::Cancelled;
        }
        let Some(bits) = self.bits.as_ref() else {
            return CoordinatorState::Cancelled;
        };
        // nothing below the current factor can still hide an uncrossed composite
        let mut n = self.factor;
        while n <= self.limit {
            if bits.is_candidate(n) {
                self.factor = n;
                return CoordinatorState::Crossing;
            }
            n += 2;
        }
        CoordinatorState::Counting
    }

    fn cross(&mut self) -> CoordinatorState {
        let factor = self.factor;
        let domain_end = match self.request.sieve_mode() {
            SieveMode::Compatible => self.request.size(),
            SieveMode::Corrected => self.request.size() + 1,
        };
        let workers = match self.pool {
            Some(_) => self.request.worker_count(),
            None => 1,
        };
        let assignments = plan(factor * factor, domain_end, factor, workers);
        let segments: Vec<Segment> = assignments.iter().map(|a| a.segment).collect();

        let Some(bits) = self.bits.as_mut() else {
            return CoordinatorState::Cancelled;
        };
        let mut views = bits.split_segments(&segments);

        let writes: u64 = match self.pool.as_ref() {
            Some(pool) => pool.install(|| {
                views
                    .par_iter_mut()
                    .zip(assignments.par_iter())
                    .map(|(view, a)| {
                        trace!(factor, segment = %a.segment, "crossing segment");
                        cross_segment(view, a.first_multiple, factor)
                    })
                    .sum()
            }),
            None => views
                .iter_mut()
                .zip(&assignments)
                .map(|(view, a)| cross_segment(view, a.first_multiple, factor))
                .sum(),
        };

        debug!(factor, writes, workers, "factor level crossed");
        self.progress.level_done(factor, writes);
        CoordinatorState::Advancing
    }

    fn count(&mut self) -> CoordinatorState {
        let Some(bits) = self.bits.as_ref() else {
            return CoordinatorState::Cancelled;
        };
        let raw = bits.count_candidates();
        let count = match self.request.sieve_mode() {
            SieveMode::Compatible => raw,
            // drop the slot for 1, add 2 which has no slot
            SieveMode::Corrected => raw - u64::from(bits.get(0)) + 1,
        };
        self.prime_count = Some(count);
        self.stop_clock();
        self.progress.finish();
        info!(size = self.request.size(), prime_count = count, "sieve completed");
        CoordinatorState::Done
    }

    fn stop_clock(&mut self) {
        if let Some(started) = self.started.take() {
            self.elapsed = Some(started.elapsed());
        }
    }
}

impl fmt::Debug for SieveCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SieveCoordinator")
            .field("request", &self.request)
            .field("state", &self.state)
            .field("factor", &self.factor)
            .field("limit", &self.limit)
            .finish_non_exhaustive()
    }
}

// ─── Convenience ───────────────────────────────────────────────────────────

/// Run `request` to completion with a fresh, never-cancelled token.
pub fn sieve(request: SieveRequest) -> Result<SieveResult> {
    sieve_with_cancel(request, CancellationToken::new())
}

pub fn sieve_with_cancel(request: SieveRequest, cancel: CancellationToken) -> Result<SieveResult> {
    Ok(SieveCoordinator::new(request, cancel)?.run())
}
