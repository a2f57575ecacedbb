//! CPU worker for the vanity search.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use tracing::{debug, error, trace, warn};

use crate::matcher::SuffixSet;
use crate::sink::ResultSink;

use super::cancel::{CancellationToken, MatchSlot};
use super::generator::CandidateGenerator;
use super::pool::{SearchResult, VanityMatch};

/// Counters shared by every worker of a search.
#[derive(Debug, Default)]
pub struct WorkerStats {
    /// Candidates checked without a match
    pub attempts: AtomicU64,
    /// Matches found, including discarded late ones
    pub matches_found: AtomicU64,
    /// Workers currently running
    pub live_workers: AtomicUsize,
}

impl WorkerStats {
    /// Creates new worker stats.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of unsuccessful attempts.
    pub fn total_attempts(&self) -> u64 {
        self.attempts.load(Ordering::Relaxed)
    }

    /// Returns the total matches found.
    pub fn total_matches(&self) -> u64 {
        self.matches_found.load(Ordering::Relaxed)
    }

    /// Returns the number of workers that have not exited yet.
    pub fn live_workers(&self) -> usize {
        self.live_workers.load(Ordering::Acquire)
    }

    /// Zeroes the counters before a new run.
    pub fn reset(&self) {
        self.attempts.store(0, Ordering::Relaxed);
        self.matches_found.store(0, Ordering::Relaxed);
    }
}

/// Keeps `live_workers` accurate on every exit path, unwinding included.
pub(crate) struct LiveGuard(Arc<WorkerStats>);

impl LiveGuard {
    pub(crate) fn enter(stats: Arc<WorkerStats>) -> Self {
        stats.live_workers.fetch_add(1, Ordering::AcqRel);
        Self(stats)
    }
}

impl Drop for LiveGuard {
    fn drop(&mut self) {
        self.0.live_workers.fetch_sub(1, Ordering::AcqRel);
    }
}

/// A CPU worker that generates candidates and tests them against the suffixes.
pub struct CpuWorker<G, S> {
    /// Worker ID
    id: usize,
    /// Suffixes to match against
    suffixes: Arc<SuffixSet>,
    generator: Arc<G>,
    sink: Arc<S>,
    /// Shared stop signal
    token: CancellationToken,
    /// Decides which match is persisted
    slot: Arc<MatchSlot>,
    /// Worker statistics
    stats: Arc<WorkerStats>,
}

impl<G: CandidateGenerator, S: ResultSink> CpuWorker<G, S> {
    /// Creates a new CPU worker.
    pub fn new(
        id: usize,
        suffixes: Arc<SuffixSet>,
        generator: Arc<G>,
        sink: Arc<S>,
        token: CancellationToken,
        slot: Arc<MatchSlot>,
        stats: Arc<WorkerStats>,
    ) -> Self {
        Self {
            id,
            suffixes,
            generator,
            sink,
            token,
            slot,
            stats,
        }
    }

    /// Runs the worker loop and returns its terminal message.
    ///
    /// Generates candidates and tests them until:
    /// - The token is cancelled (returns `Cancelled`)
    /// - A match is found and this worker wins the slot (returns `Found`)
    pub fn run(&self) -> SearchResult {
        loop {
            if self.token.is_cancelled() {
                return SearchResult::Cancelled { worker_id: self.id };
            }

            let candidate = match self.generator.generate() {
                Ok(candidate) => candidate,
                Err(e) => {
                    trace!(worker = self.id, error = %e, "candidate generation failed, retrying");
                    continue;
                }
            };

            if !self.suffixes.matches(&candidate.canonical_string).is_match() {
                self.stats.attempts.fetch_add(1, Ordering::Relaxed);
                continue;
            }

            self.stats.matches_found.fetch_add(1, Ordering::Relaxed);
            self.token.cancel();

            if !self.slot.try_claim() {
                debug!(
                    worker = self.id,
                    candidate = %candidate.canonical_string,
                    "discarding match, another worker won"
                );
                return SearchResult::Cancelled { worker_id: self.id };
            }

            // The slot is already claimed, so a sink panic must not lose the match.
            let persisted = match panic::catch_unwind(AssertUnwindSafe(|| {
                self.sink.persist(&candidate.key_material)
            })) {
                Ok(Ok(())) => true,
                Ok(Err(e)) => {
                    warn!(worker = self.id, error = %e, "failed to persist winning key");
                    false
                }
                Err(payload) => {
                    error!(
                        worker = self.id,
                        reason = panic_message(&*payload),
                        "result sink panicked"
                    );
                    false
                }
            };

            return SearchResult::Found(VanityMatch {
                worker_id: self.id,
                canonical_string: candidate.canonical_string,
                key_material: candidate.key_material,
                persisted,
            });
        }
    }
}

/// Extracts the message of a caught panic.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "unknown panic"
    }
}
