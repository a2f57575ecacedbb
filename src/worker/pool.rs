//! Search coordination: worker pool, first-match arbitration and shutdown.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use tracing::{debug, error, info, warn};

use crate::config::SearchConfig;
use crate::matcher::SuffixSet;
use crate::sink::ResultSink;

use super::cancel::{CancellationToken, MatchSlot};
use super::cpu::{panic_message, CpuWorker, LiveGuard, WorkerStats};
use super::generator::CandidateGenerator;
use super::monitor::{spawn_timeout_monitor, HashrateMonitor};

/// A winning vanity identity.
pub struct VanityMatch {
    /// The ID of the worker that found this result
    pub worker_id: usize,
    /// The canonical string that matched
    pub canonical_string: String,
    /// Marshalled private key
    pub key_material: Vec<u8>,
    /// Whether the result sink accepted the key
    pub persisted: bool,
}

impl std::fmt::Debug for VanityMatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VanityMatch")
            .field("worker_id", &self.worker_id)
            .field("canonical_string", &self.canonical_string)
            .field("persisted", &self.persisted)
            .finish_non_exhaustive()
    }
}

/// Messages posted on the result channel.
///
/// Every worker posts exactly one of `Found`, `Cancelled` or `Faulted` when it
/// exits. The timeout monitor posts `TimedOut`.
#[derive(Debug)]
pub enum SearchResult {
    Found(VanityMatch),
    Cancelled { worker_id: usize },
    Faulted { worker_id: usize },
    TimedOut,
}

#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("not found")]
    NotFound,
    #[error("search cancelled")]
    Cancelled,
    #[error("Failed to spawn thread: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Runs vanity searches over a pool of CPU workers.
pub struct SearchCoordinator<G, S> {
    config: SearchConfig,
    suffixes: Arc<SuffixSet>,
    generator: Arc<G>,
    sink: Arc<S>,
    stats: Arc<WorkerStats>,
}

impl<G, S> SearchCoordinator<G, S>
where
    G: CandidateGenerator + 'static,
    S: ResultSink + 'static,
{
    pub fn new(config: SearchConfig, generator: G, sink: S) -> Self {
        Self {
            suffixes: Arc::new(config.suffixes().clone()),
            config,
            generator: Arc::new(generator),
            sink: Arc::new(sink),
            stats: Arc::new(WorkerStats::new()),
        }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Counters of the current or most recent run.
    pub fn stats(&self) -> &Arc<WorkerStats> {
        &self.stats
    }

    /// Runs one search with a fresh cancellation token.
    pub fn run(&self) -> Result<VanityMatch, SearchError> {
        self.run_with_token(CancellationToken::new())
    }

    /// Runs one search. Cancelling `token` from outside ends the run with
    /// [`SearchError::Cancelled`] unless a match already won.
    ///
    /// Returns only after every worker and monitor thread has exited.
    pub fn run_with_token(&self, token: CancellationToken) -> Result<VanityMatch, SearchError> {
        self.stats.reset();

        let started = Instant::now();
        let (result_tx, result_rx) = unbounded();
        let (shutdown_tx, shutdown_rx) = bounded::<()>(0);
        let slot = Arc::new(MatchSlot::new());

        info!(
            workers = self.config.worker_count(),
            suffixes = %self.config.suffixes(),
            timeout = ?self.config.timeout(),
            "starting search"
        );

        let mut workers = Vec::with_capacity(self.config.worker_count());
        let mut monitors = Vec::with_capacity(2);
        let spawned = self.spawn_all(
            &token,
            &slot,
            &result_tx,
            &shutdown_rx,
            started,
            &mut workers,
            &mut monitors,
        );
        drop(result_tx);

        if let Err(e) = spawned {
            error!(error = %e, "failed to start search threads");
            token.cancel();
            drop(shutdown_tx);
            // Workers that did start still post their acknowledgements.
            for _ in result_rx.iter().take(workers.len()) {}
            join_all(workers);
            join_all(monitors);
            return Err(SearchError::Spawn(e));
        }

        let outcome = self.collect(&token, &slot, &result_rx, workers.len());

        drop(shutdown_tx);
        join_all(workers);
        join_all(monitors);

        info!(
            attempts = self.stats.total_attempts(),
            elapsed = ?started.elapsed(),
            "search finished"
        );

        outcome
    }

    fn spawn_worker(
        &self,
        id: usize,
        token: &CancellationToken,
        slot: &Arc<MatchSlot>,
        result_tx: &Sender<SearchResult>,
    ) -> std::io::Result<JoinHandle<()>> {
        let worker = CpuWorker::new(
            id,
            self.suffixes.clone(),
            self.generator.clone(),
            self.sink.clone(),
            token.clone(),
            slot.clone(),
            self.stats.clone(),
        );
        let result_tx = result_tx.clone();
        let guard = LiveGuard::enter(self.stats.clone());

        thread::Builder::new()
            .name(format!("vanity-worker-{}", id))
            .spawn(move || {
                let _guard = guard;
                let message = match panic::catch_unwind(AssertUnwindSafe(|| worker.run())) {
                    Ok(message) => message,
                    Err(payload) => {
                        error!(worker = id, reason = panic_message(&*payload), "worker panicked");
                        SearchResult::Faulted { worker_id: id }
                    }
                };
                let _ = result_tx.send(message);
            })
    }

    #[allow(clippy::too_many_arguments)]
    fn spawn_all(
        &self,
        token: &CancellationToken,
        slot: &Arc<MatchSlot>,
        result_tx: &Sender<SearchResult>,
        shutdown_rx: &Receiver<()>,
        started: Instant,
        workers: &mut Vec<JoinHandle<()>>,
        monitors: &mut Vec<JoinHandle<()>>,
    ) -> std::io::Result<()> {
        for id in 0..self.config.worker_count() {
            workers.push(self.spawn_worker(id, token, slot, result_tx)?);
        }

        monitors.push(spawn_timeout_monitor(
            self.config.timeout(),
            token.clone(),
            self.stats.clone(),
            result_tx.clone(),
            shutdown_rx.clone(),
        )?);
        monitors.push(
            HashrateMonitor::new(self.config.hashrate_interval(), self.stats.clone(), started)
                .spawn(shutdown_rx.clone())?,
        );

        Ok(())
    }

    /// Drains the result channel until every worker has exited.
    ///
    /// The first `Found` wins. If the pool drains before anything cancelled the
    /// token (every worker faulted), keeps waiting for the timeout monitor.
    ///
    /// `Cancelled` is reported only when the token was flipped from outside:
    /// a claimed slot means a worker cancelled it after matching.
    fn collect(
        &self,
        token: &CancellationToken,
        slot: &MatchSlot,
        result_rx: &Receiver<SearchResult>,
        workers: usize,
    ) -> Result<VanityMatch, SearchError> {
        let mut remaining = workers;
        let mut winner: Option<VanityMatch> = None;
        let mut timed_out = false;

        loop {
            if remaining == 0 && (winner.is_some() || timed_out || token.is_cancelled()) {
                break;
            }

            let message = match result_rx.recv() {
                Ok(message) => message,
                Err(_) => break,
            };

            match message {
                SearchResult::Found(found) => {
                    remaining = remaining.saturating_sub(1);
                    token.cancel();
                    if winner.is_none() {
                        info!(
                            worker = found.worker_id,
                            candidate = %found.canonical_string,
                            "match found"
                        );
                        winner = Some(found);
                    } else {
                        warn!(worker = found.worker_id, "ignoring second match");
                    }
                }
                SearchResult::Cancelled { worker_id } => {
                    remaining = remaining.saturating_sub(1);
                    debug!(worker = worker_id, "worker stopped");
                }
                SearchResult::Faulted { worker_id } => {
                    remaining = remaining.saturating_sub(1);
                    warn!(worker = worker_id, remaining, "worker exited after a fault");
                }
                SearchResult::TimedOut => timed_out = true,
            }
        }

        match winner {
            Some(found) => Ok(found),
            None if timed_out || slot.is_claimed() || !token.is_cancelled() => {
                Err(SearchError::NotFound)
            }
            None => Err(SearchError::Cancelled),
        }
    }
}

fn join_all(handles: Vec<JoinHandle<()>>) {
    for handle in handles {
        let _ = handle.join();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::SinkError;
    use crate::worker::generator::{Candidate, GenerateError};
    use std::time::Duration;

    struct NullSink;

    impl ResultSink for NullSink {
        fn persist(&self, _: &[u8]) -> Result<(), SinkError> {
            Ok(())
        }
    }

    fn candidate(s: &str) -> Result<Candidate, GenerateError> {
        Ok(Candidate {
            key_material: vec![1, 2, 3],
            canonical_string: s.to_string(),
        })
    }

    #[test]
    fn test_immediate_match() {
        let config = SearchConfig::new(2, ["abc"], Duration::from_secs(5)).unwrap();
        let coordinator = SearchCoordinator::new(config, || candidate("kabc"), NullSink);

        let found = coordinator.run().unwrap();
        assert_eq!(found.canonical_string, "kabc");
        assert!(found.worker_id < 2);
        assert_eq!(coordinator.stats().live_workers(), 0);
    }

    #[test]
    fn test_external_cancel() {
        let config = SearchConfig::new(2, ["abc"], Duration::from_secs(30)).unwrap();
        let coordinator = SearchCoordinator::new(config, || candidate("k000"), NullSink);

        let token = CancellationToken::new();
        let canceller = {
            let token = token.clone();
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(50));
                token.cancel();
            })
        };

        let started = Instant::now();
        let result = coordinator.run_with_token(token);
        canceller.join().unwrap();

        assert!(matches!(result, Err(SearchError::Cancelled)));
        assert!(started.elapsed() < Duration::from_secs(30));
        assert_eq!(coordinator.stats().live_workers(), 0);
    }

    #[test]
    fn test_stats_reset_between_runs() {
        let config = SearchConfig::new(1, ["abc"], Duration::from_millis(50)).unwrap();
        let coordinator = SearchCoordinator::new(config, || candidate("k000"), NullSink);

        assert!(matches!(coordinator.run(), Err(SearchError::NotFound)));
        let first = coordinator.stats().total_attempts();
        assert!(first > 0);

        coordinator.stats().attempts.store(u64::MAX / 2, std::sync::atomic::Ordering::Relaxed);
        assert!(matches!(coordinator.run(), Err(SearchError::NotFound)));
        assert!(coordinator.stats().total_attempts() < u64::MAX / 2);
    }

    #[test]
    fn test_claimed_slot_without_found_is_not_found() {
        let config = SearchConfig::new(1, ["abc"], Duration::from_secs(5)).unwrap();
        let coordinator = SearchCoordinator::new(config, || candidate("k000"), NullSink);

        // A worker claimed the slot and cancelled, then faulted before posting Found.
        let token = CancellationToken::new();
        let slot = MatchSlot::new();
        assert!(slot.try_claim());
        token.cancel();
        let (tx, rx) = unbounded();
        tx.send(SearchResult::Faulted { worker_id: 0 }).unwrap();

        let result = coordinator.collect(&token, &slot, &rx, 1);
        assert!(matches!(result, Err(SearchError::NotFound)));
    }

    #[test]
    fn test_unclaimed_cancel_is_external() {
        let config = SearchConfig::new(1, ["abc"], Duration::from_secs(5)).unwrap();
        let coordinator = SearchCoordinator::new(config, || candidate("k000"), NullSink);

        let token = CancellationToken::new();
        token.cancel();
        let (tx, rx) = unbounded();
        tx.send(SearchResult::Cancelled { worker_id: 0 }).unwrap();

        let result = coordinator.collect(&token, &MatchSlot::new(), &rx, 1);
        assert!(matches!(result, Err(SearchError::Cancelled)));
    }
}
