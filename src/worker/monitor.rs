//! Timer threads running beside the workers.
//!
//! Both monitors exit as soon as their shutdown channel disconnects, which
//! happens when the coordinator drops the sending half.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{after, select, tick, Receiver, Sender};
use tracing::info;

use super::cancel::CancellationToken;
use super::cpu::WorkerStats;
use super::pool::SearchResult;

/// Lifecycle of the hashrate monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    Idle,
    Ticking,
    Stopped,
}

/// Periodically logs the approximate attempt rate.
pub struct HashrateMonitor {
    interval: Duration,
    stats: Arc<WorkerStats>,
    started: Instant,
    state: MonitorState,
}

impl HashrateMonitor {
    pub fn new(interval: Duration, stats: Arc<WorkerStats>, started: Instant) -> Self {
        Self {
            interval,
            stats,
            started,
            state: MonitorState::Idle,
        }
    }

    pub fn state(&self) -> MonitorState {
        self.state
    }

    /// Attempts per millisecond (kHz) for `attempts` over `elapsed`.
    ///
    /// Returns `None` below one millisecond rather than dividing by zero.
    pub fn rate(attempts: u64, elapsed: Duration) -> Option<f64> {
        let millis = elapsed.as_millis();
        if millis == 0 {
            None
        } else {
            Some(attempts as f64 / millis as f64)
        }
    }

    /// Reads the counter once and logs the rate.
    pub fn report(&self) -> Option<f64> {
        let attempts = self.stats.total_attempts();
        let rate = Self::rate(attempts, self.started.elapsed())?;
        info!(attempts, "Hash rate: ~{:.2} kHz", rate);
        Some(rate)
    }

    /// Ticks until `shutdown` disconnects.
    pub fn run(&mut self, shutdown: Receiver<()>) {
        let ticker = tick(self.interval);
        self.state = MonitorState::Ticking;

        loop {
            select! {
                recv(shutdown) -> _ => break,
                recv(ticker) -> _ => {
                    self.report();
                }
            }
        }

        self.state = MonitorState::Stopped;
    }

    /// Runs the monitor on its own thread.
    pub fn spawn(mut self, shutdown: Receiver<()>) -> std::io::Result<JoinHandle<()>> {
        thread::Builder::new()
            .name("vanity-hashrate".into())
            .spawn(move || self.run(shutdown))
    }
}

/// Cancels the search once `timeout` elapses unless shut down first.
///
/// On expiry it posts [`SearchResult::TimedOut`] and then cancels `token`, so
/// the message is queued ahead of every worker acknowledgement.
pub fn spawn_timeout_monitor(
    timeout: Duration,
    token: CancellationToken,
    stats: Arc<WorkerStats>,
    result_tx: Sender<SearchResult>,
    shutdown: Receiver<()>,
) -> std::io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("vanity-timeout".into())
        .spawn(move || {
            let deadline = after(timeout);
            select! {
                recv(shutdown) -> _ => {}
                recv(deadline) -> _ => {
                    info!(attempts = stats.total_attempts(), "timeout reached, cancelling search");
                    let _ = result_tx.send(SearchResult::TimedOut);
                    token.cancel();
                }
            }
        })
}
