//! Parallel vanity search.
//!
//! This module provides:
//! - Multi-threaded CPU workers with per-worker panic isolation
//! - A shared cancellation token and first-match arbitration
//! - Timeout and hashrate monitor threads
//! - The coordinator tying them together

mod cancel;
mod cpu;
mod generator;
mod monitor;
mod pool;

pub use cancel::{CancellationToken, MatchSlot};
pub use cpu::{CpuWorker, WorkerStats};
pub use generator::{Candidate, CandidateGenerator, GenerateError, PeerKeyGenerator};
pub use monitor::{spawn_timeout_monitor, HashrateMonitor, MonitorState};
pub use pool::{SearchCoordinator, SearchError, SearchResult, VanityMatch};
