//! # peer_vanity
//!
//! Parallel vanity generator for libp2p peer identities.
//!
//! ## Architecture
//!
//! - `crypto`: Key generation, key marshalling and peer ID encodings
//! - `matcher`: Suffix matching
//! - `worker`: Worker pool, cancellation, monitors and the search coordinator
//! - `sink`: Persistence of the winning key
//! - `config`: Runtime configuration

pub mod config;
pub mod crypto;
pub mod matcher;
pub mod sink;
pub mod worker;

pub use config::{Config, ConfigError, SearchConfig};
pub use crypto::{KeyError, KeyType, Keypair, PeerId};
pub use matcher::{MatchResult, SuffixSet};
pub use sink::{FileSink, ResultSink, SinkError};
pub use worker::{
    Candidate, CandidateGenerator, CancellationToken, GenerateError, PeerKeyGenerator,
    SearchCoordinator, SearchError, SearchResult, VanityMatch, WorkerStats,
};
