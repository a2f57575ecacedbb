//! Matching canonical identity strings against the requested suffixes.

mod suffix;

pub use suffix::{MatchResult, SuffixSet};
