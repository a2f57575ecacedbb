//! Suffix set matching.

use std::fmt;

/// Size of the base36 alphabet canonical strings are drawn from.
const ALPHABET_SIZE: u64 = 36;

/// Result of a match operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchResult {
    /// Full match found
    Match,
    /// No match
    NoMatch,
}

impl MatchResult {
    #[inline]
    pub fn is_match(self) -> bool {
        matches!(self, MatchResult::Match)
    }
}

/// A set of suffixes a canonical string may end with.
///
/// Matching is exact and case sensitive. Duplicates are collapsed on
/// construction; insertion order is kept for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuffixSet {
    suffixes: Vec<String>,
}

impl SuffixSet {
    /// Creates a suffix set. Empty strings are kept as given; validation
    /// happens in [`crate::config::SearchConfig::new`].
    pub fn new<I, S>(suffixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut out: Vec<String> = Vec::new();
        for suffix in suffixes {
            let suffix = suffix.into();
            if !out.contains(&suffix) {
                out.push(suffix);
            }
        }
        Self { suffixes: out }
    }

    /// Returns the suffixes in insertion order.
    pub fn as_slice(&self) -> &[String] {
        &self.suffixes
    }

    pub fn len(&self) -> usize {
        self.suffixes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.suffixes.is_empty()
    }

    /// Matches a canonical string against every suffix.
    #[inline]
    pub fn matches(&self, candidate: &str) -> MatchResult {
        if self.suffixes.iter().any(|s| candidate.ends_with(s.as_str())) {
            MatchResult::Match
        } else {
            MatchResult::NoMatch
        }
    }

    /// Returns the expected number of attempts before a match.
    ///
    /// Each suffix of length n matches with probability 36^-n; the set
    /// matches with the sum of those probabilities.
    pub fn estimated_difficulty(&self) -> u64 {
        let p: f64 = self
            .suffixes
            .iter()
            .map(|s| (ALPHABET_SIZE as f64).powi(-(s.len() as i32)))
            .sum();
        if p <= 0.0 {
            u64::MAX
        } else {
            (1.0 / p).round().min(u64::MAX as f64) as u64
        }
    }

    /// Returns a human-readable difficulty estimate.
    pub fn difficulty_description(&self) -> String {
        let diff = self.estimated_difficulty();
        match diff {
            0..=1_000 => "Very Easy (< 1 second)".into(),
            1_001..=100_000 => "Easy (seconds)".into(),
            100_001..=10_000_000 => "Medium (minutes)".into(),
            10_000_001..=1_000_000_000 => "Hard (hours)".into(),
            _ => "Very Hard (days or more)".into(),
        }
    }
}

impl fmt::Display for SuffixSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.suffixes.join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suffix_match() {
        let set = SuffixSet::new(["abc", "xyz"]);
        assert!(set.matches("k51qzi5uqu5dabc").is_match());
        assert!(set.matches("k51qzi5uqu5dxyz").is_match());
    }

    #[test]
    fn test_suffix_no_match() {
        let set = SuffixSet::new(["abc"]);
        assert!(!set.matches("k51qzi5uqu5dab").is_match());
        assert!(!set.matches("abcd").is_match());
        assert!(!set.matches("").is_match());
    }

    #[test]
    fn test_case_sensitive() {
        let set = SuffixSet::new(["abc"]);
        assert!(!set.matches("xxABC").is_match());
    }

    #[test]
    fn test_duplicates_collapsed() {
        let set = SuffixSet::new(["abc", "def", "abc"]);
        assert_eq!(set.len(), 2);
        assert_eq!(set.to_string(), "abc,def");
    }

    #[test]
    fn test_difficulty() {
        let set = SuffixSet::new(["abcd"]);
        assert_eq!(set.estimated_difficulty(), 1_679_616); // 36^4

        let two = SuffixSet::new(["abcd", "efgh"]);
        assert_eq!(two.estimated_difficulty(), 839_808);
    }
}
