//! Runtime configuration for the peer ID vanity generator.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::crypto::encoding::is_base36_char;
use crate::crypto::KeyType;
use crate::matcher::SuffixSet;

/// Minimum length of the raw `--suff` argument.
pub const MIN_SUFFIX_ARG_LEN: usize = 3;

/// libp2p Peer ID Vanity Generator
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Run the parallel vanity search (requires --suff)
    #[arg(long, default_value = "false")]
    pub fast: bool,

    /// Suffixes to search for, comma separated, minimum 3 chars (base36: 0-9, a-z)
    #[arg(long)]
    pub suff: Option<String>,

    /// Search timeout (e.g. 200ms, 30s, 10m, 1h)
    #[arg(long, default_value = "10m", value_parser = parse_duration)]
    pub timeout: Duration,

    /// Number of worker threads (default: number of CPU cores)
    #[arg(short = 'w', long)]
    pub workers: Option<usize>,

    /// File the winning private key is appended to
    #[arg(short = 'o', long, default_value = "private.key")]
    pub output: PathBuf,

    /// Key type: ed25519 or secp256k1. With --key, marks the file as raw key bytes
    #[arg(long = "type")]
    pub key_type: Option<KeyType>,

    /// Location of a key file to decode the peer ID of
    #[arg(long)]
    pub key: Option<PathBuf>,
}

/// What the binary was asked to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// Parallel vanity search.
    Search,
    /// Decode a key file.
    Inspect(PathBuf),
    /// Generate a single key.
    Generate,
}

impl Config {
    /// Returns the number of workers, defaulting to CPU count.
    pub fn worker_count(&self) -> usize {
        self.workers.unwrap_or_else(num_cpus::get)
    }

    /// Returns the key type, defaulting to ed25519.
    pub fn effective_key_type(&self) -> KeyType {
        self.key_type.unwrap_or_default()
    }

    /// Returns the selected mode. Search takes priority over key inspection.
    pub fn mode(&self) -> Mode {
        if self.fast {
            Mode::Search
        } else if let Some(ref key) = self.key {
            Mode::Inspect(key.clone())
        } else {
            Mode::Generate
        }
    }

    /// Returns the `--suff` argument split into suffixes.
    pub fn suffixes(&self) -> Vec<String> {
        self.suff
            .as_deref()
            .unwrap_or_default()
            .trim()
            .split(',')
            .map(|s| s.trim().to_string())
            .collect()
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.mode() != Mode::Search {
            return Ok(());
        }

        let raw = match self.suff.as_deref().map(str::trim) {
            Some(raw) => raw,
            None => return Err(ConfigError::InvalidSuffix("--fast requires --suff".into())),
        };

        if raw.len() < MIN_SUFFIX_ARG_LEN {
            return Err(ConfigError::InvalidSuffix(format!(
                "--suff must be at least {} characters",
                MIN_SUFFIX_ARG_LEN
            )));
        }

        for suffix in self.suffixes() {
            if let Some(c) = suffix.chars().find(|&c| !is_base36_char(c)) {
                return Err(ConfigError::InvalidSuffix(format!(
                    "'{}' contains '{}'; suffixes must use only 0-9 and a-z",
                    suffix, c
                )));
            }
        }

        // Remaining constraints are shared with library callers.
        self.search_config().map(|_| ())
    }

    /// Builds the validated search configuration.
    pub fn search_config(&self) -> Result<SearchConfig, ConfigError> {
        SearchConfig::new(self.worker_count(), self.suffixes(), self.timeout)
    }
}

/// Immutable parameters of one search run.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    worker_count: usize,
    suffixes: SuffixSet,
    timeout: Duration,
}

impl SearchConfig {
    /// Creates a validated search configuration.
    pub fn new<I, S>(worker_count: usize, suffixes: I, timeout: Duration) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if worker_count == 0 {
            return Err(ConfigError::InvalidWorkers);
        }

        let suffixes = SuffixSet::new(suffixes);
        if suffixes.is_empty() {
            return Err(ConfigError::InvalidSuffix("at least one suffix is required".into()));
        }
        if suffixes.as_slice().iter().any(String::is_empty) {
            return Err(ConfigError::InvalidSuffix("suffixes cannot be empty".into()));
        }

        if timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout);
        }

        Ok(Self {
            worker_count,
            suffixes,
            timeout,
        })
    }

    /// Uses one worker per logical CPU.
    pub fn with_default_workers<I, S>(suffixes: I, timeout: Duration) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(num_cpus::get(), suffixes, timeout)
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    pub fn suffixes(&self) -> &SuffixSet {
        &self.suffixes
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Interval between hashrate reports: a sixth of the timeout, at least 1ms.
    pub fn hashrate_interval(&self) -> Duration {
        (self.timeout / 6).max(Duration::from_millis(1))
    }
}

/// Parses durations such as `250ms`, `30s`, `10m`, `1h`, or bare seconds.
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    let split = s
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(s.len());
    let (value, unit) = s.split_at(split);

    let value: u64 = value
        .parse()
        .map_err(|_| format!("Invalid duration: {}", s))?;

    let duration = match unit {
        "ms" => Duration::from_millis(value),
        "" | "s" => Duration::from_secs(value),
        "m" => Duration::from_secs(value.saturating_mul(60)),
        "h" => Duration::from_secs(value.saturating_mul(3600)),
        _ => return Err(format!("Unknown duration unit '{}' in {}", unit, s)),
    };
    Ok(duration)
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid suffix: {0}")]
    InvalidSuffix(String),
    #[error("Worker count must be at least 1")]
    InvalidWorkers,
    #[error("Timeout must be greater than zero")]
    InvalidTimeout,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_test_config(suff: Option<&str>) -> Config {
        Config {
            fast: true,
            suff: suff.map(Into::into),
            timeout: Duration::from_secs(60),
            workers: Some(2),
            output: PathBuf::from("private.key"),
            key_type: None,
            key: None,
        }
    }

    #[test]
    fn test_valid_suffixes() {
        let config = make_test_config(Some("abc, xyz9"));
        assert!(config.validate().is_ok());
        assert_eq!(config.suffixes(), vec!["abc", "xyz9"]);

        let search = config.search_config().unwrap();
        assert_eq!(search.worker_count(), 2);
        assert_eq!(search.suffixes().len(), 2);
    }

    #[test]
    fn test_missing_suffix() {
        assert!(make_test_config(None).validate().is_err());
    }

    #[test]
    fn test_short_suffix_arg() {
        assert!(make_test_config(Some("ab")).validate().is_err());
    }

    #[test]
    fn test_uppercase_suffix_rejected() {
        assert!(make_test_config(Some("ABC")).validate().is_err());
    }

    #[test]
    fn test_empty_entry_rejected() {
        assert!(make_test_config(Some("abc,,def")).validate().is_err());
    }

    #[test]
    fn test_mode_selection() {
        let mut config = make_test_config(None);
        config.fast = false;
        assert_eq!(config.mode(), Mode::Generate);
        assert!(config.validate().is_ok());

        config.key = Some(PathBuf::from("id.key"));
        assert_eq!(config.mode(), Mode::Inspect(PathBuf::from("id.key")));
    }

    #[test]
    fn test_search_config_validation() {
        let timeout = Duration::from_secs(1);
        assert!(matches!(
            SearchConfig::new(0, ["abc"], timeout),
            Err(ConfigError::InvalidWorkers)
        ));
        assert!(SearchConfig::new(1, Vec::<String>::new(), timeout).is_err());
        assert!(SearchConfig::new(1, [""], timeout).is_err());
        assert!(matches!(
            SearchConfig::new(1, ["abc"], Duration::ZERO),
            Err(ConfigError::InvalidTimeout)
        ));
        assert!(SearchConfig::with_default_workers(["abc"], timeout).is_ok());
    }

    #[test]
    fn test_hashrate_interval() {
        let config = SearchConfig::new(1, ["abc"], Duration::from_secs(60)).unwrap();
        assert_eq!(config.hashrate_interval(), Duration::from_secs(10));

        let tiny = SearchConfig::new(1, ["abc"], Duration::from_nanos(5)).unwrap();
        assert_eq!(tiny.hashrate_interval(), Duration::from_millis(1));
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("200ms").unwrap(), Duration::from_millis(200));
        assert_eq!(parse_duration("5s").unwrap(), Duration::from_secs(5));
        assert_eq!(parse_duration("10m").unwrap(), Duration::from_secs(600));
        assert_eq!(parse_duration("1h").unwrap(), Duration::from_secs(3600));
        assert_eq!(parse_duration("7").unwrap(), Duration::from_secs(7));
        assert!(parse_duration("5d").is_err());
        assert!(parse_duration("ms").is_err());
    }
}
