//! Search configuration and the validated charset type.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use crate::error::SearchError;

/// Lowercase, uppercase, then digits: 62 symbols.
pub const DEFAULT_CHARSET: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Candidates buffered between the enumerator and the workers.
pub const DEFAULT_QUEUE_CAPACITY: usize = 128;

/// Interval between status line updates.
pub const DEFAULT_PROGRESS_INTERVAL: Duration = Duration::from_secs(1);

/// How long a finished pool waits for workers still inside a trial.
pub const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// Ordered set of distinct symbols candidates are drawn from.
///
/// Symbol order is enumeration order: the first symbol sorts first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Charset {
    symbols: Arc<[char]>,
}

impl Charset {
    /// Build a charset from the characters of `symbols`, keeping their order.
    ///
    /// # Errors
    /// Returns `SearchError` if `symbols` is empty or repeats a character.
    pub fn new(symbols: &str) -> Result<Self, SearchError> {
        let mut seen: Vec<char> = Vec::with_capacity(symbols.len());
        for c in symbols.chars() {
            if seen.contains(&c) {
                return Err(SearchError::DuplicateSymbol(c));
            }
            seen.push(c);
        }
        if seen.is_empty() {
            return Err(SearchError::EmptyCharset);
        }
        Ok(Self {
            symbols: seen.into(),
        })
    }

    pub fn symbols(&self) -> &[char] {
        &self.symbols
    }

    pub(crate) fn shared_symbols(&self) -> Arc<[char]> {
        Arc::clone(&self.symbols)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Always false: construction rejects empty charsets.
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Number of candidates of `length`, or `None` if it overflows `u128`.
    pub fn keyspace(&self, length: usize) -> Option<u128> {
        let exp = u32::try_from(length).ok()?;
        (self.len() as u128).checked_pow(exp)
    }
}

impl Default for Charset {
    fn default() -> Self {
        Self {
            symbols: DEFAULT_CHARSET.chars().collect(),
        }
    }
}

impl FromStr for Charset {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl fmt::Display for Charset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.symbols.iter().try_for_each(|c| write!(f, "{c}"))
    }
}

/// Number of workers used when none is configured: one per available core.
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Tunables for a search run.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Enumeration alphabet.
    pub charset: Charset,
    /// Worker threads per length.
    pub workers: usize,
    /// Bounded queue capacity between enumerator and workers.
    pub queue_capacity: usize,
    /// Interval between progress reports.
    pub progress_interval: Duration,
    /// Bounded wait for straggling workers after a match or failure.
    pub shutdown_grace: Duration,
    /// Stop after exhausting this length. `None` searches forever.
    pub max_length: Option<usize>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            charset: Charset::default(),
            workers: default_workers(),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            shutdown_grace: DEFAULT_SHUTDOWN_GRACE,
            max_length: None,
        }
    }
}

impl SearchConfig {
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.workers == 0 {
            return Err(SearchError::InvalidConfig("workers must be at least 1"));
        }
        if self.queue_capacity == 0 {
            return Err(SearchError::InvalidConfig("queue capacity must be at least 1"));
        }
        if self.progress_interval.is_zero() {
            return Err(SearchError::InvalidConfig("progress interval must be non-zero"));
        }
        Ok(())
    }
}
