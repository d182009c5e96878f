use std::borrow::Cow;
use std::fmt;

use crate::config::Charset;

/// Where the current length stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchStatus {
    InProgress,
    Found,
    Exhausted,
}

/// Coordinator state for one password length.
///
/// Rebuilt for every length; `advance` is the only way to move on, so the
/// length can only grow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchState {
    length: usize,
    keyspace: Option<u128>,
    status: SearchStatus,
}

impl SearchState {
    /// State for the first length searched, the empty password.
    pub fn start(charset: &Charset) -> Self {
        Self::at(charset, 0)
    }

    fn at(charset: &Charset, length: usize) -> Self {
        Self {
            length,
            keyspace: charset.keyspace(length),
            status: SearchStatus::InProgress,
        }
    }

    /// Fresh state for the next length.
    pub fn advance(&self, charset: &Charset) -> Self {
        Self::at(charset, self.length + 1)
    }

    pub fn length(&self) -> usize {
        self.length
    }

    pub fn keyspace(&self) -> Option<u128> {
        self.keyspace
    }

    pub fn status(&self) -> SearchStatus {
        self.status
    }

    pub fn mark_found(&mut self) {
        self.status = SearchStatus::Found;
    }

    pub fn mark_exhausted(&mut self) {
        self.status = SearchStatus::Exhausted;
    }
}

/// Human-readable keyspace size.
pub struct Keyspace(pub Option<u128>);

impl fmt::Display for Keyspace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(n) => write!(f, "{n}"),
            None => f.write_str("more than 2^128"),
        }
    }
}

/// A recovered password and the plaintext it unlocks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Found {
    pub password: String,
    pub plaintext: Vec<u8>,
    pub length: usize,
}

impl Found {
    pub fn plaintext_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.plaintext)
    }
}

/// What one length of the search cost.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LengthReport {
    pub length: usize,
    pub keyspace: Option<u128>,
    /// Trials completed by the workers for this length.
    pub attempts: u64,
    /// `InProgress` if the run was cancelled before the length was finished.
    pub status: SearchStatus,
}

impl LengthReport {
    /// Snapshot of `state` once its length has stopped running.
    pub fn from_state(state: &SearchState, attempts: u64) -> Self {
        Self {
            length: state.length(),
            keyspace: state.keyspace(),
            attempts,
            status: state.status(),
        }
    }

    pub fn found(&self) -> bool {
        self.status == SearchStatus::Found
    }

    /// Every candidate of this length was tried.
    pub fn exhausted(&self) -> bool {
        self.status == SearchStatus::Exhausted
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    Found(Found),
    /// Every length up to and including `max_length` was exhausted.
    Exhausted { max_length: usize },
    /// The run's cancellation token fired.
    Cancelled,
}

/// Result of a coordinator run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchReport {
    pub outcome: SearchOutcome,
    /// One entry per searched length, in search order.
    pub lengths: Vec<LengthReport>,
}

impl SearchReport {
    pub fn total_attempts(&self) -> u64 {
        self.lengths.iter().map(|l| l.attempts).sum()
    }
}
