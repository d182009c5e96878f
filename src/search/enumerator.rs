//! Candidate enumeration for one password length.
//!
//! `Candidates` walks `charset^length` as an odometer: one digit index per
//! position, the last position turning fastest. Memory is O(length) no
//! matter how large the keyspace is.

use std::iter::FusedIterator;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{SendTimeoutError, Sender};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::config::Charset;
use crate::error::SearchError;

/// How often a producer blocked on a full queue rechecks its stop token.
const SEND_POLL: Duration = Duration::from_millis(50);

/// Every string of a fixed length over a charset, in lexicographic order
/// of symbol position.
#[derive(Debug, Clone)]
pub struct Candidates {
    symbols: Arc<[char]>,
    digits: Vec<usize>,
    done: bool,
}

impl Candidates {
    pub fn new(charset: &Charset, length: usize) -> Self {
        Self {
            symbols: charset.shared_symbols(),
            digits: vec![0; length],
            done: false,
        }
    }

    pub fn length(&self) -> usize {
        self.digits.len()
    }

    /// Turn the odometer one step. Returns false once it wraps around.
    fn step(&mut self) -> bool {
        for digit in self.digits.iter_mut().rev() {
            *digit += 1;
            if *digit < self.symbols.len() {
                return true;
            }
            *digit = 0;
        }
        false
    }
}

impl Iterator for Candidates {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        if self.done {
            return None;
        }
        let candidate = self.digits.iter().map(|&d| self.symbols[d]).collect();
        if !self.step() {
            self.done = true;
        }
        Some(candidate)
    }
}

impl FusedIterator for Candidates {}

/// Feed `candidates` into `queue` on a dedicated thread.
///
/// The queue closes when the thread returns: after the last candidate, when
/// `stop` fires, or when every consumer is gone. The handle yields the number
/// of candidates queued.
pub fn spawn_producer(
    candidates: Candidates,
    queue: Sender<String>,
    stop: CancellationToken,
) -> Result<JoinHandle<u64>, SearchError> {
    let length = candidates.length();
    thread::Builder::new()
        .name(format!("enumerator-{length}"))
        .spawn(move || produce(candidates, &queue, &stop))
        .map_err(|source| SearchError::Spawn {
            role: "enumerator",
            source,
        })
}

fn produce(candidates: Candidates, queue: &Sender<String>, stop: &CancellationToken) -> u64 {
    let length = candidates.length();
    let mut queued = 0u64;
    for candidate in candidates {
        let mut pending = candidate;
        loop {
            if stop.is_cancelled() {
                debug!(length, queued, "Enumerator stopped");
                return queued;
            }
            match queue.send_timeout(pending, SEND_POLL) {
                Ok(()) => {
                    queued += 1;
                    break;
                }
                Err(SendTimeoutError::Timeout(back)) => pending = back,
                Err(SendTimeoutError::Disconnected(_)) => {
                    debug!(length, queued, "Enumerator lost its consumers");
                    return queued;
                }
            }
        }
    }
    debug!(length, queued, "Enumerator finished");
    queued
}
