//! Parallel trial decryption over a shared candidate queue.
//!
//! Every worker is a named OS thread: trials are pure CPU work, so one
//! worker per core is the right amount of parallelism. Workers pull from the
//! bounded queue, count each finished trial, and report exactly once when
//! they stop. The stop token is checked between trials; a trial that has
//! started always runs to completion.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::error::SearchError;
use crate::search::oracle::Oracle;
use crate::search::progress::ProgressHandle;
use crate::search::types::Found;

/// Result of draining one length's queue.
#[derive(Debug)]
pub struct PoolOutcome {
    pub found: Option<Found>,
    /// Trials completed by workers that reported back.
    pub attempts: u64,
}

/// Final word from a worker.
#[derive(Debug)]
enum WorkerReport {
    Found {
        worker: usize,
        password: String,
        plaintext: Vec<u8>,
        attempts: u64,
    },
    /// The queue was closed and drained.
    Exhausted { worker: usize, attempts: u64 },
    /// The stop token fired before the queue ran dry.
    Stopped { worker: usize, attempts: u64 },
    Failed {
        worker: usize,
        error: SearchError,
        attempts: u64,
    },
}

impl WorkerReport {
    fn attempts(&self) -> u64 {
        match self {
            WorkerReport::Found { attempts, .. }
            | WorkerReport::Exhausted { attempts, .. }
            | WorkerReport::Stopped { attempts, .. }
            | WorkerReport::Failed { attempts, .. } => *attempts,
        }
    }
}

struct Worker<O> {
    id: usize,
    oracle: Arc<O>,
    queue: Receiver<String>,
    progress: ProgressHandle,
    stop: CancellationToken,
    reports: Sender<WorkerReport>,
}

impl<O: Oracle> Worker<O> {
    fn run(self) {
        let worker = self.id;
        let mut attempts = 0u64;

        let report = loop {
            if self.stop.is_cancelled() {
                break WorkerReport::Stopped { worker, attempts };
            }
            let candidate = match self.queue.recv() {
                Ok(candidate) => candidate,
                // The producer closes the queue early when it is stopped.
                Err(_) if self.stop.is_cancelled() => {
                    break WorkerReport::Stopped { worker, attempts }
                }
                Err(_) => break WorkerReport::Exhausted { worker, attempts },
            };
            // Success may have been broadcast while we waited on the queue.
            if self.stop.is_cancelled() {
                break WorkerReport::Stopped { worker, attempts };
            }

            let result = self.oracle.attempt(&candidate);
            attempts += 1;
            self.progress.record(1);

            match result {
                Ok(None) => {}
                Ok(Some(plaintext)) => {
                    self.stop.cancel();
                    info!(
                        worker,
                        password = %candidate,
                        plaintext = %String::from_utf8_lossy(&plaintext),
                        "Decrypted link"
                    );
                    break WorkerReport::Found {
                        worker,
                        password: candidate,
                        plaintext,
                        attempts,
                    };
                }
                Err(error) => {
                    self.stop.cancel();
                    break WorkerReport::Failed {
                        worker,
                        error,
                        attempts,
                    };
                }
            }
        };

        // The pool may already have stopped listening after its grace period.
        let _ = self.reports.send(report);
    }
}

/// A fixed number of workers sharing one oracle.
pub struct WorkerPool<O> {
    oracle: Arc<O>,
    workers: usize,
    shutdown_grace: Duration,
}

impl<O: Oracle> WorkerPool<O> {
    /// # Arguments
    /// * `oracle` - Shared read-only decryption oracle
    /// * `workers` - Number of worker threads, at least 1
    /// * `shutdown_grace` - How long to wait for the remaining workers once a
    ///   match or failure has been seen
    pub fn new(oracle: Arc<O>, workers: usize, shutdown_grace: Duration) -> Self {
        Self {
            oracle,
            workers: workers.max(1),
            shutdown_grace,
        }
    }

    /// Drain `queue` for one password length.
    ///
    /// Blocks the calling thread until every worker has reported, or, after
    /// the first match or failure, until the grace period runs out. Workers
    /// still finishing a trial at that point are detached; they observe
    /// `stop` and exit on their own.
    ///
    /// # Errors
    /// Returns the first oracle failure when no worker found the password,
    /// `SearchError::Spawn` if a worker thread cannot be started, and
    /// `SearchError::WorkersLost` if workers died without reporting.
    pub fn run(
        &self,
        length: usize,
        queue: Receiver<String>,
        progress: &ProgressHandle,
        stop: &CancellationToken,
    ) -> Result<PoolOutcome, SearchError> {
        let (report_tx, report_rx) = crossbeam_channel::unbounded();

        for id in 0..self.workers {
            let worker = Worker {
                id,
                oracle: Arc::clone(&self.oracle),
                queue: queue.clone(),
                progress: progress.clone(),
                stop: stop.clone(),
                reports: report_tx.clone(),
            };
            if let Err(source) = thread::Builder::new()
                .name(format!("worker-{id}"))
                .spawn(move || worker.run())
            {
                // Workers already running see the token and wind down.
                stop.cancel();
                return Err(SearchError::Spawn {
                    role: "worker",
                    source,
                });
            }
        }
        debug!(length, workers = self.workers, "Workers started");

        // Only workers may keep the queue and report channel alive.
        drop(queue);
        drop(report_tx);

        self.collect(length, &report_rx, stop)
    }

    fn collect(
        &self,
        length: usize,
        reports: &Receiver<WorkerReport>,
        stop: &CancellationToken,
    ) -> Result<PoolOutcome, SearchError> {
        let mut found: Option<Found> = None;
        let mut failure: Option<SearchError> = None;
        let mut attempts = 0u64;
        let mut pending = self.workers;
        let mut deadline: Option<Instant> = None;

        while pending > 0 {
            let report = match deadline {
                None => match reports.recv() {
                    Ok(report) => report,
                    Err(_) => return Err(SearchError::WorkersLost(pending)),
                },
                Some(at) => match reports.recv_deadline(at) {
                    Ok(report) => report,
                    Err(RecvTimeoutError::Timeout) => {
                        warn!(length, pending, "Detaching workers still inside a trial");
                        break;
                    }
                    Err(RecvTimeoutError::Disconnected) => {
                        warn!(length, pending, "Workers exited without reporting");
                        break;
                    }
                },
            };
            pending -= 1;
            attempts += report.attempts();

            match report {
                WorkerReport::Found {
                    worker,
                    password,
                    plaintext,
                    ..
                } => {
                    if found.is_none() {
                        found = Some(Found {
                            password,
                            plaintext,
                            length,
                        });
                    } else {
                        warn!(worker, password = %password, "Ignoring additional match");
                    }
                }
                WorkerReport::Failed { worker, error, .. } => {
                    error!(worker, error = %error, "Worker failed");
                    failure.get_or_insert(error);
                }
                WorkerReport::Exhausted { worker, .. } | WorkerReport::Stopped { worker, .. } => {
                    debug!(worker, length, "Worker finished");
                }
            }

            if deadline.is_none() && (found.is_some() || failure.is_some()) {
                stop.cancel();
                deadline = Some(Instant::now() + self.shutdown_grace);
            }
        }

        if found.is_some() {
            return Ok(PoolOutcome { found, attempts });
        }
        if let Some(error) = failure {
            return Err(error);
        }
        Ok(PoolOutcome {
            found: None,
            attempts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Charset;
    use crate::search::enumerator::Candidates;
    use linklock_crypto::CryptoError;
    use std::sync::atomic::{AtomicU64, Ordering};

    /// Matches one password, optionally sleeping on a chosen candidate.
    struct FakeOracle {
        password: String,
        slow: Option<(String, Duration)>,
        calls: AtomicU64,
    }

    impl FakeOracle {
        fn new(password: &str) -> Self {
            Self {
                password: password.to_string(),
                slow: None,
                calls: AtomicU64::new(0),
            }
        }
    }

    impl Oracle for FakeOracle {
        fn attempt(&self, candidate: &str) -> Result<Option<Vec<u8>>, SearchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some((slow, delay)) = &self.slow {
                if candidate == slow {
                    thread::sleep(*delay);
                }
            }
            Ok((candidate == self.password).then(|| format!("plain:{candidate}").into_bytes()))
        }
    }

    /// Matches every candidate that starts with `prefix`.
    struct PrefixOracle(&'static str);

    impl Oracle for PrefixOracle {
        fn attempt(&self, candidate: &str) -> Result<Option<Vec<u8>>, SearchError> {
            Ok(candidate
                .starts_with(self.0)
                .then(|| candidate.as_bytes().to_vec()))
        }
    }

    struct BrokenOracle;

    impl Oracle for BrokenOracle {
        fn attempt(&self, _candidate: &str) -> Result<Option<Vec<u8>>, SearchError> {
            Err(CryptoError::InvalidIvLength {
                expected: 12,
                got: 0,
            }
            .into())
        }
    }

    fn filled_queue(symbols: &str, length: usize) -> Receiver<String> {
        let candidates: Vec<String> =
            Candidates::new(&Charset::new(symbols).unwrap(), length).collect();
        let (tx, rx) = crossbeam_channel::bounded(candidates.len());
        for c in candidates {
            tx.send(c).unwrap();
        }
        rx
    }

    fn drain_counts(rx: &mut tokio::sync::mpsc::UnboundedReceiver<u64>) -> u64 {
        let mut total = 0;
        while let Ok(n) = rx.try_recv() {
            total += n;
        }
        total
    }

    #[test]
    fn exhausts_queue_and_counts_every_trial() {
        let oracle = Arc::new(FakeOracle::new("zzz"));
        let pool = WorkerPool::new(Arc::clone(&oracle), 4, Duration::from_secs(1));
        let (progress, mut counts) = ProgressHandle::channel();

        let outcome = pool
            .run(3, filled_queue("abc", 3), &progress, &CancellationToken::new())
            .unwrap();

        assert!(outcome.found.is_none());
        assert_eq!(outcome.attempts, 27);
        assert_eq!(oracle.calls.load(Ordering::SeqCst), 27);
        assert_eq!(drain_counts(&mut counts), 27);
    }

    #[test]
    fn finds_password_and_stops() {
        let oracle = Arc::new(FakeOracle::new("ba"));
        let pool = WorkerPool::new(oracle, 2, Duration::from_secs(1));
        let (progress, mut counts) = ProgressHandle::channel();
        let stop = CancellationToken::new();

        let outcome = pool.run(2, filled_queue("abc", 2), &progress, &stop).unwrap();

        let found = outcome.found.unwrap();
        assert_eq!(found.password, "ba");
        assert_eq!(found.plaintext, b"plain:ba");
        assert_eq!(found.length, 2);
        assert!(stop.is_cancelled());
        // The successful trial is counted too.
        assert!(outcome.attempts >= 1);
        assert!(drain_counts(&mut counts) >= 1);
    }

    #[test]
    fn empty_password_is_found_at_length_zero() {
        let pool = WorkerPool::new(Arc::new(FakeOracle::new("")), 3, Duration::from_secs(1));
        let (progress, _counts) = ProgressHandle::channel();
        let outcome = pool
            .run(0, filled_queue("ab", 0), &progress, &CancellationToken::new())
            .unwrap();
        assert_eq!(outcome.found.unwrap().password, "");
        assert_eq!(outcome.attempts, 1);
    }

    #[test]
    fn first_of_several_matches_wins() {
        let pool = WorkerPool::new(Arc::new(PrefixOracle("b")), 4, Duration::from_secs(1));
        let (progress, _counts) = ProgressHandle::channel();
        let outcome = pool
            .run(3, filled_queue("ab", 3), &progress, &CancellationToken::new())
            .unwrap();
        let found = outcome.found.unwrap();
        assert!(found.password.starts_with('b'));
        assert_eq!(found.plaintext, found.password.as_bytes());
    }

    #[test]
    fn oracle_failure_aborts() {
        let pool = WorkerPool::new(Arc::new(BrokenOracle), 2, Duration::from_secs(1));
        let (progress, _counts) = ProgressHandle::channel();
        let stop = CancellationToken::new();
        let err = pool
            .run(2, filled_queue("abc", 2), &progress, &stop)
            .unwrap_err();
        assert!(matches!(err, SearchError::Oracle(_)));
        assert!(stop.is_cancelled());
    }

    #[test]
    fn does_not_wait_past_grace_for_slow_workers() {
        let oracle = FakeOracle {
            slow: Some(("aa".to_string(), Duration::from_secs(5))),
            ..FakeOracle::new("ab")
        };
        let pool = WorkerPool::new(Arc::new(oracle), 2, Duration::from_millis(100));
        let (progress, _counts) = ProgressHandle::channel();

        let started = Instant::now();
        let outcome = pool
            .run(2, filled_queue("ab", 2), &progress, &CancellationToken::new())
            .unwrap();

        assert_eq!(outcome.found.unwrap().password, "ab");
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[test]
    fn stopped_pool_starts_no_trials() {
        let oracle = Arc::new(FakeOracle::new("zz"));
        let pool = WorkerPool::new(Arc::clone(&oracle), 3, Duration::from_secs(1));
        let (progress, _counts) = ProgressHandle::channel();
        let stop = CancellationToken::new();
        stop.cancel();

        let outcome = pool.run(2, filled_queue("abc", 2), &progress, &stop).unwrap();
        assert!(outcome.found.is_none());
        assert_eq!(outcome.attempts, 0);
        assert_eq!(oracle.calls.load(Ordering::SeqCst), 0);
    }
}
