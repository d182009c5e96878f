//! Attempt counting and the periodic throughput line.
//!
//! Workers never touch a shared counter. Each completed trial is a message on
//! an unbounded channel; a single reporter task owns the tally, so the total
//! is a plain sum regardless of arrival order.

use std::io::{self, Write};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

/// Point-in-time view of the search throughput.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressSnapshot {
    pub elapsed: Duration,
    pub attempts: u64,
    /// `attempts / elapsed` in trials per second; 0 before any time passes.
    pub rate: f64,
}

/// Running total owned by the reporter task.
#[derive(Debug, Clone)]
pub struct ProgressTally {
    attempts: u64,
    started: Instant,
}

impl ProgressTally {
    pub fn new() -> Self {
        Self {
            attempts: 0,
            started: Instant::now(),
        }
    }

    pub fn add(&mut self, attempts: u64) {
        self.attempts += attempts;
    }

    pub fn attempts(&self) -> u64 {
        self.attempts
    }

    pub fn snapshot_at(&self, now: Instant) -> ProgressSnapshot {
        let elapsed = now.saturating_duration_since(self.started);
        let secs = elapsed.as_secs_f64();
        let rate = if secs > 0.0 {
            self.attempts as f64 / secs
        } else {
            0.0
        };
        ProgressSnapshot {
            elapsed,
            attempts: self.attempts,
            rate,
        }
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        self.snapshot_at(Instant::now())
    }
}

impl Default for ProgressTally {
    fn default() -> Self {
        Self::new()
    }
}

/// Destination for progress snapshots.
pub trait ProgressSink: Send + 'static {
    fn report(&mut self, snapshot: &ProgressSnapshot);

    /// Called once with the final tally when the reporter shuts down.
    fn finish(&mut self, _snapshot: &ProgressSnapshot) {}
}

/// Format a snapshot as the single status line.
///
/// Trailing spaces cover leftovers from a longer previous line.
pub fn format_status(snapshot: &ProgressSnapshot) -> String {
    format!(
        "Tried {} in {:.1?} at {}/s   ",
        snapshot.attempts, snapshot.elapsed, snapshot.rate as u64
    )
}

/// Sink that rewrites one terminal line in place.
pub struct StatusLine<W> {
    out: W,
}

impl StatusLine<io::Stderr> {
    pub fn stderr() -> Self {
        Self { out: io::stderr() }
    }
}

impl<W: Write> StatusLine<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write + Send + 'static> ProgressSink for StatusLine<W> {
    fn report(&mut self, snapshot: &ProgressSnapshot) {
        // A broken terminal must not stop the search.
        let _ = write!(self.out, "\r{}", format_status(snapshot));
        let _ = self.out.flush();
    }

    fn finish(&mut self, snapshot: &ProgressSnapshot) {
        let _ = writeln!(self.out, "\r{}", format_status(snapshot));
        let _ = self.out.flush();
    }
}

/// Cloneable sender side of the attempt counter.
#[derive(Debug, Clone)]
pub struct ProgressHandle {
    tx: mpsc::UnboundedSender<u64>,
}

impl ProgressHandle {
    /// A handle plus the raw receiving end, for callers that aggregate
    /// attempts themselves instead of running a [`ProgressReporter`].
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<u64>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Count `attempts` completed trials. Never blocks; callable from any
    /// thread.
    pub fn record(&self, attempts: u64) {
        // The reporter only goes away at shutdown; late counts are moot.
        let _ = self.tx.send(attempts);
    }
}

/// Background task printing throughput on a fixed tick.
pub struct ProgressReporter;

impl ProgressReporter {
    /// Start the reporter on the current tokio runtime.
    ///
    /// The task runs until every [`ProgressHandle`] clone is dropped, then
    /// hands its final tally back through the join handle.
    pub fn spawn<S: ProgressSink>(
        interval: Duration,
        sink: S,
    ) -> (ProgressHandle, JoinHandle<ProgressTally>) {
        let (handle, rx) = ProgressHandle::channel();
        let task = tokio::spawn(report_progress(rx, interval, sink));
        (handle, task)
    }
}

async fn report_progress<S: ProgressSink>(
    mut counts: mpsc::UnboundedReceiver<u64>,
    interval: Duration,
    mut sink: S,
) -> ProgressTally {
    let mut tally = ProgressTally::new();
    // `interval` fires immediately on the first tick; start one period out.
    let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            count = counts.recv() => match count {
                Some(n) => tally.add(n),
                None => break,
            },
            _ = ticker.tick() => sink.report(&tally.snapshot()),
        }
    }

    sink.finish(&tally.snapshot());
    tally
}
