//! Length escalation: search 0, 1, 2, ... until a candidate decrypts.
//!
//! Each length gets its own queue, enumerator thread, worker pool and stop
//! token. Nothing carries over between lengths or between runs.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::SearchConfig;
use crate::error::SearchError;
use crate::search::enumerator::{spawn_producer, Candidates};
use crate::search::oracle::Oracle;
use crate::search::pool::{PoolOutcome, WorkerPool};
use crate::search::progress::ProgressHandle;
use crate::search::types::{
    Keyspace, LengthReport, SearchOutcome, SearchReport, SearchState, SearchStatus,
};

pub struct SearchCoordinator<O> {
    config: SearchConfig,
    oracle: Arc<O>,
    progress: ProgressHandle,
    cancel: CancellationToken,
}

impl<O: Oracle> SearchCoordinator<O> {
    /// # Errors
    /// Returns `SearchError::InvalidConfig` if `config` does not validate.
    pub fn new(
        config: SearchConfig,
        oracle: O,
        progress: ProgressHandle,
    ) -> Result<Self, SearchError> {
        config.validate()?;
        Ok(Self {
            config,
            oracle: Arc::new(oracle),
            progress,
            cancel: CancellationToken::new(),
        })
    }

    /// Stop the run when `token` fires.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Search increasing lengths until a match, cancellation, or
    /// `max_length` is exhausted. Without `max_length` this only returns on a
    /// match, cancellation, or error.
    pub async fn run(&self) -> Result<SearchReport, SearchError> {
        let charset = &self.config.charset;
        let mut state = SearchState::start(charset);
        let mut lengths = Vec::new();

        loop {
            if self.cancel.is_cancelled() {
                return Ok(SearchReport {
                    outcome: SearchOutcome::Cancelled,
                    lengths,
                });
            }
            if let Some(max_length) = self.config.max_length {
                if state.length() > max_length {
                    return Ok(SearchReport {
                        outcome: SearchOutcome::Exhausted { max_length },
                        lengths,
                    });
                }
            }

            info!(
                length = state.length(),
                keyspace = %Keyspace(state.keyspace()),
                "Trying passwords"
            );
            let outcome = self.search_length(state.length()).await?;
            if outcome.found.is_some() {
                state.mark_found();
            } else if !self.cancel.is_cancelled() {
                // Workers only stop early on a match or a cancellation.
                state.mark_exhausted();
            }
            lengths.push(LengthReport::from_state(&state, outcome.attempts));

            if let Some(found) = outcome.found {
                return Ok(SearchReport {
                    outcome: SearchOutcome::Found(found),
                    lengths,
                });
            }
            if state.status() == SearchStatus::InProgress {
                info!(
                    length = state.length(),
                    attempts = outcome.attempts,
                    "Search cancelled"
                );
                return Ok(SearchReport {
                    outcome: SearchOutcome::Cancelled,
                    lengths,
                });
            }

            debug!(
                length = state.length(),
                attempts = outcome.attempts,
                "Length exhausted"
            );
            state = state.advance(charset);
        }
    }

    async fn search_length(&self, length: usize) -> Result<PoolOutcome, SearchError> {
        let stop = self.cancel.child_token();
        let (tx, rx) = crossbeam_channel::bounded(self.config.queue_capacity);
        let producer = spawn_producer(
            Candidates::new(&self.config.charset, length),
            tx,
            stop.clone(),
        )?;

        let pool = WorkerPool::new(
            Arc::clone(&self.oracle),
            self.config.workers,
            self.config.shutdown_grace,
        );
        let progress = self.progress.clone();
        let pool_stop = stop.clone();
        let outcome =
            tokio::task::spawn_blocking(move || pool.run(length, rx, &progress, &pool_stop))
                .await
                .map_err(|e| SearchError::Join(e.to_string()));

        // Release the enumerator if it is still waiting on a full queue.
        stop.cancel();
        let queued = tokio::task::spawn_blocking(move || producer.join())
            .await
            .map_err(|e| SearchError::Join(e.to_string()))?
            .map_err(|_| SearchError::Join("enumerator thread panicked".into()))?;

        let outcome = outcome??;
        debug!(length, queued, attempts = outcome.attempts, "Length finished");
        Ok(outcome)
    }
}
