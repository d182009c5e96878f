//! Exhaustive passphrase recovery for Link Lock URLs.
//!
//! A locked link carries an AES-256-GCM ciphertext whose key is derived from
//! a passphrase with PBKDF2. The search walks every candidate over a charset,
//! shortest first, and trial-decrypts each one on every available core until
//! one authenticates.
//!
//! Decoding the link lives in `linklock-link`; the cipher lives in
//! `linklock-crypto`. This crate owns the search engine.

pub mod config;
pub mod error;
pub mod search;

pub use config::{
    default_workers, Charset, SearchConfig, DEFAULT_CHARSET, DEFAULT_PROGRESS_INTERVAL,
    DEFAULT_QUEUE_CAPACITY, DEFAULT_SHUTDOWN_GRACE,
};
pub use error::SearchError;
pub use search::{
    LinkOracle, Oracle, ProgressHandle, ProgressReporter, SearchCoordinator, SearchOutcome,
    SearchReport, StatusLine,
};
