use thiserror::Error;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Charset must contain at least one symbol")]
    EmptyCharset,

    #[error("Charset repeats symbol {0:?}")]
    DuplicateSymbol(char),

    #[error("Invalid search configuration: {0}")]
    InvalidConfig(&'static str),

    #[error("Decryption oracle failed: {0}")]
    Oracle(#[from] linklock_crypto::CryptoError),

    #[error("Failed to spawn {role} thread: {source}")]
    Spawn {
        role: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("{0} worker(s) exited without reporting")]
    WorkersLost(usize),

    #[error("Search task failed: {0}")]
    Join(String),
}
