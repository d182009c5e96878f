//! The decryption oracle seam between the search engine and the cipher.

use std::sync::Arc;

use linklock_crypto::{try_decrypt, EncryptedRecord};

use crate::error::SearchError;

/// Answers whether a candidate is the password.
///
/// Implementations must be pure with respect to the candidate: the same
/// input always gives the same answer. They are called concurrently from
/// every worker thread.
pub trait Oracle: Send + Sync + 'static {
    /// `Ok(Some(plaintext))` on a match, `Ok(None)` on a miss.
    ///
    /// An `Err` means no candidate can ever succeed and aborts the search.
    fn attempt(&self, candidate: &str) -> Result<Option<Vec<u8>>, SearchError>;
}

/// Oracle backed by PBKDF2 + AES-256-GCM trial decryption of a locked link.
#[derive(Debug, Clone)]
pub struct LinkOracle {
    record: Arc<EncryptedRecord>,
}

impl LinkOracle {
    pub fn new(record: EncryptedRecord) -> Self {
        Self {
            record: Arc::new(record),
        }
    }

    pub fn record(&self) -> &EncryptedRecord {
        &self.record
    }
}

impl Oracle for LinkOracle {
    fn attempt(&self, candidate: &str) -> Result<Option<Vec<u8>>, SearchError> {
        Ok(try_decrypt(candidate, &self.record)?)
    }
}
