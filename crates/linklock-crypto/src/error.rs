use thiserror::Error;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("Invalid key length: expected {expected} bytes, got {got}")]
    InvalidKeyLength { expected: usize, got: usize },

    #[error("Invalid IV length: expected {expected} bytes, got {got}")]
    InvalidIvLength { expected: usize, got: usize },

    #[error("Encrypted data too short: {got} bytes cannot hold a {tag}-byte tag")]
    DataTooShort { got: usize, tag: usize },

    #[error("Key derivation failed: {0}")]
    KdfFailed(String),

    #[error("Cipher setup failed: {0}")]
    CipherSetup(String),

    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Random number generation failed: {0}")]
    RngFailed(String),
}
