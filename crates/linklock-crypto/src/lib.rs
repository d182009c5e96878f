//! Key derivation and authenticated decryption for Link Lock records.
//!
//! A record is sealed with AES-256-GCM under a key derived from the
//! passphrase by PBKDF2-HMAC-SHA256 (100,000 rounds). Trial decryption is a
//! pure function of `(password, record)`, safe to call from many threads.

pub mod aes_gcm;
pub mod error;
pub mod kdf;
pub mod types;

pub use aes_gcm::{encrypt_record, generate_iv, generate_salt, seal_with, try_decrypt};
pub use error::CryptoError;
pub use kdf::derive_key;
pub use types::{
    EncryptedRecord, AES_GCM_IV_LENGTH, AES_GCM_TAG_LENGTH, AES_KEY_LENGTH, PBKDF2_ITERATIONS,
    SALT_LENGTH,
};
