//! Locked-link payload decoding for Link Lock URLs.
//!
//! A locked link carries its payload in the URL fragment as base64 of a JSON
//! object with base64 fields (`e` ciphertext, `s` salt, `i` IV, `v`
//! version). This crate turns such a URL into a validated
//! [`EncryptedRecord`](linklock_crypto::EncryptedRecord) and back.
//!
//! Decoding is single-shot and deterministic; nothing here retries.

mod error;
mod fragment;
mod payload;
mod types;

pub use error::LinkError;
pub use fragment::{decode_fragment, decode_link, encode_link};
pub use payload::{parse_payload, resolve_record};
pub use types::LinkPayload;

/// Format version whose links may omit the salt and IV.
pub const LEGACY_VERSION: &str = "0.0.1";

/// Salt assumed for version 0.0.1 links that carry none (base64).
pub const LEGACY_SALT: &str = "7Oen+c9fyeukYvYasK5I+Q==";

/// IV assumed for version 0.0.1 links that carry none (base64).
pub const LEGACY_IV: &str = "/+2UaQb/e8pzghB0";
