use thiserror::Error;

#[derive(Debug, Error)]
pub enum LinkError {
    #[error("Unable to parse the URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("URL has no fragment to decode")]
    MissingFragment,

    #[error("URL fragment is not valid percent-encoded UTF-8")]
    InvalidFragmentEncoding,

    #[error("Failed to base64 decode the {field}")]
    InvalidBase64 { field: &'static str },

    #[error("Invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Invalid payload: expected object")]
    NotAnObject,

    #[error("Invalid payload: missing {field}")]
    MissingField { field: &'static str },

    #[error("Invalid payload: {field} must be a string")]
    NotAString { field: &'static str },

    #[error("Invalid record: {0}")]
    InvalidRecord(#[from] linklock_crypto::CryptoError),
}
