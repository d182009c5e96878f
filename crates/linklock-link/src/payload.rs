use base64ct::{Base64, Encoding};
use linklock_crypto::EncryptedRecord;

use crate::error::LinkError;
use crate::types::LinkPayload;
use crate::{LEGACY_IV, LEGACY_SALT, LEGACY_VERSION};

/// Validate and parse a JSON value as a locked-link payload.
///
/// Only `e` is required. `s`, `i` and `v` are optional strings; an empty
/// string is treated the same as an absent field.
///
/// # Errors
/// Returns `LinkError` if the JSON is not an object, `e` is missing or
/// empty, or any present field is not a string.
pub fn parse_payload(json: &serde_json::Value) -> Result<LinkPayload, LinkError> {
    let obj = json.as_object().ok_or(LinkError::NotAnObject)?;

    let encrypted = optional_string(obj, "e")?.ok_or(LinkError::MissingField { field: "e" })?;

    Ok(LinkPayload {
        encrypted,
        salt: optional_string(obj, "s")?,
        iv: optional_string(obj, "i")?,
        version: optional_string(obj, "v")?,
    })
}

fn optional_string(
    obj: &serde_json::Map<String, serde_json::Value>,
    field: &'static str,
) -> Result<Option<String>, LinkError> {
    match obj.get(field) {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::String(s)) if s.is_empty() => Ok(None),
        Some(serde_json::Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(LinkError::NotAString { field }),
    }
}

/// Resolve a payload into an immutable record.
///
/// Salt and IV fall back to the legacy defaults when the payload omits them
/// and declares version 0.0.1. The resolved values are frozen in the record.
pub fn resolve_record(payload: &LinkPayload) -> Result<EncryptedRecord, LinkError> {
    let legacy = payload.version.as_deref() == Some(LEGACY_VERSION);

    let salt = match (payload.salt.as_deref(), legacy) {
        (Some(s), _) => s,
        (None, true) => LEGACY_SALT,
        (None, false) => return Err(LinkError::MissingField { field: "s" }),
    };
    let iv = match (payload.iv.as_deref(), legacy) {
        (Some(i), _) => i,
        (None, true) => LEGACY_IV,
        (None, false) => return Err(LinkError::MissingField { field: "i" }),
    };

    let salt = decode_field(salt, "salt")?;
    let iv = decode_field(iv, "IV")?;
    let ciphertext = decode_field(&payload.encrypted, "ciphertext")?;

    let record = EncryptedRecord::new(ciphertext, salt, iv)?;
    Ok(match &payload.version {
        Some(version) => record.with_format_version(version.clone()),
        None => record,
    })
}

pub(crate) fn decode_field(value: &str, field: &'static str) -> Result<Vec<u8>, LinkError> {
    Base64::decode_vec(value).map_err(|_| LinkError::InvalidBase64 { field })
}

pub(crate) fn encode_field(data: &[u8]) -> String {
    Base64::encode_string(data)
}
