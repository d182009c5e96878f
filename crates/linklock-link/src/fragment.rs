use linklock_crypto::EncryptedRecord;
use url::Url;

use crate::error::LinkError;
use crate::payload::{decode_field, encode_field, parse_payload, resolve_record};
use crate::types::LinkPayload;

/// Base for links pasted without a scheme or host, such as a bare `#...`.
const RELATIVE_BASE: &str = "https://localhost/";

/// Decode a locked-link URL into a validated record.
///
/// Pipeline: URL → fragment → percent-decode → base64 → JSON → record
///
/// Scheme-less input (`host/path#...` or just `#...`) is resolved against a
/// placeholder base; only the fragment matters.
///
/// # Errors
/// Returns `LinkError` for a malformed URL, a missing fragment, invalid
/// base64 or JSON, or a payload that cannot form a record.
pub fn decode_link(raw_url: &str) -> Result<EncryptedRecord, LinkError> {
    let url = parse_url(raw_url.trim())?;
    let fragment = url
        .fragment()
        .filter(|f| !f.is_empty())
        .ok_or(LinkError::MissingFragment)?;
    let payload = decode_fragment(fragment)?;
    resolve_record(&payload)
}

fn parse_url(raw_url: &str) -> Result<Url, LinkError> {
    match Url::parse(raw_url) {
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            let base = Url::parse(RELATIVE_BASE)?;
            Ok(Url::options().base_url(Some(&base)).parse(raw_url)?)
        }
        parsed => Ok(parsed?),
    }
}

/// Decode the fragment portion of a locked link (without the leading `#`).
pub fn decode_fragment(fragment: &str) -> Result<LinkPayload, LinkError> {
    let unescaped =
        urlencoding::decode(fragment).map_err(|_| LinkError::InvalidFragmentEncoding)?;
    let json_bytes = decode_field(&unescaped, "URL fragment")?;
    let json: serde_json::Value = serde_json::from_slice(&json_bytes)?;
    parse_payload(&json)
}

/// Build a locked link for `record` on top of `base_url`.
///
/// The salt and IV are always written out, so the link does not depend on
/// version defaults even when `record` carries a legacy version.
pub fn encode_link(base_url: &str, record: &EncryptedRecord) -> Result<String, LinkError> {
    let mut url = Url::parse(base_url)?;
    let payload = LinkPayload {
        encrypted: encode_field(record.ciphertext()),
        salt: Some(encode_field(record.salt())),
        iv: Some(encode_field(record.iv())),
        version: record.format_version().map(str::to_string),
    };
    let json = serde_json::to_vec(&payload)?;
    url.set_fragment(Some(&encode_field(&json)));
    Ok(url.into())
}
