use serde::{Deserialize, Serialize};

/// The JSON object carried in a locked link's fragment.
///
/// Byte fields stay base64 encoded here; [`resolve_record`](crate::resolve_record)
/// decodes them and applies version defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LinkPayload {
    /// Ciphertext with the GCM tag appended.
    #[serde(rename = "e")]
    pub encrypted: String,
    #[serde(rename = "s", default, skip_serializing_if = "Option::is_none")]
    pub salt: Option<String>,
    #[serde(rename = "i", default, skip_serializing_if = "Option::is_none")]
    pub iv: Option<String>,
    #[serde(rename = "v", default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}
