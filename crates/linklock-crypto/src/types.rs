use crate::error::CryptoError;

/// PBKDF2 rounds used by Link Lock for every record version.
pub const PBKDF2_ITERATIONS: u32 = 100_000;

/// AES-GCM IV length in bytes (96 bits per NIST recommendation).
pub const AES_GCM_IV_LENGTH: usize = 12;

/// AES-GCM tag length in bytes (128 bits).
pub const AES_GCM_TAG_LENGTH: usize = 16;

/// AES key length in bytes (256 bits).
pub const AES_KEY_LENGTH: usize = 32;

/// Salt length used when sealing new records.
pub const SALT_LENGTH: usize = 16;

/// A fully resolved locked-link payload.
///
/// Built once from the decoded link and then shared read-only by every
/// worker. Fields are private so a record cannot change after validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedRecord {
    ciphertext: Vec<u8>,
    salt: Vec<u8>,
    iv: Vec<u8>,
    format_version: Option<String>,
}

impl EncryptedRecord {
    /// Validate and freeze a record.
    ///
    /// # Arguments
    /// * `ciphertext` - AES-GCM output with the 16-byte tag appended
    /// * `salt` - PBKDF2 salt (any length, including empty)
    /// * `iv` - 12-byte GCM nonce
    ///
    /// # Errors
    /// Returns `CryptoError` if the IV is not 12 bytes or the ciphertext is
    /// too short to contain a tag. Such a record could never decrypt.
    pub fn new(ciphertext: Vec<u8>, salt: Vec<u8>, iv: Vec<u8>) -> Result<Self, CryptoError> {
        if iv.len() != AES_GCM_IV_LENGTH {
            return Err(CryptoError::InvalidIvLength {
                expected: AES_GCM_IV_LENGTH,
                got: iv.len(),
            });
        }
        if ciphertext.len() < AES_GCM_TAG_LENGTH {
            return Err(CryptoError::DataTooShort {
                got: ciphertext.len(),
                tag: AES_GCM_TAG_LENGTH,
            });
        }
        Ok(Self {
            ciphertext,
            salt,
            iv,
            format_version: None,
        })
    }

    /// Attach the payload format version the record was decoded from.
    pub fn with_format_version(mut self, version: impl Into<String>) -> Self {
        self.format_version = Some(version.into());
        self
    }

    pub fn ciphertext(&self) -> &[u8] {
        &self.ciphertext
    }

    pub fn salt(&self) -> &[u8] {
        &self.salt
    }

    pub fn iv(&self) -> &[u8] {
        &self.iv
    }

    pub fn format_version(&self) -> Option<&str> {
        self.format_version.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_well_formed_record() {
        let record = EncryptedRecord::new(vec![0u8; 20], vec![1u8; 16], vec![2u8; 12]).unwrap();
        assert_eq!(record.ciphertext().len(), 20);
        assert_eq!(record.salt(), &[1u8; 16]);
        assert_eq!(record.iv(), &[2u8; 12]);
        assert_eq!(record.format_version(), None);
    }

    #[test]
    fn rejects_short_iv() {
        let err = EncryptedRecord::new(vec![0u8; 20], vec![], vec![0u8; 11]).unwrap_err();
        assert!(err.to_string().contains("Invalid IV length"));
    }

    #[test]
    fn rejects_ciphertext_without_tag() {
        let err = EncryptedRecord::new(vec![0u8; 15], vec![], vec![0u8; 12]).unwrap_err();
        assert!(err.to_string().contains("too short"));
    }

    #[test]
    fn tag_only_ciphertext_is_valid() {
        // Empty plaintext seals to just the tag.
        assert!(EncryptedRecord::new(vec![0u8; 16], vec![], vec![0u8; 12]).is_ok());
    }

    #[test]
    fn keeps_format_version() {
        let record = EncryptedRecord::new(vec![0u8; 16], vec![], vec![0u8; 12])
            .unwrap()
            .with_format_version("0.0.1");
        assert_eq!(record.format_version(), Some("0.0.1"));
    }
}
