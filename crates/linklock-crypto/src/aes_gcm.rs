//! AES-256-GCM trial decryption for locked links.
//!
//! Record layout: ciphertext+tag sealed under
//! `PBKDF2-HMAC-SHA256(password, salt, 100_000)` with a 12-byte IV and no AAD.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use zeroize::Zeroize;

use crate::error::CryptoError;
use crate::kdf::derive_key;
use crate::types::{
    EncryptedRecord, AES_GCM_IV_LENGTH, AES_KEY_LENGTH, PBKDF2_ITERATIONS, SALT_LENGTH,
};

/// Generate a random 12-byte IV for AES-GCM.
pub fn generate_iv() -> Result<[u8; AES_GCM_IV_LENGTH], CryptoError> {
    let mut iv = [0u8; AES_GCM_IV_LENGTH];
    getrandom::getrandom(&mut iv).map_err(|e| CryptoError::RngFailed(e.to_string()))?;
    Ok(iv)
}

/// Generate a random PBKDF2 salt.
pub fn generate_salt() -> Result<[u8; SALT_LENGTH], CryptoError> {
    let mut salt = [0u8; SALT_LENGTH];
    getrandom::getrandom(&mut salt).map_err(|e| CryptoError::RngFailed(e.to_string()))?;
    Ok(salt)
}

fn cipher_for(key: &[u8]) -> Result<Aes256Gcm, CryptoError> {
    if key.len() != AES_KEY_LENGTH {
        return Err(CryptoError::InvalidKeyLength {
            expected: AES_KEY_LENGTH,
            got: key.len(),
        });
    }
    Aes256Gcm::new_from_slice(key).map_err(|e| CryptoError::CipherSetup(e.to_string()))
}

/// Try one candidate passphrase against a record.
///
/// Returns `Ok(Some(plaintext))` when the tag authenticates and `Ok(None)`
/// on a tag mismatch, which is the normal outcome for a wrong password.
///
/// # Errors
/// Returns `CryptoError` only when the key or cipher cannot be set up at
/// all. That never depends on the candidate, so it means the record itself
/// is unusable and the whole search must stop.
pub fn try_decrypt(
    password: &str,
    record: &EncryptedRecord,
) -> Result<Option<Vec<u8>>, CryptoError> {
    let mut key = derive_key(password.as_bytes(), record.salt(), PBKDF2_ITERATIONS)?;
    let opened = open(&key, record.iv(), record.ciphertext());
    key.zeroize();
    opened
}

fn open(key: &[u8], iv: &[u8], ciphertext: &[u8]) -> Result<Option<Vec<u8>>, CryptoError> {
    if iv.len() != AES_GCM_IV_LENGTH {
        return Err(CryptoError::InvalidIvLength {
            expected: AES_GCM_IV_LENGTH,
            got: iv.len(),
        });
    }
    let cipher = cipher_for(key)?;
    let nonce = Nonce::from_slice(iv);

    // The aead error is opaque: a wrong key and a tampered blob look the same.
    Ok(cipher.decrypt(nonce, ciphertext).ok())
}

/// Seal `plaintext` under `password` with a caller-chosen salt and IV.
pub fn seal_with(
    password: &str,
    plaintext: &[u8],
    salt: &[u8],
    iv: &[u8],
) -> Result<EncryptedRecord, CryptoError> {
    if iv.len() != AES_GCM_IV_LENGTH {
        return Err(CryptoError::InvalidIvLength {
            expected: AES_GCM_IV_LENGTH,
            got: iv.len(),
        });
    }
    let mut key = derive_key(password.as_bytes(), salt, PBKDF2_ITERATIONS)?;
    let sealed = cipher_for(&key).and_then(|cipher| {
        cipher
            .encrypt(Nonce::from_slice(iv), plaintext)
            .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))
    });
    key.zeroize();

    EncryptedRecord::new(sealed?, salt.to_vec(), iv.to_vec())
}

/// Seal `plaintext` under `password` with a fresh random salt and IV.
pub fn encrypt_record(password: &str, plaintext: &[u8]) -> Result<EncryptedRecord, CryptoError> {
    let salt = generate_salt()?;
    let iv = generate_iv()?;
    seal_with(password, plaintext, &salt, &iv)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AES_GCM_TAG_LENGTH;

    const LINK_PLAINTEXT: &[u8] = b"https://jstrieb.github.io/link-lock/create/";

    fn known_record() -> EncryptedRecord {
        EncryptedRecord::new(
            hex::decode(
                "5c8e1efc5046d6b27d71104467f4bdf09347c5ba7b21c14d2de1d2a9290c2229\
                 a67fc6716511eb436f887dc61b73137effc6626b4c0f69aaa95cdb",
            )
            .unwrap(),
            hex::decode("d900ba07ea70d6b2fc2836d64bfb9f8e").unwrap(),
            hex::decode("c016c562dafc3d8311fa66ed").unwrap(),
        )
        .unwrap()
    }

    fn random_password() -> String {
        const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
        let mut bytes = [0u8; 8];
        getrandom::getrandom(&mut bytes).unwrap();
        bytes
            .iter()
            .map(|b| ALPHABET[*b as usize % ALPHABET.len()] as char)
            .collect()
    }

    #[test]
    fn decrypts_known_link() {
        let plaintext = try_decrypt("test", &known_record()).unwrap();
        assert_eq!(plaintext.as_deref(), Some(LINK_PLAINTEXT));
    }

    #[test]
    fn wrong_password_is_not_an_error() {
        assert_eq!(try_decrypt("tess", &known_record()).unwrap(), None);
        assert_eq!(try_decrypt("", &known_record()).unwrap(), None);
    }

    #[test]
    fn same_inputs_same_result() {
        let record = known_record();
        assert_eq!(
            try_decrypt("test", &record).unwrap(),
            try_decrypt("test", &record).unwrap()
        );
        assert_eq!(
            try_decrypt("nope", &record).unwrap(),
            try_decrypt("nope", &record).unwrap()
        );
    }

    #[test]
    fn random_wrong_passwords_fail() {
        let record = known_record();
        for _ in 0..100 {
            // 8 random symbols never collide with the 4-letter password.
            let candidate = random_password();
            assert_eq!(try_decrypt(&candidate, &record).unwrap(), None, "{candidate}");
        }
    }

    #[test]
    fn seal_round_trip() {
        let record = encrypt_record("ab", b"https://example.com/").unwrap();
        assert_eq!(record.salt().len(), SALT_LENGTH);
        assert_eq!(record.iv().len(), AES_GCM_IV_LENGTH);
        assert_eq!(
            record.ciphertext().len(),
            b"https://example.com/".len() + AES_GCM_TAG_LENGTH
        );
        assert_eq!(
            try_decrypt("ab", &record).unwrap().as_deref(),
            Some(&b"https://example.com/"[..])
        );
        assert_eq!(try_decrypt("ba", &record).unwrap(), None);
    }

    #[test]
    fn seal_with_reproduces_known_link() {
        let reference = known_record();
        let sealed = seal_with("test", LINK_PLAINTEXT, reference.salt(), reference.iv()).unwrap();
        assert_eq!(sealed, reference);
    }

    #[test]
    fn seal_with_rejects_bad_iv() {
        let err = seal_with("pw", b"data", b"salt", &[0u8; 16]).unwrap_err();
        assert!(err.to_string().contains("Invalid IV length"));
    }

    #[test]
    fn empty_password_and_plaintext() {
        let record = encrypt_record("", b"").unwrap();
        assert_eq!(try_decrypt("", &record).unwrap(), Some(Vec::new()));
    }

    #[test]
    fn tampered_ciphertext_fails() {
        let reference = known_record();
        let mut ciphertext = reference.ciphertext().to_vec();
        let last = ciphertext.len() - 1;
        ciphertext[last] ^= 0xff;
        let tampered =
            EncryptedRecord::new(ciphertext, reference.salt().to_vec(), reference.iv().to_vec())
                .unwrap();
        assert_eq!(try_decrypt("test", &tampered).unwrap(), None);
    }

    #[test]
    fn open_rejects_bad_key_length() {
        let err = open(&[0u8; 16], &[0u8; 12], &[0u8; 32]).unwrap_err();
        assert!(err.to_string().contains("Invalid key length"));
    }

    #[test]
    fn random_salts_differ() {
        assert_ne!(generate_salt().unwrap(), generate_salt().unwrap());
        assert_ne!(generate_iv().unwrap(), generate_iv().unwrap());
    }
}
