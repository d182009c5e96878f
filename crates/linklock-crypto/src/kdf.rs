//! PBKDF2-HMAC-SHA256 key derivation.

use hmac::Hmac;
use pbkdf2::pbkdf2;
use sha2::Sha256;

use crate::error::CryptoError;
use crate::types::AES_KEY_LENGTH;

/// Derive a 256-bit key using PBKDF2-HMAC-SHA256.
///
/// # Arguments
/// * `password` - Candidate passphrase bytes
/// * `salt` - Record salt
/// * `iterations` - Round count, must be at least 1
///
/// # Returns
/// 32-byte derived key. Callers should zeroize it once done.
pub fn derive_key(
    password: &[u8],
    salt: &[u8],
    iterations: u32,
) -> Result<[u8; AES_KEY_LENGTH], CryptoError> {
    if iterations == 0 {
        return Err(CryptoError::KdfFailed("PBKDF2 iterations must be >= 1".into()));
    }

    let mut key = [0u8; AES_KEY_LENGTH];
    pbkdf2::<Hmac<Sha256>>(password, salt, iterations, &mut key)
        .map_err(|e| CryptoError::KdfFailed(format!("PBKDF2 failed: {e}")))?;
    Ok(key)
}
