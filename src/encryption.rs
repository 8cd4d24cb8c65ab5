// Encryption utilities for diary notes at rest (AES-256-GCM)
// Each user gets a key derived from the master secret with HKDF-SHA256, salted by uid.

use aes_gcm::{
    aead::{Aead, AeadCore, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use hkdf::Hkdf;
use sha2::Sha256;

const KEY_INFO: &[u8] = b"diary-note-encryption";
const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;

/// Derives a user-specific 32-byte key from the master secret and user ID (salt).
fn derive_key(master_secret: &[u8], uid: &str) -> Result<[u8; 32], String> {
    let hk = Hkdf::<Sha256>::new(Some(uid.as_bytes()), master_secret);
    let mut key = [0u8; 32];
    hk.expand(KEY_INFO, &mut key)
        .map_err(|e| format!("HKDF expand failed: {}", e))?;
    Ok(key)
}

fn cipher_for(master_secret: &[u8], uid: &str) -> Result<Aes256Gcm, String> {
    let key = derive_key(master_secret, uid)?;
    Aes256Gcm::new_from_slice(&key).map_err(|e| format!("Invalid key length: {}", e))
}

/// Encrypts `plaintext` for `uid`.
/// Format: base64(12-byte nonce + ciphertext + auth tag)
pub fn encrypt(plaintext: &str, uid: &str, master_secret: &[u8]) -> Result<String, String> {
    if plaintext.is_empty() {
        return Ok(String::new());
    }

    let cipher = cipher_for(master_secret, uid)?;
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
    let ciphertext = cipher
        .encrypt(&nonce, plaintext.as_bytes())
        .map_err(|e| format!("Encryption failed: {:?}", e))?;

    let mut payload = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    payload.extend_from_slice(&nonce);
    payload.extend_from_slice(&ciphertext);
    Ok(BASE64.encode(payload))
}

/// Decrypts a base64 encoded string using a user-specific key.
/// Returns the original on failure, so notes written before encryption was
/// enabled still read back.
pub fn decrypt(encrypted_data: &str, uid: &str, master_secret: &[u8]) -> String {
    if encrypted_data.is_empty() {
        return encrypted_data.to_string();
    }

    let encrypted_payload = match BASE64.decode(encrypted_data) {
        Ok(payload) => payload,
        Err(_) => return encrypted_data.to_string(),
    };

    if encrypted_payload.len() < NONCE_LEN + TAG_LEN {
        return encrypted_data.to_string();
    }

    let (nonce_bytes, ciphertext) = encrypted_payload.split_at(NONCE_LEN);

    let cipher = match cipher_for(master_secret, uid) {
        Ok(c) => c,
        Err(e) => {
            tracing::warn!("Cannot build cipher for user {}: {}", uid, e);
            return encrypted_data.to_string();
        }
    };

    match cipher.decrypt(Nonce::from_slice(nonce_bytes), ciphertext) {
        Ok(plaintext) => String::from_utf8(plaintext).unwrap_or_else(|_| encrypted_data.to_string()),
        Err(e) => {
            tracing::debug!(
                "Decryption failed for user {}: {:?}. Returning original.",
                uid,
                e
            );
            encrypted_data.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"testsecret12345678901234567890123";

    #[test]
    fn test_encrypt_then_decrypt_for_same_user() {
        let sealed = encrypt("slept badly, felt better after a walk", "uid-1", SECRET).unwrap();
        assert_ne!(sealed, "slept badly, felt better after a walk");
        assert_eq!(decrypt(&sealed, "uid-1", SECRET), "slept badly, felt better after a walk");
    }

    #[test]
    fn test_other_user_cannot_decrypt() {
        let sealed = encrypt("private", "uid-1", SECRET).unwrap();
        assert_eq!(decrypt(&sealed, "uid-2", SECRET), sealed);
    }

    #[test]
    fn test_decrypt_returns_original_on_invalid_base64() {
        let result = decrypt("not valid base64!!!", "test-uid", SECRET);
        assert_eq!(result, "not valid base64!!!");
    }

    #[test]
    fn test_decrypt_returns_original_on_short_payload() {
        let result = decrypt("SGVsbG8=", "test-uid", SECRET);
        assert_eq!(result, "SGVsbG8=");
    }

    #[test]
    fn test_empty_stays_empty() {
        assert_eq!(encrypt("", "u", SECRET).unwrap(), "");
        assert_eq!(decrypt("", "u", SECRET), "");
    }
}
