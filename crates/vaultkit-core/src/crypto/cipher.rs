//! AES-256-GCM authenticated encryption
//!
//! Encryption format: `base64(nonce || ciphertext || tag)`
//! - Nonce: 12 bytes (96 bits) - freshly random for every encryption
//! - Auth tag: 16 bytes (128 bits), appended by AES-GCM
//!
//! The whole frame is encoded with the standard base64 alphabet so it can be
//! stored as a plain string in the text-based secrets document.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use rand::RngCore;

use super::EncryptionKey;
use crate::error::{Result, VaultError};

/// Nonce length for AES-GCM (96 bits)
const NONCE_LEN: usize = 12;
/// Authentication tag length appended to the ciphertext
const TAG_LEN: usize = 16;

/// Encrypt plaintext using AES-256-GCM
///
/// # Arguments
/// * `plaintext` - The data to encrypt (may be empty)
/// * `key` - The 256-bit encryption key
///
/// # Returns
/// A base64 string carrying the nonce, ciphertext, and auth tag
pub fn encrypt(plaintext: &[u8], key: &EncryptionKey) -> Result<String> {
    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| VaultError::EncryptionError(e.to_string()))?;

    // Random nonce per encryption so identical plaintexts never produce
    // identical ciphertexts
    let mut nonce_bytes = [0u8; NONCE_LEN];
    rand::thread_rng().fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    // aes-gcm appends the auth tag to the ciphertext
    let ciphertext = cipher
        .encrypt(nonce, plaintext)
        .map_err(|e| VaultError::EncryptionError(e.to_string()))?;

    let mut framed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    framed.extend_from_slice(&nonce_bytes);
    framed.extend_from_slice(&ciphertext);

    Ok(STANDARD.encode(framed))
}

/// Decrypt a frame previously produced by [`encrypt`]
///
/// Fails with `DecryptionError` if the input is not valid base64, is
/// truncated, was tampered with, or was encrypted under a different key.
pub fn decrypt(encoded: &str, key: &EncryptionKey) -> Result<Vec<u8>> {
    let framed = STANDARD
        .decode(encoded)
        .map_err(|e| VaultError::DecryptionError(format!("invalid base64: {}", e)))?;

    if framed.len() < NONCE_LEN + TAG_LEN {
        return Err(VaultError::DecryptionError(format!(
            "ciphertext too short: {} bytes",
            framed.len()
        )));
    }

    let (nonce_bytes, ciphertext) = framed.split_at(NONCE_LEN);
    let nonce = Nonce::from_slice(nonce_bytes);

    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| VaultError::DecryptionError(e.to_string()))?;

    cipher
        .decrypt(nonce, ciphertext)
        .map_err(|e| VaultError::DecryptionError(e.to_string()))
}

/// Encrypt a string and return the encoded frame
pub fn encrypt_string(plaintext: &str, key: &EncryptionKey) -> Result<String> {
    encrypt(plaintext.as_bytes(), key)
}

/// Decrypt an encoded frame and return the plaintext as a string
pub fn decrypt_string(encoded: &str, key: &EncryptionKey) -> Result<String> {
    let plaintext = decrypt(encoded, key)?;
    String::from_utf8(plaintext)
        .map_err(|e| VaultError::DecryptionError(format!("invalid UTF-8: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let key = EncryptionKey::generate();
        let plaintext = b"Hello, World!";

        let encoded = encrypt(plaintext, &key).unwrap();
        let decrypted = decrypt(&encoded, &key).unwrap();

        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn test_encrypt_string_decrypt_string_roundtrip() {
        let key = EncryptionKey::generate();
        let plaintext = "sk-proj-abc123xyz789";

        let encoded = encrypt_string(plaintext, &key).unwrap();
        let decrypted = decrypt_string(&encoded, &key).unwrap();

        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn test_empty_plaintext_roundtrip() {
        let key = EncryptionKey::generate();

        let encoded = encrypt(b"", &key).unwrap();
        let decrypted = decrypt(&encoded, &key).unwrap();

        assert!(decrypted.is_empty());
    }

    #[test]
    fn test_same_plaintext_produces_different_ciphertext() {
        let key = EncryptionKey::generate();
        let plaintext = b"same plaintext";

        let encoded1 = encrypt(plaintext, &key).unwrap();
        let encoded2 = encrypt(plaintext, &key).unwrap();

        // Nonces are random, so the frames must differ
        assert_ne!(encoded1, encoded2);
    }

    #[test]
    fn test_wrong_key_fails_decryption() {
        let key1 = EncryptionKey::generate();
        let key2 = EncryptionKey::generate();

        let encoded = encrypt(b"secret data", &key1).unwrap();
        let result = decrypt(&encoded, &key2);

        assert!(matches!(result, Err(VaultError::DecryptionError(_))));
    }

    #[test]
    fn test_tampered_ciphertext_fails_decryption() {
        let key = EncryptionKey::generate();

        let encoded = encrypt(b"secret data", &key).unwrap();
        let mut framed = STANDARD.decode(&encoded).unwrap();

        // Flip a byte past the nonce
        framed[NONCE_LEN] ^= 0xFF;
        let tampered = STANDARD.encode(framed);

        let result = decrypt(&tampered, &key);
        assert!(matches!(result, Err(VaultError::DecryptionError(_))));
    }

    #[test]
    fn test_tampered_tag_fails_decryption() {
        let key = EncryptionKey::generate();

        let encoded = encrypt(b"secret data", &key).unwrap();
        let mut framed = STANDARD.decode(&encoded).unwrap();

        let last = framed.len() - 1;
        framed[last] ^= 0xFF;
        let tampered = STANDARD.encode(framed);

        let result = decrypt(&tampered, &key);
        assert!(matches!(result, Err(VaultError::DecryptionError(_))));
    }

    #[test]
    fn test_malformed_input_fails_decryption() {
        let key = EncryptionKey::generate();

        // Not base64 at all
        assert!(decrypt("not valid base64!!!", &key).is_err());

        // Valid base64 but shorter than nonce + tag
        let truncated = STANDARD.encode([0u8; 8]);
        assert!(matches!(
            decrypt(&truncated, &key),
            Err(VaultError::DecryptionError(_))
        ));
    }
}
