//! Encryption key provisioning
//!
//! Production key material lives in the OS keychain:
//! - macOS: Keychain
//! - Windows: Credential Manager
//! - Linux: Secret Service (GNOME Keyring, KWallet)
//!
//! A random 256-bit key is generated and stored on first use; later calls
//! resolve the same key so previously encrypted data stays decryptable.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use keyring::Entry;
use tracing::debug;

use crate::crypto::EncryptionKey;
use crate::error::{Result, VaultError};

/// Supplies the symmetric key used for all encryption operations.
///
/// Implementations resolve key material up front, so `provide_key` is
/// deterministic and cannot fail for the life of the process. The key must
/// never come from a value embedded in the binary.
pub trait KeyProvider: Send + Sync {
    fn provide_key(&self) -> EncryptionKey;
}

/// OS keychain-backed provider.
///
/// Resolves the key once at construction: an existing keychain entry is
/// decoded, otherwise a fresh random key is generated and persisted.
pub struct KeychainKeyProvider {
    key: EncryptionKey,
}

impl KeychainKeyProvider {
    /// Resolve (or create) the key stored under `service`/`account`.
    pub fn new(service: &str, account: &str) -> Result<Self> {
        let entry =
            Entry::new(service, account).map_err(|e| VaultError::KeychainError(e.to_string()))?;

        let key = match entry.get_password() {
            Ok(encoded) => decode_key(&encoded)?,
            Err(keyring::Error::NoEntry) => {
                let key = EncryptionKey::generate();
                entry
                    .set_password(&encode_key(&key))
                    .map_err(|e| VaultError::KeychainError(e.to_string()))?;
                debug!("generated new encryption key for service: {}", service);
                key
            }
            Err(e) => return Err(VaultError::KeychainError(e.to_string())),
        };

        Ok(Self { key })
    }
}

impl KeyProvider for KeychainKeyProvider {
    fn provide_key(&self) -> EncryptionKey {
        self.key.clone()
    }
}

/// In-memory key provider for tests and ephemeral sessions.
///
/// The key is generated at construction and shared by clones, so two stores
/// built from clones of the same provider can decrypt each other's data.
#[derive(Clone)]
pub struct EphemeralKeyProvider {
    key: EncryptionKey,
}

impl EphemeralKeyProvider {
    pub fn new() -> Self {
        Self {
            key: EncryptionKey::generate(),
        }
    }
}

impl Default for EphemeralKeyProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyProvider for EphemeralKeyProvider {
    fn provide_key(&self) -> EncryptionKey {
        self.key.clone()
    }
}

/// Encode key bytes for the keychain (keychains store strings)
fn encode_key(key: &EncryptionKey) -> String {
    STANDARD.encode(key.as_bytes())
}

/// Decode a keychain entry back into key material
fn decode_key(encoded: &str) -> Result<EncryptionKey> {
    let bytes = STANDARD
        .decode(encoded.trim())
        .map_err(|e| VaultError::KeychainError(format!("invalid key encoding: {}", e)))?;

    EncryptionKey::from_slice(&bytes).ok_or_else(|| {
        VaultError::KeychainError(format!("expected 32 key bytes, got {}", bytes.len()))
    })
}
