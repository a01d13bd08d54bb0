//! # vaultkit-core
//!
//! Encrypted local secret storage for host applications:
//! - AES-256-GCM encryption with a fresh random nonce per message
//! - OS keychain key provisioning with zeroize-on-drop key handling
//! - Atomic whole-map persistence with corrupt-file recovery
//!
//! Secrets live in a single name -> ciphertext document under the platform
//! application-support directory. Every operation is a complete
//! load -> mutate -> save transaction guarded by a per-file lock, so the
//! store is safe to share across threads.

pub mod crypto;
pub mod error;
pub mod format;
pub mod keys;
mod store;

pub use crypto::{EncryptionKey, SecretString};
pub use error::{Result, VaultError};
pub use format::{JsonFormat, PersistentFormat, SecretMap};
pub use keys::{EphemeralKeyProvider, KeychainKeyProvider, KeyProvider};
pub use store::SecretStore;
