//! Cryptographic primitives for secret storage
//!
//! This module provides:
//! - AES-256-GCM authenticated encryption with a random nonce per message
//! - Secure memory handling with zeroize

mod cipher;
mod secure_memory;

pub use cipher::{decrypt, decrypt_string, encrypt, encrypt_string};
pub use secure_memory::{EncryptionKey, SecretString};
