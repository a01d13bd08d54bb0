//! Persistent serialization of the secret map
//!
//! The on-disk document is a versioned key-value envelope mapping secret
//! name to encoded ciphertext. Deserialization never fails: missing or
//! malformed input yields an empty map, which callers treat as "no secrets
//! yet" rather than an error.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{Result, VaultError};

/// Mapping from secret name to encoded ciphertext
pub type SecretMap = HashMap<String, String>;

/// Current on-disk document version
const FORMAT_VERSION: u32 = 1;

/// Serializer for the name -> ciphertext mapping
pub trait PersistentFormat: Send + Sync {
    /// Serialize the map into a storable byte blob
    fn serialize(&self, secrets: &SecretMap) -> Result<Vec<u8>>;

    /// Deserialize a byte blob; malformed input yields an empty map
    fn deserialize(&self, bytes: &[u8]) -> SecretMap;
}

/// File format for persistent storage
#[derive(Debug, Serialize, Deserialize)]
struct SecretsFile {
    version: u32,
    entries: SecretMap,
}

/// JSON document format (structured text, one entry per secret)
#[derive(Debug, Default, Clone)]
pub struct JsonFormat;

impl PersistentFormat for JsonFormat {
    fn serialize(&self, secrets: &SecretMap) -> Result<Vec<u8>> {
        let file = SecretsFile {
            version: FORMAT_VERSION,
            entries: secrets.clone(),
        };

        serde_json::to_vec_pretty(&file).map_err(|e| VaultError::StorageError(e.to_string()))
    }

    fn deserialize(&self, bytes: &[u8]) -> SecretMap {
        match serde_json::from_slice::<SecretsFile>(bytes) {
            Ok(file) => file.entries,
            Err(e) => {
                warn!("unreadable secrets document, treating as empty: {}", e);
                SecretMap::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialize_deserialize_roundtrip() {
        let format = JsonFormat;
        let mut secrets = SecretMap::new();
        secrets.insert("api_key".to_string(), "c2VhbGVk".to_string());
        secrets.insert("token".to_string(), "b3RoZXI=".to_string());

        let bytes = format.serialize(&secrets).unwrap();
        let parsed = format.deserialize(&bytes);

        assert_eq!(parsed, secrets);
    }

    #[test]
    fn test_serialized_document_is_versioned() {
        let format = JsonFormat;
        let bytes = format.serialize(&SecretMap::new()).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["version"], 1);
        assert!(value["entries"].is_object());
    }

    #[test]
    fn test_malformed_input_yields_empty_map() {
        let format = JsonFormat;

        assert!(format.deserialize(b"").is_empty());
        assert!(format.deserialize(b"not json at all").is_empty());
        assert!(format.deserialize(b"{\"version\": 1}").is_empty());
        assert!(format.deserialize(&[0xFF, 0xFE, 0x00]).is_empty());
    }

    #[test]
    fn test_empty_map_roundtrip() {
        let format = JsonFormat;
        let bytes = format.serialize(&SecretMap::new()).unwrap();
        assert!(format.deserialize(&bytes).is_empty());
    }
}
