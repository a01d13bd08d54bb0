//! Secret store orchestration
//!
//! [`SecretStore`] runs the load -> mutate -> save cycle over the persisted
//! secret map. The map is reloaded from disk at the start of every operation
//! and never cached across calls; writes replace the whole document
//! atomically. The full cycle runs under a per-file lock so concurrent
//! `store` calls cannot drop each other's updates.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use directories::ProjectDirs;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::crypto::{self, SecretString};
use crate::error::{Result, VaultError};
use crate::format::{JsonFormat, PersistentFormat, SecretMap};
use crate::keys::{KeyProvider, KeychainKeyProvider};

/// Default file name for the persisted secret map
const SECRETS_FILE: &str = "secrets.json";

/// Keychain service and account under which the encryption key lives
const SERVICE_NAME: &str = "vaultkit";
const KEY_ACCOUNT: &str = "encryption-key";

/// Encrypted key-value store persisted as a single document
pub struct SecretStore {
    /// Path of the persisted secrets file
    path: PathBuf,
    /// Supplies the process-lifetime encryption key
    key_provider: Box<dyn KeyProvider>,
    /// Serializer for the persisted document
    format: Box<dyn PersistentFormat>,
    /// Guards the whole load -> mutate -> save cycle for this file
    file_lock: Mutex<()>,
}

impl SecretStore {
    /// Create a store over `path` with explicit dependencies
    pub fn new(
        path: impl Into<PathBuf>,
        key_provider: Box<dyn KeyProvider>,
        format: Box<dyn PersistentFormat>,
    ) -> Self {
        Self {
            path: path.into(),
            key_provider,
            format,
            file_lock: Mutex::new(()),
        }
    }

    /// Create a store in the platform application-support directory, backed
    /// by the OS keychain key provider and the JSON document format
    pub fn open_default() -> Result<Self> {
        let dir = default_storage_dir()?;
        std::fs::create_dir_all(&dir).map_err(storage_err)?;

        let key_provider = KeychainKeyProvider::new(SERVICE_NAME, KEY_ACCOUNT)?;

        debug!("secret store initialized at {:?}", dir);

        Ok(Self::new(
            dir.join(SECRETS_FILE),
            Box::new(key_provider),
            Box::new(JsonFormat),
        ))
    }

    /// Path of the persisted secrets file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Encrypt `value` and store it under `name`, replacing any previous
    /// entry. The whole map is rewritten atomically.
    pub fn store(&self, name: &str, value: &str) -> Result<()> {
        validate_name(name)?;

        let _guard = self.lock();

        let mut secrets = self.load_map();
        let key = self.key_provider.provide_key();
        let sealed = crypto::encrypt_string(value, &key)?;
        secrets.insert(name.to_string(), sealed);
        self.persist(&secrets)?;

        debug!("stored secret: {}", name);
        Ok(())
    }

    /// Retrieve and decrypt the secret stored under `name`
    pub fn retrieve(&self, name: &str) -> Result<SecretString> {
        validate_name(name)?;

        let _guard = self.lock();

        let secrets = self.load_map();
        let sealed = secrets
            .get(name)
            .ok_or_else(|| VaultError::NotFound(name.to_string()))?;

        let key = self.key_provider.provide_key();
        let value = crypto::decrypt_string(sealed, &key)?;

        debug!("retrieved secret: {}", name);
        Ok(SecretString::new(value))
    }

    /// Remove the entry for `name`. Removing an absent name is a no-op.
    pub fn delete(&self, name: &str) -> Result<()> {
        validate_name(name)?;

        let _guard = self.lock();

        let mut secrets = self.load_map();
        if secrets.remove(name).is_some() {
            self.persist(&secrets)?;
            debug!("deleted secret: {}", name);
        }
        Ok(())
    }

    /// Check whether an entry exists for `name` without decrypting it
    pub fn contains(&self, name: &str) -> Result<bool> {
        validate_name(name)?;

        let _guard = self.lock();
        Ok(self.load_map().contains_key(name))
    }

    /// List stored secret names, sorted. Metadata only - no plaintext.
    pub fn names(&self) -> Result<Vec<String>> {
        let _guard = self.lock();

        let mut names: Vec<String> = self.load_map().into_keys().collect();
        names.sort();
        Ok(names)
    }

    fn lock(&self) -> MutexGuard<'_, ()> {
        self.file_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Load the persisted map. A missing, unreadable, or corrupt file loads
    /// as an empty map so callers see "no secrets yet" instead of an error.
    fn load_map(&self) -> SecretMap {
        match std::fs::read(&self.path) {
            Ok(bytes) => self.format.deserialize(&bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => SecretMap::new(),
            Err(e) => {
                warn!("could not read secrets file {:?}: {}", self.path, e);
                SecretMap::new()
            }
        }
    }

    /// Serialize and write the whole map, atomically replacing the file
    fn persist(&self, secrets: &SecretMap) -> Result<()> {
        let bytes = self.format.serialize(secrets)?;

        let parent = self
            .path
            .parent()
            .ok_or_else(|| VaultError::StorageError("invalid storage path".to_string()))?;
        std::fs::create_dir_all(parent).map_err(storage_err)?;

        // Write to a temp file in the same directory, then rename over the
        // target, so a crash mid-write never leaves a torn document
        let mut tmp = NamedTempFile::new_in(parent).map_err(storage_err)?;
        tmp.write_all(&bytes).map_err(storage_err)?;
        tmp.flush().map_err(storage_err)?;
        tmp.persist(&self.path).map_err(|e| storage_err(e.error))?;

        Ok(())
    }
}

/// Resolve the platform application-support directory
fn default_storage_dir() -> Result<PathBuf> {
    ProjectDirs::from("com", "vaultkit", "vaultkit")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .ok_or_else(|| VaultError::StorageError("could not determine data directory".to_string()))
}

fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(VaultError::InvalidName(
            "name must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn storage_err<E: ToString>(err: E) -> VaultError {
    VaultError::StorageError(err.to_string())
}
