use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::domain::error::{AppError, Result};
use crate::infrastructure::kv_store::KeyValueStore;
use keyring::credential::{CredentialBuilder, CredentialBuilderApi, CredentialPersistence};
use keyring::Entry;

pub const KEYRING_SERVICE: &str = "sketchdesk";

pub struct KeyringManager {
    service: String,
    // `None` uses the platform store picked at build time.
    builder: Option<Box<CredentialBuilder>>,
    entries: Mutex<HashMap<String, Arc<Entry>>>,
}

impl KeyringManager {
    pub fn new(service: &str) -> Self {
        Self {
            service: service.to_string(),
            builder: None,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_builder(service: &str, builder: Box<CredentialBuilder>) -> Self {
        Self {
            builder: Some(builder),
            ..Self::new(service)
        }
    }

    /// Whether secrets outlive this process with the compiled-in platform store.
    pub fn platform_store_is_durable() -> bool {
        matches!(
            keyring::default::default_credential_builder().persistence(),
            CredentialPersistence::UntilDelete | CredentialPersistence::UntilReboot
        )
    }

    fn entry(&self, key: &str) -> Result<Arc<Entry>> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| AppError::Internal(format!("keyring entries poisoned: {}", e)))?;
        if let Some(entry) = entries.get(key) {
            return Ok(entry.clone());
        }
        let entry = match &self.builder {
            Some(builder) => builder
                .build(None, &self.service, key)
                .map(Entry::new_with_credential),
            None => Entry::new(&self.service, key),
        }
        .map_err(|e| AppError::SecurityError(format!("Failed to create entry: {}", e)))?;
        let entry = Arc::new(entry);
        entries.insert(key.to_string(), entry.clone());
        Ok(entry)
    }

    pub fn set_secret(&self, key: &str, secret: &str) -> Result<()> {
        self.entry(key)?
            .set_password(secret)
            .map_err(|e| AppError::SecurityError(format!("Failed to set password: {}", e)))
    }

    /// `Ok(None)` when nothing has been stored under `key`.
    pub fn get_secret(&self, key: &str) -> Result<Option<String>> {
        match self.entry(key)?.get_password() {
            Ok(secret) => Ok(Some(secret)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(AppError::SecurityError(format!(
                "Failed to get password: {}",
                e
            ))),
        }
    }

    pub fn delete_secret(&self, key: &str) -> Result<()> {
        match self.entry(key)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(AppError::SecurityError(format!(
                "Failed to delete password: {}",
                e
            ))),
        }
    }
}

/// Credential storage in the OS keychain instead of the plain data file.
pub struct KeyringStore {
    manager: KeyringManager,
}

impl KeyringStore {
    pub fn new(service: &str) -> Self {
        Self {
            manager: KeyringManager::new(service),
        }
    }

    pub fn with_builder(service: &str, builder: Box<CredentialBuilder>) -> Self {
        Self {
            manager: KeyringManager::with_builder(service, builder),
        }
    }
}

impl Default for KeyringStore {
    fn default() -> Self {
        Self::new(KEYRING_SERVICE)
    }
}

impl KeyValueStore for KeyringStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.manager.get_secret(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.manager.set_secret(key, value)
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.manager.delete_secret(key)
    }
}
