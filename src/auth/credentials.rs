// Credential storage
// Persists the serialized token pair in the OS keyring

use std::collections::HashMap;
use std::sync::Mutex;

use crate::error::StoreError;

/// Keyring service name shared by every lunchquest entry
pub const SERVICE_NAME: &str = "lunchquest-cli";

/// Entry holding the serialized token pair
pub const TOKEN_ENTRY: &str = "authenticate-response";

/// Service + entry name pair addressing one stored secret
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CredentialId {
    pub service: &'static str,
    pub entry: &'static str,
}

impl CredentialId {
    /// Identifier of the stored token pair
    pub const TOKEN: CredentialId = CredentialId {
        service: SERVICE_NAME,
        entry: TOKEN_ENTRY,
    };
}

/// Key/value persistence for secrets.
///
/// A missing entry is `Ok(None)`, not an error: it is the normal state on
/// first run.
pub trait CredentialStore: Send + Sync {
    fn get(&self, id: CredentialId) -> Result<Option<String>, StoreError>;

    fn set(&self, id: CredentialId, value: &str) -> Result<(), StoreError>;
}

/// Store backed by the platform secret service (Keychain, Credential Manager,
/// Secret Service)
#[derive(Debug, Default, Clone, Copy)]
pub struct KeyringStore;

impl KeyringStore {
    pub fn new() -> Self {
        Self
    }
}

impl CredentialStore for KeyringStore {
    fn get(&self, id: CredentialId) -> Result<Option<String>, StoreError> {
        let entry = keyring::Entry::new(id.service, id.entry)?;
        match entry.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(StoreError::Keyring(e)),
        }
    }

    fn set(&self, id: CredentialId, value: &str) -> Result<(), StoreError> {
        let entry = keyring::Entry::new(id.service, id.entry)?;
        entry.set_password(value)?;
        tracing::debug!(service = id.service, entry = id.entry, "Credential saved to keyring");
        Ok(())
    }
}

/// Process-local store for tests and dry runs
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<CredentialId, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with one entry
    pub fn with_entry(id: CredentialId, value: impl Into<String>) -> Self {
        let store = Self::new();
        store
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(id, value.into());
        store
    }
}

impl CredentialStore for MemoryStore {
    fn get(&self, id: CredentialId) -> Result<Option<String>, StoreError> {
        let entries = self
            .entries
            .lock()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Ok(entries.get(&id).cloned())
    }

    fn set(&self, id: CredentialId, value: &str) -> Result<(), StoreError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        entries.insert(id, value.to_string());
        Ok(())
    }
}
