use std::sync::{Arc, RwLock};

use tokio::sync::watch;
use tracing::{debug, info};

use crate::domain::credential::{is_valid_credential, mask_credential};
use crate::domain::error::{AppError, Result};
use crate::infrastructure::kv_store::{KeyValueStore, CREDENTIAL_KEY};

#[derive(Debug, Clone, Default, PartialEq)]
struct Draft {
    value: String,
    valid: bool,
}

/// The user's API token.
///
/// Keeps two views of it: the draft, which follows every edit, and the
/// published value, which only changes on a valid edit, a load or a clear.
/// Generation always uses the published value.
pub struct CredentialHolder {
    store: Arc<dyn KeyValueStore>,
    draft: RwLock<Draft>,
    published: watch::Sender<String>,
}

impl CredentialHolder {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        let (published, _) = watch::channel(String::new());
        Self {
            store,
            draft: RwLock::new(Draft::default()),
            published,
        }
    }

    /// Restores a saved token. It was validated when saved, so it is trusted.
    pub fn load(&self) -> Result<()> {
        let Some(saved) = self.store.get(CREDENTIAL_KEY)? else {
            return Ok(());
        };
        if saved.is_empty() {
            return Ok(());
        }
        info!(credential = %mask_credential(&saved), "Restored saved API token");
        *self.draft_mut()? = Draft {
            value: saved.clone(),
            valid: true,
        };
        self.published.send_replace(saved);
        Ok(())
    }

    /// Records an edit and returns whether it looks like a usable token.
    pub fn set_credential(&self, raw: &str) -> Result<bool> {
        let valid = is_valid_credential(raw);
        *self.draft_mut()? = Draft {
            value: raw.to_string(),
            valid,
        };
        if valid {
            self.store.set(CREDENTIAL_KEY, raw)?;
            self.published.send_replace(raw.to_string());
            info!(credential = %mask_credential(raw), "API token saved");
        } else {
            debug!(len = raw.len(), "API token draft does not match the expected format");
        }
        Ok(valid)
    }

    pub fn clear(&self) -> Result<()> {
        self.store.remove(CREDENTIAL_KEY)?;
        *self.draft_mut()? = Draft::default();
        self.published.send_replace(String::new());
        info!("API token cleared");
        Ok(())
    }

    /// What the user last typed, valid or not.
    pub fn draft(&self) -> String {
        self.read_draft().value
    }

    pub fn is_valid(&self) -> bool {
        self.read_draft().valid
    }

    /// The token generation should use; empty when none is available.
    pub fn current(&self) -> String {
        self.published.borrow().clone()
    }

    pub fn masked(&self) -> String {
        mask_credential(&self.current())
    }

    pub fn subscribe(&self) -> watch::Receiver<String> {
        self.published.subscribe()
    }

    fn read_draft(&self) -> Draft {
        self.draft
            .read()
            .map(|d| d.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    fn draft_mut(&self) -> Result<std::sync::RwLockWriteGuard<'_, Draft>> {
        self.draft
            .write()
            .map_err(|e| AppError::Internal(format!("credential state poisoned: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::kv_store::MemoryStore;

    const GOOD: &str = "hf_abcdefghijklmnop";

    fn holder() -> (Arc<MemoryStore>, CredentialHolder) {
        let store = Arc::new(MemoryStore::new());
        let holder = CredentialHolder::new(store.clone());
        (store, holder)
    }

    #[test]
    fn test_valid_token_is_persisted_and_published() {
        let (store, holder) = holder();
        let mut rx = holder.subscribe();

        assert!(holder.set_credential(GOOD).unwrap());
        assert_eq!(store.get(CREDENTIAL_KEY).unwrap(), Some(GOOD.to_string()));
        assert_eq!(holder.current(), GOOD);
        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), GOOD);
    }

    #[test]
    fn test_invalid_draft_is_kept_but_not_persisted() {
        let (store, holder) = holder();
        let rx = holder.subscribe();

        assert!(!holder.set_credential("hf_short").unwrap());
        assert_eq!(holder.draft(), "hf_short");
        assert!(!holder.is_valid());
        assert_eq!(store.get(CREDENTIAL_KEY).unwrap(), None);
        assert_eq!(holder.current(), "");
        assert!(!rx.has_changed().unwrap());
    }

    #[test]
    fn test_invalid_edit_keeps_previous_published_token() {
        let (_, holder) = holder();
        holder.set_credential(GOOD).unwrap();
        holder.set_credential("hf_abc").unwrap();
        assert_eq!(holder.draft(), "hf_abc");
        assert_eq!(holder.current(), GOOD);
    }

    #[test]
    fn test_clear_removes_and_publishes_empty() {
        let (store, holder) = holder();
        holder.set_credential(GOOD).unwrap();
        let mut rx = holder.subscribe();

        holder.clear().unwrap();
        assert_eq!(store.get(CREDENTIAL_KEY).unwrap(), None);
        assert_eq!(holder.draft(), "");
        assert!(!holder.is_valid());
        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), "");
    }

    #[test]
    fn test_load_trusts_saved_value_without_revalidating() {
        let (store, holder) = holder();
        // Would fail the format check if typed.
        store.set(CREDENTIAL_KEY, "legacy").unwrap();
        holder.load().unwrap();
        assert!(holder.is_valid());
        assert_eq!(holder.current(), "legacy");
    }

    #[test]
    fn test_load_without_saved_value_stays_empty() {
        let (_, holder) = holder();
        holder.load().unwrap();
        assert_eq!(holder.current(), "");
        assert!(!holder.is_valid());
    }

    #[test]
    fn test_masked_form() {
        let (_, holder) = holder();
        holder.set_credential(GOOD).unwrap();
        assert_eq!(holder.masked(), "hf_****mnop");
    }
}
