use std::sync::Arc;

use tracing::info;

use crate::application::use_cases::credential_holder::CredentialHolder;
use crate::application::use_cases::history::HistoryStore;
use crate::application::use_cases::preferences::PreferencesService;
use crate::domain::error::Result;
use crate::infrastructure::object_urls::ObjectUrlRegistry;

/// "Clear All Data": token, history, theme and every live image reference.
pub struct DataWipeUseCase {
    credentials: Arc<CredentialHolder>,
    history: Arc<HistoryStore>,
    preferences: Arc<PreferencesService>,
    images: Arc<ObjectUrlRegistry>,
}

impl DataWipeUseCase {
    pub fn new(
        credentials: Arc<CredentialHolder>,
        history: Arc<HistoryStore>,
        preferences: Arc<PreferencesService>,
        images: Arc<ObjectUrlRegistry>,
    ) -> Self {
        Self {
            credentials,
            history,
            preferences,
            images,
        }
    }

    pub fn execute(&self) -> Result<()> {
        self.credentials.clear()?;
        self.history.clear()?;
        self.preferences.clear()?;
        let revoked = self.images.revoke_all();
        info!(revoked, "All local data cleared");
        Ok(())
    }
}
