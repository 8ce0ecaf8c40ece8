use std::error::Error;
use std::sync::{Arc, Mutex};

use tracing::{error, warn};

use crate::application::use_cases::credential_holder::CredentialHolder;
use crate::application::use_cases::data_wipe::DataWipeUseCase;
use crate::application::use_cases::generate_sketch::GenerateSketchUseCase;
use crate::application::use_cases::history::HistoryStore;
use crate::application::use_cases::preferences::PreferencesService;
use crate::application::use_cases::result_actions::{Platform, ResultActions};
use crate::application::use_cases::sketch_pipeline::SketchPipeline;
use crate::domain::error::Result;
use crate::infrastructure::config::{CredentialBackend, Settings};
use crate::infrastructure::image_clients::{HuggingFaceClient, ImageClient};
use crate::infrastructure::kv_store::{FileStore, KeyValueStore};
use crate::infrastructure::object_urls::ObjectUrlRegistry;
use crate::infrastructure::platform::DesktopPlatform;
use crate::infrastructure::security::keyring::{KeyringManager, KeyringStore};
use crate::infrastructure::storage::{resolve_app_data_dir, resolve_download_dir};
use crate::interfaces::http::{add_log, LogEntry};
use crate::interfaces::state::AppState;

pub fn setup(settings: Settings) -> std::result::Result<Arc<AppState>, Box<dyn Error>> {
    let logs: Arc<Mutex<Vec<LogEntry>>> = Arc::new(Mutex::new(Vec::new()));

    let app_data_dir = resolve_app_data_dir(settings.storage.data_dir.as_deref()).map_err(|err| {
        error!(error = %err, "Failed to resolve app data dir");
        err
    })?;

    let download_dir =
        resolve_download_dir(settings.storage.download_dir.as_deref(), &app_data_dir).map_err(
            |err| {
                error!(error = %err, "Failed to resolve download dir");
                err
            },
        )?;

    let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::in_dir(&app_data_dir));
    let credential_store: Arc<dyn KeyValueStore> = match settings.storage.credential_backend {
        CredentialBackend::File => store.clone(),
        CredentialBackend::Keyring if KeyringManager::platform_store_is_durable() => {
            Arc::new(KeyringStore::default())
        }
        CredentialBackend::Keyring => {
            warn!("No persistent OS keyring on this platform, keeping the token in the data file");
            store.clone()
        }
    };

    let platform = Arc::new(DesktopPlatform::new(
        download_dir.clone(),
        settings.server.page_url(),
        logs.clone(),
    ));

    let credential_backend = settings.storage.credential_backend;
    let state = assemble_state(
        settings,
        store,
        credential_store,
        Arc::new(HuggingFaceClient::new()),
        platform,
        logs.clone(),
    )?;

    add_log(
        &logs,
        "INFO",
        "Bootstrap",
        &format!(
            "Data dir {} (token in {:?}), downloads to {}",
            app_data_dir.display(),
            credential_backend,
            download_dir.display()
        ),
    );

    Ok(Arc::new(state))
}

/// Wires the use cases over the given adapters.
pub fn assemble_state(
    settings: Settings,
    store: Arc<dyn KeyValueStore>,
    credential_store: Arc<dyn KeyValueStore>,
    image_client: Arc<dyn ImageClient + Send + Sync>,
    platform: Arc<dyn Platform>,
    logs: Arc<Mutex<Vec<LogEntry>>>,
) -> Result<AppState> {
    let credentials = Arc::new(CredentialHolder::new(credential_store));
    if let Err(err) = credentials.load() {
        // Starting without a token is recoverable: the user can type it again.
        warn!(error = %err, "Could not restore saved API token");
        add_log(
            &logs,
            "WARN",
            "Credential",
            &format!("Could not restore saved token: {}", err),
        );
    }

    let images = Arc::new(ObjectUrlRegistry::new());
    let history = Arc::new(HistoryStore::new(store.clone()));
    let preferences = Arc::new(PreferencesService::new(store));

    let pipeline = Arc::new(SketchPipeline::new(
        image_client,
        settings.model.clone(),
        images.clone(),
        history.clone(),
    ));

    Ok(AppState {
        generate_use_case: GenerateSketchUseCase::new(credentials.clone(), pipeline),
        result_actions: ResultActions::new(platform, images.clone()),
        data_wipe_use_case: DataWipeUseCase::new(
            credentials.clone(),
            history.clone(),
            preferences.clone(),
            images.clone(),
        ),
        settings,
        credentials,
        history,
        images,
        preferences,
        logs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::sketch::SketchResult;
    use crate::infrastructure::kv_store::CREDENTIAL_KEY;

    #[test]
    fn test_setup_restores_state_from_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::in_dir(dir.path());
        store.set(CREDENTIAL_KEY, "hf_restoredtoken").unwrap();

        let mut settings = Settings::default();
        settings.storage.data_dir = Some(dir.path().to_path_buf());
        settings.storage.download_dir = Some(dir.path().join("downloads"));
        let state = setup(settings.clone()).unwrap();
        assert_eq!(state.credentials.current(), "hf_restoredtoken");
        assert!(state.status().connected);

        state
            .history
            .append(SketchResult::new("blob:sketchdesk/x".into(), "p".into()))
            .unwrap();
        let again = setup(settings).unwrap();
        assert_eq!(again.history.load_all().len(), 1);
        // Image references do not survive the new session.
        assert!(again.images.resolve("blob:sketchdesk/x").is_none());
    }
}
