use std::sync::{Arc, Mutex};

use serde::Serialize;

use crate::application::use_cases::credential_holder::CredentialHolder;
use crate::application::use_cases::data_wipe::DataWipeUseCase;
use crate::application::use_cases::generate_sketch::GenerateSketchUseCase;
use crate::application::use_cases::history::{HistoryStore, HISTORY_CAPACITY};
use crate::application::use_cases::preferences::{PreferencesService, Theme};
use crate::application::use_cases::result_actions::ResultActions;
use crate::infrastructure::config::Settings;
use crate::infrastructure::object_urls::ObjectUrlRegistry;
use crate::interfaces::http::LogEntry;

pub struct AppState {
    pub settings: Settings,
    pub credentials: Arc<CredentialHolder>,
    pub history: Arc<HistoryStore>,
    pub images: Arc<ObjectUrlRegistry>,
    pub preferences: Arc<PreferencesService>,
    pub generate_use_case: GenerateSketchUseCase,
    pub result_actions: ResultActions,
    pub data_wipe_use_case: DataWipeUseCase,
    pub logs: Arc<Mutex<Vec<LogEntry>>>,
}

/// Sidebar summary.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppStatus {
    pub connected: bool,
    pub credential: String,
    pub total_sketches: usize,
    pub history_capacity: usize,
    pub generating: usize,
    pub theme: Theme,
}

impl AppState {
    pub fn status(&self) -> AppStatus {
        AppStatus {
            connected: !self.credentials.current().is_empty(),
            credential: self.credentials.masked(),
            total_sketches: self.history.load_all().len(),
            history_capacity: HISTORY_CAPACITY,
            generating: self.generate_use_case.in_flight(),
            theme: self.preferences.theme(),
        }
    }
}
