use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::domain::error::Result;
use crate::infrastructure::kv_store::{KeyValueStore, THEME_KEY};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "light" => Some(Theme::Light),
            "dark" => Some(Theme::Dark),
            _ => None,
        }
    }
}

pub struct PreferencesService {
    store: Arc<dyn KeyValueStore>,
}

impl PreferencesService {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Unknown or unreadable values fall back to the default theme.
    pub fn theme(&self) -> Theme {
        self.store
            .get(THEME_KEY)
            .ok()
            .flatten()
            .and_then(|raw| Theme::parse(&raw))
            .unwrap_or_default()
    }

    pub fn set_theme(&self, theme: Theme) -> Result<()> {
        self.store.set(THEME_KEY, theme.as_str())
    }

    pub fn toggle_theme(&self) -> Result<Theme> {
        let next = self.theme().toggled();
        self.set_theme(next)?;
        Ok(next)
    }

    pub fn clear(&self) -> Result<()> {
        self.store.remove(THEME_KEY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::kv_store::MemoryStore;

    #[test]
    fn test_theme_round_trip_and_toggle() {
        let prefs = PreferencesService::new(Arc::new(MemoryStore::new()));
        assert_eq!(prefs.theme(), Theme::Light);
        assert_eq!(prefs.toggle_theme().unwrap(), Theme::Dark);
        assert_eq!(prefs.theme(), Theme::Dark);
        prefs.set_theme(Theme::Light).unwrap();
        assert_eq!(prefs.theme(), Theme::Light);
    }

    #[test]
    fn test_unknown_stored_theme_reads_as_default() {
        let store = Arc::new(MemoryStore::new());
        store.set(THEME_KEY, "sepia").unwrap();
        assert_eq!(PreferencesService::new(store).theme(), Theme::Light);
    }
}
