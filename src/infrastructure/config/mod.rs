use std::path::{Path, PathBuf};

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::domain::error::{AppError, Result};
use crate::domain::image_model::ImageModelConfig;

pub const DEFAULT_CONFIG_FILE: &str = "sketchdesk.toml";
pub const CONFIG_PATH_ENV: &str = "SKETCHDESK_CONFIG";
pub const ENV_PREFIX: &str = "SKETCHDESK_";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Open the page in the default browser once the server is listening.
    pub open_browser: bool,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3001,
            open_browser: true,
        }
    }
}

impl ServerSettings {
    pub fn page_url(&self) -> String {
        format!("http://{}:{}/", self.host, self.port)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum CredentialBackend {
    #[default]
    File,
    Keyring,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct StorageSettings {
    pub data_dir: Option<PathBuf>,
    pub download_dir: Option<PathBuf>,
    #[serde(default)]
    pub credential_backend: CredentialBackend,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub model: ImageModelConfig,
    #[serde(default)]
    pub storage: StorageSettings,
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerSettings::default(),
            model: ImageModelConfig::default(),
            storage: StorageSettings::default(),
            log_filter: "info".to_string(),
        }
    }
}

impl Settings {
    /// Defaults, then the TOML file, then `SKETCHDESK_*` variables (`__` nests).
    pub fn figment(config_file: &Path) -> Figment {
        Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(config_file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        let settings: Settings = figment.extract()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reads `.env`, then layers file and environment over the defaults.
    pub fn load() -> Result<Self> {
        let _ = dotenvy::dotenv();
        let config_file = std::env::var(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILE));
        Self::from_figment(Self::figment(&config_file))
    }

    pub fn validate(&self) -> Result<()> {
        let endpoint = url::Url::parse(&self.model.endpoint).map_err(|e| {
            AppError::ConfigError(format!("model.endpoint is not a valid URL: {}", e))
        })?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(AppError::ConfigError(format!(
                "model.endpoint must be http(s), got {}",
                endpoint.scheme()
            )));
        }
        if self.server.host.trim().is_empty() {
            return Err(AppError::ConfigError("server.host is empty".to_string()));
        }
        let params = &self.model.params;
        if params.num_inference_steps == 0 || params.width == 0 || params.height == 0 {
            return Err(AppError::ConfigError(
                "model.params must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::image_model::DEFAULT_ENDPOINT;
    use figment::Jail;

    fn extract(jail: &Jail) -> figment::error::Result<Settings> {
        Settings::from_figment(Settings::figment(&jail.directory().join(DEFAULT_CONFIG_FILE)))
            .map_err(|e| figment::Error::from(e.to_string()))
    }

    #[test]
    fn test_defaults_without_file_or_env() {
        Jail::expect_with(|jail| {
            let settings = extract(jail)?;
            assert_eq!(settings, Settings::default());
            assert_eq!(settings.model.endpoint, DEFAULT_ENDPOINT);
            assert_eq!(settings.model.params.num_inference_steps, 8);
            assert_eq!(settings.server.page_url(), "http://127.0.0.1:3001/");
            Ok(())
        });
    }

    #[test]
    fn test_file_then_env_override() {
        Jail::expect_with(|jail| {
            jail.create_file(
                DEFAULT_CONFIG_FILE,
                r#"
                log_filter = "debug"

                [server]
                port = 4000
                open_browser = false

                [storage]
                credential_backend = "keyring"
                "#,
            )?;
            jail.set_env("SKETCHDESK_SERVER__PORT", "4100");

            let settings = extract(jail)?;
            assert_eq!(settings.server.port, 4100);
            assert!(!settings.server.open_browser);
            assert_eq!(settings.log_filter, "debug");
            assert_eq!(settings.storage.credential_backend, CredentialBackend::Keyring);
            assert_eq!(settings.model.params.width, 512);
            Ok(())
        });
    }

    #[test]
    fn test_rejects_non_http_endpoint() {
        let mut settings = Settings::default();
        settings.model.endpoint = "ftp://example.com/model".to_string();
        assert!(matches!(settings.validate(), Err(AppError::ConfigError(_))));

        settings.model.endpoint = "not a url".to_string();
        assert!(matches!(settings.validate(), Err(AppError::ConfigError(_))));
    }
}
