use std::path::Path;

use tokio::fs;
use tracing::{info, warn};

use crate::types::ConsoleError;

use super::{paths, Config, API_URL_ENV};

impl Config {
    /// Load configuration from config.json in the install directory.
    /// Falls back to defaults if the file doesn't exist or can't be parsed
    pub async fn load() -> Self {
        let config_path = paths::get_config_path();
        let mut config = match Self::load_from(&config_path).await {
            Ok(config) => config,
            Err(err) => {
                warn!(error = ?err, "Failed to load config.json, using defaults");
                Self::default()
            }
        };
        config.apply_env_override(std::env::var(API_URL_ENV).ok());

        info!(
            api = %config.api_base_url,
            timeout_secs = config.request_timeout_secs,
            "Loaded configuration"
        );
        config
    }

    pub async fn load_from(config_path: &Path) -> Result<Self, ConsoleError> {
        if !config_path.exists() {
            warn!(path = %config_path.display(), "Config file not found, using defaults");
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(config_path)
            .await
            .map_err(|err| ConsoleError::Config(format!("Failed to read config file: {err}")))?;

        serde_json::from_str(&contents)
            .map_err(|err| ConsoleError::Config(format!("Failed to parse config.json: {err}")))
    }

    fn apply_env_override(&mut self, value: Option<String>) {
        if let Some(custom) = value {
            let trimmed = custom.trim();
            if !trimmed.is_empty() {
                self.api_base_url = trimmed.to_string();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.json"))
            .await
            .unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.api_base_url, "http://127.0.0.1:5000");
    }

    #[tokio::test]
    async fn partial_file_keeps_remaining_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"api_base_url": "http://backend:8080"}"#).unwrap();

        let config = Config::load_from(&path).await.unwrap();
        assert_eq!(config.api_base_url, "http://backend:8080");
        assert_eq!(config.request_timeout_secs, 30);
        assert_eq!(config.log_filter, "info");
    }

    #[tokio::test]
    async fn malformed_file_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = Config::load_from(&path).await.unwrap_err();
        assert!(matches!(err, ConsoleError::Config(_)));
    }

    #[test]
    fn env_override_ignores_blank_values() {
        let mut config = Config::default();
        config.apply_env_override(Some("   ".into()));
        assert_eq!(config.api_base_url, "http://127.0.0.1:5000");

        config.apply_env_override(Some(" https://console.example ".into()));
        assert_eq!(config.api_base_url, "https://console.example");
    }
}
