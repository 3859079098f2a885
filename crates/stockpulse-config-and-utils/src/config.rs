//! Configuration management for the client.

use crate::{CoreError, CoreResult, Paths};
use serde::{Deserialize, Serialize};
use std::path::Path;
use url::Url;

/// Environment variable carrying the backend project URL.
pub const ENV_BACKEND_URL: &str = "STOCKPULSE_BACKEND_URL";

/// Environment variable carrying the anonymous (publishable) API key.
pub const ENV_ANON_KEY: &str = "STOCKPULSE_ANON_KEY";

/// Environment variable overriding the log level at runtime.
pub const ENV_LOG_LEVEL: &str = "STOCKPULSE_LOG_LEVEL";

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Main client configuration.
///
/// Backend coordinates come from the environment only and are never written
/// to the config file; the file carries local preferences (log level).
/// Missing coordinates are not an error at load time — operations that need
/// the backend surface a "not configured" error instead (callers render a
/// not-configured state rather than crashing).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
    /// Backend project URL, from STOCKPULSE_BACKEND_URL.
    #[serde(skip)]
    pub backend_url: Option<String>,
    /// Anonymous API key (public, safe to expose), from STOCKPULSE_ANON_KEY.
    #[serde(skip)]
    pub anon_key: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            backend_url: None,
            anon_key: None,
        }
    }
}

impl Config {
    /// Create a new Config with default values, then override from environment.
    pub fn new() -> Self {
        let mut config = Self::default();
        config.load_from_env();
        config
    }

    /// Load configuration from the config file, falling back to defaults.
    /// Backend coordinates always come from the environment, regardless of
    /// what's in the file.
    pub fn load(paths: &Paths) -> CoreResult<Self> {
        let config_path = paths.config_file();

        let mut config = if config_path.exists() {
            Self::load_from_file(&config_path)?
        } else {
            Self::default()
        };

        config.load_from_env();

        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the config file.
    pub fn save(&self, paths: &Paths) -> CoreResult<()> {
        paths.ensure_dirs()?;
        let config_path = paths.config_file();
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    /// Override configuration from environment variables.
    fn load_from_env(&mut self) {
        if let Ok(level) = std::env::var(ENV_LOG_LEVEL) {
            if !level.trim().is_empty() {
                self.log_level = level;
            }
        }
        if let Ok(url) = std::env::var(ENV_BACKEND_URL) {
            if !url.trim().is_empty() {
                self.backend_url = Some(url);
            }
        }
        if let Ok(key) = std::env::var(ENV_ANON_KEY) {
            if !key.trim().is_empty() {
                self.anon_key = Some(key);
            }
        }
    }

    /// True when both backend coordinates are present.
    pub fn is_backend_configured(&self) -> bool {
        self.backend_url.is_some() && self.anon_key.is_some()
    }

    /// Get the backend coordinates, failing with a configuration error when
    /// either is missing or the URL does not parse.
    pub fn backend_credentials(&self) -> CoreResult<(Url, String)> {
        let raw_url = self.backend_url.as_deref().ok_or_else(|| {
            CoreError::Config(format!("{} is not set", ENV_BACKEND_URL))
        })?;
        let anon_key = self.anon_key.as_deref().ok_or_else(|| {
            CoreError::Config(format!("{} is not set", ENV_ANON_KEY))
        })?;

        let url = Url::parse(raw_url)?;
        Ok((url, anon_key.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.log_level, DEFAULT_LOG_LEVEL);
        assert!(config.backend_url.is_none());
        assert!(config.anon_key.is_none());
        assert!(!config.is_backend_configured());
    }

    #[test]
    fn test_config_load_from_file() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.json");

        let config_json = r#"{
            "log_level": "debug"
        }"#;

        std::fs::write(&config_path, config_json).unwrap();

        let config = Config::load_from_file(&config_path).unwrap();
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn test_config_save_and_load_roundtrip() {
        let dir = tempdir().unwrap();
        let paths = Paths::with_base_dir(dir.path().to_path_buf());

        let mut config = Config::default();
        config.log_level = "trace".to_string();

        config.save(&paths).unwrap();

        let loaded = Config::load(&paths).unwrap();
        assert_eq!(loaded.log_level, "trace");
    }

    #[test]
    fn test_config_file_never_carries_backend_coordinates() {
        let dir = tempdir().unwrap();
        let paths = Paths::with_base_dir(dir.path().to_path_buf());

        let mut config = Config::default();
        config.backend_url = Some("https://abc.example.co".to_string());
        config.anon_key = Some("anon-key".to_string());
        config.save(&paths).unwrap();

        let content = std::fs::read_to_string(paths.config_file()).unwrap();
        assert!(!content.contains("abc.example.co"));
        assert!(!content.contains("anon-key"));
    }

    #[test]
    fn test_backend_credentials_missing_url() {
        let config = Config {
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            backend_url: None,
            anon_key: Some("key".to_string()),
        };

        let err = config.backend_credentials().unwrap_err();
        assert!(matches!(err, CoreError::Config(_)));
    }

    #[test]
    fn test_backend_credentials_missing_key() {
        let config = Config {
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            backend_url: Some("https://abc.example.co".to_string()),
            anon_key: None,
        };

        let err = config.backend_credentials().unwrap_err();
        assert!(matches!(err, CoreError::Config(_)));
    }

    #[test]
    fn test_backend_credentials_invalid_url() {
        let config = Config {
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            backend_url: Some("not a valid url".to_string()),
            anon_key: Some("key".to_string()),
        };

        let result = config.backend_credentials();
        assert!(result.is_err());
    }

    #[test]
    fn test_backend_credentials_present() {
        let config = Config {
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            backend_url: Some("https://abc.example.co".to_string()),
            anon_key: Some("key".to_string()),
        };

        let (url, key) = config.backend_credentials().unwrap();
        assert_eq!(url.scheme(), "https");
        assert_eq!(key, "key");
    }
}
