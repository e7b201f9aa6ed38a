//! Configuration loading and management for resumo.
//!
//! Loads settings from `resumo.toml` with environment variable overrides for
//! sensitive data and deployment settings. The resulting value is built once
//! at startup and handed to the components that need it.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("missing required API key for provider: {0}")]
    MissingApiKey(String),
    #[error("invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Allowed CORS origins, `*` for any
    pub cors_origins: Vec<String>,
}

/// LLM provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Provider name, mapped to a concrete model (e.g., "gemini", "gemini-pro")
    pub provider: String,
    /// Upper bound for a single LLM call, in seconds
    pub timeout_secs: u64,
}

/// API keys configuration (loaded from environment)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ApiConfig {
    #[serde(default)]
    pub gemini_key: Option<String>,
}

/// Storage paths configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Base path for data storage
    pub path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Default filter when RUST_LOG is not set
    pub level: String,
}

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub agent: AgentConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub log: LogConfig,
}

impl Config {
    /// Load configuration from the default location (resumo.toml in cwd or home).
    ///
    /// Falls back to built-in defaults when no file exists.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match Self::find_config_file() {
            Some(path) => Self::from_file(&path)?,
            None => Config::default(),
        };
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::from_file(path)?;
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Override settings from environment variables
    fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_env_with(|name| std::env::var(name).ok())
    }

    /// Blank values count as unset, so `GEMINI_API_KEY=` in a `.env` file
    /// does not shadow the key from the config file.
    fn apply_env_with(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        if let Some(key) = var("GEMINI_API_KEY").or_else(|| var("GOOGLE_API_KEY")) {
            self.api.gemini_key = Some(key);
        }
        if let Some(provider) = var("MODEL_PROVIDER") {
            self.agent.provider = provider;
        }
        if let Some(path) = var("STORAGE_PATH") {
            self.storage.path = PathBuf::from(path);
        }
        if let Some(host) = var("HOST") {
            self.server.host = host;
        }
        if let Some(port) = var("PORT") {
            self.server.port = port
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue("PORT".to_string(), port))?;
        }
        if let Some(level) = var("LOG_LEVEL") {
            self.log.level = level;
        }
        Ok(())
    }

    /// Reject settings that parse but cannot work
    fn validate(&self) -> Result<(), ConfigError> {
        if self.agent.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue(
                "agent.timeout_secs".to_string(),
                "0".to_string(),
            ));
        }
        Ok(())
    }

    /// Find the config file in standard locations
    fn find_config_file() -> Option<PathBuf> {
        // Check current directory first
        let local_config = PathBuf::from("resumo.toml");
        if local_config.exists() {
            return Some(local_config);
        }

        // Check home directory
        if let Some(home) = dirs::home_dir() {
            let home_config = home.join(".config").join("resumo").join("resumo.toml");
            if home_config.exists() {
                return Some(home_config);
            }
        }

        None
    }

    /// Get the API key for the LLM provider.
    ///
    /// Every supported provider name resolves to a Gemini model, so the
    /// Gemini key is the only one consulted.
    pub fn api_key(&self) -> Result<&str, ConfigError> {
        self.api
            .gemini_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingApiKey(self.agent.provider.clone()))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.agent.timeout_secs)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            cors_origins: vec!["*".to_string()],
        }
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            provider: "gemini".to_string(),
            timeout_secs: 60,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./data"),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_partial_file_with_defaults() {
        let config: Config = toml::from_str(
            r#"
            [agent]
            provider = "gemini-pro"

            [storage]
            path = "/tmp/resumo"
            "#,
        )
        .unwrap();

        assert_eq!(config.agent.provider, "gemini-pro");
        assert_eq!(config.agent.timeout_secs, 60);
        assert_eq!(config.storage.path, PathBuf::from("/tmp/resumo"));
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.log.level, "info");
    }

    #[test]
    fn missing_key_is_an_error() {
        let mut config = Config::default();
        assert!(matches!(config.api_key(), Err(ConfigError::MissingApiKey(_))));

        config.api.gemini_key = Some("  ".to_string());
        assert!(config.api_key().is_err());

        config.api.gemini_key = Some("secret".to_string());
        assert_eq!(config.api_key().unwrap(), "secret");
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("resumo.toml");
        std::fs::write(&path, "[server]\nport = 9090\n").unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.host, "0.0.0.0");
    }

    #[test]
    fn rejects_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("resumo.toml");
        std::fs::write(&path, "[server\nport = ").unwrap();

        assert!(matches!(
            Config::from_file(&path),
            Err(ConfigError::ParseError(_))
        ));
    }

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: std::collections::HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn blank_env_values_keep_file_settings() {
        let mut config: Config = toml::from_str(
            r#"
            [api]
            gemini_key = "from-file"

            [server]
            host = "127.0.0.1"
            "#,
        )
        .unwrap();

        config
            .apply_env_with(env(&[("GEMINI_API_KEY", ""), ("HOST", "  "), ("PORT", "")]))
            .unwrap();
        assert_eq!(config.api_key().unwrap(), "from-file");
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8000);
    }

    #[test]
    fn google_key_is_used_when_gemini_key_is_blank() {
        let mut config = Config::default();
        config
            .apply_env_with(env(&[("GEMINI_API_KEY", " "), ("GOOGLE_API_KEY", "google")]))
            .unwrap();
        assert_eq!(config.api_key().unwrap(), "google");

        config
            .apply_env_with(env(&[("GEMINI_API_KEY", "gemini"), ("GOOGLE_API_KEY", "google")]))
            .unwrap();
        assert_eq!(config.api_key().unwrap(), "gemini");
    }

    #[test]
    fn rejects_unparsable_port() {
        let mut config = Config::default();
        assert!(matches!(
            config.apply_env_with(env(&[("PORT", "http")])),
            Err(ConfigError::InvalidValue(_, _))
        ));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("resumo.toml");
        std::fs::write(&path, "[agent]\ntimeout_secs = 0\n").unwrap();

        let config = Config::from_file(&path).unwrap();
        match config.validate() {
            Err(ConfigError::InvalidValue(field, value)) => {
                assert_eq!(field, "agent.timeout_secs");
                assert_eq!(value, "0");
            }
            other => panic!("expected InvalidValue, got {:?}", other),
        }

        assert!(Config::default().validate().is_ok());
    }
}
