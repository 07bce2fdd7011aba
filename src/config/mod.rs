//! Configuration Management
//!
//! This module loads the JSON configuration the session starts from: database
//! connection parameters and the AI provider selection.
//!
//! # Configuration Locations
//! - Explicit: `--config <path>` (highest priority, must exist)
//! - Local: `./config.json` (per-project)
//! - Global: `~/.config/nlquery/config.json` (per-user)
//!
//! # Format
//! ```json
//! {
//!   "database": {
//!     "host": "localhost",
//!     "port": 5432,
//!     "name": "shop",
//!     "user": "analyst",
//!     "password_env": "SHOP_DB_PASSWORD"
//!   },
//!   "ai": {
//!     "provider": "ollama",
//!     "ollama": { "model": "llama3" },
//!     "options": { "temperature": 0.1 }
//!   }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::engine::ConnectionConfig;
use crate::error::{NlQueryError, Result};

/// Local configuration file name
pub const LOCAL_CONFIG_FILE: &str = "config.json";

/// Default PostgreSQL port
const DEFAULT_PORT: u16 = 5432;

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Database connection settings
    pub database: DatabaseSettings,

    /// AI provider settings
    pub ai: AiSettings,
}

/// Database connection settings
///
/// Supports an environment variable reference instead of a stored password.
#[derive(Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// Hostname
    pub host: String,

    /// Port number
    #[serde(default = "default_port")]
    pub port: u16,

    /// Database name
    pub name: String,

    /// Username
    pub user: String,

    /// Password stored directly in the file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Environment variable name for password (takes precedence over `password`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_env: Option<String>,

    /// Connect timeout in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connect_timeout_secs: Option<u64>,
}

const fn default_port() -> u16 {
    DEFAULT_PORT
}

impl std::fmt::Debug for DatabaseSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("name", &self.name)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("password_env", &self.password_env)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .finish()
    }
}

impl DatabaseSettings {
    /// Resolve environment variables and return a `ConnectionConfig`
    pub fn resolve(&self) -> Result<ConnectionConfig> {
        if self.host.trim().is_empty() {
            return Err(NlQueryError::config_error("database.host must not be empty"));
        }
        if self.name.trim().is_empty() {
            return Err(NlQueryError::config_error("database.name must not be empty"));
        }
        if self.user.trim().is_empty() {
            return Err(NlQueryError::config_error("database.user must not be empty"));
        }

        // If password_env is set, resolve the environment variable
        let password = match (&self.password_env, &self.password) {
            (Some(env_var), _) => std::env::var(env_var).map_err(|_| {
                NlQueryError::config_error(format!("Environment variable {env_var} not found for password"))
            })?,
            (None, Some(password)) => password.clone(),
            (None, None) => String::new(),
        };

        let mut config = ConnectionConfig::new(
            self.host.clone(),
            self.port,
            self.user.clone(),
            password,
            self.name.clone(),
        );
        if let Some(secs) = self.connect_timeout_secs {
            config = config.with_connect_timeout(Duration::from_secs(secs));
        }

        Ok(config)
    }
}

/// Supported AI providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Local Ollama server
    Ollama,
    /// Azure AI inference
    Azure,
    /// OpenAI-compatible API
    OpenAi,
}

/// AI provider settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiSettings {
    /// Active provider
    pub provider: ProviderKind,

    /// Ollama settings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ollama: Option<OllamaSettings>,

    /// Azure settings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub azure: Option<AzureSettings>,

    /// OpenAI settings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openai: Option<OpenAiSettings>,

    /// Sampling options shared by all providers
    #[serde(default, alias = "modelOptions")]
    pub options: ModelOptions,
}

/// Ollama provider settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OllamaSettings {
    /// Base URL (falls back to `OLLAMA_API_BASE`, then `http://127.0.0.1:11434`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Model name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

/// Azure AI inference settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AzureSettings {
    /// Inference endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Model or deployment name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Environment variable holding the API key (default `GITHUB_TOKEN`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,
}

/// OpenAI-compatible settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OpenAiSettings {
    /// API base URL (default `https://api.openai.com/v1`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Model name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Environment variable holding the API key (default `OPENAI_API_KEY`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,
}

/// Sampling options
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

/// Get path to local config file (`./config.json`)
pub fn local_config_path() -> Result<PathBuf> {
    let current_dir = std::env::current_dir().map_err(|e| {
        NlQueryError::config_error(format!("Could not determine current directory: {e}"))
    })?;

    Ok(current_dir.join(LOCAL_CONFIG_FILE))
}

/// Get path to global config file (`~/.config/nlquery/config.json`)
pub fn global_config_path() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .ok_or_else(|| NlQueryError::config_error("Could not determine user config directory"))?;

    Ok(config_dir.join("nlquery").join(LOCAL_CONFIG_FILE))
}

/// Resolve which configuration file to load
///
/// An explicit path wins and must exist. Otherwise the local file is used if
/// present, then the global one.
pub fn resolve_config_path(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        if !path.exists() {
            return Err(NlQueryError::config_error(format!(
                "Configuration file not found: {}",
                path.display()
            )));
        }
        return Ok(path.to_path_buf());
    }

    let local = local_config_path()?;
    if local.exists() {
        return Ok(local);
    }

    let global = global_config_path()?;
    if global.exists() {
        return Ok(global);
    }

    Err(NlQueryError::config_error(format!(
        "No configuration found. Create {} or {}, or pass --config.",
        local.display(),
        global.display()
    )))
}

/// Load configuration from a JSON file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let contents = fs::read_to_string(path).map_err(|e| {
        NlQueryError::config_error(format!("Could not read config file {}: {e}", path.display()))
    })?;

    parse_config(&contents)
        .map_err(|e| NlQueryError::config_error(format!("Invalid config file {}: {}", path.display(), e)))
}

/// Parse configuration from JSON text
pub fn parse_config(contents: &str) -> std::result::Result<AppConfig, serde_json::Error> {
    serde_json::from_str(contents)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "database": {
            "host": "db.internal",
            "name": "shop",
            "user": "analyst",
            "password": "pass"
        },
        "ai": {
            "provider": "ollama",
            "ollama": { "model": "llama3" },
            "modelOptions": { "temperature": 0.2, "max_tokens": 512 }
        }
    }"#;

    fn settings() -> DatabaseSettings {
        parse_config(SAMPLE).unwrap().database
    }

    #[test]
    fn test_parse_config_defaults() {
        let config = parse_config(SAMPLE).unwrap();
        assert_eq!(config.database.port, 5432);
        assert_eq!(config.ai.provider, ProviderKind::Ollama);
        assert_eq!(config.ai.ollama.unwrap().model.as_deref(), Some("llama3"));
        assert_eq!(config.ai.options.temperature, Some(0.2));
        assert_eq!(config.ai.options.max_tokens, Some(512));
        assert!(config.ai.azure.is_none());
    }

    #[test]
    fn test_provider_names() {
        let kinds: Vec<ProviderKind> = serde_json::from_str(r#"["ollama", "azure", "openai"]"#).unwrap();
        assert_eq!(kinds, vec![ProviderKind::Ollama, ProviderKind::Azure, ProviderKind::OpenAi]);
        assert!(serde_json::from_str::<ProviderKind>(r#""bard""#).is_err());
    }

    #[test]
    fn test_resolve_direct_password() {
        let resolved = settings().resolve().unwrap();
        assert_eq!(resolved.host, "db.internal");
        assert_eq!(resolved.database, "shop");
        assert_eq!(resolved.password, "pass");
        assert!(resolved.connect_timeout.is_none());
    }

    #[test]
    fn test_resolve_env_var() {
        std::env::set_var("NLQUERY_TEST_DB_PASSWORD", "secret");

        let mut db = settings();
        db.password_env = Some("NLQUERY_TEST_DB_PASSWORD".to_string());
        db.connect_timeout_secs = Some(4);

        let resolved = db.resolve().unwrap();
        assert_eq!(resolved.password, "secret");
        assert_eq!(resolved.connect_timeout, Some(Duration::from_secs(4)));

        std::env::remove_var("NLQUERY_TEST_DB_PASSWORD");
    }

    #[test]
    fn test_resolve_missing_env_var() {
        let mut db = settings();
        db.password_env = Some("NLQUERY_NONEXISTENT_VAR".to_string());

        let result = db.resolve();
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .message()
            .contains("Environment variable NLQUERY_NONEXISTENT_VAR not found"));
    }

    #[test]
    fn test_resolve_rejects_empty_host() {
        let mut db = settings();
        db.host = "  ".to_string();
        assert!(db.resolve().unwrap_err().message().contains("database.host"));
    }

    #[test]
    fn test_settings_debug_redacts_password() {
        let mut db = settings();
        db.password = Some("hunter2".to_string());

        let debug = format!("{db:?}");
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_explicit_path_must_exist() {
        let missing = std::env::temp_dir().join("nlquery-definitely-missing.json");
        let err = resolve_config_path(Some(&missing)).unwrap_err();
        assert_eq!(err.error_code(), "CONFIG_ERROR");
        assert!(err.message().contains("not found"));
    }

    #[test]
    fn test_load_config_from_file() {
        let path = std::env::temp_dir().join(format!("nlquery_config_{}.json", std::process::id()));
        fs::write(&path, SAMPLE).unwrap();

        assert_eq!(resolve_config_path(Some(&path)).unwrap(), path);
        let config = load_config(&path).unwrap();
        assert_eq!(config.database.user, "analyst");

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_load_invalid_json() {
        let path = std::env::temp_dir().join(format!("nlquery_bad_config_{}.json", std::process::id()));
        fs::write(&path, "{ not json").unwrap();

        let err = load_config(&path).unwrap_err();
        assert!(err.message().contains("Invalid config file"));

        let _ = fs::remove_file(&path);
    }
}
