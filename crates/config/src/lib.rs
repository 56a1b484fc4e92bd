//! Configuration loading, validation, and management for docchat.
//!
//! Loads configuration from `~/.docchat/config.toml` (or an explicit path)
//! with environment variable overrides. Validates all settings at startup.
//! The upstream credential is read here once and handed to the provider at
//! construction; request handlers never read the environment.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use docchat_core::DEFAULT_SYSTEM_INSTRUCTION;

/// Environment variables checked for the upstream credential, in priority order.
pub const API_KEY_ENV_VARS: [&str; 2] = ["DOCCHAT_API_KEY", "AI_GATEWAY_API_KEY"];

/// The root configuration structure.
///
/// Maps directly to `~/.docchat/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Credential for the AI gateway
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Base URL of the OpenAI-compatible gateway (without `/chat/completions`)
    #[serde(default = "default_gateway_url")]
    pub gateway_url: String,

    /// Model identifier sent upstream
    #[serde(default = "default_model")]
    pub model: String,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Optional cap on generated tokens
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Deadline for one upstream call
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Replaces the built-in document-assistant instruction
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt_override: Option<String>,

    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Upstream retry policy
    #[serde(default)]
    pub retry: RetryConfig,
}

fn default_gateway_url() -> String {
    "https://ai.gateway.lovable.dev/v1".into()
}
fn default_model() -> String {
    "google/gemini-2.5-flash".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_request_timeout_secs() -> u64 {
    60
}

fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("gateway_url", &self.gateway_url)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field(
                "system_prompt_override",
                &self.system_prompt_override.as_ref().map(|s| s.len()),
            )
            .field("server", &self.server)
            .field("retry", &self.retry)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Allowed CORS origins; `"*"` allows any origin
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// Largest accepted request body (the PDF travels base64-encoded)
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

fn default_host() -> String {
    "127.0.0.1".into()
}
fn default_port() -> u16 {
    8787
}
fn default_cors_origins() -> Vec<String> {
    vec!["*".into()]
}
fn default_max_body_bytes() -> usize {
    32 * 1024 * 1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: default_cors_origins(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

impl ServerConfig {
    pub fn allows_any_origin(&self) -> bool {
        self.cors_origins.iter().any(|o| o == "*")
    }
}

/// Bounded retry with exponential backoff. `max_retries = 0` fails on the
/// first upstream error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default)]
    pub max_retries: u32,

    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

fn default_initial_backoff_ms() -> u64 {
    500
}
fn default_max_backoff_ms() -> u64 {
    8_000
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 0,
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.docchat/config.toml),
    /// then apply environment overrides:
    /// - `DOCCHAT_API_KEY`, then `AI_GATEWAY_API_KEY` (credential, only if unset in the file)
    /// - `DOCCHAT_MODEL`
    /// - `DOCCHAT_GATEWAY_URL`
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with(None)
    }

    /// Like [`AppConfig::load`], reading `path` instead of the default file.
    pub fn load_with(path: Option<&Path>) -> Result<Self, ConfigError> {
        let default_path = Self::config_path();
        let mut config = Self::load_from(path.unwrap_or(&default_path))?;
        config.apply_env(|name| std::env::var(name).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let mut config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        config.api_key = config.api_key.filter(|key| !key.trim().is_empty());

        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides using `lookup` to read variables.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if self.api_key.is_none() {
            self.api_key = API_KEY_ENV_VARS
                .iter()
                .find_map(|name| lookup(name).filter(|key| !key.trim().is_empty()));
        }

        if let Some(model) = lookup("DOCCHAT_MODEL") {
            self.model = model;
        }

        if let Some(url) = lookup("DOCCHAT_GATEWAY_URL") {
            self.gateway_url = url;
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".docchat")
    }

    /// Get the default configuration file path.
    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::ValidationError(
                "temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.request_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "request_timeout_secs must be > 0".into(),
            ));
        }

        if !(self.gateway_url.starts_with("http://") || self.gateway_url.starts_with("https://")) {
            return Err(ConfigError::ValidationError(format!(
                "gateway_url must be an http(s) URL, got '{}'",
                self.gateway_url
            )));
        }

        if self.server.max_body_bytes == 0 {
            return Err(ConfigError::ValidationError(
                "server.max_body_bytes must be > 0".into(),
            ));
        }

        if self.retry.initial_backoff_ms > self.retry.max_backoff_ms {
            return Err(ConfigError::ValidationError(
                "retry.initial_backoff_ms must not exceed retry.max_backoff_ms".into(),
            ));
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// The instruction placed first in every prompt.
    pub fn system_instruction(&self) -> &str {
        self.system_prompt_override
            .as_deref()
            .unwrap_or(DEFAULT_SYSTEM_INSTRUCTION)
    }

    /// Deadline for a single upstream attempt.
    pub fn request_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.request_timeout_secs)
    }

    /// Deadline for a whole question: every attempt the retry policy allows
    /// plus the longest backoff before each retry.
    pub fn request_deadline(&self) -> std::time::Duration {
        let retries = self.retry.max_retries;
        self.request_timeout()
            .saturating_mul(retries.saturating_add(1))
            .saturating_add(
                std::time::Duration::from_millis(self.retry.max_backoff_ms)
                    .saturating_mul(retries),
            )
    }

    /// Generate a default config TOML string (for the `init` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            gateway_url: default_gateway_url(),
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: None,
            request_timeout_secs: default_request_timeout_secs(),
            system_prompt_override: None,
            server: ServerConfig::default(),
            retry: RetryConfig::default(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.model, "google/gemini-2.5-flash");
        assert!((config.temperature - 0.7).abs() < f32::EPSILON);
        assert_eq!(config.server.port, 8787);
        assert_eq!(config.retry.max_retries, 0);
        assert!(config.server.allows_any_origin());
        assert!(!config.has_api_key());
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.model, config.model);
        assert_eq!(parsed.server.port, config.server.port);
        assert_eq!(parsed.gateway_url, config.gateway_url);
    }

    #[test]
    fn invalid_temperature_rejected() {
        let config = AppConfig {
            temperature: 5.0,
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_timeout_rejected() {
        let config = AppConfig {
            request_timeout_secs: 0,
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn non_http_gateway_rejected() {
        let config = AppConfig {
            gateway_url: "ftp://example.com".into(),
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let result = AppConfig::load_from(Path::new("/nonexistent/config.toml"));
        assert!(result.is_ok());
        assert_eq!(result.unwrap().model, "google/gemini-2.5-flash");
    }

    #[test]
    fn loads_partial_file_with_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
api_key = "sk-file"
temperature = 0.2

[server]
port = 9000
cors_origins = ["http://localhost:5173"]

[retry]
max_retries = 2
"#
        )
        .unwrap();

        let config = AppConfig::load_from(file.path()).unwrap();
        assert_eq!(config.api_key.as_deref(), Some("sk-file"));
        assert!((config.temperature - 0.2).abs() < f32::EPSILON);
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "127.0.0.1");
        assert!(!config.server.allows_any_origin());
        assert_eq!(config.retry.max_retries, 2);
        assert_eq!(config.retry.initial_backoff_ms, 500);
        assert_eq!(config.model, "google/gemini-2.5-flash");
    }

    #[test]
    fn blank_file_key_is_treated_as_missing() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "api_key = \"   \"").unwrap();

        let mut config = AppConfig::load_from(file.path()).unwrap();
        assert!(!config.has_api_key());

        config.apply_env(env(&[("AI_GATEWAY_API_KEY", "sk-gateway")]));
        assert_eq!(config.api_key.as_deref(), Some("sk-gateway"));
    }

    #[test]
    fn unparseable_file_is_a_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "temperature = \"hot\"").unwrap();
        let err = AppConfig::load_from(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn env_supplies_missing_key_in_priority_order() {
        let mut config = AppConfig::default();
        config.apply_env(env(&[
            ("AI_GATEWAY_API_KEY", "sk-gateway"),
            ("DOCCHAT_API_KEY", "sk-docchat"),
        ]));
        assert_eq!(config.api_key.as_deref(), Some("sk-docchat"));

        let mut config = AppConfig::default();
        config.apply_env(env(&[("AI_GATEWAY_API_KEY", "sk-gateway")]));
        assert_eq!(config.api_key.as_deref(), Some("sk-gateway"));
    }

    #[test]
    fn env_does_not_override_file_key() {
        let mut config = AppConfig {
            api_key: Some("sk-file".into()),
            ..AppConfig::default()
        };
        config.apply_env(env(&[("DOCCHAT_API_KEY", "sk-env")]));
        assert_eq!(config.api_key.as_deref(), Some("sk-file"));
    }

    #[test]
    fn blank_env_key_counts_as_missing() {
        let mut config = AppConfig::default();
        config.apply_env(env(&[("DOCCHAT_API_KEY", "  ")]));
        assert!(!config.has_api_key());
    }

    #[test]
    fn blank_primary_env_key_falls_through_to_gateway_key() {
        let mut config = AppConfig::default();
        config.apply_env(env(&[
            ("DOCCHAT_API_KEY", ""),
            ("AI_GATEWAY_API_KEY", "sk-real"),
        ]));
        assert_eq!(config.api_key.as_deref(), Some("sk-real"));
    }

    #[test]
    fn env_overrides_model_and_url() {
        let mut config = AppConfig::default();
        config.apply_env(env(&[
            ("DOCCHAT_MODEL", "openai/gpt-4o-mini"),
            ("DOCCHAT_GATEWAY_URL", "http://localhost:4000/v1"),
        ]));
        assert_eq!(config.model, "openai/gpt-4o-mini");
        assert_eq!(config.gateway_url, "http://localhost:4000/v1");
    }

    #[test]
    fn deadline_covers_every_retry() {
        let mut config = AppConfig::default();
        assert_eq!(config.request_deadline(), config.request_timeout());

        config.request_timeout_secs = 60;
        config.retry.max_retries = 3;
        config.retry.max_backoff_ms = 8_000;
        assert_eq!(
            config.request_deadline(),
            std::time::Duration::from_secs(4 * 60 + 3 * 8)
        );
    }

    #[test]
    fn debug_redacts_api_key() {
        let config = AppConfig {
            api_key: Some("sk-very-secret".into()),
            ..AppConfig::default()
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-very-secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn system_instruction_override() {
        let mut config = AppConfig::default();
        assert_eq!(config.system_instruction(), DEFAULT_SYSTEM_INSTRUCTION);
        config.system_prompt_override = Some("Answer in French.".into());
        assert_eq!(config.system_instruction(), "Answer in French.");
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = AppConfig::default_toml();
        assert!(toml_str.contains("gemini-2.5-flash"));
        assert!(toml_str.contains("8787"));
        assert!(!toml_str.contains("api_key"));
    }
}
