//! File and environment configuration for the writing assistant.
//!
//! ```rust
//! use quill::{QuillConfig, StoreBackend};
//!
//! let config = QuillConfig::from_toml_str(
//!     r#"
//!     [model]
//!     model = "deepseek-reasoner"
//!     temperature = 0.4
//!
//!     [store]
//!     backend = "memory"
//!     "#,
//! )
//! .expect("config parses");
//!
//! assert_eq!(config.model.model, "deepseek-reasoner");
//! assert_eq!(config.model.max_tokens, 32_768);
//! assert_eq!(config.store.backend, StoreBackend::Memory);
//! ```

use std::fmt::{Debug, Display, Formatter};
use std::path::{Path, PathBuf};
use std::time::Duration;

use qchat::{ChatPolicy, DEFAULT_MAX_TOKENS, DEFAULT_MODEL, DEFAULT_TEMPERATURE, ToolExecutionMode};
use qcommon::GenerationOptions;
use qprovider::SecretString;
use qstore::{StoreConfig, default_sqlite_path};
use serde::Deserialize;

pub const DEFAULT_BASE_URL: &str = "https://api.deepseek.com/v1";
pub const DEFAULT_TIMEOUT_SECS: u64 = 90;

pub const ENV_API_KEY: &str = "OPENAI_API_KEY";
pub const ENV_BASE_URL: &str = "OPENAI_BASE_URL";
pub const ENV_MODEL: &str = "OPENAI_MODEL";
pub const ENV_DB_PATH: &str = "QUILL_DB_PATH";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigErrorKind {
    Io,
    Parse,
    Invalid,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    pub kind: ConfigErrorKind,
    pub message: String,
}

impl ConfigError {
    pub fn new(kind: ConfigErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self::new(ConfigErrorKind::Io, message)
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::new(ConfigErrorKind::Parse, message)
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self::new(ConfigErrorKind::Invalid, message)
    }
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct QuillConfig {
    pub model: ModelConfig,
    pub store: StoreSettings,
    pub chat: ChatSettings,
}

/// Connection and sampling settings for the OpenAI-compatible endpoint.
#[derive(Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_secs: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl Debug for ModelConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl ModelConfig {
    /// The configured key, or an error naming the variable that would supply it.
    pub fn secret_api_key(&self) -> Result<SecretString, ConfigError> {
        match self.api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => Ok(SecretString::new(key)),
            _ => Err(ConfigError::invalid(format!(
                "an API key is required; set [model].api_key or {ENV_API_KEY}"
            ))),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Sqlite,
    Memory,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    pub backend: StoreBackend,
    /// Database file; defaults to `~/.quill/quill.db`.
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolExecution {
    #[default]
    Concurrent,
    Sequential,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct ChatSettings {
    pub max_tool_rounds: Option<u32>,
    pub tool_execution: ToolExecution,
    pub tool_timeout_secs: Option<u64>,
}

impl ChatSettings {
    pub fn tool_timeout(&self) -> Option<Duration> {
        self.tool_timeout_secs.map(Duration::from_secs)
    }
}

impl QuillConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(source).map_err(|err| ConfigError::parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .map_err(|err| ConfigError::io(format!("{}: {err}", path.display())))?;
        Self::from_toml_str(&source)
    }

    /// Reads `path` (or `~/.quill/config.toml` when present) and applies
    /// environment overrides on top.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let base = match path {
            Some(path) => Self::from_file(path)?,
            None => match default_config_path().filter(|path| path.is_file()) {
                Some(path) => Self::from_file(path)?,
                None => Self::default(),
            },
        };

        let config = base.with_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Applies overrides from `lookup`, which maps an environment variable name
    /// to its value. Empty values are ignored.
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(key) = lookup(ENV_API_KEY) {
            self.model.api_key = Some(key);
        }
        if let Some(base_url) = lookup(ENV_BASE_URL) {
            self.model.base_url = base_url;
        }
        if let Some(model) = lookup(ENV_MODEL) {
            self.model.model = model;
        }
        if let Some(path) = lookup(ENV_DB_PATH) {
            self.store.path = Some(PathBuf::from(path));
        }

        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.model.model.trim().is_empty() {
            return Err(ConfigError::invalid("[model].model must not be empty"));
        }

        if self.model.base_url.trim().is_empty() {
            return Err(ConfigError::invalid("[model].base_url must not be empty"));
        }

        if !(0.0..=2.0).contains(&self.model.temperature) {
            return Err(ConfigError::invalid(
                "[model].temperature must be in the inclusive range 0.0..=2.0",
            ));
        }

        if self.model.max_tokens == 0 {
            return Err(ConfigError::invalid(
                "[model].max_tokens must be greater than zero",
            ));
        }

        if self.model.timeout_secs == 0 {
            return Err(ConfigError::invalid(
                "[model].timeout_secs must be greater than zero",
            ));
        }

        if self.chat.max_tool_rounds == Some(0) {
            return Err(ConfigError::invalid(
                "[chat].max_tool_rounds must be greater than zero when set",
            ));
        }

        if self.chat.tool_timeout_secs == Some(0) {
            return Err(ConfigError::invalid(
                "[chat].tool_timeout_secs must be greater than zero when set",
            ));
        }

        Ok(())
    }

    pub fn store_config(&self) -> StoreConfig {
        match self.store.backend {
            StoreBackend::Memory => StoreConfig::InMemory,
            StoreBackend::Sqlite => StoreConfig::Sqlite {
                path: self.store.path.clone().unwrap_or_else(default_sqlite_path),
            },
        }
    }

    pub fn chat_policy(&self) -> ChatPolicy {
        let options = GenerationOptions::default()
            .with_temperature(self.model.temperature)
            .with_max_tokens(self.model.max_tokens);
        let mode = match self.chat.tool_execution {
            ToolExecution::Concurrent => ToolExecutionMode::Concurrent,
            ToolExecution::Sequential => ToolExecutionMode::Sequential,
        };

        let mut policy = ChatPolicy::default()
            .with_model(self.model.model.clone())
            .with_options(options)
            .with_tool_execution(mode);
        policy.max_tool_rounds = self.chat.max_tool_rounds;
        policy
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".quill").join("config.toml"))
}
