use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::constants::{
    APP_NAME, DEFAULT_ENDPOINT, DEFAULT_MAX_RETRIES, DEFAULT_MODEL, DEFAULT_TEMPERATURE,
    DEFAULT_TEMPLATE_DIR, DEFAULT_TEMPLATE_EXTENSION, DEFAULT_TIMEOUT_SECS,
};
use crate::error::ConfigError;
use crate::retrieval::RetrievalStrategy;
use crate::templates::ReadErrorPolicy;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub templates: TemplatesConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    /// Completion endpoint configuration
    #[serde(default)]
    pub ai: AiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplatesConfig {
    /// Directory scanned for templates, relative to the working directory
    #[serde(default = "default_template_dir")]
    pub dir: PathBuf,
    /// Extension (without the dot) of template files
    #[serde(default = "default_template_extension")]
    pub extension: String,
    /// Skip or abort on template files that cannot be read
    #[serde(default)]
    pub on_read_error: ReadErrorPolicy,
}

impl Default for TemplatesConfig {
    fn default() -> Self {
        Self {
            dir: default_template_dir(),
            extension: default_template_extension(),
            on_read_error: ReadErrorPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    #[serde(default)]
    pub strategy: RetrievalStrategy,
    /// Number of templates embedded in the prompt
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            strategy: RetrievalStrategy::default(),
            top_k: default_top_k(),
        }
    }
}

/// Completion endpoint configuration (any OpenAI-compatible chat API)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    /// API key; the OPENAI_API_KEY environment variable takes precedence
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Model to use (default: gpt-3.5-turbo)
    #[serde(default = "default_model")]
    pub model: String,
    /// Sampling temperature in [0, 1]
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Maximum tokens for the drafted email (endpoint default when unset)
    #[serde(default)]
    pub max_tokens: Option<u32>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Retries for 5xx responses
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: default_endpoint(),
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: None,
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
        }
    }
}

fn default_template_dir() -> PathBuf {
    PathBuf::from(DEFAULT_TEMPLATE_DIR)
}

fn default_template_extension() -> String {
    DEFAULT_TEMPLATE_EXTENSION.to_string()
}

fn default_top_k() -> usize {
    1
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_temperature() -> f32 {
    DEFAULT_TEMPERATURE
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}

impl Config {
    pub fn config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_NAME))
    }

    pub fn config_path() -> Option<PathBuf> {
        Self::config_dir().map(|dir| dir.join("config.toml"))
    }

    /// Load from the default location. A missing file yields the defaults.
    pub fn load() -> Result<Self, ConfigError> {
        match Self::config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => {
                tracing::debug!("No config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let temperature = self.ai.temperature;
        if !(0.0..=1.0).contains(&temperature) {
            return Err(ConfigError::Invalid {
                field: "ai.temperature",
                reason: format!("{} is outside [0, 1]", temperature),
            });
        }
        if self.retrieval.top_k == 0 {
            return Err(ConfigError::Invalid {
                field: "retrieval.top_k",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.templates.extension.is_empty() || self.templates.extension.starts_with('.') {
            return Err(ConfigError::Invalid {
                field: "templates.extension",
                reason: "must be non-empty and given without the leading dot".to_string(),
            });
        }
        Ok(())
    }
}
