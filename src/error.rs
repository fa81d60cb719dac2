//! Error types for template loading, configuration and completion requests.

use std::path::PathBuf;

use thiserror::Error;

/// Invalid or missing configuration. Always fatal and raised before any work starts.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("API key not found. Set OPENAI_API_KEY, add ai.api_key to the config, or run 'draftsmith setup'.")]
    MissingApiKey,

    #[error("Invalid configuration value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Failure to load the template directory.
#[derive(Debug, Error)]
pub enum StoreLoadError {
    #[error("Template directory not found: {0}")]
    MissingDirectory(PathBuf),

    #[error("Template path is not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("Failed to read template directory {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Only produced when the store is configured to abort on per-file errors.
    #[error("Failed to read template file {path}: {source}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Failure talking to the completion endpoint.
///
/// Rate limiting (HTTP 429) is deliberately absent: it is reported as a normal
/// outcome, see [`crate::ai::Completion::QuotaExceeded`].
#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("Completion API error ({status}): {body}")]
    Http { status: u16, body: String },

    #[error("Completion request timed out")]
    Timeout,

    #[error("Failed to send completion request: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("Invalid completion response: {0}")]
    InvalidResponse(String),
}

impl CompletionError {
    /// Status label reported to callers: the HTTP code, `timeout`, or `transport`.
    pub fn status(&self) -> String {
        match self {
            CompletionError::Http { status, .. } => status.to_string(),
            CompletionError::Timeout => "timeout".to_string(),
            CompletionError::Transport(_) => "transport".to_string(),
            CompletionError::InvalidResponse(_) => "invalid-response".to_string(),
        }
    }

    /// Raw response body, if the failure carried one.
    pub fn body(&self) -> Option<&str> {
        match self {
            CompletionError::Http { body, .. } => Some(body),
            _ => None,
        }
    }

    /// 5xx responses and connection failures are worth another attempt.
    /// Client errors and timeouts are not.
    pub fn is_transient(&self) -> bool {
        match self {
            CompletionError::Http { status, .. } => (500..600).contains(status),
            CompletionError::Transport(e) => e.is_connect(),
            CompletionError::Timeout | CompletionError::InvalidResponse(_) => false,
        }
    }
}

/// Errors surfaced by the drafting pipeline.
#[derive(Debug, Error)]
pub enum DraftError {
    #[error("Please enter an email request")]
    EmptyRequest,

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    StoreLoad(#[from] StoreLoadError),

    #[error(transparent)]
    Completion(#[from] CompletionError),
}
