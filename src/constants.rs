//! Application-wide constants for prompts, normalization and tuning
//!
//! Centralizes fixed strings and magic numbers to make them discoverable.

/// Application name used for config/data directories and the keyring service.
pub const APP_NAME: &str = "draftsmith";

/// Environment variable holding the completion API key.
pub const ENV_API_KEY: &str = "OPENAI_API_KEY";

/// File extension (without the dot) recognized as a template.
pub const DEFAULT_TEMPLATE_EXTENSION: &str = "txt";

/// Default directory scanned for templates, relative to the working directory.
pub const DEFAULT_TEMPLATE_DIR: &str = "templates";

/// Returned in place of template context when retrieval finds nothing usable.
pub const NO_TEMPLATE_FOUND: &str = "No relevant template found.";

// === Completion ===

pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";

pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Request timeout in seconds, covering connect, send and body read.
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Extra attempts for transient 5xx responses. Never applied to 429 or 4xx.
pub const DEFAULT_MAX_RETRIES: u32 = 2;

/// Returned as the draft text when the endpoint answers HTTP 429.
pub const QUOTA_EXCEEDED_MESSAGE: &str = "API quota exceeded.\n\n\
The application is correctly configured, but the API key has no available quota. \
Please check your billing or usage limits.";

// === Normalization ===

/// Inserted after the greeting of drafts that come back too short.
pub const PLEASANTRY: &str = "I hope this email finds you well.";

/// Drafts with fewer non-blank lines than this get the pleasantry.
pub const MIN_EMAIL_LINES: usize = 8;

/// Closing phrases whose trailing sender name is moved onto its own line.
pub const CLOSING_PHRASES: [&str; 5] = [
    "Best regards",
    "Sincerely",
    "Thanks",
    "Regards",
    "Kind regards",
];

// === Retrieval ===

/// Added to the fuzzy similarity when a trigger keyword matches the template name.
pub const KEYWORD_BONUS: f64 = 0.5;
