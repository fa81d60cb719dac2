//! API key lookup and storage.
//!
//! Lookup order: `OPENAI_API_KEY`, the config file, the OS keyring, then a
//! `0600` file in the config directory.

use anyhow::Result;
use std::env;
use std::fs;
use std::io::Write;
use std::path::PathBuf;

#[cfg(unix)]
use std::os::unix::fs::OpenOptionsExt;

use crate::config::Config;
use crate::constants::{APP_NAME, ENV_API_KEY};
use crate::error::ConfigError;

const KEYRING_USER: &str = "api-key";

/// Where the API key was found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySource {
    Environment,
    ConfigFile,
    Keyring,
    File,
}

impl std::fmt::Display for KeySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KeySource::Environment => write!(f, "environment ({})", ENV_API_KEY),
            KeySource::ConfigFile => write!(f, "config file"),
            KeySource::Keyring => write!(f, "keyring"),
            KeySource::File => write!(f, "key file"),
        }
    }
}

pub struct CredentialStore {
    config_key: Option<String>,
    key_file: PathBuf,
}

impl CredentialStore {
    pub fn new(config: &Config) -> Self {
        let key_file = Config::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".api_key");
        Self::with_key_file(config, key_file)
    }

    pub fn with_key_file(config: &Config, key_file: PathBuf) -> Self {
        Self {
            config_key: config.ai.api_key.clone(),
            key_file,
        }
    }

    /// Check for the key in the environment first
    fn env_key() -> Option<String> {
        env::var(ENV_API_KEY)
            .ok()
            .filter(|key| !key.trim().is_empty())
    }

    fn keyring_get(&self) -> Option<String> {
        let entry = keyring::Entry::new(APP_NAME, KEYRING_USER).ok()?;
        entry.get_password().ok().filter(|key| !key.trim().is_empty())
    }

    fn keyring_set(&self, key: &str) -> bool {
        if let Ok(entry) = keyring::Entry::new(APP_NAME, KEYRING_USER) {
            entry.set_password(key).is_ok()
        } else {
            false
        }
    }

    /// Read key from file fallback
    fn file_get(&self) -> Option<String> {
        fs::read_to_string(&self.key_file)
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    /// Write key to file fallback (with restricted permissions)
    fn file_set(&self, key: &str) -> Result<()> {
        if let Some(parent) = self.key_file.parent() {
            fs::create_dir_all(parent)?;
        }

        // Create file with restricted permissions atomically to avoid TOCTOU
        #[cfg(unix)]
        {
            let mut file = fs::OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .mode(0o600)
                .open(&self.key_file)?;
            file.write_all(key.as_bytes())?;
        }

        #[cfg(not(unix))]
        {
            fs::write(&self.key_file, key)?;
        }

        Ok(())
    }

    /// Resolve the API key and report where it came from.
    pub fn api_key(&self) -> Result<(String, KeySource), ConfigError> {
        if let Some(key) = Self::env_key() {
            return Ok((key, KeySource::Environment));
        }

        if let Some(key) = self
            .config_key
            .as_ref()
            .filter(|key| !key.trim().is_empty())
        {
            return Ok((key.clone(), KeySource::ConfigFile));
        }

        if let Some(key) = self.keyring_get() {
            return Ok((key, KeySource::Keyring));
        }

        if let Some(key) = self.file_get() {
            return Ok((key, KeySource::File));
        }

        Err(ConfigError::MissingApiKey)
    }

    /// Store the key in the keyring, falling back to the key file.
    pub fn set_api_key(&self, key: &str) -> Result<KeySource> {
        let key = key.trim();
        if key.is_empty() {
            return Err(ConfigError::MissingApiKey.into());
        }

        if self.keyring_set(key) && self.keyring_get().as_deref() == Some(key) {
            return Ok(KeySource::Keyring);
        }

        tracing::warn!("Keyring unavailable, storing API key in {}", self.key_file.display());
        self.file_set(key)?;
        Ok(KeySource::File)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Mutex to prevent parallel test interference with env vars
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    fn config_with_key(key: Option<&str>) -> Config {
        let mut config = Config::default();
        config.ai.api_key = key.map(str::to_string);
        config
    }

    #[test]
    fn test_env_takes_priority() {
        let _guard = ENV_MUTEX.lock().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let store =
            CredentialStore::with_key_file(&config_with_key(Some("from-config")), dir.path().join("key"));

        unsafe { env::set_var(ENV_API_KEY, "from-env") };
        let resolved = store.api_key();
        unsafe { env::remove_var(ENV_API_KEY) };

        assert_eq!(
            resolved.unwrap(),
            ("from-env".to_string(), KeySource::Environment)
        );
    }

    #[test]
    fn test_config_key_used_without_env() {
        let _guard = ENV_MUTEX.lock().unwrap();
        unsafe { env::remove_var(ENV_API_KEY) };
        let dir = tempfile::tempdir().unwrap();
        let store =
            CredentialStore::with_key_file(&config_with_key(Some("from-config")), dir.path().join("key"));

        assert_eq!(
            store.api_key().unwrap(),
            ("from-config".to_string(), KeySource::ConfigFile)
        );
    }

    #[test]
    fn test_blank_env_is_ignored() {
        let _guard = ENV_MUTEX.lock().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let store =
            CredentialStore::with_key_file(&config_with_key(Some("from-config")), dir.path().join("key"));

        unsafe { env::set_var(ENV_API_KEY, "   ") };
        let resolved = store.api_key();
        unsafe { env::remove_var(ENV_API_KEY) };

        assert_eq!(resolved.unwrap().1, KeySource::ConfigFile);
    }

    #[test]
    fn test_file_fallback_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::with_key_file(&config_with_key(None), dir.path().join("key"));

        assert_eq!(store.file_get(), None);
        store.file_set("sk-file").unwrap();
        assert_eq!(store.file_get(), Some("sk-file".to_string()));
    }

    #[cfg(unix)]
    #[test]
    fn test_key_file_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("key");
        let store = CredentialStore::with_key_file(&config_with_key(None), path.clone());
        store.file_set("sk-file").unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_set_rejects_blank_key() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::with_key_file(&config_with_key(None), dir.path().join("key"));
        assert!(store.set_api_key("  ").is_err());
    }

    #[test]
    fn test_key_source_display() {
        assert_eq!(KeySource::Environment.to_string(), "environment (OPENAI_API_KEY)");
        assert_eq!(KeySource::File.to_string(), "key file");
    }
}
