//! Template store: loads named email templates from a directory once at startup.
//!
//! Every file with the configured extension becomes a template named after the
//! file stem (`follow_up.txt` becomes `follow_up`). Content is trimmed. The store
//! is immutable after loading and iterates in lexicographic name order, which is
//! also the tie-break order used by retrieval.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::StoreLoadError;

/// What to do when an individual template file cannot be read.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ReadErrorPolicy {
    /// Skip the file and record a [`LoadWarning`].
    #[default]
    Skip,
    /// Fail the whole load with [`StoreLoadError::File`].
    Abort,
}

/// A template file that was skipped during loading.
#[derive(Debug, Clone)]
pub struct LoadWarning {
    pub path: PathBuf,
    pub message: String,
}

impl std::fmt::Display for LoadWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "skipped {}: {}", self.path.display(), self.message)
    }
}

#[derive(Debug, Clone, Default)]
pub struct TemplateStore {
    templates: BTreeMap<String, String>,
    warnings: Vec<LoadWarning>,
}

impl TemplateStore {
    /// Load every `*.{extension}` file in `dir` (non-recursive).
    ///
    /// A missing or unreadable directory is always fatal. Per-file read errors
    /// follow `policy`.
    pub fn load(
        dir: &Path,
        extension: &str,
        policy: ReadErrorPolicy,
    ) -> Result<Self, StoreLoadError> {
        if !dir.exists() {
            return Err(StoreLoadError::MissingDirectory(dir.to_path_buf()));
        }
        if !dir.is_dir() {
            return Err(StoreLoadError::NotADirectory(dir.to_path_buf()));
        }

        let entries = fs::read_dir(dir).map_err(|source| StoreLoadError::Unreadable {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut store = Self::default();
        for entry in entries {
            let entry = entry.map_err(|source| StoreLoadError::Unreadable {
                path: dir.to_path_buf(),
                source,
            })?;
            let path = entry.path();
            if path.is_dir() || path.extension().and_then(|e| e.to_str()) != Some(extension) {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let name = name.to_string();

            match fs::read_to_string(&path) {
                Ok(content) => {
                    store.templates.insert(name, content.trim().to_string());
                }
                Err(source) => match policy {
                    ReadErrorPolicy::Abort => return Err(StoreLoadError::File { path, source }),
                    ReadErrorPolicy::Skip => {
                        tracing::warn!("Skipping template {}: {}", path.display(), source);
                        store.warnings.push(LoadWarning {
                            path,
                            message: source.to_string(),
                        });
                    }
                },
            }
        }

        tracing::debug!(
            "Loaded {} templates from {} ({} skipped)",
            store.templates.len(),
            dir.display(),
            store.warnings.len()
        );
        Ok(store)
    }

    /// Build a store from in-memory `(name, content)` pairs. Content is trimmed.
    pub fn from_templates<I, N, C>(templates: I) -> Self
    where
        I: IntoIterator<Item = (N, C)>,
        N: Into<String>,
        C: AsRef<str>,
    {
        Self {
            templates: templates
                .into_iter()
                .map(|(name, content)| (name.into(), content.as_ref().trim().to_string()))
                .collect(),
            warnings: Vec::new(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.templates.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.templates.contains_key(name)
    }

    /// Iterate `(name, content)` in lexicographic name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.templates
            .iter()
            .map(|(name, content)| (name.as_str(), content.as_str()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.templates.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Files skipped during [`TemplateStore::load`].
    pub fn warnings(&self) -> &[LoadWarning] {
        &self.warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_strips_extension_and_whitespace() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("follow_up.txt"), "\n  Just following up.  \n").unwrap();
        fs::write(dir.path().join("apology.txt"), "Sorry for the delay.").unwrap();

        let store = TemplateStore::load(dir.path(), "txt", ReadErrorPolicy::Skip).unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.get("follow_up"), Some("Just following up."));
        assert_eq!(store.get("apology"), Some("Sorry for the delay."));
        assert!(store.warnings().is_empty());
    }

    #[test]
    fn test_load_ignores_other_extensions_and_subdirectories() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("notes.md"), "# not a template").unwrap();
        fs::write(dir.path().join("thank_you.txt"), "Thank you!").unwrap();
        fs::create_dir(dir.path().join("nested.txt")).unwrap();

        let store = TemplateStore::load(dir.path(), "txt", ReadErrorPolicy::Skip).unwrap();
        let names: Vec<&str> = store.names().collect();
        assert_eq!(names, vec!["thank_you"]);
    }

    #[test]
    fn test_iteration_is_lexicographic() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["meeting_request", "apology", "thank_you", "follow_up"] {
            fs::write(dir.path().join(format!("{name}.txt")), name).unwrap();
        }

        let store = TemplateStore::load(dir.path(), "txt", ReadErrorPolicy::Skip).unwrap();
        let names: Vec<&str> = store.names().collect();
        assert_eq!(
            names,
            vec!["apology", "follow_up", "meeting_request", "thank_you"]
        );
    }

    #[test]
    fn test_missing_directory_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");

        let err = TemplateStore::load(&missing, "txt", ReadErrorPolicy::Skip).unwrap_err();
        assert!(matches!(err, StoreLoadError::MissingDirectory(p) if p == missing));
    }

    #[test]
    fn test_file_path_is_not_a_directory() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("templates");
        fs::write(&file, "oops").unwrap();

        let err = TemplateStore::load(&file, "txt", ReadErrorPolicy::Skip).unwrap_err();
        assert!(matches!(err, StoreLoadError::NotADirectory(_)));
    }

    #[test]
    fn test_unreadable_file_is_skipped_with_warning() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("good.txt"), "Fine").unwrap();
        // Invalid UTF-8 makes read_to_string fail regardless of permissions
        fs::write(dir.path().join("bad.txt"), [0xff, 0xfe, 0xfd]).unwrap();

        let store = TemplateStore::load(dir.path(), "txt", ReadErrorPolicy::Skip).unwrap();
        assert_eq!(store.len(), 1);
        assert!(store.contains("good"));
        assert_eq!(store.warnings().len(), 1);
        assert!(store.warnings()[0].path.ends_with("bad.txt"));
        assert!(store.warnings()[0].to_string().contains("bad.txt"));
    }

    #[test]
    fn test_unreadable_file_aborts_with_abort_policy() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("good.txt"), "Fine").unwrap();
        fs::write(dir.path().join("bad.txt"), [0xff, 0xfe, 0xfd]).unwrap();

        let err = TemplateStore::load(dir.path(), "txt", ReadErrorPolicy::Abort).unwrap_err();
        match err {
            StoreLoadError::File { path, .. } => assert!(path.ends_with("bad.txt")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_empty_directory_loads_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = TemplateStore::load(dir.path(), "txt", ReadErrorPolicy::Abort).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_bundled_templates_load() {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("templates");
        let store = TemplateStore::load(&dir, "txt", ReadErrorPolicy::Abort).unwrap();
        for name in ["follow_up", "meeting_request", "thank_you", "apology"] {
            let content = store.get(name).unwrap();
            assert!(content.starts_with("Subject:"), "{name} has no subject line");
            assert!(content.contains("[Recipient Name]"));
            assert!(content.ends_with("Best regards,\n[Your Name]"));
        }
    }

    #[test]
    fn test_read_error_policy_parses_from_toml() {
        #[derive(Deserialize)]
        struct Wrapper {
            policy: ReadErrorPolicy,
        }
        let w: Wrapper = toml::from_str("policy = \"abort\"").unwrap();
        assert_eq!(w.policy, ReadErrorPolicy::Abort);
    }
}
