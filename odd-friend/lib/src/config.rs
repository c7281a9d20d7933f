//! Session configuration.
//!
//! A [`SessionConfig`] can be built in code with the `with_*` methods or
//! read from a JSON file. Every field has a default, so a config file only
//! needs the fields it changes:
//!
//! ```json
//! {
//!   "words": { "file": "words.json" },
//!   "faces": { "folder": "assets" },
//!   "speech": { "randomize": true }
//! }
//! ```

use std::path::{Path, PathBuf};

use friend_speaks::SpeechConfig;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::{FacePartCatalog, WordCatalog};
use crate::error::{ConfigError, LoadError};

/// Name of the per-user cache folder.
pub const APP_DIR: &str = "odd-friend";

/// Where the word lists come from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WordSource {
    /// The list compiled into the app.
    #[default]
    Bundled,
    /// A JSON document on disk.
    File(PathBuf),
}

impl WordSource {
    pub async fn load(&self) -> Result<WordCatalog, LoadError> {
        match self {
            WordSource::Bundled => WordCatalog::bundled(),
            WordSource::File(path) => WordCatalog::load(path).await,
        }
    }
}

/// Where the face parts come from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaceSource {
    /// The resource handles compiled into the app.
    #[default]
    Bundled,
    /// A folder with `heads/`, `eyes/` and `mouths/` subfolders.
    Folder(PathBuf),
}

impl FaceSource {
    pub async fn load(&self) -> Result<FacePartCatalog, LoadError> {
        match self {
            FaceSource::Bundled => Ok(FacePartCatalog::bundled()),
            FaceSource::Folder(root) => FacePartCatalog::load_dir(root).await,
        }
    }
}

/// The default cache folder: the platform cache dir, or the temp dir when
/// the platform has none.
pub fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(APP_DIR)
}

/// Configuration for an [`AppSession`](crate::AppSession).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub words: WordSource,
    pub faces: FaceSource,
    /// Snapshots are written below this folder.
    pub cache_dir: PathBuf,
    /// Seed for content generation; entropy when `None`.
    pub seed: Option<u64>,
    /// Refuse to leave the start screen until speech is ready.
    pub require_speech_ready: bool,
    pub speech: SpeechConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            words: WordSource::default(),
            faces: FaceSource::default(),
            cache_dir: default_cache_dir(),
            seed: None,
            require_speech_ready: false,
            speech: SpeechConfig::default(),
        }
    }
}

impl SessionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a config from a JSON file.
    ///
    /// ## Errors
    ///
    /// Returns [`ConfigError::Read`] if the file cannot be read and
    /// [`ConfigError::Parse`] if it is not a valid config document.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "session config loaded");
        Ok(config)
    }

    #[must_use]
    pub fn with_words(mut self, words: WordSource) -> Self {
        self.words = words;
        self
    }

    #[must_use]
    pub fn with_faces(mut self, faces: FaceSource) -> Self {
        self.faces = faces;
        self
    }

    #[must_use]
    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = dir.into();
        self
    }

    /// Seed content generation and, unless it already has one, speech.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        if self.speech.seed.is_none() {
            self.speech.seed = Some(seed);
        }
        self
    }

    #[must_use]
    pub fn with_require_speech_ready(mut self, require: bool) -> Self {
        self.require_speech_ready = require;
        self
    }

    #[must_use]
    pub fn with_speech(mut self, speech: SpeechConfig) -> Self {
        self.speech = speech;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use friend_speaks::Locale;
    use tempfile::TempDir;

    #[test]
    fn defaults_use_bundled_content() {
        let config = SessionConfig::default();
        assert_eq!(config.words, WordSource::Bundled);
        assert_eq!(config.faces, FaceSource::Bundled);
        assert!(!config.require_speech_ready);
        assert!(config.cache_dir.ends_with(APP_DIR));
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("odd-friend.json");
        std::fs::write(
            &path,
            r#"{
                "words": { "file": "/tmp/words.json" },
                "require_speech_ready": true,
                "speech": { "randomize": true, "default_locale": "en-GB" }
            }"#,
        )
        .unwrap();

        let config = SessionConfig::from_json_file(&path).unwrap();
        assert_eq!(config.words, WordSource::File("/tmp/words.json".into()));
        assert_eq!(config.faces, FaceSource::Bundled);
        assert!(config.require_speech_ready);
        assert!(config.speech.randomize);
        assert_eq!(config.speech.default_locale, Locale::EnGb);
    }

    #[test]
    fn unreadable_file_is_a_read_error() {
        let dir = TempDir::new().unwrap();
        let result = SessionConfig::from_json_file(dir.path().join("missing.json"));
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }

    #[test]
    fn invalid_file_is_a_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("odd-friend.json");
        std::fs::write(&path, "{ words: nope }").unwrap();
        let result = SessionConfig::from_json_file(&path);
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn seed_flows_into_speech_unless_set() {
        let config = SessionConfig::new().with_seed(3);
        assert_eq!(config.speech.seed, Some(3));

        let config = SessionConfig::new()
            .with_speech(SpeechConfig::new().with_seed(9))
            .with_seed(3);
        assert_eq!(config.seed, Some(3));
        assert_eq!(config.speech.seed, Some(9));
    }

    #[tokio::test]
    async fn bundled_sources_load() {
        let words = WordSource::Bundled.load().await.unwrap();
        let faces = FaceSource::Bundled.load().await.unwrap();
        assert!(!words.nouns.is_empty());
        assert_eq!(faces.mouths.len(), 3);
    }
}
