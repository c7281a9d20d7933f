//! Word and face-part catalogs.
//!
//! Both catalogs hold three non-empty categories and are read-only once
//! loaded. Loading is the gate in front of the main screen: a catalog that
//! exists has passed every emptiness check, so generation over it cannot
//! fail.
//!
//! ## Sources
//!
//! - Words: a JSON document with `adjectives`, `verbs` and `nouns` arrays, or
//!   the compiled-in list ([`WordCatalog::bundled`])
//! - Face parts: `heads/`, `eyes/` and `mouths/` folders of `.svg` or `.png`
//!   files, or
//!   the compiled-in resource handles ([`FacePartCatalog::bundled`])

use std::fmt;
use std::io::ErrorKind;
use std::ops::Deref;
use std::path::{Path, PathBuf};

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{GenerateError, LoadError};

pub const ADJECTIVES: &str = "adjectives";
pub const VERBS: &str = "verbs";
pub const NOUNS: &str = "nouns";
pub const HEADS: &str = "heads";
pub const EYES: &str = "eyes";
pub const MOUTHS: &str = "mouths";

/// File extensions recognised as face-part assets.
///
/// PNG parts are decoded into snapshots; SVG parts are listed but shared as
/// placeholders.
pub const ASSET_EXTENSIONS: &[&str] = &["svg", "png"];

const BUNDLED_WORDS: &str = include_str!("../assets/words.json");

/// Pick one element uniformly at random.
///
/// ## Errors
///
/// Returns [`GenerateError::EmptyCategory`] naming `category` when `items`
/// is empty.
pub fn random_pick<'a, T, R: Rng + ?Sized>(
    category: &'static str,
    items: &'a [T],
    rng: &mut R,
) -> Result<&'a T, GenerateError> {
    items
        .choose(rng)
        .ok_or(GenerateError::EmptyCategory { category })
}

// ============================================================================
// Category
// ============================================================================

/// A named, non-empty, ordered list of entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category<T> {
    name: &'static str,
    items: Vec<T>,
}

impl<T> Category<T> {
    /// ## Errors
    ///
    /// Returns [`LoadError::EmptyCategory`] when `items` is empty.
    pub fn new(name: &'static str, items: Vec<T>) -> Result<Self, LoadError> {
        if items.is_empty() {
            return Err(LoadError::EmptyCategory { category: name });
        }
        Ok(Self { name, items })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Pick one entry uniformly at random.
    pub fn random_pick<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<&T, GenerateError> {
        random_pick(self.name, &self.items, rng)
    }
}

impl<T> Deref for Category<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        &self.items
    }
}

// ============================================================================
// Words
// ============================================================================

#[derive(Debug, Deserialize)]
struct WordDocument {
    adjectives: Vec<String>,
    verbs: Vec<String>,
    nouns: Vec<String>,
}

/// The three word categories a sentence is built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordCatalog {
    pub adjectives: Category<String>,
    pub verbs: Category<String>,
    pub nouns: Category<String>,
}

impl WordCatalog {
    /// Parse a word document.
    ///
    /// ## Examples
    ///
    /// ```
    /// use odd_friend::WordCatalog;
    ///
    /// let words = WordCatalog::from_json(
    ///     r#"{"adjectives":["brave"],"verbs":["run"],"nouns":["fast"]}"#,
    /// ).unwrap();
    /// assert_eq!(words.adjectives.len(), 1);
    /// ```
    ///
    /// ## Errors
    ///
    /// Returns [`LoadError::Malformed`] for invalid JSON or a missing array,
    /// and [`LoadError::EmptyCategory`] / [`LoadError::BlankEntry`] when a
    /// category cannot be used for generation.
    pub fn from_json(json: &str) -> Result<Self, LoadError> {
        let document: WordDocument = serde_json::from_str(json)?;

        let catalog = Self {
            adjectives: word_category(ADJECTIVES, document.adjectives)?,
            verbs: word_category(VERBS, document.verbs)?,
            nouns: word_category(NOUNS, document.nouns)?,
        };
        debug!(
            adjectives = catalog.adjectives.len(),
            verbs = catalog.verbs.len(),
            nouns = catalog.nouns.len(),
            "word lists loaded"
        );
        Ok(catalog)
    }

    /// Read and parse a word document from disk.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let json = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| io_error(path, e))?;
        Self::from_json(&json)
    }

    /// The word list compiled into the crate.
    pub fn bundled() -> Result<Self, LoadError> {
        Self::from_json(BUNDLED_WORDS)
    }
}

fn word_category(name: &'static str, words: Vec<String>) -> Result<Category<String>, LoadError> {
    if words.iter().any(|w| w.trim().is_empty()) {
        return Err(LoadError::BlankEntry { category: name });
    }
    Category::new(name, words)
}

// ============================================================================
// Face parts
// ============================================================================

/// Opaque identifier of a face-part image.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetId {
    /// A resource compiled into the app, by handle name (e.g. `heads1`).
    Bundled(String),
    /// An image file discovered in an asset folder.
    File(PathBuf),
}

impl AssetId {
    /// The key feedback is tallied under: the handle name or the file name.
    pub fn key(&self) -> String {
        match self {
            AssetId::Bundled(name) => name.clone(),
            AssetId::File(path) => path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string()),
        }
    }

    /// The file backing this asset, if any.
    pub fn path(&self) -> Option<&Path> {
        match self {
            AssetId::Bundled(_) => None,
            AssetId::File(path) => Some(path),
        }
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

/// The three face-part categories a face is built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FacePartCatalog {
    pub heads: Category<AssetId>,
    pub eyes: Category<AssetId>,
    pub mouths: Category<AssetId>,
}

impl FacePartCatalog {
    /// Build a catalog from explicit asset lists.
    pub fn from_ids(
        heads: Vec<AssetId>,
        eyes: Vec<AssetId>,
        mouths: Vec<AssetId>,
    ) -> Result<Self, LoadError> {
        Ok(Self {
            heads: Category::new(HEADS, heads)?,
            eyes: Category::new(EYES, eyes)?,
            mouths: Category::new(MOUTHS, mouths)?,
        })
    }

    /// The resource handles compiled into the app: four heads, five eyes,
    /// three mouths.
    pub fn bundled() -> Self {
        let handles = |prefix: &str, count: usize| {
            (1..=count)
                .map(|n| AssetId::Bundled(format!("{prefix}{n}")))
                .collect::<Vec<_>>()
        };

        Self {
            heads: Category {
                name: HEADS,
                items: handles(HEADS, 4),
            },
            eyes: Category {
                name: EYES,
                items: handles(EYES, 5),
            },
            mouths: Category {
                name: MOUTHS,
                items: handles(MOUTHS, 3),
            },
        }
    }

    /// Scan `root/heads`, `root/eyes` and `root/mouths` for face-part images.
    ///
    /// Files are sorted by name so repeated loads produce the same order.
    ///
    /// ## Errors
    ///
    /// Returns [`LoadError::Missing`] if a folder is absent and
    /// [`LoadError::EmptyCategory`] if a folder holds no recognised file.
    pub async fn load_dir(root: impl AsRef<Path>) -> Result<Self, LoadError> {
        let root = root.as_ref();
        let (heads, eyes, mouths) = tokio::try_join!(
            list_assets(root.join(HEADS)),
            list_assets(root.join(EYES)),
            list_assets(root.join(MOUTHS)),
        )?;

        let catalog = Self::from_ids(heads, eyes, mouths)?;
        debug!(
            root = %root.display(),
            heads = catalog.heads.len(),
            eyes = catalog.eyes.len(),
            mouths = catalog.mouths.len(),
            "face parts loaded"
        );
        Ok(catalog)
    }
}

fn has_asset_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            ASSET_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
}

async fn list_assets(dir: PathBuf) -> Result<Vec<AssetId>, LoadError> {
    let mut entries = tokio::fs::read_dir(&dir)
        .await
        .map_err(|e| io_error(&dir, e))?;

    let mut assets = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(|e| io_error(&dir, e))? {
        let path = entry.path();
        let is_file = entry
            .file_type()
            .await
            .map_err(|e| io_error(&path, e))?
            .is_file();
        if is_file && has_asset_extension(&path) {
            assets.push(AssetId::File(path));
        }
    }
    assets.sort();
    Ok(assets)
}

fn io_error(path: &Path, source: std::io::Error) -> LoadError {
    if source.kind() == ErrorKind::NotFound {
        LoadError::Missing {
            path: path.to_path_buf(),
        }
    } else {
        LoadError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
