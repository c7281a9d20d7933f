//! Error types for the odd-friend library.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while loading word lists or face parts.
///
/// A load error is terminal for the session: the main screen stays
/// unreachable and the user has to restart.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The source file or folder does not exist.
    #[error("source not found: {}", path.display())]
    Missing { path: PathBuf },

    /// The source exists but could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The word document is not the expected JSON shape.
    #[error("malformed word source: {0}")]
    Malformed(#[from] serde_json::Error),

    /// A category contains a blank entry.
    #[error("blank entry in category `{category}`")]
    BlankEntry { category: &'static str },

    /// A category loaded without any entries.
    #[error("category `{category}` is empty")]
    EmptyCategory { category: &'static str },
}

/// A generator was handed an empty category.
///
/// The load gate guarantees non-empty catalogs, so seeing this means a
/// caller bypassed it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerateError {
    #[error("cannot pick from empty category `{category}`")]
    EmptyCategory { category: &'static str },
}

/// Errors that can occur while rendering or sharing a snapshot.
#[derive(Debug, Error)]
pub enum ShareError {
    /// A face part could not be decoded or the snapshot could not be encoded.
    #[error("failed to render snapshot: {0}")]
    Render(#[from] image::ImageError),

    /// The bytes handed over for sharing are not a PNG image.
    #[error("snapshot is not a PNG image")]
    NotPng,

    /// Writing the snapshot into the cache failed.
    #[error("failed to write snapshot: {0}")]
    Write(#[from] std::io::Error),

    /// The render task on the blocking pool panicked or was cancelled.
    #[error("render task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    /// The share target refused the snapshot.
    #[error("share dispatch failed: {0}")]
    Dispatch(String),
}

/// Errors surfaced by [`AppSession`](crate::AppSession).
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Generate(#[from] GenerateError),

    /// Navigation to the main screen requires a ready speech engine.
    #[error("TTS is not initialized yet!")]
    SpeechNotReady,

    /// The action is only available on the main screen.
    #[error("not on the main screen")]
    NotOnMainScreen,
}

/// Errors that can occur when reading a session config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
