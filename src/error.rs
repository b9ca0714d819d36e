use std::path::PathBuf;

use thiserror::Error;

/// Everything that can stop a statistics pass.
///
/// Per-file variants carry the offending path so the caller can tell which
/// image broke the run.
#[derive(Error, Debug)]
pub enum StatsError {
    #[error("image directory '{0}' does not exist")]
    DirectoryNotFound(PathBuf),

    #[error("no images found under '{0}', cannot average over zero samples")]
    EmptyDataset(PathBuf),

    #[error("'{path}' has {found} channel(s), expected {expected}")]
    ShapeMismatch {
        path: PathBuf,
        expected: usize,
        found: usize,
    },

    #[error("'{path}' is not a supported image: {reason}")]
    UnsupportedFormat { path: PathBuf, reason: String },

    #[error("'{path}' could not be decoded: {reason}")]
    CorruptData { path: PathBuf, reason: String },

    #[error("failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("failed to start loader workers: {0}")]
    WorkerPool(String),
}

impl StatsError {
    /// Decode failures are the only errors the skip policy is allowed to swallow.
    pub fn is_decode_failure(&self) -> bool {
        matches!(
            self,
            StatsError::UnsupportedFormat { .. } | StatsError::CorruptData { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, StatsError>;
