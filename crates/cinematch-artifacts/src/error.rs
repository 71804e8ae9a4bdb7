//! Error types for artifact sourcing and dataset loading.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while resolving or loading artifacts.
#[derive(Debug, Error)]
pub enum Error {
    /// The artifact is not on disk and there is no way to fetch it.
    #[error("artifact {name} unavailable at {}: {reason}", path.display())]
    ArtifactUnavailable {
        name: String,
        path: PathBuf,
        reason: String,
    },

    /// A remote fetch was attempted but did not complete.
    #[error("download of {name} failed: {message}")]
    DownloadFailed { name: String, message: String },

    /// Local filesystem work around the artifact failed (cache directory
    /// creation, rename, eviction).
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Decoding or validation failed; see [`cinematch_core::Error`].
    #[error(transparent)]
    Dataset(#[from] cinematch_core::Error),

    /// The background decode task panicked or was cancelled.
    #[error("dataset load aborted: {0}")]
    LoadAborted(String),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Returns `true` when a later attempt may succeed without operator
    /// intervention.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::DownloadFailed { .. })
    }
}

/// Convenience alias for artifact results.
pub type Result<T> = std::result::Result<T, Error>;
