use thiserror::Error;

/// Errors raised while decoding, validating, or querying the dataset.
#[derive(Debug, Error)]
pub enum Error {
    /// An artifact could not be read or decoded.
    #[error("corrupt artifact {artifact}: {message}")]
    CorruptArtifact { artifact: String, message: String },

    /// The similarity matrix does not line up with the catalog.
    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),

    /// The queried title has no exact match in the catalog.
    #[error("item not found: {title:?}")]
    ItemNotFound { title: String },
}

impl Error {
    pub(crate) fn corrupt(artifact: &str, message: impl ToString) -> Self {
        Self::CorruptArtifact {
            artifact: artifact.to_string(),
            message: message.to_string(),
        }
    }

    /// Returns `true` when the error is the recoverable "no such title"
    /// outcome rather than a problem with the data itself.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ItemNotFound { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
