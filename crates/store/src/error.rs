use std::path::PathBuf;

use bsm_core::error::CoreError;

/// Errors returned by repositories.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Validation and precondition failures (bad name, missing, duplicate).
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A filesystem operation failed.
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The metadata index could not be serialized.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl StoreError {
    /// Build a closure that attaches `path` to an I/O error.
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| Self::Io { path, source }
    }
}
