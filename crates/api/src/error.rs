use bsm_core::error::CoreError;
use bsm_store::StoreError;

use crate::config::ConfigError;

/// Application-level error type for facade operations.
///
/// Wraps [`CoreError`] for domain errors and [`StoreError`] for repository
/// failures. Mutating operations render these as text; lookups return them.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `bsm_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A repository error from `bsm_store`.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Listing could not be rendered.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Convenience type alias for facade return values.
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// The domain error behind this error, if any.
    pub fn core(&self) -> Option<&CoreError> {
        match self {
            AppError::Core(core) | AppError::Store(StoreError::Core(core)) => Some(core),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
