//! Top-level error wrapper types.

use crate::{
    BackendError, ConfigError, ContinuityError, GenerationError, JsonError, StorageError,
};

/// Every error condition a Continuum operation can raise.
///
/// # Examples
///
/// ```
/// use continuum_error::{ContinuumError, ConfigError};
///
/// let err: ContinuumError = ConfigError::new("batch_size must be at least 1").into();
/// assert!(format!("{}", err).contains("Configuration Error"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum ContinuumErrorKind {
    /// JSON serialization/deserialization error
    #[from(JsonError)]
    Json(JsonError),
    /// Generic backend error
    #[from(BackendError)]
    Backend(BackendError),
    /// Configuration error
    #[from(ConfigError)]
    Config(ConfigError),
    /// State file storage error
    #[from(StorageError)]
    Storage(StorageError),
    /// Continuity computation or state error
    #[from(ContinuityError)]
    Continuity(ContinuityError),
    /// Batch generation error
    #[from(GenerationError)]
    Generation(GenerationError),
}

/// Continuum error with kind discrimination.
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Continuum Error: {}", _0)]
pub struct ContinuumError(Box<ContinuumErrorKind>);

impl ContinuumError {
    /// Create a new error from a kind.
    pub fn new(kind: ContinuumErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &ContinuumErrorKind {
        &self.0
    }

    /// Returns the generation error kind, if this is a generation error.
    pub fn generation_kind(&self) -> Option<&crate::GenerationErrorKind> {
        match self.kind() {
            ContinuumErrorKind::Generation(e) => Some(&e.kind),
            _ => None,
        }
    }

    /// Returns the continuity error kind, if this is a continuity error.
    pub fn continuity_kind(&self) -> Option<&crate::ContinuityErrorKind> {
        match self.kind() {
            ContinuumErrorKind::Continuity(e) => Some(&e.kind),
            _ => None,
        }
    }
}

// Generic From implementation for any type that converts to ContinuumErrorKind
impl<T> From<T> for ContinuumError
where
    T: Into<ContinuumErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for Continuum operations.
pub type ContinuumResult<T> = std::result::Result<T, ContinuumError>;
