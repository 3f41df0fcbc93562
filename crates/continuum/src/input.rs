//! JSON file helpers shared by the CLI and embedding applications.

use continuum_error::{ContinuumError, ContinuumResult, JsonError, StorageError, StorageErrorKind};
use serde::{Serialize, de::DeserializeOwned};
use std::path::Path;
use tracing::{debug, instrument};

/// Reads and parses a JSON file.
///
/// # Errors
///
/// Returns a storage error if the file cannot be read and a JSON error if it
/// does not parse as `T`.
#[instrument(skip(path), fields(path = %path.as_ref().display()))]
pub fn read_json<T: DeserializeOwned>(path: impl AsRef<Path>) -> ContinuumResult<T> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path).map_err(|e| {
        StorageError::new(StorageErrorKind::FileRead(format!("{}: {}", path.display(), e)))
    })?;
    debug!(bytes = contents.len(), "Read JSON input");
    serde_json::from_str(&contents).map_err(|e| {
        ContinuumError::from(JsonError::new(format!("{}: {}", path.display(), e)))
    })
}

/// Serializes `value` as pretty JSON.
///
/// # Errors
///
/// Returns a JSON error if serialization fails.
pub fn write_json<T: Serialize>(value: &T) -> ContinuumResult<String> {
    serde_json::to_string_pretty(value).map_err(|e| JsonError::new(e.to_string()).into())
}
