//! File-backed continuity state persistence, one JSON document per story.

use continuum_core::ContinuityState;
use continuum_error::{
    ContinuityError, ContinuityErrorKind, ContinuumResult, JsonError, StorageError,
    StorageErrorKind,
};
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};

/// Loads and atomically rewrites per-story continuity state files.
#[derive(Debug, Clone, derive_getters::Getters)]
pub struct ContinuityStore {
    /// Base directory for state files
    state_dir: PathBuf,
}

impl ContinuityStore {
    /// Creates a store, creating `state_dir` when missing.
    pub fn new(state_dir: impl AsRef<Path>) -> ContinuumResult<Self> {
        let state_dir = state_dir.as_ref().to_path_buf();

        if !state_dir.exists() {
            std::fs::create_dir_all(&state_dir).map_err(|e| {
                StorageError::new(StorageErrorKind::DirectoryCreation(format!(
                    "{}: {}",
                    state_dir.display(),
                    e
                )))
            })?;
        }

        debug!(path = %state_dir.display(), "Initialized continuity store");
        Ok(Self { state_dir })
    }

    /// Path of the state file for `story_id`.
    pub fn path_for(&self, story_id: &str) -> ContinuumResult<PathBuf> {
        let valid = !story_id.is_empty()
            && story_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
            && !story_id.starts_with('.');
        if !valid {
            return Err(
                StorageError::new(StorageErrorKind::InvalidStoryId(story_id.to_string())).into(),
            );
        }
        Ok(self.state_dir.join(format!("{story_id}.continuity.json")))
    }

    /// Loads the state for `story_id`.
    ///
    /// A missing file yields a fresh state. An unparsable file is a
    /// [`ContinuityErrorKind::StateCorruption`] and is left untouched.
    #[instrument(skip(self))]
    pub fn load(&self, story_id: &str) -> ContinuumResult<ContinuityState> {
        let path = self.path_for(story_id)?;

        if !path.exists() {
            debug!("No existing continuity state, starting fresh");
            return Ok(ContinuityState::new());
        }

        let contents = std::fs::read_to_string(&path).map_err(|e| {
            StorageError::new(StorageErrorKind::FileRead(format!("{}: {}", path.display(), e)))
        })?;

        let state: ContinuityState = serde_json::from_str(&contents).map_err(|e| {
            ContinuityError::new(ContinuityErrorKind::StateCorruption {
                story_id: story_id.to_string(),
                message: e.to_string(),
            })
        })?;

        debug!(
            characters = state.last_seen_character.len(),
            locations = state.last_seen_location.len(),
            "Loaded continuity state"
        );
        Ok(state)
    }

    /// Replaces the state for `story_id` wholesale.
    ///
    /// Writes a sibling temp file and renames it over the old one, so readers
    /// see either the previous document or the new one.
    #[instrument(skip(self, state))]
    pub fn save(&self, story_id: &str, state: &ContinuityState) -> ContinuumResult<()> {
        let path = self.path_for(story_id)?;
        let tmp = path.with_extension("json.tmp");

        let contents = serde_json::to_string_pretty(state)
            .map_err(|e| JsonError::new(format!("Failed to serialize continuity state: {e}")))?;

        std::fs::write(&tmp, contents).map_err(|e| {
            StorageError::new(StorageErrorKind::FileWrite(format!("{}: {}", tmp.display(), e)))
        })?;
        std::fs::rename(&tmp, &path).map_err(|e| {
            StorageError::new(StorageErrorKind::FileReplace(format!(
                "{}: {}",
                path.display(),
                e
            )))
        })?;

        debug!(
            characters = state.last_seen_character.len(),
            recent_prompts = state.recent_prompts.len(),
            "Saved continuity state"
        );
        Ok(())
    }

    /// Deletes the state for `story_id`, if any.
    #[instrument(skip(self))]
    pub fn delete(&self, story_id: &str) -> ContinuumResult<()> {
        let path = self.path_for(story_id)?;

        if path.exists() {
            std::fs::remove_file(&path).map_err(|e| {
                StorageError::new(StorageErrorKind::FileRemove(format!(
                    "{}: {}",
                    path.display(),
                    e
                )))
            })?;
            debug!("Deleted continuity state");
        }

        Ok(())
    }
}
