//! Continuity engine error types.

/// Specific error conditions for continuity computation and state handling.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum ContinuityErrorKind {
    /// The persisted continuity state for a story could not be parsed.
    ///
    /// Never recovered by resetting the state: a silent reset would produce
    /// incorrect references for every later segment.
    #[display("Continuity state for story '{}' is corrupt: {}", story_id, message)]
    StateCorruption {
        /// Story whose state file is unreadable
        story_id: String,
        /// Parser message
        message: String,
    },
    /// A segment failed input validation
    #[display("Invalid segment '{}': {}", segment_id, message)]
    InvalidSegment {
        /// Offending segment id (may be empty)
        segment_id: String,
        /// What is wrong with it
        message: String,
    },
    /// Two segments of one story share an id or an index
    #[display("Duplicate segment {}: {}", field, value)]
    DuplicateSegment {
        /// Which field collided ("id" or "index")
        field: String,
        /// The colliding value
        value: String,
    },
}

/// Error type for continuity operations.
///
/// # Examples
///
/// ```
/// use continuum_error::{ContinuityError, ContinuityErrorKind};
///
/// let err = ContinuityError::new(ContinuityErrorKind::StateCorruption {
///     story_id: "ballad".to_string(),
///     message: "expected value at line 1".to_string(),
/// });
/// assert!(format!("{}", err).contains("corrupt"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Continuity Error: {} at line {} in {}", kind, line, file)]
pub struct ContinuityError {
    /// The specific error condition
    pub kind: ContinuityErrorKind,
    /// Line number where the error occurred
    pub line: u32,
    /// Source file where the error occurred
    pub file: &'static str,
}

impl ContinuityError {
    /// Create a new ContinuityError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: ContinuityErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
