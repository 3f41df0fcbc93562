//! Batch generation error types and retry classification.

/// Specific error conditions raised while driving the generation backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum GenerationErrorKind {
    /// Backend produced fewer structured results than segments requested
    #[display("Incomplete batch: expected {} structured results, received {}", expected, received)]
    IncompleteBatch {
        /// Segments requested
        expected: usize,
        /// Structured results received for requested segments
        received: usize,
    },
    /// No structured output within the response-wait budget
    #[display("No structured output within {} ms", _0)]
    ResponseTimeout(u64),
    /// Backend did not confirm completion within the finalize-wait budget
    #[display("Backend did not confirm completion within {} ms", _0)]
    FinalizeTimeout(u64),
    /// Reply could not be decoded even after lenient cleanup
    #[display("Malformed structured output: {}", _0)]
    MalformedOutput(String),
    /// Session could not be opened or failed mid-attempt
    #[display("Backend session failed: {}", _0)]
    Session(String),
    /// Every worker in the pool failed this batch
    #[display(
        "Batch {} failed after {} attempts; last cause: {}",
        batch_index,
        attempts,
        last_cause
    )]
    PoolExhausted {
        /// Zero-based batch index within the story
        batch_index: usize,
        /// Attempts made
        attempts: usize,
        /// Display form of the final underlying error
        last_cause: String,
    },
    /// Worker pool configured with zero workers
    #[display("Worker pool must contain at least one worker")]
    EmptyPool,
    /// Story is already being generated by this orchestrator
    #[display("Story '{}' is already being generated", _0)]
    StoryBusy(String),
}

impl GenerationErrorKind {
    /// Check if this error should trigger another attempt on the next worker.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            GenerationErrorKind::IncompleteBatch { .. }
                | GenerationErrorKind::ResponseTimeout(_)
                | GenerationErrorKind::FinalizeTimeout(_)
                | GenerationErrorKind::MalformedOutput(_)
                | GenerationErrorKind::Session(_)
        )
    }

    /// Check if this error is one of the two timeout phases.
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            GenerationErrorKind::ResponseTimeout(_) | GenerationErrorKind::FinalizeTimeout(_)
        )
    }
}

/// Generation error with source location tracking.
///
/// # Examples
///
/// ```
/// use continuum_error::{GenerationError, GenerationErrorKind};
///
/// let err = GenerationError::new(GenerationErrorKind::ResponseTimeout(30_000));
/// assert!(err.kind.is_retryable());
/// assert!(format!("{}", err).contains("30000 ms"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Generation Error: {} at line {} in {}", kind, line, file)]
pub struct GenerationError {
    /// The kind of error that occurred
    pub kind: GenerationErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl GenerationError {
    /// Create a new GenerationError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: GenerationErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
