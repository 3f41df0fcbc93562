//! One attempt at generating one batch on one fresh session.

use crate::decode_reply;
use continuum_core::{BatchPayload, BatchReply, StructuredFields};
use continuum_error::{ContinuumResult, GenerationError, GenerationErrorKind};
use continuum_interface::{BackendSession, CompletionStatus};
use std::collections::HashMap;
use std::time::Duration;
use std::future::Future;
use tokio::time::{Instant, sleep, timeout_at};
use tracing::{debug, warn};

/// Lifecycle of a single attempt.
///
/// `Requested -> AwaitingStructuredOutput -> Confirming -> Completed`, with
/// `TimedOut` and `Failed` reachable from every non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumIter)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum AttemptState {
    /// Batch submitted
    Requested,
    /// Waiting for the first structured output
    AwaitingStructuredOutput,
    /// Output taken, waiting for the backend to confirm completion
    Confirming,
    /// Confirmed with a complete set of results
    Completed,
    /// A wait ran over its budget
    TimedOut,
    /// Session error, malformed output or incomplete batch
    Failed,
}

impl AttemptState {
    /// True for `Completed`, `TimedOut` and `Failed`.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::TimedOut | Self::Failed)
    }

    /// Whether `self -> next` is a legal transition.
    pub fn can_transition_to(self, next: AttemptState) -> bool {
        use AttemptState::*;
        match (self, next) {
            (from, TimedOut | Failed) => !from.is_terminal(),
            (Requested, AwaitingStructuredOutput)
            | (AwaitingStructuredOutput, Confirming)
            | (Confirming, Completed) => true,
            _ => false,
        }
    }
}

/// Wait budgets for one attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttemptTimeouts {
    /// Budget for the first structured output
    pub response: Duration,
    /// Budget for completion once output was taken
    pub finalize: Duration,
    /// Poll interval for both waits
    pub poll_interval: Duration,
}

/// Drives one session through submit, output, confirmation and validation.
pub struct Attempt<'a> {
    session: &'a mut dyn BackendSession,
    timeouts: AttemptTimeouts,
    state: AttemptState,
}

impl<'a> Attempt<'a> {
    /// Wraps a freshly opened session.
    pub fn new(session: &'a mut dyn BackendSession, timeouts: AttemptTimeouts) -> Self {
        Self {
            session,
            timeouts,
            state: AttemptState::Requested,
        }
    }

    /// Current state.
    pub fn state(&self) -> AttemptState {
        self.state
    }

    fn advance(&mut self, next: AttemptState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal attempt transition {} -> {}",
            self.state,
            next
        );
        debug!(attempt_id = %self.session.attempt_id(), from = %self.state, to = %next, "Attempt transition");
        self.state = next;
    }

    /// Runs the attempt to completion.
    ///
    /// Returns one validated record per requested segment, in request order.
    /// On any failure the session is cancelled (best effort) before the error
    /// is returned.
    pub async fn run(mut self, payload: &BatchPayload) -> ContinuumResult<Vec<StructuredFields>> {
        let result = self.drive(payload).await;
        if let Err(e) = &result {
            let terminal = match e.generation_kind() {
                Some(kind) if kind.is_timeout() => AttemptState::TimedOut,
                _ => AttemptState::Failed,
            };
            if !self.state.is_terminal() {
                self.advance(terminal);
            }
            self.cancel().await;
        }
        result
    }

    async fn drive(&mut self, payload: &BatchPayload) -> ContinuumResult<Vec<StructuredFields>> {
        let response_deadline = Instant::now() + self.timeouts.response;
        let response_timeout =
            GenerationErrorKind::ResponseTimeout(duration_ms(self.timeouts.response));

        bounded(
            response_deadline,
            response_timeout.clone(),
            self.session.submit(payload),
        )
        .await?;
        self.advance(AttemptState::AwaitingStructuredOutput);

        let raw = self.await_output(response_deadline, response_timeout).await?;
        self.advance(AttemptState::Confirming);

        let reply = decode_reply(&raw)?;
        self.await_completion().await?;

        let fields = select_requested(reply, payload);
        let expected = payload.segments.len();
        if fields.len() < expected {
            return Err(GenerationError::new(GenerationErrorKind::IncompleteBatch {
                expected,
                received: fields.len(),
            })
            .into());
        }

        self.advance(AttemptState::Completed);
        Ok(fields)
    }

    async fn await_output(
        &mut self,
        deadline: Instant,
        timeout: GenerationErrorKind,
    ) -> ContinuumResult<String> {
        loop {
            if let Some(raw) = bounded(deadline, timeout.clone(), self.session.poll_output()).await? {
                return Ok(raw);
            }
            wait_until(deadline, self.timeouts.poll_interval, timeout.clone()).await?;
        }
    }

    async fn await_completion(&mut self) -> ContinuumResult<()> {
        let deadline = Instant::now() + self.timeouts.finalize;
        let timeout = GenerationErrorKind::FinalizeTimeout(duration_ms(self.timeouts.finalize));
        loop {
            match bounded(deadline, timeout.clone(), self.session.poll_completion()).await? {
                CompletionStatus::Completed { reported_success } => {
                    debug!(reported_success, "Backend confirmed completion");
                    return Ok(());
                }
                CompletionStatus::Failed(message) => {
                    return Err(GenerationError::new(GenerationErrorKind::Session(message)).into());
                }
                CompletionStatus::Pending => {}
            }
            wait_until(deadline, self.timeouts.poll_interval, timeout.clone()).await?;
        }
    }

    /// Best-effort cancel, given at most the finalize budget.
    async fn cancel(&mut self) {
        match tokio::time::timeout(self.timeouts.finalize, self.session.cancel()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                warn!(attempt_id = %self.session.attempt_id(), error = %e, "Failed to cancel attempt");
            }
            Err(_) => {
                warn!(
                    attempt_id = %self.session.attempt_id(),
                    budget_ms = duration_ms(self.timeouts.finalize),
                    "Cancel did not return in time, abandoning session"
                );
            }
        }
    }
}

/// Awaits a backend call, failing with `timeout` if `deadline` passes first.
pub(crate) async fn bounded<T>(
    deadline: Instant,
    timeout: GenerationErrorKind,
    call: impl Future<Output = ContinuumResult<T>>,
) -> ContinuumResult<T> {
    match timeout_at(deadline, call).await {
        Ok(result) => result,
        Err(_) => Err(GenerationError::new(timeout).into()),
    }
}

/// Sleeps one poll interval, or fails with `timeout` once `deadline` has passed.
async fn wait_until(
    deadline: Instant,
    poll_interval: Duration,
    timeout: GenerationErrorKind,
) -> ContinuumResult<()> {
    let now = Instant::now();
    if now >= deadline {
        return Err(GenerationError::new(timeout).into());
    }
    sleep(poll_interval.min(deadline - now)).await;
    Ok(())
}

pub(crate) fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Keeps the first record for each requested segment id, in request order.
/// Records for ids that were not requested are dropped.
pub fn select_requested(reply: BatchReply, payload: &BatchPayload) -> Vec<StructuredFields> {
    let mut by_id: HashMap<String, StructuredFields> = HashMap::new();
    for fields in reply.segments {
        let id = fields.segment_id.trim().to_string();
        if !payload.segment_ids().any(|requested| requested == id) {
            debug!(segment_id = %id, "Ignoring record for segment that was not requested");
            continue;
        }
        by_id.entry(id).or_insert(fields);
    }

    payload
        .segment_ids()
        .filter_map(|id| by_id.remove(id))
        .map(|mut fields| {
            fields.segment_id = fields.segment_id.trim().to_string();
            fields.validated()
        })
        .collect()
}
