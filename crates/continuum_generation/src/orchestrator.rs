//! Story generation: strictly sequential batches over a shared worker pool.

use crate::attempt::{Attempt, AttemptTimeouts, bounded, duration_ms};
use crate::brief::batch_brief;
use crate::retry::{RetryPolicy, retry_bounded};
use crate::{BatchOutcome, ContinuumConfig, StoryOutcome, StoryRequest, WorkerPool};
use continuum_continuity::{CharacterProfileLoader, ContinuityMapBuilder, ContinuityStore};
use continuum_core::{BatchPayload, FusedSegment, Segment, SegmentRequest, StructuredFields};
use continuum_error::{
    ContinuityError, ContinuityErrorKind, ContinuumError, ContinuumResult, GenerationError,
    GenerationErrorKind, RetryableError,
};
use continuum_interface::GenerationBackend;
use continuum_prompt::{BatchMetricsCalculator, FusionPipeline};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tracing::{debug, error, info, instrument, warn};

/// Generates final prompts for stories, batch by batch.
///
/// Batches of one story run in ascending order and each batch's continuity
/// state is persisted before the next begins. Several stories may run
/// concurrently on one orchestrator, sharing its worker pool; the same story
/// may not.
pub struct GenerationOrchestrator {
    backend: Arc<dyn GenerationBackend>,
    pool: Arc<WorkerPool>,
    store: ContinuityStore,
    config: ContinuumConfig,
    active: Mutex<HashSet<String>>,
}

/// Releases a story id when generation ends, however it ends.
struct StoryGuard<'a> {
    active: &'a Mutex<HashSet<String>>,
    story_id: String,
}

impl Drop for StoryGuard<'_> {
    fn drop(&mut self) {
        let mut active = self.active.lock().unwrap_or_else(|e| e.into_inner());
        active.remove(&self.story_id);
    }
}

impl GenerationOrchestrator {
    /// Creates an orchestrator.
    pub fn new(
        backend: Arc<dyn GenerationBackend>,
        pool: Arc<WorkerPool>,
        store: ContinuityStore,
        config: ContinuumConfig,
    ) -> Self {
        Self {
            backend,
            pool,
            store,
            config,
            active: Mutex::new(HashSet::new()),
        }
    }

    /// Continuity store used for state files.
    pub fn store(&self) -> &ContinuityStore {
        &self.store
    }

    /// Configuration in effect.
    pub fn config(&self) -> &ContinuumConfig {
        &self.config
    }

    fn claim(&self, story_id: &str) -> ContinuumResult<StoryGuard<'_>> {
        let mut active = self.active.lock().unwrap_or_else(|e| e.into_inner());
        if !active.insert(story_id.to_string()) {
            return Err(
                GenerationError::new(GenerationErrorKind::StoryBusy(story_id.to_string())).into(),
            );
        }
        Ok(StoryGuard {
            active: &self.active,
            story_id: story_id.to_string(),
        })
    }

    /// Generates every batch of `request` from `start_batch` on.
    ///
    /// # Errors
    ///
    /// - `StoryBusy` when the story is already running on this orchestrator
    /// - `InvalidSegment` / `DuplicateSegment` for bad segment input
    /// - `StateCorruption` when the persisted state cannot be parsed
    /// - `PoolExhausted` when a batch fails on every attempt; batches before it
    ///   stay persisted
    #[instrument(
        skip(self, request),
        fields(story_id = %request.story_id(), segments = request.segments().len())
    )]
    pub async fn generate(&self, request: &StoryRequest) -> ContinuumResult<StoryOutcome> {
        let story_id = request.story_id().as_str();
        let _guard = self.claim(story_id)?;

        self.store.path_for(story_id)?;
        let ordered = validate_segments(request.segments())?;

        let cancelled = self.backend.cancel_in_flight(story_id).await?;
        if cancelled > 0 {
            info!(cancelled, "Cancelled attempts left over from an earlier run");
        }

        let builder = ContinuityMapBuilder::new(
            CharacterProfileLoader::load(request.assets()),
            self.config.alias_normalizer(),
        );
        let prompt = self.config.prompt();
        let pipeline = FusionPipeline::new(builder.profiles(), *prompt.target_words(), prompt.detector());

        let batch_size = (*self.config.generation().batch_size()).max(1);
        let batches: Vec<&[&Segment]> = ordered.chunks(batch_size).collect();
        let batch_count = batches.len();
        info!(batch_count, batch_size, backend = self.backend.backend_name(), "Starting story");

        let mut outcome = StoryOutcome::new(story_id, cancelled);
        for (batch_index, batch) in batches.into_iter().enumerate() {
            if batch_index < *request.start_batch() {
                debug!(batch_index, "Skipping batch before start_batch");
                outcome.skip();
                continue;
            }
            let result = self
                .run_batch(story_id, batch_index, batch_count, batch, &builder, &pipeline)
                .await?;
            outcome.push(result);
        }

        info!(batches = outcome.batches().len(), "Story complete");
        Ok(outcome)
    }

    /// Generates several stories concurrently over the shared pool.
    ///
    /// Results are returned in request order; one story failing does not stop
    /// the others.
    pub async fn generate_many(
        &self,
        requests: &[StoryRequest],
    ) -> Vec<ContinuumResult<StoryOutcome>> {
        futures::future::join_all(requests.iter().map(|r| self.generate(r))).await
    }

    #[instrument(skip(self, batch, builder, pipeline), fields(segments = batch.len()))]
    async fn run_batch(
        &self,
        story_id: &str,
        batch_index: usize,
        batch_count: usize,
        batch: &[&Segment],
        builder: &ContinuityMapBuilder,
        pipeline: &FusionPipeline,
    ) -> ContinuumResult<BatchOutcome> {
        let prior = self.store.load(story_id)?;
        let owned: Vec<Segment> = batch.iter().map(|s| (*s).clone()).collect();
        let map = builder.build(&owned, Some(&prior));

        let requests: Vec<SegmentRequest> = owned
            .iter()
            .map(|s| SegmentRequest {
                id: s.id.clone(),
                index: s.index,
                text: s.text.clone(),
                continuity_hints: map.refs.get(&s.id).cloned().unwrap_or_default(),
            })
            .collect();
        let ids: Vec<&str> = requests.iter().map(|r| r.id.as_str()).collect();
        let brief = batch_brief(
            story_id,
            batch_index,
            batch_count,
            &ids,
            requests.iter().map(|r| &r.continuity_hints),
            &prior,
        );
        let payload = BatchPayload {
            story_id: story_id.to_string(),
            batch_index,
            segments: requests.clone(),
            batch_brief: brief,
        };

        let (fields, attempts) = self.request_batch(&payload).await?;

        let mut state = map.state;
        let limit = *self.config.prompt().recent_prompt_limit();
        let mut fused: Vec<FusedSegment> = Vec::with_capacity(fields.len());
        for (request, fields) in requests.into_iter().zip(fields) {
            let segment = pipeline.process(request.index, fields, request.continuity_hints, &state);
            state.remember_prompt_bounded(segment.final_prompt.clone(), limit);
            for camera_move in pipeline.camera_moves(&segment.fields.shot) {
                state.record_camera_move(camera_move);
            }
            fused.push(segment);
        }

        state.touch();
        self.store.save(story_id, &state)?;

        let metrics = BatchMetricsCalculator::calculate(&fused);
        info!(
            attempts,
            clean_rate = metrics.clean_rate,
            drift = metrics.drift_count,
            critic = metrics.critic_count,
            compressed = metrics.compressed_count,
            "Batch persisted"
        );
        Ok(BatchOutcome::new(batch_index, attempts, fused, metrics))
    }

    /// Runs attempts on successive pool workers until one returns a complete
    /// batch.
    async fn request_batch(
        &self,
        payload: &BatchPayload,
    ) -> ContinuumResult<(Vec<StructuredFields>, usize)> {
        let settings = self.config.generation();
        let policy = RetryPolicy::new(settings.attempts(), settings.retry_delay());
        let timeouts = AttemptTimeouts {
            response: settings.response_timeout(),
            finalize: settings.finalize_timeout(),
            poll_interval: settings.poll_interval(),
        };

        let backend = &self.backend;
        let pool = &self.pool;
        let story_id = payload.story_id.as_str();
        let mut last_attempt = 0;
        let result = retry_bounded(&policy, |attempt| {
            last_attempt = attempt;
            async move {
                let worker = pool.checkout();
                debug!(attempt, %worker, "Opening session");
                let mut session = bounded(
                    tokio::time::Instant::now() + timeouts.response,
                    GenerationErrorKind::ResponseTimeout(duration_ms(timeouts.response)),
                    backend.open_session(worker, story_id),
                )
                .await?;
                Attempt::new(session.as_mut(), timeouts).run(payload).await
            }
        })
        .await;

        match result {
            Ok(fields) => Ok((fields, last_attempt)),
            Err(failure) if failure.exhausted() => {
                let last_cause = failure
                    .error
                    .generation_kind()
                    .map(ToString::to_string)
                    .unwrap_or_else(|| failure.error.to_string());
                error!(
                    batch_index = payload.batch_index,
                    attempts = failure.attempts,
                    last_cause = %last_cause,
                    "Worker pool exhausted"
                );
                Err(GenerationError::new(GenerationErrorKind::PoolExhausted {
                    batch_index: payload.batch_index,
                    attempts: failure.attempts,
                    last_cause,
                })
                .into())
            }
            Err(failure) => {
                warn!(error = %failure.error, retryable = failure.error.is_retryable(), "Batch failed");
                Err(failure.error)
            }
        }
    }
}

/// Checks ids and indices, returning segments in ascending index order.
fn validate_segments(segments: &[Segment]) -> ContinuumResult<Vec<&Segment>> {
    let mut ids = HashSet::new();
    let mut indices = HashSet::new();
    for segment in segments {
        if segment.id.trim().is_empty() {
            return Err(invalid(ContinuityErrorKind::InvalidSegment {
                segment_id: segment.id.clone(),
                message: "segment id is blank".to_string(),
            }));
        }
        if !ids.insert(segment.id.as_str()) {
            return Err(invalid(ContinuityErrorKind::DuplicateSegment {
                field: "id".to_string(),
                value: segment.id.clone(),
            }));
        }
        if !indices.insert(segment.index) {
            return Err(invalid(ContinuityErrorKind::DuplicateSegment {
                field: "index".to_string(),
                value: segment.index.to_string(),
            }));
        }
    }

    let mut ordered: Vec<&Segment> = segments.iter().collect();
    ordered.sort_by_key(|s| s.index);
    Ok(ordered)
}

#[track_caller]
fn invalid(kind: ContinuityErrorKind) -> ContinuumError {
    ContinuityError::new(kind).into()
}
