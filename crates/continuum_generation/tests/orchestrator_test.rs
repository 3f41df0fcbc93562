use async_trait::async_trait;
use continuum_continuity::ContinuityStore;
use continuum_core::{BatchPayload, BatchReply, Segment, StructuredFields};
use continuum_error::{BackendError, ContinuityErrorKind, ContinuumResult, GenerationErrorKind};
use continuum_generation::{
    ContinuumConfig, GenerationOrchestrator, GenerationSettingsBuilder, PromptSettings,
    StateSettings, StoryRequest, WorkerPool,
};
use continuum_interface::{BackendSession, CompletionStatus, GenerationBackend, WorkerId};
use std::collections::{BTreeMap, VecDeque};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// What a scripted session does with its attempt.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Step {
    Complete,
    Incomplete,
    Stall,
    FinalizeStall,
    Malformed,
    /// `poll_output` and `cancel` never resolve
    Hang,
    /// Valid reply whose actions quote dialogue with typographic quotes
    Dialogue,
}

#[derive(Default)]
struct Recorder {
    workers: Mutex<Vec<usize>>,
    payloads: Mutex<Vec<BatchPayload>>,
    cancels: AtomicUsize,
}

struct ScriptedBackend {
    script: Mutex<VecDeque<Step>>,
    left_in_flight: usize,
    recorder: Arc<Recorder>,
}

impl ScriptedBackend {
    fn new(steps: &[Step]) -> Self {
        Self {
            script: Mutex::new(steps.iter().copied().collect()),
            left_in_flight: 0,
            recorder: Arc::new(Recorder::default()),
        }
    }
}

#[async_trait]
impl GenerationBackend for ScriptedBackend {
    async fn open_session(
        &self,
        worker: WorkerId,
        _story_id: &str,
    ) -> ContinuumResult<Box<dyn BackendSession>> {
        self.recorder.workers.lock().unwrap().push(worker.0);
        let step = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Step::Complete);
        Ok(Box::new(ScriptedSession {
            id: format!("{worker}"),
            step,
            reply: None,
            recorder: Arc::clone(&self.recorder),
        }))
    }

    async fn cancel_in_flight(&self, _story_id: &str) -> ContinuumResult<usize> {
        tokio::task::yield_now().await;
        Ok(self.left_in_flight)
    }

    fn backend_name(&self) -> &str {
        "scripted"
    }
}

struct ScriptedSession {
    id: String,
    step: Step,
    reply: Option<String>,
    recorder: Arc<Recorder>,
}

fn reply_for(payload: &BatchPayload, drop_last: bool) -> String {
    let mut segments: Vec<StructuredFields> = payload
        .segments
        .iter()
        .map(|s| StructuredFields {
            segment_id: s.id.clone(),
            actions: vec![format!("scene {} unfolds on the quay", s.index)],
            shot: "static shot".to_string(),
            lighting: format!("light number {}", s.index),
            novelty_score: Some(0.5),
            ..Default::default()
        })
        .collect();
    if drop_last {
        segments.pop();
    }
    let json = serde_json::to_string(&BatchReply { segments }).unwrap();
    format!("```json\n{json}\n```")
}

fn dialogue_reply_for(payload: &BatchPayload) -> String {
    let segments: Vec<StructuredFields> = payload
        .segments
        .iter()
        .map(|s| StructuredFields {
            segment_id: s.id.clone(),
            actions: vec![format!("Mary whispers \u{201C}run\u{201D} in scene {}", s.index)],
            shot: "wide shot".to_string(),
            lighting: "lantern light".to_string(),
            ..Default::default()
        })
        .collect();
    serde_json::to_string(&BatchReply { segments }).unwrap()
}

#[async_trait]
impl BackendSession for ScriptedSession {
    fn attempt_id(&self) -> &str {
        &self.id
    }

    async fn submit(&mut self, payload: &BatchPayload) -> ContinuumResult<()> {
        self.recorder.payloads.lock().unwrap().push(payload.clone());
        self.reply = match self.step {
            Step::Complete | Step::FinalizeStall | Step::Hang => Some(reply_for(payload, false)),
            Step::Dialogue => Some(dialogue_reply_for(payload)),
            Step::Incomplete => Some(reply_for(payload, true)),
            Step::Malformed => Some("{\"segments\": [ oops".to_string()),
            Step::Stall => None,
        };
        Ok(())
    }

    async fn poll_output(&mut self) -> ContinuumResult<Option<String>> {
        if self.step == Step::Hang {
            return std::future::pending().await;
        }
        Ok(self.reply.clone())
    }

    async fn poll_completion(&mut self) -> ContinuumResult<CompletionStatus> {
        Ok(match self.step {
            Step::FinalizeStall => CompletionStatus::Pending,
            // Backends may claim success for partial output.
            _ => CompletionStatus::Completed {
                reported_success: true,
            },
        })
    }

    async fn cancel(&mut self) -> ContinuumResult<()> {
        self.recorder.cancels.fetch_add(1, Ordering::SeqCst);
        if self.step == Step::Hang {
            return std::future::pending().await;
        }
        Err(BackendError::new("cancel is best effort").into())
    }
}

fn config(state_dir: &Path, pool_size: usize, batch_size: usize) -> ContinuumConfig {
    let generation = GenerationSettingsBuilder::default()
        .pool_size(pool_size)
        .batch_size(batch_size)
        .response_timeout_ms(1_000u64)
        .finalize_timeout_ms(200u64)
        .poll_interval_ms(50u64)
        .retry_delay_ms(10u64)
        .build()
        .unwrap();
    ContinuumConfig::new(
        generation,
        PromptSettings::default(),
        StateSettings::new(state_dir),
        BTreeMap::from([("Johnny".to_string(), "John".to_string())]),
    )
}

fn orchestrator(
    backend: ScriptedBackend,
    state_dir: &Path,
    pool_size: usize,
    batch_size: usize,
) -> (GenerationOrchestrator, Arc<Recorder>) {
    let recorder = Arc::clone(&backend.recorder);
    let config = config(state_dir, pool_size, batch_size);
    let orchestrator = GenerationOrchestrator::new(
        Arc::new(backend),
        Arc::new(WorkerPool::new(pool_size).unwrap()),
        ContinuityStore::new(state_dir).unwrap(),
        config,
    );
    (orchestrator, recorder)
}

fn seg(id: &str, index: u32, chars: &[&str]) -> Segment {
    Segment::new(id, index)
        .with_character_names(chars.iter().map(|c| c.to_string()).collect::<Vec<_>>())
        .with_text(format!("segment {id}"))
}

fn story(story_id: &str, start_batch: usize) -> StoryRequest {
    StoryRequest::builder()
        .story_id(story_id)
        .segments(vec![
            seg("s4", 3, &["Mary"]),
            seg("s1", 0, &["John"]),
            seg("s2", 1, &["Mary"]),
            seg("s3", 2, &["johnny"]),
            seg("s5", 4, &["John", "Mary"]),
        ])
        .start_batch(start_batch)
        .build()
        .unwrap()
}

#[tokio::test(start_paused = true)]
async fn persists_state_after_every_batch() {
    let dir = tempfile::tempdir().unwrap();
    let (orchestrator, recorder) = orchestrator(ScriptedBackend::new(&[]), dir.path(), 3, 2);

    let outcome = orchestrator.generate(&story("tale", 0)).await.unwrap();
    assert_eq!(outcome.batches().len(), 3);
    assert_eq!(outcome.fused_segments().count(), 5);

    let ids: Vec<&str> = outcome
        .fused_segments()
        .map(|s| s.segment_id.as_str())
        .collect();
    assert_eq!(ids, vec!["s1", "s2", "s3", "s4", "s5"]);

    let s3 = outcome.fused_segments().find(|s| s.segment_id == "s3").unwrap();
    assert_eq!(s3.continuity.continuity_refs_by_character["John"], "s1");
    assert!(s3.continuity.first_appearance_by_character.is_empty());

    let payloads = recorder.payloads.lock().unwrap();
    assert_eq!(payloads.len(), 3);
    assert!(payloads[1].batch_brief.iter().any(|l| l.contains("continuing characters: John")));
    assert_eq!(payloads[1].segments[0].text, "segment s3");

    let state = orchestrator.store().load("tale").unwrap();
    assert_eq!(state.last_seen_character["John"].index, 4);
    assert_eq!(state.last_seen_character["Mary"].segment_id, "s5");
    assert_eq!(state.recent_prompts.len(), 5);
    assert_eq!(state.used_camera_moves, vec!["static shot"]);

    let metrics = outcome.batches()[0].metrics();
    assert_eq!(metrics.segment_count, 2);
    assert_eq!(metrics.avg_novelty_score, Some(0.5));
}

#[tokio::test(start_paused = true)]
async fn incomplete_reply_is_retried_on_next_worker() {
    let dir = tempfile::tempdir().unwrap();
    let backend = ScriptedBackend::new(&[Step::Incomplete, Step::Complete]);
    let (orchestrator, recorder) = orchestrator(backend, dir.path(), 3, 5);

    let outcome = orchestrator.generate(&story("tale", 0)).await.unwrap();
    assert_eq!(*outcome.batches()[0].attempts(), 2);
    assert_eq!(outcome.fused_segments().count(), 5);
    assert_eq!(*recorder.workers.lock().unwrap(), vec![0, 1]);
    assert_eq!(recorder.cancels.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn stalls_are_cancelled_and_retried() {
    let dir = tempfile::tempdir().unwrap();
    let backend = ScriptedBackend::new(&[Step::Stall, Step::FinalizeStall, Step::Malformed]);
    let (orchestrator, recorder) = orchestrator(backend, dir.path(), 4, 5);

    let outcome = orchestrator.generate(&story("tale", 0)).await.unwrap();
    assert_eq!(*outcome.batches()[0].attempts(), 4);
    assert_eq!(*recorder.workers.lock().unwrap(), vec![0, 1, 2, 3]);
    assert_eq!(recorder.cancels.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn hung_output_times_out_and_moves_to_next_worker() {
    let dir = tempfile::tempdir().unwrap();
    let backend = ScriptedBackend::new(&[Step::Hang, Step::Complete]);
    let (orchestrator, recorder) = orchestrator(backend, dir.path(), 2, 5);

    let outcome = tokio::time::timeout(
        std::time::Duration::from_secs(600),
        orchestrator.generate(&story("tale", 0)),
    )
    .await
    .expect("story must not hang on a stalled channel")
    .unwrap();

    assert_eq!(*outcome.batches()[0].attempts(), 2);
    assert_eq!(*recorder.workers.lock().unwrap(), vec![0, 1]);
    assert_eq!(recorder.cancels.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn hung_channels_exhaust_the_pool_with_a_timeout() {
    let dir = tempfile::tempdir().unwrap();
    let backend = ScriptedBackend::new(&[Step::Hang, Step::Hang]);
    let (orchestrator, _recorder) = orchestrator(backend, dir.path(), 2, 5);

    let err = tokio::time::timeout(
        std::time::Duration::from_secs(600),
        orchestrator.generate(&story("tale", 0)),
    )
    .await
    .expect("story must not hang on stalled channels")
    .unwrap_err();

    match err.generation_kind() {
        Some(GenerationErrorKind::PoolExhausted {
            attempts,
            last_cause,
            ..
        }) => {
            assert_eq!(*attempts, 2);
            assert!(last_cause.contains("No structured output within 1000 ms"), "{last_cause}");
        }
        other => panic!("unexpected error kind: {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn typographic_dialogue_completes_first_time() {
    let dir = tempfile::tempdir().unwrap();
    let backend = ScriptedBackend::new(&[Step::Dialogue]);
    let (orchestrator, recorder) = orchestrator(backend, dir.path(), 3, 5);

    let outcome = orchestrator.generate(&story("tale", 0)).await.unwrap();
    assert_eq!(*outcome.batches()[0].attempts(), 1);
    assert_eq!(recorder.cancels.load(Ordering::SeqCst), 0);

    let first = outcome.fused_segments().next().unwrap();
    assert_eq!(first.fields.actions, vec!["Mary whispers \u{201C}run\u{201D} in scene 0"]);
    assert!(first.final_prompt.contains("\u{201C}run\u{201D}"));
}

#[tokio::test(start_paused = true)]
async fn pool_exhaustion_names_the_batch() {
    let dir = tempfile::tempdir().unwrap();
    let backend = ScriptedBackend::new(&[
        Step::Complete,
        Step::Incomplete,
        Step::Incomplete,
        Step::Incomplete,
    ]);
    let (orchestrator, _recorder) = orchestrator(backend, dir.path(), 3, 2);

    let err = orchestrator.generate(&story("tale", 0)).await.unwrap_err();
    match err.generation_kind() {
        Some(GenerationErrorKind::PoolExhausted {
            batch_index,
            attempts,
            last_cause,
        }) => {
            assert_eq!(*batch_index, 1);
            assert_eq!(*attempts, 3);
            assert!(last_cause.contains("received 1"), "{last_cause}");
        }
        other => panic!("unexpected error kind: {other:?}"),
    }
    assert!(err.to_string().contains("Batch 1"));

    let state = orchestrator.store().load("tale").unwrap();
    assert_eq!(state.last_seen_character["Mary"].index, 1);
    assert_eq!(state.last_seen_character["John"].index, 0);
}

#[tokio::test(start_paused = true)]
async fn resumes_from_persisted_state() {
    let dir = tempfile::tempdir().unwrap();
    let backend = ScriptedBackend::new(&[
        Step::Complete,
        Step::Incomplete,
        Step::Incomplete,
        Step::Incomplete,
    ]);
    let (first, _) = orchestrator(backend, dir.path(), 3, 2);
    assert!(first.generate(&story("tale", 0)).await.is_err());

    let (second, recorder) = orchestrator(ScriptedBackend::new(&[]), dir.path(), 3, 2);
    let outcome = second.generate(&story("tale", 1)).await.unwrap();
    assert_eq!(*outcome.skipped_batches(), 1);
    assert_eq!(outcome.batches().len(), 2);

    let s3 = outcome.fused_segments().find(|s| s.segment_id == "s3").unwrap();
    assert_eq!(s3.continuity.continuity_refs_by_character["John"], "s1");
    assert_eq!(recorder.payloads.lock().unwrap()[0].batch_index, 1);
}

#[tokio::test(start_paused = true)]
async fn corrupt_state_is_fatal_and_left_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let (orchestrator, recorder) = orchestrator(ScriptedBackend::new(&[]), dir.path(), 2, 2);
    let path = orchestrator.store().path_for("tale").unwrap();
    std::fs::write(&path, "{ not json").unwrap();

    let err = orchestrator.generate(&story("tale", 0)).await.unwrap_err();
    assert!(matches!(
        err.continuity_kind(),
        Some(ContinuityErrorKind::StateCorruption { .. })
    ));
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "{ not json");
    assert!(recorder.workers.lock().unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn reports_cancelled_in_flight_attempts() {
    let dir = tempfile::tempdir().unwrap();
    let mut backend = ScriptedBackend::new(&[]);
    backend.left_in_flight = 2;
    let (orchestrator, _) = orchestrator(backend, dir.path(), 2, 5);

    let outcome = orchestrator.generate(&story("tale", 0)).await.unwrap();
    assert_eq!(*outcome.cancelled_in_flight(), 2);
}

#[tokio::test(start_paused = true)]
async fn same_story_cannot_run_twice_at_once() {
    let dir = tempfile::tempdir().unwrap();
    let (orchestrator, _) = orchestrator(ScriptedBackend::new(&[]), dir.path(), 2, 5);

    let results = orchestrator
        .generate_many(&[story("tale", 0), story("tale", 0)])
        .await;
    assert!(results[0].is_ok());
    assert!(matches!(
        results[1].as_ref().unwrap_err().generation_kind(),
        Some(GenerationErrorKind::StoryBusy(id)) if id == "tale"
    ));
}

#[tokio::test(start_paused = true)]
async fn stories_share_the_pool() {
    let dir = tempfile::tempdir().unwrap();
    let (orchestrator, recorder) = orchestrator(ScriptedBackend::new(&[]), dir.path(), 3, 5);

    let results = orchestrator
        .generate_many(&[story("north", 0), story("south", 0)])
        .await;
    assert!(results.iter().all(Result::is_ok));

    let mut workers = recorder.workers.lock().unwrap().clone();
    workers.sort();
    assert_eq!(workers, vec![0, 1]);
    assert!(orchestrator.store().path_for("north").unwrap().exists());
    assert!(orchestrator.store().path_for("south").unwrap().exists());
}
