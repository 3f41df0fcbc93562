//! Command handlers. Each returns the JSON document printed to stdout.

use continuum::{
    Asset, CharacterProfileLoader, ContinuityMapBuilder, ContinuityStore, ContinuumConfig,
    ContinuumResult, GenerationOrchestrator, PromptCompressor, ReplayBackend, Segment,
    StoryRequest, WorkerPool, read_json, write_json,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, instrument};

/// Load the configuration file given on the command line, or the layered default.
pub fn load_config(path: Option<&Path>) -> ContinuumResult<ContinuumConfig> {
    match path {
        Some(path) => ContinuumConfig::from_file(path),
        None => ContinuumConfig::load(),
    }
}

/// Continuity refs of a segment file, optionally continuing and saving story state.
#[instrument(skip(config))]
pub fn continuity(
    config: &ContinuumConfig,
    segments: &Path,
    assets: Option<&Path>,
    story: Option<&str>,
    persist: bool,
) -> ContinuumResult<String> {
    let segments: Vec<Segment> = read_json(segments)?;
    let assets: Vec<Asset> = match assets {
        Some(path) => read_json(path)?,
        None => Vec::new(),
    };

    let builder =
        ContinuityMapBuilder::new(CharacterProfileLoader::load(&assets), config.alias_normalizer());

    let store = ContinuityStore::new(config.state().dir())?;
    let prior = story.map(|id| store.load(id)).transpose()?;
    let map = builder.build(&segments, prior.as_ref());

    if let (true, Some(story_id)) = (persist, story) {
        store.save(story_id, &map.state)?;
        info!(story_id, "Persisted continuity state");
    }

    write_json(&map.refs)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SimilarityReport {
    ratio: f64,
    index: Option<usize>,
    too_similar: bool,
}

/// Compression outcome of a single prompt.
pub fn compress(
    config: &ContinuumConfig,
    prompt: &str,
    target: Option<usize>,
) -> ContinuumResult<String> {
    let target = target.unwrap_or(*config.prompt().target_words());
    write_json(&PromptCompressor::new().compress_with_stats(prompt, target))
}

/// Best-matching candidate of `text` under the configured detector.
pub fn similarity(
    config: &ContinuumConfig,
    text: &str,
    candidates: &[String],
) -> ContinuumResult<String> {
    let detector = config.prompt().detector();
    let best = detector.find_similar_segment(text, candidates);
    write_json(&SimilarityReport {
        ratio: best.map(|m| m.ratio).unwrap_or(0.0),
        index: best.map(|m| m.index),
        too_similar: detector.is_too_similar(text, candidates),
    })
}

/// Runs the orchestrator for one story request against canned replies.
#[instrument(skip(config))]
pub async fn generate(
    config: ContinuumConfig,
    request: &Path,
    replay_dir: &Path,
) -> ContinuumResult<String> {
    let request: StoryRequest = read_json(request)?;
    let pool = Arc::new(WorkerPool::new(*config.generation().pool_size())?);
    let store = ContinuityStore::new(config.state().dir())?;
    let orchestrator =
        GenerationOrchestrator::new(Arc::new(ReplayBackend::new(replay_dir)), pool, store, config);

    let outcome = orchestrator.generate(&request).await?;
    info!(
        story_id = %outcome.story_id(),
        batches = outcome.batches().len(),
        "Story generated"
    );
    write_json(&outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use continuum::{StateSettings, StoryOutcome};
    use serde_json::Value;

    fn config(state_dir: &Path) -> ContinuumConfig {
        ContinuumConfig::new(
            Default::default(),
            Default::default(),
            StateSettings::new(state_dir),
            BTreeMap::from([("Johnny".to_string(), "John".to_string())]),
        )
    }

    const SEGMENTS: &str = r#"[
        {"id": "s2", "index": 1, "characterNames": ["Mary"]},
        {"id": "s1", "index": 0, "characterNames": ["John"], "locationName": "Quay"},
        {"id": "s3", "index": 2, "characterNames": ["johnny"], "locationName": "Quay"}
    ]"#;

    #[test]
    fn continuity_prints_refs_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(&dir.path().join("state"));
        let segments = dir.path().join("segments.json");
        std::fs::write(&segments, SEGMENTS).unwrap();

        let printed = continuity(&config, &segments, None, Some("tale"), true).unwrap();
        let refs: Value = serde_json::from_str(&printed).unwrap();
        assert_eq!(refs["s3"]["continuityRefsByCharacter"]["John"], "s1");
        assert_eq!(refs["s3"]["locationRef"], "s1");

        let state = ContinuityStore::new(dir.path().join("state"))
            .unwrap()
            .load("tale")
            .unwrap();
        assert_eq!(state.last_seen_character["John"].segment_id, "s3");
    }

    #[test]
    fn continuity_without_persist_leaves_no_state() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(&dir.path().join("state"));
        let segments = dir.path().join("segments.json");
        std::fs::write(&segments, SEGMENTS).unwrap();

        continuity(&config, &segments, None, Some("tale"), false).unwrap();
        let store = ContinuityStore::new(dir.path().join("state")).unwrap();
        assert!(!store.path_for("tale").unwrap().exists());
    }

    #[test]
    fn compress_uses_configured_target() {
        let dir = tempfile::tempdir().unwrap();
        let printed = compress(&config(dir.path()), "boats rock in the harbor", None).unwrap();
        let outcome: Value = serde_json::from_str(&printed).unwrap();
        assert_eq!(outcome["prompt"], "boats rock in the harbor");
        assert_eq!(outcome["over_budget"], false);
    }

    #[test]
    fn similarity_reports_best_candidate() {
        let dir = tempfile::tempdir().unwrap();
        let candidates = vec![
            "a lighthouse on a cliff".to_string(),
            "fishing boats rock gently in the harbor at dawn".to_string(),
        ];
        let printed = similarity(
            &config(dir.path()),
            "fishing boats rock gently in the harbor at dusk",
            &candidates,
        )
        .unwrap();
        let report: Value = serde_json::from_str(&printed).unwrap();
        assert_eq!(report["index"], 1);
        assert_eq!(report["tooSimilar"], true);
    }

    #[tokio::test(start_paused = true)]
    async fn generate_replays_story() {
        let dir = tempfile::tempdir().unwrap();
        let replies = dir.path().join("replies");
        std::fs::create_dir_all(&replies).unwrap();
        std::fs::write(
            replies.join("batch_0.json"),
            r#"{"segments": [{"segment_id": "s1", "actions": ["gulls circle"], "shot": "aerial", "lighting": "dawn"}]}"#,
        )
        .unwrap();
        let request = dir.path().join("request.json");
        std::fs::write(
            &request,
            r#"{"storyId": "gulls", "segments": [{"id": "s1", "index": 0}]}"#,
        )
        .unwrap();

        let printed = generate(config(&dir.path().join("state")), &request, &replies)
            .await
            .unwrap();
        let outcome: StoryOutcome = serde_json::from_str(&printed).unwrap();
        let fused: Vec<_> = outcome.fused_segments().collect();
        assert_eq!(fused[0].final_prompt, "gulls circle; aerial; dawn");
    }
}
