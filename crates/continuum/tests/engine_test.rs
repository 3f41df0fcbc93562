use continuum::{
    AliasNormalizer, Asset, BatchMetricsCalculator, CharacterProfileLoader, ContinuityMapBuilder,
    ContinuityStore, FusionPipeline, NgramSimilarityDetector, Segment, StructuredFields,
    VisualAttributes,
};

fn fields(id: &str, action: &str, shot: &str) -> StructuredFields {
    StructuredFields {
        segment_id: id.to_string(),
        actions: vec![action.to_string()],
        shot: shot.to_string(),
        lighting: "overcast light".to_string(),
        ..Default::default()
    }
}

#[test]
fn deterministic_engine_without_backend() {
    let assets = vec![Asset::character(
        "a1",
        "Mary",
        VisualAttributes {
            hair: Some("red hair".to_string()),
            clothing: Some("yellow raincoat".to_string()),
            ..Default::default()
        },
    )];
    let profiles = CharacterProfileLoader::load(&assets);
    let builder = ContinuityMapBuilder::new(profiles.clone(), AliasNormalizer::new([("M", "Mary")]));
    let pipeline = FusionPipeline::new(&profiles, 60, NgramSimilarityDetector::default());

    let segments = vec![
        Segment::new("s1", 0).with_character_names(vec!["Mary".to_string()]),
        Segment::new("s2", 1).with_character_names(vec!["M".to_string()]),
    ];
    let map = builder.build(&segments, None);

    let mut state = map.state.clone();
    let first = pipeline.process(
        0,
        fields("s1", "Mary waits at the pier", "wide static shot"),
        map.refs["s1"].clone(),
        &state,
    );
    state.remember_prompt(first.final_prompt.clone());
    let second = pipeline.process(
        1,
        fields("s2", "Mary brushes her red hair from her face", "close-up"),
        map.refs["s2"].clone(),
        &state,
    );

    assert_eq!(
        first.final_prompt,
        "Mary: red hair, yellow raincoat; Mary waits at the pier; wide static shot; overcast light"
    );
    assert!(first.is_clean());
    assert_eq!(second.continuity.continuity_refs_by_character["Mary"], "s1");
    assert!(!second.final_prompt.contains("yellow raincoat"));
    assert!(second.drift_flags.iter().any(|d| d.character == "Mary" && d.keyword == "hair"));

    let metrics = BatchMetricsCalculator::calculate(&[first, second]);
    assert_eq!(metrics.segment_count, 2);
    assert_eq!(metrics.drift_count, 1);
}

#[test]
fn persisted_state_carries_refs_across_runs() {
    let dir = tempfile::tempdir().unwrap();
    let store = ContinuityStore::new(dir.path()).unwrap();
    let builder = ContinuityMapBuilder::new(Default::default(), AliasNormalizer::default());

    let first = builder.build(
        &[Segment::new("s1", 0).with_location_name("Pier")],
        Some(&store.load("tale").unwrap()),
    );
    store.save("tale", &first.state).unwrap();

    let second = builder.build(
        &[Segment::new("s2", 1).with_location_name("Pier")],
        Some(&store.load("tale").unwrap()),
    );
    assert_eq!(second.refs["s2"].location_ref.as_deref(), Some("s1"));
}
