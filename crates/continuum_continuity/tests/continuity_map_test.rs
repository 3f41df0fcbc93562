use continuum_continuity::{AliasNormalizer, CharacterProfileLoader, ContinuityMapBuilder};
use continuum_core::{Asset, Segment, VisualAttributes};
use std::collections::{BTreeMap, HashMap};

fn seg(id: &str, index: u32, chars: &[&str]) -> Segment {
    Segment::new(id, index).with_character_names(
        chars
            .iter()
            .map(|c| c.to_string())
            .collect::<Vec<String>>(),
    )
}

fn plain_builder() -> ContinuityMapBuilder {
    ContinuityMapBuilder::new(BTreeMap::new(), AliasNormalizer::default())
}

#[test]
fn references_always_point_backwards() {
    let segments: Vec<Segment> = (0..40u32)
        .map(|i| {
            let chars: Vec<&str> = match i % 4 {
                0 => vec!["A", "B"],
                1 => vec!["B"],
                2 => vec!["C", "A"],
                _ => vec![],
            };
            let location = if i % 3 == 0 { "Harbor" } else { "Cliff" };
            seg(&format!("s{i}"), i, &chars)
                .with_location_name(location)
                .with_storyline_id(if i % 5 == 0 { "flashback" } else { "main" })
        })
        .collect();

    let index_of: HashMap<&str, u32> = segments.iter().map(|s| (s.id.as_str(), s.index)).collect();
    let map = plain_builder().build(&segments, None);

    for segment in &segments {
        let refs = &map.refs[&segment.id];
        for target in refs.continuity_refs_by_character.values() {
            assert!(index_of[target.as_str()] < segment.index);
        }
        if let Some(target) = &refs.location_ref {
            assert!(index_of[target.as_str()] < segment.index);
        }
    }
}

#[test]
fn skip_over_points_to_nearest_sharing_segment() {
    let map = plain_builder().build(
        &[seg("A", 0, &["x"]), seg("B", 1, &["y"]), seg("C", 2, &["x"])],
        None,
    );
    assert_eq!(map.refs["C"].continuity_refs_by_character["x"], "A");
}

#[test]
fn storylines_never_reference_each_other() {
    let segments = vec![
        seg("p1", 0, &["x"]).with_storyline_id("present"),
        seg("f1", 1, &["x"]).with_storyline_id("flashback"),
        seg("p2", 2, &["x"]).with_storyline_id("present"),
        seg("f2", 3, &["x"]).with_storyline_id("flashback"),
    ];
    let map = plain_builder().build(&segments, None);

    assert_eq!(map.refs["f1"].first_appearance_by_character, vec!["x"]);
    assert!(map.refs["f1"].continuity_refs_by_character.is_empty());
    // p2 sees f1 as the latest record, which is on another storyline.
    assert_eq!(map.refs["p2"].first_appearance_by_character, vec!["x"]);
    assert_eq!(map.refs["f2"].first_appearance_by_character, vec!["x"]);
}

#[test]
fn unset_storyline_is_compatible_with_any() {
    let segments = vec![
        seg("a", 0, &["x"]).with_storyline_id("present"),
        seg("b", 1, &["x"]),
    ];
    let map = plain_builder().build(&segments, None);
    assert_eq!(map.refs["b"].continuity_refs_by_character["x"], "a");
}

#[test]
fn first_appearance_is_listed_once_across_batches() {
    let builder = plain_builder();
    let first = builder.build(&[seg("s1", 0, &["John"]), seg("s2", 1, &["Mary"])], None);
    let second = builder.build(
        &[seg("s3", 2, &["John", "Mary"]), seg("s4", 3, &["Ana"])],
        Some(&first.state),
    );

    assert!(second.refs["s3"].first_appearance_by_character.is_empty());
    assert_eq!(second.refs["s3"].continuity_refs_by_character["John"], "s1");
    assert_eq!(second.refs["s3"].continuity_refs_by_character["Mary"], "s2");
    assert_eq!(second.refs["s4"].first_appearance_by_character, vec!["Ana"]);
    assert_eq!(second.state.last_seen_character["John"].index, 2);
}

#[test]
fn location_uses_single_reference() {
    let segments = vec![
        seg("a", 0, &[]).with_location_name("Harbor"),
        seg("b", 1, &[]).with_location_name("Cliff"),
        seg("c", 2, &[]).with_location_name("harbor"),
    ];
    let builder = ContinuityMapBuilder::new(
        BTreeMap::new(),
        AliasNormalizer::new([("harbor", "Harbor")]),
    );
    let map = builder.build(&segments, None);
    assert_eq!(map.refs["a"].location_ref, None);
    assert_eq!(map.refs["c"].location_ref.as_deref(), Some("a"));
}

#[test]
fn ambient_segments_are_no_ops() {
    let map = plain_builder().build(&[seg("intro", 0, &[]), seg("s1", 1, &["x"])], None);
    assert!(map.refs["intro"].is_empty());
    assert_eq!(map.refs["s1"].first_appearance_by_character, vec!["x"]);
    assert!(map.state.last_seen_location.is_empty());
}

#[test]
fn aliases_resolve_to_profiled_character() {
    let assets = vec![Asset::character(
        "a1",
        "John",
        VisualAttributes {
            beard: Some("grey beard".to_string()),
            ..Default::default()
        },
    )];
    let profiles = CharacterProfileLoader::load(&assets);
    let builder = ContinuityMapBuilder::new(profiles, AliasNormalizer::new([("Johnny", "John")]));

    let map = builder.build(&[seg("s1", 0, &["johnny"]), seg("s2", 1, &["John"])], None);
    assert_eq!(map.refs["s1"].identity_lockline_by_character["John"], "grey beard");
    assert_eq!(map.refs["s2"].continuity_refs_by_character["John"], "s1");
}
