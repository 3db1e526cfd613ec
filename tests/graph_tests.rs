/// Scene graph integration tests — loading story files from disk.

use carbon_journey::core::graph::{SceneGraph, SceneGraphError};
use carbon_journey::core::unlocks::EndingUnlockRegistry;
use carbon_journey::schema::scene::{MiniGameKind, SceneId};
use std::path::Path;

#[test]
fn shipped_story_file_matches_builtin() {
    let from_disk = SceneGraph::load_from_ron(Path::new("story_data/carbon_journey.ron")).unwrap();
    let builtin = SceneGraph::carbon_journey().unwrap();
    let a: Vec<&SceneId> = from_disk.iter().map(|s| &s.id).collect();
    let b: Vec<&SceneId> = builtin.iter().map(|s| &s.id).collect();
    assert_eq!(a, b);
}

#[test]
fn every_scene_is_reachable_from_intro() {
    let graph = SceneGraph::carbon_journey().unwrap();
    let reachable = graph.reachable_from("intro");
    assert_eq!(reachable.len(), graph.len());
}

#[test]
fn every_ending_leads_back_into_the_story() {
    let graph = SceneGraph::carbon_journey().unwrap();
    for ending in graph.endings() {
        assert_eq!(ending.choices.len(), 1, "{}", ending.id);
        let back = ending.choices[0].next.as_str();
        if ending.id.as_str() == "sceneA2" {
            assert_eq!(back, "scene0");
        } else {
            assert_eq!(back, "intro");
            assert_eq!(ending.choices[0].text, "Reincarnate");
        }
    }
}

#[test]
fn graph_is_cyclic() {
    let graph = SceneGraph::carbon_journey().unwrap();
    // The ocean routes back to the plant scene.
    assert!(graph.reachable_from("sceneD1").contains("sceneC2"));
    assert!(graph.reachable_from("sceneC2").contains("sceneD1"));
}

#[test]
fn fixture_story_parses_optional_fields() {
    let graph = SceneGraph::load_from_ron(Path::new("tests/fixtures/tiny_story.ron")).unwrap();
    let yard = graph.get("yard").unwrap();
    assert_eq!(yard.mini_game, Some(MiniGameKind::Collect));
    let npc = yard.npc.as_ref().unwrap();
    assert_eq!(npc.name, "Gardener");
    assert!(npc.dialogue.is_none());
    assert_eq!(yard.choices[0].description.as_deref(), Some("Hall"));

    let hall = graph.get("hall").unwrap();
    assert!(!hall.is_ending);
    assert!(!hall.direct_choices);
    assert!(hall.npc.is_none());
    assert_eq!(hall.choices[0].mini_game, Some(MiniGameKind::Excavate));

    let registry = EndingUnlockRegistry::for_graph(&graph);
    assert_eq!(registry.endings(), &[SceneId::new("vault")]);
}

#[test]
fn dangling_fixture_names_the_broken_edge() {
    let err = SceneGraph::load_from_ron(Path::new("tests/fixtures/dangling_story.ron")).unwrap_err();
    match err {
        SceneGraphError::UnknownSceneReference { from, to } => {
            assert_eq!(from.as_str(), "dock");
            assert_eq!(to.as_str(), "ferry");
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn missing_file_is_an_io_error() {
    let err = SceneGraph::load_from_ron(Path::new("tests/fixtures/no_such_story.ron")).unwrap_err();
    assert!(matches!(err, SceneGraphError::Io(_)));
}
