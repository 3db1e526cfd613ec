/// Scene graph — loading, startup validation, and traversal queries.
use rustc_hash::FxHashSet;
use serde::Deserialize;
use std::collections::{HashMap, VecDeque};
use std::path::Path;
use thiserror::Error;

use crate::schema::scene::{Scene, SceneId};

/// The story shipped with the engine.
pub const CARBON_JOURNEY: &str = include_str!("../../story_data/carbon_journey.ron");

#[derive(Debug, Error)]
pub enum SceneGraphError {
    #[error("scene '{from}' references unknown scene '{to}'")]
    UnknownSceneReference { from: SceneId, to: SceneId },
    #[error("start scene '{0}' is not defined")]
    UnknownStartScene(SceneId),
    #[error("scene '{0}' is defined more than once")]
    DuplicateScene(SceneId),
    #[error("scene '{0}' is not an ending but offers no choices")]
    DeadEnd(SceneId),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
}

// The RON file lists scenes in order under a named start scene; the graph
// keeps that order for galleries and indexes scenes by id for traversal.
#[derive(Debug, Deserialize)]
#[serde(rename = "Story")]
struct RonStory {
    start: SceneId,
    scenes: Vec<Scene>,
}

/// The immutable, validated scene table.
#[derive(Debug, Clone)]
pub struct SceneGraph {
    start: SceneId,
    scenes: HashMap<SceneId, Scene>,
    order: Vec<SceneId>,
}

impl SceneGraph {
    /// Build and validate a graph. Fails on the first closure violation.
    pub fn from_scenes(start: SceneId, scenes: Vec<Scene>) -> Result<SceneGraph, SceneGraphError> {
        let mut table = HashMap::with_capacity(scenes.len());
        let mut order = Vec::with_capacity(scenes.len());
        for scene in scenes {
            if table.contains_key(&scene.id) {
                return Err(SceneGraphError::DuplicateScene(scene.id));
            }
            order.push(scene.id.clone());
            table.insert(scene.id.clone(), scene);
        }

        let graph = SceneGraph {
            start,
            scenes: table,
            order,
        };
        graph.validate()?;
        Ok(graph)
    }

    /// Load a graph from a RON file.
    pub fn load_from_ron(path: &Path) -> Result<SceneGraph, SceneGraphError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_ron(&contents)
    }

    /// Parse a graph from a RON string.
    pub fn parse_ron(input: &str) -> Result<SceneGraph, SceneGraphError> {
        let raw: RonStory = ron::from_str(input)?;
        Self::from_scenes(raw.start, raw.scenes)
    }

    /// The built-in story.
    pub fn carbon_journey() -> Result<SceneGraph, SceneGraphError> {
        Self::parse_ron(CARBON_JOURNEY)
    }

    /// Check graph closure: the start scene and every choice target exist,
    /// and every non-ending scene can be left.
    pub fn validate(&self) -> Result<(), SceneGraphError> {
        if !self.scenes.contains_key(&self.start) {
            return Err(SceneGraphError::UnknownStartScene(self.start.clone()));
        }
        for id in &self.order {
            let scene = &self.scenes[id];
            for choice in &scene.choices {
                if !self.scenes.contains_key(&choice.next) {
                    return Err(SceneGraphError::UnknownSceneReference {
                        from: scene.id.clone(),
                        to: choice.next.clone(),
                    });
                }
            }
            if !scene.is_ending && scene.choices.is_empty() {
                return Err(SceneGraphError::DeadEnd(scene.id.clone()));
            }
        }
        Ok(())
    }

    pub fn start(&self) -> &SceneId {
        &self.start
    }

    pub fn get(&self, id: &str) -> Option<&Scene> {
        self.scenes.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.scenes.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Scenes in definition order.
    pub fn iter(&self) -> impl Iterator<Item = &Scene> {
        self.order.iter().filter_map(|id| self.scenes.get(id))
    }

    /// Terminal scenes in definition order.
    pub fn endings(&self) -> impl Iterator<Item = &Scene> {
        self.iter().filter(|s| s.is_ending)
    }

    /// Every scene reachable from `from`, including `from` itself.
    pub fn reachable_from(&self, from: &str) -> FxHashSet<SceneId> {
        let mut seen = FxHashSet::default();
        let Some(root) = self.scenes.get(from) else {
            return seen;
        };
        let mut queue = VecDeque::from([root]);
        seen.insert(root.id.clone());
        while let Some(scene) = queue.pop_front() {
            for next in scene.destinations() {
                if seen.insert(next.clone()) {
                    if let Some(s) = self.scenes.get(next) {
                        queue.push_back(s);
                    }
                }
            }
        }
        seen
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::scene::{Choice, MiniGameKind};

    fn scene(id: &str, next: &[&str], is_ending: bool) -> Scene {
        Scene {
            id: SceneId::new(id),
            title: id.to_string(),
            narration: format!("You are in {}.", id),
            npc: None,
            mini_game: None,
            choices: next
                .iter()
                .map(|n| Choice {
                    text: format!("to {}", n),
                    next: SceneId::new(*n),
                    description: None,
                    mini_game: None,
                })
                .collect(),
            is_ending,
            direct_choices: false,
        }
    }

    #[test]
    fn builtin_story_is_closed() {
        let graph = SceneGraph::carbon_journey().unwrap();
        assert_eq!(graph.len(), 21);
        assert_eq!(graph.start().as_str(), "intro");
        for s in graph.iter() {
            for c in &s.choices {
                assert!(graph.contains(c.next.as_str()));
            }
            assert!(graph.contains(s.id.as_str()));
        }
    }

    #[test]
    fn builtin_endings_in_file_order() {
        let graph = SceneGraph::carbon_journey().unwrap();
        let endings: Vec<&str> = graph.endings().map(|s| s.id.as_str()).collect();
        assert_eq!(
            endings,
            vec![
                "sceneA2",
                "endingAtmospheric",
                "endingIntelligent",
                "endingHumanCiv",
                "endingArchaeology"
            ]
        );
    }

    #[test]
    fn builtin_gates() {
        let graph = SceneGraph::carbon_journey().unwrap();
        let gate = |from: &str, to: &str| {
            graph
                .get(from)
                .and_then(|s| s.choices.iter().find(|c| c.next.as_str() == to))
                .and_then(|c| c.mini_game)
        };
        assert_eq!(gate("scene0", "sceneA1"), Some(MiniGameKind::Dodge));
        assert_eq!(gate("scene0", "sceneA2"), None);
        assert_eq!(gate("sceneC4", "endingIntelligent"), Some(MiniGameKind::Connect));
        assert_eq!(gate("sceneF2", "endingArchaeology"), Some(MiniGameKind::Excavate));
        assert_eq!(graph.get("sceneC2").and_then(|s| s.mini_game), Some(MiniGameKind::Collect));
    }

    #[test]
    fn dangling_reference_rejected() {
        let err = SceneGraph::from_scenes(
            SceneId::new("a"),
            vec![scene("a", &["b"], false), scene("b", &["nowhere"], false)],
        )
        .unwrap_err();
        assert!(matches!(
            err,
            SceneGraphError::UnknownSceneReference { ref from, ref to }
                if from.as_str() == "b" && to.as_str() == "nowhere"
        ));
    }

    #[test]
    fn unknown_start_rejected() {
        let err = SceneGraph::from_scenes(SceneId::new("x"), vec![scene("a", &["a"], false)])
            .unwrap_err();
        assert!(matches!(err, SceneGraphError::UnknownStartScene(_)));
    }

    #[test]
    fn duplicate_rejected() {
        let err = SceneGraph::from_scenes(
            SceneId::new("a"),
            vec![scene("a", &["a"], false), scene("a", &["a"], false)],
        )
        .unwrap_err();
        assert!(matches!(err, SceneGraphError::DuplicateScene(_)));
    }

    #[test]
    fn dead_end_rejected_but_bare_ending_allowed() {
        let err = SceneGraph::from_scenes(
            SceneId::new("a"),
            vec![scene("a", &["b"], false), scene("b", &[], false)],
        )
        .unwrap_err();
        assert!(matches!(err, SceneGraphError::DeadEnd(_)));

        let ok = SceneGraph::from_scenes(
            SceneId::new("a"),
            vec![scene("a", &["b"], false), scene("b", &[], true)],
        );
        assert!(ok.is_ok());
    }

    #[test]
    fn cycles_are_fine_and_reachability_terminates() {
        let graph = SceneGraph::from_scenes(
            SceneId::new("a"),
            vec![
                scene("a", &["b"], false),
                scene("b", &["a", "c"], false),
                scene("c", &["a"], true),
                scene("island", &["island"], false),
            ],
        )
        .unwrap();
        let reach = graph.reachable_from("a");
        assert_eq!(reach.len(), 3);
        assert!(!reach.contains("island"));
        assert!(graph.reachable_from("missing").is_empty());
    }

    #[test]
    fn ron_syntax_error_reported() {
        let err = SceneGraph::parse_ron("Story(start: ").unwrap_err();
        assert!(matches!(err, SceneGraphError::Ron(_)));
    }
}
