/// Ending unlock registry — which terminal scenes the reader has reached.
use rustc_hash::FxHashSet;
use serde::Serialize;

use crate::core::graph::SceneGraph;
use crate::schema::scene::SceneId;

/// The set of endings reached at least once in this process.
///
/// Membership only grows. Ids that are not terminal scenes of the graph the
/// registry was built for are never recorded.
#[derive(Debug, Clone, Default)]
pub struct EndingUnlockRegistry {
    /// Terminal scenes in file order.
    endings: Vec<SceneId>,
    unlocked: FxHashSet<SceneId>,
}

impl EndingUnlockRegistry {
    pub fn for_graph(graph: &SceneGraph) -> Self {
        Self {
            endings: graph.endings().map(|s| s.id.clone()).collect(),
            unlocked: FxHashSet::default(),
        }
    }

    pub fn has(&self, id: &str) -> bool {
        self.unlocked.contains(id)
    }

    pub fn is_ending(&self, id: &str) -> bool {
        self.endings.iter().any(|e| e.as_str() == id)
    }

    /// Record an ending. Returns true only the first time a given ending is
    /// recorded; non-endings are ignored and return false.
    pub fn record_if_new(&mut self, id: &SceneId) -> bool {
        if !self.is_ending(id.as_str()) {
            tracing::warn!(scene = %id, "refusing to unlock a non-terminal scene");
            return false;
        }
        self.unlocked.insert(id.clone())
    }

    /// Unlocked endings, in file order.
    pub fn all(&self) -> Vec<&SceneId> {
        self.endings
            .iter()
            .filter(|id| self.unlocked.contains(*id))
            .collect()
    }

    /// Every ending, locked or not, in file order.
    pub fn endings(&self) -> &[SceneId] {
        &self.endings
    }

    pub fn unlocked_count(&self) -> usize {
        self.unlocked.len()
    }

    /// One gallery card per ending. Narration stays hidden until unlocked.
    pub fn gallery(&self, graph: &SceneGraph) -> Vec<EndingCard> {
        self.endings
            .iter()
            .filter_map(|id| graph.get(id.as_str()))
            .map(|scene| {
                let unlocked = self.has(scene.id.as_str());
                EndingCard {
                    id: scene.id.clone(),
                    title: scene.title.clone(),
                    narration: unlocked.then(|| scene.narration.clone()),
                    unlocked,
                }
            })
            .collect()
    }
}

/// What the ending gallery shows for one ending.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EndingCard {
    pub id: SceneId,
    pub title: String,
    pub narration: Option<String>,
    pub unlocked: bool,
}
