use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Newtype wrapper for scene IDs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SceneId(pub String);

impl SceneId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SceneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SceneId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl Borrow<str> for SceneId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// The four mini-game families a choice or scene can be gated by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MiniGameKind {
    /// Drag a token through a hazard field to the exit strip.
    Dodge,
    /// Steer a token with the keyboard over every pickup.
    Collect,
    /// Dig through layered tiles to uncover a hidden 2×2 fossil.
    Excavate,
    /// Click every node once.
    Connect,
}

impl MiniGameKind {
    /// Upper-case label: "DODGE", "COLLECT", "EXCAVATE", "CONNECT".
    pub fn label(&self) -> &'static str {
        match self {
            Self::Dodge => "DODGE",
            Self::Collect => "COLLECT",
            Self::Excavate => "EXCAVATE",
            Self::Connect => "CONNECT",
        }
    }

    /// Headline shown above the play field.
    pub fn banner(&self) -> &'static str {
        match self {
            Self::Dodge => "GRAVITY ALERT",
            Self::Collect => "ENERGY LOW",
            Self::Excavate => "DISCOVERY MODE",
            Self::Connect => "NEURAL SYNC",
        }
    }

    /// One-line instructions for the player.
    pub fn rules(&self) -> &'static str {
        match self {
            Self::Dodge => "Drag the atom to the exit. Avoid the meteors!",
            Self::Collect => "Use WASD or the arrow keys to collect energy!",
            Self::Excavate => "Click squares to reveal the fossil!",
            Self::Connect => "Click all nodes to light them up!",
        }
    }

    /// Parse a label case-insensitively.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.to_ascii_lowercase().as_str() {
            "dodge" => Some(Self::Dodge),
            "collect" => Some(Self::Collect),
            "excavate" => Some(Self::Excavate),
            "connect" => Some(Self::Connect),
            _ => None,
        }
    }
}

/// A character the reader meets in a scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Npc {
    pub name: String,
    #[serde(default)]
    pub dialogue: Option<String>,
}

/// An edge of the scene graph.
///
/// A choice carrying a `mini_game` is not taken directly: the game is
/// played first and only a win moves the reader to `next`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    pub text: String,
    pub next: SceneId,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub mini_game: Option<MiniGameKind>,
}

impl Choice {
    pub fn is_gated(&self) -> bool {
        self.mini_game.is_some()
    }
}

/// A node of the scene graph. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub id: SceneId,
    pub title: String,
    pub narration: String,
    #[serde(default)]
    pub npc: Option<Npc>,
    /// Game played inside the scene before its choices are offered.
    #[serde(default)]
    pub mini_game: Option<MiniGameKind>,
    #[serde(default)]
    pub choices: Vec<Choice>,
    #[serde(default)]
    pub is_ending: bool,
    /// Offer the choices straight from the narration step (title screens).
    #[serde(default)]
    pub direct_choices: bool,
}

impl Scene {
    /// True if the scene has an interaction step to advance into.
    pub fn has_interaction(&self) -> bool {
        !self.choices.is_empty() || self.npc.is_some()
    }

    /// Choices reachable from this scene, deduplicated, in declaration order.
    pub fn destinations(&self) -> Vec<&SceneId> {
        let mut out: Vec<&SceneId> = Vec::with_capacity(self.choices.len());
        for choice in &self.choices {
            if !out.contains(&&choice.next) {
                out.push(&choice.next);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_scene(npc: bool, choices: usize) -> Scene {
        Scene {
            id: SceneId::new("scene0"),
            title: "Stellar Furnace".to_string(),
            narration: "You are at the core of a star.".to_string(),
            npc: npc.then(|| Npc {
                name: "Hydrogen".to_string(),
                dialogue: Some("Run!".to_string()),
            }),
            mini_game: None,
            choices: (0..choices)
                .map(|i| Choice {
                    text: format!("option {}", i),
                    next: SceneId::new(if i % 2 == 0 { "a" } else { "b" }),
                    description: None,
                    mini_game: (i == 0).then_some(MiniGameKind::Dodge),
                })
                .collect(),
            is_ending: false,
            direct_choices: false,
        }
    }

    #[test]
    fn scene_id_display_and_borrow() {
        let id = SceneId::from("sceneA2");
        assert_eq!(id.to_string(), "sceneA2");
        assert_eq!(id.as_str(), "sceneA2");
        let set: std::collections::HashSet<SceneId> = [id.clone()].into_iter().collect();
        assert!(set.contains("sceneA2"));
    }

    #[test]
    fn interaction_requires_choices_or_npc() {
        assert!(make_scene(true, 0).has_interaction());
        assert!(make_scene(false, 2).has_interaction());
        assert!(!make_scene(false, 0).has_interaction());
    }

    #[test]
    fn destinations_are_deduplicated() {
        let scene = make_scene(false, 3);
        let dests: Vec<&str> = scene.destinations().iter().map(|d| d.as_str()).collect();
        assert_eq!(dests, vec!["a", "b"]);
    }

    #[test]
    fn gated_choice() {
        let scene = make_scene(false, 2);
        assert!(scene.choices[0].is_gated());
        assert!(!scene.choices[1].is_gated());
    }

    #[test]
    fn mini_game_labels() {
        assert_eq!(MiniGameKind::Dodge.label(), "DODGE");
        assert_eq!(MiniGameKind::from_label("excavate"), Some(MiniGameKind::Excavate));
        assert_eq!(MiniGameKind::from_label("CONNECT"), Some(MiniGameKind::Connect));
        assert_eq!(MiniGameKind::from_label("juggle"), None);
    }

    #[test]
    fn scene_from_ron_uses_defaults() {
        let scene: Scene = ron::from_str(
            r#"(id: "intro", title: "Start", narration: "Welcome.",
                choices: [(text: "Go", next: "scene0")])"#,
        )
        .unwrap();
        assert!(!scene.is_ending);
        assert!(scene.npc.is_none());
        assert_eq!(scene.choices[0].next, SceneId::new("scene0"));
        assert!(scene.choices[0].mini_game.is_none());
    }
}
