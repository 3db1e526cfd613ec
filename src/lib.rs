//! Carbon Journey — a branching interactive-fiction engine with real-time
//! mini-game gates.
//!
//! A reader follows a carbon atom through a cyclic scene graph. Some choices
//! must be earned by winning a short simulation (dodge, collect, excavate,
//! connect); reaching a terminal scene unlocks it in the ending gallery.
//! Everything runs on one logical thread, driven by discrete reader actions
//! and a frame tick.

pub mod core;
pub mod schema;

pub use crate::core::controller::{NarrativeController, Step, Timings};
pub use crate::core::graph::SceneGraph;
pub use crate::core::minigame::{MiniGame, Outcome};
