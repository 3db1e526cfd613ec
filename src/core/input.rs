/// Input sampling — raw events in, one snapshot per frame out.
///
/// Only the latest state matters each frame: held keys persist until
/// released, pointer events are latest-only and cleared once sampled.
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::core::geometry::Point;

/// Directional keys understood by the keyboard-driven games.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    Up,
    Down,
    Left,
    Right,
}

impl Key {
    /// Map a browser-style key name (`w`, `ArrowUp`, ...) to a direction.
    pub fn from_name(name: &str) -> Option<Key> {
        match name.to_ascii_lowercase().as_str() {
            "w" | "arrowup" | "up" => Some(Key::Up),
            "s" | "arrowdown" | "down" => Some(Key::Down),
            "a" | "arrowleft" | "left" => Some(Key::Left),
            "d" | "arrowright" | "right" => Some(Key::Right),
            _ => None,
        }
    }
}

/// A discrete event from the input collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum InputEvent {
    KeyDown(Key),
    KeyUp(Key),
    PointerDown(Point),
    PointerMove(Point),
    PointerUp(Point),
}

/// What a mini-game sees for one frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputSnapshot {
    pub held: FxHashSet<Key>,
    pub pointer_down: Option<Point>,
    pub pointer_move: Option<Point>,
    pub pointer_up: Option<Point>,
}

impl InputSnapshot {
    pub fn is_held(&self, key: Key) -> bool {
        self.held.contains(&key)
    }

    pub fn holding(mut self, key: Key) -> Self {
        self.held.insert(key);
        self
    }

    pub fn press(mut self, at: Point) -> Self {
        self.pointer_down = Some(at);
        self
    }

    pub fn drag(mut self, to: Point) -> Self {
        self.pointer_move = Some(to);
        self
    }

    pub fn release(mut self, at: Point) -> Self {
        self.pointer_up = Some(at);
        self
    }
}

/// Accumulates events between frames for a single mini-game session.
///
/// A latch lives exactly as long as the session that owns it, so events
/// can never reach a game that has been torn down.
#[derive(Debug, Clone, Default)]
pub struct InputLatch {
    held: FxHashSet<Key>,
    pointer_down: Option<Point>,
    pointer_move: Option<Point>,
    pointer_up: Option<Point>,
}

impl InputLatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed(&mut self, event: InputEvent) {
        match event {
            InputEvent::KeyDown(key) => {
                self.held.insert(key);
            }
            InputEvent::KeyUp(key) => {
                self.held.remove(&key);
            }
            InputEvent::PointerDown(p) => self.pointer_down = Some(p),
            InputEvent::PointerMove(p) => self.pointer_move = Some(p),
            InputEvent::PointerUp(p) => self.pointer_up = Some(p),
        }
    }

    /// Take this frame's snapshot.
    pub fn sample(&mut self) -> InputSnapshot {
        InputSnapshot {
            held: self.held.clone(),
            pointer_down: self.pointer_down.take(),
            pointer_move: self.pointer_move.take(),
            pointer_up: self.pointer_up.take(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_names() {
        assert_eq!(Key::from_name("w"), Some(Key::Up));
        assert_eq!(Key::from_name("ArrowLeft"), Some(Key::Left));
        assert_eq!(Key::from_name("D"), Some(Key::Right));
        assert_eq!(Key::from_name("space"), None);
    }

    #[test]
    fn held_keys_persist_across_samples() {
        let mut latch = InputLatch::new();
        latch.feed(InputEvent::KeyDown(Key::Right));
        assert!(latch.sample().is_held(Key::Right));
        assert!(latch.sample().is_held(Key::Right));
        latch.feed(InputEvent::KeyUp(Key::Right));
        assert!(!latch.sample().is_held(Key::Right));
    }

    #[test]
    fn pointer_events_are_latest_only_and_cleared() {
        let mut latch = InputLatch::new();
        latch.feed(InputEvent::PointerMove(Point::new(1.0, 1.0)));
        latch.feed(InputEvent::PointerMove(Point::new(2.0, 2.0)));
        latch.feed(InputEvent::PointerDown(Point::new(3.0, 3.0)));

        let snap = latch.sample();
        assert_eq!(snap.pointer_move, Some(Point::new(2.0, 2.0)));
        assert_eq!(snap.pointer_down, Some(Point::new(3.0, 3.0)));
        assert_eq!(snap.pointer_up, None);

        let next = latch.sample();
        assert_eq!(next.pointer_move, None);
        assert_eq!(next.pointer_down, None);
    }

    #[test]
    fn snapshot_builders() {
        let snap = InputSnapshot::default()
            .holding(Key::Up)
            .press(Point::new(5.0, 5.0))
            .release(Point::new(6.0, 6.0));
        assert!(snap.is_held(Key::Up));
        assert!(snap.pointer_down.is_some());
        assert!(snap.pointer_move.is_none());
        assert!(snap.pointer_up.is_some());
    }
}
