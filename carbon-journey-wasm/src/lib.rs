//! WASM bindings for carbon-journey — the browser front-end drives the
//! controller through these calls and draws from the JSON it hands back.

use serde::Serialize;
use std::time::Duration;
use wasm_bindgen::prelude::*;

use carbon_journey::core::controller::{ChoiceResolution, NarrativeController};
use carbon_journey::core::geometry::Point;
use carbon_journey::core::input::{InputEvent, Key};
use carbon_journey::core::minigame::{MiniGame, Outcome, Progress, Simulation};
use carbon_journey::core::render::{Frame, FrameRenderer, RenderError};

// ---------------------------------------------------------------------------
// JSON helper types for communication across the WASM boundary
// ---------------------------------------------------------------------------
#[derive(Serialize)]
struct FrameJson<'a> {
    banner: &'static str,
    rules: &'static str,
    progress: Progress,
    outcome: Option<Outcome>,
    game: &'a MiniGame,
}

/// Keeps the latest frame as JSON for the page to pick up.
#[derive(Debug, Default)]
struct JsonRenderer {
    last: Option<String>,
}

impl FrameRenderer for JsonRenderer {
    fn draw(&mut self, frame: &Frame<'_>) -> Result<(), RenderError> {
        let kind = frame.game.kind();
        let json = FrameJson {
            banner: kind.banner(),
            rules: kind.rules(),
            progress: frame.game.progress(),
            outcome: frame.outcome,
            game: frame.game,
        };
        let encoded =
            serde_json::to_string(&json).map_err(|e| RenderError::Encode(e.to_string()))?;
        self.last = Some(encoded);
        Ok(())
    }
}

fn outcome_label(outcome: Outcome) -> &'static str {
    match outcome {
        Outcome::Continue => "continue",
        Outcome::Win => "win",
        Outcome::Lose => "lose",
    }
}

fn install_logging() {
    #[cfg(target_arch = "wasm32")]
    {
        static INIT: std::sync::Once = std::sync::Once::new();
        INIT.call_once(tracing_wasm::set_as_global_default);
    }
}

// ---------------------------------------------------------------------------
// Journey — the main exported struct
// ---------------------------------------------------------------------------
#[wasm_bindgen]
pub struct Journey {
    controller: NarrativeController,
    renderer: JsonRenderer,
}

#[wasm_bindgen]
impl Journey {
    /// Start a new playthrough of the built-in story.
    #[wasm_bindgen(constructor)]
    pub fn new(seed: u64) -> Result<Journey, JsError> {
        install_logging();
        let controller = NarrativeController::builder()
            .seed(seed)
            .build()
            .map_err(|e| JsError::new(&format!("Journey build error: {e}")))?;
        tracing::debug!(seed, "journey started");
        Ok(Journey {
            controller,
            renderer: JsonRenderer::default(),
        })
    }

    /// What the narration panel should show, as JSON.
    pub fn scene_json(&self) -> Result<String, JsError> {
        serde_json::to_string(&self.controller.view())
            .map_err(|e| JsError::new(&format!("Serialization error: {e}")))
    }

    /// The latest mini-game frame as JSON, or `null` when no game runs.
    pub fn game_json(&self) -> String {
        match (self.controller.mini_game(), &self.renderer.last) {
            (Some(_), Some(json)) => json.clone(),
            _ => "null".to_string(),
        }
    }

    /// One card per ending, as a JSON array.
    pub fn gallery_json(&self) -> Result<String, JsError> {
        serde_json::to_string(&self.controller.gallery())
            .map_err(|e| JsError::new(&format!("Serialization error: {e}")))
    }

    pub fn continue_story(&mut self) -> Result<(), JsError> {
        self.controller
            .continue_story()
            .map_err(|e| JsError::new(&e.to_string()))
    }

    /// Take a visible choice. Returns the gating mini-game's label, if any.
    pub fn choose(&mut self, index: usize) -> Result<Option<String>, JsError> {
        let resolution = self
            .controller
            .choose(index)
            .map_err(|e| JsError::new(&e.to_string()))?;
        self.renderer.last = None;
        Ok(match resolution {
            ChoiceResolution::MiniGame { kind, .. } => Some(kind.label().to_string()),
            ChoiceResolution::Transitioning { .. } => None,
        })
    }

    pub fn start_scene_game(&mut self) -> Result<String, JsError> {
        let kind = self
            .controller
            .start_scene_game()
            .map_err(|e| JsError::new(&e.to_string()))?;
        self.renderer.last = None;
        Ok(kind.label().to_string())
    }

    /// Returns false when the key is not a direction or no game is running.
    pub fn key_down(&mut self, name: &str) -> bool {
        match Key::from_name(name) {
            Some(key) => self.controller.input(InputEvent::KeyDown(key)),
            None => false,
        }
    }

    pub fn key_up(&mut self, name: &str) -> bool {
        match Key::from_name(name) {
            Some(key) => self.controller.input(InputEvent::KeyUp(key)),
            None => false,
        }
    }

    pub fn pointer_down(&mut self, x: f32, y: f32) -> bool {
        self.controller
            .input(InputEvent::PointerDown(Point::new(x, y)))
    }

    pub fn pointer_move(&mut self, x: f32, y: f32) -> bool {
        self.controller
            .input(InputEvent::PointerMove(Point::new(x, y)))
    }

    pub fn pointer_up(&mut self, x: f32, y: f32) -> bool {
        self.controller.input(InputEvent::PointerUp(Point::new(x, y)))
    }

    /// Advance by one display refresh. Returns "continue", "win" or "lose".
    pub fn tick(&mut self, dt_ms: f64) -> String {
        let dt = if dt_ms.is_finite() && dt_ms > 0.0 {
            Duration::from_secs_f64(dt_ms / 1000.0)
        } else {
            Duration::ZERO
        };
        let outcome = self.controller.tick(dt, &mut self.renderer);
        outcome_label(outcome).to_string()
    }

    /// Close the "new ending" notice. Returns true if one was showing.
    pub fn dismiss_notification(&mut self) -> bool {
        self.controller.dismiss_notification().is_some()
    }
}

impl Drop for Journey {
    fn drop(&mut self) {
        self.controller.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use carbon_journey::core::minigame::ExcavateGame;

    #[test]
    fn json_renderer_keeps_latest_frame() {
        let game = MiniGame::Excavate(ExcavateGame::with_fossil(2, 2, (0, 0)));
        let mut renderer = JsonRenderer::default();
        renderer
            .draw(&Frame {
                game: &game,
                outcome: None,
            })
            .unwrap();
        let json = renderer.last.clone().unwrap();
        assert!(json.contains("\"kind\":\"Excavate\""));
        assert!(json.contains("DISCOVERY MODE"));
        assert!(json.contains("\"outcome\":null"));
    }

    #[test]
    fn outcome_labels_are_lowercase() {
        assert_eq!(outcome_label(Outcome::Continue), "continue");
        assert_eq!(outcome_label(Outcome::Win), "win");
        assert_eq!(outcome_label(Outcome::Lose), "lose");
    }
}
