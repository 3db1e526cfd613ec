/// Mini-game engine — four real-time simulations behind one lifecycle.
///
/// Every variant is set up from an explicit random source, advanced once
/// per frame with the elapsed time and a sampled input snapshot, and
/// reports `Continue`, `Win` or `Lose`. Once a variant reports `Win` or
/// `Lose` it is frozen: later updates change nothing and report `Continue`.
pub mod collect;
pub mod connect;
pub mod dodge;
pub mod excavate;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::time::Duration;

use crate::core::geometry::Field;
use crate::core::input::{InputEvent, InputLatch, InputSnapshot};
use crate::core::render::{Frame, FrameRenderer};
use crate::schema::scene::{MiniGameKind, SceneId};

pub use collect::CollectGame;
pub use connect::ConnectGame;
pub use dodge::DodgeGame;
pub use excavate::ExcavateGame;

/// Result of advancing a simulation by one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Outcome {
    Continue,
    Win,
    Lose,
}

impl Outcome {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Continue)
    }
}

/// Score toward the win condition, for HUDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub score: u32,
    pub target: u32,
}

/// The per-frame contract shared by every mini-game.
pub trait Simulation {
    fn update(&mut self, dt: Duration, input: &InputSnapshot) -> Outcome;
    fn is_finished(&self) -> bool;
    fn progress(&self) -> Progress;
}

/// One live simulation, tagged by kind.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", content = "state")]
pub enum MiniGame {
    Dodge(DodgeGame),
    Collect(CollectGame),
    Excavate(ExcavateGame),
    Connect(ConnectGame),
}

impl MiniGame {
    pub fn setup<R: Rng + ?Sized>(kind: MiniGameKind, rng: &mut R, field: Field) -> Self {
        match kind {
            MiniGameKind::Dodge => Self::Dodge(DodgeGame::setup(rng, field)),
            MiniGameKind::Collect => Self::Collect(CollectGame::setup(rng, field)),
            MiniGameKind::Excavate => Self::Excavate(ExcavateGame::setup(rng, field)),
            MiniGameKind::Connect => Self::Connect(ConnectGame::setup(rng, field)),
        }
    }

    pub fn kind(&self) -> MiniGameKind {
        match self {
            Self::Dodge(_) => MiniGameKind::Dodge,
            Self::Collect(_) => MiniGameKind::Collect,
            Self::Excavate(_) => MiniGameKind::Excavate,
            Self::Connect(_) => MiniGameKind::Connect,
        }
    }

    /// Freeze the simulation without producing an outcome.
    pub fn conclude(&mut self) {
        match self {
            Self::Dodge(g) => g.finished = true,
            Self::Collect(g) => g.finished = true,
            Self::Excavate(g) => g.finished = true,
            Self::Connect(g) => g.finished = true,
        }
    }

    fn as_simulation(&self) -> &dyn Simulation {
        match self {
            Self::Dodge(g) => g,
            Self::Collect(g) => g,
            Self::Excavate(g) => g,
            Self::Connect(g) => g,
        }
    }

    fn as_simulation_mut(&mut self) -> &mut dyn Simulation {
        match self {
            Self::Dodge(g) => g,
            Self::Collect(g) => g,
            Self::Excavate(g) => g,
            Self::Connect(g) => g,
        }
    }
}

impl Simulation for MiniGame {
    fn update(&mut self, dt: Duration, input: &InputSnapshot) -> Outcome {
        self.as_simulation_mut().update(dt, input)
    }

    fn is_finished(&self) -> bool {
        self.as_simulation().is_finished()
    }

    fn progress(&self) -> Progress {
        self.as_simulation().progress()
    }
}

/// Why a session was started, and where a win leads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOrigin {
    /// Spawned by a gated choice; a win moves the reader to `destination`.
    Choice { destination: SceneId },
    /// Spawned inside the scene; a win reveals the scene's choices.
    InScene,
}

/// A running mini-game together with the input that feeds it.
#[derive(Debug)]
pub struct MiniGameSession {
    game: MiniGame,
    latch: InputLatch,
    origin: SessionOrigin,
    outcome: Option<Outcome>,
}

impl MiniGameSession {
    pub fn new(game: MiniGame, origin: SessionOrigin) -> Self {
        Self {
            game,
            latch: InputLatch::new(),
            origin,
            outcome: None,
        }
    }

    pub fn game(&self) -> &MiniGame {
        &self.game
    }

    pub fn kind(&self) -> MiniGameKind {
        self.game.kind()
    }

    pub fn origin(&self) -> &SessionOrigin {
        &self.origin
    }

    /// The terminal outcome, once one has been produced.
    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    pub fn feed(&mut self, event: InputEvent) {
        self.latch.feed(event);
    }

    /// Record an outcome produced outside [`frame`](Self::frame). The first
    /// terminal outcome sticks; returns false if one was already recorded.
    pub fn settle(&mut self, outcome: Outcome) -> bool {
        if self.outcome.is_some() || !outcome.is_terminal() {
            return false;
        }
        self.outcome = Some(outcome);
        self.game.conclude();
        true
    }

    /// Advance one frame and hand the result to the renderer.
    ///
    /// The simulation step always happens; a renderer failure only drops
    /// the picture for this frame.
    pub fn frame<R: FrameRenderer + ?Sized>(&mut self, dt: Duration, renderer: &mut R) -> Outcome {
        let input = self.latch.sample();
        let outcome = self.game.update(dt, &input);
        if outcome.is_terminal() && self.outcome.is_none() {
            self.outcome = Some(outcome);
        }

        let frame = Frame {
            game: &self.game,
            outcome: self.outcome,
        };
        if let Err(err) = renderer.draw(&frame) {
            tracing::trace!(kind = self.game.kind().label(), %err, "frame dropped");
        }
        outcome
    }
}

/// Spawns sessions from a seeded random source.
#[derive(Debug, Clone)]
pub struct MiniGameEngine {
    rng: StdRng,
    field: Field,
}

impl MiniGameEngine {
    pub fn new(seed: u64, field: Field) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            field,
        }
    }

    pub fn field(&self) -> Field {
        self.field
    }

    pub fn spawn(&mut self, kind: MiniGameKind, origin: SessionOrigin) -> MiniGameSession {
        tracing::debug!(kind = kind.label(), ?origin, "mini-game session spawned");
        MiniGameSession::new(MiniGame::setup(kind, &mut self.rng, self.field), origin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geometry::Point;
    use crate::core::render::{NullRenderer, RenderError};

    struct BrokenRenderer {
        attempts: u32,
    }

    impl FrameRenderer for BrokenRenderer {
        fn draw(&mut self, _frame: &Frame<'_>) -> Result<(), RenderError> {
            self.attempts += 1;
            Err(RenderError::TargetUnavailable)
        }
    }

    #[test]
    fn setup_matches_kind() {
        let mut engine = MiniGameEngine::new(1, Field::default());
        for kind in [
            MiniGameKind::Dodge,
            MiniGameKind::Collect,
            MiniGameKind::Excavate,
            MiniGameKind::Connect,
        ] {
            let session = engine.spawn(kind, SessionOrigin::InScene);
            assert_eq!(session.kind(), kind);
            assert!(!session.game().is_finished());
            assert!(session.outcome().is_none());
        }
    }

    #[test]
    fn same_seed_same_layout() {
        let a = MiniGameEngine::new(42, Field::default()).spawn(MiniGameKind::Dodge, SessionOrigin::InScene);
        let b = MiniGameEngine::new(42, Field::default()).spawn(MiniGameKind::Dodge, SessionOrigin::InScene);
        match (a.game(), b.game()) {
            (MiniGame::Dodge(x), MiniGame::Dodge(y)) => assert_eq!(x.hazards, y.hazards),
            _ => panic!("expected dodge games"),
        }
    }

    #[test]
    fn simulation_continues_when_render_target_is_gone() {
        let game = MiniGame::Excavate(ExcavateGame::with_fossil(14, 10, (1, 1)));
        let mut session = MiniGameSession::new(game, SessionOrigin::InScene);
        let mut renderer = BrokenRenderer { attempts: 0 };

        session.feed(InputEvent::PointerUp(Point::new(5.0, 5.0)));
        session.frame(Duration::from_millis(16), &mut renderer);

        assert_eq!(renderer.attempts, 1);
        match session.game() {
            MiniGame::Excavate(g) => assert_eq!(g.tile(0, 0).map(|t| t.layers), Some(2)),
            _ => panic!("expected excavate game"),
        }
    }

    #[test]
    fn first_terminal_outcome_sticks() {
        let node = connect::Node {
            id: 0,
            center: Point::new(100.0, 100.0),
            solved: false,
            spaced: true,
        };
        let game = MiniGame::Connect(ConnectGame::with_nodes(Field::default(), vec![node]));
        let mut session = MiniGameSession::new(game, SessionOrigin::InScene);
        session.feed(InputEvent::PointerDown(Point::new(100.0, 100.0)));
        assert_eq!(session.frame(Duration::ZERO, &mut NullRenderer), Outcome::Win);
        assert_eq!(session.outcome(), Some(Outcome::Win));
        assert!(!session.settle(Outcome::Lose));
        assert_eq!(session.outcome(), Some(Outcome::Win));
    }

    #[test]
    fn external_settle_freezes_game() {
        let mut engine = MiniGameEngine::new(3, Field::default());
        let mut session = engine.spawn(MiniGameKind::Collect, SessionOrigin::InScene);
        assert!(!session.settle(Outcome::Continue));
        assert!(session.settle(Outcome::Win));
        assert!(session.game().is_finished());
    }

    #[test]
    fn game_serializes_with_kind_tag() {
        let game = MiniGame::Excavate(ExcavateGame::with_fossil(2, 2, (0, 0)));
        let text = ron::to_string(&game).unwrap();
        assert!(text.contains("Excavate"));
    }
}
