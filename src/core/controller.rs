/// The narrative controller: scene → choice → mini-game → scene orchestration.
///
/// Owns the session state of one playthrough. Discrete actions
/// (`continue_story`, `choose`, `start_scene_game`) change it immediately or
/// schedule a deferred continuation; `tick` advances the clock, runs due
/// continuations in order and steps the active mini-game once.
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::core::geometry::Field;
use crate::core::graph::{SceneGraph, SceneGraphError};
use crate::core::input::InputEvent;
use crate::core::minigame::{MiniGameEngine, MiniGameSession, Outcome, SessionOrigin};
use crate::core::render::FrameRenderer;
use crate::core::timer::{Scheduler, TimerId};
use crate::core::unlocks::{EndingCard, EndingUnlockRegistry};
use crate::schema::scene::{Choice, MiniGameKind, Npc, Scene, SceneId};

#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("scene graph error: {0}")]
    Graph(#[from] SceneGraphError),
    #[error("timings error: {0}")]
    Timings(#[from] TimingsError),
    #[error("{reported:?} reported an outcome but the active mini-game is {active:?}")]
    MiniGameTypeMismatch {
        reported: MiniGameKind,
        active: Option<MiniGameKind>,
    },
    #[error("no choice {index} (scene offers {available})")]
    NoSuchChoice { index: usize, available: usize },
    #[error("choices are not on screen")]
    ChoicesHidden,
    #[error("a scene transition is in progress")]
    TransitionInProgress,
    #[error("a mini-game is in progress")]
    MiniGameActive,
    #[error("scene '{0}' has no in-scene mini-game waiting")]
    NoInSceneGame(SceneId),
    #[error("scene '{0}' has no interaction step")]
    NoInteraction(SceneId),
    #[error("expected the {expected:?} step, reader is at {actual:?}")]
    WrongStep { expected: Step, actual: Step },
}

#[derive(Debug, Error)]
pub enum TimingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
}

/// Where the reader is within the current scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Step {
    Narration,
    Interaction,
}

fn default_transition_ms() -> u64 {
    500
}

fn default_outcome_pause_ms() -> u64 {
    500
}

fn default_notice_ms() -> u64 {
    5000
}

/// Fixed pause lengths, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timings {
    /// Blackout between leaving one scene and entering the next.
    #[serde(default = "default_transition_ms")]
    pub transition_ms: u64,
    /// Pause after a mini-game result before it takes effect.
    #[serde(default = "default_outcome_pause_ms")]
    pub outcome_pause_ms: u64,
    /// How long the "new ending" notice stays up.
    #[serde(default = "default_notice_ms")]
    pub notice_ms: u64,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            transition_ms: default_transition_ms(),
            outcome_pause_ms: default_outcome_pause_ms(),
            notice_ms: default_notice_ms(),
        }
    }
}

impl Timings {
    pub fn load_from_ron(path: &Path) -> Result<Timings, TimingsError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_ron(&contents)
    }

    pub fn parse_ron(input: &str) -> Result<Timings, TimingsError> {
        Ok(ron::from_str(input)?)
    }

    pub fn transition(&self) -> Duration {
        Duration::from_millis(self.transition_ms)
    }

    pub fn outcome_pause(&self) -> Duration {
        Duration::from_millis(self.outcome_pause_ms)
    }

    pub fn notice(&self) -> Duration {
        Duration::from_millis(self.notice_ms)
    }
}

/// The one-shot "new ending unlocked" notice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnlockNotice {
    pub id: SceneId,
    pub title: String,
}

/// What taking a choice set in motion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChoiceResolution {
    /// The blackout has started; the reader arrives at `to` when it ends.
    Transitioning { to: SceneId },
    /// A mini-game must be won before the reader moves to `destination`.
    MiniGame {
        kind: MiniGameKind,
        destination: SceneId,
    },
}

/// Continuations parked on the scheduler.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Deferred {
    EnterScene(SceneId),
    ConcludeMiniGame,
    DismissNotice,
}

/// A serializable snapshot of what the narration UI should show.
#[derive(Debug, Clone, Serialize)]
pub struct SceneView<'a> {
    pub id: &'a SceneId,
    pub title: &'a str,
    pub narration: &'a str,
    pub npc: Option<&'a Npc>,
    pub step: Step,
    pub is_ending: bool,
    pub transitioning: bool,
    pub can_continue: bool,
    pub choices: Vec<&'a Choice>,
    /// In-scene game the reader still has to win, if one is offered now.
    pub scene_game: Option<MiniGameKind>,
    pub active_game: Option<MiniGameKind>,
    pub notice: Option<&'a UnlockNotice>,
}

/// The top-level state machine. Built via `NarrativeController::builder()`.
#[derive(Debug)]
pub struct NarrativeController {
    graph: SceneGraph,
    unlocks: EndingUnlockRegistry,
    engine: MiniGameEngine,
    timings: Timings,
    scheduler: Scheduler<Deferred>,
    scene: Scene,
    step: Step,
    history: Vec<SceneId>,
    /// Destination of the blackout currently in flight.
    transition: Option<SceneId>,
    session: Option<MiniGameSession>,
    conclusion: Option<TimerId>,
    in_scene_complete: bool,
    notice: Option<UnlockNotice>,
    notice_timer: Option<TimerId>,
}

/// Builder for constructing a `NarrativeController`.
pub struct NarrativeControllerBuilder {
    seed: u64,
    scenes_file: Option<String>,
    timings_file: Option<String>,
    field: Field,
    /// Directly provided graph (for testing without files).
    graph: Option<SceneGraph>,
    /// Directly provided timings (for testing without files).
    timings: Option<Timings>,
}

impl NarrativeController {
    pub fn builder() -> NarrativeControllerBuilder {
        NarrativeControllerBuilder {
            seed: 0,
            scenes_file: None,
            timings_file: None,
            field: Field::default(),
            graph: None,
            timings: None,
        }
    }

    pub fn graph(&self) -> &SceneGraph {
        &self.graph
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn current_id(&self) -> &SceneId {
        &self.scene.id
    }

    pub fn step(&self) -> Step {
        self.step
    }

    /// Scenes left behind, oldest first.
    pub fn history(&self) -> &[SceneId] {
        &self.history
    }

    pub fn timings(&self) -> &Timings {
        &self.timings
    }

    /// Virtual time since the controller was built.
    pub fn now(&self) -> Duration {
        self.scheduler.now()
    }

    pub fn is_transitioning(&self) -> bool {
        self.transition.is_some()
    }

    /// Set only while a mini-game spawned from a gated choice is alive.
    pub fn pending_destination(&self) -> Option<&SceneId> {
        match self.session.as_ref().map(MiniGameSession::origin) {
            Some(SessionOrigin::Choice { destination }) => Some(destination),
            _ => None,
        }
    }

    pub fn mini_game(&self) -> Option<&MiniGameSession> {
        self.session.as_ref()
    }

    pub fn in_scene_complete(&self) -> bool {
        self.in_scene_complete
    }

    pub fn notification(&self) -> Option<&UnlockNotice> {
        self.notice.as_ref()
    }

    pub fn unlocks(&self) -> &EndingUnlockRegistry {
        &self.unlocks
    }

    pub fn gallery(&self) -> Vec<EndingCard> {
        self.unlocks.gallery(&self.graph)
    }

    fn scene_gate_open(&self) -> bool {
        self.scene.mini_game.is_none() || self.in_scene_complete
    }

    /// True when the reader can click a choice right now.
    pub fn choices_visible(&self) -> bool {
        if self.transition.is_some() || self.session.is_some() {
            return false;
        }
        match self.step {
            Step::Narration => self.scene.is_ending || self.scene.direct_choices,
            Step::Interaction => self.scene_gate_open(),
        }
    }

    /// Choices currently on screen; empty while they are hidden.
    pub fn available_choices(&self) -> &[Choice] {
        if self.choices_visible() {
            &self.scene.choices
        } else {
            &[]
        }
    }

    /// True when `continue_story` would succeed.
    pub fn can_continue(&self) -> bool {
        self.transition.is_none()
            && self.session.is_none()
            && self.step == Step::Narration
            && !self.scene.is_ending
            && self.scene.has_interaction()
    }

    pub fn view(&self) -> SceneView<'_> {
        let scene_game = match (self.step, self.scene.mini_game) {
            (Step::Interaction, Some(kind))
                if !self.in_scene_complete
                    && self.session.is_none()
                    && self.transition.is_none() =>
            {
                Some(kind)
            }
            _ => None,
        };
        SceneView {
            id: &self.scene.id,
            title: &self.scene.title,
            narration: &self.scene.narration,
            npc: self.scene.npc.as_ref(),
            step: self.step,
            is_ending: self.scene.is_ending,
            transitioning: self.transition.is_some(),
            can_continue: self.can_continue(),
            choices: self.available_choices().iter().collect(),
            scene_game,
            active_game: self.session.as_ref().map(MiniGameSession::kind),
            notice: self.notice.as_ref(),
        }
    }

    fn ensure_idle(&self) -> Result<(), ControllerError> {
        if self.transition.is_some() {
            return Err(ControllerError::TransitionInProgress);
        }
        if self.session.is_some() {
            return Err(ControllerError::MiniGameActive);
        }
        Ok(())
    }

    /// Narration → Interaction.
    pub fn continue_story(&mut self) -> Result<(), ControllerError> {
        self.ensure_idle()?;
        if self.step != Step::Narration {
            return Err(ControllerError::WrongStep {
                expected: Step::Narration,
                actual: self.step,
            });
        }
        if self.scene.is_ending || !self.scene.has_interaction() {
            return Err(ControllerError::NoInteraction(self.scene.id.clone()));
        }
        self.step = Step::Interaction;
        tracing::debug!(scene = %self.scene.id, "interaction step");
        Ok(())
    }

    /// Take the choice at `index` of the visible list.
    pub fn choose(&mut self, index: usize) -> Result<ChoiceResolution, ControllerError> {
        self.ensure_idle()?;
        if !self.choices_visible() {
            return Err(ControllerError::ChoicesHidden);
        }
        let choice = self
            .scene
            .choices
            .get(index)
            .ok_or(ControllerError::NoSuchChoice {
                index,
                available: self.scene.choices.len(),
            })?;
        let destination = choice.next.clone();
        tracing::debug!(scene = %self.scene.id, choice = %choice.text, "choice taken");

        match choice.mini_game {
            Some(kind) => {
                let origin = SessionOrigin::Choice {
                    destination: destination.clone(),
                };
                self.session = Some(self.engine.spawn(kind, origin));
                Ok(ChoiceResolution::MiniGame { kind, destination })
            }
            None => {
                self.begin_transition(destination.clone());
                Ok(ChoiceResolution::Transitioning { to: destination })
            }
        }
    }

    /// Start the current scene's own mini-game.
    pub fn start_scene_game(&mut self) -> Result<MiniGameKind, ControllerError> {
        self.ensure_idle()?;
        if self.step != Step::Interaction {
            return Err(ControllerError::WrongStep {
                expected: Step::Interaction,
                actual: self.step,
            });
        }
        let kind = match self.scene.mini_game {
            Some(kind) if !self.in_scene_complete => kind,
            _ => return Err(ControllerError::NoInSceneGame(self.scene.id.clone())),
        };
        self.session = Some(self.engine.spawn(kind, SessionOrigin::InScene));
        Ok(kind)
    }

    /// Route an input event to the live mini-game. Returns false (and drops
    /// the event) when none is running.
    pub fn input(&mut self, event: InputEvent) -> bool {
        match self.session.as_mut() {
            Some(session) => {
                session.feed(event);
                true
            }
            None => {
                tracing::trace!(?event, "input dropped, no mini-game running");
                false
            }
        }
    }

    /// Advance the clock by `dt`: fire every continuation that comes due, in
    /// order, then step the active mini-game one frame.
    pub fn tick<R: FrameRenderer + ?Sized>(&mut self, dt: Duration, renderer: &mut R) -> Outcome {
        let horizon = self.scheduler.now() + dt;
        while let Some(task) = self.scheduler.pop_due(horizon) {
            self.run(task);
        }
        self.scheduler.advance_to(horizon);

        let Some(session) = self.session.as_mut() else {
            return Outcome::Continue;
        };
        let settled = session.outcome().is_some();
        let outcome = session.frame(dt, renderer);
        if outcome.is_terminal() && !settled {
            self.schedule_conclusion(outcome);
        }
        outcome
    }

    /// Record an outcome produced by a mini-game running outside `tick`.
    ///
    /// Reporting for a kind that is not the active game is a caller bug.
    pub fn report_outcome(
        &mut self,
        kind: MiniGameKind,
        outcome: Outcome,
    ) -> Result<(), ControllerError> {
        let active = self.session.as_ref().map(MiniGameSession::kind);
        if active != Some(kind) {
            tracing::error!(reported = kind.label(), ?active, "mini-game type mismatch");
            return Err(ControllerError::MiniGameTypeMismatch {
                reported: kind,
                active,
            });
        }
        if let Some(session) = self.session.as_mut() {
            if session.settle(outcome) {
                self.schedule_conclusion(outcome);
            }
        }
        Ok(())
    }

    /// Close the unlock notice early. Returns the notice that was showing.
    pub fn dismiss_notification(&mut self) -> Option<UnlockNotice> {
        if let Some(id) = self.notice_timer.take() {
            self.scheduler.cancel(id);
        }
        self.notice.take()
    }

    /// Cancel every pending continuation and drop the live mini-game.
    pub fn shutdown(&mut self) {
        self.scheduler.cancel_all();
        self.session = None;
        self.transition = None;
        self.conclusion = None;
        self.notice_timer = None;
        tracing::debug!(scene = %self.scene.id, "controller shut down");
    }

    fn schedule_conclusion(&mut self, outcome: Outcome) {
        tracing::debug!(?outcome, "mini-game settled");
        let id = self
            .scheduler
            .schedule(self.timings.outcome_pause(), Deferred::ConcludeMiniGame);
        self.conclusion = Some(id);
    }

    fn begin_transition(&mut self, to: SceneId) {
        tracing::debug!(from = %self.scene.id, to = %to, "transition started");
        self.scheduler
            .schedule(self.timings.transition(), Deferred::EnterScene(to.clone()));
        self.transition = Some(to);
    }

    fn run(&mut self, task: Deferred) {
        match task {
            Deferred::EnterScene(to) => self.enter_scene(to),
            Deferred::ConcludeMiniGame => self.conclude_mini_game(),
            Deferred::DismissNotice => {
                self.notice_timer = None;
                if let Some(notice) = self.notice.take() {
                    tracing::debug!(ending = %notice.id, "unlock notice expired");
                }
            }
        }
    }

    fn conclude_mini_game(&mut self) {
        self.conclusion = None;
        let Some(session) = self.session.take() else {
            return;
        };
        match (session.outcome(), session.origin()) {
            (Some(Outcome::Win), SessionOrigin::Choice { destination }) => {
                tracing::info!(kind = session.kind().label(), "mini-game won");
                self.begin_transition(destination.clone());
            }
            (Some(Outcome::Win), SessionOrigin::InScene) => {
                tracing::info!(kind = session.kind().label(), "in-scene mini-game won");
                self.in_scene_complete = true;
            }
            (outcome, _) => {
                tracing::info!(kind = session.kind().label(), ?outcome, "mini-game lost");
            }
        }
    }

    fn enter_scene(&mut self, to: SceneId) {
        self.transition = None;
        let Some(next) = self.graph.get(to.as_str()).cloned() else {
            tracing::error!(scene = %to, "transition target missing from graph");
            return;
        };
        let departed = std::mem::replace(&mut self.scene, next);
        self.history.push(departed.id);
        self.arrive();
    }

    /// Scene-entry side effects: reset the step and per-scene state, then
    /// unlock the ending if this is the first visit.
    fn arrive(&mut self) {
        self.step = Step::Narration;
        self.session = None;
        if let Some(id) = self.conclusion.take() {
            self.scheduler.cancel(id);
        }
        self.in_scene_complete = false;
        tracing::info!(scene = %self.scene.id, title = %self.scene.title, "entered scene");

        if self.scene.is_ending && self.unlocks.record_if_new(&self.scene.id) {
            tracing::info!(ending = %self.scene.id, "new ending unlocked");
            if let Some(id) = self.notice_timer.take() {
                self.scheduler.cancel(id);
            }
            self.notice = Some(UnlockNotice {
                id: self.scene.id.clone(),
                title: self.scene.title.clone(),
            });
            self.notice_timer = Some(
                self.scheduler
                    .schedule(self.timings.notice(), Deferred::DismissNotice),
            );
        }
    }
}

impl NarrativeControllerBuilder {
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn scenes_file(mut self, path: &str) -> Self {
        self.scenes_file = Some(path.to_string());
        self
    }

    pub fn timings_file(mut self, path: &str) -> Self {
        self.timings_file = Some(path.to_string());
        self
    }

    pub fn field(mut self, field: Field) -> Self {
        self.field = field;
        self
    }

    /// Provide the graph directly (for testing without files).
    pub fn with_graph(mut self, graph: SceneGraph) -> Self {
        self.graph = Some(graph);
        self
    }

    /// Provide timings directly (for testing without files).
    pub fn with_timings(mut self, timings: Timings) -> Self {
        self.timings = Some(timings);
        self
    }

    pub fn build(self) -> Result<NarrativeController, ControllerError> {
        // An explicit graph wins over a file, which wins over the built-in story.
        let graph = match (self.graph, self.scenes_file) {
            (Some(graph), _) => graph,
            (None, Some(path)) => SceneGraph::load_from_ron(Path::new(&path))?,
            (None, None) => SceneGraph::carbon_journey()?,
        };
        let timings = match (self.timings, self.timings_file) {
            (Some(timings), _) => timings,
            (None, Some(path)) => Timings::load_from_ron(Path::new(&path))?,
            (None, None) => Timings::default(),
        };
        let scene = graph
            .get(graph.start().as_str())
            .cloned()
            .ok_or_else(|| SceneGraphError::UnknownStartScene(graph.start().clone()))?;

        tracing::info!(
            scenes = graph.len(),
            endings = graph.endings().count(),
            seed = self.seed,
            "narrative controller ready"
        );

        let mut controller = NarrativeController {
            unlocks: EndingUnlockRegistry::for_graph(&graph),
            engine: MiniGameEngine::new(self.seed, self.field),
            graph,
            timings,
            scheduler: Scheduler::new(),
            scene,
            step: Step::Narration,
            history: Vec::new(),
            transition: None,
            session: None,
            conclusion: None,
            in_scene_complete: false,
            notice: None,
            notice_timer: None,
        };
        controller.arrive();
        Ok(controller)
    }
}
