/// DODGE — drag a token across a hazard field to the exit strip.
use rand::Rng;
use serde::Serialize;
use std::collections::VecDeque;
use std::time::Duration;

use super::{Outcome, Progress, Simulation};
use crate::core::geometry::{Field, Point};
use crate::core::input::InputSnapshot;

pub const HAZARD_COUNT: usize = 10;
/// Minimum clearance between the rims of two hazards.
pub const HAZARD_GAP: f32 = 80.0;
pub const MAX_PLACEMENT_ATTEMPTS: u32 = 1000;
/// Fraction of a hazard's drawn radius that actually collides.
pub const HITBOX_SCALE: f32 = 0.7;
pub const TOKEN_RADIUS: f32 = 15.0;
/// Grab radius as a multiple of the token radius.
pub const GRAB_FACTOR: f32 = 4.0;
pub const GOAL_WIDTH: f32 = 80.0;
pub const TRAIL_LENGTH: usize = 30;
const TOKEN_START_X: f32 = 50.0;
/// Hazards never spawn left of this line so the start stays clear.
const CLEAR_ZONE: f32 = 100.0;
const MIN_HAZARD_SIZE: f32 = 30.0;
const HAZARD_SIZE_SPREAD: f32 = 30.0;

/// Cosmetic look of a hazard; does not affect collision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HazardLook {
    Rock,
    Moon,
    Comet,
    Planet,
}

impl HazardLook {
    const ALL: [HazardLook; 4] = [Self::Rock, Self::Moon, Self::Comet, Self::Planet];

    pub fn glyph(&self) -> char {
        match self {
            Self::Rock => '#',
            Self::Moon => 'o',
            Self::Comet => '*',
            Self::Planet => '@',
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Hazard {
    pub center: Point,
    /// Drawn diameter.
    pub size: f32,
    pub look: HazardLook,
}

impl Hazard {
    pub fn hitbox_radius(&self) -> f32 {
        self.size / 2.0 * HITBOX_SCALE
    }
}

/// Place up to [`HAZARD_COUNT`] hazards by rejection sampling.
///
/// A candidate is accepted only if its center is at least
/// `size/2 + other.size/2 + HAZARD_GAP` from every hazard accepted so far.
/// A hazard that cannot be placed within [`MAX_PLACEMENT_ATTEMPTS`] is
/// skipped, so crowded fields yield fewer hazards instead of looping.
pub fn scatter_hazards<R: Rng + ?Sized>(rng: &mut R, field: Field) -> Vec<Hazard> {
    let mut hazards: Vec<Hazard> = Vec::with_capacity(HAZARD_COUNT);
    let x_span = (field.width - CLEAR_ZONE - 50.0).max(1.0);
    let y_span = (field.height - 60.0).max(1.0);

    for _ in 0..HAZARD_COUNT {
        let mut placed = None;
        for _ in 0..MAX_PLACEMENT_ATTEMPTS {
            let center = Point::new(
                rng.gen::<f32>() * x_span + CLEAR_ZONE,
                rng.gen::<f32>() * y_span + 30.0,
            );
            let size = rng.gen::<f32>() * HAZARD_SIZE_SPREAD + MIN_HAZARD_SIZE;
            let clear = hazards.iter().all(|other| {
                center.distance(other.center) >= size / 2.0 + other.size / 2.0 + HAZARD_GAP
            });
            if clear {
                placed = Some((center, size));
                break;
            }
        }
        if let Some((center, size)) = placed {
            let look = HazardLook::ALL[rng.gen_range(0..HazardLook::ALL.len())];
            hazards.push(Hazard { center, size, look });
        }
    }

    hazards
}

#[derive(Debug, Clone, Serialize)]
pub struct DodgeGame {
    pub field: Field,
    pub token: Point,
    pub token_radius: f32,
    pub dragging: bool,
    pub hazards: Vec<Hazard>,
    /// Recent token positions, oldest first. Cosmetic only.
    pub trail: VecDeque<Point>,
    /// Crossing this x-coordinate wins.
    pub goal_x: f32,
    pub finished: bool,
}

impl DodgeGame {
    pub fn setup<R: Rng + ?Sized>(rng: &mut R, field: Field) -> Self {
        let hazards = scatter_hazards(rng, field);
        Self::with_hazards(field, hazards)
    }

    /// Build a game over a known hazard layout.
    pub fn with_hazards(field: Field, hazards: Vec<Hazard>) -> Self {
        Self {
            field,
            token: Point::new(TOKEN_START_X, field.height / 2.0),
            token_radius: TOKEN_RADIUS,
            dragging: false,
            hazards,
            trail: VecDeque::with_capacity(TRAIL_LENGTH),
            goal_x: field.width - GOAL_WIDTH,
            finished: false,
        }
    }

    fn touches_hazard(&self) -> bool {
        self.hazards
            .iter()
            .any(|h| self.token.distance(h.center) < self.token_radius + h.hitbox_radius())
    }

    fn move_token(&mut self, to: Point) {
        self.token = self.field.clamp_inset(to, self.token_radius);
        self.trail.push_back(self.token);
        if self.trail.len() > TRAIL_LENGTH {
            self.trail.pop_front();
        }
    }
}

impl Simulation for DodgeGame {
    fn update(&mut self, _dt: Duration, input: &InputSnapshot) -> Outcome {
        if self.finished {
            return Outcome::Continue;
        }

        if let Some(p) = input.pointer_down {
            if p.distance(self.token) < self.token_radius * GRAB_FACTOR {
                self.dragging = true;
            }
        }

        if self.dragging {
            if let Some(to) = input.pointer_move {
                self.move_token(to);
                if self.token.x > self.goal_x {
                    self.finished = true;
                    return Outcome::Win;
                }
            }
            if self.touches_hazard() {
                self.finished = true;
                return Outcome::Lose;
            }
        }

        if input.pointer_up.is_some() {
            self.dragging = false;
        }

        Outcome::Continue
    }

    fn is_finished(&self) -> bool {
        self.finished
    }

    fn progress(&self) -> Progress {
        let reached = (self.token.x / self.goal_x * 100.0).clamp(0.0, 100.0) as u32;
        Progress {
            score: reached,
            target: 100,
        }
    }
}
