/// COLLECT — steer a token over every pickup. Cannot be lost.
use rand::Rng;
use serde::Serialize;
use std::time::Duration;

use super::{Outcome, Progress, Simulation};
use crate::core::geometry::{Field, Point};
use crate::core::input::{InputSnapshot, Key};

pub const PICKUP_COUNT: usize = 5;
pub const PICKUP_MARGIN: f32 = 20.0;
/// Center-to-center distance below which a pickup is collected.
pub const PICKUP_REACH: f32 = 30.0;
pub const TOKEN_SIZE: f32 = 20.0;
/// Units per second; 4 units per frame at 60 Hz.
pub const TOKEN_SPEED: f32 = 240.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Pickup {
    pub center: Point,
    pub active: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct CollectGame {
    pub field: Field,
    /// Center of the square token.
    pub token: Point,
    pub pickups: Vec<Pickup>,
    pub score: u32,
    pub target: u32,
    pub finished: bool,
}

impl CollectGame {
    pub fn setup<R: Rng + ?Sized>(rng: &mut R, field: Field) -> Self {
        let x_span = (field.width - 2.0 * PICKUP_MARGIN).max(0.0);
        let y_span = (field.height - 2.0 * PICKUP_MARGIN).max(0.0);
        let pickups = (0..PICKUP_COUNT)
            .map(|_| {
                Point::new(
                    rng.gen::<f32>() * x_span + PICKUP_MARGIN,
                    rng.gen::<f32>() * y_span + PICKUP_MARGIN,
                )
            })
            .collect();
        Self::with_pickups(field, pickups)
    }

    /// Build a game over known pickup positions; the token starts centered.
    pub fn with_pickups(field: Field, positions: Vec<Point>) -> Self {
        let target = positions.len() as u32;
        Self {
            field,
            token: field.center(),
            pickups: positions
                .into_iter()
                .map(|center| Pickup {
                    center,
                    active: true,
                })
                .collect(),
            score: 0,
            target,
            finished: false,
        }
    }

    fn heading(input: &InputSnapshot) -> (f32, f32) {
        let axis = |neg: Key, pos: Key| {
            let mut v = 0.0;
            if input.is_held(neg) {
                v -= 1.0;
            }
            if input.is_held(pos) {
                v += 1.0;
            }
            v
        };
        (axis(Key::Left, Key::Right), axis(Key::Up, Key::Down))
    }
}

impl Simulation for CollectGame {
    fn update(&mut self, dt: Duration, input: &InputSnapshot) -> Outcome {
        if self.finished {
            return Outcome::Continue;
        }

        let (dx, dy) = Self::heading(input);
        let step = TOKEN_SPEED * dt.as_secs_f32();
        let moved = Point::new(self.token.x + dx * step, self.token.y + dy * step);
        self.token = self.field.clamp_inset(moved, TOKEN_SIZE / 2.0);

        for pickup in self.pickups.iter_mut().filter(|p| p.active) {
            if self.token.distance(pickup.center) < PICKUP_REACH {
                pickup.active = false;
                self.score += 1;
            }
        }

        if self.score >= self.target {
            self.finished = true;
            return Outcome::Win;
        }
        Outcome::Continue
    }

    fn is_finished(&self) -> bool {
        self.finished
    }

    fn progress(&self) -> Progress {
        Progress {
            score: self.score,
            target: self.target,
        }
    }
}
