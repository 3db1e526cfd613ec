/// EXCAVATE — dig through layered tiles to uncover a 2×2 fossil.
use rand::Rng;
use serde::Serialize;
use std::time::Duration;

use super::{Outcome, Progress, Simulation};
use crate::core::geometry::{Field, Point};
use crate::core::input::InputSnapshot;

pub const TILE_SIZE: f32 = 40.0;
pub const LAYERS: u8 = 3;
/// The fossil is a FOSSIL_SPAN × FOSSIL_SPAN block of tiles.
pub const FOSSIL_SPAN: usize = 2;
pub const FOSSIL_TILES: u32 = (FOSSIL_SPAN * FOSSIL_SPAN) as u32;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tile {
    pub col: usize,
    pub row: usize,
    pub layers: u8,
    pub fossil: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExcavateGame {
    pub cols: usize,
    pub rows: usize,
    /// Row-major.
    pub tiles: Vec<Tile>,
    /// Top-left cell of the fossil block.
    pub fossil_origin: (usize, usize),
    pub revealed: u32,
    pub finished: bool,
}

/// Pick the fossil's top-left cell away from the outer ring when the grid
/// is large enough, so the whole block always fits.
fn fossil_axis<R: Rng + ?Sized>(rng: &mut R, cells: usize) -> usize {
    if cells >= FOSSIL_SPAN + 1 {
        rng.gen_range(1..=cells - FOSSIL_SPAN)
    } else {
        0
    }
}

impl ExcavateGame {
    pub fn setup<R: Rng + ?Sized>(rng: &mut R, field: Field) -> Self {
        let cols = ((field.width / TILE_SIZE) as usize).max(FOSSIL_SPAN);
        let rows = ((field.height / TILE_SIZE) as usize).max(FOSSIL_SPAN);
        let origin = (fossil_axis(rng, cols), fossil_axis(rng, rows));
        Self::with_fossil(cols, rows, origin)
    }

    /// Build a grid with the fossil block at a known cell.
    pub fn with_fossil(cols: usize, rows: usize, origin: (usize, usize)) -> Self {
        let (fc, fr) = origin;
        let mut tiles = Vec::with_capacity(cols * rows);
        for row in 0..rows {
            for col in 0..cols {
                let fossil =
                    (fc..fc + FOSSIL_SPAN).contains(&col) && (fr..fr + FOSSIL_SPAN).contains(&row);
                tiles.push(Tile {
                    col,
                    row,
                    layers: LAYERS,
                    fossil,
                });
            }
        }
        Self {
            cols,
            rows,
            tiles,
            fossil_origin: origin,
            revealed: 0,
            finished: false,
        }
    }

    pub fn tile(&self, col: usize, row: usize) -> Option<&Tile> {
        if col < self.cols && row < self.rows {
            self.tiles.get(row * self.cols + col)
        } else {
            None
        }
    }

    /// Grid cell under a point, if any.
    pub fn cell_at(&self, p: Point) -> Option<(usize, usize)> {
        if p.x < 0.0 || p.y < 0.0 {
            return None;
        }
        let col = (p.x / TILE_SIZE) as usize;
        let row = (p.y / TILE_SIZE) as usize;
        (col < self.cols && row < self.rows).then_some((col, row))
    }

    /// Remove one layer from a tile. Digging an empty tile does nothing.
    pub fn dig(&mut self, col: usize, row: usize) -> Outcome {
        if self.finished || col >= self.cols || row >= self.rows {
            return Outcome::Continue;
        }
        let tile = &mut self.tiles[row * self.cols + col];
        if tile.layers == 0 {
            return Outcome::Continue;
        }
        tile.layers -= 1;
        if tile.layers == 0 && tile.fossil {
            self.revealed += 1;
            if self.revealed >= FOSSIL_TILES {
                self.finished = true;
                return Outcome::Win;
            }
        }
        Outcome::Continue
    }
}

impl Simulation for ExcavateGame {
    fn update(&mut self, _dt: Duration, input: &InputSnapshot) -> Outcome {
        match input.pointer_up.and_then(|p| self.cell_at(p)) {
            Some((col, row)) => self.dig(col, row),
            None => Outcome::Continue,
        }
    }

    fn is_finished(&self) -> bool {
        self.finished
    }

    fn progress(&self) -> Progress {
        Progress {
            score: self.revealed,
            target: FOSSIL_TILES,
        }
    }
}
