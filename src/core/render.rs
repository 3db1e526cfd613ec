/// Render collaborator — turns mini-game state into pictures.
///
/// The engine never depends on a renderer succeeding: it simulates first,
/// then offers the frame. A failed draw drops that frame and nothing else.
use thiserror::Error;

use crate::core::geometry::Point;
use crate::core::minigame::{MiniGame, Outcome, Simulation};

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("render target unavailable")]
    TargetUnavailable,
    #[error("frame encoding failed: {0}")]
    Encode(String),
}

/// What a renderer receives once per frame.
#[derive(Debug)]
pub struct Frame<'a> {
    pub game: &'a MiniGame,
    /// Set once the game has produced its result.
    pub outcome: Option<Outcome>,
}

pub trait FrameRenderer {
    fn draw(&mut self, frame: &Frame<'_>) -> Result<(), RenderError>;
}

/// Renderer for headless runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullRenderer;

impl FrameRenderer for NullRenderer {
    fn draw(&mut self, _frame: &Frame<'_>) -> Result<(), RenderError> {
        Ok(())
    }
}

/// ASCII rasterizer used by the terminal shell.
///
/// Each character cell covers `cell` × `cell * 2` play-field units, since
/// terminal glyphs are roughly twice as tall as they are wide.
#[derive(Debug, Clone)]
pub struct TextRenderer {
    cell: f32,
    last: Option<String>,
}

impl Default for TextRenderer {
    fn default() -> Self {
        Self::new(10.0)
    }
}

impl TextRenderer {
    pub fn new(cell: f32) -> Self {
        Self { cell, last: None }
    }

    /// The most recently drawn picture.
    pub fn last(&self) -> Option<&str> {
        self.last.as_deref()
    }

    fn to_cell(&self, p: Point) -> (usize, usize) {
        (
            (p.x / self.cell).max(0.0) as usize,
            (p.y / (self.cell * 2.0)).max(0.0) as usize,
        )
    }

    fn rasterize(&self, frame: &Frame<'_>) -> String {
        let (cols, rows, mut grid) = match frame.game {
            MiniGame::Excavate(g) => {
                let mut grid = vec![vec![' '; g.cols]; g.rows];
                for t in &g.tiles {
                    grid[t.row][t.col] = match (t.layers, t.fossil) {
                        (0, true) => 'F',
                        (0, false) => '.',
                        (n, _) => char::from_digit(n as u32, 10).unwrap_or('?'),
                    };
                }
                (g.cols, g.rows, grid)
            }
            MiniGame::Dodge(g) => self.blank(g.field.width, g.field.height),
            MiniGame::Collect(g) => self.blank(g.field.width, g.field.height),
            MiniGame::Connect(g) => self.blank(g.field.width, g.field.height),
        };

        let mut plot = |p: Point, c: char| {
            let (x, y) = self.to_cell(p);
            if y < rows && x < cols {
                grid[y][x] = c;
            }
        };

        match frame.game {
            MiniGame::Dodge(g) => {
                for col in 0..cols {
                    let x = col as f32 * self.cell;
                    if x >= g.goal_x {
                        for row in 0..rows {
                            plot(Point::new(x, row as f32 * self.cell * 2.0), '|');
                        }
                    }
                }
                for h in &g.hazards {
                    plot(h.center, h.look.glyph());
                }
                for p in &g.trail {
                    plot(*p, '~');
                }
                plot(g.token, 'A');
            }
            MiniGame::Collect(g) => {
                for p in g.pickups.iter().filter(|p| p.active) {
                    plot(p.center, '+');
                }
                plot(g.token, 'C');
            }
            MiniGame::Connect(g) => {
                for n in &g.nodes {
                    plot(n.center, if n.solved { '@' } else { 'o' });
                }
            }
            MiniGame::Excavate(_) => {}
        }

        let progress = frame.game.progress();
        let mut out = format!(
            "[{}] {}/{}",
            frame.game.kind().label(),
            progress.score,
            progress.target
        );
        match frame.outcome {
            Some(Outcome::Win) => out.push_str("  SUCCESS!"),
            Some(Outcome::Lose) => out.push_str("  FAILED - try again..."),
            _ => {}
        }
        out.push('\n');
        for row in grid {
            out.extend(row);
            out.push('\n');
        }
        out
    }

    fn blank(&self, width: f32, height: f32) -> (usize, usize, Vec<Vec<char>>) {
        let cols = (width / self.cell).ceil() as usize;
        let rows = (height / (self.cell * 2.0)).ceil() as usize;
        (cols, rows, vec![vec![' '; cols]; rows])
    }
}

impl FrameRenderer for TextRenderer {
    fn draw(&mut self, frame: &Frame<'_>) -> Result<(), RenderError> {
        self.last = Some(self.rasterize(frame));
        Ok(())
    }
}
