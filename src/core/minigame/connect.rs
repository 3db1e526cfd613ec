/// CONNECT — light up every node by clicking it once. Cannot be lost.
use rand::Rng;
use serde::Serialize;
use std::time::Duration;

use super::{Outcome, Progress, Simulation};
use crate::core::geometry::{Field, Point};
use crate::core::input::InputSnapshot;

pub const NODE_COUNT: usize = 12;
pub const NODE_MARGIN: f32 = 60.0;
pub const NODE_SPACING: f32 = 80.0;
pub const MAX_PLACEMENT_ATTEMPTS: u32 = 100;
pub const PICK_RADIUS: f32 = 30.0;
/// Nodes closer than this are joined in the background mesh.
pub const MESH_RANGE: f32 = 150.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Node {
    pub id: usize,
    pub center: Point,
    pub solved: bool,
    /// False when placement gave up and kept the last candidate.
    pub spaced: bool,
}

/// Scatter exactly [`NODE_COUNT`] nodes by rejection sampling.
///
/// A candidate must be at least [`NODE_SPACING`] from every node placed
/// before it. After [`MAX_PLACEMENT_ATTEMPTS`] failures the last candidate is
/// kept anyway (marked `spaced: false`) so the count is always exact.
pub fn scatter_nodes<R: Rng + ?Sized>(rng: &mut R, field: Field) -> Vec<Node> {
    let x_span = (field.width - 2.0 * NODE_MARGIN).max(0.0);
    let y_span = (field.height - 2.0 * NODE_MARGIN).max(0.0);
    let mut nodes: Vec<Node> = Vec::with_capacity(NODE_COUNT);

    for id in 0..NODE_COUNT {
        let mut candidate = Point::default();
        let mut spaced = false;
        for _ in 0..MAX_PLACEMENT_ATTEMPTS {
            candidate = Point::new(
                rng.gen::<f32>() * x_span + NODE_MARGIN,
                rng.gen::<f32>() * y_span + NODE_MARGIN,
            );
            if nodes
                .iter()
                .all(|n| n.center.distance(candidate) >= NODE_SPACING)
            {
                spaced = true;
                break;
            }
        }
        if !spaced {
            tracing::debug!(node = id, "node placement fell back to last candidate");
        }
        nodes.push(Node {
            id,
            center: candidate,
            solved: false,
            spaced,
        });
    }

    nodes
}

#[derive(Debug, Clone, Serialize)]
pub struct ConnectGame {
    pub field: Field,
    pub nodes: Vec<Node>,
    pub score: u32,
    pub target: u32,
    pub finished: bool,
}

impl ConnectGame {
    pub fn setup<R: Rng + ?Sized>(rng: &mut R, field: Field) -> Self {
        Self::with_nodes(field, scatter_nodes(rng, field))
    }

    pub fn with_nodes(field: Field, nodes: Vec<Node>) -> Self {
        let target = nodes.len() as u32;
        Self {
            field,
            nodes,
            score: 0,
            target,
            finished: false,
        }
    }

    /// Click at a point. Solves the nearest node within reach; a click on an
    /// already-solved node does nothing.
    pub fn click(&mut self, at: Point) -> Outcome {
        if self.finished {
            return Outcome::Continue;
        }
        let Some(node) = self
            .nodes
            .iter_mut()
            .filter(|n| n.center.distance(at) < PICK_RADIUS)
            .min_by(|a, b| a.center.distance(at).total_cmp(&b.center.distance(at)))
        else {
            return Outcome::Continue;
        };
        if node.solved {
            return Outcome::Continue;
        }
        node.solved = true;
        self.score += 1;
        if self.score >= self.target {
            self.finished = true;
            return Outcome::Win;
        }
        Outcome::Continue
    }

    /// Pairs of node indices joined in the cosmetic mesh.
    pub fn mesh(&self) -> Vec<(usize, usize)> {
        let mut edges = Vec::new();
        for (i, a) in self.nodes.iter().enumerate() {
            for (j, b) in self.nodes.iter().enumerate().skip(i + 1) {
                if a.center.distance(b.center) < MESH_RANGE {
                    edges.push((i, j));
                }
            }
        }
        edges
    }
}

impl Simulation for ConnectGame {
    fn update(&mut self, _dt: Duration, input: &InputSnapshot) -> Outcome {
        match input.pointer_down {
            Some(at) => self.click(at),
            None => Outcome::Continue,
        }
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

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn always_exactly_twelve_nodes_inside_margin() {
        let field = Field::default();
        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64(seed);
            let nodes = scatter_nodes(&mut rng, field);
            assert_eq!(nodes.len(), NODE_COUNT);
            for n in &nodes {
                assert!(n.center.x >= NODE_MARGIN && n.center.x <= field.width - NODE_MARGIN);
                assert!(n.center.y >= NODE_MARGIN && n.center.y <= field.height - NODE_MARGIN);
            }
        }
    }

    #[test]
    fn spaced_nodes_keep_their_distance() {
        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64(seed);
            let nodes = scatter_nodes(&mut rng, Field::default());
            for (i, a) in nodes.iter().enumerate() {
                for b in nodes.iter().skip(i + 1).filter(|b| b.spaced) {
                    assert!(a.center.distance(b.center) >= NODE_SPACING, "seed {}", seed);
                }
            }
        }
    }

    #[test]
    fn tiny_field_falls_back_but_keeps_count() {
        let mut rng = StdRng::seed_from_u64(9);
        let nodes = scatter_nodes(&mut rng, Field::new(200.0, 200.0));
        assert_eq!(nodes.len(), NODE_COUNT);
        assert!(nodes.iter().any(|n| !n.spaced));
    }

    #[test]
    fn clicking_all_nodes_wins_on_last() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut game = ConnectGame::setup(&mut rng, Field::default());
        let centers: Vec<Point> = game.nodes.iter().map(|n| n.center).collect();
        for (i, c) in centers.iter().enumerate() {
            let outcome = game.click(*c);
            if i + 1 == centers.len() {
                assert_eq!(outcome, Outcome::Win);
            } else {
                assert_eq!(outcome, Outcome::Continue);
            }
        }
        assert_eq!(game.click(centers[0]), Outcome::Continue);
        assert_eq!(game.score, NODE_COUNT as u32);
    }

    #[test]
    fn repeat_click_is_a_no_op() {
        let nodes = vec![
            Node {
                id: 0,
                center: Point::new(100.0, 100.0),
                solved: false,
                spaced: true,
            },
            Node {
                id: 1,
                center: Point::new(300.0, 100.0),
                solved: false,
                spaced: true,
            },
        ];
        let mut game = ConnectGame::with_nodes(Field::default(), nodes);
        assert_eq!(game.click(Point::new(110.0, 100.0)), Outcome::Continue);
        assert_eq!(game.click(Point::new(100.0, 90.0)), Outcome::Continue);
        assert_eq!(game.score, 1);
        assert_eq!(game.click(Point::new(200.0, 100.0)), Outcome::Continue);
        assert_eq!(game.score, 1);
    }

    #[test]
    fn mesh_joins_nearby_nodes() {
        let nodes = [(0.0, 0.0), (100.0, 0.0), (400.0, 0.0)]
            .iter()
            .enumerate()
            .map(|(id, &(x, y))| Node {
                id,
                center: Point::new(x, y),
                solved: false,
                spaced: true,
            })
            .collect();
        let game = ConnectGame::with_nodes(Field::default(), nodes);
        assert_eq!(game.mesh(), vec![(0, 1)]);
    }
}
