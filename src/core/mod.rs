pub mod controller;
pub mod geometry;
pub mod graph;
pub mod input;
pub mod minigame;
pub mod render;
pub mod timer;
pub mod unlocks;
