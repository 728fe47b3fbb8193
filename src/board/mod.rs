//! Battlefield board: tiles, highlights, input ownership

pub mod grid;

pub use grid::{Board, GridBoard, TileHighlight};
