//! Shinobi Tactics - turn-based combat resolution core
//!
//! Skill selection, targeting, combo chaining, cost validation, effect
//! resolution, and turn-scoped buff decay. Rendering, widgets, and
//! animation playback live behind the seams in [`board`], [`unit::roster`]
//! and [`presentation`].

pub mod board;
pub mod core;
pub mod presentation;
pub mod skill;
pub mod unit;
