//! Core type definitions used throughout the codebase

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for units on the battlefield
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UnitId(pub Uuid);

impl UnitId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for UnitId {
    fn default() -> Self {
        Self::new()
    }
}

/// Arena index of an in-flight skill instance.
///
/// Instances are allocated in creation order, so a larger id always means
/// a later-created instance. Combo links rely on this ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SkillInstanceId(pub u32);

impl SkillInstanceId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Integer grid position on the battle board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct GridPos {
    pub x: i32,
    pub y: i32,
}

impl GridPos {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Chebyshev distance (diagonal moves cost 1)
    pub fn chebyshev(&self, other: &Self) -> i32 {
        (self.x - other.x).abs().max((self.y - other.y).abs())
    }

    /// The four orthogonal neighbors
    pub fn neighbors(&self) -> [GridPos; 4] {
        [
            GridPos::new(self.x + 1, self.y),
            GridPos::new(self.x - 1, self.y),
            GridPos::new(self.x, self.y + 1),
            GridPos::new(self.x, self.y - 1),
        ]
    }
}

/// The four principal directions used by straight-line ranges
pub const PRINCIPAL_DIRECTIONS: [(i32, i32); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

/// Attribute names understood by the attribute store
pub const ATTR_HP: &str = "hp";
pub const ATTR_MP: &str = "mp";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chebyshev_distance() {
        let a = GridPos::new(2, 2);
        let b = GridPos::new(3, 3);
        assert_eq!(a.chebyshev(&b), 1);
        assert_eq!(a.chebyshev(&GridPos::new(5, 2)), 3);
        assert_eq!(a.chebyshev(&a), 0);
    }

    #[test]
    fn test_instance_ids_order_by_creation() {
        assert!(SkillInstanceId(0) < SkillInstanceId(1));
    }
}
