//! Battle board seam and the grid implementation used by tests and the demo

use ahash::{AHashMap, AHashSet};
use serde::{Deserialize, Serialize};

use crate::core::types::{GridPos, SkillInstanceId};

/// Highlight state of a single tile.
///
/// `InRange` is the base coloring of a valid target tile; `Preview` is the
/// hover overlay on top of it. A tile is never both at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TileHighlight {
    #[default]
    Neutral,
    InRange,
    Preview,
}

/// Battlefield seam consumed by targeting and the skill engine.
///
/// Input claiming replaces per-tile event subscriptions: exactly one
/// targeting session may receive hover/click input at a time, and a new
/// session may not claim until the previous one has released.
pub trait Board {
    fn active_tiles(&self) -> Vec<GridPos>;
    fn contains(&self, pos: GridPos) -> bool;
    fn is_blocked(&self, pos: GridPos) -> bool;
    fn set_highlight(&mut self, pos: GridPos, state: TileHighlight);
    fn highlight(&self, pos: GridPos) -> TileHighlight;

    /// Claim exclusive input delivery for a session.
    ///
    /// Panics if another session still holds the claim: overlapping
    /// ownership of the highlight layer is a caller contract violation.
    fn claim_input(&mut self, session: SkillInstanceId);
    fn release_input(&mut self, session: SkillInstanceId);
    fn input_claimant(&self) -> Option<SkillInstanceId>;
}

/// Rectangular grid board with removable tiles and blocking cells
#[derive(Debug, Clone, Default)]
pub struct GridBoard {
    width: i32,
    height: i32,
    removed: AHashSet<GridPos>,
    blocked: AHashSet<GridPos>,
    highlights: AHashMap<GridPos, TileHighlight>,
    input_claimant: Option<SkillInstanceId>,
}

impl GridBoard {
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            width,
            height,
            ..Default::default()
        }
    }

    /// Remove a tile from play (chasm, destroyed floor)
    pub fn remove_tile(&mut self, pos: GridPos) {
        self.removed.insert(pos);
    }

    /// Mark or unmark a cell as blocking (occupied by a unit or obstacle)
    pub fn set_blocked(&mut self, pos: GridPos, blocked: bool) {
        if blocked {
            self.blocked.insert(pos);
        } else {
            self.blocked.remove(&pos);
        }
    }
}

impl Board for GridBoard {
    fn active_tiles(&self) -> Vec<GridPos> {
        let mut tiles = Vec::with_capacity((self.width * self.height) as usize);
        for x in 0..self.width {
            for y in 0..self.height {
                let pos = GridPos::new(x, y);
                if !self.removed.contains(&pos) {
                    tiles.push(pos);
                }
            }
        }
        tiles
    }

    fn contains(&self, pos: GridPos) -> bool {
        pos.x >= 0
            && pos.y >= 0
            && pos.x < self.width
            && pos.y < self.height
            && !self.removed.contains(&pos)
    }

    fn is_blocked(&self, pos: GridPos) -> bool {
        self.blocked.contains(&pos)
    }

    fn set_highlight(&mut self, pos: GridPos, state: TileHighlight) {
        if state == TileHighlight::Neutral {
            self.highlights.remove(&pos);
        } else {
            self.highlights.insert(pos, state);
        }
    }

    fn highlight(&self, pos: GridPos) -> TileHighlight {
        self.highlights.get(&pos).copied().unwrap_or_default()
    }

    fn claim_input(&mut self, session: SkillInstanceId) {
        if let Some(holder) = self.input_claimant {
            assert!(
                holder == session,
                "targeting input already claimed by {holder:?}, refused claim by {session:?}"
            );
            return;
        }
        self.input_claimant = Some(session);
    }

    fn release_input(&mut self, session: SkillInstanceId) {
        if self.input_claimant == Some(session) {
            self.input_claimant = None;
        }
    }

    fn input_claimant(&self) -> Option<SkillInstanceId> {
        self.input_claimant
    }
}
