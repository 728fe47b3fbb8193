//! Live targeting: valid-cell computation and hover preview
//!
//! A session owns everything it touches on shared battlefield state: the
//! tiles it highlighted, the input claim, and the interaction layers it
//! suppressed. Teardown walks exactly those records, so nothing dangles
//! when a unit dies or a session is cancelled mid-hover.

use ahash::AHashSet;
use std::collections::VecDeque;

use crate::board::grid::{Board, TileHighlight};
use crate::core::types::{GridPos, SkillInstanceId, UnitId, PRINCIPAL_DIRECTIONS};
use crate::skill::definition::RangeShape;
use crate::unit::roster::{InteractionLayer, Roster};

/// An active targeting session for one skill instance
#[derive(Debug)]
pub struct TargetingSession {
    owner: SkillInstanceId,
    hover_range: i32,
    valid: AHashSet<GridPos>,
    focus: Option<GridPos>,
    preview: AHashSet<GridPos>,
    /// Tiles this session registered for input on
    registered: AHashSet<GridPos>,
    /// Units whose interaction layer was suppressed, with their prior layer
    suppressed: Vec<(UnitId, InteractionLayer)>,
    accepting_input: bool,
}

impl TargetingSession {
    /// Compute the valid target set, paint it, claim input, and raise all
    /// units to the pass-through layer (recording their prior layer).
    pub fn begin(
        owner: SkillInstanceId,
        shape: RangeShape,
        radius: i32,
        hover_range: i32,
        origin: GridPos,
        board: &mut dyn Board,
        roster: &mut dyn Roster,
    ) -> Self {
        let valid = match shape {
            RangeShape::Common => common_range(board, origin, radius),
            RangeShape::Straight => straight_range(board, origin, radius),
        };

        board.claim_input(owner);
        let registered: AHashSet<GridPos> = board.active_tiles().into_iter().collect();
        for pos in &valid {
            board.set_highlight(*pos, TileHighlight::InRange);
        }

        let mut suppressed = Vec::new();
        for unit in roster.units() {
            suppressed.push((unit, roster.interaction_layer(unit)));
            roster.set_interaction_layer(unit, InteractionLayer::PassThrough);
        }

        tracing::debug!(?owner, cells = valid.len(), "targeting session started");

        Self {
            owner,
            hover_range,
            valid,
            focus: None,
            preview: AHashSet::new(),
            registered,
            suppressed,
            accepting_input: true,
        }
    }

    pub fn focus(&self) -> Option<GridPos> {
        self.focus
    }

    /// Is this session currently listening for input on `pos`?
    pub fn listening(&self, pos: GridPos) -> bool {
        self.accepting_input && self.registered.contains(&pos)
    }

    /// Move the hover focus. The new preview is computed first, then tiles
    /// leaving it revert to the in-range coloring in the same operation, so
    /// no tile ever carries a stale or doubled highlight.
    pub fn set_focus(&mut self, board: &mut dyn Board, point: GridPos) {
        let new_preview: AHashSet<GridPos> = self
            .valid
            .iter()
            .copied()
            .filter(|p| p.chebyshev(&point) <= self.hover_range)
            .collect();

        for pos in self.preview.difference(&new_preview) {
            board.set_highlight(*pos, TileHighlight::InRange);
        }
        for pos in &new_preview {
            board.set_highlight(*pos, TileHighlight::Preview);
        }

        self.preview = new_preview;
        self.focus = Some(point);
    }

    /// Remove only the hover overlay, keeping the base range coloring
    pub fn clear_preview(&mut self, board: &mut dyn Board) {
        for pos in self.preview.drain() {
            board.set_highlight(pos, TileHighlight::InRange);
        }
    }

    /// Placement validity against the current board state
    pub fn check(&self, board: &dyn Board, focus: GridPos) -> bool {
        self.valid.contains(&focus) && board.contains(focus)
    }

    /// Stop accepting hover/click while a confirmation prompt is up
    pub fn suspend_input(&mut self, board: &mut dyn Board) {
        self.accepting_input = false;
        board.release_input(self.owner);
    }

    /// Resume accepting input after a soft validation failure
    pub fn resume_input(&mut self, board: &mut dyn Board) {
        board.claim_input(self.owner);
        self.accepting_input = true;
    }

    /// Remove every overlay and restore every suppressed unit layer.
    /// Safe on every exit path; the session is unusable afterwards.
    pub fn teardown(&mut self, board: &mut dyn Board, roster: &mut dyn Roster) {
        for pos in self.preview.drain() {
            board.set_highlight(pos, TileHighlight::Neutral);
        }
        for pos in self.valid.drain() {
            board.set_highlight(pos, TileHighlight::Neutral);
        }
        board.release_input(self.owner);
        self.registered.clear();
        for (unit, layer) in self.suppressed.drain(..) {
            if roster.contains(unit) {
                roster.set_interaction_layer(unit, layer);
            }
        }
        self.accepting_input = false;
        tracing::debug!(owner = ?self.owner, "targeting session torn down");
    }
}

/// All cells within `radius` of `origin` by board adjacency. Blocked cells
/// are targetable but do not extend the search (you cannot reach through a
/// standing unit).
fn common_range(board: &dyn Board, origin: GridPos, radius: i32) -> AHashSet<GridPos> {
    let mut valid = AHashSet::new();
    let mut seen = AHashSet::new();
    let mut frontier = VecDeque::new();
    seen.insert(origin);
    frontier.push_back((origin, 0));

    while let Some((pos, depth)) = frontier.pop_front() {
        if depth >= radius {
            continue;
        }
        for next in pos.neighbors() {
            if !board.contains(next) || !seen.insert(next) {
                continue;
            }
            valid.insert(next);
            if !board.is_blocked(next) {
                frontier.push_back((next, depth + 1));
            }
        }
    }
    valid
}

/// Cells along the four principal directions, stopping at (and including)
/// the first blocking cell in each line.
fn straight_range(board: &dyn Board, origin: GridPos, radius: i32) -> AHashSet<GridPos> {
    let mut valid = AHashSet::new();
    for (dx, dy) in PRINCIPAL_DIRECTIONS {
        for step in 1..=radius {
            let pos = GridPos::new(origin.x + dx * step, origin.y + dy * step);
            if !board.contains(pos) {
                break;
            }
            valid.insert(pos);
            if board.is_blocked(pos) {
                break;
            }
        }
    }
    valid
}
