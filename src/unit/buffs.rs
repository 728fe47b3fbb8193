//! Timed status effects and their turn-boundary decay
//!
//! Durations count owner turn-starts: an entry inserted at duration 0 is
//! reversed and removed at the owner's very next turn-start. Expiry and
//! decrement happen in one pass, so an expiring entry is never decremented.

use serde::{Deserialize, Serialize};

use crate::unit::roster::Attributes;

/// Reversible attribute modification carried by a buff
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuffEffect {
    pub attribute: String,
    pub delta: i32,
}

impl BuffEffect {
    pub fn new(attribute: impl Into<String>, delta: i32) -> Self {
        Self {
            attribute: attribute.into(),
            delta,
        }
    }

    pub fn apply(&self, attrs: &mut Attributes) {
        attrs.apply_delta(&self.attribute, self.delta);
    }

    pub fn undo(&self, attrs: &mut Attributes) {
        attrs.apply_delta(&self.attribute, -self.delta);
    }
}

/// A buff attached to a unit, expiring after `duration` further turn-starts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuffEntry {
    pub effect: BuffEffect,
    pub duration: i32,
}

impl BuffEntry {
    pub fn new(effect: BuffEffect, duration: i32) -> Self {
        Self { effect, duration }
    }
}

/// Per-unit collection of timed buffs
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuffLedger {
    entries: Vec<BuffEntry>,
}

impl BuffLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a buff, applying its forward effect immediately
    pub fn insert(&mut self, entry: BuffEntry, attrs: &mut Attributes) {
        entry.effect.apply(attrs);
        self.entries.push(entry);
    }

    /// Turn-start pass: undo and remove expired entries, then decrement
    /// the survivors. One pass, so removal wins over decrement.
    pub fn turn_start(&mut self, attrs: &mut Attributes) {
        let mut remaining = Vec::with_capacity(self.entries.len());
        for entry in self.entries.drain(..) {
            if entry.duration <= 0 {
                entry.effect.undo(attrs);
            } else {
                remaining.push(entry);
            }
        }
        for entry in &mut remaining {
            entry.duration -= 1;
        }
        self.entries = remaining;
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn entries(&self) -> &[BuffEntry] {
        &self.entries
    }
}
