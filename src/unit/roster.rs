//! Unit registry seam and the in-memory squad implementation
//!
//! Attribute clamping lives here, not in the combat core: the store clamps
//! every delta to `0..=max` for the attribute.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::core::types::{GridPos, UnitId};
use crate::skill::definition::SkillDefId;
use crate::unit::buffs::{BuffEntry, BuffLedger};

/// Whether a unit intercepts pointer input or lets it pass to the board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum InteractionLayer {
    #[default]
    Selectable,
    PassThrough,
}

/// Named numeric attributes with per-attribute maxima
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Attributes {
    values: AHashMap<String, i32>,
    maxima: AHashMap<String, i32>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn define(&mut self, name: &str, value: i32, max: i32) {
        self.values.insert(name.to_string(), value);
        self.maxima.insert(name.to_string(), max);
    }

    pub fn get(&self, name: &str) -> i32 {
        self.values.get(name).copied().unwrap_or(0)
    }

    /// Apply a delta, clamped to `0..=max`
    pub fn apply_delta(&mut self, name: &str, delta: i32) {
        let max = self.maxima.get(name).copied().unwrap_or(i32::MAX);
        if let Some(value) = self.values.get_mut(name) {
            *value = (*value + delta).clamp(0, max);
        }
    }
}

/// Unit registry and attribute store seam
pub trait Roster {
    fn units(&self) -> Vec<UnitId>;
    fn contains(&self, unit: UnitId) -> bool;
    fn position(&self, unit: UnitId) -> Option<GridPos>;
    fn faction(&self, unit: UnitId) -> Option<u8>;
    fn interaction_layer(&self, unit: UnitId) -> InteractionLayer;
    fn set_interaction_layer(&mut self, unit: UnitId, layer: InteractionLayer);
    fn attribute(&self, unit: UnitId, name: &str) -> i32;
    fn apply_delta(&mut self, unit: UnitId, name: &str, delta: i32);
    fn insert_buff(&mut self, unit: UnitId, entry: BuffEntry);
    fn known_skills(&self, unit: UnitId) -> Vec<SkillDefId>;
    /// Per-unit turn-start: buff decay pass plus acted-flag reset
    fn turn_start(&mut self, unit: UnitId);
    /// Remove a destroyed unit from the registry
    fn remove(&mut self, unit: UnitId);
}

#[derive(Debug, Clone)]
struct UnitState {
    name: String,
    pos: GridPos,
    faction: u8,
    layer: InteractionLayer,
    acted: bool,
    attrs: Attributes,
    buffs: BuffLedger,
    known: Vec<SkillDefId>,
}

/// In-memory roster used by tests and the demo
#[derive(Debug, Clone, Default)]
pub struct Squad {
    units: AHashMap<UnitId, UnitState>,
    order: Vec<UnitId>,
}

impl Squad {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn(&mut self, name: &str, pos: GridPos, faction: u8, hp: i32, mp: i32) -> UnitId {
        let id = UnitId::new();
        let mut attrs = Attributes::new();
        attrs.define(crate::core::types::ATTR_HP, hp, hp);
        attrs.define(crate::core::types::ATTR_MP, mp, mp);
        self.units.insert(
            id,
            UnitState {
                name: name.to_string(),
                pos,
                faction,
                layer: InteractionLayer::Selectable,
                acted: false,
                attrs,
                buffs: BuffLedger::new(),
                known: Vec::new(),
            },
        );
        self.order.push(id);
        id
    }

    pub fn learn(&mut self, unit: UnitId, skill: SkillDefId) {
        if let Some(state) = self.units.get_mut(&unit) {
            state.known.push(skill);
        }
    }

    pub fn name(&self, unit: UnitId) -> Option<&str> {
        self.units.get(&unit).map(|s| s.name.as_str())
    }

    pub fn set_position(&mut self, unit: UnitId, pos: GridPos) {
        if let Some(state) = self.units.get_mut(&unit) {
            state.pos = pos;
        }
    }

    pub fn has_acted(&self, unit: UnitId) -> bool {
        self.units.get(&unit).map(|s| s.acted).unwrap_or(false)
    }

    /// Mark the unit's activation finished for this round
    pub fn mark_acted(&mut self, unit: UnitId) {
        if let Some(state) = self.units.get_mut(&unit) {
            state.acted = true;
        }
    }

    pub fn buffs(&self, unit: UnitId) -> Option<&BuffLedger> {
        self.units.get(&unit).map(|s| &s.buffs)
    }
}

impl Roster for Squad {
    fn units(&self) -> Vec<UnitId> {
        self.order.clone()
    }

    fn contains(&self, unit: UnitId) -> bool {
        self.units.contains_key(&unit)
    }

    fn position(&self, unit: UnitId) -> Option<GridPos> {
        self.units.get(&unit).map(|s| s.pos)
    }

    fn faction(&self, unit: UnitId) -> Option<u8> {
        self.units.get(&unit).map(|s| s.faction)
    }

    fn interaction_layer(&self, unit: UnitId) -> InteractionLayer {
        self.units
            .get(&unit)
            .map(|s| s.layer)
            .unwrap_or_default()
    }

    fn set_interaction_layer(&mut self, unit: UnitId, layer: InteractionLayer) {
        if let Some(state) = self.units.get_mut(&unit) {
            state.layer = layer;
        }
    }

    fn attribute(&self, unit: UnitId, name: &str) -> i32 {
        self.units.get(&unit).map(|s| s.attrs.get(name)).unwrap_or(0)
    }

    fn apply_delta(&mut self, unit: UnitId, name: &str, delta: i32) {
        if let Some(state) = self.units.get_mut(&unit) {
            state.attrs.apply_delta(name, delta);
        }
    }

    fn insert_buff(&mut self, unit: UnitId, entry: BuffEntry) {
        if let Some(state) = self.units.get_mut(&unit) {
            state.buffs.insert(entry, &mut state.attrs);
        }
    }

    fn known_skills(&self, unit: UnitId) -> Vec<SkillDefId> {
        self.units
            .get(&unit)
            .map(|s| s.known.clone())
            .unwrap_or_default()
    }

    fn turn_start(&mut self, unit: UnitId) {
        if let Some(state) = self.units.get_mut(&unit) {
            state.acted = false;
            state.buffs.turn_start(&mut state.attrs);
        }
    }

    fn remove(&mut self, unit: UnitId) {
        if let Some(state) = self.units.remove(&unit) {
            tracing::debug!(unit = %state.name, "unit destroyed, removed from roster");
        }
        self.order.retain(|u| *u != unit);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{ATTR_HP, ATTR_MP};

    #[test]
    fn test_attribute_deltas_clamp() {
        let mut squad = Squad::new();
        let id = squad.spawn("Kaito", GridPos::new(0, 0), 0, 50, 30);
        squad.apply_delta(id, ATTR_HP, -80);
        assert_eq!(squad.attribute(id, ATTR_HP), 0);
        squad.apply_delta(id, ATTR_MP, 100);
        assert_eq!(squad.attribute(id, ATTR_MP), 30);
    }

    #[test]
    fn test_turn_start_resets_acted_and_ticks_buffs() {
        use crate::unit::buffs::{BuffEffect, BuffEntry};

        let mut squad = Squad::new();
        let id = squad.spawn("Kaito", GridPos::new(0, 0), 0, 50, 30);
        squad.mark_acted(id);
        squad.insert_buff(id, BuffEntry::new(BuffEffect::new(ATTR_MP, -10), 0));
        assert_eq!(squad.attribute(id, ATTR_MP), 20);

        squad.turn_start(id);
        assert!(!squad.has_acted(id));
        assert_eq!(squad.attribute(id, ATTR_MP), 30);
        assert!(squad.buffs(id).unwrap().is_empty());
    }

    #[test]
    fn test_remove_forgets_unit() {
        let mut squad = Squad::new();
        let id = squad.spawn("Kaito", GridPos::new(0, 0), 0, 50, 30);
        squad.remove(id);
        assert!(!squad.contains(id));
        assert!(squad.units().is_empty());
    }
}
