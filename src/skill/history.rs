//! Per-unit undo stacks of in-flight skill instances
//!
//! The stack doubles as a commit lock: once a skill commits, the unit's
//! trail is cleared so nothing earlier can be undone.

use ahash::AHashMap;

use crate::core::types::{SkillInstanceId, UnitId};

#[derive(Debug, Clone, Default)]
pub struct ActionHistory {
    stacks: AHashMap<UnitId, Vec<SkillInstanceId>>,
}

impl ActionHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, unit: UnitId, id: SkillInstanceId) {
        self.stacks.entry(unit).or_default().push(id);
    }

    /// Pop the most recent in-flight skill.
    ///
    /// Panics when the unit's stack is empty: popping without a pending
    /// action is a caller contract violation, not a recoverable state.
    pub fn pop(&mut self, unit: UnitId) -> SkillInstanceId {
        self.stacks
            .get_mut(&unit)
            .and_then(|s| s.pop())
            .expect("action history popped while empty")
    }

    pub fn peek(&self, unit: UnitId) -> Option<SkillInstanceId> {
        self.stacks.get(&unit).and_then(|s| s.last().copied())
    }

    /// Commit lock: discard the unit's whole undo trail
    pub fn clear(&mut self, unit: UnitId) {
        self.stacks.remove(&unit);
    }

    pub fn len(&self, unit: UnitId) -> usize {
        self.stacks.get(&unit).map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self, unit: UnitId) -> bool {
        self.len(unit) == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifo_order() {
        let mut history = ActionHistory::new();
        let unit = UnitId::new();
        history.push(unit, SkillInstanceId(0));
        history.push(unit, SkillInstanceId(1));
        assert_eq!(history.peek(unit), Some(SkillInstanceId(1)));
        assert_eq!(history.pop(unit), SkillInstanceId(1));
        assert_eq!(history.pop(unit), SkillInstanceId(0));
        assert!(history.is_empty(unit));
    }

    #[test]
    fn test_clear_discards_trail() {
        let mut history = ActionHistory::new();
        let unit = UnitId::new();
        history.push(unit, SkillInstanceId(0));
        history.push(unit, SkillInstanceId(1));
        history.clear(unit);
        assert!(history.is_empty(unit));
    }

    #[test]
    #[should_panic(expected = "popped while empty")]
    fn test_pop_empty_panics() {
        let mut history = ActionHistory::new();
        history.pop(UnitId::new());
    }
}
