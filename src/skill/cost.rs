//! Resource-cost validation and deduction
//!
//! `can_afford` is pure; `apply_cost` is the only mutating step and must
//! run exactly once per resolved action or chain (the state machine routes
//! it through the origin skill).

use crate::core::types::{UnitId, ATTR_HP, ATTR_MP};
use crate::skill::definition::SkillCost;
use crate::unit::roster::Roster;

/// Sum a skill's cost with its optional chained skill's cost
pub fn combined_cost(own: SkillCost, chained: Option<SkillCost>) -> SkillCost {
    let extra = chained.unwrap_or_default();
    SkillCost {
        hp: own.hp + extra.hp,
        mp: own.mp + extra.mp,
    }
}

/// True iff the combined cost fits the requester's current pools
pub fn can_afford(
    current_hp: i32,
    current_mp: i32,
    own: SkillCost,
    chained: Option<SkillCost>,
) -> bool {
    let total = combined_cost(own, chained);
    total.mp <= current_mp && total.hp <= current_hp
}

/// Deduct the cost from the unit's pools through the attribute seam
pub fn apply_cost(roster: &mut dyn Roster, unit: UnitId, cost: SkillCost) {
    roster.apply_delta(unit, ATTR_HP, -cost.hp);
    roster.apply_delta(unit, ATTR_MP, -cost.mp);
}
