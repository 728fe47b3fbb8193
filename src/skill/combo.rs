//! Combo chain rules
//!
//! A chain is at most two instances: origin -> chained. The roles are
//! mutually exclusive per instance and a link always points at a
//! later-created instance, so the structure cannot cycle or grow.

use crate::core::types::SkillInstanceId;
use crate::skill::arena::SkillArena;

/// Attach `chained` as the combo continuation of `origin`.
///
/// Under a `Must` policy this attachment is the only legal exit from the
/// selection sub-state. Violating the chain shape is a programming error
/// and panics rather than corrupting the chain.
pub fn attach(arena: &mut SkillArena, origin: SkillInstanceId, chained: SkillInstanceId) {
    assert!(
        chained > origin,
        "combo link must point at a later-created instance"
    );
    let (first, second) = arena.pair_mut(origin, chained);
    assert!(
        first.combo.is_none(),
        "origin already has a combo skill attached"
    );
    assert!(
        first.origin.is_none(),
        "a combo continuation cannot open its own chain"
    );
    assert!(
        second.origin.is_none() && second.combo.is_none(),
        "chained instance is already linked"
    );
    first.combo = Some(chained);
    second.origin = Some(origin);
    tracing::debug!(?origin, ?chained, "combo chain linked");
}

/// The animation id the origin plays at commit: the chained skill's
/// declared animation when a chain exists, its own otherwise.
pub fn committed_anim_id(arena: &SkillArena, origin: SkillInstanceId) -> i32 {
    let inst = arena.instance(origin);
    match inst.combo {
        Some(chained) => arena.instance(chained).def.anim_id,
        None => inst.def.anim_id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::UnitId;
    use crate::skill::definition::{
        ComboPolicy, RangeShape, SkillClass, SkillCost, SkillDef, SkillDefId, SkillKind,
    };

    fn def(id: &str, anim_id: i32) -> SkillDef {
        SkillDef {
            id: SkillDefId::new(id),
            name: id.to_string(),
            description: String::new(),
            kind: SkillKind::Attack,
            class: SkillClass::Ninjutsu,
            cost: SkillCost::default(),
            range: 1,
            hover_range: 0,
            rate: 100,
            power: 1,
            combo: ComboPolicy::Must,
            shape: RangeShape::Common,
            anim_id,
            buff: None,
        }
    }

    #[test]
    fn test_attach_links_both_sides() {
        let mut arena = SkillArena::new();
        let caster = UnitId::new();
        let origin = arena.alloc(caster, def("y", 4));
        let chained = arena.alloc(caster, def("z", 7));
        attach(&mut arena, origin, chained);
        assert_eq!(arena.instance(origin).combo, Some(chained));
        assert_eq!(arena.instance(chained).origin, Some(origin));
    }

    #[test]
    fn test_origin_plays_chained_animation() {
        let mut arena = SkillArena::new();
        let caster = UnitId::new();
        let origin = arena.alloc(caster, def("y", 4));
        let chained = arena.alloc(caster, def("z", 7));
        attach(&mut arena, origin, chained);
        assert_eq!(committed_anim_id(&arena, origin), 7);
    }

    #[test]
    fn test_solo_origin_plays_own_animation() {
        let mut arena = SkillArena::new();
        let origin = arena.alloc(UnitId::new(), def("y", 4));
        assert_eq!(committed_anim_id(&arena, origin), 4);
    }

    #[test]
    #[should_panic(expected = "already has a combo skill")]
    fn test_double_attach_panics() {
        let mut arena = SkillArena::new();
        let caster = UnitId::new();
        let origin = arena.alloc(caster, def("y", 4));
        let first = arena.alloc(caster, def("z", 7));
        let second = arena.alloc(caster, def("w", 9));
        attach(&mut arena, origin, first);
        attach(&mut arena, origin, second);
    }

    #[test]
    #[should_panic(expected = "later-created instance")]
    fn test_backward_link_panics() {
        let mut arena = SkillArena::new();
        let caster = UnitId::new();
        let first = arena.alloc(caster, def("y", 4));
        let second = arena.alloc(caster, def("z", 7));
        attach(&mut arena, second, first);
    }
}
