//! Arena of in-flight skill instances
//!
//! Origin/combo relations are stored as arena indices, never owning
//! references. Instances are allocated in creation order and a combo link
//! may only point at a later-created instance, so cycles cannot exist.

use crate::core::types::{GridPos, SkillInstanceId, UnitId};
use crate::skill::definition::SkillDef;
use crate::skill::machine::Phase;
use crate::skill::targeting::TargetingSession;

/// One in-flight skill: definition snapshot plus execution state
#[derive(Debug)]
pub struct SkillInstance {
    pub id: SkillInstanceId,
    pub caster: UnitId,
    pub def: SkillDef,
    pub phase: Phase,
    /// Last hovered/clicked position; `None` until the first hover
    pub focus: Option<GridPos>,
    /// The skill that chained into this one (this instance is the combo)
    pub origin: Option<SkillInstanceId>,
    /// The skill this one chained into (this instance is the origin)
    pub combo: Option<SkillInstanceId>,
    pub session: Option<TargetingSession>,
}

impl SkillInstance {
    fn new(id: SkillInstanceId, caster: UnitId, def: SkillDef) -> Self {
        Self {
            id,
            caster,
            def,
            phase: Phase::Init,
            focus: None,
            origin: None,
            combo: None,
            session: None,
        }
    }
}

#[derive(Debug, Default)]
pub struct SkillArena {
    slots: Vec<Option<SkillInstance>>,
}

impl SkillArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc(&mut self, caster: UnitId, def: SkillDef) -> SkillInstanceId {
        let id = SkillInstanceId(self.slots.len() as u32);
        self.slots.push(Some(SkillInstance::new(id, caster, def)));
        id
    }

    pub fn get(&self, id: SkillInstanceId) -> Option<&SkillInstance> {
        self.slots.get(id.index()).and_then(|s| s.as_ref())
    }

    pub fn get_mut(&mut self, id: SkillInstanceId) -> Option<&mut SkillInstance> {
        self.slots.get_mut(id.index()).and_then(|s| s.as_mut())
    }

    /// Fetch a live instance. Panics on a dangling id (caller contract).
    pub fn instance(&self, id: SkillInstanceId) -> &SkillInstance {
        self.get(id).expect("dangling skill instance id")
    }

    pub fn instance_mut(&mut self, id: SkillInstanceId) -> &mut SkillInstance {
        self.get_mut(id).expect("dangling skill instance id")
    }

    /// Borrow two distinct instances at once. The creation-order rule
    /// guarantees origin < combo, which makes the split borrow trivial.
    pub fn pair_mut(
        &mut self,
        first: SkillInstanceId,
        second: SkillInstanceId,
    ) -> (&mut SkillInstance, &mut SkillInstance) {
        assert!(first < second, "pair_mut requires creation order");
        let (lo, hi) = self.slots.split_at_mut(second.index());
        let a = lo[first.index()]
            .as_mut()
            .expect("dangling skill instance id");
        let b = hi[0].as_mut().expect("dangling skill instance id");
        (a, b)
    }

    pub fn free(&mut self, id: SkillInstanceId) -> Option<SkillInstance> {
        self.slots.get_mut(id.index()).and_then(|s| s.take())
    }

    pub fn live_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }
}
