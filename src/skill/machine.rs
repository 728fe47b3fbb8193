//! Skill execution state machine
//!
//! Cooperative polling: the host scheduler calls [`SkillEngine::poll`] once
//! per tick with whatever input event arrived. Waiting is modeled by
//! returning `Pending`, never by blocking. Cancellation is an event,
//! honored at the next poll, and idempotent.

use ahash::AHashMap;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::board::grid::Board;
use crate::core::error::{CombatError, Result};
use crate::core::types::{GridPos, SkillInstanceId, UnitId, ATTR_HP, ATTR_MP};
use crate::presentation::{Presenter, PromptKind};
use crate::skill::arena::SkillArena;
use crate::skill::combo;
use crate::skill::cost;
use crate::skill::definition::{ComboPolicy, SkillBook, SkillDefId, SkillKind};
use crate::skill::history::ActionHistory;
use crate::skill::targeting::TargetingSession;
use crate::unit::buffs::{BuffEffect, BuffEntry};
use crate::unit::roster::Roster;

/// Execution phase of one skill instance.
///
/// `ComboJudge`, `ComboSelect`, `Targeting` and `AwaitingConfirm` are the
/// input-waiting sub-states; `Suspended` parks an origin skill while its
/// chained continuation drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Init,
    ComboJudge,
    ComboSelect,
    Targeting,
    AwaitingConfirm,
    Confirmed,
    ApplyingEffect,
    Suspended,
    Done,
}

/// External input delivered to a poll
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    TileHovered(GridPos),
    TileExited(GridPos),
    TileClicked(GridPos),
    ConfirmAccepted,
    ConfirmDeclined,
    ComboAccepted,
    ComboDeclined,
    ComboChosen(SkillDefId),
    Cancel,
    AnimationComplete,
}

/// Result of one poll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// No skill in flight for the unit
    Idle,
    /// Still waiting (for input, selection, or animation)
    Pending,
    /// Effect applied, cost paid, unit back to idle
    Resolved,
    /// Fully cancelled, unit back to idle
    Cancelled,
}

/// External collaborators bundled for one poll
pub struct BattleCtx<'a> {
    pub board: &'a mut dyn Board,
    pub roster: &'a mut dyn Roster,
    pub presenter: &'a mut dyn Presenter,
    pub book: &'a SkillBook,
}

/// Owns the instance arena, the per-unit undo stacks, and the per-unit
/// active-action handles; drives phase transitions.
pub struct SkillEngine {
    arena: SkillArena,
    history: ActionHistory,
    active: AHashMap<UnitId, SkillInstanceId>,
    rng: ChaCha8Rng,
}

impl SkillEngine {
    pub fn new(seed: u64) -> Self {
        Self {
            arena: SkillArena::new(),
            history: ActionHistory::new(),
            active: AHashMap::new(),
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn history(&self) -> &ActionHistory {
        &self.history
    }

    pub fn active_skill(&self, unit: UnitId) -> Option<SkillInstanceId> {
        self.active.get(&unit).copied()
    }

    pub fn phase(&self, id: SkillInstanceId) -> Option<Phase> {
        self.arena.get(id).map(|i| i.phase)
    }

    pub fn focus(&self, id: SkillInstanceId) -> Option<GridPos> {
        self.arena.get(id).and_then(|i| i.focus)
    }

    /// Enqueue a skill for the unit. The instance starts in `Init` and is
    /// driven by subsequent polls.
    pub fn select_skill(
        &mut self,
        unit: UnitId,
        def_id: &SkillDefId,
        ctx: &mut BattleCtx,
    ) -> Result<SkillInstanceId> {
        if self.active.contains_key(&unit) {
            return Err(CombatError::ActionInFlight);
        }
        if !ctx.roster.contains(unit) {
            return Err(CombatError::UnknownUnit(unit));
        }
        let def = ctx
            .book
            .get(def_id)
            .cloned()
            .ok_or_else(|| CombatError::UnknownSkill(def_id.0.clone()))?;
        let id = self.arena.alloc(unit, def);
        self.history.push(unit, id);
        self.active.insert(unit, id);
        tracing::debug!(?unit, skill = %def_id, ?id, "skill selected");
        Ok(id)
    }

    /// Drive the unit's in-flight skill one step
    pub fn poll(
        &mut self,
        unit: UnitId,
        event: Option<InputEvent>,
        ctx: &mut BattleCtx,
    ) -> PollOutcome {
        let Some(id) = self.active.get(&unit).copied() else {
            return PollOutcome::Idle;
        };
        if matches!(event, Some(InputEvent::Cancel)) {
            return self.cancel(unit, ctx);
        }
        let phase = self.arena.instance(id).phase;
        match phase {
            Phase::Init => self.step_init(id, ctx),
            Phase::ComboJudge => self.step_combo_judge(id, event, ctx),
            Phase::ComboSelect => self.step_combo_select(id, event, ctx),
            Phase::Targeting => self.step_targeting(id, event, ctx),
            Phase::AwaitingConfirm => self.step_awaiting_confirm(id, event, ctx),
            Phase::Confirmed => self.enter_confirmed(id, ctx),
            Phase::ApplyingEffect => self.step_applying_effect(id, event, ctx),
            Phase::Suspended => PollOutcome::Pending,
            Phase::Done => PollOutcome::Resolved,
        }
    }

    /// Cooperative cancel. A no-op when nothing is in flight or the skill
    /// is already committed (animation running) or terminal.
    pub fn cancel(&mut self, unit: UnitId, ctx: &mut BattleCtx) -> PollOutcome {
        let Some(id) = self.active.get(&unit).copied() else {
            return PollOutcome::Idle;
        };
        let phase = self.arena.instance(id).phase;
        if matches!(phase, Phase::Confirmed | Phase::ApplyingEffect | Phase::Done) {
            tracing::debug!(?id, ?phase, "cancel ignored after commit");
            return PollOutcome::Pending;
        }

        self.teardown_instance(id, ctx);
        let origin = self.arena.instance(id).origin;
        let popped = self.history.pop(unit);
        debug_assert_eq!(popped, id, "cancelled skill was not top of history");
        self.arena.free(id);

        if let Some(origin_id) = origin {
            // The origin stays on the stack and becomes the active
            // selection again, fully reset and re-targetable.
            let inst = self.arena.instance_mut(origin_id);
            inst.combo = None;
            inst.focus = None;
            inst.phase = Phase::Init;
            if let Some(mut session) = inst.session.take() {
                session.teardown(ctx.board, ctx.roster);
            }
            self.active.insert(unit, origin_id);
            tracing::debug!(?origin_id, "chained skill cancelled, origin reset");
            PollOutcome::Pending
        } else {
            self.active.remove(&unit);
            PollOutcome::Cancelled
        }
    }

    /// Cleanup when a unit is destroyed: registry removal plus any in-flight
    /// skill state, so no session or history survives the unit.
    pub fn unit_destroyed(&mut self, unit: UnitId, ctx: &mut BattleCtx) {
        if let Some(id) = self.active.remove(&unit) {
            self.teardown_instance(id, ctx);
            let origin = self.arena.instance(id).origin;
            self.arena.free(id);
            if let Some(origin_id) = origin {
                let inst = self.arena.instance_mut(origin_id);
                if let Some(mut session) = inst.session.take() {
                    session.teardown(ctx.board, ctx.roster);
                }
                self.arena.free(origin_id);
            }
        }
        self.history.clear(unit);
        ctx.roster.remove(unit);
    }

    // ----- phase steps -------------------------------------------------

    fn step_init(&mut self, id: SkillInstanceId, ctx: &mut BattleCtx) -> PollOutcome {
        let caster = self.arena.instance(id).caster;

        // Configuration absence is non-fatal: degrade to idle, caller may
        // retry by selecting the skill again.
        if ctx.board.active_tiles().is_empty() || !ctx.roster.contains(caster) {
            tracing::warn!(?id, "missing battle context at init, skill abandoned");
            let popped = self.history.pop(caster);
            debug_assert_eq!(popped, id);
            self.arena.free(id);
            self.active.remove(&caster);
            return PollOutcome::Cancelled;
        }

        let inst = self.arena.instance(id);
        let policy = inst.def.combo;
        let origin = inst.origin;

        if let Some(origin_id) = origin {
            // Designated combo continuation: no prompts, mirror the
            // origin's focus and go straight to targeting.
            let mirrored = self.arena.instance(origin_id).focus;
            self.arena.instance_mut(id).focus = mirrored;
            return self.begin_targeting(id, ctx);
        }

        match policy {
            ComboPolicy::Cannot => self.begin_targeting(id, ctx),
            ComboPolicy::Can => {
                ctx.presenter.show_combo_judge(caster);
                self.arena.instance_mut(id).phase = Phase::ComboJudge;
                PollOutcome::Pending
            }
            ComboPolicy::Must => self.open_combo_select(id, ctx),
        }
    }

    fn open_combo_select(&mut self, id: SkillInstanceId, ctx: &mut BattleCtx) -> PollOutcome {
        let (caster, own_cost) = {
            let inst = self.arena.instance(id);
            (inst.caster, inst.def.cost)
        };
        let candidates = self.combo_candidates(caster, own_cost, ctx);
        if candidates.is_empty() {
            // A forced chain with nothing affordable to chain cannot proceed
            ctx.presenter.notify(caster, "No usable follow-up skill!");
            let popped = self.history.pop(caster);
            debug_assert_eq!(popped, id);
            self.arena.free(id);
            self.active.remove(&caster);
            return PollOutcome::Cancelled;
        }
        ctx.presenter.show_combo_select(caster, &candidates);
        self.arena.instance_mut(id).phase = Phase::ComboSelect;
        PollOutcome::Pending
    }

    /// Attack-kind skills the unit knows and can afford combined with the
    /// origin's own cost.
    fn combo_candidates(
        &self,
        caster: UnitId,
        own_cost: crate::skill::definition::SkillCost,
        ctx: &BattleCtx,
    ) -> Vec<SkillDefId> {
        let hp = ctx.roster.attribute(caster, ATTR_HP);
        let mp = ctx.roster.attribute(caster, ATTR_MP);
        ctx.roster
            .known_skills(caster)
            .into_iter()
            .filter(|def_id| {
                ctx.book.get(def_id).is_some_and(|def| {
                    def.kind.chainable() && cost::can_afford(hp, mp, own_cost, Some(def.cost))
                })
            })
            .collect()
    }

    fn step_combo_judge(
        &mut self,
        id: SkillInstanceId,
        event: Option<InputEvent>,
        ctx: &mut BattleCtx,
    ) -> PollOutcome {
        let caster = self.arena.instance(id).caster;
        match event {
            Some(InputEvent::ComboDeclined) => {
                ctx.presenter.destroy_prompt(caster, PromptKind::ComboJudge);
                self.begin_targeting(id, ctx)
            }
            Some(InputEvent::ComboAccepted) => {
                ctx.presenter.destroy_prompt(caster, PromptKind::ComboJudge);
                self.open_combo_select(id, ctx)
            }
            _ => PollOutcome::Pending,
        }
    }

    fn step_combo_select(
        &mut self,
        id: SkillInstanceId,
        event: Option<InputEvent>,
        ctx: &mut BattleCtx,
    ) -> PollOutcome {
        let Some(InputEvent::ComboChosen(def_id)) = event else {
            return PollOutcome::Pending;
        };
        let (caster, own_cost) = {
            let inst = self.arena.instance(id);
            (inst.caster, inst.def.cost)
        };
        let Some(def) = ctx.book.get(&def_id).cloned() else {
            ctx.presenter.notify(caster, "Unknown skill!");
            return PollOutcome::Pending;
        };
        let hp = ctx.roster.attribute(caster, ATTR_HP);
        let mp = ctx.roster.attribute(caster, ATTR_MP);
        if !def.kind.chainable() || !cost::can_afford(hp, mp, own_cost, Some(def.cost)) {
            ctx.presenter.notify(caster, "That skill cannot follow up!");
            return PollOutcome::Pending;
        }

        ctx.presenter
            .destroy_prompt(caster, PromptKind::ComboSelect);
        let chained = self.arena.alloc(caster, def);
        combo::attach(&mut self.arena, id, chained);
        self.history.push(caster, chained);
        self.arena.instance_mut(id).phase = Phase::Suspended;
        self.active.insert(caster, chained);
        PollOutcome::Pending
    }

    fn begin_targeting(&mut self, id: SkillInstanceId, ctx: &mut BattleCtx) -> PollOutcome {
        let (caster, range, hover_range, shape) = {
            let inst = self.arena.instance(id);
            (
                inst.caster,
                inst.def.range,
                inst.def.hover_range,
                inst.def.shape,
            )
        };
        let Some(origin_pos) = ctx.roster.position(caster) else {
            tracing::warn!(?id, "caster has no board position, skill abandoned");
            let popped = self.history.pop(caster);
            debug_assert_eq!(popped, id);
            self.arena.free(id);
            self.active.remove(&caster);
            return PollOutcome::Cancelled;
        };

        if range <= 0 {
            // Self-cast: focus resolves to the caster's own position in the
            // same tick, no targeting session is opened.
            let inst = self.arena.instance_mut(id);
            inst.focus = Some(origin_pos);
            let origin = inst.origin;
            inst.phase = Phase::AwaitingConfirm;
            if let Some(origin_id) = origin {
                self.arena.instance_mut(origin_id).focus = Some(origin_pos);
            }
            ctx.presenter.show_confirm(caster);
            return PollOutcome::Pending;
        }

        let session = TargetingSession::begin(
            id,
            shape,
            range,
            hover_range,
            origin_pos,
            ctx.board,
            ctx.roster,
        );
        let inst = self.arena.instance_mut(id);
        inst.session = Some(session);
        inst.phase = Phase::Targeting;
        PollOutcome::Pending
    }

    fn step_targeting(
        &mut self,
        id: SkillInstanceId,
        event: Option<InputEvent>,
        ctx: &mut BattleCtx,
    ) -> PollOutcome {
        match event {
            Some(InputEvent::TileHovered(pos)) => {
                let inst = self.arena.instance_mut(id);
                let mut hovered = false;
                if let Some(session) = inst.session.as_mut() {
                    if session.listening(pos) {
                        session.set_focus(ctx.board, pos);
                        hovered = true;
                    }
                }
                if hovered {
                    inst.focus = Some(pos);
                    let origin = inst.origin;
                    if let Some(origin_id) = origin {
                        self.arena.instance_mut(origin_id).focus = Some(pos);
                    }
                }
                PollOutcome::Pending
            }
            Some(InputEvent::TileExited(_)) => {
                let inst = self.arena.instance_mut(id);
                if let Some(session) = inst.session.as_mut() {
                    session.clear_preview(ctx.board);
                }
                PollOutcome::Pending
            }
            Some(InputEvent::TileClicked(pos)) => {
                let inst = self.arena.instance_mut(id);
                let caster = inst.caster;
                let mut placed = false;
                if let Some(session) = inst.session.as_mut() {
                    if session.listening(pos) {
                        session.set_focus(ctx.board, pos);
                        inst.focus = Some(pos);
                        if session.check(ctx.board, pos) {
                            session.suspend_input(ctx.board);
                            placed = true;
                        } else {
                            tracing::debug!(?pos, "clicked outside valid range");
                        }
                    }
                }
                let origin = self.arena.instance(id).origin;
                if let Some(origin_id) = origin {
                    if self.arena.instance(id).focus == Some(pos) {
                        self.arena.instance_mut(origin_id).focus = Some(pos);
                    }
                }
                if placed {
                    ctx.presenter.show_confirm(caster);
                    self.arena.instance_mut(id).phase = Phase::AwaitingConfirm;
                }
                PollOutcome::Pending
            }
            _ => PollOutcome::Pending,
        }
    }

    fn step_awaiting_confirm(
        &mut self,
        id: SkillInstanceId,
        event: Option<InputEvent>,
        ctx: &mut BattleCtx,
    ) -> PollOutcome {
        let caster = self.arena.instance(id).caster;
        match event {
            Some(InputEvent::ConfirmAccepted) => {
                ctx.presenter.destroy_prompt(caster, PromptKind::Confirm);

                // The board may have changed since the click; re-verify
                // placement before committing.
                let inst = self.arena.instance_mut(id);
                let placement_ok = match (&inst.session, inst.focus) {
                    (Some(session), Some(focus)) => session.check(ctx.board, focus),
                    (Some(_), None) => false,
                    (None, _) => true, // self-cast
                };
                if !placement_ok {
                    tracing::debug!(?id, "placement invalid at confirm, back to targeting");
                    if let Some(session) = inst.session.as_mut() {
                        session.resume_input(ctx.board);
                    }
                    inst.phase = Phase::Targeting;
                    return PollOutcome::Pending;
                }
                inst.phase = Phase::Confirmed;
                self.enter_confirmed(id, ctx)
            }
            Some(InputEvent::ConfirmDeclined) => {
                // Soft self-reset: stay enqueued, re-run Init next poll
                self.teardown_instance(id, ctx);
                let inst = self.arena.instance_mut(id);
                inst.focus = None;
                inst.phase = Phase::Init;
                PollOutcome::Pending
            }
            _ => PollOutcome::Pending,
        }
    }

    fn enter_confirmed(&mut self, id: SkillInstanceId, ctx: &mut BattleCtx) -> PollOutcome {
        let (caster, own_cost, origin_id) = {
            let inst = self.arena.instance(id);
            (inst.caster, inst.def.cost, inst.origin)
        };
        let origin_cost = origin_id.map(|o| self.arena.instance(o).def.cost);

        // The whole chain is paid by one unit; reject before commit if the
        // combined cost does not fit.
        let hp = ctx.roster.attribute(caster, ATTR_HP);
        let mp = ctx.roster.attribute(caster, ATTR_MP);
        if !cost::can_afford(hp, mp, own_cost, origin_cost) {
            let total = cost::combined_cost(own_cost, origin_cost);
            let message = if total.mp > mp {
                "Not enough chakra!"
            } else {
                "Not enough stamina!"
            };
            ctx.presenter.notify(caster, message);
            let inst = self.arena.instance_mut(id);
            match inst.session.as_mut() {
                Some(session) => {
                    session.resume_input(ctx.board);
                    inst.phase = Phase::Targeting;
                }
                None => {
                    inst.phase = Phase::AwaitingConfirm;
                    ctx.presenter.show_confirm(caster);
                }
            }
            return PollOutcome::Pending;
        }

        // Commit: runs exactly once per chain, owned by the origin (or by
        // this instance when solo). Clears the undo trail, retires the
        // confirming instance's targeting, starts the unified animation.
        self.history.clear(caster);
        let inst = self.arena.instance_mut(id);
        if let Some(mut session) = inst.session.take() {
            session.teardown(ctx.board, ctx.roster);
        }
        inst.phase = Phase::ApplyingEffect;
        let anim_root = origin_id.unwrap_or(id);
        let anim_id = combo::committed_anim_id(&self.arena, anim_root);
        ctx.presenter.play_animation(caster, anim_id);
        tracing::debug!(?id, anim_id, "skill committed");
        PollOutcome::Pending
    }

    fn step_applying_effect(
        &mut self,
        id: SkillInstanceId,
        event: Option<InputEvent>,
        ctx: &mut BattleCtx,
    ) -> PollOutcome {
        if !matches!(event, Some(InputEvent::AnimationComplete)) {
            return PollOutcome::Pending;
        }
        let (caster, def, focus, origin_id) = {
            let inst = self.arena.instance(id);
            (inst.caster, inst.def.clone(), inst.focus, inst.origin)
        };
        let origin_cost = origin_id.map(|o| self.arena.instance(o).def.cost);

        // Cost is deducted after the final placement re-validation and
        // before the effect, once for the whole chain.
        cost::apply_cost(
            ctx.roster,
            caster,
            cost::combined_cost(def.cost, origin_cost),
        );
        self.apply_effect(caster, &def, focus, ctx);

        ctx.presenter.play_animation(caster, 0);
        ctx.presenter.skill_complete(caster);

        self.arena.free(id);
        if let Some(origin_id) = origin_id {
            self.arena.free(origin_id);
        }
        self.history.clear(caster);
        self.active.remove(&caster);
        tracing::debug!(?id, "skill resolved");
        PollOutcome::Resolved
    }

    /// Effect application per skill kind (the confirming instance supplies
    /// the effect; for a chain that is the chained skill).
    fn apply_effect(
        &mut self,
        caster: UnitId,
        def: &crate::skill::definition::SkillDef,
        focus: Option<GridPos>,
        ctx: &mut BattleCtx,
    ) {
        match def.kind {
            SkillKind::Attack => {
                let Some(focus) = focus.or_else(|| ctx.roster.position(caster)) else {
                    return;
                };
                let targets = self.enemies_in_area(caster, focus, def.hover_range, ctx);
                for target in targets {
                    if self.rng.gen_range(0..100) < def.rate {
                        ctx.roster.apply_delta(target, ATTR_HP, -def.power);
                        if ctx.roster.attribute(target, ATTR_HP) <= 0 {
                            self.unit_destroyed(target, ctx);
                        }
                    } else {
                        tracing::debug!(?target, skill = %def.id, "attack missed");
                    }
                }
            }
            SkillKind::Effect => {
                let Some(spec) = def.buff.as_ref() else { return };
                let Some(focus) = focus.or_else(|| ctx.roster.position(caster)) else {
                    return;
                };
                for target in self.units_in_area(caster, focus, def.hover_range, ctx) {
                    ctx.roster.insert_buff(
                        target,
                        BuffEntry::new(
                            BuffEffect::new(spec.attribute.clone(), spec.delta),
                            spec.duration,
                        ),
                    );
                }
            }
            SkillKind::Defence | SkillKind::Dodge => {
                let Some(spec) = def.buff.as_ref() else { return };
                ctx.roster.insert_buff(
                    caster,
                    BuffEntry::new(
                        BuffEffect::new(spec.attribute.clone(), spec.delta),
                        spec.duration,
                    ),
                );
            }
        }
    }

    fn units_in_area(
        &self,
        caster: UnitId,
        focus: GridPos,
        hover_range: i32,
        ctx: &BattleCtx,
    ) -> Vec<UnitId> {
        let radius = hover_range.max(0);
        ctx.roster
            .units()
            .into_iter()
            .filter(|u| *u != caster)
            .filter(|u| {
                ctx.roster
                    .position(*u)
                    .map(|p| p.chebyshev(&focus) <= radius)
                    .unwrap_or(false)
            })
            .collect()
    }

    /// Attack targets only: units in the area whose faction differs from
    /// the caster's. Allies standing in the blast are spared.
    fn enemies_in_area(
        &self,
        caster: UnitId,
        focus: GridPos,
        hover_range: i32,
        ctx: &BattleCtx,
    ) -> Vec<UnitId> {
        let caster_faction = ctx.roster.faction(caster);
        self.units_in_area(caster, focus, hover_range, ctx)
            .into_iter()
            .filter(|u| ctx.roster.faction(*u) != caster_faction)
            .collect()
    }

    /// Destroy the instance's transient surface: open prompt and session
    fn teardown_instance(&mut self, id: SkillInstanceId, ctx: &mut BattleCtx) {
        let inst = self.arena.instance_mut(id);
        let caster = inst.caster;
        let phase = inst.phase;
        if let Some(mut session) = inst.session.take() {
            session.teardown(ctx.board, ctx.roster);
        }
        match phase {
            Phase::ComboJudge => ctx.presenter.destroy_prompt(caster, PromptKind::ComboJudge),
            Phase::ComboSelect => ctx
                .presenter
                .destroy_prompt(caster, PromptKind::ComboSelect),
            Phase::AwaitingConfirm => ctx.presenter.destroy_prompt(caster, PromptKind::Confirm),
            _ => {}
        }
    }
}
