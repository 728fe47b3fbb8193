//! Combo chain tests: handoff, single combined charge, cancel/undo

use shinobi_tactics::board::{Board, GridBoard, TileHighlight};
use shinobi_tactics::core::types::{GridPos, UnitId, ATTR_HP, ATTR_MP};
use shinobi_tactics::presentation::{PresenterCall, RecordingPresenter};
use shinobi_tactics::skill::{
    BattleCtx, ComboPolicy, InputEvent, Phase, PollOutcome, RangeShape, SkillBook, SkillClass,
    SkillCost, SkillDef, SkillDefId, SkillEngine, SkillKind,
};
use shinobi_tactics::unit::{Roster, Squad};

struct Battle {
    board: GridBoard,
    squad: Squad,
    presenter: RecordingPresenter,
    book: SkillBook,
    engine: SkillEngine,
    caster: UnitId,
    enemy: UnitId,
}

impl Battle {
    fn new() -> Self {
        let mut board = GridBoard::new(8, 8);
        let mut squad = Squad::new();
        let caster = squad.spawn("Kaito", GridPos::new(2, 2), 0, 50, 30);
        let enemy = squad.spawn("Raiden", GridPos::new(2, 3), 1, 60, 20);
        board.set_blocked(GridPos::new(2, 3), true);
        Self {
            board,
            squad,
            presenter: RecordingPresenter::new(),
            book: SkillBook::new(),
            engine: SkillEngine::new(3),
            caster,
            enemy,
        }
    }

    fn add_skill(&mut self, id: &str, combo: ComboPolicy, cost_hp: i32, power: i32, anim: i32) {
        self.book
            .insert(SkillDef {
                id: SkillDefId::new(id),
                name: id.to_string(),
                description: String::new(),
                kind: SkillKind::Attack,
                class: SkillClass::Taijutsu,
                cost: SkillCost::new(cost_hp, 0),
                range: 1,
                hover_range: 0,
                rate: 100,
                power,
                combo,
                shape: RangeShape::Common,
                anim_id: anim,
                buff: None,
            })
            .unwrap();
    }

    fn select(&mut self, id: &str) {
        let def_id = SkillDefId::new(id);
        let mut ctx = BattleCtx {
            board: &mut self.board,
            roster: &mut self.squad,
            presenter: &mut self.presenter,
            book: &self.book,
        };
        self.engine
            .select_skill(self.caster, &def_id, &mut ctx)
            .unwrap();
    }

    fn poll(&mut self, event: Option<InputEvent>) -> PollOutcome {
        let mut ctx = BattleCtx {
            board: &mut self.board,
            roster: &mut self.squad,
            presenter: &mut self.presenter,
            book: &self.book,
        };
        self.engine.poll(self.caster, event, &mut ctx)
    }
}

/// Y (combo=must, cost hp=5) chains into Z (cost hp=5). Total deduction
/// on resolution is exactly 10 HP, charged once.
#[test]
fn test_chain_charges_combined_cost_once() {
    let mut battle = Battle::new();
    battle.add_skill("y", ComboPolicy::Must, 5, 6, 4);
    battle.add_skill("z", ComboPolicy::Cannot, 5, 9, 7);
    let caster = battle.caster;
    battle.squad.learn(caster, SkillDefId::new("z"));

    battle.select("y");
    battle.poll(None); // Init -> forced combo select
    battle.poll(Some(InputEvent::ComboChosen(SkillDefId::new("z"))));
    battle.poll(None); // chained instance Init -> targeting
    battle.poll(Some(InputEvent::TileClicked(GridPos::new(2, 3))));
    battle.poll(Some(InputEvent::ConfirmAccepted));
    let outcome = battle.poll(Some(InputEvent::AnimationComplete));

    assert_eq!(outcome, PollOutcome::Resolved);
    assert_eq!(battle.squad.attribute(caster, ATTR_HP), 40);
    assert_eq!(battle.squad.attribute(caster, ATTR_MP), 30);
    // The chained skill supplies the effect
    assert_eq!(battle.squad.attribute(battle.enemy, ATTR_HP), 51);
    assert!(battle.engine.history().is_empty(caster));
}

/// The origin commits with the chained skill's declared animation id.
#[test]
fn test_origin_plays_chained_animation() {
    let mut battle = Battle::new();
    battle.add_skill("y", ComboPolicy::Must, 5, 6, 4);
    battle.add_skill("z", ComboPolicy::Cannot, 5, 9, 7);
    let caster = battle.caster;
    battle.squad.learn(caster, SkillDefId::new("z"));

    battle.select("y");
    battle.poll(None);
    battle.poll(Some(InputEvent::ComboChosen(SkillDefId::new("z"))));
    battle.poll(None);
    battle.poll(Some(InputEvent::TileClicked(GridPos::new(2, 3))));
    battle.poll(Some(InputEvent::ConfirmAccepted));

    assert_eq!(battle.presenter.animations_played(caster), vec![7]);
}

/// Cancelling the chained top-of-stack pops exactly one entry and leaves
/// the origin fully reset and re-targetable.
#[test]
fn test_cancel_chained_restores_origin() {
    let mut battle = Battle::new();
    battle.add_skill("y", ComboPolicy::Must, 5, 6, 4);
    battle.add_skill("z", ComboPolicy::Cannot, 5, 9, 7);
    let caster = battle.caster;
    battle.squad.learn(caster, SkillDefId::new("z"));

    battle.select("y");
    battle.poll(None);
    let origin = battle.engine.active_skill(caster).unwrap();
    battle.poll(Some(InputEvent::ComboChosen(SkillDefId::new("z"))));
    battle.poll(None); // chained now targeting
    assert_eq!(battle.engine.history().len(caster), 2);

    assert_eq!(battle.poll(Some(InputEvent::Cancel)), PollOutcome::Pending);
    assert_eq!(battle.engine.history().len(caster), 1);
    assert_eq!(battle.engine.active_skill(caster), Some(origin));
    assert_eq!(battle.engine.phase(origin), Some(Phase::Init));

    // No stale session state survives the cancel
    assert_eq!(battle.board.input_claimant(), None);
    for pos in battle.board.active_tiles() {
        assert_eq!(battle.board.highlight(pos), TileHighlight::Neutral);
    }

    // The origin re-enters its selection flow on the next poll
    battle.poll(None);
    assert_eq!(battle.engine.phase(origin), Some(Phase::ComboSelect));
}

/// A `can` policy declined at the judge prompt resolves solo with its own
/// cost only.
#[test]
fn test_judge_declined_resolves_solo() {
    let mut battle = Battle::new();
    battle.add_skill("flex", ComboPolicy::Can, 5, 6, 4);
    let caster = battle.caster;

    battle.select("flex");
    battle.poll(None);
    assert!(battle
        .presenter
        .calls
        .iter()
        .any(|c| matches!(c, PresenterCall::ShowComboJudge(_))));

    battle.poll(Some(InputEvent::ComboDeclined));
    battle.poll(Some(InputEvent::TileClicked(GridPos::new(2, 3))));
    battle.poll(Some(InputEvent::ConfirmAccepted));
    let outcome = battle.poll(Some(InputEvent::AnimationComplete));

    assert_eq!(outcome, PollOutcome::Resolved);
    assert_eq!(battle.squad.attribute(caster, ATTR_HP), 45);
    assert_eq!(battle.squad.attribute(battle.enemy, ATTR_HP), 54);
    // Solo commit plays the skill's own animation
    assert_eq!(battle.presenter.animations_played(caster), vec![4, 0]);
}

/// A `can` policy accepted walks through selection like a forced chain.
#[test]
fn test_judge_accepted_opens_selection() {
    let mut battle = Battle::new();
    battle.add_skill("flex", ComboPolicy::Can, 5, 6, 4);
    battle.add_skill("z", ComboPolicy::Cannot, 5, 9, 7);
    let caster = battle.caster;
    battle.squad.learn(caster, SkillDefId::new("z"));

    battle.select("flex");
    battle.poll(None);
    battle.poll(Some(InputEvent::ComboAccepted));
    assert!(battle.presenter.calls.iter().any(|c| matches!(
        c,
        PresenterCall::ShowComboSelect(_, candidates) if candidates == &[SkillDefId::new("z")]
    )));

    battle.poll(Some(InputEvent::ComboChosen(SkillDefId::new("z"))));
    battle.poll(None);
    battle.poll(Some(InputEvent::TileClicked(GridPos::new(2, 3))));
    battle.poll(Some(InputEvent::ConfirmAccepted));
    assert_eq!(
        battle.poll(Some(InputEvent::AnimationComplete)),
        PollOutcome::Resolved
    );
    assert_eq!(battle.squad.attribute(caster, ATTR_HP), 40);
}
