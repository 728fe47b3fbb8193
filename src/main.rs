//! Shinobi Tactics - scripted skirmish demo
//!
//! Builds a small board and two units, then drives one chained skill
//! resolution through the engine the way a host game loop would: one poll
//! per tick, feeding scripted input events.

use shinobi_tactics::board::GridBoard;
use shinobi_tactics::core::error::Result;
use shinobi_tactics::core::types::{GridPos, ATTR_HP, ATTR_MP};
use shinobi_tactics::presentation::RecordingPresenter;
use shinobi_tactics::skill::{BattleCtx, InputEvent, PollOutcome, SkillBook, SkillDefId, SkillEngine};
use shinobi_tactics::unit::{Roster, Squad};

const CATALOG: &str = r#"[
    {
        "id": "gale-palm",
        "name": "Gale Palm",
        "kind": "attack",
        "class": "ninjutsu",
        "cost": { "hp": 5, "mp": 0 },
        "range": 2,
        "hover_range": 0,
        "power": 8,
        "combo": "must",
        "anim_id": 4
    },
    {
        "id": "shuriken-volley",
        "name": "Shuriken Volley",
        "kind": "attack",
        "class": "tool",
        "cost": { "hp": 5, "mp": 0 },
        "range": 2,
        "hover_range": 0,
        "power": 12,
        "anim_id": 7
    }
]"#;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("shinobi_tactics=debug")
        .init();

    tracing::info!("Shinobi Tactics skirmish starting...");

    let book = SkillBook::from_json(CATALOG)?;
    let mut board = GridBoard::new(8, 8);
    let mut squad = Squad::new();
    let kaito = squad.spawn("Kaito", GridPos::new(3, 3), 0, 50, 30);
    let raiden = squad.spawn("Raiden", GridPos::new(3, 4), 1, 60, 20);
    board.set_blocked(GridPos::new(3, 3), true);
    board.set_blocked(GridPos::new(3, 4), true);
    squad.learn(kaito, SkillDefId::new("shuriken-volley"));

    let mut presenter = RecordingPresenter::new();
    let mut engine = SkillEngine::new(42);

    println!("\n=== SHINOBI TACTICS ===");
    println!(
        "{}: hp={} mp={}   {}: hp={} mp={}",
        squad.name(kaito).unwrap_or("?"),
        squad.attribute(kaito, ATTR_HP),
        squad.attribute(kaito, ATTR_MP),
        squad.name(raiden).unwrap_or("?"),
        squad.attribute(raiden, ATTR_HP),
        squad.attribute(raiden, ATTR_MP),
    );

    // The host loop: Kaito opens a forced chain, picks the follow-up,
    // targets the adjacent enemy, confirms, and the animation completes.
    let script = [
        None,
        Some(InputEvent::ComboChosen(SkillDefId::new("shuriken-volley"))),
        None,
        Some(InputEvent::TileHovered(GridPos::new(3, 4))),
        Some(InputEvent::TileClicked(GridPos::new(3, 4))),
        Some(InputEvent::ConfirmAccepted),
        Some(InputEvent::AnimationComplete),
    ];

    {
        let mut ctx = BattleCtx {
            board: &mut board,
            roster: &mut squad,
            presenter: &mut presenter,
            book: &book,
        };
        engine.select_skill(kaito, &SkillDefId::new("gale-palm"), &mut ctx)?;
    }

    for (tick, event) in script.into_iter().enumerate() {
        let mut ctx = BattleCtx {
            board: &mut board,
            roster: &mut squad,
            presenter: &mut presenter,
            book: &book,
        };
        let outcome = engine.poll(kaito, event, &mut ctx);
        println!("tick {tick}: {outcome:?}");
        if matches!(outcome, PollOutcome::Resolved | PollOutcome::Cancelled) {
            break;
        }
    }

    println!(
        "after resolution: {}: hp={} mp={}   {}: hp={}",
        squad.name(kaito).unwrap_or("?"),
        squad.attribute(kaito, ATTR_HP),
        squad.attribute(kaito, ATTR_MP),
        squad.name(raiden).unwrap_or("?"),
        squad.attribute(raiden, ATTR_HP),
    );
    println!("presenter calls: {}", presenter.calls.len());

    // Turn boundary: buff ledgers tick per unit
    squad.turn_start(kaito);
    squad.turn_start(raiden);
    tracing::info!("skirmish finished");
    Ok(())
}
