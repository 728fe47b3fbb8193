//! Skill resolution: definitions, targeting, combo chaining, cost gating,
//! and the execution state machine that ties them together

pub mod arena;
pub mod combo;
pub mod cost;
pub mod definition;
pub mod history;
pub mod machine;
pub mod targeting;

pub use arena::{SkillArena, SkillInstance};
pub use definition::{
    BuffSpec, ComboPolicy, RangeShape, SkillBook, SkillClass, SkillCost, SkillDef, SkillDefId,
    SkillKind,
};
pub use history::ActionHistory;
pub use machine::{BattleCtx, InputEvent, Phase, PollOutcome, SkillEngine};
pub use targeting::TargetingSession;
