//! Core types and error handling

pub mod error;
pub mod types;

pub use error::{CombatError, Result};
pub use types::{GridPos, SkillInstanceId, UnitId, ATTR_HP, ATTR_MP, PRINCIPAL_DIRECTIONS};
