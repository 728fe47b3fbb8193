use thiserror::Error;

#[derive(Error, Debug)]
pub enum CombatError {
    #[error("Unknown skill: {0}")]
    UnknownSkill(String),

    #[error("Unknown unit: {0:?}")]
    UnknownUnit(crate::core::types::UnitId),

    #[error("Invalid skill definition: {0}")]
    InvalidDefinition(String),

    #[error("Unit already has a skill in flight")]
    ActionInFlight,

    #[error("Skill catalog format error: {0}")]
    CatalogFormat(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CombatError>;
