//! Static skill definitions and the catalog that serves them

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::core::error::{CombatError, Result};

/// Identifier of a skill definition in the catalog
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SkillDefId(pub String);

impl SkillDefId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for SkillDefId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Closed set of skill behaviors.
///
/// The variant decides the effect-application rule; adding a variant forces
/// every dispatch site to handle it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkillKind {
    Attack,
    Effect,
    Defence,
    Dodge,
}

impl SkillKind {
    /// Only attack-kind skills may be chained onto an origin skill
    pub fn chainable(&self) -> bool {
        matches!(self, SkillKind::Attack)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkillClass {
    Ninjutsu,
    Taijutsu,
    Passive,
    Tool,
    Other,
}

/// Whether a skill can open a two-skill chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComboPolicy {
    #[default]
    Cannot,
    Can,
    Must,
}

/// Shape of the targetable area
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RangeShape {
    /// All cells reachable within the radius by board adjacency
    #[default]
    Common,
    /// Cells along the principal directions, stopping at the first blocker
    Straight,
}

/// HP/MP price of activating a skill
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SkillCost {
    pub hp: i32,
    pub mp: i32,
}

impl SkillCost {
    pub fn new(hp: i32, mp: i32) -> Self {
        Self { hp, mp }
    }
}

/// Buff payload carried by effect/defence/dodge skills
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuffSpec {
    pub attribute: String,
    pub delta: i32,
    /// Owner turn-starts the buff survives; 0 expires at the next one
    pub duration: i32,
}

/// Immutable skill definition from static data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillDef {
    pub id: SkillDefId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub kind: SkillKind,
    pub class: SkillClass,
    #[serde(default)]
    pub cost: SkillCost,
    /// Spatial range radius; 0 means self-cast (targeting is skipped)
    #[serde(default)]
    pub range: i32,
    /// Radius of the hover preview area around the focus
    #[serde(default)]
    pub hover_range: i32,
    /// Percent chance to hit, rolled per target
    #[serde(default = "default_rate")]
    pub rate: i32,
    /// Attack damage or effect magnitude
    #[serde(default)]
    pub power: i32,
    #[serde(default)]
    pub combo: ComboPolicy,
    #[serde(default)]
    pub shape: RangeShape,
    #[serde(default)]
    pub anim_id: i32,
    #[serde(default)]
    pub buff: Option<BuffSpec>,
}

fn default_rate() -> i32 {
    100
}

impl SkillDef {
    pub fn validate(&self) -> Result<()> {
        if self.range < 0 || self.hover_range < 0 {
            return Err(CombatError::InvalidDefinition(format!(
                "{}: negative range",
                self.id
            )));
        }
        if !(0..=100).contains(&self.rate) {
            return Err(CombatError::InvalidDefinition(format!(
                "{}: rate must be a percentage",
                self.id
            )));
        }
        if matches!(self.kind, SkillKind::Effect | SkillKind::Defence | SkillKind::Dodge)
            && self.buff.is_none()
        {
            return Err(CombatError::InvalidDefinition(format!(
                "{}: {:?} skill requires a buff payload",
                self.id, self.kind
            )));
        }
        Ok(())
    }
}

/// Static-data provider for skill definitions
#[derive(Debug, Clone, Default)]
pub struct SkillBook {
    defs: AHashMap<SkillDefId, SkillDef>,
}

impl SkillBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a catalog from a JSON array of definitions
    pub fn from_json(json: &str) -> Result<Self> {
        let defs: Vec<SkillDef> = serde_json::from_str(json)?;
        let mut book = Self::new();
        for def in defs {
            book.insert(def)?;
        }
        Ok(book)
    }

    pub fn insert(&mut self, def: SkillDef) -> Result<()> {
        def.validate()?;
        self.defs.insert(def.id.clone(), def);
        Ok(())
    }

    pub fn get(&self, id: &SkillDefId) -> Option<&SkillDef> {
        self.defs.get(id)
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strike() -> SkillDef {
        SkillDef {
            id: SkillDefId::new("strike"),
            name: "Strike".into(),
            description: String::new(),
            kind: SkillKind::Attack,
            class: SkillClass::Taijutsu,
            cost: SkillCost::new(0, 5),
            range: 1,
            hover_range: 0,
            rate: 100,
            power: 10,
            combo: ComboPolicy::Cannot,
            shape: RangeShape::Common,
            anim_id: 3,
            buff: None,
        }
    }

    #[test]
    fn test_effect_skill_requires_buff() {
        let mut def = strike();
        def.kind = SkillKind::Effect;
        assert!(def.validate().is_err());
        def.buff = Some(BuffSpec {
            attribute: "mp".into(),
            delta: 5,
            duration: 2,
        });
        assert!(def.validate().is_ok());
    }

    #[test]
    fn test_catalog_from_json() {
        let json = r#"[
            {
                "id": "strike",
                "name": "Strike",
                "kind": "attack",
                "class": "taijutsu",
                "cost": { "hp": 0, "mp": 5 },
                "range": 1,
                "power": 10,
                "anim_id": 3
            }
        ]"#;
        let book = SkillBook::from_json(json).unwrap();
        let def = book.get(&SkillDefId::new("strike")).unwrap();
        assert_eq!(def.rate, 100);
        assert_eq!(def.combo, ComboPolicy::Cannot);
        assert_eq!(def.power, 10);
    }

    #[test]
    fn test_only_attacks_chain() {
        assert!(SkillKind::Attack.chainable());
        assert!(!SkillKind::Defence.chainable());
        assert!(!SkillKind::Dodge.chainable());
        assert!(!SkillKind::Effect.chainable());
    }
}
