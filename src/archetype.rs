//! Unit templates loaded from JSON.

use crate::action::ActionStrategy;
use crate::dice::{GrowthRate, StatGrowth};
use crate::entity::EntitySpec;
use crate::error::EngineError;
use crate::stat_id::{RateId, StatId};
use crate::targeting::{Faction, RangeClass};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A named unit template.
///
/// # Examples
///
/// ```rust
/// use wavecore::{Action, Archetype, Faction, StatId};
///
/// let goblin = Archetype::from_json(r#"{
///     "name": "goblin",
///     "faction": "enemy",
///     "strategy": { "attack": { "type": "melee_attack" } },
///     "base": { "hp_max": 12, "attack": 3 },
///     "rates": { "attack": 1.5 },
///     "growths": [ { "stat": "hp_max", "rate": "medium" } ]
/// }"#).unwrap();
///
/// assert_eq!(goblin.faction, Faction::Enemy);
/// assert_eq!(goblin.strategy.attack, Action::MeleeAttack);
/// assert_eq!(goblin.to_spec().base[StatId::HpMax], 12);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Archetype {
    pub name: String,
    pub faction: Faction,
    #[serde(default)]
    pub range: RangeClass,
    #[serde(default)]
    pub strategy: ActionStrategy,
    #[serde(default)]
    pub base: BTreeMap<StatId, i32>,
    #[serde(default)]
    pub rates: BTreeMap<RateId, f64>,
    #[serde(default)]
    pub growths: Vec<StatGrowth>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experience_rate: Option<GrowthRate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_experience: Option<i64>,
}

impl Archetype {
    /// Parse a single archetype.
    pub fn from_json(text: &str) -> Result<Self, EngineError> {
        serde_json::from_str(text).map_err(|e| EngineError::Config(e.to_string()))
    }

    /// Parse a JSON array of archetypes.
    pub fn list_from_json(text: &str) -> Result<Vec<Self>, EngineError> {
        serde_json::from_str(text).map_err(|e| EngineError::Config(e.to_string()))
    }

    /// Find an archetype by name.
    pub fn find<'a>(archetypes: &'a [Archetype], name: &str) -> Result<&'a Archetype, EngineError> {
        archetypes
            .iter()
            .find(|a| a.name == name)
            .ok_or_else(|| EngineError::UnknownArchetype(name.to_string()))
    }

    /// Build the spawn description for this archetype.
    pub fn to_spec(&self) -> EntitySpec {
        let mut spec = EntitySpec::new(self.name.clone(), self.faction)
            .with_range(self.range)
            .with_strategy(self.strategy);
        for (stat, value) in &self.base {
            spec.base[*stat] = *value;
        }
        for (rate, seconds) in &self.rates {
            spec.rates[*rate] = *seconds;
        }
        spec.growths = self.growths.clone();
        spec.experience_rate = self.experience_rate;
        spec.base_experience = self.base_experience;
        spec
    }
}
