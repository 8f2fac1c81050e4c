//! Engine configuration.
//!
//! Every tunable constant lives in [`EngineConfig`]. Missing JSON fields
//! take their defaults, so `{}` is a valid configuration.

use crate::error::EngineError;
use crate::progression::{ExperienceCurve, PoolSettings};
use crate::targeting::RangeClass;
use serde::{Deserialize, Serialize};

/// Scan distance per [`RangeClass`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RangeDistances {
    pub short: f64,
    pub medium: f64,
    pub long: f64,
}

impl Default for RangeDistances {
    fn default() -> Self {
        Self {
            short: 1.0,
            medium: 2.0,
            long: 3.0,
        }
    }
}

impl RangeDistances {
    /// Reach in world units for a range class.
    pub fn distance(&self, range: RangeClass) -> f64 {
        match range {
            RangeClass::Short => self.short,
            RangeClass::Medium => self.medium,
            RangeClass::Long => self.long,
        }
    }
}

/// Engine-wide settings.
///
/// # Examples
///
/// ```rust
/// use wavecore::EngineConfig;
///
/// let config = EngineConfig::from_json(r#"{ "seed": 42, "ranges": { "long": 4.5 } }"#).unwrap();
/// assert_eq!(config.seed, 42);
/// assert_eq!(config.ranges.long, 4.5);
/// assert_eq!(config.ranges.short, 1.0);
/// assert_eq!(config.experience.base_experience, 30);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Seed for the engine's random stream.
    pub seed: u64,
    pub ranges: RangeDistances,
    /// Default leveling curve. Units with their own base experience keep
    /// the exponent.
    pub experience: ExperienceCurve,
    /// Lower bound for cooldown periods, in seconds.
    pub min_period: f64,
    /// Vertical offset of target scan rays.
    pub ray_height: f64,
    pub enemy_experience_reward: i64,
    pub click_experience: i64,
    pub sacrifice_multiplier: f64,
    pub sacrifice_base_experience: i64,
    /// Share of the pool a retry costs after game over.
    pub retry_cost_multiplier: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            ranges: RangeDistances::default(),
            experience: ExperienceCurve::default(),
            min_period: crate::cooldown::DEFAULT_MIN_PERIOD,
            ray_height: 0.25,
            enemy_experience_reward: 1,
            click_experience: 1,
            sacrifice_multiplier: 1.25,
            sacrifice_base_experience: 10,
            retry_cost_multiplier: 0.25,
        }
    }
}

impl EngineConfig {
    /// Parse a JSON configuration.
    pub fn from_json(text: &str) -> Result<Self, EngineError> {
        serde_json::from_str(text).map_err(|e| EngineError::Config(e.to_string()))
    }

    /// Builder-style seed override.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub(crate) fn pool_settings(&self) -> PoolSettings {
        PoolSettings {
            enemy_reward: self.enemy_experience_reward,
            click_reward: self.click_experience,
            sacrifice_multiplier: self.sacrifice_multiplier,
            sacrifice_curve: self.experience.with_base(self.sacrifice_base_experience),
            retry_multiplier: self.retry_cost_multiplier,
        }
    }
}
