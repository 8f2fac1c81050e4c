//! Progression module.
//!
//! Experience accumulation, level-up steps and the shared experience pool.
//!
//! A level-up step rolls every registered growth die once, applies the
//! deltas to the stat table in one go, bumps the level and recomputes the
//! next threshold from the [`ExperienceCurve`]:
//!
//! ```text
//! next_level_exp = floor(base_experience × level^exponent)
//! ```

use crate::stat_id::StatArray;
use crate::stats::StatTable;
use serde::{Deserialize, Serialize};

/// Experience threshold curve.
///
/// # Examples
///
/// ```rust
/// use wavecore::ExperienceCurve;
///
/// let curve = ExperienceCurve::default();
/// assert_eq!(curve.threshold(1), 30);
/// assert_eq!(curve.threshold(2), 84);
/// assert_eq!(curve.threshold(3), 155);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperienceCurve {
    pub base_experience: i64,
    pub exponent: f64,
}

impl Default for ExperienceCurve {
    fn default() -> Self {
        Self {
            base_experience: 30,
            exponent: 1.5,
        }
    }
}

impl ExperienceCurve {
    pub fn new(base_experience: i64, exponent: f64) -> Self {
        Self {
            base_experience,
            exponent,
        }
    }

    /// The same exponent with a different base.
    pub fn with_base(self, base_experience: i64) -> Self {
        Self {
            base_experience,
            ..self
        }
    }

    /// Experience needed to leave `level`.
    pub fn threshold(&self, level: u32) -> i64 {
        let exp = (self.base_experience as f64 * f64::from(level).powf(self.exponent)).floor();
        if exp.is_nan() {
            return 0;
        }
        exp as i64
    }
}

/// A pending batch of levels: how many, and the summed stat deltas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LevelUp {
    pub levels_gained: u32,
    pub deltas: StatArray<i32>,
}

/// Drives leveling for one stat table.
///
/// # Examples
///
/// ```rust
/// use wavecore::{ExperienceCurve, ProgressionEngine, StatTable};
///
/// let progression = ProgressionEngine::new(ExperienceCurve::default());
/// let mut table = StatTable::new();
/// table.init();
/// progression.prime(&mut table);
///
/// let mut notifications = 0;
/// let gained = progression.add_experience(&mut table, 31, |_| notifications += 1);
///
/// assert_eq!(gained, 1);
/// assert_eq!(notifications, 1);
/// assert_eq!(table.level(), 2);
/// assert_eq!(table.exp(), 0);
/// assert_eq!(table.next_level_exp(), 84);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressionEngine {
    curve: ExperienceCurve,
}

impl ProgressionEngine {
    pub fn new(curve: ExperienceCurve) -> Self {
        Self { curve }
    }

    pub fn curve(&self) -> &ExperienceCurve {
        &self.curve
    }

    /// Set the next-level threshold for the table's current level.
    pub fn prime(&self, table: &mut StatTable) {
        let level = table.level().max(1);
        table.set_progress(level, table.exp(), self.curve.threshold(level));
    }

    /// Add experience and level up while it meets the threshold.
    ///
    /// `on_step` runs once per level-up step, after that step's deltas are
    /// fully applied. Negative amounts count by magnitude. When at least one
    /// level is gained the leftover experience is dropped. Returns the
    /// number of levels gained.
    pub fn add_experience<F>(&self, table: &mut StatTable, amount: i64, mut on_step: F) -> u32
    where
        F: FnMut(&StatTable),
    {
        if table.next_level_exp() <= 0 {
            self.prime(table);
        }

        let mut exp = table.exp().saturating_add(amount.saturating_abs());
        let mut gained = 0;

        while table.next_level_exp() > 0 && exp >= table.next_level_exp() {
            exp -= table.next_level_exp();
            table.set_exp(0);
            self.step(table);
            gained += 1;
            tracing::debug!(level = table.level(), next = table.next_level_exp(), "level up");
            on_step(table);
        }

        table.set_exp(if gained > 0 { 0 } else { exp });
        gained
    }

    /// One level-up step: roll, apply, advance the level.
    pub fn level_up(&self, table: &mut StatTable) {
        self.step(table);
        tracing::debug!(level = table.level(), next = table.next_level_exp(), "level up");
    }

    /// Roll `levels` levels' worth of growth without touching the stats.
    ///
    /// Only the dice streams advance.
    pub fn create_level_up(&self, table: &mut StatTable, levels: u32) -> LevelUp {
        let mut deltas = StatArray::<i32>::default();
        for _ in 0..levels {
            for (stat, delta) in table.roll_growth().iter() {
                deltas[stat] = deltas[stat].saturating_add(delta);
            }
        }
        LevelUp {
            levels_gained: levels,
            deltas,
        }
    }

    /// Apply a batch produced by [`create_level_up`](Self::create_level_up).
    pub fn apply_level_up(&self, table: &mut StatTable, level_up: &LevelUp) {
        table.apply_deltas(&level_up.deltas);
        let level = table.level().saturating_add(level_up.levels_gained);
        table.set_progress(level, table.exp(), self.curve.threshold(level));
    }

    fn step(&self, table: &mut StatTable) {
        let level_up = self.create_level_up(table, 1);
        self.apply_level_up(table, &level_up);
    }
}

/// Settings for an [`ExperiencePool`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoolSettings {
    pub enemy_reward: i64,
    pub click_reward: i64,
    pub sacrifice_multiplier: f64,
    /// Sacrifice cost curve; its exponent is shared with unit leveling.
    pub sacrifice_curve: ExperienceCurve,
    /// Share of the banked experience a retry costs.
    pub retry_multiplier: f64,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            enemy_reward: 1,
            click_reward: 1,
            sacrifice_multiplier: 1.25,
            sacrifice_curve: ExperienceCurve::new(10, 1.5),
            retry_multiplier: 0.25,
        }
    }
}

/// Party-wide banked experience.
///
/// Earned by defeating enemies and clicking; spent on unit level-ups and on
/// sacrifices that raise the click reward.
///
/// # Examples
///
/// ```rust
/// use wavecore::ExperiencePool;
///
/// let mut pool = ExperiencePool::default();
/// pool.add(-12);
/// assert_eq!(pool.exp(), 12);
///
/// assert!(pool.sacrifice()); // first sacrifice costs 10
/// assert_eq!(pool.exp(), 2);
/// assert_eq!(pool.click_reward(), 2); // ceil(1 × 1.25)
/// assert_eq!(pool.sacrifice_cost(), 28);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ExperiencePool {
    exp: i64,
    enemy_reward: i64,
    click_reward: i64,
    sacrifice_multiplier: f64,
    sacrifice_curve: ExperienceCurve,
    sacrifice_level: u32,
    sacrifice_cost: i64,
    retry_multiplier: f64,
}

impl Default for ExperiencePool {
    fn default() -> Self {
        Self::new(PoolSettings::default())
    }
}

impl ExperiencePool {
    pub fn new(settings: PoolSettings) -> Self {
        let sacrifice_level = 1;
        Self {
            exp: 0,
            enemy_reward: settings.enemy_reward.saturating_abs(),
            click_reward: settings.click_reward.saturating_abs(),
            sacrifice_multiplier: settings.sacrifice_multiplier,
            sacrifice_curve: settings.sacrifice_curve,
            sacrifice_level,
            sacrifice_cost: settings.sacrifice_curve.threshold(sacrifice_level),
            retry_multiplier: settings.retry_multiplier,
        }
    }

    pub fn exp(&self) -> i64 {
        self.exp
    }

    pub fn enemy_reward(&self) -> i64 {
        self.enemy_reward
    }

    pub fn click_reward(&self) -> i64 {
        self.click_reward
    }

    pub fn sacrifice_cost(&self) -> i64 {
        self.sacrifice_cost
    }

    pub fn add(&mut self, amount: i64) {
        self.exp = self.exp.saturating_add(amount.saturating_abs());
    }

    pub fn can_consume(&self, amount: i64) -> bool {
        amount.saturating_abs() <= self.exp
    }

    /// Spend `amount` if the pool holds enough. Returns whether it did.
    pub fn consume(&mut self, amount: i64) -> bool {
        let amount = amount.saturating_abs();
        if !self.can_consume(amount) {
            return false;
        }
        self.exp -= amount;
        true
    }

    pub fn enemy_defeated(&mut self) {
        self.add(self.enemy_reward);
    }

    pub fn click(&mut self) {
        self.add(self.click_reward);
    }

    /// Cost of buying the party back after game over: the configured share
    /// of the pool, at least 1 and at most everything. `None` when the pool
    /// is empty.
    pub fn retry_cost(&self) -> Option<i64> {
        if self.exp <= 0 {
            return None;
        }
        let share = (self.exp as f64 * self.retry_multiplier).floor();
        let share = if share.is_finite() { share as i64 } else { 0 };
        Some(share.min(self.exp).max(1))
    }

    /// Enemy reward follows the wave number.
    pub fn set_wave_reward(&mut self, wave: u32) {
        self.enemy_reward = i64::from(wave);
    }

    /// Pay the current sacrifice cost to raise the click reward.
    ///
    /// Returns `false` and changes nothing when the pool is short.
    pub fn sacrifice(&mut self) -> bool {
        if !self.consume(self.sacrifice_cost) {
            return false;
        }
        let boosted = (self.click_reward as f64 * self.sacrifice_multiplier).ceil();
        self.click_reward = if boosted.is_finite() {
            (boosted as i64).abs()
        } else {
            self.click_reward
        };
        self.sacrifice_level = self.sacrifice_level.saturating_add(1);
        self.sacrifice_cost = self.sacrifice_curve.threshold(self.sacrifice_level);
        tracing::debug!(
            click_reward = self.click_reward,
            next_cost = self.sacrifice_cost,
            "sacrifice made"
        );
        true
    }
}
