//! Stat table module.
//!
//! A `StatTable` owns one entity's numeric state: base stat values, timing
//! rates, growth dice, active modifiers and progression counters. Resolution
//! layers modifiers on top of the base values in two passes:
//!
//! ```text
//! stats = base + Σ increments
//! total = stats + stats × Σ factors      (truncated toward zero)
//! ```
//!
//! All additive deltas are summed first, then the whole post-additive value
//! is scaled once by the summed factor.

use crate::dice::{Dice, DiceSpec, StatGrowth};
use crate::modifier::{Modifier, ModifierId, ModifierSet};
use crate::stat_id::{RateArray, RateId, StatArray, StatId};
use rand::RngCore;
use serde::{Deserialize, Serialize};

/// Per-entity stats.
///
/// Not `Clone`: copies must go through [`StatTable::duplicate`] so that
/// every copy gets its own dice streams.
///
/// # Examples
///
/// ```rust
/// use wavecore::{Modifier, ModifierIdAllocator, StatId, StatTable};
///
/// let mut table = StatTable::new();
/// table.set_base(StatId::Attack, 10);
///
/// let mut ids = ModifierIdAllocator::new();
/// table.add_modifier(Modifier::incremental(ids.next_id()).with(StatId::Attack, 5));
/// table.add_modifier(Modifier::multiplicative(ids.next_id()).with_factor(StatId::Attack, 0.5));
///
/// // (10 + 5) * (1 + 0.5) = 22.5, truncated
/// assert_eq!(table.resolved(StatId::Attack), 22);
/// ```
#[derive(Debug)]
pub struct StatTable {
    base: StatArray<i32>,
    rates: RateArray<f64>,
    growths: Vec<(StatId, Dice)>,
    modifiers: ModifierSet,
    level: u32,
    exp: i64,
    next_level_exp: i64,
    initialized: bool,
}

impl Default for StatTable {
    fn default() -> Self {
        Self::new()
    }
}

impl StatTable {
    /// A zero-valued table with no growth dice.
    pub fn new() -> Self {
        Self {
            base: StatArray::default(),
            rates: RateArray::default(),
            growths: Vec::new(),
            modifiers: ModifierSet::new(),
            level: 0,
            exp: 0,
            next_level_exp: 0,
            initialized: false,
        }
    }

    /// Register growth dice for each entry, seeding every die from `rng`.
    ///
    /// A later entry for the same stat replaces an earlier one.
    pub fn with_growths(mut self, growths: &[StatGrowth], rng: &mut impl RngCore) -> Self {
        for growth in growths {
            self.set_growth(growth.stat, Dice::from_rng(growth.spec(), rng));
        }
        self
    }

    pub fn set_growth(&mut self, stat: StatId, dice: Dice) {
        match self.growths.iter_mut().find(|(id, _)| *id == stat) {
            Some(slot) => slot.1 = dice,
            None => {
                self.growths.push((stat, dice));
                self.growths.sort_by_key(|(id, _)| *id);
            }
        }
    }

    /// Growth spec registered for `stat`, if any.
    pub fn growth(&self, stat: StatId) -> Option<DiceSpec> {
        self.growths
            .iter()
            .find(|(id, _)| *id == stat)
            .map(|(_, dice)| dice.spec())
    }

    /// Raw stored value.
    pub fn base(&self, stat: StatId) -> i32 {
        self.base[stat]
    }

    pub fn base_values(&self) -> &StatArray<i32> {
        &self.base
    }

    /// Overwrite a base value, then re-establish `0 <= HpCur <= HpMax`.
    pub fn set_base(&mut self, stat: StatId, value: i32) {
        self.base[stat] = value;
        self.enforce_hp_invariant();
    }

    /// Base value with every active modifier applied.
    pub fn resolved(&self, stat: StatId) -> i32 {
        let stats = i64::from(self.base[stat]) + self.modifiers.total_increment(stat);
        let factor = self.modifiers.total_factor(stat);
        let total = stats as f64 + stats as f64 * factor;
        if total.is_nan() {
            return 0;
        }
        // `as` truncates toward zero and saturates at the i32 bounds
        total as i32
    }

    pub fn resolved_values(&self) -> StatArray<i32> {
        let mut values = StatArray::default();
        for id in StatId::all() {
            values[id] = self.resolved(id);
        }
        values
    }

    pub fn rate(&self, rate: RateId) -> f64 {
        self.rates[rate]
    }

    pub fn rates(&self) -> &RateArray<f64> {
        &self.rates
    }

    /// Set a rate in seconds. Negative values are stored as their magnitude.
    pub fn set_rate(&mut self, rate: RateId, seconds: f64) {
        self.rates[rate] = if seconds.is_finite() { seconds.abs() } else { 0.0 };
    }

    /// Register a modifier. Returns `false` if it was already registered.
    pub fn add_modifier(&mut self, modifier: Modifier) -> bool {
        self.modifiers.add(modifier)
    }

    pub fn remove_modifier(&mut self, id: ModifierId) -> bool {
        self.modifiers.remove(id)
    }

    pub fn clear_modifiers(&mut self) {
        self.modifiers.clear();
    }

    pub fn modifiers(&self) -> &ModifierSet {
        &self.modifiers
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn exp(&self) -> i64 {
        self.exp
    }

    pub fn next_level_exp(&self) -> i64 {
        self.next_level_exp
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub(crate) fn set_progress(&mut self, level: u32, exp: i64, next_level_exp: i64) {
        self.level = level;
        self.exp = exp;
        self.next_level_exp = next_level_exp;
    }

    pub(crate) fn set_exp(&mut self, exp: i64) {
        self.exp = exp;
    }

    /// Roll every growth die once.
    pub fn roll_growth(&mut self) -> StatArray<i32> {
        let mut deltas = StatArray::default();
        for (stat, dice) in &mut self.growths {
            deltas[*stat] = dice.roll();
        }
        deltas
    }

    /// Add `deltas` to the base values in one step.
    pub fn apply_deltas(&mut self, deltas: &StatArray<i32>) {
        for (stat, delta) in deltas.iter() {
            self.base[stat] = self.base[stat].saturating_add(delta);
        }
        self.enforce_hp_invariant();
    }

    /// First-use initialization: one growth roll on top of the base values,
    /// level 1, no experience and full health.
    ///
    /// Calling it again is a no-op.
    pub fn init(&mut self) {
        if self.initialized {
            return;
        }
        let deltas = self.roll_growth();
        self.apply_deltas(&deltas);
        self.level = 1;
        self.exp = 0;
        self.restore_hp();
        self.initialized = true;
    }

    /// Set `HpCur` to `HpMax`.
    pub fn restore_hp(&mut self) {
        self.base[StatId::HpCur] = self.base[StatId::HpMax].max(0);
    }

    /// Zero every base value, keeping dice, rates and modifiers.
    pub fn zero_stats(&mut self) {
        self.base = StatArray::default();
    }

    /// Copy this table for another unit of the same archetype.
    ///
    /// Base values, rates, growth specs and progression are copied; each
    /// die gets a new stream derived from `seed`, and modifiers are not
    /// carried over since they belong to whoever registered them.
    pub fn duplicate(&self, seed: u64) -> Self {
        let growths = self
            .growths
            .iter()
            .enumerate()
            .map(|(i, (stat, dice))| (*stat, dice.reseeded(seed.wrapping_add(i as u64))))
            .collect();
        Self {
            base: self.base,
            rates: self.rates,
            growths,
            modifiers: ModifierSet::new(),
            level: self.level,
            exp: self.exp,
            next_level_exp: self.next_level_exp,
            initialized: self.initialized,
        }
    }

    pub fn snapshot(&self) -> StatSnapshot {
        StatSnapshot {
            level: self.level,
            exp: self.exp,
            next_level_exp: self.next_level_exp,
            base: self.base,
            resolved: self.resolved_values(),
            rates: self.rates,
            modifier_count: self.modifiers.len(),
        }
    }

    fn enforce_hp_invariant(&mut self) {
        let max = self.base[StatId::HpMax].max(0);
        self.base[StatId::HpMax] = max;
        self.base[StatId::HpCur] = self.base[StatId::HpCur].clamp(0, max);
    }
}

/// Read-only copy of a stat table, handed to observers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatSnapshot {
    pub level: u32,
    pub exp: i64,
    pub next_level_exp: i64,
    pub base: StatArray<i32>,
    pub resolved: StatArray<i32>,
    pub rates: RateArray<f64>,
    pub modifier_count: usize,
}

impl StatSnapshot {
    pub fn hp(&self) -> (i32, i32) {
        (self.base[StatId::HpCur], self.base[StatId::HpMax])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dice::GrowthRate;
    use crate::modifier::ModifierIdAllocator;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_new_table_is_zero() {
        let table = StatTable::new();
        for id in StatId::all() {
            assert_eq!(table.base(id), 0);
            assert_eq!(table.resolved(id), 0);
        }
        assert_eq!(table.level(), 0);
        assert!(!table.is_initialized());
    }

    #[test]
    fn test_two_pass_resolution() {
        let mut ids = ModifierIdAllocator::new();
        let mut table = StatTable::new();
        table.set_base(StatId::Attack, 10);
        table.add_modifier(Modifier::incremental(ids.next_id()).with(StatId::Attack, 5));
        table.add_modifier(
            Modifier::multiplicative(ids.next_id()).with_factor(StatId::Attack, 0.5),
        );
        assert_eq!(table.resolved(StatId::Attack), 22);
        assert_eq!(table.base(StatId::Attack), 10);
    }

    #[test]
    fn test_additive_deltas_are_not_individually_multiplied() {
        let mut ids = ModifierIdAllocator::new();
        let mut table = StatTable::new();
        table.set_base(StatId::Special, 4);
        table.add_modifier(Modifier::incremental(ids.next_id()).with(StatId::Special, 3));
        table.add_modifier(Modifier::incremental(ids.next_id()).with(StatId::Special, 3));
        table.add_modifier(
            Modifier::multiplicative(ids.next_id()).with_factor(StatId::Special, 1.0),
        );
        table.add_modifier(
            Modifier::multiplicative(ids.next_id()).with_factor(StatId::Special, 1.0),
        );
        // (4 + 3 + 3) * (1 + 2)
        assert_eq!(table.resolved(StatId::Special), 30);
    }

    #[test]
    fn test_negative_resolution_truncates_toward_zero() {
        let mut ids = ModifierIdAllocator::new();
        let mut table = StatTable::new();
        table.set_base(StatId::Speed, 3);
        table.add_modifier(Modifier::incremental(ids.next_id()).with(StatId::Speed, -8));
        table.add_modifier(
            Modifier::multiplicative(ids.next_id()).with_factor(StatId::Speed, 0.5),
        );
        // -5 * 1.5 = -7.5
        assert_eq!(table.resolved(StatId::Speed), -7);
    }

    #[test]
    fn test_duplicate_modifier_same_effect() {
        let mut ids = ModifierIdAllocator::new();
        let buff = Modifier::incremental(ids.next_id()).with(StatId::Attack, 5);
        let mut once = StatTable::new();
        once.set_base(StatId::Attack, 10);
        let mut twice = StatTable::new();
        twice.set_base(StatId::Attack, 10);

        once.add_modifier(buff.clone());
        twice.add_modifier(buff.clone());
        twice.add_modifier(buff);
        assert_eq!(once.resolved(StatId::Attack), twice.resolved(StatId::Attack));
    }

    #[test]
    fn test_stale_modifier_persists_until_removed() {
        let mut ids = ModifierIdAllocator::new();
        let buff = Modifier::incremental(ids.next_id()).with(StatId::Attack, 5);
        let mut table = StatTable::new();
        table.add_modifier(buff.clone());
        table.set_base(StatId::Attack, 1);
        table.apply_deltas(&StatArray::splat(1));
        assert_eq!(table.resolved(StatId::Attack), 7);

        table.remove_modifier(buff.id());
        assert_eq!(table.resolved(StatId::Attack), 2);
    }

    #[test]
    fn test_hp_invariant_on_set() {
        let mut table = StatTable::new();
        table.set_base(StatId::HpMax, 20);
        table.set_base(StatId::HpCur, 50);
        assert_eq!(table.base(StatId::HpCur), 20);
        table.set_base(StatId::HpCur, -3);
        assert_eq!(table.base(StatId::HpCur), 0);
        table.set_base(StatId::HpCur, 15);
        table.set_base(StatId::HpMax, 10);
        assert_eq!(table.base(StatId::HpCur), 10);
    }

    #[test]
    fn test_negative_rate_is_normalized() {
        let mut table = StatTable::new();
        table.set_rate(RateId::Attack, -1.5);
        assert_eq!(table.rate(RateId::Attack), 1.5);
        table.set_rate(RateId::Attack, f64::NAN);
        assert_eq!(table.rate(RateId::Attack), 0.0);
    }

    #[test]
    fn test_init_rolls_growth_once() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut table = StatTable::new().with_growths(
            &[
                StatGrowth::from_notation(StatId::HpMax, "2D6+3"),
                StatGrowth::from_rate(StatId::Attack, GrowthRate::Flat),
            ],
            &mut rng,
        );
        table.set_base(StatId::HpMax, 100);
        table.init();

        let hp_max = table.base(StatId::HpMax);
        assert!((105..=115).contains(&hp_max));
        assert_eq!(table.base(StatId::HpCur), hp_max);
        assert_eq!(table.base(StatId::Attack), 1);
        assert_eq!(table.base(StatId::Speed), 0);
        assert_eq!(table.level(), 1);

        table.init();
        assert_eq!(table.base(StatId::HpMax), hp_max);
    }

    #[test]
    fn test_duplicate_diverges() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut original = StatTable::new().with_growths(
            &[StatGrowth::from_notation(StatId::Attack, "10D10")],
            &mut rng,
        );
        original.set_base(StatId::Attack, 3);
        original.set_rate(RateId::Attack, 1.25);

        let mut ids = ModifierIdAllocator::new();
        original.add_modifier(Modifier::incremental(ids.next_id()).with(StatId::Attack, 1));

        let mut copy = original.duplicate(999);
        assert_eq!(copy.base(StatId::Attack), 3);
        assert_eq!(copy.rate(RateId::Attack), 1.25);
        assert!(copy.modifiers().is_empty());
        assert_eq!(copy.growth(StatId::Attack), original.growth(StatId::Attack));

        let a: Vec<i32> = (0..10).map(|_| original.roll_growth()[StatId::Attack]).collect();
        let b: Vec<i32> = (0..10).map(|_| copy.roll_growth()[StatId::Attack]).collect();
        assert_ne!(a, b);

        copy.set_base(StatId::Attack, 50);
        assert_eq!(original.base(StatId::Attack), 3);
    }

    #[test]
    fn test_snapshot_reflects_modifiers() {
        let mut ids = ModifierIdAllocator::new();
        let mut table = StatTable::new();
        table.set_base(StatId::HpMax, 30);
        table.restore_hp();
        table.add_modifier(Modifier::incremental(ids.next_id()).with(StatId::HpMax, 10));

        let snapshot = table.snapshot();
        assert_eq!(snapshot.hp(), (30, 30));
        assert_eq!(snapshot.resolved[StatId::HpMax], 40);
        assert_eq!(snapshot.modifier_count, 1);
    }
}
