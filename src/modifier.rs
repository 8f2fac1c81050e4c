//! Stat modifiers module.
//!
//! A modifier is an adjustment registered on top of a stat table's base
//! values. Incremental modifiers add a flat delta per stat; multiplicative
//! modifiers contribute a factor per stat. Modifiers are identified by a
//! `ModifierId`, so registering the same modifier twice is a no-op.

use crate::stat_id::{StatArray, StatId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a registered modifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ModifierId(pub u64);

impl fmt::Display for ModifierId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "mod#{}", self.0)
    }
}

/// Hands out increasing modifier ids.
///
/// Owned by whoever creates modifiers (usually the [`Engine`](crate::Engine));
/// there is no process-wide counter.
#[derive(Debug, Clone, Default)]
pub struct ModifierIdAllocator {
    next: u64,
}

impl ModifierIdAllocator {
    /// Start allocating from zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Hand out the next unused id.
    pub fn next_id(&mut self) -> ModifierId {
        let id = ModifierId(self.next);
        self.next += 1;
        id
    }
}

/// How a modifier combines with base values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModifierKind {
    /// Adds its delta to the base value.
    Incremental,
    /// Its factors are summed and scale the post-additive value.
    Multiplicative,
}

/// Per-stat payload of a modifier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "deltas", rename_all = "snake_case")]
pub enum ModifierEffect {
    Incremental(StatArray<i32>),
    Multiplicative(StatArray<f64>),
}

/// A registered adjustment to one or more stats.
///
/// # Examples
///
/// ```rust
/// use wavecore::{Modifier, ModifierIdAllocator, ModifierKind, StatId};
///
/// let mut ids = ModifierIdAllocator::new();
/// let rage = Modifier::incremental(ids.next_id()).with(StatId::Attack, 5);
/// let haste = Modifier::multiplicative(ids.next_id()).with_factor(StatId::Speed, 0.5);
///
/// assert_eq!(rage.kind(), ModifierKind::Incremental);
/// assert_eq!(rage.increment(StatId::Attack), 5);
/// assert_eq!(haste.factor(StatId::Speed), 0.5);
/// assert_ne!(rage.id(), haste.id());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Modifier {
    id: ModifierId,
    effect: ModifierEffect,
}

impl Modifier {
    /// An incremental modifier with all deltas at zero.
    pub fn incremental(id: ModifierId) -> Self {
        Self {
            id,
            effect: ModifierEffect::Incremental(StatArray::default()),
        }
    }

    /// A multiplicative modifier with all factors at zero.
    pub fn multiplicative(id: ModifierId) -> Self {
        Self {
            id,
            effect: ModifierEffect::Multiplicative(StatArray::default()),
        }
    }

    /// Set the flat delta for `stat`. Ignored on multiplicative modifiers.
    pub fn with(mut self, stat: StatId, delta: i32) -> Self {
        if let ModifierEffect::Incremental(deltas) = &mut self.effect {
            deltas[stat] = delta;
        }
        self
    }

    /// Set the factor for `stat` (`0.5` means +50%). Ignored on incremental
    /// modifiers.
    pub fn with_factor(mut self, stat: StatId, factor: f64) -> Self {
        if let ModifierEffect::Multiplicative(factors) = &mut self.effect {
            factors[stat] = factor;
        }
        self
    }

    pub fn id(&self) -> ModifierId {
        self.id
    }

    pub fn kind(&self) -> ModifierKind {
        match self.effect {
            ModifierEffect::Incremental(_) => ModifierKind::Incremental,
            ModifierEffect::Multiplicative(_) => ModifierKind::Multiplicative,
        }
    }

    pub fn effect(&self) -> &ModifierEffect {
        &self.effect
    }

    /// Flat delta for `stat`, 0 for multiplicative modifiers.
    pub fn increment(&self, stat: StatId) -> i32 {
        match &self.effect {
            ModifierEffect::Incremental(deltas) => deltas[stat],
            ModifierEffect::Multiplicative(_) => 0,
        }
    }

    /// Factor for `stat`, 0.0 for incremental modifiers.
    pub fn factor(&self, stat: StatId) -> f64 {
        match &self.effect {
            ModifierEffect::Multiplicative(factors) => factors[stat],
            ModifierEffect::Incremental(_) => 0.0,
        }
    }
}

/// Ordered set of active modifiers, keyed by identity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModifierSet {
    modifiers: Vec<Modifier>,
}

impl ModifierSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a modifier. Returns `false` if its id is already present.
    pub fn add(&mut self, modifier: Modifier) -> bool {
        if self.contains(modifier.id()) {
            return false;
        }
        self.modifiers.push(modifier);
        true
    }

    /// Unregister by id. Returns `false` if it was not registered.
    pub fn remove(&mut self, id: ModifierId) -> bool {
        let before = self.modifiers.len();
        self.modifiers.retain(|m| m.id() != id);
        self.modifiers.len() != before
    }

    pub fn clear(&mut self) {
        self.modifiers.clear();
    }

    pub fn contains(&self, id: ModifierId) -> bool {
        self.modifiers.iter().any(|m| m.id() == id)
    }

    pub fn len(&self) -> usize {
        self.modifiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modifiers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Modifier> {
        self.modifiers.iter()
    }

    /// Sum of incremental deltas for `stat`.
    pub fn total_increment(&self, stat: StatId) -> i64 {
        self.modifiers
            .iter()
            .map(|m| i64::from(m.increment(stat)))
            .sum()
    }

    /// Sum of multiplicative factors for `stat`.
    pub fn total_factor(&self, stat: StatId) -> f64 {
        self.modifiers.iter().map(|m| m.factor(stat)).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocator_is_monotonic() {
        let mut ids = ModifierIdAllocator::new();
        let a = ids.next_id();
        let b = ids.next_id();
        assert!(b > a);
    }

    #[test]
    fn test_builder_ignores_mismatched_kind() {
        let mut ids = ModifierIdAllocator::new();
        let m = Modifier::incremental(ids.next_id()).with_factor(StatId::Attack, 2.0);
        assert_eq!(m.factor(StatId::Attack), 0.0);
        let m = Modifier::multiplicative(ids.next_id()).with(StatId::Attack, 3);
        assert_eq!(m.increment(StatId::Attack), 0);
    }

    #[test]
    fn test_duplicate_add_is_noop() {
        let mut ids = ModifierIdAllocator::new();
        let m = Modifier::incremental(ids.next_id()).with(StatId::Attack, 5);
        let mut set = ModifierSet::new();
        assert!(set.add(m.clone()));
        assert!(!set.add(m));
        assert_eq!(set.len(), 1);
        assert_eq!(set.total_increment(StatId::Attack), 5);
    }

    #[test]
    fn test_remove_and_clear() {
        let mut ids = ModifierIdAllocator::new();
        let a = Modifier::incremental(ids.next_id()).with(StatId::HpMax, 10);
        let b = Modifier::multiplicative(ids.next_id()).with_factor(StatId::HpMax, 0.25);
        let mut set = ModifierSet::new();
        set.add(a.clone());
        set.add(b.clone());

        assert!(set.remove(a.id()));
        assert!(!set.remove(a.id()));
        assert_eq!(set.total_increment(StatId::HpMax), 0);
        assert_eq!(set.total_factor(StatId::HpMax), 0.25);

        set.clear();
        assert!(set.is_empty());
    }

    #[test]
    fn test_factors_sum_not_compound() {
        let mut ids = ModifierIdAllocator::new();
        let mut set = ModifierSet::new();
        set.add(Modifier::multiplicative(ids.next_id()).with_factor(StatId::Attack, 0.5));
        set.add(Modifier::multiplicative(ids.next_id()).with_factor(StatId::Attack, 0.5));
        assert_eq!(set.total_factor(StatId::Attack), 1.0);
    }
}
