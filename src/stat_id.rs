//! Stat identifier module.
//!
//! Provides the closed `StatId` and `RateId` enumerations and the
//! fixed-size arrays indexed by them. Stats live in arrays keyed by the
//! enumeration's ordinal rather than in hash maps, so lookups on the hot
//! path are a bounds-checked index.

use serde::{Deserialize, Serialize};
use std::ops::{Index, IndexMut};
use strum::{EnumCount, IntoEnumIterator};

/// Identifier for an integer stat.
///
/// # Examples
///
/// ```rust
/// use wavecore::StatId;
///
/// let hp: StatId = "hp_max".parse().unwrap();
/// assert_eq!(hp, StatId::HpMax);
/// assert_eq!(hp.to_string(), "hp_max");
/// ```
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
    strum::EnumIter,
    strum::EnumCount,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum StatId {
    /// Current hit points. Always kept within `0..=HpMax`.
    HpCur,
    /// Maximum hit points.
    HpMax,
    /// Attack power.
    Attack,
    /// Special power (heals, special attacks).
    Special,
    /// Movement speed.
    Speed,
    /// Experience growth stat.
    Experience,
}

impl StatId {
    /// Ordinal of this stat, used to index [`StatArray`].
    pub fn index(self) -> usize {
        self as usize
    }

    /// Iterate every stat in declaration order.
    pub fn all() -> impl Iterator<Item = StatId> {
        StatId::iter()
    }
}

/// Identifier for a timing rate, measured in seconds.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
    strum::EnumIter,
    strum::EnumCount,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum RateId {
    /// Seconds between attacks.
    Attack,
    /// Seconds between specials.
    Special,
    /// Movement rate.
    Movement,
}

impl RateId {
    /// Dense ordinal, usable as an array index.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Every rate in declaration order.
    pub fn all() -> impl Iterator<Item = RateId> {
        RateId::iter()
    }
}

/// A value per [`StatId`], stored inline.
///
/// # Examples
///
/// ```rust
/// use wavecore::{StatArray, StatId};
///
/// let mut values = StatArray::<i32>::default();
/// values[StatId::Attack] = 12;
/// assert_eq!(values[StatId::Attack], 12);
/// assert_eq!(values[StatId::Speed], 0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatArray<T>([T; StatId::COUNT]);

impl<T: Copy> StatArray<T> {
    /// Create an array with every slot set to `value`.
    pub fn splat(value: T) -> Self {
        Self([value; StatId::COUNT])
    }

    /// Iterate `(id, value)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (StatId, T)> + '_ {
        StatId::iter().map(move |id| (id, self.0[id.index()]))
    }
}

impl<T: Copy + Default> Default for StatArray<T> {
    fn default() -> Self {
        Self::splat(T::default())
    }
}

impl<T> Index<StatId> for StatArray<T> {
    type Output = T;

    fn index(&self, id: StatId) -> &T {
        &self.0[id.index()]
    }
}

impl<T> IndexMut<StatId> for StatArray<T> {
    fn index_mut(&mut self, id: StatId) -> &mut T {
        &mut self.0[id.index()]
    }
}

/// A value per [`RateId`], stored inline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateArray<T>([T; RateId::COUNT]);

impl<T: Copy> RateArray<T> {
    /// Create an array with every slot set to `value`.
    pub fn splat(value: T) -> Self {
        Self([value; RateId::COUNT])
    }

    /// Iterate `(id, value)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (RateId, T)> + '_ {
        RateId::iter().map(move |id| (id, self.0[id.index()]))
    }
}

impl<T: Copy + Default> Default for RateArray<T> {
    fn default() -> Self {
        Self::splat(T::default())
    }
}

impl<T> Index<RateId> for RateArray<T> {
    type Output = T;

    fn index(&self, id: RateId) -> &T {
        &self.0[id.index()]
    }
}

impl<T> IndexMut<RateId> for RateArray<T> {
    fn index_mut(&mut self, id: RateId) -> &mut T {
        &mut self.0[id.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stat_id_ordinals_are_dense() {
        let ordinals: Vec<usize> = StatId::all().map(StatId::index).collect();
        assert_eq!(ordinals, (0..StatId::COUNT).collect::<Vec<_>>());
    }

    #[test]
    fn test_stat_id_parse_is_case_insensitive() {
        assert_eq!("HP_CUR".parse::<StatId>().unwrap(), StatId::HpCur);
        assert_eq!("attack".parse::<StatId>().unwrap(), StatId::Attack);
        assert!("mana".parse::<StatId>().is_err());
    }

    #[test]
    fn test_rate_array_index() {
        let mut rates = RateArray::<f64>::default();
        rates[RateId::Special] = 2.5;
        assert_eq!(rates[RateId::Special], 2.5);
        assert_eq!(rates[RateId::Attack], 0.0);
    }

    #[test]
    fn test_stat_array_iter_order() {
        let mut values = StatArray::<i32>::default();
        values[StatId::Experience] = 7;
        let last = values.iter().last().unwrap();
        assert_eq!(last, (StatId::Experience, 7));
    }

    #[test]
    fn test_stat_id_serde_names() {
        let json = serde_json::to_string(&StatId::HpMax).unwrap();
        assert_eq!(json, "\"hp_max\"");
        let id: RateId = serde_json::from_str("\"movement\"").unwrap();
        assert_eq!(id, RateId::Movement);
    }
}
