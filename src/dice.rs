//! Growth dice module.
//!
//! Parses compact roll notation (`"<rolls>D<sides>[+|-<modifier>]"`) and
//! produces bounded random integers for stat growth. Parsing is total:
//! malformed notation falls back to `1D1+0`.

use crate::stat_id::StatId;
use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Parsed dice notation: `rolls` dice of `sides` sides, plus `modifier`.
///
/// # Examples
///
/// ```rust
/// use wavecore::DiceSpec;
///
/// let spec = DiceSpec::parse("2D6+3");
/// assert_eq!((spec.rolls, spec.sides, spec.modifier), (2, 6, 3));
/// assert_eq!(spec.range(), (5, 15));
///
/// // Garbage falls back to 1D1
/// assert_eq!(DiceSpec::parse("fireball"), DiceSpec::default());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DiceSpec {
    /// Number of dice, at least 1.
    pub rolls: u32,
    /// Sides per die, at least 1.
    pub sides: u32,
    /// Flat amount added to the sum (negative for `-`).
    pub modifier: i32,
}

impl Default for DiceSpec {
    fn default() -> Self {
        Self {
            rolls: 1,
            sides: 1,
            modifier: 0,
        }
    }
}

impl DiceSpec {
    /// Create a spec from raw parts. Zero rolls or sides are raised to 1.
    pub fn new(rolls: u32, sides: u32, modifier: i32) -> Self {
        Self {
            rolls: rolls.max(1),
            sides: sides.max(1),
            modifier,
        }
    }

    /// Parse dice notation.
    ///
    /// The first `<rolls>D` occurrence in the string wins (the `D` is
    /// case-insensitive and counts never start with `0`). A missing sides
    /// group means 1 side, a missing or malformed modifier means 0, and a
    /// string with no match at all yields `1D1+0`.
    pub fn parse(notation: &str) -> Self {
        let bytes = notation.as_bytes();
        let mut start = 0;

        while start < bytes.len() {
            if let Some(spec) = Self::match_at(bytes, start) {
                return spec;
            }
            start += 1;
        }

        Self::default()
    }

    fn match_at(bytes: &[u8], start: usize) -> Option<Self> {
        let rolls_end = count_run(bytes, start)?;
        if !matches!(bytes.get(rolls_end), Some(b'd') | Some(b'D')) {
            return None;
        }

        let mut spec = Self::default();
        if let Some(rolls) = parse_number(&bytes[start..rolls_end]) {
            spec.rolls = rolls;
        }

        let mut cursor = rolls_end + 1;
        if let Some(sides_end) = count_run(bytes, cursor) {
            if let Some(sides) = parse_number(&bytes[cursor..sides_end]) {
                spec.sides = sides;
            }
            cursor = sides_end;
        }

        let sign = match bytes.get(cursor) {
            Some(b'+') => 1,
            Some(b'-') => -1,
            _ => return Some(spec),
        };
        if let Some(modifier_end) = count_run(bytes, cursor + 1) {
            if let Some(modifier) = parse_number::<i32>(&bytes[cursor + 1..modifier_end]) {
                spec.modifier = sign * modifier;
            }
        }

        Some(spec)
    }

    /// Inclusive `(min, max)` range of a roll.
    pub fn range(&self) -> (i64, i64) {
        let rolls = i64::from(self.rolls);
        let modifier = i64::from(self.modifier);
        (rolls + modifier, rolls * i64::from(self.sides) + modifier)
    }
}

impl fmt::Display for DiceSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}D{}", self.rolls, self.sides)?;
        match self.modifier {
            0 => Ok(()),
            m if m > 0 => write!(f, "+{}", m),
            m => write!(f, "{}", m),
        }
    }
}

/// End index of a `[1-9][0-9]*` run starting at `start`.
fn count_run(bytes: &[u8], start: usize) -> Option<usize> {
    match bytes.get(start) {
        Some(b'1'..=b'9') => {}
        _ => return None,
    }
    let len = bytes[start..]
        .iter()
        .take_while(|b| b.is_ascii_digit())
        .count();
    Some(start + len)
}

fn parse_number<T: std::str::FromStr>(digits: &[u8]) -> Option<T> {
    std::str::from_utf8(digits).ok()?.parse().ok()
}

/// A die set with its own random stream.
///
/// Each `Dice` owns a `ChaCha8Rng`; rolls from one instance advance one
/// stream, and two instances seeded differently are independent.
///
/// # Examples
///
/// ```rust
/// use wavecore::Dice;
///
/// let mut dice = Dice::with_seed("3d4-2", 7);
/// for _ in 0..100 {
///     let roll = dice.roll();
///     assert!((1..=10).contains(&roll));
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Dice {
    spec: DiceSpec,
    rng: ChaCha8Rng,
}

impl Dice {
    /// Create dice from a spec and an explicit seed.
    pub fn from_spec(spec: DiceSpec, seed: u64) -> Self {
        Self {
            spec,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Parse `notation` and seed the stream with `seed`.
    pub fn with_seed(notation: &str, seed: u64) -> Self {
        Self::from_spec(DiceSpec::parse(notation), seed)
    }

    /// Create dice whose stream is seeded from `rng`.
    pub fn from_rng(spec: DiceSpec, rng: &mut impl RngCore) -> Self {
        Self::from_spec(spec, rng.next_u64())
    }

    /// The parsed notation these dice roll.
    pub fn spec(&self) -> DiceSpec {
        self.spec
    }

    /// Roll every die, sum the faces and add the modifier.
    pub fn roll(&mut self) -> i32 {
        let faces: i64 = (0..self.spec.rolls)
            .map(|_| i64::from(self.rng.gen_range(1..=self.spec.sides)))
            .sum();
        let total = faces + i64::from(self.spec.modifier);
        total.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
    }

    /// A copy of these dice on a fresh stream.
    pub fn reseeded(&self, seed: u64) -> Self {
        Self::from_spec(self.spec, seed)
    }
}

/// How quickly a stat grows per level.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum GrowthRate {
    Slow,
    Medium,
    Fast,
    Fastest,
    /// Always grows by exactly one.
    #[default]
    Flat,
}

impl GrowthRate {
    /// Dice notation for this rate.
    pub fn notation(self) -> &'static str {
        match self {
            GrowthRate::Slow => "1D3",
            GrowthRate::Medium => "2D3",
            GrowthRate::Fast => "3D2",
            GrowthRate::Fastest => "4D3",
            GrowthRate::Flat => "1D1",
        }
    }

    /// Parsed dice for this rate.
    pub fn spec(self) -> DiceSpec {
        DiceSpec::parse(self.notation())
    }
}

/// Growth registration for one stat.
///
/// An explicit, non-empty `notation` takes precedence over `rate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatGrowth {
    pub stat: StatId,
    #[serde(default)]
    pub rate: GrowthRate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notation: Option<String>,
}

impl StatGrowth {
    /// Grow `stat` at a named rate.
    pub fn from_rate(stat: StatId, rate: GrowthRate) -> Self {
        Self {
            stat,
            rate,
            notation: None,
        }
    }

    /// Grow `stat` with explicit dice notation such as `"2D6+1"`.
    pub fn from_notation(stat: StatId, notation: impl Into<String>) -> Self {
        Self {
            stat,
            rate: GrowthRate::default(),
            notation: Some(notation.into()),
        }
    }

    /// The dice to roll, preferring a non-empty notation over the rate.
    pub fn spec(&self) -> DiceSpec {
        match self.notation.as_deref() {
            Some(notation) if !notation.is_empty() => DiceSpec::parse(notation),
            _ => self.rate.spec(),
        }
    }
}
