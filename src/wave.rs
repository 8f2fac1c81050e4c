//! Wave composition.
//!
//! Early waves introduce one archetype at a time: wave `n` is made only of
//! the `n`-th archetype. Once every archetype has been shown, units are
//! drawn uniformly at random. Enemies are pre-leveled to the average party
//! level times the wave number, and all units of one archetype share a
//! single level-up roll so that they are identical.

use crate::archetype::Archetype;
use crate::entity::EntityHandle;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Input for one wave.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WavePlan {
    /// 1-based wave number.
    pub wave: u32,
    /// Units to spawn.
    pub count: usize,
    pub archetypes: Vec<Archetype>,
}

/// Picks archetypes and levels for a [`WavePlan`].
///
/// # Examples
///
/// ```rust
/// use wavecore::{Archetype, WaveBuilder, WavePlan};
/// use rand::SeedableRng;
///
/// let grunt = Archetype::from_json(r#"{ "name": "grunt", "faction": "enemy" }"#).unwrap();
/// let brute = Archetype::from_json(r#"{ "name": "brute", "faction": "enemy" }"#).unwrap();
/// let plan = WavePlan { wave: 2, count: 3, archetypes: vec![grunt, brute] };
///
/// let builder = WaveBuilder::new(&plan);
/// let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(0);
/// assert_eq!(builder.picks(&mut rng), vec![1, 1, 1]);
/// assert_eq!(builder.enemy_level(3), 6);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct WaveBuilder<'a> {
    plan: &'a WavePlan,
}

impl<'a> WaveBuilder<'a> {
    pub fn new(plan: &'a WavePlan) -> Self {
        Self { plan }
    }

    pub fn plan(&self) -> &'a WavePlan {
        self.plan
    }

    /// Levels to grant each enemy: average party level times the wave
    /// number, at least 1.
    pub fn enemy_level(&self, average_party_level: u32) -> u32 {
        average_party_level
            .max(1)
            .saturating_mul(self.plan.wave.max(1))
    }

    /// Archetype index for every unit in the wave.
    pub fn picks(&self, rng: &mut impl Rng) -> Vec<usize> {
        let available = self.plan.archetypes.len();
        if available == 0 {
            return Vec::new();
        }
        let wave = self.plan.wave as usize;
        if wave >= 1 && wave <= available {
            vec![wave - 1; self.plan.count]
        } else {
            (0..self.plan.count)
                .map(|_| rng.gen_range(0..available))
                .collect()
        }
    }
}

/// Handles spawned for a wave.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wave {
    pub number: u32,
    pub units: Vec<EntityHandle>,
}
