//! # wavecore - Deterministic Stat, Cooldown and Progression Engine
//!
//! The numeric core of a wave-based auto-battler:
//! - **Stats** with two-pass modifier resolution (additive, then one
//!   summed multiplier)
//! - **Growth dice** parsed from compact notation (`"2D6+3"`)
//! - **Cooldowns** driven by explicit ticks with pause/resume/reset
//! - **Targeting** by range class and faction against an injected
//!   collision query
//! - **Progression** with cascading level-ups and an experience curve
//!
//! Everything is single-threaded and tick-driven. Randomness comes from a
//! seeded stream owned by the [`Engine`], so a run is reproducible from its
//! [`EngineConfig::seed`].
//!
//! ## Stat Resolution
//!
//! ```text
//! stats = base + Σ incremental
//! total = stats + stats × Σ multiplicative      (truncated toward zero)
//! ```
//!
//! ## Example
//!
//! ```rust
//! use wavecore::*;
//!
//! let mut engine = Engine::new(EngineConfig::default().with_seed(1));
//!
//! let spec = EntitySpec::new("knight", Faction::Player)
//!     .with_base(StatId::HpMax, 40)
//!     .with_base(StatId::Attack, 10)
//!     .with_rate(RateId::Attack, 1.0)
//!     .with_attack(Action::MultiTargetAttack { max_targets: 5 });
//! let knight = engine.spawn(&spec);
//!
//! let rage = Modifier::incremental(engine.next_modifier_id()).with(StatId::Attack, 5);
//! let focus = Modifier::multiplicative(engine.next_modifier_id())
//!     .with_factor(StatId::Attack, 0.5);
//! engine.add_modifier(knight, rage).unwrap();
//! engine.add_modifier(knight, focus).unwrap();
//!
//! // (10 + 5) * (1 + 0.5)
//! assert_eq!(engine.get_resolved_stat(knight, StatId::Attack).unwrap(), 22);
//! ```
//!
//! ## Modules
//!
//! - [`stat_id`] - Stat and rate identifiers, fixed-size stat arrays
//! - [`dice`] - Growth dice and notation parsing
//! - [`modifier`] - Incremental and multiplicative modifiers
//! - [`stats`] - Per-entity stat table
//! - [`cooldown`] - Tick-driven cooldown timers
//! - [`progression`] - Experience, level-ups and the experience pool
//! - [`targeting`] - Range/facing target selection
//! - [`combat`] - Damage and healing
//! - [`action`] - Action strategies and presentation triggers
//! - [`entity`] - Combat units
//! - [`archetype`] - JSON unit templates
//! - [`wave`] - Wave composition
//! - [`engine`] - The simulation service object
//! - [`config`] - Tunable constants
//! - [`error`] - Error types

pub mod action;
pub mod archetype;
pub mod combat;
pub mod config;
pub mod cooldown;
pub mod dice;
pub mod engine;
pub mod entity;
pub mod error;
pub mod modifier;
pub mod progression;
pub mod stat_id;
pub mod stats;
pub mod targeting;
pub mod wave;

// Re-export main types for convenience
pub use action::{
    Action, ActionContext, ActionOutcome, ActionStrategy, Effect, NullSink, PresentationSink,
    TracingSink, Trigger,
};
pub use archetype::Archetype;
pub use combat::{CombatResolver, HpTransition};
pub use config::{EngineConfig, RangeDistances};
pub use cooldown::{CooldownTimer, TickOutcome, TimerKind, TimerState};
pub use dice::{Dice, DiceSpec, GrowthRate, StatGrowth};
pub use engine::Engine;
pub use entity::{Entity, EntityHandle, EntitySpec};
pub use error::EngineError;
pub use modifier::{
    Modifier, ModifierEffect, ModifierId, ModifierIdAllocator, ModifierKind, ModifierSet,
};
pub use progression::{ExperienceCurve, ExperiencePool, LevelUp, PoolSettings, ProgressionEngine};
pub use stat_id::{RateArray, RateId, StatArray, StatId};
pub use stats::{StatSnapshot, StatTable};
pub use targeting::{
    CollisionQuery, Direction, Faction, LayerMask, NoCollisions, Position, RangeClass, Ray,
    Scanner, TargetResolver,
};
pub use wave::{Wave, WaveBuilder, WavePlan};
