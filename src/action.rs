//! Unit actions.
//!
//! What a unit does when a cooldown completes is data, not a subclass: each
//! entity carries an [`ActionStrategy`] with one [`Action`] for its attack
//! timer and one for its special timer. Resolving an action is pure; it
//! returns the [`Effect`]s to apply and the [`Trigger`]s to announce, and
//! the engine applies them.

use crate::entity::EntityHandle;
use serde::{Deserialize, Serialize};

/// Presentation cue, sent fire-and-forget to a [`PresentationSink`].
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Trigger {
    Attack,
    Special,
    Projectile,
    Heal,
    Death,
    LevelUp,
    /// The leader fell and every unit is paused.
    GameOver,
}

/// Receives presentation cues. Nothing it does feeds back into the engine.
pub trait PresentationSink {
    fn trigger(&mut self, source: EntityHandle, trigger: Trigger);
}

/// Drops every cue.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl PresentationSink for NullSink {
    fn trigger(&mut self, _source: EntityHandle, _trigger: Trigger) {}
}

/// Logs every cue as a `debug` event. Handy for headless runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl PresentationSink for TracingSink {
    fn trigger(&mut self, source: EntityHandle, trigger: Trigger) {
        tracing::debug!(%source, trigger = trigger.as_ref(), "presentation trigger");
    }
}

/// A single thing a unit can do.
///
/// Hostile actions take their power from the resolved Attack stat; heals
/// take theirs from the resolved Special stat.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    /// Does nothing; the timer just cycles.
    #[default]
    None,
    /// Hit the nearest target.
    MeleeAttack,
    /// Fire `volleys` projectiles at the nearest target, each dealing
    /// `attack × power_multiplier` (truncated).
    ProjectileAttack { power_multiplier: f64, volleys: u32 },
    /// Hit up to `max_targets` targets, nearest first.
    MultiTargetAttack { max_targets: usize },
    /// Heal every active ally, the caster included.
    AreaHeal,
}

/// HP change produced by an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    Damage { target: EntityHandle, amount: i32 },
    Heal { target: EntityHandle, amount: i32 },
}

/// Inputs an action resolves against.
#[derive(Debug, Clone, Copy)]
pub struct ActionContext<'a> {
    /// Resolved Attack of the actor.
    pub attack: i32,
    /// Resolved Special of the actor.
    pub special: i32,
    /// Hostile candidates, nearest first.
    pub targets: &'a [EntityHandle],
    /// Active allies including the actor.
    pub allies: &'a [EntityHandle],
}

/// What firing an action produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActionOutcome {
    pub triggers: Vec<Trigger>,
    pub effects: Vec<Effect>,
}

impl Action {
    /// Whether the action can only fire with a hostile target in range.
    pub fn needs_target(&self) -> bool {
        matches!(
            self,
            Action::MeleeAttack | Action::ProjectileAttack { .. } | Action::MultiTargetAttack { .. }
        )
    }

    /// Effects and extra cues of this action.
    ///
    /// Returns `None` when the action needs a target and there is none.
    pub fn resolve(&self, ctx: &ActionContext<'_>) -> Option<ActionOutcome> {
        if self.needs_target() && ctx.targets.is_empty() {
            return None;
        }

        let mut outcome = ActionOutcome::default();
        match *self {
            Action::None => {}
            Action::MeleeAttack => {
                outcome.effects.push(Effect::Damage {
                    target: ctx.targets[0],
                    amount: ctx.attack,
                });
            }
            Action::ProjectileAttack {
                power_multiplier,
                volleys,
            } => {
                let power = scaled(ctx.attack, power_multiplier);
                for _ in 0..volleys {
                    outcome.triggers.push(Trigger::Projectile);
                    outcome.effects.push(Effect::Damage {
                        target: ctx.targets[0],
                        amount: power,
                    });
                }
            }
            Action::MultiTargetAttack { max_targets } => {
                for target in ctx.targets.iter().take(max_targets) {
                    outcome.effects.push(Effect::Damage {
                        target: *target,
                        amount: ctx.attack,
                    });
                }
            }
            Action::AreaHeal => {
                for ally in ctx.allies {
                    outcome.triggers.push(Trigger::Heal);
                    outcome.effects.push(Effect::Heal {
                        target: *ally,
                        amount: ctx.special,
                    });
                }
            }
        }
        Some(outcome)
    }
}

fn scaled(power: i32, multiplier: f64) -> i32 {
    let value = f64::from(power) * multiplier;
    if value.is_nan() {
        0
    } else {
        value as i32
    }
}

/// An entity's pair of actions.
///
/// # Examples
///
/// ```rust
/// use wavecore::{Action, ActionContext, ActionStrategy, Effect, EntityHandle, Trigger};
///
/// let archer = ActionStrategy::new(
///     Action::ProjectileAttack { power_multiplier: 1.0, volleys: 1 },
///     Action::ProjectileAttack { power_multiplier: 1.5, volleys: 1 },
/// );
/// let targets = [EntityHandle(3)];
/// let ctx = ActionContext { attack: 9, special: 0, targets: &targets, allies: &[] };
///
/// let special = archer.on_special_ready(&ctx).unwrap();
/// assert_eq!(special.triggers, vec![Trigger::Special, Trigger::Projectile]);
/// assert_eq!(special.effects, vec![Effect::Damage { target: EntityHandle(3), amount: 13 }]);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionStrategy {
    pub attack: Action,
    pub special: Action,
}

impl ActionStrategy {
    pub fn new(attack: Action, special: Action) -> Self {
        Self { attack, special }
    }

    /// Resolve the attack slot; the outcome leads with [`Trigger::Attack`].
    pub fn on_attack_ready(&self, ctx: &ActionContext<'_>) -> Option<ActionOutcome> {
        fire(self.attack, Trigger::Attack, ctx)
    }

    /// Resolve the special slot; the outcome leads with [`Trigger::Special`].
    pub fn on_special_ready(&self, ctx: &ActionContext<'_>) -> Option<ActionOutcome> {
        fire(self.special, Trigger::Special, ctx)
    }
}

fn fire(action: Action, cue: Trigger, ctx: &ActionContext<'_>) -> Option<ActionOutcome> {
    let mut outcome = action.resolve(ctx)?;
    if action != Action::None {
        outcome.triggers.insert(0, cue);
    }
    Some(outcome)
}
