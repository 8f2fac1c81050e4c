//! Entity module.
//!
//! An `Entity` is one combat unit: a stat table, an attack and a special
//! cooldown, a faction, a range class, an action strategy and a liveness
//! flag. All stat mutation goes through [`Entity::update_stats`], which
//! re-syncs the cooldown periods from the rate stats and notifies
//! subscribers once per change.

use crate::action::{Action, ActionStrategy};
use crate::combat::{CombatResolver, HpTransition};
use crate::cooldown::{CooldownTimer, TimerKind};
use crate::dice::{Dice, GrowthRate, StatGrowth};
use crate::progression::{ExperienceCurve, LevelUp, ProgressionEngine};
use crate::stat_id::{RateArray, RateId, StatArray, StatId};
use crate::stats::{StatSnapshot, StatTable};
use crate::targeting::{Faction, Position, RangeClass, Scanner};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque id of a spawned entity. Handles are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityHandle(pub u64);

impl fmt::Display for EntityHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "entity#{}", self.0)
    }
}

/// Stats observer.
pub type StatsObserver = Box<dyn FnMut(&StatSnapshot)>;

/// Cooldown progress observer, called with `progress` in `[0, 1]`.
pub type TimerObserver = Box<dyn FnMut(f64)>;

/// Everything needed to build an entity.
///
/// # Examples
///
/// ```rust
/// use wavecore::{Action, EntitySpec, Faction, GrowthRate, RangeClass, RateId, StatId};
///
/// let spec = EntitySpec::new("knight", Faction::Player)
///     .with_range(RangeClass::Short)
///     .with_attack(Action::MultiTargetAttack { max_targets: 5 })
///     .with_base(StatId::HpMax, 40)
///     .with_base(StatId::Attack, 6)
///     .with_rate(RateId::Attack, 1.2)
///     .with_growth_rate(StatId::HpMax, GrowthRate::Fast);
///
/// assert_eq!(spec.base[StatId::HpMax], 40);
/// assert_eq!(spec.growths.len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct EntitySpec {
    pub name: String,
    pub faction: Faction,
    pub range: RangeClass,
    pub strategy: ActionStrategy,
    pub base: StatArray<i32>,
    pub rates: RateArray<f64>,
    pub growths: Vec<StatGrowth>,
    /// Rolls the base experience when no fixed value is given.
    pub experience_rate: Option<GrowthRate>,
    /// Fixed base experience for the leveling curve. With neither this nor
    /// `experience_rate`, the engine curve's own base is used.
    pub base_experience: Option<i64>,
    pub position: Position,
}

impl EntitySpec {
    pub fn new(name: impl Into<String>, faction: Faction) -> Self {
        Self {
            name: name.into(),
            faction,
            range: RangeClass::default(),
            strategy: ActionStrategy::default(),
            base: StatArray::default(),
            rates: RateArray::default(),
            growths: Vec::new(),
            experience_rate: None,
            base_experience: None,
            position: Position::default(),
        }
    }

    pub fn with_range(mut self, range: RangeClass) -> Self {
        self.range = range;
        self
    }

    pub fn with_strategy(mut self, strategy: ActionStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_attack(mut self, action: Action) -> Self {
        self.strategy.attack = action;
        self
    }

    pub fn with_special(mut self, action: Action) -> Self {
        self.strategy.special = action;
        self
    }

    pub fn with_base(mut self, stat: StatId, value: i32) -> Self {
        self.base[stat] = value;
        self
    }

    pub fn with_rate(mut self, rate: RateId, seconds: f64) -> Self {
        self.rates[rate] = seconds;
        self
    }

    pub fn with_growth(mut self, growth: StatGrowth) -> Self {
        self.growths.push(growth);
        self
    }

    pub fn with_growth_notation(self, stat: StatId, notation: &str) -> Self {
        self.with_growth(StatGrowth::from_notation(stat, notation))
    }

    pub fn with_growth_rate(self, stat: StatId, rate: GrowthRate) -> Self {
        self.with_growth(StatGrowth::from_rate(stat, rate))
    }

    pub fn with_experience_rate(mut self, rate: GrowthRate) -> Self {
        self.experience_rate = Some(rate);
        self
    }

    pub fn with_base_experience(mut self, base_experience: i64) -> Self {
        self.base_experience = Some(base_experience);
        self
    }

    pub fn at(mut self, position: Position) -> Self {
        self.position = position;
        self
    }
}

/// A live combat unit.
pub struct Entity {
    handle: EntityHandle,
    name: String,
    faction: Faction,
    range: RangeClass,
    strategy: ActionStrategy,
    stats: StatTable,
    progression: ProgressionEngine,
    base_experience: i64,
    attack_timer: CooldownTimer,
    special_timer: CooldownTimer,
    active: bool,
    position: Position,
    observers: Vec<StatsObserver>,
    timer_observers: Vec<(TimerKind, TimerObserver)>,
    pending_attack: bool,
    pending_special: bool,
    stalled_attack: bool,
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entity")
            .field("handle", &self.handle)
            .field("name", &self.name)
            .field("faction", &self.faction)
            .field("active", &self.active)
            .field("stats", &self.stats)
            .field("attack_timer", &self.attack_timer)
            .field("special_timer", &self.special_timer)
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl Entity {
    /// Build and initialize an inactive entity.
    ///
    /// Growth dice and the experience roll draw their seeds from `rng`. The
    /// table gets one growth roll on top of `spec.base`, level 1 and full
    /// health; the first threshold comes from `curve` with this entity's
    /// base experience.
    pub fn new(
        handle: EntityHandle,
        spec: &EntitySpec,
        curve: ExperienceCurve,
        min_period: f64,
        rng: &mut impl RngCore,
    ) -> Self {
        let mut stats = StatTable::new().with_growths(&spec.growths, rng);
        for (stat, value) in spec.base.iter() {
            stats.set_base(stat, value);
        }
        for (rate, seconds) in spec.rates.iter() {
            stats.set_rate(rate, seconds);
        }
        stats.init();

        let base_experience = match (spec.base_experience, spec.experience_rate) {
            (Some(base), _) => base,
            (None, Some(rate)) => i64::from(Dice::from_rng(rate.spec(), rng).roll()),
            (None, None) => curve.base_experience,
        }
        .max(1);
        let progression = ProgressionEngine::new(curve.with_base(base_experience));
        progression.prime(&mut stats);

        let attack_timer =
            CooldownTimer::with_min_period(stats.rate(RateId::Attack), min_period);
        let special_timer =
            CooldownTimer::with_min_period(stats.rate(RateId::Special), min_period);

        Self {
            handle,
            name: spec.name.clone(),
            faction: spec.faction,
            range: spec.range,
            strategy: spec.strategy,
            stats,
            progression,
            base_experience,
            attack_timer,
            special_timer,
            active: false,
            position: spec.position,
            observers: Vec::new(),
            timer_observers: Vec::new(),
            pending_attack: false,
            pending_special: false,
            stalled_attack: false,
        }
    }

    pub fn handle(&self) -> EntityHandle {
        self.handle
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn faction(&self) -> Faction {
        self.faction
    }

    pub fn range(&self) -> RangeClass {
        self.range
    }

    pub fn strategy(&self) -> &ActionStrategy {
        &self.strategy
    }

    pub fn stats(&self) -> &StatTable {
        &self.stats
    }

    pub fn base_experience(&self) -> i64 {
        self.base_experience
    }

    pub fn progression(&self) -> &ProgressionEngine {
        &self.progression
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn set_position(&mut self, position: Position) {
        self.position = position;
    }

    pub fn resolved(&self, stat: StatId) -> i32 {
        self.stats.resolved(stat)
    }

    pub fn timer(&self, kind: TimerKind) -> &CooldownTimer {
        match kind {
            TimerKind::Attack => &self.attack_timer,
            TimerKind::Special => &self.special_timer,
        }
    }

    pub fn timer_mut(&mut self, kind: TimerKind) -> &mut CooldownTimer {
        match kind {
            TimerKind::Attack => &mut self.attack_timer,
            TimerKind::Special => &mut self.special_timer,
        }
    }

    pub fn is_pending(&self, kind: TimerKind) -> bool {
        match kind {
            TimerKind::Attack => self.pending_attack,
            TimerKind::Special => self.pending_special,
        }
    }

    pub(crate) fn set_pending(&mut self, kind: TimerKind, pending: bool) {
        match kind {
            TimerKind::Attack => self.pending_attack = pending,
            TimerKind::Special => self.pending_special = pending,
        }
    }

    /// Whether the attack timer is paused for lack of a target, as opposed
    /// to paused from outside.
    pub fn is_stalled(&self) -> bool {
        self.stalled_attack
    }

    pub(crate) fn set_stalled(&mut self, stalled: bool) {
        self.stalled_attack = stalled;
    }

    pub fn scanner(&self) -> Scanner {
        Scanner {
            active: self.active,
            position: self.position,
            faction: self.faction,
            range: self.range,
        }
    }

    /// Activate or deactivate.
    ///
    /// Deactivation pauses both timers. Elapsed time and pending actions are
    /// kept, so a unit paused with an action ready fires it once active
    /// again. A timer whose action is pending stays paused until it fires.
    pub fn set_active(&mut self, active: bool) {
        self.active = active;
        self.stalled_attack = false;
        if active {
            if !self.pending_attack {
                self.attack_timer.resume();
            }
            if !self.pending_special {
                self.special_timer.resume();
            }
        } else {
            self.attack_timer.pause();
            self.special_timer.pause();
        }
    }

    pub fn subscribe(&mut self, observer: StatsObserver) {
        self.observers.push(observer);
    }

    pub fn subscribe_timer(&mut self, kind: TimerKind, observer: TimerObserver) {
        self.timer_observers.push((kind, observer));
    }

    /// Mutate the stat table, then re-sync timers and notify subscribers.
    pub fn update_stats<R>(&mut self, change: impl FnOnce(&mut StatTable) -> R) -> R {
        let result = change(&mut self.stats);
        self.sync_timers();
        self.notify();
        result
    }

    pub fn apply_damage(&mut self, amount: i32) -> HpTransition {
        self.update_stats(|stats| CombatResolver::apply_damage(stats, amount))
    }

    pub fn apply_heal(&mut self, amount: i32) -> HpTransition {
        self.update_stats(|stats| CombatResolver::apply_heal(stats, amount))
    }

    /// Add experience, notifying subscribers once per level gained.
    pub fn add_experience(&mut self, amount: i64) -> u32 {
        let progression = self.progression;
        let observers = &mut self.observers;
        let gained = progression.add_experience(&mut self.stats, amount, |stats| {
            let snapshot = stats.snapshot();
            for observer in observers.iter_mut() {
                observer(&snapshot);
            }
        });
        self.sync_timers();
        if gained == 0 {
            self.notify();
        }
        gained
    }

    /// One level-up step outside of experience accumulation.
    pub fn level_up(&mut self) {
        let progression = self.progression;
        self.update_stats(|stats| progression.level_up(stats));
    }

    /// Roll a batch of levels without applying it.
    pub fn create_level_up(&mut self, levels: u32) -> LevelUp {
        self.progression.create_level_up(&mut self.stats, levels)
    }

    pub fn apply_level_up(&mut self, level_up: &LevelUp) {
        let progression = self.progression;
        self.update_stats(|stats| progression.apply_level_up(stats, level_up));
    }

    /// Replace the base values with `level_up` applied to zeroed stats, at
    /// full health. Used for pre-leveled wave units.
    pub fn rebuild_from(&mut self, level_up: &LevelUp) {
        let progression = self.progression;
        self.update_stats(|stats| {
            stats.zero_stats();
            progression.apply_level_up(stats, level_up);
            stats.restore_hp();
        });
    }

    /// Restore HP, zero both timers, drop pending actions and reactivate.
    pub fn revive(&mut self) {
        self.update_stats(StatTable::restore_hp);
        self.attack_timer.reset();
        self.special_timer.reset();
        self.pending_attack = false;
        self.pending_special = false;
        self.set_active(true);
    }

    /// Advance both timers. Returns which completed.
    pub(crate) fn advance_timers(&mut self, dt: f64) -> (bool, bool) {
        let attack_running = self.attack_timer.is_running();
        let special_running = self.special_timer.is_running();
        let attack = self.attack_timer.tick(dt);
        let special = self.special_timer.tick(dt);

        for (kind, observer) in self.timer_observers.iter_mut() {
            match kind {
                TimerKind::Attack if attack_running => observer(attack.progress),
                TimerKind::Special if special_running => observer(special.progress),
                _ => {}
            }
        }
        (attack.completed, special.completed)
    }

    fn sync_timers(&mut self) {
        self.attack_timer.set_period(self.stats.rate(RateId::Attack));
        self.special_timer.set_period(self.stats.rate(RateId::Special));
    }

    fn notify(&mut self) {
        if self.observers.is_empty() {
            return;
        }
        let snapshot = self.stats.snapshot();
        for observer in self.observers.iter_mut() {
            observer(&snapshot);
        }
    }
}
