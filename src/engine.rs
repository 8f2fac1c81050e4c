//! Engine module.
//!
//! The [`Engine`] is the service object that owns every entity and the
//! shared simulation state: the random stream, the modifier id allocator,
//! the experience pool, and the injected collision and presentation
//! collaborators. It is advanced by explicit ticks; nothing blocks.
//!
//! Per entity, a tick runs:
//!
//! 1. Target check: a unit whose attack needs a target pauses its attack
//!    timer while nothing is in range and resumes it once something is. A
//!    timer paused through [`Engine::pause_timer`] stays paused.
//! 2. Both timers advance. A completed timer pauses and marks its action
//!    pending.
//! 3. At most one pending action fires, attack first; [`Action::None`]
//!    does not count. A hostile action with no target stays pending and is
//!    retried next tick. After firing, the timer restarts from zero.
//!
//! When the designated leader dies the run is over: every entity is
//! paused until [`Engine::retry`] buys the party back from the pool.

use crate::action::{Action, ActionContext, Effect, NullSink, PresentationSink, Trigger};
use crate::archetype::Archetype;
use crate::combat::HpTransition;
use crate::config::EngineConfig;
use crate::cooldown::TimerKind;
use crate::dice::StatGrowth;
use crate::entity::{Entity, EntityHandle, EntitySpec};
use crate::error::EngineError;
use crate::modifier::{Modifier, ModifierId, ModifierIdAllocator};
use crate::progression::{ExperiencePool, LevelUp};
use crate::stat_id::{RateId, StatArray, StatId};
use crate::stats::StatSnapshot;
use crate::targeting::{CollisionQuery, Faction, NoCollisions, Position, TargetResolver};
use crate::wave::{Wave, WaveBuilder, WavePlan};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::BTreeMap;

/// Owns all entities and drives the simulation.
///
/// # Examples
///
/// ```rust
/// use wavecore::{Engine, EngineConfig, StatArray, StatGrowth, StatId};
///
/// let mut engine = Engine::new(EngineConfig::default().with_seed(7));
///
/// let mut base = StatArray::default();
/// base[StatId::HpMax] = 50;
/// base[StatId::Attack] = 8;
/// let hero = engine.create_entity(&[StatGrowth::from_notation(StatId::Attack, "1D1")], base);
///
/// assert_eq!(engine.get_resolved_stat(hero, StatId::Attack).unwrap(), 9);
/// engine.apply_damage(hero, 20).unwrap();
/// assert_eq!(engine.get_resolved_stat(hero, StatId::HpCur).unwrap(), 30);
///
/// engine.add_experience(hero, 31).unwrap();
/// assert_eq!(engine.snapshot(hero).unwrap().level, 2);
/// ```
pub struct Engine {
    config: EngineConfig,
    rng: ChaCha8Rng,
    entities: BTreeMap<EntityHandle, Entity>,
    next_handle: u64,
    modifier_ids: ModifierIdAllocator,
    resolver: TargetResolver,
    query: Box<dyn CollisionQuery>,
    sink: Box<dyn PresentationSink>,
    pool: ExperiencePool,
    leader: Option<EntityHandle>,
    game_over: bool,
    current_wave: Option<Wave>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl Engine {
    /// An empty engine with no collisions and a silent sink.
    pub fn new(config: EngineConfig) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            entities: BTreeMap::new(),
            next_handle: 0,
            modifier_ids: ModifierIdAllocator::new(),
            resolver: TargetResolver::new(config.ranges, config.ray_height),
            query: Box::new(NoCollisions),
            sink: Box::new(NullSink),
            pool: ExperiencePool::new(config.pool_settings()),
            leader: None,
            game_over: false,
            current_wave: None,
            config,
        }
    }

    /// Use `query` for target scans.
    pub fn with_collision(mut self, query: Box<dyn CollisionQuery>) -> Self {
        self.query = query;
        self
    }

    /// Send presentation triggers to `sink`.
    pub fn with_sink(mut self, sink: Box<dyn PresentationSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn pool(&self) -> &ExperiencePool {
        &self.pool
    }

    pub fn pool_mut(&mut self) -> &mut ExperiencePool {
        &mut self.pool
    }

    /// Handles in ascending order.
    pub fn handles(&self) -> impl Iterator<Item = EntityHandle> + '_ {
        self.entities.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Look up a live entity.
    pub fn entity(&self, handle: EntityHandle) -> Result<&Entity, EngineError> {
        self.entities
            .get(&handle)
            .ok_or(EngineError::UnknownEntity(handle))
    }

    fn entity_mut(&mut self, handle: EntityHandle) -> Result<&mut Entity, EngineError> {
        self.entities
            .get_mut(&handle)
            .ok_or(EngineError::UnknownEntity(handle))
    }

    // ---- lifecycle ----

    /// Spawn a player-faction entity from growth specs and base stats.
    pub fn create_entity(&mut self, growths: &[StatGrowth], base: StatArray<i32>) -> EntityHandle {
        let mut spec = EntitySpec::new("entity", Faction::Player);
        spec.growths = growths.to_vec();
        spec.base = base;
        self.spawn(&spec)
    }

    /// Build, initialize and activate an entity.
    pub fn spawn(&mut self, spec: &EntitySpec) -> EntityHandle {
        let handle = EntityHandle(self.next_handle);
        self.next_handle += 1;

        let mut entity = Entity::new(
            handle,
            spec,
            self.config.experience,
            self.config.min_period,
            &mut self.rng,
        );
        entity.set_active(true);
        tracing::debug!(
            %handle,
            name = entity.name(),
            faction = %entity.faction(),
            level = entity.stats().level(),
            "entity spawned"
        );
        self.entities.insert(handle, entity);
        handle
    }

    /// Spawn an entity from a data-defined archetype.
    pub fn spawn_archetype(&mut self, archetype: &Archetype) -> EntityHandle {
        self.spawn(&archetype.to_spec())
    }

    /// Remove an entity and return it. Clears the leader if it was the leader.
    pub fn despawn(&mut self, handle: EntityHandle) -> Result<Entity, EngineError> {
        let entity = self
            .entities
            .remove(&handle)
            .ok_or(EngineError::UnknownEntity(handle))?;
        if self.leader == Some(handle) {
            self.leader = None;
        }
        tracing::debug!(%handle, "entity despawned");
        Ok(entity)
    }

    /// Activate or deactivate. Timers are paused, never dropped.
    pub fn set_active(&mut self, handle: EntityHandle, active: bool) -> Result<(), EngineError> {
        self.entity_mut(handle)?.set_active(active);
        Ok(())
    }

    /// Full HP, zeroed timers, active again.
    pub fn revive(&mut self, handle: EntityHandle) -> Result<(), EngineError> {
        self.entity_mut(handle)?.revive();
        tracing::debug!(%handle, "entity revived");
        Ok(())
    }

    /// Move an entity; the next scan sees the new position.
    pub fn set_position(
        &mut self,
        handle: EntityHandle,
        position: Position,
    ) -> Result<(), EngineError> {
        self.entity_mut(handle)?.set_position(position);
        Ok(())
    }

    // ---- stats ----

    /// Base value with every modifier applied.
    pub fn get_resolved_stat(
        &self,
        handle: EntityHandle,
        stat: StatId,
    ) -> Result<i32, EngineError> {
        Ok(self.entity(handle)?.resolved(stat))
    }

    /// Read-only copy of an entity's stats.
    pub fn snapshot(&self, handle: EntityHandle) -> Result<StatSnapshot, EngineError> {
        Ok(self.entity(handle)?.stats().snapshot())
    }

    /// Register a stats observer, called after every change.
    pub fn subscribe<F>(&mut self, handle: EntityHandle, observer: F) -> Result<(), EngineError>
    where
        F: FnMut(&StatSnapshot) + 'static,
    {
        self.entity_mut(handle)?.subscribe(Box::new(observer));
        Ok(())
    }

    /// Register a cooldown progress observer, called after every running tick.
    pub fn subscribe_timer<F>(
        &mut self,
        handle: EntityHandle,
        kind: TimerKind,
        observer: F,
    ) -> Result<(), EngineError>
    where
        F: FnMut(f64) + 'static,
    {
        self.entity_mut(handle)?
            .subscribe_timer(kind, Box::new(observer));
        Ok(())
    }

    /// Set a rate in seconds; the matching timer period follows.
    pub fn set_rate(
        &mut self,
        handle: EntityHandle,
        rate: RateId,
        seconds: f64,
    ) -> Result<(), EngineError> {
        self.entity_mut(handle)?
            .update_stats(|stats| stats.set_rate(rate, seconds));
        Ok(())
    }

    /// Overwrite a base stat and notify observers.
    pub fn set_base(
        &mut self,
        handle: EntityHandle,
        stat: StatId,
        value: i32,
    ) -> Result<(), EngineError> {
        self.entity_mut(handle)?
            .update_stats(|stats| stats.set_base(stat, value));
        Ok(())
    }

    /// Fresh id for a modifier about to be registered.
    pub fn next_modifier_id(&mut self) -> ModifierId {
        self.modifier_ids.next_id()
    }

    /// Returns `false` if this modifier was already registered.
    pub fn add_modifier(
        &mut self,
        handle: EntityHandle,
        modifier: Modifier,
    ) -> Result<bool, EngineError> {
        Ok(self
            .entity_mut(handle)?
            .update_stats(|stats| stats.add_modifier(modifier)))
    }

    /// Remove a modifier by id. Returns false if it was not present.
    pub fn remove_modifier(
        &mut self,
        handle: EntityHandle,
        id: ModifierId,
    ) -> Result<bool, EngineError> {
        Ok(self
            .entity_mut(handle)?
            .update_stats(|stats| stats.remove_modifier(id)))
    }

    /// Drop every modifier on an entity.
    pub fn clear_modifiers(&mut self, handle: EntityHandle) -> Result<(), EngineError> {
        self.entity_mut(handle)?
            .update_stats(|stats| stats.clear_modifiers());
        Ok(())
    }

    // ---- combat ----

    /// Damage by magnitude. A death deactivates the entity.
    pub fn apply_damage(
        &mut self,
        handle: EntityHandle,
        amount: i32,
    ) -> Result<HpTransition, EngineError> {
        let transition = self.entity_mut(handle)?.apply_damage(amount);
        if transition == HpTransition::Died {
            self.on_death(handle);
        }
        Ok(transition)
    }

    /// Restore hit points, capped at the maximum.
    pub fn apply_heal(
        &mut self,
        handle: EntityHandle,
        amount: i32,
    ) -> Result<HpTransition, EngineError> {
        Ok(self.entity_mut(handle)?.apply_heal(amount))
    }

    fn on_death(&mut self, handle: EntityHandle) {
        let Some(entity) = self.entities.get_mut(&handle) else {
            return;
        };
        entity.set_active(false);
        let faction = entity.faction();
        tracing::debug!(%handle, %faction, "entity died");
        self.sink.trigger(handle, Trigger::Death);
        if faction == Faction::Enemy {
            self.pool.enemy_defeated();
        }
        if self.leader == Some(handle) {
            self.trigger_game_over(handle);
        }
    }

    // ---- game over ----

    /// Mark the unit whose death ends the run.
    pub fn set_leader(&mut self, handle: EntityHandle) -> Result<(), EngineError> {
        self.entity(handle)?;
        self.leader = Some(handle);
        Ok(())
    }

    /// The entity whose death ends the game, if any.
    pub fn leader(&self) -> Option<EntityHandle> {
        self.leader
    }

    /// True between the leader's death and a successful [`Engine::retry`].
    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    /// The most recently spawned wave, until a retry discards it.
    pub fn current_wave(&self) -> Option<&Wave> {
        self.current_wave.as_ref()
    }

    /// Price of a retry, or `None` while the run is not over or the pool is
    /// empty.
    pub fn retry_cost(&self) -> Option<i64> {
        if !self.game_over {
            return None;
        }
        self.pool.retry_cost()
    }

    /// Pay the retry cost to revive every player unit and discard the
    /// current wave.
    ///
    /// Returns `false` without changes when the run is not over or the pool
    /// cannot pay.
    pub fn retry(&mut self) -> bool {
        let Some(cost) = self.retry_cost() else {
            return false;
        };
        if !self.pool.consume(cost) {
            return false;
        }

        for entity in self.entities.values_mut() {
            if entity.faction() == Faction::Player {
                entity.revive();
            }
        }
        if let Some(wave) = self.current_wave.take() {
            for unit in wave.units {
                self.entities.remove(&unit);
            }
        }
        self.game_over = false;
        tracing::debug!(cost, remaining = self.pool.exp(), "run retried");
        true
    }

    fn trigger_game_over(&mut self, leader: EntityHandle) {
        if self.game_over {
            return;
        }
        self.game_over = true;
        for entity in self.entities.values_mut() {
            entity.set_active(false);
        }
        tracing::debug!(%leader, "game over");
        self.sink.trigger(leader, Trigger::GameOver);
    }

    // ---- progression ----

    /// Add experience; returns the levels gained.
    pub fn add_experience(
        &mut self,
        handle: EntityHandle,
        amount: i32,
    ) -> Result<u32, EngineError> {
        let gained = self
            .entity_mut(handle)?
            .add_experience(i64::from(amount));
        for _ in 0..gained {
            self.sink.trigger(handle, Trigger::LevelUp);
        }
        Ok(gained)
    }

    /// Roll `levels` levels of growth without applying them.
    pub fn level_up_preview(
        &mut self,
        handle: EntityHandle,
        levels: u32,
    ) -> Result<LevelUp, EngineError> {
        Ok(self.entity_mut(handle)?.create_level_up(levels))
    }

    /// Apply a previewed level-up bundle.
    pub fn apply_level_up(
        &mut self,
        handle: EntityHandle,
        level_up: &LevelUp,
    ) -> Result<(), EngineError> {
        self.entity_mut(handle)?.apply_level_up(level_up);
        self.sink.trigger(handle, Trigger::LevelUp);
        Ok(())
    }

    /// Pay the unit's next threshold from the pool and level it once.
    ///
    /// Returns `false` without changes when the pool is short.
    pub fn level_from_pool(&mut self, handle: EntityHandle) -> Result<bool, EngineError> {
        let cost = self.entity(handle)?.stats().next_level_exp();
        if !self.pool.consume(cost) {
            return Ok(false);
        }
        self.entity_mut(handle)?.level_up();
        self.sink.trigger(handle, Trigger::LevelUp);
        Ok(true)
    }

    /// Integer mean level of all player units, at least 1.
    pub fn average_player_level(&self) -> u32 {
        let levels: Vec<u32> = self
            .entities
            .values()
            .filter(|e| e.faction() == Faction::Player)
            .map(|e| e.stats().level())
            .collect();
        if levels.is_empty() {
            return 1;
        }
        let total: u64 = levels.iter().map(|l| u64::from(*l)).sum();
        let average = total / levels.len() as u64;
        u32::try_from(average).unwrap_or(u32::MAX).max(1)
    }

    // ---- waves ----

    /// Spawn a pre-leveled wave of enemies.
    ///
    /// Units of the same archetype share one level-up roll applied to zeroed
    /// stats, and start at full health. The pool's enemy reward becomes the
    /// wave number.
    pub fn spawn_wave(&mut self, plan: &WavePlan) -> Result<Wave, EngineError> {
        if plan.count > 0 && plan.archetypes.is_empty() {
            return Err(EngineError::Config(format!(
                "wave {} has no archetypes",
                plan.wave
            )));
        }

        let builder = WaveBuilder::new(plan);
        let level = builder.enemy_level(self.average_player_level());
        let picks = builder.picks(&mut self.rng);

        let mut bundles: BTreeMap<usize, LevelUp> = BTreeMap::new();
        let mut units = Vec::with_capacity(picks.len());
        for index in picks {
            let handle = self.spawn(&plan.archetypes[index].to_spec());
            let entity = self.entity_mut(handle)?;
            let bundle = *bundles
                .entry(index)
                .or_insert_with(|| entity.create_level_up(level));
            entity.rebuild_from(&bundle);
            units.push(handle);
        }

        self.pool.set_wave_reward(plan.wave);
        tracing::debug!(wave = plan.wave, level, units = units.len(), "wave built");
        let wave = Wave {
            number: plan.wave,
            units,
        };
        self.current_wave = Some(wave.clone());
        Ok(wave)
    }

    /// True once no unit of `wave` is alive.
    pub fn is_wave_cleared(&self, wave: &Wave) -> bool {
        wave.units
            .iter()
            .all(|h| self.entities.get(h).map_or(true, |e| !e.is_active()))
    }

    // ---- timers ----

    /// Resume a timer paused with [`Engine::pause_timer`].
    pub fn resume_timer(
        &mut self,
        handle: EntityHandle,
        kind: TimerKind,
    ) -> Result<(), EngineError> {
        self.entity_mut(handle)?.timer_mut(kind).resume();
        Ok(())
    }

    /// Pause a timer until [`resume_timer`](Self::resume_timer). Finding a
    /// target does not lift this pause.
    pub fn pause_timer(
        &mut self,
        handle: EntityHandle,
        kind: TimerKind,
    ) -> Result<(), EngineError> {
        let entity = self.entity_mut(handle)?;
        entity.timer_mut(kind).pause();
        if kind == TimerKind::Attack {
            entity.set_stalled(false);
        }
        Ok(())
    }

    /// Zero a timer's elapsed time without changing its state.
    pub fn reset_timer(
        &mut self,
        handle: EntityHandle,
        kind: TimerKind,
    ) -> Result<(), EngineError> {
        self.entity_mut(handle)?.timer_mut(kind).reset();
        Ok(())
    }

    // ---- targeting ----

    /// Active hostile candidates in range, nearest first.
    pub fn targets(&self, handle: EntityHandle) -> Result<Vec<EntityHandle>, EngineError> {
        let entity = self.entity(handle)?;
        Ok(self.scan(entity))
    }

    fn scan(&self, entity: &Entity) -> Vec<EntityHandle> {
        self.resolver
            .resolve(&entity.scanner(), self.query.as_ref())
            .into_iter()
            .filter(|target| {
                *target != entity.handle()
                    && self.entities.get(target).is_some_and(Entity::is_active)
            })
            .collect()
    }

    fn allies(&self, faction: Faction) -> Vec<EntityHandle> {
        self.entities
            .values()
            .filter(|e| e.is_active() && e.faction() == faction)
            .map(Entity::handle)
            .collect()
    }

    // ---- ticking ----

    /// Advance one entity by `dt` seconds. Inactive entities do nothing.
    pub fn tick(&mut self, handle: EntityHandle, dt: f64) -> Result<(), EngineError> {
        self.entity(handle)?;
        self.step(handle, dt);
        Ok(())
    }

    /// Advance every entity, in ascending handle order.
    pub fn tick_all(&mut self, dt: f64) {
        let handles: Vec<EntityHandle> = self.entities.keys().copied().collect();
        for handle in handles {
            self.step(handle, dt);
        }
    }

    fn step(&mut self, handle: EntityHandle, dt: f64) {
        let Some(entity) = self.entities.get(&handle) else {
            return;
        };
        if !entity.is_active() {
            return;
        }

        let mut scanned = None;
        if entity.strategy().attack.needs_target() && !entity.is_pending(TimerKind::Attack) {
            let targets = self.scan(entity);
            let Some(entity) = self.entities.get_mut(&handle) else {
                return;
            };
            let running = entity.timer(TimerKind::Attack).is_running();
            if targets.is_empty() {
                if running {
                    tracing::trace!(%handle, "attack stalled, no target");
                    entity.timer_mut(TimerKind::Attack).pause();
                    entity.set_stalled(true);
                }
            } else if entity.is_stalled() {
                entity.timer_mut(TimerKind::Attack).resume();
                entity.set_stalled(false);
            }
            scanned = Some(targets);
        }

        let Some(entity) = self.entities.get_mut(&handle) else {
            return;
        };
        let (attack_done, special_done) = entity.advance_timers(dt);
        for (kind, done) in [(TimerKind::Attack, attack_done), (TimerKind::Special, special_done)] {
            if done {
                tracing::trace!(%handle, timer = %kind, "cooldown completed");
                entity.timer_mut(kind).pause();
                entity.set_pending(kind, true);
            }
        }

        self.fire_pending(handle, scanned);
    }

    fn fire_pending(&mut self, handle: EntityHandle, mut scanned: Option<Vec<EntityHandle>>) {
        for kind in [TimerKind::Attack, TimerKind::Special] {
            let Some(entity) = self.entities.get(&handle) else {
                return;
            };
            if !entity.is_active() || !entity.is_pending(kind) {
                continue;
            }

            let strategy = *entity.strategy();
            let action = match kind {
                TimerKind::Attack => strategy.attack,
                TimerKind::Special => strategy.special,
            };
            let targets = if action.needs_target() {
                if scanned.is_none() {
                    scanned = Some(self.scan(entity));
                }
                scanned.clone().unwrap_or_default()
            } else {
                Vec::new()
            };
            let allies = self.allies(entity.faction());
            let ctx = ActionContext {
                attack: entity.resolved(StatId::Attack),
                special: entity.resolved(StatId::Special),
                targets: &targets,
                allies: &allies,
            };
            let outcome = match kind {
                TimerKind::Attack => strategy.on_attack_ready(&ctx),
                TimerKind::Special => strategy.on_special_ready(&ctx),
            };
            let Some(outcome) = outcome else {
                tracing::trace!(%handle, timer = %kind, "awaiting target");
                continue;
            };

            for trigger in &outcome.triggers {
                self.sink.trigger(handle, *trigger);
            }
            for effect in &outcome.effects {
                self.apply_effect(*effect);
            }

            if let Some(entity) = self.entities.get_mut(&handle) {
                entity.set_pending(kind, false);
                if entity.is_active() {
                    let timer = entity.timer_mut(kind);
                    timer.reset();
                    timer.resume();
                }
            }
            // one real action per entity per tick
            if action != Action::None {
                return;
            }
        }
    }

    fn apply_effect(&mut self, effect: Effect) {
        match effect {
            Effect::Damage { target, amount } => {
                let Some(entity) = self.entities.get_mut(&target) else {
                    return;
                };
                if !entity.is_active() {
                    return;
                }
                if entity.apply_damage(amount) == HpTransition::Died {
                    self.on_death(target);
                }
            }
            Effect::Heal { target, amount } => {
                if let Some(entity) = self.entities.get_mut(&target) {
                    entity.apply_heal(amount);
                }
            }
        }
    }
}
