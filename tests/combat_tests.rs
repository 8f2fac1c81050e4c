use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use wavecore::*;

fn soldier() -> EntitySpec {
    EntitySpec::new("soldier", Faction::Enemy)
        .with_base(StatId::HpMax, 40)
        .with_base(StatId::Attack, 10)
        .with_base(StatId::Speed, -7)
        .with_rate(RateId::Attack, 1.0)
        .with_rate(RateId::Special, 3.0)
}

#[test]
fn test_hp_stays_in_bounds() {
    let mut engine = Engine::default();
    let h = engine.spawn(&soldier());
    let mut rng = ChaCha8Rng::seed_from_u64(1234);

    for _ in 0..500 {
        let amount: i32 = rng.gen_range(-60..=60);
        if rng.gen_bool(0.5) {
            engine.apply_damage(h, amount).unwrap();
        } else {
            engine.apply_heal(h, amount).unwrap();
        }
        let (cur, max) = engine.snapshot(h).unwrap().hp();
        assert!(0 <= cur && cur <= max, "hp {cur}/{max} after {amount}");
    }
}

#[test]
fn test_death_fires_once() {
    let mut engine = Engine::default();
    let h = engine.spawn(&soldier());

    assert_eq!(engine.apply_damage(h, 39).unwrap(), HpTransition::None);
    assert_eq!(engine.apply_damage(h, 1).unwrap(), HpTransition::Died);
    assert_eq!(engine.apply_damage(h, 1).unwrap(), HpTransition::None);
    assert_eq!(engine.pool().exp(), 1);

    let entity = engine.entity(h).unwrap();
    assert!(!entity.is_active());
    assert!(!entity.timer(TimerKind::Attack).is_running());
    assert!(!entity.timer(TimerKind::Special).is_running());
}

#[test]
fn test_heal_reports_full_health() {
    let mut engine = Engine::default();
    let h = engine.spawn(&soldier());

    assert_eq!(engine.apply_heal(h, 5).unwrap(), HpTransition::None);
    engine.apply_damage(h, 10).unwrap();
    assert_eq!(engine.apply_heal(h, 4).unwrap(), HpTransition::None);
    assert_eq!(engine.apply_heal(h, -100).unwrap(), HpTransition::FullHealth);
    assert_eq!(engine.snapshot(h).unwrap().hp(), (40, 40));
}

#[test]
fn test_two_pass_resolution() {
    let mut engine = Engine::default();
    let h = engine.spawn(&soldier());

    let flat = Modifier::incremental(engine.next_modifier_id()).with(StatId::Attack, 5);
    let boost =
        Modifier::multiplicative(engine.next_modifier_id()).with_factor(StatId::Attack, 0.25);
    let curse =
        Modifier::multiplicative(engine.next_modifier_id()).with_factor(StatId::Attack, -0.1);
    engine.add_modifier(h, flat).unwrap();
    engine.add_modifier(h, boost).unwrap();
    engine.add_modifier(h, curse).unwrap();

    // 15 + 15 * 0.15 = 17.25
    assert_eq!(engine.get_resolved_stat(h, StatId::Attack).unwrap(), 17);
    assert_eq!(engine.snapshot(h).unwrap().base[StatId::Attack], 10);
}

#[test]
fn test_negative_stats_truncate_toward_zero() {
    let mut engine = Engine::default();
    let h = engine.spawn(&soldier());
    let boost = Modifier::multiplicative(engine.next_modifier_id()).with_factor(StatId::Speed, 0.5);
    engine.add_modifier(h, boost).unwrap();

    // -7 - 3.5
    assert_eq!(engine.get_resolved_stat(h, StatId::Speed).unwrap(), -10);
}

#[test]
fn test_duplicate_modifier_is_ignored() {
    let mut engine = Engine::default();
    let h = engine.spawn(&soldier());
    let id = engine.next_modifier_id();
    let rage = Modifier::incremental(id).with(StatId::Attack, 4);

    assert!(engine.add_modifier(h, rage.clone()).unwrap());
    assert!(!engine.add_modifier(h, rage).unwrap());
    assert_eq!(engine.get_resolved_stat(h, StatId::Attack).unwrap(), 14);

    assert!(engine.remove_modifier(h, id).unwrap());
    assert!(!engine.remove_modifier(h, id).unwrap());
    assert_eq!(engine.get_resolved_stat(h, StatId::Attack).unwrap(), 10);
}

#[test]
fn test_modifier_survives_until_removed() {
    let mut engine = Engine::default();
    let h = engine.spawn(&soldier().with_growth_notation(StatId::Attack, "1D1"));
    let id = engine.next_modifier_id();
    engine
        .add_modifier(h, Modifier::incremental(id).with(StatId::Attack, 100))
        .unwrap();

    engine.add_experience(h, 30).unwrap();
    engine.apply_damage(h, 5).unwrap();
    assert_eq!(engine.get_resolved_stat(h, StatId::Attack).unwrap(), 112);
    assert_eq!(engine.snapshot(h).unwrap().modifier_count, 1);

    engine.clear_modifiers(h).unwrap();
    assert_eq!(engine.get_resolved_stat(h, StatId::Attack).unwrap(), 12);
}

#[test]
fn test_modifier_ids_are_unique() {
    let mut engine = Engine::default();
    let ids: Vec<ModifierId> = (0..20).map(|_| engine.next_modifier_id()).collect();
    let mut sorted = ids.clone();
    sorted.sort();
    sorted.dedup();
    assert_eq!(sorted.len(), ids.len());
}

#[test]
fn test_base_change_notifies() {
    let mut engine = Engine::default();
    let h = engine.spawn(&soldier());
    let seen = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
    let sink = std::rc::Rc::clone(&seen);
    engine
        .subscribe(h, move |s: &StatSnapshot| sink.borrow_mut().push(s.hp()))
        .unwrap();

    engine.set_base(h, StatId::HpMax, 25).unwrap();
    assert_eq!(*seen.borrow(), vec![(25, 25)]);
}
