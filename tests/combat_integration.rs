//! Combat resolution integration tests
//!
//! Drives the interaction manager end-to-end through the example duels:
//! blocks, speed ties, speed losses, counters against arrows and windmills.

use skirmish_core::combat::{
    CharacterStats, CombatArena, CombatEventKind, CombatInteractionManager, Combatant,
    HealthSystem, InteractionKind, SkillExecutionState, SkillType, StatusEffectManager,
    WeaponData, LOST_SPEED_RESOLUTION,
};
use skirmish_core::core::{CombatConfig, CombatantId, Faction, Vec2};

fn steady_stats() -> CharacterStats {
    CharacterStats {
        critical_chance: 0.0,
        ..Default::default()
    }
}

/// Weapon with an exact resolution speed for zero-dexterity wielders
fn weapon_with_speed(speed: f32) -> WeaponData {
    WeaponData {
        speed,
        speed_resolution_modifier: 0.0,
        ..WeaponData::sword()
    }
}

fn spawn(arena: &mut CombatArena, name: &str, faction: Faction, weapon: WeaponData, at: Vec2) -> CombatantId {
    arena.spawn(Combatant::new(name, faction, steady_stats(), weapon).at(at))
}

/// Charge `skill` until it can be executed
fn ready(arena: &mut CombatArena, manager: &mut CombatInteractionManager, id: CombatantId, skill: SkillType) {
    manager.request_charge(arena, id, skill).unwrap();
    for _ in 0..60 {
        arena.get_mut(id).unwrap().skills.update(0.1);
    }
    assert!(arena.get(id).unwrap().skills.is_ready(0.0), "{skill:?} never became ready");
}

fn aim(arena: &mut CombatArena, target: CombatantId, attackers: &[CombatantId]) {
    for &id in attackers {
        arena.get_mut(id).unwrap().target = Some(target);
    }
}

#[test]
fn test_attack_into_defense_stuns_attacker() {
    let mut arena = CombatArena::new();
    let mut manager = CombatInteractionManager::new(CombatConfig::default(), 1);
    let attacker = spawn(&mut arena, "attacker", Faction::PLAYER, weapon_with_speed(5.0), Vec2::ZERO);
    let defender = spawn(&mut arena, "defender", Faction::ENEMY, WeaponData::sword(), Vec2::new(1.5, 0.0));
    aim(&mut arena, defender, &[attacker]);

    ready(&mut arena, &mut manager, defender, SkillType::Defense);
    manager.execute_skill(&mut arena, defender, 0.0).unwrap();
    ready(&mut arena, &mut manager, attacker, SkillType::Attack);
    manager.execute_skill_with_hit(&mut arena, attacker, 0.0, true).unwrap();
    let defender_health = arena.get(defender).unwrap().health.current_health();

    manager.process_tick(&mut arena, 0.0);

    let a = arena.get(attacker).unwrap();
    let d = arena.get(defender).unwrap();
    let weapon_stun = a.weapon().stun_duration;
    assert!(a.status.is_stunned());
    assert!(a.status.stun_remaining() > 0.0 && a.status.stun_remaining() <= weapon_stun);
    assert!((a.status.stun_remaining() - 2.0 * d.status.stun_remaining()).abs() < 1e-5);
    assert!(d.skills.defense_used());
    assert_eq!(d.skill_state(), SkillExecutionState::Recovery);
    assert_eq!(d.health.current_health(), defender_health);
    assert!(!manager.is_waiting(defender));

    let kinds: Vec<_> = manager
        .events()
        .iter()
        .filter_map(|e| match e.kind {
            CombatEventKind::Interaction { kind, .. } => Some(kind),
            _ => None,
        })
        .collect();
    assert_eq!(kinds, vec![InteractionKind::AttackerStunned]);
    assert!(manager.pool_stats().is_balanced());
}

#[test]
fn test_tied_speeds_inside_window_both_execute() {
    let mut arena = CombatArena::new();
    let mut manager = CombatInteractionManager::new(CombatConfig::default(), 2);
    let mut stats = steady_stats();
    stats.dexterity = 0.0;
    let first = arena.spawn(Combatant::new("first", Faction::PLAYER, stats, weapon_with_speed(6.0)).at(Vec2::ZERO));
    let second = arena.spawn(
        Combatant::new("second", Faction::PLAYER, stats, weapon_with_speed(6.0)).at(Vec2::new(0.0, 1.0)),
    );
    let target = spawn(&mut arena, "target", Faction::ENEMY, WeaponData::sword(), Vec2::new(1.0, 0.0));
    aim(&mut arena, target, &[first, second]);

    ready(&mut arena, &mut manager, first, SkillType::Attack);
    ready(&mut arena, &mut manager, second, SkillType::Attack);
    manager.execute_skill_with_hit(&mut arena, first, 0.0, true).unwrap();
    manager.execute_skill_with_hit(&mut arena, second, 0.05, true).unwrap();

    manager.process_tick(&mut arena, 0.05);

    let hits = manager
        .events()
        .iter()
        .filter(|e| matches!(e.kind, CombatEventKind::Hit { .. }))
        .count();
    assert_eq!(hits, 2);
    assert!(!manager
        .events()
        .iter()
        .any(|e| matches!(e.kind, CombatEventKind::Cancelled { .. })));
    assert_eq!(arena.get(first).unwrap().skill_state(), SkillExecutionState::Active);
    assert_eq!(arena.get(second).unwrap().skill_state(), SkillExecutionState::Active);
    assert!(manager.pool_stats().is_balanced());
}

#[test]
fn test_slower_execution_loses_speed_resolution() {
    let mut arena = CombatArena::new();
    let mut manager = CombatInteractionManager::new(CombatConfig::default(), 3);
    let mut stats = steady_stats();
    stats.dexterity = 0.0;
    let fast = arena.spawn(Combatant::new("fast", Faction::PLAYER, stats, weapon_with_speed(7.0)).at(Vec2::ZERO));
    let slow = arena.spawn(
        Combatant::new("slow", Faction::PLAYER, stats, weapon_with_speed(5.0)).at(Vec2::new(0.0, 1.0)),
    );
    let target = spawn(&mut arena, "target", Faction::ENEMY, WeaponData::sword(), Vec2::new(1.0, 0.0));
    aim(&mut arena, target, &[fast, slow]);

    ready(&mut arena, &mut manager, slow, SkillType::Attack);
    ready(&mut arena, &mut manager, fast, SkillType::Attack);
    // Insertion order must not matter
    manager.execute_skill_with_hit(&mut arena, slow, 0.0, true).unwrap();
    manager.execute_skill_with_hit(&mut arena, fast, 0.0, true).unwrap();

    manager.process_tick(&mut arena, 0.0);

    let events = manager.events();
    assert!(events.iter().any(|e| matches!(
        e.kind,
        CombatEventKind::Hit { attacker, .. } if attacker == fast
    )));
    assert!(events.iter().any(|e| matches!(
        e.kind,
        CombatEventKind::Cancelled { owner, reason, .. } if owner == slow && reason == LOST_SPEED_RESOLUTION
    )));
    assert!(!events.iter().any(|e| matches!(
        e.kind,
        CombatEventKind::Hit { attacker, .. } if attacker == slow
    )));
    assert_eq!(arena.get(fast).unwrap().skill_state(), SkillExecutionState::Active);
    assert_eq!(arena.get(slow).unwrap().skill_state(), SkillExecutionState::Uncharged);
    assert!(manager.pool_stats().is_balanced());
}

#[test]
fn test_missed_arrow_consumes_counter_harmlessly() {
    let mut arena = CombatArena::new();
    let mut manager = CombatInteractionManager::new(CombatConfig::default(), 4);
    let archer = spawn(&mut arena, "archer", Faction::PLAYER, WeaponData::bow(), Vec2::ZERO);
    let duelist = spawn(&mut arena, "duelist", Faction::ENEMY, WeaponData::sword(), Vec2::new(8.0, 0.0));
    aim(&mut arena, duelist, &[archer]);

    ready(&mut arena, &mut manager, duelist, SkillType::Counter);
    manager.execute_skill(&mut arena, duelist, 0.0).unwrap();
    ready(&mut arena, &mut manager, archer, SkillType::RangedAttack);
    manager.execute_skill_with_hit(&mut arena, archer, 0.0, false).unwrap();

    let archer_health = arena.get(archer).unwrap().health.current_health();
    let duelist_health = arena.get(duelist).unwrap().health.current_health();
    manager.process_tick(&mut arena, 0.0);

    let a = arena.get(archer).unwrap();
    let d = arena.get(duelist).unwrap();
    assert_eq!(d.health.current_health(), duelist_health);
    assert_eq!(a.health.current_health(), archer_health);
    assert!(!a.status.is_stunned());
    assert_eq!(d.skill_state(), SkillExecutionState::Recovery);
    assert!(!manager.is_waiting(duelist));
    assert!(manager.events().iter().any(|e| matches!(
        e.kind,
        CombatEventKind::Interaction {
            kind: InteractionKind::CounterIneffective,
            damage_to_defender,
            ..
        } if damage_to_defender == 0.0
    )));
    assert!(manager.pool_stats().is_balanced());
}

#[test]
fn test_windmill_hits_every_hostile_in_radius() {
    let mut arena = CombatArena::new();
    let config = CombatConfig::default();
    let radius = config.windmill_radius;
    let mut manager = CombatInteractionManager::new(config, 6);
    let spinner = spawn(&mut arena, "spinner", Faction::PLAYER, WeaponData::sword(), Vec2::ZERO);
    let near = [
        Vec2::new(1.0, 0.0),
        Vec2::new(0.0, -2.0),
        Vec2::new(-radius + 0.5, 0.0),
    ]
    .map(|at| spawn(&mut arena, "near", Faction::ENEMY, WeaponData::sword(), at));
    let far = spawn(&mut arena, "far", Faction::ENEMY, WeaponData::sword(), Vec2::new(radius * 2.0, 0.0));
    let ally = spawn(&mut arena, "ally", Faction::PLAYER, WeaponData::sword(), Vec2::new(0.5, 0.5));

    ready(&mut arena, &mut manager, spinner, SkillType::Windmill);
    manager.execute_skill(&mut arena, spinner, 0.0).unwrap();
    manager.process_tick(&mut arena, 0.0);

    for id in near {
        let c = arena.get(id).unwrap();
        assert!(c.health.current_health() < c.health.max_health());
        assert!(c.status.is_knocked_down());
    }
    for id in [far, ally] {
        let c = arena.get(id).unwrap();
        assert_eq!(c.health.current_health(), c.health.max_health());
        assert!(!c.status.is_knocked_down());
    }
    let hits = manager
        .events()
        .iter()
        .filter(|e| matches!(e.kind, CombatEventKind::Hit { attacker, .. } if attacker == spinner))
        .count();
    assert_eq!(hits, 3);
    assert!(manager.pool_stats().is_balanced());
}

#[test]
fn test_smash_breaks_through_defense() {
    let mut arena = CombatArena::new();
    let mut manager = CombatInteractionManager::new(CombatConfig::default(), 8);
    let attacker = spawn(&mut arena, "attacker", Faction::PLAYER, WeaponData::sword(), Vec2::ZERO);
    let defender = spawn(&mut arena, "defender", Faction::ENEMY, WeaponData::sword(), Vec2::new(1.5, 0.0));
    aim(&mut arena, defender, &[attacker]);

    ready(&mut arena, &mut manager, defender, SkillType::Defense);
    manager.execute_skill(&mut arena, defender, 0.0).unwrap();
    ready(&mut arena, &mut manager, attacker, SkillType::Smash);
    manager.execute_skill(&mut arena, attacker, 0.0).unwrap();
    manager.process_tick(&mut arena, 0.0);

    let d = arena.get(defender).unwrap();
    assert!(d.status.is_knocked_down());
    assert!(d.health.current_health() < d.health.max_health());
    assert!(d.position.x > 1.5);
    assert_eq!(d.skills.last_skill_succeeded(), Some(false));
    assert_eq!(arena.get(attacker).unwrap().skills.last_skill_succeeded(), Some(true));
}

#[test]
fn test_defense_out_of_reach_does_not_respond() {
    let mut arena = CombatArena::new();
    let mut manager = CombatInteractionManager::new(CombatConfig::default(), 9);
    // Greatsword reaches further than the defender's dagger
    let attacker = spawn(&mut arena, "attacker", Faction::PLAYER, WeaponData::greatsword(), Vec2::ZERO);
    let defender = spawn(&mut arena, "defender", Faction::ENEMY, WeaponData::dagger(), Vec2::new(2.2, 0.0));
    aim(&mut arena, defender, &[attacker]);

    ready(&mut arena, &mut manager, defender, SkillType::Defense);
    manager.execute_skill(&mut arena, defender, 0.0).unwrap();
    ready(&mut arena, &mut manager, attacker, SkillType::Attack);
    manager.execute_skill(&mut arena, attacker, 0.0).unwrap();
    manager.process_tick(&mut arena, 0.0);

    assert!(manager
        .events()
        .iter()
        .any(|e| matches!(e.kind, CombatEventKind::Hit { target, .. } if target == defender)));
    assert!(!manager
        .events()
        .iter()
        .any(|e| matches!(e.kind, CombatEventKind::Interaction { .. })));
    // The stagger from the hit drops the guard
    assert!(!manager.is_waiting(defender));
    assert_eq!(arena.get(defender).unwrap().skills.last_skill_succeeded(), Some(false));
}

#[test]
fn test_windmill_breaks_counter_in_reach() {
    let mut arena = CombatArena::new();
    let mut manager = CombatInteractionManager::new(CombatConfig::default(), 12);
    let spinner = spawn(&mut arena, "spinner", Faction::PLAYER, WeaponData::sword(), Vec2::ZERO);
    let duelist = spawn(&mut arena, "duelist", Faction::ENEMY, WeaponData::sword(), Vec2::new(1.5, 0.0));

    ready(&mut arena, &mut manager, duelist, SkillType::Counter);
    manager.execute_skill(&mut arena, duelist, 0.0).unwrap();
    ready(&mut arena, &mut manager, spinner, SkillType::Windmill);
    manager.execute_skill(&mut arena, spinner, 0.0).unwrap();
    manager.process_tick(&mut arena, 0.0);

    let d = arena.get(duelist).unwrap();
    assert!(d.status.is_knocked_down());
    assert!(d.health.current_health() < d.health.max_health());
    assert!(!manager.is_waiting(duelist));
    assert_eq!(d.skills.last_skill_succeeded(), Some(false));
    assert!(!arena.get(spinner).unwrap().status.is_knocked_back());
    assert!(manager.events().iter().any(|e| matches!(
        e.kind,
        CombatEventKind::Interaction { kind: InteractionKind::WindmillBreaksCounter, damage_to_defender, .. }
            if damage_to_defender > 0.0
    )));
    assert!(manager.events().iter().any(|e| matches!(
        e.kind,
        CombatEventKind::DefenseCompleted { owner, succeeded: false, .. } if owner == duelist
    )));
    assert!(manager.pool_stats().is_balanced());
}

#[test]
fn test_knocked_down_counter_holder_cannot_reflect() {
    let mut arena = CombatArena::new();
    let mut manager = CombatInteractionManager::new(CombatConfig::default(), 13);
    let spinner = spawn(&mut arena, "spinner", Faction::PLAYER, WeaponData::sword(), Vec2::ZERO);
    // Inside the windmill radius but beyond the dagger's own reach
    let duelist = spawn(&mut arena, "duelist", Faction::ENEMY, WeaponData::dagger(), Vec2::new(2.0, 0.0));

    ready(&mut arena, &mut manager, duelist, SkillType::Counter);
    manager.execute_skill(&mut arena, duelist, 0.0).unwrap();
    ready(&mut arena, &mut manager, spinner, SkillType::Windmill);
    manager.execute_skill(&mut arena, spinner, 0.0).unwrap();
    manager.process_tick(&mut arena, 0.0);

    let d = arena.get(duelist).unwrap();
    assert!(d.status.is_knocked_down());
    assert!(!manager.is_waiting(duelist));
    assert_ne!(d.skill_state(), SkillExecutionState::Waiting);

    let landed_at = d.position;
    let striker = spawn(&mut arena, "striker", Faction::PLAYER, WeaponData::sword(), landed_at + Vec2::new(1.0, 0.0));
    aim(&mut arena, duelist, &[striker]);
    ready(&mut arena, &mut manager, striker, SkillType::Attack);
    manager.execute_skill(&mut arena, striker, 0.1).unwrap();
    manager.process_tick(&mut arena, 0.1);

    assert!(!arena.get(striker).unwrap().status.is_knocked_back());
    assert!(!manager.events().iter().any(|e| matches!(
        e.kind,
        CombatEventKind::Interaction { kind: InteractionKind::CounterReflection, .. }
    )));
    assert!(manager
        .events()
        .iter()
        .any(|e| matches!(e.kind, CombatEventKind::Hit { attacker, target, .. } if attacker == striker && target == duelist)));
}

#[test]
fn test_manager_lifecycle_keeps_pool_balanced() {
    let mut arena = CombatArena::new();
    let mut manager = CombatInteractionManager::new(CombatConfig::default(), 10);
    let a = spawn(&mut arena, "a", Faction::PLAYER, WeaponData::sword(), Vec2::ZERO);
    let b = spawn(&mut arena, "b", Faction::ENEMY, WeaponData::sword(), Vec2::new(1.5, 0.0));
    aim(&mut arena, b, &[a]);
    aim(&mut arena, a, &[b]);

    // Defense held, then completed twice: the second completion is a no-op
    ready(&mut arena, &mut manager, b, SkillType::Defense);
    manager.execute_skill(&mut arena, b, 0.0).unwrap();
    assert!(manager.complete_defensive_skill(&mut arena, b, false));
    assert!(!manager.complete_defensive_skill(&mut arena, b, true));

    // Attack queued then cancelled before resolution
    ready(&mut arena, &mut manager, a, SkillType::Attack);
    manager.execute_skill(&mut arena, a, 1.0).unwrap();
    assert_eq!(manager.pending_count(), 1);
    manager.cancel_skill(&mut arena, a);
    assert_eq!(manager.pending_count(), 0);
    manager.process_tick(&mut arena, 1.0);

    // Counter left hanging is reaped
    for _ in 0..40 {
        arena.update(0.1);
    }
    ready(&mut arena, &mut manager, b, SkillType::Counter);
    manager.execute_skill(&mut arena, b, 2.0).unwrap();
    manager.process_tick(&mut arena, 8.0);
    assert_eq!(manager.waiting_count(), 0);

    let stats = manager.pool_stats();
    assert!(stats.is_balanced());
    assert_eq!(stats.outstanding_executions(), 0);
}

#[test]
fn test_dead_attacker_resolves_nothing() {
    let mut arena = CombatArena::new();
    let mut manager = CombatInteractionManager::new(CombatConfig::default(), 11);
    let a = spawn(&mut arena, "a", Faction::PLAYER, WeaponData::sword(), Vec2::ZERO);
    let b = spawn(&mut arena, "b", Faction::ENEMY, WeaponData::sword(), Vec2::new(1.0, 0.0));
    aim(&mut arena, b, &[a]);

    ready(&mut arena, &mut manager, a, SkillType::Attack);
    manager.execute_skill(&mut arena, a, 0.0).unwrap();
    arena.get_mut(a).unwrap().health.take_damage(10_000.0, Some(b));
    manager.process_tick(&mut arena, 0.0);

    let target = arena.get(b).unwrap();
    assert_eq!(target.health.current_health(), target.health.max_health());
    assert!(manager.pool_stats().is_balanced());
}
