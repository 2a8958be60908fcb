//! Property tests for resolution and pattern invariants

use proptest::prelude::*;

use skirmish_core::combat::{
    can_interact, determine_interaction, resolve_speed_conflict, CharacterStats, CombatArena,
    CombatInteractionManager, Combatant, InteractionResult, SkillType, SpeedOutcome, WeaponData,
};
use skirmish_core::core::{CombatConfig, CombatantId, Faction, Vec2};
use skirmish_core::pattern::{
    ConditionKind, ConditionRegistry, PatternCondition, PatternDefinition, PatternEvaluationContext, PatternNode,
};
use skirmish_core::simulation::Simulation;

fn any_skill() -> impl Strategy<Value = SkillType> {
    prop::sample::select(SkillType::ALL.to_vec())
}

#[derive(Debug, Clone)]
enum Op {
    Charge(usize, SkillType),
    Execute(usize),
    Cancel(usize),
    Advance(f32),
}

fn any_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..3usize, any_skill()).prop_map(|(i, s)| Op::Charge(i, s)),
        (0..3usize).prop_map(Op::Execute),
        (0..3usize).prop_map(Op::Cancel),
        (0.0f32..0.6).prop_map(Op::Advance),
    ]
}

proptest! {
    #[test]
    fn interaction_is_pure_and_total(offensive in any_skill(), defensive in any_skill()) {
        let first = determine_interaction(offensive, defensive);
        prop_assert_eq!(first, determine_interaction(offensive, defensive));
        if !can_interact(offensive, defensive) {
            prop_assert_eq!(first, InteractionResult::NoInteraction);
        }
    }

    #[test]
    fn speed_ties_within_epsilon(a in 0.0f32..20.0, b in 0.0f32..20.0, epsilon in 0.0001f32..0.1) {
        let outcome = resolve_speed_conflict(a, b, epsilon);
        if (a - b).abs() < epsilon {
            prop_assert_eq!(outcome, SpeedOutcome::Tie);
        } else if a > b {
            prop_assert_eq!(outcome, SpeedOutcome::FirstWins);
        } else {
            prop_assert_eq!(outcome, SpeedOutcome::SecondWins);
        }
        prop_assert_eq!(
            resolve_speed_conflict(b, a, epsilon),
            match outcome {
                SpeedOutcome::FirstWins => SpeedOutcome::SecondWins,
                SpeedOutcome::SecondWins => SpeedOutcome::FirstWins,
                SpeedOutcome::Tie => SpeedOutcome::Tie,
            }
        );
    }

    #[test]
    fn conditions_combine_with_and(
        health in 0.0f32..=1.0,
        thresholds in prop::collection::vec((0.0f32..=1.0, any::<bool>()), 0..6),
    ) {
        let registry = ConditionRegistry::standard();
        let mut ctx = PatternEvaluationContext::new();
        ctx.health_fraction = health;
        let conditions: Vec<PatternCondition> = thresholds
            .iter()
            .map(|&(value, negate)| {
                let c = PatternCondition::new(ConditionKind::HealthBelow).with_value(value);
                if negate { c.negated() } else { c }
            })
            .collect();

        let expected = thresholds.iter().all(|&(value, negate)| (health < value) != negate);
        prop_assert_eq!(registry.evaluate_all(&conditions, &ctx), expected);

        let mut node = PatternNode::new("n");
        node.conditions = conditions;
        prop_assert_eq!(node.can_execute_with(&registry, &ctx), expected);
    }

    #[test]
    fn pool_gets_match_returns(ops in prop::collection::vec(any_op(), 1..60), seed in any::<u64>()) {
        let mut arena = CombatArena::new();
        let mut manager = CombatInteractionManager::new(CombatConfig::default(), seed);
        let ids: Vec<CombatantId> = [
            (Faction::PLAYER, WeaponData::sword(), Vec2::ZERO),
            (Faction::ENEMY, WeaponData::dagger(), Vec2::new(1.2, 0.0)),
            (Faction::ENEMY, WeaponData::bow(), Vec2::new(0.0, 4.0)),
        ]
        .into_iter()
        .map(|(faction, weapon, at)| {
            arena.spawn(Combatant::new("c", faction, CharacterStats::default(), weapon).at(at))
        })
        .collect();
        arena.get_mut(ids[0]).unwrap().target = Some(ids[1]);
        arena.get_mut(ids[1]).unwrap().target = Some(ids[0]);
        arena.get_mut(ids[2]).unwrap().target = Some(ids[0]);

        let mut now = 0.0f64;
        for op in ops {
            match op {
                Op::Charge(i, skill) => {
                    let _ = manager.request_charge(&mut arena, ids[i], skill);
                }
                Op::Execute(i) => {
                    let _ = manager.execute_skill(&mut arena, ids[i], now);
                }
                Op::Cancel(i) => {
                    manager.cancel_skill(&mut arena, ids[i]);
                }
                Op::Advance(dt) => {
                    arena.update(dt);
                    now += dt as f64;
                    manager.process_tick(&mut arena, now);
                }
            }
        }

        // Past every window and timeout nothing may still be held
        now += CombatConfig::default().defensive_timeout + 1.0;
        manager.process_tick(&mut arena, now);
        let stats = manager.pool_stats();
        prop_assert!(stats.is_balanced(), "{:?}", stats);
        prop_assert_eq!(manager.waiting_count(), 0);
        prop_assert_eq!(manager.pending_count(), 0);
    }

    #[test]
    fn engagement_has_hysteresis(distances in prop::collection::vec(0.0f32..20.0, 1..40)) {
        let pattern = PatternDefinition::new("idle", "idle", vec![PatternNode::new("idle")])
            .into_shared()
            .unwrap();
        let engage = pattern.engage_distance;
        let disengage = engage * CombatConfig::default().disengage_factor;

        let mut sim = Simulation::new(CombatConfig::default(), 0, 1);
        let player = sim.spawn(Combatant::new("player", Faction::PLAYER, CharacterStats::default(), WeaponData::sword()));
        let agent = sim.spawn_agent(
            Combatant::new("agent", Faction::ENEMY, CharacterStats::default(), WeaponData::sword()),
            pattern,
        );

        let mut engaged = false;
        for d in distances {
            sim.arena.get_mut(player).unwrap().position = Vec2::new(d, 0.0);
            sim.tick(0.05);
            engaged = if engaged { d <= disengage } else { d <= engage };
            prop_assert_eq!(sim.executor(agent).unwrap().is_engaged(), engaged, "at distance {}", d);
        }
    }
}
