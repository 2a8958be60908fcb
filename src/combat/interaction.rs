//! Offensive-versus-defensive skill interactions
//!
//! [`determine_interaction`] is a total lookup over skill pairs.
//! [`process_interaction_effects`] applies exactly one result to the two
//! combatants and reports whether the defensive skill was consumed. It never
//! completes the defensive skill itself: the interaction manager does that,
//! once, from the returned [`InteractionOutcome`].

use rand::Rng;

use crate::combat::combatant::Combatant;
use crate::combat::constants::{
    COUNTER_REFLECTION_MULTIPLIER, DEFENDER_STUN_SHARE, DEFENSE_REDUCTION_PER_POINT,
    DEXTERITY_RANGED_DAMAGE_DIVISOR, MAX_WILL_STUN_REDUCTION, MINIMUM_DAMAGE,
    STRENGTH_DAMAGE_DIVISOR,
};
use crate::combat::resources::HealthSystem;
use crate::combat::skill::SkillType;
use crate::combat::stats::CharacterStats;
use crate::combat::status::StatusEffectManager;
use crate::combat::weapons::WeaponData;
use crate::core::config::CombatConfig;
use crate::core::types::{direction, Vec2};

/// Outcome class of an offensive skill meeting a defensive one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InteractionResult {
    NoInteraction,
    AttackerStunned,
    CounterReflection,
    CounterIneffective,
    DefenderKnockedDown,
    DefenderBlocks,
    WindmillBreaksCounter,
}

/// Interaction matrix. Pairs that are not offensive-vs-defensive never interact.
pub fn determine_interaction(offensive: SkillType, defensive: SkillType) -> InteractionResult {
    use InteractionResult::*;
    use SkillType::*;

    match (offensive, defensive) {
        (Attack, Defense) | (Lunge, Defense) => AttackerStunned,
        (Attack, Counter) | (Smash, Counter) | (Lunge, Counter) => CounterReflection,
        (Smash, Defense) => DefenderKnockedDown,
        (Windmill, Defense) | (RangedAttack, Defense) => DefenderBlocks,
        (Windmill, Counter) => WindmillBreaksCounter,
        (RangedAttack, Counter) => CounterIneffective,
        _ => NoInteraction,
    }
}

/// What an interaction did
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct InteractionOutcome {
    /// The defensive skill was used up and must be completed
    pub defender_consumed: bool,
    pub attacker_succeeded: bool,
    pub damage_to_attacker: f32,
    pub damage_to_defender: f32,
    pub critical: bool,
    pub attacker_stun: f32,
    pub defender_stun: f32,
    pub defender_knocked_down: bool,
    pub attacker_knocked_back: bool,
}

/// Weapon-and-stat damage of `skill` before critical rolls
pub fn skill_damage(
    skill: SkillType,
    attacker_stats: &CharacterStats,
    weapon: &WeaponData,
    defender_stats: &CharacterStats,
) -> f32 {
    let stat_bonus = if skill.is_ranged() {
        attacker_stats.dexterity / DEXTERITY_RANGED_DAMAGE_DIVISOR
    } else {
        attacker_stats.strength / STRENGTH_DAMAGE_DIVISOR
    };
    let raw = (weapon.base_damage * weapon.damage_multiplier_for(skill) + stat_bonus)
        * skill.profile().damage_multiplier;
    (raw - defender_stats.physical_defense * DEFENSE_REDUCTION_PER_POINT).max(MINIMUM_DAMAGE)
}

/// Damage dealt back to an attacker that struck into a Counter
pub fn counter_reflection_damage(
    defender_stats: &CharacterStats,
    attacker_weapon: &WeaponData,
    attacker_stats: &CharacterStats,
) -> f32 {
    let raw = attacker_weapon.base_damage * COUNTER_REFLECTION_MULTIPLIER
        + defender_stats.strength / STRENGTH_DAMAGE_DIVISOR;
    (raw - attacker_stats.physical_defense * DEFENSE_REDUCTION_PER_POINT).max(MINIMUM_DAMAGE)
}

pub fn roll_critical<R: Rng>(
    stats: &CharacterStats,
    config: &CombatConfig,
    rng: &mut R,
) -> bool {
    let chance = (stats.critical_chance + config.base_critical_chance).clamp(0.0, 1.0);
    chance > 0.0 && rng.gen::<f32>() < chance
}

/// Stun duration after the victim's Will resistance
pub fn resisted_stun(duration: f32, will: f32, config: &CombatConfig) -> f32 {
    let reduction = (will * config.will_stun_resistance).clamp(0.0, MAX_WILL_STUN_REDUCTION);
    duration * (1.0 - reduction)
}

/// Position `distance` further from `from`
pub fn displaced(position: Vec2, from: Vec2, distance: f32) -> Vec2 {
    let mut dir = direction(from, position);
    if dir == Vec2::ZERO {
        dir = Vec2::X;
    }
    position + dir * distance
}

fn critical_damage(base: f32, critical: bool, config: &CombatConfig) -> f32 {
    if critical {
        base * config.critical_multiplier
    } else {
        base
    }
}

/// Apply one interaction result to attacker and defender
///
/// `ranged_hit` is the precomputed hit roll of a ranged execution; melee
/// executions pass `None`.
pub fn process_interaction_effects<R: Rng>(
    result: InteractionResult,
    offensive: SkillType,
    ranged_hit: Option<bool>,
    attacker: &mut Combatant,
    defender: &mut Combatant,
    config: &CombatConfig,
    rng: &mut R,
) -> InteractionOutcome {
    let mut outcome = InteractionOutcome::default();
    let attacker_id = Some(attacker.id);
    let defender_id = Some(defender.id);

    match result {
        InteractionResult::NoInteraction => {}

        InteractionResult::AttackerStunned => {
            let stun = resisted_stun(attacker.weapon().stun_duration, attacker.stats().will, config);
            attacker.status.apply_stun(stun);
            defender.status.apply_stun(stun * DEFENDER_STUN_SHARE);
            defender.skills.mark_defense_used();
            outcome.attacker_stun = stun;
            outcome.defender_stun = stun * DEFENDER_STUN_SHARE;
            outcome.defender_consumed = true;
        }

        InteractionResult::CounterReflection => {
            let base =
                counter_reflection_damage(defender.stats(), attacker.weapon(), attacker.stats());
            let critical = roll_critical(defender.stats(), config, rng);
            let damage = critical_damage(base, critical, config);
            outcome.damage_to_attacker = attacker.health.take_damage(damage, defender_id);
            attacker.position =
                displaced(attacker.position, defender.position, config.knockback_distance);
            attacker.status.apply_knockback(config.knockback_duration);
            outcome.critical = critical;
            outcome.attacker_knocked_back = true;
            outcome.defender_consumed = true;
        }

        InteractionResult::CounterIneffective => {
            if ranged_hit.unwrap_or(false) {
                let base = skill_damage(offensive, attacker.stats(), attacker.weapon(), defender.stats());
                let critical = roll_critical(attacker.stats(), config, rng);
                let damage = critical_damage(base, critical, config);
                outcome.damage_to_defender = defender.health.take_damage(damage, attacker_id);
                let stun =
                    resisted_stun(attacker.weapon().stun_duration, defender.stats().will, config);
                defender.status.apply_stun(stun);
                let knocked = defender
                    .status
                    .add_knockdown_buildup(attacker.weapon().knockdown_rate, config.knockdown_threshold);
                if knocked {
                    defender.status.apply_knockdown(config.knockdown_duration);
                    outcome.defender_knocked_down = true;
                }
                outcome.defender_stun = stun;
                outcome.critical = critical;
                outcome.attacker_succeeded = true;
            }
            outcome.defender_consumed = true;
        }

        InteractionResult::DefenderKnockedDown => {
            let base = skill_damage(offensive, attacker.stats(), attacker.weapon(), defender.stats())
                * config.defense_knockdown_factor;
            let critical = roll_critical(attacker.stats(), config, rng);
            let damage = critical_damage(base, critical, config);
            outcome.damage_to_defender = defender.health.take_damage(damage, attacker_id);
            defender.position =
                displaced(defender.position, attacker.position, config.knockdown_distance);
            defender.status.apply_knockdown(config.knockdown_duration);
            outcome.critical = critical;
            outcome.defender_knocked_down = true;
            outcome.attacker_succeeded = true;
            outcome.defender_consumed = true;
        }

        InteractionResult::DefenderBlocks => {
            if offensive.is_ranged() {
                if ranged_hit.unwrap_or(false) {
                    defender.skills.mark_defense_used();
                    outcome.defender_consumed = true;
                }
            } else {
                defender.skills.mark_defense_used();
                outcome.defender_consumed = true;
            }
        }

        InteractionResult::WindmillBreaksCounter => {
            let base = skill_damage(offensive, attacker.stats(), attacker.weapon(), defender.stats());
            let critical = roll_critical(attacker.stats(), config, rng);
            let damage = critical_damage(base, critical, config);
            outcome.damage_to_defender = defender.health.take_damage(damage, attacker_id);
            defender.position =
                displaced(defender.position, attacker.position, config.knockdown_distance);
            defender.status.apply_knockdown(config.knockdown_duration);
            outcome.critical = critical;
            outcome.defender_knocked_down = true;
            outcome.attacker_succeeded = true;
            outcome.defender_consumed = true;
        }
    }

    outcome
}
