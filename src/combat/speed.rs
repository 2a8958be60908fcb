//! Execution speed and skill classification
//!
//! Pure functions with no state, safe to call from anywhere.

use crate::combat::skill::SkillType;
use crate::combat::stats::CharacterStats;
use crate::combat::weapons::WeaponData;
use crate::core::config::CombatConfig;

/// Outcome of comparing two execution speeds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeedOutcome {
    /// The first execution is faster; the second is cancelled
    FirstWins,
    /// The second execution is faster; the first is cancelled
    SecondWins,
    /// Within epsilon: both execute
    Tie,
}

/// `(weapon.speed + dexterity / K) * (1 + weapon.speed_resolution_modifier)`
///
/// The skill is accepted for future per-skill speed tables; every skill
/// currently resolves at weapon speed.
pub fn calculate_speed(
    _skill: SkillType,
    stats: &CharacterStats,
    weapon: &WeaponData,
    config: &CombatConfig,
) -> f32 {
    let raw = weapon.speed + stats.dexterity / config.dexterity_speed_divisor;
    raw * (1.0 + weapon.speed_resolution_modifier)
}

pub fn is_offensive_skill(skill: SkillType) -> bool {
    skill.is_offensive()
}

pub fn is_defensive_skill(skill: SkillType) -> bool {
    skill.is_defensive()
}

/// Two skills can interact unless both are defensive
pub fn can_interact(a: SkillType, b: SkillType) -> bool {
    !(a.is_defensive() && b.is_defensive())
}

/// Compare two speeds; the strictly greater one wins
pub fn resolve_speed_conflict(speed1: f32, speed2: f32, epsilon: f32) -> SpeedOutcome {
    if (speed1 - speed2).abs() < epsilon {
        SpeedOutcome::Tie
    } else if speed1 > speed2 {
        SpeedOutcome::FirstWins
    } else {
        SpeedOutcome::SecondWins
    }
}
