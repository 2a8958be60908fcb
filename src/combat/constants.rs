//! Combat constants that are not worth exposing through `CombatConfig`
//!
//! Stat derivation and per-skill timing live here. Anything a designer is
//! expected to tune per encounter belongs in the config instead.

// Derived stats
pub const BASE_HEALTH: f32 = 50.0;
pub const HEALTH_PER_VITALITY: f32 = 5.0;
pub const BASE_STAMINA: f32 = 50.0;
pub const STAMINA_PER_WILL: f32 = 2.5;
pub const BASE_MOVEMENT_SPEED: f32 = 3.0;
pub const MOVEMENT_PER_DEXTERITY: f32 = 0.05;
pub const STAMINA_EFFICIENCY_PER_FOCUS: f32 = 0.01;

// Damage
pub const STRENGTH_DAMAGE_DIVISOR: f32 = 5.0;
pub const DEXTERITY_RANGED_DAMAGE_DIVISOR: f32 = 5.0;
pub const DEFENSE_REDUCTION_PER_POINT: f32 = 0.5;
pub const MINIMUM_DAMAGE: f32 = 1.0;
/// Reflected counter damage is this multiple of the attacker's weapon damage
pub const COUNTER_REFLECTION_MULTIPLIER: f32 = 1.5;
/// A defender hit through a blocked attack takes half the attacker's stun
pub const DEFENDER_STUN_SHARE: f32 = 0.5;
/// Will can never reduce a stun by more than this fraction
pub const MAX_WILL_STUN_REDUCTION: f32 = 0.5;

// Stamina
pub const STAMINA_REGEN_PER_SECOND: f32 = 4.0;
pub const RESTING_REGEN_MULTIPLIER: f32 = 3.0;

// Aiming
/// Accuracy gained per second while aiming
pub const AIM_ACCURACY_RATE: f32 = 0.5;
pub const AIM_BASE_ACCURACY: f32 = 0.3;

// Fast weapons cut startup by this factor
pub const FAST_WEAPON_STARTUP_FACTOR: f32 = 0.6;
