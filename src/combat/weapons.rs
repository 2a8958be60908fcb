//! Weapon configuration records
//!
//! A weapon is usable in melee, at range, or both. A range of zero means the
//! weapon cannot be used in that mode; it is never zero for both.

use serde::{Deserialize, Serialize};

use crate::combat::skill::SkillType;
use crate::core::error::{CombatError, Result};

/// Immutable weapon data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeaponData {
    pub name: String,
    pub melee_range: f32,
    pub ranged_range: f32,
    pub melee_damage_multiplier: f32,
    pub ranged_damage_multiplier: f32,
    pub base_damage: f32,
    pub speed: f32,
    /// Seconds of stun this weapon inflicts when an attack is blocked
    pub stun_duration: f32,
    pub combo_length: u32,
    /// Knockdown meter added per basic hit
    pub knockdown_rate: f32,
    pub is_fast_weapon: bool,
    /// Fraction removed from charge time (0.2 = charges 20% faster)
    pub execution_speed_modifier: f32,
    /// Fractional bonus applied to speed resolution
    pub speed_resolution_modifier: f32,
    pub is_ranged_weapon: bool,
}

impl Default for WeaponData {
    fn default() -> Self {
        Self::sword()
    }
}

impl WeaponData {
    /// Common weapon: one-handed sword
    pub fn sword() -> Self {
        Self {
            name: "Sword".to_string(),
            melee_range: 2.0,
            ranged_range: 0.0,
            melee_damage_multiplier: 1.0,
            ranged_damage_multiplier: 0.0,
            base_damage: 10.0,
            speed: 5.0,
            stun_duration: 1.5,
            combo_length: 3,
            knockdown_rate: 35.0,
            is_fast_weapon: false,
            execution_speed_modifier: 0.0,
            speed_resolution_modifier: 0.0,
            is_ranged_weapon: false,
        }
    }

    /// Common weapon: dagger (fast, short)
    pub fn dagger() -> Self {
        Self {
            name: "Dagger".to_string(),
            melee_range: 1.5,
            base_damage: 6.0,
            speed: 7.0,
            stun_duration: 1.0,
            combo_length: 4,
            knockdown_rate: 25.0,
            is_fast_weapon: true,
            execution_speed_modifier: 0.2,
            speed_resolution_modifier: 0.1,
            ..Self::sword()
        }
    }

    /// Common weapon: two-handed greatsword
    pub fn greatsword() -> Self {
        Self {
            name: "Greatsword".to_string(),
            melee_range: 2.5,
            melee_damage_multiplier: 1.3,
            base_damage: 18.0,
            speed: 3.0,
            stun_duration: 2.2,
            combo_length: 2,
            knockdown_rate: 50.0,
            execution_speed_modifier: -0.2,
            ..Self::sword()
        }
    }

    /// Common weapon: bow (ranged only)
    pub fn bow() -> Self {
        Self {
            name: "Bow".to_string(),
            melee_range: 0.0,
            ranged_range: 15.0,
            melee_damage_multiplier: 0.0,
            ranged_damage_multiplier: 1.0,
            base_damage: 9.0,
            speed: 4.0,
            stun_duration: 1.2,
            combo_length: 1,
            knockdown_rate: 40.0,
            is_ranged_weapon: true,
            ..Self::sword()
        }
    }

    /// Reject weapons that are unusable in both modes
    pub fn validate(&self) -> Result<()> {
        if self.melee_range <= 0.0 && self.ranged_range <= 0.0 {
            return Err(CombatError::InvalidConfig(format!(
                "weapon {} has neither melee nor ranged range",
                self.name
            )));
        }
        Ok(())
    }

    pub fn can_melee(&self) -> bool {
        self.melee_range > 0.0
    }

    pub fn can_shoot(&self) -> bool {
        self.ranged_range > 0.0
    }

    /// Reach used by a given skill; ranged skills use the ranged range
    pub fn range_for(&self, skill: SkillType) -> f32 {
        if skill == SkillType::RangedAttack {
            self.ranged_range
        } else {
            self.melee_range
        }
    }

    /// Reach of the weapon's primary mode
    pub fn primary_range(&self) -> f32 {
        if self.is_ranged_weapon {
            self.ranged_range
        } else {
            self.melee_range
        }
    }

    pub fn damage_multiplier_for(&self, skill: SkillType) -> f32 {
        if skill == SkillType::RangedAttack {
            self.ranged_damage_multiplier
        } else {
            self.melee_damage_multiplier
        }
    }
}
