//! Character stats and derived values
//!
//! Stats are authored configuration and never change at runtime. Equipment
//! produces a modified copy through [`CharacterStats::with_modifiers`].

use serde::{Deserialize, Serialize};

use crate::combat::constants::{
    BASE_HEALTH, BASE_MOVEMENT_SPEED, BASE_STAMINA, HEALTH_PER_VITALITY, MOVEMENT_PER_DEXTERITY,
    STAMINA_EFFICIENCY_PER_FOCUS, STAMINA_PER_WILL,
};

/// Immutable per-character stat block
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CharacterStats {
    pub strength: f32,
    pub dexterity: f32,
    pub intelligence: f32,
    pub focus: f32,
    pub will: f32,
    pub physical_defense: f32,
    pub magical_defense: f32,
    pub vitality: f32,
    /// Chance in [0, 1] that a hit is critical
    pub critical_chance: f32,
}

impl Default for CharacterStats {
    fn default() -> Self {
        Self {
            strength: 10.0,
            dexterity: 10.0,
            intelligence: 10.0,
            focus: 10.0,
            will: 10.0,
            physical_defense: 0.0,
            magical_defense: 0.0,
            vitality: 10.0,
            critical_chance: 0.05,
        }
    }
}

impl CharacterStats {
    pub fn max_health(&self) -> f32 {
        BASE_HEALTH + self.vitality * HEALTH_PER_VITALITY
    }

    pub fn max_stamina(&self) -> f32 {
        BASE_STAMINA + self.will * STAMINA_PER_WILL
    }

    pub fn movement_speed(&self) -> f32 {
        BASE_MOVEMENT_SPEED + self.dexterity * MOVEMENT_PER_DEXTERITY
    }

    /// Multiplier applied to stamina costs; higher focus means cheaper skills
    pub fn stamina_efficiency(&self) -> f32 {
        1.0 + self.focus * STAMINA_EFFICIENCY_PER_FOCUS
    }

    /// Return a copy with equipment modifiers added. The base block is untouched.
    pub fn with_modifiers(&self, modifiers: &StatModifiers) -> CharacterStats {
        CharacterStats {
            strength: self.strength + modifiers.strength,
            dexterity: self.dexterity + modifiers.dexterity,
            intelligence: self.intelligence + modifiers.intelligence,
            focus: self.focus + modifiers.focus,
            will: self.will + modifiers.will,
            physical_defense: self.physical_defense + modifiers.physical_defense,
            magical_defense: self.magical_defense + modifiers.magical_defense,
            vitality: self.vitality + modifiers.vitality,
            critical_chance: (self.critical_chance + modifiers.critical_chance).clamp(0.0, 1.0),
        }
    }
}

/// Additive stat changes from equipment
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatModifiers {
    pub strength: f32,
    pub dexterity: f32,
    pub intelligence: f32,
    pub focus: f32,
    pub will: f32,
    pub physical_defense: f32,
    pub magical_defense: f32,
    pub vitality: f32,
    pub critical_chance: f32,
}
