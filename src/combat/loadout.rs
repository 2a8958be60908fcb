//! Equipped weapons, range queries and the combo window

use crate::combat::skill::SkillType;
use crate::combat::weapons::WeaponData;

/// Seconds after a basic hit during which the next combo step (or an N+1 finisher) may land
pub const COMBO_WINDOW: f32 = 1.2;

/// Weapon queries consumed by the resolvers and by AI movement
pub trait WeaponController {
    fn weapon(&self) -> &WeaponData;
    fn melee_range(&self) -> f32;
    fn ranged_range(&self) -> f32;
    /// Whether `distance` is within reach for `skill`
    fn is_in_range(&self, distance: f32, skill: SkillType) -> bool;
    /// Record a landed basic hit, advancing the combo
    fn register_hit(&mut self);
    fn swap_weapon(&mut self) -> bool;
    fn in_combo_window(&self) -> bool;
}

#[derive(Debug, Clone)]
pub struct WeaponLoadout {
    primary: WeaponData,
    secondary: Option<WeaponData>,
    combo_step: u32,
    combo_timer: f32,
}

impl WeaponLoadout {
    pub fn new(primary: WeaponData) -> Self {
        Self {
            primary,
            secondary: None,
            combo_step: 0,
            combo_timer: 0.0,
        }
    }

    pub fn with_secondary(mut self, secondary: WeaponData) -> Self {
        self.secondary = Some(secondary);
        self
    }

    pub fn combo_step(&self) -> u32 {
        self.combo_step
    }

    /// The last hit completed the weapon's combo; a finisher skill may extend it
    pub fn finisher_available(&self) -> bool {
        self.in_combo_window() && self.combo_step >= self.primary.combo_length
    }

    pub fn update(&mut self, dt: f32) {
        if self.combo_timer > 0.0 {
            self.combo_timer -= dt;
            if self.combo_timer <= 0.0 {
                self.combo_timer = 0.0;
                self.combo_step = 0;
            }
        }
    }
}

impl WeaponController for WeaponLoadout {
    fn weapon(&self) -> &WeaponData {
        &self.primary
    }

    fn melee_range(&self) -> f32 {
        self.primary.melee_range
    }

    fn ranged_range(&self) -> f32 {
        self.primary.ranged_range
    }

    fn is_in_range(&self, distance: f32, skill: SkillType) -> bool {
        let range = self.primary.range_for(skill);
        range > 0.0 && distance <= range
    }

    fn register_hit(&mut self) {
        if self.combo_step >= self.primary.combo_length {
            self.combo_step = 1;
        } else {
            self.combo_step += 1;
        }
        self.combo_timer = COMBO_WINDOW;
    }

    fn swap_weapon(&mut self) -> bool {
        match self.secondary.take() {
            Some(next) => {
                let previous = std::mem::replace(&mut self.primary, next);
                self.secondary = Some(previous);
                self.combo_step = 0;
                self.combo_timer = 0.0;
                true
            }
            None => false,
        }
    }

    fn in_combo_window(&self) -> bool {
        self.combo_timer > 0.0
    }
}
