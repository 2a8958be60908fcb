//! Health and stamina pools
//!
//! The resolvers only talk to these through [`HealthSystem`] and
//! [`StaminaSystem`], so a host game can back them with its own storage.

use crate::combat::constants::{RESTING_REGEN_MULTIPLIER, STAMINA_REGEN_PER_SECOND};
use crate::core::types::CombatantId;

/// Damage sink consumed by the interaction resolver
pub trait HealthSystem {
    /// Apply damage and return the amount actually removed
    fn take_damage(&mut self, amount: f32, source: Option<CombatantId>) -> f32;
    fn is_alive(&self) -> bool;
    fn current_health(&self) -> f32;
    fn max_health(&self) -> f32;
}

/// Stamina gate for charging skills
pub trait StaminaSystem {
    fn current_stamina(&self) -> f32;
    fn can_afford(&self, cost: f32) -> bool;
    /// Spend stamina; returns false and spends nothing if unaffordable
    fn consume(&mut self, cost: f32) -> bool;
}

#[derive(Debug, Clone)]
pub struct Health {
    current: f32,
    max: f32,
    last_damage_source: Option<CombatantId>,
    /// Set once on the hit that kills; cleared when the death is observed
    death_pending: bool,
}

impl Health {
    pub fn new(max: f32) -> Self {
        Self {
            current: max,
            max,
            last_damage_source: None,
            death_pending: false,
        }
    }

    pub fn fraction(&self) -> f32 {
        if self.max <= 0.0 {
            return 0.0;
        }
        self.current / self.max
    }

    pub fn last_damage_source(&self) -> Option<CombatantId> {
        self.last_damage_source
    }

    /// Take the pending death notification, if any
    pub fn take_death_notification(&mut self) -> bool {
        std::mem::take(&mut self.death_pending)
    }

    pub fn heal(&mut self, amount: f32) {
        if self.current > 0.0 {
            self.current = (self.current + amount).min(self.max);
        }
    }
}

impl HealthSystem for Health {
    fn take_damage(&mut self, amount: f32, source: Option<CombatantId>) -> f32 {
        if self.current <= 0.0 || amount <= 0.0 {
            return 0.0;
        }
        let applied = amount.min(self.current);
        self.current -= applied;
        self.last_damage_source = source;
        if self.current <= 0.0 {
            self.current = 0.0;
            self.death_pending = true;
        }
        applied
    }

    fn is_alive(&self) -> bool {
        self.current > 0.0
    }

    fn current_health(&self) -> f32 {
        self.current
    }

    fn max_health(&self) -> f32 {
        self.max
    }
}

#[derive(Debug, Clone)]
pub struct Stamina {
    current: f32,
    max: f32,
    /// Costs are divided by this
    efficiency: f32,
}

impl Stamina {
    pub fn new(max: f32, efficiency: f32) -> Self {
        Self {
            current: max,
            max,
            efficiency: efficiency.max(0.01),
        }
    }

    pub fn max(&self) -> f32 {
        self.max
    }

    pub fn fraction(&self) -> f32 {
        if self.max <= 0.0 {
            return 0.0;
        }
        self.current / self.max
    }

    pub fn effective_cost(&self, cost: f32) -> f32 {
        cost / self.efficiency
    }

    pub fn regenerate(&mut self, dt: f32, resting: bool) {
        let rate = if resting {
            STAMINA_REGEN_PER_SECOND * RESTING_REGEN_MULTIPLIER
        } else {
            STAMINA_REGEN_PER_SECOND
        };
        self.current = (self.current + rate * dt).min(self.max);
    }
}

impl StaminaSystem for Stamina {
    fn current_stamina(&self) -> f32 {
        self.current
    }

    fn can_afford(&self, cost: f32) -> bool {
        self.current >= self.effective_cost(cost)
    }

    fn consume(&mut self, cost: f32) -> bool {
        if !self.can_afford(cost) {
            return false;
        }
        self.current -= self.effective_cost(cost);
        true
    }
}
