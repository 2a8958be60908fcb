//! Attack-slot arbitration across agents
//!
//! Agents ask for a slot before committing an offensive skill so only a
//! limited number press the player at once.

use crate::core::types::CombatantId;

pub trait AttackCoordinator {
    fn register(&mut self, agent: CombatantId);
    /// Forget the agent and free any slot it holds
    fn unregister(&mut self, agent: CombatantId);
    /// Grant a slot, or confirm one already held
    fn request_attack_permission(&mut self, agent: CombatantId) -> bool;
    fn release_attack_slot(&mut self, agent: CombatantId);
}

/// Coordinator with a fixed number of concurrent attackers
#[derive(Debug, Clone)]
pub struct SlotCoordinator {
    max_attackers: usize,
    registered: Vec<CombatantId>,
    holders: Vec<CombatantId>,
}

impl SlotCoordinator {
    pub fn new(max_attackers: usize) -> Self {
        Self {
            max_attackers,
            registered: Vec::new(),
            holders: Vec::new(),
        }
    }

    pub fn max_attackers(&self) -> usize {
        self.max_attackers
    }

    pub fn active_attackers(&self) -> usize {
        self.holders.len()
    }

    pub fn is_registered(&self, agent: CombatantId) -> bool {
        self.registered.contains(&agent)
    }

    pub fn holds_slot(&self, agent: CombatantId) -> bool {
        self.holders.contains(&agent)
    }
}

impl AttackCoordinator for SlotCoordinator {
    fn register(&mut self, agent: CombatantId) {
        if !self.registered.contains(&agent) {
            self.registered.push(agent);
        }
    }

    fn unregister(&mut self, agent: CombatantId) {
        self.registered.retain(|a| *a != agent);
        self.holders.retain(|a| *a != agent);
    }

    fn request_attack_permission(&mut self, agent: CombatantId) -> bool {
        if self.holders.contains(&agent) {
            return true;
        }
        if !self.registered.contains(&agent) {
            tracing::warn!(combatant = %agent, "attack permission requested by unregistered agent");
            return false;
        }
        if self.holders.len() >= self.max_attackers {
            return false;
        }
        self.holders.push(agent);
        true
    }

    fn release_attack_slot(&mut self, agent: CombatantId) {
        self.holders.retain(|a| *a != agent);
    }
}
