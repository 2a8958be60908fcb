//! Record of everything the interaction manager resolved

use serde::Serialize;

use crate::combat::skill::SkillType;
use crate::core::types::{CombatantId, SimTime};

/// Serializable name for an interaction result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum InteractionKind {
    AttackerStunned,
    CounterReflection,
    CounterIneffective,
    DefenderKnockedDown,
    DefenderBlocks,
    WindmillBreaksCounter,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum CombatEventKind {
    /// Offensive skill met a waiting defensive skill
    Interaction {
        attacker: CombatantId,
        defender: CombatantId,
        offensive: SkillType,
        defensive: SkillType,
        kind: InteractionKind,
        damage_to_attacker: f32,
        damage_to_defender: f32,
    },
    /// Offensive skill landed without a defensive response
    Hit {
        attacker: CombatantId,
        target: CombatantId,
        skill: SkillType,
        damage: f32,
        critical: bool,
        knocked_down: bool,
    },
    /// Ranged shot missed its target
    Miss {
        attacker: CombatantId,
        target: CombatantId,
    },
    /// Execution lost speed resolution or its owner vanished
    Cancelled {
        owner: CombatantId,
        skill: SkillType,
        reason: &'static str,
    },
    /// Queued execution decayed before it was resolved
    Abandoned {
        owner: CombatantId,
        skill: SkillType,
    },
    /// Waiting defensive skill ended
    DefenseCompleted {
        owner: CombatantId,
        skill: SkillType,
        succeeded: bool,
    },
    /// Waiting defensive skill exceeded its timeout and was force-completed
    DefenseExpired {
        owner: CombatantId,
        skill: SkillType,
    },
    Died {
        combatant: CombatantId,
        killer: Option<CombatantId>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CombatEvent {
    pub time: SimTime,
    pub kind: CombatEventKind,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CombatEventLog {
    pub events: Vec<CombatEvent>,
}

impl CombatEventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, time: SimTime, kind: CombatEventKind) {
        self.events.push(CombatEvent { time, kind });
    }

    /// Take all events recorded so far
    pub fn drain(&mut self) -> Vec<CombatEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CombatEvent> {
        self.events.iter()
    }
}
