//! Derived combat state and the capability queries built on it

use serde::{Deserialize, Serialize};

use crate::combat::combatant::Combatant;
use crate::combat::skill::SkillExecutionState;
use crate::combat::status::StatusEffectManager;

/// Coarse state of a combatant, derived each tick.
///
/// Variants are declared lowest to highest priority; when several apply,
/// the highest wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum CombatState {
    #[default]
    Idle,
    Combat,
    Executing,
    Charging,
    Resting,
    Stunned,
    Knockback,
    KnockedDown,
    Dead,
}

impl CombatState {
    /// Derive from health, status effects and skill state, in priority order
    pub fn derive(combatant: &Combatant) -> Self {
        let status = &combatant.status;
        let skill = combatant.skill_state();
        if !combatant.is_alive() {
            CombatState::Dead
        } else if status.is_knocked_down() {
            CombatState::KnockedDown
        } else if status.is_knocked_back() {
            CombatState::Knockback
        } else if status.is_stunned() {
            CombatState::Stunned
        } else if status.is_resting() {
            CombatState::Resting
        } else if skill.is_preparing() {
            CombatState::Charging
        } else if skill.is_executing() {
            CombatState::Executing
        } else if combatant.in_combat {
            CombatState::Combat
        } else {
            CombatState::Idle
        }
    }

    /// States in which a held skill may be dropped by a defensive-interrupt transition
    pub fn is_interruptible(&self) -> bool {
        matches!(self, CombatState::Knockback | CombatState::Stunned)
    }

    pub fn is_disabled(&self) -> bool {
        matches!(
            self,
            CombatState::Dead | CombatState::KnockedDown | CombatState::Knockback | CombatState::Stunned
        )
    }
}

/// Single answer to "what may this combatant do right now"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateValidator {
    pub combat_state: CombatState,
    pub skill_state: SkillExecutionState,
}

impl StateValidator {
    pub fn new(combat_state: CombatState, skill_state: SkillExecutionState) -> Self {
        Self {
            combat_state,
            skill_state,
        }
    }

    pub fn for_combatant(combatant: &Combatant) -> Self {
        Self::new(CombatState::derive(combatant), combatant.skill_state())
    }

    /// Free to move; a committed swing roots the combatant
    pub fn can_move(&self) -> bool {
        !self.combat_state.is_disabled()
            && !matches!(
                self.skill_state,
                SkillExecutionState::Startup | SkillExecutionState::Active
            )
    }

    pub fn can_start_skill(&self) -> bool {
        !self.combat_state.is_disabled() && self.skill_state == SkillExecutionState::Uncharged
    }

    /// Normal node transitions wait until a committed swing has finished
    pub fn can_transition_node(&self) -> bool {
        !matches!(self.combat_state, CombatState::Dead | CombatState::KnockedDown)
            && !matches!(
                self.skill_state,
                SkillExecutionState::Startup | SkillExecutionState::Active
            )
    }

    /// Holding a skill while stunned or knocked back
    pub fn can_be_interrupted(&self) -> bool {
        self.combat_state.is_interruptible() && self.skill_state != SkillExecutionState::Uncharged
    }
}
