//! Skill types and the per-combatant skill execution state machine
//!
//! Uncharged → Charging/Aiming → Charged/Waiting → Startup → Active → Recovery → Uncharged
//!
//! Aiming is the ranged analog of Charging; a ranged skill can fire
//! straight out of Aiming. Waiting is the defensive analog of Charged:
//! the skill is held until an incoming offensive skill resolves against it.

use serde::{Deserialize, Serialize};

use crate::combat::constants::{AIM_ACCURACY_RATE, AIM_BASE_ACCURACY};
use crate::core::error::{CombatError, Result};

/// Every skill a combatant can charge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SkillType {
    Attack,
    Smash,
    Windmill,
    Defense,
    Counter,
    RangedAttack,
    Lunge,
}

impl SkillType {
    pub const ALL: [SkillType; 7] = [
        SkillType::Attack,
        SkillType::Smash,
        SkillType::Windmill,
        SkillType::Defense,
        SkillType::Counter,
        SkillType::RangedAttack,
        SkillType::Lunge,
    ];

    pub fn is_offensive(&self) -> bool {
        matches!(
            self,
            SkillType::Attack
                | SkillType::Smash
                | SkillType::Windmill
                | SkillType::RangedAttack
                | SkillType::Lunge
        )
    }

    pub fn is_defensive(&self) -> bool {
        matches!(self, SkillType::Defense | SkillType::Counter)
    }

    pub fn is_ranged(&self) -> bool {
        *self == SkillType::RangedAttack
    }

    /// Timing and cost table
    pub fn profile(&self) -> SkillProfile {
        match self {
            SkillType::Attack => SkillProfile::new(2.0, 0.0, 0.2, 0.4, 1.0),
            SkillType::Smash => SkillProfile::new(8.0, 1.5, 0.3, 1.0, 2.0),
            SkillType::Windmill => SkillProfile::new(10.0, 1.2, 0.3, 1.2, 1.2),
            SkillType::Defense => SkillProfile::new(5.0, 1.0, 0.0, 0.8, 0.0),
            SkillType::Counter => SkillProfile::new(6.0, 1.5, 0.0, 1.0, 0.0),
            SkillType::RangedAttack => SkillProfile::new(3.0, 0.0, 0.2, 0.6, 1.0),
            SkillType::Lunge => SkillProfile::new(7.0, 1.0, 0.3, 0.8, 1.5),
        }
    }
}

/// Cost and timing of a skill
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkillProfile {
    pub stamina_cost: f32,
    /// Seconds to charge before the skill is usable
    pub charge_time: f32,
    pub active_time: f32,
    pub recovery_time: f32,
    pub damage_multiplier: f32,
}

impl SkillProfile {
    const fn new(
        stamina_cost: f32,
        charge_time: f32,
        active_time: f32,
        recovery_time: f32,
        damage_multiplier: f32,
    ) -> Self {
        Self {
            stamina_cost,
            charge_time,
            active_time,
            recovery_time,
            damage_multiplier,
        }
    }
}

/// Phase of the combatant's current skill. Exactly one at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SkillExecutionState {
    #[default]
    Uncharged,
    Charging,
    Aiming,
    Charged,
    Waiting,
    Startup,
    Active,
    Recovery,
}

impl SkillExecutionState {
    /// Holding or building a skill without having committed it
    pub fn is_preparing(&self) -> bool {
        matches!(
            self,
            SkillExecutionState::Charging
                | SkillExecutionState::Aiming
                | SkillExecutionState::Charged
                | SkillExecutionState::Waiting
        )
    }

    /// Committed to an execution
    pub fn is_executing(&self) -> bool {
        matches!(
            self,
            SkillExecutionState::Startup
                | SkillExecutionState::Active
                | SkillExecutionState::Recovery
        )
    }
}

/// Skill state machine owned by one combatant
#[derive(Debug, Clone, Default)]
pub struct SkillSystem {
    current: Option<SkillType>,
    state: SkillExecutionState,
    /// Seconds left in a timed state (Charging, Active, Recovery)
    timer: f32,
    aim_accuracy: f32,
    defense_used: bool,
    last_skill_succeeded: Option<bool>,
}

impl SkillSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SkillExecutionState {
        self.state
    }

    pub fn current_skill(&self) -> Option<SkillType> {
        self.current
    }

    pub fn aim_accuracy(&self) -> f32 {
        self.aim_accuracy
    }

    pub fn defense_used(&self) -> bool {
        self.defense_used
    }

    pub fn last_skill_succeeded(&self) -> Option<bool> {
        self.last_skill_succeeded
    }

    /// Begin charging (or aiming, for ranged skills)
    ///
    /// `charge_time` is the already weapon-scaled duration. A zero charge time
    /// goes straight to Charged.
    pub fn start_charging(&mut self, skill: SkillType, charge_time: f32) -> Result<()> {
        if self.state != SkillExecutionState::Uncharged {
            return Err(CombatError::InvalidAction(format!(
                "cannot charge {:?} while {:?}",
                skill, self.state
            )));
        }

        self.current = Some(skill);
        self.defense_used = false;
        if skill.is_ranged() {
            self.state = SkillExecutionState::Aiming;
            self.aim_accuracy = AIM_BASE_ACCURACY;
        } else if charge_time <= 0.0 {
            self.state = SkillExecutionState::Charged;
        } else {
            self.state = SkillExecutionState::Charging;
            self.timer = charge_time;
        }
        Ok(())
    }

    /// Ready to execute: Charged, or Aiming at or above `min_accuracy`
    pub fn is_ready(&self, min_accuracy: f32) -> bool {
        match self.state {
            SkillExecutionState::Charged => true,
            SkillExecutionState::Aiming => self.aim_accuracy >= min_accuracy,
            _ => false,
        }
    }

    /// Commit a ready skill. Offensive skills enter Startup, defensive skills enter Waiting.
    pub fn begin_execution(&mut self) -> Result<SkillType> {
        let skill = self
            .current
            .ok_or_else(|| CombatError::InvalidAction("no skill charged".into()))?;

        match self.state {
            SkillExecutionState::Charged | SkillExecutionState::Aiming => {
                self.state = if skill.is_defensive() {
                    SkillExecutionState::Waiting
                } else {
                    SkillExecutionState::Startup
                };
                Ok(skill)
            }
            other => Err(CombatError::InvalidAction(format!(
                "cannot execute {:?} while {:?}",
                skill, other
            ))),
        }
    }

    /// Startup → Active once the execution has been resolved
    pub fn mark_active(&mut self, succeeded: bool) {
        if self.state != SkillExecutionState::Startup {
            return;
        }
        let active_time = self.current.map(|s| s.profile().active_time).unwrap_or(0.0);
        self.state = SkillExecutionState::Active;
        self.timer = active_time;
        self.last_skill_succeeded = Some(succeeded);
    }

    /// Waiting → Recovery. Returns false if the skill was not waiting,
    /// which makes a second completion a no-op.
    pub fn complete_defensive(&mut self, succeeded: bool) -> bool {
        if self.state != SkillExecutionState::Waiting {
            return false;
        }
        self.enter_recovery();
        self.last_skill_succeeded = Some(succeeded);
        true
    }

    /// A Defense skill breaks after exactly one block
    pub fn mark_defense_used(&mut self) {
        self.defense_used = true;
    }

    /// Drop whatever is in progress. Returns the state that was left.
    pub fn cancel(&mut self) -> SkillExecutionState {
        let previous = self.state;
        if previous == SkillExecutionState::Startup || previous == SkillExecutionState::Charged {
            self.last_skill_succeeded = Some(false);
        }
        self.current = None;
        self.state = SkillExecutionState::Uncharged;
        self.timer = 0.0;
        self.aim_accuracy = 0.0;
        previous
    }

    /// Advance timed states
    pub fn update(&mut self, dt: f32) {
        match self.state {
            SkillExecutionState::Charging => {
                self.timer -= dt;
                if self.timer <= 0.0 {
                    self.state = SkillExecutionState::Charged;
                    self.timer = 0.0;
                }
            }
            SkillExecutionState::Aiming => {
                self.aim_accuracy = (self.aim_accuracy + AIM_ACCURACY_RATE * dt).min(1.0);
            }
            SkillExecutionState::Active => {
                self.timer -= dt;
                if self.timer <= 0.0 {
                    self.enter_recovery();
                }
            }
            SkillExecutionState::Recovery => {
                self.timer -= dt;
                if self.timer <= 0.0 {
                    self.current = None;
                    self.state = SkillExecutionState::Uncharged;
                    self.timer = 0.0;
                }
            }
            _ => {}
        }
    }

    fn enter_recovery(&mut self) {
        let recovery_time = self.current.map(|s| s.profile().recovery_time).unwrap_or(0.0);
        self.state = SkillExecutionState::Recovery;
        self.timer = recovery_time;
        self.aim_accuracy = 0.0;
    }
}
