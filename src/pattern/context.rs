//! Per-agent snapshot that conditions are evaluated against

use ahash::AHashMap;

use crate::combat::skill::{SkillExecutionState, SkillType};
use crate::combat::state::CombatState;
use crate::core::types::SimTime;

/// Decision-relevant state of one agent, refreshed every tick
///
/// Owned by a single executor. Cooldowns survive node transitions; the
/// random draw and time-in-node are reset on node entry.
#[derive(Debug, Clone)]
pub struct PatternEvaluationContext {
    pub now: SimTime,
    pub health_fraction: f32,
    pub stamina: f32,
    pub stamina_fraction: f32,
    pub hits_taken: u32,
    pub hits_dealt: u32,
    pub blocks: u32,
    pub time_in_node: f32,
    /// Rolled on node entry, compared against by random-chance conditions
    pub random_value: f32,
    pub combat_state: CombatState,
    pub skill_state: SkillExecutionState,
    pub current_skill: Option<SkillType>,
    pub aim_accuracy: f32,
    pub last_skill_succeeded: Option<bool>,
    pub melee_range: f32,
    pub ranged_range: f32,
    /// Distance to the nearest hostile; `None` when there is nobody to fight
    pub distance_to_player: Option<f32>,
    pub player_combat_state: Option<CombatState>,
    pub player_skill_state: Option<SkillExecutionState>,
    pub player_skill: Option<SkillType>,
    /// Cooldown id to the time it expires
    cooldowns: AHashMap<u32, SimTime>,
}

impl Default for PatternEvaluationContext {
    fn default() -> Self {
        Self {
            now: 0.0,
            health_fraction: 1.0,
            stamina: 0.0,
            stamina_fraction: 1.0,
            hits_taken: 0,
            hits_dealt: 0,
            blocks: 0,
            time_in_node: 0.0,
            random_value: 0.0,
            combat_state: CombatState::Idle,
            skill_state: SkillExecutionState::Uncharged,
            current_skill: None,
            aim_accuracy: 0.0,
            last_skill_succeeded: None,
            melee_range: 0.0,
            ranged_range: 0.0,
            distance_to_player: None,
            player_combat_state: None,
            player_skill_state: None,
            player_skill: None,
            cooldowns: AHashMap::new(),
        }
    }
}

impl PatternEvaluationContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset node-scoped values on entering a node
    pub fn enter_node(&mut self, random_value: f32) {
        self.time_in_node = 0.0;
        self.random_value = random_value;
    }

    pub fn reset_hit_counters(&mut self) {
        self.hits_taken = 0;
        self.hits_dealt = 0;
        self.blocks = 0;
    }

    pub fn start_cooldown(&mut self, id: u32, duration: f32) {
        self.cooldowns.insert(id, self.now + duration as f64);
    }

    /// A cooldown that was never started counts as expired
    pub fn cooldown_expired(&self, id: u32) -> bool {
        self.cooldowns.get(&id).map_or(true, |&until| self.now >= until)
    }

    /// Reach of the given skill, or of melee when none is given
    pub fn range_for(&self, skill: Option<SkillType>) -> f32 {
        match skill {
            Some(SkillType::RangedAttack) => self.ranged_range,
            _ => self.melee_range,
        }
    }
}
