//! Pattern nodes and the transitions between them

use serde::{Deserialize, Serialize};

use crate::combat::skill::SkillType;
use crate::pattern::condition::{ConditionRegistry, PatternCondition};
use crate::pattern::context::PatternEvaluationContext;
use crate::pattern::movement::MovementBehavior;
use crate::pattern::telegraph::TelegraphData;

/// Cooldown started when a transition fires
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CooldownSpec {
    pub id: u32,
    pub duration: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternTransition {
    pub target: String,
    #[serde(default)]
    pub priority: i32,
    #[serde(default)]
    pub conditions: Vec<PatternCondition>,
    #[serde(default)]
    pub reset_hit_counters: bool,
    #[serde(default)]
    pub start_cooldown: Option<CooldownSpec>,
}

impl PatternTransition {
    pub fn new(target: &str, priority: i32) -> Self {
        Self {
            target: target.to_string(),
            priority,
            conditions: Vec::new(),
            reset_hit_counters: false,
            start_cooldown: None,
        }
    }

    pub fn when(mut self, condition: PatternCondition) -> Self {
        self.conditions.push(condition);
        self
    }
}

fn default_true() -> bool {
    true
}

fn default_min_accuracy() -> f32 {
    0.8
}

/// One state of an agent's behavior graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternNode {
    pub name: String,
    #[serde(default)]
    pub skill: Option<SkillType>,
    /// Begin charging `skill` while in this node
    #[serde(default)]
    pub start_charging: bool,
    /// Execute `skill` once it is ready
    #[serde(default)]
    pub execute_charged_skill: bool,
    /// Aim accuracy a ranged skill needs before it is released
    #[serde(default = "default_min_accuracy")]
    pub min_aim_accuracy: f32,
    #[serde(default)]
    pub movement: MovementBehavior,
    #[serde(default)]
    pub freeze_movement: bool,
    /// Leaving the node cancels a skill still in progress. Off lets a charge
    /// carry over into the next node of a combo.
    #[serde(default = "default_true")]
    pub cancel_skill_on_exit: bool,
    /// Gate on the node's actions; all must hold
    #[serde(default)]
    pub conditions: Vec<PatternCondition>,
    #[serde(default)]
    pub transitions: Vec<PatternTransition>,
    #[serde(default)]
    pub telegraph: Option<TelegraphData>,
    #[serde(default)]
    pub fallback: Option<String>,
    /// Seconds in this node with no valid transition before falling back
    #[serde(default)]
    pub fallback_timeout: Option<f32>,
}

impl PatternNode {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            skill: None,
            start_charging: false,
            execute_charged_skill: false,
            min_aim_accuracy: default_min_accuracy(),
            movement: MovementBehavior::default(),
            freeze_movement: false,
            cancel_skill_on_exit: true,
            conditions: Vec::new(),
            transitions: Vec::new(),
            telegraph: None,
            fallback: None,
            fallback_timeout: None,
        }
    }

    pub fn with_skill(mut self, skill: SkillType) -> Self {
        self.skill = Some(skill);
        self.start_charging = true;
        self.execute_charged_skill = true;
        self
    }

    pub fn with_movement(mut self, movement: MovementBehavior) -> Self {
        self.movement = movement;
        self
    }

    pub fn with_transition(mut self, transition: PatternTransition) -> Self {
        self.transitions.push(transition);
        self
    }

    pub fn with_fallback(mut self, target: &str, timeout: f32) -> Self {
        self.fallback = Some(target.to_string());
        self.fallback_timeout = Some(timeout);
        self
    }

    pub fn can_execute(&self, ctx: &PatternEvaluationContext) -> bool {
        self.can_execute_with(&ConditionRegistry::standard(), ctx)
    }

    pub fn can_execute_with(&self, registry: &ConditionRegistry, ctx: &PatternEvaluationContext) -> bool {
        registry.evaluate_all(&self.conditions, ctx)
    }

    /// Highest-priority transition whose conditions all hold; ties go to the
    /// one declared first
    pub fn get_valid_transition(&self, ctx: &PatternEvaluationContext) -> Option<&PatternTransition> {
        self.valid_transition_at_least(&ConditionRegistry::standard(), ctx, i32::MIN)
    }

    /// Like [`Self::get_valid_transition`], ignoring transitions below `min_priority`
    pub fn valid_transition_at_least(
        &self,
        registry: &ConditionRegistry,
        ctx: &PatternEvaluationContext,
        min_priority: i32,
    ) -> Option<&PatternTransition> {
        let mut best: Option<&PatternTransition> = None;
        for transition in &self.transitions {
            if transition.priority < min_priority {
                continue;
            }
            if best.is_some_and(|b| transition.priority <= b.priority) {
                continue;
            }
            if registry.evaluate_all(&transition.conditions, ctx) {
                best = Some(transition);
            }
        }
        best
    }
}
