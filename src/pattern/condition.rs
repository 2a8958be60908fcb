//! Declarative conditions and their evaluators
//!
//! Each [`ConditionKind`] maps to one evaluator function in a
//! [`ConditionRegistry`]. A kind with no evaluator, including kinds the
//! loader did not recognise, logs a warning and evaluates false.

use std::sync::{Arc, OnceLock};

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::combat::skill::{SkillExecutionState, SkillType};
use crate::combat::state::CombatState;
use crate::pattern::context::PatternEvaluationContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionKind {
    HealthBelow,
    HealthAbove,
    StaminaBelow,
    StaminaAbove,
    HitsTakenAtLeast,
    HitsDealtAtLeast,
    BlocksAtLeast,
    PlayerCharging,
    PlayerExecuting,
    PlayerSkillType,
    PlayerCombatState,
    DistanceBelow,
    DistanceAbove,
    InWeaponRange,
    SkillReady,
    SkillState,
    CombatState,
    TimeInNodeAbove,
    CooldownExpired,
    RandomChance,
    LastSkillSucceeded,
    #[serde(other)]
    Unknown,
}

/// One test against the evaluation context
///
/// Only the parameters the kind uses need to be set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternCondition {
    pub kind: ConditionKind,
    #[serde(default)]
    pub value: f32,
    #[serde(default)]
    pub skill_type: Option<SkillType>,
    #[serde(default)]
    pub combat_state: Option<CombatState>,
    #[serde(default)]
    pub skill_state: Option<SkillExecutionState>,
    #[serde(default)]
    pub cooldown_id: Option<u32>,
    /// Invert the result of a known kind
    #[serde(default)]
    pub negate: bool,
}

impl PatternCondition {
    pub fn new(kind: ConditionKind) -> Self {
        Self {
            kind,
            value: 0.0,
            skill_type: None,
            combat_state: None,
            skill_state: None,
            cooldown_id: None,
            negate: false,
        }
    }

    pub fn with_value(mut self, value: f32) -> Self {
        self.value = value;
        self
    }

    pub fn with_skill(mut self, skill: SkillType) -> Self {
        self.skill_type = Some(skill);
        self
    }

    pub fn with_combat_state(mut self, state: CombatState) -> Self {
        self.combat_state = Some(state);
        self
    }

    pub fn with_skill_state(mut self, state: SkillExecutionState) -> Self {
        self.skill_state = Some(state);
        self
    }

    pub fn with_cooldown(mut self, id: u32) -> Self {
        self.cooldown_id = Some(id);
        self
    }

    pub fn negated(mut self) -> Self {
        self.negate = !self.negate;
        self
    }

    /// Evaluate with the standard registry
    pub fn evaluate(&self, ctx: &PatternEvaluationContext) -> bool {
        ConditionRegistry::standard().evaluate(self, ctx)
    }
}

pub type ConditionEvaluator = fn(&PatternCondition, &PatternEvaluationContext) -> bool;

/// Kind → evaluator table
#[derive(Debug, Clone, Default)]
pub struct ConditionRegistry {
    evaluators: AHashMap<ConditionKind, ConditionEvaluator>,
}

static STANDARD: OnceLock<Arc<ConditionRegistry>> = OnceLock::new();

impl ConditionRegistry {
    /// Registry with no evaluators; every condition fails
    pub fn empty() -> Self {
        Self::default()
    }

    /// Shared registry holding every built-in kind
    pub fn standard() -> Arc<ConditionRegistry> {
        STANDARD.get_or_init(|| Arc::new(Self::with_builtins())).clone()
    }

    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        registry.register(ConditionKind::HealthBelow, |c, ctx| ctx.health_fraction < c.value);
        registry.register(ConditionKind::HealthAbove, |c, ctx| ctx.health_fraction > c.value);
        registry.register(ConditionKind::StaminaBelow, |c, ctx| ctx.stamina_fraction < c.value);
        registry.register(ConditionKind::StaminaAbove, |c, ctx| ctx.stamina_fraction > c.value);
        registry.register(ConditionKind::HitsTakenAtLeast, |c, ctx| ctx.hits_taken as f32 >= c.value);
        registry.register(ConditionKind::HitsDealtAtLeast, |c, ctx| ctx.hits_dealt as f32 >= c.value);
        registry.register(ConditionKind::BlocksAtLeast, |c, ctx| ctx.blocks as f32 >= c.value);
        registry.register(ConditionKind::PlayerCharging, |_, ctx| {
            ctx.player_skill_state.is_some_and(|s| s.is_preparing())
        });
        registry.register(ConditionKind::PlayerExecuting, |_, ctx| {
            ctx.player_skill_state.is_some_and(|s| s.is_executing())
        });
        registry.register(ConditionKind::PlayerSkillType, |c, ctx| {
            c.skill_type.is_some() && ctx.player_skill == c.skill_type
        });
        registry.register(ConditionKind::PlayerCombatState, |c, ctx| {
            c.combat_state.is_some() && ctx.player_combat_state == c.combat_state
        });
        registry.register(ConditionKind::DistanceBelow, |c, ctx| {
            ctx.distance_to_player.is_some_and(|d| d < c.value)
        });
        registry.register(ConditionKind::DistanceAbove, |c, ctx| {
            ctx.distance_to_player.is_some_and(|d| d > c.value)
        });
        registry.register(ConditionKind::InWeaponRange, |c, ctx| {
            let range = ctx.range_for(c.skill_type.or(ctx.current_skill));
            range > 0.0 && ctx.distance_to_player.is_some_and(|d| d <= range)
        });
        registry.register(ConditionKind::SkillReady, |c, ctx| match ctx.skill_state {
            SkillExecutionState::Charged => true,
            SkillExecutionState::Aiming => ctx.aim_accuracy >= c.value,
            _ => false,
        });
        registry.register(ConditionKind::SkillState, |c, ctx| c.skill_state == Some(ctx.skill_state));
        registry.register(ConditionKind::CombatState, |c, ctx| c.combat_state == Some(ctx.combat_state));
        registry.register(ConditionKind::TimeInNodeAbove, |c, ctx| ctx.time_in_node >= c.value);
        registry.register(ConditionKind::CooldownExpired, |c, ctx| {
            c.cooldown_id.map_or(true, |id| ctx.cooldown_expired(id))
        });
        registry.register(ConditionKind::RandomChance, |c, ctx| ctx.random_value < c.value);
        registry.register(ConditionKind::LastSkillSucceeded, |_, ctx| {
            ctx.last_skill_succeeded == Some(true)
        });
        registry
    }

    /// Add or replace the evaluator for `kind`
    pub fn register(&mut self, kind: ConditionKind, evaluator: ConditionEvaluator) {
        self.evaluators.insert(kind, evaluator);
    }

    pub fn evaluate(&self, condition: &PatternCondition, ctx: &PatternEvaluationContext) -> bool {
        match self.evaluators.get(&condition.kind) {
            Some(evaluator) => evaluator(condition, ctx) != condition.negate,
            None => {
                tracing::warn!(kind = ?condition.kind, "no evaluator for condition kind, failing closed");
                false
            }
        }
    }

    /// All conditions hold; an empty list holds vacuously
    pub fn evaluate_all(&self, conditions: &[PatternCondition], ctx: &PatternEvaluationContext) -> bool {
        conditions.iter().all(|c| self.evaluate(c, ctx))
    }
}
