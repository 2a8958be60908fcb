//! Skill resolution between combatants
//!
//! Leaf modules (`speed`, `pool`, `interaction`, `conflict`) are pure or
//! self-contained; [`manager::CombatInteractionManager`] drives them once per tick.

pub mod combatant;
pub mod conflict;
pub mod constants;
pub mod events;
pub mod interaction;
pub mod loadout;
pub mod manager;
pub mod pool;
pub mod resources;
pub mod skill;
pub mod speed;
pub mod state;
pub mod stats;
pub mod status;
pub mod weapons;

pub use combatant::{CombatArena, Combatant};
pub use conflict::{Verdict, LOST_SPEED_RESOLUTION};
pub use events::{CombatEvent, CombatEventKind, CombatEventLog, InteractionKind};
pub use interaction::{determine_interaction, InteractionOutcome, InteractionResult};
pub use loadout::{WeaponController, WeaponLoadout};
pub use manager::CombatInteractionManager;
pub use pool::{CombatPool, ExecutionHandle, PoolStats, SkillExecution};
pub use resources::{Health, HealthSystem, Stamina, StaminaSystem};
pub use skill::{SkillExecutionState, SkillProfile, SkillSystem, SkillType};
pub use speed::{calculate_speed, can_interact, resolve_speed_conflict, SpeedOutcome};
pub use state::{CombatState, StateValidator};
pub use stats::{CharacterStats, StatModifiers};
pub use status::{StatusEffectManager, StatusEffects};
pub use weapons::WeaponData;
