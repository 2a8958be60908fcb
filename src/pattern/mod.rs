//! Pattern-driven AI
//!
//! A [`PatternDefinition`] is a declarative graph of nodes; each agent runs
//! it through its own [`PatternExecutor`].

pub mod condition;
pub mod context;
pub mod coordinator;
pub mod definition;
pub mod executor;
pub mod movement;
pub mod node;
pub mod telegraph;

pub use condition::{ConditionKind, ConditionRegistry, PatternCondition};
pub use context::PatternEvaluationContext;
pub use coordinator::{AttackCoordinator, SlotCoordinator};
pub use definition::{PatternDefinition, PatternLibrary};
pub use executor::{AgentContext, PatternExecutor, TransitionCause};
pub use movement::{MovementBehavior, MovementController, MovementInput, StrafeDirection};
pub use node::{CooldownSpec, PatternNode, PatternTransition};
pub use telegraph::{RecordingPresenter, TelegraphData, TelegraphKind, TelegraphPresenter};
