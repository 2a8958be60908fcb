pub mod config;
pub mod error;
pub mod types;

pub use config::CombatConfig;
pub use error::{CombatError, PatternError, PatternResult, Result};
pub use types::{CombatantId, Faction, SimTime, Vec2};
