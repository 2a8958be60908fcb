//! Core type definitions used throughout the codebase

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use glam::Vec2;

/// Unique identifier for combatants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CombatantId(pub Uuid);

impl CombatantId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CombatantId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CombatantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Short form is enough to tell combatants apart in logs
        let s = self.0.simple().to_string();
        write!(f, "{}", &s[..8])
    }
}

/// Simulation time in seconds since the simulation started
pub type SimTime = f64;

/// Which side a combatant fights for. Combatants of different factions are hostile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Faction(pub u8);

impl Faction {
    pub const PLAYER: Faction = Faction(0);
    pub const ENEMY: Faction = Faction(1);

    pub fn is_hostile_to(&self, other: Faction) -> bool {
        self.0 != other.0
    }
}

/// Normalized direction from `from` to `to`, or zero if the points coincide
pub fn direction(from: Vec2, to: Vec2) -> Vec2 {
    (to - from).normalize_or_zero()
}
