//! Combat configuration with documented constants
//!
//! All tunable numbers used by the resolvers and the pattern executor are
//! collected here. A config is built once at simulation start and passed
//! explicitly to whatever needs it.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::core::error::{CombatError, Result};

/// Configuration for combat resolution and AI pattern execution
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    // === INTERACTION TIMING ===
    /// Window (seconds) within which offensive executions count as simultaneous
    ///
    /// Also the decay age for the pending-offensive queue: anything older
    /// than this at resolution time is abandoned.
    pub simultaneity_window: f64,

    /// Seconds a defensive skill may wait before it is force-completed
    ///
    /// Waiting skills that are never hit would otherwise sit in the
    /// manager's list forever.
    pub defensive_timeout: f64,

    /// Two speeds closer than this are a tie
    pub speed_epsilon: f32,

    /// Dexterity points per point of execution speed
    pub dexterity_speed_divisor: f32,

    // === AREA & DISPLACEMENT ===
    /// Radius of the Windmill area attack
    pub windmill_radius: f32,

    /// Distance a counter-reflected attacker is pushed away
    pub knockback_distance: f32,

    /// Distance a knocked-down combatant is pushed away
    pub knockdown_distance: f32,

    // === DAMAGE & STAGGER ===
    /// Knockdown meter value at which a knockdown is forced
    pub knockdown_threshold: f32,

    /// Fraction of normal damage dealt when Smash breaks through Defense
    pub defense_knockdown_factor: f32,

    /// Damage multiplier on a critical hit
    pub critical_multiplier: f32,

    /// Flat critical chance added on top of the stat value
    pub base_critical_chance: f32,

    /// Stun reduction per point of Will (capped at 50%)
    pub will_stun_resistance: f32,

    /// Stagger applied by every direct hit regardless of skill
    pub hit_stagger_duration: f32,

    /// Seconds a knockdown lasts
    pub knockdown_duration: f32,

    /// Seconds a knockback stagger lasts
    pub knockback_duration: f32,

    // === PATTERN EXECUTION ===
    /// Transitions at or above this priority may interrupt a charge while staggered
    pub defensive_interrupt_priority: i32,

    /// Combat is left once distance exceeds engage distance times this factor
    pub disengage_factor: f32,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            simultaneity_window: 0.1,
            defensive_timeout: 5.0,
            speed_epsilon: 0.001,
            dexterity_speed_divisor: 10.0,

            windmill_radius: 3.0,
            knockback_distance: 2.0,
            knockdown_distance: 3.0,

            knockdown_threshold: 100.0,
            defense_knockdown_factor: 0.25,
            critical_multiplier: 1.5,
            base_critical_chance: 0.0,
            will_stun_resistance: 0.005,
            hit_stagger_duration: 0.4,
            knockdown_duration: 2.0,
            knockback_duration: 0.6,

            defensive_interrupt_priority: 100,
            disengage_factor: 1.5,
        }
    }
}

impl CombatConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a config from TOML; missing fields take their defaults
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: CombatConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a config file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        if self.simultaneity_window <= 0.0 {
            return Err(CombatError::InvalidConfig(format!(
                "simultaneity_window ({}) must be positive",
                self.simultaneity_window
            )));
        }

        if self.defensive_timeout <= self.simultaneity_window {
            return Err(CombatError::InvalidConfig(format!(
                "defensive_timeout ({}) must exceed simultaneity_window ({})",
                self.defensive_timeout, self.simultaneity_window
            )));
        }

        if self.dexterity_speed_divisor <= 0.0 {
            return Err(CombatError::InvalidConfig(
                "dexterity_speed_divisor must be positive".into(),
            ));
        }

        if self.windmill_radius <= 0.0 || self.knockdown_threshold <= 0.0 {
            return Err(CombatError::InvalidConfig(
                "windmill_radius and knockdown_threshold must be positive".into(),
            ));
        }

        if !(0.0..=1.0).contains(&self.defense_knockdown_factor) {
            return Err(CombatError::InvalidConfig(format!(
                "defense_knockdown_factor ({}) must be within [0, 1]",
                self.defense_knockdown_factor
            )));
        }

        if self.disengage_factor < 1.0 {
            return Err(CombatError::InvalidConfig(format!(
                "disengage_factor ({}) must be at least 1.0",
                self.disengage_factor
            )));
        }

        Ok(())
    }
}
