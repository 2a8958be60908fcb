//! Movement behaviors for pattern nodes
//!
//! Each behavior maps the agent's position, its target and its weapon reach
//! to a unit (or zero) movement vector. Integration is up to the host.

use serde::{Deserialize, Serialize};

use crate::combat::combatant::Combatant;
use crate::combat::status::StatusEffectManager;
use crate::core::types::{direction, Vec2};

/// Close enough to a destination to stop
const ARRIVAL_TOLERANCE: f32 = 0.25;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrafeDirection {
    #[default]
    Left,
    Right,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MovementBehavior {
    /// Keep distance to the target within `[min, max]`
    MaintainRange { min: f32, max: f32 },
    /// Close in until the weapon reaches, less `margin`
    ApproachToWeaponRange {
        #[serde(default)]
        margin: f32,
    },
    /// Back away while closer than `distance`
    RetreatFromTarget { distance: f32 },
    /// Back away until `distance` from where the node was entered
    RetreatFixedDistance { distance: f32 },
    CircleStrafe {
        #[serde(default)]
        direction: StrafeDirection,
        /// Radius to hold while circling; zero keeps the current radius
        #[serde(default)]
        preferred_distance: f32,
    },
    #[default]
    HoldPosition,
    FollowAtDistance { distance: f32 },
    /// Stand at `offset` from the target
    FormationSlot { offset: [f32; 2] },
}

/// Inputs to a movement decision
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MovementInput {
    pub position: Vec2,
    pub target: Option<Vec2>,
    pub weapon_range: f32,
    /// Where the agent stood when it entered the current node
    pub entry_position: Vec2,
}

impl MovementBehavior {
    pub fn compute(&self, input: &MovementInput) -> Vec2 {
        let Some(target) = input.target else {
            return Vec2::ZERO;
        };
        let position = input.position;
        let toward = direction(position, target);
        let distance = position.distance(target);

        match *self {
            MovementBehavior::MaintainRange { min, max } => {
                if distance > max {
                    toward
                } else if distance < min {
                    -toward
                } else {
                    Vec2::ZERO
                }
            }
            MovementBehavior::ApproachToWeaponRange { margin } => {
                let reach = (input.weapon_range - margin).max(0.0);
                if distance > reach {
                    toward
                } else {
                    Vec2::ZERO
                }
            }
            MovementBehavior::RetreatFromTarget { distance: keep } => {
                if distance < keep {
                    away_from(toward)
                } else {
                    Vec2::ZERO
                }
            }
            MovementBehavior::RetreatFixedDistance { distance: travel } => {
                if position.distance(input.entry_position) < travel {
                    away_from(toward)
                } else {
                    Vec2::ZERO
                }
            }
            MovementBehavior::CircleStrafe {
                direction: side,
                preferred_distance,
            } => {
                let tangent = match side {
                    StrafeDirection::Left => toward.perp(),
                    StrafeDirection::Right => -toward.perp(),
                };
                let radial = if preferred_distance > 0.0 {
                    toward * (distance - preferred_distance).clamp(-1.0, 1.0)
                } else {
                    Vec2::ZERO
                };
                (tangent + radial).normalize_or_zero()
            }
            MovementBehavior::HoldPosition => Vec2::ZERO,
            MovementBehavior::FollowAtDistance { distance: keep } => {
                if distance > keep + ARRIVAL_TOLERANCE {
                    toward
                } else {
                    Vec2::ZERO
                }
            }
            MovementBehavior::FormationSlot { offset } => {
                let slot = target + Vec2::from(offset);
                if position.distance(slot) > ARRIVAL_TOLERANCE {
                    direction(position, slot)
                } else {
                    Vec2::ZERO
                }
            }
        }
    }
}

fn away_from(toward: Vec2) -> Vec2 {
    if toward == Vec2::ZERO {
        Vec2::X
    } else {
        -toward
    }
}

/// Movement vector for a node, honoring its freeze override
pub fn node_movement(behavior: &MovementBehavior, freeze: bool, input: &MovementInput) -> Vec2 {
    if freeze {
        return Vec2::ZERO;
    }
    behavior.compute(input)
}

/// Actuation point for AI movement
pub trait MovementController {
    fn set_movement_input(&mut self, input: Vec2);
    fn can_move(&self) -> bool;
}

impl MovementController for Combatant {
    fn set_movement_input(&mut self, input: Vec2) {
        self.movement_input = input;
    }

    fn can_move(&self) -> bool {
        self.is_alive() && self.status.can_move()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(x: f32) -> MovementInput {
        MovementInput {
            position: Vec2::ZERO,
            target: Some(Vec2::new(x, 0.0)),
            weapon_range: 2.0,
            entry_position: Vec2::ZERO,
        }
    }

    #[test]
    fn test_approach_stops_at_weapon_range() {
        let approach = MovementBehavior::ApproachToWeaponRange { margin: 0.0 };
        assert_eq!(approach.compute(&input(5.0)), Vec2::X);
        assert_eq!(approach.compute(&input(1.5)), Vec2::ZERO);
    }

    #[test]
    fn test_maintain_range_band() {
        let keep = MovementBehavior::MaintainRange { min: 3.0, max: 5.0 };
        assert_eq!(keep.compute(&input(8.0)), Vec2::X);
        assert_eq!(keep.compute(&input(4.0)), Vec2::ZERO);
        assert_eq!(keep.compute(&input(1.0)), -Vec2::X);
    }

    #[test]
    fn test_retreat_fixed_distance_stops_after_travel() {
        let retreat = MovementBehavior::RetreatFixedDistance { distance: 3.0 };
        let mut moved = input(1.0);
        assert_eq!(retreat.compute(&moved), -Vec2::X);
        moved.position = Vec2::new(-3.5, 0.0);
        assert_eq!(retreat.compute(&moved), Vec2::ZERO);
    }

    #[test]
    fn test_circle_strafe_is_tangent() {
        let left = MovementBehavior::CircleStrafe {
            direction: StrafeDirection::Left,
            preferred_distance: 0.0,
        };
        let right = MovementBehavior::CircleStrafe {
            direction: StrafeDirection::Right,
            preferred_distance: 0.0,
        };
        let l = left.compute(&input(4.0));
        let r = right.compute(&input(4.0));
        assert!(l.dot(Vec2::X).abs() < 1e-6);
        assert!((l + r).length() < 1e-6);
    }

    #[test]
    fn test_freeze_overrides_everything() {
        let approach = MovementBehavior::ApproachToWeaponRange { margin: 0.0 };
        assert_eq!(node_movement(&approach, true, &input(10.0)), Vec2::ZERO);
    }

    #[test]
    fn test_no_target_no_movement() {
        let follow = MovementBehavior::FollowAtDistance { distance: 1.0 };
        let mut alone = input(5.0);
        alone.target = None;
        assert_eq!(follow.compute(&alone), Vec2::ZERO);
    }

    #[test]
    fn test_parse_tagged_behavior() {
        #[derive(Deserialize)]
        struct Wrapper {
            movement: MovementBehavior,
        }
        let parsed: Wrapper =
            toml::from_str("movement = { type = \"circle_strafe\", direction = \"right\" }").unwrap();
        assert_eq!(
            parsed.movement,
            MovementBehavior::CircleStrafe {
                direction: StrafeDirection::Right,
                preferred_distance: 0.0
            }
        );
    }
}
