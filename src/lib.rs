//! Skirmish Core - skill resolution and pattern-driven AI for real-time melee combat

pub mod combat;
pub mod core;
pub mod pattern;
pub mod simulation;
