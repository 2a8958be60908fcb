use thiserror::Error;

use crate::core::types::CombatantId;

/// Pattern configuration errors, detected when a pattern is loaded or validated.
///
/// A pattern that fails validation is never handed out partially loaded.
#[derive(Error, Debug)]
pub enum PatternError {
    #[error("pattern has no nodes")]
    NoNodes,

    #[error("node at index {index} has an empty name")]
    EmptyNodeName { index: usize },

    #[error("duplicate node name: {0}")]
    DuplicateNodeName(String),

    #[error("starting node {0} does not exist")]
    MissingStartingNode(String),

    #[error("transition from {from} targets missing node {to}")]
    DanglingTransition { from: String, to: String },

    #[error("fallback of {from} targets missing node {to}")]
    DanglingFallback { from: String, to: String },

    #[error("node {0} unreachable")]
    UnreachableNode(String),

    #[error("failed to parse pattern: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to read pattern file: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum CombatError {
    #[error("Combatant not found: {0}")]
    CombatantNotFound(CombatantId),

    #[error("Invalid action: {0}")]
    InvalidAction(String),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Pattern error: {0}")]
    Pattern(#[from] PatternError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    TomlError(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, CombatError>;

pub type PatternResult<T> = std::result::Result<T, PatternError>;
