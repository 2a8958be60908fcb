//! Attack telegraphs
//!
//! The core only decides when a telegraph starts and stops; showing it is
//! the presenter's job.

use serde::{Deserialize, Serialize};

use crate::core::types::CombatantId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TelegraphKind {
    #[default]
    Flash,
    Glint,
    GroundMarker,
    Audio,
    #[serde(other)]
    Unknown,
}

/// Pre-attack warning attached to a pattern node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelegraphData {
    #[serde(default)]
    pub kind: TelegraphKind,
    /// RGBA
    #[serde(default = "default_color")]
    pub color: [f32; 4],
    #[serde(default)]
    pub audio_clip: Option<String>,
    #[serde(default = "default_duration")]
    pub duration: f32,
    /// Lead time before the attack lands
    #[serde(default)]
    pub anticipation: f32,
}

fn default_color() -> [f32; 4] {
    [1.0, 0.2, 0.2, 1.0]
}

fn default_duration() -> f32 {
    0.5
}

impl Default for TelegraphData {
    fn default() -> Self {
        Self {
            kind: TelegraphKind::default(),
            color: default_color(),
            audio_clip: None,
            duration: default_duration(),
            anticipation: 0.0,
        }
    }
}

/// Whoever renders or plays telegraphs
pub trait TelegraphPresenter {
    fn show_telegraph(&mut self, owner: CombatantId, telegraph: &TelegraphData);
    fn cancel_telegraph(&mut self, owner: CombatantId);
}

/// Show `telegraph` unless its kind is unknown. Returns whether it was shown.
pub fn present(presenter: &mut dyn TelegraphPresenter, owner: CombatantId, telegraph: &TelegraphData) -> bool {
    if telegraph.kind == TelegraphKind::Unknown {
        tracing::warn!(combatant = %owner, "unknown telegraph kind, not shown");
        return false;
    }
    presenter.show_telegraph(owner, telegraph);
    true
}

#[derive(Debug, Clone, PartialEq)]
pub enum TelegraphRecord {
    Shown { owner: CombatantId, kind: TelegraphKind },
    Cancelled { owner: CombatantId },
}

/// Presenter that keeps a list of calls
#[derive(Debug, Clone, Default)]
pub struct RecordingPresenter {
    pub records: Vec<TelegraphRecord>,
}

impl RecordingPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shown_count(&self) -> usize {
        self.records
            .iter()
            .filter(|r| matches!(r, TelegraphRecord::Shown { .. }))
            .count()
    }
}

impl TelegraphPresenter for RecordingPresenter {
    fn show_telegraph(&mut self, owner: CombatantId, telegraph: &TelegraphData) {
        self.records.push(TelegraphRecord::Shown {
            owner,
            kind: telegraph.kind,
        });
    }

    fn cancel_telegraph(&mut self, owner: CombatantId) {
        self.records.push(TelegraphRecord::Cancelled { owner });
    }
}
