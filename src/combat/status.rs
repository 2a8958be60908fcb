//! Timed status effects: stun, knockdown, knockback, resting
//!
//! Durations never shorten: applying a shorter stun while a longer one is
//! running keeps the longer one.

/// Status queries and mutations consumed by the resolvers and the AI
pub trait StatusEffectManager {
    fn apply_stun(&mut self, duration: f32);
    fn apply_knockdown(&mut self, duration: f32);
    fn apply_knockback(&mut self, duration: f32);
    fn set_resting(&mut self, resting: bool);

    fn is_stunned(&self) -> bool;
    fn is_knocked_down(&self) -> bool;
    fn is_knocked_back(&self) -> bool;
    fn is_resting(&self) -> bool;

    fn can_move(&self) -> bool {
        !self.is_stunned() && !self.is_knocked_down() && !self.is_knocked_back()
    }

    fn can_act(&self) -> bool {
        !self.is_stunned() && !self.is_knocked_down()
    }
}

#[derive(Debug, Clone, Default)]
pub struct StatusEffects {
    stun_remaining: f32,
    knockdown_remaining: f32,
    knockback_remaining: f32,
    resting: bool,
    knockdown_meter: f32,
}

impl StatusEffects {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stun_remaining(&self) -> f32 {
        self.stun_remaining
    }

    pub fn knockdown_meter(&self) -> f32 {
        self.knockdown_meter
    }

    /// Add stagger to the knockdown meter. Returns true when the meter
    /// crosses `threshold`; the meter then resets.
    pub fn add_knockdown_buildup(&mut self, amount: f32, threshold: f32) -> bool {
        self.knockdown_meter += amount.max(0.0);
        if self.knockdown_meter >= threshold {
            self.knockdown_meter = 0.0;
            return true;
        }
        false
    }

    pub fn update(&mut self, dt: f32) {
        self.stun_remaining = (self.stun_remaining - dt).max(0.0);
        self.knockdown_remaining = (self.knockdown_remaining - dt).max(0.0);
        self.knockback_remaining = (self.knockback_remaining - dt).max(0.0);
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

impl StatusEffectManager for StatusEffects {
    fn apply_stun(&mut self, duration: f32) {
        self.stun_remaining = self.stun_remaining.max(duration);
        self.resting = false;
    }

    fn apply_knockdown(&mut self, duration: f32) {
        self.knockdown_remaining = self.knockdown_remaining.max(duration);
        self.knockdown_meter = 0.0;
        self.resting = false;
    }

    fn apply_knockback(&mut self, duration: f32) {
        self.knockback_remaining = self.knockback_remaining.max(duration);
        self.resting = false;
    }

    fn set_resting(&mut self, resting: bool) {
        self.resting = resting;
    }

    fn is_stunned(&self) -> bool {
        self.stun_remaining > 0.0
    }

    fn is_knocked_down(&self) -> bool {
        self.knockdown_remaining > 0.0
    }

    fn is_knocked_back(&self) -> bool {
        self.knockback_remaining > 0.0
    }

    fn is_resting(&self) -> bool {
        self.resting
    }
}
