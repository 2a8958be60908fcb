//! Per-agent pattern state machine
//!
//! States are the nodes of a shared [`PatternDefinition`]. Each tick the
//! executor refreshes its context, takes at most one transition, then acts
//! on the current node: charge, execute, move.

use std::sync::Arc;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::combat::combatant::{CombatArena, Combatant};
use crate::combat::events::{CombatEvent, CombatEventKind};
use crate::combat::loadout::WeaponController;
use crate::combat::manager::CombatInteractionManager;
use crate::combat::resources::StaminaSystem;
use crate::combat::skill::SkillExecutionState;
use crate::combat::state::{CombatState, StateValidator};
use crate::core::types::{CombatantId, SimTime, Vec2};
use crate::pattern::condition::ConditionRegistry;
use crate::pattern::context::PatternEvaluationContext;
use crate::pattern::coordinator::AttackCoordinator;
use crate::pattern::definition::PatternDefinition;
use crate::pattern::movement::{node_movement, MovementController, MovementInput};
use crate::pattern::node::{PatternNode, PatternTransition};
use crate::pattern::telegraph::{present, TelegraphPresenter};

/// Everything an agent touches during its update
pub struct AgentContext<'a> {
    pub arena: &'a mut CombatArena,
    pub manager: &'a mut CombatInteractionManager,
    pub coordinator: &'a mut dyn AttackCoordinator,
    pub presenter: &'a mut dyn TelegraphPresenter,
}

/// Why a node change happened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionCause {
    Normal,
    DefensiveInterrupt,
    Fallback,
}

/// What to do on the way into the next node
struct PendingTransition {
    target: usize,
    cause: TransitionCause,
    reset_hit_counters: bool,
    cooldown: Option<(u32, f32)>,
}

impl PendingTransition {
    fn from_edge(pattern: &PatternDefinition, edge: &PatternTransition, cause: TransitionCause) -> Option<Self> {
        Some(Self {
            target: pattern.node_index(&edge.target)?,
            cause,
            reset_hit_counters: edge.reset_hit_counters,
            cooldown: edge.start_cooldown.map(|c| (c.id, c.duration)),
        })
    }
}

pub struct PatternExecutor {
    id: CombatantId,
    pattern: Arc<PatternDefinition>,
    registry: Arc<ConditionRegistry>,
    /// `None` once the agent has nothing usable to run
    current: Option<usize>,
    entered: bool,
    context: PatternEvaluationContext,
    rng: ChaCha8Rng,
    entry_position: Vec2,
    engaged: bool,
    registered: bool,
    holds_attack_slot: bool,
    telegraph_shown: bool,
    shut_down: bool,
    transitions_taken: u32,
}

impl PatternExecutor {
    pub fn new(id: CombatantId, pattern: Arc<PatternDefinition>, seed: u64) -> Self {
        let current = pattern.start_index();
        if current.is_none() {
            tracing::error!(combatant = %id, pattern = %pattern.name, "pattern has no usable starting node, agent will stand idle");
        }
        Self {
            id,
            pattern,
            registry: ConditionRegistry::standard(),
            current,
            entered: false,
            context: PatternEvaluationContext::new(),
            rng: ChaCha8Rng::seed_from_u64(seed),
            entry_position: Vec2::ZERO,
            engaged: false,
            registered: false,
            holds_attack_slot: false,
            telegraph_shown: false,
            shut_down: false,
            transitions_taken: 0,
        }
    }

    pub fn with_registry(mut self, registry: Arc<ConditionRegistry>) -> Self {
        self.registry = registry;
        self
    }

    pub fn id(&self) -> CombatantId {
        self.id
    }

    pub fn pattern(&self) -> &Arc<PatternDefinition> {
        &self.pattern
    }

    pub fn current_node(&self) -> Option<&PatternNode> {
        self.current.map(|i| &self.pattern.nodes[i])
    }

    pub fn current_node_name(&self) -> Option<&str> {
        self.current_node().map(|n| n.name.as_str())
    }

    pub fn context(&self) -> &PatternEvaluationContext {
        &self.context
    }

    pub fn is_engaged(&self) -> bool {
        self.engaged
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }

    pub fn holds_attack_slot(&self) -> bool {
        self.holds_attack_slot
    }

    pub fn transitions_taken(&self) -> u32 {
        self.transitions_taken
    }

    /// Feed a resolved combat event into the hit counters
    pub fn observe(&mut self, event: &CombatEvent) {
        match &event.kind {
            CombatEventKind::Hit { attacker, target, .. } => {
                if *attacker == self.id {
                    self.context.hits_dealt += 1;
                }
                if *target == self.id {
                    self.context.hits_taken += 1;
                }
            }
            CombatEventKind::Interaction {
                attacker,
                defender,
                damage_to_attacker,
                damage_to_defender,
                ..
            } => {
                if *damage_to_defender > 0.0 {
                    if *attacker == self.id {
                        self.context.hits_dealt += 1;
                    }
                    if *defender == self.id {
                        self.context.hits_taken += 1;
                    }
                }
                if *damage_to_attacker > 0.0 {
                    if *defender == self.id {
                        self.context.hits_dealt += 1;
                    }
                    if *attacker == self.id {
                        self.context.hits_taken += 1;
                    }
                }
            }
            CombatEventKind::DefenseCompleted { owner, succeeded: true, .. } if *owner == self.id => {
                self.context.blocks += 1;
            }
            _ => {}
        }
    }

    /// One decision step
    pub fn update(&mut self, dt: f32, now: SimTime, ctx: &mut AgentContext<'_>) {
        if self.shut_down {
            return;
        }
        if !self.registered {
            ctx.coordinator.register(self.id);
            self.registered = true;
        }

        let alive = match ctx.arena.get(self.id) {
            Some(me) => me.is_alive(),
            None => {
                tracing::warn!(combatant = %self.id, "agent's combatant is gone");
                false
            }
        };
        if !alive {
            self.shutdown(ctx);
            return;
        }
        let Some(mut current) = self.current else {
            if let Some(me) = ctx.arena.get_mut(self.id) {
                me.set_movement_input(Vec2::ZERO);
            }
            return;
        };

        if !self.entered {
            self.enter(current, ctx.arena);
        } else {
            self.context.time_in_node += dt;
        }
        self.refresh_context(now, ctx.arena);
        self.update_engagement(ctx);

        let interrupt_priority = ctx.manager.config().defensive_interrupt_priority;
        if let Some(pending) = self.choose_transition(current, ctx.arena, interrupt_priority) {
            self.apply_transition(current, pending, ctx);
            current = self.current.unwrap_or(current);
        }

        self.act(current, ctx);
        self.drive_movement(current, ctx.arena);
    }

    /// Stop driving the agent and hand back everything it holds
    pub fn shutdown(&mut self, ctx: &mut AgentContext<'_>) {
        if self.shut_down {
            return;
        }
        if self.telegraph_shown {
            ctx.presenter.cancel_telegraph(self.id);
            self.telegraph_shown = false;
        }
        if self.holds_attack_slot {
            ctx.coordinator.release_attack_slot(self.id);
            self.holds_attack_slot = false;
        }
        ctx.coordinator.unregister(self.id);
        ctx.manager.cancel_skill(ctx.arena, self.id);
        if let Some(me) = ctx.arena.get_mut(self.id) {
            me.set_movement_input(Vec2::ZERO);
            me.in_combat = false;
        }
        self.engaged = false;
        self.shut_down = true;
        tracing::info!(combatant = %self.id, "agent shut down");
    }

    fn enter(&mut self, index: usize, arena: &CombatArena) {
        self.current = Some(index);
        self.entered = true;
        self.context.enter_node(self.rng.gen());
        if let Some(me) = arena.get(self.id) {
            self.entry_position = me.position;
        }
    }

    fn refresh_context(&mut self, now: SimTime, arena: &mut CombatArena) {
        let player = arena.nearest_hostile(self.id);
        let Some(me) = arena.get_mut(self.id) else {
            return;
        };
        me.target = player.map(|(id, _)| id);

        let previous_state = self.context.combat_state;
        let ctx = &mut self.context;
        ctx.now = now;
        ctx.health_fraction = me.health.fraction();
        ctx.stamina = me.stamina.current_stamina();
        ctx.stamina_fraction = me.stamina.fraction();
        ctx.combat_state = CombatState::derive(me);
        ctx.skill_state = me.skill_state();
        ctx.current_skill = me.skills.current_skill();
        ctx.aim_accuracy = me.skills.aim_accuracy();
        ctx.last_skill_succeeded = me.skills.last_skill_succeeded();
        ctx.melee_range = me.loadout.melee_range();
        ctx.ranged_range = me.loadout.ranged_range();

        if ctx.combat_state.is_interruptible() && ctx.combat_state != previous_state {
            ctx.random_value = self.rng.gen();
        }

        let ctx = &mut self.context;
        match player.and_then(|(id, distance)| arena.get(id).map(|p| (p, distance))) {
            Some((p, distance)) => {
                ctx.distance_to_player = Some(distance);
                ctx.player_combat_state = Some(CombatState::derive(p));
                ctx.player_skill_state = Some(p.skill_state());
                ctx.player_skill = p.skills.current_skill();
            }
            None => {
                ctx.distance_to_player = None;
                ctx.player_combat_state = None;
                ctx.player_skill_state = None;
                ctx.player_skill = None;
            }
        }

    }

    fn update_engagement(&mut self, ctx: &mut AgentContext<'_>) {
        // The attack this slot was granted for has played out
        if self.holds_attack_slot && self.context.skill_state == SkillExecutionState::Uncharged {
            ctx.coordinator.release_attack_slot(self.id);
            self.holds_attack_slot = false;
        }

        let engage = self.pattern.engage_distance;
        let disengage = engage * ctx.manager.config().disengage_factor;
        let distance = self.context.distance_to_player;

        let engaged = match distance {
            Some(d) if !self.engaged => d <= engage,
            Some(d) => d <= disengage,
            None => false,
        };
        if engaged == self.engaged {
            return;
        }
        self.engaged = engaged;
        if engaged {
            tracing::info!(combatant = %self.id, distance = ?distance, "engaged");
        } else {
            tracing::info!(combatant = %self.id, distance = ?distance, "disengaged");
            if self.holds_attack_slot {
                ctx.coordinator.release_attack_slot(self.id);
                self.holds_attack_slot = false;
            }
        }
        if let Some(me) = ctx.arena.get_mut(self.id) {
            me.in_combat = engaged;
        }
    }

    fn choose_transition(
        &self,
        current: usize,
        arena: &CombatArena,
        interrupt_priority: i32,
    ) -> Option<PendingTransition> {
        let me = arena.get(self.id)?;
        let node = &self.pattern.nodes[current];
        let validator = StateValidator::for_combatant(me);

        if validator.can_be_interrupted() {
            if let Some(edge) = node.valid_transition_at_least(&self.registry, &self.context, interrupt_priority) {
                return PendingTransition::from_edge(&self.pattern, edge, TransitionCause::DefensiveInterrupt);
            }
        } else if validator.can_transition_node() {
            if let Some(edge) = node.valid_transition_at_least(&self.registry, &self.context, i32::MIN) {
                return PendingTransition::from_edge(&self.pattern, edge, TransitionCause::Normal);
            }
        }

        if !validator.can_transition_node() {
            return None;
        }
        let timeout = node.fallback_timeout?;
        if self.context.time_in_node < timeout {
            return None;
        }
        let target = self.pattern.node_index(node.fallback.as_deref()?)?;
        Some(PendingTransition {
            target,
            cause: TransitionCause::Fallback,
            reset_hit_counters: false,
            cooldown: None,
        })
    }

    fn apply_transition(&mut self, from: usize, pending: PendingTransition, ctx: &mut AgentContext<'_>) {
        let old = &self.pattern.nodes[from];
        let new_name = &self.pattern.nodes[pending.target].name;
        match pending.cause {
            TransitionCause::Fallback => tracing::warn!(
                combatant = %self.id,
                from = %old.name,
                to = %new_name,
                waited = self.context.time_in_node,
                "no valid transition, falling back"
            ),
            cause => tracing::info!(combatant = %self.id, from = %old.name, to = %new_name, ?cause, "node transition"),
        }

        if self.telegraph_shown {
            ctx.presenter.cancel_telegraph(self.id);
            self.telegraph_shown = false;
        }
        let interrupt = pending.cause == TransitionCause::DefensiveInterrupt;
        if old.cancel_skill_on_exit || interrupt {
            ctx.manager.cancel_skill(ctx.arena, self.id);
            if self.holds_attack_slot {
                ctx.coordinator.release_attack_slot(self.id);
                self.holds_attack_slot = false;
            }
        }

        if pending.reset_hit_counters {
            self.context.reset_hit_counters();
        }
        if let Some((id, duration)) = pending.cooldown {
            self.context.start_cooldown(id, duration);
        }
        self.enter(pending.target, ctx.arena);
        self.transitions_taken += 1;
        // Skill state may have changed through the cancel above
        self.refresh_context(self.context.now, ctx.arena);
    }

    /// Charge and execute the node's skill
    fn act(&mut self, current: usize, ctx: &mut AgentContext<'_>) {
        let pattern = Arc::clone(&self.pattern);
        let node = &pattern.nodes[current];
        let Some(skill) = node.skill else {
            return;
        };
        if !node.can_execute_with(&self.registry, &self.context) {
            return;
        }
        let Some(me) = ctx.arena.get(self.id) else {
            return;
        };
        let validator = StateValidator::for_combatant(me);

        if node.start_charging && self.engaged && validator.can_start_skill() {
            match ctx.manager.request_charge(ctx.arena, self.id, skill) {
                Ok(()) => {
                    if let Some(telegraph) = &node.telegraph {
                        self.telegraph_shown = present(ctx.presenter, self.id, telegraph);
                    }
                }
                Err(err) => tracing::debug!(combatant = %self.id, ?skill, %err, "charge refused"),
            }
        }

        let Some(me) = ctx.arena.get(self.id) else {
            return;
        };
        let ready = me.skills.current_skill() == Some(skill) && me.skills.is_ready(node.min_aim_accuracy);
        if !(node.execute_charged_skill && self.engaged && ready) {
            return;
        }
        if skill.is_offensive() {
            if !ctx.coordinator.request_attack_permission(self.id) {
                return;
            }
            self.holds_attack_slot = true;
        }
        match ctx.manager.execute_skill(ctx.arena, self.id, self.context.now) {
            Ok(_) => {
                if self.telegraph_shown {
                    ctx.presenter.cancel_telegraph(self.id);
                    self.telegraph_shown = false;
                }
            }
            Err(err) => tracing::debug!(combatant = %self.id, ?skill, %err, "execute refused"),
        }
    }

    fn drive_movement(&self, current: usize, arena: &mut CombatArena) {
        let node = &self.pattern.nodes[current];
        let target = arena
            .get(self.id)
            .and_then(|me| me.target)
            .and_then(|t| arena.get(t))
            .map(|t| t.position);
        let Some(me) = arena.get_mut(self.id) else {
            return;
        };
        let validator = StateValidator::for_combatant(me);
        let vector = if !validator.can_move() || !me.can_move() {
            Vec2::ZERO
        } else {
            let input = MovementInput {
                position: me.position,
                target,
                weapon_range: weapon_range(me, node),
                entry_position: self.entry_position,
            };
            node_movement(&node.movement, node.freeze_movement, &input)
        };
        me.set_movement_input(vector);
    }
}

fn weapon_range(me: &Combatant, node: &PatternNode) -> f32 {
    match node.skill {
        Some(skill) if skill.is_offensive() => me.weapon().range_for(skill),
        _ => me.weapon().primary_range(),
    }
}
