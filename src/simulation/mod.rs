//! Simulation context - owns the arena, the resolver and every agent
//!
//! Each tick runs in a fixed order:
//! agents decide -> manager resolves -> events reach agents -> bodies move -> timers advance
//!
//! Everything random is seeded from the simulation seed, so a run is fully
//! reproducible.

use std::sync::Arc;

use serde::Serialize;

use crate::combat::combatant::{CombatArena, Combatant};
use crate::combat::events::{CombatEvent, CombatEventKind, CombatEventLog};
use crate::combat::manager::CombatInteractionManager;
use crate::combat::resources::HealthSystem;
use crate::combat::skill::{SkillExecutionState, SkillType};
use crate::combat::state::StateValidator;
use crate::core::config::CombatConfig;
use crate::core::error::Result;
use crate::core::types::{CombatantId, SimTime, Vec2};
use crate::pattern::coordinator::SlotCoordinator;
use crate::pattern::definition::PatternDefinition;
use crate::pattern::executor::{AgentContext, PatternExecutor};
use crate::pattern::movement::MovementController;
use crate::pattern::telegraph::RecordingPresenter;

/// Mixes the agent index into the simulation seed
const AGENT_SEED_STRIDE: u64 = 0x9E37_79B9_7F4A_7C15;

pub struct Simulation {
    pub arena: CombatArena,
    pub manager: CombatInteractionManager,
    executors: Vec<PatternExecutor>,
    coordinator: SlotCoordinator,
    presenter: RecordingPresenter,
    log: CombatEventLog,
    time: SimTime,
    tick_count: u64,
    seed: u64,
}

impl Simulation {
    pub fn new(config: CombatConfig, seed: u64, max_attackers: usize) -> Self {
        Self {
            arena: CombatArena::new(),
            manager: CombatInteractionManager::new(config, seed),
            executors: Vec::new(),
            coordinator: SlotCoordinator::new(max_attackers),
            presenter: RecordingPresenter::new(),
            log: CombatEventLog::new(),
            time: 0.0,
            tick_count: 0,
            seed,
        }
    }

    pub fn time(&self) -> SimTime {
        self.time
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn executors(&self) -> &[PatternExecutor] {
        &self.executors
    }

    pub fn executor(&self, id: CombatantId) -> Option<&PatternExecutor> {
        self.executors.iter().find(|e| e.id() == id)
    }

    pub fn coordinator(&self) -> &SlotCoordinator {
        &self.coordinator
    }

    pub fn presenter(&self) -> &RecordingPresenter {
        &self.presenter
    }

    /// Every event resolved so far
    pub fn log(&self) -> &CombatEventLog {
        &self.log
    }

    /// Add a combatant nobody drives (usually the player)
    pub fn spawn(&mut self, combatant: Combatant) -> CombatantId {
        self.arena.spawn(combatant)
    }

    /// Add a combatant driven by `pattern`
    pub fn spawn_agent(&mut self, combatant: Combatant, pattern: Arc<PatternDefinition>) -> CombatantId {
        let index = self.executors.len() as u64 + 1;
        let agent_seed = self.seed ^ index.wrapping_mul(AGENT_SEED_STRIDE);
        let id = self.arena.spawn(combatant);
        self.executors.push(PatternExecutor::new(id, pattern, agent_seed));
        tracing::debug!(combatant = %id, agent_seed, "agent spawned");
        id
    }

    pub fn charge(&mut self, id: CombatantId, skill: SkillType) -> Result<()> {
        self.manager.request_charge(&mut self.arena, id, skill)
    }

    pub fn execute(&mut self, id: CombatantId) -> Result<SkillType> {
        self.manager.execute_skill(&mut self.arena, id, self.time)
    }

    pub fn cancel(&mut self, id: CombatantId) -> Option<SkillExecutionState> {
        self.manager.cancel_skill(&mut self.arena, id)
    }

    /// Steer a combatant that has no executor
    pub fn set_movement(&mut self, id: CombatantId, input: Vec2) {
        if let Some(combatant) = self.arena.get_mut(id) {
            combatant.set_movement_input(input);
        }
    }

    /// At most one faction still has living members
    pub fn is_finished(&self) -> bool {
        let mut alive = self.arena.iter().filter(|c| c.is_alive());
        let Some(first) = alive.next() else {
            return true;
        };
        alive.all(|c| c.faction == first.faction)
    }

    pub fn tick(&mut self, dt: f32) {
        let now = self.time;

        let mut ctx = AgentContext {
            arena: &mut self.arena,
            manager: &mut self.manager,
            coordinator: &mut self.coordinator,
            presenter: &mut self.presenter,
        };
        for executor in &mut self.executors {
            executor.update(dt, now, &mut ctx);
        }

        self.acquire_targets();
        self.manager.process_tick(&mut self.arena, now);
        let events = self.manager.drain_events();
        self.dispatch(events);

        self.integrate_movement(dt);
        self.arena.update(dt);

        self.tick_count += 1;
        self.time += dt as f64;
    }

    /// Combatants without an agent lock on to the nearest hostile once
    /// their current target is gone
    fn acquire_targets(&mut self) {
        let undriven: Vec<CombatantId> = self
            .arena
            .iter()
            .filter(|c| c.is_alive() && self.executor(c.id).is_none())
            .filter(|c| !c.target.and_then(|t| self.arena.get(t)).is_some_and(|t| t.is_alive()))
            .map(|c| c.id)
            .collect();
        for id in undriven {
            let nearest = self.arena.nearest_hostile(id).map(|(target, _)| target);
            if let Some(combatant) = self.arena.get_mut(id) {
                combatant.target = nearest;
            }
        }
    }

    fn dispatch(&mut self, events: Vec<CombatEvent>) {
        for event in events {
            for executor in &mut self.executors {
                executor.observe(&event);
            }
            self.log.events.push(event);
        }
    }

    fn integrate_movement(&mut self, dt: f32) {
        for combatant in self.arena.iter_mut() {
            let free = StateValidator::for_combatant(combatant).can_move();
            if !free || !MovementController::can_move(combatant) {
                continue;
            }
            let speed = combatant.stats().movement_speed();
            combatant.position += combatant.movement_input * speed * dt;
        }
    }

    pub fn summary(&self) -> SimulationSummary {
        let mut summary = SimulationSummary {
            seed: self.seed,
            ticks: self.tick_count,
            time: self.time,
            finished: self.is_finished(),
            hits: 0,
            misses: 0,
            interactions: 0,
            deaths: 0,
            telegraphs: self.presenter.shown_count(),
            combatants: Vec::with_capacity(self.arena.len()),
        };
        for event in self.log.iter() {
            match event.kind {
                CombatEventKind::Hit { .. } => summary.hits += 1,
                CombatEventKind::Miss { .. } => summary.misses += 1,
                CombatEventKind::Interaction { .. } => summary.interactions += 1,
                CombatEventKind::Died { .. } => summary.deaths += 1,
                _ => {}
            }
        }
        for combatant in self.arena.iter() {
            let executor = self.executor(combatant.id);
            summary.combatants.push(CombatantSummary {
                name: combatant.name.clone(),
                faction: combatant.faction.0,
                health: combatant.health.current_health(),
                max_health: combatant.health.max_health(),
                alive: combatant.is_alive(),
                node: executor.and_then(|e| e.current_node_name()).map(str::to_string),
                transitions: executor.map_or(0, |e| e.transitions_taken()),
            });
        }
        summary
    }
}

/// End-of-run report
#[derive(Debug, Clone, Serialize)]
pub struct SimulationSummary {
    pub seed: u64,
    pub ticks: u64,
    pub time: SimTime,
    pub finished: bool,
    pub hits: usize,
    pub misses: usize,
    pub interactions: usize,
    pub deaths: usize,
    pub telegraphs: usize,
    pub combatants: Vec<CombatantSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CombatantSummary {
    pub name: String,
    pub faction: u8,
    pub health: f32,
    pub max_health: f32,
    pub alive: bool,
    pub node: Option<String>,
    pub transitions: u32,
}
