//! Combat interaction manager
//!
//! Owns the per-tick queue of offensive executions and the list of defensive
//! skills held in Waiting. Agents charge and execute through it; once per tick
//! [`CombatInteractionManager::process_tick`] resolves everything queued.
//!
//! Pooled execution handles are moved, never copied: an offensive handle leaves
//! the queue into exactly one of execute, cancel or abandon, and a defensive
//! handle is released only by [`CombatInteractionManager::complete_defensive_skill`]
//! or by the timeout reaper.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::combat::combatant::CombatArena;
use crate::combat::conflict::{group_simultaneous_skills, resolve_speed_conflicts, ResolvedExecution, Verdict};
use crate::combat::events::{CombatEvent, CombatEventKind, CombatEventLog, InteractionKind};
use crate::combat::interaction::{
    determine_interaction, displaced, process_interaction_effects, resisted_stun, roll_critical,
    skill_damage, InteractionResult,
};
use crate::combat::loadout::WeaponController;
use crate::combat::pool::{CombatPool, ExecutionHandle, PoolStats, SkillExecution};
use crate::combat::resources::HealthSystem;
use crate::combat::skill::{SkillExecutionState, SkillType};
use crate::combat::speed::can_interact;
use crate::combat::status::StatusEffectManager;
use crate::core::config::CombatConfig;
use crate::core::error::{CombatError, Result};
use crate::core::types::{CombatantId, SimTime};

/// A defensive skill held in Waiting
#[derive(Debug)]
struct WaitingDefense {
    owner: CombatantId,
    handle: ExecutionHandle,
    started_at: SimTime,
}

#[derive(Debug)]
pub struct CombatInteractionManager {
    config: CombatConfig,
    pool: CombatPool<ResolvedExecution>,
    pending_offensive: Vec<ExecutionHandle>,
    waiting_defensive: Vec<WaitingDefense>,
    rng: ChaCha8Rng,
    events: CombatEventLog,
    /// Latest time seen from a caller
    clock: SimTime,
}

impl CombatInteractionManager {
    pub fn new(config: CombatConfig, seed: u64) -> Self {
        Self {
            config,
            pool: CombatPool::new(),
            pending_offensive: Vec::new(),
            waiting_defensive: Vec::new(),
            rng: ChaCha8Rng::seed_from_u64(seed),
            events: CombatEventLog::new(),
            clock: 0.0,
        }
    }

    pub fn config(&self) -> &CombatConfig {
        &self.config
    }

    pub fn pool_stats(&self) -> PoolStats {
        self.pool.stats()
    }

    pub fn pending_count(&self) -> usize {
        self.pending_offensive.len()
    }

    pub fn waiting_count(&self) -> usize {
        self.waiting_defensive.len()
    }

    pub fn is_waiting(&self, owner: CombatantId) -> bool {
        self.waiting_defensive.iter().any(|w| w.owner == owner)
    }

    pub fn events(&self) -> &CombatEventLog {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<CombatEvent> {
        self.events.drain()
    }

    /// Start charging (or aiming) `skill` for `id`
    pub fn request_charge(&mut self, arena: &mut CombatArena, id: CombatantId, skill: SkillType) -> Result<()> {
        let combatant = arena.get_mut(id).ok_or(CombatError::CombatantNotFound(id))?;
        combatant.start_charging(skill)?;
        tracing::debug!(combatant = %id, ?skill, "charging");
        Ok(())
    }

    /// Commit a ready skill. Offensive skills are queued for this tick's
    /// resolution; defensive skills start waiting for an incoming attack.
    ///
    /// Ranged shots roll their hit against the current aim accuracy here.
    pub fn execute_skill(&mut self, arena: &mut CombatArena, id: CombatantId, now: SimTime) -> Result<SkillType> {
        let combatant = arena.get(id).ok_or(CombatError::CombatantNotFound(id))?;
        let accuracy = combatant.skills.aim_accuracy();
        let roll: f32 = self.rng.gen();
        self.execute_skill_with_hit(arena, id, now, roll < accuracy)
    }

    /// [`Self::execute_skill`] with a predetermined ranged hit roll.
    /// `hit` is ignored for melee skills.
    pub fn execute_skill_with_hit(
        &mut self,
        arena: &mut CombatArena,
        id: CombatantId,
        now: SimTime,
        hit: bool,
    ) -> Result<SkillType> {
        let combatant = arena.get_mut(id).ok_or(CombatError::CombatantNotFound(id))?;
        if !combatant.is_alive() {
            return Err(CombatError::InvalidAction(format!("{} is dead", combatant.name)));
        }
        let skill = combatant.skills.begin_execution()?;
        self.clock = self.clock.max(now);
        let record = SkillExecution {
            owner: id,
            skill,
            timestamp: now,
            ranged_hit: skill.is_ranged().then_some(hit),
        };

        if skill.is_defensive() {
            // A skill cancelled behind our back may have left its entry behind
            self.release_waiting(id);
            let handle = self.pool.acquire(record);
            self.waiting_defensive.push(WaitingDefense {
                owner: id,
                handle,
                started_at: now,
            });
            tracing::debug!(combatant = %id, ?skill, "defensive skill waiting");
        } else {
            let handle = self.pool.acquire(record);
            self.pending_offensive.push(handle);
            tracing::debug!(combatant = %id, ?skill, ranged_hit = ?record.ranged_hit, "offensive skill queued");
        }
        Ok(skill)
    }

    /// Waiting → Recovery for `owner`'s defensive skill, releasing its pooled record.
    ///
    /// Safe to call more than once: later calls find nothing waiting and
    /// return false.
    pub fn complete_defensive_skill(&mut self, arena: &mut CombatArena, owner: CombatantId, succeeded: bool) -> bool {
        self.complete_defense_at(arena, owner, succeeded, self.clock)
    }

    /// Drop whatever `id` is doing, releasing anything it has queued
    pub fn cancel_skill(&mut self, arena: &mut CombatArena, id: CombatantId) -> Option<SkillExecutionState> {
        self.release_waiting(id);
        self.release_pending(id);
        let combatant = arena.get_mut(id)?;
        let previous = combatant.skills.cancel();
        if previous != SkillExecutionState::Uncharged {
            tracing::debug!(combatant = %id, ?previous, "skill cancelled");
        }
        Some(previous)
    }

    /// Resolve everything queued for this tick
    pub fn process_tick(&mut self, arena: &mut CombatArena, now: SimTime) {
        self.clock = self.clock.max(now);
        self.reap_defensive_waits(arena, now);

        let mut pending = std::mem::take(&mut self.pending_offensive);
        let mut survivors = self.pool.get_list();
        for handle in pending.drain(..) {
            let stale = self
                .pool
                .get(&handle)
                .map_or(true, |e| now - e.timestamp > self.config.simultaneity_window);
            if stale {
                self.abandon(arena, handle, now);
            } else {
                survivors.push(handle);
            }
        }
        self.pending_offensive = pending;

        match survivors.len() {
            0 => self.pool.return_list(survivors),
            1 => {
                if let Some(handle) = survivors.pop() {
                    self.execute_offensive(arena, handle, now);
                }
                self.pool.return_list(survivors);
            }
            _ => {
                let window = self.config.simultaneity_window;
                let groups = group_simultaneous_skills(&mut self.pool, survivors, window);
                let mut resolved = resolve_speed_conflicts(&mut self.pool, groups, arena, &self.config);
                for ResolvedExecution { handle, verdict, .. } in resolved.drain(..) {
                    match verdict {
                        Verdict::Execute | Verdict::ExecuteTied => self.execute_offensive(arena, handle, now),
                        Verdict::Cancel(reason) => self.cancel_execution(arena, handle, reason, now),
                    }
                }
                self.pool.return_results(resolved);
            }
        }
    }

    /// Force-complete defensive skills that waited past the timeout, and drop
    /// entries whose owner is gone or no longer waiting
    fn reap_defensive_waits(&mut self, arena: &mut CombatArena, now: SimTime) {
        let timeout = self.config.defensive_timeout;
        let mut i = self.waiting_defensive.len();
        while i > 0 {
            i -= 1;
            let entry = &self.waiting_defensive[i];
            let owner = entry.owner;
            let expired = now - entry.started_at > timeout;
            let still_waiting = arena
                .get(owner)
                .is_some_and(|c| c.is_alive() && c.skill_state() == SkillExecutionState::Waiting);

            if !still_waiting {
                let entry = self.waiting_defensive.swap_remove(i);
                tracing::warn!(combatant = %owner, "dropping stale defensive wait");
                self.pool.release(entry.handle);
            } else if expired {
                let entry = self.waiting_defensive.swap_remove(i);
                let skill = self.pool.release(entry.handle).map(|e| e.skill);
                if let Some(combatant) = arena.get_mut(owner) {
                    combatant.skills.complete_defensive(false);
                }
                tracing::warn!(combatant = %owner, waited = now - entry.started_at, "defensive wait expired");
                if let Some(skill) = skill {
                    self.events.push(now, CombatEventKind::DefenseExpired { owner, skill });
                }
            }
        }
    }

    fn complete_defense_at(
        &mut self,
        arena: &mut CombatArena,
        owner: CombatantId,
        succeeded: bool,
        now: SimTime,
    ) -> bool {
        let skill = self
            .waiting_defensive
            .iter()
            .position(|w| w.owner == owner)
            .map(|i| self.waiting_defensive.swap_remove(i))
            .and_then(|entry| self.pool.release(entry.handle))
            .map(|e| e.skill);

        let completed = arena
            .get_mut(owner)
            .is_some_and(|c| c.skills.complete_defensive(succeeded));
        if completed {
            if let Some(skill) = skill {
                self.events.push(
                    now,
                    CombatEventKind::DefenseCompleted {
                        owner,
                        skill,
                        succeeded,
                    },
                );
            }
        }
        completed
    }

    fn release_waiting(&mut self, owner: CombatantId) {
        if let Some(i) = self.waiting_defensive.iter().position(|w| w.owner == owner) {
            let entry = self.waiting_defensive.swap_remove(i);
            self.pool.release(entry.handle);
        }
    }

    fn release_pending(&mut self, owner: CombatantId) {
        let mut i = self.pending_offensive.len();
        while i > 0 {
            i -= 1;
            let owned = self
                .pool
                .get(&self.pending_offensive[i])
                .is_some_and(|e| e.owner == owner);
            if owned {
                let handle = self.pending_offensive.remove(i);
                self.pool.release(handle);
            }
        }
    }

    fn abandon(&mut self, arena: &mut CombatArena, handle: ExecutionHandle, now: SimTime) {
        let Some(record) = self.pool.release(handle) else {
            return;
        };
        if let Some(combatant) = arena.get_mut(record.owner) {
            if combatant.skill_state() == SkillExecutionState::Startup {
                combatant.skills.cancel();
            }
        }
        tracing::debug!(combatant = %record.owner, skill = ?record.skill, "execution abandoned");
        self.events.push(
            now,
            CombatEventKind::Abandoned {
                owner: record.owner,
                skill: record.skill,
            },
        );
    }

    fn cancel_execution(&mut self, arena: &mut CombatArena, handle: ExecutionHandle, reason: &'static str, now: SimTime) {
        let Some(record) = self.pool.release(handle) else {
            return;
        };
        if let Some(combatant) = arena.get_mut(record.owner) {
            combatant.skills.cancel();
        }
        tracing::debug!(combatant = %record.owner, skill = ?record.skill, reason, "execution cancelled");
        self.events.push(
            now,
            CombatEventKind::Cancelled {
                owner: record.owner,
                skill: record.skill,
                reason,
            },
        );
    }

    /// Resolve one winning offensive execution against its target(s)
    fn execute_offensive(&mut self, arena: &mut CombatArena, handle: ExecutionHandle, now: SimTime) {
        let Some(record) = self.pool.release(handle) else {
            return;
        };
        let attacker_id = record.owner;
        let skill = record.skill;

        let Some(attacker) = arena.get(attacker_id) else {
            tracing::warn!(combatant = %attacker_id, "attacker vanished before resolution");
            return;
        };
        if !attacker.is_alive() {
            return;
        }

        let targets: Vec<CombatantId> = if skill == SkillType::Windmill {
            arena.hostiles_within(attacker_id, attacker.position, self.config.windmill_radius)
        } else {
            attacker
                .target
                .filter(|&t| {
                    arena.get(t).is_some_and(|target| {
                        target.is_alive()
                            && attacker.is_hostile_to(target)
                            && attacker.loadout.is_in_range(attacker.distance_to(target), skill)
                    })
                })
                .into_iter()
                .collect()
        };

        let mut succeeded = false;
        for target in targets {
            let landed = match self.defensive_response(arena, attacker_id, target, skill) {
                Some(defensive) => self.resolve_interaction(arena, &record, target, defensive, now),
                None => self.direct_hit(arena, &record, target, now),
            };
            succeeded |= landed;
            self.observe_death(arena, target, now);
        }

        if let Some(attacker) = arena.get_mut(attacker_id) {
            if succeeded && skill == SkillType::Attack {
                attacker.loadout.register_hit();
            }
            attacker.skills.mark_active(succeeded);
        }
        self.observe_death(arena, attacker_id, now);
    }

    /// The defensive skill `target` is holding against this attack, if it can respond
    fn defensive_response(
        &self,
        arena: &CombatArena,
        attacker_id: CombatantId,
        target: CombatantId,
        offensive: SkillType,
    ) -> Option<SkillType> {
        if !self.is_waiting(target) {
            return None;
        }
        let attacker = arena.get(attacker_id)?;
        let defender = arena.get(target)?;
        // A staggered or spent defender cannot respond
        if defender.skill_state() != SkillExecutionState::Waiting
            || !defender.status.can_act()
            || defender.skills.defense_used()
        {
            return None;
        }
        let defensive = defender.skills.current_skill()?;
        if !can_interact(offensive, defensive)
            || determine_interaction(offensive, defensive) == InteractionResult::NoInteraction
        {
            return None;
        }
        // Blocking an arrow does not need the defender's weapon to reach the archer
        if !offensive.is_ranged() {
            let distance = attacker.distance_to(defender);
            if !defender.loadout.is_in_range(distance, defensive) {
                return None;
            }
        }
        Some(defensive)
    }

    fn resolve_interaction(
        &mut self,
        arena: &mut CombatArena,
        record: &SkillExecution,
        defender_id: CombatantId,
        defensive: SkillType,
        now: SimTime,
    ) -> bool {
        let result = determine_interaction(record.skill, defensive);
        let Some((attacker, defender)) = arena.pair_mut(record.owner, defender_id) else {
            return false;
        };
        let outcome = process_interaction_effects(
            result,
            record.skill,
            record.ranged_hit,
            attacker,
            defender,
            &self.config,
            &mut self.rng,
        );
        tracing::debug!(
            attacker = %record.owner,
            defender = %defender_id,
            offensive = ?record.skill,
            ?defensive,
            ?result,
            "interaction resolved"
        );

        if let Some(kind) = interaction_kind(result) {
            self.events.push(
                now,
                CombatEventKind::Interaction {
                    attacker: record.owner,
                    defender: defender_id,
                    offensive: record.skill,
                    defensive,
                    kind,
                    damage_to_attacker: outcome.damage_to_attacker,
                    damage_to_defender: outcome.damage_to_defender,
                },
            );
        }

        if outcome.defender_consumed {
            let defended = !outcome.attacker_succeeded;
            self.complete_defense_at(arena, defender_id, defended, now);
        }
        outcome.attacker_succeeded
    }

    /// Damage, stagger and skill-specific effects of an undefended hit
    fn direct_hit(&mut self, arena: &mut CombatArena, record: &SkillExecution, target_id: CombatantId, now: SimTime) -> bool {
        if record.ranged_hit == Some(false) {
            self.events.push(
                now,
                CombatEventKind::Miss {
                    attacker: record.owner,
                    target: target_id,
                },
            );
            return false;
        }
        let config = &self.config;
        let Some((attacker, target)) = arena.pair_mut(record.owner, target_id) else {
            return false;
        };
        if !target.is_alive() {
            return false;
        }

        let skill = record.skill;
        let base = skill_damage(skill, attacker.stats(), attacker.weapon(), target.stats());
        let critical = roll_critical(attacker.stats(), config, &mut self.rng);
        let damage = if critical { base * config.critical_multiplier } else { base };
        let applied = target.health.take_damage(damage, Some(attacker.id));

        let stagger = resisted_stun(config.hit_stagger_duration, target.stats().will, config);
        target.status.apply_stun(stagger);

        let knocked_down = match skill {
            SkillType::Smash | SkillType::Windmill => {
                target.position = displaced(target.position, attacker.position, config.knockdown_distance);
                true
            }
            _ => target
                .status
                .add_knockdown_buildup(attacker.weapon().knockdown_rate, config.knockdown_threshold),
        };
        if knocked_down {
            target.status.apply_knockdown(config.knockdown_duration);
        }
        let interrupted = !target.status.can_act();

        tracing::debug!(
            attacker = %record.owner,
            target = %target_id,
            ?skill,
            damage = applied,
            critical,
            knocked_down,
            "direct hit"
        );
        self.events.push(
            now,
            CombatEventKind::Hit {
                attacker: record.owner,
                target: target_id,
                skill,
                damage: applied,
                critical,
                knocked_down,
            },
        );
        if interrupted && self.is_waiting(target_id) {
            self.complete_defense_at(arena, target_id, false, now);
        }
        true
    }

    /// Clean up after a combatant that just died
    fn observe_death(&mut self, arena: &mut CombatArena, id: CombatantId, now: SimTime) {
        let Some(combatant) = arena.get_mut(id) else {
            return;
        };
        if !combatant.health.take_death_notification() {
            return;
        }
        let killer = combatant.health.last_damage_source();
        combatant.skills.cancel();
        tracing::info!(combatant = %id, name = %combatant.name, "combatant died");
        self.release_waiting(id);
        self.release_pending(id);
        self.events.push(now, CombatEventKind::Died { combatant: id, killer });
    }
}

fn interaction_kind(result: InteractionResult) -> Option<InteractionKind> {
    Some(match result {
        InteractionResult::NoInteraction => return None,
        InteractionResult::AttackerStunned => InteractionKind::AttackerStunned,
        InteractionResult::CounterReflection => InteractionKind::CounterReflection,
        InteractionResult::CounterIneffective => InteractionKind::CounterIneffective,
        InteractionResult::DefenderKnockedDown => InteractionKind::DefenderKnockedDown,
        InteractionResult::DefenderBlocks => InteractionKind::DefenderBlocks,
        InteractionResult::WindmillBreaksCounter => InteractionKind::WindmillBreaksCounter,
    })
}
