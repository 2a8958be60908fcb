//! Combatants and the arena that owns them
//!
//! The arena stores combatants densely and hands out stable [`CombatantId`]s.
//! Iteration follows spawn order so AoE and nearest-target lookups are
//! deterministic.

use ahash::AHashMap;

use crate::combat::loadout::{WeaponController, WeaponLoadout};
use crate::combat::resources::{Health, HealthSystem, Stamina, StaminaSystem};
use crate::combat::skill::{SkillExecutionState, SkillSystem, SkillType};
use crate::combat::stats::{CharacterStats, StatModifiers};
use crate::combat::status::{StatusEffectManager, StatusEffects};
use crate::combat::weapons::WeaponData;
use crate::core::error::{CombatError, Result};
use crate::core::types::{CombatantId, Faction, Vec2};

/// Charge time never drops below this fraction of the base, however fast the weapon
const MIN_CHARGE_SCALE: f32 = 0.2;

#[derive(Debug, Clone)]
pub struct Combatant {
    pub id: CombatantId,
    pub name: String,
    pub faction: Faction,
    base_stats: CharacterStats,
    stats: CharacterStats,
    pub loadout: WeaponLoadout,
    pub health: Health,
    pub stamina: Stamina,
    pub status: StatusEffects,
    pub skills: SkillSystem,
    pub position: Vec2,
    pub target: Option<CombatantId>,
    /// Engaged in combat (set by whoever drives this combatant)
    pub in_combat: bool,
    /// Last movement input written by a controller
    pub movement_input: Vec2,
}

impl Combatant {
    pub fn new(name: &str, faction: Faction, stats: CharacterStats, weapon: WeaponData) -> Self {
        Self {
            id: CombatantId::new(),
            name: name.to_string(),
            faction,
            base_stats: stats,
            stats,
            loadout: WeaponLoadout::new(weapon),
            health: Health::new(stats.max_health()),
            stamina: Stamina::new(stats.max_stamina(), stats.stamina_efficiency()),
            status: StatusEffects::new(),
            skills: SkillSystem::new(),
            position: Vec2::ZERO,
            target: None,
            in_combat: false,
            movement_input: Vec2::ZERO,
        }
    }

    pub fn at(mut self, position: Vec2) -> Self {
        self.position = position;
        self
    }

    /// Effective stats (base plus equipment)
    pub fn stats(&self) -> &CharacterStats {
        &self.stats
    }

    pub fn base_stats(&self) -> &CharacterStats {
        &self.base_stats
    }

    /// Recompute effective stats from the base block; the base is never changed
    pub fn equip_modifiers(&mut self, modifiers: &StatModifiers) {
        self.stats = self.base_stats.with_modifiers(modifiers);
    }

    pub fn weapon(&self) -> &WeaponData {
        self.loadout.weapon()
    }

    pub fn is_alive(&self) -> bool {
        self.health.is_alive()
    }

    pub fn skill_state(&self) -> SkillExecutionState {
        self.skills.state()
    }

    pub fn distance_to(&self, other: &Combatant) -> f32 {
        self.position.distance(other.position)
    }

    pub fn is_hostile_to(&self, other: &Combatant) -> bool {
        self.faction.is_hostile_to(other.faction)
    }

    /// Charge time for `skill` with this combatant's weapon
    pub fn charge_time_for(&self, skill: SkillType) -> f32 {
        let scale = (1.0 - self.weapon().execution_speed_modifier).max(MIN_CHARGE_SCALE);
        skill.profile().charge_time * scale
    }

    /// Start charging a skill, paying its stamina cost up front
    pub fn start_charging(&mut self, skill: SkillType) -> Result<()> {
        if !self.is_alive() {
            return Err(CombatError::InvalidAction(format!("{} is dead", self.name)));
        }
        if !self.status.can_act() {
            return Err(CombatError::InvalidAction(format!(
                "{} cannot act while disabled",
                self.name
            )));
        }
        if skill.is_ranged() && !self.weapon().can_shoot() {
            return Err(CombatError::InvalidAction(format!(
                "{} cannot shoot with {}",
                self.name,
                self.weapon().name
            )));
        }
        if skill.is_offensive() && !skill.is_ranged() && !self.weapon().can_melee() {
            return Err(CombatError::InvalidAction(format!(
                "{} cannot melee with {}",
                self.name,
                self.weapon().name
            )));
        }
        if self.skills.state() != SkillExecutionState::Uncharged {
            return Err(CombatError::InvalidAction(format!(
                "{} is already using a skill",
                self.name
            )));
        }

        let cost = skill.profile().stamina_cost;
        if !self.stamina.can_afford(cost) {
            return Err(CombatError::InvalidAction(format!(
                "{} lacks stamina for {:?}",
                self.name, skill
            )));
        }

        let charge_time = self.charge_time_for(skill);
        self.skills.start_charging(skill, charge_time)?;
        self.stamina.consume(cost);
        self.status.set_resting(false);
        Ok(())
    }

    /// Advance timers for one tick
    pub fn update(&mut self, dt: f32) {
        if !self.is_alive() {
            return;
        }
        self.status.update(dt);
        self.skills.update(dt);
        self.loadout.update(dt);
        if self.skills.state() == SkillExecutionState::Uncharged {
            let resting = self.status.is_resting();
            self.stamina.regenerate(dt, resting);
        }
    }
}

/// Owner of every combatant in one simulation
#[derive(Debug, Default)]
pub struct CombatArena {
    combatants: Vec<Combatant>,
    index: AHashMap<CombatantId, usize>,
}

impl CombatArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn(&mut self, combatant: Combatant) -> CombatantId {
        let id = combatant.id;
        self.index.insert(id, self.combatants.len());
        self.combatants.push(combatant);
        id
    }

    /// Remove a combatant; order of the remaining ones is preserved
    pub fn remove(&mut self, id: CombatantId) -> Option<Combatant> {
        let idx = self.index.remove(&id)?;
        let removed = self.combatants.remove(idx);
        for (i, c) in self.combatants.iter().enumerate().skip(idx) {
            self.index.insert(c.id, i);
        }
        Some(removed)
    }

    pub fn get(&self, id: CombatantId) -> Option<&Combatant> {
        self.index.get(&id).map(|&i| &self.combatants[i])
    }

    pub fn get_mut(&mut self, id: CombatantId) -> Option<&mut Combatant> {
        let i = *self.index.get(&id)?;
        Some(&mut self.combatants[i])
    }

    /// Mutable access to two distinct combatants at once
    pub fn pair_mut(
        &mut self,
        a: CombatantId,
        b: CombatantId,
    ) -> Option<(&mut Combatant, &mut Combatant)> {
        let ia = *self.index.get(&a)?;
        let ib = *self.index.get(&b)?;
        if ia == ib {
            return None;
        }
        if ia < ib {
            let (left, right) = self.combatants.split_at_mut(ib);
            Some((&mut left[ia], &mut right[0]))
        } else {
            let (left, right) = self.combatants.split_at_mut(ia);
            Some((&mut right[0], &mut left[ib]))
        }
    }

    pub fn contains(&self, id: CombatantId) -> bool {
        self.index.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.combatants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.combatants.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Combatant> {
        self.combatants.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Combatant> {
        self.combatants.iter_mut()
    }

    pub fn ids(&self) -> Vec<CombatantId> {
        self.combatants.iter().map(|c| c.id).collect()
    }

    /// Closest living hostile to `id`, with its distance
    pub fn nearest_hostile(&self, id: CombatantId) -> Option<(CombatantId, f32)> {
        let me = self.get(id)?;
        self.combatants
            .iter()
            .filter(|c| c.id != id && c.is_alive() && me.is_hostile_to(c))
            .map(|c| (c.id, me.distance_to(c)))
            .min_by(|a, b| a.1.total_cmp(&b.1))
    }

    /// Living hostiles of `id` within `radius` of `center`, in spawn order
    pub fn hostiles_within(&self, id: CombatantId, center: Vec2, radius: f32) -> Vec<CombatantId> {
        let Some(me) = self.get(id) else {
            return Vec::new();
        };
        self.combatants
            .iter()
            .filter(|c| c.id != id && c.is_alive() && me.is_hostile_to(c))
            .filter(|c| c.position.distance(center) <= radius)
            .map(|c| c.id)
            .collect()
    }

    pub fn update(&mut self, dt: f32) {
        for combatant in &mut self.combatants {
            combatant.update(dt);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fighter(name: &str, faction: Faction, x: f32) -> Combatant {
        Combatant::new(name, faction, CharacterStats::default(), WeaponData::sword())
            .at(Vec2::new(x, 0.0))
    }

    #[test]
    fn test_spawn_and_lookup() {
        let mut arena = CombatArena::new();
        let a = arena.spawn(fighter("a", Faction::PLAYER, 0.0));
        let b = arena.spawn(fighter("b", Faction::ENEMY, 3.0));
        assert_eq!(arena.len(), 2);
        assert_eq!(arena.get(a).unwrap().name, "a");
        assert_eq!(arena.nearest_hostile(a), Some((b, 3.0)));
    }

    #[test]
    fn test_pair_mut_both_orders() {
        let mut arena = CombatArena::new();
        let a = arena.spawn(fighter("a", Faction::PLAYER, 0.0));
        let b = arena.spawn(fighter("b", Faction::ENEMY, 3.0));
        {
            let (x, y) = arena.pair_mut(b, a).unwrap();
            assert_eq!(x.name, "b");
            assert_eq!(y.name, "a");
        }
        assert!(arena.pair_mut(a, a).is_none());
    }

    #[test]
    fn test_remove_keeps_index_consistent() {
        let mut arena = CombatArena::new();
        let a = arena.spawn(fighter("a", Faction::PLAYER, 0.0));
        let b = arena.spawn(fighter("b", Faction::ENEMY, 1.0));
        let c = arena.spawn(fighter("c", Faction::ENEMY, 2.0));
        arena.remove(b);
        assert_eq!(arena.get(c).unwrap().name, "c");
        assert_eq!(arena.nearest_hostile(a).map(|(id, _)| id), Some(c));
    }

    #[test]
    fn test_hostiles_within_skips_allies_and_dead() {
        let mut arena = CombatArena::new();
        let me = arena.spawn(fighter("me", Faction::PLAYER, 0.0));
        arena.spawn(fighter("ally", Faction::PLAYER, 1.0));
        let near = arena.spawn(fighter("near", Faction::ENEMY, 2.0));
        let dead = arena.spawn(fighter("dead", Faction::ENEMY, 1.0));
        arena.spawn(fighter("far", Faction::ENEMY, 10.0));
        arena.get_mut(dead).unwrap().health.take_damage(1000.0, None);

        let hits = arena.hostiles_within(me, Vec2::ZERO, 3.0);
        assert_eq!(hits, vec![near]);
    }

    #[test]
    fn test_start_charging_spends_stamina() {
        let mut c = fighter("a", Faction::PLAYER, 0.0);
        let before = c.stamina.current_stamina();
        c.start_charging(SkillType::Smash).unwrap();
        assert!(c.stamina.current_stamina() < before);
        assert_eq!(c.skill_state(), SkillExecutionState::Charging);
    }

    #[test]
    fn test_cannot_charge_when_stunned_or_wrong_weapon() {
        let mut c = fighter("a", Faction::PLAYER, 0.0);
        c.status.apply_stun(1.0);
        assert!(c.start_charging(SkillType::Attack).is_err());

        let mut archer = Combatant::new(
            "archer",
            Faction::ENEMY,
            CharacterStats::default(),
            WeaponData::bow(),
        );
        assert!(archer.start_charging(SkillType::Smash).is_err());
        assert!(archer.start_charging(SkillType::RangedAttack).is_ok());
    }

    #[test]
    fn test_equipment_never_mutates_base() {
        let mut c = fighter("a", Faction::PLAYER, 0.0);
        c.equip_modifiers(&StatModifiers {
            strength: 5.0,
            ..Default::default()
        });
        assert_eq!(c.stats().strength, 15.0);
        assert_eq!(c.base_stats().strength, 10.0);
    }
}
