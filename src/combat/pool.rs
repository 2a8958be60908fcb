//! Reusable storage for per-tick combat allocations
//!
//! Execution records live in a slab and are addressed by [`ExecutionHandle`].
//! A handle is neither `Clone` nor `Copy`, and [`CombatPool::release`] takes it
//! by value, so a record can only be returned once: a double return does not
//! compile. Scratch lists (flat, grouped and result lists) are recycled with
//! their capacity kept.

use crate::combat::skill::SkillType;
use crate::core::types::{CombatantId, SimTime};

/// One queued skill execution
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkillExecution {
    pub owner: CombatantId,
    pub skill: SkillType,
    pub timestamp: SimTime,
    /// Hit roll for ranged shots, decided when the shot is fired
    pub ranged_hit: Option<bool>,
}

/// Take-once handle to a pooled [`SkillExecution`]
#[derive(Debug, PartialEq, Eq)]
pub struct ExecutionHandle {
    slot: u32,
    generation: u32,
}

impl ExecutionHandle {
    pub fn slot(&self) -> u32 {
        self.slot
    }
}

#[derive(Debug)]
struct Slot {
    record: Option<SkillExecution>,
    generation: u32,
}

/// Get/return counters, used to check that every get is matched by one return
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    pub execution_gets: u64,
    pub execution_returns: u64,
    pub list_gets: u64,
    pub list_returns: u64,
    pub group_gets: u64,
    pub group_returns: u64,
    pub result_gets: u64,
    pub result_returns: u64,
    /// Slab slots ever created (growth, not reuse)
    pub slots_allocated: u64,
}

impl PoolStats {
    pub fn outstanding_executions(&self) -> u64 {
        self.execution_gets - self.execution_returns
    }

    /// Every get has a matching return
    pub fn is_balanced(&self) -> bool {
        self.execution_gets == self.execution_returns
            && self.list_gets == self.list_returns
            && self.group_gets == self.group_returns
            && self.result_gets == self.result_returns
    }
}

/// Recycler for `Vec<T>` scratch buffers
#[derive(Debug)]
struct ListPool<T> {
    free: Vec<Vec<T>>,
}

impl<T> Default for ListPool<T> {
    fn default() -> Self {
        Self { free: Vec::new() }
    }
}

impl<T> ListPool<T> {
    fn get(&mut self) -> Vec<T> {
        self.free.pop().unwrap_or_default()
    }

    fn put(&mut self, mut list: Vec<T>) {
        list.clear();
        self.free.push(list);
    }
}

#[derive(Debug)]
pub struct CombatPool<R = ()> {
    slots: Vec<Slot>,
    free_slots: Vec<u32>,
    lists: ListPool<ExecutionHandle>,
    groups: ListPool<Vec<ExecutionHandle>>,
    results: ListPool<R>,
    stats: PoolStats,
}

impl<R> CombatPool<R> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_slots: Vec::new(),
            lists: ListPool::default(),
            groups: ListPool::default(),
            results: ListPool::default(),
            stats: PoolStats::default(),
        }
    }

    pub fn stats(&self) -> PoolStats {
        self.stats
    }

    /// Store an execution record, reusing a free slot when one exists
    pub fn acquire(&mut self, record: SkillExecution) -> ExecutionHandle {
        self.stats.execution_gets += 1;
        if let Some(slot) = self.free_slots.pop() {
            let entry = &mut self.slots[slot as usize];
            entry.record = Some(record);
            return ExecutionHandle {
                slot,
                generation: entry.generation,
            };
        }

        self.stats.slots_allocated += 1;
        let slot = self.slots.len() as u32;
        self.slots.push(Slot {
            record: Some(record),
            generation: 0,
        });
        ExecutionHandle { slot, generation: 0 }
    }

    /// Read the record behind a handle
    pub fn get(&self, handle: &ExecutionHandle) -> Option<&SkillExecution> {
        let entry = self.slots.get(handle.slot as usize)?;
        if entry.generation != handle.generation {
            return None;
        }
        entry.record.as_ref()
    }

    /// Return a record to the pool, consuming its handle
    pub fn release(&mut self, handle: ExecutionHandle) -> Option<SkillExecution> {
        let entry = self.slots.get_mut(handle.slot as usize)?;
        if entry.generation != handle.generation {
            tracing::warn!(slot = handle.slot, "release with stale execution handle");
            return None;
        }
        let record = entry.record.take();
        entry.generation = entry.generation.wrapping_add(1);
        self.free_slots.push(handle.slot);
        self.stats.execution_returns += 1;
        record
    }

    pub fn get_list(&mut self) -> Vec<ExecutionHandle> {
        self.stats.list_gets += 1;
        self.lists.get()
    }

    /// Return a flat list. Handles must have been moved out first.
    pub fn return_list(&mut self, list: Vec<ExecutionHandle>) {
        if !list.is_empty() {
            tracing::warn!(count = list.len(), "returned list still holds execution handles");
        }
        self.stats.list_returns += 1;
        self.lists.put(list);
    }

    pub fn get_groups(&mut self) -> Vec<Vec<ExecutionHandle>> {
        self.stats.group_gets += 1;
        self.groups.get()
    }

    /// Return a grouping list; inner lists go back to the flat-list pool
    pub fn return_groups(&mut self, mut groups: Vec<Vec<ExecutionHandle>>) {
        for inner in groups.drain(..) {
            self.return_list(inner);
        }
        self.stats.group_returns += 1;
        self.groups.put(groups);
    }

    pub fn get_results(&mut self) -> Vec<R> {
        self.stats.result_gets += 1;
        self.results.get()
    }

    pub fn return_results(&mut self, results: Vec<R>) {
        self.stats.result_returns += 1;
        self.results.put(results);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(skill: SkillType) -> SkillExecution {
        SkillExecution {
            owner: CombatantId::new(),
            skill,
            timestamp: 0.0,
            ranged_hit: None,
        }
    }

    #[test]
    fn test_acquire_release_reuses_slot() {
        let mut pool: CombatPool = CombatPool::new();
        let a = pool.acquire(record(SkillType::Attack));
        assert_eq!(pool.get(&a).unwrap().skill, SkillType::Attack);
        let slot = a.slot();
        assert_eq!(pool.release(a).unwrap().skill, SkillType::Attack);

        let b = pool.acquire(record(SkillType::Smash));
        assert_eq!(b.slot(), slot);
        assert_eq!(pool.stats().slots_allocated, 1);
        pool.release(b);
        assert!(pool.stats().is_balanced());
    }

    #[test]
    fn test_stale_handle_rejected() {
        let mut pool: CombatPool = CombatPool::new();
        let a = pool.acquire(record(SkillType::Attack));
        let forged = ExecutionHandle {
            slot: a.slot(),
            generation: 99,
        };
        assert!(pool.get(&forged).is_none());
        assert!(pool.release(forged).is_none());
        pool.release(a);
        assert_eq!(pool.stats().outstanding_executions(), 0);
    }

    #[test]
    fn test_groups_return_inner_lists() {
        let mut pool: CombatPool<u8> = CombatPool::new();
        let mut groups = pool.get_groups();
        groups.push(pool.get_list());
        groups.push(pool.get_list());
        pool.return_groups(groups);

        let results = pool.get_results();
        pool.return_results(results);

        let stats = pool.stats();
        assert_eq!(stats.list_gets, 2);
        assert_eq!(stats.list_returns, 2);
        assert!(stats.is_balanced());
    }

    #[test]
    fn test_lists_keep_capacity() {
        let mut pool: CombatPool = CombatPool::new();
        let mut list = pool.get_list();
        list.push(pool.acquire(record(SkillType::Attack)));
        let handle = list.pop().unwrap();
        pool.release(handle);
        let cap = list.capacity();
        pool.return_list(list);
        assert_eq!(pool.get_list().capacity(), cap);
    }
}
