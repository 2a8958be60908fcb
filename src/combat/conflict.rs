//! Grouping of simultaneous offensive executions and speed arbitration
//!
//! Grouping is greedy and single-pass: after sorting by timestamp, an
//! execution joins the current group only if it is within the window of the
//! group's *first* member. An execution inside the window of a later member
//! but outside the first member's window starts a new group.

use ordered_float::OrderedFloat;

use crate::combat::combatant::CombatArena;
use crate::combat::pool::{CombatPool, ExecutionHandle};
use crate::combat::speed::calculate_speed;
use crate::core::config::CombatConfig;

pub const LOST_SPEED_RESOLUTION: &str = "Lost speed resolution.";
pub const OWNER_MISSING: &str = "Owner no longer present.";

/// Fate of one execution after speed arbitration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Alone in its group, or the unique fastest
    Execute,
    /// Tied for fastest; executes alongside the other tied members
    ExecuteTied,
    Cancel(&'static str),
}

impl Verdict {
    pub fn executes(&self) -> bool {
        matches!(self, Verdict::Execute | Verdict::ExecuteTied)
    }
}

#[derive(Debug)]
pub struct ResolvedExecution {
    pub handle: ExecutionHandle,
    pub verdict: Verdict,
    pub speed: f32,
}

/// Sort `skills` by timestamp and split them into simultaneity groups
///
/// Takes ownership of the handles; every handle ends up in exactly one group.
pub fn group_simultaneous_skills(
    pool: &mut CombatPool<ResolvedExecution>,
    mut skills: Vec<ExecutionHandle>,
    window: f64,
) -> Vec<Vec<ExecutionHandle>> {
    let mut groups = pool.get_groups();

    // Stable: equal timestamps keep insertion order
    skills.sort_by(|a, b| {
        let ta = pool.get(a).map(|e| e.timestamp).unwrap_or(f64::MAX);
        let tb = pool.get(b).map(|e| e.timestamp).unwrap_or(f64::MAX);
        ta.total_cmp(&tb)
    });

    let mut group_start: Option<f64> = None;
    for handle in skills.drain(..) {
        let timestamp = pool.get(&handle).map(|e| e.timestamp).unwrap_or(f64::MAX);
        let joins = matches!(group_start, Some(start) if timestamp - start <= window);
        if !joins {
            let fresh = pool.get_list();
            groups.push(fresh);
            group_start = Some(timestamp);
        }
        if let Some(current) = groups.last_mut() {
            current.push(handle);
        }
    }

    pool.return_list(skills);
    groups
}

/// Decide which member(s) of each group execute
///
/// Consumes the groups (returning their lists to the pool) and yields one
/// [`ResolvedExecution`] per handle, in group order.
pub fn resolve_speed_conflicts(
    pool: &mut CombatPool<ResolvedExecution>,
    mut groups: Vec<Vec<ExecutionHandle>>,
    arena: &CombatArena,
    config: &CombatConfig,
) -> Vec<ResolvedExecution> {
    let mut results = pool.get_results();

    for group in groups.iter_mut() {
        if group.len() == 1 {
            if let Some(handle) = group.pop() {
                let speed = execution_speed(pool, &handle, arena, config).unwrap_or(0.0);
                results.push(ResolvedExecution {
                    handle,
                    verdict: Verdict::Execute,
                    speed,
                });
            }
            continue;
        }

        let speeds: Vec<Option<f32>> = group
            .iter()
            .map(|h| execution_speed(pool, h, arena, config))
            .collect();
        let max = speeds
            .iter()
            .flatten()
            .map(|s| OrderedFloat(*s))
            .max()
            .map(|s| s.0);
        let tied = speeds
            .iter()
            .flatten()
            .filter(|s| max.is_some_and(|m| (m - **s).abs() < config.speed_epsilon))
            .count();

        for (handle, speed) in group.drain(..).zip(speeds) {
            let verdict = match (speed, max) {
                (None, _) => Verdict::Cancel(OWNER_MISSING),
                (Some(s), Some(m)) if (m - s).abs() < config.speed_epsilon => {
                    if tied > 1 {
                        Verdict::ExecuteTied
                    } else {
                        Verdict::Execute
                    }
                }
                _ => Verdict::Cancel(LOST_SPEED_RESOLUTION),
            };
            tracing::debug!(?verdict, speed = ?speed, "speed resolution");
            results.push(ResolvedExecution {
                handle,
                verdict,
                speed: speed.unwrap_or(0.0),
            });
        }
    }

    pool.return_groups(groups);
    results
}

fn execution_speed(
    pool: &CombatPool<ResolvedExecution>,
    handle: &ExecutionHandle,
    arena: &CombatArena,
    config: &CombatConfig,
) -> Option<f32> {
    let execution = pool.get(handle)?;
    let owner = arena.get(execution.owner)?;
    Some(calculate_speed(
        execution.skill,
        owner.stats(),
        owner.weapon(),
        config,
    ))
}
