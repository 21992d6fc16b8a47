//! Deferred work keyed by simulation tick.
//!
//! Anything that happens "a little later" (a hat landing, a staggered spawn, the end of
//! a death sequence) is queued here instead of on a wall-clock timer. Tasks remember the
//! round they were scheduled in, so a reset can strand them without having to find and
//! cancel each one.

use std::collections::BTreeMap;

use bevy_ecs::entity::Entity;
use bevy_ecs::resource::Resource;
use glam::IVec2;
use tracing::trace;

use crate::constants::ms_to_ticks;

/// Deferred actions the orchestrator knows how to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    /// The thrown hat comes down.
    LandHat,
    /// Bring one pooled downvote into play at `cell`.
    SpawnDownvote { downvote: Entity, cell: IVec2 },
    /// The level-complete pause is over.
    AdvanceLevel,
    /// The death sequence is over: respawn or game over.
    ResolveDeath,
    /// Start a fresh game after a game over.
    Restart,
}

/// Counts resets. Tasks scheduled under an older epoch are dropped unrun.
#[derive(Resource, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RoundEpoch(pub u32);

impl RoundEpoch {
    pub fn bump(&mut self) {
        self.0 = self.0.wrapping_add(1);
    }
}

/// Monotonic simulation clock.
#[derive(Resource, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TickCount(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Entry {
    epoch: RoundEpoch,
    task: Task,
}

/// Queue of tasks ordered by due tick, then by insertion order.
#[derive(Resource, Debug, Default)]
pub struct ScheduledTasks {
    queue: BTreeMap<(u64, u64), Entry>,
    next_seq: u64,
}

impl ScheduledTasks {
    /// Schedules `task` to run `delay_ms` after tick `now`.
    pub fn schedule(&mut self, now: u64, delay_ms: u32, epoch: RoundEpoch, task: Task) {
        let due = now + u64::from(ms_to_ticks(delay_ms));
        trace!(?task, due, epoch = epoch.0, "Task scheduled");
        self.queue.insert((due, self.next_seq), Entry { epoch, task });
        self.next_seq += 1;
    }

    /// Pops the earliest task due at or before `now`, along with its epoch.
    pub fn pop_due(&mut self, now: u64) -> Option<(RoundEpoch, Task)> {
        let entry = self.queue.first_entry()?;
        if entry.key().0 > now {
            return None;
        }
        let Entry { epoch, task } = entry.remove();
        Some((epoch, task))
    }

    /// Pops the next due task scheduled in `current`, silently dropping stale ones.
    pub fn pop_current(&mut self, now: u64, current: RoundEpoch) -> Option<Task> {
        while let Some((epoch, task)) = self.pop_due(now) {
            if epoch == current {
                return Some(task);
            }
            trace!(?task, stale_epoch = epoch.0, current = current.0, "Dropping stale task");
        }
        None
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Number of pending tasks matching `predicate`.
    pub fn count(&self, predicate: impl Fn(&Task) -> bool) -> usize {
        self.queue.values().filter(|entry| predicate(&entry.task)).count()
    }

    pub fn clear(&mut self) {
        self.queue.clear();
    }
}
