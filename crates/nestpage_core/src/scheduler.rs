//! Deferred task scheduler
//!
//! Holds single-shot tasks and releases them as a virtual clock advances.
//! The clock only moves when the host calls [`TaskScheduler::advance`], so
//! tests and replays are deterministic.
//!
//! A task scheduled with [`TaskScheduler::schedule_next_tick`] is due at the
//! current time but is only released by the *next* `advance` call, never by
//! the pass that scheduled it.

use std::time::Duration;

use slotmap::{new_key_type, SlotMap};

new_key_type! {
    /// Handle for a scheduled task, usable for cancellation
    pub struct TaskId;
}

struct ScheduledTask<T> {
    due: Duration,
    /// Insertion order, breaks ties between tasks due at the same time
    seq: u64,
    payload: T,
}

/// Single-shot tasks on a virtual clock
pub struct TaskScheduler<T> {
    tasks: SlotMap<TaskId, ScheduledTask<T>>,
    now: Duration,
    next_seq: u64,
}

impl<T> TaskScheduler<T> {
    pub fn new() -> Self {
        Self {
            tasks: SlotMap::with_key(),
            now: Duration::ZERO,
            next_seq: 0,
        }
    }

    /// Schedule a task to run once `delay` has elapsed
    pub fn schedule_after(&mut self, delay: Duration, payload: T) -> TaskId {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.tasks.insert(ScheduledTask {
            due: self.now + delay,
            seq,
            payload,
        })
    }

    /// Schedule a task for the next tick
    pub fn schedule_next_tick(&mut self, payload: T) -> TaskId {
        self.schedule_after(Duration::ZERO, payload)
    }

    /// Cancel a pending task, returning its payload if it had not run yet
    pub fn cancel(&mut self, id: TaskId) -> Option<T> {
        self.tasks.remove(id).map(|task| task.payload)
    }

    /// Check whether a task is still waiting to run
    pub fn is_pending(&self, id: TaskId) -> bool {
        self.tasks.contains_key(id)
    }

    /// Advance the clock and take every task that became due, in due order.
    pub fn advance(&mut self, dt: Duration) -> Vec<T> {
        self.now += dt;
        let now = self.now;

        let mut due: Vec<(Duration, u64, TaskId)> = self
            .tasks
            .iter()
            .filter(|(_, task)| task.due <= now)
            .map(|(id, task)| (task.due, task.seq, id))
            .collect();
        due.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.cmp(&b.1)));

        if !due.is_empty() {
            tracing::trace!("scheduler: {} task(s) due at {:?}", due.len(), now);
        }

        due.into_iter()
            .filter_map(|(_, _, id)| self.tasks.remove(id))
            .map(|task| task.payload)
            .collect()
    }

    /// Drop every pending task
    pub fn clear(&mut self) {
        self.tasks.clear();
    }

    /// Number of pending tasks
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

impl<T> Default for TaskScheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tasks_release_in_due_order() {
        let mut scheduler = TaskScheduler::new();
        scheduler.schedule_after(Duration::from_millis(300), "late");
        scheduler.schedule_after(Duration::from_millis(100), "early");
        scheduler.schedule_after(Duration::from_millis(100), "early-second");

        assert!(scheduler.advance(Duration::from_millis(50)).is_empty());
        assert_eq!(
            scheduler.advance(Duration::from_millis(50)),
            vec!["early", "early-second"]
        );
        assert_eq!(scheduler.advance(Duration::from_millis(500)), vec!["late"]);
        assert!(scheduler.is_empty());
    }

    #[test]
    fn test_next_tick_waits_for_advance() {
        let mut scheduler = TaskScheduler::new();
        let id = scheduler.schedule_next_tick(1);

        assert!(scheduler.is_pending(id));
        assert_eq!(scheduler.advance(Duration::ZERO), vec![1]);
        assert!(!scheduler.is_pending(id));
    }

    #[test]
    fn test_cancel() {
        let mut scheduler = TaskScheduler::new();
        let stale = scheduler.schedule_after(Duration::from_millis(200), "stale");
        scheduler.schedule_after(Duration::from_millis(200), "fresh");

        assert_eq!(scheduler.cancel(stale), Some("stale"));
        assert_eq!(scheduler.cancel(stale), None);
        assert_eq!(scheduler.advance(Duration::from_secs(1)), vec!["fresh"]);
    }

    #[test]
    fn test_clock_accumulates() {
        let mut scheduler = TaskScheduler::new();
        scheduler.schedule_after(Duration::from_millis(30), "due");
        assert!(scheduler.advance(Duration::from_millis(16)).is_empty());
        assert_eq!(scheduler.advance(Duration::from_millis(16)), vec!["due"]);
    }
}
