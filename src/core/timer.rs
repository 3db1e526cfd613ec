/// Deferred continuations on a virtual clock.
///
/// Every fixed-duration pause in the engine (transition blackout, post-game
/// pause, notification auto-dismiss) is a task scheduled here. The owner
/// advances the clock from its frame loop and runs whatever comes due.
use std::time::Duration;

/// Handle used to cancel a scheduled task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

#[derive(Debug, Clone)]
struct Pending<T> {
    id: TimerId,
    due: Duration,
    task: T,
}

/// A single-threaded timer queue.
#[derive(Debug, Clone)]
pub struct Scheduler<T> {
    now: Duration,
    next_id: u64,
    pending: Vec<Pending<T>>,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Scheduler<T> {
    pub fn new() -> Self {
        Self {
            now: Duration::ZERO,
            next_id: 0,
            pending: Vec::new(),
        }
    }

    /// Current virtual time.
    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.pending.iter().any(|p| p.id == id)
    }

    /// Schedule `task` to come due `delay` from now.
    pub fn schedule(&mut self, delay: Duration, task: T) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.pending.push(Pending {
            id,
            due: self.now + delay,
            task,
        });
        id
    }

    /// Cancel a task. Returns false if it already fired or was cancelled.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.pending.len();
        self.pending.retain(|p| p.id != id);
        before != self.pending.len()
    }

    pub fn cancel_all(&mut self) {
        self.pending.clear();
    }

    /// Remove and return the earliest task due at or before `horizon`,
    /// moving the clock to its due time. Ties fire in scheduling order.
    pub fn pop_due(&mut self, horizon: Duration) -> Option<T> {
        let index = self
            .pending
            .iter()
            .enumerate()
            .filter(|(_, p)| p.due <= horizon)
            .min_by_key(|(_, p)| (p.due, p.id))
            .map(|(i, _)| i)?;
        let pending = self.pending.remove(index);
        if pending.due > self.now {
            self.now = pending.due;
        }
        Some(pending.task)
    }

    /// Move the clock forward without firing anything. Never moves backwards.
    pub fn advance_to(&mut self, horizon: Duration) {
        if horizon > self.now {
            self.now = horizon;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn drain(s: &mut Scheduler<&'static str>, horizon: Duration) -> Vec<&'static str> {
        let mut fired = Vec::new();
        while let Some(task) = s.pop_due(horizon) {
            fired.push(task);
        }
        s.advance_to(horizon);
        fired
    }

    #[test]
    fn fires_in_due_order() {
        let mut s = Scheduler::new();
        s.schedule(ms(500), "late");
        s.schedule(ms(100), "early");
        assert_eq!(drain(&mut s, ms(1000)), vec!["early", "late"]);
        assert_eq!(s.now(), ms(1000));
        assert!(s.is_empty());
    }

    #[test]
    fn ties_fire_in_scheduling_order() {
        let mut s = Scheduler::new();
        s.schedule(ms(200), "first");
        s.schedule(ms(200), "second");
        assert_eq!(drain(&mut s, ms(200)), vec!["first", "second"]);
    }

    #[test]
    fn not_due_yet() {
        let mut s = Scheduler::new();
        s.schedule(ms(500), "x");
        assert!(drain(&mut s, ms(499)).is_empty());
        assert_eq!(drain(&mut s, ms(500)), vec!["x"]);
    }

    #[test]
    fn cancelled_tasks_never_fire() {
        let mut s = Scheduler::new();
        let id = s.schedule(ms(10), "cancelled");
        s.schedule(ms(20), "kept");
        assert!(s.is_pending(id));
        assert!(s.cancel(id));
        assert!(!s.cancel(id));
        assert_eq!(drain(&mut s, ms(100)), vec!["kept"]);
    }

    #[test]
    fn delays_are_relative_to_fire_time() {
        let mut s = Scheduler::new();
        s.schedule(ms(500), "a");
        assert_eq!(s.pop_due(ms(2000)), Some("a"));
        // The clock sits at the due time of the task that just fired.
        assert_eq!(s.now(), ms(500));
        s.schedule(ms(500), "b");
        assert_eq!(drain(&mut s, ms(2000)), vec!["b"]);
    }

    #[test]
    fn cancel_all_clears_queue() {
        let mut s = Scheduler::new();
        s.schedule(ms(1), "a");
        s.schedule(ms(2), "b");
        s.cancel_all();
        assert!(drain(&mut s, ms(10)).is_empty());
    }
}
