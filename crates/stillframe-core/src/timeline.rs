//! Virtual timeline of delayed tasks.
//!
//! Every timed behavior of the stage (fade completions, auto-progression,
//! scene switch phases, the haptic cue loop) is a task scheduled here. One
//! owner drives the timeline forward, so tasks run strictly one after another
//! in deadline order and never race.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::time::Duration;

#[derive(Debug)]
struct Scheduled<T> {
    due: Duration,
    id: u64,
    task: T,
}

impl<T> PartialEq for Scheduled<T> {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.id == other.id
    }
}

impl<T> Eq for Scheduled<T> {}

impl<T> PartialOrd for Scheduled<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Scheduled<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        // Equal deadlines fire in scheduling order.
        self.due.cmp(&other.due).then(self.id.cmp(&other.id))
    }
}

/// A monotonic virtual clock with a queue of pending tasks.
#[derive(Debug)]
pub struct Timeline<T> {
    now: Duration,
    next_id: u64,
    queue: BinaryHeap<Reverse<Scheduled<T>>>,
}

impl<T> Default for Timeline<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Timeline<T> {
    /// Creates an empty timeline at time zero.
    #[must_use]
    pub fn new() -> Self {
        Self {
            now: Duration::ZERO,
            next_id: 0,
            queue: BinaryHeap::new(),
        }
    }

    /// Current virtual time.
    #[must_use]
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Schedules `task` to run `delay` after the current time. Deadlines
    /// saturate at `Duration::MAX`.
    pub fn schedule_in(&mut self, delay: Duration, task: T) {
        let id = self.next_id;
        self.next_id += 1;
        self.queue.push(Reverse(Scheduled {
            due: self.now.saturating_add(delay),
            id,
            task,
        }));
    }

    /// Pops the earliest task due at or before `until`, moving the clock to
    /// its deadline.
    pub fn pop_due(&mut self, until: Duration) -> Option<T> {
        let due = self.queue.peek().map(|Reverse(next)| next.due)?;
        if due > until {
            return None;
        }
        let Reverse(scheduled) = self.queue.pop()?;
        self.now = self.now.max(scheduled.due);
        Some(scheduled.task)
    }

    /// Moves the clock forward to `until`. Never moves it backwards.
    pub fn settle(&mut self, until: Duration) {
        self.now = self.now.max(until);
    }

    /// Number of pending tasks.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.len()
    }
}
