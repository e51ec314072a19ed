//! Deadline scheduler for engine timers
//!
//! Replaces free-running interval/timeout callbacks: every timer is a task
//! with a deadline on the engine clock, optionally owned by a cue. Cancelling
//! removes the task from the table; its heap slot is discarded lazily when
//! it surfaces.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::time::Duration;
use uuid::Uuid;

/// Handle returned by [`Scheduler::schedule_at`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u64);

#[derive(Debug)]
struct Entry<T> {
    owner: Option<Uuid>,
    task: T,
}

#[derive(Debug)]
pub struct Scheduler<T> {
    /// (deadline, sequence); the sequence keeps FIFO order for equal deadlines
    heap: BinaryHeap<Reverse<(Duration, u64)>>,
    entries: HashMap<u64, Entry<T>>,
    next_seq: u64,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self {
            heap: BinaryHeap::new(),
            entries: HashMap::new(),
            next_seq: 0,
        }
    }
}

impl<T> Scheduler<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule_at(&mut self, deadline: Duration, owner: Option<Uuid>, task: T) -> TaskId {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Reverse((deadline, seq)));
        self.entries.insert(seq, Entry { owner, task });
        TaskId(seq)
    }

    /// Returns `true` if the task was still pending
    pub fn cancel(&mut self, id: TaskId) -> bool {
        self.entries.remove(&id.0).is_some()
    }

    /// Cancel every pending task owned by `owner`
    pub fn cancel_owned(&mut self, owner: Uuid) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.owner != Some(owner));
        before - self.entries.len()
    }

    /// Next task whose deadline is at or before `now`
    pub fn pop_due(&mut self, now: Duration) -> Option<(Duration, T)> {
        while let Some(Reverse((deadline, seq))) = self.heap.peek().copied() {
            if deadline > now {
                return None;
            }
            self.heap.pop();
            if let Some(entry) = self.entries.remove(&seq) {
                return Some((deadline, entry.task));
            }
        }
        None
    }

    pub fn pending_owned(&self, owner: Uuid) -> usize {
        self.entries
            .values()
            .filter(|entry| entry.owner == Some(owner))
            .count()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.heap.clear();
        self.entries.clear();
    }

    /// Tasks still pending, in no particular order
    pub fn tasks(&self) -> impl Iterator<Item = &T> {
        self.entries.values().map(|entry| &entry.task)
    }
}
