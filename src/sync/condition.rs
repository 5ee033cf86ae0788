/*
 * Condition Variable
 *
 * A Mesa-style monitor condition: wait atomically releases the monitor
 * lock and sleeps, signal wakes the highest-priority waiter, broadcast
 * wakes everyone. Signal and resume are not atomic, so a woken waiter must
 * re-check its predicate before relying on it.
 *
 * Each waiter sleeps on its own one-shot semaphore, paired with the
 * waiter's effective priority captured at enqueue time; signal re-sorts by
 * the recorded priorities and pops the highest. A condition variable is
 * associated with a single lock at a time, but one lock may back any
 * number of condition variables.
 */

use std::sync::Arc;

use spin::Mutex;

use crate::intr;
use crate::scheduler;
use crate::sync::{Lock, Semaphore};

/// One queued waiter: a one-shot semaphore and the priority of the thread
/// that sleeps on it.
struct Waiter {
    sema: Arc<Semaphore>,
    priority: i32,
}

/// Mesa-style condition variable.
pub struct Condition {
    waiters: Mutex<Vec<Waiter>>,
}

impl Condition {
    /// Create a condition variable with no waiters.
    pub const fn new() -> Self {
        Self {
            waiters: Mutex::new(Vec::new()),
        }
    }

    /// Atomically release `lock` and sleep until signaled, then reacquire
    /// `lock` before returning.
    ///
    /// Mesa semantics: being signaled means the condition was true at some
    /// point, not that it still is. Callers wait in a loop that re-checks
    /// the predicate.
    ///
    /// # Panics
    /// Panics if the caller does not hold `lock`, or if called from the
    /// interrupt handler.
    pub fn wait(&self, lock: &Lock) {
        assert!(!intr::in_handler(), "cannot wait inside the interrupt handler");
        assert!(lock.held_by_current(), "condition wait without holding the lock");

        let sema = Arc::new(Semaphore::new(0));
        let priority = scheduler::priority();
        {
            let mut waiters = self.waiters.lock();
            let pos = waiters
                .iter()
                .position(|w| w.priority < priority)
                .unwrap_or(waiters.len());
            waiters.insert(
                pos,
                Waiter {
                    sema: sema.clone(),
                    priority,
                },
            );
        }

        lock.release();
        sema.down();
        lock.acquire();
    }

    /// Wake the highest-priority waiter, if any.
    ///
    /// # Panics
    /// Panics if the caller does not hold `lock`, or if called from the
    /// interrupt handler. A handler cannot hold a lock, so signaling from
    /// one makes no sense.
    pub fn signal(&self, lock: &Lock) {
        assert!(!intr::in_handler(), "cannot signal inside the interrupt handler");
        assert!(lock.held_by_current(), "condition signal without holding the lock");

        let next = {
            let mut waiters = self.waiters.lock();
            if waiters.is_empty() {
                None
            } else {
                waiters.sort_by_key(|w| core::cmp::Reverse(w.priority));
                Some(waiters.remove(0))
            }
        };
        if let Some(waiter) = next {
            waiter.sema.up();
        }
    }

    /// Wake every waiter.
    pub fn broadcast(&self, lock: &Lock) {
        assert!(lock.held_by_current(), "condition broadcast without holding the lock");
        while !self.waiters.lock().is_empty() {
            self.signal(lock);
        }
    }

    /// Number of queued waiters, for diagnostics.
    pub fn waiter_count(&self) -> usize {
        self.waiters.lock().len()
    }
}

impl Default for Condition {
    fn default() -> Self {
        Self::new()
    }
}
