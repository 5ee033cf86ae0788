/*
 * Counting Semaphore
 *
 * A semaphore is a nonnegative counter with two atomic operations: down
 * waits for the value to become positive and decrements it, up increments
 * it and wakes one waiter.
 *
 * Waiters are kept ordered by descending priority, and the list is
 * re-sorted before every wake: a donation may have raised a waiter's
 * priority after it queued, and the highest-priority waiter must win
 * regardless of when it arrived.
 */

use spin::Mutex;

use crate::intr;
use crate::scheduler::{self, ThreadId};

struct SemaInner {
    value: u32,
    /// Blocked threads, ordered by descending priority at insertion time;
    /// re-sorted by current priority before each pop.
    waiters: Vec<ThreadId>,
}

/// Counting semaphore with priority-ordered waiters.
pub struct Semaphore {
    inner: Mutex<SemaInner>,
}

impl Semaphore {
    /// Create a semaphore with the given initial value.
    pub const fn new(value: u32) -> Self {
        Self {
            inner: Mutex::new(SemaInner {
                value,
                waiters: Vec::new(),
            }),
        }
    }

    /// Down or "P": wait until the value is positive, then decrement it.
    ///
    /// May block, so it must not be called from the interrupt handler. Like
    /// every wake here, the wait is Mesa-style: a woken thread re-checks
    /// the value and may find that a faster thread already took it.
    pub fn down(&self) {
        let (kernel, cur) = scheduler::current_ctx();
        assert!(!intr::in_handler(), "cannot down a semaphore inside the interrupt handler");

        let old = intr::disable();
        loop {
            let mut inner = self.inner.lock();
            if inner.value > 0 {
                inner.value -= 1;
                break;
            }

            // queue behind waiters of equal or higher priority
            let pos = {
                let sched = kernel.sched.lock();
                let my_priority = sched.thread(cur).priority;
                inner
                    .waiters
                    .iter()
                    .position(|&w| sched.thread(w).priority < my_priority)
                    .unwrap_or(inner.waiters.len())
            };
            inner.waiters.insert(pos, cur);
            drop(inner);

            scheduler::block(&kernel);
        }
        intr::set_level(old);
    }

    /// Down without waiting. Returns true if the value was decremented.
    ///
    /// Never blocks, so it may be called from the interrupt handler.
    pub fn try_down(&self) -> bool {
        let old = intr::disable();
        let mut inner = self.inner.lock();
        let taken = if inner.value > 0 {
            inner.value -= 1;
            true
        } else {
            false
        };
        drop(inner);
        intr::set_level(old);
        taken
    }

    /// Up or "V": increment the value and wake the highest-priority waiter.
    ///
    /// If the woken thread outranks the caller, the caller yields; from the
    /// interrupt handler the yield is deferred to the handler's return.
    pub fn up(&self) {
        let (kernel, cur) = scheduler::current_ctx();

        let old = intr::disable();
        let mut inner = self.inner.lock();
        inner.value += 1;

        let woken = if inner.waiters.is_empty() {
            None
        } else {
            // donations may have changed priorities since insertion
            {
                let sched = kernel.sched.lock();
                inner
                    .waiters
                    .sort_by_key(|&w| core::cmp::Reverse(sched.thread(w).priority));
            }
            Some(inner.waiters.remove(0))
        };
        drop(inner);

        let mut preempt = false;
        if let Some(next) = woken {
            scheduler::unblock(&kernel, next);
            let sched = kernel.sched.lock();
            preempt = sched.thread(next).priority > sched.thread(cur).priority;
        }
        intr::set_level(old);

        if preempt {
            if intr::in_handler() {
                intr::yield_on_return();
            } else {
                scheduler::yield_now();
            }
        }
    }

    /// Current value, for diagnostics. Stale as soon as it is read.
    pub fn value(&self) -> u32 {
        self.inner.lock().value
    }

    /// Number of queued waiters, for diagnostics.
    pub fn waiter_count(&self) -> usize {
        self.inner.lock().waiters.len()
    }
}
