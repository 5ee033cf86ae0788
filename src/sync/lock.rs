/*
 * Lock with Priority Donation
 *
 * A lock is a binary semaphore with an owner: the thread that acquired it
 * must be the one that releases it, and re-acquisition by the holder is a
 * programming error. Use a bare semaphore when those restrictions chafe.
 *
 * Priority donation prevents priority inversion. When a thread blocks on a
 * held lock it lends the holder its priority, transitively along the chain
 * of lock holders, so a low-priority holder cannot be starved by mid-
 * priority threads while a high-priority thread waits behind it. Donations
 * are keyed by lock: releasing one lock returns only the priority donated
 * through that lock, so nested locks donate independently.
 *
 * Cyclic lock-wait graphs are forbidden by contract (they are deadlocks),
 * but the chain walk carries a depth guard anyway so a violated contract
 * cannot hang the walk; truncating early only costs scheduling accuracy,
 * never mutual exclusion.
 *
 * In MLFQ mode the kernel owns all priorities and donation is disabled;
 * the lock degrades to a plain owned semaphore.
 */

use core::fmt;
use core::sync::atomic::{AtomicUsize, Ordering};

use crate::intr;
use crate::scheduler::{self, Sched, ThreadId};
use crate::sync::Semaphore;

/// Donation chains longer than this are truncated.
const DONATION_DEPTH_MAX: usize = 8;

static NEXT_LOCK_ID: AtomicUsize = AtomicUsize::new(1);

/// Identity of a lock, process-unique. Thread records point at the lock
/// they are blocked on through this id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LockId(pub usize);

impl fmt::Display for LockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Lock({})", self.0)
    }
}

/// Non-recursive mutual-exclusion lock.
pub struct Lock {
    id: LockId,
    sema: Semaphore,
}

impl Lock {
    /// Create an unowned lock.
    pub fn new() -> Self {
        Self {
            id: LockId(NEXT_LOCK_ID.fetch_add(1, Ordering::Relaxed)),
            sema: Semaphore::new(1),
        }
    }

    /// Acquire the lock, sleeping until it is available.
    ///
    /// If the lock is held, the caller first records the dependency and
    /// donates its priority down the holder chain, then sleeps on the
    /// underlying semaphore.
    ///
    /// # Panics
    /// Panics if the caller already holds this lock, or if called from the
    /// interrupt handler.
    pub fn acquire(&self) {
        let (kernel, cur) = scheduler::current_ctx();
        assert!(!intr::in_handler(), "cannot acquire a lock inside the interrupt handler");
        assert!(!self.held_by_current(), "recursive acquire of {}", self.id);

        let old = intr::disable();
        if !kernel.config.mlfqs {
            let mut sched = kernel.sched.lock();
            if let Some(&holder) = sched.lock_holders.get(&self.id) {
                sched.thread_mut(cur).wait_on_lock = Some(self.id);
                insert_donor(&mut sched, holder, cur);
                donate_down_chain(&mut sched, cur);
            }
        }

        self.sema.down();

        {
            let mut sched = kernel.sched.lock();
            sched.lock_holders.insert(self.id, cur);
            sched.thread_mut(cur).wait_on_lock = None;
        }
        intr::set_level(old);
    }

    /// Acquire without waiting. Returns true on success.
    ///
    /// No donation bookkeeping: the caller never sleeps, so there is no
    /// inversion to prevent. May be called from the interrupt handler.
    pub fn try_acquire(&self) -> bool {
        let (kernel, cur) = scheduler::current_ctx();
        assert!(!self.held_by_current(), "recursive try_acquire of {}", self.id);

        if !self.sema.try_down() {
            return false;
        }
        let old = intr::disable();
        kernel.sched.lock().lock_holders.insert(self.id, cur);
        intr::set_level(old);
        true
    }

    /// Release the lock.
    ///
    /// Returns every donation that came in through this lock, restores the
    /// holder's priority from its base and any remaining donors, then wakes
    /// the highest-priority waiter.
    ///
    /// # Panics
    /// Panics if the caller does not hold the lock.
    pub fn release(&self) {
        let (kernel, cur) = scheduler::current_ctx();
        assert!(self.held_by_current(), "release of {} by a non-holder", self.id);

        let old = intr::disable();
        {
            let mut sched = kernel.sched.lock();
            if !kernel.config.mlfqs {
                undonate_for_lock(&mut sched, cur, self.id);
            }
            sched.lock_holders.remove(&self.id);
        }
        intr::set_level(old);

        self.sema.up();
    }

    /// True if the calling thread holds this lock.
    ///
    /// Asking about another thread's ownership would be racy, so that is
    /// deliberately not expressible.
    pub fn held_by_current(&self) -> bool {
        let (kernel, cur) = scheduler::current_ctx();
        kernel.sched.lock().lock_holders.get(&self.id) == Some(&cur)
    }
}

impl Default for Lock {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Lock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lock").field("id", &self.id).finish()
    }
}

/// Add `donor` to `holder`'s donor list, ordered by descending priority.
fn insert_donor(sched: &mut Sched, holder: ThreadId, donor: ThreadId) {
    let priority = sched.thread(donor).priority;
    let pos = {
        let holder_rec = sched.thread(holder);
        holder_rec
            .donors
            .iter()
            .position(|&d| sched.thread(d).priority < priority)
            .unwrap_or(holder_rec.donors.len())
    };
    sched.thread_mut(holder).donors.insert(pos, donor);
}

/// Walk the chain waiter -> holder -> holder's holder ..., raising each
/// holder to the walker's priority. Stops at an unblocked holder or at the
/// depth guard.
fn donate_down_chain(sched: &mut Sched, start: ThreadId) {
    let mut walker = start;
    for _ in 0..DONATION_DEPTH_MAX {
        let Some(lock) = sched.thread(walker).wait_on_lock else {
            break;
        };
        let Some(&holder) = sched.lock_holders.get(&lock) else {
            break;
        };
        let donated = sched.thread(walker).priority;
        let holder_rec = sched.thread_mut(holder);
        if donated > holder_rec.priority {
            holder_rec.priority = donated;
            log::debug!("{walker} donates priority {donated} to {holder}");
        }
        walker = holder;
    }
}

/// Drop every donation `holder` received through `lock` and recompute its
/// effective priority from its base and the donors that remain.
fn undonate_for_lock(sched: &mut Sched, holder: ThreadId, lock: LockId) {
    let donors = core::mem::take(&mut sched.thread_mut(holder).donors);
    let mut kept = Vec::with_capacity(donors.len());
    for donor in donors {
        if sched.thread(donor).wait_on_lock == Some(lock) {
            sched.thread_mut(donor).wait_on_lock = None;
        } else {
            kept.push(donor);
        }
    }

    let restored = kept
        .iter()
        .map(|&d| sched.thread(d).priority)
        .max()
        .map_or(sched.thread(holder).base_priority, |m| {
            m.max(sched.thread(holder).base_priority)
        });

    let holder_rec = sched.thread_mut(holder);
    holder_rec.donors = kept;
    holder_rec.priority = restored;
}
