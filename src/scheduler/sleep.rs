/*
 * Sleep Queue
 *
 * Threads that sleep for a number of ticks are stamped with an absolute
 * wake tick, parked on the sleep list, and blocked. The timer interrupt
 * handler scans the list once per tick and unblocks every thread that has
 * become due.
 *
 * The list is kept in sleep-call order, not wake order: the scan touches
 * every entry anyway, and the ready queue's priority ordering decides who
 * actually runs first among threads woken on the same tick.
 */

use std::sync::Arc;

use crate::intr;
use crate::scheduler::{self, KernelState, ThreadState};

/// Put the current thread to sleep until `wake_tick`.
///
/// Must not be called from the interrupt handler. The idle thread never
/// sleeps; a sleep request from it is ignored.
pub(crate) fn sleep_until(kernel: &Arc<KernelState>, wake_tick: u64) {
    assert!(!intr::in_handler(), "cannot sleep inside the interrupt handler");

    let old = intr::disable();
    let parked = {
        let mut sched = kernel.sched.lock();
        let cur = sched.current;
        if Some(cur) == sched.idle {
            false
        } else {
            sched.thread_mut(cur).wake_tick = wake_tick;
            sched.sleepers.push(cur);
            true
        }
    };
    if parked {
        scheduler::reschedule(kernel, ThreadState::Blocked);
    }
    intr::set_level(old);
}

/// Wake every sleeper that is due at `now`.
///
/// Runs in the interrupt handler, interrupts off. Due threads are unblocked
/// in scan order; their relative run order is then up to the ready queue.
pub(crate) fn wake_due(kernel: &Arc<KernelState>, now: u64) {
    let due = {
        let mut sched = kernel.sched.lock();
        let sleepers = std::mem::take(&mut sched.sleepers);
        let (due, still_sleeping): (Vec<_>, Vec<_>) = sleepers
            .into_iter()
            .partition(|&t| sched.thread(t).wake_tick <= now);
        sched.sleepers = still_sleeping;
        due
    };

    for id in due {
        log::debug!("waking {id} at tick {now}");
        scheduler::unblock(kernel, id);
    }
}
