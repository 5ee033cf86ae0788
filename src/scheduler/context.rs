/*
 * Portable Context Switch
 *
 * On the real machine a context switch spills the callee-saved registers
 * into the outgoing thread's record and restores the incoming thread's.
 * This module is the portable stand-in: every kernel thread is backed by a
 * host thread that stays parked except while it is the Running thread, and
 * `switch_to` is a store + unpark + park handoff.
 *
 * The handoff protocol:
 * 1. The scheduler decides on `next` with the scheduler lock held, releases
 *    the lock, and calls switch_to.
 * 2. switch_to publishes `next` as the running thread and unparks its host.
 * 3. The outgoing host parks until it is published as running again.
 *
 * park/unpark carries a wake token, so the ordering of step 2 and 3 between
 * two threads cannot lose a wakeup; spurious wakeups are absorbed by
 * re-checking the published running id.
 *
 * Thread exit unwinds: `exit_thread` raises a private panic payload that
 * the entry trampoline catches, so the host thread's stack is torn down
 * normally before the final handoff. Any other panic escaping a thread body
 * is a kernel panic and aborts.
 */

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::Ordering;
use std::sync::{Arc, Once};

use crate::intr;
use crate::scheduler::thread::{ThreadId, ThreadState};
use crate::scheduler::{self, KernelState};

/// Panic payload used to unwind a thread that called `exit_thread`.
pub(crate) struct ThreadExit;

static EXIT_HOOK: Once = Once::new();

/// Install a panic hook that stays silent for ThreadExit unwinds.
///
/// Chained in front of whatever hook was already installed, so real panics
/// still report normally. Installed once per process, at first kernel boot.
pub(crate) fn install_exit_hook() {
    EXIT_HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if info.payload().downcast_ref::<ThreadExit>().is_none() {
                previous(info);
            }
        }));
    });
}

/// Hand the CPU from `prev` to `next`.
///
/// Called by the scheduler with interrupts off and the scheduler lock
/// already released. If `prev` is dying this returns immediately so the
/// host thread can finish; otherwise it does not return until `prev` is
/// scheduled again.
pub(crate) fn switch_to(
    kernel: &Arc<KernelState>,
    prev: ThreadId,
    next: ThreadId,
    next_host: std::thread::Thread,
    prev_dying: bool,
) {
    kernel.running.store(next.0, Ordering::SeqCst);
    next_host.unpark();
    if prev_dying {
        return;
    }
    wait_until_running(kernel, prev);
}

/// Park until the scheduler publishes `me` as the running thread.
pub(crate) fn wait_until_running(kernel: &KernelState, me: ThreadId) {
    while kernel.running.load(Ordering::SeqCst) != me.0 {
        std::thread::park();
    }
}

/// Body of every spawned host thread.
///
/// Waits to be scheduled for the first time, enables interrupts (the
/// scheduler runs with them off), runs the thread function, and exits the
/// thread if the function returns without doing so itself.
pub(crate) fn trampoline(
    kernel: Arc<KernelState>,
    id: ThreadId,
    body: Box<dyn FnOnce() + Send + 'static>,
) {
    scheduler::set_current(kernel.clone(), id);
    wait_until_running(&kernel, id);

    intr::enable();
    match panic::catch_unwind(AssertUnwindSafe(body)) {
        Ok(()) => {}
        Err(payload) if payload.is::<ThreadExit>() => {}
        Err(payload) => {
            // a stray panic in kernel code is fatal, like any broken
            // kernel invariant
            let message = payload
                .downcast_ref::<&str>()
                .copied()
                .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
                .unwrap_or("unknown panic payload");
            log::error!("kernel thread {id} panicked: {message}");
            std::process::abort();
        }
    }

    die(&kernel, id);
}

/// Begin unwinding the current thread. Caught by the trampoline.
pub(crate) fn begin_exit() -> ! {
    panic::panic_any(ThreadExit)
}

/// Final descheduling of a finished thread.
///
/// Detaches the thread from the all-threads list, marks it Dying, and hands
/// the CPU away for the last time. The record itself is reclaimed by the
/// next scheduling decision, never by this thread: its host is still
/// standing on state the record owns.
fn die(kernel: &Arc<KernelState>, id: ThreadId) {
    intr::disable();
    {
        let mut sched = kernel.sched.lock();
        sched.all.retain(|&t| t != id);
    }
    log::debug!("thread {id} exiting");
    scheduler::reschedule(kernel, ThreadState::Dying);
    // not reached as a scheduled thread: the handoff above was final
}
