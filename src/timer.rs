/*
 * Timer and Tick Delivery
 *
 * The scheduler counts time in ticks. On the real machine an interval
 * timer raises an interrupt TIMER_FREQ times per second; here a tick is
 * delivered explicitly with `interrupt_tick`, which runs the same handler
 * the hardware would: advance the tick counter, account the tick to the
 * scheduler, wake due sleepers, and honor a deferred yield on the way out.
 *
 * The tick must be delivered on the running thread with interrupts
 * enabled, exactly the conditions under which the hardware could have
 * interrupted. The idle thread delivers a tick per iteration, so time
 * keeps moving whenever every other thread is asleep.
 */

use core::sync::atomic::Ordering;

use crate::intr;
use crate::scheduler::{self, sleep};

/// Number of ticks since the kernel booted.
///
/// Read with interrupts disabled so the value cannot shear against a
/// concurrent handler.
pub fn ticks() -> u64 {
    let kernel = scheduler::current_kernel();
    let old = intr::disable();
    let now = kernel.ticks.load(Ordering::SeqCst);
    intr::set_level(old);
    now
}

/// Ticks elapsed since `then`, which should be a value previously returned
/// by `ticks`.
pub fn elapsed(then: u64) -> u64 {
    ticks().saturating_sub(then)
}

/// Suspend the current thread for approximately `ticks_to_wait` ticks.
///
/// The thread wakes at the first tick at or after now + ticks_to_wait; it
/// runs again once every higher-priority thread has given up the CPU.
///
/// # Panics
/// Panics if interrupts are disabled; sleeping inside a critical section
/// would stop time.
pub fn sleep(ticks_to_wait: u64) {
    assert!(intr::are_enabled(), "timer sleep with interrupts disabled");
    if ticks_to_wait == 0 {
        return;
    }
    let kernel = scheduler::current_kernel();
    let wake_tick = ticks() + ticks_to_wait;
    sleep::sleep_until(&kernel, wake_tick);
}

/// Suspend the current thread for approximately `ms` milliseconds,
/// converted through the timer frequency and rounded down. A request
/// shorter than one tick degrades to a yield; virtual time has no
/// busy-wait.
pub fn msleep(ms: u64) {
    let kernel = scheduler::current_kernel();
    let ticks_to_wait = ms * u64::from(kernel.config.timer_freq) / 1000;
    if ticks_to_wait > 0 {
        sleep(ticks_to_wait);
    } else {
        scheduler::yield_now();
    }
}

/// Deliver one timer interrupt.
///
/// Runs the tick handler on the caller's stack: statistics and MLFQ
/// recalculation, then the sleep-queue scan. If the handler asked for
/// preemption, the caller yields on the way out, which is exactly the
/// yield-on-return discipline of a real return-from-interrupt.
///
/// # Panics
/// Panics if interrupts are disabled; the hardware could not have
/// delivered the interrupt.
pub fn interrupt_tick() {
    let kernel = scheduler::current_kernel();
    assert!(intr::are_enabled(), "timer interrupt with interrupts disabled");

    intr::enter_handler(&kernel);
    let now = kernel.ticks.fetch_add(1, Ordering::SeqCst) + 1;
    scheduler::note_tick(&kernel, now);
    sleep::wake_due(&kernel, now);
    intr::exit_handler(&kernel);
    intr::enable();

    if intr::take_yield_request(&kernel) && kernel.enabled.load(Ordering::SeqCst) {
        scheduler::yield_now();
    }
}
