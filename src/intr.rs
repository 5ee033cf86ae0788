/*
 * Interrupt Level Management
 *
 * The scheduler protects all shared state by disabling interrupts around
 * short critical sections: with a single logical CPU and no interrupts, no
 * other code can run. This module tracks the simulated interrupt level of
 * the CPU, whether the CPU is currently inside the timer interrupt handler,
 * and the deferred yield requested by the handler.
 *
 * Critical sections save the previous level and restore it on exit instead
 * of unconditionally enabling, so nesting composes:
 *
 *     let old = intr::disable();
 *     // ... touch scheduler state ...
 *     intr::set_level(old);
 *
 * Every suspension point (block, yield, semaphore down, sleep) requires
 * interrupts to be disabled on entry, and every resumed thread continues
 * with interrupts disabled until it restores its own saved level. The flag
 * therefore never needs to be saved per-thread.
 */

use core::sync::atomic::{AtomicBool, Ordering};

use crate::scheduler::{self, KernelState};

/// Interrupt level of the simulated CPU.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntrLevel {
    /// Interrupts enabled: the timer may fire between instructions.
    On,
    /// Interrupts disabled: the running thread cannot be preempted.
    Off,
}

/// Per-kernel interrupt state.
///
/// Atomics rather than a lock: the flags are only ever written by the
/// running thread, and the tick handler runs on the running thread's stack.
#[derive(Debug)]
pub(crate) struct IntrState {
    disabled: AtomicBool,
    in_handler: AtomicBool,
    yield_requested: AtomicBool,
}

impl IntrState {
    /// Boot starts with interrupts off, like the real machine.
    pub(crate) const fn new() -> Self {
        Self {
            disabled: AtomicBool::new(true),
            in_handler: AtomicBool::new(false),
            yield_requested: AtomicBool::new(false),
        }
    }
}

/// Get the current interrupt level.
pub fn get_level() -> IntrLevel {
    let kernel = scheduler::current_kernel();
    level_of(&kernel)
}

/// Disable interrupts and return the previous level.
pub fn disable() -> IntrLevel {
    let kernel = scheduler::current_kernel();
    let old = level_of(&kernel);
    kernel.intr.disabled.store(true, Ordering::SeqCst);
    old
}

/// Enable interrupts and return the previous level.
///
/// # Panics
/// Panics if called from the interrupt handler; handlers always run with
/// interrupts off and must stay that way.
pub fn enable() -> IntrLevel {
    let kernel = scheduler::current_kernel();
    assert!(
        !kernel.intr.in_handler.load(Ordering::SeqCst),
        "cannot enable interrupts inside the interrupt handler"
    );
    let old = level_of(&kernel);
    kernel.intr.disabled.store(false, Ordering::SeqCst);
    old
}

/// Restore a previously saved interrupt level.
pub fn set_level(level: IntrLevel) {
    match level {
        IntrLevel::On => enable(),
        IntrLevel::Off => disable(),
    };
}

/// True if interrupts are currently enabled.
pub fn are_enabled() -> bool {
    get_level() == IntrLevel::On
}

/// True while the CPU is executing the timer interrupt handler.
///
/// Blocking operations assert this is false: an interrupt handler has no
/// thread identity of its own and must never be suspended.
pub fn in_handler() -> bool {
    let kernel = scheduler::current_kernel();
    kernel.intr.in_handler.load(Ordering::SeqCst)
}

/// Ask the scheduler to yield as soon as the interrupt handler returns.
///
/// This is how the tick handler enforces preemption: it cannot switch
/// threads itself, so it sets a flag that is honored on the way out of the
/// interrupt.
///
/// # Panics
/// Panics if called outside the interrupt handler.
pub fn yield_on_return() {
    let kernel = scheduler::current_kernel();
    assert!(
        kernel.intr.in_handler.load(Ordering::SeqCst),
        "yield_on_return outside interrupt handler"
    );
    kernel.intr.yield_requested.store(true, Ordering::SeqCst);
}

pub(crate) fn level_of(kernel: &KernelState) -> IntrLevel {
    if kernel.intr.disabled.load(Ordering::SeqCst) {
        IntrLevel::Off
    } else {
        IntrLevel::On
    }
}

/// Enter the timer interrupt handler. Interrupts must have been enabled,
/// exactly as the hardware would require to deliver the interrupt.
pub(crate) fn enter_handler(kernel: &KernelState) {
    assert!(
        !kernel.intr.in_handler.swap(true, Ordering::SeqCst),
        "nested interrupt handler"
    );
    kernel.intr.disabled.store(true, Ordering::SeqCst);
}

/// Leave the timer interrupt handler.
pub(crate) fn exit_handler(kernel: &KernelState) {
    assert!(
        kernel.intr.in_handler.swap(false, Ordering::SeqCst),
        "exit_handler outside interrupt handler"
    );
}

/// Consume a pending yield-on-return request.
pub(crate) fn take_yield_request(kernel: &KernelState) -> bool {
    kernel.intr.yield_requested.swap(false, Ordering::SeqCst)
}
