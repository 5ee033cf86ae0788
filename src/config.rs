/*
 * Scheduler Configuration
 *
 * This module defines the compile-time scheduling constants and the per-kernel
 * boot configuration. The constants mirror the classic teaching-kernel values:
 * 64 priority levels, a 4-tick time slice, and a timer between 19 Hz and
 * 1000 Hz.
 */

/// Lowest thread priority (the idle thread runs here).
pub const PRI_MIN: i32 = 0;

/// Default priority for new threads, including the initial thread.
pub const PRI_DEFAULT: i32 = 31;

/// Highest thread priority.
pub const PRI_MAX: i32 = 63;

/// Most favorable nice value (MLFQ mode).
pub const NICE_MIN: i32 = -20;

/// Default nice value for new threads.
pub const NICE_DEFAULT: i32 = 0;

/// Least favorable nice value (MLFQ mode).
pub const NICE_MAX: i32 = 20;

/// Number of timer ticks a thread may run before forced preemption.
pub const TIME_SLICE: u32 = 4;

/// Maximum number of live threads, counting the initial and idle threads.
pub const MAX_THREADS: usize = 64;

/// Thread names are truncated to this many bytes.
pub const MAX_NAME_LEN: usize = 15;

/// Boot-time kernel configuration.
///
/// The configuration is fixed for the lifetime of a kernel: the timer
/// frequency and the scheduling mode cannot change after `Kernel::boot`.
#[derive(Debug, Clone, Copy)]
pub struct Config {
    /// Timer interrupts per second. Must be in `19..=1000`.
    pub timer_freq: u32,

    /// Use the multi-level feedback queue scheduler instead of
    /// priority scheduling with donation.
    pub mlfqs: bool,
}

impl Config {
    /// Default configuration: 100 Hz timer, priority scheduling.
    pub const fn new() -> Self {
        Self {
            timer_freq: 100,
            mlfqs: false,
        }
    }

    /// Configuration with the MLFQ scheduler enabled.
    pub const fn mlfqs() -> Self {
        Self {
            timer_freq: 100,
            mlfqs: true,
        }
    }

    /// Validate the timer frequency bounds.
    ///
    /// # Panics
    /// Panics if `timer_freq` is outside `19..=1000`.
    pub(crate) fn validate(&self) {
        assert!(
            (19..=1000).contains(&self.timer_freq),
            "timer frequency {} outside supported range 19..=1000",
            self.timer_freq
        );
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}
