/*
 * Thread Records
 *
 * This module defines the per-thread record and related types for the
 * priority scheduler. One record exists per live thread; queues never store
 * records, only ThreadIds, so a thread can sit on the ready queue, a
 * semaphore's waiter list, and a lock holder's donor list at the same time
 * without aliasing.
 *
 * Each record carries a magic sentinel that is validated at every
 * scheduling boundary. On the real machine the sentinel sits between the
 * record and the thread's stack and catches stack overflow; here it catches
 * table corruption the same way.
 */

use core::fmt;

use crate::config::{MAX_NAME_LEN, NICE_DEFAULT, PRI_MAX, PRI_MIN};
use crate::fixed_point::Fixed;
use crate::sync::lock::LockId;

/// Sentinel value stored in every live thread record.
const THREAD_MAGIC: u32 = 0x5ced_cafe;

/// Thread identifier. Allocated monotonically, never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ThreadId(pub usize);

impl fmt::Display for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Thread({})", self.0)
    }
}

/// Thread lifecycle state.
///
/// Exactly one thread is Running at any instant. The Running thread is
/// never on the ready queue or the sleep list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadState {
    /// Ready to run; on the ready queue.
    Ready,
    /// Currently executing on the CPU.
    Running,
    /// Waiting for an event; on some waiter set or the sleep list.
    Blocked,
    /// Finished; the record is reclaimed at the next scheduling decision
    /// made by a different thread.
    Dying,
}

/// Why `spawn` failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnError {
    /// The thread table is at capacity (MAX_THREADS live threads).
    TableFull,
    /// The host refused to provide a stack for the new thread.
    NoStack,
}

impl fmt::Display for SpawnError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpawnError::TableFull => write!(f, "thread table full"),
            SpawnError::NoStack => write!(f, "could not allocate a thread stack"),
        }
    }
}

/// Per-thread record.
///
/// `priority` is the effective priority used for every scheduling decision;
/// it equals `base_priority` unless donations are in effect, and it is
/// always >= `base_priority`.
pub struct Thread {
    pub id: ThreadId,
    pub name: heapless::String<16>,
    pub state: ThreadState,

    /// Effective priority after donations.
    pub priority: i32,
    /// Priority this thread last set for itself.
    pub base_priority: i32,

    /// Lock this thread is blocked on, if any.
    pub wait_on_lock: Option<LockId>,
    /// Threads that have donated their priority to this one, ordered by
    /// descending priority at insertion time.
    pub donors: Vec<ThreadId>,

    // MLFQ bookkeeping
    pub nice: i32,
    pub recent_cpu: Fixed,

    /// Absolute tick at which a sleeping thread becomes due.
    pub wake_tick: u64,

    /// Host thread backing this kernel thread; the unpark target of the
    /// context-switch handoff.
    pub(crate) host: std::thread::Thread,

    magic: u32,
}

impl Thread {
    /// Build a record in the Blocked state, the way every thread starts:
    /// `unblock` moves it onto the ready queue afterwards.
    pub(crate) fn new(id: ThreadId, name: &str, priority: i32, host: std::thread::Thread) -> Self {
        assert!(
            (PRI_MIN..=PRI_MAX).contains(&priority),
            "priority {priority} out of range"
        );
        Self {
            id,
            name: truncate_name(name),
            state: ThreadState::Blocked,
            priority,
            base_priority: priority,
            wait_on_lock: None,
            donors: Vec::new(),
            nice: NICE_DEFAULT,
            recent_cpu: Fixed::ZERO,
            wake_tick: 0,
            host,
            magic: THREAD_MAGIC,
        }
    }

    /// Validate the magic sentinel.
    ///
    /// # Panics
    /// Panics if the sentinel has been overwritten, which means the record
    /// was corrupted.
    pub(crate) fn check_magic(&self) {
        assert!(
            self.magic == THREAD_MAGIC,
            "thread record for {} corrupted",
            self.id
        );
    }
}

impl fmt::Debug for Thread {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Thread")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("state", &self.state)
            .field("priority", &self.priority)
            .field("base_priority", &self.base_priority)
            .finish()
    }
}

/// Copy a name into bounded storage, keeping at most MAX_NAME_LEN bytes and
/// never splitting a character.
fn truncate_name(name: &str) -> heapless::String<16> {
    let mut out = heapless::String::new();
    for ch in name.chars() {
        if out.len() + ch.len_utf8() > MAX_NAME_LEN {
            break;
        }
        let _ = out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_truncated_to_fifteen_bytes() {
        let t = Thread::new(
            ThreadId(1),
            "a-very-long-thread-name",
            PRI_MIN,
            std::thread::current(),
        );
        assert_eq!(t.name.as_str(), "a-very-long-thr");
        assert_eq!(t.name.len(), MAX_NAME_LEN);
    }

    #[test]
    fn new_threads_start_blocked_with_equal_priorities() {
        let t = Thread::new(ThreadId(2), "worker", 40, std::thread::current());
        assert_eq!(t.state, ThreadState::Blocked);
        assert_eq!(t.priority, 40);
        assert_eq!(t.base_priority, 40);
        assert!(t.donors.is_empty());
        assert!(t.wait_on_lock.is_none());
        t.check_magic();
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn out_of_range_priority_is_rejected() {
        let _ = Thread::new(ThreadId(3), "bad", PRI_MAX + 1, std::thread::current());
    }
}
