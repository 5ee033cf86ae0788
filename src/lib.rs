/*
 * Vireo Thread Core
 *
 * This crate is the thread scheduler and synchronization core of the Vireo
 * teaching kernel. It implements priority scheduling on a single logical CPU,
 * tick-driven sleep, counting semaphores, locks with priority donation,
 * Mesa-style condition variables, and an optional multi-level-feedback
 * priority scheme driven by a 17.14 fixed-point load average.
 *
 * Why this is important:
 * - Every blocking primitive in the kernel reduces to the scheduler's
 *   block/unblock pair and the priority-ordered ready queue implemented here
 * - The timer tick drives preemption, sleep wake-up, and the MLFQ statistics,
 *   so the tick path must stay short and must never block
 * - Priority donation prevents priority inversion when a high-priority
 *   thread waits on a lock held by a low-priority one
 *
 * The architecture-specific pieces (register save/restore, the interval
 * timer device, the page allocator) live outside this crate. The portable
 * context-switch backend in scheduler::context stands in for them: each
 * kernel thread is backed by a parked host thread, and `switch_to` is a
 * park/unpark handoff. This lets the whole core run and be tested on a
 * host OS with unchanged scheduling logic.
 */

pub mod config;
pub mod fixed_point;
pub mod intr;
pub mod scheduler;
pub mod sync;
pub mod timer;
pub mod utils;

pub use config::Config;
pub use scheduler::thread::{SpawnError, ThreadId, ThreadState};
pub use scheduler::Kernel;
pub use sync::{Condition, Lock, Semaphore};
