/*
 * Synchronization Primitives
 *
 * Counting semaphores, non-recursive locks with priority donation, and
 * Mesa-style condition variables. Everything here is expressed in terms of
 * the scheduler's block/unblock pair and the priority-ordered ready queue:
 * a semaphore parks waiters and wakes the highest-priority one, a lock is a
 * binary semaphore with an owner and donation bookkeeping, and a condition
 * variable queues one-shot semaphores.
 */

pub mod condition;
pub mod lock;
pub mod semaphore;

pub use condition::Condition;
pub use lock::Lock;
pub use semaphore::Semaphore;
