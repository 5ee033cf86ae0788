/*
 * Semaphore and Condition Variable Tests
 *
 * Semaphores wake their highest-priority waiter regardless of arrival
 * order; condition variables deliver signals the same way and carry Mesa
 * semantics, so woken waiters re-check their predicate under the lock.
 */

use std::sync::Arc;

use spin::Mutex;

use vireo_kernel_sched::{scheduler, timer, Condition, Config, Kernel, Lock, Semaphore};

type Trace = Arc<Mutex<Vec<i32>>>;

fn trace() -> Trace {
    Arc::new(Mutex::new(Vec::new()))
}

#[test]
fn semaphore_wakes_waiters_in_priority_order() {
    Kernel::run(Config::new(), || {
        let sema = Arc::new(Semaphore::new(0));
        let events = trace();

        // five waiters arrive in ascending priority order
        for priority in [10, 20, 30, 40, 50] {
            let sema = sema.clone();
            let events = events.clone();
            scheduler::spawn("waiter", priority, move || {
                sema.down();
                events.lock().push(priority);
            })
            .expect("spawn failed");
        }
        // let the low-priority waiters reach the semaphore too
        timer::sleep(1);
        assert_eq!(sema.waiter_count(), 5);

        for _ in 0..5 {
            sema.up();
        }
        // the two waiters below our priority are runnable but not yet run
        timer::sleep(1);

        assert_eq!(*events.lock(), vec![50, 40, 30, 20, 10]);
    });
}

#[test]
fn semaphore_ping_pong() {
    Kernel::run(Config::new(), || {
        let ours = Arc::new(Semaphore::new(0));
        let theirs = Arc::new(Semaphore::new(0));

        {
            let (ours, theirs) = (ours.clone(), theirs.clone());
            scheduler::spawn("pong", 31, move || {
                for _ in 0..10 {
                    ours.down();
                    theirs.up();
                }
            })
            .expect("spawn failed");
        }

        for _ in 0..10 {
            ours.up();
            theirs.down();
        }
        assert_eq!(ours.value(), 0);
        assert_eq!(theirs.value(), 0);
    });
}

#[test]
fn try_down_never_blocks() {
    Kernel::run(Config::new(), || {
        let sema = Semaphore::new(1);
        assert!(sema.try_down());
        assert!(!sema.try_down());
        sema.up();
        assert!(sema.try_down());
    });
}

#[test]
fn uncontended_up_then_down_leaves_the_value_unchanged() {
    Kernel::run(Config::new(), || {
        let sema = Semaphore::new(3);
        sema.up();
        sema.down();
        assert_eq!(sema.value(), 3);
    });
}

#[test]
fn condition_signals_highest_priority_waiter_first() {
    Kernel::run(Config::new(), || {
        let lock = Arc::new(Lock::new());
        let cond = Arc::new(Condition::new());
        let events = trace();

        for priority in [10, 25, 50] {
            let (lock, cond, events) = (lock.clone(), cond.clone(), events.clone());
            scheduler::spawn("waiter", priority, move || {
                lock.acquire();
                cond.wait(&lock);
                events.lock().push(priority);
                lock.release();
            })
            .expect("spawn failed");
        }
        timer::sleep(1);
        assert_eq!(cond.waiter_count(), 3);

        for _ in 0..3 {
            lock.acquire();
            cond.signal(&lock);
            lock.release();
        }
        timer::sleep(1);

        assert_eq!(*events.lock(), vec![50, 25, 10]);
        assert_eq!(cond.waiter_count(), 0);
    });
}

#[test]
fn broadcast_wakes_every_waiter() {
    Kernel::run(Config::new(), || {
        let lock = Arc::new(Lock::new());
        let cond = Arc::new(Condition::new());
        let events = trace();

        for priority in [12, 28, 44] {
            let (lock, cond, events) = (lock.clone(), cond.clone(), events.clone());
            scheduler::spawn("waiter", priority, move || {
                lock.acquire();
                cond.wait(&lock);
                events.lock().push(priority);
                lock.release();
            })
            .expect("spawn failed");
        }
        timer::sleep(1);

        lock.acquire();
        cond.broadcast(&lock);
        lock.release();
        timer::sleep(1);

        assert_eq!(*events.lock(), vec![44, 28, 12]);
    });
}

#[test]
fn mesa_waiters_recheck_their_predicate() {
    Kernel::run(Config::new(), || {
        let lock = Arc::new(Lock::new());
        let cond = Arc::new(Condition::new());
        let queue: Arc<Mutex<Vec<i32>>> = Arc::new(Mutex::new(Vec::new()));
        let consumed = trace();

        {
            let (lock, cond, queue, consumed) =
                (lock.clone(), cond.clone(), queue.clone(), consumed.clone());
            scheduler::spawn("consumer", 40, move || {
                lock.acquire();
                // Mesa discipline: the signal is a hint, not a handoff
                while queue.lock().is_empty() {
                    cond.wait(&lock);
                }
                let item = queue.lock().pop().expect("predicate held");
                consumed.lock().push(item);
                lock.release();
            })
            .expect("spawn failed");
        }

        lock.acquire();
        queue.lock().push(7);
        cond.signal(&lock);
        lock.release();
        timer::sleep(1);

        assert_eq!(*consumed.lock(), vec![7]);
    });
}

#[test]
fn semaphore_value_never_observed_negative() {
    Kernel::run(Config::new(), || {
        let sema = Arc::new(Semaphore::new(0));

        {
            let sema = sema.clone();
            scheduler::spawn("taker", 45, move || {
                sema.down();
            })
            .expect("spawn failed");
        }
        // the taker is parked; value stays at zero, not below
        assert_eq!(sema.value(), 0);
        assert_eq!(sema.waiter_count(), 1);

        sema.up();
        timer::sleep(1);
        assert_eq!(sema.value(), 0);
        assert_eq!(sema.waiter_count(), 0);
    });
}
