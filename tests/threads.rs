/*
 * Thread Lifecycle Tests
 *
 * Identity, naming, and explicit exit. The scenario bodies run inside a
 * booted kernel and report back through shared state, since a thread's own
 * view (name, id) is only observable from the thread itself.
 */

use std::sync::Arc;

use spin::Mutex;

use vireo_kernel_sched::{scheduler, Config, Kernel, Semaphore, ThreadId};

#[test]
fn the_initial_thread_is_called_main() {
    Kernel::run(Config::new(), || {
        assert_eq!(scheduler::thread_name(), "main");
        assert_eq!(scheduler::current_thread_id(), ThreadId(1));
    });
}

#[test]
fn spawned_threads_see_their_own_truncated_name() {
    Kernel::run(Config::new(), || {
        let seen: Arc<Mutex<Vec<(ThreadId, String)>>> = Arc::new(Mutex::new(Vec::new()));

        let report = seen.clone();
        let id = scheduler::spawn("worker-with-an-endless-name", 40, move || {
            report
                .lock()
                .push((scheduler::current_thread_id(), scheduler::thread_name()));
        })
        .expect("spawn failed");

        let seen = seen.lock();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0, id);
        assert_eq!(seen[0].1, "worker-with-an-");
    });
}

#[test]
fn thread_ids_grow_monotonically() {
    Kernel::run(Config::new(), || {
        let a = scheduler::spawn("first", 20, || {}).expect("spawn failed");
        let b = scheduler::spawn("second", 20, || {}).expect("spawn failed");
        assert!(a < b);
    });
}

#[test]
fn exit_thread_skips_the_rest_of_the_body() {
    Kernel::run(Config::new(), || {
        let events: Arc<Mutex<Vec<&'static str>>> = Arc::new(Mutex::new(Vec::new()));
        let done = Arc::new(Semaphore::new(0));

        let body_events = events.clone();
        let body_done = done.clone();
        scheduler::spawn("quitter", 40, move || {
            body_events.lock().push("before-exit");
            body_done.up();
            scheduler::exit_thread();
            #[allow(unreachable_code)]
            body_events.lock().push("after-exit");
        })
        .expect("spawn failed");

        done.down();
        assert_eq!(*events.lock(), vec!["before-exit"]);
    });
}

#[test]
fn spawned_threads_start_at_their_requested_priority() {
    Kernel::run(Config::new(), || {
        let seen: Arc<Mutex<Vec<i32>>> = Arc::new(Mutex::new(Vec::new()));

        let report = seen.clone();
        scheduler::spawn("ranked", 52, move || {
            report.lock().push(scheduler::priority());
        })
        .expect("spawn failed");

        assert_eq!(*seen.lock(), vec![52]);
    });
}
