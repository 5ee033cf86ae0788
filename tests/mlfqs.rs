/*
 * MLFQ Scheduler Tests
 *
 * With mlfqs enabled the kernel recomputes every priority from recent_cpu
 * and nice on a fixed cadence, and user-set priorities are ignored. The
 * tests drive the timer by hand, so every recomputation boundary lands on
 * a known tick.
 */

use vireo_kernel_sched::config::{PRI_DEFAULT, PRI_MIN, TIME_SLICE};
use vireo_kernel_sched::{scheduler, timer, Config, Kernel};

fn mlfq_config(timer_freq: u32) -> Config {
    Config {
        timer_freq,
        mlfqs: true,
    }
}

#[test]
fn compute_bound_priority_decays_to_the_floor() {
    // 1000 Hz so a full second of priority decay happens before the first
    // recent_cpu decay boundary
    Kernel::run(mlfq_config(1000), || {
        let mut samples = Vec::new();
        for tick in 1..=996u64 {
            timer::interrupt_tick();
            if tick % u64::from(TIME_SLICE) == 0 {
                samples.push(scheduler::priority());
            }
        }

        assert!(samples[0] >= 60, "first sample {} too low", samples[0]);
        for pair in samples.windows(2) {
            assert!(pair[1] <= pair[0], "priority rose from {} to {}", pair[0], pair[1]);
        }
        assert_eq!(*samples.last().expect("samples recorded"), PRI_MIN);
    });
}

#[test]
fn recent_cpu_decays_at_the_second_boundary() {
    Kernel::run(mlfq_config(1000), || {
        for _ in 0..996 {
            timer::interrupt_tick();
        }
        let before = scheduler::recent_cpu_x100();
        assert!(before >= 99_000, "charged {before} for 996 ticks");

        // crossing tick 1000 folds in the decay factor
        for _ in 0..8 {
            timer::interrupt_tick();
        }
        let after = scheduler::recent_cpu_x100();
        assert!(
            after < before / 2,
            "recent_cpu {after} did not decay (was {before})"
        );
    });
}

#[test]
fn recent_cpu_charges_the_running_thread_per_tick() {
    Kernel::run(mlfq_config(100), || {
        assert_eq!(scheduler::recent_cpu_x100(), 0);
        for _ in 0..10 {
            timer::interrupt_tick();
        }
        assert_eq!(scheduler::recent_cpu_x100(), 1000);
    });
}

#[test]
fn load_average_follows_one_running_thread() {
    Kernel::run(mlfq_config(100), || {
        assert_eq!(scheduler::load_avg_x100(), 0);

        for _ in 0..100 {
            timer::interrupt_tick();
        }
        assert_eq!(scheduler::load_avg_x100(), 2);

        for _ in 0..100 {
            timer::interrupt_tick();
        }
        assert_eq!(scheduler::load_avg_x100(), 3);
    });
}

#[test]
fn set_priority_is_ignored_in_mlfq_mode() {
    Kernel::run(mlfq_config(100), || {
        scheduler::set_priority(5);
        assert_eq!(scheduler::priority(), PRI_DEFAULT);
    });
}

#[test]
fn nice_biases_the_computed_priority() {
    Kernel::run(mlfq_config(100), || {
        assert_eq!(scheduler::nice(), 0);
        scheduler::set_nice(10);
        assert_eq!(scheduler::nice(), 10);
        // recent_cpu is still zero: PRI_MAX - 0 - 2*10
        assert_eq!(scheduler::priority(), 63 - 20);

        scheduler::set_nice(-20);
        assert_eq!(scheduler::priority(), 63);
    });
}

#[test]
fn niced_down_thread_loses_the_cpu_to_its_peer() {
    Kernel::run(mlfq_config(100), || {
        let order = std::sync::Arc::new(spin::Mutex::new(Vec::new()));

        {
            let order = order.clone();
            scheduler::spawn("greedy", PRI_DEFAULT, move || {
                scheduler::set_nice(20);
                order.lock().push("greedy");
            })
            .expect("spawn failed");
        }
        {
            let order = order.clone();
            scheduler::spawn("modest", PRI_DEFAULT, move || {
                order.lock().push("modest");
            })
            .expect("spawn failed");
        }

        // sleep so both peers run; greedy niced itself below modest
        timer::sleep(2);
        assert_eq!(*order.lock(), vec!["modest", "greedy"]);
    });
}
