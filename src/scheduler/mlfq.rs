/*
 * Multi-Level Feedback Queue Recalculation
 *
 * In MLFQ mode the kernel owns every thread's priority and recomputes it
 * from two exponentially decaying statistics:
 *
 *     priority   = PRI_MAX - recent_cpu/4 - nice*2      (clamped)
 *     recent_cpu = (2*load_avg)/(2*load_avg + 1) * recent_cpu + nice
 *     load_avg   = (59/60)*load_avg + (1/60)*ready_threads
 *
 * All three run in 17.14 fixed point; the tick handler must not touch
 * floating point.
 *
 * Cadence: the running thread's recent_cpu grows by one every tick;
 * load_avg and every recent_cpu decay once per second; priorities are
 * recomputed every fourth tick, and the ready queue is re-sorted right
 * after so the queue order matches the new priorities.
 */

use crate::config::{PRI_MAX, PRI_MIN, TIME_SLICE};
use crate::fixed_point::Fixed;
use crate::scheduler::Sched;

/// Compute a thread's MLFQ priority, clamped to the valid range.
pub(crate) fn priority_for(recent_cpu: Fixed, nice: i32) -> i32 {
    (Fixed::from_int(PRI_MAX) - recent_cpu.div_int(4))
        .sub_int(nice * 2)
        .to_int_round()
        .clamp(PRI_MIN, PRI_MAX)
}

/// One tick of MLFQ bookkeeping. Called from the tick handler with the
/// scheduler lock held.
pub(crate) fn on_tick(sched: &mut Sched, timer_freq: u32, now: u64) {
    bump_recent_cpu(sched);

    if now % u64::from(timer_freq) == 0 {
        recalculate_load_avg(sched);
        recalculate_recent_cpu(sched);
    }
    if now % u64::from(TIME_SLICE) == 0 {
        recalculate_priorities(sched);
        sched.resort_ready();
    }
}

/// Charge the current tick to the running thread.
fn bump_recent_cpu(sched: &mut Sched) {
    let cur = sched.current;
    if Some(cur) == sched.idle {
        return;
    }
    let t = sched.thread_mut(cur);
    t.recent_cpu = t.recent_cpu.add_int(1);
}

/// Once per second: fold the ready-thread count into the load average.
fn recalculate_load_avg(sched: &mut Sched) {
    let mut ready_threads = sched.ready.len() as i32;
    if Some(sched.current) != sched.idle {
        ready_threads += 1;
    }
    sched.load_avg = next_load_avg(sched.load_avg, ready_threads);
    log::debug!("load_avg now {}", sched.load_avg);
}

pub(crate) fn next_load_avg(load_avg: Fixed, ready_threads: i32) -> Fixed {
    Fixed::from_int(59).div_int(60).mul(load_avg)
        + Fixed::from_int(1).div_int(60).mul_int(ready_threads)
}

/// Once per second: decay every thread's recent_cpu toward its nice value.
fn recalculate_recent_cpu(sched: &mut Sched) {
    let load_avg = sched.load_avg;
    for id in sched.all.clone() {
        let t = sched.thread_mut(id);
        t.recent_cpu = next_recent_cpu(t.recent_cpu, load_avg, t.nice);
    }
}

pub(crate) fn next_recent_cpu(recent_cpu: Fixed, load_avg: Fixed, nice: i32) -> Fixed {
    let twice_load = load_avg.mul_int(2);
    let decay = twice_load.div(twice_load.add_int(1));
    decay.mul(recent_cpu).add_int(nice)
}

/// Every fourth tick: recompute every thread's priority from its
/// statistics. In this mode base and effective priority are the same
/// thing; donation is not in play.
fn recalculate_priorities(sched: &mut Sched) {
    for id in sched.all.clone() {
        let t = sched.thread_mut(id);
        let priority = priority_for(t.recent_cpu, t.nice);
        t.priority = priority;
        t.base_priority = priority;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_thread_at_nice_zero_gets_pri_max() {
        assert_eq!(priority_for(Fixed::ZERO, 0), PRI_MAX);
    }

    #[test]
    fn priority_falls_with_recent_cpu_and_nice() {
        assert_eq!(priority_for(Fixed::from_int(40), 0), PRI_MAX - 10);
        assert_eq!(priority_for(Fixed::ZERO, 10), PRI_MAX - 20);
        assert_eq!(priority_for(Fixed::from_int(40), 10), PRI_MAX - 30);
    }

    #[test]
    fn priority_clamps_at_both_ends() {
        assert_eq!(priority_for(Fixed::from_int(4000), 20), PRI_MIN);
        assert_eq!(priority_for(Fixed::ZERO, -20), PRI_MAX);
    }

    #[test]
    fn load_avg_moves_a_sixtieth_toward_the_ready_count() {
        // from zero load with 60 ready threads, one step lands on exactly 1
        let one_step = next_load_avg(Fixed::ZERO, 60);
        assert_eq!(one_step.to_int_round(), 1);

        // with no ready threads the load decays geometrically
        let decayed = next_load_avg(Fixed::from_int(60), 0);
        assert_eq!(decayed.to_int_round(), 59);
    }

    #[test]
    fn recent_cpu_decay_shrinks_under_low_load() {
        // load_avg = 1 gives decay 2/3
        let load = Fixed::from_int(1);
        let next = next_recent_cpu(Fixed::from_int(60), load, 0);
        assert_eq!(next.to_int_round(), 40);
    }

    #[test]
    fn recent_cpu_folds_in_nice() {
        let next = next_recent_cpu(Fixed::ZERO, Fixed::ZERO, 5);
        assert_eq!(next.to_int(), 5);
    }

}
