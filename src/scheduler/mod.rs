/*
 * Priority Thread Scheduler
 *
 * This module implements the thread scheduler for the Vireo kernel: a
 * strict-priority, preemptive scheduler on a single logical CPU.
 *
 * SCHEDULING MODEL:
 * ================
 *
 * - 64 priority levels (0..=63); the highest-priority ready thread always
 *   runs next. Equal priorities round-robin on a 4-tick time slice.
 * - Under the hood scheduling is cooperative: every suspension goes through
 *   reschedule(). Preemption happens at the boundary, when the timer tick
 *   asks the running thread to yield on return from the interrupt.
 * - All scheduler state lives behind one spin lock and is only touched
 *   with interrupts disabled. With a single CPU this makes every critical
 *   section atomic.
 *
 * THREAD LIFECYCLE:
 * ================
 *
 *   spawn -> Blocked -> unblock -> Ready -> scheduled -> Running
 *      Running -> yield  -> Ready
 *      Running -> block  -> Blocked -> unblock -> Ready
 *      Running -> exit   -> Dying   -> reclaimed on the next switch
 *
 * A Dying thread's record is reclaimed by the NEXT scheduling decision,
 * never by the dying thread itself: its host thread is still standing on
 * state the record owns when it hands the CPU away.
 *
 * THE IDLE THREAD:
 * ===============
 *
 * A distinguished idle thread runs when the ready queue is empty. It is
 * never on the ready queue itself: it blocks immediately after each
 * scheduling and the scheduler returns it as a special case. While idle is
 * running the only possible event is the next timer interrupt, so the idle
 * loop simply delivers one.
 */

use core::cell::RefCell;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use spin::Mutex;

pub(crate) mod context;
pub(crate) mod mlfq;
pub(crate) mod sleep;
pub mod thread;

pub use thread::{SpawnError, Thread, ThreadId, ThreadState};

use crate::config::{Config, MAX_THREADS, NICE_MAX, NICE_MIN, PRI_DEFAULT, PRI_MAX, PRI_MIN, TIME_SLICE};
use crate::fixed_point::Fixed;
use crate::intr::{self, IntrLevel, IntrState};
use crate::sync::lock::LockId;
use crate::sync::Semaphore;
use crate::timer;
use crate::utils;

/// Scheduler state proper: the thread table and every queue.
///
/// Guarded by the kernel's spin lock; accessed only with interrupts off.
/// Threads are found by linear search through the table, which is fine for
/// a teaching kernel capped at MAX_THREADS live threads.
pub(crate) struct Sched {
    /// All live thread records.
    pub(crate) threads: Vec<Thread>,

    /// Ready queue, ordered by descending priority at insertion time.
    /// Because donation can raise a queued thread's priority afterwards,
    /// consumers select the maximum at pop time instead of trusting the
    /// stored order.
    pub(crate) ready: Vec<ThreadId>,

    /// Sleeping threads, in sleep-call order; scanned on every tick.
    pub(crate) sleepers: Vec<ThreadId>,

    /// Every thread that participates in MLFQ recalculation. Excludes the
    /// idle thread, which removes itself right after boot.
    pub(crate) all: Vec<ThreadId>,

    /// Threads whose records await reclamation.
    destruction: Vec<ThreadId>,

    /// The distinguished idle thread, once it has introduced itself.
    pub(crate) idle: Option<ThreadId>,

    /// The bootstrap thread that adopted the first execution context.
    initial: ThreadId,

    /// The thread currently holding the CPU.
    pub(crate) current: ThreadId,

    /// Map from lock to its holder, maintained by lock acquire/release so
    /// the donation chain walk can follow wait_on_lock edges.
    pub(crate) lock_holders: BTreeMap<LockId, ThreadId>,

    /// System load average (MLFQ mode).
    pub(crate) load_avg: Fixed,

    next_tid: usize,
    ticks_since_yield: u32,

    // statistics
    idle_ticks: u64,
    kernel_ticks: u64,
    context_switches: u64,
}

impl Sched {
    fn new() -> Self {
        Self {
            threads: Vec::new(),
            ready: Vec::new(),
            sleepers: Vec::new(),
            all: Vec::new(),
            destruction: Vec::new(),
            idle: None,
            initial: ThreadId(0),
            current: ThreadId(0),
            lock_holders: BTreeMap::new(),
            load_avg: Fixed::ZERO,
            next_tid: 1,
            ticks_since_yield: 0,
            idle_ticks: 0,
            kernel_ticks: 0,
            context_switches: 0,
        }
    }

    fn allocate_tid(&mut self) -> usize {
        let tid = self.next_tid;
        self.next_tid += 1;
        tid
    }

    /// Look up a live thread.
    ///
    /// # Panics
    /// Panics if the id does not name a live thread; queues must never hold
    /// stale ids.
    pub(crate) fn thread(&self, id: ThreadId) -> &Thread {
        self.threads
            .iter()
            .find(|t| t.id == id)
            .unwrap_or_else(|| panic!("{id} is not a live thread"))
    }

    pub(crate) fn thread_mut(&mut self, id: ThreadId) -> &mut Thread {
        self.threads
            .iter_mut()
            .find(|t| t.id == id)
            .unwrap_or_else(|| panic!("{id} is not a live thread"))
    }

    /// Insert into the ready queue, ordered by descending priority.
    /// A new arrival goes behind existing entries of equal priority, which
    /// preserves FIFO order among peers.
    pub(crate) fn insert_ready(&mut self, id: ThreadId) {
        let priority = self.thread(id).priority;
        let pos = self
            .ready
            .iter()
            .position(|&t| self.thread(t).priority < priority)
            .unwrap_or(self.ready.len());
        self.ready.insert(pos, id);
    }

    /// Remove and return the highest-priority ready thread.
    ///
    /// Selects the maximum by current priority rather than popping the
    /// front: a donation may have raised an entry after it was inserted.
    /// The first maximum wins, keeping FIFO order among equals.
    pub(crate) fn pop_max_ready(&mut self) -> Option<ThreadId> {
        if self.ready.is_empty() {
            return None;
        }
        let mut best = 0;
        for i in 1..self.ready.len() {
            if self.thread(self.ready[i]).priority > self.thread(self.ready[best]).priority {
                best = i;
            }
        }
        Some(self.ready.remove(best))
    }

    /// Highest priority currently on the ready queue.
    pub(crate) fn max_ready_priority(&self) -> Option<i32> {
        self.ready.iter().map(|&t| self.thread(t).priority).max()
    }

    /// Re-sort the ready queue by descending priority. Stable, so FIFO
    /// order among equals survives.
    pub(crate) fn resort_ready(&mut self) {
        let mut ready = std::mem::take(&mut self.ready);
        ready.sort_by_key(|&t| core::cmp::Reverse(self.thread(t).priority));
        self.ready = ready;
    }

    /// Free the records of threads that finished since the last switch.
    fn drain_destruction(&mut self) {
        while let Some(victim) = self.destruction.pop() {
            if let Some(pos) = self.threads.iter().position(|t| t.id == victim) {
                let record = self.threads.swap_remove(pos);
                log::debug!("reclaimed thread {} ({})", record.id, record.name);
            }
        }
    }
}

/// Everything a kernel instance owns.
pub(crate) struct KernelState {
    pub(crate) sched: Mutex<Sched>,
    /// Id of the thread currently published as running; the handshake word
    /// of the context-switch protocol.
    pub(crate) running: AtomicUsize,
    /// Monotonic tick counter.
    pub(crate) ticks: AtomicU64,
    /// Set once the idle thread exists and preemption may begin.
    pub(crate) enabled: AtomicBool,
    pub(crate) intr: IntrState,
    pub(crate) config: Config,
}

/// Scheduling statistics snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedStats {
    /// Ticks that interrupted the idle thread.
    pub idle_ticks: u64,
    /// Ticks that interrupted any other thread.
    pub kernel_ticks: u64,
    /// Completed context switches.
    pub context_switches: u64,
}

struct Current {
    kernel: Arc<KernelState>,
    id: ThreadId,
}

thread_local! {
    /// Which kernel thread this host thread is backing. The portable analog
    /// of deriving the running thread from the stack pointer.
    static CURRENT: RefCell<Option<Current>> = const { RefCell::new(None) };
}

pub(crate) fn set_current(kernel: Arc<KernelState>, id: ThreadId) {
    CURRENT.with(|c| {
        let mut cur = c.borrow_mut();
        assert!(cur.is_none(), "a kernel thread is already bound to this host thread");
        *cur = Some(Current { kernel, id });
    });
}

pub(crate) fn clear_current() {
    CURRENT.with(|c| c.borrow_mut().take());
}

/// The kernel and thread id of the caller.
///
/// # Panics
/// Panics when called from a host thread that is not backing a kernel
/// thread; every public operation in this crate requires thread context.
pub(crate) fn current_ctx() -> (Arc<KernelState>, ThreadId) {
    CURRENT
        .with(|c| c.borrow().as_ref().map(|cur| (cur.kernel.clone(), cur.id)))
        .expect("not called from a kernel thread")
}

pub(crate) fn current_kernel() -> Arc<KernelState> {
    current_ctx().0
}

/// A running scheduler instance.
///
/// Booting adopts the calling host thread as the initial (`main`) thread;
/// from then on every crate operation called from that thread, or from a
/// spawned thread body, acts on this kernel.
pub struct Kernel {
    state: Arc<KernelState>,
}

impl Kernel {
    /// Initialize the threading system and start preemptive scheduling.
    ///
    /// Transforms the calling thread into the initial kernel thread at
    /// PRI_DEFAULT, then creates the idle thread and waits for it to
    /// introduce itself before returning.
    pub fn boot(config: Config) -> Kernel {
        config.validate();
        utils::logger::init();
        context::install_exit_hook();

        let state = Arc::new(KernelState {
            sched: Mutex::new(Sched::new()),
            running: AtomicUsize::new(0),
            ticks: AtomicU64::new(0),
            enabled: AtomicBool::new(false),
            intr: IntrState::new(),
            config,
        });

        // Adopt the calling thread as the initial thread.
        let main_id = {
            let mut sched = state.sched.lock();
            let id = ThreadId(sched.allocate_tid());
            let mut record = Thread::new(id, "main", PRI_DEFAULT, std::thread::current());
            record.state = ThreadState::Running;
            sched.threads.push(record);
            sched.all.push(id);
            sched.initial = id;
            sched.current = id;
            id
        };
        state.running.store(main_id.0, Ordering::SeqCst);
        set_current(state.clone(), main_id);

        log::info!(
            "thread core booting: timer {} Hz, {} scheduler",
            config.timer_freq,
            if config.mlfqs { "mlfq" } else { "priority" }
        );

        // Create the idle thread and wait for it to register itself.
        let started = Arc::new(Semaphore::new(0));
        let handshake = started.clone();
        let idle_kernel = state.clone();
        spawn("idle", PRI_MIN, move || idle_main(idle_kernel, handshake))
            .expect("could not create the idle thread");
        intr::enable();
        started.down();

        state.enabled.store(true, Ordering::SeqCst);
        log::info!("scheduler enabled, preemptive multitasking active");

        Kernel { state }
    }

    /// Boot a kernel, run `body` on the initial thread, then wait for the
    /// remaining runnable and sleeping threads to settle before tearing
    /// down. The convenience entry point used by tests and demos.
    pub fn run<R>(config: Config, body: impl FnOnce() -> R) -> R {
        let kernel = Kernel::boot(config);
        let result = body();
        kernel.drain();
        result
    }

    /// Let leftover threads finish: run the ready queue dry, delivering
    /// timer ticks so sleepers wake and MLFQ priorities keep moving.
    fn drain(&self) {
        // lowest priority so every runnable thread gets the CPU first
        // (no-op in MLFQ mode, where ticking reshuffles priorities instead)
        set_priority(PRI_MIN);
        loop {
            let (ready_empty, sleepers_empty) = {
                let sched = self.state.sched.lock();
                (sched.ready.is_empty(), sched.sleepers.is_empty())
            };
            if ready_empty && sleepers_empty {
                break;
            }
            timer::interrupt_tick();
            if !ready_empty {
                yield_now();
            }
        }
    }
}

impl Drop for Kernel {
    fn drop(&mut self) {
        self.state.enabled.store(false, Ordering::SeqCst);
        clear_current();
        log::info!("thread core shut down");
    }
}

/// Idle thread body.
///
/// Registers itself, releases the boot handshake, then settles into the
/// idle discipline: block until the ready queue empties, then deliver the
/// next timer interrupt and block again.
fn idle_main(kernel: Arc<KernelState>, started: Arc<Semaphore>) {
    {
        let mut sched = kernel.sched.lock();
        let id = sched.current;
        sched.idle = Some(id);
        // the idle thread takes no part in MLFQ accounting
        sched.all.retain(|&t| t != id);
    }
    started.up();

    loop {
        intr::disable();
        block(&kernel);
        // scheduled again: nothing is runnable, wait for the timer
        intr::enable();
        timer::interrupt_tick();
    }
}

/// Create a new kernel thread and make it runnable.
///
/// The new thread runs `body` with interrupts enabled and exits when the
/// body returns. If its priority strictly exceeds the creator's, the
/// creator yields before returning, so the newcomer runs first.
///
/// # Arguments
/// * `name` - Human-readable name, truncated to 15 bytes
/// * `priority` - Initial priority in PRI_MIN..=PRI_MAX
/// * `body` - Function executed by the new thread
///
/// # Returns
/// The new thread's id, or an error if no slot or stack was available; on
/// error no thread is registered.
pub fn spawn(
    name: &str,
    priority: i32,
    body: impl FnOnce() + Send + 'static,
) -> Result<ThreadId, SpawnError> {
    let (kernel, _) = current_ctx();
    assert!(
        (PRI_MIN..=PRI_MAX).contains(&priority),
        "priority {priority} out of range"
    );

    let id = {
        let mut sched = kernel.sched.lock();
        if sched.threads.len() >= MAX_THREADS {
            log::warn!("spawn of '{name}' failed: thread table full");
            return Err(SpawnError::TableFull);
        }
        ThreadId(sched.allocate_tid())
    };

    let thread_kernel = kernel.clone();
    let boxed: Box<dyn FnOnce() + Send + 'static> = Box::new(body);
    let join = std::thread::Builder::new()
        .name(format!("vireo-{name}"))
        .spawn(move || context::trampoline(thread_kernel, id, boxed));
    let join = match join {
        Ok(join) => join,
        Err(err) => {
            log::error!("spawn of '{name}' failed: {err}");
            return Err(SpawnError::NoStack);
        }
    };
    let host = join.thread().clone();
    drop(join); // detach: lifetime is managed by the scheduler

    {
        let mut sched = kernel.sched.lock();
        sched.threads.push(Thread::new(id, name, priority, host));
        sched.all.push(id);
    }
    log::debug!("created thread {id} ({name}) at priority {priority}");
    unblock(&kernel, id);

    // preemption on create
    let preempt = {
        let sched = kernel.sched.lock();
        match sched.max_ready_priority() {
            Some(head) => head > sched.thread(sched.current).priority,
            None => false,
        }
    };
    if preempt {
        yield_now();
    }

    Ok(id)
}

/// Yield the CPU, staying runnable.
///
/// The current thread goes back on the ready queue behind its priority
/// peers and the scheduler picks again; it may pick the caller right back.
pub fn yield_now() {
    let (kernel, _) = current_ctx();
    if !kernel.enabled.load(Ordering::SeqCst) {
        return;
    }
    assert!(!intr::in_handler(), "cannot yield inside the interrupt handler");

    let old = intr::disable();
    {
        let mut sched = kernel.sched.lock();
        let cur = sched.current;
        if Some(cur) != sched.idle {
            sched.insert_ready(cur);
        }
    }
    reschedule(&kernel, ThreadState::Ready);
    intr::set_level(old);
}

/// Deschedule and destroy the current thread. Never returns.
///
/// The record is reclaimed by the next scheduling decision made by another
/// thread.
///
/// # Panics
/// Panics if called by the initial or idle thread, or from the interrupt
/// handler.
pub fn exit_thread() -> ! {
    let (kernel, id) = current_ctx();
    assert!(!intr::in_handler(), "cannot exit inside the interrupt handler");
    {
        let sched = kernel.sched.lock();
        assert!(id != sched.initial, "the initial thread may not exit");
        assert!(Some(id) != sched.idle, "the idle thread may not exit");
    }
    context::begin_exit()
}

/// Id of the running thread.
pub fn current_thread_id() -> ThreadId {
    let (kernel, id) = current_ctx();
    // validate the record on every lookup, like the stack-pointer
    // derivation does on the real machine
    kernel.sched.lock().thread(id).check_magic();
    id
}

/// Name of the running thread.
pub fn thread_name() -> String {
    let (kernel, id) = current_ctx();
    let sched = kernel.sched.lock();
    sched.thread(id).name.as_str().to_owned()
}

/// Effective priority of the running thread.
pub fn priority() -> i32 {
    let (kernel, id) = current_ctx();
    kernel.sched.lock().thread(id).priority
}

/// Set the running thread's base priority.
///
/// The effective priority becomes the maximum of the new base and any
/// donations still in effect. If the thread no longer has the highest
/// priority it yields immediately. Ignored in MLFQ mode, where the kernel
/// owns all priorities.
pub fn set_priority(new_priority: i32) {
    let (kernel, id) = current_ctx();
    if kernel.config.mlfqs {
        return;
    }
    assert!(
        (PRI_MIN..=PRI_MAX).contains(&new_priority),
        "priority {new_priority} out of range"
    );

    let old = intr::disable();
    let demoted = {
        let mut sched = kernel.sched.lock();
        let donor_max = {
            let t = sched.thread(id);
            t.donors.iter().map(|&d| sched.thread(d).priority).max()
        };
        let t = sched.thread_mut(id);
        t.base_priority = new_priority;
        t.priority = donor_max.map_or(new_priority, |m| m.max(new_priority));
        let effective = t.priority;
        sched.max_ready_priority().is_some_and(|head| effective < head)
    };
    intr::set_level(old);

    if demoted {
        yield_now();
    }
}

/// Nice value of the running thread.
pub fn nice() -> i32 {
    let (kernel, id) = current_ctx();
    kernel.sched.lock().thread(id).nice
}

/// Set the running thread's nice value (MLFQ mode).
///
/// Recomputes the thread's priority immediately and yields if it is no
/// longer the highest.
pub fn set_nice(nice: i32) {
    let (kernel, id) = current_ctx();
    assert!(
        (NICE_MIN..=NICE_MAX).contains(&nice),
        "nice value {nice} out of range"
    );

    let old = intr::disable();
    let demoted = {
        let mut sched = kernel.sched.lock();
        let t = sched.thread_mut(id);
        t.nice = nice;
        if kernel.config.mlfqs {
            let recomputed = mlfq::priority_for(t.recent_cpu, nice);
            t.priority = recomputed;
            t.base_priority = recomputed;
        }
        let effective = sched.thread(id).priority;
        sched.max_ready_priority().is_some_and(|head| effective < head)
    };
    intr::set_level(old);

    if demoted {
        yield_now();
    }
}

/// 100 times the system load average, rounded to nearest.
pub fn load_avg_x100() -> i32 {
    let (kernel, _) = current_ctx();
    let old = intr::disable();
    let value = kernel.sched.lock().load_avg.mul_int(100).to_int_round();
    intr::set_level(old);
    value
}

/// 100 times the running thread's recent_cpu, rounded to nearest.
pub fn recent_cpu_x100() -> i32 {
    let (kernel, id) = current_ctx();
    let old = intr::disable();
    let value = kernel
        .sched
        .lock()
        .thread(id)
        .recent_cpu
        .mul_int(100)
        .to_int_round();
    intr::set_level(old);
    value
}

/// Snapshot of the scheduling statistics.
pub fn stats() -> SchedStats {
    let (kernel, _) = current_ctx();
    let sched = kernel.sched.lock();
    SchedStats {
        idle_ticks: sched.idle_ticks,
        kernel_ticks: sched.kernel_ticks,
        context_switches: sched.context_switches,
    }
}

/// Block the current thread until some other thread unblocks it.
///
/// The caller must have placed the thread on a waiter set first, and must
/// hold interrupts off so the two steps are atomic.
pub(crate) fn block(kernel: &Arc<KernelState>) {
    assert!(!intr::in_handler(), "cannot block inside the interrupt handler");
    assert!(
        intr::level_of(kernel) == IntrLevel::Off,
        "block requires interrupts off"
    );
    reschedule(kernel, ThreadState::Blocked);
}

/// Transition a blocked thread to ready.
///
/// Never preempts: the caller decides whether to yield afterwards, which
/// lets it atomically unblock a thread and update other state first.
///
/// # Panics
/// Panics if the thread is not blocked.
pub(crate) fn unblock(kernel: &Arc<KernelState>, id: ThreadId) {
    let old = intr::disable();
    {
        let mut sched = kernel.sched.lock();
        {
            let t = sched.thread_mut(id);
            t.check_magic();
            assert!(
                t.state == ThreadState::Blocked,
                "unblock on {id} in state {:?}",
                t.state
            );
            t.state = ThreadState::Ready;
        }
        sched.insert_ready(id);
    }
    intr::set_level(old);
}

/// Record one timer tick against the scheduler: statistics, MLFQ cadences,
/// and time-slice enforcement. Runs in the interrupt handler.
pub(crate) fn note_tick(kernel: &Arc<KernelState>, now: u64) {
    let expired = {
        let mut sched = kernel.sched.lock();
        if Some(sched.current) == sched.idle {
            sched.idle_ticks += 1;
        } else {
            sched.kernel_ticks += 1;
        }

        if kernel.config.mlfqs {
            mlfq::on_tick(&mut sched, kernel.config.timer_freq, now);
        }

        sched.ticks_since_yield += 1;
        sched.ticks_since_yield >= TIME_SLICE
    };

    if expired && kernel.enabled.load(Ordering::SeqCst) {
        intr::yield_on_return();
    }
}

/// Switch to the next thread.
///
/// Preconditions: interrupts off; the caller has already queued the current
/// thread wherever its new state says it belongs (ready queue, waiter set,
/// sleep list, or nowhere for Dying).
pub(crate) fn reschedule(kernel: &Arc<KernelState>, new_state: ThreadState) {
    debug_assert!(intr::level_of(kernel) == IntrLevel::Off);

    let mut sched = kernel.sched.lock();
    sched.drain_destruction();

    let prev = sched.current;
    {
        let t = sched.thread_mut(prev);
        t.check_magic();
        debug_assert!(t.state == ThreadState::Running);
        t.state = new_state;
    }

    let next = sched
        .pop_max_ready()
        .or(sched.idle)
        .expect("no runnable thread and no idle thread");
    {
        let t = sched.thread_mut(next);
        t.check_magic();
        t.state = ThreadState::Running;
    }
    sched.current = next;
    sched.ticks_since_yield = 0;

    if prev == next {
        return;
    }
    sched.context_switches += 1;

    let prev_dying = new_state == ThreadState::Dying;
    if prev_dying && prev != sched.initial {
        sched.destruction.push(prev);
    }
    let next_host = sched.thread(next).host.clone();
    drop(sched); // never hold the scheduler lock across the handoff

    context::switch_to(kernel, prev, next, next_host, prev_dying);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sched_with(priorities: &[(usize, i32)]) -> Sched {
        let mut sched = Sched::new();
        for &(id, priority) in priorities {
            sched
                .threads
                .push(Thread::new(ThreadId(id), "t", priority, std::thread::current()));
        }
        sched
    }

    #[test]
    fn ready_queue_orders_by_descending_priority() {
        let mut sched = sched_with(&[(1, 10), (2, 30), (3, 20)]);
        for id in [1, 2, 3] {
            sched.insert_ready(ThreadId(id));
        }
        assert_eq!(sched.pop_max_ready(), Some(ThreadId(2)));
        assert_eq!(sched.pop_max_ready(), Some(ThreadId(3)));
        assert_eq!(sched.pop_max_ready(), Some(ThreadId(1)));
        assert_eq!(sched.pop_max_ready(), None);
    }

    #[test]
    fn equal_priorities_keep_fifo_order() {
        let mut sched = sched_with(&[(1, 20), (2, 20), (3, 20)]);
        for id in [1, 2, 3] {
            sched.insert_ready(ThreadId(id));
        }
        assert_eq!(sched.pop_max_ready(), Some(ThreadId(1)));
        assert_eq!(sched.pop_max_ready(), Some(ThreadId(2)));
        assert_eq!(sched.pop_max_ready(), Some(ThreadId(3)));
    }

    #[test]
    fn pop_selects_max_even_after_priority_changed_in_place() {
        let mut sched = sched_with(&[(1, 10), (2, 20)]);
        sched.insert_ready(ThreadId(1));
        sched.insert_ready(ThreadId(2));
        // a donation raises thread 1 while it sits queued behind thread 2
        sched.thread_mut(ThreadId(1)).priority = 50;
        assert_eq!(sched.pop_max_ready(), Some(ThreadId(1)));
        assert_eq!(sched.pop_max_ready(), Some(ThreadId(2)));
    }

    #[test]
    fn resort_is_stable_for_equal_priorities() {
        let mut sched = sched_with(&[(1, 20), (2, 40), (3, 20)]);
        for id in [1, 2, 3] {
            sched.insert_ready(ThreadId(id));
        }
        // queue is [2, 1, 3] after ordered inserts; demoting 2 to the same
        // priority must keep the stored sequence, not shuffle peers
        sched.thread_mut(ThreadId(2)).priority = 20;
        sched.resort_ready();
        assert_eq!(sched.ready, vec![ThreadId(2), ThreadId(1), ThreadId(3)]);
    }

    #[test]
    fn max_ready_priority_reflects_current_values() {
        let mut sched = sched_with(&[(1, 5), (2, 15)]);
        assert_eq!(sched.max_ready_priority(), None);
        sched.insert_ready(ThreadId(1));
        sched.insert_ready(ThreadId(2));
        assert_eq!(sched.max_ready_priority(), Some(15));
    }
}
