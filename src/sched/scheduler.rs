/*
 * Scheduler Core
 *
 * Round-robin selection over the TCB table and ready queue, driven by a
 * global quantum counter. The core is a pure state transformation: every
 * entry point mutates table/queue/counters and returns a Dispatch value
 * describing whether a context switch is needed. The actual swap is
 * performed by the glue layer after the state lock is released, so the
 * core itself cannot fail and holds nothing across a switch.
 *
 * SCHEDULING PASS:
 * ===============
 *
 * 1. Sleep-wake sweep: promote every sleeper whose wake quantum has been
 *    reached, in ascending TID order.
 * 2. Selection: pop the ready queue from the head, silently dropping stale
 *    entries (threads blocked or terminated while queued).
 * 3. Re-enqueue: a previous thread that is still Running was preempted, not
 *    suspended; it is demoted to Ready and appended at the tail. Any other
 *    previous state means the thread took itself off CPU and is not
 *    re-queued here.
 * 4. No selectee: the current thread keeps the CPU. If it is not Running
 *    anymore the program has no runnable thread left, which a well-formed
 *    host never allows; a diagnostic is logged.
 * 5. Switch: mark the selectee Running, update `current`, and hand back the
 *    save/resume pair. A self-terminated previous thread is reaped here, and
 *    its dying context is saved into a scratch slot the table no longer owns.
 *
 * QUANTUM ACCOUNTING:
 * ==================
 *
 * The tick charges the thread that was current when the quantum boundary
 * fired, then runs the pass. `init` seeds both the global counter and the
 * host's count at 1: the host owns the first quantum.
 */

use crate::MAX_THREADS;
use crate::error::{self, UthreadError};
use crate::port::{Context, StackRegion, ThreadEntry};

use super::queue::ReadyQueue;
use super::tcb::{TcbTable, ThreadState, Tid};

/// Where the outgoing context must be saved.
pub(crate) enum SaveSlot {
    /// Into the previous thread's TCB.
    Tcb(Tid),
    /// Into the core's scratch slot; the previous thread was reaped and will
    /// never be resumed.
    Scratch,
}

/// Outcome of one scheduling pass.
pub(crate) enum Dispatch {
    /// The current thread keeps the CPU; no switch.
    Keep,
    /// Switch to `next`, saving the outgoing context into `save`.
    Switch { save: SaveSlot, next: Tid },
}

/// What the glue layer must do after `Core::terminate`.
pub(crate) enum TerminateAction {
    /// TID 0: the whole process goes down with status 0.
    ExitProcess,
    /// The caller terminated itself; run the scheduler to switch away.
    ScheduleSelf,
    /// Another thread was reaped in place; release its stack if it had one.
    Done(Option<StackRegion>),
}

/// The library-owned scheduler state: TCB table, ready queue, counters.
pub(crate) struct Core {
    pub table: TcbTable,
    pub ready: ReadyQueue,
    pub quantum_usecs: u64,
    /// Elapsed quanta since init; starts at 1 (the host's first quantum).
    pub total_quantums: u64,
    /// The one TCB in state Running.
    pub current: Tid,
    /// Save target for contexts that belong to no TCB anymore.
    scratch: Context,
    /// Stack of a self-terminated thread, parked until the next library
    /// entry runs on some other stack. The dying thread is still executing
    /// on the region when it is reaped, so it cannot go back to the provider
    /// before the switch completes.
    graveyard: Option<StackRegion>,
}

impl Core {
    /// Fresh state with TID 0 installed as the running host thread.
    pub fn new(quantum_usecs: u64) -> Self {
        let mut table = TcbTable::new();
        let host = table.tcb_mut(Tid::HOST);
        host.state = ThreadState::Running;
        host.quantums = 1;
        Self {
            table,
            ready: ReadyQueue::new(),
            quantum_usecs,
            total_quantums: 1,
            current: Tid::HOST,
            scratch: Context::zeroed(),
            graveyard: None,
        }
    }

    pub fn scratch_mut(&mut self) -> &mut Context {
        &mut self.scratch
    }

    /// Collect the parked stack of a previously self-terminated thread.
    /// Called on every mutating library entry, which by then runs on a
    /// different, live stack.
    pub fn take_graveyard(&mut self) -> Option<StackRegion> {
        self.graveyard.take()
    }

    /// Quantum boundary: charge the thread that was on CPU when it fired.
    pub fn on_tick(&mut self) {
        self.total_quantums += 1;
        self.table.tcb_mut(self.current).quantums += 1;
    }

    /// Promote every sleeper whose wake quantum has been reached.
    ///
    /// Ascending TID order; a sleeper with `sleep_until == total_quantums`
    /// wakes in this very pass and may run the quantum it wakes in.
    fn wake_sleepers(&mut self) {
        let now = self.total_quantums;
        for i in 1..MAX_THREADS {
            let tid = Tid(i);
            let tcb = self.table.tcb_mut(tid);
            if tcb.is_sleeper() && tcb.sleep_until <= now {
                tcb.sleep_until = 0;
                tcb.state = ThreadState::Ready;
                self.ready.enqueue(tid);
                log::debug!("sleeper tid {} woke at quantum {}", tid, now);
            }
        }
    }

    /// One scheduling pass. Pure over core state; the returned Dispatch
    /// tells the glue layer whether to swap contexts.
    pub fn schedule(&mut self) -> Dispatch {
        self.wake_sleepers();
        let prev = self.current;

        let selectee = loop {
            match self.ready.dequeue() {
                None => break None,
                Some(tid) => {
                    if self.table.tcb(tid).state == ThreadState::Ready {
                        break Some(tid);
                    }
                    // Blocked or terminated while queued; drop silently.
                    log::trace!("dropping stale ready-queue entry for tid {}", tid);
                }
            }
        };

        let Some(next) = selectee else {
            if self.table.tcb(prev).state != ThreadState::Running {
                // Every live thread is suspended. Unspecified territory; the
                // current context keeps executing so the host can observe the
                // diagnostic.
                log::error!(
                    "no runnable thread left; tid {} keeps the CPU in state {:?}",
                    prev,
                    self.table.tcb(prev).state
                );
            }
            return Dispatch::Keep;
        };

        if next == prev {
            // A sleep(0) self-yield can reach the head of an otherwise empty
            // queue; re-mark it Running without a switch.
            self.table.tcb_mut(prev).state = ThreadState::Running;
            return Dispatch::Keep;
        }

        // Still Running here means the timer preempted it; suspended threads
        // already chose their own target state.
        if self.table.tcb(prev).state == ThreadState::Running {
            self.table.tcb_mut(prev).state = ThreadState::Ready;
            self.ready.enqueue(prev);
        }

        self.table.tcb_mut(next).state = ThreadState::Running;
        self.current = next;
        log::debug!("dispatch: tid {} -> tid {}", prev, next);

        let save = if self.table.tcb(prev).state == ThreadState::Terminated {
            // Self-termination: the slot must be Unused before any other
            // public operation returns, and the dying context has no TCB to
            // live in. The stack is parked, not released: the thread is
            // still running on it until the swap below completes.
            self.graveyard = self.reap(prev);
            SaveSlot::Scratch
        } else {
            SaveSlot::Tcb(prev)
        };

        Dispatch::Switch { save, next }
    }

    /// Claim the lowest free slot for a new thread and queue it.
    ///
    /// The caller attaches the stack region and seeds the context through
    /// the ports; the core only manages slot state.
    pub fn spawn_slot(&mut self, entry: ThreadEntry) -> Result<Tid, UthreadError> {
        let Some(tid) = self.table.first_free() else {
            return Err(error::exhausted("no available TID"));
        };
        let tcb = self.table.tcb_mut(tid);
        tcb.reset();
        tcb.state = ThreadState::Ready;
        tcb.entry = Some(entry);
        self.ready.enqueue(tid);
        log::debug!("spawned tid {}", tid);
        Ok(tid)
    }

    /// Suspend a thread. Returns whether the caller must run the scheduler
    /// (true exactly when the current thread blocked itself).
    pub fn block(&mut self, tid: Tid) -> Result<bool, UthreadError> {
        if tid == Tid::HOST {
            return Err(error::bad_arg("invalid block request"));
        }
        let current = self.current;
        let Some(tcb) = self.table.get_mut(tid) else {
            return Err(error::bad_arg("invalid block request"));
        };
        match tcb.state {
            ThreadState::Unused => Err(error::bad_arg("invalid block request")),
            // Already suspended (including sleepers): no-op success.
            ThreadState::Blocked => Ok(false),
            _ => {
                tcb.state = ThreadState::Blocked;
                // A queued entry for a non-current thread goes stale here and
                // is dropped at selection.
                Ok(tid == current)
            }
        }
    }

    /// Wake an explicitly blocked thread. Does not cancel a sleep: a sleeper
    /// becomes Ready only through the sweep at its wake quantum.
    pub fn resume(&mut self, tid: Tid) -> Result<(), UthreadError> {
        let Some(tcb) = self.table.get_mut(tid) else {
            return Err(error::bad_arg("invalid resume request"));
        };
        if tcb.state == ThreadState::Unused {
            return Err(error::bad_arg("invalid resume request"));
        }
        if tcb.state == ThreadState::Blocked && tcb.sleep_until == 0 {
            tcb.state = ThreadState::Ready;
            // Drop any stale entry left by a block(other) so the thread
            // re-joins at the tail, once.
            self.ready.remove(tid);
            self.ready.enqueue(tid);
        }
        Ok(())
    }

    /// Park the current thread for `num_quantums` whole quanta. The caller
    /// runs the scheduler afterwards; with 0 this is a yield that becomes
    /// eligible again in the same pass.
    pub fn sleep(&mut self, num_quantums: u64) -> Result<(), UthreadError> {
        if self.current == Tid::HOST {
            return Err(error::bad_arg("main thread cannot sleep"));
        }
        let wake_at = self.total_quantums + num_quantums;
        let tcb = self.table.tcb_mut(self.current);
        tcb.sleep_until = wake_at;
        tcb.state = ThreadState::Blocked;
        Ok(())
    }

    /// Remove a thread. The action tells the glue layer whether to exit the
    /// process (TID 0), reschedule (self), or just release a stack (other).
    pub fn terminate(&mut self, tid: Tid) -> Result<TerminateAction, UthreadError> {
        let valid = self
            .table
            .get(tid)
            .is_some_and(|tcb| tcb.state != ThreadState::Unused);
        if !valid {
            return Err(error::bad_arg("invalid TID"));
        }
        if tid == Tid::HOST {
            return Ok(TerminateAction::ExitProcess);
        }
        if tid == self.current {
            self.table.tcb_mut(tid).state = ThreadState::Terminated;
            Ok(TerminateAction::ScheduleSelf)
        } else {
            // Reap in place; a stale ready-queue entry is tolerated and
            // dropped at selection.
            let region = self.reap(tid);
            Ok(TerminateAction::Done(region))
        }
    }

    /// Return a slot to Unused and take back its stack region.
    fn reap(&mut self, tid: Tid) -> Option<StackRegion> {
        debug_assert_ne!(tid, Tid::HOST);
        let tcb = self.table.tcb_mut(tid);
        let region = tcb.stack.take();
        tcb.reset();
        region
    }

    pub fn quantums_of(&self, tid: Tid) -> Result<u64, UthreadError> {
        match self.table.get(tid) {
            Some(tcb) if tcb.state != ThreadState::Unused => Ok(tcb.quantums),
            _ => Err(error::bad_arg("invalid TID")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop() {}

    /// on_tick + schedule, the way the tick entry point drives the core.
    fn tick(core: &mut Core) -> Dispatch {
        core.on_tick();
        let d = core.schedule();
        assert_invariants(core);
        d
    }

    /// The structural invariants that must hold on every scheduler exit.
    fn assert_invariants(core: &Core) {
        // Exactly one Running TCB, and it is `current`.
        let running: Vec<Tid> = core
            .table
            .iter()
            .filter(|t| t.state == ThreadState::Running)
            .map(|t| t.tid)
            .collect();
        assert_eq!(running, vec![core.current]);

        // Every Ready thread is queued exactly once; no TID twice.
        let snapshot = core.ready.snapshot();
        for tcb in core.table.iter() {
            if tcb.state == ThreadState::Ready {
                assert_eq!(
                    snapshot.iter().filter(|&&t| t == tcb.tid).count(),
                    1,
                    "ready tid {} must be queued exactly once",
                    tcb.tid
                );
            }
        }
        for &tid in &snapshot {
            assert_eq!(snapshot.iter().filter(|&&t| t == tid).count(), 1);
        }

        // Sleepers are Blocked with a nonzero wake quantum; the host never
        // sleeps.
        assert_eq!(core.table.tcb(Tid::HOST).sleep_until, 0);
        for tcb in core.table.iter() {
            if tcb.sleep_until != 0 {
                assert_eq!(tcb.state, ThreadState::Blocked);
            }
        }
    }

    #[test]
    fn test_solo_main() {
        let mut core = Core::new(100_000);
        assert_eq!(core.current, Tid(0));
        assert_eq!(core.total_quantums, 1);
        assert_eq!(core.quantums_of(Tid(0)).unwrap(), 1);
        assert_invariants(&core);

        // A tick with no other Ready thread: the counters still advance and
        // the host keeps the CPU.
        assert!(matches!(tick(&mut core), Dispatch::Keep));
        assert_eq!(core.total_quantums, 2);
        assert_eq!(core.quantums_of(Tid(0)).unwrap(), 2);
        assert_eq!(core.current, Tid(0));
    }

    #[test]
    fn test_round_robin_of_three() {
        let mut core = Core::new(100_000);
        assert_eq!(core.spawn_slot(noop).unwrap(), Tid(1));
        assert_eq!(core.spawn_slot(noop).unwrap(), Tid(2));

        let mut boundary_currents = Vec::new();
        for _ in 0..6 {
            boundary_currents.push(core.current);
            let d = tick(&mut core);
            assert!(matches!(d, Dispatch::Switch { .. }));
        }
        assert_eq!(
            boundary_currents,
            vec![Tid(0), Tid(1), Tid(2), Tid(0), Tid(1), Tid(2)]
        );
        assert_eq!(core.current, Tid(0));

        // The tick charges the outgoing thread, so the host picked up the
        // charge at ticks 1 and 4 on top of its init quantum.
        assert_eq!(core.quantums_of(Tid(0)).unwrap(), 3);
        assert_eq!(core.quantums_of(Tid(1)).unwrap(), 2);
        assert_eq!(core.quantums_of(Tid(2)).unwrap(), 2);
        assert_eq!(core.total_quantums, 7);
    }

    #[test]
    fn test_quantum_conservation_without_termination() {
        let mut core = Core::new(100_000);
        core.spawn_slot(noop).unwrap();
        core.spawn_slot(noop).unwrap();
        core.spawn_slot(noop).unwrap();

        for _ in 0..17 {
            tick(&mut core);
        }
        let live_sum: u64 = core.table.iter().map(|t| t.quantums).sum();
        assert_eq!(live_sum, core.total_quantums);
    }

    #[test]
    fn test_sleep_excludes_thread_until_wake_quantum() {
        let mut core = Core::new(100_000);
        core.spawn_slot(noop).unwrap();
        core.spawn_slot(noop).unwrap();
        tick(&mut core); // current: 1, total: 2

        assert_eq!(core.current, Tid(1));
        core.sleep(3).unwrap();
        let wake_at = core.total_quantums + 3; // 5
        assert_eq!(core.table.tcb(Tid(1)).sleep_until, wake_at);
        assert!(matches!(core.schedule(), Dispatch::Switch { .. }));
        assert_invariants(&core);

        while core.total_quantums < wake_at {
            assert_ne!(core.current, Tid(1), "sleeper selected too early");
            assert!(core.table.tcb(Tid(1)).is_sleeper());
            tick(&mut core);
        }
        // First pass at the wake quantum promoted it.
        assert_eq!(core.table.tcb(Tid(1)).state, ThreadState::Ready);
        assert_eq!(core.table.tcb(Tid(1)).sleep_until, 0);
        assert!(core.ready.contains(Tid(1)));
    }

    #[test]
    fn test_sleep_zero_yields_to_tail() {
        let mut core = Core::new(100_000);
        core.spawn_slot(noop).unwrap();
        core.spawn_slot(noop).unwrap();
        tick(&mut core); // current: 1, queue: [2, 0]

        core.sleep(0).unwrap();
        assert!(matches!(core.schedule(), Dispatch::Switch { .. }));
        assert_invariants(&core);

        // The sweep woke it in the same pass; it re-queued behind the others
        // and thread 2 got the CPU.
        assert_eq!(core.current, Tid(2));
        assert_eq!(core.ready.snapshot(), vec![Tid(0), Tid(1)]);
        assert_eq!(core.table.tcb(Tid(1)).state, ThreadState::Ready);
    }

    #[test]
    fn test_self_yield_with_empty_queue_keeps_cpu() {
        let mut core = Core::new(100_000);
        core.spawn_slot(noop).unwrap();
        tick(&mut core); // current: 1, queue: [0]

        // Leave thread 1 alone on the system.
        core.table.tcb_mut(Tid(0)).state = ThreadState::Blocked;
        core.ready.remove(Tid(0));

        core.sleep(0).unwrap();
        assert!(matches!(core.schedule(), Dispatch::Keep));
        assert_eq!(core.current, Tid(1));
        assert_eq!(core.table.tcb(Tid(1)).state, ThreadState::Running);
        assert_invariants(&core);
    }

    #[test]
    fn test_block_other_goes_stale_then_resume_appends_at_tail() {
        let mut core = Core::new(100_000);
        core.spawn_slot(noop).unwrap();
        core.spawn_slot(noop).unwrap();

        // Thread 1 is Ready and queued; blocking it leaves the entry stale.
        assert!(!core.block(Tid(1)).unwrap());
        assert_eq!(core.table.tcb(Tid(1)).state, ThreadState::Blocked);
        assert!(core.ready.contains(Tid(1)));

        // Selection drops the stale entry and never runs thread 1.
        tick(&mut core);
        assert_eq!(core.current, Tid(2));
        assert!(!core.ready.contains(Tid(1)));

        core.resume(Tid(1)).unwrap();
        assert_eq!(core.table.tcb(Tid(1)).state, ThreadState::Ready);
        let snapshot = core.ready.snapshot();
        assert_eq!(snapshot.last(), Some(&Tid(1)));
        assert_invariants(&core);
    }

    #[test]
    fn test_block_is_idempotent() {
        let mut core = Core::new(100_000);
        core.spawn_slot(noop).unwrap();
        assert!(!core.block(Tid(1)).unwrap());
        // Second block: no-op success, no state change.
        assert!(!core.block(Tid(1)).unwrap());
        assert_eq!(core.table.tcb(Tid(1)).state, ThreadState::Blocked);
        assert_eq!(core.table.tcb(Tid(1)).sleep_until, 0);
    }

    #[test]
    fn test_resume_on_ready_and_running_is_noop() {
        let mut core = Core::new(100_000);
        core.spawn_slot(noop).unwrap();
        core.spawn_slot(noop).unwrap();

        let before = core.ready.snapshot();
        core.resume(Tid(1)).unwrap();
        // A Ready thread keeps its queue position.
        assert_eq!(core.ready.snapshot(), before);

        core.resume(core.current).unwrap();
        assert_eq!(core.table.tcb(core.current).state, ThreadState::Running);
    }

    #[test]
    fn test_resume_does_not_cancel_sleep() {
        let mut core = Core::new(100_000);
        core.spawn_slot(noop).unwrap();
        core.spawn_slot(noop).unwrap();
        tick(&mut core); // current: 1

        core.sleep(4).unwrap();
        let wake_at = core.table.tcb(Tid(1)).sleep_until;
        core.schedule();

        core.resume(Tid(1)).unwrap();
        assert!(core.table.tcb(Tid(1)).is_sleeper());
        assert_eq!(core.table.tcb(Tid(1)).sleep_until, wake_at);
        assert!(!core.ready.contains(Tid(1)));
    }

    #[test]
    fn test_block_current_switches_without_reenqueue() {
        let mut core = Core::new(100_000);
        core.spawn_slot(noop).unwrap();
        core.spawn_slot(noop).unwrap();
        tick(&mut core); // current: 1

        assert!(core.block(Tid(1)).unwrap());
        assert!(matches!(core.schedule(), Dispatch::Switch { .. }));
        assert_eq!(core.current, Tid(2));
        assert!(!core.ready.contains(Tid(1)));
        assert_invariants(&core);
    }

    #[test]
    fn test_self_terminate_reaps_slot_for_reuse() {
        let mut core = Core::new(100_000);
        core.spawn_slot(noop).unwrap();
        core.spawn_slot(noop).unwrap();
        tick(&mut core); // current: 1

        assert!(matches!(
            core.terminate(Tid(1)).unwrap(),
            TerminateAction::ScheduleSelf
        ));
        let d = core.schedule();
        assert!(matches!(
            d,
            Dispatch::Switch {
                save: SaveSlot::Scratch,
                ..
            }
        ));
        assert_eq!(core.current, Tid(2));
        assert_eq!(core.table.tcb(Tid(1)).state, ThreadState::Unused);
        assert_invariants(&core);

        // First-fit hands the TID out again, with fresh accounting.
        assert_eq!(core.spawn_slot(noop).unwrap(), Tid(1));
        assert_eq!(core.quantums_of(Tid(1)).unwrap(), 0);
    }

    #[test]
    fn test_self_terminate_parks_stack_until_drained() {
        let mut core = Core::new(100_000);
        core.spawn_slot(noop).unwrap();
        core.spawn_slot(noop).unwrap();
        core.table.tcb_mut(Tid(1)).stack = Some(StackRegion::new(64));
        tick(&mut core); // current: 1

        core.terminate(Tid(1)).unwrap();
        core.schedule();
        // The dying thread was still executing on its region at switch time;
        // the next library entry collects it.
        let region = core.take_graveyard().expect("dying stack parked");
        assert_eq!(region.len(), 64);
        assert!(core.take_graveyard().is_none());
    }

    #[test]
    fn test_terminate_other_reaps_in_place() {
        let mut core = Core::new(100_000);
        core.spawn_slot(noop).unwrap();
        core.spawn_slot(noop).unwrap();

        assert!(matches!(
            core.terminate(Tid(2)).unwrap(),
            TerminateAction::Done(None)
        ));
        assert_eq!(core.table.tcb(Tid(2)).state, ThreadState::Unused);
        // The stale queue entry lingers until selection reaches it, then is
        // dropped silently.
        assert!(core.ready.contains(Tid(2)));
        tick(&mut core); // selects thread 1; the stale entry is still ahead
        tick(&mut core); // selection reaches and drops it
        assert!(!core.ready.contains(Tid(2)));
        assert_invariants(&core);
    }

    #[test]
    fn test_terminate_host_requests_process_exit() {
        let mut core = Core::new(100_000);
        assert!(matches!(
            core.terminate(Tid(0)).unwrap(),
            TerminateAction::ExitProcess
        ));
    }

    #[test]
    fn test_spawn_reuse_tolerates_stale_queue_entry() {
        let mut core = Core::new(100_000);
        core.spawn_slot(noop).unwrap();
        core.spawn_slot(noop).unwrap();
        core.terminate(Tid(2)).unwrap();

        // The reused TID inherits the stale entry's position instead of
        // queueing twice.
        assert_eq!(core.spawn_slot(noop).unwrap(), Tid(2));
        let snapshot = core.ready.snapshot();
        assert_eq!(snapshot.iter().filter(|&&t| t == Tid(2)).count(), 1);
        assert_invariants(&core);
    }

    #[test]
    fn test_no_runnable_thread_keeps_cpu() {
        let mut core = Core::new(100_000);
        core.spawn_slot(noop).unwrap();
        tick(&mut core); // current: 1, queue: [0]

        core.table.tcb_mut(Tid(0)).state = ThreadState::Blocked;
        assert!(core.block(Tid(1)).unwrap());
        // Everything is suspended: the pass reports no switch and the
        // current context keeps executing.
        assert!(matches!(core.schedule(), Dispatch::Keep));
        assert_eq!(core.current, Tid(1));
    }

    #[test]
    fn test_sleeping_sibling_rescues_blocked_current() {
        let mut core = Core::new(100_000);
        core.spawn_slot(noop).unwrap();
        core.spawn_slot(noop).unwrap();
        tick(&mut core); // current: 1

        core.sleep(1).unwrap(); // thread 1 sleeps until quantum 3
        core.schedule();
        assert_eq!(core.current, Tid(2));

        core.table.tcb_mut(Tid(0)).state = ThreadState::Blocked;
        core.ready.remove(Tid(0));

        // The quantum boundary fires, and thread 2 suspends itself before
        // the pass runs: the sweep promotes the expired sleeper in the same
        // pass and hands it the CPU.
        core.on_tick(); // total: 3
        assert!(core.block(Tid(2)).unwrap());
        assert!(matches!(core.schedule(), Dispatch::Switch { .. }));
        assert_eq!(core.current, Tid(1));
        assert_invariants(&core);
    }

    #[test]
    fn test_bad_args() {
        let mut core = Core::new(100_000);
        assert!(core.block(Tid(0)).is_err());
        assert!(core.block(Tid(MAX_THREADS)).is_err());
        assert!(core.block(Tid(7)).is_err());
        assert!(core.resume(Tid(MAX_THREADS)).is_err());
        assert!(core.resume(Tid(7)).is_err());
        assert!(core.terminate(Tid(7)).is_err());
        assert!(core.quantums_of(Tid(7)).is_err());
        assert!(core.sleep(3).is_err()); // host may not sleep
    }

    #[test]
    fn test_spawn_exhaustion() {
        let mut core = Core::new(100_000);
        for i in 1..MAX_THREADS {
            assert_eq!(core.spawn_slot(noop).unwrap(), Tid(i));
        }
        assert_eq!(
            core.spawn_slot(noop),
            Err(UthreadError::Exhausted("no available TID"))
        );
    }
}
