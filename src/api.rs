/*
 * Public Operations & Interrupt Glue
 *
 * The seven thread-library operations plus the quantum-tick entry point.
 * Each operation follows the same discipline:
 *
 * 1. Mask the timer, saving the prior mask so nesting composes.
 * 2. Take the state lock and run the state transformation.
 * 3. If the transformation suspended the caller, drop the lock and perform
 *    the context switch through the ports.
 * 4. Restore the prior mask on the way out. A thread that was switched away
 *    under the mask resumes under it and unmasks in its own epilogue here.
 *
 * Errors are reported on stderr before returning; see `error`.
 */

use crate::error::{self, UthreadError};
use crate::port::{Ports, ThreadEntry};
use crate::sched::{self, Tid, scheduler::Core, scheduler::TerminateAction};
use crate::{MAX_THREADS, port};

fn not_initialized() -> UthreadError {
    error::bad_arg("thread library not initialized")
}

/// Bracket `f` in a timer-masked critical section, save/restore style.
fn with_timer_masked<R>(f: impl FnOnce() -> R) -> R {
    match sched::ports() {
        Some(ports) => {
            let prior = ports.timer.lock().set_masked(true);
            let out = f();
            ports.timer.lock().set_masked(prior);
            out
        }
        // Before init there is no timer to mask.
        None => f(),
    }
}

/// Initialize the library with the default virtual port set.
///
/// Quanta elapse when the embedder calls [`tick`]; hosts with a real
/// periodic timer and context primitive use [`init_with_ports`].
pub fn init(quantum_usecs: u64) -> Result<(), UthreadError> {
    init_with_ports(quantum_usecs, port::virt::ports())
}

/// Initialize the library with caller-supplied platform collaborators.
///
/// Sets up TID 0 as the running host thread owning the first quantum, then
/// arms the periodic timer. Fails with a `BadArg` diagnostic on a zero
/// quantum or on repeated initialization; a timer that cannot be armed is a
/// system error and fatal.
pub fn init_with_ports(quantum_usecs: u64, ports: Ports) -> Result<(), UthreadError> {
    if quantum_usecs == 0 {
        return Err(error::bad_arg("quantum must be positive"));
    }
    if sched::PORTS.get().is_some() {
        return Err(error::bad_arg("thread library already initialized"));
    }
    let ports = sched::PORTS.call_once(move || ports);

    let prior = ports.timer.lock().set_masked(true);
    let core = Core::new(quantum_usecs);
    if let Err(msg) = ports.timer.lock().arm(core.quantum_usecs) {
        error::fatal(msg);
    }
    *sched::STATE.lock() = Some(core);
    ports.timer.lock().set_masked(prior);

    log::info!(
        "thread library initialized: {}us quantum, {} slots",
        quantum_usecs,
        MAX_THREADS
    );
    Ok(())
}

/// Create a thread running `entry` on its own fixed-size stack.
///
/// Allocates the lowest free TID >= 1. The new thread is Ready at the tail
/// of the queue; its context is seeded so the first dispatch enters `entry`,
/// and a return from `entry` terminates the thread.
pub fn spawn(entry: ThreadEntry) -> Result<Tid, UthreadError> {
    with_timer_masked(|| {
        let mut guard = sched::STATE.lock();
        let core = guard.as_mut().ok_or_else(not_initialized)?;
        let ports = sched::ports().ok_or_else(not_initialized)?;
        sched::drain_graveyard(core);

        let Some(mut region) = ports.stacks.lock().allocate() else {
            return Err(error::exhausted("no stack region available"));
        };
        let tid = match core.spawn_slot(entry) {
            Ok(tid) => tid,
            Err(err) => {
                ports.stacks.lock().release(region);
                return Err(err);
            }
        };

        let stack_top = region.top();
        let tcb = core.table.tcb_mut(tid);
        ports
            .context
            .prepare(&mut tcb.context, stack_top, sched::thread_start);
        tcb.stack = Some(region);
        Ok(tid)
    })
}

/// Terminate a thread.
///
/// TID 0 takes the whole process down with status 0. Terminating the caller
/// switches to the next ready thread and frees the slot on the way out;
/// terminating another thread frees its slot in place.
pub fn terminate(tid: Tid) -> Result<(), UthreadError> {
    with_timer_masked(|| {
        let mut guard = sched::STATE.lock();
        let core = guard.as_mut().ok_or_else(not_initialized)?;
        sched::drain_graveyard(core);
        match core.terminate(tid)? {
            TerminateAction::ExitProcess => {
                log::info!("main thread terminated; exiting");
                std::process::exit(0);
            }
            TerminateAction::ScheduleSelf => {
                let plan = sched::plan_pass(core);
                drop(guard);
                sched::finish_pass(plan);
                Ok(())
            }
            TerminateAction::Done(region) => {
                drop(guard);
                if let Some(region) = region {
                    if let Some(ports) = sched::ports() {
                        ports.stacks.lock().release(region);
                    }
                }
                Ok(())
            }
        }
    })
}

/// Suspend a thread until somebody resumes it.
///
/// Blocking the caller yields the CPU immediately; blocking another thread
/// just flips its state and lets the selection filter drop its queue entry.
/// Blocking an already-blocked thread is a no-op.
pub fn block(tid: Tid) -> Result<(), UthreadError> {
    with_timer_masked(|| {
        let mut guard = sched::STATE.lock();
        let core = guard.as_mut().ok_or_else(not_initialized)?;
        sched::drain_graveyard(core);
        if core.block(tid)? {
            let plan = sched::plan_pass(core);
            drop(guard);
            sched::finish_pass(plan);
        }
        Ok(())
    })
}

/// Make an explicitly blocked thread Ready again, at the queue tail.
///
/// Does not cancel a sleep; a sleeper wakes only when its quantum arrives.
/// Resuming a Ready or Running thread is a no-op.
pub fn resume(tid: Tid) -> Result<(), UthreadError> {
    with_timer_masked(|| {
        let mut guard = sched::STATE.lock();
        let core = guard.as_mut().ok_or_else(not_initialized)?;
        sched::drain_graveyard(core);
        core.resume(tid)
    })
}

/// Park the calling thread for `num_quantums` whole quanta.
///
/// The host thread (TID 0) may not sleep. `sleep(0)` yields the rest of the
/// current quantum.
pub fn sleep(num_quantums: u64) -> Result<(), UthreadError> {
    with_timer_masked(|| {
        let mut guard = sched::STATE.lock();
        let core = guard.as_mut().ok_or_else(not_initialized)?;
        sched::drain_graveyard(core);
        core.sleep(num_quantums)?;
        let plan = sched::plan_pass(core);
        drop(guard);
        sched::finish_pass(plan);
        Ok(())
    })
}

/// TID of the calling thread.
pub fn get_tid() -> Result<Tid, UthreadError> {
    with_timer_masked(|| {
        sched::STATE
            .lock()
            .as_ref()
            .map(|core| core.current)
            .ok_or_else(not_initialized)
    })
}

/// Quanta elapsed since `init`, the initial host quantum included. 0 before
/// init.
pub fn get_total_quantums() -> u64 {
    with_timer_masked(|| {
        sched::STATE
            .lock()
            .as_ref()
            .map(|core| core.total_quantums)
            .unwrap_or(0)
    })
}

/// Quanta the given thread has spent running.
pub fn get_quantums(tid: Tid) -> Result<u64, UthreadError> {
    with_timer_masked(|| {
        let guard = sched::STATE.lock();
        let core = guard.as_ref().ok_or_else(not_initialized)?;
        core.quantums_of(tid)
    })
}

/// Quantum-tick entry point, invoked by the timer source once per elapsed
/// quantum of virtual CPU time.
///
/// Charges the running thread, then runs a scheduling pass; the demotion
/// policy puts the preempted thread at the tail of the queue. Delivery while
/// masked or before init is tolerated and ignored (the timer-source contract
/// already defers masked delivery).
pub fn tick() {
    let Some(ports) = sched::ports() else {
        return;
    };
    if ports.timer.lock().is_masked() {
        log::warn!("quantum tick delivered while masked; ignored");
        return;
    }

    let prior = ports.timer.lock().set_masked(true);
    let plan = {
        let mut guard = sched::STATE.lock();
        match guard.as_mut() {
            None => None,
            Some(core) => {
                sched::drain_graveyard(core);
                core.on_tick();
                sched::plan_pass(core)
            }
        }
    };
    sched::finish_pass(plan);
    ports.timer.lock().set_masked(prior);
}
