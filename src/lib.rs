/*
 * uthreads - Cooperative-Preemptive User-Space Threads
 *
 * This crate multiplexes many logical threads onto a single kernel thread of
 * execution. A periodic virtual-time quantum drives a round-robin scheduler;
 * threads may also voluntarily block, sleep for a whole number of quanta, or
 * terminate one another. There is no kernel parallelism: at most one user
 * thread is on CPU at any instant, and the scheduler is reentered either from
 * the quantum tick or from an explicit library call.
 *
 * SUBSYSTEMS:
 * ==========
 *
 * - sched: the TCB table, the bounded ready queue, and the round-robin
 *   scheduling pass with its sleep-wake sweep. This is where the state
 *   machine lives.
 * - port: the interfaces to the three platform collaborators the core needs
 *   (timer source, context primitive, stack provider) plus a deterministic
 *   virtual port set used by the test suite and by hosts that step virtual
 *   time manually.
 * - api: the public operations, each bracketed in a timer-masked critical
 *   section, and the quantum-tick entry point.
 * - error: the BadArg / Exhausted / System taxonomy with its stderr
 *   diagnostic contract.
 *
 * THREAD LIFECYCLE:
 * ================
 *
 *   spawn -> Ready -> Running -> (tick) -> Ready
 *                        |
 *                        +-> Blocked  (block, or sleep with a wake quantum)
 *                        +-> Terminated -> Unused  (slot reusable)
 *
 * TID 0 is the host thread: it runs on the process stack, owns the first
 * quantum, and can neither block itself via `block` nor `sleep`; terminating
 * it ends the process.
 */

pub mod api;
pub mod error;
pub mod port;
pub mod sched;
pub mod utils;

pub use api::{
    block, get_quantums, get_tid, get_total_quantums, init, init_with_ports, resume, sleep, spawn,
    terminate, tick,
};
pub use error::UthreadError;
pub use port::{
    Context, ContextOps, Ports, StackProvider, StackRegion, ThreadEntry, TimerSource,
};
pub use sched::{ThreadState, Tid};

/// Maximum number of concurrent threads, the host thread included.
pub const MAX_THREADS: usize = 100;

/// Bytes per spawned thread stack.
pub const STACK_SIZE: usize = 4096;
