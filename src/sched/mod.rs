/*
 * Scheduler Subsystem
 *
 * Library-owned global state plus the glue that turns a scheduling decision
 * into an actual context switch.
 *
 * The state object lives behind a spin mutex and is never held across a
 * switch: the pass runs under the lock and returns raw context pointers, the
 * lock is dropped, and only then does the port primitive swap. A thread that
 * is switched out mid-operation therefore holds no lock, and whatever thread
 * the CPU lands on can re-enter the library immediately.
 *
 * The timer mask, not the mutex, is the real critical-section mechanism:
 * every public operation brackets itself with mask-save/restore, so the tick
 * can never interleave with a half-done state change. The mutex exists to
 * make the shared mutable state sound Rust.
 */

pub(crate) mod queue;
pub(crate) mod scheduler;
pub(crate) mod tcb;

pub use tcb::{ThreadState, Tid};

use spin::{Mutex, Once};

use crate::port::{Context, Ports};
use scheduler::{Core, Dispatch, SaveSlot};

/// The scheduler state; None until `init`.
pub(crate) static STATE: Mutex<Option<Core>> = Mutex::new(None);

/// Platform collaborators; installed exactly once at `init`.
pub(crate) static PORTS: Once<Ports> = Once::new();

pub(crate) fn ports() -> Option<&'static Ports> {
    PORTS.get()
}

/// Raw switch instructions extracted under the state lock, executed after it
/// is released.
pub(crate) struct SwitchPlan {
    pub save: *mut Context,
    pub next: *const Context,
}

/// Hand a previously parked stack (from a self-terminated thread) back to
/// the provider. Runs on every mutating library entry, which by then
/// executes on some other live stack.
pub(crate) fn drain_graveyard(core: &mut Core) {
    if let Some(region) = core.take_graveyard() {
        if let Some(ports) = ports() {
            ports.stacks.lock().release(region);
        }
    }
}

/// Run one scheduling pass and lower its outcome to raw pointers.
///
/// The pointers reference contexts inside the state cell (or its scratch
/// slot). Re-initialization is rejected, so the cell is never replaced and
/// the addresses stay valid until the saved side resumes.
pub(crate) fn plan_pass(core: &mut Core) -> Option<SwitchPlan> {
    match core.schedule() {
        Dispatch::Keep => None,
        Dispatch::Switch { save, next } => {
            let save = match save {
                SaveSlot::Tcb(tid) => &mut core.table.tcb_mut(tid).context as *mut Context,
                SaveSlot::Scratch => core.scratch_mut() as *mut Context,
            };
            let next = &core.table.tcb(next).context as *const Context;
            Some(SwitchPlan { save, next })
        }
    }
}

/// Perform the planned swap.
///
/// Must be called with the state lock released; the resumed context will
/// take the lock itself on its next library call.
pub(crate) fn finish_pass(plan: Option<SwitchPlan>) {
    let Some(ports) = ports() else { return };
    if let Some(plan) = plan {
        // SAFETY: both contexts live in the state cell; nothing moves or
        // frees them before the saved side is resumed or discarded, and no
        // lock is held here.
        unsafe { ports.context.swap(plan.save, plan.next) };
    }
}

/// First code on a fresh thread's stack.
///
/// Seeded as the start point of every spawned context: runs the entry the
/// host supplied and, if the entry returns, terminates the calling TID so
/// that falling off the end of an entry function is defined behavior.
pub(crate) extern "C" fn thread_start() {
    let entry = {
        let guard = STATE.lock();
        guard
            .as_ref()
            .and_then(|core| core.table.get(core.current).and_then(|tcb| tcb.entry))
    };
    if let Some(entry) = entry {
        entry();
    }
    if let Ok(tid) = crate::api::get_tid() {
        let _ = crate::api::terminate(tid);
    }
    // A terminated thread is never resumed.
}
