/*
 * Platform Ports
 *
 * The scheduler core never talks to a platform directly. Three collaborator
 * interfaces cover everything it needs from the outside world:
 *
 * 1. TIMER SOURCE: delivers one call to `uthreads::tick()` per elapsed
 *    quantum of virtual CPU time, and can be masked while the core mutates
 *    shared state.
 * 2. CONTEXT PRIMITIVE: captures and resumes the minimum CPU state needed to
 *    continue a thread at its last suspension point. The core treats the
 *    saved state as an opaque blob.
 * 3. STACK PROVIDER: hands out fixed-size contiguous byte regions used as
 *    alternate execution stacks.
 *
 * A complete implementation of the three traits is a "port". The crate ships
 * one deterministic port set in `port::virt` (used by the test suite and by
 * hosts that step virtual time manually); embedders with a real periodic
 * timer and a real context-switch primitive install their own via
 * `init_with_ports`.
 */

pub mod virt;

use spin::Mutex;

/// Bytes reserved for one saved execution context.
///
/// Sized so a port can drop a full `ucontext_t`-class snapshot into the blob;
/// the core never looks inside.
pub const CONTEXT_SIZE: usize = 1024;

/// Opaque captured CPU state sufficient to resume a thread.
///
/// Owned by the thread's TCB for its entire live lifetime. Only the installed
/// `ContextOps` port interprets the payload.
#[repr(C, align(16))]
pub struct Context {
    bytes: [u8; CONTEXT_SIZE],
}

impl Context {
    pub const fn zeroed() -> Self {
        Self {
            bytes: [0; CONTEXT_SIZE],
        }
    }

    /// Reset the payload for slot reuse.
    pub fn clear(&mut self) {
        self.bytes = [0; CONTEXT_SIZE];
    }

    /// Port-side access to the payload.
    pub fn bytes_mut(&mut self) -> &mut [u8; CONTEXT_SIZE] {
        &mut self.bytes
    }

    pub fn bytes(&self) -> &[u8; CONTEXT_SIZE] {
        &self.bytes
    }
}

/// Entry point supplied by the host program for a spawned thread.
pub type ThreadEntry = fn();

/// Periodic virtual-time quantum source.
///
/// After `arm`, the source invokes `uthreads::tick()` once per quantum of
/// virtual CPU time. Delivery while masked is deferred, never dropped on the
/// floor mid-critical-section: the mask is the library's only critical-section
/// mechanism.
pub trait TimerSource: Send {
    /// Start periodic delivery with the given quantum length.
    fn arm(&mut self, quantum_usecs: u64) -> Result<(), &'static str>;

    /// Set the mask state, returning the prior state so nested critical
    /// sections compose by save/restore.
    fn set_masked(&mut self, masked: bool) -> bool;

    fn is_masked(&self) -> bool;
}

/// Save/restore primitive for execution contexts.
///
/// Both operations must be async-signal-safe in ports whose timer delivers
/// from an interrupt context. Mask state travels with the context: a captured
/// context resumes under the mask it was captured with, and a freshly seeded
/// context resumes unmasked.
pub trait ContextOps: Send + Sync {
    /// Seed `ctx` so that its first resume enters `start` with the stack
    /// pointer at `stack_top` (stacks grow downward). The core passes its own
    /// dispatch trampoline as `start`; the trampoline runs the thread's entry
    /// function and terminates the thread's own TID if the entry returns.
    fn prepare(&self, ctx: &mut Context, stack_top: *mut u8, start: extern "C" fn());

    /// Capture the calling context into `save` and resume `resume`. Returns
    /// only when `save` is itself resumed by a later swap.
    ///
    /// # Safety
    /// Both pointers must stay valid until the saved context is resumed or
    /// discarded, and the caller must hold no lock that the resumed context
    /// could try to take.
    unsafe fn swap(&self, save: *mut Context, resume: *const Context);
}

/// Fixed-size execution stack region.
///
/// Exclusively owned by one TCB while the thread is live; returned to the
/// provider when the slot is reaped. The host thread (TID 0) runs on the
/// process stack and never owns a region.
pub struct StackRegion {
    mem: Box<[u8]>,
}

impl StackRegion {
    pub fn new(size: usize) -> Self {
        Self {
            mem: vec![0u8; size].into_boxed_slice(),
        }
    }

    pub fn len(&self) -> usize {
        self.mem.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mem.is_empty()
    }

    /// One past the highest byte; the initial stack pointer for a
    /// downward-growing stack.
    pub fn top(&mut self) -> *mut u8 {
        let len = self.mem.len();
        // SAFETY: one-past-the-end of an owned allocation is a valid address
        // to form (never dereferenced by the core).
        unsafe { self.mem.as_mut_ptr().add(len) }
    }
}

/// Allocator for thread stacks.
pub trait StackProvider: Send {
    /// Hand out one region, or None when the pool is exhausted.
    fn allocate(&mut self) -> Option<StackRegion>;

    /// Take a region back. The contents are not zeroed here; slot reuse
    /// clears the TCB, not the stack bytes.
    fn release(&mut self, region: StackRegion);
}

/// The collaborator bundle handed to `init_with_ports`.
///
/// The context primitive is accessed concurrently from the tick path, so it
/// is required to be stateless-per-call (`&self`); the timer and stack
/// provider mutate and sit behind their own locks.
pub struct Ports {
    pub timer: Mutex<Box<dyn TimerSource>>,
    pub context: Box<dyn ContextOps>,
    pub stacks: Mutex<Box<dyn StackProvider>>,
}

impl Ports {
    pub fn new(
        timer: impl TimerSource + 'static,
        context: impl ContextOps + 'static,
        stacks: impl StackProvider + 'static,
    ) -> Self {
        Self {
            timer: Mutex::new(Box::new(timer)),
            context: Box::new(context),
            stacks: Mutex::new(Box::new(stacks)),
        }
    }
}
