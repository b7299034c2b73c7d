/*
 * Virtual Port Set
 *
 * A deterministic, in-process implementation of the three platform
 * interfaces. There is no real clock and no real register switch: quanta
 * elapse when the embedder calls `uthreads::tick()`, and context swaps are
 * recorded rather than performed. Every state transition of the scheduler is
 * observable through the public API, which is exactly what the test suite
 * needs.
 *
 * Hosts that want actual preemption install their own port set via
 * `init_with_ports`; this one is the default for `init`.
 */

use spin::Mutex;

use super::{Context, ContextOps, StackProvider, StackRegion, TimerSource};

/// Magic header written into seeded contexts so tests can tell a prepared
/// context from a zeroed one.
const SEED_MAGIC: u64 = 0x7574_6872_6561_6431;

/// Timer whose quanta are delivered manually by the embedder.
///
/// `arm` records the quantum length; masking is a plain flag with
/// save/restore semantics. The driving code is expected to honor the mask,
/// matching the contract a signal-based source gets from the kernel.
pub struct VirtualTimer {
    quantum_usecs: Option<u64>,
    masked: bool,
}

impl VirtualTimer {
    pub fn new() -> Self {
        Self {
            quantum_usecs: None,
            masked: false,
        }
    }

    /// Quantum length the core armed, if any.
    pub fn armed_quantum(&self) -> Option<u64> {
        self.quantum_usecs
    }
}

impl Default for VirtualTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl TimerSource for VirtualTimer {
    fn arm(&mut self, quantum_usecs: u64) -> Result<(), &'static str> {
        if quantum_usecs == 0 {
            return Err("cannot arm a zero-length quantum");
        }
        self.quantum_usecs = Some(quantum_usecs);
        log::debug!("virtual timer armed: {}us per quantum", quantum_usecs);
        Ok(())
    }

    fn set_masked(&mut self, masked: bool) -> bool {
        core::mem::replace(&mut self.masked, masked)
    }

    fn is_masked(&self) -> bool {
        self.masked
    }
}

/// Context primitive that records operations instead of switching.
///
/// `prepare` stamps a recognizable header into the blob; `swap` counts. The
/// counters live behind a lock because the trait is `&self` on the tick path.
pub struct VirtualContextOps {
    counters: Mutex<SwitchCounters>,
}

#[derive(Debug, Default, Clone, Copy)]
struct SwitchCounters {
    prepares: u64,
    swaps: u64,
}

impl VirtualContextOps {
    pub fn new() -> Self {
        Self {
            counters: Mutex::new(SwitchCounters::default()),
        }
    }

    pub fn prepares(&self) -> u64 {
        self.counters.lock().prepares
    }

    pub fn swaps(&self) -> u64 {
        self.counters.lock().swaps
    }
}

impl Default for VirtualContextOps {
    fn default() -> Self {
        Self::new()
    }
}

impl ContextOps for VirtualContextOps {
    fn prepare(&self, ctx: &mut Context, stack_top: *mut u8, start: extern "C" fn()) {
        let bytes = ctx.bytes_mut();
        bytes[0..8].copy_from_slice(&SEED_MAGIC.to_ne_bytes());
        bytes[8..16].copy_from_slice(&(stack_top as usize as u64).to_ne_bytes());
        bytes[16..24].copy_from_slice(&(start as usize as u64).to_ne_bytes());
        self.counters.lock().prepares += 1;
    }

    unsafe fn swap(&self, _save: *mut Context, _resume: *const Context) {
        // No real jump: the "resumed" side of the swap is the caller itself,
        // which keeps the state machine fully synchronous and observable.
        self.counters.lock().swaps += 1;
    }
}

/// Heap-backed stack pool handing out regions of one fixed size.
pub struct HeapStackPool {
    stack_size: usize,
    outstanding: usize,
}

impl HeapStackPool {
    pub fn new(stack_size: usize) -> Self {
        Self {
            stack_size,
            outstanding: 0,
        }
    }

    pub fn outstanding(&self) -> usize {
        self.outstanding
    }
}

impl StackProvider for HeapStackPool {
    fn allocate(&mut self) -> Option<StackRegion> {
        self.outstanding += 1;
        Some(StackRegion::new(self.stack_size))
    }

    fn release(&mut self, region: StackRegion) {
        debug_assert!(self.outstanding > 0);
        self.outstanding -= 1;
        drop(region);
    }
}

/// The default port bundle used by `init`.
pub fn ports() -> super::Ports {
    super::Ports::new(
        VirtualTimer::new(),
        VirtualContextOps::new(),
        HeapStackPool::new(crate::STACK_SIZE),
    )
}
