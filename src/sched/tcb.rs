/*
 * Thread Control Blocks
 *
 * One descriptor per slot in a fixed-capacity table; the thread id IS the
 * slot index, so lookup is O(1) and no reference to a TCB ever leaves the
 * core. Slot 0 is pinned to the host thread for the lifetime of the library.
 *
 * Allocation is first-fit from index 1 upward, and a reaped slot is cleared
 * before reuse so a recycled TID starts with fresh accounting.
 */

use core::fmt;

use crate::MAX_THREADS;
use crate::port::{Context, StackRegion, ThreadEntry};

/// Thread identifier; index of the thread's slot in the TCB table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Tid(pub usize);

impl fmt::Display for Tid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Tid {
    /// The host thread.
    pub const HOST: Tid = Tid(0);
}

/// Thread state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadState {
    /// Free slot; not a thread.
    Unused,
    /// Waiting in the ready queue for CPU.
    Ready,
    /// On CPU. Exactly one TCB is in this state once the library is up.
    Running,
    /// Suspended; wakes via resume, or via the sleep sweep when
    /// `sleep_until` is set.
    Blocked,
    /// Transient marker during self-termination; the slot becomes Unused on
    /// the next dispatch.
    Terminated,
}

/// One thread descriptor.
pub struct Tcb {
    pub tid: Tid,
    pub state: ThreadState,
    /// Count of quanta this thread has been running.
    pub quantums: u64,
    /// 0 when not sleeping; otherwise the smallest global quantum at which
    /// the sleep sweep may make this thread Ready again.
    pub sleep_until: u64,
    /// Saved execution state, interpreted only by the context port.
    pub context: Context,
    /// Exclusively owned stack region; None for the host thread, which runs
    /// on the process stack.
    pub stack: Option<StackRegion>,
    /// Entry point recorded at spawn so the dispatch trampoline can invoke it.
    pub entry: Option<ThreadEntry>,
}

impl Tcb {
    fn new(tid: Tid) -> Self {
        Self {
            tid,
            state: ThreadState::Unused,
            quantums: 0,
            sleep_until: 0,
            context: Context::zeroed(),
            stack: None,
            entry: None,
        }
    }

    /// Clear the slot for reuse. The stack must already have been taken back
    /// by the provider.
    pub fn reset(&mut self) {
        debug_assert!(self.stack.is_none());
        self.state = ThreadState::Unused;
        self.quantums = 0;
        self.sleep_until = 0;
        self.entry = None;
        self.context.clear();
    }

    /// True for a thread parked by `sleep`.
    pub fn is_sleeper(&self) -> bool {
        self.state == ThreadState::Blocked && self.sleep_until != 0
    }
}

impl fmt::Debug for Tcb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tcb")
            .field("tid", &self.tid)
            .field("state", &self.state)
            .field("quantums", &self.quantums)
            .field("sleep_until", &self.sleep_until)
            .finish()
    }
}

/// Fixed-capacity descriptor table indexed by TID.
pub struct TcbTable {
    slots: Box<[Tcb]>,
}

impl TcbTable {
    /// All slots Unused; `init` claims slot 0 for the host afterwards.
    pub fn new() -> Self {
        let slots = (0..MAX_THREADS).map(|i| Tcb::new(Tid(i))).collect();
        Self { slots }
    }

    /// Range-checked lookup. Out-of-range TIDs are a caller error, never a
    /// panic.
    pub fn get(&self, tid: Tid) -> Option<&Tcb> {
        self.slots.get(tid.0)
    }

    pub fn get_mut(&mut self, tid: Tid) -> Option<&mut Tcb> {
        self.slots.get_mut(tid.0)
    }

    /// Lookup for TIDs the core itself produced.
    pub(crate) fn tcb(&self, tid: Tid) -> &Tcb {
        &self.slots[tid.0]
    }

    pub(crate) fn tcb_mut(&mut self, tid: Tid) -> &mut Tcb {
        &mut self.slots[tid.0]
    }

    /// Lowest free TID >= 1, first-fit. Slot 0 is never handed out.
    pub fn first_free(&self) -> Option<Tid> {
        self.slots[1..]
            .iter()
            .find(|tcb| tcb.state == ThreadState::Unused)
            .map(|tcb| tcb.tid)
    }

    /// Ascending-TID iteration; the sweep order the scheduler relies on.
    pub fn iter(&self) -> impl Iterator<Item = &Tcb> {
        self.slots.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Tcb> {
        self.slots.iter_mut()
    }

    /// Number of live (non-Unused) slots.
    pub fn live_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|tcb| tcb.state != ThreadState::Unused)
            .count()
    }
}

impl Default for TcbTable {
    fn default() -> Self {
        Self::new()
    }
}
