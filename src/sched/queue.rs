/*
 * Ready Queue
 *
 * Bounded FIFO of TIDs awaiting CPU, used strictly round-robin: newcomers
 * join the tail, the scheduler takes from the head. Capacity MAX_THREADS is
 * sufficient because enqueue rejects duplicates, so each TID occupies at most
 * one slot.
 *
 * Entries can go stale: blocking or terminating a queued thread leaves its
 * TID in place and the scheduler drops it on dequeue. That trade (O(1) state
 * change, O(k) filter at selection) is deliberate.
 */

use heapless::Deque;

use super::tcb::Tid;
use crate::MAX_THREADS;

pub struct ReadyQueue {
    q: Deque<Tid, MAX_THREADS>,
}

impl ReadyQueue {
    pub const fn new() -> Self {
        Self { q: Deque::new() }
    }

    /// Append to the tail unless the TID is already queued. Returns whether
    /// the entry was added.
    pub fn enqueue(&mut self, tid: Tid) -> bool {
        if self.contains(tid) {
            return false;
        }
        // Cannot overflow: duplicates are rejected and there are at most
        // MAX_THREADS distinct TIDs.
        self.q.push_back(tid).is_ok()
    }

    /// Pop the head, if any.
    pub fn dequeue(&mut self) -> Option<Tid> {
        self.q.pop_front()
    }

    /// Drop a stale entry eagerly, preserving the order of the rest.
    pub fn remove(&mut self, tid: Tid) {
        for _ in 0..self.q.len() {
            if let Some(head) = self.q.pop_front() {
                if head != tid {
                    let _ = self.q.push_back(head);
                }
            }
        }
    }

    pub fn contains(&self, tid: Tid) -> bool {
        self.q.iter().any(|&t| t == tid)
    }

    pub fn len(&self) -> usize {
        self.q.len()
    }

    pub fn is_empty(&self) -> bool {
        self.q.is_empty()
    }

    #[cfg(test)]
    pub fn snapshot(&self) -> Vec<Tid> {
        self.q.iter().copied().collect()
    }
}

impl Default for ReadyQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifo_order() {
        let mut q = ReadyQueue::new();
        assert!(q.enqueue(Tid(1)));
        assert!(q.enqueue(Tid(2)));
        assert!(q.enqueue(Tid(3)));
        assert_eq!(q.dequeue(), Some(Tid(1)));
        assert_eq!(q.dequeue(), Some(Tid(2)));
        assert_eq!(q.dequeue(), Some(Tid(3)));
        assert_eq!(q.dequeue(), None);
    }

    #[test]
    fn test_duplicates_rejected() {
        let mut q = ReadyQueue::new();
        assert!(q.enqueue(Tid(4)));
        assert!(!q.enqueue(Tid(4)));
        assert_eq!(q.len(), 1);
    }

    #[test]
    fn test_remove_preserves_order() {
        let mut q = ReadyQueue::new();
        for i in 1..=4 {
            q.enqueue(Tid(i));
        }
        q.remove(Tid(2));
        assert_eq!(q.snapshot(), vec![Tid(1), Tid(3), Tid(4)]);
        // Removing an absent TID is a no-op.
        q.remove(Tid(9));
        assert_eq!(q.snapshot(), vec![Tid(1), Tid(3), Tid(4)]);
    }

    #[test]
    fn test_full_capacity() {
        let mut q = ReadyQueue::new();
        for i in 0..MAX_THREADS {
            assert!(q.enqueue(Tid(i)));
        }
        assert_eq!(q.len(), MAX_THREADS);
    }
}
