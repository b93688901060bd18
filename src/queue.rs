//! Lock-free multi-producer FIFO (Michael & Scott).
//!
//! The list always starts with a dummy node; `head` points at it and the
//! first real element is `head.next`. Pushing links a node after the observed
//! tail with a CAS and then tries to swing `tail`; a failed swing is finished
//! by whichever thread next sees the lagging tail.
//!
//! Popped nodes are retired through `crossbeam-epoch`, so a node is only freed
//! once no pinned thread can still be reading it. That makes concurrent `try_pop`
//! from several threads memory-safe, although the pipeline only ever uses one
//! consumer per queue.

use std::mem::MaybeUninit;
use std::ptr;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use crossbeam_epoch::{self as epoch, Atomic, Owned, Shared};
use crossbeam_utils::CachePadded;

/// What a bounded queue does with a push that would exceed capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverflowPolicy {
    /// Reject the incoming item and hand it back to the caller.
    #[default]
    DropNewest,
    /// Evict the oldest queued item to make room.
    DropOldest,
}

/// Envelope carried by pipeline queues: data, or the end-of-stream sentinel.
#[derive(Debug, Clone, PartialEq)]
pub enum QueueItem<T> {
    Data(T),
    EndOfStream,
}

impl<T> QueueItem<T> {
    pub fn is_end(&self) -> bool {
        matches!(self, Self::EndOfStream)
    }
}

struct Node<T> {
    value: MaybeUninit<T>,
    next: Atomic<Node<T>>,
}

impl<T> Node<T> {
    fn sentinel() -> Self {
        Self {
            value: MaybeUninit::uninit(),
            next: Atomic::null(),
        }
    }

    fn with_value(value: T) -> Self {
        Self {
            value: MaybeUninit::new(value),
            next: Atomic::null(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueStats {
    pub pushed: u64,
    pub popped: u64,
    pub dropped: u64,
}

pub struct ConcurrentQueue<T> {
    head: CachePadded<Atomic<Node<T>>>,
    tail: CachePadded<Atomic<Node<T>>>,
    len: AtomicUsize,
    capacity: Option<usize>,
    overflow: OverflowPolicy,
    pushed: AtomicU64,
    popped: AtomicU64,
    dropped: AtomicU64,
}

// Ownership of each `T` moves through the queue exactly once.
unsafe impl<T: Send> Send for ConcurrentQueue<T> {}
unsafe impl<T: Send> Sync for ConcurrentQueue<T> {}

impl<T> Default for ConcurrentQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ConcurrentQueue<T> {
    /// Unbounded queue: `push` always enqueues.
    pub fn new() -> Self {
        let queue = Self {
            head: CachePadded::new(Atomic::null()),
            tail: CachePadded::new(Atomic::null()),
            len: AtomicUsize::new(0),
            capacity: None,
            overflow: OverflowPolicy::default(),
            pushed: AtomicU64::new(0),
            popped: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
        };
        let guard = unsafe { epoch::unprotected() };
        let sentinel = Owned::new(Node::sentinel()).into_shared(guard);
        queue.head.store(sentinel, Ordering::Relaxed);
        queue.tail.store(sentinel, Ordering::Relaxed);
        queue
    }

    /// Bounded queue. The bound is soft: concurrent producers may briefly
    /// overshoot it by at most one item each.
    pub fn bounded(capacity: usize, overflow: OverflowPolicy) -> Self {
        let mut queue = Self::new();
        queue.capacity = Some(capacity.max(1));
        queue.overflow = overflow;
        queue
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    /// Enqueue `value`. Never blocks.
    ///
    /// Returns the item that was dropped to respect the capacity bound, if any:
    /// the incoming value under `DropNewest`, the evicted head under `DropOldest`.
    pub fn push(&self, value: T) -> Option<T> {
        let mut evicted = None;
        if let Some(cap) = self.capacity {
            if self.len.load(Ordering::Acquire) >= cap {
                match self.overflow {
                    OverflowPolicy::DropNewest => {
                        self.dropped.fetch_add(1, Ordering::Relaxed);
                        return Some(value);
                    }
                    OverflowPolicy::DropOldest => {
                        evicted = self.pop_node();
                        if evicted.is_some() {
                            self.dropped.fetch_add(1, Ordering::Relaxed);
                        }
                    }
                }
            }
        }
        self.push_node(value);
        evicted
    }

    /// Enqueue `value` regardless of the capacity bound.
    pub fn force_push(&self, value: T) {
        self.push_node(value);
    }

    /// Dequeue the oldest item, or `None` immediately when empty.
    pub fn try_pop(&self) -> Option<T> {
        let value = self.pop_node()?;
        self.popped.fetch_add(1, Ordering::Relaxed);
        Some(value)
    }

    pub fn is_empty(&self) -> bool {
        let guard = epoch::pin();
        let head = self.head.load(Ordering::Acquire, &guard);
        // SAFETY: head is never null and is protected by the guard.
        let next = unsafe { head.deref() }.next.load(Ordering::Acquire, &guard);
        next.is_null()
    }

    /// Approximate number of queued items.
    pub fn len(&self) -> usize {
        self.len.load(Ordering::Acquire)
    }

    pub fn stats(&self) -> QueueStats {
        QueueStats {
            pushed: self.pushed.load(Ordering::Relaxed),
            popped: self.popped.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
        }
    }

    fn push_node(&self, value: T) {
        let guard = epoch::pin();
        let new = Owned::new(Node::with_value(value)).into_shared(&guard);
        loop {
            let tail = self.tail.load(Ordering::Acquire, &guard);
            // SAFETY: tail is never null and cannot be reclaimed while pinned.
            let tail_ref = unsafe { tail.deref() };
            let next = tail_ref.next.load(Ordering::Acquire, &guard);
            if tail != self.tail.load(Ordering::Acquire, &guard) {
                continue;
            }
            if !next.is_null() {
                // Tail is lagging; help it forward and retry.
                let _ = self.tail.compare_exchange(
                    tail,
                    next,
                    Ordering::Release,
                    Ordering::Relaxed,
                    &guard,
                );
                continue;
            }
            if tail_ref
                .next
                .compare_exchange(
                    Shared::null(),
                    new,
                    Ordering::Release,
                    Ordering::Relaxed,
                    &guard,
                )
                .is_ok()
            {
                let _ = self.tail.compare_exchange(
                    tail,
                    new,
                    Ordering::Release,
                    Ordering::Relaxed,
                    &guard,
                );
                break;
            }
        }
        self.len.fetch_add(1, Ordering::AcqRel);
        self.pushed.fetch_add(1, Ordering::Relaxed);
    }

    fn pop_node(&self) -> Option<T> {
        let guard = epoch::pin();
        loop {
            let head = self.head.load(Ordering::Acquire, &guard);
            let tail = self.tail.load(Ordering::Acquire, &guard);
            // SAFETY: head is never null and is protected by the guard.
            let next = unsafe { head.deref() }.next.load(Ordering::Acquire, &guard);
            if head != self.head.load(Ordering::Acquire, &guard) {
                continue;
            }
            let Some(next_ref) = (unsafe { next.as_ref() }) else {
                return None;
            };
            if head == tail {
                let _ = self.tail.compare_exchange(
                    tail,
                    next,
                    Ordering::Release,
                    Ordering::Relaxed,
                    &guard,
                );
                continue;
            }
            if self
                .head
                .compare_exchange(head, next, Ordering::Release, Ordering::Relaxed, &guard)
                .is_ok()
            {
                // SAFETY: winning the head CAS gives this thread sole ownership of
                // `next`'s payload; `next` becomes the new dummy and its value slot
                // is never read again.
                let value = unsafe { ptr::read(next_ref.value.as_ptr()) };
                // SAFETY: the old dummy is unreachable from the queue; epoch GC
                // frees it once every thread pinned before this point unpins.
                unsafe { guard.defer_destroy(head) };
                self.len.fetch_sub(1, Ordering::AcqRel);
                return Some(value);
            }
        }
    }
}

impl<T> Drop for ConcurrentQueue<T> {
    fn drop(&mut self) {
        while self.pop_node().is_some() {}
        // SAFETY: `&mut self` means no other thread can access the queue.
        unsafe {
            let guard = epoch::unprotected();
            let sentinel = self.head.load(Ordering::Relaxed, guard);
            drop(sentinel.into_owned());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn fifo_single_thread() {
        let q = ConcurrentQueue::new();
        for i in 0..100 {
            assert!(q.push(i).is_none());
        }
        for i in 0..100 {
            assert_eq!(q.try_pop(), Some(i));
        }
        assert_eq!(q.try_pop(), None);
        assert!(q.is_empty());
    }

    #[test]
    fn drop_releases_queued_values() {
        let marker = Arc::new(());
        {
            let q = ConcurrentQueue::new();
            for _ in 0..10 {
                q.push(marker.clone());
            }
            let _ = q.try_pop();
        }
        assert_eq!(Arc::strong_count(&marker), 1);
    }

    #[test]
    fn bounded_drop_newest_returns_rejected_item() {
        let q = ConcurrentQueue::bounded(2, OverflowPolicy::DropNewest);
        assert!(q.push(1).is_none());
        assert!(q.push(2).is_none());
        assert_eq!(q.push(3), Some(3));
        assert_eq!(q.try_pop(), Some(1));
        assert_eq!(q.try_pop(), Some(2));
        assert_eq!(q.stats().dropped, 1);
    }

    #[test]
    fn bounded_drop_oldest_evicts_head() {
        let q = ConcurrentQueue::bounded(2, OverflowPolicy::DropOldest);
        q.push(1);
        q.push(2);
        assert_eq!(q.push(3), Some(1));
        assert_eq!(q.try_pop(), Some(2));
        assert_eq!(q.try_pop(), Some(3));
        assert_eq!(q.len(), 0);
    }
}
