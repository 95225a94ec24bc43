//! Bounded pool of reference-counted handles with producer backpressure.

use super::{Fetched, Handle, Rejected};
use log::debug;
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Capacity used by [`BoundedQueue::new`].
pub const DEFAULT_CAPACITY: usize = 10_000;

/// A bounded, thread-safe pool of [`Handle`]s with mutual backpressure
/// between producers and consumers.
///
/// The pool is a two-condition monitor: producers park on "room available"
/// when the pool is at capacity, consumers park on "data available" when it
/// is empty, and each side wakes the other before sleeping so both can never
/// be asleep at once. Two operations bypass the capacity bound:
///
/// - [`push_urgent`](Self::push_urgent) inserts at the head and never
///   blocks, so urgent data is never delayed by backpressure;
/// - [`push_batch`](Self::push_batch) waits for *any* room, then admits the
///   whole batch atomically, which may overshoot the bound.
///
/// Elements are shared handles: every fetch hands out a clone of the
/// reference-counted pointer, and holders must not assume exclusive
/// ownership of the pointee.
///
/// # Example
///
/// ```rust
/// use concurrent_pool::{BoundedQueue, Fetched, Handle};
///
/// let pool = BoundedQueue::with_capacity(8);
///
/// pool.push(Handle::new("job".to_string())).unwrap();
/// pool.push_urgent(Handle::new("control".to_string())).unwrap();
///
/// // The urgent handle jumps the queue.
/// match pool.fetch() {
///     Fetched::Data(handle) => assert_eq!(*handle, "control"),
///     other => panic!("unexpected outcome: {:?}", other),
/// }
/// # pool.close();
/// ```
pub struct BoundedQueue<E> {
    capacity: usize,
    items: Mutex<VecDeque<Handle<E>>>,
    /// Data available; consumers park here.
    avail: Condvar,
    /// Room available; producers park here.
    space: Condvar,
    closed: AtomicBool,
    waiting: AtomicUsize,
}

impl<E> BoundedQueue<E> {
    /// Creates a pool with [`DEFAULT_CAPACITY`].
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Creates a pool holding at most `capacity` handles.
    ///
    /// A requested capacity of 0 is coerced to 1 rather than rejected, so a
    /// pool can always make progress.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            items: Mutex::new(VecDeque::new()),
            avail: Condvar::new(),
            space: Condvar::new(),
            closed: AtomicBool::new(false),
            waiting: AtomicUsize::new(0),
        }
    }

    /// Returns the capacity bound.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Appends a handle to the tail, blocking while the pool is at capacity
    /// and open.
    ///
    /// Before parking, the producer wakes every idle consumer; a full pool
    /// with sleeping consumers would otherwise deadlock. The capacity check
    /// loops against spurious wakes. Closing the pool ends the wait, and a
    /// push unblocked that way still completes: close does not retroactively
    /// reject producers already committed to the pool.
    ///
    /// Returns the pool length after insertion.
    ///
    /// # Errors
    ///
    /// [`Rejected`] with the handle returned if the pool was closed at
    /// entry.
    pub fn push(&self, handle: Handle<E>) -> Result<usize, Rejected<Handle<E>>> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(Rejected(handle));
        }
        let mut items = self.items.lock();
        while items.len() >= self.capacity && !self.closed.load(Ordering::SeqCst) {
            self.avail.notify_all();
            self.space.wait(&mut items);
        }
        items.push_back(handle);
        let len = items.len();
        drop(items);
        self.avail.notify_one();
        Ok(len)
    }

    /// Inserts a handle at the *head*, ignoring the capacity bound.
    ///
    /// Never blocks: urgent data must not be delayed by backpressure. The
    /// handle is fetched before every ordinary element already queued; a
    /// later urgent insertion lands ahead of an earlier one.
    ///
    /// # Errors
    ///
    /// [`Rejected`] with the handle returned if the pool was closed at
    /// entry.
    pub fn push_urgent(&self, handle: Handle<E>) -> Result<usize, Rejected<Handle<E>>> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(Rejected(handle));
        }
        let mut items = self.items.lock();
        items.push_front(handle);
        let len = items.len();
        drop(items);
        self.avail.notify_one();
        Ok(len)
    }

    /// Appends a batch of handles, blocking while the pool is at capacity
    /// and open.
    ///
    /// The wait uses the same predicate as [`push`](Self::push): it waits
    /// for *any* room, not room for the whole batch, then admits every
    /// handle in one critical section. The pool may therefore exceed its
    /// capacity by up to `handles.len() - 1` until consumers catch up. All
    /// waiting consumers are woken, since more than one element may have
    /// arrived.
    ///
    /// Returns the pool length after insertion.
    ///
    /// # Errors
    ///
    /// [`Rejected`] with the whole batch returned if the pool was closed at
    /// entry.
    pub fn push_batch(
        &self,
        handles: Vec<Handle<E>>,
    ) -> Result<usize, Rejected<Vec<Handle<E>>>> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(Rejected(handles));
        }
        let mut items = self.items.lock();
        while items.len() >= self.capacity && !self.closed.load(Ordering::SeqCst) {
            self.avail.notify_all();
            self.space.wait(&mut items);
        }
        items.extend(handles);
        let len = items.len();
        drop(items);
        self.avail.notify_all();
        Ok(len)
    }

    /// Constructs an element, wraps it in a fresh [`Handle`] and appends it
    /// with the same backpressure rules as [`push`](Self::push).
    ///
    /// # Errors
    ///
    /// [`Rejected`] if the pool was closed at entry; the constructor is not
    /// invoked.
    pub fn emplace_with<F>(&self, make: F) -> Result<usize, Rejected<()>>
    where
        F: FnOnce() -> E,
    {
        if self.closed.load(Ordering::SeqCst) {
            return Err(Rejected(()));
        }
        let mut items = self.items.lock();
        while items.len() >= self.capacity && !self.closed.load(Ordering::SeqCst) {
            self.avail.notify_all();
            self.space.wait(&mut items);
        }
        items.push_back(Handle::new(make()));
        let len = items.len();
        drop(items);
        self.avail.notify_one();
        Ok(len)
    }

    /// Removes and returns the head handle, blocking while the pool is
    /// empty and open.
    ///
    /// Mirror of [`push`](Self::push): before parking, the consumer wakes
    /// every producer blocked on a full pool. One producer is woken after
    /// the pop, since exactly one slot opened.
    ///
    /// Resolves to [`Fetched::Closed`] when the wait was ended by
    /// [`close`](Self::close) with nothing left to drain; never resolves to
    /// [`Fetched::Empty`].
    pub fn fetch(&self) -> Fetched<Handle<E>> {
        let mut items = self.items.lock();
        while items.is_empty() && !self.closed.load(Ordering::SeqCst) {
            self.space.notify_all();
            self.waiting.fetch_add(1, Ordering::SeqCst);
            self.avail.wait(&mut items);
            self.waiting.fetch_sub(1, Ordering::SeqCst);
        }
        match items.pop_front() {
            Some(handle) => {
                drop(items);
                self.space.notify_one();
                Fetched::Data(handle)
            }
            None => Fetched::Closed,
        }
    }

    /// Removes up to `count` handles from the head as one atomic batch,
    /// blocking while the pool is empty and open.
    ///
    /// Waits for *at least one* element, not `count`; the batch holds
    /// `min(count, len)` handles. Every blocked producer is woken
    /// afterwards, since a variable amount of room opened. Returns an empty
    /// batch when the wait was ended by close with nothing left, or
    /// immediately when `count` is 0.
    pub fn fetch_batch(&self, count: usize) -> Vec<Handle<E>> {
        if count == 0 {
            return Vec::new();
        }
        let mut items = self.items.lock();
        while items.is_empty() && !self.closed.load(Ordering::SeqCst) {
            self.space.notify_all();
            self.waiting.fetch_add(1, Ordering::SeqCst);
            self.avail.wait(&mut items);
            self.waiting.fetch_sub(1, Ordering::SeqCst);
        }
        let take = count.min(items.len());
        let batch: Vec<Handle<E>> = items.drain(..take).collect();
        drop(items);
        if !batch.is_empty() {
            self.space.notify_all();
        }
        batch
    }

    /// Removes and returns the head handle without waiting.
    ///
    /// Usable after close to drain the remaining backlog.
    pub fn try_fetch(&self) -> Fetched<Handle<E>> {
        let mut items = self.items.lock();
        match items.pop_front() {
            Some(handle) => {
                drop(items);
                self.space.notify_one();
                Fetched::Data(handle)
            }
            None => {
                if self.closed.load(Ordering::SeqCst) {
                    Fetched::Closed
                } else {
                    Fetched::Empty
                }
            }
        }
    }

    /// Returns the number of threads currently parked in a consuming wait.
    ///
    /// Introspection for caller-side scaling decisions, e.g. whether to
    /// spin up more producers.
    pub fn waiting_consumers(&self) -> usize {
        self.waiting.load(Ordering::SeqCst)
    }

    /// Returns the number of queued handles.
    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    /// Returns `true` if the pool has nothing to fetch.
    ///
    /// A closed pool reports empty regardless of backlog; see
    /// [`ConcurrentQueue::is_empty`](super::ConcurrentQueue::is_empty) for
    /// the rationale.
    pub fn is_empty(&self) -> bool {
        if self.closed.load(Ordering::SeqCst) {
            return true;
        }
        self.items.lock().is_empty()
    }

    /// Returns `true` until the pool is closed.
    pub fn is_open(&self) -> bool {
        !self.closed.load(Ordering::SeqCst)
    }

    /// Closes the pool and wakes every blocked producer and consumer.
    ///
    /// Both conditions are broadcast so each parked thread re-evaluates its
    /// predicate and falls through. One-way, idempotent, and safe to call
    /// concurrently with any other operation.
    pub fn close(&self) {
        let items = self.items.lock();
        if !self.closed.swap(true, Ordering::SeqCst) {
            debug!(
                "bounded pool closed with {} handle(s) queued, {} consumer(s) waiting",
                items.len(),
                self.waiting.load(Ordering::SeqCst)
            );
        }
        drop(items);
        self.avail.notify_all();
        self.space.notify_all();
    }
}

impl<E> Default for BoundedQueue<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Drop for BoundedQueue<E> {
    // Blocked threads must wake even when the pool is dropped unclosed.
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    fn handle(n: i32) -> Handle<i32> {
        Handle::new(n)
    }

    fn fetch_value(pool: &BoundedQueue<i32>) -> i32 {
        match pool.fetch() {
            Fetched::Data(h) => *h,
            other => panic!("expected data, got {:?}", other),
        }
    }

    #[test]
    fn capacity_zero_is_coerced_to_one() {
        let pool: BoundedQueue<i32> = BoundedQueue::with_capacity(0);
        assert_eq!(pool.capacity(), 1);
    }

    #[test]
    fn default_capacity() {
        let pool: BoundedQueue<i32> = BoundedQueue::new();
        assert_eq!(pool.capacity(), DEFAULT_CAPACITY);
    }

    #[test]
    fn fifo_order_for_ordinary_pushes() {
        let pool = BoundedQueue::with_capacity(8);
        for n in 0..5 {
            pool.push(handle(n)).unwrap();
        }
        for n in 0..5 {
            assert_eq!(fetch_value(&pool), n);
        }
    }

    #[test]
    fn urgent_push_jumps_ordinary_elements() {
        let pool = BoundedQueue::with_capacity(8);
        pool.push(handle(1)).unwrap();
        pool.push(handle(2)).unwrap();
        pool.push_urgent(handle(99)).unwrap();

        assert_eq!(fetch_value(&pool), 99);
        assert_eq!(fetch_value(&pool), 1);
        assert_eq!(fetch_value(&pool), 2);
    }

    #[test]
    fn later_urgent_push_lands_first() {
        let pool = BoundedQueue::with_capacity(8);
        pool.push(handle(1)).unwrap();
        pool.push_urgent(handle(10)).unwrap();
        pool.push_urgent(handle(20)).unwrap();

        assert_eq!(fetch_value(&pool), 20);
        assert_eq!(fetch_value(&pool), 10);
        assert_eq!(fetch_value(&pool), 1);
    }

    #[test]
    fn urgent_push_ignores_capacity() {
        let pool = BoundedQueue::with_capacity(2);
        pool.push(handle(1)).unwrap();
        pool.push(handle(2)).unwrap();
        // At capacity: an ordinary push would block, urgent must not.
        assert_eq!(pool.push_urgent(handle(0)).unwrap(), 3);
        assert_eq!(pool.len(), 3);
        assert_eq!(fetch_value(&pool), 0);
    }

    #[test]
    fn push_blocks_at_capacity_until_fetch() {
        let pool = Arc::new(BoundedQueue::with_capacity(2));
        pool.push(handle(1)).unwrap();
        pool.push(handle(2)).unwrap();

        let blocked = {
            let pool = Arc::clone(&pool);
            thread::spawn(move || pool.push(handle(3)).unwrap())
        };

        // Give the producer a chance to park on the full pool.
        thread::sleep(Duration::from_millis(50));
        assert_eq!(pool.len(), 2);

        assert_eq!(fetch_value(&pool), 1);
        blocked.join().unwrap();
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn batch_push_waits_for_any_room_and_may_overshoot() {
        let pool = Arc::new(BoundedQueue::with_capacity(2));
        pool.push(handle(1)).unwrap();
        pool.push(handle(2)).unwrap();

        let blocked = {
            let pool = Arc::clone(&pool);
            thread::spawn(move || {
                pool.push_batch(vec![handle(3), handle(4), handle(5)]).unwrap()
            })
        };

        thread::sleep(Duration::from_millis(50));
        assert_eq!(pool.len(), 2);

        // One slot opens; the whole batch lands and overshoots the bound.
        assert_eq!(fetch_value(&pool), 1);
        let len = blocked.join().unwrap();
        assert_eq!(len, 4);
        assert_eq!(pool.len(), 4);
    }

    #[test]
    fn batch_push_to_closed_pool_returns_batch() {
        let pool = BoundedQueue::with_capacity(4);
        pool.close();
        let rejected = pool.push_batch(vec![handle(1), handle(2)]).unwrap_err();
        assert_eq!(rejected.into_inner().len(), 2);
    }

    #[test]
    fn fetch_batch_is_bounded_by_backlog() {
        let pool = BoundedQueue::with_capacity(8);
        for n in 0..3 {
            pool.push(handle(n)).unwrap();
        }
        let batch = pool.fetch_batch(5);
        assert_eq!(batch.len(), 3);
        let values: Vec<i32> = batch.iter().map(|h| **h).collect();
        assert_eq!(values, vec![0, 1, 2]);
    }

    #[test]
    fn fetch_batch_zero_returns_immediately() {
        let pool: BoundedQueue<i32> = BoundedQueue::with_capacity(4);
        assert!(pool.fetch_batch(0).is_empty());
    }

    #[test]
    fn fetch_batch_unblocks_producers() {
        let pool = Arc::new(BoundedQueue::with_capacity(3));
        for n in 0..3 {
            pool.push(handle(n)).unwrap();
        }

        let blocked: Vec<_> = (10..12)
            .map(|n| {
                let pool = Arc::clone(&pool);
                thread::spawn(move || pool.push(handle(n)).unwrap())
            })
            .collect();

        thread::sleep(Duration::from_millis(50));
        assert_eq!(pool.len(), 3);

        // Two slots open at once; both producers must wake.
        assert_eq!(pool.fetch_batch(2).len(), 2);
        for producer in blocked {
            producer.join().unwrap();
        }
        assert_eq!(pool.len(), 3);
    }

    #[test]
    fn emplace_wraps_value_in_fresh_handle() {
        let pool: BoundedQueue<String> = BoundedQueue::with_capacity(4);
        assert_eq!(pool.emplace_with(|| "built".to_string()).unwrap(), 1);
        match pool.fetch() {
            Fetched::Data(h) => assert_eq!(*h, "built"),
            other => panic!("expected data, got {:?}", other),
        }
    }

    #[test]
    fn push_to_closed_pool_hands_handle_back() {
        let pool = BoundedQueue::with_capacity(4);
        pool.close();
        let rejected = pool.push(handle(7)).unwrap_err();
        assert_eq!(*rejected.into_inner(), 7);
    }

    #[test]
    fn urgent_push_to_closed_pool_is_rejected() {
        let pool = BoundedQueue::with_capacity(4);
        pool.close();
        assert!(pool.push_urgent(handle(7)).is_err());
    }

    #[test]
    fn close_unblocks_waiting_producer_and_push_completes() {
        let pool = Arc::new(BoundedQueue::with_capacity(1));
        pool.push(handle(1)).unwrap();

        let blocked = {
            let pool = Arc::clone(&pool);
            thread::spawn(move || pool.push(handle(2)))
        };

        thread::sleep(Duration::from_millis(50));
        pool.close();

        // Close ends the wait; the committed push still lands.
        assert_eq!(blocked.join().unwrap().unwrap(), 2);
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn close_wakes_all_blocked_consumers() {
        let pool: Arc<BoundedQueue<i32>> = Arc::new(BoundedQueue::with_capacity(4));
        let consumers: Vec<_> = (0..4)
            .map(|_| {
                let pool = Arc::clone(&pool);
                thread::spawn(move || pool.fetch())
            })
            .collect();

        thread::sleep(Duration::from_millis(50));
        pool.close();

        for consumer in consumers {
            assert!(consumer.join().unwrap().is_closed());
        }
        assert!(!pool.is_open());
        assert_eq!(pool.waiting_consumers(), 0);
    }

    #[test]
    fn waiting_consumer_count_rises_and_falls() {
        let pool: Arc<BoundedQueue<i32>> = Arc::new(BoundedQueue::with_capacity(4));
        assert_eq!(pool.waiting_consumers(), 0);

        let consumer = {
            let pool = Arc::clone(&pool);
            thread::spawn(move || pool.fetch())
        };

        // Wait for the consumer to park.
        for _ in 0..100 {
            if pool.waiting_consumers() == 1 {
                break;
            }
            thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(pool.waiting_consumers(), 1);

        pool.push(handle(1)).unwrap();
        consumer.join().unwrap();
        assert_eq!(pool.waiting_consumers(), 0);
    }

    #[test]
    fn handles_are_shared_after_fetch() {
        let pool = BoundedQueue::with_capacity(4);
        let original = handle(5);
        pool.push(Arc::clone(&original)).unwrap();

        match pool.fetch() {
            Fetched::Data(fetched) => {
                assert!(Arc::ptr_eq(&original, &fetched));
                assert_eq!(Arc::strong_count(&fetched), 2);
            }
            other => panic!("expected data, got {:?}", other),
        }
    }

    #[test]
    fn try_fetch_drains_after_close() {
        let pool = BoundedQueue::with_capacity(4);
        pool.push(handle(1)).unwrap();
        pool.close();
        assert!(pool.try_fetch().is_data());
        assert!(pool.try_fetch().is_closed());
    }

    #[test]
    fn close_is_idempotent() {
        let pool: BoundedQueue<i32> = BoundedQueue::with_capacity(4);
        pool.close();
        pool.close();
        assert!(!pool.is_open());
    }
}
