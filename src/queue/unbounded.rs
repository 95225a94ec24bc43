//! Unbounded FIFO pool guarded by a single monitor.

use super::{Fetched, Rejected};
use log::debug;
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};

/// An unbounded, thread-safe FIFO pool.
///
/// Producers append with [`push`](Self::push) or
/// [`emplace_with`](Self::emplace_with); consumers remove with the blocking
/// [`fetch`](Self::fetch) or the non-blocking [`try_fetch`](Self::try_fetch).
/// The pool starts open and is shut down exactly once with
/// [`close`](Self::close), which wakes every blocked consumer. Elements
/// already queued remain drainable after close.
///
/// No operation panics; failure travels in the return value.
///
/// # Example
///
/// ```rust
/// use concurrent_pool::{ConcurrentQueue, Fetched};
/// use std::sync::Arc;
/// use std::thread;
///
/// let queue = Arc::new(ConcurrentQueue::new());
///
/// let consumer = {
///     let queue = Arc::clone(&queue);
///     thread::spawn(move || {
///         let mut seen = Vec::new();
///         while let Fetched::Data(n) = queue.fetch() {
///             seen.push(n);
///         }
///         seen
///     })
/// };
///
/// for n in 0..4 {
///     queue.push(n).unwrap();
/// }
/// queue.close();
///
/// assert_eq!(consumer.join().unwrap(), vec![0, 1, 2, 3]);
/// ```
pub struct ConcurrentQueue<T> {
    items: Mutex<VecDeque<T>>,
    avail: Condvar,
    closed: AtomicBool,
}

impl<T> ConcurrentQueue<T> {
    /// Creates a new open, empty pool.
    pub fn new() -> Self {
        Self {
            items: Mutex::new(VecDeque::new()),
            avail: Condvar::new(),
            closed: AtomicBool::new(false),
        }
    }

    /// Appends an element to the tail and wakes one waiting consumer.
    ///
    /// Returns the pool length after insertion.
    ///
    /// # Errors
    ///
    /// [`Rejected`] with the element handed back if the pool was closed at
    /// entry; the element is not inserted.
    pub fn push(&self, elem: T) -> Result<usize, Rejected<T>> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(Rejected(elem));
        }
        let len = {
            let mut items = self.items.lock();
            items.push_back(elem);
            items.len()
        };
        self.avail.notify_one();
        Ok(len)
    }

    /// Constructs an element while holding the pool lock and appends it.
    ///
    /// The constructor runs under the lock, so the element becomes visible to
    /// consumers in the same critical section that builds it. Semantics are
    /// otherwise identical to [`push`](Self::push).
    ///
    /// # Errors
    ///
    /// [`Rejected`] if the pool was closed at entry; the constructor is not
    /// invoked.
    pub fn emplace_with<F>(&self, make: F) -> Result<usize, Rejected<()>>
    where
        F: FnOnce() -> T,
    {
        if self.closed.load(Ordering::SeqCst) {
            return Err(Rejected(()));
        }
        let len = {
            let mut items = self.items.lock();
            items.push_back(make());
            items.len()
        };
        self.avail.notify_one();
        Ok(len)
    }

    /// Removes and returns the head element, blocking while the pool is
    /// empty and open.
    ///
    /// Resolves to [`Fetched::Data`] when an element is available, or
    /// [`Fetched::Closed`] when the wait was ended by [`close`](Self::close)
    /// with nothing left to drain. Never resolves to [`Fetched::Empty`].
    ///
    /// There is no timeout; the only way to cancel the wait is closing the
    /// pool.
    pub fn fetch(&self) -> Fetched<T> {
        let mut items = self.items.lock();
        while items.is_empty() && !self.closed.load(Ordering::SeqCst) {
            self.avail.wait(&mut items);
        }
        match items.pop_front() {
            Some(elem) => Fetched::Data(elem),
            None => Fetched::Closed,
        }
    }

    /// Removes and returns the head element without waiting.
    ///
    /// Usable after close to drain the remaining backlog.
    pub fn try_fetch(&self) -> Fetched<T> {
        let mut items = self.items.lock();
        match items.pop_front() {
            Some(elem) => Fetched::Data(elem),
            None => {
                if self.closed.load(Ordering::SeqCst) {
                    Fetched::Closed
                } else {
                    Fetched::Empty
                }
            }
        }
    }

    /// Returns the number of queued elements.
    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    /// Returns `true` if the pool has nothing to fetch.
    ///
    /// A closed pool reports empty regardless of backlog: consumers polling
    /// this treat "closed" as "nothing more coming". Use
    /// [`len`](Self::len) or [`try_fetch`](Self::try_fetch) to drain a
    /// closed pool.
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

    /// Closes the pool and wakes every blocked consumer.
    ///
    /// One-way transition: a closed pool never reopens. Idempotent and safe
    /// to call concurrently with any other operation.
    pub fn close(&self) {
        let items = self.items.lock();
        if !self.closed.swap(true, Ordering::SeqCst) {
            debug!("pool closed with {} element(s) queued", items.len());
        }
        drop(items);
        self.avail.notify_all();
    }
}

impl<T> Default for ConcurrentQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Drop for ConcurrentQueue<T> {
    // Blocked consumers must wake even when the pool is dropped unclosed.
    fn drop(&mut self) {
        self.close();
    }
}
