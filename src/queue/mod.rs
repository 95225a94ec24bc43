//! Pool abstractions shared by the bounded and unbounded variants.
//!
//! This module provides the vocabulary types used by both pool
//! implementations:
//!
//! - [`Fetched`]: tri-state outcome of a fetch, distinguishing "got data",
//!   "nothing right now" and "closed and drained"
//! - [`Rejected`]: error carrying back an element refused by a closed pool
//! - [`Handle`]: the reference-counted element type of the bounded pool
//!
//! # Built-in Implementations
//!
//! - [`ConcurrentQueue`]: Unbounded FIFO pool guarded by a single monitor
//! - [`BoundedQueue`]: Bounded pool of shared handles with producer
//!   backpressure, priority insertion and batch operations

mod bounded;
mod unbounded;

pub use bounded::{BoundedQueue, DEFAULT_CAPACITY};
pub use unbounded::ConcurrentQueue;

use std::fmt;
use std::sync::Arc;

/// Reference-counted handle to a pooled element.
///
/// Handles are shared between the pool and every holder that fetched a copy;
/// no holder may assume exclusive ownership of the pointee.
pub type Handle<E> = Arc<E>;

/// Outcome of a fetch operation.
///
/// Blocking fetches only ever resolve to [`Data`](Fetched::Data) or
/// [`Closed`](Fetched::Closed); non-blocking fetches may additionally report
/// [`Empty`](Fetched::Empty) when the pool is open but has nothing queued.
///
/// # Example
///
/// ```rust
/// use concurrent_pool::{ConcurrentQueue, Fetched};
///
/// let queue = ConcurrentQueue::new();
/// queue.push(7).unwrap();
///
/// assert_eq!(queue.try_fetch(), Fetched::Data(7));
/// assert_eq!(queue.try_fetch(), Fetched::Empty);
///
/// queue.close();
/// assert_eq!(queue.try_fetch(), Fetched::Closed);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fetched<T> {
    /// An element was removed from the pool.
    Data(T),
    /// The pool is open but had nothing to hand out.
    Empty,
    /// The pool is closed and fully drained; nothing more is coming.
    Closed,
}

impl<T> Fetched<T> {
    /// Converts into an `Option`, collapsing `Empty` and `Closed` to `None`.
    pub fn into_option(self) -> Option<T> {
        match self {
            Fetched::Data(elem) => Some(elem),
            Fetched::Empty | Fetched::Closed => None,
        }
    }

    /// Returns `true` if an element was fetched.
    pub fn is_data(&self) -> bool {
        matches!(self, Fetched::Data(_))
    }

    /// Returns `true` if the pool was closed and drained.
    pub fn is_closed(&self) -> bool {
        matches!(self, Fetched::Closed)
    }
}

/// Error returned when a pool refuses an element because it is closed.
///
/// The rejected payload is handed back to the caller rather than silently
/// dropped, so nothing is lost without the caller's consent.
///
/// # Example
///
/// ```rust
/// use concurrent_pool::ConcurrentQueue;
///
/// let queue: ConcurrentQueue<String> = ConcurrentQueue::new();
/// queue.close();
///
/// let rejected = queue.push("late".to_string()).unwrap_err();
/// assert_eq!(rejected.into_inner(), "late");
/// ```
pub struct Rejected<T>(
    /// The payload that was refused.
    pub T,
);

impl<T> Rejected<T> {
    /// Takes the rejected payload back out.
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> fmt::Display for Rejected<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pool is closed")
    }
}

impl<T> fmt::Debug for Rejected<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rejected").finish_non_exhaustive()
    }
}

impl<T> std::error::Error for Rejected<T> {}
