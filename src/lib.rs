//! # Concurrent Pool
//!
//! Thread-safe producer/consumer pools and managed worker threads.
//!
//! ## Features
//!
//! - **Unbounded pool**: FIFO [`ConcurrentQueue`] with blocking and
//!   non-blocking insertion and removal
//! - **Bounded handle pool**: [`BoundedQueue`] of reference-counted
//!   [`Handle`]s with producer backpressure, priority insertion that bypasses
//!   the bound, and batch push/pop
//! - **Cooperative shutdown**: `close()` is one-way and idempotent, wakes
//!   every blocked thread, and leaves the backlog drainable
//! - **Managed workers**: [`ThreadWorker`] runs one task per `run()` call on
//!   a dedicated thread with start/stop/wait semantics
//! - **No panics in the contract**: fallible pool operations report through
//!   [`Fetched`] and [`Rejected`] return values
//!
//! ## Quick Start
//!
//! ```rust
//! use concurrent_pool::prelude::*;
//!
//! # fn main() -> concurrent_pool::Result<()> {
//! let pool = std::sync::Arc::new(BoundedQueue::with_capacity(100));
//!
//! // A worker draining the pool until it closes.
//! let drained = std::sync::Arc::clone(&pool);
//! let mut worker = ThreadWorker::new("drain", move |_ctx| {
//!     while let Fetched::Data(item) = drained.fetch() {
//!         println!("processing {}", item);
//!     }
//! });
//! worker.run(1)?;
//!
//! // Producers push shared handles.
//! for n in 0..10 {
//!     pool.push(Handle::new(n)).unwrap();
//! }
//!
//! // Closing the pool unblocks the worker's fetch loop.
//! pool.close();
//! worker.wait()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Priority and batch operations
//!
//! ```rust
//! use concurrent_pool::{BoundedQueue, Handle};
//!
//! let pool = BoundedQueue::with_capacity(4);
//!
//! pool.push_batch(vec![Handle::new(1), Handle::new(2)]).unwrap();
//! pool.push_urgent(Handle::new(0)).unwrap();
//!
//! let batch = pool.fetch_batch(10);
//! let values: Vec<i32> = batch.iter().map(|h| **h).collect();
//! assert_eq!(values, vec![0, 1, 2]);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod core;
pub mod prelude;
pub mod queue;
pub mod worker;

pub use crate::core::{Result, WorkerError};
pub use crate::queue::{
    BoundedQueue, ConcurrentQueue, Fetched, Handle, Rejected, DEFAULT_CAPACITY,
};
pub use crate::worker::{ThreadWorker, WorkerContext};
