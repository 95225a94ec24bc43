//! Convenient re-exports for common types

pub use crate::core::{Result, WorkerError};
pub use crate::queue::{BoundedQueue, ConcurrentQueue, Fetched, Handle, Rejected};
pub use crate::worker::{ThreadWorker, WorkerContext};
