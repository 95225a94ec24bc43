//! Core types for the pool system

pub mod error;

pub use error::{Result, WorkerError};
