//! Managed worker thread with cooperative stop semantics.
//!
//! A [`ThreadWorker`] wraps at most one live background thread and runs its
//! stored task once per [`run`](ThreadWorker::run) call. Stopping is
//! cooperative: [`stop`](ThreadWorker::stop) flips a shared flag that the
//! task is expected to poll via [`WorkerContext::is_running`], or the task
//! unblocks because a pool it fetches from was closed elsewhere.

use crate::core::{Result, WorkerError};
use log::{debug, error};
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// View of a worker's state handed to the task on each run.
///
/// The task observes cancellation by polling [`is_running`](Self::is_running)
/// between units of work; a task that never checks it cannot be interrupted.
pub struct WorkerContext {
    run_id: u64,
    running: Arc<AtomicBool>,
}

impl WorkerContext {
    /// The id passed to the [`run`](ThreadWorker::run) call that started
    /// this execution.
    pub fn run_id(&self) -> u64 {
        self.run_id
    }

    /// Returns `false` once a stop has been requested.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

type TaskFn = dyn Fn(&WorkerContext) + Send + Sync;

/// A movable, non-clonable wrapper around one background thread.
///
/// The worker owns a task callable fixed at construction and an identifier
/// string, and runs the task once per [`run`](Self::run) call on a dedicated
/// named OS thread. Dropping a running worker stops it cooperatively and
/// joins the thread, so no detached thread ever outlives the worker.
///
/// Moving a worker transfers the thread handle; the moved-from binding is
/// unusable afterwards, which is the compile-time form of the "source is no
/// longer running" contract.
///
/// # Example
///
/// ```rust
/// use concurrent_pool::ThreadWorker;
/// use std::sync::atomic::{AtomicU64, Ordering};
/// use std::sync::Arc;
///
/// # fn main() -> concurrent_pool::Result<()> {
/// let seen = Arc::new(AtomicU64::new(0));
/// let seen_by_task = Arc::clone(&seen);
///
/// let mut worker = ThreadWorker::new("greeter", move |ctx| {
///     seen_by_task.store(ctx.run_id(), Ordering::SeqCst);
/// });
///
/// worker.run(7)?;
/// worker.wait()?;
///
/// assert_eq!(seen.load(Ordering::SeqCst), 7);
/// assert!(!worker.is_running());
/// # Ok(())
/// # }
/// ```
pub struct ThreadWorker {
    label: String,
    run_id: u64,
    running: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
    task: Arc<TaskFn>,
}

impl ThreadWorker {
    /// Creates a worker that will run `task` once per [`run`](Self::run)
    /// call.
    ///
    /// The label identifies the worker in logs and thread names and is
    /// immutable afterwards.
    pub fn new<F>(label: impl Into<String>, task: F) -> Self
    where
        F: Fn(&WorkerContext) + Send + Sync + 'static,
    {
        Self {
            label: label.into(),
            run_id: 0,
            running: Arc::new(AtomicBool::new(false)),
            thread: None,
            task: Arc::new(task),
        }
    }

    /// Starts a background thread that invokes the task with `run_id`.
    ///
    /// Idempotent: calling `run` while the worker is already running is a
    /// no-op. A caller expecting a restart must [`stop`](Self::stop) and
    /// [`wait`](Self::wait) first. Task panics are caught and logged; they
    /// clear the running flag like a normal completion.
    ///
    /// # Errors
    ///
    /// [`WorkerError::Spawn`] if the OS refuses the thread.
    pub fn run(&mut self, run_id: u64) -> Result<()> {
        if self.running.load(Ordering::SeqCst) {
            return Ok(());
        }
        // A previous run may have finished without wait(); reap its handle
        // before spawning the next thread.
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }

        self.run_id = run_id;
        self.running.store(true, Ordering::SeqCst);

        let task = Arc::clone(&self.task);
        let running = Arc::clone(&self.running);
        let label = self.label.clone();
        let spawned = thread::Builder::new()
            .name(format!("worker-{}", self.label))
            .spawn(move || {
                debug!("worker '{}' run {} started", label, run_id);
                let ctx = WorkerContext {
                    run_id,
                    running: Arc::clone(&running),
                };
                let outcome = catch_unwind(AssertUnwindSafe(|| (task)(&ctx)));
                match outcome {
                    Ok(()) => debug!("worker '{}' run {} finished", label, run_id),
                    Err(panic_info) => {
                        let message = if let Some(s) = panic_info.downcast_ref::<&str>() {
                            s.to_string()
                        } else if let Some(s) = panic_info.downcast_ref::<String>() {
                            s.clone()
                        } else {
                            "unknown panic".to_string()
                        };
                        error!("worker '{}' run {} panicked: {}", label, run_id, message);
                    }
                }
                running.store(false, Ordering::SeqCst);
            });

        match spawned {
            Ok(thread) => {
                self.thread = Some(thread);
                Ok(())
            }
            Err(io_err) => {
                self.running.store(false, Ordering::SeqCst);
                Err(WorkerError::spawn_with_source(self.label.as_str(), io_err))
            }
        }
    }

    /// Requests a cooperative stop.
    ///
    /// Advisory only: the task keeps running until it observes
    /// [`WorkerContext::is_running`] returning `false`, and a task blocked
    /// inside a pool wait is unaffected unless that pool is closed
    /// separately.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Blocks until the background thread finishes, if one was started.
    ///
    /// Safe to call on a worker that never ran.
    ///
    /// # Errors
    ///
    /// [`WorkerError::Join`] if the thread cannot be joined cleanly.
    pub fn wait(&mut self) -> Result<()> {
        if let Some(thread) = self.thread.take() {
            thread
                .join()
                .map_err(|_| WorkerError::join(self.label.as_str(), "worker thread panicked"))?;
        }
        Ok(())
    }

    /// Returns `true` while a run is in progress and no stop was requested.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// The identifier given at construction.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// The id recorded by the most recent [`run`](Self::run) call.
    pub fn run_id(&self) -> u64 {
        self.run_id
    }
}

impl fmt::Debug for ThreadWorker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThreadWorker")
            .field("label", &self.label)
            .field("run_id", &self.run_id)
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}

impl Drop for ThreadWorker {
    fn drop(&mut self) {
        if self.is_running() {
            self.stop();
        }
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                error!("worker '{}' panicked during drop", self.label);
            }
        }
    }
}
