//! Client-owned cooperative scheduler
//!
//! Each client context owns (or borrows) exactly one scheduler. Blocking
//! invocations drive it until their single task resolves; scheduled
//! invocations submit tasks and hand back a future. The drive mutex makes
//! blocking entry non-reentrant: concurrent blocking calls from threads
//! sharing one client serialize here.

use std::future::Future;

use parking_lot::Mutex;
use tokio::runtime::{Builder, Handle, Runtime};
use tokio::task::JoinHandle;

use crate::error::Result;

/// Execution context for dispatched operations.
///
/// [`Scheduler::new`] builds a dedicated single-worker runtime, so every
/// operation step and callback runs on the scheduler's own thread; shared
/// state touched only from scheduled operations then needs no extra
/// locking. [`Scheduler::from_handle`] borrows an already-running runtime
/// instead (the usual choice inside an async application) and inherits
/// that runtime's threading.
pub struct Scheduler {
    // Kept alive for the owned variant; tasks run on its worker thread.
    _runtime: Option<Runtime>,
    handle: Handle,
    drive: Mutex<()>,
}

impl Scheduler {
    /// Build a scheduler with its own single-worker runtime.
    pub fn new() -> Result<Self> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("lark-dispatch")
            .enable_all()
            .build()?;
        let handle = runtime.handle().clone();
        Ok(Self {
            _runtime: Some(runtime),
            handle,
            drive: Mutex::new(()),
        })
    }

    /// Borrow an already-running runtime.
    pub fn from_handle(handle: Handle) -> Self {
        Self {
            _runtime: None,
            handle,
            drive: Mutex::new(()),
        }
    }

    /// Use the ambient runtime when inside one, else build an owned one.
    ///
    /// An owned runtime must not be dropped from async context, so clients
    /// constructed inside a runtime always borrow it.
    pub fn current_or_owned() -> Result<Self> {
        match Handle::try_current() {
            Ok(handle) => Ok(Self::from_handle(handle)),
            Err(_) => Self::new(),
        }
    }

    /// Drive the scheduler until `future` resolves.
    ///
    /// Must not be called from async context (the underlying
    /// `Handle::block_on` panics there); blocking mode is for synchronous
    /// callers.
    pub(crate) fn block_on<F: Future>(&self, future: F) -> F::Output {
        let _guard = self.drive.lock();
        self.handle.block_on(future)
    }

    /// Submit a task to the scheduler.
    pub(crate) fn spawn<F>(&self, future: F) -> JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        self.handle.spawn(future)
    }
}
