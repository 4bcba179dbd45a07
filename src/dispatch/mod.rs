//! Dual-mode invocation adapter
//!
//! Every API operation is authored once (see [`Operation`]) and invoked in
//! one of two calling conventions, chosen per client instance and read at
//! call time:
//!
//! - **Blocking**: the calling thread drives the client's scheduler until
//!   the operation resolves and gets the final result directly.
//! - **Scheduled**: the operation is submitted to the scheduler and the
//!   call returns immediately with an [`OperationHandle`] future.
//!
//! Per invocation the lifecycle is `Created → Running → {Completed |
//! Failed}`; in scheduled mode the task additionally suspends at each
//! remote-call step inside [`OpContext::call_remote`]. Steps within one
//! invocation execute in authored order; concurrent invocations interleave
//! freely at their suspension points.

pub mod handle;
pub mod operation;
pub mod scheduler;

pub use handle::{Invocation, OperationHandle};
pub use operation::{OpContext, Operation};
pub use scheduler::Scheduler;

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

/// Calling convention for dispatched operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallMode {
    /// Run operations to completion on the calling thread.
    Blocking,
    /// Submit operations to the scheduler and return a handle.
    Scheduled,
}

/// Routes operation invocations through the scheduler according to the
/// client's current [`CallMode`].
pub struct Dispatcher {
    scheduler: Arc<Scheduler>,
    mode: RwLock<CallMode>,
}

impl Dispatcher {
    /// Create a dispatcher in the given initial mode.
    pub fn new(scheduler: Arc<Scheduler>, mode: CallMode) -> Self {
        Self {
            scheduler,
            mode: RwLock::new(mode),
        }
    }

    /// Current calling mode.
    pub fn mode(&self) -> CallMode {
        *self.mode.read()
    }

    /// Switch the calling mode; only subsequent calls are affected.
    pub fn set_mode(&self, mode: CallMode) {
        *self.mode.write() = mode;
    }

    /// Invoke `op` with `input` under the mode in effect right now.
    pub fn dispatch<O>(&self, op: Arc<O>, cx: OpContext, input: O::Input) -> Invocation<O::Output>
    where
        O: Operation + 'static,
    {
        let mode = self.mode();
        debug!(operation = op.name(), mode = ?mode, "Dispatching operation");
        let cancelled = cx.cancel_flag();

        match mode {
            CallMode::Blocking => {
                let result = self
                    .scheduler
                    .block_on(async move { op.run(&cx, input).await });
                Invocation::Completed(result)
            }
            CallMode::Scheduled => {
                let task = self
                    .scheduler
                    .spawn(async move { op.run(&cx, input).await });
                Invocation::Scheduled(OperationHandle { task, cancelled })
            }
        }
    }
}
