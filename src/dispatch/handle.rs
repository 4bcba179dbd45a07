//! Invocation results and scheduled-task handles

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};

use tokio::task::JoinHandle;

use crate::error::{Error, Result};

/// Handle to an operation running on the scheduler.
///
/// Awaiting the handle yields the operation's result. [`cancel`] is
/// cooperative: it stops further steps from being scheduled, resolves the
/// handle to [`Error::Cancelled`], and lets a remote call that was already
/// issued run to completion with its result discarded.
///
/// [`cancel`]: OperationHandle::cancel
pub struct OperationHandle<T> {
    pub(crate) task: JoinHandle<Result<T>>,
    pub(crate) cancelled: Arc<AtomicBool>,
}

impl<T> OperationHandle<T> {
    /// Request cooperative cancellation.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// True once cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// True once the underlying task has finished.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl<T> Future for OperationHandle<T> {
    type Output = Result<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        match Pin::new(&mut this.task).poll(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(join_err)) => Poll::Ready(Err(Error::internal(format!(
                "operation task failed: {join_err}"
            )))),
            Poll::Pending => Poll::Pending,
        }
    }
}

/// Result of dispatching an operation, shaped by the client's mode at call
/// time.
pub enum Invocation<T> {
    /// Blocking mode ran the operation to completion.
    Completed(Result<T>),
    /// Scheduled mode returned immediately with a handle.
    Scheduled(OperationHandle<T>),
}

impl<T> Invocation<T> {
    /// The completed result, if the call ran in blocking mode.
    pub fn ready(self) -> Option<Result<T>> {
        match self {
            Invocation::Completed(result) => Some(result),
            Invocation::Scheduled(_) => None,
        }
    }

    /// The task handle, if the call ran in scheduled mode.
    pub fn handle(self) -> Option<OperationHandle<T>> {
        match self {
            Invocation::Completed(_) => None,
            Invocation::Scheduled(handle) => Some(handle),
        }
    }

    /// Resolve the invocation regardless of mode: a completed result is
    /// returned as-is, a scheduled handle is awaited.
    pub async fn resolve(self) -> Result<T> {
        match self {
            Invocation::Completed(result) => result,
            Invocation::Scheduled(handle) => handle.await,
        }
    }
}
