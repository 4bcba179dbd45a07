//! Operation authoring model
//!
//! An [`Operation`] is written once as a sequence of steps: plain logic
//! interleaved with awaitable remote calls issued through the
//! [`OpContext`]. The context is the operation's only door to the network,
//! which gives the dispatcher a uniform place to inject credentials and to
//! observe cancellation at every step boundary.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use crate::client::transport::{ApiRequest, ApiResponse, Transport};
use crate::error::{Error, Result};
use crate::token::{CredentialManager, TokenKind};

/// A named unit of business logic dispatchable in either calling mode.
///
/// Implementations are created once at client construction and reused for
/// every call; per-call data travels through `Input`.
#[async_trait]
pub trait Operation: Send + Sync {
    /// Per-call input.
    type Input: Send + 'static;
    /// Final result of a successful run.
    type Output: Send + 'static;

    /// Operation name, unique within a client. Used for tracing.
    fn name(&self) -> &'static str;

    /// Execute the operation's steps in order. Any remote-call failure
    /// aborts the remaining steps; the error reaches the caller the same
    /// way in both calling modes.
    async fn run(&self, cx: &OpContext, input: Self::Input) -> Result<Self::Output>;
}

/// Per-invocation execution context handed to [`Operation::run`].
pub struct OpContext {
    transport: Arc<dyn Transport>,
    credentials: Arc<CredentialManager>,
    cancelled: Arc<AtomicBool>,
}

impl OpContext {
    pub(crate) fn new(transport: Arc<dyn Transport>, credentials: Arc<CredentialManager>) -> Self {
        Self {
            transport,
            credentials,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub(crate) fn cancel_flag(&self) -> Arc<AtomicBool> {
        self.cancelled.clone()
    }

    pub(crate) fn credentials(&self) -> &CredentialManager {
        &self.credentials
    }

    /// True once the invocation's handle was cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Cancellation checkpoint: errors with [`Error::Cancelled`] once the
    /// handle was cancelled, preventing further steps from being scheduled.
    pub fn ensure_active(&self) -> Result<()> {
        if self.is_cancelled() {
            return Err(Error::Cancelled);
        }
        Ok(())
    }

    /// Issue one remote call: inject a bearer token when the request wants
    /// auth, execute it, and surface a non-zero envelope code as a
    /// [`crate::error::PlatformError`].
    ///
    /// This is the operation's suspension point. Cancellation is observed
    /// before the call is issued and again after it resolves; a call that
    /// was already in flight when the handle was cancelled runs to
    /// completion and its result is discarded.
    pub async fn call_remote(&self, mut req: ApiRequest) -> Result<ApiResponse> {
        self.ensure_active()?;

        if req.auth {
            let token = self.credentials.get_token(TokenKind::Tenant).await?;
            req.bearer = Some(token);
        }

        let result = self.transport.request(req).await;
        self.ensure_active()?;

        result?.ok()
    }
}
