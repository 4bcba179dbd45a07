//! Client context
//!
//! One [`LarkClient`] per logical bot/application instance. The client owns
//! the token store, the credential manager, and the scheduler, and exposes
//! the API surfaces whose operations run through the dual-mode dispatcher.

use std::sync::Arc;

use crate::api::{AuthApi, MessageApi, OperationSet};
use crate::client::transport::{HttpTransport, Transport};
use crate::config::BotConfig;
use crate::dispatch::{CallMode, Dispatcher, Invocation, OpContext, Operation, Scheduler};
use crate::error::Result;
use crate::token::{CredentialManager, MemoryStore, TokenStore};

/// A configured bot application instance.
///
/// Cheap to clone; clones share the token store, scheduler, and mode flag.
///
/// # Calling modes
///
/// The client starts in [`CallMode::Blocking`]: API calls run to completion
/// on the calling thread. Switch to [`CallMode::Scheduled`] to get task
/// handles instead; the flag is read at call time, so toggling only affects
/// subsequent calls.
///
/// # Example
///
/// ```rust,no_run
/// use lark_bot::{BotConfig, CallMode, LarkClient};
///
/// fn main() -> lark_bot::Result<()> {
///     let client = LarkClient::new(BotConfig::from_env()?)?;
///     let message_id = client
///         .messages()
///         .send_text("hello", "ou_84aad35d084aa403a838cf73ee18467")
///         .ready()
///         .expect("blocking mode returns a completed result")?;
///     println!("sent {message_id:?}");
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct LarkClient {
    config: Arc<BotConfig>,
    transport: Arc<dyn Transport>,
    credentials: Arc<CredentialManager>,
    dispatcher: Arc<Dispatcher>,
    ops: Arc<OperationSet>,
}

impl LarkClient {
    /// Build a client with the HTTP transport and an in-process token
    /// store.
    pub fn new(config: BotConfig) -> Result<Self> {
        let transport = Arc::new(HttpTransport::new(&config)?);
        let store = Arc::new(MemoryStore::new(config.refresh_margin));
        Self::with_parts(config, transport, store)
    }

    /// Build a client over an explicit transport and token store.
    ///
    /// This is the seam for shared external stores and for tests.
    pub fn with_parts(
        config: BotConfig,
        transport: Arc<dyn Transport>,
        store: Arc<dyn TokenStore>,
    ) -> Result<Self> {
        let credentials = Arc::new(CredentialManager::new(&config, transport.clone(), store));
        let scheduler = Arc::new(Scheduler::current_or_owned()?);
        let dispatcher = Arc::new(Dispatcher::new(scheduler, CallMode::Blocking));
        Ok(Self {
            config: Arc::new(config),
            transport,
            credentials,
            dispatcher,
            ops: Arc::new(OperationSet::new()),
        })
    }

    /// The client configuration.
    pub fn config(&self) -> &BotConfig {
        &self.config
    }

    /// Current calling mode.
    pub fn mode(&self) -> CallMode {
        self.dispatcher.mode()
    }

    /// Switch the calling mode for subsequent calls.
    pub fn set_mode(&self, mode: CallMode) {
        self.dispatcher.set_mode(mode);
    }

    /// The credential manager owned by this client.
    pub fn credentials(&self) -> &CredentialManager {
        &self.credentials
    }

    /// Message-send API surface.
    pub fn messages(&self) -> MessageApi<'_> {
        MessageApi { client: self }
    }

    /// Token-issuance API surface.
    pub fn auth(&self) -> AuthApi<'_> {
        AuthApi { client: self }
    }

    pub(crate) fn ops(&self) -> &OperationSet {
        &self.ops
    }

    pub(crate) fn invoke<O>(&self, op: &Arc<O>, input: O::Input) -> Invocation<O::Output>
    where
        O: Operation + 'static,
    {
        let cx = OpContext::new(self.transport.clone(), self.credentials.clone());
        self.dispatcher.dispatch(op.clone(), cx, input)
    }
}
