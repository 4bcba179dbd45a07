//! Concrete API operations built on the credential manager and the
//! dual-mode dispatch adapter.

pub mod auth;
pub mod message;

pub use auth::{AppTokenOp, AuthApi, TenantTokenOp};
pub use message::{
    MessageApi, MessageContent, ReceiveIdType, SendMessage, SendMessageInput, SendMessageOp,
};

use std::sync::Arc;

/// The client's operation registry: one reusable handle per operation,
/// created at client construction and immutable afterwards.
pub(crate) struct OperationSet {
    pub(crate) send_message: Arc<SendMessageOp>,
    pub(crate) tenant_token: Arc<TenantTokenOp>,
    pub(crate) app_token: Arc<AppTokenOp>,
}

impl OperationSet {
    pub(crate) fn new() -> Self {
        Self {
            send_message: Arc::new(SendMessageOp),
            tenant_token: Arc::new(TenantTokenOp),
            app_token: Arc::new(AppTokenOp),
        }
    }
}
