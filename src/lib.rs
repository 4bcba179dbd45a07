//! Lark Bot - Bot Integration Runtime for the Lark/Feishu Open Platform
//!
//! This crate provides the execution substrate for a chat bot: it
//! authenticates as an application, ingests signed/encrypted webhook
//! events, and issues outbound API calls with the same credential.
//!
//! # Features
//!
//! - **Token Lifecycle**: acquisition, caching, and expiry-aware refresh
//!   over a pluggable store
//! - **Dual-Mode Dispatch**: every API operation callable blocking or as a
//!   scheduled task, from one implementation
//! - **Webhook Pipeline**: signature verification, payload decryption,
//!   schema-version detection, and typed event resolution
//! - **Message Sending**: the full `/im/v1/messages` content surface
//!
//! # Architecture
//!
//! ```text
//! Platform ──▶ Webhook Pipeline ──▶ EventHandler (user code)
//!                                        │
//!                                        ▼
//!                                  API Operations
//!                                        │
//!                                        ▼
//!              Dispatch Adapter ──▶ Credential Manager ──▶ TokenStore
//!                     │                       │
//!                     ▼                       ▼
//!               Scheduler                HTTP Transport
//! ```
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use lark_bot::{BotConfig, LarkClient};
//!
//! fn main() -> lark_bot::Result<()> {
//!     let client = LarkClient::new(BotConfig::new("cli_xxx", "secret"))?;
//!
//!     // Blocking mode (the default): the call runs to completion.
//!     let message_id = client
//!         .messages()
//!         .send_text("hello", "ou_84aad35d084aa403a838cf73ee18467")
//!         .ready()
//!         .expect("blocking mode completes inline")?;
//!
//!     println!("sent: {message_id:?}");
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod api;
pub mod client;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod token;
pub mod webhook;

// Re-exports for convenience
pub use api::{MessageApi, MessageContent, ReceiveIdType, SendMessage};
pub use client::{ApiRequest, ApiResponse, LarkClient, Transport};
pub use config::BotConfig;
pub use dispatch::{CallMode, Invocation, OpContext, Operation, OperationHandle};
pub use error::{Error, Result};
pub use token::{CredentialManager, MemoryStore, TokenKind, TokenStore};
pub use webhook::{webhook_router, EventEnvelope, EventHandler, EventPayload, WebhookState};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
