//! Webhook ingestion: authentication, decryption, event resolution, and
//! bounded hand-off to a user handler.
//!
//! # Architecture
//!
//! ```text
//! Request -> Signature Verify -> Decrypt -> Classify -> Ack (200 {})
//!                 |                 |           |            |
//!                 v                 v           v            v
//!                401               400     url_verification  Bounded queue
//!                                           challenge echo   -> EventHandler
//! ```

pub mod crypto;
pub mod dispatcher;
pub mod event;
pub mod pipeline;
pub mod signature;

pub use crypto::EventCipher;
pub use dispatcher::{DispatcherHandle, EventDispatcher, EventHandler};
pub use event::{
    ChatType, EventEnvelope, EventHeader, EventPayload, Mention, MessageReceivedEvent,
    ReactionCreatedEvent, ReactionType, ReceivedMessage, SchemaVersion, Sender, UserId,
    EVENT_MESSAGE_RECEIVE, EVENT_REACTION_CREATED,
};
pub use pipeline::{webhook_router, WebhookState};
pub use signature::{
    compute_signature, verify_signature, HEADER_NONCE, HEADER_SIGNATURE, HEADER_TIMESTAMP,
};
