//! Event envelope and typed payloads
//!
//! Two schema generations coexist on the wire. The legacy flat format marks
//! itself with `"type": "event_callback"`; the current one carries
//! `"schema": "2.0"` and wraps its metadata in a `header` object. Both are
//! normalized into one [`EventEnvelope`] before reaching the handler.
//!
//! Known event types resolve to strongly typed records through a fixed
//! registry; anything else passes through untyped so new platform event
//! types never break ingestion.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use crate::error::WebhookError;

/// Event type for an inbound message.
pub const EVENT_MESSAGE_RECEIVE: &str = "im.message.receive_v1";
/// Event type for a reaction added to a message.
pub const EVENT_REACTION_CREATED: &str = "im.message.reaction.created_v1";

/// Webhook payload generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaVersion {
    /// Legacy flat format (`"type": "event_callback"`)
    V1,
    /// Header-wrapped format (`"schema": "2.0"`)
    V2,
}

/// Normalized metadata of one delivery.
#[derive(Debug, Clone, Deserialize)]
pub struct EventHeader {
    /// Unique delivery id; callers use it for idempotent logging/dedup
    pub event_id: String,
    /// Verification token echoed by the platform
    #[serde(default)]
    pub token: String,
    /// Delivery creation time as reported by the platform
    #[serde(default)]
    pub create_time: String,
    /// Event type key, e.g. `im.message.receive_v1`
    pub event_type: String,
    /// Tenant identifier
    #[serde(default)]
    pub tenant_key: String,
    /// Application id the event was delivered to
    #[serde(default)]
    pub app_id: String,
}

impl EventHeader {
    /// Delivery creation time, when the platform timestamp parses.
    ///
    /// The platform reports seconds, milliseconds, or microseconds
    /// depending on the payload generation.
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        let raw: i64 = self.create_time.split('.').next()?.parse().ok()?;
        let millis = if raw >= 1_000_000_000_000_000 {
            raw / 1000
        } else if raw >= 1_000_000_000_000 {
            raw
        } else {
            raw.checked_mul(1000)?
        };
        DateTime::from_timestamp_millis(millis)
    }
}

/// One normalized inbound webhook delivery.
#[derive(Debug, Clone)]
pub struct EventEnvelope {
    /// Payload generation the delivery arrived in
    pub schema: SchemaVersion,
    /// Delivery metadata
    pub header: EventHeader,
    /// Typed-or-generic event body
    pub payload: EventPayload,
}

/// Typed-or-generic event body.
#[derive(Debug, Clone)]
pub enum EventPayload {
    /// An inbound message
    MessageReceived(MessageReceivedEvent),
    /// A reaction added to a message
    ReactionCreated(ReactionCreatedEvent),
    /// Any event type absent from the registry
    Unknown(Value),
}

impl EventPayload {
    /// True when the payload resolved to a typed record.
    pub fn is_typed(&self) -> bool {
        !matches!(self, EventPayload::Unknown(_))
    }
}

/// Map an event body through the type registry.
///
/// Unknown event types pass through as [`EventPayload::Unknown`]; a
/// registered type that fails to parse is a [`WebhookError::Validation`].
pub(crate) fn resolve_payload(event_type: &str, body: Value) -> Result<EventPayload, WebhookError> {
    match event_type {
        EVENT_MESSAGE_RECEIVE => serde_json::from_value(body)
            .map(EventPayload::MessageReceived)
            .map_err(|e| WebhookError::Validation(format!("{EVENT_MESSAGE_RECEIVE}: {e}"))),
        EVENT_REACTION_CREATED => serde_json::from_value(body)
            .map(EventPayload::ReactionCreated)
            .map_err(|e| WebhookError::Validation(format!("{EVENT_REACTION_CREATED}: {e}"))),
        _ => Ok(EventPayload::Unknown(body)),
    }
}

// =============================================================================
// Message-receive event
// =============================================================================

/// User identity across the three id namespaces.
#[derive(Debug, Clone, Deserialize)]
pub struct UserId {
    /// Cross-application id
    #[serde(default)]
    pub union_id: Option<String>,
    /// Tenant-scoped id
    #[serde(default)]
    pub user_id: Option<String>,
    /// Application-scoped id; the one outbound sends address by default
    pub open_id: String,
}

/// Chat container kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatType {
    /// Direct chat
    P2p,
    /// Group chat
    Group,
    /// Any kind this crate does not model
    #[serde(other)]
    Unknown,
}

/// One `@mention` inside a message.
#[derive(Debug, Clone, Deserialize)]
pub struct Mention {
    /// Placeholder key inside the message text, e.g. `@_user_1`
    pub key: String,
    /// Mentioned user
    pub id: UserId,
    /// Display name
    pub name: String,
    /// Tenant of the mentioned user
    #[serde(default)]
    pub tenant_key: String,
}

/// Message author.
#[derive(Debug, Clone, Deserialize)]
pub struct Sender {
    /// Author identity
    pub sender_id: UserId,
    /// Author kind, `user` for now
    pub sender_type: String,
    /// Author tenant
    #[serde(default)]
    pub tenant_key: String,
}

/// The message carried by a message-receive event.
///
/// `content` is a JSON document nested in a string, exactly as delivered.
#[derive(Debug, Clone, Deserialize)]
pub struct ReceivedMessage {
    /// Message id, usable as `root`/`parent` for replies
    pub message_id: String,
    /// Message type key (`text`, `image`, ...)
    pub message_type: String,
    /// Raw JSON-in-a-string content
    pub content: String,
    /// Root of the reply thread
    #[serde(default)]
    pub root_id: Option<String>,
    /// Direct parent in the reply thread
    #[serde(default)]
    pub parent_id: Option<String>,
    /// Send time
    #[serde(default)]
    pub create_time: Option<String>,
    /// Chat the message arrived in
    #[serde(default)]
    pub chat_id: Option<String>,
    /// Chat container kind
    #[serde(default)]
    pub chat_type: Option<ChatType>,
    /// Mentions inside the message
    #[serde(default)]
    pub mentions: Option<Vec<Mention>>,
}

impl ReceivedMessage {
    /// Parse the nested content string as JSON.
    pub fn content_json(&self) -> Result<Value, WebhookError> {
        serde_json::from_str(&self.content)
            .map_err(|e| WebhookError::Validation(format!("message content: {e}")))
    }

    /// Text of a `text` message, if that is what this is.
    pub fn text(&self) -> Option<String> {
        if self.message_type != "text" {
            return None;
        }
        self.content_json()
            .ok()?
            .get("text")
            .and_then(Value::as_str)
            .map(String::from)
    }
}

/// Typed body of `im.message.receive_v1`.
#[derive(Debug, Clone, Deserialize)]
pub struct MessageReceivedEvent {
    /// Message author
    pub sender: Sender,
    /// The message itself
    pub message: ReceivedMessage,
}

// =============================================================================
// Reaction-created event
// =============================================================================

/// Emoji attached by a reaction.
#[derive(Debug, Clone, Deserialize)]
pub struct ReactionType {
    /// Emoji key, e.g. `THUMBSUP`
    pub emoji_type: String,
}

/// Typed body of `im.message.reaction.created_v1`.
#[derive(Debug, Clone, Deserialize)]
pub struct ReactionCreatedEvent {
    /// Message the reaction was added to
    pub message_id: String,
    /// The emoji
    pub reaction_type: ReactionType,
    /// Operator kind
    #[serde(default)]
    pub operator_type: String,
    /// Reacting user
    pub user_id: UserId,
    /// Application id, when delivered
    #[serde(default)]
    pub app_id: Option<String>,
    /// Reaction time
    #[serde(default)]
    pub action_time: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_resolve_message_receive() {
        let body = json!({
            "sender": {
                "sender_id": {
                    "union_id": "on_8ed6aa67826108097d9ee143816345",
                    "user_id": "e33ggbyz",
                    "open_id": "ou_84aad35d084aa403a838cf73ee18467"
                },
                "sender_type": "user",
                "tenant_key": "736588c9260f175e"
            },
            "message": {
                "message_id": "om_5ce6d572455d361153b7cb51da133945",
                "create_time": "1609073151345",
                "chat_id": "oc_5ce6d572455d361153b7xx51da133945",
                "chat_type": "group",
                "message_type": "text",
                "content": "{\"text\":\"@_user_1 hello\"}",
                "mentions": [{
                    "key": "@_user_1",
                    "id": {
                        "union_id": "on_8ed6aa67826108097d9ee143816345",
                        "user_id": "e33ggbyz",
                        "open_id": "ou_84aad35d084aa403a838cf73ee18467"
                    },
                    "name": "Tom",
                    "tenant_key": "736588c9260f175e"
                }]
            }
        });

        let payload = resolve_payload(EVENT_MESSAGE_RECEIVE, body).unwrap();
        match payload {
            EventPayload::MessageReceived(event) => {
                assert_eq!(event.sender.sender_id.open_id, "ou_84aad35d084aa403a838cf73ee18467");
                assert_eq!(event.message.chat_type, Some(ChatType::Group));
                assert_eq!(event.message.text().as_deref(), Some("@_user_1 hello"));
                assert_eq!(event.message.mentions.unwrap()[0].name, "Tom");
            }
            other => panic!("expected MessageReceived, got {other:?}"),
        }
    }

    #[test]
    fn test_resolve_reaction_created() {
        let body = json!({
            "message_id": "om_5ce6d572455d361153b7cb51da133945",
            "reaction_type": {"emoji_type": "THUMBSUP"},
            "operator_type": "user",
            "user_id": {
                "union_id": "on_x",
                "user_id": "u_x",
                "open_id": "ou_x"
            },
            "action_time": "1609073151345"
        });

        let payload = resolve_payload(EVENT_REACTION_CREATED, body).unwrap();
        match payload {
            EventPayload::ReactionCreated(event) => {
                assert_eq!(event.reaction_type.emoji_type, "THUMBSUP");
                assert_eq!(event.user_id.open_id, "ou_x");
            }
            other => panic!("expected ReactionCreated, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_type_passes_through() {
        let body = json!({"anything": ["goes", 42]});
        let payload = resolve_payload("contact.user_group.created_v3", body.clone()).unwrap();
        match payload {
            EventPayload::Unknown(value) => assert_eq!(value, body),
            other => panic!("expected Unknown, got {other:?}"),
        }
    }

    #[test]
    fn test_registered_type_with_bad_shape_is_validation_error() {
        let err = resolve_payload(EVENT_MESSAGE_RECEIVE, json!({"not": "a message"})).unwrap_err();
        assert!(matches!(err, WebhookError::Validation(_)));
    }

    #[test]
    fn test_non_text_message_has_no_text() {
        let message = ReceivedMessage {
            message_id: "om_x".to_string(),
            message_type: "image".to_string(),
            content: "{\"image_key\":\"img_x\"}".to_string(),
            root_id: None,
            parent_id: None,
            create_time: None,
            chat_id: None,
            chat_type: None,
            mentions: None,
        };
        assert_eq!(message.text(), None);
        assert_eq!(message.content_json().unwrap()["image_key"], "img_x");
    }

    #[test]
    fn test_header_created_at_units() {
        let mut header = EventHeader {
            event_id: "e".to_string(),
            token: String::new(),
            create_time: "1603977298".to_string(),
            event_type: "t".to_string(),
            tenant_key: String::new(),
            app_id: String::new(),
        };
        let seconds = header.created_at().unwrap();

        header.create_time = "1603977298000".to_string();
        assert_eq!(header.created_at().unwrap(), seconds);

        header.create_time = "1603977298000000".to_string();
        assert_eq!(header.created_at().unwrap(), seconds);

        header.create_time = "not a number".to_string();
        assert!(header.created_at().is_none());
    }
}
