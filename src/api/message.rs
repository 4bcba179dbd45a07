//! Message-send API
//!
//! One operation (`/im/v1/messages`) carries every message type; the typed
//! [`MessageContent`] enum picks the `msg_type` and the inner content
//! document, which the platform expects JSON-encoded inside a string.

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::warn;

use crate::client::context::LarkClient;
use crate::client::transport::ApiRequest;
use crate::dispatch::{Invocation, OpContext, Operation};
use crate::error::Result;

/// Namespace the `receive_id` of an outbound message lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReceiveIdType {
    /// Application-scoped user id
    #[default]
    OpenId,
    /// Tenant-scoped user id
    UserId,
    /// Cross-application user id
    UnionId,
    /// Email address
    Email,
    /// Chat id
    ChatId,
}

impl ReceiveIdType {
    /// Wire value for the `receive_id_type` query parameter.
    pub fn as_str(self) -> &'static str {
        match self {
            ReceiveIdType::OpenId => "open_id",
            ReceiveIdType::UserId => "user_id",
            ReceiveIdType::UnionId => "union_id",
            ReceiveIdType::Email => "email",
            ReceiveIdType::ChatId => "chat_id",
        }
    }
}

/// Typed content of an outbound message.
#[derive(Debug, Clone)]
pub enum MessageContent {
    /// Plain text, `@user` markup allowed
    Text {
        /// Message text
        text: String,
    },
    /// Rich text document
    Post(Value),
    /// Previously uploaded image
    Image {
        /// Image key from the upload API
        image_key: String,
    },
    /// Group card
    ShareChat {
        /// Chat to share
        chat_id: String,
    },
    /// User card
    ShareUser {
        /// User to share
        user_id: String,
    },
    /// Voice clip
    Audio {
        /// File key from the upload API
        file_key: String,
    },
    /// Video with optional cover image
    Media {
        /// File key from the upload API
        file_key: String,
        /// Cover image key
        image_key: Option<String>,
    },
    /// Generic file
    File {
        /// File key from the upload API
        file_key: String,
    },
    /// Sticker
    Sticker {
        /// File key of the sticker
        file_key: String,
    },
}

impl MessageContent {
    /// Wire value for the `msg_type` field.
    pub fn msg_type(&self) -> &'static str {
        match self {
            MessageContent::Text { .. } => "text",
            MessageContent::Post(_) => "post",
            MessageContent::Image { .. } => "image",
            MessageContent::ShareChat { .. } => "share_chat",
            MessageContent::ShareUser { .. } => "share_user",
            MessageContent::Audio { .. } => "audio",
            MessageContent::Media { .. } => "media",
            MessageContent::File { .. } => "file",
            MessageContent::Sticker { .. } => "sticker",
        }
    }

    fn to_value(&self) -> Value {
        match self {
            MessageContent::Text { text } => json!({ "text": text }),
            MessageContent::Post(post) => post.clone(),
            MessageContent::Image { image_key } => json!({ "image_key": image_key }),
            MessageContent::ShareChat { chat_id } => json!({ "chat_id": chat_id }),
            MessageContent::ShareUser { user_id } => json!({ "user_id": user_id }),
            MessageContent::Audio { file_key } => json!({ "file_key": file_key }),
            MessageContent::Media { file_key, image_key } => match image_key {
                Some(image_key) => json!({ "file_key": file_key, "image_key": image_key }),
                None => json!({ "file_key": file_key }),
            },
            MessageContent::File { file_key } => json!({ "file_key": file_key }),
            MessageContent::Sticker { file_key } => json!({ "file_key": file_key }),
        }
    }
}

/// One outbound message.
#[derive(Debug, Clone)]
pub struct SendMessage {
    /// Receiver id, interpreted per [`ReceiveIdType`]
    pub receive_id: String,
    /// Message content
    pub content: MessageContent,
}

impl SendMessage {
    /// Build a message.
    pub fn new<S: Into<String>>(receive_id: S, content: MessageContent) -> Self {
        Self {
            receive_id: receive_id.into(),
            content,
        }
    }

    /// Build a text message.
    pub fn text<S: Into<String>, T: Into<String>>(receive_id: S, text: T) -> Self {
        Self::new(
            receive_id,
            MessageContent::Text { text: text.into() },
        )
    }

    fn to_payload(&self) -> Result<Value> {
        Ok(json!({
            "receive_id": self.receive_id,
            "msg_type": self.content.msg_type(),
            "content": serde_json::to_string(&self.content.to_value())?,
        }))
    }
}

/// Per-call input of [`SendMessageOp`].
pub struct SendMessageInput {
    /// The message to send
    pub message: SendMessage,
    /// Namespace of `message.receive_id`
    pub receive_id_type: ReceiveIdType,
}

/// The `/im/v1/messages` send operation.
pub struct SendMessageOp;

#[async_trait]
impl Operation for SendMessageOp {
    type Input = SendMessageInput;
    type Output = Option<String>;

    fn name(&self) -> &'static str {
        "im.message.send"
    }

    async fn run(&self, cx: &OpContext, input: Self::Input) -> Result<Self::Output> {
        let payload = input.message.to_payload()?;
        let resp = cx
            .call_remote(
                ApiRequest::post("/im/v1/messages")
                    .query("receive_id_type", input.receive_id_type.as_str())
                    .json(payload),
            )
            .await?;
        Ok(resp
            .data
            .get("message_id")
            .and_then(Value::as_str)
            .map(String::from))
    }
}

/// Message-send surface of a [`LarkClient`].
pub struct MessageApi<'a> {
    pub(crate) client: &'a LarkClient,
}

impl MessageApi<'_> {
    /// Send a message, returning the platform `message_id`.
    pub fn send(&self, message: SendMessage, receive_id_type: ReceiveIdType) -> Invocation<Option<String>> {
        self.client.invoke(
            &self.client.ops().send_message,
            SendMessageInput {
                message,
                receive_id_type,
            },
        )
    }

    /// Send plain text to an `open_id`.
    pub fn send_text(&self, text: &str, receive_id: &str) -> Invocation<Option<String>> {
        if text.trim().is_empty() {
            warn!(receive_id, "Empty text, message not sent");
            return Invocation::Completed(Ok(None));
        }
        self.send(SendMessage::text(receive_id, text), ReceiveIdType::OpenId)
    }

    /// Send rich text to an `open_id`.
    pub fn send_post(&self, post: Value, receive_id: &str) -> Invocation<Option<String>> {
        if post.is_null() {
            warn!(receive_id, "Empty post, rich text not sent");
            return Invocation::Completed(Ok(None));
        }
        self.send(
            SendMessage::new(receive_id, MessageContent::Post(post)),
            ReceiveIdType::OpenId,
        )
    }

    /// Send an uploaded image to an `open_id`.
    pub fn send_image(&self, image_key: &str, receive_id: &str) -> Invocation<Option<String>> {
        if image_key.trim().is_empty() {
            warn!(receive_id, "Empty image_key, image not sent");
            return Invocation::Completed(Ok(None));
        }
        self.send(
            SendMessage::new(receive_id, MessageContent::Image { image_key: image_key.to_string() }),
            ReceiveIdType::OpenId,
        )
    }

    /// Share a group card with an `open_id`.
    pub fn send_share_chat(&self, chat_id: &str, receive_id: &str) -> Invocation<Option<String>> {
        if chat_id.trim().is_empty() {
            warn!(receive_id, "Empty chat_id, group card not sent");
            return Invocation::Completed(Ok(None));
        }
        self.send(
            SendMessage::new(receive_id, MessageContent::ShareChat { chat_id: chat_id.to_string() }),
            ReceiveIdType::OpenId,
        )
    }

    /// Share a user card with an `open_id`.
    pub fn send_share_user(&self, user_id: &str, receive_id: &str) -> Invocation<Option<String>> {
        if user_id.trim().is_empty() {
            warn!(receive_id, "Empty user_id, user card not sent");
            return Invocation::Completed(Ok(None));
        }
        self.send(
            SendMessage::new(receive_id, MessageContent::ShareUser { user_id: user_id.to_string() }),
            ReceiveIdType::OpenId,
        )
    }

    /// Send a voice clip to an `open_id`.
    pub fn send_audio(&self, file_key: &str, receive_id: &str) -> Invocation<Option<String>> {
        if file_key.trim().is_empty() {
            warn!(receive_id, "Empty file_key, audio not sent");
            return Invocation::Completed(Ok(None));
        }
        self.send(
            SendMessage::new(receive_id, MessageContent::Audio { file_key: file_key.to_string() }),
            ReceiveIdType::OpenId,
        )
    }

    /// Send a video to an `open_id`.
    pub fn send_media(
        &self,
        file_key: &str,
        image_key: Option<&str>,
        receive_id: &str,
    ) -> Invocation<Option<String>> {
        if file_key.trim().is_empty() {
            warn!(receive_id, "Empty file_key, video not sent");
            return Invocation::Completed(Ok(None));
        }
        self.send(
            SendMessage::new(
                receive_id,
                MessageContent::Media {
                    file_key: file_key.to_string(),
                    image_key: image_key.map(String::from),
                },
            ),
            ReceiveIdType::OpenId,
        )
    }

    /// Send a file to an `open_id`.
    pub fn send_file(&self, file_key: &str, receive_id: &str) -> Invocation<Option<String>> {
        if file_key.trim().is_empty() {
            warn!(receive_id, "Empty file_key, file not sent");
            return Invocation::Completed(Ok(None));
        }
        self.send(
            SendMessage::new(receive_id, MessageContent::File { file_key: file_key.to_string() }),
            ReceiveIdType::OpenId,
        )
    }

    /// Send a sticker to an `open_id`.
    pub fn send_sticker(&self, file_key: &str, receive_id: &str) -> Invocation<Option<String>> {
        if file_key.trim().is_empty() {
            warn!(receive_id, "Empty file_key, sticker not sent");
            return Invocation::Completed(Ok(None));
        }
        self.send(
            SendMessage::new(receive_id, MessageContent::Sticker { file_key: file_key.to_string() }),
            ReceiveIdType::OpenId,
        )
    }
}
