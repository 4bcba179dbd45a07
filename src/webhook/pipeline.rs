//! Webhook ingestion pipeline
//!
//! Each inbound delivery walks `Received → Authenticated →
//! Decrypted(optional) → Classified → Dispatched → Acknowledged`:
//!
//! 1. **Authenticate**: recompute the SHA-1 signature when a verify token
//!    is configured; mismatch rejects with 401 before any parsing.
//! 2. **Decrypt**: a body carrying an `encrypt` field is AES-256-CBC
//!    decrypted and reparsed; failure rejects with 400.
//! 3. **Classify**: `url_verification` short-circuits with the challenge
//!    echo; otherwise the schema generation is detected and the envelope
//!    normalized.
//! 4. **Resolve**: the event type maps through the registry to a typed
//!    record, or passes through untyped. A registered type that fails to
//!    parse is logged and acknowledged without dispatch.
//! 5. **Dispatch**: the envelope is queued fire-and-forget; the HTTP
//!    response is an immediate `200 {}` regardless of handler outcome.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use http::StatusCode;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::config::BotConfig;
use crate::error::WebhookError;
use crate::webhook::crypto::EventCipher;
use crate::webhook::dispatcher::{DispatcherHandle, EventDispatcher, EventHandler};
use crate::webhook::event::{resolve_payload, EventEnvelope, EventHeader, SchemaVersion};
use crate::webhook::signature::{verify_signature, HEADER_NONCE, HEADER_SIGNATURE, HEADER_TIMESTAMP};

/// Shared state of the webhook endpoint.
pub struct WebhookState {
    verify_token: Option<String>,
    cipher: Option<EventCipher>,
    dispatcher: EventDispatcher,
}

impl WebhookState {
    /// Build the endpoint state from the bot configuration and a handler.
    ///
    /// Returns the state plus the dispatcher's background half, which must
    /// be spawned for events to reach the handler.
    pub fn new(config: &BotConfig, handler: Arc<dyn EventHandler>) -> (Self, DispatcherHandle) {
        let (dispatcher, handle) = EventDispatcher::new(handler);
        (
            Self {
                verify_token: config.verify_token.clone(),
                cipher: config.encrypt_key.as_deref().map(EventCipher::new),
                dispatcher,
            },
            handle,
        )
    }
}

/// Build a router exposing the event endpoint at `path`.
pub fn webhook_router(path: &str, state: Arc<WebhookState>) -> Router {
    Router::new()
        .route(path, post(handle_event))
        .with_state(state)
}

async fn handle_event(
    State(state): State<Arc<WebhookState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    match process(&state, &headers, &body) {
        Ok(reply) => (StatusCode::OK, Json(reply)).into_response(),
        Err(err) => {
            let status = match &err {
                WebhookError::Signature(_) => StatusCode::UNAUTHORIZED,
                _ => StatusCode::BAD_REQUEST,
            };
            warn!(error = %err, "Rejected webhook delivery");
            (status, Json(json!({"msg": err.to_string()}))).into_response()
        }
    }
}

fn process(state: &WebhookState, headers: &HeaderMap, body: &[u8]) -> Result<Value, WebhookError> {
    if let Some(token) = &state.verify_token {
        authenticate(token, headers, body)?;
    }

    let mut payload: Value = serde_json::from_slice(body)
        .map_err(|e| WebhookError::Malformed(format!("body is not JSON: {e}")))?;

    if let Some(encoded) = payload.get("encrypt").and_then(Value::as_str) {
        let cipher = state.cipher.as_ref().ok_or_else(|| {
            WebhookError::Decryption("encrypted delivery but no encrypt_key configured".to_string())
        })?;
        let plaintext = cipher.decrypt(encoded)?;
        payload = serde_json::from_str(&plaintext).map_err(|_| {
            WebhookError::Decryption("decrypted payload is not valid JSON".to_string())
        })?;
    }

    if payload.get("type").and_then(Value::as_str) == Some("url_verification") {
        return Ok(url_verification(state.verify_token.as_deref(), &payload));
    }

    let (schema, header, event_body) = classify(payload)?;

    let event_payload = match resolve_payload(&header.event_type, event_body) {
        Ok(event_payload) => event_payload,
        Err(err) => {
            // Isolated to this one event; the delivery is still acknowledged.
            warn!(
                event_id = %header.event_id,
                event_type = %header.event_type,
                error = %err,
                "Event failed typed validation"
            );
            return Ok(json!({}));
        }
    };

    debug!(
        event_id = %header.event_id,
        event_type = %header.event_type,
        schema = ?schema,
        typed = event_payload.is_typed(),
        "Dispatching event"
    );
    state.dispatcher.dispatch(EventEnvelope {
        schema,
        header,
        payload: event_payload,
    });

    Ok(json!({}))
}

fn authenticate(verify_token: &str, headers: &HeaderMap, body: &[u8]) -> Result<(), WebhookError> {
    let timestamp = header_str(headers, HEADER_TIMESTAMP)?;
    let nonce = header_str(headers, HEADER_NONCE)?;
    let signature = header_str(headers, HEADER_SIGNATURE)?;
    verify_signature(verify_token, timestamp, nonce, signature, body)
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Result<&'a str, WebhookError> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| WebhookError::Signature(format!("missing header {name}")))
}

fn url_verification(verify_token: Option<&str>, payload: &Value) -> Value {
    if let Some(expected) = verify_token {
        if payload.get("token").and_then(Value::as_str) != Some(expected) {
            // Misconfiguration signal: answer without exposing the challenge.
            warn!("url_verification token mismatch");
            return json!({ "challenge": "" });
        }
    }
    let challenge = payload.get("challenge").and_then(Value::as_str).unwrap_or_default();
    json!({ "challenge": challenge })
}

fn classify(payload: Value) -> Result<(SchemaVersion, EventHeader, Value), WebhookError> {
    if payload.get("type").and_then(Value::as_str) == Some("event_callback") {
        let event = payload.get("event").cloned().unwrap_or(Value::Null);
        let header = EventHeader {
            event_id: str_at(&payload, "uuid"),
            token: str_at(&payload, "token"),
            create_time: str_at(&payload, "ts"),
            event_type: str_at(&event, "type"),
            tenant_key: str_at(&event, "tenant_key"),
            app_id: str_at(&event, "app_id"),
        };
        return Ok((SchemaVersion::V1, header, event));
    }

    if payload.get("schema").and_then(Value::as_str) == Some("2.0") {
        let header: EventHeader =
            serde_json::from_value(payload.get("header").cloned().unwrap_or(Value::Null))
                .map_err(|e| WebhookError::Malformed(format!("invalid event header: {e}")))?;
        let event = payload.get("event").cloned().unwrap_or(Value::Null);
        return Ok((SchemaVersion::V2, header, event));
    }

    Err(WebhookError::Malformed("unrecognized event schema".to_string()))
}

fn str_at(value: &Value, key: &str) -> String {
    value
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_v2() {
        let payload = json!({
            "schema": "2.0",
            "header": {
                "event_id": "f7984f25108f8137722bb63cee927e66",
                "token": "066zT6pS4QCbgj5Do145GfDbbagCHGgF",
                "create_time": "1603977298000000",
                "event_type": "im.message.receive_v1",
                "tenant_key": "736588c9260f175e",
                "app_id": "cli_xxx"
            },
            "event": {"k": "v"}
        });

        let (schema, header, event) = classify(payload).unwrap();
        assert_eq!(schema, SchemaVersion::V2);
        assert_eq!(header.event_type, "im.message.receive_v1");
        assert_eq!(header.tenant_key, "736588c9260f175e");
        assert_eq!(event["k"], "v");
    }

    #[test]
    fn test_classify_v1() {
        let payload = json!({
            "type": "event_callback",
            "token": "GzhQEyfUcx7eEungQFWtXgCbxSpUOJIb",
            "uuid": "5226cd85b4d843dccee2e279d93f3ed3",
            "ts": "1589970805.376395",
            "event": {
                "type": "user_status_change",
                "tenant_key": "2d520d3b434f175e",
                "app_id": "cli_9e28cb7ba56a100e"
            }
        });

        let (schema, header, event) = classify(payload).unwrap();
        assert_eq!(schema, SchemaVersion::V1);
        assert_eq!(header.event_id, "5226cd85b4d843dccee2e279d93f3ed3");
        assert_eq!(header.event_type, "user_status_change");
        assert_eq!(header.app_id, "cli_9e28cb7ba56a100e");
        assert_eq!(event["type"], "user_status_change");
    }

    #[test]
    fn test_classify_rejects_unrecognized_schema() {
        let err = classify(json!({"schema": "3.0"})).unwrap_err();
        assert!(matches!(err, WebhookError::Malformed(_)));
    }

    #[test]
    fn test_url_verification_token_match() {
        let payload = json!({"type": "url_verification", "token": "T", "challenge": "abc"});
        assert_eq!(url_verification(Some("T"), &payload), json!({"challenge": "abc"}));
    }

    #[test]
    fn test_url_verification_token_mismatch_hides_challenge() {
        let payload = json!({"type": "url_verification", "token": "wrong", "challenge": "abc"});
        assert_eq!(url_verification(Some("T"), &payload), json!({"challenge": ""}));
    }

    #[test]
    fn test_url_verification_without_configured_token() {
        let payload = json!({"type": "url_verification", "token": "anything", "challenge": "abc"});
        assert_eq!(url_verification(None, &payload), json!({"challenge": "abc"}));
    }
}
