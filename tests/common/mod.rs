//! Shared test doubles for the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::Notify;

use lark_bot::{ApiRequest, ApiResponse, Error, Transport};

/// One recorded outbound call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub method: String,
    pub path: String,
    pub auth: bool,
    pub bearer: Option<String>,
    pub body: Option<Value>,
}

/// Transport double: canned responses per path, full call recording,
/// optional per-call delay and failure injection.
pub struct RecordingTransport {
    responses: Mutex<HashMap<String, Value>>,
    calls: Mutex<Vec<RecordedCall>>,
    delay: Mutex<Option<Duration>>,
    started: Mutex<Option<Arc<Notify>>>,
    fail_with: Mutex<Option<String>>,
}

impl RecordingTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            delay: Mutex::new(None),
            started: Mutex::new(None),
            fail_with: Mutex::new(None),
        })
    }

    /// Register the canned response for a path.
    pub fn respond(&self, path: &str, value: Value) {
        self.responses.lock().insert(path.to_string(), value);
    }

    /// Delay every call by `delay` before it completes.
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock() = Some(delay);
    }

    /// Notify `started` as soon as a call is issued (before any delay).
    pub fn notify_on_call(&self, started: Arc<Notify>) {
        *self.started.lock() = Some(started);
    }

    /// Fail the next call with a transport-level error.
    pub fn fail_next(&self, msg: &str) {
        *self.fail_with.lock() = Some(msg.to_string());
    }

    /// Calls completed so far.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    /// Paths of calls completed so far.
    pub fn call_paths(&self) -> Vec<String> {
        self.calls.lock().iter().map(|c| c.path.clone()).collect()
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn request(&self, req: ApiRequest) -> lark_bot::Result<ApiResponse> {
        if let Some(started) = self.started.lock().clone() {
            started.notify_one();
        }
        let delay = *self.delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(msg) = self.fail_with.lock().take() {
            return Err(Error::internal(msg));
        }

        // Recorded only once the call has run to completion.
        self.calls.lock().push(RecordedCall {
            method: req.method.to_string(),
            path: req.path.clone(),
            auth: req.auth,
            bearer: req.bearer().map(String::from),
            body: req.body.clone(),
        });

        let canned = self.responses.lock().get(&req.path).cloned();
        let value = canned.ok_or_else(|| Error::internal(format!("no canned response for {}", req.path)))?;
        ApiResponse::parse(value)
    }
}

/// Canned tenant-token issuance response.
pub fn tenant_token_response(token: &str) -> Value {
    serde_json::json!({
        "code": 0,
        "msg": "ok",
        "tenant_access_token": token,
        "expire": 7200
    })
}

/// Canned message-send response.
pub fn message_sent_response(message_id: &str) -> Value {
    serde_json::json!({
        "code": 0,
        "msg": "ok",
        "data": { "message_id": message_id }
    })
}

/// Encrypt a webhook payload the way the platform does: AES-256-CBC under
/// SHA-256 of the key string, IV prepended, PKCS#7 padding, base64.
pub fn encrypt_event(encrypt_key: &str, plaintext: &str) -> String {
    use aes::cipher::block_padding::Pkcs7;
    use aes::cipher::{BlockEncryptMut, KeyIvInit};
    use base64::engine::general_purpose::STANDARD as BASE64;
    use base64::Engine;
    use sha2::{Digest, Sha256};

    type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;

    let key = Sha256::digest(encrypt_key.as_bytes());
    let iv = *b"fedcba9876543210";
    let ciphertext = Aes256CbcEnc::new_from_slices(&key, &iv)
        .unwrap()
        .encrypt_padded_vec_mut::<Pkcs7>(plaintext.as_bytes());

    let mut raw = iv.to_vec();
    raw.extend_from_slice(&ciphertext);
    BASE64.encode(raw)
}
