//! Webhook request authentication
//!
//! The platform signs each delivery with
//! `sha1(timestamp || nonce || verify_token || body)` and sends the hex
//! digest in `X-Lark-Signature`. Comparison is constant-time.

use sha1::{Digest, Sha1};
use subtle::ConstantTimeEq;

use crate::error::WebhookError;

/// Header carrying the delivery timestamp.
pub const HEADER_TIMESTAMP: &str = "X-Lark-Request-Timestamp";
/// Header carrying the delivery nonce.
pub const HEADER_NONCE: &str = "X-Lark-Request-Nonce";
/// Header carrying the hex signature.
pub const HEADER_SIGNATURE: &str = "X-Lark-Signature";

/// Compute the expected hex signature for a delivery.
pub fn compute_signature(verify_token: &str, timestamp: &str, nonce: &str, body: &[u8]) -> String {
    let mut hasher = Sha1::new();
    hasher.update(timestamp.as_bytes());
    hasher.update(nonce.as_bytes());
    hasher.update(verify_token.as_bytes());
    hasher.update(body);
    hex::encode(hasher.finalize())
}

/// Verify a delivery signature.
///
/// # Errors
///
/// [`WebhookError::Signature`] when the provided signature does not match
/// the recomputed one.
pub fn verify_signature(
    verify_token: &str,
    timestamp: &str,
    nonce: &str,
    signature: &str,
    body: &[u8],
) -> Result<(), WebhookError> {
    let expected = compute_signature(verify_token, timestamp, nonce, body);
    if expected.as_bytes().ct_eq(signature.as_bytes()).unwrap_u8() == 1 {
        Ok(())
    } else {
        Err(WebhookError::Signature("signature mismatch".to_string()))
    }
}
