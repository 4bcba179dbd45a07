//! Webhook payload decryption
//!
//! When an encryption key is configured in the platform console, every
//! event body arrives as `{"encrypt": "<base64>"}`. The working key is
//! SHA-256 of the configured key string; the ciphertext is AES-256-CBC
//! with the first block as IV and PKCS#7 padding.

use aes::cipher::block_padding::Pkcs7;
use aes::cipher::{BlockDecryptMut, KeyIvInit};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use sha2::{Digest, Sha256};

use crate::error::WebhookError;

type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

const BLOCK: usize = 16;

/// Decryptor for encrypted event payloads.
pub struct EventCipher {
    key: [u8; 32],
}

impl EventCipher {
    /// Derive the working key from the configured encryption key.
    pub fn new(encrypt_key: &str) -> Self {
        Self {
            key: Sha256::digest(encrypt_key.as_bytes()).into(),
        }
    }

    /// Decrypt a base64 `encrypt` field back to the plaintext JSON string.
    ///
    /// # Errors
    ///
    /// [`WebhookError::Decryption`] for bad base64, truncated or
    /// misaligned ciphertext, bad padding, or non-UTF-8 plaintext. A wrong
    /// key surfaces here as bad padding, never as silent garbage.
    pub fn decrypt(&self, encoded: &str) -> Result<String, WebhookError> {
        let raw = BASE64
            .decode(encoded)
            .map_err(|e| WebhookError::Decryption(format!("invalid base64: {e}")))?;

        if raw.len() < 2 * BLOCK || raw.len() % BLOCK != 0 {
            return Err(WebhookError::Decryption(format!(
                "ciphertext length {} is not iv + whole blocks",
                raw.len()
            )));
        }
        let (iv, ciphertext) = raw.split_at(BLOCK);

        let plaintext = Aes256CbcDec::new_from_slices(&self.key, iv)
            .map_err(|e| WebhookError::Decryption(e.to_string()))?
            .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
            .map_err(|_| WebhookError::Decryption("bad padding".to_string()))?;

        String::from_utf8(plaintext)
            .map_err(|_| WebhookError::Decryption("plaintext is not UTF-8".to_string()))
    }
}
