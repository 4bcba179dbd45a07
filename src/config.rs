//! Runtime configuration
//!
//! All settings can be loaded from environment variables (no hardcoded
//! secrets) or assembled programmatically.
//!
//! # Environment Variables
//!
//! - `LARK_APP_ID` (required): application id issued by the platform
//! - `LARK_APP_SECRET` (required): application secret
//! - `LARK_VERIFY_TOKEN` (optional): webhook verification token; unset
//!   disables signature checking (trust-the-network mode)
//! - `LARK_ENCRYPT_KEY` (optional): webhook encryption key; unset disables
//!   payload decryption
//! - `LARK_BASE_URL` (optional): API base URL
//! - `LARK_TOKEN_REFRESH_MARGIN` (optional): seconds subtracted from a
//!   token's advertised TTL to force early renewal

use std::env;
use std::time::Duration;

use url::Url;

use crate::error::ConfigError;

/// Default open-platform API base URL
pub const DEFAULT_BASE_URL: &str = "https://open.feishu.cn/open-apis";

/// Advertised tenant token lifetime, used as a fallback TTL
pub const TOKEN_EXPIRE_TIME: Duration = Duration::from_secs(7200);

/// Time subtracted from a token's TTL so callers never observe a token that
/// expires mid-flight
pub const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(1800);

/// Configuration for one logical bot/application instance
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Application id
    pub app_id: String,
    /// Application secret
    pub app_secret: String,
    /// Webhook verification token; `None` skips signature checking
    pub verify_token: Option<String>,
    /// Webhook encryption key; `None` means events arrive in plaintext
    pub encrypt_key: Option<String>,
    /// API base URL
    pub base_url: Url,
    /// Token refresh margin (see [`TOKEN_REFRESH_MARGIN`])
    pub refresh_margin: Duration,
}

impl BotConfig {
    /// Create a configuration with default base URL and refresh margin.
    pub fn new<S: Into<String>>(app_id: S, app_secret: S) -> Self {
        Self {
            app_id: app_id.into(),
            app_secret: app_secret.into(),
            verify_token: None,
            encrypt_key: None,
            // The default constant is a valid URL
            base_url: Url::parse(DEFAULT_BASE_URL).expect("default base URL parses"),
            refresh_margin: TOKEN_REFRESH_MARGIN,
        }
    }

    /// Set the webhook verification token.
    pub fn with_verify_token<S: Into<String>>(mut self, token: S) -> Self {
        self.verify_token = Some(token.into());
        self
    }

    /// Set the webhook encryption key.
    pub fn with_encrypt_key<S: Into<String>>(mut self, key: S) -> Self {
        self.encrypt_key = Some(key.into());
        self
    }

    /// Override the API base URL.
    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = base_url;
        self
    }

    /// Override the token refresh margin.
    pub fn with_refresh_margin(mut self, margin: Duration) -> Self {
        self.refresh_margin = margin;
        self
    }

    /// Load the configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when a required variable is missing or a
    /// value fails to parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        let app_id = env::var("LARK_APP_ID").map_err(|_| ConfigError::MissingAppId)?;
        let app_secret = env::var("LARK_APP_SECRET").map_err(|_| ConfigError::MissingAppSecret)?;

        let mut config = Self::new(app_id, app_secret);

        if let Ok(token) = env::var("LARK_VERIFY_TOKEN") {
            if !token.trim().is_empty() {
                config.verify_token = Some(token.trim().to_string());
            }
        }
        if let Ok(key) = env::var("LARK_ENCRYPT_KEY") {
            if !key.trim().is_empty() {
                config.encrypt_key = Some(key.trim().to_string());
            }
        }
        if let Ok(raw) = env::var("LARK_BASE_URL") {
            config.base_url = Url::parse(&raw).map_err(|e| ConfigError::InvalidBaseUrl(e.to_string()))?;
        }
        if let Ok(raw) = env::var("LARK_TOKEN_REFRESH_MARGIN") {
            let secs: u64 = raw
                .parse()
                .map_err(|_| ConfigError::InvalidRefreshMargin(raw.clone()))?;
            config.refresh_margin = Duration::from_secs(secs);
        }

        Ok(config)
    }

    /// Base URL as a string with no trailing slash, ready for path joining.
    pub(crate) fn base_url_trimmed(&self) -> String {
        self.base_url.as_str().trim_end_matches('/').to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = BotConfig::new("cli_xxx", "secret");
        assert_eq!(config.base_url.as_str(), "https://open.feishu.cn/open-apis");
        assert_eq!(config.refresh_margin, Duration::from_secs(1800));
        assert!(config.verify_token.is_none());
        assert!(config.encrypt_key.is_none());
    }

    #[test]
    fn test_builder_style() {
        let config = BotConfig::new("cli_xxx", "secret")
            .with_verify_token("vt")
            .with_encrypt_key("ek")
            .with_refresh_margin(Duration::from_secs(60));
        assert_eq!(config.verify_token.as_deref(), Some("vt"));
        assert_eq!(config.encrypt_key.as_deref(), Some("ek"));
        assert_eq!(config.refresh_margin, Duration::from_secs(60));
    }

    #[test]
    fn test_base_url_trimmed() {
        let config = BotConfig::new("a", "b")
            .with_base_url(Url::parse("https://example.com/open-apis/").unwrap());
        assert_eq!(config.base_url_trimmed(), "https://example.com/open-apis");
    }
}
