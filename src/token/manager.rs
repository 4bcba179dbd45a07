//! Access-token lifecycle
//!
//! The [`CredentialManager`] returns a currently-valid bearer token, hitting
//! the issuance endpoint only when the store reports the token absent.
//! Concurrent callers that both observe absence may both acquire; the second
//! write wins. Acquisition is infrequent and idempotent on the platform
//! side, so the redundant call is accepted instead of serialized.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tracing::{debug, info};

use crate::client::transport::{ApiRequest, ApiResponse, Transport};
use crate::config::{BotConfig, TOKEN_EXPIRE_TIME};
use crate::error::{CredentialError, Error, Result};
use crate::token::store::TokenStore;

/// Which application credential to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// `tenant_access_token` (self-built application acting in a tenant)
    Tenant,
    /// `app_access_token`
    App,
}

impl TokenKind {
    /// Store key for this kind.
    pub fn cache_key(self) -> &'static str {
        match self {
            TokenKind::Tenant => "tenant_access_token",
            TokenKind::App => "app_access_token",
        }
    }

    fn endpoint(self) -> &'static str {
        match self {
            TokenKind::Tenant => "/auth/v3/tenant_access_token/internal",
            TokenKind::App => "/auth/v3/app_access_token/internal",
        }
    }
}

/// A freshly issued tenant token.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    /// Bearer token value
    pub token: String,
    /// Advertised lifetime in seconds
    pub expire: u64,
}

/// A freshly issued app token; the issuance response carries the tenant
/// token as well.
#[derive(Debug, Clone)]
pub struct IssuedAppToken {
    /// App-level bearer token
    pub app_access_token: String,
    /// Tenant-level bearer token from the same response
    pub tenant_access_token: String,
    /// Advertised lifetime in seconds
    pub expire: u64,
}

/// Token acquisition, caching, and expiry-aware refresh.
pub struct CredentialManager {
    app_id: String,
    app_secret: String,
    store: Arc<dyn TokenStore>,
    transport: Arc<dyn Transport>,
}

impl CredentialManager {
    /// Create a manager over the given transport and store.
    pub fn new(config: &BotConfig, transport: Arc<dyn Transport>, store: Arc<dyn TokenStore>) -> Self {
        Self {
            app_id: config.app_id.clone(),
            app_secret: config.app_secret.clone(),
            store,
            transport,
        }
    }

    /// Return a currently-valid token of the given kind, acquiring a fresh
    /// one when the store reports it absent.
    ///
    /// # Errors
    ///
    /// [`CredentialError`] when the issuance endpoint is unreachable or
    /// answers with a non-zero code. No retry happens here; retry policy
    /// belongs to the caller.
    pub async fn get_token(&self, kind: TokenKind) -> Result<String> {
        if let Some(cached) = self.store.get(kind.cache_key()).await {
            return Ok(cached);
        }
        debug!(kind = kind.cache_key(), "Token absent from store, acquiring");
        match kind {
            TokenKind::Tenant => Ok(self.issue_tenant().await?.token),
            TokenKind::App => Ok(self.issue_app().await?.app_access_token),
        }
    }

    /// Call the tenant-token issuance endpoint and cache the result.
    pub(crate) async fn issue_tenant(&self) -> Result<IssuedToken> {
        let resp = self.issuance_request(TokenKind::Tenant).await?;

        let token = resp
            .str_field("tenant_access_token")
            .ok_or_else(|| CredentialError::Malformed("missing tenant_access_token".to_string()))?
            .to_string();
        let expire = resp.u64_field("expire").unwrap_or(TOKEN_EXPIRE_TIME.as_secs());

        self.store
            .set(TokenKind::Tenant.cache_key(), &token, Duration::from_secs(expire))
            .await;
        info!(expire, "Issued tenant access token");
        Ok(IssuedToken { token, expire })
    }

    /// Call the app-token issuance endpoint; the response carries both
    /// tokens, so both are cached.
    pub(crate) async fn issue_app(&self) -> Result<IssuedAppToken> {
        let resp = self.issuance_request(TokenKind::App).await?;

        let app_access_token = resp
            .str_field("app_access_token")
            .ok_or_else(|| CredentialError::Malformed("missing app_access_token".to_string()))?
            .to_string();
        let tenant_access_token = resp
            .str_field("tenant_access_token")
            .ok_or_else(|| CredentialError::Malformed("missing tenant_access_token".to_string()))?
            .to_string();
        let expire = resp.u64_field("expire").unwrap_or(TOKEN_EXPIRE_TIME.as_secs());

        let ttl = Duration::from_secs(expire);
        self.store
            .set(TokenKind::App.cache_key(), &app_access_token, ttl)
            .await;
        self.store
            .set(TokenKind::Tenant.cache_key(), &tenant_access_token, ttl)
            .await;
        info!(expire, "Issued app access token");
        Ok(IssuedAppToken {
            app_access_token,
            tenant_access_token,
            expire,
        })
    }

    async fn issuance_request(&self, kind: TokenKind) -> Result<ApiResponse> {
        let req = ApiRequest::post(kind.endpoint())
            .json(json!({
                "app_id": self.app_id,
                "app_secret": self.app_secret,
            }))
            .unauthenticated();

        let resp = match self.transport.request(req).await {
            Ok(resp) => resp,
            Err(Error::Http(e)) => return Err(CredentialError::Transport(e.to_string()).into()),
            Err(Error::Internal(msg)) => return Err(CredentialError::Transport(msg).into()),
            Err(other) => return Err(other),
        };

        if resp.code != 0 {
            return Err(CredentialError::Issuance {
                code: resp.code,
                msg: resp.msg,
            }
            .into());
        }
        Ok(resp)
    }
}
