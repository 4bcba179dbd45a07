//! Token-issuance API
//!
//! Thin operations over the unauthenticated issuance endpoints. Results
//! land in the client's token store, so a subsequent authenticated call
//! picks them up without another acquisition.

use async_trait::async_trait;

use crate::client::context::LarkClient;
use crate::dispatch::{Invocation, OpContext, Operation};
use crate::error::Result;
use crate::token::{IssuedAppToken, IssuedToken};

/// The tenant-token issuance operation.
pub struct TenantTokenOp;

#[async_trait]
impl Operation for TenantTokenOp {
    type Input = ();
    type Output = IssuedToken;

    fn name(&self) -> &'static str {
        "auth.tenant_access_token"
    }

    async fn run(&self, cx: &OpContext, _input: ()) -> Result<Self::Output> {
        cx.ensure_active()?;
        let issued = cx.credentials().issue_tenant().await;
        cx.ensure_active()?;
        issued
    }
}

/// The app-token issuance operation.
pub struct AppTokenOp;

#[async_trait]
impl Operation for AppTokenOp {
    type Input = ();
    type Output = IssuedAppToken;

    fn name(&self) -> &'static str {
        "auth.app_access_token"
    }

    async fn run(&self, cx: &OpContext, _input: ()) -> Result<Self::Output> {
        cx.ensure_active()?;
        let issued = cx.credentials().issue_app().await;
        cx.ensure_active()?;
        issued
    }
}

/// Auth surface of a [`LarkClient`].
pub struct AuthApi<'a> {
    pub(crate) client: &'a LarkClient,
}

impl AuthApi<'_> {
    /// Issue (and cache) a tenant access token.
    pub fn tenant_access_token(&self) -> Invocation<IssuedToken> {
        self.client.invoke(&self.client.ops().tenant_token, ())
    }

    /// Issue (and cache) an app access token.
    pub fn app_access_token(&self) -> Invocation<IssuedAppToken> {
        self.client.invoke(&self.client.ops().app_token, ())
    }
}
