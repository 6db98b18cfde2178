//! Authorization hooks a request handler exposes to its host.
//!
//! The host calls these at fixed points in the request lifecycle:
//! `prepare` before any handler runs, `current_user` whenever the handler asks
//! who is logged in, and `login_url` when an unauthenticated request must be
//! redirected. [`AuthDelegate`] answers all three from the
//! [`AuthProvider`](super::AuthProvider) configured on the application.

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use tracing::{debug, error};

use super::principal::UserIdentity;
use super::provider::{AuthError, MISSING_LOGIN_URL};
use super::request_context::RequestContext;

pub trait AuthHooks: Send + Sync {
    fn login_url(&self, ctx: &RequestContext) -> Result<String, AuthError>;

    /// Synchronous user lookup; must not suspend.
    fn get_current_user(&self, ctx: &RequestContext) -> Result<UserIdentity, AuthError>;

    /// Runs once per request before handlers; the only step allowed to await.
    fn prepare<'a>(&'a self, ctx: &'a mut RequestContext) -> BoxFuture<'a, Result<(), AuthError>>;

    /// Cached accessor: returns `ctx.current_user` when already resolved,
    /// otherwise falls back to [`AuthHooks::get_current_user`] and stores it.
    fn current_user(&self, ctx: &mut RequestContext) -> Result<UserIdentity, AuthError> {
        if let Some(user) = &ctx.current_user {
            return Ok(user.clone());
        }
        let user = self.get_current_user(ctx)?;
        ctx.current_user = Some(user.clone());
        Ok(user)
    }
}

/// Provider-backed implementation of [`AuthHooks`].
#[derive(Debug, Clone, Copy, Default)]
pub struct AuthDelegate;

impl AuthDelegate {
    pub fn resolve_login_url(&self, ctx: &RequestContext) -> Result<String, AuthError> {
        let provider = &ctx.application.auth_provider;
        if let Some(get_login_url) = &provider.get_login_url {
            let url = get_login_url(ctx)?;
            debug!(request_id = %ctx.request_id, url = %url, "login url from callback");
            return Ok(url);
        }
        if let Some(url) = &provider.login_url {
            return Ok(url.clone());
        }
        error!(request_id = %ctx.request_id, "no login url configured");
        Err(AuthError::configuration(MISSING_LOGIN_URL))
    }

    pub fn resolve_current_user(&self, ctx: &RequestContext) -> Result<UserIdentity, AuthError> {
        match &ctx.application.auth_provider.get_user {
            Some(get_user) => {
                let user = get_user(ctx)?;
                debug!(request_id = %ctx.request_id, user = %user, "user from get_user");
                Ok(user)
            }
            None => Ok(UserIdentity::default_user()),
        }
    }

    pub async fn prepare_async(&self, ctx: &mut RequestContext) -> Result<(), AuthError> {
        let application = ctx.application.clone();
        let Some(get_user_async) = &application.auth_provider.get_user_async else {
            return Ok(());
        };
        let user = get_user_async(&*ctx).await?;
        debug!(request_id = %ctx.request_id, user = %user, "user from get_user_async");
        ctx.current_user = Some(user);
        Ok(())
    }
}

impl AuthHooks for AuthDelegate {
    fn login_url(&self, ctx: &RequestContext) -> Result<String, AuthError> {
        self.resolve_login_url(ctx)
    }

    fn get_current_user(&self, ctx: &RequestContext) -> Result<UserIdentity, AuthError> {
        self.resolve_current_user(ctx)
    }

    fn prepare<'a>(&'a self, ctx: &'a mut RequestContext) -> BoxFuture<'a, Result<(), AuthError>> {
        self.prepare_async(ctx).boxed()
    }
}

#[cfg(test)]
#[path = "hooks_tests.rs"]
mod tests;
