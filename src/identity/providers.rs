//! Ready-made providers for the common deployments.

use std::sync::Arc;

use futures_util::FutureExt;

use super::principal::{Principal, UserIdentity};
use super::provider::AuthProvider;
use super::session::SessionManager;

/// No authentication: hooks stay unmounted.
pub fn null_auth() -> AuthProvider {
    AuthProvider::default()
}

/// Trust a user header set by an authenticating reverse proxy.
pub fn header_auth(header: impl Into<String>, login_url: impl Into<String>) -> AuthProvider {
    let header = header.into().to_ascii_lowercase();
    AuthProvider::default()
        .with_login_url(login_url)
        .with_get_user(move |ctx| {
            let user = match ctx.header(&header).map(str::trim) {
                Some(name) if !name.is_empty() => {
                    let mut p = Principal::new(name);
                    p.attrs.ip = ctx.header("x-forwarded-for").map(|s| s.to_string());
                    UserIdentity::from(p)
                }
                _ => UserIdentity::Unauthenticated,
            };
            Ok(user)
        })
}

/// Resolve the session cookie through `sessions` during `prepare`.
pub fn session_auth(
    sessions: Arc<SessionManager>,
    cookie: impl Into<String>,
    login_url: impl Into<String>,
    logout_url: impl Into<String>,
) -> AuthProvider {
    let cookie = cookie.into();
    AuthProvider::default()
        .with_login_url(login_url)
        .with_logout_url(logout_url)
        .with_get_user_async(move |ctx| {
            let token = ctx.cookie(&cookie);
            let sessions = sessions.clone();
            async move {
                let user = token
                    .and_then(|t| sessions.validate(&t))
                    .map(UserIdentity::from)
                    .unwrap_or(UserIdentity::Unauthenticated);
                Ok(user)
            }
            .boxed()
        })
}
