use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use futures_util::future::BoxFuture;
use thiserror::Error;

use super::principal::UserIdentity;
use super::request_context::RequestContext;

pub const MISSING_LOGIN_URL: &str =
    "login_url or get_login_url() must be supplied when authentication hooks are enabled";

#[derive(Debug, Error)]
pub enum AuthError {
    /// Deployment/setup mistake; not recoverable per request.
    #[error("{0}")]
    Configuration(String),
    /// A provider callback failed; carried through untouched.
    #[error(transparent)]
    Provider(#[from] anyhow::Error),
}

impl AuthError {
    pub fn configuration<S: Into<String>>(msg: S) -> Self {
        AuthError::Configuration(msg.into())
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, AuthError::Configuration(_))
    }
}

pub type LoginUrlFn = Arc<dyn Fn(&RequestContext) -> anyhow::Result<String> + Send + Sync>;
pub type GetUserFn = Arc<dyn Fn(&RequestContext) -> anyhow::Result<UserIdentity> + Send + Sync>;
pub type GetUserAsyncFn =
    Arc<dyn for<'a> Fn(&'a RequestContext) -> BoxFuture<'a, anyhow::Result<UserIdentity>> + Send + Sync>;

/// Set of independently optional authentication capabilities.
///
/// The provider is plain configuration: it is built once, shared through the
/// [`Application`](super::Application) and never mutated by request handling.
#[derive(Clone, Default)]
pub struct AuthProvider {
    pub get_login_url: Option<LoginUrlFn>,
    pub login_url: Option<String>,
    pub get_user: Option<GetUserFn>,
    pub get_user_async: Option<GetUserAsyncFn>,
    pub logout_url: Option<String>,
}

impl AuthProvider {
    pub fn with_login_url(mut self, url: impl Into<String>) -> Self {
        self.login_url = Some(url.into());
        self
    }

    pub fn with_logout_url(mut self, url: impl Into<String>) -> Self {
        self.logout_url = Some(url.into());
        self
    }

    pub fn with_get_login_url<F>(mut self, f: F) -> Self
    where
        F: Fn(&RequestContext) -> anyhow::Result<String> + Send + Sync + 'static,
    {
        self.get_login_url = Some(Arc::new(f));
        self
    }

    pub fn with_get_user<F>(mut self, f: F) -> Self
    where
        F: Fn(&RequestContext) -> anyhow::Result<UserIdentity> + Send + Sync + 'static,
    {
        self.get_user = Some(Arc::new(f));
        self
    }

    pub fn with_get_user_async<F>(mut self, f: F) -> Self
    where
        F: for<'a> Fn(&'a RequestContext) -> BoxFuture<'a, anyhow::Result<UserIdentity>> + Send + Sync + 'static,
    {
        self.get_user_async = Some(Arc::new(f));
        self
    }

    /// Authentication hooks are only meaningful when some user callback exists.
    pub fn enabled(&self) -> bool {
        self.get_user.is_some() || self.get_user_async.is_some()
    }

    /// Reject capability combinations that cannot be served consistently.
    /// Hosts call this when mounting the hooks; the delegate never does.
    pub fn validate(&self) -> Result<(), AuthError> {
        if self.get_user.is_some() && self.get_user_async.is_some() {
            return Err(AuthError::configuration("Only one of get_user or get_user_async should be supplied"));
        }
        if self.enabled() && self.login_url.is_none() && self.get_login_url.is_none() {
            return Err(AuthError::configuration(
                "When user authentication is enabled, one of login_url or get_login_url must be supplied",
            ));
        }
        if self.login_url.is_some() && self.get_login_url.is_some() {
            return Err(AuthError::configuration("At most one of login_url or get_login_url should be supplied"));
        }
        Ok(())
    }
}

impl Debug for AuthProvider {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthProvider")
            .field("get_login_url", &self.get_login_url.is_some())
            .field("login_url", &self.login_url)
            .field("get_user", &self.get_user.is_some())
            .field("get_user_async", &self.get_user_async.is_some())
            .field("logout_url", &self.logout_url)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use futures_util::FutureExt;

    use super::*;

    fn sync_user() -> AuthProvider {
        AuthProvider::default().with_get_user(|_| Ok(UserIdentity::name("alice")))
    }

    #[test]
    fn empty_provider_is_disabled_and_valid() {
        let p = AuthProvider::default();
        assert!(!p.enabled());
        assert!(p.validate().is_ok());
    }

    #[test]
    fn user_callback_enables_hooks() {
        assert!(sync_user().enabled());
        let p = AuthProvider::default().with_get_user_async(|_| async { Ok(UserIdentity::name("bob")) }.boxed());
        assert!(p.enabled());
    }

    #[test]
    fn both_user_callbacks_rejected() {
        let p = sync_user()
            .with_login_url("/login")
            .with_get_user_async(|_| async { Ok(UserIdentity::Unauthenticated) }.boxed());
        let err = p.validate().unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("Only one of get_user or get_user_async"));
    }

    #[test]
    fn enabled_without_login_source_rejected() {
        let err = sync_user().validate().unwrap_err();
        assert!(err.to_string().contains("one of login_url or get_login_url must be supplied"));
        assert!(sync_user().with_login_url("/login").validate().is_ok());
        assert!(sync_user().with_get_login_url(|_| Ok("/sso".into())).validate().is_ok());
    }

    #[test]
    fn both_login_sources_rejected() {
        let p = sync_user().with_login_url("/login").with_get_login_url(|_| Ok("/sso".into()));
        let err = p.validate().unwrap_err();
        assert!(err.to_string().contains("At most one of login_url or get_login_url"));
    }

    #[test]
    fn provider_error_is_transparent() {
        let err: AuthError = anyhow::anyhow!("backend unreachable").into();
        assert!(!err.is_configuration());
        assert_eq!(err.to_string(), "backend unreachable");
    }

    #[test]
    fn debug_lists_capabilities() {
        let s = format!("{:?}", sync_user().with_login_url("/login"));
        assert!(s.contains("get_user: true"));
        assert!(s.contains("get_user_async: false"));
        assert!(s.contains("\"/login\""));
    }
}
