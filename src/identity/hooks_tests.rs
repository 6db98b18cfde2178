use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::anyhow;
use futures_util::FutureExt;

use super::*;
use crate::identity::{Application, AuthProvider};

fn ctx_for(provider: AuthProvider) -> RequestContext {
    RequestContext::new(Arc::new(Application::new("test", provider)))
}

#[test]
fn login_url_static() {
    let ctx = ctx_for(AuthProvider::default().with_login_url("/login"));
    assert_eq!(AuthDelegate.login_url(&ctx).unwrap(), "/login");
}

#[test]
fn login_url_callback_wins_over_static() {
    let provider = AuthProvider::default()
        .with_login_url("/static")
        .with_get_login_url(|ctx| Ok(format!("/sso?rid={}", ctx.request_id.len())));
    let ctx = ctx_for(provider);
    assert_eq!(AuthDelegate.login_url(&ctx).unwrap(), "/sso?rid=36");
}

#[test]
fn login_url_missing_is_configuration_error() {
    let ctx = ctx_for(AuthProvider::default());
    let err = AuthDelegate.login_url(&ctx).unwrap_err();
    assert!(err.is_configuration());
    assert_eq!(err.to_string(), MISSING_LOGIN_URL);
}

#[test]
fn login_url_callback_fault_propagates() {
    let ctx = ctx_for(AuthProvider::default().with_get_login_url(|_| Err(anyhow!("idp down"))));
    let err = AuthDelegate.login_url(&ctx).unwrap_err();
    assert!(!err.is_configuration());
    assert_eq!(err.to_string(), "idp down");
}

#[test]
fn current_user_from_callback() {
    let ctx = ctx_for(AuthProvider::default().with_get_user(|_| Ok(UserIdentity::name("alice"))));
    assert_eq!(AuthDelegate.get_current_user(&ctx).unwrap(), "alice");
}

#[test]
fn current_user_callback_may_return_sentinel() {
    let ctx = ctx_for(AuthProvider::default().with_get_user(|_| Ok(UserIdentity::Unauthenticated)));
    assert_eq!(AuthDelegate.get_current_user(&ctx).unwrap(), UserIdentity::Unauthenticated);
}

#[test]
fn current_user_defaults_without_callback() {
    let ctx = ctx_for(AuthProvider::default());
    assert_eq!(AuthDelegate.get_current_user(&ctx).unwrap(), "default_user");
}

#[test]
fn cached_current_user_calls_callback_once() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let provider = AuthProvider::default().with_get_user(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(UserIdentity::name("alice"))
    });
    let mut ctx = ctx_for(provider);
    assert_eq!(AuthDelegate.current_user(&mut ctx).unwrap(), "alice");
    assert_eq!(AuthDelegate.current_user(&mut ctx).unwrap(), "alice");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(ctx.current_user, Some(UserIdentity::name("alice")));
}

#[tokio::test]
async fn prepare_assigns_async_user() {
    let provider = AuthProvider::default().with_get_user_async(|_| async { Ok(UserIdentity::name("bob")) }.boxed());
    let mut ctx = ctx_for(provider);
    AuthDelegate.prepare(&mut ctx).await.unwrap();
    assert_eq!(ctx.current_user, Some(UserIdentity::name("bob")));
    // prepared value shadows the synchronous fallback
    assert_eq!(AuthDelegate.current_user(&mut ctx).unwrap(), "bob");
}

#[tokio::test]
async fn prepare_callback_sees_request() {
    let provider = AuthProvider::default().with_get_user_async(|ctx| {
        async move {
            let name = ctx.header("x-user").unwrap_or("nobody").to_string();
            tokio::task::yield_now().await;
            Ok(UserIdentity::name(name))
        }
        .boxed()
    });
    let mut ctx = ctx_for(provider);
    ctx.headers.insert("x-user", axum::http::HeaderValue::from_static("dave"));
    AuthDelegate.prepare(&mut ctx).await.unwrap();
    assert_eq!(ctx.current_user, Some(UserIdentity::name("dave")));
}

#[tokio::test]
async fn prepare_without_async_callback_is_noop() {
    let mut ctx = ctx_for(AuthProvider::default().with_get_user(|_| Ok(UserIdentity::name("alice"))));
    AuthDelegate.prepare(&mut ctx).await.unwrap();
    assert!(ctx.current_user.is_none());

    ctx.current_user = Some(UserIdentity::name("preset"));
    AuthDelegate.prepare(&mut ctx).await.unwrap();
    assert_eq!(ctx.current_user, Some(UserIdentity::name("preset")));
}

#[tokio::test]
async fn prepare_fault_leaves_user_unresolved() {
    let provider = AuthProvider::default()
        .with_get_user_async(|_| async { Err(anyhow!("session store offline")) }.boxed());
    let mut ctx = ctx_for(provider);
    let err = AuthDelegate.prepare(&mut ctx).await.unwrap_err();
    assert_eq!(err.to_string(), "session store offline");
    assert!(ctx.current_user.is_none());
}

#[tokio::test]
async fn hooks_are_usable_as_trait_object() {
    let hooks: Arc<dyn AuthHooks> = Arc::new(AuthDelegate);
    let provider = AuthProvider::default()
        .with_login_url("/login")
        .with_get_user_async(|_| async { Ok(UserIdentity::name("erin")) }.boxed());
    let mut ctx = ctx_for(provider);
    hooks.prepare(&mut ctx).await.unwrap();
    assert_eq!(hooks.current_user(&mut ctx).unwrap(), "erin");
    assert_eq!(hooks.login_url(&ctx).unwrap(), "/login");
}
