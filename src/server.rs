//!
//! authhooks HTTP server
//! ---------------------
//! Axum host for the authorization hooks.
//!
//! Responsibilities:
//! - Build a `RequestContext` per request and run the `prepare` hook before any handler.
//! - Guard authenticated routes: redirect to the login URL (GET/HEAD) or answer 403.
//! - Mount the cookie-session login/logout endpoints when session auth is configured.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{FromRequestParts, Request, State};
use axum::http::header::LOCATION;
use axum::http::request::Parts;
use axum::http::{Method, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use tracing::{debug, error, info};

use crate::config::{AuthMode, ServerConfig};
use crate::error::AppError;
use crate::identity::{
    Application, AuthDelegate, AuthHooks, Credentials, RequestContext, SessionManager, UserIdentity,
};

pub mod login;

/// Shared server state injected into all handlers.
#[derive(Clone)]
pub struct AppState {
    pub application: Arc<Application>,
    pub hooks: Arc<dyn AuthHooks>,
    pub sessions: Arc<SessionManager>,
    pub credentials: Arc<Credentials>,
    pub session_cookie: String,
    /// (login path, logout path) when the built-in session endpoints are mounted.
    pub session_endpoints: Option<(String, String)>,
}

impl AppState {
    pub fn new(application: Application) -> Self {
        Self {
            application: Arc::new(application),
            hooks: Arc::new(AuthDelegate),
            sessions: Arc::new(SessionManager::default()),
            credentials: Arc::new(Credentials::default()),
            session_cookie: ServerConfig::default().session_cookie,
            session_endpoints: None,
        }
    }

    pub fn from_config(cfg: &ServerConfig) -> anyhow::Result<Self> {
        let sessions = Arc::new(SessionManager::new(cfg.session_ttl()));
        let provider = cfg.build_provider(&sessions)?;
        let session_endpoints = match cfg.auth {
            AuthMode::Session => {
                let login = provider.login_url.clone().unwrap_or_else(|| "/login".into());
                let logout = provider.logout_url.clone().unwrap_or_else(|| "/logout".into());
                if !login.starts_with('/') || !logout.starts_with('/') {
                    anyhow::bail!("session auth serves its own pages; login_url and logout_url must be paths");
                }
                Some((login, logout))
            }
            _ => None,
        };
        Ok(Self {
            application: Arc::new(Application::new("authhooks", provider)),
            hooks: Arc::new(AuthDelegate),
            sessions,
            credentials: Arc::new(Credentials::new(cfg.users.clone())),
            session_cookie: cfg.session_cookie.clone(),
            session_endpoints,
        })
    }

    pub fn with_hooks(mut self, hooks: Arc<dyn AuthHooks>) -> Self {
        self.hooks = hooks;
        self
    }
}

/// Build the router; every route passes through `prepare_request`.
pub fn router(state: AppState) -> Router {
    let mut app = Router::new()
        .route("/", get(index))
        .route("/whoami", get(whoami))
        .route("/healthz", get(|| async { "ok" }));
    if let Some((login_path, logout_path)) = &state.session_endpoints {
        app = app
            .route(login_path, get(login::login_page).post(login::login_submit))
            .route(logout_path, get(login::logout).post(login::logout));
    }
    app.layer(middleware::from_fn_with_state(state.clone(), prepare_request))
        .with_state(state)
}

/// Serve on an already bound listener.
pub async fn serve(listener: tokio::net::TcpListener, state: AppState) -> anyhow::Result<()> {
    axum::serve(listener, router(state)).await?;
    Ok(())
}

/// Start the HTTP server described by `cfg`.
pub async fn run(cfg: ServerConfig) -> anyhow::Result<()> {
    let state = AppState::from_config(&cfg)?;
    info!(
        auth = ?cfg.auth,
        provider = ?state.application.auth_provider,
        "auth hooks {}",
        if state.application.auth_provider.enabled() { "enabled" } else { "disabled" }
    );
    let addr: SocketAddr = format!("0.0.0.0:{}", cfg.http_port).parse()?;
    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    serve(listener, state).await
}

/// Pre-request setup: build the context and run the `prepare` hook.
async fn prepare_request(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let mut ctx = RequestContext::from_parts(
        state.application.clone(),
        req.method().clone(),
        req.uri().clone(),
        req.headers().clone(),
    );
    if state.application.auth_provider.enabled() {
        if let Err(e) = state.hooks.prepare(&mut ctx).await {
            error!(request_id = %ctx.request_id, "prepare failed: {e}");
            return AppError::from(e).into_response();
        }
    }
    debug!(request_id = %ctx.request_id, method = %ctx.method, uri = %ctx.uri, "request prepared");
    req.extensions_mut().insert(ctx);
    next.run(req).await
}

/// Resolve the current user, turning "not logged in" into the proper response.
pub fn require_user(state: &AppState, ctx: &mut RequestContext) -> Result<UserIdentity, Response> {
    let user = state.hooks.current_user(ctx).map_err(|e| AppError::from(e).into_response())?;
    if user.is_authenticated() {
        return Ok(user);
    }
    if ctx.method == Method::GET || ctx.method == Method::HEAD {
        let mut url = state.hooks.login_url(ctx).map_err(|e| {
            error!(request_id = %ctx.request_id, "cannot redirect to login: {e}");
            AppError::from(e).into_response()
        })?;
        if !url.contains('?') {
            let next = if has_scheme(&url) { ctx.full_url() } else { ctx.uri.to_string() };
            url = format!("{url}?next={}", urlencoding::encode(&next));
        }
        debug!(request_id = %ctx.request_id, location = %url, "redirecting to login");
        return Err(found(&url));
    }
    Err(AppError::forbidden("forbidden", "authentication required").into_response())
}

pub(crate) fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(LOCATION, location.to_string())]).into_response()
}

fn has_scheme(url: &str) -> bool {
    url.split_once("://")
        .map(|(scheme, _)| {
            !scheme.is_empty() && scheme.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        })
        .unwrap_or(false)
}

/// Extractor for handlers that need a logged-in user.
pub struct Authenticated {
    pub user: UserIdentity,
    pub ctx: RequestContext,
}

impl FromRequestParts<AppState> for Authenticated {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let mut ctx = parts
            .extensions
            .get::<RequestContext>()
            .cloned()
            .ok_or_else(|| AppError::internal("missing_context", "request context was not prepared").into_response())?;
        let user = require_user(state, &mut ctx)?;
        Ok(Authenticated { user, ctx })
    }
}

async fn index(Authenticated { user, .. }: Authenticated) -> String {
    format!("Hello, {user}")
}

async fn whoami(State(state): State<AppState>, Authenticated { user, ctx }: Authenticated) -> impl IntoResponse {
    Json(serde_json::json!({
        "user": user,
        "request_id": ctx.request_id,
        "logout_url": state.application.auth_provider.logout_url,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scheme_detection() {
        assert!(has_scheme("https://sso.example.org/login"));
        assert!(has_scheme("git+ssh://host/x"));
        assert!(!has_scheme("/login"));
        assert!(!has_scheme("/redirect?to=http://x"));
    }

    #[test]
    fn found_sets_location() {
        let resp = found("/login?next=%2F");
        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(resp.headers()[LOCATION], "/login?next=%2F");
    }
}
