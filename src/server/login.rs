//! Built-in login/logout pages for cookie-session auth.

use axum::extract::{Query, State};
use axum::http::header::SET_COOKIE;
use axum::http::HeaderValue;
use axum::response::{Html, IntoResponse, Response};
use axum::{Extension, Form};
use serde::Deserialize;
use tracing::{info, warn};

use super::{found, AppState};
use crate::error::AppError;
use crate::identity::{AuthHooks, Principal, RequestContext};

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub next: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct NextParam {
    #[serde(default)]
    pub next: Option<String>,
}

fn set_session_cookie(name: &str, token: &str) -> Result<HeaderValue, AppError> {
    HeaderValue::from_str(&format!("{name}={token}; HttpOnly; Secure; SameSite=Strict; Path=/"))
        .map_err(|e| AppError::internal("cookie", e.to_string().as_str()))
}

fn clear_session_cookie(name: &str) -> Result<HeaderValue, AppError> {
    HeaderValue::from_str(&format!(
        "{name}=deleted; Expires=Thu, 01 Jan 1970 00:00:00 GMT; HttpOnly; Secure; SameSite=Strict; Path=/"
    ))
    .map_err(|e| AppError::internal("cookie", e.to_string().as_str()))
}

/// Only same-site absolute paths are followed after login.
fn safe_next(next: Option<&str>) -> &str {
    match next {
        Some(n) if n.starts_with('/') && !n.starts_with("//") && !n.contains('\\') => n,
        _ => "/",
    }
}

fn escape_attr(s: &str) -> String {
    s.replace('&', "&amp;").replace('"', "&quot;").replace('<', "&lt;").replace('>', "&gt;")
}

pub async fn login_page(State(state): State<AppState>, Query(q): Query<NextParam>) -> Html<String> {
    let next = escape_attr(safe_next(q.next.as_deref()));
    let action = state.session_endpoints.as_ref().map(|(login, _)| login.as_str()).unwrap_or("/login");
    Html(format!(
        "<!DOCTYPE html><html><body><form method=\"post\" action=\"{action}\">\
         <input name=\"username\" placeholder=\"username\"/>\
         <input name=\"password\" type=\"password\" placeholder=\"password\"/>\
         <input type=\"hidden\" name=\"next\" value=\"{next}\"/>\
         <button type=\"submit\">Log in</button></form></body></html>",
        action = escape_attr(action),
    ))
}

pub async fn login_submit(State(state): State<AppState>, Form(form): Form<LoginForm>) -> Response {
    if !state.credentials.verify(&form.username, &form.password) {
        warn!(user = %form.username, "login rejected");
        return AppError::auth("invalid_credentials", "invalid username or password").into_response();
    }
    let session = state.sessions.issue(Principal::new(form.username.as_str()));
    let cookie = match set_session_cookie(&state.session_cookie, &session.token) {
        Ok(c) => c,
        Err(e) => return e.into_response(),
    };
    info!(user = %form.username, sid = %session.session_id, "login");
    let mut resp = found(safe_next(form.next.as_deref()));
    resp.headers_mut().insert(SET_COOKIE, cookie);
    resp
}

pub async fn logout(State(state): State<AppState>, Extension(ctx): Extension<RequestContext>) -> Response {
    if let Some(token) = ctx.cookie(&state.session_cookie) {
        if state.sessions.logout(&token) {
            let who = ctx.current_user.as_ref().map(|u| u.to_string()).unwrap_or_default();
            info!(user = %who, request_id = %ctx.request_id, "logout");
        }
    }
    let target = state.hooks.login_url(&ctx).unwrap_or_else(|_| "/".into());
    let cookie = match clear_session_cookie(&state.session_cookie) {
        Ok(c) => c,
        Err(e) => return e.into_response(),
    };
    let mut resp = found(&target);
    resp.headers_mut().insert(SET_COOKIE, cookie);
    resp
}
