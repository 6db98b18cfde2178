use std::sync::Arc;

use axum::http::{HeaderMap, Method, Uri};

use super::application::Application;
use super::principal::UserIdentity;

/// Per-request state the auth hooks operate on.
///
/// `current_user` starts unset and is filled at most once per request, either
/// by `prepare` or lazily by the synchronous fallback.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub application: Arc<Application>,
    pub current_user: Option<UserIdentity>,
    pub request_id: String,
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
}

impl RequestContext {
    pub fn new(application: Arc<Application>) -> Self {
        Self {
            application,
            current_user: None,
            request_id: uuid::Uuid::new_v4().to_string(),
            method: Method::GET,
            uri: Uri::from_static("/"),
            headers: HeaderMap::new(),
        }
    }

    pub fn from_parts(application: Arc<Application>, method: Method, uri: Uri, headers: HeaderMap) -> Self {
        Self { method, uri, headers, ..Self::new(application) }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn cookie(&self, name: &str) -> Option<String> {
        parse_cookie(&self.headers, name)
    }

    /// Absolute URL of this request, used when redirecting to an absolute login URL.
    pub fn full_url(&self) -> String {
        if self.uri.scheme().is_some() {
            return self.uri.to_string();
        }
        let host = self.header("host").unwrap_or("localhost");
        let path = self.uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
        format!("http://{host}{path}")
    }
}

pub fn parse_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    for cookie in headers.get_all("cookie") {
        let Ok(s) = cookie.to_str() else { continue; };
        for part in s.split(';') {
            let p = part.trim();
            if let Some((k, v)) = p.split_once('=') {
                if k == name { return Some(v.to_string()); }
            }
        }
    }
    None
}
