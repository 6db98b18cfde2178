//! Server configuration: JSON file and `AUTHHOOKS_*` environment variables.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::identity::{AuthProvider, SessionManager, header_auth, null_auth, session_auth};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMode {
    #[default]
    None,
    Header,
    Session,
}

impl std::str::FromStr for AuthMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "none" | "off" => Ok(AuthMode::None),
            "header" => Ok(AuthMode::Header),
            "session" => Ok(AuthMode::Session),
            other => Err(anyhow!("unknown auth mode '{other}' (expected none, header or session)")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub http_port: u16,
    pub auth: AuthMode,
    pub login_url: Option<String>,
    pub logout_url: Option<String>,
    pub user_header: String,
    pub session_cookie: String,
    pub session_ttl_secs: u64,
    /// username -> Argon2 PHC hash
    pub users: HashMap<String, String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_port: 7878,
            auth: AuthMode::None,
            login_url: None,
            logout_url: None,
            user_header: "x-forwarded-user".into(),
            session_cookie: "authhooks_session".into(),
            session_ttl_secs: 3600,
            users: HashMap::new(),
        }
    }
}

impl ServerConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).with_context(|| format!("reading config {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    /// Start from `AUTHHOOKS_CONFIG` (if set) and overlay individual variables.
    pub fn from_env() -> Result<Self> {
        let mut cfg = match std::env::var("AUTHHOOKS_CONFIG") {
            Ok(path) => Self::from_file(path)?,
            Err(_) => Self::default(),
        };
        if let Ok(port) = std::env::var("AUTHHOOKS_HTTP_PORT") {
            cfg.http_port = port.parse().with_context(|| format!("AUTHHOOKS_HTTP_PORT='{port}'"))?;
        }
        if let Ok(mode) = std::env::var("AUTHHOOKS_AUTH") {
            cfg.auth = mode.parse()?;
        }
        if let Ok(v) = std::env::var("AUTHHOOKS_LOGIN_URL") { cfg.login_url = Some(v); }
        if let Ok(v) = std::env::var("AUTHHOOKS_LOGOUT_URL") { cfg.logout_url = Some(v); }
        if let Ok(v) = std::env::var("AUTHHOOKS_USER_HEADER") { cfg.user_header = v; }
        if let Ok(v) = std::env::var("AUTHHOOKS_SESSION_COOKIE") { cfg.session_cookie = v; }
        if let Ok(v) = std::env::var("AUTHHOOKS_SESSION_TTL_SECS") {
            cfg.session_ttl_secs = v.parse().with_context(|| format!("AUTHHOOKS_SESSION_TTL_SECS='{v}'"))?;
        }
        Ok(cfg)
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }

    /// Build and validate the provider described by this config.
    pub fn build_provider(&self, sessions: &Arc<SessionManager>) -> Result<AuthProvider> {
        let provider = match self.auth {
            AuthMode::None => null_auth(),
            AuthMode::Header => {
                let login_url = self
                    .login_url
                    .clone()
                    .ok_or_else(|| anyhow!("header auth requires login_url (the external sign-in page)"))?;
                let mut p = header_auth(&self.user_header, login_url);
                p.logout_url = self.logout_url.clone();
                p
            }
            AuthMode::Session => {
                if self.users.is_empty() {
                    return Err(anyhow!("session auth requires at least one entry in users"));
                }
                session_auth(
                    sessions.clone(),
                    &self.session_cookie,
                    self.login_url.clone().unwrap_or_else(|| "/login".into()),
                    self.logout_url.clone().unwrap_or_else(|| "/logout".into()),
                )
            }
        };
        provider.validate()?;
        Ok(provider)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn defaults() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.http_port, 7878);
        assert_eq!(cfg.auth, AuthMode::None);
        assert_eq!(cfg.session_ttl(), Duration::from_secs(3600));
    }

    #[test]
    fn parse_auth_mode() {
        assert_eq!("Session".parse::<AuthMode>().unwrap(), AuthMode::Session);
        assert_eq!("".parse::<AuthMode>().unwrap(), AuthMode::None);
        assert!("kerberos".parse::<AuthMode>().is_err());
    }

    #[test]
    fn load_partial_json_file() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(f, r#"{{"http_port": 9000, "auth": "header", "login_url": "https://sso/login"}}"#).unwrap();
        let cfg = ServerConfig::from_file(f.path()).unwrap();
        assert_eq!(cfg.http_port, 9000);
        assert_eq!(cfg.auth, AuthMode::Header);
        assert_eq!(cfg.user_header, "x-forwarded-user");
    }

    #[test]
    fn none_mode_builds_disabled_provider() {
        let p = ServerConfig::default().build_provider(&Arc::new(SessionManager::default())).unwrap();
        assert!(!p.enabled());
    }

    #[test]
    fn header_mode_needs_login_url() {
        let cfg = ServerConfig { auth: AuthMode::Header, ..Default::default() };
        assert!(cfg.build_provider(&Arc::new(SessionManager::default())).is_err());
    }

    #[test]
    fn session_mode_defaults_urls() {
        let cfg = ServerConfig {
            auth: AuthMode::Session,
            users: HashMap::from([("alice".to_string(), "phc".to_string())]),
            ..Default::default()
        };
        let p = cfg.build_provider(&Arc::new(SessionManager::default())).unwrap();
        assert!(p.enabled());
        assert_eq!(p.login_url.as_deref(), Some("/login"));
        assert_eq!(p.logout_url.as_deref(), Some("/logout"));
    }

    #[test]
    fn session_mode_needs_users() {
        let cfg = ServerConfig { auth: AuthMode::Session, ..Default::default() };
        assert!(cfg.build_provider(&Arc::new(SessionManager::default())).is_err());
    }
}
