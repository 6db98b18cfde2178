use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// Identity handed back when no `get_user` callback is configured.
pub const DEFAULT_USER: &str = "default_user";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Attrs {
    #[serde(default)]
    pub ip: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Principal {
    pub user_id: String,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub attrs: Attrs,
}

impl Principal {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self { user_id: user_id.into(), roles: vec!["user".into()], attrs: Attrs::default() }
    }
}

/// Whatever a provider decides the current user is.
///
/// `Unauthenticated` is the sentinel a provider returns when the request
/// carries no usable credentials; hosts treat it as "not logged in".
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UserIdentity {
    Name { name: String },
    Principal { principal: Principal },
    Unauthenticated,
}

impl UserIdentity {
    pub fn name(name: impl Into<String>) -> Self {
        UserIdentity::Name { name: name.into() }
    }

    pub fn default_user() -> Self {
        Self::name(DEFAULT_USER)
    }

    pub fn is_authenticated(&self) -> bool {
        !matches!(self, UserIdentity::Unauthenticated)
    }

    /// Display name for logs and greetings; `None` for the sentinel.
    pub fn user_id(&self) -> Option<&str> {
        match self {
            UserIdentity::Name { name } => Some(name.as_str()),
            UserIdentity::Principal { principal } => Some(principal.user_id.as_str()),
            UserIdentity::Unauthenticated => None,
        }
    }
}

impl From<Principal> for UserIdentity {
    fn from(principal: Principal) -> Self {
        UserIdentity::Principal { principal }
    }
}

impl From<&str> for UserIdentity {
    fn from(name: &str) -> Self {
        UserIdentity::name(name)
    }
}

impl PartialEq<&str> for UserIdentity {
    fn eq(&self, other: &&str) -> bool {
        matches!(self, UserIdentity::Name { name } if name == other)
    }
}

impl Display for UserIdentity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.user_id() {
            Some(id) => write!(f, "{id}"),
            None => write!(f, "<unauthenticated>"),
        }
    }
}
