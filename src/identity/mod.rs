//! Authorization hooks for request handlers and the providers they delegate to.
//! Keep the public surface thin and split implementation across sub-modules.

mod application;
mod credentials;
mod hooks;
mod principal;
mod provider;
mod providers;
mod request_context;
mod session;

pub use application::Application;
pub use credentials::{Credentials, hash_password, verify_password};
pub use hooks::{AuthDelegate, AuthHooks};
pub use principal::{Attrs, DEFAULT_USER, Principal, UserIdentity};
pub use provider::{AuthError, AuthProvider, GetUserAsyncFn, GetUserFn, LoginUrlFn, MISSING_LOGIN_URL};
pub use providers::{header_auth, null_auth, session_auth};
pub use request_context::{RequestContext, parse_cookie};
pub use session::{Session, SessionManager, SessionToken};
