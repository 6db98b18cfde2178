//! Authorization hooks for HTTP request handlers.
//!
//! A request handler answers three questions for its host: where the login
//! page is, who the current user is, and (once, before anything else runs)
//! the asynchronous variant of the latter. [`identity::AuthDelegate`] answers
//! them from an [`identity::AuthProvider`] configured on the application;
//! [`server`] hosts the hooks on axum.

pub mod config;
pub mod error;
pub mod identity;
pub mod server;
