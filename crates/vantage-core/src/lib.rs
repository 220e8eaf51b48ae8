//! Core library for vantage - the client access layer of the analysis platform.
//!
//! Feature code issues calls through [`api::ApiClient`], which attaches the
//! [`auth::Session`] token, performs the exchange and reacts centrally to
//! failures (notification, and logout on 401). [`router::RouteGuard`] keeps
//! anonymous sessions out of protected routes.

pub mod api;
pub mod auth;
pub mod config;
pub mod notify;
pub mod router;

#[cfg(test)]
pub(crate) mod testing;

pub use api::{ApiClient, ApiError, AuthApi, FailureCategory};
pub use auth::{Session, UserInfo};
pub use config::{ClientConfig, Config};
