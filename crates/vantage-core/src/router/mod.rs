//! Navigation: route lookup and the authentication guard.
//!
//! The front end owns the actual view switching. This module only decides
//! where a navigation ends up and hands the final path to a `Navigator`.

pub mod guard;
pub mod routes;

pub use guard::{GuardDecision, RouteGuard, Router};
pub use routes::{ResolvedRoute, RouteError, RouteRecord, RouteTable};

/// Path of the login view
pub const LOGIN_ROUTE: &str = "/login";

/// Performs a navigation to an application path.
pub trait Navigator: Send + Sync {
    fn navigate(&self, path: &str);
}
