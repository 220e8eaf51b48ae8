use std::sync::Arc;

use tracing::debug;

use super::routes::{ResolvedRoute, RouteError, RouteTable};
use super::Navigator;
use crate::auth::Session;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Proceed,
    Redirect(String),
}

/// Blocks protected routes for anonymous sessions.
///
/// The session is consulted on every check; no decision is cached.
pub struct RouteGuard {
    session: Arc<Session>,
}

impl RouteGuard {
    pub fn new(session: Arc<Session>) -> Self {
        Self { session }
    }

    pub fn check(&self, to: &ResolvedRoute) -> GuardDecision {
        if to.requires_auth && !self.session.is_logged_in() {
            debug!(path = %to.path, "Protected route without session, redirecting to login");
            GuardDecision::Redirect(self.session.login_route().to_string())
        } else {
            GuardDecision::Proceed
        }
    }
}

/// Resolves paths, applies the guard, then navigates.
pub struct Router {
    routes: RouteTable,
    guard: RouteGuard,
    navigator: Arc<dyn Navigator>,
}

impl Router {
    pub fn new(routes: RouteTable, session: Arc<Session>, navigator: Arc<dyn Navigator>) -> Self {
        Self {
            routes,
            guard: RouteGuard::new(session),
            navigator,
        }
    }

    /// Navigate to `path`, returning where the navigation actually landed.
    pub fn push(&self, path: &str) -> Result<String, RouteError> {
        let target = self.routes.resolve(path)?;
        let destination = match self.guard.check(&target) {
            GuardDecision::Proceed => target.path,
            GuardDecision::Redirect(to) => self.routes.resolve(&to)?.path,
        };
        self.navigator.navigate(&destination);
        Ok(destination)
    }
}
