//! Central reaction to classified exchange failures.

use std::sync::Arc;

use tracing::warn;

use super::error::{ApiError, FailureCategory};
use super::request::ReactionMode;
use crate::auth::Session;
use crate::notify::{Notifier, Severity};

pub const SESSION_EXPIRED_MESSAGE: &str = "Session expired, please log in again";
pub const FORBIDDEN_MESSAGE: &str = "You do not have permission to access this resource";
pub const NOT_FOUND_MESSAGE: &str = "The requested resource does not exist";
pub const SERVER_ERROR_MESSAGE: &str = "Server error";
pub const REQUEST_FAILED_MESSAGE: &str = "Request failed";
pub const NETWORK_ERROR_MESSAGE: &str = "Network error, please check your connection";
pub const LOGIN_REJECTED_MESSAGE: &str = "Incorrect username or password";

/// Side effects run once per failed exchange.
#[derive(Clone)]
pub struct GlobalReaction {
    session: Arc<Session>,
    notifier: Arc<dyn Notifier>,
}

impl GlobalReaction {
    pub fn new(session: Arc<Session>, notifier: Arc<dyn Notifier>) -> Self {
        Self { session, notifier }
    }

    /// Message shown for a category. `detail` only applies to `Other`.
    pub fn message_for(category: FailureCategory, detail: Option<&str>) -> &str {
        match category {
            FailureCategory::Unauthorized => SESSION_EXPIRED_MESSAGE,
            FailureCategory::Forbidden => FORBIDDEN_MESSAGE,
            FailureCategory::NotFound => NOT_FOUND_MESSAGE,
            FailureCategory::ServerError => SERVER_ERROR_MESSAGE,
            FailureCategory::Other => detail.unwrap_or(REQUEST_FAILED_MESSAGE),
            FailureCategory::NetworkError => NETWORK_ERROR_MESSAGE,
        }
    }

    pub fn react(&self, error: &ApiError, mode: ReactionMode) {
        let Some(category) = error.category() else {
            return;
        };
        if mode == ReactionMode::Silent {
            return;
        }
        warn!(%category, status = ?error.status(), error = %error, "Request failed");

        let message = match (category, mode) {
            (FailureCategory::Unauthorized, ReactionMode::KeepSession) => LOGIN_REJECTED_MESSAGE,
            (FailureCategory::Unauthorized, _) => {
                // logout navigates to the login route
                self.session.logout();
                SESSION_EXPIRED_MESSAGE
            }
            _ => Self::message_for(category, error.detail()),
        };
        self.notifier.notify(Severity::Error, message);
    }
}
