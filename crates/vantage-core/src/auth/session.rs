use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::storage::{KeyValueStore, TOKEN_KEY, USER_INFO_KEY};
use crate::api::auth::LoginResponse;
use crate::api::ApiError;
use crate::router::Navigator;

/// Profile of the logged-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    pub username: String,
    pub email: String,
    pub full_name: String,
}

impl From<&LoginResponse> for UserInfo {
    fn from(response: &LoginResponse) -> Self {
        Self {
            username: response.username.clone(),
            email: response.email.clone(),
            full_name: response.full_name.clone(),
        }
    }
}

/// Performs the credential exchange against the authentication endpoint.
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn authenticate(&self, username: &str, password: &str) -> Result<LoginResponse, ApiError>;
}

/// Token and profile. Only constructed through the methods below so that a
/// profile is never held without a token.
#[derive(Debug, Clone, Default)]
struct SessionState {
    token: String,
    user_info: Option<UserInfo>,
}

/// Process-wide authentication state, shared by handle.
pub struct Session {
    state: RwLock<SessionState>,
    store: Arc<dyn KeyValueStore>,
    navigator: Arc<dyn Navigator>,
    login_route: String,
}

impl Session {
    /// Restore the session from persistent storage.
    ///
    /// A persisted token is adopted immediately, followed by one
    /// `load_user_info` pass. Storage errors start an empty session.
    pub fn restore(
        store: Arc<dyn KeyValueStore>,
        navigator: Arc<dyn Navigator>,
        login_route: impl Into<String>,
    ) -> Self {
        let token = match store.get(TOKEN_KEY) {
            Ok(token) => token.unwrap_or_default(),
            Err(e) => {
                warn!(error = %e, "Failed to read persisted token");
                String::new()
            }
        };

        let session = Self {
            state: RwLock::new(SessionState {
                token,
                user_info: None,
            }),
            store,
            navigator,
            login_route: login_route.into(),
        };

        if session.is_logged_in() {
            debug!("Persisted token found");
            session.load_user_info();
        } else {
            debug!("No persisted token found");
        }
        session
    }

    /// Snapshot of the bearer token. Empty when unauthenticated.
    pub fn token(&self) -> String {
        self.state.read().token.clone()
    }

    pub fn is_logged_in(&self) -> bool {
        !self.state.read().token.is_empty()
    }

    pub fn user_info(&self) -> Option<UserInfo> {
        self.state.read().user_info.clone()
    }

    pub fn username(&self) -> String {
        self.state
            .read()
            .user_info
            .as_ref()
            .map(|u| u.username.clone())
            .unwrap_or_default()
    }

    pub fn login_route(&self) -> &str {
        &self.login_route
    }

    /// Authenticate and adopt the new credentials.
    ///
    /// Returns `false` on any failure, leaving the previous session and
    /// storage untouched.
    pub async fn login<A>(&self, authenticator: &A, username: &str, password: &str) -> bool
    where
        A: Authenticator + ?Sized,
    {
        let response = match authenticator.authenticate(username, password).await {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, username, "Login failed");
                return false;
            }
        };

        if response.access_token.is_empty() {
            warn!(username, "Login response carried an empty token");
            return false;
        }

        let user_info = UserInfo::from(&response);
        let serialized = match serde_json::to_string(&user_info) {
            Ok(s) => s,
            Err(e) => {
                warn!(error = %e, "Failed to serialize user info");
                return false;
            }
        };

        {
            let mut state = self.state.write();
            *state = SessionState {
                token: response.access_token,
                user_info: Some(user_info),
            };
            // Mirror under the lock so a concurrent logout can't interleave
            let persisted = self
                .store
                .set(TOKEN_KEY, &state.token)
                .and_then(|()| self.store.set(USER_INFO_KEY, &serialized));
            if let Err(e) = persisted {
                // Never leave a token persisted without its profile
                warn!(error = %e, "Failed to persist session, clearing stored entries");
                let _ = self.store.remove(TOKEN_KEY);
                let _ = self.store.remove(USER_INFO_KEY);
            }
        }

        info!(username, "Login successful");
        true
    }

    /// Clear the session and send the user to the login route.
    pub fn logout(&self) {
        {
            let mut state = self.state.write();
            *state = SessionState::default();
            if let Err(e) = self.store.remove(TOKEN_KEY) {
                warn!(error = %e, "Failed to remove persisted token");
            }
            if let Err(e) = self.store.remove(USER_INFO_KEY) {
                warn!(error = %e, "Failed to remove persisted user info");
            }
        }

        info!("Logged out");
        // Lock released: the navigator may consult the session
        self.navigator.navigate(&self.login_route);
    }

    /// Rehydrate the profile from storage if one is persisted.
    pub fn load_user_info(&self) {
        let stored = match self.store.get(USER_INFO_KEY) {
            Ok(Some(stored)) => stored,
            Ok(None) => return,
            Err(e) => {
                warn!(error = %e, "Failed to read persisted user info");
                return;
            }
        };

        let user_info: UserInfo = match serde_json::from_str(&stored) {
            Ok(info) => info,
            Err(e) => {
                warn!(error = %e, "Failed to parse persisted user info");
                return;
            }
        };

        let mut state = self.state.write();
        if state.token.is_empty() {
            debug!("Ignoring persisted user info without a token");
            return;
        }
        state.user_info = Some(user_info);
    }
}
