use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::client::ApiClient;
use super::error::ApiError;
use super::request::ApiRequest;
use crate::auth::Authenticator;

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub full_name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
}

/// Authentication endpoints.
#[derive(Clone)]
pub struct AuthApi {
    client: ApiClient,
}

impl AuthApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Exchange credentials for a token.
    ///
    /// Form-encoded. Failures still notify, but a rejected login must not
    /// end an existing session.
    pub async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, ApiError> {
        let request = ApiRequest::post("/auth/login")
            .form([
                ("username", request.username.as_str()),
                ("password", request.password.as_str()),
            ])
            .keep_session();
        self.client.send(request).await?.into_json()
    }

    pub async fn register(&self, request: &RegisterRequest) -> Result<serde_json::Value, ApiError> {
        self.client.post("/auth/register", request).await
    }
}

#[async_trait]
impl Authenticator for AuthApi {
    async fn authenticate(&self, username: &str, password: &str) -> Result<LoginResponse, ApiError> {
        self.login(&LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::api::reaction::{LOGIN_REJECTED_MESSAGE, NETWORK_ERROR_MESSAGE, SERVER_ERROR_MESSAGE};
    use crate::api::transport::{RequestBody, TransportError, TransportErrorKind};
    use crate::notify::Severity;
    use crate::auth::storage::{KeyValueStore, MemoryStore, TOKEN_KEY, USER_INFO_KEY};
    use crate::auth::Session;
    use crate::config::ClientConfig;
    use crate::testing::{RecordingNavigator, RecordingNotifier, ScriptedTransport};

    fn setup() -> (
        AuthApi,
        Arc<Session>,
        Arc<ScriptedTransport>,
        Arc<MemoryStore>,
        Arc<RecordingNavigator>,
        Arc<RecordingNotifier>,
    ) {
        let store = Arc::new(MemoryStore::new());
        let navigator = Arc::new(RecordingNavigator::default());
        let notifier = Arc::new(RecordingNotifier::default());
        let transport = Arc::new(ScriptedTransport::default());
        let session = Arc::new(Session::restore(store.clone(), navigator.clone(), "/login"));
        let client = ApiClient::with_transport(
            ClientConfig::default(),
            transport.clone(),
            session.clone(),
            notifier.clone(),
        );
        (AuthApi::new(client), session, transport, store, navigator, notifier)
    }

    #[tokio::test]
    async fn test_login_good_credentials() {
        let (auth, session, transport, store, _navigator, _notifier) = setup();
        transport.reply_json(
            200,
            r#"{"access_token":"T1","token_type":"bearer","username":"alice","email":"a@x.com","full_name":"Alice"}"#,
        );

        assert!(session.login(&auth, "alice", "good-pw").await);

        assert!(session.is_logged_in());
        assert_eq!(session.username(), "alice");
        assert_eq!(store.get(TOKEN_KEY).unwrap().as_deref(), Some("T1"));
        assert!(store.get(USER_INFO_KEY).unwrap().is_some());

        let sent = &transport.requests()[0];
        assert_eq!(sent.url, "http://localhost:8000/api/v1/auth/login");
        assert_eq!(
            sent.body,
            RequestBody::Form(vec![
                ("username".to_string(), "alice".to_string()),
                ("password".to_string(), "good-pw".to_string())
            ])
        );
    }

    #[tokio::test]
    async fn test_login_bad_credentials() {
        let (auth, session, transport, store, navigator, notifier) = setup();
        transport.reply_json(401, r#"{"detail":"Incorrect username or password"}"#);

        assert!(!session.login(&auth, "alice", "bad-pw").await);

        assert!(!session.is_logged_in());
        assert!(store.is_empty());
        assert!(navigator.paths().is_empty());
        assert_eq!(
            notifier.messages(),
            vec![(Severity::Error, LOGIN_REJECTED_MESSAGE.to_string())]
        );
    }

    const GOOD_LOGIN: &str = r#"{"access_token":"T1","username":"alice","email":"a@x.com","full_name":"Alice"}"#;

    #[tokio::test]
    async fn test_failed_relogin_notifies_once_and_keeps_session() {
        let (auth, session, transport, store, navigator, notifier) = setup();
        transport.reply_json(200, GOOD_LOGIN);
        assert!(session.login(&auth, "alice", "good-pw").await);

        transport.reply_json(401, r#"{"detail":"Incorrect username or password"}"#);
        assert!(!session.login(&auth, "alice", "typo").await);

        assert_eq!(session.token(), "T1");
        assert_eq!(store.get(TOKEN_KEY).unwrap().as_deref(), Some("T1"));
        assert!(navigator.paths().is_empty());
        assert_eq!(notifier.messages().len(), 1);
    }

    #[tokio::test]
    async fn test_login_network_error_notifies() {
        let (auth, session, transport, store, navigator, notifier) = setup();
        transport.reply(Err(TransportError::new(
            TransportErrorKind::Connect,
            "connection refused",
        )));

        assert!(!session.login(&auth, "alice", "pw").await);

        assert!(!session.is_logged_in());
        assert!(store.is_empty());
        assert!(navigator.paths().is_empty());
        assert_eq!(
            notifier.messages(),
            vec![(Severity::Error, NETWORK_ERROR_MESSAGE.to_string())]
        );
    }

    #[tokio::test]
    async fn test_login_server_error_notifies() {
        let (auth, session, transport, _store, navigator, notifier) = setup();
        transport.reply_json(500, r#"{"detail":"Internal Server Error"}"#);

        assert!(!session.login(&auth, "alice", "pw").await);

        assert!(!session.is_logged_in());
        assert!(navigator.paths().is_empty());
        assert_eq!(
            notifier.messages(),
            vec![(Severity::Error, SERVER_ERROR_MESSAGE.to_string())]
        );
    }

    #[tokio::test]
    async fn test_register_sends_json() {
        let (auth, _session, transport, _store, _navigator, _notifier) = setup();
        transport.reply_json(200, r#"{"id":7,"username":"carol"}"#);

        let created = auth
            .register(&RegisterRequest {
                username: "carol".to_string(),
                email: "c@x.com".to_string(),
                password: "pw".to_string(),
                full_name: None,
            })
            .await
            .unwrap();

        assert_eq!(created["username"], "carol");
        assert_eq!(
            transport.requests()[0].body,
            RequestBody::Json(serde_json::json!({
                "username": "carol",
                "email": "c@x.com",
                "password": "pw"
            }))
        );
    }
}
