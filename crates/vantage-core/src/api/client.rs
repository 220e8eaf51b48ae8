//! API client for the platform's REST backend.
//!
//! Every feature call goes through `ApiClient::send`: the outbound stage
//! attaches the session's bearer token, the transport performs exactly one
//! exchange, and the inbound stage either unwraps the payload or classifies
//! the failure, runs the global reaction and hands the error back.

use std::sync::Arc;

use reqwest::header::{self, HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use super::error::{ApiError, ExchangeFailure};
use super::reaction::GlobalReaction;
use super::request::{ApiRequest, ApiResponse, ReactionMode, ResponseMode};
use super::transport::{
    HttpRequest, HttpResponse, MultipartForm, ReqwestTransport, RequestBody, Transport,
    TransportError,
};
use crate::auth::Session;
use crate::config::ClientConfig;
use crate::notify::Notifier;

/// Attach the bearer credential. A blank token leaves the request anonymous.
pub fn attach_credentials(mut request: HttpRequest, token: &str) -> HttpRequest {
    if token.is_empty() {
        return request;
    }
    match HeaderValue::from_str(&format!("Bearer {}", token)) {
        Ok(value) => {
            request.headers.insert(header::AUTHORIZATION, value);
        }
        // Tokens with control characters can't be sent; the backend will reject the call
        Err(_) => debug!("Token is not a valid header value, sending without credentials"),
    }
    request
}

/// Clone is cheap - every field is reference counted.
#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn Transport>,
    session: Arc<Session>,
    reaction: GlobalReaction,
    config: ClientConfig,
}

impl ApiClient {
    /// Create a client backed by `reqwest` with the configured timeout.
    pub fn new(
        config: ClientConfig,
        session: Arc<Session>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, TransportError> {
        let transport = ReqwestTransport::new(config.timeout)?;
        Ok(Self::with_transport(config, Arc::new(transport), session, notifier))
    }

    pub fn with_transport(
        config: ClientConfig,
        transport: Arc<dyn Transport>,
        session: Arc<Session>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            transport,
            reaction: GlobalReaction::new(session.clone(), notifier),
            session,
            config,
        }
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// Content negotiation for a call, with per-call overrides applied last.
    fn negotiate(body: &RequestBody, mode: ResponseMode, overrides: HeaderMap) -> HeaderMap {
        let mut headers = HeaderMap::new();
        let accept = match mode {
            ResponseMode::Json => "application/json",
            ResponseMode::Raw => "*/*",
        };
        headers.insert(header::ACCEPT, HeaderValue::from_static(accept));

        let content_type = match body {
            RequestBody::Json(_) => Some("application/json"),
            RequestBody::Form(_) => Some("application/x-www-form-urlencoded"),
            // The transport supplies the multipart boundary
            RequestBody::Multipart(_) | RequestBody::Empty => None,
        };
        if let Some(content_type) = content_type {
            headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
        }

        for (name, value) in overrides.iter() {
            headers.insert(name.clone(), value.clone());
        }
        if matches!(body, RequestBody::Multipart(_)) {
            headers.remove(header::CONTENT_TYPE);
        }
        headers
    }

    /// Decode a success body. Empty means `null`; non-JSON text is kept as a string.
    fn decode_body(body: &[u8]) -> Result<serde_json::Value, ApiError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(serde_json::Value::Null);
        }
        if let Ok(value) = serde_json::from_slice(body) {
            return Ok(value);
        }
        match std::str::from_utf8(body) {
            Ok(text) => Ok(serde_json::Value::String(text.to_string())),
            Err(_) => Err(ApiError::InvalidResponse(
                "Response body is neither JSON nor text".to_string(),
            )),
        }
    }

    fn resolve(response: HttpResponse, mode: ResponseMode) -> Result<ApiResponse, ApiError> {
        match mode {
            ResponseMode::Raw => Ok(ApiResponse::Raw(response)),
            ResponseMode::Json => Self::decode_body(&response.body).map(ApiResponse::Json),
        }
    }

    /// Run one exchange through the pipeline.
    pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        let ApiRequest {
            method,
            path,
            query,
            body,
            headers,
            response_mode,
            reaction,
        } = request;

        let outgoing = HttpRequest {
            method,
            url: self.config.url_for(&path),
            headers: Self::negotiate(&body, response_mode, headers),
            query,
            body,
        };
        // Token snapshot: later login/logout does not affect this call
        let outgoing = attach_credentials(outgoing, &self.session.token());
        debug!(method = %outgoing.method, url = %outgoing.url, "Sending request");

        let failure = match self.transport.execute(outgoing).await {
            Ok(response) if response.status.is_success() => {
                return Self::resolve(response, response_mode);
            }
            Ok(response) => ExchangeFailure::Status {
                status: response.status,
                body: response.text(),
            },
            Err(e) => ExchangeFailure::NoResponse(e),
        };

        let error = ApiError::classify(failure);
        match reaction {
            ReactionMode::Silent => {
                debug!(error = %error, path = %path, "Request failed, global reaction skipped")
            }
            mode => self.reaction.react(&error, mode),
        }
        Err(error)
    }

    // ===== Typed helpers =====

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.send(ApiRequest::get(path)).await?.into_json()
    }

    pub async fn get_with_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ApiError> {
        let request = query
            .iter()
            .fold(ApiRequest::get(path), |req, (k, v)| req.query(*k, v));
        self.send(request).await?.into_json()
    }

    pub async fn post<T, B>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send(ApiRequest::post(path).json(body)?).await?.into_json()
    }

    pub async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.send(ApiRequest::post(path)).await?.into_json()
    }

    pub async fn put<T, B>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send(ApiRequest::put(path).json(body)?).await?.into_json()
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.send(ApiRequest::delete(path)).await?.into_json()
    }

    pub async fn post_form<T: DeserializeOwned>(
        &self,
        path: &str,
        fields: &[(&str, &str)],
    ) -> Result<T, ApiError> {
        let request = ApiRequest::post(path).form(fields.iter().copied());
        self.send(request).await?.into_json()
    }

    pub async fn post_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        form: MultipartForm,
    ) -> Result<T, ApiError> {
        self.send(ApiRequest::post(path).multipart(form)).await?.into_json()
    }

    /// Fetch a file: the whole exchange, headers included.
    pub async fn download(&self, path: &str) -> Result<HttpResponse, ApiError> {
        self.send(ApiRequest::get(path).raw()).await?.into_raw()
    }
}
