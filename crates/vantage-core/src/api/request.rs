//! Per-call request context and the pipeline's resolved payload.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::error::ApiError;
use super::transport::{HttpResponse, MultipartForm, RequestBody};

/// How the inbound stage decodes a successful response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseMode {
    /// Decode the body as JSON and hand back only the payload.
    #[default]
    Json,
    /// Hand back the whole exchange (headers and bytes) untouched.
    Raw,
}

/// Which parts of the central failure reaction run for a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReactionMode {
    /// Notify, and end the session on 401.
    #[default]
    Full,
    /// Notify, but a 401 leaves the session alone.
    KeepSession,
    /// No notification, no logout.
    Silent,
}

/// A pending request, owned by the caller until the pipeline settles.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: RequestBody,
    pub headers: HeaderMap,
    pub response_mode: ResponseMode,
    pub reaction: ReactionMode,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: RequestBody::Empty,
            headers: HeaderMap::new(),
            response_mode: ResponseMode::Json,
            reaction: ReactionMode::Full,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self, ApiError> {
        self.body = RequestBody::Json(serde_json::to_value(body)?);
        Ok(self)
    }

    pub fn form<K, V>(mut self, fields: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.body = RequestBody::Form(
            fields
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        );
        self
    }

    pub fn multipart(mut self, form: MultipartForm) -> Self {
        self.body = RequestBody::Multipart(form);
        self
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn raw(mut self) -> Self {
        self.response_mode = ResponseMode::Raw;
        self
    }

    /// Keep the notification but never log out on 401.
    pub fn keep_session(mut self) -> Self {
        self.reaction = ReactionMode::KeepSession;
        self
    }

    /// Skip the central notification/logout reaction for this call.
    pub fn without_global_reaction(mut self) -> Self {
        self.reaction = ReactionMode::Silent;
        self
    }
}

/// Result of a resolved exchange.
#[derive(Debug, Clone)]
pub enum ApiResponse {
    Json(serde_json::Value),
    Raw(HttpResponse),
}

impl ApiResponse {
    /// Deserialize a JSON payload into `T`.
    pub fn into_json<T: DeserializeOwned>(self) -> Result<T, ApiError> {
        match self {
            ApiResponse::Json(value) => serde_json::from_value(value)
                .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse payload: {}", e))),
            ApiResponse::Raw(_) => Err(ApiError::InvalidResponse(
                "Expected a JSON payload, got a raw response".to_string(),
            )),
        }
    }

    pub fn into_raw(self) -> Result<HttpResponse, ApiError> {
        match self {
            ApiResponse::Raw(response) => Ok(response),
            ApiResponse::Json(_) => Err(ApiError::InvalidResponse(
                "Expected a raw response, got a JSON payload".to_string(),
            )),
        }
    }
}
