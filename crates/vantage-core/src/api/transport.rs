//! Transport boundary: one HTTP exchange, no interpretation of the result.
//!
//! `ReqwestTransport` is the production implementation. The pipeline only
//! sees the `Transport` trait, so tests can script exchanges in memory.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::{multipart, Client, Method, StatusCode};
use thiserror::Error;
use tracing::debug;

/// Body of an outgoing exchange.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Empty,
    Json(serde_json::Value),
    Form(Vec<(String, String)>),
    Multipart(MultipartForm),
}

/// A multi-part payload for file and blob uploads.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MultipartForm {
    pub parts: Vec<FormPart>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FormPart {
    Text {
        name: String,
        value: String,
    },
    File {
        name: String,
        file_name: String,
        mime: Option<String>,
        bytes: Vec<u8>,
    },
}

impl MultipartForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parts.push(FormPart::Text {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    pub fn file(
        mut self,
        name: impl Into<String>,
        file_name: impl Into<String>,
        mime: Option<&str>,
        bytes: Vec<u8>,
    ) -> Self {
        self.parts.push(FormPart::File {
            name: name.into(),
            file_name: file_name.into(),
            mime: mime.map(str::to_string),
            bytes,
        });
        self
    }
}

/// A fully-resolved outgoing exchange.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub query: Vec<(String, String)>,
    pub body: RequestBody,
}

/// Everything the server sent back: status, headers and the raw body.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    Timeout,
    Connect,
    Other,
}

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportErrorKind::Timeout => f.write_str("timed out"),
            TransportErrorKind::Connect => f.write_str("connection failed"),
            TransportErrorKind::Other => f.write_str("transport failure"),
        }
    }
}

/// No response reached the client.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{kind}: {message}")]
pub struct TransportError {
    pub kind: TransportErrorKind,
    pub message: String,
}

impl TransportError {
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn is_timeout(&self) -> bool {
        self.kind == TransportErrorKind::Timeout
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            TransportErrorKind::Timeout
        } else if err.is_connect() {
            TransportErrorKind::Connect
        } else {
            TransportErrorKind::Other
        };
        Self::new(kind, err.to_string())
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform a single exchange. Non-success statuses are `Ok`; only a
    /// missing response is an error.
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// Transport backed by a pooled `reqwest::Client`.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    fn build_multipart(form: MultipartForm) -> Result<multipart::Form, TransportError> {
        let mut out = multipart::Form::new();
        for part in form.parts {
            out = match part {
                FormPart::Text { name, value } => out.text(name, value),
                FormPart::File {
                    name,
                    file_name,
                    mime,
                    bytes,
                } => {
                    let mut file = multipart::Part::bytes(bytes).file_name(file_name);
                    if let Some(mime) = mime {
                        file = file.mime_str(&mime)?;
                    }
                    out.part(name, file)
                }
            };
        }
        Ok(out)
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        debug!(method = %request.method, url = %request.url, "Dispatching request");

        let mut builder = self
            .client
            .request(request.method, &request.url)
            .headers(request.headers);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        builder = match request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(&value),
            RequestBody::Form(fields) => builder.form(&fields),
            // reqwest sets the multipart boundary header itself
            RequestBody::Multipart(form) => builder.multipart(Self::build_multipart(form)?),
        };

        let response = builder.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?.to_vec();

        debug!(%status, bytes = body.len(), "Response received");
        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}
