use std::fmt;

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

use super::transport::TransportError;

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

/// User-facing category of a failed exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureCategory {
    Unauthorized,
    Forbidden,
    NotFound,
    ServerError,
    Other,
    NetworkError,
}

impl FailureCategory {
    /// Classify by HTTP status. `None` means no response reached the client.
    pub fn from_status(status: Option<u16>) -> Self {
        match status {
            Some(401) => FailureCategory::Unauthorized,
            Some(403) => FailureCategory::Forbidden,
            Some(404) => FailureCategory::NotFound,
            Some(500) => FailureCategory::ServerError,
            Some(_) => FailureCategory::Other,
            None => FailureCategory::NetworkError,
        }
    }
}

impl fmt::Display for FailureCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FailureCategory::Unauthorized => "unauthorized",
            FailureCategory::Forbidden => "forbidden",
            FailureCategory::NotFound => "not found",
            FailureCategory::ServerError => "server error",
            FailureCategory::Other => "other",
            FailureCategory::NetworkError => "network error",
        };
        f.write_str(name)
    }
}

/// What went wrong with an exchange, before classification.
#[derive(Debug)]
pub enum ExchangeFailure {
    /// A response arrived with a non-success status.
    Status { status: StatusCode, body: String },
    /// No response reached the client (connect failure, timeout, ...).
    NoResponse(TransportError),
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Unauthorized - session may be expired")]
    Unauthorized { body: String },

    #[error("Access denied: {body}")]
    Forbidden { body: String },

    #[error("Resource not found: {body}")]
    NotFound { body: String },

    #[error("Server error: {body}")]
    ServerError { body: String },

    #[error("Request failed with status {status}: {body}")]
    Other {
        status: StatusCode,
        detail: Option<String>,
        body: String,
    },

    #[error("Network error: {0}")]
    Network(#[source] TransportError),

    #[error("Failed to encode request: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// FastAPI-style error envelope. Only a string `detail` is used as a message.
#[derive(Deserialize)]
struct ErrorEnvelope {
    detail: Option<serde_json::Value>,
}

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            return body.to_string();
        }
        let mut end = MAX_ERROR_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!(
            "{}... (truncated, {} total bytes)",
            &body[..end],
            body.len()
        )
    }

    /// Extract the server-supplied `detail` message from an error body.
    fn extract_detail(body: &str) -> Option<String> {
        let envelope: ErrorEnvelope = serde_json::from_str(body).ok()?;
        match envelope.detail? {
            serde_json::Value::String(detail) if !detail.is_empty() => Some(detail),
            _ => None,
        }
    }

    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let truncated = Self::truncate_body(body);
        match FailureCategory::from_status(Some(status.as_u16())) {
            FailureCategory::Unauthorized => ApiError::Unauthorized { body: truncated },
            FailureCategory::Forbidden => ApiError::Forbidden { body: truncated },
            FailureCategory::NotFound => ApiError::NotFound { body: truncated },
            FailureCategory::ServerError => ApiError::ServerError { body: truncated },
            FailureCategory::Other | FailureCategory::NetworkError => ApiError::Other {
                status,
                detail: Self::extract_detail(body),
                body: truncated,
            },
        }
    }

    /// Classify a failed exchange. Pure: no side effects.
    pub fn classify(failure: ExchangeFailure) -> Self {
        match failure {
            ExchangeFailure::Status { status, body } => Self::from_status(status, &body),
            ExchangeFailure::NoResponse(err) => ApiError::Network(err),
        }
    }

    /// Category for exchange failures; `None` for local encode/decode errors.
    pub fn category(&self) -> Option<FailureCategory> {
        match self {
            ApiError::Unauthorized { .. } => Some(FailureCategory::Unauthorized),
            ApiError::Forbidden { .. } => Some(FailureCategory::Forbidden),
            ApiError::NotFound { .. } => Some(FailureCategory::NotFound),
            ApiError::ServerError { .. } => Some(FailureCategory::ServerError),
            ApiError::Other { .. } => Some(FailureCategory::Other),
            ApiError::Network(_) => Some(FailureCategory::NetworkError),
            ApiError::Encode(_) | ApiError::InvalidResponse(_) => None,
        }
    }

    /// HTTP status of the failed exchange, if a response was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Unauthorized { .. } => Some(401),
            ApiError::Forbidden { .. } => Some(403),
            ApiError::NotFound { .. } => Some(404),
            ApiError::ServerError { .. } => Some(500),
            ApiError::Other { status, .. } => Some(status.as_u16()),
            _ => None,
        }
    }

    /// Server-supplied detail message (only kept for `Other` failures).
    pub fn detail(&self) -> Option<&str> {
        match self {
            ApiError::Other { detail, .. } => detail.as_deref(),
            _ => None,
        }
    }
}
