//! REST API client module for the platform backend.
//!
//! This module provides the `ApiClient` request pipeline that every feature
//! call goes through, the failure classification taxonomy, the central
//! reaction to failed exchanges and the authentication endpoint wrapper.
//!
//! Authenticated calls carry the session token as a bearer credential.

pub mod auth;
pub mod client;
pub mod error;
pub mod reaction;
pub mod request;
pub mod transport;

pub use auth::{AuthApi, LoginRequest, LoginResponse, RegisterRequest};
pub use client::{attach_credentials, ApiClient};
pub use error::{ApiError, ExchangeFailure, FailureCategory};
pub use reaction::GlobalReaction;
pub use request::{ApiRequest, ApiResponse, ReactionMode, ResponseMode};
pub use transport::{
    HttpRequest, HttpResponse, MultipartForm, ReqwestTransport, RequestBody, Transport,
    TransportError, TransportErrorKind,
};
