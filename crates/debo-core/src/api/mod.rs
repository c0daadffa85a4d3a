//! REST client layer for the Debo Ethiopia backend.
//!
//! This module provides the `HttpClient` pipeline (token attachment and
//! refresh-on-401), the generic `ResourceClient` for CRUD endpoints, and the
//! `ApiError` taxonomy every call reports through.
//!
//! The API authenticates with short-lived JWT access tokens sent as
//! `Authorization: JWT <token>`; the refresh token lives in an HTTP-only
//! cookie set by the server.

pub mod client;
pub mod context;
pub mod endpoints;
pub mod error;
pub mod resource;

pub use client::HttpClient;
pub use context::{authorize, RequestConfig, RequestContext, AUTH_SCHEME};
pub use error::ApiError;
pub use resource::ResourceClient;
