//! Client library for the Debo Ethiopia REST API.
//!
//! # Overview
//! - `api`: the HTTP pipeline (`HttpClient`), generic CRUD (`ResourceClient`)
//!   and the `ApiError` taxonomy
//! - `auth`: token storage, the redirect hook and `AuthService`
//! - `models`: `Page`, `Project`, `User`
//! - `services`: ready-made resource clients for the backend endpoints
//! - `config`: client settings and persisted user settings
//!
//! # Example
//! ```no_run
//! use std::sync::Arc;
//!
//! use debo_core::auth::{AuthService, MemoryTokenStore, TracingNavigator};
//! use debo_core::{services, ClientConfig, HttpClient};
//!
//! # async fn run() -> Result<(), debo_core::ApiError> {
//! let http = HttpClient::authenticated(
//!     ClientConfig::default(),
//!     Arc::new(MemoryTokenStore::new()),
//!     Arc::new(TracingNavigator),
//! )?;
//! let auth = AuthService::new(http.clone())?;
//! auth.login("abebe@example.com", "secret").await?;
//!
//! let users = services::users(&http);
//! let me = users.get("me").await?;
//! println!("{}", me.email);
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod models;
pub mod services;

pub use api::{ApiError, HttpClient, RequestConfig, RequestContext, ResourceClient};
pub use config::{ClientConfig, Config};
