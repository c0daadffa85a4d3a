//! Per-request data carried through the HTTP pipeline.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use reqwest::Method;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use super::ApiError;
use crate::auth::TokenStore;

/// Scheme used in the `Authorization` header.
pub const AUTH_SCHEME: &str = "JWT";

/// Optional caller-supplied settings for a single request.
#[derive(Debug, Clone, Default)]
pub struct RequestConfig {
    pub params: Vec<(String, String)>,
    pub headers: HeaderMap,
    pub timeout: Option<Duration>,
    pub cancel: Option<CancellationToken>,
}

impl RequestConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a query string parameter.
    pub fn param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.params.push((key.into(), value.to_string()));
        self
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Abort the request when `token` is cancelled.
    pub fn cancel_with(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }
}

/// One outgoing request. Created per call and discarded once it resolves.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub method: Method,
    /// Path under the API root, or an absolute URL.
    pub path: String,
    pub headers: HeaderMap,
    pub body: Option<serde_json::Value>,
    /// Set once a refresh has been attempted for this request.
    pub retried: bool,
    pub config: RequestConfig,
}

impl RequestContext {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: HeaderMap::new(),
            body: None,
            retried: false,
            config: RequestConfig::default(),
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

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self, ApiError> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    /// Merge caller settings. Headers set later by the pipeline take precedence.
    pub fn with_config(mut self, config: Option<RequestConfig>) -> Self {
        if let Some(config) = config {
            self.headers.extend(config.headers.clone());
            self.config = config;
        }
        self
    }

    /// Never attempt a token refresh for this request.
    pub fn without_refresh(mut self) -> Self {
        self.retried = true;
        self
    }

    pub fn set_authorization(&mut self, token: &str) -> Result<(), ApiError> {
        let value = HeaderValue::from_str(&format!("{} {}", AUTH_SCHEME, token)).map_err(|_| {
            ApiError::Configuration("access token is not a valid header value".to_string())
        })?;
        self.headers.insert(AUTHORIZATION, value);
        Ok(())
    }

    /// Token currently in the `Authorization` header, if any.
    pub fn bearer_token(&self) -> Option<&str> {
        self.headers
            .get(AUTHORIZATION)?
            .to_str()
            .ok()?
            .strip_prefix(AUTH_SCHEME)?
            .strip_prefix(' ')
    }

    pub fn is_canceled(&self) -> bool {
        self.config
            .cancel
            .as_ref()
            .map(|t| t.is_cancelled())
            .unwrap_or(false)
    }
}

/// Request interceptor: attach the stored token, if there is one.
pub fn authorize(ctx: &mut RequestContext, store: &dyn TokenStore) -> Result<(), ApiError> {
    if let Some(token) = store.get() {
        ctx.set_authorization(&token)?;
    }
    Ok(())
}
