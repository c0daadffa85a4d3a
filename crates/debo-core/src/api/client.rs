//! HTTP pipeline shared by every service.
//!
//! `HttpClient` wraps a `reqwest::Client` bound to one API root. The
//! authenticated flavour runs two interceptors around each request:
//!
//! - before sending, the stored access token is attached as
//!   `Authorization: JWT <token>`;
//! - on a 401, the token is refreshed once and the request replayed. The
//!   request's `retried` flag guarantees at most one refresh per request.
//!   When the refresh fails the token is cleared and the user is sent to the
//!   login route.
//!
//! 403 and 429 responses are logged; 429 is retried with exponential backoff
//! only when `rate_limit_retries` is configured.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize};
use tokio::sync::Mutex;
use tracing::{debug, error, warn};

use super::context::{authorize, RequestContext};
use super::endpoints::REFRESH_PATH;
use super::ApiError;
use crate::auth::{Navigator, TokenStore};
use crate::config::ClientConfig;

/// Initial backoff delay in milliseconds for rate limiting.
/// 1 second is polite to the server while not making users wait too long.
const INITIAL_BACKOFF_MS: u64 = 1000;

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access: Option<String>,
}

#[derive(Clone)]
struct AuthLayer {
    store: Arc<dyn TokenStore>,
    navigator: Arc<dyn Navigator>,
    refresh_lock: Arc<Mutex<()>>,
}

/// Configured HTTP client for the API.
/// Clone is cheap - the connection pool, cookie jar and token store are shared.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    config: Arc<ClientConfig>,
    api_root: String,
    auth: Option<AuthLayer>,
}

impl HttpClient {
    /// Client without interceptors, for public endpoints.
    pub fn public(config: ClientConfig) -> Result<Self, ApiError> {
        Self::build(config, None)
    }

    /// Client that attaches the stored token and refreshes it on 401.
    pub fn authenticated(
        config: ClientConfig,
        store: Arc<dyn TokenStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self, ApiError> {
        Self::build(
            config,
            Some(AuthLayer {
                store,
                navigator,
                refresh_lock: Arc::new(Mutex::new(())),
            }),
        )
    }

    fn build(config: ClientConfig, auth: Option<AuthLayer>) -> Result<Self, ApiError> {
        if !config.base_url.starts_with("http://") && !config.base_url.starts_with("https://") {
            return Err(ApiError::Configuration(format!(
                "base URL must start with http:// or https://: {}",
                config.base_url
            )));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .cookie_store(config.with_credentials)
            .build()?;

        Ok(Self {
            client,
            api_root: config.api_root(),
            config: Arc::new(config),
            auth,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn is_authenticated_client(&self) -> bool {
        self.auth.is_some()
    }

    pub fn token_store(&self) -> Option<&Arc<dyn TokenStore>> {
        self.auth.as_ref().map(|a| &a.store)
    }

    pub fn navigator(&self) -> Option<&Arc<dyn Navigator>> {
        self.auth.as_ref().map(|a| &a.navigator)
    }

    /// Resolve a path against the API root. Absolute URLs pass through.
    pub fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        format!("{}/{}", self.api_root, path.trim_start_matches('/'))
    }

    /// Whether a resolved URL points under this client's API root.
    fn is_api_url(&self, url: &str) -> bool {
        match url.strip_prefix(self.api_root.as_str()) {
            Some(rest) => rest.is_empty() || rest.starts_with('/') || rest.starts_with('?'),
            None => false,
        }
    }

    /// Send a request through the interceptors.
    ///
    /// Tokens are only attached, and refreshed, for URLs under the API root;
    /// an absolute URL on another origin goes out without credentials.
    ///
    /// Returns the successful response, or the error the pipeline settled on.
    pub async fn send(&self, mut ctx: RequestContext) -> Result<Response, ApiError> {
        let mut retries = 0;
        let mut backoff_ms = INITIAL_BACKOFF_MS;
        let auth = self.auth.as_ref().filter(|_| self.is_api_url(&self.url(&ctx.path)));
        if auth.is_none() && self.auth.is_some() {
            debug!(path = %ctx.path, "Not sending credentials outside the API root");
        }

        loop {
            if let Some(auth) = auth {
                authorize(&mut ctx, auth.store.as_ref())?;
            }

            let response = self.dispatch(&ctx).await?;
            let status = response.status();
            if status.is_success() {
                return Ok(response);
            }

            match status {
                StatusCode::UNAUTHORIZED if !ctx.retried => {
                    if let Some(auth) = auth {
                        ctx.retried = true;
                        let token = self.refresh_for(&ctx, auth).await?;
                        ctx.set_authorization(&token)?;
                        debug!(method = %ctx.method, path = %ctx.path, "Replaying request with refreshed token");
                        continue;
                    }
                }
                StatusCode::TOO_MANY_REQUESTS if retries < self.config.rate_limit_retries => {
                    retries += 1;
                    warn!(path = %ctx.path, retry = retries, backoff_ms = backoff_ms, "Rate limited, backing off");
                    sleep_or_cancel(&ctx, Duration::from_millis(backoff_ms)).await?;
                    backoff_ms *= 2; // Exponential backoff
                    continue;
                }
                StatusCode::TOO_MANY_REQUESTS => {
                    warn!(path = %ctx.path, "Rate limited");
                }
                _ => {}
            }

            let body = response.text().await.unwrap_or_default();
            if status == StatusCode::FORBIDDEN {
                error!(path = %ctx.path, body = %body, "Access forbidden");
            }
            return Err(ApiError::from_status(status, &body));
        }
    }

    /// Send a request and decode the JSON body.
    pub async fn send_json<T: DeserializeOwned>(&self, ctx: RequestContext) -> Result<T, ApiError> {
        let url = self.url(&ctx.path);
        let response = self.send(ctx).await?;
        let text = response.text().await?;
        parse_json(&url, &text)
    }

    /// Like [`send_json`](Self::send_json), but an empty body decodes to `None`.
    pub async fn send_optional_json<T: DeserializeOwned>(
        &self,
        ctx: RequestContext,
    ) -> Result<Option<T>, ApiError> {
        let url = self.url(&ctx.path);
        let response = self.send(ctx).await?;
        let text = response.text().await?;
        if text.trim().is_empty() {
            return Ok(None);
        }
        parse_json(&url, &text).map(Some)
    }

    async fn dispatch(&self, ctx: &RequestContext) -> Result<Response, ApiError> {
        if ctx.is_canceled() {
            return Err(ApiError::Canceled);
        }

        let url = self.url(&ctx.path);
        debug!(method = %ctx.method, url = %url, retried = ctx.retried, "Sending request");

        let mut request = self
            .client
            .request(ctx.method.clone(), &url)
            .headers(ctx.headers.clone());
        if !ctx.config.params.is_empty() {
            request = request.query(&ctx.config.params);
        }
        if let Some(ref body) = ctx.body {
            request = request.json(body);
        }
        if let Some(timeout) = ctx.config.timeout {
            request = request.timeout(timeout);
        }

        match ctx.config.cancel {
            Some(ref token) => tokio::select! {
                biased;
                _ = token.cancelled() => Err(ApiError::Canceled),
                result = request.send() => Ok(result?),
            },
            None => Ok(request.send().await?),
        }
    }

    /// Obtain a fresh token for a request that got a 401.
    ///
    /// On failure the stored token is cleared and the user is redirected to
    /// the login route before the error is returned.
    async fn refresh_for(&self, ctx: &RequestContext, auth: &AuthLayer) -> Result<String, ApiError> {
        if !self.config.shared_refresh {
            let result = self.refresh(auth).await;
            return self.settle_refresh(auth, result);
        }

        // Held until the outcome is stored, so waiters see either the new
        // token or the cleared store
        let _guard = auth.refresh_lock.lock().await;
        match auth.store.get() {
            Some(current) if Some(current.as_str()) != ctx.bearer_token() => {
                debug!("Token already refreshed by a concurrent request");
                Ok(current)
            }
            None if ctx.bearer_token().is_some() => {
                debug!("Session already ended by a concurrent refresh");
                Err(ApiError::RefreshFailed(Box::new(ApiError::Unauthorized)))
            }
            _ => {
                let result = self.refresh(auth).await;
                self.settle_refresh(auth, result)
            }
        }
    }

    /// Sign out on a failed refresh: clear the token and redirect to login.
    fn settle_refresh(
        &self,
        auth: &AuthLayer,
        result: Result<String, ApiError>,
    ) -> Result<String, ApiError> {
        result.map_err(|e| {
            warn!(error = %e, "Token refresh failed, signing out");
            if let Err(clear_err) = auth.store.clear() {
                warn!(error = %clear_err, "Failed to clear access token");
            }
            auth.navigator.navigate(&self.config.login_route);
            ApiError::RefreshFailed(Box::new(e))
        })
    }

    async fn refresh(&self, auth: &AuthLayer) -> Result<String, ApiError> {
        debug!("Refreshing access token");

        // The refresh token rides along in the cookie jar
        let mut ctx = RequestContext::post(REFRESH_PATH)
            .json(&serde_json::json!({}))?
            .without_refresh();
        authorize(&mut ctx, auth.store.as_ref())?;

        let response = self.dispatch(&ctx).await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::from_status(status, &body));
        }

        let text = response.text().await?;
        let refreshed: RefreshResponse = parse_json(&self.url(REFRESH_PATH), &text)?;
        let token = refreshed.access.ok_or_else(|| {
            ApiError::InvalidResponse("refresh response did not include an access token".to_string())
        })?;

        auth.store.set(&token)?;
        debug!("Access token refreshed");
        Ok(token)
    }
}

fn parse_json<T: DeserializeOwned>(url: &str, text: &str) -> Result<T, ApiError> {
    serde_json::from_str(text).map_err(|e| {
        ApiError::InvalidResponse(format!("Failed to parse JSON response from {}: {}", url, e))
    })
}

async fn sleep_or_cancel(ctx: &RequestContext, duration: Duration) -> Result<(), ApiError> {
    match ctx.config.cancel {
        Some(ref token) => tokio::select! {
            _ = token.cancelled() => Err(ApiError::Canceled),
            _ = tokio::time::sleep(duration) => Ok(()),
        },
        None => {
            tokio::time::sleep(duration).await;
            Ok(())
        }
    }
}
