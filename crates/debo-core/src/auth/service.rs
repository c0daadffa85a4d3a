use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::api::endpoints::{LOGIN_PATH, LOGOUT_PATH};
use crate::api::{ApiError, HttpClient, RequestConfig, RequestContext};

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

/// Body of a successful login. The refresh token arrives as a cookie.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Login, logout and status checks over an authenticated [`HttpClient`].
#[derive(Clone)]
pub struct AuthService {
    http: HttpClient,
}

impl AuthService {
    pub fn new(http: HttpClient) -> Result<Self, ApiError> {
        if !http.is_authenticated_client() {
            return Err(ApiError::Configuration(
                "auth service needs a client with a token store".to_string(),
            ));
        }
        Ok(Self { http })
    }

    pub fn http(&self) -> &HttpClient {
        &self.http
    }

    /// Exchange credentials for an access token and store it.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, ApiError> {
        let ctx = RequestContext::post(LOGIN_PATH)
            .json(&LoginRequest { email, password })?
            .without_refresh();
        let response: LoginResponse = self.http.send_json(ctx).await?;

        match response.access {
            Some(ref token) => {
                if let Some(store) = self.http.token_store() {
                    store.set(token)?;
                }
                debug!(email = email, "Logged in");
            }
            None => warn!("Login response did not include an access token"),
        }

        Ok(response)
    }

    /// Sign out. The server call is best effort; the local token is always
    /// cleared and the user sent to the login route.
    pub async fn logout(&self) {
        self.logout_with(None).await
    }

    /// [`logout`](Self::logout) with per-request options. Canceling only
    /// abandons the server call; the local sign-out still happens.
    pub async fn logout_with(&self, config: Option<RequestConfig>) {
        let result = match RequestContext::post(LOGOUT_PATH).json(&serde_json::json!({})) {
            Ok(ctx) => {
                let ctx = ctx.with_config(config).without_refresh();
                self.http.send(ctx).await.map(|_| ())
            }
            Err(e) => Err(e),
        };
        if let Err(e) = result {
            warn!(error = %e, "Logout request failed");
        }

        if let Some(store) = self.http.token_store() {
            if let Err(e) = store.clear() {
                warn!(error = %e, "Failed to clear access token");
            }
        }
        if let Some(navigator) = self.http.navigator() {
            navigator.navigate(&self.http.config().login_route);
        }
    }

    /// Whether a token is present. Says nothing about whether it still works.
    pub fn is_authenticated(&self) -> bool {
        self.current_token().is_some()
    }

    pub fn current_token(&self) -> Option<String> {
        self.http.token_store().and_then(|store| store.get())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::auth::{MemoryTokenStore, RecordingNavigator};
    use crate::config::ClientConfig;
    use crate::auth::token_store::TokenStore;

    #[test]
    fn test_requires_authenticated_client() {
        let public = HttpClient::public(ClientConfig::default()).unwrap();
        assert!(matches!(AuthService::new(public), Err(ApiError::Configuration(_))));
    }

    #[test]
    fn test_status_reflects_token_presence() {
        let store = MemoryTokenStore::new();
        let http = HttpClient::authenticated(
            ClientConfig::default(),
            Arc::new(store.clone()),
            Arc::new(RecordingNavigator::new()),
        )
        .unwrap();
        let auth = AuthService::new(http).unwrap();
        assert!(!auth.is_authenticated());

        // Presence only; an expired token still counts
        store.set("expired-but-present").unwrap();
        assert!(auth.is_authenticated());
        assert_eq!(auth.current_token().as_deref(), Some("expired-but-present"));
    }

    #[test]
    fn test_login_response_keeps_extra_fields() {
        let json = r#"{"access": "a1", "user": {"id": 3}}"#;
        let response: LoginResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.access.as_deref(), Some("a1"));
        assert_eq!(response.extra["user"]["id"], 3);
    }
}
