#![allow(dead_code)]

use std::sync::Arc;

use debo_core::auth::{MemoryTokenStore, RecordingNavigator};
use debo_core::{ClientConfig, HttpClient};
use wiremock::MockServer;

pub struct Harness {
    pub server: MockServer,
    pub store: MemoryTokenStore,
    pub navigator: RecordingNavigator,
    pub http: HttpClient,
}

pub async fn harness() -> Harness {
    harness_with(|config| config).await
}

pub async fn harness_with(tweak: impl FnOnce(ClientConfig) -> ClientConfig) -> Harness {
    let server = MockServer::start().await;
    let store = MemoryTokenStore::new();
    let navigator = RecordingNavigator::new();
    let http = HttpClient::authenticated(
        tweak(ClientConfig::new(server.uri())),
        Arc::new(store.clone()),
        Arc::new(navigator.clone()),
    )
    .expect("Failed to build client");

    Harness {
        server,
        store,
        navigator,
        http,
    }
}

pub fn user_json(id: i64) -> serde_json::Value {
    serde_json::json!({ "id": id, "email": format!("user{id}@example.com") })
}
