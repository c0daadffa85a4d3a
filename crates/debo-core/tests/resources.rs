//! CRUD passthrough against a mock backend.

mod common;

use common::harness;
use debo_core::models::{Project, User};
use debo_core::{services, ApiError, ClientConfig, HttpClient, RequestConfig};
use serde_json::json;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn public_client() -> (MockServer, HttpClient) {
    let server = MockServer::start().await;
    let http = HttpClient::public(ClientConfig::new(server.uri())).unwrap();
    (server, http)
}

#[tokio::test]
async fn test_list_all_returns_page_envelope() {
    let (server, http) = public_client().await;

    Mock::given(method("GET"))
        .and(path("/api/projects"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 3,
            "next": null,
            "previous": format!("{}/api/projects", server.uri()),
            "results": [{ "id": 3, "title": "Library", "description": "Books for Bahir Dar" }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let page = services::projects(&http)
        .list_all(Some(RequestConfig::new().param("page", 2)))
        .await
        .unwrap();

    assert_eq!(page.count, 3);
    assert!(!page.has_next());
    assert_eq!(page.results[0].title, "Library");
}

#[tokio::test]
async fn test_next_page_follows_absolute_link() {
    let (server, http) = public_client().await;

    Mock::given(method("GET"))
        .and(path("/api/projects"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 2, "next": null, "previous": null,
            "results": [{ "id": 2, "title": "Second", "description": "" }]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/projects"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 2,
            "next": format!("{}/api/projects?page=2", server.uri()),
            "previous": null,
            "results": [{ "id": 1, "title": "First", "description": "" }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let projects = services::projects(&http);
    let first = projects.list_all(None).await.unwrap();
    let second = projects.next_page(&first).await.unwrap().expect("second page");
    assert_eq!(second.results[0].id, Some(2));
    assert!(projects.next_page(&second).await.unwrap().is_none());
}

#[tokio::test]
async fn test_create_then_get_round_trip() {
    let h = harness().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/users"))
        .and(body_json(json!({ "email": "new@example.com" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": 9, "email": "new@example.com" })))
        .expect(1)
        .mount(&h.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/auth/users/9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": 9, "email": "new@example.com" })))
        .expect(1)
        .mount(&h.server)
        .await;

    let users = services::users(&h.http);
    let created = users.create(&User::new("new@example.com"), None).await.unwrap();
    let id = created.id.expect("server assigns an id");
    let fetched = users.get(id).await.unwrap();
    assert_eq!(fetched.id, created.id);
    assert_eq!(fetched.email, created.email);
}

#[tokio::test]
async fn test_replace_and_update() {
    let (server, http) = public_client().await;

    Mock::given(method("PUT"))
        .and(path("/api/projects/4"))
        .and(body_json(json!({ "title": "Clinic", "description": "Rebuilt" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": 4, "title": "Clinic", "description": "Rebuilt" })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/api/projects/4"))
        .and(body_json(json!({ "description": "Open" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": 4, "title": "Clinic", "description": "Open" })))
        .expect(1)
        .mount(&server)
        .await;

    let projects = services::projects(&http);
    let replaced = projects
        .replace(4, &Project::new("Clinic", "Rebuilt"), None)
        .await
        .unwrap();
    assert_eq!(replaced.description, "Rebuilt");

    let updated = projects
        .update(4, &json!({ "description": "Open" }), None)
        .await
        .unwrap();
    assert_eq!(updated.description, "Open");
    assert_eq!(updated.title, "Clinic");
}

#[tokio::test]
async fn test_remove_handles_empty_and_echoed_bodies() {
    let (server, http) = public_client().await;

    Mock::given(method("DELETE"))
        .and(path("/api/projects/1"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/projects/2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": 2, "title": "Gone", "description": "" })))
        .mount(&server)
        .await;

    let projects = services::projects(&http);
    assert!(projects.remove(1).await.unwrap().is_none());
    assert_eq!(projects.remove(2).await.unwrap().unwrap().title, "Gone");
}

#[tokio::test]
async fn test_errors_pass_through_unchanged() {
    let (server, http) = public_client().await;

    Mock::given(method("GET"))
        .and(path("/api/projects/404"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "detail": "Not found." })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/projects"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({ "title": ["This field is required."] })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/projects/500"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/projects/garbled"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .mount(&server)
        .await;

    let projects = services::projects(&http);
    assert!(matches!(projects.get(404).await, Err(ApiError::NotFound(_))));
    assert!(matches!(
        projects.create(&Project::new("", ""), None).await,
        Err(ApiError::BadRequest(ref body)) if body.contains("required")
    ));
    assert!(matches!(projects.get(500).await, Err(ApiError::ServerError(_))));
    assert!(matches!(projects.get("garbled").await, Err(ApiError::InvalidResponse(_))));
}

#[tokio::test]
async fn test_network_failure_is_a_network_error() {
    // Nothing listens on the discard port
    let http = HttpClient::public(ClientConfig::new("http://127.0.0.1:9")).unwrap();
    let err = services::projects(&http).get(1).await.unwrap_err();
    assert!(matches!(err, ApiError::NetworkError(_)));
    assert!(!err.is_canceled());
}
