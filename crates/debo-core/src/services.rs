//! Resource clients for the backend's entity endpoints.

use crate::api::endpoints::{PROJECTS_PATH, USERS_PATH};
use crate::api::{HttpClient, ResourceClient};
use crate::models::{Project, User};

/// Projects are public; a client without interceptors is enough.
pub fn projects(http: &HttpClient) -> ResourceClient<Project> {
    ResourceClient::new(http.clone(), PROJECTS_PATH)
}

/// Users require a token; pass an authenticated client.
pub fn users(http: &HttpClient) -> ResourceClient<User> {
    ResourceClient::new(http.clone(), USERS_PATH)
}
