//! Generic CRUD accessor bound to one endpoint.

use std::fmt::Display;
use std::marker::PhantomData;

use serde::{de::DeserializeOwned, Serialize};

use super::{ApiError, HttpClient, RequestConfig, RequestContext};
use crate::models::Page;

/// CRUD operations against `endpoint` on the wrapped [`HttpClient`].
///
/// Every method is a straight passthrough: errors are whatever the pipeline
/// produced, untouched.
pub struct ResourceClient<T> {
    http: HttpClient,
    endpoint: String,
    _entity: PhantomData<fn() -> T>,
}

impl<T> Clone for ResourceClient<T> {
    fn clone(&self) -> Self {
        Self {
            http: self.http.clone(),
            endpoint: self.endpoint.clone(),
            _entity: PhantomData,
        }
    }
}

impl<T> std::fmt::Debug for ResourceClient<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceClient")
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

impl<T> ResourceClient<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new(http: HttpClient, endpoint: impl Into<String>) -> Self {
        Self {
            http,
            endpoint: endpoint.into(),
            _entity: PhantomData,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn http(&self) -> &HttpClient {
        &self.http
    }

    fn item_path(&self, id: impl Display) -> String {
        format!("{}/{}", self.endpoint.trim_end_matches('/'), id)
    }

    /// GET the endpoint, returning one page of results.
    pub async fn list_all(&self, config: Option<RequestConfig>) -> Result<Page<T>, ApiError> {
        let ctx = RequestContext::get(self.endpoint.as_str()).with_config(config);
        self.http.send_json(ctx).await
    }

    /// Follow the `next` link of a page. `None` on the last page.
    pub async fn next_page(&self, page: &Page<T>) -> Result<Option<Page<T>>, ApiError> {
        match page.next {
            Some(ref next) => self.http.send_json(RequestContext::get(next.as_str())).await.map(Some),
            None => Ok(None),
        }
    }

    pub async fn get(&self, id: impl Display) -> Result<T, ApiError> {
        self.http.send_json(RequestContext::get(self.item_path(id))).await
    }

    pub async fn create(&self, entity: &T, config: Option<RequestConfig>) -> Result<T, ApiError> {
        let ctx = RequestContext::post(self.endpoint.as_str())
            .json(entity)?
            .with_config(config);
        self.http.send_json(ctx).await
    }

    pub async fn replace(
        &self,
        id: impl Display,
        entity: &T,
        config: Option<RequestConfig>,
    ) -> Result<T, ApiError> {
        let ctx = RequestContext::put(self.item_path(id))
            .json(entity)?
            .with_config(config);
        self.http.send_json(ctx).await
    }

    /// PATCH with any subset of the entity's fields.
    pub async fn update<P: Serialize + ?Sized>(
        &self,
        id: impl Display,
        patch: &P,
        config: Option<RequestConfig>,
    ) -> Result<T, ApiError> {
        let ctx = RequestContext::patch(self.item_path(id))
            .json(patch)?
            .with_config(config);
        self.http.send_json(ctx).await
    }

    /// DELETE. The backend usually answers 204, which yields `None`.
    pub async fn remove(&self, id: impl Display) -> Result<Option<T>, ApiError> {
        self.http
            .send_optional_json(RequestContext::delete(self.item_path(id)))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use crate::models::Project;

    #[test]
    fn test_item_path() {
        let http = HttpClient::public(ClientConfig::default()).unwrap();
        let projects: ResourceClient<Project> = ResourceClient::new(http.clone(), "/projects");
        assert_eq!(projects.item_path(7), "/projects/7");
        assert_eq!(projects.item_path("slug"), "/projects/slug");

        let trailing: ResourceClient<Project> = ResourceClient::new(http, "/projects/");
        assert_eq!(trailing.item_path(7), "/projects/7");
        assert_eq!(trailing.endpoint(), "/projects/");
    }
}
