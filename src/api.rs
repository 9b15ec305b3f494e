//! REST client for the todo service.
//!
//! Every call is one HTTP exchange against `<root>/api/todos`. No retries, no
//! caching; a call either yields the decoded value or an [`ApiError`] naming the
//! operation that failed.

use crate::error::{ApiError, Cause, ConfigError};
use crate::task::{Task, TaskDraft, TaskId};
use reqwest::{RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;

#[derive(Debug, Clone)]
pub struct TodoClient {
    http: reqwest::Client,
    collection: String,
}

impl TodoClient {
    pub fn new(base_url: &Url) -> Result<Self, ConfigError> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(ConfigError::HttpClient)?;
        Ok(Self::with_http(http, base_url))
    }

    /// Reuse an existing connection pool.
    pub fn with_http(http: reqwest::Client, base_url: &Url) -> Self {
        let root = base_url.as_str().trim_end_matches('/');
        Self {
            http,
            collection: format!("{}/api/todos", root),
        }
    }

    pub fn collection_url(&self) -> &str {
        &self.collection
    }

    fn item_url(&self, id: TaskId) -> String {
        format!("{}/{}", self.collection, id)
    }

    pub async fn list(&self) -> Result<Vec<Task>, ApiError> {
        tracing::debug!("GET {}", self.collection);
        fetch_json(self.http.get(&self.collection))
            .await
            .map_err(ApiError::List)
    }

    pub async fn get(&self, id: TaskId) -> Result<Task, ApiError> {
        let url = self.item_url(id);
        tracing::debug!("GET {}", url);
        fetch_json(self.http.get(url)).await.map_err(ApiError::Get)
    }

    pub async fn create(&self, draft: &TaskDraft) -> Result<Task, ApiError> {
        tracing::debug!("POST {}", self.collection);
        fetch_json(self.http.post(&self.collection).json(draft))
            .await
            .map_err(ApiError::Create)
    }

    pub async fn update(&self, id: TaskId, draft: &TaskDraft) -> Result<Task, ApiError> {
        let url = self.item_url(id);
        tracing::debug!("PUT {}", url);
        fetch_json(self.http.put(url).json(draft))
            .await
            .map_err(ApiError::Update)
    }

    /// Flips `completed` on the server; the returned task carries the new value.
    pub async fn toggle(&self, id: TaskId) -> Result<Task, ApiError> {
        let url = format!("{}/toggle", self.item_url(id));
        tracing::debug!("PUT {}", url);
        fetch_json(self.http.put(url)).await.map_err(ApiError::Toggle)
    }

    pub async fn delete(&self, id: TaskId) -> Result<(), ApiError> {
        let url = self.item_url(id);
        tracing::debug!("DELETE {}", url);
        // Body is ignored; any 2xx counts as deleted.
        send(self.http.delete(url))
            .await
            .map(drop)
            .map_err(ApiError::Delete)
    }
}

async fn send(request: RequestBuilder) -> Result<Response, Cause> {
    let response = request.send().await.map_err(Cause::Transport)?;
    let status = response.status();
    if !status.is_success() {
        tracing::warn!("todo service returned {}", status);
        return Err(Cause::Status(status));
    }
    Ok(response)
}

async fn fetch_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, Cause> {
    send(request).await?.json().await.map_err(Cause::Decode)
}
