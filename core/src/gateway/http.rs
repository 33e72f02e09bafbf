//! HTTP client for the remote task resource.

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;

use crate::gateway::error::GatewayError;
use crate::gateway::traits::{GatewayResult, TaskGateway};
use crate::model::form::{TaskForm, TaskPatch};
use crate::model::task::{Task, TaskId};

const TASKS_PATH: &str = "/api/tasks/";

#[derive(Clone)]
pub struct HttpTaskGateway {
    client: Client,
    base_url: String,
}

impl HttpTaskGateway {
    pub fn new(base_url: &str) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn collection_url(&self) -> String {
        format!("{}{}", self.base_url, TASKS_PATH)
    }

    fn item_url(&self, id: TaskId) -> String {
        format!("{}{}{}", self.base_url, TASKS_PATH, id)
    }
}

/// Status check first, then decode. Keeps the raw body for non-2xx replies.
async fn read_json<T: DeserializeOwned>(resp: Response) -> GatewayResult<T> {
    let status = resp.status();
    let text = resp.text().await?;

    if !status.is_success() {
        return Err(GatewayError::Status { status, body: text });
    }

    Ok(serde_json::from_str(&text)?)
}

#[async_trait]
impl TaskGateway for HttpTaskGateway {
    async fn list(&self) -> GatewayResult<Vec<Task>> {
        let url = self.collection_url();
        tracing::debug!(%url, "GET tasks");
        let resp = self.client.get(url).send().await?;
        read_json(resp).await
    }

    async fn create(&self, form: &TaskForm) -> GatewayResult<Task> {
        let url = self.collection_url();
        tracing::debug!(%url, title = %form.title, "POST task");
        let resp = self.client.post(url).json(form).send().await?;
        read_json(resp).await
    }

    async fn update(&self, id: TaskId, patch: &TaskPatch) -> GatewayResult<Task> {
        let url = self.item_url(id);
        tracing::debug!(%url, "PUT task");
        let resp = self.client.put(url).json(patch).send().await?;
        read_json(resp).await
    }

    async fn delete(&self, id: TaskId) -> GatewayResult<()> {
        let url = self.item_url(id);
        tracing::debug!(%url, "DELETE task");
        let resp = self.client.delete(url).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(GatewayError::Status { status, body });
        }
        Ok(())
    }
}
