use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;

use crate::model::{Workflow, WorkflowInput};
use crate::store::{StoreError, WorkflowStore};

const API_KEY_HEADER: &str = "X-N8N-API-KEY";

/// Workflow store backed by the n8n REST API.
pub struct HttpWorkflowStore {
    client: Client,
    base_url: String,
    api_key: String,
}

impl HttpWorkflowStore {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    /// Build a store from the N8N_API_URL / N8N_API_KEY environment
    /// variables, the configuration the CLI tools expect.
    pub fn from_env() -> anyhow::Result<Self> {
        let base_url = std::env::var("N8N_API_URL")
            .map_err(|_| anyhow::anyhow!("N8N_API_URL environment variable is required"))?;
        let api_key = std::env::var("N8N_API_KEY")
            .map_err(|_| anyhow::anyhow!("N8N_API_KEY environment variable is required"))?;
        Ok(Self::new(base_url, api_key))
    }

    fn workflows_url(&self) -> String {
        format!("{}/api/v1/workflows", self.base_url)
    }

    fn workflow_url(&self, id: &str) -> String {
        format!("{}/api/v1/workflows/{}", self.base_url, id)
    }

    async fn parse_response<T: DeserializeOwned>(
        response: reqwest::Response,
        id: Option<&str>,
    ) -> Result<T, StoreError> {
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            if let Some(id) = id {
                return Err(StoreError::NotFound { id: id.to_string() });
            }
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(StoreError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl WorkflowStore for HttpWorkflowStore {
    async fn get_workflow(&self, id: &str) -> Result<Workflow, StoreError> {
        let response = self
            .client
            .get(self.workflow_url(id))
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await?;
        Self::parse_response(response, Some(id)).await
    }

    async fn create_workflow(&self, data: WorkflowInput) -> Result<Workflow, StoreError> {
        let response = self
            .client
            .post(self.workflows_url())
            .header(API_KEY_HEADER, &self.api_key)
            .json(&data)
            .send()
            .await?;
        Self::parse_response(response, None).await
    }

    async fn update_workflow(&self, id: &str, data: WorkflowInput) -> Result<Workflow, StoreError> {
        let response = self
            .client
            .put(self.workflow_url(id))
            .header(API_KEY_HEADER, &self.api_key)
            .json(&data)
            .send()
            .await?;
        Self::parse_response(response, Some(id)).await
    }
}
