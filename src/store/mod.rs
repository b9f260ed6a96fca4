pub mod http;

use async_trait::async_trait;
use dashmap::DashMap;
use thiserror::Error;
use uuid::Uuid;

use crate::model::{Workflow, WorkflowInput};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("workflow not found: {id}")]
    NotFound { id: String },
    #[error("workflow API error: {status} - {message}")]
    Api { status: u16, message: String },
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

// --- Interface ---

#[async_trait]
pub trait WorkflowStore: Send + Sync {
    async fn get_workflow(&self, id: &str) -> Result<Workflow, StoreError>;
    async fn create_workflow(&self, data: WorkflowInput) -> Result<Workflow, StoreError>;
    async fn update_workflow(&self, id: &str, data: WorkflowInput) -> Result<Workflow, StoreError>;
}

// --- In-Memory Implementation ---

/// Map-backed store used by tests and embedders that already hold the
/// workflow definitions. Ids are assigned on create.
pub struct InMemoryWorkflowStore {
    workflows: DashMap<String, Workflow>,
}

impl InMemoryWorkflowStore {
    pub fn new() -> Self {
        Self {
            workflows: DashMap::new(),
        }
    }

    /// Seed the store with a workflow under a fixed id.
    pub fn insert(&self, id: impl Into<String>, mut workflow: Workflow) {
        let id = id.into();
        workflow.id = Some(id.clone());
        self.workflows.insert(id, workflow);
    }

    pub fn len(&self) -> usize {
        self.workflows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workflows.is_empty()
    }
}

impl Default for InMemoryWorkflowStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WorkflowStore for InMemoryWorkflowStore {
    async fn get_workflow(&self, id: &str) -> Result<Workflow, StoreError> {
        self.workflows
            .get(id)
            .map(|w| w.value().clone())
            .ok_or_else(|| StoreError::NotFound { id: id.to_string() })
    }

    async fn create_workflow(&self, data: WorkflowInput) -> Result<Workflow, StoreError> {
        let id = Uuid::new_v4().to_string();
        let workflow = Workflow {
            id: Some(id.clone()),
            name: data.name,
            nodes: data.nodes,
            connections: data.connections,
            active: data.active,
            settings: data.settings,
            extra: Default::default(),
        };
        self.workflows.insert(id, workflow.clone());
        Ok(workflow)
    }

    async fn update_workflow(&self, id: &str, data: WorkflowInput) -> Result<Workflow, StoreError> {
        let mut entry = self
            .workflows
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound { id: id.to_string() })?;

        let workflow = entry.value_mut();
        workflow.name = data.name;
        workflow.nodes = data.nodes;
        workflow.connections = data.connections;
        workflow.settings = data.settings;
        workflow.active = data.active;
        Ok(workflow.clone())
    }
}
