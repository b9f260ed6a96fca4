use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

/// Canonical n8n node type for subworkflow execution.
pub const EXECUTE_WORKFLOW_TYPE: &str = "n8n-nodes-base.executeWorkflow";
/// Lowercase variant seen in older exports.
pub const EXECUTE_WORKFLOW_TYPE_LOWER: &str = "n8n-nodes-base.executeworkflow";
/// Entry trigger marking a workflow as callable as a subworkflow.
pub const EXECUTE_WORKFLOW_TRIGGER_TYPE: &str = "n8n-nodes-base.executeWorkflowTrigger";

/// One executable step inside an n8n workflow.
/// `parameters` is open-ended; subworkflow references hide in there
/// under several shapes, which `detect::patterns` enumerates.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkflowNode {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub node_type: String,
    #[serde(default)]
    pub parameters: Map<String, Value>,
    /// Fields we do not interpret (position, typeVersion, credentials, ...)
    /// but must survive a duplicate round-trip.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl WorkflowNode {
    /// Display name used in reports when the node has no name.
    pub fn display_name(&self) -> String {
        if self.name.is_empty() {
            format!("Node {}", self.id)
        } else {
            self.name.clone()
        }
    }
}

/// An n8n workflow as returned by the API or stored in an export file.
/// `connections` and `settings` are opaque to this crate and passed
/// through unmodified.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Workflow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub nodes: Vec<WorkflowNode>,
    #[serde(default)]
    pub connections: Value,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub settings: Value,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Workflow {
    /// True if this workflow contains an execute-workflow trigger node,
    /// i.e. it is designed to be called as a subworkflow.
    pub fn has_subworkflow_trigger(&self) -> bool {
        self.nodes
            .iter()
            .any(|n| n.node_type == EXECUTE_WORKFLOW_TRIGGER_TYPE)
    }
}

/// Creation/update payload for the workflow store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkflowInput {
    pub name: String,
    pub nodes: Vec<WorkflowNode>,
    pub connections: Value,
    pub settings: Value,
    pub active: bool,
}

impl WorkflowInput {
    /// Payload for a duplicate of `workflow` under a new name.
    /// Duplicates are always created inactive.
    pub fn duplicate_of(workflow: &Workflow, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nodes: workflow.nodes.clone(),
            connections: workflow.connections.clone(),
            settings: if workflow.settings.is_null() {
                json!({})
            } else {
                workflow.settings.clone()
            },
            active: false,
        }
    }

    /// Update payload carrying a workflow's current content, preserving
    /// its name and activation handling on the server side.
    pub fn from_workflow(workflow: &Workflow) -> Self {
        Self {
            name: workflow.name.clone(),
            nodes: workflow.nodes.clone(),
            connections: workflow.connections.clone(),
            settings: if workflow.settings.is_null() {
                json!({})
            } else {
                workflow.settings.clone()
            },
            active: workflow.active,
        }
    }
}

/// A detected pointer from a node to a target workflow.
/// `subworkflow_id` is absent for trigger nodes and pure name matches.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SubworkflowReference {
    pub node_id: String,
    pub node_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subworkflow_id: Option<String>,
    pub node_type: String,
    pub detection_source: String,
}

/// One old-id to new-id entry produced by a duplication run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DuplicationMapping {
    pub old_id: String,
    pub new_id: String,
    pub name: String,
}
