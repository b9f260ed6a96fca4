use serde_json::Value;

use crate::model::{
    EXECUTE_WORKFLOW_TRIGGER_TYPE, EXECUTE_WORKFLOW_TYPE, EXECUTE_WORKFLOW_TYPE_LOWER,
    SubworkflowReference, WorkflowNode,
};

pub const SOURCE_STANDARD: &str = "executeWorkflow-standard";
pub const SOURCE_LOWERCASE: &str = "executeworkflow-lowercase";
pub const SOURCE_LEGACY: &str = "executeWorkflow-legacy";
pub const SOURCE_SUBWORKFLOW: &str = "executeSubworkflow";
pub const SOURCE_DIRECT_PARAMETER: &str = "direct-parameter";
pub const SOURCE_NESTED_OBJECT: &str = "nested-workflow-object";
pub const SOURCE_NAME_ONLY: &str = "name-pattern-only";
pub const SOURCE_TRIGGER: &str = "trigger-node";

/// Result of one pattern's extraction attempt.
pub struct Extraction {
    pub id: Option<String>,
    pub source: String,
}

/// One detection pattern: a structural predicate plus an extractor.
/// Patterns are tried in slice order; the order encodes precedence, so the
/// canonical forms must stay ahead of the generic name heuristic.
pub struct Pattern {
    pub check: fn(&WorkflowNode) -> bool,
    pub extract: fn(&WorkflowNode) -> Extraction,
}

/// Known subworkflow reference shapes, most specific first.
pub const SUBWORKFLOW_PATTERNS: &[Pattern] = &[
    // 1. Canonical execute-workflow node
    Pattern {
        check: |node| node.node_type == EXECUTE_WORKFLOW_TYPE,
        extract: |node| Extraction {
            id: workflow_id_param(node),
            source: SOURCE_STANDARD.to_string(),
        },
    },
    // 2. Lowercase type variant
    Pattern {
        check: |node| node.node_type == EXECUTE_WORKFLOW_TYPE_LOWER,
        extract: |node| Extraction {
            id: workflow_id_param(node),
            source: SOURCE_LOWERCASE.to_string(),
        },
    },
    // 3. Legacy "Execute Workflow" nodes
    Pattern {
        check: |node| {
            node.node_type.contains("executeWorkflow") || node.name.contains("Execute Workflow")
        },
        extract: |node| Extraction {
            id: workflow_id_param(node).or_else(|| nested_workflow_value(node)),
            source: SOURCE_LEGACY.to_string(),
        },
    },
    // 4. "Execute Sub-workflow" (newer format)
    Pattern {
        check: |node| {
            node.node_type.contains("executeworkflow")
                || node.name.contains("Execute Sub-workflow")
        },
        extract: |node| Extraction {
            id: workflow_id_param(node).or_else(|| nested_workflow_value(node)),
            source: SOURCE_SUBWORKFLOW.to_string(),
        },
    },
    // 5. Direct workflowId parameter, any node type
    Pattern {
        check: |node| node.parameters.contains_key("workflowId"),
        extract: |node| Extraction {
            id: workflow_id_param(node),
            source: SOURCE_DIRECT_PARAMETER.to_string(),
        },
    },
    // 6. Nested workflow object parameter
    Pattern {
        check: |node| nested_workflow_value(node).is_some(),
        extract: |node| Extraction {
            id: nested_workflow_value(node),
            source: SOURCE_NESTED_OBJECT.to_string(),
        },
    },
    // 7. Name heuristic: scan parameters for anything id-like
    Pattern {
        check: |node| {
            let name = node.name.to_lowercase();
            name.contains("workflow") || name.contains("subflow")
        },
        extract: |node| {
            for (key, value) in &node.parameters {
                let key_lower = key.to_lowercase();
                if key_lower.contains("id") || key_lower.contains("workflow") {
                    if let Some(id) = value_as_id(value) {
                        return Extraction {
                            id: Some(id),
                            source: format!("parameter-{}", key),
                        };
                    }
                }
            }
            Extraction {
                id: None,
                source: SOURCE_NAME_ONLY.to_string(),
            }
        },
    },
];

/// Stringify a parameter value that can plausibly be a workflow id.
fn value_as_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn workflow_id_param(node: &WorkflowNode) -> Option<String> {
    node.parameters.get("workflowId").and_then(value_as_id)
}

/// Extract `parameters.workflow.value`, the nested reference shape.
fn nested_workflow_value(node: &WorkflowNode) -> Option<String> {
    node.parameters
        .get("workflow")
        .and_then(|w| w.get("value"))
        .and_then(value_as_id)
}

/// Classify one node against the pattern table. The first pattern that
/// matches and yields an id wins. Trigger nodes are reported without an id;
/// a pure name match is reported with `id: None` and is informative only.
pub fn identify_subworkflow_from_node(node: &WorkflowNode) -> Option<SubworkflowReference> {
    for pattern in SUBWORKFLOW_PATTERNS {
        if !(pattern.check)(node) {
            continue;
        }
        let extraction = (pattern.extract)(node);

        if let Some(id) = extraction.id {
            return Some(SubworkflowReference {
                node_id: node.id.clone(),
                node_name: node.display_name(),
                subworkflow_id: Some(id),
                node_type: node.node_type.clone(),
                detection_source: extraction.source,
            });
        }

        if node.node_type == EXECUTE_WORKFLOW_TRIGGER_TYPE {
            // The trigger marks the workflow as *being* a subworkflow;
            // there is no outgoing reference to extract.
            return Some(SubworkflowReference {
                node_id: node.id.clone(),
                node_name: node.display_name(),
                subworkflow_id: None,
                node_type: "executeWorkflowTrigger".to_string(),
                detection_source: SOURCE_TRIGGER.to_string(),
            });
        }

        if extraction.source == SOURCE_NAME_ONLY {
            return Some(SubworkflowReference {
                node_id: node.id.clone(),
                node_name: node.display_name(),
                subworkflow_id: None,
                node_type: node.node_type.clone(),
                detection_source: extraction.source,
            });
        }

        // A matching pattern without an extractable id falls through to the
        // next, less specific pattern.
    }

    None
}
