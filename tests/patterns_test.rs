use serde_json::{Map, Value, json};
use subflow::detect::identify_subworkflow_from_node;
use subflow::model::WorkflowNode;

fn node(id: &str, name: &str, node_type: &str, parameters: Value) -> WorkflowNode {
    WorkflowNode {
        id: id.to_string(),
        name: name.to_string(),
        node_type: node_type.to_string(),
        parameters: parameters.as_object().cloned().unwrap_or_default(),
        extra: Map::new(),
    }
}

#[test]
fn test_standard_execute_workflow_node() {
    let n = node(
        "1",
        "Executar Subworkflow",
        "n8n-nodes-base.executeWorkflow",
        json!({ "workflowId": "123abc" }),
    );

    let reference = identify_subworkflow_from_node(&n).expect("should match");
    assert_eq!(reference.subworkflow_id.as_deref(), Some("123abc"));
    assert_eq!(reference.detection_source, "executeWorkflow-standard");
    assert_eq!(reference.node_id, "1");
    assert_eq!(reference.node_name, "Executar Subworkflow");
}

#[test]
fn test_lowercase_type_variant() {
    let n = node(
        "2",
        "Sub",
        "n8n-nodes-base.executeworkflow",
        json!({ "workflowId": "wf-2" }),
    );

    let reference = identify_subworkflow_from_node(&n).expect("should match");
    assert_eq!(reference.subworkflow_id.as_deref(), Some("wf-2"));
    assert_eq!(reference.detection_source, "executeworkflow-lowercase");
}

#[test]
fn test_legacy_name_with_nested_value() {
    let n = node(
        "3",
        "Execute Workflow (old)",
        "custom.node",
        json!({ "workflow": { "value": "wf-9" } }),
    );

    let reference = identify_subworkflow_from_node(&n).expect("should match");
    assert_eq!(reference.subworkflow_id.as_deref(), Some("wf-9"));
    assert_eq!(reference.detection_source, "executeWorkflow-legacy");
}

#[test]
fn test_sub_workflow_format() {
    let n = node(
        "4",
        "Step",
        "vendor.executeworkflow.v2",
        json!({ "workflowId": "wf-4" }),
    );

    let reference = identify_subworkflow_from_node(&n).expect("should match");
    assert_eq!(reference.subworkflow_id.as_deref(), Some("wf-4"));
    assert_eq!(reference.detection_source, "executeSubworkflow");
}

#[test]
fn test_direct_parameter_any_type() {
    let n = node(
        "5",
        "Fetch data",
        "custom.http",
        json!({ "workflowId": "wf-5" }),
    );

    let reference = identify_subworkflow_from_node(&n).expect("should match");
    assert_eq!(reference.subworkflow_id.as_deref(), Some("wf-5"));
    assert_eq!(reference.detection_source, "direct-parameter");
}

#[test]
fn test_nested_workflow_object() {
    let n = node(
        "6",
        "Call helper",
        "custom.node",
        json!({ "workflow": { "value": "wf-6" } }),
    );

    let reference = identify_subworkflow_from_node(&n).expect("should match");
    assert_eq!(reference.subworkflow_id.as_deref(), Some("wf-6"));
    assert_eq!(reference.detection_source, "nested-workflow-object");
}

#[test]
fn test_name_heuristic_parameter_scan() {
    let n = node(
        "7",
        "My Workflow Caller",
        "custom.node",
        json!({ "targetId": "42" }),
    );

    let reference = identify_subworkflow_from_node(&n).expect("should match");
    assert_eq!(reference.subworkflow_id.as_deref(), Some("42"));
    assert_eq!(reference.detection_source, "parameter-targetId");
}

#[test]
fn test_name_heuristic_numeric_id() {
    let n = node(
        "8",
        "subflow runner",
        "custom.node",
        json!({ "workflowRef": 77 }),
    );

    let reference = identify_subworkflow_from_node(&n).expect("should match");
    assert_eq!(reference.subworkflow_id.as_deref(), Some("77"));
    assert_eq!(reference.detection_source, "parameter-workflowRef");
}

#[test]
fn test_name_pattern_only_reports_null_id() {
    let n = node("9", "workflow helper", "custom.node", json!({}));

    let reference = identify_subworkflow_from_node(&n).expect("should match");
    assert_eq!(reference.subworkflow_id, None);
    assert_eq!(reference.detection_source, "name-pattern-only");
}

#[test]
fn test_precedence_standard_beats_direct_parameter() {
    // Matches both the canonical type (pattern 1) and the direct parameter
    // (pattern 5); precedence must classify it as pattern 1.
    let n = node(
        "10",
        "Step",
        "n8n-nodes-base.executeWorkflow",
        json!({ "workflowId": "wf-10" }),
    );

    let reference = identify_subworkflow_from_node(&n).expect("should match");
    assert_eq!(reference.detection_source, "executeWorkflow-standard");
}

#[test]
fn test_trigger_node_reported_without_id() {
    let n = node(
        "11",
        "When called by another workflow",
        "n8n-nodes-base.executeWorkflowTrigger",
        json!({}),
    );

    let reference = identify_subworkflow_from_node(&n).expect("should match");
    assert_eq!(reference.subworkflow_id, None);
    assert_eq!(reference.node_type, "executeWorkflowTrigger");
    assert_eq!(reference.detection_source, "trigger-node");
}

#[test]
fn test_unrelated_node_does_not_match() {
    let n = node("12", "Send email", "n8n-nodes-base.email", json!({ "to": "a@b.c" }));
    assert!(identify_subworkflow_from_node(&n).is_none());
}

#[test]
fn test_execute_type_without_extractable_id_does_not_match() {
    // Canonical type but no id anywhere and not a trigger: every pattern
    // falls through.
    let n = node("13", "Step", "n8n-nodes-base.executeWorkflow", json!({}));
    assert!(identify_subworkflow_from_node(&n).is_none());
}

#[test]
fn test_unnamed_node_gets_fallback_display_name() {
    let n = node(
        "14",
        "",
        "n8n-nodes-base.executeWorkflow",
        json!({ "workflowId": "wf-14" }),
    );

    let reference = identify_subworkflow_from_node(&n).expect("should match");
    assert_eq!(reference.node_name, "Node 14");
}
