use serde_json::{Map, Value, json};
use subflow::detect::identify_all_subworkflows;
use subflow::model::{Workflow, WorkflowNode};

fn node(id: &str, name: &str, node_type: &str, parameters: Value) -> WorkflowNode {
    WorkflowNode {
        id: id.to_string(),
        name: name.to_string(),
        node_type: node_type.to_string(),
        parameters: parameters.as_object().cloned().unwrap_or_default(),
        extra: Map::new(),
    }
}

fn workflow(name: &str, nodes: Vec<WorkflowNode>) -> Workflow {
    Workflow {
        id: None,
        name: name.to_string(),
        nodes,
        connections: json!({}),
        active: false,
        settings: json!({}),
        extra: Map::new(),
    }
}

#[test]
fn test_empty_workflow_has_no_subworkflows() {
    let wf = workflow("empty", vec![]);
    let result = identify_all_subworkflows(&wf);
    assert!(!result.has_subworkflows);
    assert!(result.subworkflows.is_empty());
}

#[test]
fn test_single_execute_workflow_node() {
    let wf = workflow(
        "main",
        vec![node(
            "1",
            "Executar Subworkflow",
            "n8n-nodes-base.executeWorkflow",
            json!({ "workflowId": "123abc" }),
        )],
    );

    let result = identify_all_subworkflows(&wf);
    assert!(result.has_subworkflows);
    assert_eq!(result.subworkflows.len(), 1);
    assert_eq!(
        result.subworkflows[0].subworkflow_id.as_deref(),
        Some("123abc")
    );
    assert_eq!(
        result.subworkflows[0].detection_source,
        "executeWorkflow-standard"
    );
}

#[test]
fn test_node_order_is_preserved() {
    let wf = workflow(
        "main",
        vec![
            node(
                "a",
                "First",
                "n8n-nodes-base.executeWorkflow",
                json!({ "workflowId": "wf-1" }),
            ),
            node("b", "Plain", "n8n-nodes-base.set", json!({})),
            node(
                "c",
                "Second",
                "custom.node",
                json!({ "workflowId": "wf-2" }),
            ),
        ],
    );

    let result = identify_all_subworkflows(&wf);
    assert_eq!(result.subworkflows.len(), 2);
    assert_eq!(result.subworkflows[0].node_id, "a");
    assert_eq!(result.subworkflows[1].node_id, "c");
}

#[test]
fn test_extraction_does_not_mutate_input() {
    let wf = workflow(
        "main",
        vec![node(
            "1",
            "Step",
            "n8n-nodes-base.executeWorkflow",
            json!({ "workflowId": "x" }),
        )],
    );
    let before = wf.clone();

    let _ = identify_all_subworkflows(&wf);
    assert_eq!(wf, before);
}

#[test]
fn test_workflow_json_without_nodes_parses_to_empty() {
    let wf: Workflow = serde_json::from_value(json!({ "name": "no nodes" })).unwrap();
    let result = identify_all_subworkflows(&wf);
    assert!(!result.has_subworkflows);
    assert!(result.subworkflows.is_empty());
}
