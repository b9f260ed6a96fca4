use std::fs;
use subflow::loader::load_workflow_from_json;

#[test]
fn test_load_workflow_from_json_file() {
    let json_content = r#"
{
  "id": "wf-1",
  "name": "Main Flow",
  "active": true,
  "nodes": [
    {
      "id": "1",
      "name": "Executar Subworkflow",
      "type": "n8n-nodes-base.executeWorkflow",
      "typeVersion": 1,
      "position": [100, 200],
      "parameters": { "workflowId": "123abc" }
    }
  ],
  "connections": {},
  "settings": { "executionOrder": "v1" }
}
"#;

    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let file_path = temp_dir.path().join("workflow.json");
    fs::write(&file_path, json_content).expect("Failed to write temp file");

    let workflow = load_workflow_from_json(&file_path).expect("Failed to load workflow");

    assert_eq!(workflow.id.as_deref(), Some("wf-1"));
    assert_eq!(workflow.name, "Main Flow");
    assert!(workflow.active);
    assert_eq!(workflow.nodes.len(), 1);
    assert_eq!(
        workflow.nodes[0].parameters["workflowId"],
        serde_json::json!("123abc")
    );
    // Unknown node fields survive the round trip.
    assert_eq!(workflow.nodes[0].extra["typeVersion"], serde_json::json!(1));
}

#[test]
fn test_missing_nodes_defaults_to_empty() {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let file_path = temp_dir.path().join("workflow.json");
    fs::write(&file_path, r#"{ "name": "bare" }"#).expect("Failed to write temp file");

    let workflow = load_workflow_from_json(&file_path).expect("Failed to load workflow");
    assert!(workflow.nodes.is_empty());
}

#[test]
fn test_malformed_nodes_is_rejected() {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let file_path = temp_dir.path().join("workflow.json");
    fs::write(&file_path, r#"{ "name": "bad", "nodes": 42 }"#).expect("Failed to write temp file");

    assert!(load_workflow_from_json(&file_path).is_err());
}

#[test]
fn test_missing_file_is_an_error() {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let file_path = temp_dir.path().join("does-not-exist.json");
    assert!(load_workflow_from_json(&file_path).is_err());
}
