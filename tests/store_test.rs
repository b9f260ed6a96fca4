use serde_json::{Map, json};
use subflow::model::{Workflow, WorkflowInput};
use subflow::store::{InMemoryWorkflowStore, StoreError, WorkflowStore};

fn sample_workflow(name: &str) -> Workflow {
    Workflow {
        id: None,
        name: name.to_string(),
        nodes: vec![],
        connections: json!({}),
        active: false,
        settings: json!({}),
        extra: Map::new(),
    }
}

#[tokio::test]
async fn test_create_assigns_id_and_get_round_trips() {
    let store = InMemoryWorkflowStore::new();
    let created = store
        .create_workflow(WorkflowInput::duplicate_of(&sample_workflow("one"), "one"))
        .await
        .expect("create failed");

    let id = created.id.clone().expect("created workflow must have an id");
    let fetched = store.get_workflow(&id).await.expect("get failed");
    assert_eq!(fetched.name, "one");
}

#[tokio::test]
async fn test_get_unknown_id_is_not_found() {
    let store = InMemoryWorkflowStore::new();
    let err = store.get_workflow("nope").await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound { .. }));
}

#[tokio::test]
async fn test_update_replaces_content() {
    let store = InMemoryWorkflowStore::new();
    store.insert("wf", sample_workflow("before"));

    let mut input = WorkflowInput::from_workflow(&sample_workflow("after"));
    input.active = true;
    let updated = store.update_workflow("wf", input).await.expect("update failed");

    assert_eq!(updated.name, "after");
    assert!(updated.active);
    assert_eq!(updated.id.as_deref(), Some("wf"));

    let err = store
        .update_workflow("missing", WorkflowInput::from_workflow(&sample_workflow("x")))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound { .. }));
}
