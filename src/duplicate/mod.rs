use std::cmp::Reverse;
use std::sync::Arc;

use anyhow::{Context as AnyhowContext, Result};
use serde_json::Value;
use tracing::{info, warn};

use crate::analysis::dependency::{DependencyAnalyzer, FailurePolicy};
use crate::cancel::CancelToken;
use crate::detect::identify_all_subworkflows;
use crate::model::{DuplicationMapping, Workflow, WorkflowInput, WorkflowNode};
use crate::store::WorkflowStore;

/// Which subworkflows a duplication run copies. Transitive walks the full
/// reachable set deepest-first so inner duplicates can be rewired to their
/// own duplicated children; DirectOnly copies only the root's direct
/// references, leaving nested references pointing at the shared originals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicationScope {
    #[default]
    Transitive,
    DirectOnly,
}

#[derive(Debug, Clone, Default)]
pub struct DuplicateOptions {
    pub scope: DuplicationScope,
    pub cancel: CancelToken,
}

#[derive(Debug, Clone)]
pub struct DuplicationOutcome {
    pub main_workflow: Workflow,
    pub subworkflows: Vec<Workflow>,
    pub mappings: Vec<DuplicationMapping>,
}

/// Duplicate `workflow_id` and its subworkflows through `store`, rewriting
/// subworkflow references in the copies to point at the new ids.
///
/// Root fetch/create failures are fatal. Individual subworkflow failures
/// are not: the failed entry is omitted from the mapping and its references
/// in the duplicate keep pointing at the original.
pub async fn duplicate_workflow_with_subworkflows(
    store: Arc<dyn WorkflowStore>,
    workflow_id: &str,
    new_name: &str,
    options: &DuplicateOptions,
) -> Result<DuplicationOutcome> {
    options.cancel.check()?;
    let root = store
        .get_workflow(workflow_id)
        .await
        .with_context(|| format!("failed to fetch root workflow {}", workflow_id))?;
    info!(workflow = %root.name, nodes = root.nodes.len(), "duplicating workflow");

    let candidates = collect_candidates(&store, workflow_id, &root, options).await?;

    // Every candidate must be resolved (duplicated or skipped) before any
    // reference rewrite starts.
    let mut mappings: Vec<DuplicationMapping> = Vec::new();
    let mut duplicated: Vec<(String, Workflow)> = Vec::new();

    for old_id in &candidates {
        options.cancel.check()?;
        match duplicate_subworkflow(&store, old_id, new_name).await {
            Ok(Some(copy)) => {
                let new_id = match copy.id.clone() {
                    Some(id) => id,
                    None => {
                        warn!(subworkflow = %old_id, "store returned a duplicate without an id");
                        continue;
                    }
                };
                mappings.push(DuplicationMapping {
                    old_id: old_id.clone(),
                    new_id,
                    name: copy.name.clone(),
                });
                duplicated.push((old_id.clone(), copy));
            }
            Ok(None) => {}
            Err(e) => {
                warn!(subworkflow = %old_id, error = %e, "failed to duplicate subworkflow");
            }
        }
    }

    // Transitive copies may reference other duplicated subworkflows; point
    // them at the new ids before touching the root.
    if options.scope == DuplicationScope::Transitive {
        for (_, copy) in duplicated.iter_mut() {
            let rewritten = rewrite_references(&mut copy.nodes, &mappings);
            if rewritten > 0 {
                options.cancel.check()?;
                let id = copy.id.clone().unwrap_or_default();
                match store
                    .update_workflow(&id, WorkflowInput::from_workflow(copy))
                    .await
                {
                    Ok(updated) => *copy = updated,
                    Err(e) => {
                        warn!(subworkflow = %id, error = %e, "failed to update duplicated subworkflow references")
                    }
                }
            }
        }
    }

    options.cancel.check()?;
    let mut main = store
        .create_workflow(WorkflowInput::duplicate_of(&root, new_name))
        .await
        .context("failed to create the duplicated root workflow")?;
    info!(id = ?main.id, name = %main.name, "root workflow duplicated");

    if !mappings.is_empty() {
        let rewritten = rewrite_references(&mut main.nodes, &mappings);
        if rewritten > 0 {
            options.cancel.check()?;
            let id = main
                .id
                .clone()
                .context("duplicated root workflow has no id")?;
            main = store
                .update_workflow(&id, WorkflowInput::from_workflow(&main))
                .await
                .context("failed to update root workflow references")?;
            info!(count = rewritten, "subworkflow references rewritten");
        }
    }

    Ok(DuplicationOutcome {
        main_workflow: main,
        subworkflows: duplicated.into_iter().map(|(_, w)| w).collect(),
        mappings,
    })
}

/// Target ids to duplicate, root excluded, trigger-only references skipped.
async fn collect_candidates(
    store: &Arc<dyn WorkflowStore>,
    root_id: &str,
    root: &Workflow,
    options: &DuplicateOptions,
) -> Result<Vec<String>> {
    match options.scope {
        DuplicationScope::DirectOnly => {
            let detection = identify_all_subworkflows(root);
            let mut ids = Vec::new();
            for reference in detection.subworkflows {
                if reference.node_type == "executeWorkflowTrigger" {
                    continue;
                }
                let Some(id) = reference.subworkflow_id else {
                    continue;
                };
                if id != root_id && !ids.contains(&id) {
                    ids.push(id);
                }
            }
            Ok(ids)
        }
        DuplicationScope::Transitive => {
            let mut analyzer = DependencyAnalyzer::new(store.clone())
                .with_policy(FailurePolicy::BestEffort)
                .with_cancel(options.cancel.clone());
            analyzer.analyze(root_id).await?;

            // Deepest first, so children exist before their callers are
            // rewritten.
            let mut reachable: Vec<(String, usize)> = analyzer
                .depths()
                .iter()
                .filter(|(id, _)| id.as_str() != root_id)
                .map(|(id, depth)| (id.clone(), *depth))
                .collect();
            reachable.sort_by_key(|(id, depth)| (Reverse(*depth), id.clone()));
            Ok(reachable.into_iter().map(|(id, _)| id).collect())
        }
    }
}

/// Fetch and copy one subworkflow. Returns Ok(None) when the target is not
/// actually a subworkflow (no execute-workflow trigger node).
async fn duplicate_subworkflow(
    store: &Arc<dyn WorkflowStore>,
    old_id: &str,
    new_name: &str,
) -> Result<Option<Workflow>> {
    let original = store.get_workflow(old_id).await?;

    if !original.has_subworkflow_trigger() {
        warn!(
            workflow = %old_id,
            "workflow has no execute-workflow trigger, skipping duplication"
        );
        return Ok(None);
    }

    let sub_name = format!("{} - {}", new_name, original.name);
    info!(original = %original.name, copy = %sub_name, "duplicating subworkflow");
    let copy = store
        .create_workflow(WorkflowInput::duplicate_of(&original, sub_name))
        .await?;
    Ok(Some(copy))
}

/// Replace mapped ids in the known reference-encoding shapes
/// (`parameters.workflowId` and `parameters.workflow.value`). Returns the
/// number of rewritten references; unmapped ids are left untouched.
pub fn rewrite_references(nodes: &mut [WorkflowNode], mappings: &[DuplicationMapping]) -> usize {
    let mut rewritten = 0;

    for node in nodes.iter_mut() {
        if let Some(Value::String(current)) = node.parameters.get_mut("workflowId") {
            if let Some(mapping) = mappings.iter().find(|m| &m.old_id == current) {
                *current = mapping.new_id.clone();
                rewritten += 1;
            }
        }

        if let Some(Value::Object(workflow_obj)) = node.parameters.get_mut("workflow") {
            if let Some(Value::String(current)) = workflow_obj.get_mut("value") {
                if let Some(mapping) = mappings.iter().find(|m| &m.old_id == current) {
                    *current = mapping.new_id.clone();
                    rewritten += 1;
                }
            }
        }
    }

    rewritten
}
