use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use anyhow::Result;
use serde::Serialize;
use tracing::{debug, warn};

use crate::cancel::CancelToken;
use crate::detect::identify_all_subworkflows;
use crate::store::WorkflowStore;

/// What to do when fetching a workflow fails mid-walk. A whole-graph
/// analysis usually wants completeness (Strict); callers that prefer a
/// partial map over an aborted run use BestEffort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    #[default]
    Strict,
    BestEffort,
}

/// Result of analyzing one workflow subtree.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowAnalysis {
    pub id: String,
    pub dependencies: Vec<String>,
    pub depth: usize,
    pub max_depth: usize,
    pub circular: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cycle: Option<Vec<String>>,
    pub already_analyzed: bool,
    pub fetch_failed: bool,
    pub subworkflows: Vec<WorkflowAnalysis>,
}

impl WorkflowAnalysis {
    fn leaf(id: String, depth: usize) -> Self {
        Self {
            id,
            dependencies: Vec::new(),
            depth,
            max_depth: depth,
            circular: false,
            cycle: None,
            already_analyzed: false,
            fetch_failed: false,
            subworkflows: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DependencyStats {
    pub total_workflows: usize,
    pub max_depth: usize,
    pub cycle_count: usize,
}

/// Snapshot of one analysis run.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DependencyReport {
    pub analyzed_workflows: Vec<String>,
    pub dependencies: HashMap<String, Vec<String>>,
    pub reverse_dependents: HashMap<String, Vec<String>>,
    pub depths: HashMap<String, usize>,
    pub cycles: Vec<Vec<String>>,
    pub stats: DependencyStats,
}

/// Recursive walker over the "references" relation of one root workflow.
/// All state is instance-scoped: independent analyses of different roots
/// use independent instances and never share mutable state.
pub struct DependencyAnalyzer {
    store: Arc<dyn WorkflowStore>,
    policy: FailurePolicy,
    cancel: CancelToken,
    analyzed: HashSet<String>,
    dependencies: HashMap<String, Vec<String>>,
    reverse_dependents: HashMap<String, Vec<String>>,
    depths: HashMap<String, usize>,
    cycles: Vec<Vec<String>>,
    // Current DFS descent path; pushed/popped around each recursion.
    path: Vec<String>,
}

impl DependencyAnalyzer {
    pub fn new(store: Arc<dyn WorkflowStore>) -> Self {
        Self {
            store,
            policy: FailurePolicy::default(),
            cancel: CancelToken::new(),
            analyzed: HashSet::new(),
            dependencies: HashMap::new(),
            reverse_dependents: HashMap::new(),
            depths: HashMap::new(),
            cycles: Vec::new(),
            path: Vec::new(),
        }
    }

    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Walk the dependency graph starting at `workflow_id`.
    pub async fn analyze(&mut self, workflow_id: &str) -> Result<WorkflowAnalysis> {
        self.analyze_at(workflow_id.to_string(), 0).await
    }

    fn analyze_at(
        &mut self,
        workflow_id: String,
        depth: usize,
    ) -> Pin<Box<dyn Future<Output = Result<WorkflowAnalysis>> + Send + '_>> {
        Box::pin(async move {
            // A workflow already on the descent path means a cycle: record
            // the loop and stop, without marking the id as analyzed.
            if let Some(pos) = self.path.iter().position(|id| id == &workflow_id) {
                let mut cycle: Vec<String> = self.path[pos..].to_vec();
                cycle.push(workflow_id.clone());
                self.cycles.push(cycle.clone());
                debug!(workflow = %workflow_id, "circular dependency detected");

                let mut analysis = WorkflowAnalysis::leaf(workflow_id, depth);
                analysis.circular = true;
                analysis.cycle = Some(cycle);
                return Ok(analysis);
            }

            // Memoized: only bump the recorded depth to the deepest visit.
            if self.analyzed.contains(&workflow_id) {
                let recorded = self
                    .depths
                    .entry(workflow_id.clone())
                    .and_modify(|d| *d = (*d).max(depth))
                    .or_insert(depth);
                let recorded = *recorded;

                let mut analysis = WorkflowAnalysis::leaf(workflow_id.clone(), recorded);
                analysis.dependencies = self
                    .dependencies
                    .get(&workflow_id)
                    .cloned()
                    .unwrap_or_default();
                analysis.already_analyzed = true;
                return Ok(analysis);
            }

            self.cancel.check()?;
            self.path.push(workflow_id.clone());

            let workflow = match self.store.get_workflow(&workflow_id).await {
                Ok(w) => w,
                Err(e) => {
                    self.path.pop();
                    match self.policy {
                        FailurePolicy::Strict => return Err(e.into()),
                        FailurePolicy::BestEffort => {
                            warn!(workflow = %workflow_id, error = %e, "skipping unreachable workflow");
                            let mut analysis = WorkflowAnalysis::leaf(workflow_id, depth);
                            analysis.fetch_failed = true;
                            return Ok(analysis);
                        }
                    }
                }
            };

            let detection = identify_all_subworkflows(&workflow);
            let sub_ids: Vec<String> = detection
                .subworkflows
                .into_iter()
                .filter_map(|r| r.subworkflow_id)
                .collect();

            self.dependencies
                .insert(workflow_id.clone(), sub_ids.clone());
            for dep in &sub_ids {
                self.reverse_dependents
                    .entry(dep.clone())
                    .or_default()
                    .push(workflow_id.clone());
            }
            self.analyzed.insert(workflow_id.clone());
            self.depths.insert(workflow_id.clone(), depth);

            let mut subworkflows = Vec::with_capacity(sub_ids.len());
            for sub_id in &sub_ids {
                match self.analyze_at(sub_id.clone(), depth + 1).await {
                    Ok(info) => subworkflows.push(info),
                    Err(e) => {
                        self.path.pop();
                        return Err(e);
                    }
                }
            }

            let max_below = subworkflows
                .iter()
                .map(|s| s.max_depth.saturating_sub(depth))
                .max()
                .unwrap_or(0);

            self.path.pop();

            Ok(WorkflowAnalysis {
                id: workflow_id,
                dependencies: sub_ids,
                depth,
                max_depth: depth + max_below,
                circular: false,
                cycle: None,
                already_analyzed: false,
                fetch_failed: false,
                subworkflows,
            })
        })
    }

    pub fn has_cycles(&self) -> bool {
        !self.cycles.is_empty()
    }

    pub fn cycles(&self) -> &[Vec<String>] {
        &self.cycles
    }

    pub fn dependencies(&self) -> &HashMap<String, Vec<String>> {
        &self.dependencies
    }

    pub fn reverse_dependents(&self) -> &HashMap<String, Vec<String>> {
        &self.reverse_dependents
    }

    pub fn depths(&self) -> &HashMap<String, usize> {
        &self.depths
    }

    /// Snapshot of all maps plus summary statistics.
    pub fn report(&self) -> DependencyReport {
        let mut analyzed_workflows: Vec<String> = self.analyzed.iter().cloned().collect();
        analyzed_workflows.sort();

        DependencyReport {
            analyzed_workflows,
            dependencies: self.dependencies.clone(),
            reverse_dependents: self.reverse_dependents.clone(),
            depths: self.depths.clone(),
            cycles: self.cycles.clone(),
            stats: DependencyStats {
                total_workflows: self.analyzed.len(),
                max_depth: self.depths.values().copied().max().unwrap_or(0),
                cycle_count: self.cycles.len(),
            },
        }
    }

    /// Indented text rendering of the dependency tree under `workflow_id`.
    /// A per-call visited set guarantees termination even when the map
    /// itself is cyclic; revisited ancestors are marked `[CIRCULAR]`.
    pub fn render_tree(&self, workflow_id: &str) -> String {
        self.render_subtree(workflow_id, 0, &HashSet::new())
    }

    fn render_subtree(&self, workflow_id: &str, level: usize, visited: &HashSet<String>) -> String {
        let indent = "  ".repeat(level);
        if visited.contains(workflow_id) {
            return format!("{}{} [CIRCULAR]\n", indent, workflow_id);
        }

        let mut visited = visited.clone();
        visited.insert(workflow_id.to_string());

        let mut out = format!("{}{}\n", indent, workflow_id);
        if let Some(deps) = self.dependencies.get(workflow_id) {
            for dep in deps {
                out.push_str(&self.render_subtree(dep, level + 1, &visited));
            }
        }
        out
    }
}
