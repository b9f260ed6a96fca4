use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::detect::identify_all_subworkflows;
use crate::model::Workflow;

pub const STRATEGY_KNOWN_PATTERNS: &str = "known-patterns";
pub const STRATEGY_NAME_ANALYSIS: &str = "name-analysis";

/// A detection strategy name and its contribution to the confidence score.
/// Weights are configuration, not code: registering a new strategy means
/// adding an entry here, never touching the aggregation math.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StrategyWeight {
    pub name: String,
    pub weight: u32,
}

impl StrategyWeight {
    pub fn new(name: impl Into<String>, weight: u32) -> Self {
        Self {
            name: name.into(),
            weight,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AggregatorConfig {
    /// Minimum confidence (0-100) for the top list.
    pub min_confidence: u32,
    /// Persist the report JSON as a side effect.
    pub save_report: bool,
    pub output_dir: PathBuf,
    pub strategies: Vec<StrategyWeight>,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            min_confidence: 70,
            save_report: false,
            output_dir: PathBuf::from("resultados"),
            strategies: vec![
                StrategyWeight::new(STRATEGY_KNOWN_PATTERNS, 10),
                StrategyWeight::new(STRATEGY_NAME_ANALYSIS, 5),
                StrategyWeight::new("node-structure", 8),
                StrategyWeight::new("parameters", 7),
                StrategyWeight::new("relations", 6),
            ],
        }
    }
}

impl AggregatorConfig {
    fn strategy_weight(&self, name: &str) -> u32 {
        self.strategies
            .iter()
            .find(|s| s.name == name)
            .map(|s| s.weight)
            .unwrap_or(0)
    }
}

/// One raw detection produced by a strategy, before grouping.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub id: Option<String>,
    pub node_id: String,
    pub node_name: String,
    pub node_type: String,
    pub strategy: String,
    pub detail: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CandidateDetail {
    pub node_id: String,
    pub node_name: String,
    pub node_type: String,
    pub strategy: String,
    pub detail: String,
}

/// A candidate target workflow with its aggregated confidence score.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScoredSubworkflow {
    pub id: String,
    pub node_count: usize,
    pub strategies: Vec<String>,
    pub confidence: u32,
    pub details: Vec<CandidateDetail>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConfidenceReport {
    pub workflow_name: String,
    pub total_nodes: usize,
    pub total_candidates: usize,
    pub total_subworkflows: usize,
    pub top_subworkflows: Vec<ScoredSubworkflow>,
    pub all_subworkflows: Vec<ScoredSubworkflow>,
    pub strategies_applied: Vec<String>,
    pub timestamp: String,
}

/// Run every detection strategy over `workflow`, group the candidates by
/// target id and score each group 0-100. Report persistence is best-effort
/// and never affects the returned report.
pub fn identify_subworkflows(workflow: &Workflow, config: &AggregatorConfig) -> ConfidenceReport {
    info!(
        workflow = %workflow.name,
        nodes = workflow.nodes.len(),
        "identifying subworkflows"
    );

    let candidates = apply_strategies(workflow);
    let mut scored = combine_candidates(&candidates, config);
    scored.sort_by(|a, b| b.confidence.cmp(&a.confidence));

    let top_subworkflows: Vec<ScoredSubworkflow> = scored
        .iter()
        .filter(|s| s.confidence >= config.min_confidence)
        .take(3)
        .cloned()
        .collect();

    let report = ConfidenceReport {
        workflow_name: workflow.name.clone(),
        total_nodes: workflow.nodes.len(),
        total_candidates: candidates.len(),
        total_subworkflows: scored.len(),
        top_subworkflows,
        all_subworkflows: scored,
        strategies_applied: config.strategies.iter().map(|s| s.name.clone()).collect(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    };

    if config.save_report {
        save_report(&report, config);
    }

    report
}

/// Strategy 1: the pattern table. Strategy 2: an independent scan over node
/// names, skipping nodes an earlier strategy already proposed.
fn apply_strategies(workflow: &Workflow) -> Vec<Candidate> {
    let mut candidates = Vec::new();

    let detection = identify_all_subworkflows(workflow);
    for reference in detection.subworkflows {
        candidates.push(Candidate {
            id: reference.subworkflow_id.clone(),
            node_id: reference.node_id,
            node_name: reference.node_name,
            node_type: reference.node_type,
            strategy: STRATEGY_KNOWN_PATTERNS.to_string(),
            detail: reference.detection_source,
        });
    }

    for node in &workflow.nodes {
        let name = node.name.to_lowercase();
        if !(name.contains("workflow") || name.contains("subflow") || name.contains("execut")) {
            continue;
        }
        if candidates.iter().any(|c| c.node_id == node.id) {
            continue;
        }

        let id = node.parameters.iter().find_map(|(key, value)| {
            let key_lower = key.to_lowercase();
            if !(key_lower.contains("id") || key_lower.contains("workflow")) {
                return None;
            }
            match value {
                serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
                serde_json::Value::Number(n) => Some(n.to_string()),
                _ => None,
            }
        });

        if let Some(id) = id {
            candidates.push(Candidate {
                id: Some(id),
                node_id: node.id.clone(),
                node_name: node.display_name(),
                node_type: node.node_type.clone(),
                strategy: STRATEGY_NAME_ANALYSIS.to_string(),
                detail: node.name.clone(),
            });
        }
    }

    candidates
}

struct Group {
    id: String,
    node_ids: Vec<String>,
    strategies: Vec<String>,
    details: Vec<CandidateDetail>,
}

/// Group candidates by target id and compute the score:
/// `min(100, 5 * (sum of distinct strategy weights + min(10, 2 * nodes)))`.
/// Each strategy's weight counts once per target no matter how many nodes
/// that strategy matched.
fn combine_candidates(candidates: &[Candidate], config: &AggregatorConfig) -> Vec<ScoredSubworkflow> {
    let mut groups: Vec<Group> = Vec::new();

    for candidate in candidates {
        let Some(id) = candidate.id.as_deref().filter(|id| !id.is_empty()) else {
            continue;
        };

        let group = match groups.iter_mut().find(|g| g.id == id) {
            Some(g) => g,
            None => {
                groups.push(Group {
                    id: id.to_string(),
                    node_ids: Vec::new(),
                    strategies: Vec::new(),
                    details: Vec::new(),
                });
                groups.last_mut().unwrap()
            }
        };

        if !group.node_ids.contains(&candidate.node_id) {
            group.node_ids.push(candidate.node_id.clone());
        }
        if !group.strategies.contains(&candidate.strategy) {
            group.strategies.push(candidate.strategy.clone());
        }
        group.details.push(CandidateDetail {
            node_id: candidate.node_id.clone(),
            node_name: candidate.node_name.clone(),
            node_type: candidate.node_type.clone(),
            strategy: candidate.strategy.clone(),
            detail: candidate.detail.clone(),
        });
    }

    groups
        .into_iter()
        .map(|group| {
            let strategy_weight: u32 = group
                .strategies
                .iter()
                .map(|s| config.strategy_weight(s))
                .sum();
            let node_bonus = (group.node_ids.len() as u32 * 2).min(10);
            let confidence = ((strategy_weight + node_bonus) * 5).min(100);

            ScoredSubworkflow {
                id: group.id,
                node_count: group.node_ids.len(),
                strategies: group.strategies,
                confidence,
                details: group.details,
            }
        })
        .collect()
}

/// Persist the report JSON; failures are logged and swallowed so the
/// primary result is never affected.
fn save_report(report: &ConfidenceReport, config: &AggregatorConfig) {
    let result = (|| -> anyhow::Result<PathBuf> {
        fs::create_dir_all(&config.output_dir)?;

        let timestamp = report.timestamp.replace([':', '.'], "-");
        let name = if report.workflow_name.is_empty() {
            "unnamed"
        } else {
            report.workflow_name.as_str()
        };
        let path = config
            .output_dir
            .join(format!("subworkflows-{}-{}.json", name, timestamp));

        fs::write(&path, serde_json::to_string_pretty(report)?)?;
        Ok(path)
    })();

    match result {
        Ok(path) => info!(path = %path.display(), "analysis report saved"),
        Err(e) => warn!(error = %e, "failed to save analysis report"),
    }
}
