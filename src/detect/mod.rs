pub mod patterns;

use serde::Serialize;

use crate::model::{SubworkflowReference, Workflow};
pub use patterns::identify_subworkflow_from_node;

/// Flat list of subworkflow references found in one workflow.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DetectionResult {
    pub has_subworkflows: bool,
    pub subworkflows: Vec<SubworkflowReference>,
}

/// Apply the pattern table to every node of `workflow`, preserving node
/// order. Pure: no I/O, input untouched. A workflow without nodes yields
/// an empty result.
pub fn identify_all_subworkflows(workflow: &Workflow) -> DetectionResult {
    let subworkflows: Vec<SubworkflowReference> = workflow
        .nodes
        .iter()
        .filter_map(identify_subworkflow_from_node)
        .collect();

    DetectionResult {
        has_subworkflows: !subworkflows.is_empty(),
        subworkflows,
    }
}
