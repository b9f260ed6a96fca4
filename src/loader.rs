use anyhow::{Context as AnyhowContext, Result};
use std::fs;
use std::path::Path;

use crate::model::Workflow;

pub fn load_workflow_from_json(file_path: &Path) -> Result<Workflow> {
    let json_content = fs::read_to_string(file_path)
        .with_context(|| format!("Failed to read workflow file from {}", file_path.display()))?;

    let workflow: Workflow = serde_json::from_str(&json_content)
        .with_context(|| format!("Failed to parse workflow JSON from {}", file_path.display()))?;

    Ok(workflow)
}
