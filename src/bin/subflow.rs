use clap::{Parser, Subcommand};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use subflow::analysis::confidence::{AggregatorConfig, identify_subworkflows};
use subflow::analysis::dependency::{DependencyAnalyzer, FailurePolicy};
use subflow::duplicate::{DuplicateOptions, DuplicationScope, duplicate_workflow_with_subworkflows};
use subflow::loader::load_workflow_from_json;
use subflow::model::Workflow;
use subflow::store::http::HttpWorkflowStore;
use subflow::store::WorkflowStore;

#[derive(Parser)]
#[command(author, version, about = "Identify, analyze and duplicate n8n workflows with their subworkflows", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Identify subworkflows referenced by a workflow
    Identify {
        /// Path to a workflow JSON file, or a workflow id in the n8n store
        input: String,

        /// Save the analysis report to the output directory
        #[arg(short, long)]
        save: bool,

        /// Minimum confidence level (0-100)
        #[arg(short, long, default_value_t = 70)]
        confidence: u32,
    },

    /// Analyze the dependency graph reachable from a workflow
    Analyze {
        /// Workflow id in the n8n store
        workflow_id: String,

        /// Skip unreachable workflows instead of aborting the analysis
        #[arg(long)]
        best_effort: bool,
    },

    /// Duplicate a workflow together with its subworkflows
    Duplicate {
        /// Workflow id in the n8n store
        workflow_id: String,

        /// Name for the duplicated workflow
        #[arg(short, long)]
        name: Option<String>,

        /// Only duplicate the root's direct references
        #[arg(long)]
        direct_only: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Identify {
            input,
            save,
            confidence,
        } => {
            let workflow = resolve_workflow_input(&input).await?;

            let config = AggregatorConfig {
                min_confidence: confidence,
                save_report: save,
                ..AggregatorConfig::default()
            };
            let report = identify_subworkflows(&workflow, &config);

            println!("Workflow: {}", report.workflow_name);
            println!("Nodes: {}", report.total_nodes);
            println!(
                "Candidates: {} ({} distinct subworkflows)",
                report.total_candidates, report.total_subworkflows
            );

            if report.top_subworkflows.is_empty() {
                println!(
                    "\nNo subworkflow reached the minimum confidence of {}%",
                    config.min_confidence
                );
            } else {
                println!("\nMost likely subworkflows:");
                for (i, sub) in report.top_subworkflows.iter().enumerate() {
                    let detail = sub.details.first();
                    println!("[{}] {}", i + 1, sub.id);
                    println!(
                        "    Node: {}",
                        detail.map(|d| d.node_name.as_str()).unwrap_or("unknown")
                    );
                    println!(
                        "    Type: {}",
                        detail.map(|d| d.node_type.as_str()).unwrap_or("unknown")
                    );
                    println!("    Confidence: {}%", sub.confidence);
                }
            }
        }

        Commands::Analyze {
            workflow_id,
            best_effort,
        } => {
            let store: Arc<dyn WorkflowStore> = Arc::new(HttpWorkflowStore::from_env()?);
            let policy = if best_effort {
                FailurePolicy::BestEffort
            } else {
                FailurePolicy::Strict
            };

            let mut analyzer = DependencyAnalyzer::new(store).with_policy(policy);
            analyzer.analyze(&workflow_id).await?;

            let report = analyzer.report();
            println!("Workflows analyzed: {}", report.stats.total_workflows);
            println!("Maximum depth: {}", report.stats.max_depth);
            println!("Circular dependencies: {}", report.stats.cycle_count);
            for cycle in &report.cycles {
                println!("  cycle: {}", cycle.join(" -> "));
            }
            println!("\nDependency tree:");
            print!("{}", analyzer.render_tree(&workflow_id));
        }

        Commands::Duplicate {
            workflow_id,
            name,
            direct_only,
        } => {
            let store: Arc<dyn WorkflowStore> = Arc::new(HttpWorkflowStore::from_env()?);
            let new_name =
                name.unwrap_or_else(|| format!("Duplicate {}", chrono::Utc::now().to_rfc3339()));
            info!(workflow = %workflow_id, name = %new_name, "starting duplication");

            let options = DuplicateOptions {
                scope: if direct_only {
                    DuplicationScope::DirectOnly
                } else {
                    DuplicationScope::Transitive
                },
                ..DuplicateOptions::default()
            };

            let outcome =
                duplicate_workflow_with_subworkflows(store, &workflow_id, &new_name, &options)
                    .await?;

            println!("Duplication completed.");
            println!(
                "Main workflow: {} ({})",
                outcome.main_workflow.name,
                outcome.main_workflow.id.as_deref().unwrap_or("?")
            );
            println!("Subworkflows duplicated: {}", outcome.subworkflows.len());
            for mapping in &outcome.mappings {
                println!("  {} -> {} ({})", mapping.old_id, mapping.new_id, mapping.name);
            }
        }
    }

    Ok(())
}

/// `identify` accepts either a JSON export on disk or a workflow id to be
/// fetched from the configured n8n store.
async fn resolve_workflow_input(input: &str) -> anyhow::Result<Workflow> {
    let path = Path::new(input);
    if path.exists() {
        info!(file = %path.display(), "loading workflow from file");
        return load_workflow_from_json(path);
    }

    info!(workflow = %input, "treating input as a workflow id");
    let store = HttpWorkflowStore::from_env()?;
    Ok(store.get_workflow(input).await?)
}
