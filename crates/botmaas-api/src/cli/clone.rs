//! Clone CLI commands: create, list, mass-copy, synchronize.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Subcommand;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tokio_util::sync::CancellationToken;

use botmaas_infra::bundle::load_mass_copy_request;
use botmaas_types::lineage::{CloneSynchronize, OriginId};
use botmaas_types::mass_copy::{MaasDuplicate, MassCopyReport, TargetOutcome};
use botmaas_types::workflow::{SpaceId, WorkflowId};

use super::{format_relative_time, print_json};
use crate::state::AppState;

#[derive(Subcommand)]
pub enum CloneCommand {
    /// Clone a template or workflow into a new bot workflow.
    Create {
        /// `template:<id>`, `workflow:<id>`, or a bare template id.
        origin: OriginId,

        /// Owner of the new workflow.
        #[arg(long, env = "BOTMAAS_UID")]
        uid: String,

        /// Target space; omit for a personal clone.
        #[arg(long)]
        space: Option<SpaceId>,

        /// Name of the new workflow (defaults to the origin's name).
        #[arg(long)]
        name: Option<String>,
    },

    /// List workflows owned by a user, newest first.
    List {
        #[arg(long, env = "BOTMAAS_UID")]
        uid: String,
    },

    /// Clone one origin for every target listed in a request file.
    MassCopy {
        /// YAML or JSON file with `origin_id` and `targets`.
        file: PathBuf,
    },

    /// Record lineage for a copy produced outside botmaas.
    Synchronize {
        #[arg(long, env = "BOTMAAS_UID")]
        uid: String,

        #[arg(long)]
        origin: OriginId,

        /// The already-materialized copy.
        #[arg(long)]
        current: WorkflowId,

        #[arg(long)]
        space: Option<SpaceId>,

        /// Flow id of the copied graph.
        #[arg(long)]
        flow_id: String,
    },
}

pub async fn handle_clone_command(cmd: CloneCommand, state: &AppState, json: bool) -> Result<()> {
    match cmd {
        CloneCommand::Create {
            origin,
            uid,
            space,
            name,
        } => create_clone(state, origin, &uid, space, name, json).await,
        CloneCommand::List { uid } => list_workflows(state, &uid, json).await,
        CloneCommand::MassCopy { file } => mass_copy(state, &file, json).await,
        CloneCommand::Synchronize {
            uid,
            origin,
            current,
            space,
            flow_id,
        } => {
            let recorded = state
                .service
                .mass_copy_synchronize(CloneSynchronize {
                    uid,
                    origin_id: origin,
                    current_id: current,
                    space_id: space,
                    flow_id,
                })
                .await?;
            if json {
                return print_json(&serde_json::json!({ "recorded": recorded }));
            }
            println!(
                "\n  {} Lineage recorded: {} <- {}\n",
                style("✓").green().bold(),
                style(current).cyan(),
                origin
            );
            Ok(())
        }
    }
}

async fn create_clone(
    state: &AppState,
    origin: OriginId,
    uid: &str,
    space: Option<SpaceId>,
    name: Option<String>,
    json: bool,
) -> Result<()> {
    let request = MaasDuplicate {
        origin_id: origin,
        space_id: space,
        name,
    };
    let info = state.service.create_from_template(uid, request).await?;

    if json {
        return print_json(&info);
    }

    println!();
    println!("  {} Cloned {}", style("✓").green().bold(), style(&info.name).cyan());
    println!("  {}  {}", style("Workflow:").bold(), info.workflow_id);
    println!("  {}  {}", style("Owner:").bold(), info.uid);
    if let Some(space) = info.space_id {
        println!("  {}  {}", style("Space:").bold(), space);
    }
    println!("  {}  {}", style("Origin:").bold(), style(info.origin_id).dim());
    println!("  {}  {}", style("Nodes:").bold(), info.node_count);
    println!();
    Ok(())
}

async fn list_workflows(state: &AppState, uid: &str, json: bool) -> Result<()> {
    let workflows = state.service.list_workflows(uid).await?;

    if json {
        return print_json(&workflows);
    }
    if workflows.is_empty() {
        println!("\n  No workflows for {}.\n", style(uid).cyan());
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Name").fg(Color::White),
        Cell::new("Workflow").fg(Color::White),
        Cell::new("Space").fg(Color::White),
        Cell::new("Nodes").fg(Color::White),
        Cell::new("Created").fg(Color::White),
    ]);
    for workflow in &workflows {
        let space = workflow
            .space_id
            .map(|s| s.to_string())
            .unwrap_or_else(|| "personal".to_string());
        table.add_row(vec![
            Cell::new(&workflow.name).fg(Color::Cyan),
            Cell::new(workflow.id),
            Cell::new(space),
            Cell::new(workflow.graph.nodes.len()),
            Cell::new(format_relative_time(&workflow.created_at)),
        ]);
    }

    println!("{table}");
    println!();
    Ok(())
}

async fn mass_copy(state: &AppState, file: &std::path::Path, json: bool) -> Result<()> {
    let request = load_mass_copy_request(file)
        .await
        .with_context(|| format!("loading mass-copy request {}", file.display()))?;
    let total = request.targets.len();

    // Ctrl+C stops targets that have not started; running ones still commit.
    let token = CancellationToken::new();
    let interrupt = token.clone();
    let ctrl_c = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            interrupt.cancel();
        }
    });

    let spinner = ProgressBar::new_spinner();
    if !json {
        spinner.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.set_message(format!("Cloning {} for {total} targets...", request.origin_id));
        spinner.enable_steady_tick(Duration::from_millis(80));
    }

    let result = state.service.mass_copy(request, token).await;
    spinner.finish_and_clear();
    ctrl_c.abort();
    let report = result?;

    if json {
        return print_json(&report);
    }
    print_report(&report);
    Ok(())
}

fn print_report(report: &MassCopyReport) {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("#").fg(Color::White),
        Cell::new("User").fg(Color::White),
        Cell::new("Space").fg(Color::White),
        Cell::new("Result").fg(Color::White),
        Cell::new("Detail").fg(Color::White),
    ]);

    for (index, result) in report.results.iter().enumerate() {
        let space = result
            .target
            .space_id
            .map(|s| s.to_string())
            .unwrap_or_else(|| "personal".to_string());
        let (status, detail) = match &result.outcome {
            TargetOutcome::Cloned { workflow_id, .. } => {
                (Cell::new("● cloned").fg(Color::Green), workflow_id.to_string())
            }
            TargetOutcome::Skipped { existing } => {
                (Cell::new("○ skipped").fg(Color::Yellow), format!("existing {existing}"))
            }
            TargetOutcome::Failed { reason, .. } => (Cell::new("✗ failed").fg(Color::Red), reason.clone()),
            TargetOutcome::Cancelled => (Cell::new("◌ cancelled").fg(Color::DarkGrey), String::new()),
        };
        table.add_row(vec![
            Cell::new(index),
            Cell::new(&result.target.uid),
            Cell::new(space),
            status,
            Cell::new(detail),
        ]);
    }

    println!("{table}");
    println!();

    let failed = report.failures().len();
    let cancelled = report.cancelled_count();
    let summary = format!(
        "{} of {} cloned, {failed} failed, {cancelled} cancelled",
        report.success_count,
        report.results.len()
    );
    if failed == 0 && cancelled == 0 {
        println!("  {} {summary}", style("✓").green().bold());
    } else {
        println!("  {} {summary}", style("!").yellow().bold());
    }
    println!();
}
