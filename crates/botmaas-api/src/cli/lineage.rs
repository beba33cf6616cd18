//! Lineage CLI commands: show, descendants, mark-diverged.

use anyhow::{Result, bail};
use clap::Subcommand;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;

use botmaas_types::lineage::{CloneRecord, OriginId, SyncState};
use botmaas_types::workflow::WorkflowId;

use super::{format_relative_time, print_json};
use crate::state::AppState;

#[derive(Subcommand)]
pub enum LineageCommand {
    /// Show where a workflow was cloned from.
    Show { workflow_id: WorkflowId },

    /// List clones of an origin, oldest first.
    Descendants {
        origin: OriginId,

        #[arg(long)]
        limit: Option<usize>,
    },

    /// Flag a clone as diverged from its origin.
    MarkDiverged { workflow_id: WorkflowId },
}

pub async fn handle_lineage_command(cmd: LineageCommand, state: &AppState, json: bool) -> Result<()> {
    match cmd {
        LineageCommand::Show { workflow_id } => {
            let Some(record) = state.service.ancestor(&workflow_id).await? else {
                if json {
                    return print_json(&serde_json::Value::Null);
                }
                println!(
                    "\n  {} {} was not cloned from anything\n",
                    style("i").blue().bold(),
                    style(workflow_id).cyan()
                );
                return Ok(());
            };
            if json {
                return print_json(&record);
            }
            println!();
            println!("  {}  {}", style("Workflow:").bold(), style(record.current_id).cyan());
            println!("  {}  {}", style("Origin:").bold(), record.origin_id);
            println!("  {}  {}", style("Owner:").bold(), record.uid);
            println!("  {}  {}", style("Flow:").bold(), style(&record.flow_id).dim());
            println!("  {}  {}", style("State:").bold(), format_sync_state(record.sync_state));
            println!("  {}  {}", style("Cloned:").bold(), format_relative_time(&record.created_at));
            println!();
            Ok(())
        }
        LineageCommand::Descendants { origin, limit } => {
            let records = state.service.descendants(&origin, limit).await?;
            if json {
                return print_json(&records);
            }
            print_descendants(&origin, &records);
            Ok(())
        }
        LineageCommand::MarkDiverged { workflow_id } => {
            if !state.service.mark_diverged(&workflow_id).await? {
                bail!("workflow '{workflow_id}' has no lineage record");
            }
            if json {
                return print_json(&serde_json::json!({
                    "workflow_id": workflow_id,
                    "sync_state": SyncState::Diverged,
                }));
            }
            println!(
                "\n  {} {} marked diverged\n",
                style("✓").green().bold(),
                style(workflow_id).cyan()
            );
            Ok(())
        }
    }
}

fn format_sync_state(state: SyncState) -> String {
    match state {
        SyncState::Synced => format!("{}", style("synced").green()),
        SyncState::Diverged => format!("{}", style("diverged").yellow()),
    }
}

fn print_descendants(origin: &OriginId, records: &[CloneRecord]) {
    if records.is_empty() {
        println!("\n  {} No clones of {origin}\n", style("i").blue().bold());
        return;
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Workflow", "Owner", "Space", "State", "Cloned"]);

    for r in records {
        let state = match r.sync_state {
            SyncState::Synced => Cell::new("synced").fg(Color::Green),
            SyncState::Diverged => Cell::new("diverged").fg(Color::Yellow),
        };
        table.add_row(vec![
            Cell::new(r.current_id.to_string()).fg(Color::Cyan),
            Cell::new(&r.uid),
            Cell::new(r.space_id.map(|s| s.to_string()).unwrap_or_else(|| "personal".to_string())),
            state,
            Cell::new(format_relative_time(&r.created_at)),
        ]);
    }
    println!("{table}");
}
