//! Template CLI commands: list, groups, import, delete, add-group.
//!
//! Templates are authored as YAML or JSON files and imported into the
//! catalog. Re-importing a file that names an existing id keeps the
//! template's identity and bumps its version.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Subcommand;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;
use dialoguer::Confirm;

use botmaas_core::repository::template::TemplateStore;
use botmaas_infra::bundle::load_template_file;
use botmaas_types::template::{TemplateGroup, TemplateId, TemplateQuery};

use super::{format_relative_time, print_json};
use crate::state::AppState;

#[derive(Subcommand)]
pub enum TemplateCommand {
    /// List catalog templates.
    #[command(alias = "ls")]
    List {
        /// Only templates in this group.
        #[arg(long)]
        group: Option<i64>,

        /// Case-insensitive name or description substring.
        #[arg(long, short)]
        keyword: Option<String>,

        /// Include soft-deleted templates.
        #[arg(long)]
        include_deleted: bool,

        #[arg(long)]
        limit: Option<i64>,
    },

    /// List template groups in display order.
    Groups,

    /// Import (or re-import) a template from a YAML/JSON file.
    Import {
        /// Path to the template file.
        path: PathBuf,
    },

    /// Soft-delete a template. Existing clones are unaffected.
    #[command(alias = "rm")]
    Delete {
        id: TemplateId,

        /// Skip confirmation prompt.
        #[arg(long, short)]
        force: bool,
    },

    /// Create or rename a template group.
    AddGroup {
        id: i64,
        name: String,

        #[arg(long, default_value = "0")]
        sort_order: i32,
    },
}

pub async fn handle_template_command(cmd: TemplateCommand, state: &AppState, json: bool) -> Result<()> {
    match cmd {
        TemplateCommand::List {
            group,
            keyword,
            include_deleted,
            limit,
        } => {
            let query = TemplateQuery {
                group_id: group,
                keyword,
                include_deleted,
                limit,
                offset: None,
            };
            list_templates(state, &query, json).await
        }
        TemplateCommand::Groups => list_groups(state, json).await,
        TemplateCommand::Import { path } => import_template(state, &path, json).await,
        TemplateCommand::Delete { id, force } => delete_template(state, &id, force, json).await,
        TemplateCommand::AddGroup { id, name, sort_order } => {
            let group = TemplateGroup {
                id,
                name,
                sort_order,
                is_deleted: false,
            };
            state.template_store.save_group(&group).await?;
            if json {
                return print_json(&group);
            }
            println!(
                "\n  {} Group {} saved as '{}'\n",
                style("✓").green().bold(),
                group.id,
                style(&group.name).cyan()
            );
            Ok(())
        }
    }
}

async fn list_templates(state: &AppState, query: &TemplateQuery, json: bool) -> Result<()> {
    let templates = state.service.template_list(query).await?;

    if json {
        return print_json(&templates);
    }

    if templates.is_empty() {
        println!();
        println!(
            "  {} No templates found. Import one with: {}",
            style("i").blue().bold(),
            style("botmaas template import <file>").yellow()
        );
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Name").fg(Color::White),
        Cell::new("Group").fg(Color::White),
        Cell::new("Version").fg(Color::White),
        Cell::new("Nodes").fg(Color::White),
        Cell::new("Updated").fg(Color::White),
        Cell::new("ID").fg(Color::White),
    ]);

    for t in &templates {
        table.add_row(vec![
            Cell::new(&t.name).fg(Color::Cyan),
            Cell::new(t.group_id),
            Cell::new(&t.version),
            Cell::new(t.node_count),
            Cell::new(format_relative_time(&t.updated_at)),
            Cell::new(t.id.to_string()).fg(Color::DarkGrey),
        ]);
    }

    println!("{table}");
    Ok(())
}

async fn list_groups(state: &AppState, json: bool) -> Result<()> {
    let groups = state.service.template_groups().await?;

    if json {
        return print_json(&groups);
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_header(vec!["ID", "Name", "Order"]);
    for g in &groups {
        table.add_row(vec![
            Cell::new(g.id),
            Cell::new(&g.name).fg(Color::Cyan),
            Cell::new(g.sort_order),
        ]);
    }
    println!("{table}");
    Ok(())
}

async fn import_template(state: &AppState, path: &std::path::Path, json: bool) -> Result<()> {
    let file = load_template_file(path).await?;

    let existing = match file.id {
        Some(id) => state.template_store.get_template(&id).await?,
        None => None,
    };
    let is_update = existing.is_some();
    let template = file.into_template(existing.as_ref());
    state
        .template_store
        .save_template(&template)
        .await
        .with_context(|| format!("saving template from {}", path.display()))?;

    tracing::info!(template = %template.id, version = %template.version, "template imported");

    if json {
        return print_json(&template);
    }

    println!();
    println!(
        "  {} Template {} {}",
        style("✓").green().bold(),
        style(&template.name).cyan(),
        if is_update { "updated" } else { "imported" }
    );
    println!("  {}  {}", style("ID:").bold(), style(template.id.to_string()).dim());
    println!("  {}  {}", style("Version:").bold(), template.version);
    println!("  {}  {}", style("Nodes:").bold(), template.definition.nodes.len());
    println!();
    Ok(())
}

async fn delete_template(state: &AppState, id: &TemplateId, force: bool, json: bool) -> Result<()> {
    if !force && !json {
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "Remove template {} from the catalog? Existing clones are kept.",
                style(id).red().bold()
            ))
            .default(false)
            .interact()?;
        if !confirmed {
            println!("  Cancelled.");
            return Ok(());
        }
    }

    state.template_store.soft_delete_template(id).await?;

    if json {
        return print_json(&serde_json::json!({ "deleted": id }));
    }
    println!("\n  {} Template {} deleted\n", style("✓").green().bold(), style(id).dim());
    Ok(())
}
