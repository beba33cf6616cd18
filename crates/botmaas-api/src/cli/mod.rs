//! CLI command definitions for the `botmaas` binary.
//!
//! Uses clap derive macros for argument parsing. Commands are grouped by
//! noun (`botmaas template list`, `botmaas clone mass-copy`).

pub mod clone;
pub mod key;
pub mod lineage;
pub mod space;
pub mod template;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// Clone bot workflows from templates, in bulk, with lineage.
#[derive(Parser)]
#[command(name = "botmaas", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Export spans through OpenTelemetry (stdout exporter).
    #[arg(long, global = true, env = "BOTMAAS_OTEL")]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Browse and author workflow templates.
    Template {
        #[command(subcommand)]
        action: template::TemplateCommand,
    },

    /// Manage space membership.
    Space {
        #[command(subcommand)]
        action: space::SpaceCommand,
    },

    /// Clone workflows (single, mass copy, lineage synchronize).
    Clone {
        #[command(subcommand)]
        action: clone::CloneCommand,
    },

    /// Inspect clone lineage.
    Lineage {
        #[command(subcommand)]
        action: lineage::LineageCommand,
    },

    /// Manage REST API keys.
    Key {
        #[command(subcommand)]
        action: key::KeyCommand,
    },

    /// Start the REST API server.
    Serve {
        /// Port to listen on.
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Host to bind to.
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Print `value` as pretty JSON.
pub(crate) fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub(crate) fn format_relative_time(dt: &chrono::DateTime<chrono::Utc>) -> String {
    let diff = chrono::Utc::now() - *dt;

    if diff.num_minutes() < 1 {
        "just now".to_string()
    } else if diff.num_hours() < 1 {
        format!("{}m ago", diff.num_minutes())
    } else if diff.num_days() < 1 {
        format!("{}h ago", diff.num_hours())
    } else if diff.num_days() < 30 {
        format!("{}d ago", diff.num_days())
    } else {
        dt.format("%Y-%m-%d").to_string()
    }
}
