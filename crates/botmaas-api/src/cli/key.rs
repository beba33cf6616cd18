//! API key CLI commands.

use anyhow::Result;
use clap::Subcommand;
use console::style;

use super::print_json;
use crate::http::extractors::auth::create_api_key;
use crate::state::AppState;

#[derive(Subcommand)]
pub enum KeyCommand {
    /// Create an API key acting as `uid`.
    Create {
        #[arg(long, env = "BOTMAAS_UID")]
        uid: String,

        /// Label for the key.
        #[arg(long, default_value = "default")]
        name: String,
    },
}

pub async fn handle_key_command(cmd: KeyCommand, state: &AppState, json: bool) -> Result<()> {
    match cmd {
        KeyCommand::Create { uid, name } => {
            let key = create_api_key(&state.db_pool, &uid, &name).await?;
            if json {
                return print_json(&serde_json::json!({ "uid": uid, "name": name, "key": key }));
            }
            println!();
            println!(
                "  {} API key for {} (save this, it won't be shown again):",
                style("🔑").bold(),
                style(&uid).cyan()
            );
            println!();
            println!("  {}", style(&key).yellow().bold());
            println!();
        }
    }
    Ok(())
}
