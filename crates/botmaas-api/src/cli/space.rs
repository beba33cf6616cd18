//! Space membership CLI commands: grant, revoke.

use anyhow::Result;
use clap::Subcommand;
use console::style;

use botmaas_types::workflow::SpaceId;

use super::print_json;
use crate::state::AppState;

#[derive(Subcommand)]
pub enum SpaceCommand {
    /// Add a user to a space (or change their role).
    Grant {
        space_id: SpaceId,
        uid: String,

        #[arg(long, default_value = "member")]
        role: String,
    },

    /// Remove a user from a space.
    Revoke { space_id: SpaceId, uid: String },
}

pub async fn handle_space_command(cmd: SpaceCommand, state: &AppState, json: bool) -> Result<()> {
    match cmd {
        SpaceCommand::Grant { space_id, uid, role } => {
            state.space_access.grant(&space_id, &uid, &role).await?;
            if json {
                return print_json(&serde_json::json!({
                    "space_id": space_id,
                    "uid": uid,
                    "role": role,
                }));
            }
            println!(
                "\n  {} {} is now {} of space {}\n",
                style("✓").green().bold(),
                style(&uid).cyan(),
                role,
                style(space_id).dim()
            );
        }
        SpaceCommand::Revoke { space_id, uid } => {
            state.space_access.revoke(&space_id, &uid).await?;
            if json {
                return print_json(&serde_json::json!({ "space_id": space_id, "uid": uid, "revoked": true }));
            }
            println!(
                "\n  {} {} removed from space {}\n",
                style("✓").green().bold(),
                style(&uid).cyan(),
                style(space_id).dim()
            );
        }
    }
    Ok(())
}
