//! SHARE command - Manage collaborator access.

use anyhow::Result;
use clap::{Args, Subcommand};
use colored::Colorize;
use livedoc_core::{Room, UserType};
use serde::Serialize;

use super::{endpoint, make_request, output};

/// Arguments for the share command.
#[derive(Args)]
pub struct ShareArgs {
    /// Document ID to manage access for
    pub document_id: String,

    #[command(subcommand)]
    pub action: ShareAction,
}

#[derive(Subcommand)]
pub enum ShareAction {
    /// Grant or change a collaborator's access
    Grant {
        /// Collaborator email
        email: String,

        /// Access tier (editor or viewer)
        #[arg(long, short = 't', default_value = "viewer")]
        user_type: UserType,
    },

    /// Remove a collaborator
    Remove {
        /// Collaborator email
        email: String,
    },
}

/// Request body for granting access.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ShareRequest<'a> {
    email: &'a str,
    user_type: UserType,
}

/// Execute the share command.
pub async fn execute(
    client: &reqwest::Client,
    base_url: &str,
    human: bool,
    args: ShareArgs,
) -> Result<()> {
    let (room, message): (Room, String) = match &args.action {
        ShareAction::Grant { email, user_type } => {
            let url = endpoint(base_url, &["documents", &args.document_id, "share"])?;
            let body = ShareRequest {
                email,
                user_type: *user_type,
            };
            let room = make_request(client.post(url).json(&body)).await?;
            (room, format!("{} is now a {}.", email, user_type))
        }

        ShareAction::Remove { email } => {
            let url = endpoint(
                base_url,
                &["documents", &args.document_id, "share", email],
            )?;
            let room = make_request(client.delete(url)).await?;
            (room, format!("{} was removed.", email))
        }
    };

    if human {
        println!("{}", message.green().bold());
        println!();
    }
    output(&room, human)
}
