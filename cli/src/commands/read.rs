//! READ command - Fetch a document with its collaborators.

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use livedoc_core::{AccessLevel, Room};

use super::{HumanReadable, endpoint, format_timestamp, make_request, output};

/// Arguments for the read command.
#[derive(Args)]
pub struct ReadArgs {
    /// Document ID to read
    pub document_id: String,
}

/// Short label for a collaborator's access levels.
fn access_label(levels: &[AccessLevel]) -> &'static str {
    if levels.contains(&AccessLevel::RoomWrite) {
        "editor"
    } else {
        "viewer"
    }
}

impl HumanReadable for Room {
    fn print_human(&self) {
        println!("{}", self.metadata.title.green().bold());
        println!("{}", "=".repeat(60));
        println!();
        println!("  {} {}", "ID:".cyan(), self.id);
        println!("  {} {}", "Owner:".cyan(), self.owner_email());
        if let Some(created) = &self.created_at {
            println!("  {} {}", "Created:".cyan(), format_timestamp(created));
        }
        if let Some(last) = &self.last_connection_at {
            println!("  {} {}", "Last active:".cyan(), format_timestamp(last));
        }

        println!();
        println!("  {}", "Collaborators".cyan());
        println!("  {}", "-".repeat(55));
        for (email, levels) in &self.users_accesses {
            let label = if self.is_owner(email) {
                "owner".yellow()
            } else {
                access_label(levels).normal()
            };
            println!("  {:<40} {}", email, label);
        }
    }
}

/// Execute the read command.
pub async fn execute(
    client: &reqwest::Client,
    base_url: &str,
    human: bool,
    args: ReadArgs,
) -> Result<()> {
    let url = endpoint(base_url, &["documents", &args.document_id])?;

    let room: Room = make_request(client.get(url)).await?;

    output(&room, human)
}
