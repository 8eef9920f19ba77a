//! CREATE command - Create a new document.

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use livedoc_core::Room;

use super::{endpoint, make_request, output};

/// Arguments for the create command.
#[derive(Args)]
pub struct CreateArgs {
    // The server names and owns the new document
}

/// Execute the create command.
pub async fn execute(
    client: &reqwest::Client,
    base_url: &str,
    human: bool,
    _args: CreateArgs,
) -> Result<()> {
    let url = endpoint(base_url, &["documents"])?;

    let room: Room = make_request(client.post(url)).await?;

    if human {
        println!("{}", "Document created successfully!".green().bold());
        println!();
    }
    output(&room, human)
}
