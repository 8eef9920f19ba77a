//! RENAME command - Change a document's title.

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use livedoc_core::Room;
use serde::Serialize;

use super::{endpoint, make_request, output};

/// Arguments for the rename command.
#[derive(Args)]
pub struct RenameArgs {
    /// Document ID to rename
    pub document_id: String,

    /// New title
    pub title: String,
}

/// Request body for renaming a document.
#[derive(Serialize)]
struct RenameRequest<'a> {
    title: &'a str,
}

/// Execute the rename command.
pub async fn execute(
    client: &reqwest::Client,
    base_url: &str,
    human: bool,
    args: RenameArgs,
) -> Result<()> {
    let url = endpoint(base_url, &["documents", &args.document_id])?;
    let body = RenameRequest { title: &args.title };

    let room: Room = make_request(client.patch(url).json(&body)).await?;

    if human {
        println!("{}", "Document renamed.".green().bold());
        println!();
    }
    output(&room, human)
}
