//! DELETE command - Delete a document.

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use reqwest::{StatusCode, header::LOCATION};
use serde::Serialize;

use super::{HumanReadable, endpoint, output, server_error};

/// Arguments for the delete command.
#[derive(Args)]
pub struct DeleteArgs {
    /// Document ID to delete
    pub document_id: String,

    /// Skip confirmation prompt (for non-interactive use)
    #[arg(long, short = 'y')]
    pub yes: bool,
}

/// Outcome of a delete request.
///
/// The server always redirects to the document list, whether or not the
/// document could be deleted.
#[derive(Debug, Serialize)]
pub struct DeleteResult {
    pub id: String,
    pub redirect: String,
}

impl HumanReadable for DeleteResult {
    fn print_human(&self) {
        println!("{}", "Delete requested.".green().bold());
        println!();
        println!("  {} {}", "ID:".cyan(), self.id);
        println!("  {} {}", "Redirect:".cyan(), self.redirect);
    }
}

/// Execute the delete command.
pub async fn execute(
    client: &reqwest::Client,
    base_url: &str,
    human: bool,
    args: DeleteArgs,
) -> Result<()> {
    // Confirmation prompt for interactive use
    if human && !args.yes {
        eprint!(
            "{} Are you sure you want to delete document {}? [y/N] ",
            "Warning:".yellow().bold(),
            args.document_id
        );

        use std::io::Write;
        std::io::stderr().flush()?;

        let mut input = String::new();
        std::io::stdin().read_line(&mut input)?;

        if !input.trim().eq_ignore_ascii_case("y") {
            eprintln!("Aborted.");
            return Ok(());
        }
    }

    let url = endpoint(base_url, &["documents", &args.document_id])?;
    let response = client.delete(url).send().await?;
    let status = response.status();

    if status != StatusCode::SEE_OTHER && !status.is_success() {
        return Err(server_error(response).await.into());
    }

    let redirect = response
        .headers()
        .get(LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("/")
        .to_string();

    let result = DeleteResult {
        id: args.document_id,
        redirect,
    };
    output(&result, human)
}
