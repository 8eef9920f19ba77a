//! LIST command - List documents you participate in.

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use livedoc_core::RoomPage;

use super::{HumanReadable, endpoint, format_timestamp, make_request, output, truncate};

/// Arguments for the list command.
#[derive(Args)]
pub struct ListArgs {
    /// Maximum number of documents to return
    #[arg(short = 'n', long)]
    pub limit: Option<u32>,

    /// Cursor from a previous page
    #[arg(long)]
    pub cursor: Option<String>,
}

impl HumanReadable for RoomPage {
    fn print_human(&self) {
        println!("{}", "Your Documents".green().bold());
        println!("{}", "=".repeat(80));
        println!();

        if self.data.is_empty() {
            println!("  {}", "(No documents)".dimmed());
            return;
        }

        println!(
            "  {:<24} {:<30} {}",
            "ID".cyan(),
            "Title".cyan(),
            "Created".cyan()
        );
        println!("  {}", "-".repeat(76));

        for room in &self.data {
            let created = room
                .created_at
                .as_ref()
                .map(format_timestamp)
                .unwrap_or_else(|| "-".to_string());
            println!(
                "  {:<24} {:<30} {}",
                room.id,
                truncate(&room.metadata.title, 30),
                created
            );
        }

        println!();
        println!("  {} {}", "Total:".cyan(), self.data.len());
        if let Some(cursor) = &self.next_cursor {
            println!("  {} --cursor {}", "More:".cyan(), cursor);
        }
    }
}

/// Execute the list command.
pub async fn execute(
    client: &reqwest::Client,
    base_url: &str,
    human: bool,
    args: ListArgs,
) -> Result<()> {
    let mut url = endpoint(base_url, &["documents"])?;
    {
        let mut query = url.query_pairs_mut();
        if let Some(limit) = args.limit {
            query.append_pair("limit", &limit.to_string());
        }
        if let Some(cursor) = &args.cursor {
            query.append_pair("cursor", cursor);
        }
    }
    // An empty query string still leaves a trailing '?'
    if url.query() == Some("") {
        url.set_query(None);
    }

    let page: RoomPage = make_request(client.get(url)).await?;

    output(&page, human)
}
