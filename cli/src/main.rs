//! Command-line client for the LiveDoc server.
//!
//! This CLI tool provides commands for every document operation:
//! - create: Create a new document
//! - read: Fetch a document and its collaborators
//! - rename: Change a document's title
//! - list: List documents you participate in
//! - share: Grant or remove a collaborator's access
//! - delete: Delete a document
//!
//! Configuration via environment:
//! - LIVEDOC_URL: Base URL of the LiveDoc server (default: http://localhost:3000)
//! - LIVEDOC_TOKEN: Identity token sent as a Bearer token
//! - LIVEDOC_DEV_EMAIL: Email sent as the development identity header

mod commands;

use clap::{Parser, Subcommand};

use commands::{
    create::CreateArgs, delete::DeleteArgs, list::ListArgs, read::ReadArgs, rename::RenameArgs,
    share::ShareArgs,
};

/// LiveDoc CLI
///
/// Manage collaborative documents from the command line. JSON output by
/// default, --human for formatted output.
#[derive(Parser)]
#[command(name = "livedoc")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Output human-readable formatted text instead of JSON
    #[arg(long, global = true)]
    human: bool,

    /// LiveDoc server URL
    #[arg(
        long,
        env = "LIVEDOC_URL",
        default_value = "http://localhost:3000",
        global = true
    )]
    url: String,

    /// Identity token for authentication
    #[arg(long, env = "LIVEDOC_TOKEN", global = true)]
    token: Option<String>,

    /// Development identity (only honored by servers with dev identity enabled)
    #[arg(long, env = "LIVEDOC_DEV_EMAIL", global = true)]
    dev_email: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new document
    Create(CreateArgs),

    /// Read a document with its collaborators
    Read(ReadArgs),

    /// Rename a document
    Rename(RenameArgs),

    /// List documents you participate in
    List(ListArgs),

    /// Manage collaborator access
    Share(ShareArgs),

    /// Delete a document
    Delete(DeleteArgs),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let client = match commands::build_client(cli.token.as_deref(), cli.dev_email.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Create(args) => {
            commands::create::execute(&client, &cli.url, cli.human, args).await
        }
        Commands::Read(args) => commands::read::execute(&client, &cli.url, cli.human, args).await,
        Commands::Rename(args) => {
            commands::rename::execute(&client, &cli.url, cli.human, args).await
        }
        Commands::List(args) => commands::list::execute(&client, &cli.url, cli.human, args).await,
        Commands::Share(args) => {
            commands::share::execute(&client, &cli.url, cli.human, args).await
        }
        Commands::Delete(args) => {
            commands::delete::execute(&client, &cli.url, cli.human, args).await
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
