use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use daystack_attach::AttachmentManager;
use daystack_core::{OwnerKind, OwnerRef};
use daystack_db::SqliteRegistry;
use daystack_store::ExportStore;

#[derive(Parser)]
#[command(name = "daystack")]
struct Cli {
    /// Path to the attachment database
    #[arg(long, env = "DAYSTACK_DB")]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Attach a file to an owner entity
    Add {
        /// Owner as <kind>:<id>, e.g. task:8f2a
        owner: String,
        /// File to attach
        path: PathBuf,
    },
    /// List an owner's attachments, newest first
    List {
        /// Owner as <kind>:<id>
        owner: String,
        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Stage an attachment for preview and print the staged path
    Export {
        /// The attachment id
        id: String,
    },
    /// Delete an attachment by id
    Delete {
        /// The attachment id
        id: String,
    },
    /// Remove every attachment of an owner (owner entity deleted)
    PurgeOwner {
        /// Owner as <kind>:<id>
        owner: String,
    },
}

fn parse_owner(s: &str) -> Result<OwnerRef> {
    let (kind, id) = s
        .split_once(':')
        .context("owner must be <kind>:<id>, e.g. task:8f2a")?;
    let kind = OwnerKind::from_str(kind)
        .with_context(|| format!("unknown owner kind '{kind}' (task|habit|goal|event)"))?;
    if id.is_empty() {
        bail!("owner id is empty");
    }
    Ok(OwnerRef::new(kind, id))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let registry = match &cli.db {
        Some(path) => SqliteRegistry::open_path(path)?,
        None => SqliteRegistry::open_default()?,
    };
    let manager = AttachmentManager::new(Arc::new(registry), ExportStore::in_temp());

    match cli.command {
        Commands::Add { owner, path } => {
            let owner = parse_owner(&owner)?;
            let att = manager.add_file(&owner, &path).await?;
            eprintln!(
                "attached {} ({} bytes) to {owner}",
                att.file_name, att.size_bytes
            );
            // Print the id to stdout so it can be captured
            println!("{}", att.id);
        }
        Commands::List { owner, json } => {
            let owner = parse_owner(&owner)?;
            let attachments = manager.list(&owner).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&attachments)?);
            } else if attachments.is_empty() {
                eprintln!("no attachments for {owner}");
            } else {
                println!("{:<38} {:<24} {:>10} CREATED", "ID", "NAME", "BYTES");
                for att in attachments {
                    println!(
                        "{:<38} {:<24} {:>10} {}",
                        att.id, att.file_name, att.size_bytes, att.created_at
                    );
                }
            }
        }
        Commands::Export { id } => {
            let att = manager.get(&id).await?;
            match manager.export(&att).await {
                Some(path) => println!("{}", path.display()),
                None => eprintln!("nothing to preview for {id}"),
            }
        }
        Commands::Delete { id } => {
            if manager.delete(&id).await? {
                eprintln!("deleted {id}");
            } else {
                eprintln!("{id} not found (already deleted?)");
            }
        }
        Commands::PurgeOwner { owner } => {
            let owner = parse_owner(&owner)?;
            let removed = manager.delete_owner(&owner).await?;
            eprintln!("removed {removed} attachment(s) from {owner}");
        }
    }

    Ok(())
}
