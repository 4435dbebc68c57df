//! forklore - Browse consensus-spec items and test fixtures across forks
//!
//! Points at a data root (a local directory or a remote base URL) holding
//! `data/versions.json`, per-version `pyspec.json` spec data, and per-version
//! test manifests, and either serves the JSON API or answers one-shot
//! queries from the command line.

use clap::{Parser, Subcommand};
use eyre::{Result, bail};
use forklore::output;
use forklore::session::Navigation;
use forklore::{DataStore, Session};
use forklore_core::DeepLink;
use owo_colors::OwoColorize;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "forklore", version, about)]
struct Args {
    /// Local data root directory
    #[arg(long, global = true, conflicts_with = "remote")]
    data: Option<PathBuf>,

    /// Remote data root base URL
    #[arg(long, global = true)]
    remote: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve the JSON API
    Serve {
        /// Port to bind (default: first free port from 3000)
        #[arg(long, short)]
        port: Option<u16>,
    },
    /// List available versions in display order
    Versions,
    /// List consolidated items for a version
    Items {
        /// Version to load (default: newest)
        #[arg(long)]
        version: Option<String>,

        /// Also list every item with its forks
        #[arg(long, short)]
        verbose: bool,
    },
    /// Show one item's forks and its used-by set
    Refs {
        /// Item name
        name: String,

        /// Version to load (default: newest)
        #[arg(long)]
        version: Option<String>,
    },
    /// Decode a deep-link fragment and resolve its target
    Link {
        /// Fragment, with or without the leading '#'
        fragment: String,
    },
}

fn store_from(args: &Args) -> Result<DataStore> {
    match (&args.data, &args.remote) {
        (Some(root), None) => Ok(DataStore::local(root)),
        (None, Some(base)) => Ok(DataStore::remote(base)),
        (None, None) => Ok(DataStore::local(".")),
        (Some(_), Some(_)) => bail!("--data and --remote are mutually exclusive"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "forklore=info".into()),
        )
        .init();

    let args = Args::parse();
    let store = store_from(&args)?;

    match args.command {
        Command::Serve { port } => {
            forklore::serve::run(store, port).await?;
        }
        Command::Versions => {
            let session = Session::open(store, None).await?;
            print!(
                "{}",
                output::render_versions(session.catalog(), session.current_version())
            );
        }
        Command::Items { version, verbose } => {
            let session = Session::open(store, version.as_deref()).await?;
            let Some(data) = session.data() else {
                bail!("No versions available in this data root");
            };
            println!(
                "{} {} ({} items)",
                "->".blue().bold(),
                data.version.bold(),
                data.items.len()
            );
            print!("{}", output::render_items(&data.items, verbose));
        }
        Command::Refs { name, version } => {
            let session = Session::open(store, version.as_deref()).await?;
            let Some(data) = session.data() else {
                bail!("No versions available in this data root");
            };
            let Some(item) = data.items.by_name(&name) else {
                bail!("{name} not found in {}", data.version);
            };
            print!("{}", output::render_item(item, item.category, &data.refs));
        }
        Command::Link { fragment } => {
            let Some(link) = DeepLink::parse(&fragment) else {
                bail!("Malformed fragment: {fragment}");
            };
            let mut session = Session::open(store, None).await?;
            match session.navigate(&link).await? {
                Navigation::Ignored => {
                    println!("{} link names an unknown version, nothing to do", "!".yellow());
                }
                Navigation::Spec(focus) => {
                    println!("{} {}", "OK".green().bold(), focus.name.bold());
                    if let Some(fork) = focus.fork {
                        println!("   fork: {fork}");
                    }
                    println!("   used by: {}", focus.used_by.join(", "));
                }
                Navigation::Test(focus) => {
                    println!("{} {}", "OK".green().bold(), focus.path.bold());
                    for ancestor in &focus.ancestors {
                        println!("   expand: {ancestor}");
                    }
                    if let Some(file) = focus.file {
                        println!(
                            "   file: {} (toggle {})",
                            file.name,
                            if file.toggle_ready { "ready" } else { "unavailable" }
                        );
                    }
                }
            }
        }
    }

    Ok(())
}
