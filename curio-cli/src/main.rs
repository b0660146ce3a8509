//! curio command-line front end
//!
//! Searches the sources described in a fetcher configuration file and
//! browses the group indexes of collection files.
//!
//! Usage:
//!   curio sources
//!   curio search --source "Open Library" --key isbn 0-441-17271-7 --fetch
//!   curio update --source MovieMeter movies.xml
//!   curio groups books.xml author

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use curio_cli::{
    build_manager, entries_json, group_report, load_collection, outcome_report, sources_report,
};
use curio_fetch::{FetchKey, FetchRequest, Fetcher};
use curio_model::{CollectionType, ImportFormat};
use tracing::{debug, info};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(name = "curio", version)]
#[command(about = "Search catalog sources and browse collections")]
struct Args {
    /// Fetcher configuration file
    #[arg(short, long, default_value = "fetchers.toml", global = true)]
    config: PathBuf,

    /// Directory fetched images are saved in
    #[arg(long, global = true)]
    images: Option<PathBuf>,

    /// Enable verbose debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List configured sources
    Sources {
        /// Only sources that can search by this key
        #[arg(short, long)]
        key: Option<FetchKey>,
        /// Only sources that can fetch this collection type
        #[arg(short = 't', long = "type")]
        kind: Option<CollectionType>,
    },
    /// Search one source
    Search {
        #[arg(short, long)]
        source: String,
        #[arg(short, long, default_value = "title")]
        key: FetchKey,
        #[arg(short = 't', long = "type", default_value = "book")]
        kind: CollectionType,
        /// Stop after this many results
        #[arg(long)]
        max: Option<usize>,
        /// Also fetch the complete entry for every result
        #[arg(long)]
        fetch: bool,
        /// Print fetched entries as JSON
        #[arg(long, requires = "fetch")]
        json: bool,
        value: String,
    },
    /// Search one source for every entry of a collection file
    Update {
        #[arg(short, long)]
        source: String,
        #[arg(short, long, default_value = "tellico")]
        format: ImportFormat,
        #[arg(long, default_value = "5")]
        max: usize,
        input: PathBuf,
    },
    /// Show the groups of one field of a collection file
    Groups {
        #[arg(short, long, default_value = "tellico")]
        format: ImportFormat,
        input: PathBuf,
        field: String,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();
    let level = if args.verbose { LevelFilter::DEBUG } else { LevelFilter::INFO };
    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(level.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start the runtime")?;
    runtime.block_on(run(args))
}

async fn run(args: Args) -> Result<()> {
    match args.command {
        Command::Groups {
            format,
            input,
            field,
        } => {
            let collection = load_collection(&input, format)?;
            print!("{}", group_report(&collection, &field)?);
        }
        Command::Sources { key, kind } => {
            let manager = build_manager(&args.config, args.images.as_deref())?;
            let fetchers: Vec<Arc<dyn Fetcher>> = manager
                .fetchers()
                .iter()
                .filter(|f| key.is_none_or(|key| f.can_search(key)))
                .filter(|f| kind.is_none_or(|kind| f.can_fetch(kind)))
                .cloned()
                .collect();
            print!("{}", sources_report(&fetchers));
        }
        Command::Search {
            source,
            key,
            kind,
            max,
            fetch,
            json,
            value,
        } => {
            let mut manager = build_manager(&args.config, args.images.as_deref())?;
            let fetcher = manager
                .fetcher_by_source(&source)
                .with_context(|| format!("No source named {source:?}"))?;
            if !fetcher.can_search(key) {
                bail!("{source} cannot search by {key}");
            }
            if !fetcher.can_fetch(kind) {
                bail!("{source} cannot fetch {kind} entries");
            }

            info!(%source, %key, %value, "searching");
            let request = FetchRequest::new(kind, key, value);
            let mut job = manager.job(fetcher);
            if let Some(max) = max {
                job = job.with_max_results(max);
            }
            let outcome = if fetch {
                job.run(request).await
            } else {
                job.collect(request).await
            };

            if json {
                println!("{}", entries_json(&outcome.entries)?);
            } else {
                print!("{}", outcome_report(&outcome));
                for (uid, entry) in &outcome.entries {
                    println!("\n[{uid}]");
                    for (name, value) in entry.values() {
                        println!("  {name}: {value}");
                    }
                }
            }
            if let Some(error) = outcome.error() {
                if outcome.results.is_empty() {
                    bail!("{error}");
                }
            }
        }
        Command::Update {
            source,
            format,
            max,
            input,
        } => {
            let mut manager = build_manager(&args.config, args.images.as_deref())?;
            let fetcher = manager
                .fetcher_by_source(&source)
                .with_context(|| format!("No source named {source:?}"))?;
            let collection = load_collection(&input, format)?;
            if !fetcher.can_fetch(collection.kind()) {
                bail!("{source} cannot fetch {} entries", collection.kind());
            }

            let requests: Vec<(String, Option<FetchRequest>)> = collection
                .entries()
                .map(|entry| (entry.title(), fetcher.update_request(entry)))
                .collect();
            for (title, request) in requests {
                println!("{title}");
                let Some(request) = request else {
                    debug!(%title, "nothing to search by");
                    println!("  (nothing to search by)");
                    continue;
                };
                let outcome = manager
                    .job(Arc::clone(&fetcher))
                    .with_max_results(max)
                    .collect(request)
                    .await;
                for line in outcome_report(&outcome).lines() {
                    println!("  {line}");
                }
            }
        }
    }
    Ok(())
}
