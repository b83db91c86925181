//! Command-line front end
//!
//! Run with: cargo run -p ruvector-ingest -- create "docs/**/*.md"

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use serde_json::Value;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ruvector_ingest::commands::{self, base_dir_or_cwd, ConnectionInfo};
use ruvector_ingest::{
    CreateOptions, DeleteOptions, DocumentRecord, HttpStore, IngestConfig, PageSelector,
    RemoteStore, RunReport, SearchOptions, UpdateOptions,
};

#[derive(Parser, Debug)]
#[command(
    name = "ruvector-ingest",
    version,
    about = "Upload files to a remote document store and manage what is stored there"
)]
struct Cli {
    /// Config file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Store endpoint, overriding the config file
    #[arg(long, global = true)]
    endpoint: Option<String>,

    /// Base directory for patterns and relative ids
    #[arg(long, global = true)]
    cwd: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create objects from files matching a glob pattern
    Create(CreateArgs),
    /// Read objects by id
    Read {
        /// Object id (repeatable)
        #[arg(long = "id")]
        ids: Vec<String>,
    },
    /// Update objects from JSON files
    Update {
        pattern: Option<String>,
        #[arg(long = "type")]
        doc_type: Option<String>,
    },
    /// Delete objects named by matching files, or by id
    Delete {
        pattern: Option<String>,
        #[arg(long = "id")]
        ids: Vec<String>,
    },
    /// Search stored objects
    Search(SearchArgs),
    /// Check the connection to the store
    Ping,
    /// Show the authenticated identity
    Me,
    /// Show the app's settings
    AppSettings,
    /// Rebuild the search index
    RebuildIndex {
        #[arg(long)]
        destination_index: Option<String>,
    },
}

#[derive(Args, Debug)]
struct CreateArgs {
    /// Glob pattern or directory
    pattern: Option<String>,
    /// Id for the first matched file
    #[arg(long)]
    id: Option<String>,
    /// Object type
    #[arg(long = "type")]
    doc_type: Option<String>,
    /// Use raw ids as storage keys
    #[arg(long)]
    no_encode_id: bool,
    /// Strip leading boilerplate from extracted text
    #[arg(long)]
    sanitize: bool,
}

#[derive(Args, Debug)]
struct SearchArgs {
    /// Query string
    #[arg(default_value = "*")]
    query: String,
    #[arg(long = "type")]
    doc_type: Option<String>,
    /// Page number, or "all"
    #[arg(long)]
    page: Option<PageSelector>,
    #[arg(long)]
    sort: Option<String>,
    #[arg(long)]
    desc: bool,
    #[arg(long)]
    limit: Option<u32>,
    #[arg(long)]
    last_key: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "ruvector_ingest=debug"
    } else {
        "ruvector_ingest=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {:#}", "✖".red(), e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let mut config = IngestConfig::load(cli.config.as_deref())?;
    if let Some(endpoint) = cli.endpoint {
        config.store.endpoint = endpoint;
    }
    let base_dir = base_dir_or_cwd(cli.cwd.as_deref());

    let store = HttpStore::new(&config.store)?;
    tracing::debug!("Using {} store at {}", store.name(), store.base_url());
    let store: &dyn RemoteStore = &store;

    match cli.command {
        Command::Create(args) => {
            if args.no_encode_id {
                config.ingestion.encode_ids = false;
            }
            if args.sanitize {
                config.ingestion.sanitize = true;
            }
            let options = CreateOptions {
                pattern: args.pattern,
                base_dir,
                id_override: args.id,
                doc_type: args.doc_type,
            };
            let report = commands::create_all(store, &config, &options).await?;
            Ok(print_report("Created", &report))
        }
        Command::Update { pattern, doc_type } => {
            let options = UpdateOptions {
                pattern,
                base_dir,
                doc_type,
            };
            let report = commands::update_all(store, &config, &options).await?;
            Ok(print_report("Updated", &report))
        }
        Command::Read { ids } => {
            let records = commands::read_all(store, &ids).await?;
            print_records(&records)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Delete { pattern, ids } => {
            let options = DeleteOptions {
                pattern,
                ids,
                base_dir,
            };
            let deleted = commands::delete_all(store, &options).await?;
            println!("{} Deleted {} object(s)", "✔".green(), deleted.len());
            Ok(ExitCode::SUCCESS)
        }
        Command::Search(args) => {
            let options = SearchOptions {
                query: args.query,
                doc_type: args.doc_type,
                page: args.page,
                sort: args.sort,
                desc: args.desc,
                limit: args.limit,
                last_key: args.last_key,
            };
            let records = commands::search(store, &config, &options).await?;
            print_records(&records)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Ping => {
            let info = commands::ping(store).await?;
            print_connection(&info);
            Ok(ExitCode::SUCCESS)
        }
        Command::Me => {
            print_json(&commands::me(store).await?)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::AppSettings => {
            print_json(&commands::app_settings(store).await?)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::RebuildIndex { destination_index } => {
            let result = commands::rebuild_index(store, destination_index.as_deref()).await?;
            print_json(&result)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn print_report(verb: &str, report: &RunReport) -> ExitCode {
    for skip in &report.skipped {
        eprintln!("{} {}", "-".yellow(), skip);
    }
    for failure in &report.failures {
        match failure.status {
            Some(status) => eprintln!(
                "{} {}: {} (status {})",
                "✖".red(),
                failure.target,
                failure.message,
                status
            ),
            None => eprintln!("{} {}: {}", "✖".red(), failure.target, failure.message),
        }
    }

    println!(
        "{} {} {} object(s) in {} batch(es) and {} chunk(s), {} KB read",
        if report.is_success() { "✔".green() } else { "✖".red() },
        verb,
        report.submitted,
        report.batches,
        report.chunks,
        report.total_bytes / 1024
    );

    if report.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn print_connection(info: &ConnectionInfo) {
    let identity = info
        .me
        .get("id")
        .and_then(Value::as_str)
        .unwrap_or("unknown");
    println!(
        "{} Connected to {} store, server v{}, as {}",
        "✔".green(),
        info.store,
        info.version,
        identity.bold()
    );
}

fn print_records(records: &[DocumentRecord]) -> anyhow::Result<()> {
    let wire: Vec<Value> = records.iter().map(DocumentRecord::to_wire).collect();
    print_json(&Value::Array(wire))
}

fn print_json(value: &Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
