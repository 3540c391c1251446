//! Listing indexer main entry point
//!
//! This is the command-line interface for collecting real-estate listings.

use anyhow::Context;
use clap::Parser;
use listing_indexer::collector::{run_schedule, CollectorRegistry, MlsCollector};
use listing_indexer::config::{load_config_with_hash, Config, StorageBackend};
use listing_indexer::storage::open_storage;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Listing indexer: collects MLS listings and tracks their prices
///
/// Fetches listings from the configured source on a schedule, normalizes them,
/// and stores them with an append-only price history.
#[derive(Parser, Debug)]
#[command(name = "listing-indexer")]
#[command(version = "1.0.0")]
#[command(about = "Collects real-estate listings and their price history", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Run a single collection cycle and exit
    #[arg(long, conflicts_with_all = ["dry_run", "list"])]
    once: bool,

    /// Validate config and show the search that would be issued
    #[arg(long, conflicts_with_all = ["once", "list"])]
    dry_run: bool,

    /// Print stored listings as JSON and exit
    #[arg(long, conflicts_with_all = ["once", "dry_run"])]
    list: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.dry_run {
        handle_dry_run(&config);
    } else if cli.list {
        handle_list(&config)?;
    } else {
        handle_collect(&config, cli.once).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("listing_indexer=info,warn"),
            1 => EnvFilter::new("listing_indexer=debug,info"),
            2 => EnvFilter::new("listing_indexer=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: validates config and shows the search
fn handle_dry_run(config: &Config) {
    println!("=== Listing Indexer Dry Run ===\n");

    println!("Source:");
    println!("  Name: {}", config.source.name);
    println!("  Endpoint: {}", config.source.endpoint);
    println!("  Timeout: {}s", config.source.request_timeout_secs);

    println!("\nSearch form:");
    for (field, value) in config.search.to_form() {
        println!("  {} = {}", field, value);
    }

    println!("\nStorage:");
    match config.storage.backend {
        StorageBackend::Memory => println!("  Backend: memory"),
        StorageBackend::Sqlite => {
            println!("  Backend: sqlite");
            println!("  Database: {}", config.storage.database_path);
            println!("  Read page size: {}", config.storage.read_page_size);
        }
    }

    println!("\nSeeded cities ({}):", config.cities.len());
    for city in &config.cities {
        println!("  - {}, {}", city.name, city.state);
    }

    println!("\n✓ Configuration is valid");
    println!(
        "✓ Would collect every {} hour(s)",
        config.schedule.interval_hours
    );
}

/// Handles the --list mode: prints stored listings as JSON
fn handle_list(config: &Config) -> anyhow::Result<()> {
    let storage = open_storage(&config.storage, &config.cities).context("failed to open storage")?;
    let listings = storage
        .read_listings()
        .context("failed to read stored listings")?;

    println!("{}", serde_json::to_string_pretty(&listings)?);
    tracing::info!("Listed {} listing(s)", listings.len());

    Ok(())
}

/// Handles the collection loop
async fn handle_collect(config: &Config, once: bool) -> anyhow::Result<()> {
    let storage = open_storage(&config.storage, &config.cities).context("failed to open storage")?;

    let mut registry = CollectorRegistry::new();
    registry.register(Box::new(MlsCollector::new(
        &config.source,
        config.search.clone(),
        storage,
    )?))?;

    let interval = Duration::from_secs(config.schedule.interval_hours * 3600);
    let max_cycles = once.then_some(1);

    tracing::info!(
        "Starting collection with {} collector(s), every {} hour(s)",
        registry.len(),
        config.schedule.interval_hours
    );

    run_schedule(&registry, interval, max_cycles).await;
    Ok(())
}
