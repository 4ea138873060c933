//! webcrawler main entry point
//!
//! This is the command-line interface for the webcrawler.

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use webcrawler::config::{load_config_with_hash, Config};
use webcrawler::crawler::{Coordinator, HttpFetcher};
use webcrawler::output::{load_statistics, print_statistics};
use webcrawler::storage::{open_storage, SqliteStorage};
use webcrawler::{CrawlError, WebcrawlerError};

/// webcrawler: a polite, stateful web crawler
///
/// Crawls the URLs allowed by the configuration while respecting robots.txt,
/// records the link graph between pages, and revisits pages once they
/// grow stale. All state lives in a SQLite database, so crawls can be
/// stopped and resumed at any time.
#[derive(Parser, Debug)]
#[command(name = "webcrawler")]
#[command(version)]
#[command(about = "A polite, stateful web crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Add seed URLs to the frontier
    Seed {
        /// Absolute URLs to add
        #[arg(value_name = "URL", required = true)]
        urls: Vec<String>,
    },

    /// Crawl until nothing is due or the limit is reached
    Crawl {
        /// Stop after this many pages have been stored
        #[arg(long)]
        limit: Option<usize>,

        /// Delete urls rejected by the URL filter or robots.txt
        #[arg(long)]
        clean_disallowed: bool,
    },

    /// Show statistics from the database and exit
    Stats,

    /// Validate the configuration and show what would be crawled
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    match cli.command {
        Command::Seed { urls } => handle_seed(&config, &urls).await,
        Command::Crawl {
            limit,
            clean_disallowed,
        } => handle_crawl(&config, limit, clean_disallowed).await,
        Command::Stats => handle_stats(&config),
        Command::Check => {
            handle_check(&config);
            Ok(())
        }
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("webcrawler=info,warn"),
            1 => EnvFilter::new("webcrawler=debug,info"),
            2 => EnvFilter::new("webcrawler=trace,debug"),
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

fn open_database(config: &Config) -> anyhow::Result<SqliteStorage> {
    let path = Path::new(&config.output.database_path);
    open_storage(path).with_context(|| format!("Failed to open database {}", path.display()))
}

fn build_coordinator(
    config: &Config,
) -> Result<Coordinator<SqliteStorage, HttpFetcher>, WebcrawlerError> {
    let storage = open_storage(Path::new(&config.output.database_path))?;
    let fetcher = HttpFetcher::new(&config.crawler.user_agent)?;
    Ok(Coordinator::new(config, storage, fetcher)?)
}

/// Handles the seed command: adds each URL, reporting rejections
async fn handle_seed(config: &Config, urls: &[String]) -> anyhow::Result<()> {
    let mut coordinator = build_coordinator(config)?;
    let mut added = 0;

    for url in urls {
        match coordinator.add_seed_url(url).await {
            Ok(Some(record)) => {
                added += 1;
                println!("+ {}", record.url);
            }
            Ok(None) => println!("= {} (already known)", url.trim()),
            Err(
                e @ (CrawlError::Disallowed { .. }
                | CrawlError::DisallowedByRobots { .. }
                | CrawlError::Url(_)),
            ) => {
                tracing::warn!("Rejected seed: {}", e);
                println!("- {} ({})", url.trim(), e);
            }
            Err(e) => return Err(e.into()),
        }
    }

    println!("\n✓ Added {} of {} seed URLs", added, urls.len());
    Ok(())
}

/// Handles the crawl command
async fn handle_crawl(
    config: &Config,
    limit: Option<usize>,
    clean_disallowed: bool,
) -> anyhow::Result<()> {
    let mut coordinator = build_coordinator(config)?;

    if clean_disallowed {
        tracing::info!("Disallowed urls will be deleted");
    }

    match coordinator.run(limit, clean_disallowed).await {
        Ok(summary) => {
            if summary.exhausted {
                println!("✓ Crawled {} pages, nothing else is due", summary.crawled);
            } else {
                println!("✓ Crawled {} pages", summary.crawled);
            }
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}

/// Handles the stats command: shows statistics from the database
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    println!("Database: {}\n", config.output.database_path);

    let storage = open_database(config)?;
    let stats = load_statistics(&storage)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the check command: prints the effective configuration
fn handle_check(config: &Config) {
    println!("=== webcrawler Configuration ===\n");

    println!("Crawler:");
    println!("  User agent: {}", config.crawler.user_agent);
    println!(
        "  Minimum crawl interval: {}s",
        config.crawler.minimum_crawl_interval
    );
    println!(
        "  Robots refresh interval: {}s",
        config.crawler.robots_refresh_interval
    );

    println!("\nAllowed Patterns ({}):", config.urls.allowed.len());
    for pattern in &config.urls.allowed {
        println!("  + {}", pattern);
    }

    println!("\nDisallowed Patterns ({}):", config.urls.disallowed.len());
    for pattern in &config.urls.disallowed {
        println!("  - {}", pattern);
    }

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);

    println!("\n✓ Configuration is valid");
}
