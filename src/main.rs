//! md-crawler main entry point
//!
//! This is the command-line interface for the md-crawler website mirror.

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use md_crawler::config::{load_config_with_hash, Config};
use md_crawler::crawler::Coordinator;
use md_crawler::output::print_report;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// md-crawler: mirror a website into Markdown
///
/// md-crawler crawls a site breadth-first from a start URL, converts every
/// page to Markdown and rewrites links and images so the mirror can be
/// browsed offline.
#[derive(Parser, Debug)]
#[command(name = "md-crawler")]
#[command(about = "Mirror a website into self-contained Markdown", long_about = None)]
struct Cli {
    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Crawl a site and write a Markdown mirror
    Crawl(CrawlArgs),

    /// Convert a single page to Markdown
    SinglePage(SinglePageArgs),

    /// Print the version and exit
    Version,
}

#[derive(Args, Debug)]
struct CrawlArgs {
    /// URL the crawl starts from; its host is the crawl domain
    #[arg(value_name = "URL")]
    url: String,

    /// Directory the mirror is written into
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Maximum number of pages to crawl
    #[arg(short = 'm', long)]
    max_pages: Option<u32>,

    /// Maximum crawl depth (0 = unlimited)
    #[arg(short = 'd', long)]
    depth: Option<u32>,

    /// Download images into <DIR>/assets
    #[arg(long)]
    download_assets: bool,

    /// Seed the crawl from the site's sitemap
    #[arg(long)]
    use_sitemap: bool,

    /// Maximum number of pages rendered at once
    #[arg(short, long)]
    workers: Option<u32>,

    /// Path to TOML configuration file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct SinglePageArgs {
    /// URL of the page to convert
    #[arg(value_name = "URL")]
    url: String,

    /// File the Markdown is written to
    #[arg(short, long, value_name = "FILE", default_value = "page.md")]
    output: PathBuf,

    /// Path to TOML configuration file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    match cli.command {
        Command::Crawl(args) => handle_crawl(args).await,
        Command::SinglePage(args) => handle_single_page(args).await,
        Command::Version => {
            println!("md-crawler version {}", env!("CARGO_PKG_VERSION"));
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
            0 => EnvFilter::new("md_crawler=info,warn"),
            1 => EnvFilter::new("md_crawler=debug,info"),
            2 => EnvFilter::new("md_crawler=trace,debug"),
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

/// Loads the configuration file if one was given
///
/// Returns the defaults and no hash otherwise.
fn load_optional_config(path: Option<&Path>) -> anyhow::Result<(Config, Option<String>)> {
    let Some(path) = path else {
        return Ok((Config::default(), None));
    };

    tracing::info!("Loading configuration from: {}", path.display());
    let (config, hash) = load_config_with_hash(path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);
    Ok((config, Some(hash)))
}

/// Handles the crawl command
async fn handle_crawl(args: CrawlArgs) -> anyhow::Result<()> {
    let (mut config, hash) = load_optional_config(args.config.as_deref())?;

    // Command-line flags win over the file
    if let Some(output) = args.output {
        config.output.output_dir = output.to_string_lossy().into_owned();
    }
    if let Some(max_pages) = args.max_pages {
        config.crawler.max_pages = max_pages;
    }
    if let Some(depth) = args.depth {
        config.crawler.max_depth = depth;
    }
    if let Some(workers) = args.workers {
        config.crawler.workers = workers;
    }
    config.crawler.download_assets |= args.download_assets;
    config.crawler.use_sitemap |= args.use_sitemap;

    let mut coordinator = Coordinator::new(config, &args.url)
        .with_context(|| format!("Cannot crawl {}", args.url))?;
    if let Some(hash) = hash {
        coordinator = coordinator.with_config_hash(hash);
    }

    let report = coordinator.run().await.context("Crawl failed")?;
    print_report(&report);
    Ok(())
}

/// Handles the single-page command
async fn handle_single_page(args: SinglePageArgs) -> anyhow::Result<()> {
    let (config, _hash) = load_optional_config(args.config.as_deref())?;

    let coordinator = Coordinator::new(config, &args.url)
        .with_context(|| format!("Cannot convert {}", args.url))?;
    let markdown = coordinator.single_page().await?;

    tokio::fs::write(&args.output, markdown)
        .await
        .with_context(|| format!("Failed to write {}", args.output.display()))?;
    println!("Saved {} to {}", args.url, args.output.display());
    Ok(())
}
