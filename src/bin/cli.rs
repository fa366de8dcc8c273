//! sitecrawl CLI
//!
//! Crawls every reachable page within the seed URL's host and exits once the
//! frontier drains or the crawl is interrupted.

use std::sync::Arc;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use url::Url;

use sitecrawl::{
    config::CrawlConfig,
    crawl::CrawlEngine,
    error::{AppError, Result},
    services::HttpFetcher,
    utils::url::is_fetchable_scheme,
};

/// sitecrawl - single-domain web crawler
#[derive(Parser, Debug)]
#[command(
    name = "sitecrawl",
    version,
    about = "Enumerates every reachable page within a single domain"
)]
struct Cli {
    /// Absolute http(s) URL to start crawling from
    seed_url: String,

    /// Number of concurrent workers
    #[arg(long, default_value_t = 10)]
    workers: usize,

    /// Maximum number of queued URLs
    #[arg(long, default_value_t = 1000)]
    frontier_capacity: usize,

    /// Request timeout in seconds
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,

    /// User-Agent header for outbound requests
    #[arg(long, default_value = "Mozilla/5.0 (compatible; sitecrawl/0.1)")]
    user_agent: String,

    /// Print the crawl report as JSON when done
    #[arg(long)]
    json: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Parse and sanity-check the seed argument.
fn parse_seed(raw: &str) -> Result<Url> {
    let seed =
        Url::parse(raw).map_err(|e| AppError::config(format!("invalid seed URL {raw:?}: {e}")))?;
    if !is_fetchable_scheme(&seed) || seed.host_str().is_none() {
        return Err(AppError::config(format!(
            "seed URL must be an absolute http(s) URL with a host, got {raw:?}"
        )));
    }
    Ok(seed)
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let seed = match parse_seed(&cli.seed_url) {
        Ok(seed) => seed,
        Err(error) => {
            eprintln!("{error}");
            eprintln!("Usage: sitecrawl <SEED_URL>");
            return Err(error);
        }
    };

    let config = CrawlConfig {
        workers: cli.workers,
        frontier_capacity: cli.frontier_capacity,
        timeout_secs: cli.timeout_secs,
        user_agent: cli.user_agent.clone(),
        ..CrawlConfig::default()
    };

    let fetcher = Arc::new(HttpFetcher::new(&config)?);
    let engine = Arc::new(CrawlEngine::new(config, fetcher, &seed)?);

    // One crawl-wide cancellation signal: ctrl-c stops new work; in-flight
    // URLs still finish their bookkeeping before the workers unwind.
    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                log::info!("interrupt received, stopping crawl...");
                cancel.cancel();
            }
        });
    }

    let report = engine.run(cancel).await;

    if report.cancelled {
        log::info!("crawl cancelled");
    }
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    Ok(())
}
