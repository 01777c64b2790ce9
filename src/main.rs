//! Jobtrail main entry point
//!
//! Command-line interface for the Jobtrail job-posting crawler.

use anyhow::Context;
use clap::Parser;
use jobtrail::config::{load_config_with_hash, Config};
use jobtrail::crawler::{
    event_channel, CrawlEvent, CrawlState, Driver, HeuristicClassifier, HtmlJobExtractor,
    HttpFetcher, RuleAdvisor, StopHandle,
};
use jobtrail::storage::{open_storage, Storage};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Jobtrail: a resilient job-posting crawler
///
/// Jobtrail crawls company career sites and job boards, tolerating hostile
/// pages through bounded retries and human-in-the-loop escalation, and
/// stores extracted postings in SQLite.
#[derive(Parser, Debug)]
#[command(name = "jobtrail")]
#[command(version = "1.0.0")]
#[command(about = "A resilient job-posting crawler", long_about = None)]
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

    /// Crawl only the named source
    #[arg(long, value_name = "NAME")]
    source: Option<String>,

    /// Validate config and show what would be crawled without crawling
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show statistics from the database and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded (hash: {})", config_hash);

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    if cli.stats {
        handle_stats(&config)?;
        return Ok(());
    }

    handle_crawl(config, config_hash, cli.source).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("jobtrail=info,warn"),
            1 => EnvFilter::new("jobtrail=debug,info"),
            2 => EnvFilter::new("jobtrail=trace,debug"),
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

/// Handles --dry-run: validates config and shows what would be crawled
fn handle_dry_run(config: &Config) {
    println!("=== Jobtrail Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Max depth: {}", config.crawler.max_depth);
    println!("  Max retries: {}", config.crawler.max_retries);
    println!(
        "  Max URL corrections: {}",
        config.crawler.max_url_correction_attempts
    );
    println!(
        "  Max consecutive zero-job visits: {}",
        config.crawler.max_consecutive_zero_job_visits
    );
    println!(
        "  Max pagination pages: {}",
        config.crawler.max_pagination_pages
    );

    println!("\nUser Agent: {}", config.user_agent.header_value());
    println!("Database: {}", config.output.database_path);

    println!("\nSources ({}):", config.sources.len());
    for source in &config.sources {
        println!("  - {} -> {}", source.name, source.url);
    }

    println!("\n✓ Configuration is valid");
}

/// Handles --stats: shows statistics from the database
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    let storage = open_storage(std::path::Path::new(&config.output.database_path))?;

    println!("Database: {}\n", config.output.database_path);
    println!("Total visits:   {}", storage.visit_count()?);
    println!("Total postings: {}", storage.posting_count()?);

    let by_source = storage.postings_by_source()?;
    if !by_source.is_empty() {
        println!("\nPostings by source:");
        for (source, count) in by_source {
            println!("  {:<24} {}", source, count);
        }
    }

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(
    config: Config,
    config_hash: String,
    only_source: Option<String>,
) -> anyhow::Result<()> {
    let sources: Vec<_> = config
        .sources
        .iter()
        .filter(|s| only_source.as_deref().map_or(true, |name| s.name == name))
        .cloned()
        .collect();

    if sources.is_empty() {
        anyhow::bail!(
            "No sources to crawl{}",
            only_source
                .map(|n| format!(" (no source named '{}')", n))
                .unwrap_or_default()
        );
    }

    let mut storage = open_storage(std::path::Path::new(&config.output.database_path))?;
    let run_id = storage.create_run(&config_hash)?;
    tracing::info!("Starting crawl run {} ({} sources)", run_id, sources.len());

    let fetcher = HttpFetcher::new(
        &config.user_agent.header_value(),
        config.crawler.request_timeout_secs,
    )?;

    let (sink, mut events) = event_channel();
    let mut driver = Driver::new(fetcher, HeuristicClassifier, HtmlJobExtractor, RuleAdvisor)
        .with_events(sink);

    // One shared stop flag: ctrl-c cancels the current source and unblocks
    // any pending human handoff.
    let stop = StopHandle::new();
    {
        let stop = stop.clone();
        let login_gate = driver.login_gate();
        let captcha_gate = driver.captcha_gate();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupt received, stopping after the current action");
                stop.request_stop();
                let _ = login_gate.cancel("Stop requested");
                let _ = captcha_gate.cancel("Stop requested");
            }
        });
    }

    let limits = config.crawler.limits();
    let mut total_postings = 0usize;

    for source in &sources {
        if stop.is_stopped() {
            tracing::warn!("Stop requested, skipping remaining sources");
            break;
        }

        let mut state = CrawlState::new(source.name.as_str(), source.url.as_str(), limits.clone())?
            .with_stop_handle(stop.clone());

        let report = driver.run_source(&mut state).await;

        for posting in &report.postings {
            if storage.insert_posting(run_id, &source.name, posting)? {
                total_postings += 1;
            }
        }
        drain_events(&mut events, &mut storage, run_id, &source.name)?;

        tracing::info!(
            "Source '{}' done: {} pages, {} postings ({})",
            report.source_name,
            report.pages_visited,
            report.jobs_found,
            report.reason
        );
    }

    storage.complete_run(run_id)?;
    tracing::info!("Run {} complete: {} new postings stored", run_id, total_postings);

    Ok(())
}

/// Drains buffered crawl events, persisting visit records
fn drain_events(
    events: &mut tokio::sync::mpsc::UnboundedReceiver<CrawlEvent>,
    storage: &mut impl Storage,
    run_id: i64,
    source: &str,
) -> anyhow::Result<()> {
    let mut depths: HashMap<u64, u32> = HashMap::new();

    while let Ok(event) = events.try_recv() {
        match event {
            CrawlEvent::VisitStarted {
                capture_id, depth, ..
            } => {
                depths.insert(capture_id, depth);
            }

            CrawlEvent::VisitCompleted {
                capture_id,
                url,
                page_type,
                jobs_count,
                ..
            } => {
                let depth = depths.remove(&capture_id).unwrap_or(0);
                storage.record_visit(
                    run_id,
                    source,
                    &url,
                    depth,
                    Some(page_type.as_str()),
                    jobs_count,
                    None,
                )?;
            }

            CrawlEvent::VisitFailed {
                capture_id,
                url,
                error,
            } => {
                let depth = depths.remove(&capture_id).unwrap_or(0);
                storage.record_visit(run_id, source, &url, depth, None, 0, Some(&error))?;
            }

            _ => {}
        }
    }

    Ok(())
}
