//! # News Crawl
//!
//! Incrementally ingests a paginated, reverse-chronological news listing
//! into normalized article records.
//!
//! ## Features
//!
//! - Walks the Al Hurra search listing page by page, or the Sky News Arabia
//!   search API offset by offset
//! - Drops items whose titles miss the configured keywords before fetching them
//! - Parses locale-specific listing dates (`"07 يناير 2024"`) in strict or lenient mode
//! - Stops at a historical boundary date, a record cap, an empty or repeated page
//! - Fetches article bodies concurrently with a configurable in-flight limit
//! - Appends records to a JSON Lines file and writes a run report
//!
//! ## Usage
//!
//! ```sh
//! news_crawl -o ./out --boundary-date 2023-10-07 --concurrency 50
//! ```
//!
//! ## Architecture
//!
//! 1. **Listing**: fetch one listing page (retried on transient failures)
//! 2. **Screening**: drop duplicates, irrelevant titles, bad dates; flag the boundary
//! 3. **Fetching**: download the surviving articles, bounded concurrency
//! 4. **Output**: append records to the sink, then write the report

use clap::Parser;
use std::error::Error;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;
mod config;
mod crawler;
mod dates;
mod errors;
mod models;
mod outputs;
mod relevance;
mod retry;
mod scrapers;
mod utils;

use cli::Cli;
use config::CrawlConfig;
use crawler::Crawler;
use models::CrawlReport;
use outputs::json;
use outputs::jsonl::JsonLinesSink;
use retry::RetryListing;
use scrapers::alhurra::{AlHurraArticles, AlHurraListing};
use scrapers::skynews::SkyNewsListing;
use scrapers::{ArticleFetcher, ListingFetcher, ListingOnly, Source};
use utils::{ensure_writable_dir, slugify};

/// Build a crawler around the given fetchers and run it against `sink`.
async fn crawl<L, A>(
    listing: L,
    articles: A,
    config: &CrawlConfig,
    sink: &mut JsonLinesSink,
) -> CrawlReport
where
    L: ListingFetcher,
    A: ArticleFetcher,
{
    let crawler = Crawler::new(
        RetryListing::new(listing, config.listing_retries, config.retry_base_delay()),
        articles,
        config.date_normalizer(),
        config.relevance_filter(),
        config.settings(),
    );
    debug!(settings = ?crawler.settings(), "Crawler ready");
    crawler.run(sink).await
}

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("news_crawl starting up");

    // Parse CLI
    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    // ---- Configuration ----
    let mut config = CrawlConfig::load(args.config.as_deref()).await?;
    config.apply_cli(&args);
    if let Err(e) = config.validate() {
        error!(error = %e, "Invalid configuration");
        return Err(e.into());
    }
    info!(
        source = %config.source_name(),
        base_url = %config.base_url(),
        max_records = config.max_records,
        concurrency = config.concurrency_limit,
        boundary = ?config.boundary_date,
        date_mode = ?config.date_mode,
        "Configuration resolved"
    );

    // Early check: ensure output dir is writable
    if let Err(e) = ensure_writable_dir(&args.output_dir).await {
        error!(
            path = %args.output_dir,
            error = %e,
            "Output directory is not writable (fix perms or choose a different path)"
        );
        return Err(e);
    }

    // ---- Fetchers and sink ----
    let client = scrapers::http_client(config.request_timeout())?;
    let base_url = config.parsed_base_url()?;

    let records_path = format!(
        "{}/{}.jsonl",
        args.output_dir.trim_end_matches('/'),
        slugify(config.source_name())
    );
    let mut sink = JsonLinesSink::open(&records_path).await?;

    // ---- Crawl ----
    let report = match config.source {
        Source::AlHurra => {
            let listing = AlHurraListing::new(client.clone(), base_url);
            crawl(listing, AlHurraArticles::new(client), &config, &mut sink).await
        }
        Source::SkyNews => {
            let listing =
                SkyNewsListing::new(client, base_url, &config.search_query, config.start_offset);
            crawl(listing, ListingOnly, &config, &mut sink).await
        }
    };

    info!(
        path = %sink.path().display(),
        written = sink.written(),
        "Records written"
    );

    // ---- Report ----
    if let Err(e) = json::write_report(&report, &args.output_dir).await {
        error!(error = %e, "Failed to write crawl report");
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        reason = %report.stop,
        pages = report.pages_fetched,
        emitted = report.emitted,
        dropped_irrelevant = report.dropped_irrelevant,
        dropped_bad_date = report.dropped_bad_date,
        dropped_duplicate = report.dropped_duplicate,
        empty_bodies = report.empty_bodies,
        sink_failures = report.sink_failures,
        "Execution complete"
    );

    Ok(())
}
