//! Command-line interface definitions.
//!
//! Every crawl option can also come from the YAML file passed with
//! `--config`; flags given on the command line win.

use crate::dates::{DateMode, MonthLocale};
use crate::scrapers::Source;
use chrono::NaiveDate;
use clap::Parser;

/// Command-line arguments for the news crawler.
///
/// # Examples
///
/// ```sh
/// # Everything since 7 October 2023, no keyword filter
/// news_crawl -o ./out --boundary-date 2023-10-07
///
/// # Keyword-filtered crawl with the built-in tag list, capped at 10400 records
/// news_crawl -o ./out --default-keywords --max-records 10400
///
/// # Settings from a file, one override
/// news_crawl -o ./out -c crawl.yaml --concurrency 50
///
/// # Sky News Arabia search results for a query
/// news_crawl -o ./out --source skynews --query غزة
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Output directory for the JSON Lines records and the run report
    #[arg(short, long)]
    pub output_dir: String,

    /// Optional path to a YAML crawl configuration
    #[arg(short, long)]
    pub config: Option<String>,

    /// Which news source to crawl
    #[arg(long, value_enum)]
    pub source: Option<Source>,

    /// Search text for sources with a query-driven listing
    #[arg(long)]
    pub query: Option<String>,

    /// Origin base URL
    #[arg(long, env = "NEWS_CRAWL_BASE_URL")]
    pub base_url: Option<String>,

    /// Stop after this many records have been written
    #[arg(long)]
    pub max_records: Option<usize>,

    /// Maximum number of article fetches in flight at once
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Stop once an item published before this date (YYYY-MM-DD) is listed
    #[arg(long)]
    pub boundary_date: Option<NaiveDate>,

    /// Relevance keyword; repeat for several. None means no filtering
    #[arg(short = 'k', long = "keyword")]
    pub keywords: Vec<String>,

    /// Add the built-in keyword list to the relevance filter
    #[arg(long)]
    pub default_keywords: bool,

    /// Pause between listing pages, in milliseconds
    #[arg(long)]
    pub page_delay_ms: Option<u64>,

    /// Per-request timeout, in seconds
    #[arg(long)]
    pub request_timeout_secs: Option<u64>,

    /// What to do with unknown month names
    #[arg(long, value_enum)]
    pub date_mode: Option<DateMode>,

    /// Month name table used to parse listing dates
    #[arg(long, value_enum)]
    pub month_locale: Option<MonthLocale>,

    /// Listing page to start from
    #[arg(long)]
    pub start_page: Option<u64>,

    /// Retries for transient listing failures
    #[arg(long)]
    pub listing_retries: Option<usize>,

    /// Stop the crawl on the first failed record write
    #[arg(long)]
    pub halt_on_sink_error: bool,

    /// Emit each page's records in listing order instead of completion order
    #[arg(long)]
    pub preserve_order: bool,
}
