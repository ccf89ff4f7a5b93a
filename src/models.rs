//! Data models flowing through the crawl pipeline.
//!
//! - [`CandidateItem`]: a raw listing entry, alive for one page iteration
//! - [`ArticleBody`]: what the article fetcher extracts from a detail page
//! - [`ArticleRecord`]: the normalized unit handed to a sink
//! - [`StopSignal`]: why the crawl loop ended
//! - [`CrawlReport`]: counters and timestamps for one run

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// One entry parsed from a listing page, before relevance and date checks.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CandidateItem {
    pub title: String,
    /// Absolute URL of the article page.
    pub url: String,
    pub image_url: Option<String>,
    /// Date as printed on the listing, e.g. `"07 يناير 2024"`.
    pub raw_date: Option<String>,
    /// Set by structured listings whose dates need no month-name parsing.
    pub published_at: Option<NaiveDate>,
    pub description: Option<String>,
    /// Topic labels supplied by the source itself.
    pub topics: Vec<String>,
}

/// Body text and author of one article page.
///
/// An empty `content` with no author is the degraded result of a failed fetch.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ArticleBody {
    pub content: String,
    pub author: Option<String>,
}

impl ArticleBody {
    /// True when no article text was recovered, whether or not a byline was.
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

/// The canonical output record.
///
/// Field names match the columns produced by the original collection runs
/// (`source, author, title, content, description, url, image_url,
/// published_at, tags`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleRecord {
    pub source: String,
    pub title: String,
    pub author: Option<String>,
    pub content: String,
    pub description: String,
    pub url: String,
    pub image_url: String,
    /// Serialized as `YYYY-MM-DD`.
    pub published_at: NaiveDate,
    pub tags: Vec<String>,
}

impl ArticleRecord {
    /// Combine a listing entry with its fetched body.
    pub fn assemble(
        source: &str,
        item: CandidateItem,
        body: ArticleBody,
        published_at: NaiveDate,
        tags: Vec<String>,
    ) -> Self {
        Self {
            source: source.to_string(),
            title: item.title,
            author: body.author,
            content: body.content,
            description: item.description.unwrap_or_default(),
            url: item.url,
            image_url: item.image_url.unwrap_or_default(),
            published_at,
            tags,
        }
    }
}

/// The reason a crawl stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopSignal {
    /// `max_records` records were written.
    MaxRecordsReached,
    /// A listed item was older than the boundary date.
    HistoricalBoundaryReached,
    /// The listing returned no items.
    EmptyPage,
    /// The listing could not be fetched or parsed.
    FetchExhausted,
    /// Every item on the page had already been seen in this run.
    DuplicatePage,
    /// A sink write failed while `halt_on_sink_error` was set.
    SinkFailed,
}

impl std::fmt::Display for StopSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            StopSignal::MaxRecordsReached => "max records reached",
            StopSignal::HistoricalBoundaryReached => "historical boundary reached",
            StopSignal::EmptyPage => "empty page",
            StopSignal::FetchExhausted => "listing fetch exhausted",
            StopSignal::DuplicatePage => "duplicate page",
            StopSignal::SinkFailed => "sink failed",
        };
        f.write_str(s)
    }
}

/// Summary of a finished crawl, written next to the records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrawlReport {
    pub source: String,
    pub stop: StopSignal,
    /// Cursor of the last listing page requested.
    pub last_page: Option<u64>,
    pub pages_fetched: u64,
    pub emitted: usize,
    pub dropped_irrelevant: usize,
    pub dropped_bad_date: usize,
    pub dropped_duplicate: usize,
    /// Records emitted with empty `content`, including byline-only pages.
    pub empty_bodies: usize,
    pub sink_failures: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl CrawlReport {
    pub fn new(source: &str) -> Self {
        let now = Utc::now();
        Self {
            source: source.to_string(),
            stop: StopSignal::EmptyPage,
            last_page: None,
            pages_fetched: 0,
            emitted: 0,
            dropped_irrelevant: 0,
            dropped_bad_date: 0,
            dropped_duplicate: 0,
            empty_bodies: 0,
            sink_failures: 0,
            started_at: now,
            finished_at: now,
        }
    }
}
