//! Listing and article fetchers.
//!
//! The crawl engine talks to an origin through two traits:
//!
//! 1. [`ListingFetcher`]: one listing page per cursor, parsed into
//!    [`CandidateItem`]s. An empty page means the listing is exhausted.
//! 2. [`ArticleFetcher`]: one article page per URL, parsed into an
//!    [`ArticleBody`]. Never fails; a broken fetch yields an empty body.
//!
//! # Supported Sources
//!
//! | Source | Module | Listing | Notes |
//! |--------|--------|---------|-------|
//! | Al Hurra | [`alhurra`] | HTML search results, `page` cursor | Reverse-chronological |
//! | Sky News Arabia | [`skynews`] | JSON search API, `offset` = start + cursor × 12 | No article fetch; 2 s between pages by default |
//!
//! Fetchers hold no crawl state. Concurrency is bounded by the caller.

use crate::errors::FetchError;
use crate::models::{ArticleBody, CandidateItem};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub mod alhurra;
pub mod skynews;

/// Which origin to crawl.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    #[default]
    #[value(name = "alhurra")]
    AlHurra,
    #[value(name = "skynews")]
    SkyNews,
}

impl Source {
    /// Value of the `source` field on every record.
    pub fn display_name(self) -> &'static str {
        match self {
            Source::AlHurra => "Al Hurra",
            Source::SkyNews => "Sky News Arabic",
        }
    }

    pub fn default_base_url(self) -> &'static str {
        match self {
            Source::AlHurra => "https://www.alhurra.com",
            Source::SkyNews => "https://api.skynewsarabia.com",
        }
    }

    /// Pause between listing pages when none is configured.
    pub fn default_page_delay(self) -> Duration {
        match self {
            Source::AlHurra => Duration::ZERO,
            Source::SkyNews => Duration::from_secs(2),
        }
    }
}

/// Retrieves one listing page.
pub trait ListingFetcher {
    async fn fetch_page(&self, cursor: u64) -> Result<Vec<CandidateItem>, FetchError>;
}

/// Retrieves one article body.
pub trait ArticleFetcher {
    async fn fetch_article(&self, url: &str) -> ArticleBody;
}

impl<T: ListingFetcher> ListingFetcher for &T {
    async fn fetch_page(&self, cursor: u64) -> Result<Vec<CandidateItem>, FetchError> {
        (**self).fetch_page(cursor).await
    }
}

impl<T: ArticleFetcher> ArticleFetcher for &T {
    async fn fetch_article(&self, url: &str) -> ArticleBody {
        (**self).fetch_article(url).await
    }
}

/// Article fetcher for listings that already carry everything a record
/// needs. Makes no request and returns an empty body.
#[derive(Debug, Clone, Copy, Default)]
pub struct ListingOnly;

impl ArticleFetcher for ListingOnly {
    async fn fetch_article(&self, _url: &str) -> ArticleBody {
        ArticleBody::default()
    }
}

/// Shared HTTP client with a per-request timeout.
pub fn http_client(timeout: Duration) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()
}
