//! Al Hurra search listing and article scraper.
//!
//! The listing is the site's search page sorted by publication time, which
//! serves teasers newest first, one page per zero-based `page` parameter:
//!
//! ```text
//! https://www.alhurra.com/search?search_api_fulltext=&type=2&sort_by=publication_time&changed=All&_wrapper_format=html&page=0
//! ```
//!
//! Teaser dates are printed as `"07 يناير 2024"`; article pages carry the
//! body in `.article__body` and the byline in `.page-header__meta-item`.

use super::{ArticleFetcher, ListingFetcher};
use crate::errors::FetchError;
use crate::models::{ArticleBody, CandidateItem};
use crate::utils::{collapse_whitespace, truncate_for_log};
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info, instrument, warn};
use url::Url;

const LISTING_PARAMS: [(&str, &str); 5] = [
    ("search_api_fulltext", ""),
    ("type", "2"),
    ("sort_by", "publication_time"),
    ("changed", "All"),
    ("_wrapper_format", "html"),
];

static TEASER: Lazy<Selector> = Lazy::new(|| Selector::parse("div.teaser.teaser--dated").unwrap());
static TEASER_TITLE: Lazy<Selector> = Lazy::new(|| Selector::parse("h2.teaser__title").unwrap());
static TEASER_LINK: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a.teaser__title-link[href]").unwrap());
static TEASER_DATE: Lazy<Selector> = Lazy::new(|| Selector::parse("div.teaser__date").unwrap());
static TEASER_TEXT: Lazy<Selector> = Lazy::new(|| Selector::parse("div.teaser__text").unwrap());
static TEASER_IMAGE: Lazy<Selector> =
    Lazy::new(|| Selector::parse("img.media__element[src]").unwrap());
static ARTICLE_BODY: Lazy<Selector> = Lazy::new(|| Selector::parse("div.article__body").unwrap());
static PARAGRAPH: Lazy<Selector> = Lazy::new(|| Selector::parse("p").unwrap());
static META_ITEM: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div.page-header__meta-item").unwrap());

fn element_text(element: ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<String>())
}

fn first_text(parent: ElementRef<'_>, selector: &Selector) -> Option<String> {
    parent
        .select(selector)
        .next()
        .map(element_text)
        .filter(|t| !t.is_empty())
}

/// Parse a search results page into candidate items.
///
/// Teasers without a title or link are skipped.
pub fn parse_listing(html: &str, base: &Url) -> Vec<CandidateItem> {
    let document = Html::parse_document(html);
    let mut items = Vec::new();

    for teaser in document.select(&TEASER) {
        let Some(title) = first_text(teaser, &TEASER_TITLE) else {
            debug!("Teaser without title; skipping");
            continue;
        };
        let Some(url) = teaser
            .select(&TEASER_LINK)
            .next()
            .and_then(|a| a.value().attr("href"))
            .and_then(|href| base.join(href).ok())
        else {
            debug!(%title, "Teaser without usable link; skipping");
            continue;
        };
        let image_url = teaser
            .select(&TEASER_IMAGE)
            .next()
            .and_then(|img| img.value().attr("src"))
            .and_then(|src| base.join(src).ok())
            .map(String::from);

        items.push(CandidateItem {
            title,
            url: url.to_string(),
            image_url,
            raw_date: first_text(teaser, &TEASER_DATE),
            description: first_text(teaser, &TEASER_TEXT),
            ..Default::default()
        });
    }

    items
}

/// Parse an article page into its body text and author.
///
/// Missing regions produce an empty body or no author rather than an error.
pub fn parse_article(html: &str) -> ArticleBody {
    let document = Html::parse_document(html);

    let content = document
        .select(&ARTICLE_BODY)
        .next()
        .map(|body| {
            body.select(&PARAGRAPH)
                .map(element_text)
                .filter(|p| !p.is_empty())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .unwrap_or_default();

    let author = document
        .select(&META_ITEM)
        .next()
        .map(element_text)
        .and_then(|meta| meta.rsplit(':').next().map(|a| a.trim().to_string()))
        .filter(|a| !a.is_empty());

    ArticleBody { content, author }
}

/// Listing fetcher for `{base_url}/search`.
#[derive(Debug, Clone)]
pub struct AlHurraListing {
    client: reqwest::Client,
    base_url: Url,
}

impl AlHurraListing {
    /// # Arguments
    ///
    /// * `client` - Shared HTTP client, already carrying the request timeout
    /// * `base_url` - Site root; `/search` is joined onto it
    pub fn new(client: reqwest::Client, base_url: Url) -> Self {
        Self { client, base_url }
    }

    fn search_url(&self) -> Result<Url, FetchError> {
        self.base_url
            .join("/search")
            .map_err(|e| FetchError::parse(format!("invalid base url: {e}")))
    }
}

impl ListingFetcher for AlHurraListing {
    #[instrument(level = "info", skip_all, fields(page = cursor))]
    async fn fetch_page(&self, cursor: u64) -> Result<Vec<CandidateItem>, FetchError> {
        let html = self
            .client
            .get(self.search_url()?)
            .query(&LISTING_PARAMS)
            .query(&[("page", cursor)])
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let items = parse_listing(&html, &self.base_url);
        info!(count = items.len(), "Parsed Al Hurra listing page");
        if items.is_empty() {
            debug!(body = %truncate_for_log(&html, 300), "Listing page has no teasers");
        }
        Ok(items)
    }
}

/// Article fetcher for Al Hurra detail pages.
#[derive(Debug, Clone)]
pub struct AlHurraArticles {
    client: reqwest::Client,
}

impl AlHurraArticles {
    /// Article URLs are absolute, so only the client is needed.
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    async fn try_fetch_article(&self, url: &str) -> Result<ArticleBody, FetchError> {
        let html = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        Ok(parse_article(&html))
    }
}

impl ArticleFetcher for AlHurraArticles {
    #[instrument(level = "debug", skip_all, fields(%url))]
    async fn fetch_article(&self, url: &str) -> ArticleBody {
        match self.try_fetch_article(url).await {
            Ok(body) => {
                debug!(bytes = body.content.len(), author = ?body.author, "Parsed Al Hurra article");
                body
            }
            Err(e) => {
                warn!(error = %e, %url, "Article fetch failed; keeping record with empty body");
                ArticleBody::default()
            }
        }
    }
}
