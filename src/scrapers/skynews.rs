//! Sky News Arabia search API.
//!
//! The listing is a JSON document paged by item offset rather than page
//! number. Each entry already carries headline, summary, share URL, image
//! and publication date, so no article page is fetched.

use crate::errors::FetchError;
use crate::models::CandidateItem;
use crate::scrapers::ListingFetcher;
use crate::utils::truncate_for_log;
use chrono::{DateTime, NaiveDate};
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Items per search page; the API's own paging unit.
pub const PAGE_SIZE: u64 = 12;

const IMAGE_WIDTH: &str = "800";
const IMAGE_HEIGHT: &str = "450";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchPage {
    #[serde(default)]
    content_items: Vec<ContentItem>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ContentItem {
    headline: String,
    summary: Option<String>,
    share_url: String,
    media_asset: Option<MediaAsset>,
    date: Option<ItemDate>,
    topic_title: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct MediaAsset {
    image_url: Option<String>,
}

/// The API has served both ISO timestamps and epoch milliseconds.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ItemDate {
    Text(String),
    Millis(i64),
}

impl ItemDate {
    fn raw(&self) -> String {
        match self {
            ItemDate::Text(s) => s.clone(),
            ItemDate::Millis(ms) => ms.to_string(),
        }
    }

    fn to_date(&self) -> Option<NaiveDate> {
        match self {
            ItemDate::Text(s) => DateTime::parse_from_rfc3339(s)
                .map(|d| d.date_naive())
                .ok()
                .or_else(|| NaiveDate::parse_from_str(s.get(..10)?, "%Y-%m-%d").ok()),
            ItemDate::Millis(ms) => DateTime::from_timestamp_millis(*ms).map(|d| d.date_naive()),
        }
    }
}

/// Fill the `{width}`/`{height}` placeholders of an image template.
fn sized_image(template: &str) -> String {
    template
        .replace("{width}", IMAGE_WIDTH)
        .replace("{height}", IMAGE_HEIGHT)
}

/// Parse one search response into candidate items.
///
/// A missing or empty `contentItems` array yields an empty page. Entries
/// without a headline or share URL are skipped.
///
/// # Arguments
///
/// * `json` - Raw response body
///
/// # Returns
///
/// The candidate items in response order, or a permanent parse error if the
/// body is not the expected JSON object.
pub fn parse_listing(json: &str) -> Result<Vec<CandidateItem>, FetchError> {
    let page: SearchPage = serde_json::from_str(json)
        .map_err(|e| FetchError::parse(format!("search response: {e}")))?;

    let items = page
        .content_items
        .into_iter()
        .filter_map(|entry| {
            let title = entry.headline.trim().to_string();
            if title.is_empty() || entry.share_url.is_empty() {
                warn!(url = %entry.share_url, "Search entry missing headline or share URL; skipping");
                return None;
            }
            let image_url = entry
                .media_asset
                .and_then(|m| m.image_url)
                .filter(|u| !u.is_empty())
                .map(|u| sized_image(&u));

            Some(CandidateItem {
                title,
                url: entry.share_url,
                image_url,
                raw_date: entry.date.as_ref().map(ItemDate::raw),
                published_at: entry.date.as_ref().and_then(ItemDate::to_date),
                description: entry.summary.filter(|s| !s.is_empty()),
                topics: entry.topic_title.filter(|t| !t.is_empty()).into_iter().collect(),
            })
        })
        .collect();
    Ok(items)
}

/// Listing fetcher for the Sky News Arabia text search.
#[derive(Debug, Clone)]
pub struct SkyNewsListing {
    client: reqwest::Client,
    base_url: Url,
    query: String,
    start_offset: u64,
}

impl SkyNewsListing {
    /// # Arguments
    ///
    /// * `client` - Shared HTTP client
    /// * `base_url` - API root, e.g. `https://api.skynewsarabia.com`
    /// * `query` - Search text sent as `q`
    /// * `start_offset` - Item offset of cursor 0
    pub fn new(client: reqwest::Client, base_url: Url, query: impl Into<String>, start_offset: u64) -> Self {
        Self {
            client,
            base_url,
            query: query.into(),
            start_offset,
        }
    }

    /// Item offset requested for a page cursor.
    pub fn offset(&self, cursor: u64) -> u64 {
        self.start_offset + cursor * PAGE_SIZE
    }

    fn search_url(&self) -> Result<Url, FetchError> {
        self.base_url
            .join("/rest/v2/search/text.json")
            .map_err(|e| FetchError::parse(format!("invalid base url: {e}")))
    }
}

impl ListingFetcher for SkyNewsListing {
    #[instrument(level = "info", skip_all, fields(page = cursor, offset = self.offset(cursor)))]
    async fn fetch_page(&self, cursor: u64) -> Result<Vec<CandidateItem>, FetchError> {
        let offset = self.offset(cursor).to_string();
        let page_size = PAGE_SIZE.to_string();
        let body = self
            .client
            .get(self.search_url()?)
            .query(&[
                ("deviceType", "MOBILE"),
                ("from", ""),
                ("offset", offset.as_str()),
                ("pageSize", page_size.as_str()),
                ("q", self.query.as_str()),
                ("showEpisodes", "true"),
                ("sort", "RELEVANCE"),
                ("supportsInfographic", "true"),
                ("to", ""),
            ])
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let items = parse_listing(&body).inspect_err(|e| {
            debug!(error = %e, body = %truncate_for_log(&body, 300), "Unreadable search response");
        })?;
        info!(count = items.len(), "Parsed Sky News search page");
        Ok(items)
    }
}
