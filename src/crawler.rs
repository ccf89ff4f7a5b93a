//! The incremental crawl engine.
//!
//! A single sequential driver walks the listing one page at a time and fans
//! out article fetches within each page:
//!
//! 1. Fetch the listing page at the cursor. A fetch error ends the crawl with
//!    [`StopSignal::FetchExhausted`]; an empty page with [`StopSignal::EmptyPage`].
//! 2. Drop repeated URLs, irrelevant titles and unparseable dates. Items
//!    older than the boundary date are flagged, never fetched. Tags are the
//!    matched keywords followed by any topics the listing supplied.
//! 3. Fetch the surviving articles concurrently, at most
//!    `concurrency_limit` in flight, and wait for all of them.
//! 4. Write the records to the sink, counting successful writes, until
//!    `max_records` is reached.
//! 5. Stop if any condition fired, otherwise sleep `page_delay` and advance
//!    the cursor by one.
//!
//! Pages are strictly serialized: no fetch for page N+1 starts before every
//! fetch of page N has resolved.

use crate::dates::DateNormalizer;
use crate::models::{ArticleBody, ArticleRecord, CandidateItem, CrawlReport, StopSignal};
use crate::outputs::jsonl::Sink;
use crate::relevance::RelevanceFilter;
use crate::scrapers::{ArticleFetcher, ListingFetcher};
use chrono::{NaiveDate, Utc};
use futures::stream::{self, StreamExt};
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

/// Scheduler knobs, resolved from configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct CrawlSettings {
    pub source_name: String,
    pub max_records: usize,
    pub concurrency_limit: usize,
    pub boundary_date: Option<NaiveDate>,
    pub page_delay: Duration,
    pub start_page: u64,
    pub halt_on_sink_error: bool,
    pub preserve_listing_order: bool,
}

impl Default for CrawlSettings {
    fn default() -> Self {
        Self {
            source_name: "Al Hurra".to_string(),
            max_records: 10_400,
            concurrency_limit: 20,
            boundary_date: None,
            page_delay: Duration::ZERO,
            start_page: 0,
            halt_on_sink_error: false,
            preserve_listing_order: false,
        }
    }
}

/// An item that survived the pre-fetch checks.
struct Admitted {
    index: usize,
    item: CandidateItem,
    published_at: NaiveDate,
    tags: Vec<String>,
}

/// Outcome of screening one listing page.
#[derive(Default)]
struct Screened {
    admitted: Vec<Admitted>,
    boundary_hit: bool,
    all_duplicates: bool,
}

/// Drives one source from its first listing page to a stop signal.
///
/// The crawler owns its collaborators but holds no per-run state, so the
/// same instance can be run again against a fresh sink. Both fetchers are
/// generic so tests can swap in scripted fakes and `main` can wrap the
/// listing in a [`crate::retry::RetryListing`].
pub struct Crawler<L, A> {
    listing: L,
    articles: A,
    normalizer: DateNormalizer,
    filter: RelevanceFilter,
    settings: CrawlSettings,
}

impl<L, A> Crawler<L, A>
where
    L: ListingFetcher,
    A: ArticleFetcher,
{
    /// Create a crawler from its collaborators.
    ///
    /// # Arguments
    ///
    /// * `listing` - Fetches listing pages by cursor
    /// * `articles` - Fetches article bodies; never fails, degrades instead
    /// * `normalizer` - Turns raw listing dates into calendar dates
    /// * `filter` - Title keywords; an empty filter admits everything
    /// * `settings` - Record cap, concurrency, boundary and pacing
    ///
    /// # Returns
    ///
    /// A crawler ready for [`Crawler::run`].
    pub fn new(
        listing: L,
        articles: A,
        normalizer: DateNormalizer,
        filter: RelevanceFilter,
        settings: CrawlSettings,
    ) -> Self {
        Self {
            listing,
            articles,
            normalizer,
            filter,
            settings,
        }
    }

    /// The settings this crawler was built with.
    pub fn settings(&self) -> &CrawlSettings {
        &self.settings
    }

    /// Run the crawl to completion, writing records to `sink`.
    ///
    /// Always returns a report; every failure below this level is either
    /// absorbed or turned into a [`StopSignal`].
    #[instrument(level = "info", skip_all, fields(source = %self.settings.source_name))]
    pub async fn run<S: Sink>(&self, sink: &mut S) -> CrawlReport {
        let settings = &self.settings;
        let mut report = CrawlReport::new(&settings.source_name);
        let mut seen: HashSet<String> = HashSet::new();
        let mut cursor = settings.start_page;

        info!(
            max_records = settings.max_records,
            concurrency = settings.concurrency_limit,
            boundary = ?settings.boundary_date,
            keywords = self.filter.len(),
            start_page = cursor,
            "Crawl starting"
        );

        let stop = loop {
            if report.emitted >= settings.max_records {
                break StopSignal::MaxRecordsReached;
            }

            report.last_page = Some(cursor);
            let items = match self.listing.fetch_page(cursor).await {
                Ok(items) => items,
                Err(e) => {
                    error!(page = cursor, error = %e, "Listing fetch failed; aborting crawl");
                    break StopSignal::FetchExhausted;
                }
            };
            report.pages_fetched += 1;

            if items.is_empty() {
                info!(page = cursor, "Listing page is empty");
                break StopSignal::EmptyPage;
            }

            let listed = items.len();
            let screened = self.screen(items, &mut seen, &mut report);
            if screened.all_duplicates {
                warn!(page = cursor, listed, "Every item on page was already seen");
                break StopSignal::DuplicatePage;
            }

            let dispatched = screened.admitted.len();
            let completed = self.fetch_all(screened.admitted).await;
            let page_stop = self.emit(completed, sink, &mut report).await;

            info!(
                page = cursor,
                listed,
                dispatched,
                emitted = report.emitted,
                "Processed listing page"
            );

            if let Some(stop) = page_stop {
                break stop;
            }
            if screened.boundary_hit {
                break StopSignal::HistoricalBoundaryReached;
            }

            cursor += 1;
            if !settings.page_delay.is_zero() && report.emitted < settings.max_records {
                tokio::time::sleep(settings.page_delay).await;
            }
        };

        if let Err(e) = sink.finish().await {
            warn!(error = %e, "Sink failed to flush");
            report.sink_failures += 1;
        }

        report.stop = stop;
        report.finished_at = Utc::now();
        info!(
            reason = %stop,
            pages = report.pages_fetched,
            emitted = report.emitted,
            "Crawl finished"
        );
        report
    }

    /// Apply duplicate, relevance, date and boundary checks to a page.
    fn screen(
        &self,
        items: Vec<CandidateItem>,
        seen: &mut HashSet<String>,
        report: &mut CrawlReport,
    ) -> Screened {
        let mut screened = Screened::default();
        let mut fresh = 0usize;

        for (index, item) in items.into_iter().enumerate() {
            if !seen.insert(item.url.clone()) {
                debug!(url = %item.url, "Duplicate listing entry; dropping");
                report.dropped_duplicate += 1;
                continue;
            }
            fresh += 1;

            if !self.filter.matches(&item.title) {
                debug!(title = %item.title, "Irrelevant title; dropping");
                report.dropped_irrelevant += 1;
                continue;
            }

            let raw_date = item.raw_date.as_deref().unwrap_or_default();
            let parsed = match item.published_at {
                Some(date) => Ok(date),
                None => self.normalizer.normalize(raw_date),
            };
            let published_at = match parsed {
                Ok(date) => date,
                Err(e) => {
                    warn!(url = %item.url, raw_date, error = %e, "Unparseable date; dropping");
                    report.dropped_bad_date += 1;
                    continue;
                }
            };

            if let Some(boundary) = self.settings.boundary_date {
                if published_at < boundary {
                    info!(url = %item.url, %published_at, %boundary, "Item predates boundary");
                    screened.boundary_hit = true;
                    continue;
                }
            }

            let mut tags = self.filter.matched_keywords(&item.title);
            for topic in &item.topics {
                if !tags.contains(topic) {
                    tags.push(topic.clone());
                }
            }
            screened.admitted.push(Admitted {
                index,
                item,
                published_at,
                tags,
            });
        }

        screened.all_duplicates = fresh == 0;
        screened
    }

    /// Fetch every admitted article with bounded concurrency.
    ///
    /// Results come back in completion order unless listing order is
    /// requested.
    async fn fetch_all(&self, admitted: Vec<Admitted>) -> Vec<(Admitted, ArticleBody)> {
        let articles = &self.articles;
        let mut completed: Vec<(Admitted, ArticleBody)> = stream::iter(admitted)
            .map(|entry| async move {
                let body = articles.fetch_article(&entry.item.url).await;
                (entry, body)
            })
            .buffer_unordered(self.settings.concurrency_limit.max(1))
            .collect()
            .await;

        if self.settings.preserve_listing_order {
            completed.sort_by_key(|(entry, _)| entry.index);
        }
        completed
    }

    /// Write completed records, returning a stop signal if one fired.
    async fn emit<S: Sink>(
        &self,
        completed: Vec<(Admitted, ArticleBody)>,
        sink: &mut S,
        report: &mut CrawlReport,
    ) -> Option<StopSignal> {
        for (entry, body) in completed {
            if body.is_empty() {
                report.empty_bodies += 1;
            }
            let record = ArticleRecord::assemble(
                &self.settings.source_name,
                entry.item,
                body,
                entry.published_at,
                entry.tags,
            );

            match sink.write(&record).await {
                Ok(()) => {
                    report.emitted += 1;
                    debug!(url = %record.url, emitted = report.emitted, "Emitted record");
                }
                Err(e) => {
                    report.sink_failures += 1;
                    warn!(url = %record.url, error = %e, "Sink write failed");
                    if self.settings.halt_on_sink_error {
                        return Some(StopSignal::SinkFailed);
                    }
                }
            }

            if report.emitted >= self.settings.max_records {
                return Some(StopSignal::MaxRecordsReached);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dates::{DateMode, MonthTable};
    use crate::errors::{FetchError, SinkError};
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Serves scripted pages and logs every requested cursor.
    #[derive(Default)]
    struct FakeListing {
        pages: HashMap<u64, Result<Vec<CandidateItem>, FetchError>>,
        requests: Mutex<Vec<u64>>,
    }

    impl FakeListing {
        fn with_pages(pages: Vec<Vec<CandidateItem>>) -> Self {
            let pages = pages
                .into_iter()
                .enumerate()
                .map(|(i, items)| (i as u64, Ok(items)))
                .collect();
            Self {
                pages,
                requests: Mutex::new(Vec::new()),
            }
        }

        fn requests(&self) -> Vec<u64> {
            self.requests.lock().unwrap().clone()
        }
    }

    impl ListingFetcher for FakeListing {
        async fn fetch_page(&self, cursor: u64) -> Result<Vec<CandidateItem>, FetchError> {
            self.requests.lock().unwrap().push(cursor);
            self.pages.get(&cursor).cloned().unwrap_or_else(|| Ok(Vec::new()))
        }
    }

    /// Tracks calls and peak concurrency; sleeps longer for earlier URLs.
    #[derive(Default)]
    struct FakeArticles {
        calls: Mutex<Vec<String>>,
        in_flight: AtomicUsize,
        peak: AtomicUsize,
        delay_ms: u64,
        empty_for: Vec<String>,
        byline_only: Vec<String>,
    }

    impl FakeArticles {
        fn with_delay(delay_ms: u64) -> Self {
            Self {
                delay_ms,
                ..Default::default()
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn peak(&self) -> usize {
            self.peak.load(Ordering::SeqCst)
        }
    }

    impl ArticleFetcher for FakeArticles {
        async fn fetch_article(&self, url: &str) -> ArticleBody {
            self.calls.lock().unwrap().push(url.to_string());
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);

            if self.delay_ms > 0 {
                // first-listed articles finish last
                let n: u64 = url.rsplit('/').next().and_then(|s| s.parse().ok()).unwrap_or(0);
                let wait = self.delay_ms * (10 - n % 10);
                tokio::time::sleep(Duration::from_millis(wait)).await;
            }

            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            if self.empty_for.iter().any(|u| u == url) {
                return ArticleBody::default();
            }
            if self.byline_only.iter().any(|u| u == url) {
                return ArticleBody {
                    content: String::new(),
                    author: Some("الحرة".to_string()),
                };
            }
            ArticleBody {
                content: format!("body of {url}"),
                author: Some("الحرة".to_string()),
            }
        }
    }

    #[derive(Default)]
    struct VecSink {
        records: Vec<ArticleRecord>,
        fail_urls: Vec<String>,
        finished: bool,
    }

    impl Sink for VecSink {
        async fn write(&mut self, record: &ArticleRecord) -> Result<(), SinkError> {
            if self.fail_urls.contains(&record.url) {
                return Err(SinkError::Io(std::io::Error::other("disk full")));
            }
            self.records.push(record.clone());
            Ok(())
        }

        async fn finish(&mut self) -> Result<(), SinkError> {
            self.finished = true;
            Ok(())
        }
    }

    fn item(n: u32, title: &str, date: &str) -> CandidateItem {
        CandidateItem {
            title: title.to_string(),
            url: format!("https://www.alhurra.com/a/{n}"),
            image_url: None,
            raw_date: Some(date.to_string()),
            description: Some(format!("وصف {n}")),
            ..Default::default()
        }
    }

    fn dated(n: u32) -> CandidateItem {
        item(n, &format!("خبر {n}"), "07 يناير 2024")
    }

    fn settings() -> CrawlSettings {
        CrawlSettings {
            max_records: 100,
            concurrency_limit: 4,
            ..Default::default()
        }
    }

    fn crawler<'a>(
        listing: &'a FakeListing,
        articles: &'a FakeArticles,
        keywords: &[&str],
        settings: CrawlSettings,
    ) -> Crawler<&'a FakeListing, &'a FakeArticles> {
        Crawler::new(
            listing,
            articles,
            DateNormalizer::new(MonthTable::arabic(), DateMode::Strict),
            RelevanceFilter::new(keywords.iter().copied()),
            settings,
        )
    }

    #[tokio::test]
    async fn test_boundary_date_stops_after_first_page() {
        let listing = FakeListing::with_pages(vec![
            vec![
                item(1, "خبر يناير", "07 يناير 2024"),
                item(2, "خبر أكتوبر", "01 أكتوبر 2023"),
            ],
            vec![dated(3)],
        ]);
        let articles = FakeArticles::default();
        let mut sink = VecSink::default();
        let settings = CrawlSettings {
            boundary_date: NaiveDate::from_ymd_opt(2023, 10, 7),
            ..settings()
        };

        let report = crawler(&listing, &articles, &[], settings).run(&mut sink).await;

        assert_eq!(report.stop, StopSignal::HistoricalBoundaryReached);
        assert_eq!(sink.records.len(), 1);
        assert_eq!(sink.records[0].title, "خبر يناير");
        assert_eq!(sink.records[0].published_at, NaiveDate::from_ymd_opt(2024, 1, 7).unwrap());
        assert_eq!(listing.requests(), vec![0]);
        assert_eq!(articles.calls(), vec!["https://www.alhurra.com/a/1".to_string()]);
    }

    #[tokio::test]
    async fn test_boundary_day_itself_is_kept() {
        let listing = FakeListing::with_pages(vec![vec![item(1, "x", "07 أكتوبر 2023")]]);
        let articles = FakeArticles::default();
        let mut sink = VecSink::default();
        let settings = CrawlSettings {
            boundary_date: NaiveDate::from_ymd_opt(2023, 10, 7),
            ..settings()
        };

        let report = crawler(&listing, &articles, &[], settings).run(&mut sink).await;

        assert_eq!(sink.records.len(), 1);
        assert_eq!(report.stop, StopSignal::EmptyPage);
        assert_eq!(listing.requests(), vec![0, 1]);
    }

    #[tokio::test]
    async fn test_keyword_filter_avoids_irrelevant_fetches() {
        let listing = FakeListing::with_pages(vec![vec![
            item(1, "أحوال الطقس", "07 يناير 2024"),
            item(2, "بيان من حماس", "07 يناير 2024"),
            item(3, "أسعار النفط", "07 يناير 2024"),
        ]]);
        let articles = FakeArticles::default();
        let mut sink = VecSink::default();

        let report = crawler(&listing, &articles, &["حماس"], settings())
            .run(&mut sink)
            .await;

        assert_eq!(articles.calls(), vec!["https://www.alhurra.com/a/2".to_string()]);
        assert_eq!(sink.records.len(), 1);
        assert_eq!(sink.records[0].tags, vec!["حماس".to_string()]);
        assert_eq!(report.dropped_irrelevant, 2);
        assert_eq!(report.stop, StopSignal::EmptyPage);
    }

    #[tokio::test]
    async fn test_max_records_is_exact() {
        let pages: Vec<Vec<CandidateItem>> = (0..3)
            .map(|p| (0..5).map(|i| dated(p * 5 + i)).collect())
            .collect();
        let listing = FakeListing::with_pages(pages);
        let articles = FakeArticles::default();
        let mut sink = VecSink::default();
        let settings = CrawlSettings {
            max_records: 7,
            ..settings()
        };

        let report = crawler(&listing, &articles, &[], settings).run(&mut sink).await;

        assert_eq!(sink.records.len(), 7);
        assert_eq!(report.emitted, 7);
        assert_eq!(report.stop, StopSignal::MaxRecordsReached);
        assert_eq!(listing.requests(), vec![0, 1]);
    }

    #[tokio::test]
    async fn test_max_records_larger_than_available() {
        let listing = FakeListing::with_pages(vec![vec![dated(1), dated(2)], vec![dated(3)]]);
        let articles = FakeArticles::default();
        let mut sink = VecSink::default();

        let report = crawler(&listing, &articles, &[], settings()).run(&mut sink).await;

        assert_eq!(sink.records.len(), 3);
        assert_eq!(report.stop, StopSignal::EmptyPage);
        assert_eq!(listing.requests(), vec![0, 1, 2]);
        assert!(sink.finished);
    }

    #[tokio::test]
    async fn test_zero_max_records_makes_no_requests() {
        let listing = FakeListing::with_pages(vec![vec![dated(1)]]);
        let articles = FakeArticles::default();
        let mut sink = VecSink::default();
        let settings = CrawlSettings {
            max_records: 0,
            ..settings()
        };

        let report = crawler(&listing, &articles, &[], settings).run(&mut sink).await;

        assert_eq!(report.stop, StopSignal::MaxRecordsReached);
        assert!(listing.requests().is_empty());
    }

    #[tokio::test]
    async fn test_empty_first_page() {
        let listing = FakeListing::default();
        let articles = FakeArticles::default();
        let mut sink = VecSink::default();

        let report = crawler(&listing, &articles, &[], settings()).run(&mut sink).await;

        assert_eq!(report.stop, StopSignal::EmptyPage);
        assert!(sink.records.is_empty());
        assert!(articles.calls().is_empty());
        assert_eq!(report.pages_fetched, 1);
    }

    #[tokio::test]
    async fn test_listing_error_aborts_with_fetch_exhausted() {
        let mut listing = FakeListing::with_pages(vec![vec![dated(1)]]);
        listing.pages.insert(1, Err(FetchError::status(404)));
        listing.pages.insert(2, Ok(vec![dated(2)]));
        let articles = FakeArticles::default();
        let mut sink = VecSink::default();

        let report = crawler(&listing, &articles, &[], settings()).run(&mut sink).await;

        assert_eq!(report.stop, StopSignal::FetchExhausted);
        assert_eq!(sink.records.len(), 1);
        assert_eq!(listing.requests(), vec![0, 1]);
        assert_eq!(report.last_page, Some(1));
    }

    #[tokio::test]
    async fn test_unparseable_dates_are_dropped_silently() {
        let listing = FakeListing::with_pages(vec![vec![
            item(1, "a", "07 Brumaire 2024"),
            item(2, "b", "bad"),
            CandidateItem {
                raw_date: None,
                ..dated(3)
            },
            dated(4),
        ]]);
        let articles = FakeArticles::default();
        let mut sink = VecSink::default();

        let report = crawler(&listing, &articles, &[], settings()).run(&mut sink).await;

        assert_eq!(sink.records.len(), 1);
        assert_eq!(report.dropped_bad_date, 3);
        assert_eq!(articles.calls(), vec!["https://www.alhurra.com/a/4".to_string()]);
        assert_eq!(report.stop, StopSignal::EmptyPage);
    }

    #[tokio::test]
    async fn test_concurrency_limit_is_respected() {
        let listing = FakeListing::with_pages(vec![(0..12).map(dated).collect::<Vec<_>>()]);
        let articles = FakeArticles::with_delay(5);
        let mut sink = VecSink::default();
        let settings = CrawlSettings {
            concurrency_limit: 3,
            ..settings()
        };

        crawler(&listing, &articles, &[], settings).run(&mut sink).await;

        assert_eq!(sink.records.len(), 12);
        assert!(articles.peak() <= 3, "peak was {}", articles.peak());
        assert!(articles.peak() >= 2);
    }

    #[tokio::test]
    async fn test_preserve_listing_order() {
        let listing = FakeListing::with_pages(vec![(1..=6).map(dated).collect::<Vec<_>>()]);
        let articles = FakeArticles::with_delay(10);
        let mut sink = VecSink::default();
        let settings = CrawlSettings {
            concurrency_limit: 6,
            preserve_listing_order: true,
            ..settings()
        };

        crawler(&listing, &articles, &[], settings).run(&mut sink).await;

        let urls: Vec<&str> = sink.records.iter().map(|r| r.url.as_str()).collect();
        let expected: Vec<String> = (1..=6).map(|n| format!("https://www.alhurra.com/a/{n}")).collect();
        assert_eq!(urls, expected);
    }

    #[tokio::test]
    async fn test_completion_order_without_preservation() {
        let listing = FakeListing::with_pages(vec![(1..=3).map(dated).collect::<Vec<_>>()]);
        let articles = FakeArticles::with_delay(30);
        let mut sink = VecSink::default();

        crawler(&listing, &articles, &[], settings()).run(&mut sink).await;

        // a/3 sleeps the least, a/1 the most
        assert_eq!(sink.records[0].url, "https://www.alhurra.com/a/3");
        assert_eq!(sink.records[2].url, "https://www.alhurra.com/a/1");
    }

    #[tokio::test]
    async fn test_repeated_page_stops_crawl() {
        let page = vec![dated(1), dated(2)];
        let listing = FakeListing::with_pages(vec![page.clone(), page]);
        let articles = FakeArticles::default();
        let mut sink = VecSink::default();

        let report = crawler(&listing, &articles, &[], settings()).run(&mut sink).await;

        assert_eq!(report.stop, StopSignal::DuplicatePage);
        assert_eq!(sink.records.len(), 2);
        assert_eq!(report.dropped_duplicate, 2);
        assert_eq!(articles.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_partial_overlap_skips_only_repeats() {
        let listing = FakeListing::with_pages(vec![
            vec![dated(1), dated(2)],
            vec![dated(2), dated(3)],
        ]);
        let articles = FakeArticles::default();
        let mut sink = VecSink::default();

        let report = crawler(&listing, &articles, &[], settings()).run(&mut sink).await;

        assert_eq!(sink.records.len(), 3);
        assert_eq!(report.dropped_duplicate, 1);
        assert_eq!(report.stop, StopSignal::EmptyPage);
    }

    #[tokio::test]
    async fn test_sink_failure_is_not_fatal_by_default() {
        let listing = FakeListing::with_pages(vec![vec![dated(1), dated(2), dated(3)]]);
        let articles = FakeArticles::default();
        let mut sink = VecSink {
            fail_urls: vec!["https://www.alhurra.com/a/2".to_string()],
            ..Default::default()
        };

        let report = crawler(&listing, &articles, &[], settings()).run(&mut sink).await;

        assert_eq!(sink.records.len(), 2);
        assert_eq!(report.emitted, 2);
        assert_eq!(report.sink_failures, 1);
        assert_eq!(report.stop, StopSignal::EmptyPage);
    }

    #[tokio::test]
    async fn test_sink_failure_halts_when_configured() {
        let listing = FakeListing::with_pages(vec![vec![dated(1)], vec![dated(2)]]);
        let articles = FakeArticles::default();
        let mut sink = VecSink {
            fail_urls: vec!["https://www.alhurra.com/a/1".to_string()],
            ..Default::default()
        };
        let settings = CrawlSettings {
            halt_on_sink_error: true,
            ..settings()
        };

        let report = crawler(&listing, &articles, &[], settings).run(&mut sink).await;

        assert_eq!(report.stop, StopSignal::SinkFailed);
        assert!(sink.records.is_empty());
        assert_eq!(listing.requests(), vec![0]);
    }

    #[tokio::test]
    async fn test_degraded_articles_are_still_emitted() {
        let listing = FakeListing::with_pages(vec![vec![dated(1), dated(2)]]);
        let articles = FakeArticles {
            empty_for: vec!["https://www.alhurra.com/a/1".to_string()],
            ..Default::default()
        };
        let mut sink = VecSink::default();

        let report = crawler(&listing, &articles, &[], settings()).run(&mut sink).await;

        assert_eq!(sink.records.len(), 2);
        assert_eq!(report.empty_bodies, 1);
        let degraded = sink.records.iter().find(|r| r.url.ends_with("/a/1")).unwrap();
        assert_eq!(degraded.content, "");
        assert_eq!(degraded.author, None);
    }

    #[tokio::test]
    async fn test_byline_without_content_counts_as_empty_body() {
        let listing = FakeListing::with_pages(vec![vec![dated(1), dated(2)]]);
        let articles = FakeArticles {
            byline_only: vec!["https://www.alhurra.com/a/2".to_string()],
            ..Default::default()
        };
        let mut sink = VecSink::default();

        let report = crawler(&listing, &articles, &[], settings()).run(&mut sink).await;

        assert_eq!(report.emitted, 2);
        assert_eq!(report.empty_bodies, 1);
        let bare = sink.records.iter().find(|r| r.url.ends_with("/a/2")).unwrap();
        assert_eq!(bare.content, "");
        assert_eq!(bare.author.as_deref(), Some("الحرة"));
    }

    #[tokio::test]
    async fn test_max_records_wins_over_boundary_on_same_page() {
        let listing = FakeListing::with_pages(vec![
            vec![
                item(1, "خبر يناير", "07 يناير 2024"),
                item(2, "خبر أكتوبر", "01 أكتوبر 2023"),
            ],
            vec![dated(3)],
        ]);
        let articles = FakeArticles::default();
        let mut sink = VecSink::default();
        let settings = CrawlSettings {
            max_records: 1,
            boundary_date: NaiveDate::from_ymd_opt(2023, 10, 7),
            ..settings()
        };

        let report = crawler(&listing, &articles, &[], settings).run(&mut sink).await;

        assert_eq!(report.stop, StopSignal::MaxRecordsReached);
        assert_eq!(report.emitted, 1);
        assert_eq!(listing.requests(), vec![0]);
    }

    #[tokio::test]
    async fn test_sink_failure_wins_over_boundary_on_same_page() {
        let listing = FakeListing::with_pages(vec![
            vec![
                item(1, "خبر يناير", "07 يناير 2024"),
                item(2, "خبر أكتوبر", "01 أكتوبر 2023"),
            ],
            vec![dated(3)],
        ]);
        let articles = FakeArticles::default();
        let mut sink = VecSink {
            fail_urls: vec!["https://www.alhurra.com/a/1".to_string()],
            ..Default::default()
        };
        let settings = CrawlSettings {
            halt_on_sink_error: true,
            boundary_date: NaiveDate::from_ymd_opt(2023, 10, 7),
            ..settings()
        };

        let report = crawler(&listing, &articles, &[], settings).run(&mut sink).await;

        assert_eq!(report.stop, StopSignal::SinkFailed);
        assert_eq!(report.sink_failures, 1);
        assert!(sink.records.is_empty());
        assert_eq!(listing.requests(), vec![0]);
    }

    #[tokio::test]
    async fn test_structured_dates_and_topics_from_listing() {
        let listing = FakeListing::with_pages(vec![vec![
            CandidateItem {
                raw_date: Some("2024-01-07T09:30:00Z".to_string()),
                published_at: NaiveDate::from_ymd_opt(2024, 1, 7),
                topics: vec!["حرب غزة".to_string(), "حماس".to_string()],
                ..item(1, "بيان من حماس", "")
            },
            CandidateItem {
                published_at: NaiveDate::from_ymd_opt(2023, 9, 30),
                ..item(2, "حماس", "")
            },
        ]]);
        let articles = FakeArticles::default();
        let mut sink = VecSink::default();
        let settings = CrawlSettings {
            boundary_date: NaiveDate::from_ymd_opt(2023, 10, 7),
            ..settings()
        };

        let report = crawler(&listing, &articles, &["حماس"], settings).run(&mut sink).await;

        assert_eq!(report.dropped_bad_date, 0);
        assert_eq!(report.stop, StopSignal::HistoricalBoundaryReached);
        assert_eq!(sink.records.len(), 1);
        assert_eq!(sink.records[0].published_at, NaiveDate::from_ymd_opt(2024, 1, 7).unwrap());
        assert_eq!(sink.records[0].tags, vec!["حماس".to_string(), "حرب غزة".to_string()]);
    }

    #[tokio::test]
    async fn test_start_page_and_page_delay() {
        let listing = FakeListing::with_pages(vec![vec![dated(1)], vec![dated(2)], vec![dated(3)]]);
        let articles = FakeArticles::default();
        let mut sink = VecSink::default();
        let settings = CrawlSettings {
            start_page: 1,
            page_delay: Duration::from_millis(5),
            ..settings()
        };

        let started = std::time::Instant::now();
        let report = crawler(&listing, &articles, &[], settings).run(&mut sink).await;

        assert_eq!(listing.requests(), vec![1, 2, 3]);
        assert_eq!(sink.records.len(), 2);
        assert_eq!(report.stop, StopSignal::EmptyPage);
        assert!(started.elapsed() >= Duration::from_millis(10));
    }
}
