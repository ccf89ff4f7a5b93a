//! Exponential backoff for listing fetches.
//!
//! [`RetryListing`] wraps any [`ListingFetcher`] and retries transient
//! failures (timeouts, connect errors, 5xx, 429). Permanent failures and the
//! last transient failure are returned unchanged, so the crawl engine's
//! contract does not change.
//!
//! # Backoff Strategy
//!
//! ```text
//! delay = min(base_delay * 2^(attempt-1), max_delay) + random_jitter(0..=max_jitter)
//! ```

use crate::errors::FetchError;
use crate::models::CandidateItem;
use crate::scrapers::ListingFetcher;
use rand::{Rng, rng};
use std::fmt;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{error, instrument, warn};

/// Decorator that adds retry with exponential backoff to a listing fetcher.
pub struct RetryListing<T> {
    inner: T,
    max_retries: usize,
    base_delay: Duration,
    max_delay: Duration,
    max_jitter: Duration,
}

impl<T> RetryListing<T>
where
    T: ListingFetcher,
{
    /// Wrap `inner` with `max_retries` extra attempts, starting at `base_delay`.
    ///
    /// ```ignore
    /// let listing = RetryListing::new(AlHurraListing::new(client, base), 3, Duration::from_secs(1));
    /// ```
    pub fn new(inner: T, max_retries: usize, base_delay: Duration) -> Self {
        Self {
            inner,
            max_retries,
            base_delay,
            max_delay: Duration::from_secs(30),
            max_jitter: Duration::from_millis(250),
        }
    }

    pub fn with_max_jitter(mut self, max_jitter: Duration) -> Self {
        self.max_jitter = max_jitter;
        self
    }

    fn backoff(&self, attempt: usize) -> Duration {
        let shift = (attempt.saturating_sub(1)).min(31) as u32;
        let delay = self.base_delay.saturating_mul(1 << shift).min(self.max_delay);
        let jitter_ms = self.max_jitter.as_millis() as u64;
        let jitter = if jitter_ms == 0 {
            0
        } else {
            rng().random_range(0..=jitter_ms)
        };
        delay + Duration::from_millis(jitter)
    }
}

impl<T> fmt::Debug for RetryListing<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryListing")
            .field("max_retries", &self.max_retries)
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .finish()
    }
}

impl<T> ListingFetcher for RetryListing<T>
where
    T: ListingFetcher,
{
    #[instrument(level = "info", skip_all, fields(page = cursor))]
    async fn fetch_page(&self, cursor: u64) -> Result<Vec<CandidateItem>, FetchError> {
        let total_t0 = Instant::now();
        let mut attempt = 0usize;

        loop {
            match self.inner.fetch_page(cursor).await {
                Ok(items) => return Ok(items),
                Err(e) if !e.transient => return Err(e),
                Err(e) => {
                    attempt += 1;
                    let total_dt = total_t0.elapsed();

                    if attempt > self.max_retries {
                        error!(
                            attempt,
                            max = self.max_retries,
                            elapsed_ms_total = total_dt.as_millis(),
                            error = %e,
                            "Listing fetch exhausted retries"
                        );
                        return Err(e);
                    }

                    let delay = self.backoff(attempt);
                    warn!(
                        attempt,
                        max = self.max_retries,
                        elapsed_ms_total = total_dt.as_millis(),
                        ?delay,
                        error = %e,
                        "Listing fetch failed; backing off"
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}
