//! Crawl configuration.
//!
//! Values are layered: built-in defaults, then an optional YAML file, then
//! command-line flags. `source_name`, `base_url` and `page_delay_ms` default
//! per [`Source`] when left out.
//!
//! ```yaml
//! source: alhurra
//! source_name: Al Hurra
//! base_url: https://www.alhurra.com
//! max_records: 50000
//! concurrency_limit: 100
//! boundary_date: 2023-10-07
//! relevance_keywords: []
//! page_delay_ms: 0
//! request_timeout_secs: 30
//! date_mode: strict
//! ```

use crate::cli::Cli;
use crate::crawler::CrawlSettings;
use crate::dates::{DateMode, DateNormalizer, MonthLocale, MonthTable};
use crate::errors::ConfigError;
use crate::relevance::{DEFAULT_KEYWORDS, RelevanceFilter};
use crate::scrapers::Source;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::fs;
use tracing::{debug, info, instrument};
use url::Url;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CrawlConfig {
    pub source: Source,
    /// Constant `source` field of every record.
    pub source_name: Option<String>,
    pub base_url: Option<String>,
    /// Search text for query-driven listings (Sky News).
    pub search_query: String,
    /// Item offset of the first Sky News page.
    pub start_offset: u64,
    pub max_records: usize,
    /// Maximum article fetches in flight.
    pub concurrency_limit: usize,
    pub boundary_date: Option<NaiveDate>,
    pub relevance_keywords: Vec<String>,
    pub use_default_keywords: bool,
    pub page_delay_ms: Option<u64>,
    pub request_timeout_secs: u64,
    pub date_mode: DateMode,
    pub month_locale: MonthLocale,
    pub start_page: u64,
    pub listing_retries: usize,
    pub retry_base_delay_ms: u64,
    pub halt_on_sink_error: bool,
    pub preserve_listing_order: bool,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            source: Source::AlHurra,
            source_name: None,
            base_url: None,
            search_query: "حماس".to_string(),
            start_offset: 0,
            max_records: 10_400,
            concurrency_limit: 20,
            boundary_date: None,
            relevance_keywords: Vec::new(),
            use_default_keywords: false,
            page_delay_ms: None,
            request_timeout_secs: 30,
            date_mode: DateMode::Strict,
            month_locale: MonthLocale::Arabic,
            start_page: 0,
            listing_retries: 3,
            retry_base_delay_ms: 1000,
            halt_on_sink_error: false,
            preserve_listing_order: false,
        }
    }
}

impl CrawlConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Read the YAML file at `path`, or fall back to defaults.
    #[instrument(level = "info")]
    pub async fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            debug!("No config file given; using defaults");
            return Ok(Self::default());
        };
        let yaml = fs::read_to_string(path).await.map_err(|source| ConfigError::Io {
            path: path.to_string(),
            source,
        })?;
        let config = Self::from_yaml_str(&yaml)?;
        info!(path, "Loaded configuration");
        Ok(config)
    }

    /// Overlay values given on the command line.
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(source) = cli.source {
            self.source = source;
        }
        if let Some(query) = &cli.query {
            self.search_query = query.clone();
        }
        if let Some(base_url) = &cli.base_url {
            self.base_url = Some(base_url.clone());
        }
        if let Some(n) = cli.max_records {
            self.max_records = n;
        }
        if let Some(n) = cli.concurrency {
            self.concurrency_limit = n;
        }
        if cli.boundary_date.is_some() {
            self.boundary_date = cli.boundary_date;
        }
        if !cli.keywords.is_empty() {
            self.relevance_keywords = cli.keywords.clone();
        }
        if cli.page_delay_ms.is_some() {
            self.page_delay_ms = cli.page_delay_ms;
        }
        if let Some(secs) = cli.request_timeout_secs {
            self.request_timeout_secs = secs;
        }
        if let Some(mode) = cli.date_mode {
            self.date_mode = mode;
        }
        if let Some(locale) = cli.month_locale {
            self.month_locale = locale;
        }
        if let Some(page) = cli.start_page {
            self.start_page = page;
        }
        if let Some(n) = cli.listing_retries {
            self.listing_retries = n;
        }
        self.use_default_keywords |= cli.default_keywords;
        self.halt_on_sink_error |= cli.halt_on_sink_error;
        self.preserve_listing_order |= cli.preserve_order;
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.concurrency_limit == 0 {
            return Err(ConfigError::Invalid("concurrency_limit must be at least 1".into()));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid("request_timeout_secs must be at least 1".into()));
        }
        if self.source_name().trim().is_empty() {
            return Err(ConfigError::Invalid("source_name must not be empty".into()));
        }
        self.parsed_base_url()?;
        Ok(())
    }

    pub fn source_name(&self) -> &str {
        self.source_name
            .as_deref()
            .unwrap_or(self.source.display_name())
    }

    pub fn base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or(self.source.default_base_url())
    }

    pub fn parsed_base_url(&self) -> Result<Url, ConfigError> {
        Url::parse(self.base_url())
            .map_err(|e| ConfigError::Invalid(format!("base_url {:?}: {e}", self.base_url())))
    }

    /// Configured pause between listing pages, else the source's default.
    pub fn page_delay(&self) -> Duration {
        self.page_delay_ms
            .map(Duration::from_millis)
            .unwrap_or_else(|| self.source.default_page_delay())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn retry_base_delay(&self) -> Duration {
        Duration::from_millis(self.retry_base_delay_ms)
    }

    /// Explicit keywords first, then the built-in list if enabled.
    pub fn relevance_filter(&self) -> RelevanceFilter {
        let defaults = self
            .use_default_keywords
            .then_some(DEFAULT_KEYWORDS)
            .unwrap_or_default()
            .iter()
            .map(|k| k.to_string());
        RelevanceFilter::new(self.relevance_keywords.iter().cloned().chain(defaults))
    }

    pub fn date_normalizer(&self) -> DateNormalizer {
        DateNormalizer::new(MonthTable::for_locale(self.month_locale), self.date_mode)
    }

    pub fn settings(&self) -> CrawlSettings {
        CrawlSettings {
            source_name: self.source_name().to_string(),
            max_records: self.max_records,
            concurrency_limit: self.concurrency_limit,
            boundary_date: self.boundary_date,
            page_delay: self.page_delay(),
            start_page: self.start_page,
            halt_on_sink_error: self.halt_on_sink_error,
            preserve_listing_order: self.preserve_listing_order,
        }
    }
}
