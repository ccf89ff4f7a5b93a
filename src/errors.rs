//! Error taxonomy for the crawl pipeline.
//!
//! Each failure domain gets its own type so callers can apply the right
//! policy without string matching:
//!
//! | Error | Raised by | Crawl policy |
//! |-------|-----------|--------------|
//! | [`FetchError`] | listing and article fetchers | listing: abort with `FetchExhausted`; article: degrade to an empty body |
//! | [`NormalizationError`] | [`crate::dates::DateNormalizer`] | drop the single item |
//! | [`SinkError`] | [`crate::outputs::jsonl::Sink`] implementations | log and continue, unless halting is configured |
//! | [`ConfigError`] | [`crate::config`] | abort at startup |

use thiserror::Error;

/// What went wrong while retrieving or parsing a remote document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchErrorKind {
    /// Connection, TLS, body read or timeout failure.
    #[error("transport error: {0}")]
    Transport(String),
    /// The origin answered with a non-2xx status.
    #[error("unexpected HTTP status {0}")]
    Status(u16),
    /// The document did not have the expected shape.
    #[error("parse error: {0}")]
    Parse(String),
}

/// A failed network retrieval.
///
/// `transient` tells retry decorators whether another attempt may succeed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}{}", transient_suffix(.transient))]
pub struct FetchError {
    pub kind: FetchErrorKind,
    pub transient: bool,
}

fn transient_suffix(transient: &bool) -> &'static str {
    if *transient { " (transient)" } else { "" }
}

impl FetchError {
    pub fn parse(msg: impl Into<String>) -> Self {
        Self {
            kind: FetchErrorKind::Parse(msg.into()),
            transient: false,
        }
    }

    /// 5xx and 429 are worth retrying; any other status is final.
    pub fn status(code: u16) -> Self {
        Self {
            kind: FetchErrorKind::Status(code),
            transient: code == 429 || (500..600).contains(&code),
        }
    }

    pub fn transport(msg: impl Into<String>, transient: bool) -> Self {
        Self {
            kind: FetchErrorKind::Transport(msg.into()),
            transient,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if let Some(status) = e.status() {
            return FetchError::status(status.as_u16());
        }
        let transient = e.is_timeout() || e.is_connect() || e.is_request() || e.is_body();
        FetchError::transport(e.to_string(), transient)
    }
}

/// Why a raw listing date could not be turned into a calendar date.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizationError {
    #[error("expected 3 tokens (day month year), got {0}")]
    TokenCount(usize),
    #[error("day token {0:?} is not a number")]
    InvalidDay(String),
    #[error("year token {0:?} is not a number")]
    InvalidYear(String),
    #[error("unknown month name {0:?}")]
    UnknownMonth(String),
    #[error("{year}-{month:02}-{day:02} is not a calendar date")]
    InvalidDate { year: i32, month: u32, day: u32 },
}

/// A downstream write failure.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("sink I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("record serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Invalid or unreadable configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("could not parse config file: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}
