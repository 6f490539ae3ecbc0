//! Error types shared by the crawler, the item pipeline and the exporter.
use std::fmt;
use thiserror::Error;

/// Why the pipeline refused to export a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DropReason {
    InvalidBoilerplate,
    TooShort,
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DropReason::InvalidBoilerplate => write!(f, "invalid boilerplate"),
            DropReason::TooShort => write!(f, "too short"),
        }
    }
}

#[derive(Debug, Error)]
pub enum CrawlError {
    /// The url lacks the team or year segment a content page must carry.
    #[error("malformed url: {0}")]
    MalformedUrl(String),

    #[error("failed to fetch {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} answered with status {status}")]
    HttpStatus { url: String, status: u16 },

    /// Expected control flow, not a failure: the record is simply not exported.
    #[error("dropped item: {reason}")]
    DroppedItem { reason: DropReason },

    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("output error: {0}")]
    Output(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("summarizer error: {0}")]
    Summarize(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl CrawlError {
    pub fn dropped(reason: DropReason) -> Self {
        CrawlError::DroppedItem { reason }
    }
}

pub type Result<T> = std::result::Result<T, CrawlError>;
