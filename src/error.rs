use std::time::Duration;
use thiserror::Error;

/// Coarse classification of a failure, used for structured logging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Network error, timeout, non-2xx or a rendering failure
    SourceUnavailable,
    /// The response body could not be treated as a results page
    MalformedDocument,
    /// Bad selectors, URLs or config; only raised while building scrapers
    Configuration,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::SourceUnavailable => "source_unavailable",
            FailureKind::MalformedDocument => "malformed_document",
            FailureKind::Configuration => "configuration",
        }
    }
}

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("timed out after {after:?}")]
    Timeout { after: Duration },

    #[error("malformed document: {reason}")]
    MalformedDocument { reason: String },

    #[error("browser rendering failed: {0}")]
    Render(String),

    #[error("no usable locators for {field}")]
    NoUsableLocators { field: &'static str },

    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("invalid config: {0}")]
    Config(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("scrape task failed: {0}")]
    Task(String),
}

impl ScrapeError {
    pub fn kind(&self) -> FailureKind {
        match self {
            ScrapeError::Http(_)
            | ScrapeError::Status { .. }
            | ScrapeError::Timeout { .. }
            | ScrapeError::Render(_)
            | ScrapeError::Task(_) => FailureKind::SourceUnavailable,
            ScrapeError::MalformedDocument { .. } => FailureKind::MalformedDocument,
            ScrapeError::NoUsableLocators { .. }
            | ScrapeError::InvalidUrl(_)
            | ScrapeError::Config(_)
            | ScrapeError::Io(_) => FailureKind::Configuration,
        }
    }
}

pub type Result<T> = std::result::Result<T, ScrapeError>;
