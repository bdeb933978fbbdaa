use std::path::PathBuf;

use reqwest::StatusCode;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum FetchError {
    /// The site answered by redirecting to its home page, which is how it
    /// reports a missing item or listing page.
    #[error("redirected to home page: {url}")]
    Redirect { url: Url },
    #[error("http status {status} for {url}")]
    Http { url: Url, status: StatusCode },
    #[error("connection failed for {url}: {message}")]
    Connection { url: Url, message: String },
    #[error("request timed out: {url}")]
    Timeout { url: Url },
    /// Too many redirects, a broken body and the like.
    #[error("bad response for {url}: {message}")]
    Protocol { url: Url, message: String },
}

impl FetchError {
    /// Connection failures and timeouts are worth retrying after a delay.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Connection { .. } | Self::Timeout { .. })
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Redirect { .. } => "redirect",
            Self::Http { .. } => "http",
            Self::Connection { .. } => "connection",
            Self::Timeout { .. } => "timeout",
            Self::Protocol { .. } => "protocol",
        }
    }
}

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("invalid css selector: {css}")]
    Selector { css: &'static str },
    #[error("page has no item heading")]
    MissingHeading,
    #[error("heading {heading:?} has no '::' separator")]
    MissingSeparator { heading: String },
    #[error("heading has an empty {field}")]
    EmptyField { field: &'static str },
    #[error("no item id in url: {url}")]
    MissingItemId { url: Url },
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("build listing url: {0}")]
    Url(#[from] url::ParseError),
}

impl CatalogError {
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Fetch(err) if err.is_transient())
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Fetch(err) => err.kind(),
            Self::Parse(_) => "parse",
            Self::Url(_) => "url",
        }
    }
}

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Failure of a single item, tagged with the stage it happened in.
#[derive(Debug, Error)]
pub enum ItemError {
    #[error("fetch detail page")]
    Page(#[source] FetchError),
    #[error("parse detail page")]
    Parse(#[from] ParseError),
    #[error("download text")]
    Text(#[source] FetchError),
    #[error("download image")]
    Image(#[source] FetchError),
    #[error("build url")]
    Url(#[from] url::ParseError),
    #[error("write {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ItemError {
    pub fn fetch_error(&self) -> Option<&FetchError> {
        match self {
            Self::Page(err) | Self::Text(err) | Self::Image(err) => Some(err),
            Self::Parse(_) | Self::Url(_) | Self::Io { .. } => None,
        }
    }

    pub fn is_transient(&self) -> bool {
        self.fetch_error().is_some_and(FetchError::is_transient)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Parse(_) => "parse",
            Self::Url(_) => "url",
            Self::Io { .. } => "io",
            Self::Page(err) | Self::Text(err) | Self::Image(err) => err.kind(),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RangeError {
    #[error("--stop-id ({stop}) is lower than --start-id ({start})")]
    Ids { start: u64, stop: u64 },
    #[error("--end-page ({end}) is lower than --start-page ({start})")]
    Pages { start: u32, end: u32 },
    #[error("{flag} must be at least 1")]
    Zero { flag: &'static str },
}
