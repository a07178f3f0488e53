//! Error types for content fetching and listing state

use reqwest::StatusCode;

/// Failure to retrieve a page of posts from the content API
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error("{url} responded with {status}")]
    Status { url: String, status: StatusCode },

    #[error("invalid response body from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("content API exposes no master ref")]
    NoMasterRef,

    #[error("invalid URL {0:?}")]
    InvalidUrl(String),

    #[error("cursor {0:?} does not belong to the configured content API")]
    ForeignCursor(String),
}

/// Rejected or failed "load more" transition
#[derive(Debug, thiserror::Error)]
pub enum ListingError {
    #[error("there are no more pages to load")]
    NoMorePages,

    #[error("a page is already being loaded")]
    AlreadyLoading,

    #[error(transparent)]
    Fetch(#[from] FetchError),
}
