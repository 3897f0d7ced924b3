//! Error types for the scraping client.

use reqwest::StatusCode;

/// Transport-level failures from the HTTP session.
///
/// Timeouts and non-success statuses are split out from other transport
/// faults because the source site throttles aggressively and both carry the
/// URL for retry logging.
#[derive(thiserror::Error, Debug)]
pub enum FetchError {
    /// The request failed below the protocol level (DNS, connect, body read).
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    /// The per-call timeout elapsed before a response arrived.
    #[error("request for {url} timed out")]
    Timeout { url: String },
    /// The server answered with a non-success status.
    #[error("unexpected status {status} for {url}")]
    Status { status: StatusCode, url: String },
}

impl FetchError {
    /// Whether another attempt could plausibly succeed. Identity rotation
    /// makes throttling statuses (403, 429) worth retrying; other client
    /// errors are permanent.
    pub(crate) fn is_retryable(&self) -> bool {
        match self {
            FetchError::Timeout { .. } | FetchError::Http(_) => true,
            FetchError::Status { status, .. } => {
                status.is_server_error()
                    || *status == StatusCode::TOO_MANY_REQUESTS
                    || *status == StatusCode::FORBIDDEN
            }
        }
    }
}

/// Errors from fetching and extracting a page.
///
/// Missing fields are not errors: extraction degrades to absent values so
/// one broken anchor never discards a whole profile.
#[derive(thiserror::Error, Debug)]
pub enum ScrapeError {
    #[error("fetch error: {0}")]
    Fetch(#[from] FetchError),
    /// Every fetch attempt for the page failed. Non-fatal to a batch run.
    #[error("{url} unavailable after {attempts} attempts")]
    Unavailable { url: String, attempts: usize },
    #[error("invalid selector: {0}")]
    Selector(String),
}
