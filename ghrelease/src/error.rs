use crate::release::MalformedResponse;
use reqwest::StatusCode;
use thiserror::Error;
use url::Url;

/// The ways a release fetch can fail. Every fetch reports one of these instead of silently never
/// completing.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: Url,
        #[source]
        source: reqwest::Error,
    },
    #[error("request to {url} returned {status}")]
    Status { url: Url, status: StatusCode },
    #[error("malformed response from {url}: {source}")]
    MalformedResponse {
        url: Url,
        #[source]
        source: MalformedResponse,
    },
}

impl FetchError {
    /// The URL of the request that failed.
    #[must_use]
    pub fn url(&self) -> &Url {
        match self {
            FetchError::Transport { url, .. }
            | FetchError::Status { url, .. }
            | FetchError::MalformedResponse { url, .. } => url,
        }
    }
}
