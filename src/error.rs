use thiserror::Error;

/// Errors that can occur when talking to the podcast backend
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Invalid API URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("API base URL {0} cannot carry path segments")]
    InvalidBaseUrl(String),

    #[error("Request to {url} failed: {source}")]
    RequestFailed {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP error {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("Failed to decode response from {url}: {source}")]
    DecodeFailed {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ApiError {
    /// Whether the backend answered with a 404 for the requested resource
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::HttpStatus { status: 404, .. })
    }
}
