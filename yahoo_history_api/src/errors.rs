//! Error types for the history download client.

/// Errors that can occur while acquiring a session or downloading history.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The HTTP request itself failed (network error, timeout, TLS, ...).
    #[error("Request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
    /// No token could be found on the history page, so the symbol is
    /// assumed not to exist on the portal.
    #[error("could not find the stock: {symbol}")]
    SymbolNotFound { symbol: String },
    /// The data endpoint kept rejecting the session token.
    #[error("Unauthorized (HTTP {status}) for {url}")]
    Unauthorized {
        url: String,
        status: u16,
        body: String,
        headers: String,
    },
    /// The data endpoint returned a non-success status that is not an
    /// authorization failure.
    #[error("Request failed with status {status}")]
    HttpStatus { status: u16, body: String },
    /// A calendar date could not be mapped to an epoch timestamp.
    #[error("Invalid date: {0}")]
    InvalidDate(String),
    /// A URL could not be built from the configured base URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 2000;
    if body.len() <= MAX {
        body.to_string()
    } else {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...[truncated]", &body[..end])
    }
}
