//! HTTP client for the history page and the CSV download endpoint.

use std::time::Duration;

use reqwest::StatusCode;
use url::Url;

use crate::{
    errors::truncate_body,
    query::HistoryQuery,
    session::Credentials,
    token::{CrumbStoreExtractor, TokenExtractor},
    user_agent::describe_headers,
    Error,
};

/// Portal hosting the human-facing history pages.
pub const DEFAULT_PAGE_URL: &str = "https://finance.yahoo.com";
/// Host of the CSV download endpoint.
pub const DEFAULT_DATA_URL: &str = "https://query1.finance.yahoo.com";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Text the download endpoint puts in its body when it rejects a token.
const UNAUTHORIZED_MARKER: &str = "Unauthorized";

/// HTTP client for historical price downloads.
///
/// Every download opens its own anonymous session: a history page request
/// that yields a token and cookies, then one or more requests against the
/// download endpoint. Nothing is shared between calls.
pub struct Client {
    page_base_url: String,
    data_base_url: String,
    pub(crate) extractor: Box<dyn TokenExtractor>,
    pub(crate) timeout: Duration,
}

impl Default for Client {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome of a single request against the download endpoint.
enum Attempt {
    Accepted(String),
    Rejected {
        url: Url,
        status: StatusCode,
        body: String,
    },
}

/// Why the most recent attempt did not produce data.
enum Failure {
    NoToken,
    Rejected {
        url: Url,
        status: StatusCode,
        body: String,
        headers: String,
    },
}

impl Client {
    /// Creates a client pointing at the production portal.
    pub fn new() -> Self {
        Self::with_base_urls(DEFAULT_PAGE_URL, DEFAULT_DATA_URL)
    }

    /// Creates a client with custom page and download hosts. Used for testing with wiremock.
    pub fn with_base_urls(page_base_url: &str, data_base_url: &str) -> Self {
        Self {
            page_base_url: page_base_url.trim_end_matches('/').to_string(),
            data_base_url: data_base_url.trim_end_matches('/').to_string(),
            extractor: Box::new(CrumbStoreExtractor),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Replaces the token extractor.
    pub fn with_extractor(mut self, extractor: impl TokenExtractor + 'static) -> Self {
        self.extractor = Box::new(extractor);
        self
    }

    /// Sets the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// URL of the human-facing history page for `symbol`.
    pub fn history_page_url(&self, symbol: &str) -> Result<Url, Error> {
        let url = Url::parse(&format!("{}/quote/{}/history", self.page_base_url, symbol))?;
        Ok(url)
    }

    fn download_url(&self, symbol: &str) -> Result<Url, Error> {
        let url = Url::parse(&format!(
            "{}/v7/finance/download/{}",
            self.data_base_url, symbol
        ))?;
        Ok(url)
    }

    /// Downloads the CSV history described by `query` and returns its lines.
    ///
    /// Makes up to `query.retries` download attempts (at least one). After a
    /// rejected attempt, or when no token could be obtained, the session is
    /// re-opened before the next attempt. Exhausting the budget fails with
    /// [`Error::SymbolNotFound`] if the last session had no token, and with
    /// [`Error::Unauthorized`] if it had one that kept being rejected.
    pub async fn fetch_csv_lines(&self, query: &HistoryQuery) -> Result<Vec<String>, Error> {
        let base = self.download_url(&query.symbol)?;
        let attempts = query.retries.max(1);

        let mut credentials = self.acquire_credentials(&query.symbol).await?;
        let mut last_failure = Failure::NoToken;

        for attempt in 1..=attempts {
            match &credentials {
                Some(creds) => {
                    let url = query.add_to_url(&base, &creds.token)?;
                    tracing::debug!(
                        "download attempt {}/{} for {}",
                        attempt,
                        attempts,
                        query.symbol
                    );
                    match self.download(creds, url).await? {
                        Attempt::Accepted(body) => return Ok(split_lines(&body)),
                        Attempt::Rejected { url, status, body } => {
                            last_failure = Failure::Rejected {
                                url,
                                status,
                                body,
                                headers: describe_headers(&creds.headers),
                            };
                        }
                    }
                }
                None => last_failure = Failure::NoToken,
            }

            if attempt < attempts {
                tracing::warn!(
                    "session for {} not accepted (attempt {}/{}), refreshing token",
                    query.symbol,
                    attempt,
                    attempts
                );
                credentials = self.acquire_credentials(&query.symbol).await?;
            }
        }

        match last_failure {
            Failure::NoToken => {
                tracing::error!("no session token found for {}", query.symbol);
                Err(Error::SymbolNotFound {
                    symbol: query.symbol.clone(),
                })
            }
            Failure::Rejected {
                url,
                status,
                body,
                headers,
            } => {
                tracing::error!(
                    "download for {} still unauthorized after {} attempts",
                    query.symbol,
                    attempts
                );
                Err(Error::Unauthorized {
                    url: url.to_string(),
                    status: status.as_u16(),
                    body: truncate_body(&body),
                    headers,
                })
            }
        }
    }

    async fn download(&self, creds: &Credentials, url: Url) -> Result<Attempt, Error> {
        let http = creds.http_client(self.timeout)?;
        let resp = http.get(url.clone()).send().await.map_err(|e| {
            tracing::error!("Failed to get history download: {}", e);
            Error::RequestFailed(e)
        })?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| {
            tracing::error!("Failed to read response body: {}", e);
            Error::RequestFailed(e)
        })?;

        if status == StatusCode::UNAUTHORIZED || body.contains(UNAUTHORIZED_MARKER) {
            return Ok(Attempt::Rejected { url, status, body });
        }

        if !status.is_success() {
            let snippet = truncate_body(&body);
            tracing::error!("Request failed with status {}: {}", status, snippet);
            return Err(Error::HttpStatus {
                status: status.as_u16(),
                body: snippet,
            });
        }

        Ok(Attempt::Accepted(body))
    }
}

/// Splits a response body into lines, dropping only a trailing empty line.
fn split_lines(body: &str) -> Vec<String> {
    let mut lines: Vec<String> = body
        .split('\n')
        .map(|line| line.trim_end_matches('\r').to_string())
        .collect();
    if lines.last().is_some_and(|line| line.is_empty()) {
        lines.pop();
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_drops_trailing_empty_line() {
        let lines = split_lines("Date,Open\n2020-01-01,1\n");
        assert_eq!(lines, vec!["Date,Open", "2020-01-01,1"]);
    }

    #[test]
    fn split_keeps_last_line_without_newline() {
        let lines = split_lines("Date,Open\n2020-01-01,1");
        assert_eq!(lines, vec!["Date,Open", "2020-01-01,1"]);
    }

    #[test]
    fn split_strips_carriage_returns() {
        let lines = split_lines("Date,Open\r\n2020-01-01,1\r\n");
        assert_eq!(lines, vec!["Date,Open", "2020-01-01,1"]);
    }

    #[test]
    fn split_empty_body() {
        assert!(split_lines("").is_empty());
    }

    #[test]
    fn page_url_trims_base() {
        let client = Client::with_base_urls("http://localhost:1234/", "http://localhost:1234");
        let url = client.history_page_url("AAPL").unwrap();
        insta::assert_snapshot!(url.as_str(), @"http://localhost:1234/quote/AAPL/history");
    }

    #[test]
    fn download_url_carries_symbol() {
        let url = Client::new().download_url("MSFT").unwrap();
        insta::assert_snapshot!(
            url.as_str(),
            @"https://query1.finance.yahoo.com/v7/finance/download/MSFT"
        );
    }
}
