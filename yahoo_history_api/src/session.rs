//! Anonymous session bootstrap: page fetch, token extraction, cookie capture.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use reqwest::cookie::Jar;
use reqwest::header::HeaderMap;

use crate::{user_agent::browser_headers, Client, Error};

/// Everything the data endpoint needs to accept a request: the header set
/// the token was issued to, the token itself and the session cookies.
///
/// Credentials live for one download call and are replaced wholesale on
/// refresh.
#[derive(Clone)]
pub struct Credentials {
    pub headers: HeaderMap,
    pub token: String,
    pub cookies: Arc<Jar>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("headers", &self.headers)
            .field("token", &self.token)
            .finish_non_exhaustive()
    }
}

impl Credentials {
    /// Builds an HTTP client bound to this session's headers and cookies.
    pub(crate) fn http_client(&self, timeout: Duration) -> Result<reqwest::Client, Error> {
        session_client(&self.headers, &self.cookies, timeout)
    }
}

fn session_client(
    headers: &HeaderMap,
    cookies: &Arc<Jar>,
    timeout: Duration,
) -> Result<reqwest::Client, Error> {
    reqwest::Client::builder()
        .default_headers(headers.clone())
        .cookie_provider(Arc::clone(cookies))
        .timeout(timeout)
        .build()
        .map_err(|e| {
            tracing::error!("Failed to build HTTP client: {}", e);
            Error::RequestFailed(e)
        })
}

impl Client {
    /// Opens a fresh anonymous session for `symbol` and extracts its token.
    ///
    /// Returns `Ok(None)` when the history page carries no token, which
    /// usually means the symbol is unknown. Transport failures are errors.
    pub async fn acquire_credentials(&self, symbol: &str) -> Result<Option<Credentials>, Error> {
        let url = self.history_page_url(symbol)?;
        let headers = browser_headers();
        let cookies = Arc::new(Jar::default());
        let http = session_client(&headers, &cookies, self.timeout)?;

        let resp = http.get(url.clone()).send().await.map_err(|e| {
            tracing::error!("Failed to get history page {}: {}", url, e);
            Error::RequestFailed(e)
        })?;
        let markup = resp.text().await.map_err(|e| {
            tracing::error!("Failed to read history page body: {}", e);
            Error::RequestFailed(e)
        })?;

        match self.extractor.extract_token(&markup) {
            Some(token) => {
                tracing::debug!("acquired session token for {}", symbol);
                Ok(Some(Credentials {
                    headers,
                    token,
                    cookies,
                }))
            }
            None => {
                tracing::debug!("no session token on history page for {}", symbol);
                Ok(None)
            }
        }
    }
}
