//! Pinned browser header set sent with every portal request.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONNECTION, EXPIRES, USER_AGENT};

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; WOW64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/54.0.2840.99 Safari/537.36";

/// Returns the desktop browser user agent the portal is queried with.
pub fn get_user_agent() -> &'static str {
    BROWSER_USER_AGENT
}

/// Builds the static header set used for both the history page and the
/// data endpoint.
pub fn browser_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
    headers.insert(EXPIRES, HeaderValue::from_static("-1"));
    headers.insert(
        HeaderName::from_static("upgrade-insecure-requests"),
        HeaderValue::from_static("1"),
    );
    headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
    headers
}

/// Renders a header map as `name: value` lines for diagnostics.
pub(crate) fn describe_headers(headers: &HeaderMap) -> String {
    headers
        .iter()
        .map(|(name, value)| format!("{}: {}", name, value.to_str().unwrap_or("<binary>")))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headers_are_pinned() {
        let headers = browser_headers();
        assert_eq!(headers.len(), 4);
        assert_eq!(headers[CONNECTION], "keep-alive");
        assert_eq!(headers[EXPIRES], "-1");
        assert_eq!(headers["upgrade-insecure-requests"], "1");
        assert!(headers[USER_AGENT]
            .to_str()
            .unwrap()
            .starts_with("Mozilla/5.0"));
    }

    #[test]
    fn user_agent_has_no_line_breaks() {
        assert!(!get_user_agent().contains('\n'));
        assert!(get_user_agent().contains("Chrome/54.0.2840.99"));
    }

    #[test]
    fn describe_lists_every_header() {
        let text = describe_headers(&browser_headers());
        assert!(text.contains("connection: keep-alive"));
        assert!(text.contains("expires: -1"));
        assert_eq!(text.lines().count(), 4);
    }
}
