//! Extraction of the anti-scraping token ("crumb") from history page markup.
//!
//! The portal embeds the token in a JSON blob inside the page. Where exactly
//! it lives changes without notice, so extraction sits behind
//! [`TokenExtractor`] and the rest of the client never looks at markup.

use std::sync::OnceLock;

use regex::Regex;

/// Pulls a session token out of page markup.
pub trait TokenExtractor: Send + Sync {
    /// Returns the token, or `None` when the markup does not carry one.
    fn extract_token(&self, markup: &str) -> Option<String>;
}

/// Default extractor: the value of `"CrumbStore":{"crumb":"..."}`, matched
/// lazily up to the first `"}` (so a bare `"` inside the value is kept).
#[derive(Debug, Default, Clone, Copy)]
pub struct CrumbStoreExtractor;

const CRUMB_PATTERN: &str = r#""CrumbStore":\{"crumb":"(.*?)"\}"#;

fn crumb_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(CRUMB_PATTERN).ok()).as_ref()
}

impl TokenExtractor for CrumbStoreExtractor {
    fn extract_token(&self, markup: &str) -> Option<String> {
        let raw = crumb_pattern()?.captures(markup)?.get(1)?.as_str();
        if raw.is_empty() {
            return None;
        }
        Some(unescape(raw))
    }
}

/// Extractor driven by a caller-supplied pattern. The first capture group
/// of the first match is the token.
#[derive(Debug, Clone)]
pub struct RegexExtractor {
    pattern: Regex,
}

impl RegexExtractor {
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
        })
    }
}

impl TokenExtractor for RegexExtractor {
    fn extract_token(&self, markup: &str) -> Option<String> {
        let raw = self.pattern.captures(markup)?.get(1)?.as_str();
        if raw.is_empty() {
            return None;
        }
        Some(unescape(raw))
    }
}

/// Extracts a token with the default [`CrumbStoreExtractor`].
pub fn extract_token(markup: &str) -> Option<String> {
    CrumbStoreExtractor.extract_token(markup)
}

/// Decodes JSON string escapes (`\u002F` and friends). Falls back to the raw
/// text when it is not a valid JSON string body.
fn unescape(raw: &str) -> String {
    serde_json::from_str::<String>(&format!("\"{}\"", raw)).unwrap_or_else(|_| raw.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(crumb: &str) -> String {
        format!(
            r#"<html><script>root.App.main = {{"context":{{"dispatcher":{{"stores":{{"CrumbStore":{{"crumb":"{}"}},"StreamStore":{{}}}}}}}}}};</script></html>"#,
            crumb
        )
    }

    #[test]
    fn finds_plain_crumb() {
        assert_eq!(extract_token(&page("abcDEF123")), Some("abcDEF123".into()));
    }

    #[test]
    fn decodes_unicode_escapes() {
        assert_eq!(
            extract_token(&page(r"u8b\u002F9Xyz.")),
            Some("u8b/9Xyz.".into())
        );
    }

    #[test]
    fn keeps_raw_value_when_escape_is_invalid() {
        assert_eq!(extract_token(&page(r"ab\qcd")), Some(r"ab\qcd".into()));
    }

    #[test]
    fn missing_store_is_none() {
        assert_eq!(extract_token("<html><body>Nothing here</body></html>"), None);
    }

    #[test]
    fn empty_crumb_is_none() {
        assert_eq!(extract_token(&page("")), None);
    }

    #[test]
    fn first_occurrence_wins() {
        let markup = format!("{}{}", page("first"), page("second"));
        assert_eq!(extract_token(&markup), Some("first".into()));
    }

    #[test]
    fn unterminated_crumb_is_none() {
        assert_eq!(extract_token(r#""CrumbStore":{"crumb":"abc"#), None);
    }

    #[test]
    fn bare_quote_stays_in_value() {
        assert_eq!(
            extract_token(r#"{"CrumbStore":{"crumb":"ab"cd"}}"#),
            Some(r#"ab"cd"#.into())
        );
    }

    #[test]
    fn crumb_pattern_compiles() {
        assert!(crumb_pattern().unwrap().is_match(r#""CrumbStore":{"crumb":"x"}"#));
    }

    #[test]
    fn regex_extractor_uses_first_group() {
        let extractor = RegexExtractor::new(r#"data-crumb="([^"]+)""#).unwrap();
        let markup = r#"<div data-crumb="tok3n"></div>"#;
        assert_eq!(extractor.extract_token(markup), Some("tok3n".into()));
        assert_eq!(extractor.extract_token("<div></div>"), None);
    }

    #[test]
    fn regex_extractor_rejects_bad_pattern() {
        assert!(RegexExtractor::new("(unclosed").is_err());
    }
}
