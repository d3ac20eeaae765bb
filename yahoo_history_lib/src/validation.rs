use chrono::NaiveDate;

use crate::error::HistoryError;

pub const MAX_SYMBOL_LENGTH: usize = 32;

/// Validate a ticker symbol: trim, uppercase, and allow only the characters
/// the portal uses in symbols (letters, digits, `.`, `^`, `=`, `-`).
pub fn validate_symbol(input: &str) -> Result<String, HistoryError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(HistoryError::InvalidInput("symbol is empty".to_string()));
    }
    if trimmed.len() > MAX_SYMBOL_LENGTH {
        return Err(HistoryError::InvalidInput(format!(
            "symbol exceeds maximum length of {} bytes",
            MAX_SYMBOL_LENGTH
        )));
    }
    if let Some(bad) = trimmed
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '^' | '=' | '-')))
    {
        return Err(HistoryError::InvalidInput(format!(
            "symbol '{}' contains invalid character '{}'",
            input, bad
        )));
    }
    Ok(trimmed.to_ascii_uppercase())
}

/// Validate that a date range is not inverted.
pub fn validate_date_range(start: NaiveDate, end: NaiveDate) -> Result<(), HistoryError> {
    if start > end {
        return Err(HistoryError::InvalidInput(format!(
            "start date {} is after end date {}",
            start, end
        )));
    }
    Ok(())
}

/// Validate a download attempt budget: any positive count.
pub fn validate_retries(retries: u32) -> Result<u32, HistoryError> {
    if retries == 0 {
        return Err(HistoryError::InvalidInput(
            "retries must be at least 1, got 0".to_string(),
        ));
    }
    Ok(retries)
}

#[cfg(test)]
mod tests {
    use super::*;

    // -- Symbol validation --

    #[test]
    fn symbol_uppercased() {
        assert_eq!(validate_symbol("aapl").unwrap(), "AAPL");
    }

    #[test]
    fn symbol_trimmed() {
        assert_eq!(validate_symbol("  msft ").unwrap(), "MSFT");
    }

    #[test]
    fn symbol_index_and_fx() {
        assert_eq!(validate_symbol("^GSPC").unwrap(), "^GSPC");
        assert_eq!(validate_symbol("eurusd=x").unwrap(), "EURUSD=X");
        assert_eq!(validate_symbol("BRK-B").unwrap(), "BRK-B");
        assert_eq!(validate_symbol("0700.HK").unwrap(), "0700.HK");
    }

    #[test]
    fn symbol_empty() {
        assert!(validate_symbol("").is_err());
        assert!(validate_symbol("   ").is_err());
    }

    #[test]
    fn symbol_too_long() {
        assert!(validate_symbol(&"A".repeat(33)).is_err());
    }

    #[test]
    fn symbol_rejects_path_characters() {
        assert!(validate_symbol("AAPL/../x").is_err());
        assert!(validate_symbol("AA PL").is_err());
        assert!(validate_symbol("AAPL?x=1").is_err());
    }

    // -- Date range validation --

    #[test]
    fn date_range_ordered() {
        let a = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        let b = NaiveDate::from_ymd_opt(2020, 2, 1).unwrap();
        assert!(validate_date_range(a, b).is_ok());
        assert!(validate_date_range(a, a).is_ok());
    }

    #[test]
    fn date_range_inverted() {
        let a = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        let b = NaiveDate::from_ymd_opt(2020, 2, 1).unwrap();
        let err = validate_date_range(b, a).unwrap_err();
        assert!(err.to_string().contains("after end date"));
    }

    // -- Retry validation --

    #[test]
    fn retries_bounds() {
        assert!(validate_retries(0).is_err());
        assert_eq!(validate_retries(1).unwrap(), 1);
        assert_eq!(validate_retries(51).unwrap(), 51);
        assert_eq!(validate_retries(u32::MAX).unwrap(), u32::MAX);
    }
}
