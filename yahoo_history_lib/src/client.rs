//! Fetch-and-parse entry point over the download client.

use chrono::NaiveDate;
use yahoo_history_api::{Client, Error as ApiError, HistoryQuery, Interval, TokenExtractor};

use crate::config::ClientConfig;
use crate::error::HistoryError;
use crate::history::{
    quotes_from_lines, HistoryRecord, OutputShape, PriceMatrix, PriceOrder, QuoteTuple, Quotes,
};
use crate::validation;

/// Parameters of one historical quote request.
#[derive(Clone, Debug)]
pub struct QuoteRequest {
    pub symbol: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// Rescale open/high/low/close by `adj_close / close`. Defaults to true.
    pub adjusted: bool,
    pub shape: OutputShape,
    pub order: PriceOrder,
    /// Download attempts. `None` uses the client's configured default.
    pub retries: Option<u32>,
    pub interval: Interval,
}

impl QuoteRequest {
    pub fn new(symbol: &str, start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            symbol: symbol.to_string(),
            start,
            end,
            adjusted: true,
            shape: OutputShape::default(),
            order: PriceOrder::default(),
            retries: None,
            interval: Interval::default(),
        }
    }

    pub fn with_adjusted(mut self, adjusted: bool) -> Self {
        self.adjusted = adjusted;
        self
    }

    pub fn with_shape(mut self, shape: OutputShape) -> Self {
        self.shape = shape;
        self
    }

    pub fn with_order(mut self, order: PriceOrder) -> Self {
        self.order = order;
        self
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = Some(retries);
        self
    }

    pub fn with_interval(mut self, interval: Interval) -> Self {
        self.interval = interval;
        self
    }
}

/// Downloads and parses historical prices.
///
/// Each call runs its own session against the portal; the client holds no
/// state between calls beyond its configuration.
pub struct HistoryClient {
    inner: Client,
    default_retries: u32,
}

impl Default for HistoryClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HistoryClient {
    /// Creates a client configured from the environment (see [`ClientConfig::from_env`]).
    pub fn new() -> Self {
        Self::with_config(&ClientConfig::from_env())
    }

    pub fn with_config(config: &ClientConfig) -> Self {
        Self {
            inner: Client::with_base_urls(&config.page_url, &config.data_url)
                .with_timeout(config.timeout),
            default_retries: config.retries,
        }
    }

    /// Creates a client with custom page and download hosts. Used for testing.
    pub fn with_base_urls(page_url: &str, data_url: &str) -> Self {
        Self::with_config(&ClientConfig {
            page_url: page_url.to_string(),
            data_url: data_url.to_string(),
            ..ClientConfig::default()
        })
    }

    /// Replaces the token extractor of the underlying client.
    pub fn with_extractor(mut self, extractor: impl TokenExtractor + 'static) -> Self {
        self.inner = self.inner.with_extractor(extractor);
        self
    }

    /// Downloads the raw CSV lines (header first, newest bar first).
    ///
    /// The symbol is upper-cased for the request; a not-found error still
    /// names it as passed (trimmed).
    pub async fn load_csv_data(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
        retries: u32,
        interval: Interval,
    ) -> Result<Vec<String>, HistoryError> {
        let caller_symbol = symbol.trim();
        let symbol = validation::validate_symbol(symbol)?;
        validation::validate_date_range(start, end)?;
        let retries = validation::validate_retries(retries)?;

        let query = HistoryQuery::new(&symbol, start, end)
            .with_interval(interval)
            .with_retries(retries);
        let lines = self
            .inner
            .fetch_csv_lines(&query)
            .await
            .map_err(|e| match e {
                // report the symbol as the caller spelled it
                ApiError::SymbolNotFound { .. } => ApiError::SymbolNotFound {
                    symbol: caller_symbol.to_string(),
                },
                other => other,
            })?;
        tracing::debug!("downloaded {} lines for {}", lines.len(), symbol);
        Ok(lines)
    }

    /// Downloads, parses, optionally adjusts and reshapes a price history.
    ///
    /// Rows come back in ascending date order whatever the shape.
    pub async fn quotes_historical(&self, request: &QuoteRequest) -> Result<Quotes, HistoryError> {
        let lines = self
            .load_csv_data(
                &request.symbol,
                request.start,
                request.end,
                request.retries.unwrap_or(self.default_retries),
                request.interval,
            )
            .await?;
        quotes_from_lines(&lines, request.order, request.adjusted, request.shape)
    }

    /// Like [`Self::quotes_historical`] with [`OutputShape::TupleRows`].
    pub async fn historical_rows(
        &self,
        request: &QuoteRequest,
    ) -> Result<Vec<QuoteTuple>, HistoryError> {
        let request = request.clone().with_shape(OutputShape::TupleRows);
        match self.quotes_historical(&request).await? {
            Quotes::Rows(rows) => Ok(rows),
            other => Err(unexpected_shape(&other)),
        }
    }

    /// Like [`Self::quotes_historical`] with [`OutputShape::Matrix`].
    pub async fn historical_matrix(
        &self,
        request: &QuoteRequest,
    ) -> Result<PriceMatrix, HistoryError> {
        let request = request.clone().with_shape(OutputShape::Matrix);
        match self.quotes_historical(&request).await? {
            Quotes::Matrix(matrix) => Ok(matrix),
            other => Err(unexpected_shape(&other)),
        }
    }

    /// Like [`Self::quotes_historical`] with [`OutputShape::Records`].
    pub async fn historical_records(
        &self,
        request: &QuoteRequest,
    ) -> Result<Vec<HistoryRecord>, HistoryError> {
        let request = request.clone().with_shape(OutputShape::Records);
        match self.quotes_historical(&request).await? {
            Quotes::Records(records) => Ok(records),
            other => Err(unexpected_shape(&other)),
        }
    }
}

fn unexpected_shape(quotes: &Quotes) -> HistoryError {
    let name = match quotes {
        Quotes::Rows(_) => "rows",
        Quotes::Matrix(_) => "matrix",
        Quotes::Records(_) => "records",
    };
    HistoryError::InvalidInput(format!("unexpected output shape: {}", name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_defaults() {
        let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2020, 6, 1).unwrap();
        let req = QuoteRequest::new("AAPL", start, end);
        assert!(req.adjusted);
        assert_eq!(req.shape, OutputShape::TupleRows);
        assert_eq!(req.order, PriceOrder::Ochl);
        assert_eq!(req.retries, None);
        assert_eq!(req.interval, Interval::Daily);
    }

    #[test]
    fn request_builders() {
        let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        let req = QuoteRequest::new("AAPL", start, start)
            .with_adjusted(false)
            .with_shape(OutputShape::Records)
            .with_order(PriceOrder::Ohlc)
            .with_retries(2)
            .with_interval(Interval::Monthly);
        assert!(!req.adjusted);
        assert_eq!(req.shape, OutputShape::Records);
        assert_eq!(req.order, PriceOrder::Ohlc);
        assert_eq!(req.retries, Some(2));
        assert_eq!(req.interval, Interval::Monthly);
    }

    #[tokio::test]
    async fn invalid_input_fails_before_any_request() {
        let client = HistoryClient::with_base_urls("http://127.0.0.1:1", "http://127.0.0.1:1");
        let start = NaiveDate::from_ymd_opt(2020, 2, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();

        let err = client
            .quotes_historical(&QuoteRequest::new("AAPL", start, end))
            .await
            .unwrap_err();
        assert!(matches!(err, HistoryError::InvalidInput(_)));

        let err = client
            .quotes_historical(&QuoteRequest::new("", end, start))
            .await
            .unwrap_err();
        assert!(matches!(err, HistoryError::InvalidInput(_)));

        let err = client
            .quotes_historical(&QuoteRequest::new("AAPL", end, start).with_retries(0))
            .await
            .unwrap_err();
        assert!(matches!(err, HistoryError::InvalidInput(_)));
    }
}
