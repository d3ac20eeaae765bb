//! Query builder for the history download endpoint.

use std::fmt;
use std::str::FromStr;

use chrono::{Duration, Local, NaiveDate, NaiveDateTime, TimeZone};
use url::Url;

use crate::Error;

/// Number of download attempts made when none is configured.
pub const DEFAULT_RETRIES: u32 = 5;

/// Bar size of the downloaded series.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Interval {
    #[default]
    Daily,
    Weekly,
    Monthly,
}

impl Interval {
    /// Code used in the `interval` query parameter.
    pub fn code(&self) -> &'static str {
        match self {
            Interval::Daily => "1d",
            Interval::Weekly => "1wk",
            Interval::Monthly => "1mo",
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Interval {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "1d" | "daily" | "day" => Ok(Interval::Daily),
            "1wk" | "weekly" | "week" => Ok(Interval::Weekly),
            "1mo" | "monthly" | "month" => Ok(Interval::Monthly),
            other => Err(format!("unknown interval: {}", other)),
        }
    }
}

/// Converts a calendar date to epoch seconds at local midnight.
///
/// When local midnight falls in a DST gap the first instant of the day that
/// does exist is used instead.
pub fn to_epoch_seconds(date: NaiveDate) -> Result<i64, Error> {
    let midnight = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| Error::InvalidDate(date.to_string()))?;
    first_valid_epoch(midnight, |local| {
        Local
            .from_local_datetime(&local)
            .earliest()
            .map(|dt| dt.timestamp())
    })
    .ok_or_else(|| Error::InvalidDate(date.to_string()))
}

/// Walks forward minute by minute from `start`, for at most a day, until
/// `resolve` maps a wall-clock time to an instant.
fn first_valid_epoch(
    start: NaiveDateTime,
    resolve: impl Fn(NaiveDateTime) -> Option<i64>,
) -> Option<i64> {
    (0..24 * 60)
        .map(|minutes| start + Duration::minutes(minutes))
        .find_map(resolve)
}

/// A single-symbol, single-range history download.
#[derive(Clone, Debug)]
pub struct HistoryQuery {
    pub symbol: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub interval: Interval,
    /// Maximum number of download attempts, each with a fresh token after
    /// the first.
    pub retries: u32,
}

impl HistoryQuery {
    pub fn new(symbol: &str, start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            symbol: symbol.to_string(),
            start,
            end,
            interval: Interval::default(),
            retries: DEFAULT_RETRIES,
        }
    }

    pub fn with_interval(mut self, interval: Interval) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    /// Appends the range, interval and token parameters to `url`.
    pub fn add_to_url(&self, url: &Url, token: &str) -> Result<Url, Error> {
        let period1 = to_epoch_seconds(self.start)?;
        let period2 = to_epoch_seconds(self.end)?;
        let mut url = url.clone();
        url.query_pairs_mut()
            .append_pair("period1", &period1.to_string())
            .append_pair("period2", &period2.to_string())
            .append_pair("interval", self.interval.code())
            .append_pair("events", "history")
            .append_pair("crumb", token);
        Ok(url)
    }
}
