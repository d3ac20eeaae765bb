//! CSV parsing for downloaded price history.
//!
//! The download is a header line followed by one line per bar:
//! `Date,Open,High,Low,Close,Adj Close,Volume`, newest first. Missing values
//! are written as the literal `null`.

use chrono::{Datelike, NaiveDate};

use crate::error::HistoryError;

/// Fields in a well-formed record.
pub const FIELD_COUNT: usize = 7;

const NULL_TOKEN: &str = "null";

/// Days from 0001-01-01 (day 1) to 1970-01-01.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// One CSV record, exactly as the endpoint reports it.
#[derive(Clone, Debug, PartialEq)]
pub struct RawRecord {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub adj_close: f64,
    pub volume: f64,
}

/// Records in file order plus the number of records that were skipped
/// for having the wrong number of fields.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParsedCsv {
    pub records: Vec<RawRecord>,
    pub skipped: usize,
}

/// Floating-point day number used to place a date on a plot axis:
/// days since 1970-01-01.
pub fn day_ordinal(date: NaiveDate) -> f64 {
    f64::from(date.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE)
}

/// Parses a sequence of CSV lines. The first line is the header and is
/// dropped whatever it contains.
pub fn parse_lines<S: AsRef<str>>(lines: &[S]) -> Result<ParsedCsv, HistoryError> {
    let body = lines
        .iter()
        .skip(1)
        .map(|line| line.as_ref())
        .collect::<Vec<_>>()
        .join("\n");
    parse_records(&body)
}

/// Parses a CSV body. The first physical line is the header and is dropped
/// whatever it contains.
///
/// Records without exactly [`FIELD_COUNT`] fields are skipped and counted.
/// A bad date or number inside an otherwise well-formed record fails the
/// whole parse.
pub fn parse_csv(body: &str) -> Result<ParsedCsv, HistoryError> {
    match body.split_once('\n') {
        Some((_, rest)) => parse_records(rest),
        None => Ok(ParsedCsv::default()),
    }
}

/// Parses header-less data lines. Quotes carry no meaning in the feed, so
/// every comma separates a field. Reported line numbers count the dropped
/// header.
fn parse_records(body: &str) -> Result<ParsedCsv, HistoryError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .quoting(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(body.as_bytes());

    let mut parsed = ParsedCsv::default();
    for result in reader.records() {
        let record = result.map_err(|e| HistoryError::Parse {
            line: e.position().map(|p| p.line() + 1).unwrap_or(0),
            reason: e.to_string(),
        })?;
        let line = record.position().map(|p| p.line() + 1).unwrap_or(0);

        if record.len() != FIELD_COUNT {
            tracing::debug!(
                "skipping line {}: expected {} fields, found {}",
                line,
                FIELD_COUNT,
                record.len()
            );
            parsed.skipped += 1;
            continue;
        }

        let field = |i: usize| parse_price(&record[i], line);
        parsed.records.push(RawRecord {
            date: parse_date(&record[0], line)?,
            open: field(1)?,
            high: field(2)?,
            low: field(3)?,
            close: field(4)?,
            adj_close: field(5)?,
            volume: field(6)?,
        });
    }

    if parsed.skipped > 0 {
        tracing::debug!("skipped {} malformed lines", parsed.skipped);
    }
    Ok(parsed)
}

fn parse_date(raw: &str, line: u64) -> Result<NaiveDate, HistoryError> {
    let bytes = raw.as_bytes();
    let shaped = bytes.len() == 10
        && bytes[4] == b'-'
        && bytes[7] == b'-'
        && bytes
            .iter()
            .enumerate()
            .all(|(i, b)| i == 4 || i == 7 || b.is_ascii_digit());
    if !shaped {
        return Err(HistoryError::Parse {
            line,
            reason: format!("date '{}' is not YYYY-MM-DD", raw),
        });
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|e| HistoryError::Parse {
        line,
        reason: format!("invalid date '{}': {}", raw, e),
    })
}

fn parse_price(raw: &str, line: u64) -> Result<f64, HistoryError> {
    if raw == NULL_TOKEN {
        return Ok(0.0);
    }
    raw.parse::<f64>().map_err(|e| HistoryError::Parse {
        line,
        reason: format!("invalid number '{}': {}", raw, e),
    })
}
