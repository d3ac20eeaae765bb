//! Library layer for historical price downloads: CSV parsing, adjustment,
//! output shaping and the fetch-and-parse entry point.
//!
//! Wraps the `yahoo_history_api` download client with input validation,
//! environment configuration and the three output representations.

pub mod client;
pub mod config;
pub mod error;
pub mod history;
pub mod parse;
pub mod validation;

pub use yahoo_history_api;
pub use yahoo_history_api::{Interval, RegexExtractor, TokenExtractor};

pub use client::{HistoryClient, QuoteRequest};
pub use config::ClientConfig;
pub use error::HistoryError;
pub use history::{
    adjust_prices, chronological, quotes_from_lines, records_to_json, reshape, HistoryRecord,
    OutputShape, PriceMatrix, PriceOrder, QuoteTuple, Quotes,
};
pub use parse::{day_ordinal, parse_csv, parse_lines, ParsedCsv, RawRecord};
