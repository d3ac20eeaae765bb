//! Chronological price records, split/dividend adjustment, and the three
//! output shapes (tuple rows, matrix, labeled records).

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::error::HistoryError;
use crate::parse::{day_ordinal, parse_lines, RawRecord};

/// `(day_ordinal, p1, p2, p3, p4, volume)` with the four prices in the
/// requested [`PriceOrder`].
pub type QuoteTuple = (f64, f64, f64, f64, f64, f64);

/// Column order of the four prices in tuple rows and matrices.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PriceOrder {
    /// open, close, high, low
    #[default]
    Ochl,
    /// open, high, low, close
    Ohlc,
}

/// Representation returned by a history request.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputShape {
    #[default]
    TupleRows,
    Matrix,
    Records,
}

/// A fully parsed bar with its derived date parts.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct HistoryRecord {
    pub date: NaiveDate,
    pub year: i32,
    pub month: u32,
    pub day: u32,
    /// Plot-axis day number, see [`day_ordinal`].
    pub day_ordinal: f64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub adj_close: f64,
}

impl From<&RawRecord> for HistoryRecord {
    fn from(raw: &RawRecord) -> Self {
        Self {
            date: raw.date,
            year: raw.date.year(),
            month: raw.date.month(),
            day: raw.date.day(),
            day_ordinal: day_ordinal(raw.date),
            open: raw.open,
            high: raw.high,
            low: raw.low,
            close: raw.close,
            volume: raw.volume,
            adj_close: raw.adj_close,
        }
    }
}

impl HistoryRecord {
    /// The four prices in `order`.
    pub fn prices(&self, order: PriceOrder) -> [f64; 4] {
        match order {
            PriceOrder::Ochl => [self.open, self.close, self.high, self.low],
            PriceOrder::Ohlc => [self.open, self.high, self.low, self.close],
        }
    }

    /// `adj_close / close`. An infinite ratio (zero close) is reported as NaN.
    pub fn adjustment_scale(&self) -> f64 {
        let scale = self.adj_close / self.close;
        if scale.is_infinite() {
            f64::NAN
        } else {
            scale
        }
    }

    /// Multiplies open, high, low and close by [`Self::adjustment_scale`].
    /// Volume is left alone.
    pub fn adjust(&mut self) {
        let scale = self.adjustment_scale();
        self.open *= scale;
        self.high *= scale;
        self.low *= scale;
        self.close *= scale;
    }

    pub fn to_tuple(&self, order: PriceOrder) -> QuoteTuple {
        let [a, b, c, d] = self.prices(order);
        (self.day_ordinal, a, b, c, d, self.volume)
    }
}

/// Row-major `n x 6` matrix of `day_ordinal, four prices, volume`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PriceMatrix {
    data: Vec<f64>,
}

impl PriceMatrix {
    pub const COLUMNS: usize = 6;

    pub fn from_records(records: &[HistoryRecord], order: PriceOrder) -> Self {
        let mut data = Vec::with_capacity(records.len() * Self::COLUMNS);
        for record in records {
            let [a, b, c, d] = record.prices(order);
            data.extend_from_slice(&[record.day_ordinal, a, b, c, d, record.volume]);
        }
        Self { data }
    }

    /// `(rows, columns)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.nrows(), Self::COLUMNS)
    }

    pub fn nrows(&self) -> usize {
        self.data.len() / Self::COLUMNS
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn row(&self, index: usize) -> Option<&[f64]> {
        let start = index.checked_mul(Self::COLUMNS)?;
        self.data.get(start..start.checked_add(Self::COLUMNS)?)
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        self.data.chunks_exact(Self::COLUMNS)
    }

    pub fn column(&self, index: usize) -> Option<Vec<f64>> {
        if index >= Self::COLUMNS {
            return None;
        }
        Some(self.rows().map(|row| row[index]).collect())
    }

    pub fn get(&self, row: usize, column: usize) -> Option<f64> {
        if column >= Self::COLUMNS {
            return None;
        }
        self.row(row).map(|r| r[column])
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }
}

/// Parsed history in the requested [`OutputShape`].
#[derive(Clone, Debug, PartialEq)]
pub enum Quotes {
    Rows(Vec<QuoteTuple>),
    Matrix(PriceMatrix),
    Records(Vec<HistoryRecord>),
}

impl Quotes {
    pub fn len(&self) -> usize {
        match self {
            Quotes::Rows(rows) => rows.len(),
            Quotes::Matrix(matrix) => matrix.nrows(),
            Quotes::Records(records) => records.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Turns file-order raw records (newest first) into ascending records.
///
/// The feed is reversed once; a stable sort then guarantees ascending dates
/// even if the endpoint ever changes its ordering.
pub fn chronological(raw: &[RawRecord]) -> Vec<HistoryRecord> {
    let mut records: Vec<HistoryRecord> = raw.iter().rev().map(HistoryRecord::from).collect();
    records.sort_by_key(|r| r.date);
    records
}

/// Applies [`HistoryRecord::adjust`] to every record.
pub fn adjust_prices(records: &mut [HistoryRecord]) {
    for record in records.iter_mut() {
        record.adjust();
    }
}

/// Converts chronological records into `shape`.
pub fn reshape(records: Vec<HistoryRecord>, order: PriceOrder, shape: OutputShape) -> Quotes {
    match shape {
        OutputShape::TupleRows => {
            Quotes::Rows(records.iter().map(|r| r.to_tuple(order)).collect())
        }
        OutputShape::Matrix => Quotes::Matrix(PriceMatrix::from_records(&records, order)),
        OutputShape::Records => Quotes::Records(records),
    }
}

/// Parses downloaded CSV lines (header first, newest bar first) into
/// ascending quotes, optionally adjusted for splits and dividends.
pub fn quotes_from_lines<S: AsRef<str>>(
    lines: &[S],
    order: PriceOrder,
    adjusted: bool,
    shape: OutputShape,
) -> Result<Quotes, HistoryError> {
    let parsed = parse_lines(lines)?;
    let mut records = chronological(&parsed.records);
    if adjusted {
        adjust_prices(&mut records);
    }
    Ok(reshape(records, order, shape))
}

/// Serializes records as a JSON array. Undefined (NaN) prices become `null`.
pub fn records_to_json(records: &[HistoryRecord]) -> Result<String, HistoryError> {
    Ok(serde_json::to_string_pretty(records)?)
}
