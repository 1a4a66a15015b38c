//! Typed aggregation results.

use bson::{Bson, Document};
use chrono::{DateTime, Utc};
use docmodel_core::coerce;
use serde::{Deserialize, Serialize};

use crate::error::{MongoError, MongoResult};

/// One OHLC bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    /// Composite group key, by key field name.
    pub key: Document,
    /// Highest price in the bucket.
    pub high: f64,
    /// Lowest price in the bucket.
    pub low: f64,
    /// First price in the bucket.
    pub open: f64,
    /// Last price in the bucket.
    pub close: f64,
    /// Bucket start.
    pub date: DateTime<Utc>,
}

/// One simple moving average point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmaPoint {
    /// Symbol the point belongs to.
    pub symbol: String,
    /// Closing price of the bucket.
    pub price: f64,
    /// Average closing price over the trailing window.
    pub sma: f64,
    /// Bucket start.
    pub date: DateTime<Utc>,
}

fn number(row: &Document, key: &str) -> MongoResult<f64> {
    row.get(key)
        .and_then(coerce::as_f64)
        .ok_or_else(|| MongoError::serialization(format!("aggregation row has no numeric '{key}'")))
}

fn date(value: Option<&Bson>, key: &str) -> MongoResult<DateTime<Utc>> {
    value
        .and_then(coerce::bson_to_datetime)
        .ok_or_else(|| MongoError::serialization(format!("aggregation row has no date '{key}'")))
}

impl Candle {
    /// Read a candle from a grouped row `{ _id: { key, bucket }, high, low, open, close }`.
    pub fn from_row(row: &Document) -> MongoResult<Self> {
        let id = row
            .get_document("_id")
            .map_err(|_| MongoError::serialization("candle row has no group id"))?;
        let key = match id.get("key") {
            Some(Bson::Document(key)) => key.clone(),
            _ => Document::new(),
        };

        Ok(Self {
            key,
            high: number(row, "high")?,
            low: number(row, "low")?,
            open: number(row, "open")?,
            close: number(row, "close")?,
            date: date(id.get("bucket"), "bucket")?,
        })
    }
}

impl SmaPoint {
    /// Read a point from a row `{ symbol, date, price, sma }`.
    pub fn from_row(row: &Document) -> MongoResult<Self> {
        let symbol = match row.get("symbol") {
            Some(Bson::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => return Err(MongoError::serialization("sma row has no symbol")),
        };

        Ok(Self {
            symbol,
            price: number(row, "price")?,
            sma: number(row, "sma")?,
            date: date(row.get("date"), "date")?,
        })
    }
}
