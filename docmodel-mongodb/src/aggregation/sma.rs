//! Simple moving average over bucketed closing prices.

use bson::{Bson, Document, doc};
use chrono::{DateTime, Utc};

use super::dto::SmaPoint;
use super::stages::{self, accumulators, path};
use crate::error::{MongoError, MongoResult};
use crate::sort::SortDirection;

/// Parameters for
/// [`AggregationService::simple_moving_average`](super::AggregationService::simple_moving_average).
///
/// Prices are bucketed per symbol into `minutes`-wide buckets, the last price
/// of each bucket is its close, and each point averages the close of the
/// current bucket with the `periods - 1` buckets before it.
#[derive(Debug, Clone, PartialEq)]
pub struct SmaQuery {
    /// Field holding the symbol.
    pub symbol_field: String,
    /// Field holding the price.
    pub price_field: String,
    /// Field holding the timestamp.
    pub date_field: String,
    /// Symbols to include; empty means all.
    pub symbols: Vec<String>,
    /// Inclusive lower bound on the timestamp.
    pub from: Option<DateTime<Utc>>,
    /// Inclusive upper bound on the timestamp.
    pub to: Option<DateTime<Utc>>,
    /// Bucket width in minutes.
    pub minutes: u32,
    /// Buckets per average.
    pub periods: u32,
    /// Additional filter.
    pub filter: Document,
}

impl SmaQuery {
    /// Average of `price_field` per `symbol_field` over `periods` one-minute buckets.
    pub fn new(
        symbol_field: impl Into<String>,
        price_field: impl Into<String>,
        date_field: impl Into<String>,
        periods: u32,
    ) -> Self {
        Self {
            symbol_field: symbol_field.into(),
            price_field: price_field.into(),
            date_field: date_field.into(),
            symbols: Vec::new(),
            from: None,
            to: None,
            minutes: 1,
            periods,
            filter: Document::new(),
        }
    }

    /// Restrict to the given symbols.
    pub fn symbols<I, S>(mut self, symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.symbols = symbols.into_iter().map(Into::into).collect();
        self
    }

    /// Restrict to timestamps in `[from, to]`.
    pub fn between(mut self, from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        self.from = Some(from);
        self.to = Some(to);
        self
    }

    /// Set the bucket width in minutes.
    pub fn minutes(mut self, minutes: u32) -> Self {
        self.minutes = minutes;
        self
    }

    /// Add a filter.
    pub fn filter(mut self, filter: Document) -> Self {
        self.filter = filter;
        self
    }

    pub(crate) fn validate(&self) -> MongoResult<()> {
        if self.periods == 0 {
            return Err(MongoError::invalid_argument("moving average needs at least one period"));
        }
        if self.minutes == 0 {
            return Err(MongoError::invalid_argument("bucket width must be at least one minute"));
        }
        if let (Some(from), Some(to)) = (self.from, self.to) {
            if from > to {
                return Err(MongoError::invalid_argument("moving average range starts after it ends"));
            }
        }
        Ok(())
    }
}

/// Build the moving average pipeline. `wire` maps attribute names to wire keys.
pub(crate) fn pipeline(query: &SmaQuery, wire: impl Fn(&str) -> String) -> Vec<Document> {
    let symbol_field = wire(&query.symbol_field);
    let price_field = wire(&query.price_field);
    let date_field = wire(&query.date_field);

    let mut filter = Document::new();
    if !query.symbols.is_empty() {
        filter.insert(symbol_field.clone(), doc! { "$in": query.symbols.clone() });
    }
    filter.insert(price_field.clone(), doc! { "$exists": true, "$ne": Bson::Null });
    let mut range = Document::new();
    if let Some(from) = query.from {
        range.insert("$gte", bson::DateTime::from_chrono(from));
    }
    if let Some(to) = query.to {
        range.insert("$lte", bson::DateTime::from_chrono(to));
    }
    if !range.is_empty() {
        filter.insert(date_field.clone(), range);
    }
    for (key, value) in &query.filter {
        filter.insert(key.clone(), value.clone());
    }

    let lookback = -(i64::from(query.periods) - 1);

    vec![
        stages::match_stage(filter),
        stages::sort_by(&date_field, SortDirection::Ascending),
        stages::group(
            doc! {
                "symbol": path(&symbol_field),
                "date": stages::date_trunc_minutes(&date_field, query.minutes),
            },
            doc! { "price": accumulators::last(path(&price_field)) },
        ),
        stages::sort_by("_id.date", SortDirection::Ascending),
        stages::project(doc! {
            "_id": 0,
            "symbol": "$_id.symbol",
            "date": "$_id.date",
            "price": 1,
        }),
        stages::set_window_fields(
            "$symbol",
            doc! { "date": 1 },
            doc! {
                "sma": {
                    "$avg": "$price",
                    "window": { "documents": [lookback, 0_i64] },
                },
            },
        ),
    ]
}

/// Parse rows into points ordered by symbol, then date.
pub(crate) fn collect(rows: Vec<Document>) -> MongoResult<Vec<SmaPoint>> {
    let mut points = rows
        .iter()
        .map(SmaPoint::from_row)
        .collect::<MongoResult<Vec<_>>>()?;
    points.sort_by(|a, b| a.symbol.cmp(&b.symbol).then(a.date.cmp(&b.date)));
    Ok(points)
}
