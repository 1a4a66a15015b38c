//! OHLC candle bucketing.

use bson::{Document, doc};

use super::dto::Candle;
use super::stages::{self, accumulators, path};
use crate::error::{MongoError, MongoResult};
use crate::sort::SortDirection;

/// Parameters for [`AggregationService::candles`](super::AggregationService::candles).
///
/// Field names are attribute names; aliases are resolved against the model.
#[derive(Debug, Clone, PartialEq)]
pub struct CandleQuery {
    /// Fields forming the composite group key.
    pub key_fields: Vec<String>,
    /// Price field.
    pub price_field: String,
    /// Timestamp field.
    pub date_field: String,
    /// Bucket width in minutes.
    pub minutes: u32,
    /// Documents to include.
    pub filter: Document,
    /// Order of the returned buckets.
    pub direction: SortDirection,
}

impl CandleQuery {
    /// Candles of `price_field` bucketed on `date_field`, one minute wide.
    pub fn new(price_field: impl Into<String>, date_field: impl Into<String>) -> Self {
        Self {
            key_fields: Vec::new(),
            price_field: price_field.into(),
            date_field: date_field.into(),
            minutes: 1,
            filter: Document::new(),
            direction: SortDirection::Ascending,
        }
    }

    /// Add a group key field.
    pub fn key(mut self, field: impl Into<String>) -> Self {
        self.key_fields.push(field.into());
        self
    }

    /// Set the bucket width in minutes.
    pub fn minutes(mut self, minutes: u32) -> Self {
        self.minutes = minutes;
        self
    }

    /// Set the filter.
    pub fn filter(mut self, filter: Document) -> Self {
        self.filter = filter;
        self
    }

    /// Set the result order.
    pub fn direction(mut self, direction: SortDirection) -> Self {
        self.direction = direction;
        self
    }

    /// Set the result order from loosely typed input.
    pub fn try_direction<D>(self, direction: D) -> MongoResult<Self>
    where
        D: TryInto<SortDirection>,
        MongoError: From<D::Error>,
    {
        Ok(self.direction(direction.try_into()?))
    }

    pub(crate) fn validate(&self) -> MongoResult<()> {
        if self.minutes == 0 {
            return Err(MongoError::invalid_argument("candle width must be at least one minute"));
        }
        Ok(())
    }
}

/// Build the candle pipeline. `wire` maps attribute names to wire keys.
pub(crate) fn pipeline(query: &CandleQuery, wire: impl Fn(&str) -> String) -> Vec<Document> {
    let date_field = wire(&query.date_field);
    let price = path(&wire(&query.price_field));

    let mut key = Document::new();
    for field in &query.key_fields {
        key.insert(field.clone(), path(&wire(field)));
    }

    let mut pipeline = Vec::with_capacity(5);
    pipeline.extend(stages::optional_match(Some(query.filter.clone())));
    pipeline.push(stages::sort_by(&date_field, SortDirection::Ascending));
    pipeline.push(stages::group(
        doc! {
            "key": key,
            "bucket": stages::date_trunc_minutes(&date_field, query.minutes),
        },
        doc! {
            "high": accumulators::max(price.clone()),
            "low": accumulators::min(price.clone()),
            "open": accumulators::first(price.clone()),
            "close": accumulators::last(price),
        },
    ));
    pipeline.push(stages::sort_by("_id.bucket", query.direction));
    pipeline
}

/// Parse rows and order them by bucket in `direction`.
///
/// The database sort is not relied upon; buckets with equal start keep
/// their relative order.
pub(crate) fn collect(rows: Vec<Document>, direction: SortDirection) -> MongoResult<Vec<Candle>> {
    let mut candles = rows
        .iter()
        .map(Candle::from_row)
        .collect::<MongoResult<Vec<_>>>()?;
    match direction {
        SortDirection::Ascending => candles.sort_by(|a, b| a.date.cmp(&b.date)),
        SortDirection::Descending => candles.sort_by(|a, b| b.date.cmp(&a.date)),
    }
    Ok(candles)
}
