//! Aggregation pipelines over a model's collection.
//!
//! [`AggregationService`] is obtained from
//! [`Service::aggregate`](crate::Service::aggregate). Field arguments are
//! attribute names and are translated to wire keys through the model's
//! aliases before the pipeline is sent.
//!
//! ```rust,ignore
//! let stats = registry.service::<Trade>()?.aggregate();
//!
//! let volume = stats.sum("qty", Some(doc! { "venue": "X" })).await?;
//! let median = stats.percentile("price", 0.5, "asc", None).await?;
//!
//! let candles = stats
//!     .candles(CandleQuery::new("price", "at").key("symbol").minutes(5))
//!     .await?;
//! ```

pub mod candles;
pub mod dto;
pub mod sma;
pub mod stages;

use std::marker::PhantomData;

use bson::{Bson, Document, doc};
use docmodel_core::{DocumentModel, SubModel, coerce};
use futures::TryStreamExt;
use mongodb::Collection;
use tracing::debug;

use crate::error::{MongoError, MongoResult};
use crate::sort::SortDirection;

pub use candles::CandleQuery;
pub use dto::{Candle, SmaPoint};
pub use sma::SmaQuery;

use stages::{accumulators, path};

/// Aggregations for the model type `M`.
pub struct AggregationService<M: DocumentModel> {
    collection: Collection<Document>,
    _model: PhantomData<fn() -> M>,
}

impl<M: DocumentModel> AggregationService<M> {
    /// Aggregate over a collection.
    pub fn new(collection: Collection<Document>) -> Self {
        Self {
            collection,
            _model: PhantomData,
        }
    }

    fn wire(attribute: &str) -> String {
        M::schema().wire_for(attribute).to_string()
    }

    /// Run a raw pipeline and collect every output document.
    pub async fn pipeline(&self, pipeline: Vec<Document>) -> MongoResult<Vec<Document>> {
        debug!(
            collection = %self.collection.name(),
            stages = pipeline.len(),
            "Running aggregation"
        );
        let cursor = self.collection.aggregate(pipeline, None).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn single(
        &self,
        filter: Option<Document>,
        accumulator: Bson,
    ) -> MongoResult<Option<Bson>> {
        let mut pipeline: Vec<Document> = stages::optional_match(filter).into_iter().collect();
        pipeline.push(stages::group(Bson::Null, doc! { "result": accumulator }));

        let mut rows = self.pipeline(pipeline).await?;
        Ok(match rows.pop() {
            Some(mut row) => row.remove("result").filter(|v| !matches!(v, Bson::Null)),
            None => None,
        })
    }

    /// Sum of `field` over matching documents, 0 when nothing matches.
    pub async fn sum(&self, field: &str, filter: Option<Document>) -> MongoResult<f64> {
        let result = self
            .single(filter, accumulators::sum(path(&Self::wire(field))))
            .await?;
        Ok(result.as_ref().and_then(coerce::as_f64).unwrap_or(0.0))
    }

    /// Mean of `field` over matching documents, 0 when nothing matches.
    pub async fn average(&self, field: &str, filter: Option<Document>) -> MongoResult<f64> {
        let result = self
            .single(filter, accumulators::avg(path(&Self::wire(field))))
            .await?;
        Ok(result.as_ref().and_then(coerce::as_f64).unwrap_or(0.0))
    }

    /// Smallest value of `field`.
    pub async fn min(&self, field: &str, filter: Option<Document>) -> MongoResult<Option<Bson>> {
        self.single(filter, accumulators::min(path(&Self::wire(field))))
            .await
    }

    /// Largest value of `field`.
    pub async fn max(&self, field: &str, filter: Option<Document>) -> MongoResult<Option<Bson>> {
        self.single(filter, accumulators::max(path(&Self::wire(field))))
            .await
    }

    /// Nearest-rank percentile of `field`.
    ///
    /// Values are sorted in `direction` and the element at `floor(p * n)` is
    /// returned, clamped to the last element. Every value is pulled into a
    /// single group, so memory grows with the number of matches.
    pub async fn percentile<D>(
        &self,
        field: &str,
        p: f64,
        direction: D,
        filter: Option<Document>,
    ) -> MongoResult<Option<Bson>>
    where
        D: TryInto<SortDirection>,
        MongoError: From<D::Error>,
    {
        let direction = direction.try_into()?;
        if !(0.0..=1.0).contains(&p) {
            return Err(MongoError::invalid_argument(format!(
                "percentile must be within [0, 1], got {p}"
            )));
        }

        let wire = Self::wire(field);
        let mut pipeline: Vec<Document> = stages::optional_match(filter).into_iter().collect();
        pipeline.push(stages::sort_by(&wire, direction));
        pipeline.push(stages::group(
            Bson::Null,
            doc! { "values": accumulators::push(path(&wire)) },
        ));

        let mut rows = self.pipeline(pipeline).await?;
        let values = match rows.pop().and_then(|mut row| row.remove("values")) {
            Some(Bson::Array(values)) => values,
            _ => return Ok(None),
        };
        Ok(nearest_rank(&values, p).cloned())
    }

    /// OHLC candles.
    pub async fn candles(&self, query: CandleQuery) -> MongoResult<Vec<Candle>> {
        query.validate()?;
        let rows = self.pipeline(candles::pipeline(&query, Self::wire)).await?;
        candles::collect(rows, query.direction)
    }

    /// Simple moving average of bucketed closing prices.
    pub async fn simple_moving_average(&self, query: SmaQuery) -> MongoResult<Vec<SmaPoint>> {
        query.validate()?;
        let rows = self.pipeline(sma::pipeline(&query, Self::wire)).await?;
        sma::collect(rows)
    }
}

impl<M: DocumentModel> Clone for AggregationService<M> {
    fn clone(&self) -> Self {
        Self::new(self.collection.clone())
    }
}

impl<M: DocumentModel> std::fmt::Debug for AggregationService<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AggregationService")
            .field("collection", &self.collection.name())
            .field("model", &M::schema().name())
            .finish()
    }
}

/// Element at `floor(p * len)` of a sorted slice, clamped to the last index.
pub(crate) fn nearest_rank<T>(values: &[T], p: f64) -> Option<&T> {
    if values.is_empty() {
        return None;
    }
    let rank = (p * values.len() as f64).floor() as usize;
    values.get(rank.min(values.len() - 1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Order, service_for};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_nearest_rank() {
        let values = [10, 20, 30, 40, 50];
        assert_eq!(nearest_rank(&values, 0.5), Some(&30));
        assert_eq!(nearest_rank(&values, 0.0), Some(&10));
        assert_eq!(nearest_rank(&values, 0.99), Some(&50));
        assert_eq!(nearest_rank(&values, 1.0), Some(&50));
        assert_eq!(nearest_rank::<i32>(&[], 0.5), None);
    }

    #[test]
    fn test_wire_names() {
        assert_eq!(AggregationService::<Order>::wire("customer"), "cust");
        assert_eq!(AggregationService::<Order>::wire("total"), "total");
    }

    #[tokio::test]
    async fn test_percentile_rejects_bad_arguments() {
        let stats = service_for::<Order>(None).await.aggregate();

        let err = stats.percentile("total", 0.5, "sideways", None).await.unwrap_err();
        assert!(err.is_invalid_argument());

        let err = stats.percentile("total", 0.5, 2, None).await.unwrap_err();
        assert!(err.is_invalid_argument());

        let err = stats
            .percentile("total", 1.5, SortDirection::Ascending, None)
            .await
            .unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[tokio::test]
    async fn test_queries_validated_before_io() {
        let stats = service_for::<Order>(None).await.aggregate();

        let err = stats
            .candles(CandleQuery::new("total", "placed").minutes(0))
            .await
            .unwrap_err();
        assert!(err.is_invalid_argument());

        let err = stats
            .simple_moving_average(SmaQuery::new("customer", "total", "placed", 0))
            .await
            .unwrap_err();
        assert!(err.is_invalid_argument());
    }
}
