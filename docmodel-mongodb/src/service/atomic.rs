//! Single-document atomic updates: `$inc`, `$push` and `$pull`.
//!
//! Each operation is one update statement, so concurrent callers never lose
//! increments or array elements the way load-mutate-save can.

use std::ops::Neg;

use bson::{Bson, Document, doc, oid::ObjectId};
use docmodel_core::DocumentModel;
use tracing::debug;

use super::Service;
use crate::error::MongoResult;
use crate::filter;

/// Amount for `$inc`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Delta {
    /// Integer delta.
    Int(i64),
    /// Floating point delta.
    Float(f64),
}

impl Neg for Delta {
    type Output = Delta;

    fn neg(self) -> Self::Output {
        match self {
            Self::Int(n) => Self::Int(n.wrapping_neg()),
            Self::Float(f) => Self::Float(-f),
        }
    }
}

impl From<i32> for Delta {
    fn from(value: i32) -> Self {
        Self::Int(value.into())
    }
}

impl From<i64> for Delta {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for Delta {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<Delta> for Bson {
    fn from(delta: Delta) -> Self {
        match delta {
            Delta::Int(n) => Bson::Int64(n),
            Delta::Float(f) => Bson::Double(f),
        }
    }
}

fn inc_update<M, I, D>(deltas: I, negate: bool) -> Document
where
    M: DocumentModel,
    I: IntoIterator<Item = (String, D)>,
    D: Into<Delta>,
{
    let mut inc = Document::new();
    for (field, delta) in deltas {
        let delta = delta.into();
        let delta = if negate { -delta } else { delta };
        inc.insert(M::schema().wire_for(&field), delta);
    }
    doc! { "$inc": inc }
}

/// Filter for a `$push`; with `distinct`, documents already holding the
/// value are excluded so the array behaves as a set.
fn push_filter(mut filter: Document, field: &str, value: &Bson, distinct: bool) -> Document {
    if distinct {
        filter.insert(field, doc! { "$ne": value.clone() });
    }
    filter
}

impl<M: DocumentModel> Service<M> {
    /// Increment one field.
    pub async fn inc(&self, id: ObjectId, field: &str, delta: impl Into<Delta>) -> MongoResult<bool> {
        self.inc_many(id, [(field.to_string(), delta.into())]).await
    }

    /// Decrement one field; the same as incrementing by the negated delta.
    pub async fn dec(&self, id: ObjectId, field: &str, delta: impl Into<Delta>) -> MongoResult<bool> {
        self.inc(id, field, -delta.into()).await
    }

    /// Increment several fields at once.
    pub async fn inc_many<I, D>(&self, id: ObjectId, deltas: I) -> MongoResult<bool>
    where
        I: IntoIterator<Item = (String, D)>,
        D: Into<Delta>,
    {
        self.apply_inc(id, inc_update::<M, _, _>(deltas, false)).await
    }

    /// Decrement several fields at once.
    pub async fn dec_many<I, D>(&self, id: ObjectId, deltas: I) -> MongoResult<bool>
    where
        I: IntoIterator<Item = (String, D)>,
        D: Into<Delta>,
    {
        self.apply_inc(id, inc_update::<M, _, _>(deltas, true)).await
    }

    async fn apply_inc(&self, id: ObjectId, update: Document) -> MongoResult<bool> {
        debug!(collection = %self.name(), id = %id, update = ?update, "Incrementing fields");
        let result = self
            .collection()
            .update_one(filter::by_id(id), update, None)
            .await?;
        Ok(result.matched_count > 0)
    }

    /// Append `value` to the array `field` of one document.
    pub async fn push(
        &self,
        id: ObjectId,
        field: &str,
        value: impl Into<Bson>,
        distinct: bool,
    ) -> MongoResult<bool> {
        let modified = self.push_where(filter::by_id(id), field, value, distinct).await?;
        Ok(modified > 0)
    }

    /// Remove every `value` from the array `field` of one document.
    pub async fn pull(&self, id: ObjectId, field: &str, value: impl Into<Bson>) -> MongoResult<bool> {
        let modified = self.pull_where(filter::by_id(id), field, value).await?;
        Ok(modified > 0)
    }

    /// Append `value` to the array `field` of every matching document.
    ///
    /// Returns the number of documents modified.
    pub async fn push_where(
        &self,
        filter: Document,
        field: &str,
        value: impl Into<Bson>,
        distinct: bool,
    ) -> MongoResult<u64> {
        let field = self.wire(field);
        let value = value.into();
        let filter = push_filter(filter, field, &value, distinct);
        debug!(collection = %self.name(), field = %field, distinct, "Pushing value");

        let result = self
            .collection()
            .update_many(filter, doc! { "$push": { field: value } }, None)
            .await?;
        Ok(result.modified_count)
    }

    /// Remove every `value` from the array `field` of every matching
    /// document.
    ///
    /// Returns the number of documents modified.
    pub async fn pull_where(
        &self,
        filter: Document,
        field: &str,
        value: impl Into<Bson>,
    ) -> MongoResult<u64> {
        let field = self.wire(field);
        debug!(collection = %self.name(), field = %field, "Pulling value");

        let result = self
            .collection()
            .update_many(filter, doc! { "$pull": { field: value.into() } }, None)
            .await?;
        Ok(result.modified_count)
    }
}
