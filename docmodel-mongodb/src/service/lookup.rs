//! Finds, existence checks, counts and distinct values.

use std::collections::HashMap;

use bson::{Bson, Document, doc, oid::ObjectId};
use docmodel_core::{DocumentModel, identifier};
use futures::TryStreamExt;
use mongodb::options::{CountOptions, FindOptions};
use tracing::debug;

use super::Service;
use crate::error::MongoResult;
use crate::filter::{self, QueryBuilder};

impl<M: DocumentModel> Service<M> {
    /// Find by identifier. An unparseable identifier finds nothing.
    pub async fn get_by_id(&self, id: impl Into<Bson>) -> MongoResult<Option<M>> {
        let id = id.into();
        let Some(oid) = identifier::normalize(&id) else {
            debug!(collection = %self.name(), id = %id, "Ignoring unparseable identifier");
            return Ok(None);
        };
        self.get_one(filter::by_id(oid)).await
    }

    /// First document matching `filter`.
    pub async fn get_one(&self, filter: Document) -> MongoResult<Option<M>> {
        debug!(collection = %self.name(), filter = ?filter, "Finding one document");
        match self.collection().find_one(filter, None).await? {
            Some(doc) => Ok(Some(self.inflate(doc)?)),
            None => Ok(None),
        }
    }

    /// Every document matching `filter`.
    pub async fn get_multi(&self, filter: Document) -> MongoResult<Vec<M>> {
        self.find_with(filter, None).await
    }

    /// First result of a find query, honoring its sort and skip.
    pub async fn find_one(&self, query: QueryBuilder) -> MongoResult<Option<M>> {
        let (filter, mut options) = query.into_parts();
        options.limit = Some(1);
        Ok(self.find_with(filter, Some(options)).await?.into_iter().next())
    }

    /// Results of a find query.
    pub async fn find(&self, query: QueryBuilder) -> MongoResult<Vec<M>> {
        let (filter, options) = query.into_parts();
        self.find_with(filter, Some(options)).await
    }

    pub(crate) async fn find_with(
        &self,
        filter: Document,
        options: Option<FindOptions>,
    ) -> MongoResult<Vec<M>> {
        debug!(collection = %self.name(), filter = ?filter, "Finding documents");
        let docs: Vec<Document> = self
            .collection()
            .find(filter, options)
            .await?
            .try_collect()
            .await?;
        debug!(collection = %self.name(), count = docs.len(), "Found documents");
        self.inflate_all(docs)
    }

    /// Documents with the given identifiers, in the order requested.
    ///
    /// Identifiers are normalized and deduplicated; unparseable ones and
    /// ones with no stored document are skipped.
    pub async fn get_multi_by_ids<I, V>(&self, ids: I) -> MongoResult<Vec<M>>
    where
        I: IntoIterator<Item = V>,
        V: Into<Bson>,
    {
        let ids = identifier::deduplicate(ids);
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let models = self
            .get_multi(doc! { "_id": { "$in": ids.clone() } })
            .await?;
        Ok(order_by_ids(models, &ids, M::id))
    }

    /// First document whose `key` equals `value`.
    pub async fn get_one_where(&self, key: &str, value: impl Into<Bson>) -> MongoResult<Option<M>> {
        self.get_one(filter::where_eq(self.wire(key), value)).await
    }

    /// Every document whose `key` equals `value`.
    pub async fn get_multi_where(&self, key: &str, value: impl Into<Bson>) -> MongoResult<Vec<M>> {
        self.get_multi(filter::where_eq(self.wire(key), value)).await
    }

    /// First document whose `key` differs from `value`.
    pub async fn get_one_where_not(
        &self,
        key: &str,
        value: impl Into<Bson>,
    ) -> MongoResult<Option<M>> {
        self.get_one(filter::where_ne(self.wire(key), value)).await
    }

    /// Every document whose `key` differs from `value`.
    pub async fn get_multi_where_not(
        &self,
        key: &str,
        value: impl Into<Bson>,
    ) -> MongoResult<Vec<M>> {
        self.get_multi(filter::where_ne(self.wire(key), value)).await
    }

    /// Whether any document matches `filter`.
    pub async fn exists(&self, filter: Document) -> MongoResult<bool> {
        let mut options = CountOptions::default();
        options.limit = Some(1);
        let count = self.collection().count_documents(filter, options).await?;
        Ok(count > 0)
    }

    /// Number of documents matching `filter`.
    pub async fn count(&self, filter: Document) -> MongoResult<u64> {
        debug!(collection = %self.name(), filter = ?filter, "Counting documents");
        Ok(self.collection().count_documents(filter, None).await?)
    }

    /// Distinct values of `field` among documents matching `filter`.
    pub async fn distinct(&self, field: &str, filter: Document) -> MongoResult<Vec<Bson>> {
        debug!(collection = %self.name(), field = %field, "Fetching distinct values");
        Ok(self
            .collection()
            .distinct(self.wire(field), filter, None)
            .await?)
    }
}

/// Reorder `items` to follow `ids`, dropping items not requested.
pub(crate) fn order_by_ids<T>(
    items: Vec<T>,
    ids: &[ObjectId],
    id_of: impl Fn(&T) -> Option<ObjectId>,
) -> Vec<T> {
    let mut by_id: HashMap<ObjectId, T> = items
        .into_iter()
        .filter_map(|item| id_of(&item).map(|id| (id, item)))
        .collect();
    ids.iter().filter_map(|id| by_id.remove(id)).collect()
}
